use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

/// Company lookup body. Every field may be missing, and a field of the
/// wrong shape is treated as missing rather than failing the whole record.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct CompanyRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub logo: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub category: Option<Category>,
    #[serde(default, deserialize_with = "lenient")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub metrics: Option<Metrics>,
    #[serde(default, deserialize_with = "lenient")]
    pub geo: Option<Geo>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct Category {
    #[serde(default, deserialize_with = "lenient")]
    pub industry: Option<String>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct Metrics {
    #[serde(default, deserialize_with = "lenient_count")]
    pub employees: Option<u64>,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct Geo {
    #[serde(default, deserialize_with = "lenient")]
    pub country: Option<String>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Non-negative whole numbers, given as a JSON number or a numeric string.
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole_count)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_count))
        }
        _ => None,
    };
    Ok(count)
}

fn whole_count(n: f64) -> Option<u64> {
    match n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 {
        true => Some(n as u64),
        false => None,
    }
}

#[derive(Serialize)]
struct FindQuery<'a> {
    domain: &'a str,
}

pub struct EnrichmentClient {
    client: Client,
    api_key: String,
    logo_base_url: String,
    lookup_base_url: String,
}

impl EnrichmentClient {
    pub fn new(logo_base_url: String, lookup_base_url: String, api_key: String) -> Self {
        let client = reqwest::Client::new();

        EnrichmentClient {
            client,
            api_key,
            logo_base_url: logo_base_url.trim_end_matches('/').to_string(),
            lookup_base_url: lookup_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn logo_url(&self, domain: &str) -> anyhow::Result<Url> {
        Ok(Url::parse(&format!("{}/{}", self.logo_base_url, domain))?)
    }

    /// Loads the logo image. Any failure means "no such domain", never an error.
    pub async fn logo_exists(&self, logo_url: &Url) -> bool {
        match self.client.get(logo_url.clone()).send().await {
            Ok(res) => res.status().is_success(),
            Err(e) => {
                log::info!("Logo probe failed for {}: {:?}", logo_url, e);
                false
            }
        }
    }

    pub async fn find_company(&self, domain: &str) -> anyhow::Result<CompanyRecord> {
        let record = self
            .client
            .get(format!("{}/v2/companies/find", self.lookup_base_url))
            .query(&FindQuery { domain })
            .bearer_auth(&self.api_key)
            .send()
            .await?
            .error_for_status()?
            .json::<CompanyRecord>()
            .await?;

        Ok(record)
    }
}
