use std::future::Future;

use rand::Rng;
use url::Url;

use crate::domain::{
    insight::{guess_domain, truncate_description, InsightResult},
    score::{compute_score, synthetic_score, ScoringSignals},
};

use super::{CompanyRecord, EnrichmentClient};

const UNKNOWN: &str = "Unknown";

/// Anything that can produce insights for a company.
pub trait InsightSource: Send + Sync + 'static {
    fn fetch_insights(
        &self,
        company_name: &str,
        page_domain: Option<&str>,
    ) -> impl Future<Output = anyhow::Result<InsightResult>> + Send;
}

pub struct InsightFetcher {
    client: EnrichmentClient,
}

impl InsightFetcher {
    pub fn new(client: EnrichmentClient) -> Self {
        InsightFetcher { client }
    }

    /// Logo probe, then company lookup, each failure degrading to less
    /// detailed data. Always yields a result.
    pub async fn fetch(&self, company_name: &str, page_domain: Option<&str>) -> InsightResult {
        match self.try_fetch(company_name, page_domain).await {
            Ok(insight) => insight,
            Err(e) => {
                log::error!("Insight request failed for {}: {:?}", company_name, e);
                synthetic_insights(company_name)
            }
        }
    }

    async fn try_fetch(
        &self,
        company_name: &str,
        page_domain: Option<&str>,
    ) -> anyhow::Result<InsightResult> {
        let domain = page_domain
            .map(str::to_string)
            .unwrap_or_else(|| guess_domain(company_name));
        let logo_url = self.client.logo_url(&domain)?;

        if !self.client.logo_exists(&logo_url).await {
            log::info!("No logo for {}, falling back to synthetic insights", domain);
            return Ok(synthetic_insights(company_name));
        }

        match self.client.find_company(&domain).await {
            Ok(record) => return Ok(detailed_insights(company_name, &domain, &logo_url, record)),
            Err(e) => log::info!(
                "Detailed company data unavailable for {}, using basic data: {:?}",
                domain,
                e
            ),
        }

        Ok(basic_insights(company_name, &domain, &logo_url))
    }
}

impl InsightSource for InsightFetcher {
    async fn fetch_insights(
        &self,
        company_name: &str,
        page_domain: Option<&str>,
    ) -> anyhow::Result<InsightResult> {
        Ok(self.fetch(company_name, page_domain).await)
    }
}

fn detailed_insights(
    company_name: &str,
    domain: &str,
    logo_url: &Url,
    record: CompanyRecord,
) -> InsightResult {
    let industry = record.category.and_then(|c| c.industry);
    let employees = record.metrics.and_then(|m| m.employees);
    let country = record.geo.and_then(|g| g.country);

    let match_score = compute_score(&ScoringSignals {
        industry: industry.clone(),
        employees,
        domain: Some(domain.to_string()),
    });

    let additional_data = vec![
        (
            "industry".to_string(),
            industry.unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        (
            "description".to_string(),
            truncate_description(record.description.as_deref()),
        ),
        (
            "employeeCount".to_string(),
            employees
                .map(|e| e.to_string())
                .unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        (
            "location".to_string(),
            country.unwrap_or_else(|| UNKNOWN.to_string()),
        ),
        ("website".to_string(), format!("https://{}", domain)),
    ];

    InsightResult::new(
        record.name.unwrap_or_else(|| company_name.to_string()),
        Some(domain.to_string()),
        Some(record.logo.unwrap_or_else(|| logo_url.to_string())),
        match_score,
        additional_data,
    )
}

fn basic_insights(company_name: &str, domain: &str, logo_url: &Url) -> InsightResult {
    let match_score = compute_score(&ScoringSignals {
        domain: Some(domain.to_string()),
        ..Default::default()
    });

    InsightResult::new(
        company_name.to_string(),
        Some(domain.to_string()),
        Some(logo_url.to_string()),
        match_score,
        vec![("website".to_string(), format!("https://{}", domain))],
    )
}

pub fn synthetic_insights(company_name: &str) -> InsightResult {
    synthetic_insights_with(company_name, &mut rand::thread_rng())
}

pub fn synthetic_insights_with<R: Rng + ?Sized>(company_name: &str, rng: &mut R) -> InsightResult {
    InsightResult::new(
        company_name.to_string(),
        None,
        None,
        synthetic_score(rng),
        vec![("note".to_string(), "Limited data available".to_string())],
    )
}
