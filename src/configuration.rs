use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub enrichment: EnrichmentSettings,
    pub storage: StorageSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    /// Mounted widgets kept in memory before the oldest is evicted.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_widgets: usize,
}

#[derive(Deserialize, Clone)]
pub struct EnrichmentSettings {
    pub logo_base_url: String,
    pub lookup_base_url: String,
    pub api_key: String,
}

#[derive(Deserialize, Clone)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    pub path: String,
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Memory,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;
    let configuration_directory = base_path.join("configuration");

    // APP_ENRICHMENT__API_KEY=... overrides enrichment.api_key
    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
