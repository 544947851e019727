use courtlist_core::{
    DispatcherConfig, PipelineSettings, StageTimeouts,
    providers::IdentityConfig,
};
use courtlist_model::PublicationMetadataDefaults;
use std::{path::PathBuf, time::Duration};
use url::Url;

/// Fully resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub content_store: ContentStoreConfig,
    pub assembler: EndpointConfig,
    pub renderer: RendererConfig,
    pub hub: HubConfig,
    pub identity: IdentityConfig,
    pub dispatcher: DispatcherConfig,
    pub stages: StageTimeouts,
    pub metadata: ConfigMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// `None` runs against the in-memory status store.
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentStoreConfig {
    pub root: PathBuf,
    pub folder_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RendererConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub template_prefix: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    pub url: Url,
    pub timeout: Duration,
    pub metadata: PublicationMetadataDefaults,
}

/// Where the configuration came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigMetadata {
    pub config_path: Option<PathBuf>,
    pub env_file_loaded: bool,
}

impl Config {
    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            template_prefix: self.renderer.template_prefix.clone(),
            folder_prefix: self.content_store.folder_prefix.clone(),
            metadata: self.hub.metadata.clone(),
            timeouts: self.stages,
        }
    }
}
