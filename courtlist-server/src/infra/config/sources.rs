use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub content_store: FileContentStoreConfig,
    #[serde(default)]
    pub assembler: FileEndpointConfig,
    #[serde(default)]
    pub renderer: FileRendererConfig,
    #[serde(default)]
    pub hub: FileHubConfig,
    #[serde(default)]
    pub identity: FileIdentityConfig,
    #[serde(default)]
    pub dispatcher: FileDispatcherConfig,
    #[serde(default)]
    pub stages: FileStageConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDatabaseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileContentStoreConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_prefix: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileEndpointConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Humantime duration, e.g. `"30s"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileRendererConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_prefix: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileHubConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provenance: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileIdentityConfig {
    /// `local` or `remote`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flow: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileDispatcherConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub single_flight: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutdown_grace: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileStageConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fetch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authenticate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish: Option<String>,
}

/// Environment-derived configuration values.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub database_url: Option<String>,
    pub content_store_root: Option<PathBuf>,
    pub assembler_base_url: Option<String>,
    pub renderer_base_url: Option<String>,
    pub hub_url: Option<String>,
    pub identity_flow: Option<String>,
    pub identity_token_url: Option<String>,
    pub identity_client_id: Option<String>,
    pub identity_client_secret: Option<String>,
    pub identity_scope: Option<String>,
    pub identity_endpoint: Option<String>,
    pub identity_resource: Option<String>,
    pub publish_queue_capacity: Option<usize>,
    pub publish_workers: Option<usize>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        let var = |key: &str| {
            std::env::var(key).ok().filter(|value| !value.trim().is_empty())
        };

        Self {
            config_path: var("COURTLIST_CONFIG").map(PathBuf::from),
            server_host: var("SERVER_HOST"),
            server_port: var("SERVER_PORT").and_then(|s| s.parse().ok()),
            database_url: var("DATABASE_URL"),
            content_store_root: var("CONTENT_STORE_ROOT").map(PathBuf::from),
            assembler_base_url: var("ASSEMBLER_BASE_URL"),
            renderer_base_url: var("RENDERER_BASE_URL"),
            hub_url: var("HUB_URL"),
            identity_flow: var("IDENTITY_FLOW"),
            identity_token_url: var("IDENTITY_TOKEN_URL"),
            identity_client_id: var("IDENTITY_CLIENT_ID"),
            identity_client_secret: var("IDENTITY_CLIENT_SECRET"),
            identity_scope: var("IDENTITY_SCOPE"),
            identity_endpoint: var("IDENTITY_ENDPOINT"),
            identity_resource: var("IDENTITY_RESOURCE"),
            publish_queue_capacity: var("PUBLISH_QUEUE_CAPACITY")
                .and_then(|s| s.parse().ok()),
            publish_workers: var("PUBLISH_WORKERS")
                .and_then(|s| s.parse().ok()),
        }
    }
}
