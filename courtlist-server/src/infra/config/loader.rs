use courtlist_core::{
    DispatcherConfig, StageTimeouts,
    providers::{IdentityConfig, LocalTokenConfig, RemoteTokenConfig, TokenFlow},
};
use courtlist_model::PublicationMetadataDefaults;
use once_cell::sync::Lazy;
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use url::Url;

use super::{
    models::{
        Config, ConfigMetadata, ContentStoreConfig, DatabaseConfig,
        EndpointConfig, HubConfig, RendererConfig, ServerConfig,
    },
    sources::{
        EnvConfig, FileConfig, FileDispatcherConfig, FileIdentityConfig,
        FileStageConfig,
    },
    validation::ConfigWarnings,
};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("courtlist.toml"),
        PathBuf::from("config/courtlist.toml"),
    ]
});

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CONTENT_ROOT: &str = "./data/artifacts";
const DEFAULT_FOLDER_PREFIX: &str = "court-lists";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_MANAGED_IDENTITY_ENDPOINT: &str =
    "http://169.254.169.254/metadata/identity/oauth2/token";

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    /// `.env`, then the TOML file, then environment overrides.
    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => {
                dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                })?
            }
        };

        let env_config = EnvConfig::gather();
        let (file_config, config_path) = self.load_file_config(&env_config)?;

        let (config, warnings) = compose_config(
            file_config,
            env_config,
            ConfigMetadata {
                config_path,
                env_file_loaded,
            },
        )?;

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let explicit = self
            .options
            .config_path
            .clone()
            .or_else(|| env_config.config_path.clone());

        let path = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigLoadError::MissingConfig { path });
                }
                path
            }
            None => match DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
            {
                Some(path) => path.clone(),
                None => return Ok((None, None)),
            },
        };

        let file_config = read_file_config(&path)?;
        Ok((Some(file_config), Some(path)))
    }
}

pub fn read_file_config(path: &Path) -> Result<FileConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    toml::from_str(&contents).map_err(|source| ConfigLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge file and environment sources. Environment values win.
pub fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    metadata: ConfigMetadata,
) -> Result<(Config, ConfigWarnings), ConfigLoadError> {
    let mut warnings = ConfigWarnings::default();

    if file_config.is_none() {
        warnings.push_with_hint(
            "No courtlist.toml detected; falling back to environment variables",
            "Create courtlist.toml or set COURTLIST_CONFIG",
        );
    }

    let FileConfig {
        server: file_server,
        database: file_database,
        content_store: file_content_store,
        assembler: file_assembler,
        renderer: file_renderer,
        hub: file_hub,
        identity: file_identity,
        dispatcher: file_dispatcher,
        stages: file_stages,
    } = file_config.unwrap_or_default();

    let server = ServerConfig {
        host: env
            .server_host
            .clone()
            .or(file_server.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string()),
        port: env.server_port.or(file_server.port).unwrap_or(DEFAULT_PORT),
    };

    let database_url = env.database_url.clone().or(file_database.url);
    if let Some(url) = &database_url
        && !(url.starts_with("postgres://") || url.starts_with("postgresql://"))
    {
        return Err(ConfigLoadError::InvalidDatabaseUrl);
    }
    if database_url.is_none() {
        warnings.push_with_hint(
            "No database URL configured; status records are kept in memory and lost on restart",
            "Set DATABASE_URL or [database].url to a PostgreSQL connection string",
        );
    }
    let database = DatabaseConfig { url: database_url };

    let content_store = ContentStoreConfig {
        root: env
            .content_store_root
            .clone()
            .or(file_content_store.root)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONTENT_ROOT)),
        folder_prefix: file_content_store
            .folder_prefix
            .unwrap_or_else(|| DEFAULT_FOLDER_PREFIX.to_string()),
    };

    let assembler = EndpointConfig {
        base_url: required_url(
            "assembler.base_url",
            env.assembler_base_url.clone().or(file_assembler.base_url),
        )?,
        timeout: duration_or_default(
            "assembler.timeout",
            file_assembler.timeout,
        )?,
    };

    let renderer = RendererConfig {
        base_url: required_url(
            "renderer.base_url",
            env.renderer_base_url.clone().or(file_renderer.base_url),
        )?,
        timeout: duration_or_default(
            "renderer.timeout",
            file_renderer.timeout,
        )?,
        template_prefix: file_renderer.template_prefix.unwrap_or_default(),
    };

    let defaults = PublicationMetadataDefaults::default();
    let hub = HubConfig {
        url: required_url("hub.url", env.hub_url.clone().or(file_hub.url))?,
        timeout: duration_or_default("hub.timeout", file_hub.timeout)?,
        metadata: PublicationMetadataDefaults {
            provenance: file_hub.provenance.unwrap_or(defaults.provenance),
            language: file_hub.language.unwrap_or(defaults.language),
            sensitivity: file_hub.sensitivity.unwrap_or(defaults.sensitivity),
        },
    };

    let identity = compose_identity(&env, file_identity)?;
    let dispatcher = compose_dispatcher(&env, file_dispatcher)?;
    let stages = compose_stages(file_stages)?;

    let config = Config {
        server,
        database,
        content_store,
        assembler,
        renderer,
        hub,
        identity,
        dispatcher,
        stages,
        metadata,
    };

    Ok((config, warnings))
}

fn compose_identity(
    env: &EnvConfig,
    file: FileIdentityConfig,
) -> Result<IdentityConfig, ConfigLoadError> {
    let flow_name = env
        .identity_flow
        .clone()
        .or(file.flow)
        .ok_or(ConfigLoadError::MissingSetting { key: "identity.flow" })?;
    let timeout = duration_or_default("identity.timeout", file.timeout)?;

    let flow = match flow_name.trim().to_ascii_lowercase().as_str() {
        "local" => TokenFlow::Local(LocalTokenConfig {
            token_url: required_url(
                "identity.token_url",
                env.identity_token_url.clone().or(file.token_url),
            )?,
            client_id: required(
                "identity.client_id",
                env.identity_client_id.clone().or(file.client_id),
            )?,
            client_secret: required(
                "identity.client_secret",
                env.identity_client_secret.clone().or(file.client_secret),
            )?,
            scope: required(
                "identity.scope",
                env.identity_scope.clone().or(file.scope),
            )?,
        }),
        "remote" => TokenFlow::Remote(RemoteTokenConfig {
            endpoint: required_url(
                "identity.endpoint",
                env.identity_endpoint.clone().or(file.endpoint).or_else(|| {
                    Some(DEFAULT_MANAGED_IDENTITY_ENDPOINT.to_string())
                }),
            )?,
            resource: required(
                "identity.resource",
                env.identity_resource.clone().or(file.resource),
            )?,
            client_id: env.identity_client_id.clone().or(file.client_id),
        }),
        _ => {
            return Err(ConfigLoadError::InvalidIdentityFlow {
                value: flow_name,
            });
        }
    };

    Ok(IdentityConfig { flow, timeout })
}

fn compose_dispatcher(
    env: &EnvConfig,
    file: FileDispatcherConfig,
) -> Result<DispatcherConfig, ConfigLoadError> {
    let defaults = DispatcherConfig::default();
    let queue_capacity = env
        .publish_queue_capacity
        .or(file.queue_capacity)
        .unwrap_or(defaults.queue_capacity);
    let workers = env
        .publish_workers
        .or(file.workers)
        .unwrap_or(defaults.workers);

    if queue_capacity == 0 {
        return Err(ConfigLoadError::InvalidValue {
            key: "dispatcher.queue_capacity",
            reason: "must be at least 1",
        });
    }
    if workers == 0 {
        return Err(ConfigLoadError::InvalidValue {
            key: "dispatcher.workers",
            reason: "must be at least 1",
        });
    }

    Ok(DispatcherConfig {
        queue_capacity,
        workers,
        single_flight: file.single_flight.unwrap_or(defaults.single_flight),
        shutdown_grace: match file.shutdown_grace {
            Some(raw) => parse_duration("dispatcher.shutdown_grace", raw)?,
            None => defaults.shutdown_grace,
        },
    })
}

fn compose_stages(
    file: FileStageConfig,
) -> Result<StageTimeouts, ConfigLoadError> {
    Ok(StageTimeouts {
        fetch: duration_or_default("stages.fetch", file.fetch)?,
        render: duration_or_default("stages.render", file.render)?,
        store: duration_or_default("stages.store", file.store)?,
        authenticate: duration_or_default(
            "stages.authenticate",
            file.authenticate,
        )?,
        publish: duration_or_default("stages.publish", file.publish)?,
    })
}

fn required(
    key: &'static str,
    value: Option<String>,
) -> Result<String, ConfigLoadError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigLoadError::MissingSetting { key })
}

fn required_url(
    key: &'static str,
    value: Option<String>,
) -> Result<Url, ConfigLoadError> {
    let raw = required(key, value)?;
    Url::parse(raw.trim()).map_err(|source| ConfigLoadError::InvalidUrl {
        key,
        value: raw,
        source,
    })
}

fn parse_duration(
    key: &'static str,
    raw: String,
) -> Result<Duration, ConfigLoadError> {
    humantime::parse_duration(raw.trim()).map_err(|source| {
        ConfigLoadError::InvalidDuration {
            key,
            value: raw,
            source,
        }
    })
}

fn duration_or_default(
    key: &'static str,
    raw: Option<String>,
) -> Result<Duration, ConfigLoadError> {
    match raw {
        Some(raw) => parse_duration(key, raw),
        None => Ok(DEFAULT_TIMEOUT),
    }
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("missing required setting {key}")]
    MissingSetting { key: &'static str },
    #[error("invalid URL for {key}: '{value}'")]
    InvalidUrl {
        key: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid duration for {key}: '{value}'")]
    InvalidDuration {
        key: &'static str,
        value: String,
        #[source]
        source: humantime::DurationError,
    },
    #[error("invalid {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        reason: &'static str,
    },
    #[error("unknown identity flow '{value}' (expected 'local' or 'remote')")]
    InvalidIdentityFlow { value: String },
    #[error("database URL must start with postgres:// or postgresql://")]
    InvalidDatabaseUrl,
    #[error(transparent)]
    EnvFile(#[from] dotenvy::Error),
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}
