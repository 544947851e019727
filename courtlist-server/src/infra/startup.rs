use anyhow::Context;
use courtlist_core::{
    PublicationOrchestrator, PublicationService, PublishDispatcher,
    providers::{
        CacacheContentStore, ContentStore, HttpHubPublisher, HttpListAssembler,
        HttpRenderer, IdentityTokenClient,
    },
    store::{InMemoryStatusStore, PostgresStatusStore, StatusStore},
};
use std::sync::Arc;
use tracing::{info, warn};

use super::{app_state::AppState, config::Config};

/// Everything the running server owns.
#[derive(Debug)]
pub struct AppResources {
    pub state: AppState,
    pub dispatcher: Arc<PublishDispatcher>,
}

pub async fn connect_status_store(
    config: &Config,
) -> anyhow::Result<Arc<dyn StatusStore>> {
    match &config.database.url {
        Some(url) => {
            let store = PostgresStatusStore::connect(url)
                .await
                .context("failed to connect the PostgreSQL status store")?;
            Ok(Arc::new(store))
        }
        None => {
            warn!(
                "Using the in-memory status store; records will not survive \
                 a restart"
            );
            Ok(Arc::new(InMemoryStatusStore::new()))
        }
    }
}

/// Wire the store, collaborator clients, orchestrator and dispatcher.
pub async fn wire_app_resources(
    config: &Config,
) -> anyhow::Result<AppResources> {
    let store = connect_status_store(config).await?;

    tokio::fs::create_dir_all(&config.content_store.root)
        .await
        .with_context(|| {
            format!(
                "failed to create content store root {}",
                config.content_store.root.display()
            )
        })?;
    let content_store: Arc<dyn ContentStore> =
        Arc::new(CacacheContentStore::new(config.content_store.root.clone()));

    let assembler = HttpListAssembler::new(
        &config.assembler.base_url,
        config.assembler.timeout,
    )
    .context("failed to build the list assembler client")?;
    let renderer =
        HttpRenderer::new(&config.renderer.base_url, config.renderer.timeout)
            .context("failed to build the renderer client")?;
    let tokens = IdentityTokenClient::new(config.identity.clone())
        .context("failed to build the identity client")?;
    let hub = HttpHubPublisher::new(
        config.hub.url.clone(),
        config.hub.timeout,
        Arc::new(tokens),
    )
    .context("failed to build the hub publisher")?;

    let settings = config.pipeline_settings();
    let orchestrator = PublicationOrchestrator::new(
        Arc::clone(&store),
        Arc::new(assembler),
        Arc::new(renderer),
        Arc::clone(&content_store),
        Arc::new(hub),
        settings.clone(),
    );

    let dispatcher = Arc::new(PublishDispatcher::start(
        config.dispatcher.clone(),
        Arc::new(orchestrator),
    ));

    let service = PublicationService::new(
        store,
        content_store,
        Arc::clone(&dispatcher),
        settings,
    );

    info!(
        identity.flow = config.identity.flow.name(),
        content_store.root = %config.content_store.root.display(),
        hub.url = %config.hub.url,
        "publication pipeline wired"
    );

    Ok(AppResources {
        state: AppState::new(Arc::new(service)),
        dispatcher,
    })
}
