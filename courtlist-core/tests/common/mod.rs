#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use courtlist_core::{
    PipelineSettings, PublicationError, PublicationOrchestrator, Result,
    providers::{
        BearerToken, ContentStore, HubPublisher, HubResponse, ListAssembler,
        Renderer, TokenProvider,
    },
    store::{InMemoryStatusStore, StatusStore},
};
use courtlist_model::{
    ArtifactRef, CourtCentreId, CourtListId, CourtListType, ListQuery,
    NewStatusRecord, PublicationMetadata, StatusRecord, Track, TrackStatus,
    TransitionRequest,
};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use url::Url;
use uuid::Uuid;

pub fn daily_list(id: CourtListId, centre: CourtCentreId) -> NewStatusRecord {
    NewStatusRecord {
        court_list_id: id,
        court_centre_id: centre,
        court_list_type: CourtListType::new("DAILY_LIST").unwrap(),
        publish_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
    }
}

pub fn ids() -> (CourtListId, CourtCentreId) {
    (CourtListId::new(), CourtCentreId(Uuid::now_v7()))
}

/// Binds an axum router to an ephemeral local port and returns its base URL.
pub async fn serve(router: axum::Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

#[derive(Debug)]
pub struct FakeAssembler {
    pub response: Mutex<std::result::Result<serde_json::Value, String>>,
    pub queries: Mutex<Vec<ListQuery>>,
}

impl FakeAssembler {
    pub fn returning(document: serde_json::Value) -> Self {
        Self {
            response: Mutex::new(Ok(document)),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(text: &str) -> Self {
        Self {
            response: Mutex::new(Err(text.to_string())),
            queries: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ListAssembler for FakeAssembler {
    async fn fetch(&self, query: &ListQuery) -> Result<serde_json::Value> {
        self.queries.lock().unwrap().push(query.clone());
        self.response
            .lock()
            .unwrap()
            .clone()
            .map_err(PublicationError::UpstreamFetchFailed)
    }
}

#[derive(Debug)]
pub struct FakeRenderer {
    pub output: Mutex<Vec<u8>>,
    pub delay: Option<Duration>,
    pub templates: Mutex<Vec<String>>,
}

impl FakeRenderer {
    pub fn returning(bytes: Vec<u8>) -> Self {
        Self {
            output: Mutex::new(bytes),
            delay: None,
            templates: Mutex::new(Vec::new()),
        }
    }

    pub fn slow(bytes: Vec<u8>, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::returning(bytes)
        }
    }

    pub fn set_output(&self, bytes: Vec<u8>) {
        *self.output.lock().unwrap() = bytes;
    }
}

#[async_trait]
impl Renderer for FakeRenderer {
    async fn render(
        &self,
        template_name: &str,
        _payload: &serde_json::Value,
    ) -> Result<Vec<u8>> {
        self.templates.lock().unwrap().push(template_name.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.output.lock().unwrap().clone())
    }
}

#[derive(Debug, Default)]
pub struct MemoryContentStore {
    pub objects: Mutex<HashMap<String, Vec<u8>>>,
}

#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn store(
        &self,
        folder: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<ArtifactRef> {
        let key = format!("{folder}/{name}");
        self.objects
            .lock()
            .unwrap()
            .insert(key.clone(), bytes.to_vec());
        Ok(ArtifactRef::new(key))
    }

    async fn fetch(&self, reference: &ArtifactRef) -> Result<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(reference.as_str())
            .cloned()
            .ok_or_else(|| PublicationError::NotFound(reference.to_string()))
    }

    async fn list(&self, folder: &str) -> Result<Vec<ArtifactRef>> {
        let prefix = format!("{folder}/");
        let mut keys: Vec<_> = self
            .objects
            .lock()
            .unwrap()
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys.into_iter().map(ArtifactRef::new).collect())
    }
}

#[derive(Debug)]
pub struct FakeHub {
    pub status: AtomicUsize,
    pub body: String,
    pub calls: AtomicUsize,
    pub delay: Option<Duration>,
    pub submissions: Mutex<Vec<PublicationMetadata>>,
}

impl FakeHub {
    pub fn answering(status: u16, body: &str) -> Self {
        Self {
            status: AtomicUsize::new(status as usize),
            body: body.to_string(),
            calls: AtomicUsize::new(0),
            delay: None,
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn delayed(self, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..self
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HubPublisher for FakeHub {
    async fn authenticate(&self) -> Result<BearerToken> {
        Ok(BearerToken::new("fake-token"))
    }

    async fn submit(
        &self,
        _token: &BearerToken,
        _document: &serde_json::Value,
        metadata: &PublicationMetadata,
    ) -> Result<HubResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.submissions.lock().unwrap().push(metadata.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(HubResponse {
            status: self.status.load(Ordering::SeqCst) as u16,
            body: self.body.clone(),
        })
    }
}

#[derive(Debug)]
pub struct StaticTokens(pub &'static str);

#[async_trait]
impl TokenProvider for StaticTokens {
    async fn token(&self) -> Result<BearerToken> {
        Ok(BearerToken::new(self.0))
    }
}

#[derive(Debug)]
pub struct RejectedTokens;

#[async_trait]
impl TokenProvider for RejectedTokens {
    async fn token(&self) -> Result<BearerToken> {
        Err(PublicationError::AuthenticationFailed(
            "local token endpoint returned 401: invalid_client".into(),
        ))
    }
}

/// Token endpoint that answers only after `delay`.
#[derive(Debug)]
pub struct SlowTokens(pub Duration);

#[async_trait]
impl TokenProvider for SlowTokens {
    async fn token(&self) -> Result<BearerToken> {
        tokio::time::sleep(self.0).await;
        Ok(BearerToken::new("late-token"))
    }
}

/// In-memory collaborators wired into an orchestrator.
pub struct Harness {
    pub store: Arc<InMemoryStatusStore>,
    pub assembler: Arc<FakeAssembler>,
    pub renderer: Arc<FakeRenderer>,
    pub content: Arc<MemoryContentStore>,
    pub hub: Arc<FakeHub>,
    pub settings: PipelineSettings,
}

impl Harness {
    pub fn new(renderer: FakeRenderer, hub: FakeHub) -> Self {
        Self {
            store: Arc::new(InMemoryStatusStore::new()),
            assembler: Arc::new(FakeAssembler::returning(
                serde_json::json!({ "sittings": [] }),
            )),
            renderer: Arc::new(renderer),
            content: Arc::new(MemoryContentStore::default()),
            hub: Arc::new(hub),
            settings: PipelineSettings::default(),
        }
    }

    pub fn orchestrator(&self) -> PublicationOrchestrator {
        self.orchestrator_with_hub(self.hub.clone())
    }

    pub fn orchestrator_with_hub(
        &self,
        hub: Arc<dyn HubPublisher>,
    ) -> PublicationOrchestrator {
        PublicationOrchestrator::new(
            self.store.clone(),
            self.assembler.clone(),
            self.renderer.clone(),
            self.content.clone(),
            hub,
            self.settings.clone(),
        )
    }
}

/// Fires `writers` concurrent upserts of one id, each with a different
/// court centre, and checks that exactly one created the record and every
/// caller saw the winner's classification.
pub async fn race_upserts<S>(store: Arc<S>, writers: usize) -> CourtListId
where
    S: StatusStore + 'static,
{
    let id = CourtListId::new();
    let tasks: Vec<_> = (0..writers)
        .map(|_| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .upsert(daily_list(id, CourtCentreId(Uuid::now_v7())))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let outcomes: Vec<_> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners: Vec<_> = outcomes.iter().filter(|o| o.created).collect();
    assert_eq!(winners.len(), 1, "exactly one upsert creates the record");
    let winner = &winners[0].record;
    for outcome in &outcomes {
        assert_eq!(outcome.record.court_centre_id, winner.court_centre_id);
        assert_eq!(outcome.record.created_at, winner.created_at);
    }
    assert_eq!(
        store.get(id).await.unwrap().court_centre_id,
        winner.court_centre_id
    );
    id
}

/// Asserts the field rules that must hold for every stored record.
pub fn assert_record_consistent(record: &StatusRecord) {
    assert_eq!(
        record.file_url.is_some(),
        record.file_status == TrackStatus::Completed,
        "file url present iff the file track completed: {record:?}"
    );
    assert_eq!(
        record.file_error_message.is_some(),
        record.file_status == TrackStatus::Failed,
        "{record:?}"
    );
    assert_eq!(
        record.publish_error_message.is_some(),
        record.publish_status == TrackStatus::Failed,
        "{record:?}"
    );
    assert!(record.last_updated >= record.created_at);
}

/// Interleaves attempts, failures and completions on the file track of one
/// record from `writers` tasks. Rejected moves are expected; every record a
/// task observes must be internally consistent and no task may see
/// `last_updated` go backwards.
pub async fn race_file_transitions<S>(
    store: Arc<S>,
    id: CourtListId,
    writers: usize,
    rounds: usize,
) where
    S: StatusStore + 'static,
{
    let tasks: Vec<_> = (0..writers)
        .map(|writer| {
            let store = store.clone();
            tokio::spawn(async move {
                let mut last_seen = store.get(id).await.unwrap().last_updated;
                for round in 0..rounds {
                    let finish = if (writer + round) % 2 == 0 {
                        TransitionRequest::file_completed(ArtifactRef::new(
                            format!("court-lists/race/{writer}-{round}.pdf"),
                        ))
                    } else {
                        TransitionRequest::failed(
                            Track::File,
                            format!("writer {writer} round {round}"),
                        )
                    };
                    for request in
                        [TransitionRequest::start_attempt(Track::File), finish]
                    {
                        match store.transition(id, request).await {
                            Ok(record) => {
                                assert_record_consistent(&record);
                                assert!(record.last_updated >= last_seen);
                                last_seen = record.last_updated;
                            }
                            Err(PublicationError::InvalidTransition(_)) => {}
                            Err(other) => panic!("unexpected error: {other}"),
                        }
                    }
                    let current = store.get(id).await.unwrap();
                    assert_record_consistent(&current);
                    assert!(current.last_updated >= last_seen);
                    last_seen = current.last_updated;
                }
            })
        })
        .collect();

    for joined in futures::future::join_all(tasks).await {
        joined.unwrap();
    }
    assert_record_consistent(&store.get(id).await.unwrap());
}
