mod common;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use common::{RejectedTokens, StaticTokens, daily_list, ids, serve};
use courtlist_core::{
    PublicationError,
    providers::{
        HttpHubPublisher, HttpListAssembler, HttpRenderer, HubPublisher,
        IdentityConfig, IdentityTokenClient, ListAssembler, LocalTokenConfig,
        RemoteTokenConfig, Renderer, TokenFlow, TokenProvider,
    },
};
use courtlist_model::{
    ListQuery, PublicationMetadata, PublicationMetadataDefaults, StatusRecord,
};
use serde_json::{Value, json};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(5);

fn sample_record() -> StatusRecord {
    let (id, centre) = ids();
    StatusRecord::new(daily_list(id, centre), Utc::now())
}

/// A header value and JSON body captured by a local endpoint.
type Seen = Arc<Mutex<Option<(Option<String>, Value)>>>;

#[tokio::test]
async fn assembler_sends_the_list_query() {
    let base = serve(Router::new().route(
        "/court-lists",
        get(|Query(params): Query<HashMap<String, String>>| async move {
            Json(json!({ "echo": params }))
        }),
    ))
    .await;

    let record = sample_record();
    let assembler = HttpListAssembler::new(&base, TIMEOUT).unwrap();
    let document = assembler
        .fetch(&ListQuery::for_record(&record))
        .await
        .unwrap();

    let echo = &document["echo"];
    assert_eq!(echo["listType"], "DAILY_LIST");
    assert_eq!(echo["courtCentreId"], record.court_centre_id.to_string());
    assert_eq!(echo["startDate"], "2025-01-01");
    assert_eq!(echo["endDate"], "2025-01-01");
    assert_eq!(echo["restricted"], "false");
    assert!(echo.get("courtRoomId").is_none());
}

#[tokio::test]
async fn assembler_surfaces_status_and_body_on_failure() {
    let base = serve(Router::new().route(
        "/court-lists",
        get(|| async {
            (StatusCode::INTERNAL_SERVER_ERROR, "listing service down")
        }),
    ))
    .await;

    let assembler = HttpListAssembler::new(&base, TIMEOUT).unwrap();
    let err = assembler
        .fetch(&ListQuery::for_record(&sample_record()))
        .await
        .unwrap_err();

    let PublicationError::UpstreamFetchFailed(text) = err else {
        panic!("unexpected error {err:?}");
    };
    assert!(text.contains("500"), "{text}");
    assert!(text.contains("listing service down"), "{text}");
}

#[tokio::test]
async fn renderer_posts_template_and_payload() {
    let seen: Seen = Arc::default();
    let base = serve(
        Router::new()
            .route(
                "/render",
                post(
                    |State(seen): State<Seen>,
                     headers: HeaderMap,
                     Json(body): Json<Value>| async move {
                        let accept = headers
                            .get(header::ACCEPT)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        *seen.lock().unwrap() = Some((accept, body));
                        (
                            [(header::CONTENT_TYPE, "application/pdf")],
                            b"%PDF-1.7".to_vec(),
                        )
                    },
                ),
            )
            .with_state(seen.clone()),
    )
    .await;

    let renderer = HttpRenderer::new(&base, TIMEOUT).unwrap();
    let bytes = renderer
        .render("daily_list", &json!({ "sittings": [1, 2] }))
        .await
        .unwrap();
    assert_eq!(bytes, b"%PDF-1.7");

    let (accept, body) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(accept.as_deref(), Some("application/pdf"));
    assert_eq!(body["templateName"], "daily_list");
    assert_eq!(body["payload"]["sittings"], json!([1, 2]));
}

#[tokio::test]
async fn renderer_treats_empty_output_as_failure() {
    let base =
        serve(Router::new().route("/render", post(|| async { StatusCode::OK })))
            .await;

    let err = HttpRenderer::new(&base, TIMEOUT)
        .unwrap()
        .render("daily_list", &json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, PublicationError::RenderingFailed(_)));
}

#[tokio::test]
async fn renderer_maps_non_success_status() {
    let base = serve(Router::new().route(
        "/render",
        post(|| async {
            (StatusCode::UNPROCESSABLE_ENTITY, "unknown template")
        }),
    ))
    .await;

    let err = HttpRenderer::new(&base, TIMEOUT)
        .unwrap()
        .render("missing", &json!({}))
        .await
        .unwrap_err();
    let PublicationError::RenderingFailed(text) = err else {
        panic!("unexpected error {err:?}");
    };
    assert!(text.contains("422"), "{text}");
}

#[tokio::test]
async fn local_flow_uses_client_credentials() {
    let base = serve(Router::new().route(
        "/oauth2/token",
        post(|body: String| async move {
            if body.contains("grant_type=client_credentials")
                && body.contains("client_id=publisher")
                && body.contains("client_secret=s3cret")
            {
                Json(json!({
                    "access_token": "local-token",
                    "expires_in": 3599
                }))
                .into_response()
            } else {
                (StatusCode::BAD_REQUEST, body).into_response()
            }
        }),
    ))
    .await;

    let client = IdentityTokenClient::new(IdentityConfig {
        flow: TokenFlow::Local(LocalTokenConfig {
            token_url: base.join("oauth2/token").unwrap(),
            client_id: "publisher".into(),
            client_secret: "s3cret".into(),
            scope: "api://hub/.default".into(),
        }),
        timeout: TIMEOUT,
    })
    .unwrap();

    assert_eq!(client.token().await.unwrap().as_str(), "local-token");
}

#[tokio::test]
async fn remote_flow_queries_the_identity_endpoint() {
    let base = serve(Router::new().route(
        "/metadata/identity/oauth2/token",
        get(
            |headers: HeaderMap,
             Query(params): Query<HashMap<String, String>>| async move {
                let metadata =
                    headers.get("Metadata").and_then(|v| v.to_str().ok());
                let resource = params.get("resource").map(String::as_str);
                if metadata == Some("true") && resource == Some("api://hub") {
                    Json(json!({ "access_token": "remote-token" }))
                        .into_response()
                } else {
                    StatusCode::BAD_REQUEST.into_response()
                }
            },
        ),
    ))
    .await;

    let client = IdentityTokenClient::new(IdentityConfig {
        flow: TokenFlow::Remote(RemoteTokenConfig {
            endpoint: base.join("metadata/identity/oauth2/token").unwrap(),
            resource: "api://hub".into(),
            client_id: None,
        }),
        timeout: TIMEOUT,
    })
    .unwrap();

    assert_eq!(client.token().await.unwrap().as_str(), "remote-token");
}

#[tokio::test]
async fn token_endpoint_rejection_is_an_authentication_failure() {
    let base = serve(Router::new().route(
        "/oauth2/token",
        post(|| async { (StatusCode::UNAUTHORIZED, "invalid_client") }),
    ))
    .await;

    let client = IdentityTokenClient::new(IdentityConfig {
        flow: TokenFlow::Local(LocalTokenConfig {
            token_url: base.join("oauth2/token").unwrap(),
            client_id: "publisher".into(),
            client_secret: "wrong".into(),
            scope: "api://hub/.default".into(),
        }),
        timeout: TIMEOUT,
    })
    .unwrap();

    let err = client.token().await.unwrap_err();
    let PublicationError::AuthenticationFailed(text) = err else {
        panic!("unexpected error {err:?}");
    };
    assert!(text.contains("401"), "{text}");
}

#[tokio::test]
async fn hub_receives_document_metadata_and_bearer_token() {
    let seen: Seen = Arc::default();
    let base = serve(
        Router::new()
            .route(
                "/publications",
                post(
                    |State(seen): State<Seen>,
                     headers: HeaderMap,
                     Json(body): Json<Value>| async move {
                        let auth = headers
                            .get(header::AUTHORIZATION)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        *seen.lock().unwrap() = Some((auth, body));
                        (StatusCode::ACCEPTED, "queued")
                    },
                ),
            )
            .with_state(seen.clone()),
    )
    .await;

    let publisher = HttpHubPublisher::new(
        base.join("publications").unwrap(),
        TIMEOUT,
        Arc::new(StaticTokens("hub-token")),
    )
    .unwrap();

    let record = sample_record();
    let metadata = PublicationMetadata::for_record(
        &record,
        &PublicationMetadataDefaults::default(),
    );
    let response = publisher
        .publish(&json!({ "sittings": [] }), &metadata)
        .await
        .unwrap();
    assert_eq!(response.status, 202);
    assert_eq!(response.body, "queued");

    let (auth, body) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(auth.as_deref(), Some("Bearer hub-token"));
    assert_eq!(body["document"], json!({ "sittings": [] }));
    assert_eq!(body["metadata"]["type"], "LIST");
    assert_eq!(body["metadata"]["listType"], "DAILY_LIST");
    assert_eq!(body["metadata"]["courtId"], record.court_centre_id.to_string());
    assert_eq!(body["metadata"]["contentDate"], "2025-01-01");
    assert_eq!(body["metadata"]["displayFrom"], "2025-01-01T00:00:00Z");
    assert_eq!(body["metadata"]["displayTo"], "2025-01-01T23:59:59Z");
}

#[tokio::test]
async fn hub_is_not_called_when_the_token_fails() {
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    let base = serve(Router::new().route(
        "/publications",
        post(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                StatusCode::OK
            }
        }),
    ))
    .await;

    let publisher = HttpHubPublisher::new(
        base.join("publications").unwrap(),
        TIMEOUT,
        Arc::new(RejectedTokens),
    )
    .unwrap();
    let metadata = PublicationMetadata::for_record(
        &sample_record(),
        &PublicationMetadataDefaults::default(),
    );

    let err = publisher.publish(&json!({}), &metadata).await.unwrap_err();
    assert!(matches!(err, PublicationError::AuthenticationFailed(_)));
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unreachable_hub_is_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let publisher = HttpHubPublisher::new(
        Url::parse(&format!("http://{addr}/publications")).unwrap(),
        TIMEOUT,
        Arc::new(StaticTokens("hub-token")),
    )
    .unwrap();
    let metadata = PublicationMetadata::for_record(
        &sample_record(),
        &PublicationMetadataDefaults::default(),
    );

    let err = publisher.publish(&json!({}), &metadata).await.unwrap_err();
    assert!(matches!(err, PublicationError::HubUnavailable(_)));
}
