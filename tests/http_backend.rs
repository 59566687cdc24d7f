//! Integration tests for the HTTP backend client against a stub server.

use axum::Json;
use axum::Router;
use axum::extract::{Multipart, Path};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use serde_json::{Value, json};

use ragchat::ChatSession;
use ragchat::backend::{BackendError, ChatBackend, ChatTurnRequest, DocumentFile, HttpBackend};
use ragchat::credentials::MemoryCredentialStore;
use ragchat::transcript::Role;

/// Spawn the stub backend on an ephemeral port and return its base URL.
async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Chat route scripted by the question text: "fail" returns a FastAPI-style
/// error body, "garbage" returns a body without the expected field, anything
/// else echoes a canned answer.
async fn chat_route(Json(payload): Json<Value>) -> impl IntoResponse {
    let question = payload["question"].as_str().unwrap_or_default();
    match question {
        "fail" => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"detail": "missing api key"})),
        ),
        "garbage" => (StatusCode::OK, Json(json!({"unexpected": true}))),
        _ => {
            let provider = payload["model_provider"].as_str().unwrap_or("?");
            let key = payload
                .get("api_key")
                .and_then(|k| k.as_str())
                .unwrap_or("<none>");
            (
                StatusCode::OK,
                Json(json!({"response": format!("{provider}/{key}: answer to {question}")})),
            )
        }
    }
}

async fn upload_route(Path(client_id): Path<String>, mut multipart: Multipart) -> Json<Value> {
    let mut files = 0usize;
    let mut urls = 0usize;
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("files") => {
                let bytes = field.bytes().await.unwrap();
                assert!(!bytes.is_empty());
                files += 1;
            }
            Some("urls") => {
                let text = field.text().await.unwrap();
                urls = serde_json::from_str::<Vec<String>>(&text).unwrap().len();
            }
            _ => {}
        }
    }
    Json(json!({
        "message": format!("Processed {files} files and {urls} urls for {client_id}"),
        "errors": ["one page was empty"],
    }))
}

fn stub_app() -> Router {
    Router::new()
        .route("/api/chat", post(chat_route))
        .route(
            "/api/clients/register",
            post(|| async { Json(json!({"client_id": "abc123"})) }),
        )
        .route(
            "/api/admin/clients",
            get(|| async {
                Json(json!([
                    {"client_id": "abc123", "stats": {"documents_count": 2, "chunks_count": 40}},
                    {"client_id": "empty", "stats": null},
                ]))
            }),
        )
        .route(
            "/api/admin/clients/{id}",
            delete(|Path(id): Path<String>| async move {
                Json(json!({"message": format!("deleted {id}")}))
            }),
        )
        .route("/api/clients/{id}/documents/upload", post(upload_route))
}

fn turn(question: &str) -> ChatTurnRequest {
    ChatTurnRequest {
        question: question.to_string(),
        provider: "groq".to_string(),
        credential: Some("gsk_test".to_string()),
    }
}

#[tokio::test]
async fn chat_round_trip() {
    let base = serve(stub_app()).await;
    let backend = HttpBackend::new(&base).unwrap();

    let reply = backend.chat(&turn("What is X?")).await.unwrap();
    assert_eq!(reply.text, "groq/gsk_test: answer to What is X?");
}

#[tokio::test]
async fn chat_without_credential_omits_the_key() {
    let base = serve(stub_app()).await;
    let backend = HttpBackend::new(&base).unwrap();

    let request = ChatTurnRequest {
        question: "hello".to_string(),
        provider: "ollama".to_string(),
        credential: None,
    };
    let reply = backend.chat(&request).await.unwrap();
    assert_eq!(reply.text, "ollama/<none>: answer to hello");
}

#[tokio::test]
async fn error_status_surfaces_the_detail_field() {
    let base = serve(stub_app()).await;
    let backend = HttpBackend::new(&base).unwrap();

    let err = backend.chat(&turn("fail")).await.unwrap_err();
    match err {
        BackendError::Status { code, detail } => {
            assert_eq!(code, 422);
            assert_eq!(detail, "missing api key");
        }
        other => panic!("expected Status, got {other:?}"),
    }
}

#[tokio::test]
async fn unexpected_body_is_malformed() {
    let base = serve(stub_app()).await;
    let backend = HttpBackend::new(&base).unwrap();

    let err = backend.chat(&turn("garbage")).await.unwrap_err();
    assert!(matches!(err, BackendError::MalformedResponse));
}

#[tokio::test]
async fn unreachable_backend_is_a_connect_error() {
    // Bind a listener to reserve a port, then drop it so nothing answers.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(&format!("http://{addr}")).unwrap();
    let err = backend.chat(&turn("anyone home?")).await.unwrap_err();
    assert!(matches!(err, BackendError::Connect(_)));
}

#[tokio::test]
async fn sibling_endpoints_round_trip() {
    let base = serve(stub_app()).await;
    let backend = HttpBackend::new(&base).unwrap();

    let registered = backend.register_client().await.unwrap();
    assert_eq!(registered.client_id, "abc123");

    let clients = backend.list_clients().await.unwrap();
    assert_eq!(clients.len(), 2);
    assert_eq!(clients[0].client_id, "abc123");
    assert_eq!(clients[0].stats.as_ref().unwrap().documents_count, 2);
    assert!(clients[1].stats.is_none());

    backend.delete_client("abc123").await.unwrap();
}

#[tokio::test]
async fn upload_sends_files_and_urls_as_multipart() {
    let base = serve(stub_app()).await;
    let backend = HttpBackend::new(&base).unwrap();

    let files = vec![
        DocumentFile {
            name: "catalogue.pdf".to_string(),
            bytes: b"%PDF-1.4 fake".to_vec(),
        },
        DocumentFile {
            name: "manual.pdf".to_string(),
            bytes: b"%PDF-1.4 also fake".to_vec(),
        },
    ];
    let urls = vec!["https://example.com/about".to_string()];

    let outcome = backend
        .upload_documents("abc123", files, &urls)
        .await
        .unwrap();
    assert_eq!(outcome.message, "Processed 2 files and 1 urls for abc123");
    assert_eq!(outcome.errors, vec!["one page was empty"]);
}

#[tokio::test]
async fn full_session_turn_over_http() {
    let base = serve(stub_app()).await;
    let backend = HttpBackend::new(&base).unwrap();

    let mut session = ChatSession::new(MemoryCredentialStore::new());
    session.start_chat("gsk_test").unwrap();
    session.send("What is X?", &backend).await.unwrap();

    let entries = session.transcript();
    assert_eq!(entries.len(), 3); // welcome, user, bot
    assert_eq!(entries[2].role, Role::Bot);
    assert_eq!(entries[2].text, "groq/gsk_test: answer to What is X?");

    // A backend failure lands in the transcript, not in the caller.
    session.send("fail", &backend).await.unwrap();
    let last = session.transcript().last().unwrap();
    assert_eq!(last.role, Role::Bot);
    assert!(last.text.contains("missing api key"));
}
