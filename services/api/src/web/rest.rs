//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.

use crate::files::{sanitize_filename, UploadKind};
use crate::web::jobs;
use crate::web::session::{session_cookie, session_from_headers};
use crate::web::state::AppState;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use doc_chat_core::domain::{ChatMessage, MessageRole};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

/// The single-page client served at `/`.
const INDEX_HTML: &str = include_str!("../../assets/index.html");

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        upload_handler,
        ask_handler,
        status_handler,
        messages_handler,
    ),
    components(
        schemas(AckResponse, AskRequest, StatusResponse, MessagesResponse, MessageDto)
    ),
    tags(
        (name = "Document Chat API", description = "Upload a PDF or video, then ask questions about its content.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// Acknowledgement returned by the upload and ask endpoints. The actual work
/// happens in a background job observed via `/status`.
#[derive(Serialize, ToSchema)]
pub struct AckResponse {
    message: String,
}

/// The question payload for `/ask`.
#[derive(Deserialize, ToSchema)]
pub struct AskRequest {
    #[serde(default)]
    question: String,
}

/// Progress snapshot polled by the client.
#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    status: String,
    is_processing: bool,
}

/// A single chat transcript entry.
#[derive(Serialize, ToSchema)]
pub struct MessageDto {
    role: String,
    content: String,
}

/// The session's full chat transcript, in insertion order.
#[derive(Serialize, ToSchema)]
pub struct MessagesResponse {
    messages: Vec<MessageDto>,
}

//=========================================================================================
// Router Assembly
//=========================================================================================

/// Builds the application router over the shared state.
pub fn router(app_state: Arc<AppState>) -> Router {
    let max_upload_bytes = app_state.config.max_upload_bytes;
    Router::new()
        .route("/", get(index_handler))
        .route("/upload", post(upload_handler))
        .route("/ask", post(ask_handler))
        .route("/status", get(status_handler))
        .route("/messages", get(messages_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(app_state)
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Serves the chat page, issuing a session cookie for first-time visitors
/// and creating the corresponding session entry.
pub async fn index_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (token, is_new) = match session_from_headers(&headers) {
        Some(token) => (token, false),
        None => (Uuid::new_v4(), true),
    };
    app_state.store.get_or_create(token).await;

    let mut response_headers = HeaderMap::new();
    if is_new {
        info!(%token, "Issuing session cookie to new visitor");
        if let Ok(value) = HeaderValue::from_str(&session_cookie(token)) {
            response_headers.insert(header::SET_COOKIE, value);
        }
    }

    (response_headers, Html(INDEX_HTML))
}

/// Upload a PDF or video for this session.
///
/// The file is stored on disk and handed to a background extraction job;
/// the handler acknowledges immediately and the client polls `/status`.
#[utoipa::path(
    post,
    path = "/upload",
    request_body(content_type = "multipart/form-data", description = "A `file` part holding the PDF or video."),
    responses(
        (status = 200, description = "File accepted; processing started", body = AckResponse),
        (status = 400, description = "Missing file, expired session, busy session, or unsupported file type"),
        (status = 500, description = "Failed to store the upload")
    )
)]
pub async fn upload_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // --- 1. Pull the file part out of the multipart body ---
    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            format!("Failed to read multipart data: {e}"),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read file bytes: {e}"),
            )
        })?;
        upload = Some((file_name, data));
        break;
    }

    let Some((file_name, data)) = upload else {
        return Err((StatusCode::BAD_REQUEST, "No file provided".to_string()));
    };
    if file_name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No file selected".to_string()));
    }

    // --- 2. Resolve the session ---
    let token = session_from_headers(&headers)
        .ok_or((StatusCode::BAD_REQUEST, "Session expired".to_string()))?;
    if !app_state.store.contains(token).await {
        return Err((StatusCode::BAD_REQUEST, "Session expired".to_string()));
    }

    // --- 3. Dispatch on the extension allow-list ---
    // Rejected extensions must never mark the session as processing, so the
    // classification happens before the job is admitted.
    let Some(kind) = UploadKind::from_filename(&file_name) else {
        return Err((StatusCode::BAD_REQUEST, "Unsupported file type".to_string()));
    };

    // --- 4. Persist the upload under a sanitized name ---
    let safe_name = sanitize_filename(&file_name);
    let dir = match kind {
        UploadKind::Pdf => &app_state.config.upload_dir_pdf,
        UploadKind::Video => &app_state.config.upload_dir_video,
    };
    let dest = dir.join(&safe_name);
    tokio::fs::write(&dest, &data).await.map_err(|e| {
        error!(path = %dest.display(), "Failed to store upload: {e}");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to store the uploaded file".to_string(),
        )
    })?;

    // --- 5. Admit and launch the background job ---
    app_state
        .store
        .begin_processing(token, "Processing your file...")
        .await
        .map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                "System is still processing a previous request".to_string(),
            )
        })?;

    info!(%token, file = %safe_name, ?kind, "Upload accepted; starting background job");
    match kind {
        UploadKind::Pdf => {
            app_state
                .jobs
                .spawn("process_pdf", jobs::process_pdf(app_state.clone(), token, dest));
        }
        UploadKind::Video => {
            app_state.jobs.spawn(
                "process_video",
                jobs::process_video(app_state.clone(), token, dest),
            );
        }
    }

    Ok(Json(AckResponse {
        message: "File uploaded successfully. Processing...".to_string(),
    }))
}

/// Ask a question about the session's extracted document text.
#[utoipa::path(
    post,
    path = "/ask",
    request_body = AskRequest,
    responses(
        (status = 200, description = "Question accepted; answering started", body = AckResponse),
        (status = 400, description = "Expired session, busy session, empty question, or no document yet")
    )
)]
pub async fn ask_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(request): Json<AskRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let token = session_from_headers(&headers)
        .ok_or((StatusCode::BAD_REQUEST, "Session expired".to_string()))?;
    let session = app_state
        .store
        .get(token)
        .await
        .map_err(|_| (StatusCode::BAD_REQUEST, "Session expired".to_string()))?;

    if session.is_processing {
        return Err((
            StatusCode::BAD_REQUEST,
            "System is still processing your file".to_string(),
        ));
    }
    if request.question.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No question provided".to_string()));
    }
    if session.extracted_text.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "No document content available. Please upload a file first.".to_string(),
        ));
    }

    app_state
        .store
        .append_message(
            token,
            ChatMessage {
                role: MessageRole::User,
                content: request.question.clone(),
            },
        )
        .await
        .map_err(|e| {
            error!(%token, "Failed to record question: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to record the question".to_string(),
            )
        })?;

    app_state
        .store
        .begin_processing(token, "Generating answer...")
        .await
        .map_err(|_| {
            (
                StatusCode::BAD_REQUEST,
                "System is still processing your file".to_string(),
            )
        })?;

    info!(%token, "Question accepted; starting answer job");
    app_state.jobs.spawn(
        "generate_answer",
        jobs::generate_answer(app_state.clone(), token, request.question),
    );

    Ok(Json(AckResponse {
        message: "Question received. Processing...".to_string(),
    }))
}

/// Poll the session's progress.
#[utoipa::path(
    get,
    path = "/status",
    responses(
        (status = 200, description = "Current status string and processing flag", body = StatusResponse),
        (status = 400, description = "Expired session")
    )
)]
pub async fn status_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let token = session_from_headers(&headers)
        .ok_or((StatusCode::BAD_REQUEST, "Session expired".to_string()))?;

    let status = app_state.store.status(token).await;
    let is_processing = app_state
        .store
        .get(token)
        .await
        .map(|session| session.is_processing)
        .unwrap_or(false);

    Ok(Json(StatusResponse {
        status,
        is_processing,
    }))
}

/// Fetch the session's chat transcript.
#[utoipa::path(
    get,
    path = "/messages",
    responses(
        (status = 200, description = "Transcript in insertion order", body = MessagesResponse),
        (status = 400, description = "Expired or unknown session")
    )
)]
pub async fn messages_handler(
    State(app_state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let token = session_from_headers(&headers)
        .ok_or((StatusCode::BAD_REQUEST, "Session expired".to_string()))?;
    let session = app_state
        .store
        .get(token)
        .await
        .map_err(|_| (StatusCode::BAD_REQUEST, "Session expired".to_string()))?;

    let messages = session
        .messages
        .into_iter()
        .map(|message| MessageDto {
            role: message.role.as_str().to_string(),
            content: message.content,
        })
        .collect();

    Ok(Json(MessagesResponse { messages }))
}
