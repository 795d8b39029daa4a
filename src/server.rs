//! Prompt relay HTTP server.
//!
//! Stateless per request: each handler composes a persona- and
//! phase-specific prompt, forwards it to the Claude API, and relays the text
//! back. Upstream failures are logged and converted to a uniform error
//! payload; nothing is retried. Uploaded files live only for the duration of
//! their request (the [`TempUpload`] guard removes them on every exit path).

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{DefaultBodyLimit, Json, Multipart, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::claude::{CHAT_MAX_TOKENS, Claude, REVIEW_MAX_TOKENS};
use crate::config::Config;
use crate::curriculum;
use crate::mentor::MentorRegistry;
use crate::relay::{ChatReply, CurriculumReply, ReviewReply};
use crate::review::{ReviewVerdict, compose_review_prompt};
use crate::uploads::{TempUpload, UploadStore, allowed_extension};

struct AppState {
    claude: Claude,
    mentors: MentorRegistry,
    uploads: UploadStore,
}

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    mentor: Option<String>,
}

/// Run the relay server until the process is stopped.
pub async fn run(config: &Config) -> Result<()> {
    let state = Arc::new(AppState {
        claude: Claude::from_config(&config.claude),
        mentors: MentorRegistry::from_config(&config.mentors)?,
        uploads: UploadStore::new(&config.server.upload_dir)?,
    });

    // Leave headroom over the raw file ceiling for multipart framing.
    let body_limit = usize::try_from(config.server.max_upload_mb * 1024 * 1024 + 64 * 1024)
        .context("Upload limit too large")?;

    let app = Router::new()
        .route("/", get(banner))
        .route("/api/chat", post(chat))
        .route("/api/review-work", post(review_work))
        .route("/api/upload-curriculum", post(upload_curriculum))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("DataMentor AI relay listening on port {}", config.server.port);
    axum::serve(listener, app)
        .await
        .context("Server terminated")?;

    Ok(())
}

fn banner_payload() -> Value {
    json!({
        "message": "DataMentor AI Platform",
        "status": "Server running successfully",
        "version": env!("CARGO_PKG_VERSION"),
    })
}

async fn banner() -> Json<Value> {
    Json(banner_payload())
}

/// 400 for the chat endpoint: a bare `{error}` payload.
fn bad_request(error: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": error })))
}

/// 400 for the upload endpoints, which carry a `success` flag.
fn upload_rejected(error: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": error })),
    )
}

fn upstream_error(error: &str, details: &anyhow::Error) -> ApiError {
    error!("{error}: {details:#}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "success": false,
            "error": error,
            "details": format!("{details:#}"),
        })),
    )
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> ApiResult<ChatReply> {
    let message = body
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| bad_request("Message is required"))?;

    let mentor = state.mentors.resolve(body.mentor.as_deref());
    info!("Chat request for {} ({} chars)", mentor.display_name, message.len());

    let prompt = format!("{}\n\nUser question: {message}", mentor.system_prompt);
    let response = state
        .claude
        .generate(&prompt, CHAT_MAX_TOKENS)
        .await
        .map_err(|e| upstream_error("Failed to get mentor response", &e))?;

    Ok(Json(ChatReply {
        mentor: mentor.display_name.clone(),
        response,
    }))
}

/// Fields collected from a multipart upload request.
#[derive(Default)]
struct UploadFields {
    file: Option<(String, Vec<u8>)>,
    phase: Option<u8>,
    challenge_type: Option<String>,
    mentor: Option<String>,
}

/// Drain a multipart body into its file and text fields.
///
/// `file_field` names the part holding the upload; all other parts are read
/// as text.
async fn collect_upload(multipart: &mut Multipart, file_field: &str) -> Result<UploadFields> {
    let mut fields = UploadFields::default();

    while let Some(field) = multipart.next_field().await.context("Malformed multipart body")? {
        let name = field.name().unwrap_or_default().to_string();

        if name == file_field {
            let filename = field.file_name().unwrap_or("upload.bin").to_string();
            let bytes = field.bytes().await.context("Failed to read upload")?;
            fields.file = Some((filename, bytes.to_vec()));
            continue;
        }

        let text = field.text().await.context("Failed to read form field")?;
        match name.as_str() {
            "phase" => fields.phase = text.trim().parse().ok(),
            "challengeType" => fields.challenge_type = Some(text),
            "mentor" => fields.mentor = Some(text),
            _ => {}
        }
    }

    Ok(fields)
}

async fn review_work(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<ReviewReply> {
    let fields = collect_upload(&mut multipart, "file")
        .await
        .map_err(|_| upload_rejected("Invalid upload"))?;

    let Some((filename, bytes)) = fields.file else {
        return Err(upload_rejected("No file uploaded"));
    };
    if !allowed_extension(&filename) {
        return Err(upload_rejected(
            "Only Excel files (.xlsx, .xls), CSV files, and Markdown files (.md) are allowed",
        ));
    }

    // Unknown phase falls through to the generic review template.
    let phase = fields.phase.unwrap_or(0);
    let challenge_type = fields.challenge_type.as_deref().unwrap_or("excel");
    let mentor = state.mentors.resolve(fields.mentor.as_deref());

    info!(
        "Reviewing {challenge_type} work for phase {phase} by {}",
        mentor.display_name
    );

    // Guard removes the spooled file whether the upstream call succeeds or
    // fails.
    let upload: TempUpload = state
        .uploads
        .save(&filename, &bytes)
        .map_err(|e| upstream_error("Failed to review work", &e))?;
    tracing::debug!("Review upload spooled at {}", upload.path().display());

    let prompt =
        compose_review_prompt(phase, challenge_type, upload.original_name(), upload.size());

    let review = state
        .claude
        .generate(&prompt, REVIEW_MAX_TOKENS)
        .await
        .map_err(|e| upstream_error("Failed to review work", &e))?;

    let verdict = ReviewVerdict::from_response(&review);
    info!(
        "Phase {phase} review: {}",
        if verdict.approved { "approved" } else { "needs revision" }
    );

    Ok(Json(ReviewReply {
        success: true,
        review: verdict.rationale,
        approved: verdict.approved,
        phase,
    }))
}

async fn upload_curriculum(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<CurriculumReply> {
    let fields = collect_upload(&mut multipart, "curriculum")
        .await
        .map_err(|_| upload_rejected("Invalid upload"))?;

    let Some((filename, bytes)) = fields.file else {
        return Err(upload_rejected("No curriculum file uploaded"));
    };
    if !curriculum::is_markdown(&filename) {
        return Err(upload_rejected("Curriculum must be a markdown file (.md)"));
    }

    let mentor = state.mentors.resolve(fields.mentor.as_deref());
    info!("Uploading curriculum for {}", mentor.display_name);

    let upload = state
        .uploads
        .save(&filename, &bytes)
        .map_err(|e| upstream_error("Failed to upload curriculum", &e))?;

    let content = upload
        .read_text()
        .map_err(|e| upstream_error("Failed to upload curriculum", &e))?;

    let title = curriculum::extract_title(&content, upload.original_name());

    Ok(Json(CurriculumReply {
        success: true,
        title,
        content,
    }))
}
