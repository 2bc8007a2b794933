use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::audio::AudioFrontEnd;
use super::queue::{QueueEntry, REPORT_FILE_NAME};
use super::service::{BatchFailure, CallSource, CallTriageService};
use super::stress::FALLBACK_STRESS;
use super::transcriber::Transcriber;
use crate::error::AppError;

/// Router builder exposing transcript scoring, single-call analysis and
/// batch ranking. `upload_limit` caps multipart bodies in bytes.
pub fn triage_router<F, T>(service: Arc<CallTriageService<F, T>>, upload_limit: usize) -> Router
where
    F: AudioFrontEnd + 'static,
    T: Transcriber + 'static,
{
    Router::new()
        .route("/api/v1/triage/score", post(score_handler::<F, T>))
        .route("/api/v1/calls", post(call_handler::<F, T>))
        .route("/api/v1/queue", post(queue_handler::<F, T>))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub transcript: String,
    #[serde(default)]
    pub stress: Option<f64>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueueQuery {
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
struct QueueResponse<'a> {
    generated_at: DateTime<Utc>,
    queue: &'a [QueueEntry],
    top: &'a [QueueEntry],
    failures: &'a [BatchFailure],
    report_csv: String,
}

pub(crate) async fn score_handler<F, T>(
    State(service): State<Arc<CallTriageService<F, T>>>,
    Json(request): Json<ScoreRequest>,
) -> Response
where
    F: AudioFrontEnd + 'static,
    T: Transcriber + 'static,
{
    let filename = request.filename.as_deref().unwrap_or("transcript");
    let stress = request.stress.unwrap_or(FALLBACK_STRESS);
    let result = service.score_transcript(filename, &request.transcript, stress);
    (StatusCode::OK, Json(result)).into_response()
}

pub(crate) async fn call_handler<F, T>(
    State(service): State<Arc<CallTriageService<F, T>>>,
    multipart: Multipart,
) -> Result<Response, AppError>
where
    F: AudioFrontEnd + 'static,
    T: Transcriber + 'static,
{
    let mut form = read_upload_form(multipart).await?;
    if form.files.len() != 1 {
        return Err(AppError::Request(format!(
            "expected exactly one `file` part, received {}",
            form.files.len()
        )));
    }
    let source = form.files.remove(0);

    let result = tokio::task::spawn_blocking(move || {
        service.analyze(source, form.language.as_deref())
    })
    .await??;

    Ok((StatusCode::OK, Json(result)).into_response())
}

pub(crate) async fn queue_handler<F, T>(
    State(service): State<Arc<CallTriageService<F, T>>>,
    Query(query): Query<QueueQuery>,
    multipart: Multipart,
) -> Result<Response, AppError>
where
    F: AudioFrontEnd + 'static,
    T: Transcriber + 'static,
{
    let form = read_upload_form(multipart).await?;
    if form.files.is_empty() {
        return Err(AppError::Request(
            "at least one `file` part is required".to_string(),
        ));
    }

    let UploadForm { files, language } = form;
    let outcome =
        tokio::task::spawn_blocking(move || service.analyze_batch(files, language.as_deref()))
            .await?;
    let report_csv = outcome.queue.to_csv_string()?;

    if query.format.as_deref() == Some("csv") {
        let disposition = format!("attachment; filename=\"{REPORT_FILE_NAME}\"");
        return Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            report_csv,
        )
            .into_response());
    }

    let body = QueueResponse {
        generated_at: Utc::now(),
        queue: outcome.queue.entries(),
        top: outcome.queue.operator_summary(),
        failures: &outcome.failures,
        report_csv,
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<CallSource>,
    language: Option<String>,
}

/// Collects `file` parts and an optional `language` field.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Request(err.to_string()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .filter(|name| !name.trim().is_empty())
                    .ok_or_else(|| {
                        AppError::Request("`file` part is missing a filename".to_string())
                    })?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::Request(err.to_string()))?;
                form.files.push(CallSource::Upload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
            Some("language") => {
                let text = field
                    .text()
                    .await
                    .map_err(|err| AppError::Request(err.to_string()))?;
                let text = text.trim();
                if !text.is_empty() {
                    form.language = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    Ok(form)
}
