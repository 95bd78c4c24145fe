pub mod render;

use crate::config::ServerConfig;
use crate::error::{Result, SqlGenError};
use crate::pipeline::{Pipeline, PipelineReport, Upload};
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use render::{render_page, PageView};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

/// fields read from the multipart form
#[derive(Debug, Default)]
pub struct FormSubmission {
    pub question: String,
    pub upload: Option<Upload>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    status: &'static str,
    error: String,
}

/// json error body plus the status code chosen for it
pub struct ApiErrorResponse {
    status: StatusCode,
    message: String,
}

impl From<SqlGenError> for ApiErrorResponse {
    fn from(err: SqlGenError) -> Self {
        let status = if err.is_user_input() {
            StatusCode::BAD_REQUEST
        } else if err.is_upstream() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let body = ApiError {
            status: "error",
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// read `file` and `question` fields; unknown fields are ignored
async fn parse_submission(mut multipart: Multipart) -> Result<FormSubmission> {
    let mut submission = FormSubmission::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| SqlGenError::Upload(format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| SqlGenError::Upload(format!("Failed to read file data: {}", e)))?;
                // browsers send an empty part when no file was chosen
                if !file_name.is_empty() || !bytes.is_empty() {
                    submission.upload = Some(Upload {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "question" => {
                submission.question = field
                    .text()
                    .await
                    .map_err(|e| SqlGenError::Upload(format!("Failed to read question: {}", e)))?;
            }
            _ => {}
        }
    }

    Ok(submission)
}

async fn run_submission(state: &AppState, multipart: Multipart) -> (String, Result<PipelineReport>) {
    match parse_submission(multipart).await {
        Ok(submission) => {
            let result = state
                .pipeline
                .run(&submission.question, submission.upload.as_ref())
                .await;
            (submission.question, result)
        }
        Err(e) => (String::new(), Err(e)),
    }
}

/// GET / - empty form
async fn index_handler() -> Html<String> {
    Html(render_page(&PageView::default()))
}

/// POST /ask - run the pipeline and render the results page
async fn ask_form_handler(State(state): State<AppState>, multipart: Multipart) -> Html<String> {
    let (question, result) = run_submission(&state, multipart).await;

    let page = match &result {
        Ok(report) => render_page(&PageView {
            question: &question,
            error: None,
            report: Some(report),
        }),
        Err(e) => {
            let message = if e.is_user_input() {
                e.to_string()
            } else {
                tracing::error!("submission failed: {}", e);
                format!("Error processing the query: {}", e)
            };
            render_page(&PageView {
                question: &question,
                error: Some(&message),
                report: None,
            })
        }
    };

    Html(page)
}

/// POST /api/v1/ask - run the pipeline and return the report as json
async fn ask_api_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> std::result::Result<Json<PipelineReport>, ApiErrorResponse> {
    let (_, result) = run_submission(&state, multipart).await;
    match result {
        Ok(report) => Ok(Json(report)),
        Err(e) => {
            if !e.is_user_input() {
                tracing::error!("submission failed: {}", e);
            }
            Err(e.into())
        }
    }
}

/// GET /api/v1/health
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub fn router(state: AppState, upload_limit_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/ask", post(ask_form_handler))
        .route("/api/v1/ask", post(ask_api_handler))
        .route("/api/v1/health", get(health_handler))
        .layer(DefaultBodyLimit::max(upload_limit_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(config: &ServerConfig, pipeline: Pipeline) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| SqlGenError::Config(format!("invalid bind address: {}", e)))?;

    tracing::info!("starting sqlgen server on http://{}", addr);
    tracing::info!(
        database = %pipeline.database_path().display(),
        policy = ?pipeline.policy(),
        upload_limit_mb = config.upload_limit_bytes / 1024 / 1024,
        "submission settings"
    );

    let state = AppState {
        pipeline: Arc::new(pipeline),
    };
    let app = router(state, config.upload_limit_bytes);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
