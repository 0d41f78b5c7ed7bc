use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use super::errors::CoreError;
use super::models::{HealthStatus, ResultSet, UploadResponse, UploadRow, UploadedDocument};
use super::service::CoreService;

pub const SESSION_HEADER: &str = "x-session-id";
const FILES_FIELD: &str = "files";

#[derive(Clone)]
pub struct AppState {
    pub core: Arc<CoreService>,
}

pub fn build_router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/upload", post(upload))
        .route("/results/:session_id", get(get_results))
        .route("/download/:session_id/csv", get(download_csv))
        .route("/download/:session_id/summary", get(download_summary))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        ocr_available: state.core.ocr_available(),
    })
}

/// POST /upload
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, CoreError> {
    let mut saw_files_field = false;
    let mut documents = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| CoreError::InvalidRequest(err.body_text()))?
    {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        saw_files_field = true;

        let file_name = field.file_name().unwrap_or_default().trim().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| CoreError::InvalidRequest(err.body_text()))?;

        if file_name.is_empty() {
            continue;
        }
        documents.push(UploadedDocument::new(file_name, bytes.to_vec()));
    }

    if !saw_files_field {
        return Err(CoreError::InvalidRequest(
            "No files part in the request".to_string(),
        ));
    }

    let session_id = session_id_from(&headers);
    tracing::info!(session_id = %session_id, files = documents.len(), "upload received");

    let results = state
        .core
        .process_batch_for_session(&session_id, documents)
        .await?;

    Ok(Json(UploadResponse {
        csv_url: format!("/download/{session_id}/csv"),
        summary_url: format!("/download/{session_id}/summary"),
        results: results.records.iter().map(UploadRow::from).collect(),
        batch_id: results.batch_id,
        summary: results.summary,
        session_id,
    }))
}

/// GET /results/:session_id
pub async fn get_results(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ResultSet>, CoreError> {
    Ok(Json(state.core.session_results(&session_id).await?))
}

/// GET /download/:session_id/csv
pub async fn download_csv(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, CoreError> {
    let (batch_id, csv) = state.core.export_csv(&session_id).await?;
    Ok(attachment(
        "text/csv; charset=utf-8",
        format!("resume_results_{batch_id}.csv"),
        csv,
    ))
}

/// GET /download/:session_id/summary
pub async fn download_summary(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, CoreError> {
    let (batch_id, summary) = state.core.export_summary(&session_id).await?;
    Ok(attachment(
        "text/plain; charset=utf-8",
        format!("skills_summary_{batch_id}.txt"),
        summary,
    ))
}

fn attachment(content_type: &'static str, file_name: String, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// Reuses the caller's session when it sends a well-formed id, otherwise
/// issues a new one.
fn session_id_from(headers: &HeaderMap) -> String {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .unwrap_or_else(Uuid::new_v4)
        .to_string()
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::core::field_extractor::ExtractionPatterns;
    use crate::core::settings::RuntimeSettings;
    use crate::core::skills::SkillVocabulary;

    const BOUNDARY: &str = "resume-test-boundary";

    fn app() -> Router {
        let core = CoreService::from_parts(
            &RuntimeSettings::default(),
            ExtractionPatterns::default(),
            SkillVocabulary::default(),
            None,
        );
        build_router(AppState { core: Arc::new(core) }, 1024 * 1024)
    }

    fn multipart_body(files: &[(&str, &str, &str)]) -> String {
        let mut body = String::new();
        for (field, file_name, content) in files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n\
                 {content}\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        body
    }

    fn upload_request(files: &[(&str, &str, &str)], session: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session);
        }
        builder.body(Body::from(multipart_body(files))).unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_str(&body_text(response).await).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ocr_capability() {
        let response = app().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["ocrAvailable"], false);
    }

    #[tokio::test]
    async fn upload_then_download_exports() {
        let app = app();
        let response = app
            .clone()
            .oneshot(upload_request(
                &[(
                    "files",
                    "john.txt",
                    "John Smith\njohn.smith@example.com\nSkills: Python, SQL",
                )],
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let session_id = json["session_id"].as_str().unwrap().to_string();
        assert_eq!(json["results"][0]["Name"], "John Smith");
        assert_eq!(json["results"][0]["Email"], "john.smith@example.com");
        assert_eq!(json["results"][0]["Phone"], "Not found");
        assert_eq!(json["results"][0]["Skills"], "Python, SQL");
        assert_eq!(json["summary"], "Name: John Smith\nSkills: Python, SQL");
        assert_eq!(json["csv_url"], format!("/download/{session_id}/csv"));
        assert_eq!(
            json["summary_url"],
            format!("/download/{session_id}/summary")
        );

        let csv = app
            .clone()
            .oneshot(get_request(&format!("/download/{session_id}/csv")))
            .await
            .unwrap();
        assert_eq!(csv.status(), StatusCode::OK);
        assert!(csv
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .starts_with("attachment; filename=\"resume_results_"));
        let csv_text = body_text(csv).await;
        assert!(csv_text.starts_with("Name,Email,Phone,Skills"));
        assert!(csv_text.contains("\"Python, SQL\""));

        let summary = app
            .clone()
            .oneshot(get_request(&format!("/download/{session_id}/summary")))
            .await
            .unwrap();
        assert_eq!(summary.status(), StatusCode::OK);
        assert_eq!(body_text(summary).await, "Name: John Smith\nSkills: Python, SQL");

        let results = app
            .oneshot(get_request(&format!("/results/{session_id}")))
            .await
            .unwrap();
        assert_eq!(results.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn session_header_is_reused() {
        let session = Uuid::new_v4().to_string();
        let response = app()
            .oneshot(upload_request(&[("files", "a.txt", "Ada Lovelace")], Some(&session)))
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["session_id"], session.as_str());
    }

    #[tokio::test]
    async fn unsupported_file_rejects_batch() {
        let response = app()
            .oneshot(upload_request(&[("files", "tool.exe", "MZ")], None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["error"], "Unsupported format: tool.exe");
        assert_eq!(json["code"], "UNSUPPORTED_FORMAT");
    }

    #[tokio::test]
    async fn missing_files_are_client_errors() {
        let response = app()
            .oneshot(upload_request(&[("other", "a.txt", "x")], None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "INVALID_REQUEST");

        let response = app()
            .oneshot(upload_request(&[("files", "", "")], None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "No files uploaded");
        assert_eq!(json["code"], "EMPTY_BATCH");
    }

    #[tokio::test]
    async fn download_without_results_is_not_found() {
        let session = Uuid::new_v4();
        for path in ["csv", "summary"] {
            let response = app()
                .oneshot(get_request(&format!("/download/{session}/{path}")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn malformed_session_header_gets_a_fresh_id() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, "../../etc".parse().unwrap());
        let issued = session_id_from(&headers);
        assert!(Uuid::parse_str(&issued).is_ok());
        assert_ne!(issued, "../../etc");
    }
}
