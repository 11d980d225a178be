//! HTTP surface: `POST /extract` and `GET /health`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;
use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::{Method, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{debug, error, info, warn};

use lineitem_core::models::config::ServerConfig;
use lineitem_core::{DocumentExtractor, ExtractionResult, LineitemConfig, LineitemError};

/// Multipart field carrying the document.
pub const UPLOAD_FIELD: &str = "pdfFile";

/// Body message for every extraction failure.
pub const FAILURE_MESSAGE: &str = "Failed to process PDF";

// ============================================================================
// AppState
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    extractor: Arc<DocumentExtractor>,
    timeout: Option<Duration>,
}

impl AppState {
    pub fn new(extractor: DocumentExtractor, timeout: Option<Duration>) -> Self {
        Self {
            extractor: Arc::new(extractor),
            timeout,
        }
    }

    pub fn from_config(config: &LineitemConfig) -> Self {
        Self::new(
            DocumentExtractor::from_config(config),
            config.extraction_timeout(),
        )
    }

    /// Run the blocking pipeline off the async workers, bounded by the timeout.
    async fn extract(&self, data: Bytes) -> anyhow::Result<ExtractionResult> {
        let extractor = Arc::clone(&self.extractor);
        let task = tokio::task::spawn_blocking(move || extractor.extract(&data));

        let joined = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, task)
                .await
                .map_err(|_| anyhow!("extraction timed out after {:?}", limit))?,
            None => task.await,
        };

        Ok(joined??)
    }
}

// ============================================================================
// Error type
// ============================================================================

struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.0, Json(serde_json::json!({"error": self.1}))).into_response()
    }
}

fn extraction_failure() -> AppError {
    AppError(StatusCode::INTERNAL_SERVER_ERROR, FAILURE_MESSAGE.to_string())
}

fn bad_request(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::BAD_REQUEST, msg.into())
}

fn multipart_failure(err: MultipartError) -> AppError {
    let status = err.status();
    warn!("Failed to read upload: {} ({})", err.body_text(), status);
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        AppError(status, err.body_text())
    } else {
        extraction_failure()
    }
}

fn rejected_upload(rejection: MultipartRejection) -> AppError {
    let status = rejection.status();
    warn!("Rejected upload: {} ({})", rejection.body_text(), status);
    AppError(status, rejection.body_text())
}

// ============================================================================
// Handlers
// ============================================================================

/// A document received in a request.
struct UploadedDocument {
    file_name: Option<String>,
    data: Bytes,
}

impl UploadedDocument {
    fn label(&self) -> &str {
        self.file_name.as_deref().unwrap_or("<unnamed>")
    }
}

async fn read_upload(multipart: &mut Multipart) -> Result<UploadedDocument, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_failure)? {
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Skipping multipart field {:?}", field.name());
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        let data = field.bytes().await.map_err(multipart_failure)?;
        return Ok(UploadedDocument { file_name, data });
    }

    Err(bad_request(format!("Missing {} field", UPLOAD_FIELD)))
}

/// POST /extract - Derive line items from an uploaded PDF
async fn extract_handler(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ExtractionResult>, AppError> {
    let start = Instant::now();
    let mut multipart = multipart.map_err(rejected_upload)?;
    let upload = read_upload(&mut multipart).await?;
    let label = upload.label().to_string();
    let size = upload.data.len();

    let result = state.extract(upload.data).await.map_err(|e| {
        match e.downcast_ref::<LineitemError>() {
            Some(err) if err.is_document_error() => {
                warn!("Rejected {} ({} bytes): {}", label, size, err)
            }
            _ => error!("Failed to process {} ({} bytes): {:#}", label, size, e),
        }
        extraction_failure()
    })?;

    info!(
        "Extracted {} items from {} ({} bytes, {} pages) in {:?}",
        result.len(),
        label,
        size,
        result.page_count,
        start.elapsed()
    );
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    engine: &'static str,
    timestamp: String,
}

/// GET /health - Health check
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        engine: state.extractor.engine_name(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

// ============================================================================
// Router
// ============================================================================

/// Build the application router.
pub fn router(state: AppState, server: &ServerConfig) -> Router {
    let app = Router::new()
        .route("/extract", post(extract_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server.max_upload_bytes))
        .with_state(state);

    if server.allow_any_origin {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any);
        app.layer(cors)
    } else {
        app
    }
}

/// Bind and serve until Ctrl+C.
pub async fn serve(config: &LineitemConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(config);
    let engine = state.extractor.engine_name();
    let app = router(state, &config.server);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .map_err(|e| anyhow!("Failed to bind to {}: {}", config.server.bind, e))?;

    info!(
        "Listening on {} (engine: {}, max upload: {} bytes)",
        listener.local_addr()?,
        engine,
        config.server.max_upload_bytes
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use lineitem_core::pdf::{fixture, PdfDocument, TextEngine};
    use lineitem_core::PdfError;
    use pretty_assertions::assert_eq;
    use serde_json::Value;
    use tower::ServiceExt;

    const BOUNDARY: &str = "lineitem-test-boundary";

    fn app() -> Router {
        let config = LineitemConfig::default();
        router(AppState::from_config(&config), &config.server)
    }

    fn multipart_body(field: &str, data: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"doc.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn upload(field: &str, data: &[u8]) -> Request<Body> {
        let body = multipart_body(field, data);
        Request::builder()
            .method("POST")
            .uri("/extract")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .header(header::CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let body = res.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, value)
    }

    fn descriptions(body: &Value) -> Vec<String> {
        body["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["description"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_extract_returns_items() {
        let pdf = fixture::text_pdf(&["Header", "Item: Widget A", "Footer", "item count 3"]).unwrap();
        let (status, body) = send(app(), upload(UPLOAD_FIELD, &pdf)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(descriptions(&body), vec!["Item: Widget A", "item count 3"]);
        for item in body["items"].as_array().unwrap() {
            assert_eq!(item["stockCode"], "123ABC");
            assert_eq!(item["quantity"], "1");
            assert_eq!(item["unitPrice"], "10.00");
        }
        assert_eq!(body.as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_extract_no_matches_is_empty_list() {
        let pdf = fixture::text_pdf(&["Header", "Footer"]).unwrap();
        let (status, body) = send(app(), upload(UPLOAD_FIELD, &pdf)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"items": []}));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_500() {
        let (status, body) = send(app(), upload(UPLOAD_FIELD, b"not a pdf at all")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"error": "Failed to process PDF"}));
        assert!(body.get("items").is_none());
    }

    #[tokio::test]
    async fn test_zero_page_document_is_empty_list() {
        let pdf = fixture::paged_pdf(&[]).unwrap();
        let (status, body) = send(app(), upload(UPLOAD_FIELD, &pdf)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"items": []}));
    }

    #[tokio::test]
    async fn test_encrypted_document_with_empty_password() {
        let pdf = fixture::encrypted_pdf(&["Header", "Item: Widget A"], "").unwrap();
        let (status, body) = send(app(), upload(UPLOAD_FIELD, &pdf)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(descriptions(&body), vec!["Item: Widget A"]);
    }

    #[tokio::test]
    async fn test_encrypted_document_without_decryption_is_500() {
        let mut config = LineitemConfig::default();
        config.pdf.decrypt_empty_password = false;
        let app = router(AppState::from_config(&config), &config.server);

        let pdf = fixture::encrypted_pdf(&["Item: Widget A"], "").unwrap();
        let (status, body) = send(app, upload(UPLOAD_FIELD, &pdf)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"error": "Failed to process PDF"}));
    }

    #[tokio::test]
    async fn test_password_protected_document_is_500() {
        let pdf = fixture::encrypted_pdf(&["Item: Widget A"], "s3cret").unwrap();
        let (status, body) = send(app(), upload(UPLOAD_FIELD, &pdf)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_non_multipart_request_is_json_400() {
        let req = Request::builder()
            .method("POST")
            .uri("/extract")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"pdfFile": "nope"}"#))
            .unwrap();
        let (status, body) = send(app(), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|msg| !msg.is_empty()));
    }

    #[tokio::test]
    async fn test_missing_content_type_is_json_400() {
        let req = Request::builder()
            .method("POST")
            .uri("/extract")
            .body(Body::from("raw bytes"))
            .unwrap();
        let (status, body) = send(app(), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_empty_upload_is_500() {
        let (status, body) = send(app(), upload(UPLOAD_FIELD, b"")).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_missing_field_is_400() {
        let pdf = fixture::text_pdf(&["item"]).unwrap();
        let (status, body) = send(app(), upload("document", &pdf)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing pdfFile field");
    }

    #[tokio::test]
    async fn test_same_document_twice_is_identical() {
        let pdf = fixture::text_pdf(&["item one", "other", "ITEM two"]).unwrap();
        let app = app();

        let (_, first) = send(app.clone(), upload(UPLOAD_FIELD, &pdf)).await;
        let (_, second) = send(app, upload(UPLOAD_FIELD, &pdf)).await;
        assert_eq!(first, second);
        assert_eq!(descriptions(&first), vec!["item one", "ITEM two"]);
    }

    #[tokio::test]
    async fn test_oversized_upload_is_rejected() {
        let mut config = LineitemConfig::default();
        config.server.max_upload_bytes = 64;
        let app = router(AppState::from_config(&config), &config.server);

        let pdf = fixture::text_pdf(&["item"]).unwrap();
        let res = app.oneshot(upload(UPLOAD_FIELD, &pdf)).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    struct SlowEngine;

    impl TextEngine for SlowEngine {
        fn name(&self) -> &'static str {
            "slow"
        }

        fn extract_text(&self, _document: &PdfDocument) -> Result<String, PdfError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok("item late".to_string())
        }
    }

    #[tokio::test]
    async fn test_timeout_is_500() {
        let config = LineitemConfig::default();
        let extractor = DocumentExtractor::new().with_engine(Box::new(SlowEngine));
        let state = AppState::new(extractor, Some(Duration::from_millis(20)));
        let app = router(state, &config.server);

        let pdf = fixture::text_pdf(&["item"]).unwrap();
        let (status, body) = send(app, upload(UPLOAD_FIELD, &pdf)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn test_health() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body) = send(app(), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["engine"], "pdf-extract");
    }

    #[tokio::test]
    async fn test_cors_header_present() {
        let req = Request::builder()
            .uri("/health")
            .header(header::ORIGIN, "http://localhost:3000")
            .body(Body::empty())
            .unwrap();
        let res = app().oneshot(req).await.unwrap();

        assert_eq!(
            res.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_get_extract_not_allowed() {
        let req = Request::builder().uri("/extract").body(Body::empty()).unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
