//! Axum router construction and route mapping.
//!
//! The [`app`] function wires the four upload endpoints (nested under the
//! configured route prefix), the health and metrics probes, and the
//! OpenAPI document, and returns a ready-to-serve [`axum::Router`].

use axum::{
    http::{HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::errors::generate_request_id;
use crate::handlers;
use crate::metrics::{metrics_handler, metrics_middleware};
use crate::AppState;

// -- OpenAPI specification ----------------------------------------------------

/// OpenAPI documentation for the Partgate upload API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Partgate Multipart Upload API",
        version = "0.1.0",
        description = "Multipart upload orchestration for S3-compatible object stores"
    ),
    paths(
        health_check,
        crate::handlers::initiate,
        crate::handlers::presign_part,
        crate::handlers::complete,
        crate::handlers::abort,
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Upload", description = "Multipart upload lifecycle operations"),
    )
)]
struct ApiDoc;

/// Build the axum [`Router`] with all routes.
///
/// The upload routes are mounted under `routes.prefix` only when
/// `routes.enabled` is set; health and metrics endpoints follow the
/// observability config. The returned router is ready to be passed to
/// `axum::serve`.
pub fn app(state: Arc<AppState>) -> Router {
    let mut router = Router::new().route("/openapi.json", get(openapi_spec));

    if state.config.observability.health_check {
        router = router.route("/health", get(health_check));
    }
    if state.config.observability.metrics {
        router = router.route("/metrics", get(metrics_handler));
    }

    if state.config.routes.enabled {
        let api = Router::new()
            .route("/initiate", post(handlers::initiate))
            .route("/presign-part", post(handlers::presign_part))
            .route("/complete", post(handlers::complete))
            .route("/abort", post(handlers::abort));
        router = router.nest(&normalize_prefix(&state.config.routes.prefix), api);
    }

    router
        // Application state shared across all handlers.
        .with_state(state)
        // Layer ordering: inner layers run first, outer layers wrap them.
        .layer(middleware::from_fn(common_headers_middleware))
        // metrics_middleware is outer (captures full request lifecycle).
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        // Browser clients talk to this API before PUTting parts cross-origin.
        .layer(CorsLayer::permissive())
}

/// Ensure the configured route prefix is a valid nesting path.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

// -- Common headers middleware -----------------------------------------------

/// Tower middleware that adds common response headers to every response:
/// - `x-request-id`: 16-character uppercase hex string
/// - `Date`: RFC 7231 formatted timestamp
/// - `Server`: `Partgate`
async fn common_headers_middleware(req: Request<axum::body::Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    // Only set x-request-id if not already present (error handler may set it)
    if !headers.contains_key("x-request-id") {
        let request_id = generate_request_id();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert("x-request-id", value);
        }
    }

    let date = httpdate::fmt_http_date(std::time::SystemTime::now());
    // Always overwrite Date and Server to ensure consistency
    if let Ok(value) = HeaderValue::from_str(&date) {
        headers.insert("date", value);
    }
    headers.insert("server", HeaderValue::from_static("Partgate"));

    response
}

// -- Health check ------------------------------------------------------------

/// `GET /health` -- Returns `{"status": "ok"}` with 200 OK.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    operation_id = "HealthCheck",
    responses(
        (status = 200, description = "Health check OK")
    )
)]
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "application/json")],
        r#"{"status":"ok"}"#,
    )
}

/// `GET /openapi.json` -- the generated OpenAPI document.
async fn openapi_spec() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// -- Tests --------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::coordinator::UploadCoordinator;
    use crate::store::binding::fake::FakeStore;
    use axum::body::Body;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        test_state_with(Config::default())
    }

    fn test_state_with(config: Config) -> Arc<AppState> {
        let store = Arc::new(FakeStore::new());
        let coordinator = UploadCoordinator::new(
            store,
            config.upload.key_prefix.clone(),
            Duration::from_secs(config.upload.presign_expiry_secs),
        );
        Arc::new(AppState {
            config,
            coordinator,
        })
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app(test_state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(response.headers()["server"], "Partgate");
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_initiate_returns_upload_id_and_file_path() {
        let response = app(test_state())
            .oneshot(post_json(
                "/api/s3/multipart/initiate",
                json!({"file_name": "report.pdf"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["upload_id"], "upload-1");
        let file_path = body["file_path"].as_str().unwrap();
        assert!(file_path.starts_with("uploads/multipart/"));
        assert!(file_path.ends_with("-report.pdf"));
    }

    #[tokio::test]
    async fn test_initiate_missing_file_name_is_client_fault() {
        let response = app(test_state())
            .oneshot(post_json(
                "/api/s3/multipart/initiate",
                json!({"content_type": "image/png"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_initiate_empty_file_name_is_validation_error() {
        let response = app(test_state())
            .oneshot(post_json(
                "/api/s3/multipart/initiate",
                json!({"file_name": ""}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"]["type"], "validation");
    }

    #[tokio::test]
    async fn test_presign_part_zero_part_number_rejected() {
        let response = app(test_state())
            .oneshot(post_json(
                "/api/s3/multipart/presign-part",
                json!({"upload_id": "U1", "file_path": "k", "part_number": 0}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_full_upload_flow_over_http() {
        let state = test_state();
        let app = app(state);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/s3/multipart/initiate",
                json!({"file_name": "report.pdf", "content_type": "application/pdf"}),
            ))
            .await
            .unwrap();
        let initiated = body_json(response).await;
        let upload_id = initiated["upload_id"].as_str().unwrap().to_string();
        let file_path = initiated["file_path"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/s3/multipart/presign-part",
                json!({"upload_id": upload_id, "file_path": file_path, "part_number": 2}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let presigned = body_json(response).await;
        assert_eq!(presigned["part_number"], 2);
        let url = presigned["presigned_url"].as_str().unwrap();
        assert!(url.contains("partNumber=2"));
        assert!(url.contains(&format!("uploadId={upload_id}")));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(presigned["headers"].as_object().unwrap().is_empty());

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/s3/multipart/complete",
                json!({
                    "upload_id": upload_id,
                    "file_path": file_path,
                    "parts": [
                        {"part_number": 2, "etag": "e2"},
                        {"part_number": 1, "etag": "e1"}
                    ]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let completed = body_json(response).await;
        assert_eq!(completed["file_path"], file_path);
        assert!(!completed["location"].is_null());
    }

    #[tokio::test]
    async fn test_complete_with_empty_parts_rejected() {
        let response = app(test_state())
            .oneshot(post_json(
                "/api/s3/multipart/complete",
                json!({"upload_id": "U1", "file_path": "k", "parts": []}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_abort_then_abort_again() {
        let state = test_state();
        let app = app(state);

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/s3/multipart/abort",
                json!({"upload_id": "U1", "file_path": "k"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Multipart upload aborted");

        // The store no longer knows the upload: deterministic 404.
        let response = app
            .oneshot(post_json(
                "/api/s3/multipart/abort",
                json!({"upload_id": "U1", "file_path": "k"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "NoSuchUpload");
    }

    #[tokio::test]
    async fn test_routes_disabled_unmounts_upload_api() {
        let mut config = Config::default();
        config.routes.enabled = false;

        let response = app(test_state_with(config))
            .oneshot(post_json(
                "/api/s3/multipart/initiate",
                json!({"file_name": "a.bin"}),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_custom_route_prefix() {
        let mut config = Config::default();
        config.routes.prefix = "/uploads".to_string();

        let response = app(test_state_with(config))
            .oneshot(post_json("/uploads/initiate", json!({"file_name": "a.bin"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_openapi_spec_served() {
        let response = app(test_state())
            .oneshot(
                Request::builder()
                    .uri("/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["paths"].get("/initiate").is_some());
    }

    #[test]
    fn test_normalize_prefix() {
        assert_eq!(normalize_prefix("/api/s3/multipart"), "/api/s3/multipart");
        assert_eq!(normalize_prefix("uploads"), "/uploads");
        assert_eq!(normalize_prefix("/uploads/"), "/uploads");
        assert_eq!(normalize_prefix(""), "/");
    }
}
