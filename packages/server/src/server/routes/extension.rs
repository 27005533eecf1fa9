//! Extension mediator: the capture agent polls for a command and posts
//! back the HTML it captured. Each slot holds only the latest write.

use axum::{
    body::Bytes,
    extract::{Extension, Path},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::common::parse_http_url;
use crate::domains::extension::{CapturedHtml, ExtensionAction, ExtensionCommand};
use crate::server::app::AppState;
use crate::server::error::{company_id_from_path, decode_body, ApiError, ApiResult};

#[derive(Debug, Deserialize)]
struct CommandBody {
    action: ExtensionAction,
    url: String,
}

#[derive(Debug, Deserialize)]
struct HtmlBody {
    html: String,
    /// Page the HTML was captured from; defaults to the pending command's URL
    #[serde(default)]
    url: Option<String>,
}

pub async fn post_command_handler(
    Extension(state): Extension<AppState>,
    Path(company_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<ExtensionCommand>> {
    let company_id = company_id_from_path(&company_id)?;
    let body: CommandBody = decode_body(&body)?;
    let url = parse_http_url(&body.url)
        .ok_or_else(|| ApiError::unprocessable("url must be an absolute http(s) URL"))?;

    let command = ExtensionCommand {
        action: body.action,
        url: url.to_string(),
        issued_at: chrono::Utc::now(),
    };
    state
        .server_deps
        .extension_channel()
        .push_command(&company_id, &command)
        .await?;

    info!(company_id = %company_id, url = %command.url, "Extension command accepted");
    Ok(Json(command))
}

pub async fn get_command_handler(
    Extension(state): Extension<AppState>,
    Path(company_id): Path<String>,
) -> ApiResult<Json<ExtensionCommand>> {
    let company_id = company_id_from_path(&company_id)?;
    state
        .server_deps
        .extension_channel()
        .pending_command(&company_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no pending command for {}", company_id)))
}

pub async fn post_html_handler(
    Extension(state): Extension<AppState>,
    Path(company_id): Path<String>,
    body: Bytes,
) -> ApiResult<Json<CapturedHtml>> {
    let company_id = company_id_from_path(&company_id)?;
    let body: HtmlBody = decode_body(&body)?;
    if body.html.trim().is_empty() {
        return Err(ApiError::unprocessable("html must not be empty"));
    }
    let url = match body.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        Some(raw) => Some(
            parse_http_url(raw)
                .ok_or_else(|| ApiError::unprocessable("url must be an absolute http(s) URL"))?
                .to_string(),
        ),
        None => None,
    };

    let capture = state
        .server_deps
        .extension_channel()
        .store_capture(&company_id, &body.html, url.as_deref())
        .await?;

    info!(company_id = %company_id, bytes = body.html.len(), "Extension capture accepted");
    Ok(Json(capture))
}

pub async fn get_html_handler(
    Extension(state): Extension<AppState>,
    Path(company_id): Path<String>,
) -> ApiResult<Json<CapturedHtml>> {
    let company_id = company_id_from_path(&company_id)?;
    state
        .server_deps
        .extension_channel()
        .captured_html(&company_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("no captured html for {}", company_id)))
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::kernel::test_dependencies::MemoryCache;
    use crate::kernel::TestDependencies;
    use crate::server::build_app;

    fn app(test_deps: &TestDependencies) -> Router {
        build_app(Arc::new(test_deps.server_deps()))
    }

    async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(json) => Body::from(json.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn empty_slots_answer_404() {
        let test_deps = TestDependencies::new();

        let (status, body) = send(app(&test_deps), Method::GET, "/extension/acme/command", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "NOT_FOUND");

        let (status, _) = send(app(&test_deps), Method::GET, "/extension/acme/html", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn command_round_trips_through_the_slot() {
        let test_deps = TestDependencies::new();

        let (status, _) = send(
            app(&test_deps),
            Method::POST,
            "/extension/acme/command",
            Some(json!({"action": "capture-html", "url": "https://acme.test/careers"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(app(&test_deps), Method::GET, "/extension/acme/command", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], "capture-html");
        assert_eq!(body["url"], "https://acme.test/careers");

        // other companies have their own slot
        let (status, _) = send(app(&test_deps), Method::GET, "/extension/globex/command", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn latest_capture_wins() {
        let test_deps = TestDependencies::new();

        for html in ["<p>first</p>", "<p>second</p>"] {
            let (status, _) = send(
                app(&test_deps),
                Method::POST,
                "/extension/acme/html",
                Some(json!({ "html": html })),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }

        let (status, body) = send(app(&test_deps), Method::GET, "/extension/acme/html", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["html"], "<p>second</p>");
        assert!(body["capturedAt"].is_string());
    }

    #[tokio::test]
    async fn malformed_requests_answer_422() {
        let test_deps = TestDependencies::new();

        let cases = [
            ("/extension/acme/command", json!({"action": "reboot", "url": "https://acme.test"})),
            ("/extension/acme/command", json!({"action": "capture-html", "url": "ftp://acme.test"})),
            ("/extension/acme/command", json!({"url": "https://acme.test"})),
            ("/extension/acme/html", json!({"html": "   "})),
            ("/extension/acme/html", json!({"markup": "<p/>"})),
            ("/extension/acme/html", json!({"html": "<p/>", "url": "mailto:jobs@acme.test"})),
            ("/extension/%20/html", json!({"html": "<p/>"})),
        ];

        for (uri, body) in cases {
            let (status, json) = send(app(&test_deps), Method::POST, uri, Some(body)).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{uri}");
            assert_eq!(json["code"], "VALIDATION_ERROR");
        }
        assert!(test_deps.cache.value("extension:acme:command").is_none());
        assert!(test_deps.cache.value("extension:acme:html").is_none());
    }

    #[tokio::test]
    async fn cache_outage_answers_500() {
        let test_deps = TestDependencies::new().cache(MemoryCache::new().failing());

        let (status, body) = send(app(&test_deps), Method::GET, "/extension/acme/html", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }

    #[tokio::test]
    async fn large_captures_are_accepted() {
        let test_deps = TestDependencies::new();
        let html = format!("<ul>{}</ul>", "<li class='job'>Role</li>".repeat(130_000));
        assert!(html.len() > 3 * 1024 * 1024);

        let (status, _) = send(
            app(&test_deps),
            Method::POST,
            "/extension/acme/html",
            Some(json!({ "html": html })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(test_deps.cache.value("extension:acme:html").unwrap().len() > html.len());
    }

    #[tokio::test]
    async fn captures_above_the_configured_limit_answer_413() {
        let test_deps = TestDependencies::new();
        let app = build_app(Arc::new(test_deps.server_deps().with_max_capture_bytes(1024)));

        let (status, _) = send(
            app,
            Method::POST,
            "/extension/acme/html",
            Some(json!({ "html": "x".repeat(2048) })),
        )
        .await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(test_deps.cache.value("extension:acme:html").is_none());
    }

    #[tokio::test]
    async fn capture_records_its_page() {
        let test_deps = TestDependencies::new();
        send(
            app(&test_deps),
            Method::POST,
            "/extension/acme/command",
            Some(json!({"action": "capture-html", "url": "https://acme.test/careers"})),
        )
        .await;

        let (status, body) = send(
            app(&test_deps),
            Method::POST,
            "/extension/acme/html",
            Some(json!({"html": "<p>jobs</p>"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["url"], "https://acme.test/careers");
    }

    #[tokio::test]
    async fn company_ids_with_spaces_have_their_own_slot() {
        let test_deps = TestDependencies::new();

        let (status, _) = send(
            app(&test_deps),
            Method::POST,
            "/extension/Acme%20Corp/html",
            Some(json!({"html": "<p/>"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(test_deps.cache.value("extension:Acme Corp:html").is_some());
    }
}
