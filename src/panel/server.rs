use axum::{
    Json, Router,
    extract::{Path as UrlPath, Request, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::host::ExtensionHost;
use super::{PanelMessage, dispatch};

/// Path prefix under which local files are served
pub const RESOURCE_PREFIX: &str = "/resource";

#[derive(Clone)]
struct PanelState {
    page: Arc<String>,
    host: Arc<dyn ExtensionHost>,
    roots: Arc<Vec<PathBuf>>,
}

/// Routes for one page. Only files below `roots` are served as resources.
pub fn router(page: String, host: Arc<dyn ExtensionHost>, roots: Vec<PathBuf>) -> Router {
    let roots = roots
        .into_iter()
        .map(|root| std::fs::canonicalize(&root).unwrap_or(root))
        .collect();

    let state = PanelState {
        page: Arc::new(page),
        host,
        roots: Arc::new(roots),
    };

    Router::new()
        .route("/", get(serve_page))
        .route("/message", post(handle_message))
        .route("/resource/{*path}", get(serve_resource))
        .with_state(state)
}

/// Run until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, router: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("Preview server listening on http://{}", addr);
    }
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Preview server stopped");
    Ok(())
}

async fn serve_page(State(state): State<PanelState>) -> Html<String> {
    Html(state.page.as_ref().clone())
}

async fn handle_message(
    State(state): State<PanelState>,
    Json(message): Json<PanelMessage>,
) -> std::result::Result<StatusCode, (StatusCode, String)> {
    debug!("Panel message: {:?}", message);
    match dispatch(state.host.as_ref(), message).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Panel message failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

async fn serve_resource(
    State(state): State<PanelState>,
    UrlPath(path): UrlPath<String>,
    request: Request,
) -> Response {
    let requested = PathBuf::from(format!("/{}", path.trim_start_matches('/')));

    let resolved = match tokio::fs::canonicalize(&requested).await {
        Ok(resolved) => resolved,
        Err(e) => {
            debug!("Resource {} unavailable: {}", requested.display(), e);
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    if !state.roots.iter().any(|root| resolved.starts_with(root)) {
        warn!("Refusing resource outside the extension: {}", resolved.display());
        return StatusCode::FORBIDDEN.into_response();
    }

    match ServeFile::new(&resolved).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LensError;
    use crate::host::MockExtensionHost;
    use assert_fs::prelude::*;
    use assert_fs::TempDir;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request as HttpRequest, header};

    fn get_request(uri: &str) -> HttpRequest<Body> {
        HttpRequest::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_message(json: &str) -> HttpRequest<Body> {
        HttpRequest::builder()
            .method("POST")
            .uri("/message")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn app(host: MockExtensionHost, roots: Vec<PathBuf>) -> Router {
        router("<p>page</p>".to_string(), Arc::new(host), roots)
    }

    #[tokio::test]
    async fn test_serves_page() {
        let response = app(MockExtensionHost::new(), vec![])
            .oneshot(get_request("/"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "<p>page</p>");
    }

    #[tokio::test]
    async fn test_message_is_dispatched() {
        let mut host = MockExtensionHost::new();
        host.expect_open_external()
            .withf(|url: &str| url == "https://example.com")
            .times(1)
            .returning(|_| Ok(()));

        let response = app(host, vec![])
            .oneshot(post_message(r#"{"command":"openExternal","href":"https://example.com"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn test_failed_message_reports_error() {
        let mut host = MockExtensionHost::new();
        host.expect_open_file()
            .returning(|_| Err(LensError::Host("opener missing".to_string())));

        let response = app(host, vec![])
            .oneshot(post_message(r#"{"command":"openFile","path":"/tmp/x.md"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body_text(response).await.contains("opener missing"));
    }

    #[tokio::test]
    async fn test_serves_resources_under_root() {
        let root = TempDir::new().unwrap();
        root.child("images/logo.svg").write_str("<svg/>").unwrap();
        let path = std::fs::canonicalize(root.path()).unwrap().join("images/logo.svg");

        let response = app(MockExtensionHost::new(), vec![root.path().to_path_buf()])
            .oneshot(get_request(&format!("{}{}", RESOURCE_PREFIX, path.display())))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "<svg/>");
    }

    #[tokio::test]
    async fn test_rejects_resources_outside_root() {
        let root = TempDir::new().unwrap();
        let other = TempDir::new().unwrap();
        other.child("secret.txt").write_str("secret").unwrap();
        root.child("README.md").write_str("readme").unwrap();
        let root_path = std::fs::canonicalize(root.path()).unwrap();
        let other_path = std::fs::canonicalize(other.path()).unwrap();
        let app = app(MockExtensionHost::new(), vec![root.path().to_path_buf()]);

        let response = app
            .clone()
            .oneshot(get_request(&format!(
                "{}{}",
                RESOURCE_PREFIX,
                other_path.join("secret.txt").display()
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = app
            .oneshot(get_request(&format!(
                "{}{}/missing.png",
                RESOURCE_PREFIX,
                root_path.display()
            )))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
