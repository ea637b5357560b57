//! Reverse proxy and static file server for the built site.
//!
//! Requests under the API prefix are forwarded to the CMS origin with the
//! prefix stripped and permissive CORS headers added. Everything else is
//! served from the build directory, falling back to `index.html` so
//! client-side routes resolve.

pub mod error;
mod forward;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::http::Uri;
use axum::routing::{any, get};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use strandly_content::build_passthrough_client;
use strandly_shared::AppConfig;

pub use error::ProxyError;

/// Shared, immutable per-server state.
#[derive(Debug, Clone)]
pub struct ProxyState {
    pub(crate) http: reqwest::Client,
    /// CMS origin without trailing slash.
    pub(crate) upstream: String,
    /// Path prefix stripped before forwarding, e.g. `/api`.
    pub(crate) prefix: String,
    /// Bearer token injected when the client sent none.
    pub(crate) token: Option<String>,
    pub(crate) static_dir: PathBuf,
}

impl ProxyState {
    pub fn new(
        http: reqwest::Client,
        upstream: impl Into<String>,
        prefix: impl Into<String>,
        token: Option<String>,
        static_dir: impl Into<PathBuf>,
    ) -> Self {
        let prefix = prefix.into();
        Self {
            http,
            upstream: upstream.into().trim_end_matches('/').to_string(),
            prefix: prefix.trim_end_matches('/').to_string(),
            token,
            static_dir: static_dir.into(),
        }
    }

    /// State for `[cms]` and `[server]` settings.
    pub fn from_config(config: &AppConfig) -> Result<Self, ProxyError> {
        let http = build_passthrough_client(config.cms.timeout_secs)?;
        Ok(Self::new(
            http,
            config.cms.url.clone(),
            config.server.api_prefix.clone(),
            config.cms_token(),
            config.server.static_dir.clone(),
        ))
    }

    /// Upstream URL for an incoming request URI: prefix stripped, query kept.
    pub fn upstream_url(&self, uri: &Uri) -> String {
        let path = uri.path();
        let rest = path.strip_prefix(self.prefix.as_str()).unwrap_or(path);
        let rest = if rest.is_empty() { "/" } else { rest };

        match uri.query() {
            Some(query) => format!("{}{rest}?{query}", self.upstream),
            None => format!("{}{rest}", self.upstream),
        }
    }
}

/// Build the application router.
pub fn router(state: ProxyState) -> Router {
    let index = state.static_dir.join("index.html");
    let static_files = ServeDir::new(&state.static_dir).fallback(ServeFile::new(index));

    let api_root = if state.prefix.is_empty() {
        "/".to_string()
    } else {
        state.prefix.clone()
    };
    let api_rest = format!("{}/*rest", state.prefix);

    Router::new()
        .route("/health", get(health_check))
        .route(&api_root, any(forward::handle))
        .route(&api_rest, any(forward::handle))
        .fallback_service(static_files)
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

/// Bind `[server].host:port` and serve until Ctrl-C.
pub async fn serve(config: &AppConfig) -> Result<(), ProxyError> {
    let state = ProxyState::from_config(config)?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| ProxyError::Bind {
            addr: addr.clone(),
            source,
        })?;
    let local: SocketAddr = listener.local_addr()?;

    info!(
        addr = %local,
        upstream = %state.upstream,
        prefix = %state.prefix,
        static_dir = %state.static_dir.display(),
        "proxy listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("proxy stopped");
    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;
    use wiremock::matchers::{body_string, header as header_eq, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn static_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("strandly-proxy-{name}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("index.html"), "<!doctype html><div id=root></div>").unwrap();
        std::fs::write(dir.join("app.js"), "console.log('app')").unwrap();
        dir
    }

    fn state(upstream: &str, token: Option<&str>, dir: PathBuf) -> ProxyState {
        ProxyState::new(
            reqwest::Client::new(),
            upstream,
            "/api",
            token.map(String::from),
            dir,
        )
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn upstream_url_strips_prefix_and_keeps_query() {
        let s = state("https://cms.test/", None, PathBuf::from("dist"));
        let uri: Uri = "/api/items/posts?filter[titles][_nnull]=true".parse().unwrap();
        assert_eq!(
            s.upstream_url(&uri),
            "https://cms.test/items/posts?filter[titles][_nnull]=true"
        );
        assert_eq!(s.upstream_url(&"/api".parse().unwrap()), "https://cms.test/");
    }

    #[tokio::test]
    async fn preflight_short_circuits_with_cors() {
        // Unroutable upstream: a forwarded request would fail.
        let app = router(state("http://127.0.0.1:9", None, static_dir("preflight")));
        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/items/posts")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_HEADERS],
            "Origin, X-Requested-With, Content-Type, Accept, Authorization"
        );
    }

    #[tokio::test]
    async fn forwards_get_with_token_and_query() {
        let cms = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items/posts"))
            .and(query_param("fields", "id,titles"))
            .and(header_eq("authorization", "Bearer server-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": [{"id": 1}]}))
                    .insert_header("access-control-allow-origin", "https://cms.test"),
            )
            .expect(1)
            .mount(&cms)
            .await;

        let app = router(state(&cms.uri(), Some("server-token"), static_dir("get")));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/items/posts?fields=id,titles")
                    .header(header::HOST, "localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(body_text(response).await.contains("\"id\":1"));
    }

    #[tokio::test]
    async fn client_authorization_is_kept() {
        let cms = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_eq("authorization", "Bearer client-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})))
            .expect(1)
            .mount(&cms)
            .await;

        let app = router(state(&cms.uri(), Some("server-token"), static_dir("auth")));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/items/post_tags")
                    .header(header::AUTHORIZATION, "Bearer client-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn forwards_post_body_and_upstream_status() {
        let cms = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/items/waitlist"))
            .and(body_string(r#"{"email":"a@b.c"}"#))
            .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
                "errors": [{"message": "You don't have permission to access this."}]
            })))
            .expect(1)
            .mount(&cms)
            .await;

        let app = router(state(&cms.uri(), None, static_dir("post")));
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/items/waitlist")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"email":"a@b.c"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(body_text(response).await.contains("permission"));
    }

    #[tokio::test]
    async fn upstream_redirect_is_passed_through() {
        let cms = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/assets/abc"))
            .respond_with(
                ResponseTemplate::new(302).insert_header("location", "https://cdn.test/abc.webp"),
            )
            .expect(1)
            .mount(&cms)
            .await;

        let mut config = AppConfig::default();
        config.cms.url = cms.uri();
        config.cms.token_env = "STRANDLY_TEST_UNSET_TOKEN".into();
        config.server.static_dir = static_dir("redirect").display().to_string();

        let app = router(ProxyState::from_config(&config).unwrap());
        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("{}/assets/abc", config.server.api_prefix))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "https://cdn.test/abc.webp");
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn unreachable_upstream_is_bad_gateway() {
        let app = router(state("http://127.0.0.1:9", None, static_dir("down")));
        let response = app
            .oneshot(Request::builder().uri("/api/items/posts").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(body["errors"][0]["message"].as_str().unwrap().starts_with("upstream request failed"));
    }

    #[tokio::test]
    async fn static_files_and_spa_fallback() {
        let dir = static_dir("static");
        let app = router(state("http://127.0.0.1:9", None, dir));

        let asset = app
            .clone()
            .oneshot(Request::builder().uri("/app.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(asset.status(), StatusCode::OK);
        assert_eq!(body_text(asset).await, "console.log('app')");

        let route = app
            .clone()
            .oneshot(Request::builder().uri("/blog/hair-care").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(route.status(), StatusCode::OK);
        assert!(body_text(route).await.contains("id=root"));

        let health = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_text(health).await, "OK");
    }
}
