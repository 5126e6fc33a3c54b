//! HTTP server for listings and article pages
//!
//! ## Routes
//!
//! - `GET /` - Index listing (`?page=N`)
//! - `GET /{blog_dir}` - Blog listing (`?page=N`)
//! - `GET /posts/:slug` - Article page
//! - `GET /healthz` - Health check (JSON)

mod error;
mod page;
mod state;

pub use error::ServerError;
pub use state::AppState;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::Uri,
    response::Html,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tower_http::trace::TraceLayer;

use crate::listing::Listing;
use crate::pagination::{parse_page_param, Paginator};
use crate::Blog;

/// Query string of the listing routes
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
}

/// Build the router
pub fn router(state: AppState) -> Router {
    // `Blog::new` keeps the blog path clear of the fixed routes
    let blog_path = state.blog.base_path().to_string();

    Router::new()
        .route("/", get(index_handler))
        .route(&blog_path, get(blog_handler))
        .route("/posts/:slug", get(post_handler))
        .route("/healthz", get(health_handler))
        .fallback(fallback_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the server
pub async fn start(blog: &Blog, ip: &str, port: u16) -> Result<()> {
    let state = AppState::new(blog)?;

    // Warm the store so the first visitor doesn't pay for the load
    if let Err(e) = state.store.get().await {
        tracing::warn!("Initial article load failed, retrying on request: {}", e);
    }

    tracing::info!("Serving articles from {:?}", state.store.posts_dir());
    let app = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn index_handler(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, ServerError> {
    listing_response(&state, &state.index, query.page.as_deref()).await
}

async fn blog_handler(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Html<String>, ServerError> {
    listing_response(&state, &state.blog, query.page.as_deref()).await
}

async fn listing_response(
    state: &AppState,
    paginator: &Paginator,
    page: Option<&str>,
) -> Result<Html<String>, ServerError> {
    let store = state.store.get().await?;
    let requested = parse_page_param(page);
    let listing = Listing::build(
        store.get_all_articles(),
        paginator,
        requested,
        &state.excerpt,
    );
    tracing::debug!(
        "Listing {} page {}/{}",
        paginator.base_path(),
        listing.current_page,
        listing.total_pages
    );
    Ok(Html(page::listing_page(
        &state.config,
        &listing,
        &paginator.href(listing.current_page),
    )))
}

async fn post_handler(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, ServerError> {
    let store = state.store.get().await?;
    let article = store
        .get_article_by_slug(&slug)
        .ok_or_else(|| ServerError::NotFound(format!("/posts/{}", slug)))?;

    let articles = store.get_all_articles();
    let content = state.renderer.render_or_escape(&article.body);

    Ok(Html(page::article_page(
        &state.config,
        article,
        &content,
        article.prev(articles),
        article.next(articles),
    )))
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "folio-rs",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn fallback_handler(uri: Uri) -> ServerError {
    ServerError::NotFound(uri.path().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::frontmatter::parse_date_string;
    use crate::content::{Article, ContentStore, MarkdownRenderer, SharedStore};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn site(posts: usize) -> (TempDir, Blog) {
        let dir = TempDir::new().unwrap();
        let posts_dir = dir.path().join("_posts");
        fs::create_dir_all(&posts_dir).unwrap();
        for i in 1..=posts {
            fs::write(
                posts_dir.join(format!("post-{:02}.md", i)),
                format!(
                    "---\ntitle: Post {i}\ndate: 2024-01-{i:02}\n---\n\nBody of **post {i}** with $x^2$\n"
                ),
            )
            .unwrap();
        }
        let blog = Blog::new(dir.path()).unwrap();
        (dir, blog)
    }

    async fn fetch(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn app(blog: &Blog) -> Router {
        router(AppState::new(blog).unwrap())
    }

    #[tokio::test]
    async fn test_index_lists_newest_first() {
        let (_dir, blog) = site(10);
        let (status, body) = fetch(&app(&blog), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Post 10"));
        assert!(body.contains("Post 7"));
        assert!(!body.contains("Post 6<"));
        assert!(body.contains("1 / 3"));
        assert!(body.contains("Body of post 10 with $x^2$"));
        assert!(body.contains(r#"href="/?page=2""#));
    }

    #[tokio::test]
    async fn test_index_clamps_page_param() {
        let (_dir, blog) = site(10);
        let app = app(&blog);

        let (_, last) = fetch(&app, "/?page=10000").await;
        assert!(last.contains("3 / 3"));
        assert!(last.contains("Post 1<"));
        assert!(last.contains("Post 2<"));

        let (_, first) = fetch(&app, "/").await;
        for query in ["/?page=0", "/?page=-5", "/?page=abc"] {
            let (status, body) = fetch(&app, query).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, first, "{}", query);
        }
    }

    #[tokio::test]
    async fn test_blog_listing_uses_its_own_base() {
        let (_dir, blog) = site(6);
        let (status, body) = fetch(&app(&blog), "/blog").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("1 / 2"));
        assert!(body.contains(r#"href="/blog?page=2""#));

        let (_, second) = fetch(&app(&blog), "/blog?page=2").await;
        assert!(second.contains(r#"<a class="pagination-prev" href="/blog">"#));
    }

    #[tokio::test]
    async fn test_single_page_has_no_nav() {
        let (_dir, blog) = site(2);
        let (_, body) = fetch(&app(&blog), "/").await;
        assert!(!body.contains("pagination"));
    }

    #[tokio::test]
    async fn test_post_page() {
        let (_dir, blog) = site(3);
        let (status, body) = fetch(&app(&blog), "/posts/post-02").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<strong>post 2</strong>"));
        assert!(body.contains("<embed-katex>"));
        assert!(body.contains(r#"href="/posts/post-03""#));
        assert!(body.contains(r#"href="/posts/post-01""#));
    }

    #[tokio::test]
    async fn test_unknown_post_is_404() {
        let (_dir, blog) = site(1);
        let (status, _) = fetch(&app(&blog), "/posts/missing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = fetch(&app(&blog), "/no/such/route").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_store_failure_is_500() {
        let dir = TempDir::new().unwrap();
        let blog = Blog::new(dir.path()).unwrap();
        let (status, _) = fetch(&app(&blog), "/").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_preloaded_store_serves_without_disk() {
        let (_dir, blog) = site(0);
        let mut article = Article::new(
            "in-memory",
            "In memory",
            "2024-03-01",
            parse_date_string("2024-03-01").unwrap(),
        );
        article.body = "Loaded elsewhere".to_string();
        let store = SharedStore::preloaded(ContentStore::from_articles(vec![article]).unwrap());
        let app = router(AppState::with_store(&blog, store, MarkdownRenderer::new()));

        let (status, body) = fetch(&app, "/posts/in-memory").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<p>Loaded elsewhere</p>"));
        let (_, listing) = fetch(&app, "/blog").await;
        assert!(listing.contains("In memory"));
    }

    #[tokio::test]
    async fn test_healthz() {
        let (_dir, blog) = site(0);
        let (status, body) = fetch(&app(&blog), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }
}
