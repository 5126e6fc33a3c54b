//! Request errors, rendered as small HTML pages

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};

use super::page::error_page;
use crate::error::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// No article or route matches the request
    #[error("not found: {0}")]
    NotFound(String),

    /// The article collection could not be loaded
    #[error("content store unavailable: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, title, message) = match &self {
            Self::NotFound(what) => {
                tracing::debug!("Not found: {}", what);
                (
                    StatusCode::NOT_FOUND,
                    "Not Found",
                    "お探しのページは見つかりませんでした。",
                )
            }
            Self::Store(err) => {
                tracing::error!(error = %err, "failed to load articles");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Error",
                    "記事を読み込めませんでした。しばらくしてから再度お試しください。",
                )
            }
        };

        (status, Html(error_page(title, message))).into_response()
    }
}
