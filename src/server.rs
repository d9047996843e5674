use std::io;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;

pub const LIVENESS_TEXT: &str = "Telegram Bot and Hugging Face Image Generator Server is Running!";

pub fn router() -> Router {
    Router::new().route("/", get(liveness))
}

async fn liveness() -> &'static str {
    LIVENESS_TEXT
}

/// Serves the liveness route on every interface until the process exits.
pub async fn serve(port: &str) -> io::Result<()> {
    let port = port
        .parse::<u16>()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, format!("PORT {port:?}: {err}")))?;

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("Server is running on http://localhost:{port}");

    axum::serve(listener, router()).await
}

#[cfg(test)]
mod test {
    use axum::body::{self, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;

    #[tokio::test]
    async fn test_liveness() {
        let response =
            router().oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, LIVENESS_TEXT);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let response =
            router().oneshot(Request::get("/health").body(Body::empty()).unwrap()).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_invalid_port() {
        let err = serve("").await.unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
