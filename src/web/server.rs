use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Single log resource: read, append, clear
        .route(
            "/",
            get(handlers::read_log)
                .post(handlers::append_record)
                .delete(handlers::clear_log)
                // `get` would otherwise answer HEAD too
                .head(handlers::method_not_allowed)
                .fallback(handlers::method_not_allowed),
        )
        // Add application state
        .with_state(state)
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
}

/// Bind the listening socket. Once this returns, clients can connect.
pub async fn bind(port: u16) -> anyhow::Result<TcpListener> {
    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Log service listening on http://{}", listener.local_addr()?);
    Ok(listener)
}

pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceRecord;
    use crate::logger::DeviceLog;
    use crate::web::handlers::{
        EMPTY_LOG_MESSAGE, INVALID_JSON_MESSAGE, LOG_CLEARED_MESSAGE, METHOD_NOT_ALLOWED_MESSAGE,
        RECORD_WRITTEN_MESSAGE,
    };
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use futures::future::join_all;
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn test_state() -> (TempDir, Arc<AppState>) {
        let dir = TempDir::new().unwrap();
        let log = Arc::new(DeviceLog::new(dir.path().join("server.log")));
        (dir, Arc::new(AppState::new(log)))
    }

    async fn send(state: &Arc<AppState>, method: Method, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method(method)
            .uri("/")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = build_router(state.clone()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    fn record_json(name: &str) -> String {
        serde_json::to_string(&DeviceRecord::new(name, "PC", "192.168.1.10", "Static")).unwrap()
    }

    #[tokio::test]
    async fn test_get_before_any_post() {
        let (_dir, state) = test_state();
        let (status, body) = send(&state, Method::GET, "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, EMPTY_LOG_MESSAGE);
    }

    #[tokio::test]
    async fn test_post_then_get() {
        let (_dir, state) = test_state();
        let (status, body) = send(&state, Method::POST, &record_json("PC1_1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, RECORD_WRITTEN_MESSAGE);

        let (status, body) = send(&state, Method::GET, "").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Name=PC1_1, Type=PC, IP=192.168.1.10, Routing=Static"));
    }

    #[tokio::test]
    async fn test_n_posts_give_n_lines() {
        let (_dir, state) = test_state();
        for i in 0..7 {
            let (status, _) = send(&state, Method::POST, &record_json(&format!("PC{}_1", i))).await;
            assert_eq!(status, StatusCode::OK);
        }

        let (_, body) = send(&state, Method::GET, "").await;
        let lines: Vec<_> = body.lines().collect();
        assert_eq!(lines.len(), 7);
        for (i, line) in lines.iter().enumerate() {
            assert!(line.starts_with('['));
            assert!(line.contains(&format!("] Name=PC{}_1, Type=PC, IP=192.168.1.10, Routing=Static", i)));
        }
    }

    #[tokio::test]
    async fn test_invalid_json_rejected() {
        let (_dir, state) = test_state();
        send(&state, Method::POST, &record_json("PC1_1")).await;
        let before = std::fs::read(state.log.path()).unwrap();

        let (status, body) = send(&state, Method::POST, "\"not json\"").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, INVALID_JSON_MESSAGE);

        let (status, _) = send(&state, Method::POST, "{broken").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(std::fs::read(state.log.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn test_invalid_json_does_not_create_file() {
        let (_dir, state) = test_state();
        let (status, _) = send(&state, Method::POST, "not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!state.log.path().exists());
    }

    #[tokio::test]
    async fn test_delete_then_get() {
        let (_dir, state) = test_state();
        send(&state, Method::POST, &record_json("PC1_1")).await;
        send(&state, Method::POST, &record_json("PC2_1")).await;

        let (status, body) = send(&state, Method::DELETE, "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, LOG_CLEARED_MESSAGE);

        let (status, body) = send(&state, Method::GET, "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, EMPTY_LOG_MESSAGE);
    }

    #[tokio::test]
    async fn test_delete_missing_file() {
        let (_dir, state) = test_state();
        let (status, body) = send(&state, Method::DELETE, "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, LOG_CLEARED_MESSAGE);
    }

    #[tokio::test]
    async fn test_other_methods_not_allowed() {
        let (_dir, state) = test_state();
        for method in [Method::PUT, Method::PATCH, Method::OPTIONS] {
            let (status, body) = send(&state, method, "").await;
            assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
            assert_eq!(body, METHOD_NOT_ALLOWED_MESSAGE);
        }
    }

    #[tokio::test]
    async fn test_head_not_allowed() {
        let (_dir, state) = test_state();
        send(&state, Method::POST, &record_json("PC1_1")).await;

        // HEAD responses carry no body, so only the status is checked
        let (status, _) = send(&state, Method::HEAD, "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_post_lowercase_keys() {
        let (_dir, state) = test_state();
        let body = r#"{"devicename":"PC1_1","devicetype":"PC","ipaddress":"192.168.1.10","routingtype":"Static"}"#;
        let (status, _) = send(&state, Method::POST, body).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&state, Method::GET, "").await;
        assert!(body.contains("Name=PC1_1, Type=PC, IP=192.168.1.10, Routing=Static"));
    }

    #[tokio::test]
    async fn test_post_null_writes_empty_record() {
        let (_dir, state) = test_state();
        let (status, body) = send(&state, Method::POST, "null").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, RECORD_WRITTEN_MESSAGE);

        let (_, body) = send(&state, Method::GET, "").await;
        assert!(body.ends_with("] Name=, Type=, IP=, Routing=\n"));
    }

    #[tokio::test]
    async fn test_post_ignores_trailing_data() {
        let (_dir, state) = test_state();
        let body = format!("{} {{}}", record_json("PC1_1"));
        let (status, _) = send(&state, Method::POST, &body).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&state, Method::GET, "").await;
        assert_eq!(body.lines().count(), 1);
        assert!(body.contains("Name=PC1_1, Type=PC"));
    }

    #[tokio::test]
    async fn test_post_empty_body_rejected() {
        let (_dir, state) = test_state();
        let (status, body) = send(&state, Method::POST, "").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, INVALID_JSON_MESSAGE);
        assert!(!state.log.path().exists());
    }

    #[tokio::test]
    async fn test_read_error_is_500() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be read as a file
        let state = Arc::new(AppState::new(Arc::new(DeviceLog::new(dir.path()))));

        let (status, _) = send(&state, Method::GET, "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = send(&state, Method::POST, &record_json("PC1_1")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let (status, _) = send(&state, Method::DELETE, "").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_posts_do_not_interleave() {
        let (_dir, state) = test_state();

        let tasks = (0..50).map(|i| {
            let state = state.clone();
            tokio::spawn(async move {
                let json = serde_json::to_string(&DeviceRecord::new(
                    format!("Device{}_1", i),
                    "PC",
                    format!("192.168.1.{}", i),
                    "Dynamic",
                ))
                .unwrap();
                send(&state, Method::POST, &json).await.0
            })
        });

        for status in join_all(tasks).await {
            assert_eq!(status.unwrap(), StatusCode::OK);
        }

        let content = std::fs::read_to_string(state.log.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 50);
        for i in 0..50 {
            let needle = format!("] Name=Device{}_1, Type=PC, IP=192.168.1.{}, Routing=Dynamic", i, i);
            assert_eq!(lines.iter().filter(|l| l.ends_with(&needle)).count(), 1);
        }
    }
}
