use axum::{
    body::to_bytes,
    extract::{Request, State},
    http::Method,
    response::{IntoResponse, Response},
    Json,
};

use crate::error::HookError;
use crate::models::{CommonResponse, StreamRequest};
use crate::state::AppState;

// Catch-all for probes and manual checks.
pub async fn hello() -> &'static str {
    "HelloWorld"
}

pub async fn streams(State(state): State<AppState>, request: Request) -> Response {
    // Non-POST traffic gets an empty data object, not an error.
    if request.method() != Method::POST {
        return Json(serde_json::json!({})).into_response();
    }

    match dispatch(state, request).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, "streams callback failed");
            err.into_response()
        }
    }
}

async fn dispatch(state: AppState, request: Request) -> Result<Response, HookError> {
    let body = to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(HookError::BodyRead)?;

    let msg: StreamRequest = serde_json::from_slice(&body).map_err(|source| HookError::Decode {
        body: String::from_utf8_lossy(&body).into_owned(),
        source,
    })?;

    if msg.is_publish() {
        tracing::info!(app = %msg.common.app, stream = %msg.stream, "user publish stream");
    } else {
        // Everything that is not a publish pokes the recognizer, unknown
        // actions included; validation happens after the branch.
        state.notifier.notify_unpublish().await;
        tracing::info!(app = %msg.common.app, stream = %msg.stream, "user unpublish stream");
    }

    if !msg.is_publish() && !msg.is_unpublish() {
        return Err(HookError::InvalidAction(msg.to_string()));
    }

    Ok(Json(CommonResponse {
        code: 0,
        data: None,
    })
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::build_router;
    use crate::recognizer::UnpublishNotifier;
    use async_trait::async_trait;
    use axum::{body::Body, http::StatusCode, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    struct RecordingNotifier {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl UnpublishNotifier for RecordingNotifier {
        async fn notify_unpublish(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn test_app() -> (Router, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier {
            calls: AtomicUsize::new(0),
        });
        let state = AppState {
            notifier: notifier.clone(),
        };
        (build_router(state), notifier)
    }

    async fn send(app: Router, method: &str, uri: &str, payload: &str) -> (StatusCode, String) {
        let request = axum::http::Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn publish_payload(action: &str) -> String {
        serde_json::json!({
            "action": action,
            "client_id": "9308h583",
            "ip": "192.168.1.10",
            "vhost": "video.test.com",
            "app": "live",
            "stream": "livestream",
            "param": "?token=xxx",
        })
        .to_string()
    }

    #[tokio::test]
    async fn publish_returns_success_envelope_without_notify() {
        let (app, notifier) = test_app();
        let (status, body) =
            send(app, "POST", "/api/v1/streams", &publish_payload("on_publish")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"code":0,"data":null}"#);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unpublish_notifies_recognizer() {
        let (app, notifier) = test_app();
        let (status, body) =
            send(app, "POST", "/api/v1/streams", &publish_payload("on_unpublish")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"code":0,"data":null}"#);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_action_notifies_then_rejects() {
        let (app, notifier) = test_app();
        let (status, body) = send(app, "POST", "/api/v1/streams", r#"{"action":"bogus"}"#).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "invalid message action=bogus, client_id=, ip=, vhost=");
        // The unpublish branch fires before validation rejects the action.
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_without_notify() {
        let (app, notifier) = test_app();
        let (status, body) = send(app, "POST", "/api/v1/streams", "not json").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("parse message from not json"));
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_post_gets_empty_object() {
        let (app, notifier) = test_app();
        let (status, body) = send(app.clone(), "GET", "/api/v1/streams", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{}");
        let (status, body) =
            send(app, "PUT", "/api/v1/streams", &publish_payload("on_unpublish")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{}");
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_routes_greet() {
        let (app, _) = test_app();
        let (status, body) = send(app.clone(), "GET", "/", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "HelloWorld");
        let (status, body) = send(app, "POST", "/api/v1/other", "").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "HelloWorld");
    }

    #[tokio::test]
    async fn repeated_publish_is_idempotent() {
        let (app, notifier) = test_app();
        for _ in 0..2 {
            let (status, body) =
                send(app.clone(), "POST", "/api/v1/streams", &publish_payload("on_publish")).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, r#"{"code":0,"data":null}"#);
        }
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 0);
    }
}
