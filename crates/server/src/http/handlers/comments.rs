use std::net::SocketAddr;

use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, State},
    http::{header, HeaderMap},
    Json,
};
use domain::{ErrorKind, SubmitError};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::submission::{CommentService, NewComment};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub commenter_token: Option<String>,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub parent_hex: Option<String>,
    pub markdown: Option<String>,
}

/// Outcomes are always HTTP 200; `success` in the body tells them apart.
pub async fn post_comment(
    State(service): State<CommentService>,
    peer: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> Json<Value> {
    let Json(payload) = match payload {
        Ok(p) => p,
        Err(rejection) => {
            tracing::debug!("Rejected comment body: {}", rejection.body_text());
            return failure(&rejection.body_text());
        }
    };

    let req = NewComment {
        commenter_token: payload.commenter_token.unwrap_or_default(),
        domain: payload.domain.unwrap_or_default(),
        path: payload.path.unwrap_or_default(),
        parent_hex: payload.parent_hex.unwrap_or_default(),
        markdown: payload.markdown.unwrap_or_default(),
        ip: client_ip(&headers, peer.map(|ConnectInfo(addr)| addr)),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string(),
        created_at: chrono::Utc::now(),
    };

    match service.submit(req).await {
        Ok(ok) => Json(json!({
            "success": true,
            "commentHex": ok.comment_hex,
            "state": ok.state,
            "html": ok.html,
        })),
        Err(e) => {
            log_rejection(&e);
            failure(&e.to_string())
        }
    }
}

fn failure(message: &str) -> Json<Value> {
    Json(json!({ "success": false, "message": message }))
}

fn log_rejection(e: &SubmitError) {
    match e.kind() {
        // already logged with its source where it happened
        ErrorKind::Internal => {}
        ErrorKind::Authorization => tracing::info!("Comment refused: {}", e),
        ErrorKind::Validation | ErrorKind::State => tracing::debug!("Comment rejected: {}", e),
    }
}

fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::router::build_router;
    use crate::state::AppState;
    use async_trait::async_trait;
    use axum::{body::Body, http::Request};
    use domain::ports::{SpamDetector, SpamQuery};
    use domain::{Domain, DomainKey};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use storage::Db;
    use tower::ServiceExt;

    #[derive(Default)]
    struct SeenBy(Mutex<Option<(String, String)>>);

    #[async_trait]
    impl SpamDetector for SeenBy {
        async fn is_spam(&self, q: &SpamQuery<'_>) -> bool {
            *self.0.lock().unwrap() = Some((q.ip.to_string(), q.user_agent.to_string()));
            false
        }
    }

    async fn app(spam: Arc<SeenBy>) -> axum::Router {
        let db = Db::new("sqlite::memory:", Duration::from_secs(5)).await.unwrap();
        db.save_domain(&Domain::open(DomainKey::new_unchecked("example.org".into())))
            .await
            .unwrap();
        let comments = CommentService::new(Arc::new(db.clone())).with_spam_detector(spam);
        build_router(AppState { db, comments }, "*")
    }

    async fn post(app: axum::Router, body: &str, headers: &[(&str, &str)]) -> (u16, Value) {
        let mut req = Request::post("/api/comment/new").header("content-type", "application/json");
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        let resp = app.oneshot(req.body(Body::from(body.to_string())).unwrap()).await.unwrap();
        let status = resp.status().as_u16();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn successful_submission_shape() {
        let spam = Arc::new(SeenBy::default());
        let body = r#"{"commenterToken":"anonymous","domain":"example.org","parentHex":"root","markdown":"hi _there_"}"#;
        let (status, v) = post(
            app(spam.clone()).await,
            body,
            &[("x-forwarded-for", "198.51.100.4, 10.0.0.1"), ("user-agent", "Firefox")],
        )
        .await;

        assert_eq!(status, 200);
        assert_eq!(v["success"], true);
        assert_eq!(v["state"], "approved");
        assert_eq!(v["commentHex"].as_str().unwrap().len(), 32);
        assert_eq!(v["html"], "<p>hi <em>there</em></p>\n");
        assert_eq!(
            *spam.0.lock().unwrap(),
            Some(("198.51.100.4".to_string(), "Firefox".to_string()))
        );
    }

    #[tokio::test]
    async fn missing_field_fails_in_body() {
        let body = r#"{"commenterToken":"anonymous","domain":"example.org","markdown":"hi"}"#;
        let (status, v) = post(app(Arc::default()).await, body, &[]).await;
        assert_eq!(status, 200);
        assert_eq!(v["success"], false);
        assert_eq!(v["message"], "Missing field(s): parentHex.");
    }

    #[tokio::test]
    async fn malformed_body_fails_in_body() {
        let (status, v) = post(app(Arc::default()).await, "{not json", &[]).await;
        assert_eq!(status, 200);
        assert_eq!(v["success"], false);
        assert!(v["message"].as_str().is_some());
    }

    #[tokio::test]
    async fn unknown_token_fails_in_body() {
        let body = r#"{"commenterToken":"nope","domain":"example.org","path":"/a","parentHex":"root","markdown":"hi"}"#;
        let (_, v) = post(app(Arc::default()).await, body, &[]).await;
        assert_eq!(v["success"], false);
        assert_eq!(v["message"], "This session token is invalid.");
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let resp = app(Arc::default())
            .await
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 200);
    }

    #[test]
    fn peer_address_used_without_forwarding_header() {
        let peer: SocketAddr = "192.0.2.9:51000".parse().unwrap();
        assert_eq!(client_ip(&HeaderMap::new(), Some(peer)), "192.0.2.9");
        assert_eq!(client_ip(&HeaderMap::new(), None), "");
    }
}
