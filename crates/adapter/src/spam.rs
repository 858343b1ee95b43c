use std::time::Duration;

use async_trait::async_trait;
use domain::ports::{SpamDetector, SpamQuery};
use serde::Serialize;
use tracing::{error, warn};

#[derive(Clone, Debug)]
pub struct AkismetConfig {
    pub key: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct CommentCheck<'a> {
    blog: &'a str,
    user_ip: &'a str,
    user_agent: &'a str,
    comment_type: &'a str,
    comment_author: &'a str,
    comment_author_email: &'a str,
    comment_author_url: &'a str,
    comment_content: &'a str,
}

/// Akismet `comment-check`. Anything other than a clear `true` counts as
/// not spam, so an outage never blocks commenting.
pub struct AkismetDetector {
    client: reqwest::Client,
    url: String,
}

impl AkismetDetector {
    pub fn new(config: AkismetConfig) -> anyhow::Result<Self> {
        let url = format!("https://{}.rest.akismet.com/1.1/comment-check", config.key);
        Self::with_url(url, config.timeout)
    }

    pub fn with_url(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SpamDetector for AkismetDetector {
    async fn is_spam(&self, q: &SpamQuery<'_>) -> bool {
        let form = CommentCheck {
            blog: q.domain,
            user_ip: q.ip,
            user_agent: q.user_agent,
            comment_type: "comment",
            comment_author: q.name,
            comment_author_email: q.email,
            comment_author_url: q.link,
            comment_content: q.text,
        };

        let body = match self.client.post(&self.url).form(&form).send().await {
            Ok(resp) => resp.text().await,
            Err(e) => Err(e),
        };

        match body.as_deref().map(str::trim) {
            Ok("true") => true,
            Ok("false") => false,
            Ok(other) => {
                warn!("Unexpected Akismet answer for {}: {:?}", q.domain, other);
                false
            }
            Err(e) => {
                error!("Akismet request failed: {}", e);
                false
            }
        }
    }
}

/// Used when no Akismet key is configured.
pub struct NoSpamCheck;

#[async_trait]
impl SpamDetector for NoSpamCheck {
    async fn is_spam(&self, _query: &SpamQuery<'_>) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Form, Router};
    use std::collections::HashMap;

    fn query(text: &'static str) -> SpamQuery<'static> {
        SpamQuery {
            domain: "example.org",
            ip: "203.0.113.7",
            user_agent: "curl/8",
            name: "",
            email: "",
            link: "",
            text,
        }
    }

    async fn spawn_akismet() -> String {
        // Flags any comment mentioning "viagra"; echoes garbage for "???".
        let app = Router::new().route(
            "/1.1/comment-check",
            post(|Form(f): Form<HashMap<String, String>>| async move {
                let content = f.get("comment_content").cloned().unwrap_or_default();
                assert_eq!(f.get("comment_type").map(String::as_str), Some("comment"));
                assert_eq!(f.get("blog").map(String::as_str), Some("example.org"));
                if content.contains("???") {
                    "invalid".to_string()
                } else {
                    content.contains("viagra").to_string()
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/1.1/comment-check", addr)
    }

    #[tokio::test]
    async fn akismet_verdicts_are_honoured() {
        let url = spawn_akismet().await;
        let detector = AkismetDetector::with_url(url, Duration::from_secs(2)).unwrap();

        assert!(detector.is_spam(&query("cheap viagra here")).await);
        assert!(!detector.is_spam(&query("nice post")).await);
        assert!(!detector.is_spam(&query("what ???")).await);
    }

    #[tokio::test]
    async fn unreachable_akismet_is_not_spam() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let detector =
            AkismetDetector::with_url(format!("http://{}/", addr), Duration::from_secs(1)).unwrap();
        assert!(!detector.is_spam(&query("cheap viagra here")).await);
    }

    #[tokio::test]
    async fn disabled_detector_never_flags() {
        assert!(!NoSpamCheck.is_spam(&query("cheap viagra here")).await);
    }
}
