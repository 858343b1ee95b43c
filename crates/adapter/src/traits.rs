use anyhow::Result;
use async_trait::async_trait;
use domain::CommentNotification;

/// Final hop of a notification: email relay, webhook, chat bridge.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn deliver(&self, notification: &CommentNotification) -> Result<()>;
}
