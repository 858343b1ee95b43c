use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use domain::ports::NotificationDispatcher;
use domain::CommentNotification;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, info, warn};

use crate::traits::NotificationSink;

#[derive(Clone, Debug)]
pub struct WebhookConfig {
    pub url: String,
    pub timeout: Duration,
}

/// POSTs the notification as JSON.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(config: WebhookConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: config.url,
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn deliver(&self, n: &CommentNotification) -> Result<()> {
        self.client
            .post(&self.url)
            .json(n)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Sending half handed to the request path. Never waits: a full or closed
/// queue drops the notification with a warning.
#[derive(Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<CommentNotification>,
}

impl NotificationQueue {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<CommentNotification>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl NotificationDispatcher for NotificationQueue {
    fn dispatch(&self, notification: CommentNotification) {
        match self.tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(n)) => {
                warn!("Notification queue full, dropping comment {}", n.comment_hex);
            }
            Err(TrySendError::Closed(n)) => {
                warn!("Notification worker gone, dropping comment {}", n.comment_hex);
            }
        }
    }
}

/// Drains the queue until every sender is dropped. Each notification is
/// delivered once on its own task; failures are only logged.
pub async fn run_worker(
    mut rx: mpsc::Receiver<CommentNotification>,
    sink: Arc<dyn NotificationSink>,
) {
    info!("Notification worker started");
    while let Some(n) = rx.recv().await {
        let sink = sink.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.deliver(&n).await {
                error!(
                    "Notification for comment {} on {}{} failed: {:?}",
                    n.comment_hex, n.domain, n.path, e
                );
            }
        });
    }
    info!("Notification worker stopped");
}
