//! Capabilities the submission pipeline consumes. Implemented by `storage`
//! and `adapter`, stubbed in tests.

use anyhow::Result;
use async_trait::async_trait;

use crate::error::PermissionDenied;
use crate::events::CommentNotification;
use crate::models::{Comment, CommentHex, Commenter, Domain, DomainKey, Page};

#[async_trait]
pub trait DomainStore: Send + Sync {
    async fn get_domain(&self, key: &DomainKey) -> Result<Option<Domain>>;
}

#[async_trait]
pub trait PageStore: Send + Sync {
    /// Pages that were never created read as unlocked.
    async fn get_page(&self, domain: &DomainKey, path: &str) -> Result<Page>;

    /// Insert-if-absent. Must be safe to call concurrently for the same key.
    async fn ensure_page(&self, domain: &DomainKey, path: &str) -> Result<()>;
}

#[async_trait]
pub trait CommenterStore: Send + Sync {
    async fn commenter_by_token(&self, token: &str) -> Result<Option<Commenter>>;
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert_comment(&self, comment: &Comment) -> Result<()>;
}

/// Everything a spam classifier gets to see about a submission.
#[derive(Debug, Clone, Copy)]
pub struct SpamQuery<'a> {
    pub domain: &'a str,
    pub ip: &'a str,
    pub user_agent: &'a str,
    pub name: &'a str,
    pub email: &'a str,
    pub link: &'a str,
    pub text: &'a str,
}

#[async_trait]
pub trait SpamDetector: Send + Sync {
    async fn is_spam(&self, query: &SpamQuery<'_>) -> bool;
}

pub trait MarkupRenderer: Send + Sync {
    fn render(&self, markdown: &str) -> String;
}

#[async_trait]
pub trait PermissionAuthorizer: Send + Sync {
    async fn authorize(&self, email: &str, route: &str) -> Result<(), PermissionDenied>;
}

pub trait NotificationDispatcher: Send + Sync {
    /// Must not block and has no result.
    fn dispatch(&self, notification: CommentNotification);
}

pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Result<CommentHex, rand::Error>;
}

/// Identifiers straight from the OS entropy source.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandomIds;

impl IdGenerator for OsRandomIds {
    fn next_id(&self) -> Result<CommentHex, rand::Error> {
        CommentHex::random()
    }
}
