use anyhow::Result;
use async_trait::async_trait;
use domain::ports::{CommentStore, CommenterStore, DomainStore, PageStore};
use domain::{Comment, Commenter, Domain, DomainKey, Page};

use crate::Db;

// Inherent methods win name resolution, so these just forward.

#[async_trait]
impl DomainStore for Db {
    async fn get_domain(&self, key: &DomainKey) -> Result<Option<Domain>> {
        Db::get_domain(self, key).await
    }
}

#[async_trait]
impl PageStore for Db {
    async fn get_page(&self, domain: &DomainKey, path: &str) -> Result<Page> {
        Db::get_page(self, domain, path).await
    }

    async fn ensure_page(&self, domain: &DomainKey, path: &str) -> Result<()> {
        Db::ensure_page(self, domain, path).await
    }
}

#[async_trait]
impl CommenterStore for Db {
    async fn commenter_by_token(&self, token: &str) -> Result<Option<Commenter>> {
        Db::commenter_by_token(self, token).await
    }
}

#[async_trait]
impl CommentStore for Db {
    async fn insert_comment(&self, comment: &Comment) -> Result<()> {
        Db::insert_comment(self, comment).await
    }
}
