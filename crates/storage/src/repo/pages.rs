use crate::Db;
use domain::{DomainKey, Page};
use sqlx::Row;

impl Db {
    pub async fn get_page(&self, domain: &DomainKey, path: &str) -> anyhow::Result<Page> {
        let row = sqlx::query("SELECT is_locked FROM pages WHERE domain = ? AND path = ?")
            .bind(domain.as_str())
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;

        Ok(Page {
            domain: domain.clone(),
            path: path.to_string(),
            is_locked: row.map(|r| r.get::<bool, _>(0)).unwrap_or(false),
        })
    }

    // 原子的 insert-if-absent：并发的首条评论不会撞主键
    pub async fn ensure_page(&self, domain: &DomainKey, path: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pages (domain, path)
            VALUES (?, ?)
            ON CONFLICT(domain, path) DO NOTHING
            "#,
        )
        .bind(domain.as_str())
        .bind(path)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_page_locked(
        &self,
        domain: &DomainKey,
        path: &str,
        locked: bool,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO pages (domain, path, is_locked)
            VALUES (?, ?, ?)
            ON CONFLICT(domain, path) DO UPDATE SET is_locked = excluded.is_locked
            "#,
        )
        .bind(domain.as_str())
        .bind(path)
        .bind(locked)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn count_pages(&self, domain: &DomainKey, path: &str) -> anyhow::Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM pages WHERE domain = ? AND path = ?")
            .bind(domain.as_str())
            .bind(path)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::memory_db;
    use crate::Db;
    use domain::DomainKey;
    use std::time::Duration;

    fn key() -> DomainKey {
        DomainKey::new_unchecked("example.org".into())
    }

    #[tokio::test]
    async fn unknown_page_reads_unlocked() {
        let db = memory_db().await;
        let page = db.get_page(&key(), "/never-seen").await.unwrap();
        assert!(!page.is_locked);
        assert_eq!(db.count_pages(&key(), "/never-seen").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ensure_twice_leaves_one_page() {
        let db = memory_db().await;
        db.ensure_page(&key(), "").await.unwrap();
        db.ensure_page(&key(), "").await.unwrap();
        assert_eq!(db.count_pages(&key(), "").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn ensure_keeps_existing_lock() {
        let db = memory_db().await;
        db.set_page_locked(&key(), "/locked", true).await.unwrap();
        db.ensure_page(&key(), "/locked").await.unwrap();
        assert!(db.get_page(&key(), "/locked").await.unwrap().is_locked);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_ensure_creates_exactly_one_page() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("race.db").display());
        let db = Db::new(&url, Duration::from_secs(5)).await.unwrap();

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move { db.ensure_page(&key(), "/fresh").await })
            })
            .collect();

        for res in futures::future::join_all(tasks).await {
            res.unwrap().unwrap();
        }
        assert_eq!(db.count_pages(&key(), "/fresh").await.unwrap(), 1);
    }
}
