use crate::{models::SqlComment, Db};
use domain::{Comment, DomainKey};
use sqlx::Row;

impl Db {
    pub async fn insert_comment(&self, c: &Comment) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO comments (
                comment_hex, domain, path, commenter_hex, parent_hex,
                markdown, html, creation_date, state
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(c.comment_hex.as_str())
        .bind(c.domain.as_str())
        .bind(&c.path)
        .bind(&c.commenter_hex)
        .bind(&c.parent_hex)
        .bind(&c.markdown)
        .bind(&c.html)
        .bind(c.created_at)
        .bind(c.state.as_str())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_comment(&self, comment_hex: &str) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, SqlComment>(
            r#"
            SELECT
                comment_hex, domain, path, commenter_hex, parent_hex,
                markdown, html, creation_date, state
            FROM comments
            WHERE comment_hex = ?
            "#,
        )
        .bind(comment_hex)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Comment::try_from).transpose()
    }

    pub async fn count_comments(&self, domain: &DomainKey, path: &str) -> anyhow::Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) FROM comments WHERE domain = ? AND path = ?")
            .bind(domain.as_str())
            .bind(path)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get(0))
    }
}
