use crate::{models::SqlCommenter, Db};
use chrono::Utc;
use domain::Commenter;

impl Db {
    pub async fn commenter_by_token(&self, token: &str) -> anyhow::Result<Option<Commenter>> {
        let row = sqlx::query_as::<_, SqlCommenter>(
            r#"
            SELECT c.commenter_hex, c.email, c.name, c.link
            FROM commenter_sessions s
            JOIN commenters c ON s.commenter_hex = c.commenter_hex
            WHERE s.commenter_token = ?
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Registers a commenter and binds a session token to it. Session
    /// issuance itself lives with the login flow; this is the storage half.
    pub async fn save_commenter_session(&self, c: &Commenter, token: &str) -> anyhow::Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO commenters (commenter_hex, email, name, link, join_date)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(commenter_hex) DO UPDATE SET
                email = excluded.email,
                name = excluded.name,
                link = excluded.link
            "#,
        )
        .bind(&c.commenter_hex)
        .bind(&c.email)
        .bind(&c.name)
        .bind(&c.link)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO commenter_sessions (commenter_token, commenter_hex, creation_date)
            VALUES (?, ?, ?)
            ON CONFLICT(commenter_token) DO UPDATE SET commenter_hex = excluded.commenter_hex
            "#,
        )
        .bind(token)
        .bind(&c.commenter_hex)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::memory_db;
    use domain::Commenter;

    #[tokio::test]
    async fn resolves_commenter_by_session_token() {
        let db = memory_db().await;
        let c = Commenter {
            commenter_hex: "c0ffee".into(),
            name: "Ferris".into(),
            email: "ferris@example.org".into(),
            link: "https://ferris.example.org".into(),
        };
        db.save_commenter_session(&c, "tok-1").await.unwrap();

        assert_eq!(db.commenter_by_token("tok-1").await.unwrap(), Some(c));
        assert_eq!(db.commenter_by_token("tok-2").await.unwrap(), None);
    }
}
