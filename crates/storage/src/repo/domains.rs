use crate::{models::SqlDomain, Db};
use chrono::Utc;
use domain::{Domain, DomainKey, DomainState, Moderator};
use sqlx::Row;

impl Db {
    /// Domain attributes together with the moderator list, so moderator
    /// checks need no further queries.
    pub async fn get_domain(&self, key: &DomainKey) -> anyhow::Result<Option<Domain>> {
        let row = sqlx::query_as::<_, SqlDomain>(
            r#"
            SELECT domain, state, require_identification, require_moderation, moderate_all_anonymous
            FROM domains
            WHERE domain = ?
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let moderators = sqlx::query("SELECT email FROM moderators WHERE domain = ? ORDER BY add_date")
            .bind(key.as_str())
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(|r| Moderator { email: r.get(0) })
            .collect();

        let state = row
            .state
            .parse::<DomainState>()
            .map_err(anyhow::Error::msg)?;

        Ok(Some(Domain {
            key: DomainKey::new_unchecked(row.domain),
            state,
            require_identification: row.require_identification,
            require_moderation: row.require_moderation,
            moderate_all_anonymous: row.moderate_all_anonymous,
            moderators,
        }))
    }

    /// Creates or overwrites a domain and replaces its moderator list.
    pub async fn save_domain(&self, d: &Domain) -> anyhow::Result<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO domains (
                domain, state, require_identification, require_moderation,
                moderate_all_anonymous, creation_date
            )
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(domain) DO UPDATE SET
                state = excluded.state,
                require_identification = excluded.require_identification,
                require_moderation = excluded.require_moderation,
                moderate_all_anonymous = excluded.moderate_all_anonymous
            "#,
        )
        .bind(d.key.as_str())
        .bind(d.state.as_str())
        .bind(d.require_identification)
        .bind(d.require_moderation)
        .bind(d.moderate_all_anonymous)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM moderators WHERE domain = ?")
            .bind(d.key.as_str())
            .execute(&mut *tx)
            .await?;

        for m in &d.moderators {
            sqlx::query("INSERT OR IGNORE INTO moderators (domain, email, add_date) VALUES (?, ?, ?)")
                .bind(d.key.as_str())
                .bind(&m.email)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
