use chrono::{DateTime, Utc};
use domain::{Comment, CommentHex, Commenter, DomainKey, ModerationState};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlComment {
    pub comment_hex: String,
    pub domain: String,
    pub path: String,
    pub commenter_hex: String,
    pub parent_hex: String,
    pub markdown: String,
    pub html: String,
    pub creation_date: DateTime<Utc>,
    pub state: String,
}

impl TryFrom<SqlComment> for Comment {
    type Error = anyhow::Error;

    fn try_from(sql: SqlComment) -> anyhow::Result<Self> {
        let state = sql
            .state
            .parse::<ModerationState>()
            .map_err(anyhow::Error::msg)?;
        Ok(Comment {
            comment_hex: CommentHex::new_unchecked(sql.comment_hex),
            domain: DomainKey::new_unchecked(sql.domain),
            path: sql.path,
            commenter_hex: sql.commenter_hex,
            parent_hex: sql.parent_hex,
            markdown: sql.markdown,
            html: sql.html,
            created_at: sql.creation_date,
            state,
        })
    }
}

#[derive(FromRow)]
pub struct SqlDomain {
    pub domain: String,
    pub state: String,
    pub require_identification: bool,
    pub require_moderation: bool,
    pub moderate_all_anonymous: bool,
}

#[derive(FromRow)]
pub struct SqlCommenter {
    pub commenter_hex: String,
    pub email: String,
    pub name: String,
    pub link: String,
}

impl From<SqlCommenter> for Commenter {
    fn from(sql: SqlCommenter) -> Self {
        Commenter {
            commenter_hex: sql.commenter_hex,
            name: sql.name,
            email: sql.email,
            link: sql.link,
        }
    }
}
