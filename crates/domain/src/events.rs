use crate::models::{CommentHex, DomainKey, ModerationState};
use serde::{Deserialize, Serialize};

/// Emitted after a comment is stored, for best-effort delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentNotification {
    pub domain: DomainKey,
    pub path: String,
    pub commenter_hex: String,
    pub comment_hex: CommentHex,
    pub parent_hex: String,
    pub state: ModerationState,
}
