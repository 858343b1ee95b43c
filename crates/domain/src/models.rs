use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Commenter hex recorded for comments posted without an identity.
pub const ANONYMOUS: &str = "anonymous";

/// Parent hex of a top-level comment.
pub const ROOT_PARENT: &str = "root";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainKey(String);

impl DomainKey {
    /// Normalizes a client-supplied domain: surrounding whitespace, the
    /// scheme and a trailing slash are dropped.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let s = raw.trim();
        let s = s.strip_suffix('/').unwrap_or(s);
        let s = s
            .strip_prefix("https://")
            .or_else(|| s.strip_prefix("http://"))
            .unwrap_or(s);

        if s.is_empty() {
            return Err("Domain cannot be empty.".to_string());
        }
        if s.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err("Domain contains invalid characters.".to_string());
        }
        if s.len() > 255 {
            return Err("Domain is too long (max 255 chars).".to_string());
        }
        Ok(Self(s.to_string()))
    }

    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 128-bit random comment identifier, lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentHex(String);

impl CommentHex {
    pub const BYTES: usize = 16;

    /// Draws from the OS entropy source. A failed read is returned as-is,
    /// never padded or truncated.
    pub fn random() -> Result<Self, rand::Error> {
        let mut buf = [0u8; Self::BYTES];
        OsRng.try_fill_bytes(&mut buf)?;
        Ok(Self(hex::encode(buf)))
    }

    pub fn new_unchecked(s: String) -> Self {
        Self(s)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationState {
    Approved,
    Unapproved,
    Flagged,
}

impl ModerationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Unapproved => "unapproved",
            Self::Flagged => "flagged",
        }
    }
}

impl fmt::Display for ModerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approved" => Ok(Self::Approved),
            "unapproved" => Ok(Self::Unapproved),
            "flagged" => Ok(Self::Flagged),
            other => Err(format!("unknown moderation state: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainState {
    Live,
    Frozen,
}

impl DomainState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Frozen => "frozen",
        }
    }
}

impl FromStr for DomainState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "live" => Ok(Self::Live),
            "frozen" => Ok(Self::Frozen),
            other => Err(format!("unknown domain state: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Moderator {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub key: DomainKey,
    pub state: DomainState,
    pub require_identification: bool,
    pub require_moderation: bool,
    pub moderate_all_anonymous: bool,
    pub moderators: Vec<Moderator>,
}

impl Domain {
    /// A live domain with every gate open and no moderators.
    pub fn open(key: DomainKey) -> Self {
        Self {
            key,
            state: DomainState::Live,
            require_identification: false,
            require_moderation: false,
            moderate_all_anonymous: false,
            moderators: Vec::new(),
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.state == DomainState::Frozen
    }

    pub fn is_moderator(&self, email: &str) -> bool {
        self.moderators.iter().any(|m| m.email == email)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commenter {
    pub commenter_hex: String,
    pub name: String,
    pub email: String,
    pub link: String,
}

/// Who is submitting a comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    Commenter(Commenter),
}

impl Actor {
    pub fn commenter_hex(&self) -> &str {
        match self {
            Self::Anonymous => ANONYMOUS,
            Self::Commenter(c) => &c.commenter_hex,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub domain: DomainKey,
    pub path: String,
    pub is_locked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub comment_hex: CommentHex,
    pub domain: DomainKey,
    pub path: String,
    pub commenter_hex: String,
    pub parent_hex: String,
    pub markdown: String,
    pub html: String,
    pub created_at: DateTime<Utc>,
    pub state: ModerationState,
}
