mod error;
mod events;
mod models;
pub mod moderation;
pub mod ports;
pub mod protocol;

pub use error::{ErrorKind, PermissionDenied, SubmitError};
pub use events::CommentNotification;
pub use models::{
    Actor, Comment, CommentHex, Commenter, Domain, DomainKey, DomainState, ModerationState,
    Moderator, Page, ANONYMOUS, ROOT_PARENT,
};
