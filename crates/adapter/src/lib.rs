mod markdown;
mod notify;
mod permission;
mod spam;
mod traits;

pub use markdown::CommonMarkRenderer;
pub use notify::{run_worker, NotificationQueue, WebhookConfig, WebhookSink};
pub use permission::{HmacAuthorizer, KeyError, PermissionConfig, PermissionError, SigningKey};
pub use spam::{AkismetConfig, AkismetDetector, NoSpamCheck};
pub use traits::NotificationSink;
