//! New-comment pipeline: validate, gate, decide, authorize, persist, notify.

use std::sync::Arc;

use adapter::{CommonMarkRenderer, NoSpamCheck};
use chrono::{DateTime, Utc};
use domain::moderation::{self, ActorClass, PolicyInput};
use domain::ports::{
    CommentStore, CommenterStore, DomainStore, IdGenerator, MarkupRenderer,
    NotificationDispatcher, OsRandomIds, PageStore, PermissionAuthorizer, SpamDetector, SpamQuery,
};
use domain::{
    Actor, Comment, CommentHex, CommentNotification, DomainKey, ModerationState, SubmitError,
    ANONYMOUS,
};
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct NewComment {
    pub commenter_token: String,
    pub domain: String,
    pub path: String,
    pub parent_hex: String,
    pub markdown: String,
    pub ip: String,
    pub user_agent: String,
    /// Supplied by the caller so imports can backdate comments.
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Accepted {
    pub comment_hex: CommentHex,
    pub state: ModerationState,
    pub html: String,
}

#[derive(Clone)]
pub struct CommentService {
    domains: Arc<dyn DomainStore>,
    pages: Arc<dyn PageStore>,
    commenters: Arc<dyn CommenterStore>,
    comments: Arc<dyn CommentStore>,
    spam: Arc<dyn SpamDetector>,
    renderer: Arc<dyn MarkupRenderer>,
    ids: Arc<dyn IdGenerator>,
    authorizer: Option<Arc<dyn PermissionAuthorizer>>,
    notifier: Option<Arc<dyn NotificationDispatcher>>,
}

impl CommentService {
    /// No spam checks, no permission checks, no notifications.
    pub fn new<S>(store: Arc<S>) -> Self
    where
        S: DomainStore + PageStore + CommenterStore + CommentStore + 'static,
    {
        Self {
            domains: store.clone(),
            pages: store.clone(),
            commenters: store.clone(),
            comments: store,
            spam: Arc::new(NoSpamCheck),
            renderer: Arc::new(CommonMarkRenderer),
            ids: Arc::new(OsRandomIds),
            authorizer: None,
            notifier: None,
        }
    }

    pub fn with_spam_detector(mut self, spam: Arc<dyn SpamDetector>) -> Self {
        self.spam = spam;
        self
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn PermissionAuthorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn submit(&self, req: NewComment) -> Result<Accepted, SubmitError> {
        required(&req.commenter_token, "commenterToken")?;
        required(&req.domain, "domain")?;
        required(&req.parent_hex, "parentHex")?;
        required(&req.markdown, "markdown")?;

        let key = DomainKey::parse(&req.domain).map_err(SubmitError::InvalidDomain)?;

        let domain = self
            .domains
            .get_domain(&key)
            .await
            .map_err(|e| internal("cannot get domain", e))?
            .ok_or(SubmitError::NoSuchDomain)?;
        if domain.is_frozen() {
            return Err(SubmitError::DomainFrozen);
        }

        let anonymous = req.commenter_token == ANONYMOUS;
        if anonymous {
            moderation::admits(ActorClass::Anonymous, domain.require_identification)?;
        }

        let page = self
            .pages
            .get_page(&key, &req.path)
            .await
            .map_err(|e| internal("cannot get page attributes", e))?;
        if page.is_locked {
            return Err(SubmitError::ThreadLocked);
        }

        let comment_hex = self
            .ids
            .next_id()
            .map_err(|e| internal("cannot generate comment id", e))?;

        let actor = if anonymous {
            Actor::Anonymous
        } else {
            let commenter = self
                .commenters
                .commenter_by_token(&req.commenter_token)
                .await
                .map_err(|e| internal("cannot resolve commenter", e))?
                .ok_or(SubmitError::NoSuchToken)?;
            Actor::Commenter(commenter)
        };
        let class = ActorClass::of(&actor, &domain);

        // The policy ignores the verdict for moderators, so don't ask.
        let spam = match class {
            ActorClass::Moderator => false,
            _ => {
                let (name, email, link) = match &actor {
                    Actor::Anonymous => ("", "", ""),
                    Actor::Commenter(c) => (c.name.as_str(), c.email.as_str(), c.link.as_str()),
                };
                self.spam
                    .is_spam(&SpamQuery {
                        domain: key.as_str(),
                        ip: &req.ip,
                        user_agent: &req.user_agent,
                        name,
                        email,
                        link,
                        text: &req.markdown,
                    })
                    .await
            }
        };

        let state = moderation::decide(&PolicyInput::new(class, &domain, spam))?;

        if let (Actor::Commenter(c), Some(authorizer)) = (&actor, &self.authorizer) {
            if let Err(denied) = authorizer.authorize(&c.email, &req.path).await {
                warn!(
                    "Permission denied for commenter {} on {}{}: {}",
                    c.commenter_hex, key, req.path, denied.reason
                );
                return Err(SubmitError::PermissionDenied);
            }
        }

        let html = self.renderer.render(&req.markdown);
        let comment = Comment {
            comment_hex,
            domain: key,
            path: req.path,
            commenter_hex: actor.commenter_hex().to_string(),
            parent_hex: req.parent_hex,
            markdown: req.markdown,
            html,
            created_at: req.created_at,
            state,
        };

        self.comments
            .insert_comment(&comment)
            .await
            .map_err(|e| internal("cannot insert comment", e))?;

        self.ensure_page(&comment).await;

        if let Some(notifier) = &self.notifier {
            notifier.dispatch(CommentNotification {
                domain: comment.domain.clone(),
                path: comment.path.clone(),
                commenter_hex: comment.commenter_hex.clone(),
                comment_hex: comment.comment_hex.clone(),
                parent_hex: comment.parent_hex.clone(),
                state,
            });
        }

        info!(
            "Comment {} created on {}{} as {}",
            comment.comment_hex, comment.domain, comment.path, state
        );

        Ok(Accepted {
            comment_hex: comment.comment_hex,
            state,
            html: comment.html,
        })
    }

    /// The comment is already stored, so a failure here is retried once and
    /// then left for repair tooling.
    async fn ensure_page(&self, c: &Comment) {
        for attempt in 1..=2 {
            match self.pages.ensure_page(&c.domain, &c.path).await {
                Ok(()) => return,
                Err(e) if attempt == 1 => {
                    warn!("Page upsert for {}{} failed, retrying: {:?}", c.domain, c.path, e);
                }
                Err(e) => {
                    error!(
                        "Comment {} stored but page record {}{} is missing: {:?}",
                        c.comment_hex, c.domain, c.path, e
                    );
                }
            }
        }
    }
}

fn required(value: &str, field: &'static str) -> Result<(), SubmitError> {
    if value.is_empty() {
        return Err(SubmitError::MissingField(field));
    }
    Ok(())
}

fn internal(context: &'static str, e: impl Into<anyhow::Error>) -> SubmitError {
    let e = e.into().context(context);
    error!("{:?}", e);
    SubmitError::internal(e)
}
