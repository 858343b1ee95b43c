//! Initial moderation state of a new comment.
//!
//! | actor     | requireIdentification | requireModeration | moderateAllAnonymous | spam | result        |
//! |-----------|-----------------------|-------------------|----------------------|------|---------------|
//! | anonymous | yes                   |                   |                      |      | not authorised|
//! | anonymous | no                    |                   |                      | yes  | flagged       |
//! | anonymous | no                    |                   | yes                  | no   | unapproved    |
//! | anonymous | no                    |                   | no                   | no   | approved      |
//! | moderator |                       |                   |                      |      | approved      |
//! | member    |                       |                   |                      | yes  | flagged       |
//! | member    |                       | yes               |                      | no   | unapproved    |
//! | member    |                       | no                |                      | no   | approved      |
//!
//! An empty cell means the value does not matter.

use crate::error::SubmitError;
use crate::models::{Actor, Domain, ModerationState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorClass {
    Anonymous,
    Moderator,
    Member,
}

impl ActorClass {
    pub fn of(actor: &Actor, domain: &Domain) -> Self {
        match actor {
            Actor::Anonymous => Self::Anonymous,
            Actor::Commenter(c) if domain.is_moderator(&c.email) => Self::Moderator,
            Actor::Commenter(_) => Self::Member,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PolicyInput {
    pub actor: ActorClass,
    pub require_identification: bool,
    pub require_moderation: bool,
    pub moderate_all_anonymous: bool,
    pub spam: bool,
}

impl PolicyInput {
    pub fn new(actor: ActorClass, domain: &Domain, spam: bool) -> Self {
        Self {
            actor,
            require_identification: domain.require_identification,
            require_moderation: domain.require_moderation,
            moderate_all_anonymous: domain.moderate_all_anonymous,
            spam,
        }
    }
}

/// Anonymous actors on a domain that requires identification are refused
/// outright. Callers reject them before spam checks; the arm here keeps the
/// function total.
pub fn admits(actor: ActorClass, require_identification: bool) -> Result<(), SubmitError> {
    if actor == ActorClass::Anonymous && require_identification {
        return Err(SubmitError::NotAuthorised);
    }
    Ok(())
}

pub fn decide(input: &PolicyInput) -> Result<ModerationState, SubmitError> {
    admits(input.actor, input.require_identification)?;

    let state = match input.actor {
        ActorClass::Moderator => ModerationState::Approved,
        _ if input.spam => ModerationState::Flagged,
        ActorClass::Anonymous if input.moderate_all_anonymous => ModerationState::Unapproved,
        ActorClass::Member if input.require_moderation => ModerationState::Unapproved,
        ActorClass::Anonymous | ActorClass::Member => ModerationState::Approved,
    };
    Ok(state)
}
