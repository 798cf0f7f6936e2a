//! Transition guard: decides locally, before any request, whether an actor may move an
//! application to a requested status.

use serde::Serialize;

use super::domain::{Application, ApplicationId, ApplicationStatus};
use crate::workflows::session::{Session, UserId, UserRole};

/// The acting user as far as transition rules are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: UserRole,
}

impl From<&Session> for Actor {
    fn from(session: &Session) -> Self {
        Self {
            user_id: session.user.id,
            role: session.role(),
        }
    }
}

/// A transition that passed every local check and may be sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TransitionPlan {
    pub application_id: ApplicationId,
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("{role} accounts cannot change application status")]
    Forbidden { role: UserRole },
    #[error("only the employer who posted the job can change this application")]
    NotJobOwner,
    #[error("cannot move an application from {from} to {to}")]
    Invalid {
        from: ApplicationStatus,
        to: ApplicationStatus,
    },
}

/// Status actions to present to `actor` for `application`.
///
/// Employees never get actions. `job_owner` is the employer of the application's job when
/// known; an employer that is known not to own the job gets none either.
pub fn available_actions(
    actor: Actor,
    application: &Application,
    job_owner: Option<UserId>,
) -> &'static [ApplicationStatus] {
    match authorize(actor, job_owner) {
        Ok(()) => application.status.next_states(),
        Err(_) => &[],
    }
}

/// Validate a requested transition. Performs no I/O.
pub fn plan_transition(
    actor: Actor,
    application: &Application,
    job_owner: Option<UserId>,
    target: ApplicationStatus,
) -> Result<TransitionPlan, TransitionError> {
    authorize(actor, job_owner)?;

    let from = application.status;
    if !from.can_transition_to(target) {
        return Err(TransitionError::Invalid { from, to: target });
    }

    Ok(TransitionPlan {
        application_id: application.id,
        from,
        to: target,
    })
}

fn authorize(actor: Actor, job_owner: Option<UserId>) -> Result<(), TransitionError> {
    if actor.role != UserRole::Employer {
        return Err(TransitionError::Forbidden { role: actor.role });
    }
    match job_owner {
        Some(owner) if owner != actor.user_id => Err(TransitionError::NotJobOwner),
        _ => Ok(()),
    }
}
