//! Pipeline-level escapes.
//!
//! Handlers in the before, when, and report phases return a [`Flow`]. The
//! `Ok` side is an ordinary dispatch outcome; the `Err` side is an
//! [`Interrupt`] that leaves the whole dispatch and is resolved by the
//! pipeline (abort, substitution) or by the owning context (faults).

use fabula_foundation::Error;
use fabula_rules::Outcome;
use thiserror::Error;

use crate::action::Action;

/// What a phase handler returns.
pub type Flow = std::result::Result<Outcome<()>, Interrupt>;

/// A non-local exit from an action.
#[derive(Debug, Error)]
pub enum Interrupt {
    /// Stop this action and every do-first caller above it.
    #[error("action aborted")]
    Abort(Option<String>),

    /// Replace the action and restart the pipeline on the replacement.
    #[error("doing {action} instead")]
    DoInstead {
        /// The replacement.
        action: Action,
        /// Skip the `(gerund)` announcement.
        suppress_message: bool,
    },

    /// A fault; the turn is rolled back.
    #[error(transparent)]
    Fault(#[from] Error),
}

impl Interrupt {
    /// The abort message, if this is an abort that carries one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Abort(Some(msg)) => Some(msg),
            _ => None,
        }
    }

    /// Adds a stack frame to a fault; other interrupts pass through.
    #[must_use]
    pub fn in_frame(self, frame: impl Into<String>) -> Self {
        match self {
            Self::Fault(e) => Self::Fault(e.with_frame(frame)),
            other => other,
        }
    }
}

/// Records a result and lets dispatch continue.
///
/// # Errors
///
/// Never; the `Result` shape matches [`Flow`].
pub fn proceed() -> Flow {
    Ok(Outcome::Value(()))
}

/// Declines; the handler did not apply after all.
///
/// # Errors
///
/// Never; the `Result` shape matches [`Flow`].
pub fn not_handled() -> Flow {
    Ok(Outcome::NotHandled)
}

/// Ends this phase early; later handlers in the phase are skipped.
///
/// # Errors
///
/// Never; the `Result` shape matches [`Flow`].
pub fn handled() -> Flow {
    Ok(Outcome::Handled(()))
}

/// Aborts the action with a message.
///
/// # Errors
///
/// Always returns [`Interrupt::Abort`].
pub fn abort(message: impl Into<String>) -> Flow {
    Err(Interrupt::Abort(Some(message.into())))
}

/// Aborts the action without narrating.
///
/// # Errors
///
/// Always returns [`Interrupt::Abort`].
pub fn abort_silently() -> Flow {
    Err(Interrupt::Abort(None))
}

/// Replaces the action, announcing the replacement.
///
/// # Errors
///
/// Always returns [`Interrupt::DoInstead`].
pub fn do_instead(action: Action) -> Flow {
    Err(Interrupt::DoInstead {
        action,
        suppress_message: false,
    })
}

/// Replaces the action without announcing it.
///
/// # Errors
///
/// Always returns [`Interrupt::DoInstead`].
pub fn do_instead_quietly(action: Action) -> Flow {
    Err(Interrupt::DoInstead {
        action,
        suppress_message: true,
    })
}
