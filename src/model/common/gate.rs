use crate::model::common::autoclose::CloseReason;
use crate::model::common::form::FormState;

/// The facts the submission gate decides over, gathered by the caller:
/// the form's publication state after auto-close re-evaluation, whether
/// the respondent presented a verifiable identity, and whether a response
/// for their normalised email already exists.
#[derive(Debug, Clone)]
pub struct SubmissionAttempt {
    pub state: FormState,
    pub closed_reason: Option<CloseReason>,
    pub identity_verified: bool,
    pub allow_multiple_responses: bool,
    pub prior_response: bool,
}

/// The terminal outcome the gate assigns to an attempt.
///
/// `RejectUnverified` is recoverable (the respondent can re-verify and
/// resubmit); the other rejections are terminal for the attempt and each
/// carries a distinct, user-legible reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateVerdict {
    Accept,
    RejectClosed(Option<CloseReason>),
    RejectUnverified,
    RejectDuplicate,
}

/// Decide whether a submission attempt may proceed.
///
/// Checks run in a fixed order: publication state first, identity second,
/// duplication last. Acceptance is decided here; persisting the response,
/// bumping the response count and re-running auto-close are the caller's
/// side effects.
pub fn evaluate(attempt: &SubmissionAttempt) -> GateVerdict {
    if attempt.state != FormState::Published {
        return GateVerdict::RejectClosed(attempt.closed_reason);
    }
    if !attempt.identity_verified {
        return GateVerdict::RejectUnverified;
    }
    if attempt.prior_response && !attempt.allow_multiple_responses {
        return GateVerdict::RejectDuplicate;
    }
    GateVerdict::Accept
}
