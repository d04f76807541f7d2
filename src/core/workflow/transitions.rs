//! Workflow transition table
//!
//! The report lifecycle is a finite-state machine validated on every call.
//! Any (status, action) pair absent from the table fails with an
//! invalid-transition error carrying both the current and the requested
//! status; there are no implicit skips.

use crate::domain::errors::AssayError;
use crate::domain::report::ReportStatus;
use crate::domain::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Workflow operations that move a report between statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowAction {
    SubmitForEntry,
    SubmitForQc,
    ApproveQc,
    RejectQc,
    Approve,
    Reject,
    MarkDelivered,
    Amend,
    Cancel,
}

impl WorkflowAction {
    /// The status this action requests, independent of the current status
    ///
    /// Used in invalid-transition errors so the caller sees both ends of
    /// the rejected move.
    pub fn requested_status(&self) -> ReportStatus {
        match self {
            WorkflowAction::SubmitForEntry => ReportStatus::PendingEntry,
            WorkflowAction::SubmitForQc => ReportStatus::PendingQc,
            WorkflowAction::ApproveQc => ReportStatus::PendingReview,
            WorkflowAction::RejectQc => ReportStatus::PendingEntry,
            WorkflowAction::Approve => ReportStatus::Approved,
            WorkflowAction::Reject => ReportStatus::PendingQc,
            WorkflowAction::MarkDelivered => ReportStatus::Delivered,
            WorkflowAction::Amend => ReportStatus::Amended,
            WorkflowAction::Cancel => ReportStatus::Cancelled,
        }
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WorkflowAction::SubmitForEntry => "submit_for_entry",
            WorkflowAction::SubmitForQc => "submit_for_qc",
            WorkflowAction::ApproveQc => "approve_qc",
            WorkflowAction::RejectQc => "reject_qc",
            WorkflowAction::Approve => "approve",
            WorkflowAction::Reject => "reject",
            WorkflowAction::MarkDelivered => "mark_delivered",
            WorkflowAction::Amend => "amend",
            WorkflowAction::Cancel => "cancel",
        };
        write!(f, "{s}")
    }
}

/// The explicit, directional transition table
const TRANSITIONS: &[(ReportStatus, WorkflowAction, ReportStatus)] = &[
    (
        ReportStatus::Draft,
        WorkflowAction::SubmitForEntry,
        ReportStatus::PendingEntry,
    ),
    (
        ReportStatus::PendingEntry,
        WorkflowAction::SubmitForQc,
        ReportStatus::PendingQc,
    ),
    (
        ReportStatus::PendingQc,
        WorkflowAction::ApproveQc,
        ReportStatus::PendingReview,
    ),
    (
        ReportStatus::PendingQc,
        WorkflowAction::RejectQc,
        ReportStatus::PendingEntry,
    ),
    (
        ReportStatus::PendingReview,
        WorkflowAction::Approve,
        ReportStatus::Approved,
    ),
    (
        ReportStatus::PendingReview,
        WorkflowAction::Reject,
        ReportStatus::PendingQc,
    ),
    (
        ReportStatus::Approved,
        WorkflowAction::MarkDelivered,
        ReportStatus::Delivered,
    ),
    (
        ReportStatus::Approved,
        WorkflowAction::Amend,
        ReportStatus::Amended,
    ),
    (
        ReportStatus::Delivered,
        WorkflowAction::Amend,
        ReportStatus::Amended,
    ),
    (
        ReportStatus::Amended,
        WorkflowAction::Amend,
        ReportStatus::Amended,
    ),
    (
        ReportStatus::Amended,
        WorkflowAction::MarkDelivered,
        ReportStatus::Delivered,
    ),
    (
        ReportStatus::Draft,
        WorkflowAction::Cancel,
        ReportStatus::Cancelled,
    ),
    (
        ReportStatus::PendingEntry,
        WorkflowAction::Cancel,
        ReportStatus::Cancelled,
    ),
    (
        ReportStatus::PendingQc,
        WorkflowAction::Cancel,
        ReportStatus::Cancelled,
    ),
    (
        ReportStatus::PendingReview,
        WorkflowAction::Cancel,
        ReportStatus::Cancelled,
    ),
];

/// Resolves the target status for an action from the current status
///
/// # Errors
///
/// Returns `InvalidTransition` when the (status, action) pair is not in the
/// table; the error names the current status and the status the action
/// requested.
pub fn transition_target(current: ReportStatus, action: WorkflowAction) -> Result<ReportStatus> {
    TRANSITIONS
        .iter()
        .find(|(from, a, _)| *from == current && *a == action)
        .map(|(_, _, to)| *to)
        .ok_or(AssayError::InvalidTransition {
            current,
            requested: action.requested_status(),
        })
}

/// Whether the pair is a legal transition
pub fn is_legal(current: ReportStatus, action: WorkflowAction) -> bool {
    transition_target(current, action).is_ok()
}
