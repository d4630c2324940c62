// Status lifecycle shared by every record settled through a payment gateway
//
// A record starts in an initial status, may move between non-terminal
// statuses, and reaches a terminal status exactly once. The first terminal
// write wins: any later transition request is reported as unchanged.

use serde::{Deserialize, Serialize};

use crate::time::get_current_time_in_millis;

pub trait StatusLifecycle: Copy + Eq + std::fmt::Debug {
    /// No transition is accepted once a record is in this status
    fn is_terminal(&self) -> bool;

    /// Status a record may be created in, never a transition target
    fn is_initial(&self) -> bool;
}

/// Extra data written together with a status change
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransitionDetails {
    /// Transaction id assigned by the gateway
    pub gateway_transaction_id: Option<String>,
    /// Free-form note written by an operator
    pub admin_note: Option<String>,
}

impl TransitionDetails {
    pub fn with_gateway_transaction_id(mut self, id: impl Into<String>) -> Self {
        self.gateway_transaction_id = Some(id.into());
        self
    }

    pub fn with_admin_note(mut self, note: impl Into<String>) -> Self {
        self.admin_note = Some(note.into());
        self
    }
}

pub trait Transitional {
    type Status: StatusLifecycle;

    fn status(&self) -> Self::Status;

    /// Write the new status and details, called only for accepted transitions
    fn apply_status(&mut self, status: Self::Status, details: &TransitionDetails);

    fn set_updated_at(&mut self, timestamp: u64);
}

/// Try to move `record` to `to`.
/// Returns true when the record was modified.
pub fn transition<R: Transitional>(
    record: &mut R,
    to: R::Status,
    details: &TransitionDetails,
) -> bool {
    let current = record.status();
    if current.is_terminal() || current == to || to.is_initial() {
        return false;
    }

    record.apply_status(to, details);
    record.set_updated_at(get_current_time_in_millis());
    true
}

/// Outcome of a transition request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition<T> {
    /// This call performed the status change
    Applied(T),
    /// The stored record already had a terminal or identical status
    Unchanged(T),
}

impl<T> Transition<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn record(&self) -> &T {
        match self {
            Self::Applied(record) | Self::Unchanged(record) => record,
        }
    }

    pub fn into_record(self) -> T {
        match self {
            Self::Applied(record) | Self::Unchanged(record) => record,
        }
    }
}
