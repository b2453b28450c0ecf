//! Fire-and-forget audit event seam.
//!
//! The audit log itself is an external service; the core only defines
//! the event shape and a sink trait. Sinks must never fail the calling
//! workflow: events are emitted after the financial transaction commits
//! and a lost event does not roll anything back.

use chrono::{DateTime, Utc};

use hazina_shared::types::MemberId;

use crate::loan::LoanStatus;

/// The auditable actions the financial workflows emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    /// A savings deposit was recorded.
    DepositRecorded,
    /// A member applied for a loan.
    LoanApplied,
    /// A loan's status changed (approved, rejected, disbursed, ...).
    LoanStatusChanged(LoanStatus),
    /// A repayment installment was recorded.
    LoanRepayment,
    /// Accumulated income was distributed to members.
    DividendDistributed,
}

impl AuditAction {
    /// Returns the stable action name, e.g. `LOAN_DISBURSED`.
    #[must_use]
    pub fn as_str(&self) -> String {
        match self {
            Self::DepositRecorded => "DEPOSIT_RECORDED".to_string(),
            Self::LoanApplied => "LOAN_APPLIED".to_string(),
            Self::LoanStatusChanged(status) => format!("LOAN_{}", status.as_str()),
            Self::LoanRepayment => "LOAN_REPAYMENT".to_string(),
            Self::DividendDistributed => "DIVIDEND_DISTRIBUTED".to_string(),
        }
    }
}

/// One audit event.
#[derive(Debug, Clone)]
pub struct AuditEvent {
    /// The member or admin who performed the action.
    pub actor_id: MemberId,
    /// What happened.
    pub action: AuditAction,
    /// Entity type the action touched, e.g. `"loan"`.
    pub entity_type: &'static str,
    /// Id of the touched entity.
    pub entity_id: String,
    /// When the action happened.
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn new(
        actor_id: MemberId,
        action: AuditAction,
        entity_type: &'static str,
        entity_id: String,
    ) -> Self {
        Self {
            actor_id,
            action,
            entity_type,
            entity_id,
            occurred_at: Utc::now(),
        }
    }
}

/// Destination for audit events.
///
/// Implementations must be infallible from the caller's perspective;
/// failures are the sink's problem, not the workflow's.
pub trait AuditSink: Send + Sync {
    /// Records an event. Never fails.
    fn record(&self, event: AuditEvent);
}

/// Default sink: structured `tracing` events under the `hazina::audit`
/// target, for collection by whatever subscriber is installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        tracing::info!(
            target: "hazina::audit",
            actor_id = %event.actor_id,
            action = %event.action.as_str(),
            entity_type = event.entity_type,
            entity_id = %event.entity_id,
            occurred_at = %event.occurred_at,
            "audit"
        );
    }
}

/// Sink that drops everything. Used in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_names() {
        assert_eq!(AuditAction::DepositRecorded.as_str(), "DEPOSIT_RECORDED");
        assert_eq!(AuditAction::LoanApplied.as_str(), "LOAN_APPLIED");
        assert_eq!(AuditAction::LoanRepayment.as_str(), "LOAN_REPAYMENT");
        assert_eq!(
            AuditAction::DividendDistributed.as_str(),
            "DIVIDEND_DISTRIBUTED"
        );
    }

    #[test]
    fn test_status_change_names_follow_status() {
        assert_eq!(
            AuditAction::LoanStatusChanged(LoanStatus::Approved).as_str(),
            "LOAN_APPROVED"
        );
        assert_eq!(
            AuditAction::LoanStatusChanged(LoanStatus::Disbursed).as_str(),
            "LOAN_DISBURSED"
        );
        assert_eq!(
            AuditAction::LoanStatusChanged(LoanStatus::Rejected).as_str(),
            "LOAN_REJECTED"
        );
    }

    #[test]
    fn test_sinks_accept_events() {
        let event = AuditEvent::new(
            MemberId::new(),
            AuditAction::DepositRecorded,
            "contribution",
            "abc".to_string(),
        );
        TracingAuditSink.record(event.clone());
        NullAuditSink.record(event);
    }
}
