//! Transaction state tracking.

/// Logical transaction state of a provider instance.
///
/// The state machine is cyclic, not terminal:
///
/// ```text
/// NoTransaction --begin--> Active --commit|rollback--> NoTransaction
/// ```
///
/// Transitions happen strictly after the delegated driver call succeeds, so
/// a failed commit or rollback leaves the state `Active` and the caller can
/// retry or roll back explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionState {
    /// No transaction is running on the managed connection.
    #[default]
    NoTransaction,
    /// A transaction has been started and not yet committed or rolled back.
    Active,
}

impl TransactionState {
    /// Whether a transaction is currently active.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_no_transaction() {
        assert_eq!(TransactionState::default(), TransactionState::NoTransaction);
        assert!(!TransactionState::default().is_active());
    }

    #[test]
    fn test_active_is_active() {
        assert!(TransactionState::Active.is_active());
    }
}
