use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// TransactionKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Debit,
    Credit,
}

impl TransactionKind {
    /// Single-character code stored in the `transactions.kind` column.
    pub fn as_code(self) -> &'static str {
        match self {
            TransactionKind::Debit => "d",
            TransactionKind::Credit => "c",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "d" => Some(TransactionKind::Debit),
            "c" => Some(TransactionKind::Credit),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Debit => write!(f, "debit"),
            TransactionKind::Credit => write!(f, "credit"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRequest {
    pub amount: i32,
    pub kind: TransactionKind,
    pub description: String,
}

/// Balance and limit after an accepted debit/credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub balance: i32,
    pub limit: i32,
}

/// Outcome of a debit/credit attempt.
///
/// Rejection (insufficient funds) and an unknown account are ordinary
/// outcomes of the stored procedure, not errors: the caller maps them to
/// transport responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    Accepted(TransactionReceipt),
    Rejected,
    UnknownAccount,
}

// ---------------------------------------------------------------------------
// Account statement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub total: i32,
    pub limit: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementEntry {
    pub amount: i32,
    pub kind: TransactionKind,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Current balance plus the ten most recent transactions, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountStatement {
    pub balance: BalanceSnapshot,
    pub transactions: Vec<StatementEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_codes_round_trip() {
        assert_eq!(TransactionKind::Debit.as_code(), "d");
        assert_eq!(TransactionKind::from_code("c"), Some(TransactionKind::Credit));
        assert_eq!(TransactionKind::from_code("x"), None);
    }

    #[test]
    fn kind_serializes_as_lowercase_word() {
        let json = serde_json::to_string(&TransactionKind::Debit).unwrap();
        assert_eq!(json, "\"debit\"");
    }
}
