use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TrustError;

/// Banking operations the trust policy knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    CheckBalance,
    TransferMoney,
    ViewHistory,
    ApplyForLoan,
    SetReminder,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Self::CheckBalance,
        Self::TransferMoney,
        Self::ViewHistory,
        Self::ApplyForLoan,
        Self::SetReminder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CheckBalance => "check_balance",
            Self::TransferMoney => "transfer_money",
            Self::ViewHistory => "view_history",
            Self::ApplyForLoan => "apply_for_loan",
            Self::SetReminder => "set_reminder",
        }
    }

    /// Operations that move money or take on credit.
    pub fn is_sensitive(&self) -> bool {
        matches!(self, Self::TransferMoney | Self::ApplyForLoan)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = TrustError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| TrustError::UnknownOperation(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(op.as_str().parse::<Operation>().unwrap(), op);
            assert_eq!(serde_json::to_string(&op).unwrap(), format!("\"{op}\""));
        }
        assert!(matches!(
            "rob_bank".parse::<Operation>(),
            Err(TrustError::UnknownOperation(_))
        ));
    }

    #[test]
    fn sensitive_set() {
        let sensitive: Vec<_> = Operation::ALL.into_iter().filter(Operation::is_sensitive).collect();
        assert_eq!(sensitive, vec![Operation::TransferMoney, Operation::ApplyForLoan]);
    }
}
