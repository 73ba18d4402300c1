use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Operation, TrustConfig, TrustLevel};

/// An authentication factor a caller can be asked to present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthFactor {
    VoiceBiometric,
    Pin,
    Otp,
}

impl fmt::Display for AuthFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::VoiceBiometric => "voice_biometric",
            Self::Pin => "pin",
            Self::Otp => "otp",
        })
    }
}

/// Factors demanded at a trust level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredAuthentication {
    pub voice_biometric: bool,
    pub pin: bool,
    pub otp: bool,
    /// When false, sensitive operations stay blocked whatever factors are
    /// presented.
    pub allow_sensitive_operations: bool,
}

impl RequiredAuthentication {
    pub(crate) fn for_level(level: TrustLevel) -> Self {
        match level {
            TrustLevel::High | TrustLevel::Medium => Self {
                voice_biometric: true,
                pin: false,
                otp: false,
                allow_sensitive_operations: true,
            },
            TrustLevel::Low => Self {
                voice_biometric: true,
                pin: true,
                otp: false,
                allow_sensitive_operations: false,
            },
            TrustLevel::Critical => Self {
                voice_biometric: true,
                pin: true,
                otp: true,
                allow_sensitive_operations: false,
            },
        }
    }

    /// Secondary factors (PIN, OTP) beyond the voice match.
    pub fn step_up_factors(&self) -> Vec<AuthFactor> {
        let mut out = Vec::with_capacity(2);
        if self.pin {
            out.push(AuthFactor::Pin);
        }
        if self.otp {
            out.push(AuthFactor::Otp);
        }
        out
    }
}

/// Operations permitted at a trust level and the transaction ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllowedOperations {
    pub check_balance: bool,
    pub transfer_money: bool,
    pub view_history: bool,
    pub apply_for_loan: bool,
    pub set_reminder: bool,
    /// `None` means uncapped.
    pub max_transaction_amount: Option<f64>,
}

impl AllowedOperations {
    pub(crate) fn for_level(level: TrustLevel, cfg: &TrustConfig) -> Self {
        match level {
            TrustLevel::High => Self {
                check_balance: true,
                transfer_money: true,
                view_history: true,
                apply_for_loan: true,
                set_reminder: true,
                max_transaction_amount: None,
            },
            TrustLevel::Medium => Self {
                check_balance: true,
                transfer_money: true,
                view_history: true,
                apply_for_loan: true,
                set_reminder: true,
                max_transaction_amount: Some(cfg.high_value_threshold),
            },
            TrustLevel::Low => Self {
                check_balance: true,
                transfer_money: true,
                view_history: true,
                apply_for_loan: false,
                set_reminder: true,
                max_transaction_amount: Some(cfg.default_transaction_limit),
            },
            TrustLevel::Critical => Self {
                check_balance: true,
                transfer_money: false,
                view_history: true,
                apply_for_loan: false,
                set_reminder: false,
                max_transaction_amount: Some(0.0),
            },
        }
    }

    pub fn allows(&self, op: Operation) -> bool {
        match op {
            Operation::CheckBalance => self.check_balance,
            Operation::TransferMoney => self.transfer_money,
            Operation::ViewHistory => self.view_history,
            Operation::ApplyForLoan => self.apply_for_loan,
            Operation::SetReminder => self.set_reminder,
        }
    }

    /// True if `amount` is within the ceiling.
    pub fn within_limit(&self, amount: f64) -> bool {
        match self.max_transaction_amount {
            None => amount.is_finite(),
            Some(max) => amount <= max,
        }
    }
}
