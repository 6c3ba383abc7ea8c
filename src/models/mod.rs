//! Data models for SignalPilot

pub mod key;
pub mod stats;
pub mod user;
pub mod withdrawal;

pub use key::RedemptionKey;
pub use stats::{TradeEntry, TradeKind, UserStats};
pub use user::{Subscription, User, UserRole};
pub use withdrawal::{WithdrawalAction, WithdrawalLogEntry, WithdrawalRequest, WithdrawalStatus};
