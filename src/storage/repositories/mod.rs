//! Entity repositories: typed read/modify/write wrappers over one KV
//! document each

pub mod keys;
pub mod settings;
pub mod stats;
pub mod users;
pub mod withdrawals;

pub use keys::KeysRepo;
pub use settings::SettingsRepo;
pub use stats::StatsRepo;
pub use users::UsersRepo;
pub use withdrawals::WithdrawalsRepo;
