pub mod deposit;
pub mod rate_law;
pub mod scenario;
pub mod sweep;
