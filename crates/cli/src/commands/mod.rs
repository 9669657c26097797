pub mod containers;
pub mod login;
pub mod performance;
