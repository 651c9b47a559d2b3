pub mod account;
pub mod picks;
pub mod standings;
