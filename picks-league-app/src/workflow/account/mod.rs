pub mod remove_account;
