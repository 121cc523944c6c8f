pub mod config;
pub mod errors;
pub mod oracle_utils;
pub mod picker;
pub mod response_store;
