pub mod authenticator;
pub mod cli;
pub mod common;
pub mod configuration;
pub mod coordinator;
pub mod core;
pub mod logger;
pub mod prometheus;
pub mod router;
