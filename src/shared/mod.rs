pub mod auth;
pub mod error;
pub mod freshness;
pub mod history;
pub mod poller;
pub mod settings;
pub mod types;
