#![cfg(feature = "server")]

pub mod cli;
pub mod config;
pub mod esp_client;
pub mod key_file;
pub mod poller;

use once_cell::sync::OnceCell;

pub use esp_client::EspClient;

use crate::shared::poller::FeedConfig;

pub use tracing_subscriber::{fmt, prelude::*, util::SubscriberInitExt, EnvFilter};

/// Connection to `esp_service` shared by the server functions.
#[derive(Debug, Clone)]
pub struct Service {
    pub client: EspClient,
    pub feed: FeedConfig,
}

pub static SERVICE: OnceCell<Service> = OnceCell::new();

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,reqwest=warn"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
