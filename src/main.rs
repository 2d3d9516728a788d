use dioxus::prelude::*;

mod api;
mod app;
mod components;
mod platform;
mod shared;
mod utils;

#[cfg(feature = "server")]
mod backend;

pub const MAIN_CSS: Asset = asset!("/assets/main.css");

fn main() {
    #[cfg(feature = "server")]
    {
        use clap::Parser;

        dotenvy::dotenv().ok();
        backend::init_tracing();

        let cli = backend::config::Cli::parse();
        match backend::cli::run(cli) {
            Ok(true) => {}
            Ok(false) => return,
            Err(e) => {
                eprintln!("error: {e:#}");
                std::process::exit(1);
            }
        }
    }
    dioxus::launch(app::App);
}
