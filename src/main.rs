mod adapter;
mod app;
mod config;
mod covers;
mod models;
mod ui;

use app::CatshelfApp;
use config::Config;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("catshelf=info")),
        )
        .init();

    let config = Config::from_env();
    tracing::debug!(?config, "Loaded configuration");

    let app = CatshelfApp::new(config);
    std::process::exit(app.run());
}
