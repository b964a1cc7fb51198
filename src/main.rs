use clap::Parser;
use thiserror::Error;

use tunegraph::adapter::GeminiClient;
use tunegraph::config::{self, Config};
use tunegraph::recommender::{self, Recommender};
use tunegraph::store::{self, MusicGraph};
use tunegraph::web::{self, AppState};

#[derive(Error, Debug)]
enum ApplicationError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("store error: {0}")]
    Store(#[from] store::Error),
    #[error("recommender error: {0}")]
    Recommender(#[from] recommender::Error),
    #[error("web error: {0}")]
    Web(#[from] web::Error),
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(long, default_value_t = 3000u16)]
    port: u16,
    #[arg(long, default_value = "gemini-pro")]
    gemini_model: String,
}

async fn app() -> Result<(), ApplicationError> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config = Config::from_env()?;

    let store = MusicGraph::connect(&config)?;
    let generator = GeminiClient::new(config.google_api_key, args.gemini_model);
    let recommender = Recommender::new(Box::new(generator))?;

    let state = AppState::new(store, recommender);
    web::serve(state, args.port).await?;

    Ok(())
}

#[tokio::main]
async fn main() {
    match app().await {
        Ok(_) => (),
        Err(e) => panic!("Error: {}", e),
    }
}
