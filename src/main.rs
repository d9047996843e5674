use std::error::Error;

use bot::Bot;
use utilities::config::Config;
use utilities::logchamp;

mod apis;
mod bot;
mod relay;
mod server;
mod utilities;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    logchamp::init()?;
    if let Err(err) = dotenvy::dotenv() {
        log::warn!("no .env loaded: {err}");
    }

    let config = Config::from_env();

    let port = config.port.clone();
    tokio::spawn(async move {
        if let Err(err) = server::serve(&port).await {
            log::error!("liveness server stopped: {err}");
        }
    });

    Bot::new(config)?.run().await;

    Ok(())
}
