use anyhow::Result;

use fnet_order_bot::utils::logging;
use fnet_order_bot::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // Config first: load() reads .env, which may carry RUST_LOG.
    let config = Config::load()?;
    logging::init();

    App::initialize(config)?.run().await?;

    Ok(())
}
