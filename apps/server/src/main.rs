use anyhow::Context;
use quire_kernel::config::load_config;
use quire_logger::Logger;
use quire_runtime::{RuntimeConfig, build_runtime_with_config};
use quire_server::Server;

fn main() -> anyhow::Result<()> {
    build_runtime_with_config(&RuntimeConfig::high_performance())?.block_on(serve())
}

async fn serve() -> anyhow::Result<()> {
    let _log = Logger::builder().name(env!("CARGO_PKG_NAME")).init()?;

    let cfg = load_config(None::<&str>).context("Configuration is malformed")?;

    Server::builder().config(cfg).build().await?.run().await
}
