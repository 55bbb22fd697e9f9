use anyhow::Context;
use catalog::Catalog;
use clap::Parser;
use service::Latency;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;

mod catalog;
mod service;

#[derive(Parser)]
#[command(author, version, about = "Canned stand-in for the image retrieval service")]
struct Args {
    #[arg(long, default_value_t = 8000)]
    port: u16,
    /// Seed for the generated catalog; same seed, same collection
    #[arg(long, default_value_t = 7)]
    seed: u64,
    #[arg(long, default_value_t = 48)]
    collection_size: usize,
    /// Extra latency on the approximate strategy, in milliseconds
    #[arg(long, default_value_t = 0)]
    lsh_delay_ms: u64,
    /// Extra latency on the exact strategy, useful for exercising the
    /// viewer's stale-response handling
    #[arg(long, default_value_t = 0)]
    exact_delay_ms: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let catalog = Arc::new(Catalog::generate(args.collection_size, args.seed));
    let latency = Latency {
        lsh: Duration::from_millis(args.lsh_delay_ms),
        exact: Duration::from_millis(args.exact_delay_ms),
    };
    let routes = service::routes(catalog.clone(), latency);
    let address = SocketAddr::from(([127, 0, 0, 1], args.port));

    log::info!(
        "serving {} canned items on http://{} (Ctrl+C to stop)",
        catalog.len(),
        address
    );

    let runtime = TokioBuilder::new_current_thread()
        .enable_all()
        .build()
        .context("creating runtime for the stub service")?;
    runtime.block_on(async {
        let (_, server) = warp::serve(routes).bind_with_graceful_shutdown(address, async {
            signal::ctrl_c().await.ok();
        });
        server.await;
        Ok::<(), anyhow::Error>(())
    })?;

    Ok(())
}
