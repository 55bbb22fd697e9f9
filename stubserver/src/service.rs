use crate::catalog::{probe_digest, Catalog, CatalogItem};
use base64::{engine::general_purpose, Engine as _};
use cbircore::protocol::{CompareResponse, RankedSetResponse, ResultEntry, VisualizeResponse};
use cbircore::CollectionStatus;
use log::info;
use std::sync::Arc;
use std::time::{Duration, Instant};
use warp::hyper::body::Bytes;
use warp::Filter;

pub const TOP_K: usize = 10;

/// Minimal transparent 1x1 PNG, served both as the plot payload and as
/// every catalog image.
const PLACEHOLDER_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Artificial per-strategy latency, for exercising the viewer's
/// stale-response handling by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct Latency {
    pub lsh: Duration,
    pub exact: Duration,
}

/// All four endpoints of the retrieval contract.
pub fn routes(
    catalog: Arc<Catalog>,
    latency: Latency,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let catalog_filter = warp::any().map(move || catalog.clone());
    let latency_filter = warp::any().map(move || latency);

    let visualize = warp::path("visualize")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| {
            warp::reply::json(&VisualizeResponse {
                plot_base64: general_purpose::STANDARD.encode(PLACEHOLDER_PNG),
            })
        });

    let compare = warp::path!("search" / "compare")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(catalog_filter.clone())
        .and(latency_filter)
        .and_then(handle_compare);

    let images = warp::path("images")
        .and(warp::get())
        .and(warp::path::tail())
        .map(|tail: warp::path::Tail| {
            info!("serving placeholder image for {}", tail.as_str());
            warp::reply::with_header(PLACEHOLDER_PNG.to_vec(), "content-type", "image/png")
        });

    let db_size = warp::path!("debug" / "db_size")
        .and(warp::get())
        .and(catalog_filter)
        .map(|catalog: Arc<Catalog>| {
            warp::reply::json(&CollectionStatus {
                vector_count: catalog.len(),
                metadata_count: catalog.len(),
                is_empty: catalog.is_empty(),
            })
        });

    visualize.or(compare).or(images).or(db_size)
}

/// The multipart envelope is treated as an opaque upload: the stub has no
/// feature extractor, it only needs a stable probe per payload.
async fn handle_compare(
    body: Bytes,
    catalog: Arc<Catalog>,
    latency: Latency,
) -> Result<impl warp::Reply, warp::Rejection> {
    let probe = probe_digest(&body);
    info!("compare request: {} bytes, probe {probe:016x}", body.len());

    let lsh = timed_rank(|| catalog.rank_approximate(probe, TOP_K), latency.lsh).await;
    let exact = timed_rank(|| catalog.rank_exact(probe, TOP_K), latency.exact).await;
    Ok(warp::reply::json(&CompareResponse { lsh, exact }))
}

async fn timed_rank(
    rank: impl FnOnce() -> Vec<CatalogItem>,
    delay: Duration,
) -> RankedSetResponse {
    let started = Instant::now();
    let hits = rank();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    RankedSetResponse {
        time_ms: started.elapsed().as_secs_f64() * 1000.0,
        results: hits
            .into_iter()
            .map(|item| ResultEntry::Described {
                id: item.id,
                path: item.path,
            })
            .collect(),
    }
}
