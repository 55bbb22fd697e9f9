//! Client-side core for the content-based image retrieval comparison demo.
//!
//! The modules cover the query/comparison workflow end to end: the wire
//! protocol spoken by the remote retrieval service, the HTTP clients, the
//! query-session state machine, and the pure view projection consumed by
//! the GUI. Search itself (LSH index, brute-force scan, feature
//! extraction, plot rendering) lives behind the HTTP boundary and is never
//! reimplemented here.

pub mod config;
pub mod protocol;
pub mod remote;
pub mod session;
pub mod view;

pub use config::ServiceConfig;
pub use session::{QuerySubmission, SessionController, SessionStatus, SessionToken};

use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

/// One retrieved item, normalized from either wire shape (§ `protocol`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    pub id: u64,
    /// Relative locator resolvable via `GET /images/{path}`; absent for
    /// legacy bare-id responses and for items the service has no file for.
    pub asset_path: Option<String>,
}

/// Ordered results of one search strategy, best match first. The order is
/// exactly what the service sent; the client never re-sorts.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedResultSet {
    pub elapsed_ms: f64,
    pub items: Vec<ResultItem>,
}

/// Output of one comparison call: both strategies over the same query.
/// Duplicate ids across the two sets are expected, the strategies search
/// independently.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonResult {
    pub approximate: RankedResultSet,
    pub exact: RankedResultSet,
}

/// Server-rendered 2D projection of the vector space, kept as the opaque
/// base64 payload the service sent plus its decoded PNG bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualizationAsset {
    encoded: String,
    decoded: Vec<u8>,
}

impl VisualizationAsset {
    /// Validates the payload at the boundary; a non-base64 body is a
    /// malformed response, not a renderable asset.
    pub fn from_base64(encoded: String) -> ClientResult<Self> {
        let decoded = general_purpose::STANDARD
            .decode(encoded.as_bytes())
            .map_err(|err| ClientError::DecodeError(format!("plot_base64: {err}")))?;
        Ok(Self { encoded, decoded })
    }

    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", self.encoded)
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.decoded
    }
}

/// Size report of the indexed collection (`GET /debug/db_size`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CollectionStatus {
    pub vector_count: usize,
    pub metadata_count: usize,
    pub is_empty: bool,
}

/// Failure taxonomy for every remote interaction.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error("search service unreachable: {0}")]
    NetworkUnavailable(String),
    #[error("search service returned status {0}")]
    ServerError(u16),
    #[error("malformed service response: {0}")]
    DecodeError(String),
}

/// Which half of the workflow an error occurred in. Submission failures
/// fail the session; visualization failures never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Submission,
    VisualizationRefresh,
}

/// An error as recorded on a session, with the phase it interrupted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub error: ClientError,
    pub phase: Phase,
}

impl ErrorInfo {
    pub fn new(error: ClientError, phase: Phase) -> Self {
        Self { error, phase }
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
