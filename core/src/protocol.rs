//! Wire shapes of the retrieval service and their normalization into the
//! internal model. This is the only place that knows the service once sent
//! bare integer ids where it now sends `{ id, path }` objects; everything
//! past this module sees a single [`ResultItem`] shape.

use crate::{ClientError, ClientResult, ComparisonResult, RankedResultSet, ResultItem};
use serde::{Deserialize, Serialize};

/// Body of `POST /search/compare`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareResponse {
    pub lsh: RankedSetResponse,
    pub exact: RankedSetResponse,
}

/// One strategy's timing and ranked hits, as transmitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSetResponse {
    pub time_ms: f64,
    pub results: Vec<ResultEntry>,
}

/// A result entry in either the current object form or the legacy bare-id
/// form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultEntry {
    Described {
        id: u64,
        #[serde(default)]
        path: String,
    },
    Bare(u64),
}

/// Body of `GET /visualize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizeResponse {
    pub plot_base64: String,
}

impl CompareResponse {
    pub fn normalize(self) -> ClientResult<ComparisonResult> {
        Ok(ComparisonResult {
            approximate: self.lsh.normalize("lsh")?,
            exact: self.exact.normalize("exact")?,
        })
    }
}

impl RankedSetResponse {
    fn normalize(self, strategy: &str) -> ClientResult<RankedResultSet> {
        if !self.time_ms.is_finite() || self.time_ms < 0.0 {
            return Err(ClientError::DecodeError(format!(
                "{strategy}.time_ms out of range: {}",
                self.time_ms
            )));
        }
        Ok(RankedResultSet {
            elapsed_ms: self.time_ms,
            items: self.results.into_iter().map(ResultEntry::into_item).collect(),
        })
    }
}

impl ResultEntry {
    fn into_item(self) -> ResultItem {
        match self {
            ResultEntry::Bare(id) => ResultItem {
                id,
                asset_path: None,
            },
            ResultEntry::Described { id, path } => ResultItem {
                id,
                // The service emits "" for items without a known file.
                asset_path: if path.is_empty() { None } else { Some(path) },
            },
        }
    }
}
