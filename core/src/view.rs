//! Pure projection of the controller state into a display model. No
//! network, no mutation; the GUI renders whatever comes out of
//! [`project`].

use crate::{
    config::ServiceConfig, session::SessionController, ComparisonResult, RankedResultSet,
    SessionStatus,
};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub query: QueryPanel,
    pub visualization: VisualizationPanel,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QueryPanel {
    /// No session yet: prompt the user to pick an image.
    Prompt,
    /// A comparison is in flight; stale results are never shown.
    Busy { preview: Option<PathBuf> },
    /// The comparison failed; no partial result panels.
    Failure { message: String },
    /// Both strategies ran; panels keep the service's rank order.
    Comparison {
        preview: Option<PathBuf>,
        approximate: RankedPanel,
        exact: RankedPanel,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedPanel {
    pub label: &'static str,
    pub elapsed_ms: f64,
    pub items: Vec<ItemCard>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCard {
    pub id: u64,
    /// Fully resolved image reference, when the service knows the file.
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum VisualizationPanel {
    /// Nothing fetched yet.
    Pending,
    Ready {
        data_url: String,
        /// Set when the latest refresh failed and the plot shown is the
        /// prior one, so it is never silently stale.
        stale_note: Option<String>,
    },
    /// The refresh failed and there is no prior plot to fall back to.
    Unavailable { message: String },
}

pub fn project(controller: &SessionController, config: &ServiceConfig) -> ViewModel {
    let session = controller.session();
    let query = match session.status {
        SessionStatus::Idle => QueryPanel::Prompt,
        SessionStatus::Submitting => QueryPanel::Busy {
            preview: session.preview.clone(),
        },
        SessionStatus::Failed => QueryPanel::Failure {
            message: session
                .error
                .as_ref()
                .map(|error| error.message())
                .unwrap_or_else(|| "search failed".to_string()),
        },
        SessionStatus::AwaitingVisualization | SessionStatus::Settled => {
            match &session.results {
                Some(results) => comparison_panels(results, session.preview.clone(), config),
                // Unreachable by the session invariants; degrade rather
                // than panic in a renderer.
                None => QueryPanel::Prompt,
            }
        }
    };

    let visualization = match (controller.visualization(), controller.visualization_error()) {
        (Some(asset), error) => VisualizationPanel::Ready {
            data_url: asset.data_url(),
            stale_note: error.map(|info| format!("refresh failed: {}", info.message())),
        },
        (None, Some(info)) => VisualizationPanel::Unavailable {
            message: info.message(),
        },
        (None, None) => VisualizationPanel::Pending,
    };

    ViewModel {
        query,
        visualization,
    }
}

fn comparison_panels(
    results: &ComparisonResult,
    preview: Option<PathBuf>,
    config: &ServiceConfig,
) -> QueryPanel {
    QueryPanel::Comparison {
        preview,
        approximate: ranked_panel("LSH (Approximate)", &results.approximate, config),
        exact: ranked_panel("Brute Force (Exact)", &results.exact, config),
    }
}

fn ranked_panel(
    label: &'static str,
    set: &RankedResultSet,
    config: &ServiceConfig,
) -> RankedPanel {
    RankedPanel {
        label,
        elapsed_ms: set.elapsed_ms,
        items: set
            .items
            .iter()
            .map(|item| ItemCard {
                id: item.id,
                image_url: item.asset_path.as_deref().map(|path| config.image_url(path)),
            })
            .collect(),
    }
}
