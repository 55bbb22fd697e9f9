//! The query-session state machine.
//!
//! Exactly one [`QuerySession`] is live at a time. A new submission always
//! pre-empts the current one, and every asynchronous completion carries the
//! token (or visualization ticket) it was issued under; completions whose
//! token no longer matches are dropped on arrival rather than cancelled in
//! flight. The remote calls are read-style and idempotent, so discarding a
//! stale reply is all the staleness handling the client needs.

use crate::{ClientError, ComparisonResult, ErrorInfo, Phase, VisualizationAsset};
use log::debug;
use std::path::{Path, PathBuf};

/// Monotonically increasing marker for one query attempt. Token 0 is the
/// pre-query lineage used by the startup visualization refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SessionToken(u64);

const BOOT: SessionToken = SessionToken(0);

/// Identifies one visualization fetch: the session it was issued for plus
/// a sequence number that is monotonic across all fetches, so a slower
/// earlier refresh can never clobber a faster newer one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualizationTicket {
    seq: u64,
    session: SessionToken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Submitting,
    AwaitingVisualization,
    Settled,
    Failed,
}

/// The single active query context. Owned and mutated exclusively by
/// [`SessionController`]; the renderer only reads it.
#[derive(Debug, Clone)]
pub struct QuerySession {
    pub status: SessionStatus,
    /// Client-local reference to the selected image, for preview only.
    pub preview: Option<PathBuf>,
    pub results: Option<ComparisonResult>,
    pub error: Option<ErrorInfo>,
}

impl QuerySession {
    fn idle() -> Self {
        Self {
            status: SessionStatus::Idle,
            preview: None,
            results: None,
            error: None,
        }
    }
}

/// A validated query submission. A cancelled file picker hands back an
/// empty string, which is a no-op rather than an error.
#[derive(Debug, Clone)]
pub struct QuerySubmission {
    pub path: PathBuf,
}

impl QuerySubmission {
    pub fn from_picker(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self {
                path: PathBuf::from(trimmed),
            })
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "query.jpg".to_string())
    }
}

/// Sequences image upload, dual-result retrieval, and visualization
/// refresh for the single live session.
///
/// The visualization asset lives on the controller rather than the session:
/// it reflects the server's indexed collection, not any one query, so it
/// stays visible across failed or replaced sessions until a newer fetch
/// replaces it.
#[derive(Debug)]
pub struct SessionController {
    token: SessionToken,
    viz_seq: u64,
    viz_applied: u64,
    session: QuerySession,
    visualization: Option<VisualizationAsset>,
    visualization_error: Option<ErrorInfo>,
}

impl SessionController {
    /// Builds the controller and issues the one unsolicited startup
    /// refresh that populates the visualization panel before any query.
    pub fn new() -> (Self, VisualizationTicket) {
        let mut controller = Self {
            token: BOOT,
            viz_seq: 0,
            viz_applied: 0,
            session: QuerySession::idle(),
            visualization: None,
            visualization_error: None,
        };
        let ticket = controller.issue_refresh(BOOT);
        (controller, ticket)
    }

    /// Starts a fresh session, pre-empting whatever was live. Replies still
    /// in flight for the prior session become stale the moment this
    /// returns.
    pub fn begin_query(&mut self, preview: &Path) -> SessionToken {
        self.token = SessionToken(self.token.0 + 1);
        self.session = QuerySession {
            status: SessionStatus::Submitting,
            preview: Some(preview.to_path_buf()),
            results: None,
            error: None,
        };
        debug!("session {} submitting {}", self.token.0, preview.display());
        self.token
    }

    /// Applies a comparison reply. Returns the ticket for the follow-up
    /// visualization refresh when the reply succeeded and is still current.
    pub fn finish_comparison(
        &mut self,
        token: SessionToken,
        outcome: Result<ComparisonResult, ClientError>,
    ) -> Option<VisualizationTicket> {
        if token != self.token {
            debug!(
                "dropping comparison reply for superseded session {} (current {})",
                token.0, self.token.0
            );
            return None;
        }
        match outcome {
            Ok(results) => {
                self.session.results = Some(results);
                self.session.status = SessionStatus::AwaitingVisualization;
                Some(self.issue_refresh(token))
            }
            Err(error) => {
                self.session.status = SessionStatus::Failed;
                self.session.error = Some(ErrorInfo::new(error, Phase::Submission));
                None
            }
        }
    }

    /// Applies a visualization reply. Stale tickets are dropped without a
    /// trace; a failed refresh is recorded but never fails the session.
    pub fn finish_visualization(
        &mut self,
        ticket: VisualizationTicket,
        outcome: Result<VisualizationAsset, ClientError>,
    ) {
        let boot_lineage = ticket.session == BOOT;
        if !boot_lineage && ticket.session != self.token {
            debug!(
                "dropping visualization reply for superseded session {}",
                ticket.session.0
            );
            return;
        }
        if ticket.seq > self.viz_applied {
            match outcome {
                Ok(asset) => {
                    self.viz_applied = ticket.seq;
                    self.visualization = Some(asset);
                    self.visualization_error = None;
                }
                Err(error) => {
                    self.visualization_error =
                        Some(ErrorInfo::new(error, Phase::VisualizationRefresh));
                }
            }
        } else {
            debug!("dropping visualization reply {}, a newer one applied", ticket.seq);
        }
        if !boot_lineage && self.session.status == SessionStatus::AwaitingVisualization {
            self.session.status = SessionStatus::Settled;
        }
    }

    pub fn session(&self) -> &QuerySession {
        &self.session
    }

    pub fn visualization(&self) -> Option<&VisualizationAsset> {
        self.visualization.as_ref()
    }

    pub fn visualization_error(&self) -> Option<&ErrorInfo> {
        self.visualization_error.as_ref()
    }

    fn issue_refresh(&mut self, session: SessionToken) -> VisualizationTicket {
        self.viz_seq += 1;
        VisualizationTicket {
            seq: self.viz_seq,
            session,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RankedResultSet, ResultItem};

    fn comparison(ids: &[u64]) -> ComparisonResult {
        let items: Vec<ResultItem> = ids
            .iter()
            .map(|&id| ResultItem {
                id,
                asset_path: Some(format!("{id}.jpg")),
            })
            .collect();
        ComparisonResult {
            approximate: RankedResultSet {
                elapsed_ms: 12.4,
                items: items.first().cloned().into_iter().collect(),
            },
            exact: RankedResultSet {
                elapsed_ms: 340.1,
                items,
            },
        }
    }

    fn plot(tag: &str) -> VisualizationAsset {
        use base64::{engine::general_purpose, Engine as _};
        VisualizationAsset::from_base64(general_purpose::STANDARD.encode(tag)).unwrap()
    }

    fn unreachable_error() -> ClientError {
        ClientError::NetworkUnavailable("connection refused".into())
    }

    #[test]
    fn query_settles_through_visualization_refresh() {
        let (mut controller, _boot) = SessionController::new();
        let token = controller.begin_query(Path::new("img1.png"));
        assert_eq!(controller.session().status, SessionStatus::Submitting);

        let ticket = controller
            .finish_comparison(token, Ok(comparison(&[7, 9])))
            .expect("successful comparison issues a refresh");
        assert_eq!(controller.session().status, SessionStatus::AwaitingVisualization);
        assert!(controller.session().results.is_some());

        controller.finish_visualization(ticket, Ok(plot("p1")));
        assert_eq!(controller.session().status, SessionStatus::Settled);
        assert_eq!(controller.visualization(), Some(&plot("p1")));
    }

    #[test]
    fn comparison_failure_marks_session_failed_without_results() {
        let (mut controller, _boot) = SessionController::new();
        let token = controller.begin_query(Path::new("img1.png"));
        let refresh = controller.finish_comparison(token, Err(unreachable_error()));
        assert!(refresh.is_none());
        assert_eq!(controller.session().status, SessionStatus::Failed);
        assert!(controller.session().results.is_none());
        let error = controller.session().error.as_ref().unwrap();
        assert_eq!(error.phase, Phase::Submission);
        assert_eq!(error.error, unreachable_error());
    }

    #[test]
    fn resubmission_discards_prior_results() {
        let (mut controller, _boot) = SessionController::new();
        let first = controller.begin_query(Path::new("img1.png"));
        let ticket = controller.finish_comparison(first, Ok(comparison(&[7]))).unwrap();
        controller.finish_visualization(ticket, Ok(plot("p1")));

        controller.begin_query(Path::new("img2.png"));
        assert_eq!(controller.session().status, SessionStatus::Submitting);
        assert!(controller.session().results.is_none());
        assert_eq!(
            controller.session().preview.as_deref(),
            Some(Path::new("img2.png"))
        );
        // The plot is independent server state and survives the pre-emption.
        assert_eq!(controller.visualization(), Some(&plot("p1")));
    }

    #[test]
    fn late_comparison_for_superseded_session_is_dropped() {
        let (mut controller, _boot) = SessionController::new();
        let first = controller.begin_query(Path::new("img1.png"));
        let second = controller.begin_query(Path::new("img2.png"));

        // img1's slow reply lands after img2 was submitted.
        assert!(controller.finish_comparison(first, Ok(comparison(&[1]))).is_none());
        assert_eq!(controller.session().status, SessionStatus::Submitting);
        assert!(controller.session().results.is_none());

        let ticket = controller
            .finish_comparison(second, Ok(comparison(&[2])))
            .unwrap();
        controller.finish_visualization(ticket, Ok(plot("p2")));
        let rendered = controller.session().results.as_ref().unwrap();
        assert_eq!(rendered.exact.items[0].id, 2);
    }

    #[test]
    fn late_visualization_for_superseded_session_is_dropped() {
        let (mut controller, _boot) = SessionController::new();
        let first = controller.begin_query(Path::new("img1.png"));
        let stale_ticket = controller.finish_comparison(first, Ok(comparison(&[1]))).unwrap();

        let second = controller.begin_query(Path::new("img2.png"));
        controller.finish_visualization(stale_ticket, Ok(plot("stale")));
        assert_eq!(controller.visualization(), None);
        assert_eq!(controller.session().status, SessionStatus::Submitting);

        let ticket = controller
            .finish_comparison(second, Ok(comparison(&[2])))
            .unwrap();
        controller.finish_visualization(ticket, Ok(plot("fresh")));
        assert_eq!(controller.visualization(), Some(&plot("fresh")));
    }

    #[test]
    fn visualization_failure_still_settles_the_session() {
        let (mut controller, _boot) = SessionController::new();
        let token = controller.begin_query(Path::new("img1.png"));
        let ticket = controller.finish_comparison(token, Ok(comparison(&[7, 9]))).unwrap();

        controller.finish_visualization(ticket, Err(unreachable_error()));
        assert_eq!(controller.session().status, SessionStatus::Settled);
        assert!(controller.session().results.is_some());
        assert!(controller.session().error.is_none());
        let viz_error = controller.visualization_error().unwrap();
        assert_eq!(viz_error.phase, Phase::VisualizationRefresh);
    }

    #[test]
    fn startup_refresh_populates_initial_plot() {
        let (mut controller, boot) = SessionController::new();
        controller.finish_visualization(boot, Ok(plot("initial")));
        assert_eq!(controller.visualization(), Some(&plot("initial")));
        assert_eq!(controller.session().status, SessionStatus::Idle);
    }

    #[test]
    fn slow_startup_refresh_loses_to_newer_applied_refresh() {
        let (mut controller, boot) = SessionController::new();
        let token = controller.begin_query(Path::new("img1.png"));
        let ticket = controller.finish_comparison(token, Ok(comparison(&[7]))).unwrap();
        controller.finish_visualization(ticket, Ok(plot("query")));

        // The startup fetch finally resolves, it must not roll the plot back.
        controller.finish_visualization(boot, Ok(plot("boot")));
        assert_eq!(controller.visualization(), Some(&plot("query")));
    }

    #[test]
    fn fast_startup_refresh_applies_even_mid_query() {
        let (mut controller, boot) = SessionController::new();
        controller.begin_query(Path::new("img1.png"));
        controller.finish_visualization(boot, Ok(plot("boot")));
        assert_eq!(controller.visualization(), Some(&plot("boot")));
        assert_eq!(controller.session().status, SessionStatus::Submitting);
    }

    #[test]
    fn late_startup_failure_never_masks_an_applied_plot() {
        let (mut controller, boot) = SessionController::new();
        let token = controller.begin_query(Path::new("img1.png"));
        let ticket = controller.finish_comparison(token, Ok(comparison(&[7]))).unwrap();
        controller.finish_visualization(ticket, Ok(plot("query")));

        controller.finish_visualization(boot, Err(unreachable_error()));
        assert!(controller.visualization_error().is_none());
        assert_eq!(controller.visualization(), Some(&plot("query")));
    }

    #[test]
    fn repeated_refreshes_replace_without_accumulating() {
        let (mut controller, _boot) = SessionController::new();
        for round in 0..3 {
            let token = controller.begin_query(Path::new("img.png"));
            let ticket = controller.finish_comparison(token, Ok(comparison(&[round]))).unwrap();
            controller.finish_visualization(ticket, Ok(plot(&format!("p{round}"))));
        }
        assert_eq!(controller.visualization(), Some(&plot("p2")));
    }

    #[test]
    fn picker_cancellation_is_a_noop() {
        assert!(QuerySubmission::from_picker("").is_none());
        assert!(QuerySubmission::from_picker("   ").is_none());
        let submission = QuerySubmission::from_picker(" img1.png ").unwrap();
        assert_eq!(submission.path, PathBuf::from("img1.png"));
        assert_eq!(submission.file_name(), "img1.png");
    }
}
