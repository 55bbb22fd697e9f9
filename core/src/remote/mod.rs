//! HTTP clients for the external retrieval service. Both share the same
//! error mapping: transport problems become `NetworkUnavailable`, non-2xx
//! statuses become `ServerError`, and anything that fails to parse becomes
//! `DecodeError`.

pub mod compare;
pub mod visualize;

pub use compare::SearchComparisonClient;
pub use visualize::VisualizationClient;

use crate::{ClientError, ClientResult};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// No timeout is defined by the service contract; expiry is treated the
/// same as an unreachable service.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn transport_error(err: reqwest::Error) -> ClientError {
    if err.is_decode() {
        ClientError::DecodeError(err.to_string())
    } else {
        ClientError::NetworkUnavailable(err.to_string())
    }
}

pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> ClientResult<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::ServerError(status.as_u16()));
    }
    let body = response.text().await.map_err(transport_error)?;
    serde_json::from_str(&body).map_err(|err| ClientError::DecodeError(err.to_string()))
}
