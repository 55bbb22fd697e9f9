use super::{decode_json, transport_error, REQUEST_TIMEOUT};
use crate::{config::ServiceConfig, protocol::CompareResponse, ClientResult, ComparisonResult};
use log::debug;
use reqwest::multipart::{Form, Part};

/// Runs one comparison round-trip: uploads the query image and returns
/// both ranked sets exactly as the service ordered them.
#[derive(Debug, Clone)]
pub struct SearchComparisonClient {
    http: reqwest::Client,
    config: ServiceConfig,
}

impl SearchComparisonClient {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub async fn compare(
        &self,
        file_name: &str,
        payload: Vec<u8>,
    ) -> ClientResult<ComparisonResult> {
        debug!("comparing {} ({} bytes)", file_name, payload.len());
        let part = Part::bytes(payload).file_name(file_name.to_owned());
        let form = Form::new().part("file", part);
        let response = self
            .http
            .post(self.config.compare_url())
            .multipart(form)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(transport_error)?;
        decode_json::<CompareResponse>(response).await?.normalize()
    }
}
