use super::{decode_json, transport_error, REQUEST_TIMEOUT};
use crate::{
    config::ServiceConfig, protocol::VisualizeResponse, ClientResult, CollectionStatus,
    VisualizationAsset,
};

/// Read-only client for the server-side plot and collection status. Both
/// calls take no input; they reflect the server's indexed collection, not
/// any particular query.
#[derive(Debug, Clone)]
pub struct VisualizationClient {
    http: reqwest::Client,
    config: ServiceConfig,
}

impl VisualizationClient {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub async fn fetch(&self) -> ClientResult<VisualizationAsset> {
        let response = self
            .http
            .get(self.config.visualize_url())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(transport_error)?;
        let body: VisualizeResponse = decode_json(response).await?;
        VisualizationAsset::from_base64(body.plot_base64)
    }

    pub async fn collection_status(&self) -> ClientResult<CollectionStatus> {
        let response = self
            .http
            .get(self.config.collection_status_url())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(transport_error)?;
        decode_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ClientError;
    use base64::{engine::general_purpose, Engine as _};
    use warp::Filter;

    fn serve<F>(routes: F) -> ServiceConfig
    where
        F: Filter<Error = warp::Rejection> + Clone + Send + Sync + 'static,
        F::Extract: warp::Reply,
    {
        let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        ServiceConfig::new(format!("http://{addr}"))
    }

    #[tokio::test]
    async fn fetch_decodes_plot_payload() {
        let encoded = general_purpose::STANDARD.encode(b"png bytes");
        let body = serde_json::json!({ "plot_base64": encoded });
        let routes = warp::path("visualize").map(move || warp::reply::json(&body));
        let client = VisualizationClient::new(serve(routes));

        let asset = client.fetch().await.unwrap();
        assert_eq!(asset.png_bytes(), b"png bytes");
    }

    #[tokio::test]
    async fn fetch_rejects_invalid_base64() {
        let body = serde_json::json!({ "plot_base64": "!!! not base64 !!!" });
        let routes = warp::path("visualize").map(move || warp::reply::json(&body));
        let client = VisualizationClient::new(serve(routes));

        let err = client.fetch().await.unwrap_err();
        assert!(matches!(err, ClientError::DecodeError(_)));
    }

    #[tokio::test]
    async fn collection_status_round_trips() {
        let body = serde_json::json!({
            "vector_count": 1800,
            "metadata_count": 1800,
            "is_empty": false
        });
        let routes = warp::path!("debug" / "db_size").map(move || warp::reply::json(&body));
        let client = VisualizationClient::new(serve(routes));

        let status = client.collection_status().await.unwrap();
        assert_eq!(status.vector_count, 1800);
        assert!(!status.is_empty);
    }
}
