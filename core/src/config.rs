use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Address of the external retrieval service. Injected into the clients at
/// construction so tests and alternate environments can point elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub base_url: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Reads `CBIR_SERVICE_URL`, falling back to the local default.
    pub fn from_env() -> Self {
        match std::env::var("CBIR_SERVICE_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim().to_string()),
            _ => Self::default(),
        }
    }

    pub fn visualize_url(&self) -> String {
        self.endpoint("visualize")
    }

    pub fn compare_url(&self) -> String {
        self.endpoint("search/compare")
    }

    pub fn collection_status_url(&self) -> String {
        self.endpoint("debug/db_size")
    }

    /// Externally resolvable reference for a result item's image.
    pub fn image_url(&self, asset_path: &str) -> String {
        self.endpoint(&format!("images/{}", asset_path.trim_start_matches('/')))
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_tolerate_trailing_slash() {
        let config = ServiceConfig::new("http://localhost:9001/");
        assert_eq!(config.visualize_url(), "http://localhost:9001/visualize");
        assert_eq!(config.compare_url(), "http://localhost:9001/search/compare");
        assert_eq!(
            config.collection_status_url(),
            "http://localhost:9001/debug/db_size"
        );
    }

    #[test]
    fn image_url_joins_relative_path() {
        let config = ServiceConfig::default();
        assert_eq!(
            config.image_url("042.bird/0042_0007.jpg"),
            "http://127.0.0.1:8000/images/042.bird/0042_0007.jpg"
        );
        assert_eq!(
            config.image_url("/absolute.jpg"),
            "http://127.0.0.1:8000/images/absolute.jpg"
        );
    }
}
