use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:5000/api`.
    pub base_url: String,
    /// WebSocket endpoint, e.g. `ws://localhost:5000/ws`.
    pub ws_url: String,
    pub force_mock: bool,
    /// Directory for mock data files; in-memory storage when unset.
    pub storage_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api".to_string(),
            ws_url: "ws://localhost:5000/ws".to_string(),
            force_mock: true,
            storage_dir: None,
        }
    }
}

impl ClientConfig {
    /// Reads `PORTAL_API_URL`, `PORTAL_WS_URL`, `PORTAL_MOCK_MODE` and
    /// `PORTAL_STORAGE_DIR`. Mock mode stays on unless set to `false`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            base_url: value("PORTAL_API_URL").unwrap_or(defaults.base_url),
            ws_url: value("PORTAL_WS_URL").unwrap_or(defaults.ws_url),
            force_mock: value("PORTAL_MOCK_MODE")
                .map_or(true, |v| !v.trim().eq_ignore_ascii_case("false")),
            storage_dir: value("PORTAL_STORAGE_DIR").map(PathBuf::from),
        }
    }
}
