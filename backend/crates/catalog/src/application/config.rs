//! Lobby configuration

/// Where lobby links point
#[derive(Debug, Clone)]
pub struct LobbyConfig {
    /// Used when a game has no usable public host
    pub default_host: String,
    /// Hosts that never end up in a link
    pub dev_hosts: Vec<String>,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            default_host: "https://lobby.example.com".to_string(),
            dev_hosts: vec![
                "localhost".to_string(),
                "127.0.0.1".to_string(),
                "0.0.0.0".to_string(),
            ],
        }
    }
}

impl LobbyConfig {
    /// Local lobby on the default dev port
    pub fn development() -> Self {
        Self {
            default_host: "http://localhost:8081".to_string(),
            ..Default::default()
        }
    }

    pub fn with_default_host(mut self, host: impl Into<String>) -> Self {
        self.default_host = host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_dev_host(&self, host: &str) -> bool {
        self.dev_hosts.iter().any(|h| h.eq_ignore_ascii_case(host))
    }
}
