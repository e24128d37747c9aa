use serde::Deserialize;

use gridtag_core::room::MatchConfig;

/// Top-level server configuration, loaded from `gridtag.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub limits: LimitsConfig,
    pub match_rules: MatchConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            limits: LimitsConfig::default(),
            match_rules: MatchConfig::default(),
        }
    }
}

/// Infrastructure limits (buffer sizes, input caps).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub player_message_buffer: usize,
    pub max_room_name_len: usize,
    pub ws_rate_limit_per_sec: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            player_message_buffer: 256,
            max_room_name_len: 32,
            ws_rate_limit_per_sec: 50.0,
        }
    }
}

impl ServerConfig {
    /// Validate configuration, exiting on unusable values.
    pub fn validate(&self) {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            tracing::error!(
                addr = %self.listen_addr,
                "listen_addr is not a valid socket address"
            );
            std::process::exit(1);
        }
        if self.limits.player_message_buffer == 0 {
            tracing::error!("limits.player_message_buffer must be > 0");
            std::process::exit(1);
        }
        if self.limits.ws_rate_limit_per_sec <= 0.0 {
            tracing::error!("limits.ws_rate_limit_per_sec must be > 0");
            std::process::exit(1);
        }
        if self.match_rules.max_rounds == 0 {
            tracing::error!("match_rules.max_rounds must be > 0");
            std::process::exit(1);
        }
        if self.match_rules.round_seconds == 0 {
            tracing::error!("match_rules.round_seconds must be > 0");
            std::process::exit(1);
        }
    }

    /// Load config from `gridtag.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("gridtag.toml") {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from gridtag.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse gridtag.toml: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No gridtag.toml found, using defaults");
                ServerConfig::default()
            },
        };

        if let Ok(addr) = std::env::var("GRIDTAG_LISTEN_ADDR")
            && !addr.is_empty()
        {
            config.listen_addr = addr;
        }
        if let Ok(val) = std::env::var("GRIDTAG_MESSAGE_BUFFER")
            && let Ok(n) = val.parse::<usize>()
        {
            config.limits.player_message_buffer = n;
        }
        if let Ok(val) = std::env::var("GRIDTAG_WS_RATE_LIMIT")
            && let Ok(n) = val.parse::<f64>()
        {
            config.limits.ws_rate_limit_per_sec = n;
        }
        if let Ok(val) = std::env::var("GRIDTAG_MAX_ROUNDS")
            && let Ok(n) = val.parse::<u32>()
        {
            config.match_rules.max_rounds = n;
        }

        config
    }
}
