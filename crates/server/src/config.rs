use serde::{Deserialize, Serialize};
use tellus::WorldConfig;
use validator::Validate;

/// Everything the server process needs to come up: where to listen, how
/// fast to tick, and the world to simulate. Loadable from JSON or TOML via
/// `--config`; every field has a default so a bare invocation still boots a
/// demo world.
#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ServerConfig {
    #[validate]
    pub api: ApiConfig,

    /// Wall-clock seconds between scheduler ticks. The spec range for a
    /// production deployment; tests drive the core loop directly at
    /// millisecond rates instead.
    #[validate(range(min = 1.0, max = 60.0))]
    pub tick_interval_seconds: f64,

    /// Game-seconds between hydrology passes over the resident tiles.
    #[validate(range(min = 60.0))]
    pub hydrology_cadence_seconds: f64,

    #[validate]
    pub world: WorldConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            tick_interval_seconds: 2.0,
            hydrology_cadence_seconds: 300.0,
            world: WorldConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ApiConfig {
    /// Listen address for the HTTP surface.
    pub bind_addr: String,

    /// Static API key; every non-health request must carry it in the
    /// `x-api-key` header. Override this in any real deployment.
    #[validate(length(min = 1))]
    pub api_key: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".into(),
            api_key: "dev-key".into(),
        }
    }
}
