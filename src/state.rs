use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::Gateway;

/// Optional features, decided once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub advanced_analytics: bool,
}

impl Capabilities {
    /// Compiled in with the `advanced-analytics` feature and not switched
    /// off by configuration.
    pub fn detect(config: &AppConfig) -> Self {
        Self {
            advanced_analytics: cfg!(feature = "advanced-analytics") && config.advanced_analytics,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
    pub config: Arc<AppConfig>,
    pub capabilities: Capabilities,
}

impl AppState {
    pub fn init(config: AppConfig) -> Self {
        let gateway = Gateway::new(&config.db);
        let capabilities = Capabilities::detect(&config);
        Self::from_parts(gateway, Arc::new(config), capabilities)
    }

    pub fn from_parts(gateway: Gateway, config: Arc<AppConfig>, capabilities: Capabilities) -> Self {
        Self {
            gateway,
            config,
            capabilities,
        }
    }

    #[cfg(test)]
    pub fn fake(driver: crate::db::fake::FakeDriver, advanced_analytics: bool) -> Self {
        let config = AppConfig::from_lookup(|_| None).expect("default config");
        Self::from_parts(
            Gateway::with_driver(driver),
            Arc::new(config),
            Capabilities { advanced_analytics },
        )
    }
}
