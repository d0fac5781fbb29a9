use {
    crate::domain::{error::PipelineError, store::StoreFuture},
    std::{collections::HashMap, fmt, sync::RwLock},
};

pub const KEY_TESTMODE: &str = "testmode";
pub const KEY_TEST_USERNAME: &str = "test_webhook_username";
pub const KEY_TEST_PASSWORD: &str = "test_webhook_password";
pub const KEY_LIVE_USERNAME: &str = "webhook_username";
pub const KEY_LIVE_PASSWORD: &str = "webhook_password";
pub const KEY_ALLOW_UNCONFIGURED: &str = "allow_unconfigured_webhooks";
pub const KEY_SIGNING_SECRET: &str = "webhook_signing_secret";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMode {
    Test,
    Live,
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct WebhookCredentials {
    pub username: String,
    pub password: String,
}

impl WebhookCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

impl fmt::Debug for WebhookCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Gateway settings as seen by a single webhook request.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub mode: GatewayMode,
    pub test: WebhookCredentials,
    pub live: WebhookCredentials,
    /// Accept deliveries when the active credentials are blank (legacy behaviour).
    pub allow_unconfigured: bool,
    /// Enables `Finix-Signature` verification when set.
    pub signing_secret: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            mode: GatewayMode::Test,
            test: WebhookCredentials::default(),
            live: WebhookCredentials::default(),
            allow_unconfigured: true,
            signing_secret: None,
        }
    }
}

impl GatewayConfig {
    pub fn active_credentials(&self) -> &WebhookCredentials {
        match self.mode {
            GatewayMode::Test => &self.test,
            GatewayMode::Live => &self.live,
        }
    }

    /// Builds a config from `yes`/`no` style key/value settings. Missing keys
    /// fall back to the defaults.
    pub fn from_settings(settings: &HashMap<String, String>) -> Self {
        let get = |key: &str| settings.get(key).map(|v| v.trim()).unwrap_or("");
        let flag = |key: &str, default: bool| match get(key) {
            "" => default,
            v => matches!(v, "yes" | "true" | "1"),
        };
        let defaults = Self::default();

        Self {
            mode: if flag(KEY_TESTMODE, defaults.mode == GatewayMode::Test) {
                GatewayMode::Test
            } else {
                GatewayMode::Live
            },
            test: WebhookCredentials::new(get(KEY_TEST_USERNAME), get(KEY_TEST_PASSWORD)),
            live: WebhookCredentials::new(get(KEY_LIVE_USERNAME), get(KEY_LIVE_PASSWORD)),
            allow_unconfigured: flag(KEY_ALLOW_UNCONFIGURED, defaults.allow_unconfigured),
            signing_secret: Some(get(KEY_SIGNING_SECRET))
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// Source of gateway settings, consulted on every request so credential
/// changes apply without a restart.
pub trait ConfigProvider: Send + Sync {
    fn load(&self) -> StoreFuture<'_, GatewayConfig>;
}

/// Config held in memory; swappable at runtime with [`StaticConfig::set`].
#[derive(Debug, Default)]
pub struct StaticConfig {
    inner: RwLock<GatewayConfig>,
}

impl StaticConfig {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            inner: RwLock::new(config),
        }
    }

    pub fn set(&self, config: GatewayConfig) {
        match self.inner.write() {
            Ok(mut guard) => *guard = config,
            Err(poisoned) => *poisoned.into_inner() = config,
        }
    }
}

impl ConfigProvider for StaticConfig {
    fn load(&self) -> StoreFuture<'_, GatewayConfig> {
        let config = self
            .inner
            .read()
            .map(|c| c.clone())
            .map_err(|_| PipelineError::Config("config lock poisoned".into()));
        Box::pin(async move { config })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn mode_selects_credentials() {
        let s = settings(&[
            (KEY_TESTMODE, "no"),
            (KEY_TEST_USERNAME, "t-user"),
            (KEY_TEST_PASSWORD, "t-pass"),
            (KEY_LIVE_USERNAME, "l-user"),
            (KEY_LIVE_PASSWORD, "l-pass"),
        ]);
        let config = GatewayConfig::from_settings(&s);
        assert_eq!(config.mode, GatewayMode::Live);
        assert_eq!(config.active_credentials().username, "l-user");

        let s = settings(&[(KEY_TESTMODE, "yes"), (KEY_TEST_USERNAME, "t-user")]);
        let config = GatewayConfig::from_settings(&s);
        assert_eq!(config.mode, GatewayMode::Test);
        assert!(!config.active_credentials().is_configured());
    }

    #[test]
    fn defaults_keep_legacy_allow() {
        let config = GatewayConfig::from_settings(&HashMap::new());
        assert!(config.allow_unconfigured);
        assert!(config.signing_secret.is_none());

        let config = GatewayConfig::from_settings(&settings(&[
            (KEY_ALLOW_UNCONFIGURED, "no"),
            (KEY_SIGNING_SECRET, "  "),
        ]));
        assert!(!config.allow_unconfigured);
        assert!(config.signing_secret.is_none());
    }

    #[test]
    fn debug_redacts_password() {
        let creds = WebhookCredentials::new("user", "hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
    }
}
