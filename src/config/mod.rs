use crate::args::Cli;
use crate::narration::Dialect;
use crate::retry::RetryPolicy;
use anyhow::{Context, Result};
use derive_builder::Builder;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

mod load_api_key;

pub use load_api_key::ApiKey;
use load_api_key::{load_api_key, LIFI_API_KEY_ENV_VAR, MODEL_API_KEY_ENV_VAR};

#[derive(Builder, Clone, Debug)]
pub struct TlsConfig {
    /// PEM certificate chain
    #[builder(setter(into))]
    pub cert_path: PathBuf,
    /// PEM private key
    #[builder(setter(into))]
    pub key_path: PathBuf,
}

impl TlsConfig {
    pub fn builder() -> TlsConfigBuilder {
        TlsConfigBuilder::default()
    }
}

#[derive(Builder, Clone, Debug)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    #[builder(default = "SocketAddr::from(([0, 0, 0, 0], 8000))")]
    pub listen: SocketAddr,
    /// Origins allowed by CORS
    #[builder(default)]
    pub allowed_origins: Vec<String>,
    /// Serve HTTPS when set
    #[builder(default)]
    pub tls: Option<TlsConfig>,
    /// How long in-flight requests may drain after a shutdown signal
    #[builder(default = "Duration::from_secs(10)")]
    pub shutdown_grace: Duration,
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

#[derive(Builder, Clone, Debug)]
pub struct AggregatorConfig {
    /// Base URL of the LI.FI API, without trailing slash
    #[builder(setter(into), default = "String::from(\"https://li.quest\")")]
    pub base_url: String,
    /// Route for quote requests
    #[builder(setter(into), default = "String::from(\"/v1/quote\")")]
    pub quote_route: String,
    pub api_key: ApiKey,
    #[builder(default = "Duration::from_secs(15)")]
    pub request_timeout: Duration,
    #[builder(default = "Duration::from_secs(10)")]
    pub connect_timeout: Duration,
    /// Upper bound on in-flight requests
    #[builder(default = "100")]
    pub max_connections: usize,
    /// Idle connections kept in the pool per host
    #[builder(default = "20")]
    pub max_idle_connections: usize,
}

impl AggregatorConfig {
    pub fn builder() -> AggregatorConfigBuilder {
        AggregatorConfigBuilder::default()
    }

    pub fn quote_url(&self) -> String {
        format!("{}{}", self.base_url, self.quote_route)
    }
}

#[derive(Builder, Clone, Debug)]
pub struct NarratorConfig {
    /// Base URL of the chat-completion API, without trailing slash
    #[builder(setter(into), default = "String::from(\"https://api.openai.com\")")]
    pub api_url: String,
    pub api_key: ApiKey,
    /// The ID of the model
    #[builder(setter(into), default = "String::from(\"gpt-4o-mini\")")]
    pub model_id: String,
    #[builder(default = "256")]
    pub max_tokens: u32,
    #[builder(default = "Duration::from_secs(30)")]
    pub request_timeout: Duration,
    /// Attempts per narration, the first one included
    #[builder(default = "1")]
    pub attempts: u32,
    /// Narrations allowed to run at once
    #[builder(default = "16")]
    pub max_concurrent: usize,
}

impl NarratorConfig {
    pub fn builder() -> NarratorConfigBuilder {
        NarratorConfigBuilder::default()
    }

    pub fn dialect(&self) -> Dialect {
        Dialect::from_api_url(&self.api_url)
    }
}

#[derive(Builder, Clone, Debug)]
pub struct CacheConfig {
    #[builder(default = "Duration::from_secs(60)")]
    pub ttl: Duration,
    #[builder(default = "NonZeroUsize::new(1000).unwrap_or(NonZeroUsize::MIN)")]
    pub capacity: NonZeroUsize,
}

impl CacheConfig {
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }
}

#[derive(Builder, Clone, Debug)]
#[builder(pattern = "owned")]
pub struct AppConfig {
    pub server: ServerConfig,
    pub aggregator: AggregatorConfig,
    pub narrator: NarratorConfig,
    #[builder(default)]
    pub cache: CacheConfig,
    #[builder(default)]
    pub retry: RetryPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            capacity: NonZeroUsize::new(1000).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

impl AppConfig {
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// Build the runtime configuration from parsed arguments and the environment.
    pub fn setup(cli: &Cli) -> Result<AppConfig> {
        let lifi_key =
            load_api_key(LIFI_API_KEY_ENV_VAR).context("Failed to load LI.FI API key")?;
        let model_key =
            load_api_key(MODEL_API_KEY_ENV_VAR).context("Failed to load model API key")?;

        let tls = match (&cli.server.tls_cert, &cli.server.tls_key) {
            (Some(cert), Some(key)) => Some(
                TlsConfig::builder()
                    .cert_path(cert)
                    .key_path(key)
                    .build()
                    .context("Failed to build TLS config")?,
            ),
            _ => None,
        };

        let server = ServerConfig::builder()
            .listen(cli.server.listen)
            .allowed_origins(cli.server.allowed_origins.clone())
            .tls(tls)
            .build()
            .context("Failed to build server config")?;

        let aggregator = AggregatorConfig::builder()
            .base_url(&cli.aggregator.aggregator_url)
            .api_key(lifi_key)
            .request_timeout(Duration::from_secs(cli.aggregator.request_timeout_secs))
            .connect_timeout(Duration::from_secs(cli.aggregator.connect_timeout_secs))
            .max_connections(cli.aggregator.max_upstream_connections.get())
            .max_idle_connections(cli.aggregator.max_idle_connections)
            .build()
            .context("Failed to build aggregator config")?;

        let narrator = NarratorConfig::builder()
            .api_url(&cli.narrator.model_api_url)
            .api_key(model_key)
            .model_id(&cli.narrator.model)
            .max_tokens(cli.narrator.max_tokens)
            .attempts(cli.narrator.narration_attempts)
            .max_concurrent(cli.narrator.max_concurrent_narrations.get())
            .build()
            .context("Failed to build narrator config")?;

        let cache = CacheConfig::builder()
            .ttl(Duration::from_secs(cli.cache.cache_ttl_secs))
            .capacity(cli.cache.cache_capacity)
            .build()
            .context("Failed to build cache config")?;

        let retry = RetryPolicy::builder()
            .max_attempts(cli.retry.retry_attempts)
            .base_delay(Duration::from_millis(cli.retry.retry_base_delay_ms))
            .max_delay(Duration::from_millis(
                cli.retry.retry_max_delay_ms.max(cli.retry.retry_base_delay_ms),
            ))
            .build()
            .context("Failed to build retry policy")?;

        let config = Self::builder()
            .server(server)
            .aggregator(aggregator)
            .narrator(narrator)
            .cache(cache)
            .retry(retry)
            .build()
            .context("Failed to build application config")?;

        config.log_summary();

        Ok(config)
    }

    /// One line per component, credentials excluded.
    fn log_summary(&self) {
        let scheme = if self.server.tls.is_some() { "https" } else { "http" };
        info!(
            listen = %self.server.listen,
            scheme,
            origins = self.server.allowed_origins.len(),
            "server"
        );
        info!(
            url = %self.aggregator.quote_url(),
            timeout_s = self.aggregator.request_timeout.as_secs(),
            connect_timeout_s = self.aggregator.connect_timeout.as_secs(),
            max_connections = self.aggregator.max_connections,
            "aggregator"
        );
        info!(
            url = %self.narrator.api_url,
            dialect = ?self.narrator.dialect(),
            model = %self.narrator.model_id,
            max_tokens = self.narrator.max_tokens,
            attempts = self.narrator.attempts,
            max_concurrent = self.narrator.max_concurrent,
            "narrator"
        );
        info!(
            ttl_s = self.cache.ttl.as_secs(),
            capacity = self.cache.capacity.get(),
            retry_attempts = self.retry.max_attempts,
            retry_base_ms = self.retry.base_delay.as_millis() as u64,
            retry_max_ms = self.retry.max_delay.as_millis() as u64,
            "cache & retry"
        );
    }
}
