use clap::{Args, Parser, ValueHint};
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::PathBuf;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8000";
pub const DEFAULT_AGGREGATOR_URL: &str = "https://li.quest";
pub const DEFAULT_MODEL_API_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL_ID: &str = "gpt-4o-mini";
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost",
    "http://localhost:8501",
    "http://127.0.0.1:8501",
    "https://chaincompass-ai-theno1explorer.streamlit.app",
];

pub const DEFAULT_MAX_TOKENS: u32 = 256;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;
pub const DEFAULT_CACHE_CAPACITY: &str = "1000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15; // total, per upstream call
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_MAX_UPSTREAM_CONNECTIONS: &str = "100";
pub const DEFAULT_MAX_IDLE_CONNECTIONS: usize = 20;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 4000;
pub const DEFAULT_NARRATION_ATTEMPTS: u32 = 1;
pub const DEFAULT_MAX_CONCURRENT_NARRATIONS: &str = "16";

/// ChainCompass: cross-chain route quotes with a one-sentence summary.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to environment file (default: ./.env). Can also use APP_ENV_FILE.
    #[arg(
        long,
        value_hint = ValueHint::FilePath,
        default_value = ".env",
        env = "APP_ENV_FILE"
    )]
    pub env_file: PathBuf,

    #[command(flatten)]
    pub server: ServerArgs,

    #[command(flatten)]
    pub aggregator: AggregatorArgs,

    #[command(flatten)]
    pub narrator: NarratorArgs,

    #[command(flatten)]
    pub cache: CacheArgs,

    #[command(flatten)]
    pub retry: RetryArgs,

    /// Directory for a daily-rolling log file, in addition to stdout.
    #[arg(long, env = "CHAINCOMPASS_LOG_DIR", value_hint = ValueHint::DirPath)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ServerArgs {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "CHAINCOMPASS_LISTEN", default_value = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    /// Browser origins allowed by CORS, comma separated.
    #[arg(
        long,
        env = "CORS_ALLOWED_ORIGINS",
        value_delimiter = ',',
        value_parser = parse_origin,
        default_values = DEFAULT_ALLOWED_ORIGINS
    )]
    pub allowed_origins: Vec<String>,

    /// PEM certificate chain; serves HTTPS when set together with --tls-key.
    #[arg(
        long,
        env = "TLS_CERT_PATH",
        value_hint = ValueHint::FilePath,
        requires = "tls_key"
    )]
    pub tls_cert: Option<PathBuf>,

    /// PEM private key matching --tls-cert.
    #[arg(
        long,
        env = "TLS_KEY_PATH",
        value_hint = ValueHint::FilePath,
        requires = "tls_cert"
    )]
    pub tls_key: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct AggregatorArgs {
    /// Base URL of the LI.FI API.
    #[arg(
        long,
        env = "LIFI_BASE_URL",
        value_parser = parse_base_url,
        default_value = DEFAULT_AGGREGATOR_URL
    )]
    pub aggregator_url: String,

    /// Total timeout of one aggregator call, in seconds.
    #[arg(
        long,
        env = "LIFI_REQUEST_TIMEOUT_SECS",
        value_parser = clap::value_parser!(u64).range(1..),
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS
    )]
    pub request_timeout_secs: u64,

    /// Connect timeout of one aggregator call, in seconds.
    #[arg(
        long,
        env = "LIFI_CONNECT_TIMEOUT_SECS",
        value_parser = clap::value_parser!(u64).range(1..),
        default_value_t = DEFAULT_CONNECT_TIMEOUT_SECS
    )]
    pub connect_timeout_secs: u64,

    /// Maximum number of in-flight aggregator requests.
    #[arg(long, env = "LIFI_MAX_CONNECTIONS", default_value = DEFAULT_MAX_UPSTREAM_CONNECTIONS)]
    pub max_upstream_connections: NonZeroUsize,

    /// Maximum number of idle pooled connections kept per host.
    #[arg(long, env = "LIFI_MAX_IDLE_CONNECTIONS", default_value_t = DEFAULT_MAX_IDLE_CONNECTIONS)]
    pub max_idle_connections: usize,
}

#[derive(Args, Debug, Clone)]
pub struct NarratorArgs {
    /// Base URL of the chat-completion API (OpenAI or Anthropic).
    #[arg(
        long,
        env = "MODEL_API_URL",
        value_parser = parse_base_url,
        default_value = DEFAULT_MODEL_API_URL
    )]
    pub model_api_url: String,

    /// Model used to narrate routes.
    #[arg(long, env = "MODEL_ID", default_value = DEFAULT_MODEL_ID)]
    pub model: String,

    /// Upper bound on the tokens of one narration.
    #[arg(
        long,
        env = "MODEL_MAX_TOKENS",
        value_parser = clap::value_parser!(u32).range(1..),
        default_value_t = DEFAULT_MAX_TOKENS
    )]
    pub max_tokens: u32,

    /// Attempts per narration; 1 disables retrying.
    #[arg(
        long,
        env = "NARRATION_ATTEMPTS",
        value_parser = clap::value_parser!(u32).range(1..=5),
        default_value_t = DEFAULT_NARRATION_ATTEMPTS
    )]
    pub narration_attempts: u32,

    /// Maximum number of narrations running at once.
    #[arg(long, env = "MAX_CONCURRENT_NARRATIONS", default_value = DEFAULT_MAX_CONCURRENT_NARRATIONS)]
    pub max_concurrent_narrations: NonZeroUsize,
}

#[derive(Args, Debug, Clone)]
pub struct CacheArgs {
    /// Seconds a cached aggregator response stays valid.
    #[arg(
        long,
        env = "CACHE_TTL_SECS",
        value_parser = clap::value_parser!(u64).range(1..),
        default_value_t = DEFAULT_CACHE_TTL_SECS
    )]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached aggregator responses.
    #[arg(long, env = "CACHE_CAPACITY", default_value = DEFAULT_CACHE_CAPACITY)]
    pub cache_capacity: NonZeroUsize,
}

#[derive(Args, Debug, Clone)]
pub struct RetryArgs {
    /// Attempts per aggregator call, the first one included.
    #[arg(
        long,
        env = "RETRY_ATTEMPTS",
        value_parser = clap::value_parser!(u32).range(1..=10),
        default_value_t = DEFAULT_RETRY_ATTEMPTS
    )]
    pub retry_attempts: u32,

    /// Backoff before the first retry, in milliseconds. Doubles per retry.
    #[arg(long, env = "RETRY_BASE_DELAY_MS", default_value_t = DEFAULT_RETRY_BASE_DELAY_MS)]
    pub retry_base_delay_ms: u64,

    /// Upper bound on a single backoff, in milliseconds.
    #[arg(long, env = "RETRY_MAX_DELAY_MS", default_value_t = DEFAULT_RETRY_MAX_DELAY_MS)]
    pub retry_max_delay_ms: u64,
}

/// Accept `http(s)://host[:port][/path]`, strip the trailing slash.
pub fn parse_base_url(s: &str) -> Result<String, String> {
    let trimmed = s.trim().trim_end_matches('/');
    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| format!("invalid URL '{s}'; expected an http:// or https:// base URL"))?;

    if rest.is_empty() || rest.starts_with('/') {
        return Err(format!("invalid URL '{s}'; missing host"));
    }
    if rest.contains(['?', '#']) || rest.chars().any(char::is_whitespace) {
        return Err(format!(
            "invalid URL '{s}'; a base URL must not carry a query, fragment or whitespace"
        ));
    }
    Ok(trimmed.to_string())
}

/// CORS origins are compared byte for byte, so they are normalised the same way.
pub fn parse_origin(s: &str) -> Result<String, String> {
    let origin = parse_base_url(s)?;
    let host = origin.split_once("://").map_or("", |(_, host)| host);
    if host.contains('/') {
        return Err(format!("invalid origin '{s}'; an origin has no path"));
    }
    Ok(origin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("chaincompass").chain(args.iter().copied()))
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.server.listen, DEFAULT_LISTEN.parse::<SocketAddr>().unwrap());
        assert_eq!(cli.server.allowed_origins.len(), 4);
        assert_eq!(cli.aggregator.aggregator_url, DEFAULT_AGGREGATOR_URL);
        assert_eq!(cli.cache.cache_capacity.get(), 1000);
        assert_eq!(cli.retry.retry_attempts, 3);
        assert_eq!(cli.narrator.narration_attempts, 1);
        assert!(cli.server.tls_cert.is_none());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(parse(&["--cache-capacity", "0"]).is_err());
        assert!(parse(&["--cache-ttl-secs", "0"]).is_err());
    }

    #[test]
    fn test_tls_cert_requires_key() {
        assert!(parse(&["--tls-cert", "cert.pem"]).is_err());
        let cli = parse(&["--tls-cert", "cert.pem", "--tls-key", "key.pem"]).unwrap();
        assert_eq!(cli.server.tls_key, Some(PathBuf::from("key.pem")));
    }

    #[test]
    fn test_origins_split_on_comma() {
        let cli = parse(&["--allowed-origins", "https://a.example,http://b.example:3000/"]).unwrap();
        assert_eq!(
            cli.server.allowed_origins,
            vec!["https://a.example", "http://b.example:3000"]
        );
    }

    #[test]
    fn test_base_url_normalisation() {
        assert_eq!(parse_base_url("https://li.quest/").unwrap(), "https://li.quest");
        assert_eq!(
            parse_base_url("http://localhost:9000/proxy").unwrap(),
            "http://localhost:9000/proxy"
        );
        assert!(parse_base_url("li.quest").is_err());
        assert!(parse_base_url("ftp://li.quest").is_err());
        assert!(parse_base_url("https://").is_err());
        assert!(parse_base_url("https://li.quest?x=1").is_err());
        assert!(parse_origin("https://app.example/path").is_err());
    }
}
