use clap::{Parser, ValueEnum};
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;

pub const LISTEN_ADDR_ENV: &str = "BOOKMARKER_LISTEN_ADDR";
pub const STORAGE_BACKEND_ENV: &str = "BOOKMARKER_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "BOOKMARKER_MYSQL_DSN";
pub const REDIS_URL_ENV: &str = "BOOKMARKER_REDIS_URL";
pub const FEED_BATCH_SIZE_ENV: &str = "BOOKMARKER_FEED_BATCH_SIZE";
pub const FEED_CAPACITY_ENV: &str = "BOOKMARKER_FEED_CAPACITY";
pub const FETCH_TIMEOUT_SECS_ENV: &str = "BOOKMARKER_FETCH_TIMEOUT_SECS";
pub const ENRICH_CONCURRENCY_ENV: &str = "BOOKMARKER_ENRICH_CONCURRENCY";
pub const LOG_FORMAT_ENV: &str = "BOOKMARKER_LOG_FORMAT";

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_FEED_BATCH_SIZE: usize = 25;
pub const DEFAULT_FEED_CAPACITY: usize = 1024;
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
    #[value(name = "redis")]
    Redis,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
            StorageBackendArg::Redis => write!(f, "redis"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "bookmarker-gateway")]
pub struct CLI {
    #[arg(long, env = LISTEN_ADDR_ENV, default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(long, env = REDIS_URL_ENV, required_if_eq("storage", "redis"))]
    pub redis_url: Option<String>,

    /// Maximum number of change events handled per batch.
    #[arg(long, env = FEED_BATCH_SIZE_ENV, default_value_t = DEFAULT_FEED_BATCH_SIZE)]
    pub feed_batch_size: usize,

    /// Number of change events buffered before writers wait.
    #[arg(long, env = FEED_CAPACITY_ENV, default_value_t = DEFAULT_FEED_CAPACITY)]
    pub feed_capacity: usize,

    #[arg(long, env = FETCH_TIMEOUT_SECS_ENV, default_value_t = DEFAULT_FETCH_TIMEOUT_SECS)]
    pub fetch_timeout_secs: u64,

    /// Cap on concurrent metadata fetches; unbounded if unset.
    #[arg(long, env = ENRICH_CONCURRENCY_ENV)]
    pub enrich_concurrency: Option<usize>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,
}
