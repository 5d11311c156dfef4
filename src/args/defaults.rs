use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = concat!("loadrunner/", env!("CARGO_PKG_VERSION"));

/// Console prompt defaults.
pub const DEFAULT_CONCURRENCY: usize = 1;
pub const DEFAULT_REQUESTS_PER_WORKER: u64 = 1;
pub const DEFAULT_DELAY_SECS: u64 = 30;

pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 1024;
pub const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(600);
