use std::time::Duration;

// ── Paths ──────────────────────────────────────────────────────────

pub const DEFAULT_CONFIG_PATH: &str = "/etc/deepinspect/config.yaml";
pub const DEFAULT_STORAGE_PATH: &str = "/var/lib/deepinspect/records.redb";

// ── Record lifetime ────────────────────────────────────────────────

/// One day: long enough to absorb redeliveries of the same alert.
pub const DEFAULT_RECORD_TTL_SECS: u64 = 86_400;

/// Ten years. Longer lifetimes are rejected at config validation.
pub const MAX_RECORD_TTL_SECS: u64 = 10 * 365 * 86_400;

// ── Queue ──────────────────────────────────────────────────────────

pub const DEFAULT_QUEUE_TIMEOUT_MS: u64 = 5_000;

// ── Metrics ────────────────────────────────────────────────────────

pub const METRICS_PREFIX: &str = "deepinspect";

// ── Timeouts ───────────────────────────────────────────────────────

/// Upper bound on one `inspect` batch run from the CLI.
pub const INSPECT_TIMEOUT: Duration = Duration::from_secs(30);
