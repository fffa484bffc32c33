// Service defaults
pub const DEFAULT_BASE_URL: &str = "https://api.convertorio.com";
pub const USER_AGENT: &str = concat!("convertorio-rust/", env!("CARGO_PKG_VERSION"));

// Polling
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 60; // ~2 minutes at the default interval

// Job listing
pub const DEFAULT_LIST_LIMIT: u32 = 50;

// API routes, relative to the base URL
pub const UPLOAD_URL_PATH: &str = "/v1/convert/upload-url";
pub const CONFIRM_PATH: &str = "/v1/convert/confirm";
pub const JOBS_PATH: &str = "/v1/jobs";
pub const ACCOUNT_PATH: &str = "/v1/account";

// Configuration
pub const CONFIG_DIR_NAME: &str = "convertorio";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const API_KEY_ENV: &str = "CONVERTORIO_API_KEY";
pub const BASE_URL_ENV: &str = "CONVERTORIO_BASE_URL";

// Bytes inspected when sniffing a file without an extension
pub const SNIFF_BYTES: usize = 8192;

pub const MISSING_API_KEY_MESSAGE: &str =
    "API key is required. Get yours at https://convertorio.com/account";
