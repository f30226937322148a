//! Default values used by `#[serde(default = "...")]` fields and by
//! [`crate::parser::generate_default_config`].

pub fn default_backup_directory() -> String {
    "./data/backup".to_string()
}

pub fn default_queue_capacity() -> usize {
    16_384
}

pub fn default_max_retries() -> u32 {
    5
}

pub fn default_retry_backoff_ms() -> u64 {
    50
}

pub fn default_channel_capacity() -> usize {
    4_096
}

pub fn default_log_format() -> String {
    "pretty".to_string()
}

pub fn default_log_level() -> String {
    "info".to_string()
}
