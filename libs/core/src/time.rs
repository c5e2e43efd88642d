use chrono::Local;

/// `yyyy-MM-dd HH:mm:ss.SSS`, local time
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Timestamp attached to outgoing messages, taken at call time
pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}
