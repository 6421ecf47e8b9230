//! Helper utilities for timestamps.

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Helper function to get current timestamp, returns 0 if system time is before UNIX epoch.
pub fn current_timestamp() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_secs())
		.unwrap_or(0)
}

/// Converts a whole number of days to seconds.
pub fn days_to_seconds(days: u32) -> u64 {
	u64::from(days) * SECONDS_PER_DAY
}
