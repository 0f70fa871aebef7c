use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and provisioning knobs for a [`Cursor`](crate::Cursor).
///
/// Deserializes from a TOML table; every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CursorOptions {
    /// Sleep after a fetch that returned nothing.
    pub no_data_sleep_ms: u64,
    /// Sleep after a failure before fetching again; 0 retries immediately.
    pub error_sleep_ms: u64,
    /// Fail construction when the source does not exist instead of
    /// provisioning it.
    pub assert_if_missing: bool,
    /// Sizing hint passed to the source when provisioning it.
    pub default_capacity: u64,
    pub reader_thread_name: String,
}

impl Default for CursorOptions {
    fn default() -> Self {
        CursorOptions {
            no_data_sleep_ms: 100,
            error_sleep_ms: 1000,
            assert_if_missing: false,
            default_capacity: 200 << 20,
            reader_thread_name: "tail-reader".to_string(),
        }
    }
}

impl CursorOptions {
    pub fn no_data_sleep(&self) -> Duration {
        Duration::from_millis(self.no_data_sleep_ms)
    }

    pub fn error_sleep(&self) -> Duration {
        Duration::from_millis(self.error_sleep_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_defaults() {
        let options = CursorOptions::default();
        assert_eq!(options.no_data_sleep(), Duration::from_millis(100));
        assert_eq!(options.error_sleep(), Duration::from_secs(1));
        assert!(!options.assert_if_missing);
        assert_eq!(options.default_capacity, 209_715_200);
        assert_eq!(options.reader_thread_name, "tail-reader");
    }

    #[rstest]
    #[case::empty("", CursorOptions::default())]
    #[case::partial(
        "error_sleep_ms = 0\nassert_if_missing = true",
        CursorOptions { error_sleep_ms: 0, assert_if_missing: true, ..CursorOptions::default() }
    )]
    #[case::timing(
        "no_data_sleep_ms = 5\nerror_sleep_ms = 50",
        CursorOptions { no_data_sleep_ms: 5, error_sleep_ms: 50, ..CursorOptions::default() }
    )]
    fn test_from_toml(#[case] text: &str, #[case] expected: CursorOptions) {
        let options: CursorOptions = toml::from_str(text).unwrap();
        assert_eq!(options, expected);
    }

    #[rstest]
    fn test_rejects_wrong_type() {
        assert!(toml::from_str::<CursorOptions>("no_data_sleep_ms = \"soon\"").is_err());
    }
}
