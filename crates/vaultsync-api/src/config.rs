use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use thiserror::Error;
use vaultsync_core::QuotaLimits;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub quota: QuotaLimits,
    pub default_device_name: String,
    pub transfer_url_ttl: Duration,
    pub rate_limit_window: Duration,
    pub sync_diff_rate_limit_per_window: u32,
    pub sync_commit_rate_limit_per_window: u32,
    pub r2: Option<R2RuntimeConfig>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct R2RuntimeConfig {
    pub account_id: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for R2RuntimeConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("R2RuntimeConfig")
            .field("account_id", &self.account_id)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = value_or_default(&lookup, "VAULTSYNC_BIND_ADDR", "127.0.0.1:8080");

        let max_file_size = parse_bounded::<u64>(
            &lookup,
            "VAULTSYNC_MAX_FILE_SIZE_BYTES",
            "104857600",
            1..=u64::MAX,
        )?;
        let storage_limit = parse_bounded::<u64>(
            &lookup,
            "VAULTSYNC_STORAGE_LIMIT_BYTES",
            "10737418240",
            1..=u64::MAX,
        )?;

        let default_device_name =
            value_or_default(&lookup, "VAULTSYNC_DEFAULT_DEVICE_NAME", "Unknown device");

        let transfer_ttl_secs =
            parse_bounded::<u64>(&lookup, "TRANSFER_URL_TTL_SECS", "600", 60..=3_600)?;
        let rate_limit_window_secs =
            parse_bounded::<u64>(&lookup, "RATE_LIMIT_WINDOW_SECS", "60", 10..=3_600)?;
        let sync_diff_rate_limit_per_window =
            parse_bounded::<u32>(&lookup, "SYNC_DIFF_RATE_LIMIT_PER_WINDOW", "60", 1..=1_000)?;
        let sync_commit_rate_limit_per_window =
            parse_bounded::<u32>(&lookup, "SYNC_COMMIT_RATE_LIMIT_PER_WINDOW", "60", 1..=1_000)?;

        let r2 = parse_r2_config(&lookup)?;

        Ok(Self {
            bind_addr,
            quota: QuotaLimits {
                max_file_size: Some(max_file_size),
                storage_limit: Some(storage_limit),
            },
            default_device_name,
            transfer_url_ttl: Duration::from_secs(transfer_ttl_secs),
            rate_limit_window: Duration::from_secs(rate_limit_window_secs),
            sync_diff_rate_limit_per_window,
            sync_commit_rate_limit_per_window,
            r2,
        })
    }
}

fn parse_bounded<T>(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: &str,
    range: std::ops::RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + fmt::Display,
{
    let bounds = format!("[{}, {}]", range.start(), range.end());
    let value = value_or_default(lookup, name, default)
        .parse::<T>()
        .map_err(|_| ConfigError::Invalid(format!("{name} must be an integer in {bounds}")))?;
    if !range.contains(&value) {
        return Err(ConfigError::Invalid(format!("{name} must be in {bounds}")));
    }
    Ok(value)
}

fn parse_r2_config(
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<Option<R2RuntimeConfig>, ConfigError> {
    let account_id = optional_trimmed(&lookup, "R2_ACCOUNT_ID");
    let bucket = optional_trimmed(&lookup, "R2_BUCKET");
    let access_key_id = optional_trimmed(&lookup, "R2_ACCESS_KEY_ID");
    let secret_access_key = optional_trimmed(&lookup, "R2_SECRET_ACCESS_KEY");

    let any_set = account_id.is_some()
        || bucket.is_some()
        || access_key_id.is_some()
        || secret_access_key.is_some();
    if !any_set {
        return Ok(None);
    }

    let account_id = account_id.ok_or(ConfigError::MissingVar("R2_ACCOUNT_ID"))?;
    let bucket = bucket.ok_or(ConfigError::MissingVar("R2_BUCKET"))?;
    let access_key_id = access_key_id.ok_or(ConfigError::MissingVar("R2_ACCESS_KEY_ID"))?;
    let secret_access_key =
        secret_access_key.ok_or(ConfigError::MissingVar("R2_SECRET_ACCESS_KEY"))?;

    Ok(Some(R2RuntimeConfig {
        account_id,
        bucket,
        access_key_id,
        secret_access_key,
    }))
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    vaultsync_core::util::normalize_text_option(lookup(name))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(map: &HashMap<&str, &str>) -> Result<AppConfig, ConfigError> {
        AppConfig::from_lookup(|key| map.get(key).map(|value| (*value).to_string()))
    }

    #[test]
    fn defaults_apply_without_env() {
        let config = config_from(&HashMap::new()).unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.default_device_name, "Unknown device");
        assert_eq!(config.quota.max_file_size, Some(104_857_600));
        assert_eq!(config.quota.storage_limit, Some(10_737_418_240));
        assert_eq!(config.transfer_url_ttl, Duration::from_secs(600));
        assert!(config.r2.is_none());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut map = HashMap::new();
        map.insert("TRANSFER_URL_TTL_SECS", "30");
        let err = config_from(&map).unwrap_err();
        assert!(err.to_string().contains("TRANSFER_URL_TTL_SECS"));

        let mut map = HashMap::new();
        map.insert("VAULTSYNC_STORAGE_LIMIT_BYTES", "lots");
        assert!(config_from(&map).is_err());
    }

    #[test]
    fn partial_r2_config_is_rejected() {
        let mut map = HashMap::new();
        map.insert("R2_ACCOUNT_ID", "acc");
        let err = config_from(&map).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("R2_BUCKET")));
    }

    #[test]
    fn config_redacts_sensitive_debug_fields() {
        let mut map = HashMap::new();
        map.insert("R2_ACCOUNT_ID", "acc");
        map.insert("R2_BUCKET", "bucket");
        map.insert("R2_ACCESS_KEY_ID", "access");
        map.insert("R2_SECRET_ACCESS_KEY", "sensitive-r2-secret");

        let config = config_from(&map).unwrap();

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("sensitive-r2-secret"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}
