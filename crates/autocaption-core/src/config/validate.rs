//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

/// Longest accepted gap between upload and post: one week.
pub const MAX_DELAY_SECS: u64 = 7 * 24 * 60 * 60;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    ///
    /// Loading runs this automatically; call it again after changing values
    /// in code, e.g. applying command-line overrides.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.upload_dir.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "server.upload_dir must not be empty".into(),
            ));
        }
        if self.limits.max_upload_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_upload_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "limits.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.limits.supported_formats.is_empty() {
            return Err(ConfigError::ValidationError(
                "limits.supported_formats must list at least one format".into(),
            ));
        }
        if self.caption.min_length == 0 || self.caption.min_length > self.caption.max_length {
            return Err(ConfigError::ValidationError(
                "caption.min_length must be > 0 and <= caption.max_length".into(),
            ));
        }
        if !(self.caption.min_length..=self.caption.max_length)
            .contains(&self.caption.default_length)
        {
            return Err(ConfigError::ValidationError(
                "caption.default_length must be between caption.min_length and caption.max_length"
                    .into(),
            ));
        }
        if self.caption.workers == 0 {
            return Err(ConfigError::ValidationError(
                "caption.workers must be > 0".into(),
            ));
        }
        if self.caption.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "caption.timeout_ms must be > 0".into(),
            ));
        }
        if self.hashtags.max_tags == 0 {
            return Err(ConfigError::ValidationError(
                "hashtags.max_tags must be > 0".into(),
            ));
        }
        if self.notifier.queue_capacity == 0 || self.notifier.max_pending == 0 {
            return Err(ConfigError::ValidationError(
                "notifier.queue_capacity and notifier.max_pending must be > 0".into(),
            ));
        }
        if self.notifier.delay_secs > MAX_DELAY_SECS {
            return Err(ConfigError::ValidationError(format!(
                "notifier.delay_secs must be <= {MAX_DELAY_SECS}"
            )));
        }
        if self.jobs.max_records == 0 {
            return Err(ConfigError::ValidationError(
                "jobs.max_records must be > 0".into(),
            ));
        }
        Ok(())
    }
}
