use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::CompareError;
use crate::model::{DiffOptions, Locale};

/// Author recorded on revisions when none is configured.
pub const DEFAULT_AUTHOR: &str = "redline";

/// Settings for one comparison run, passed explicitly into [`crate::compare`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareSettings {
    pub author: String,
    pub detail_threshold: usize,
    pub locale: Locale,
    pub parallel: bool,
    /// Timestamp for revision markers; the current time when unset.
    pub date: Option<DateTime<Utc>>,
}

impl Default for CompareSettings {
    fn default() -> Self {
        Self {
            author: DEFAULT_AUTHOR.to_string(),
            detail_threshold: 0,
            locale: Locale::Default,
            parallel: false,
            date: None,
        }
    }
}

impl CompareSettings {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
            ..Self::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_detail_threshold(mut self, detail_threshold: usize) -> Self {
        self.detail_threshold = detail_threshold;
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_date(mut self, date: DateTime<Utc>) -> Self {
        self.date = Some(date);
        self
    }

    /// Reject settings that cannot produce attributable revisions.
    pub fn validate(&self) -> Result<(), CompareError> {
        if self.author.trim().is_empty() {
            return Err(CompareError::InvalidConfiguration(
                "author for revisions must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            detail_threshold: self.detail_threshold,
            parallel: self.parallel,
        }
    }
}

/// On-disk settings (TOML). Every field is optional; unset fields keep the
/// value of the settings they are applied to.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsFile {
    pub author: Option<String>,
    /// Signed so that a negative value is reported instead of failing to decode.
    pub detail_threshold: Option<i64>,
    pub locale: Option<Locale>,
    pub parallel: Option<bool>,
}

impl SettingsFile {
    pub fn from_toml_str(input: &str) -> Result<Self, CompareError> {
        toml::from_str(input).map_err(|err| {
            CompareError::InvalidConfiguration(format!("settings file: {}", err.message()))
        })
    }

    /// Overlay the file's values onto `base`.
    pub fn apply(&self, base: CompareSettings) -> Result<CompareSettings, CompareError> {
        let mut settings = base;
        if let Some(author) = &self.author {
            settings.author = author.clone();
        }
        if let Some(threshold) = self.detail_threshold {
            settings.detail_threshold = usize::try_from(threshold).map_err(|_| {
                CompareError::InvalidConfiguration(format!(
                    "detail_threshold must be zero or greater, got {threshold}"
                ))
            })?;
        }
        if let Some(locale) = self.locale {
            settings.locale = locale;
        }
        if let Some(parallel) = self.parallel {
            settings.parallel = parallel;
        }
        settings.validate()?;
        Ok(settings)
    }
}
