use core::{num::NonZeroUsize, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// Name of the environment variable overriding the default page size
pub const PAGE_SIZE_ENV_VAR: &str = "API_RESULT_PAGE_SIZE";

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const DEFAULT_SORT_KEY: &str = "name";

/// Defaults used by the [Paginator](crate::paginate::Paginator) when a request omits them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingSettings {
    /// Number of items per page
    pub page_size: NonZeroUsize,
    /// Secondary key used to get a stable ordering
    pub sort_key: String,
}

impl Default for PagingSettings {
    fn default() -> Self {
        Self {
            page_size: NonZeroUsize::new(DEFAULT_PAGE_SIZE).expect("20 is not zero"),
            sort_key: DEFAULT_SORT_KEY.to_owned(),
        }
    }
}

impl PagingSettings {
    /// Parse settings from a JSON document, missing fields take their default value
    ///
    /// # Errors
    ///
    /// Returns [Error::MalformedSettings] if the document cannot be parsed,
    /// including when `page_size` is zero.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_page_size(mut self, page_size: NonZeroUsize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_sort_key(mut self, sort_key: &str) -> Self {
        self.sort_key = sort_key.to_owned();
        self
    }

    /// Apply the overrides found in the environment
    ///
    /// An invalid value is ignored with a warning.
    pub fn with_env_overrides(self) -> Self {
        match std::env::var(PAGE_SIZE_ENV_VAR) {
            Ok(value) => self.with_page_size_override(&value),
            Err(_) => self,
        }
    }

    fn with_page_size_override(self, value: &str) -> Self {
        match parse_page_size(value) {
            Ok(page_size) => {
                log::info!("{PAGE_SIZE_ENV_VAR}={page_size}");
                self.with_page_size(page_size)
            }
            Err(e) => {
                log::warn!("{e}. Keeping page_size={}.", self.page_size);
                self
            }
        }
    }
}

/// Parse a strictly positive page size
///
/// # Errors
///
/// Returns [Error::InvalidPageSize] for anything else than a strictly positive integer.
pub fn parse_page_size(value: &str) -> Result<NonZeroUsize> {
    NonZeroUsize::from_str(value.trim()).map_err(|_| Error::InvalidPageSize(value.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = PagingSettings::default();
        assert_eq!(settings.page_size.get(), 20);
        assert_eq!(settings.sort_key, "name");
    }

    #[test]
    fn from_json() {
        let settings = PagingSettings::from_json(r#"{"page_size": 5}"#).unwrap();
        assert_eq!(settings.page_size.get(), 5);
        assert_eq!(settings.sort_key, "name");

        let settings = PagingSettings::from_json(r#"{"sort_key": "id"}"#).unwrap();
        assert_eq!(settings.page_size.get(), 20);
        assert_eq!(settings.sort_key, "id");

        assert!(matches!(
            PagingSettings::from_json(r#"{"page_size": 0}"#),
            Err(Error::MalformedSettings(_))
        ));
        assert!(matches!(
            PagingSettings::from_json(r#"{"page_size": -3}"#),
            Err(Error::MalformedSettings(_))
        ));
    }

    #[test]
    fn page_size_parsing() {
        assert_eq!(parse_page_size("1").unwrap().get(), 1);
        assert_eq!(parse_page_size(" 42 ").unwrap().get(), 42);
        assert!(matches!(parse_page_size("0"), Err(Error::InvalidPageSize(_))));
        assert!(matches!(parse_page_size("-1"), Err(Error::InvalidPageSize(_))));
        assert!(matches!(parse_page_size("ten"), Err(Error::InvalidPageSize(_))));
    }

    #[test]
    fn page_size_override() {
        let settings = PagingSettings::default().with_page_size_override("7");
        assert_eq!(settings.page_size.get(), 7);
        let settings = settings.with_page_size_override("0");
        assert_eq!(settings.page_size.get(), 7);
    }
}
