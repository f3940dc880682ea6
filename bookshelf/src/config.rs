//! Configuration read from the process environment.
//!
//! A `.env` file in the working directory is loaded first; variables
//! already present in the environment win over it.

use tracing::warn;

use crate::error::{BookshelfError, Result};

/// Environment variable holding the connection string.
pub const URI_VAR: &str = "MONGODB_URI";

/// Environment variable naming the database to use.
pub const DATABASE_VAR: &str = "MONGODB_DATABASE";

/// Database used when neither the environment nor the URI names one.
pub const FALLBACK_DATABASE: &str = "test";

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// MongoDB connection string.
    pub uri: String,
    /// Explicit database name, overriding the one in the URI.
    pub database: Option<String>,
}

impl Config {
    /// Create a config for a connection string.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: None,
        }
    }

    /// Use a specific database instead of the URI default.
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Load `.env`, then read [`URI_VAR`] and [`DATABASE_VAR`].
    ///
    /// A missing `.env` is fine; an unreadable or malformed one is logged
    /// and otherwise ignored.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                warn!(error = %e, "Ignoring unusable .env file");
            }
        }
        Self::from_vars(
            std::env::var(URI_VAR).ok(),
            std::env::var(DATABASE_VAR).ok(),
        )
    }

    /// Build a config from raw variable values. Empty values count as unset.
    pub fn from_vars(uri: Option<String>, database: Option<String>) -> Result<Self> {
        let uri = uri
            .filter(|s| !s.trim().is_empty())
            .ok_or(BookshelfError::MissingConnectionString)?;
        let database = database.filter(|s| !s.trim().is_empty());
        Ok(Self { uri, database })
    }

    /// Pick the database name: explicit setting, then the URI default, then
    /// [`FALLBACK_DATABASE`].
    pub fn resolve_database<'a>(&'a self, uri_default: Option<&'a str>) -> &'a str {
        self.database
            .as_deref()
            .or(uri_default)
            .unwrap_or(FALLBACK_DATABASE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_uri_is_an_error() {
        let err = Config::from_vars(None, None).unwrap_err();
        assert!(matches!(err, BookshelfError::MissingConnectionString));
    }

    #[test]
    fn blank_uri_counts_as_missing() {
        let err = Config::from_vars(Some("  ".into()), None).unwrap_err();
        assert!(matches!(err, BookshelfError::MissingConnectionString));
    }

    #[test]
    fn blank_database_is_ignored() {
        let cfg = Config::from_vars(Some("mongodb://localhost".into()), Some(String::new()))
            .unwrap();
        assert_eq!(cfg.database, None);
    }

    #[test]
    fn database_resolution_order() {
        let cfg = Config::new("mongodb://localhost/shop");
        assert_eq!(cfg.resolve_database(Some("shop")), "shop");
        assert_eq!(cfg.resolve_database(None), FALLBACK_DATABASE);

        let cfg = cfg.with_database("library");
        assert_eq!(cfg.resolve_database(Some("shop")), "library");
    }
}
