//! Error types for bookshelf.

use thiserror::Error;

/// Errors returned by the bookshelf library.
#[derive(Debug, Error)]
pub enum BookshelfError {
    /// `MONGODB_URI` is not set (or empty).
    #[error("Please define the MongoDB URL (MONGODB_URI) in the environment or a .env file")]
    MissingConnectionString,

    /// The initial connection could not be established.
    #[error("failed to connect to the database")]
    Connect {
        /// Underlying driver error.
        #[source]
        source: mongodb::error::Error,
    },

    /// Any error reported by the driver or the server.
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),

    /// A BSON document could not be decoded into a typed row.
    #[error("decode error: {0}")]
    Decode(#[from] mongodb::bson::de::Error),

    /// Genre is not one of the five allowed values.
    #[error("invalid genre: {0}")]
    InvalidGenre(String),

    /// A record failed local validation before being written.
    #[error("validation failed for `{field}`: {reason}")]
    Validation {
        /// Offending field, by its stored name.
        field: &'static str,
        /// Human-readable reason.
        reason: &'static str,
    },

    /// An update carried no modifiers.
    #[error("update has no modifiers")]
    EmptyUpdate,

    /// The query tour aborted.
    #[error("query tour failed")]
    Tour {
        /// The error that stopped the tour.
        #[source]
        source: Box<BookshelfError>,
    },
}

/// Result type alias for bookshelf operations.
pub type Result<T> = std::result::Result<T, BookshelfError>;
