//! Bookshelf - a book catalogue on MongoDB
//!
//! A typed `Book` model with schema and index declarations, a seed routine,
//! and a library of named query shapes over the `books` collection.
//!
//! ## Features
//!
//! - Owned connection context with explicit connect/disconnect
//! - Filters, sorting, projection and pagination built as plain BSON
//! - Set / increment / add-to-set updates with automatic `updatedAt`
//! - Find-one-and-update returning the pre- or post-update document
//! - Aggregation pipelines decoded into typed rows
//! - Full-text search over title and description

pub mod book;
pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod formatter;
pub mod query;
pub mod seed;
pub mod store;
pub mod tour;

pub use book::{Book, Genre, Publisher};
pub use cli::{Cli, Commands};
pub use config::Config;
pub use connection::Connection;
pub use error::{BookshelfError, Result};
pub use formatter::{format_results, format_value, print_results, print_value};
pub use query::{
    AuthorTally, FindAndModify, FindSpec, GenreCount, Pipeline, RatingSummary, Sort, Update,
    filter, projection,
};
pub use seed::{DEFAULT_GENRE, SeedReport, normalize, run_seed, sample_books, seed};
pub use store::{BookStore, ScoredBook, UpdateOutcome};
pub use tour::{run_queries, run_tour};
