//! Common setup for examples.
//!
//! Examples need `MONGODB_URI` (environment or `.env`). They work in their
//! own database so the main catalogue is left alone.

use anyhow::Result;
use bookshelf::{BookStore, Config, Connection, sample_books, seed};

/// Database the examples seed and query.
pub const EXAMPLE_DATABASE: &str = "bookshelf_examples";

/// Connect to the example database and reseed it with the sample books.
pub async fn seeded_store() -> Result<(Connection, BookStore)> {
    let config = Config::from_env()?.with_database(EXAMPLE_DATABASE);
    let conn = Connection::connect(&config).await?;
    let store = conn.books();
    seed(&store, sample_books()).await?;
    Ok((conn, store))
}
