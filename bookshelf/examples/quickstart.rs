//! Minimal quickstart - seed the sample books and look a few up.
//!
//! Run: `cargo run --example quickstart`

mod common;

use anyhow::Result;
use bookshelf::{FindSpec, Genre, filter};

#[tokio::main]
async fn main() -> Result<()> {
    let (conn, store) = common::seeded_store().await?;

    println!("Books: {}", store.count(filter::all()).await?);

    let science = store
        .find(filter::by_genre(Genre::Science), &FindSpec::new())
        .await?;
    println!("\nScience:");
    for book in &science {
        println!("  {} ({}) - {}", book.title, book.publication_year, book.author);
    }

    if let Some(book) = store.find_one(filter::by_author("Jane Austen")).await? {
        println!("\nBy Jane Austen: {}", book.title);
    }

    conn.disconnect().await;
    Ok(())
}
