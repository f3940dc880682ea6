//! Aggregation pipelines and text search.
//!
//! Run: `cargo run --example aggregation`

mod common;

use anyhow::Result;
use bookshelf::query::{average_rating_after, count_per_genre};
use bookshelf::{GenreCount, RatingSummary};

#[tokio::main]
async fn main() -> Result<()> {
    let (conn, store) = common::seeded_store().await?;

    let per_genre: Vec<GenreCount> = store.aggregate_as(count_per_genre(false)).await?;
    println!("Books per genre:");
    for row in &per_genre {
        println!("  {:<12} {}", row.genre, row.count);
    }

    let summary: Vec<RatingSummary> = store.aggregate_as(average_rating_after(2000)).await?;
    if let Some(row) = summary.first() {
        println!(
            "\n{}: {:.2} over {} books",
            row.description,
            row.avg_rating.unwrap_or_default(),
            row.number_of_books
        );
    }

    println!("\nText search 'history universe':");
    for hit in store.text_search("history universe").await? {
        println!("  [{:.2}] {}", hit.score, hit.book.title);
    }

    conn.disconnect().await;
    Ok(())
}
