//! Comparison, logical, array and embedded-document filters.
//!
//! Run: `cargo run --example filters`

mod common;

use anyhow::Result;
use bookshelf::{FindSpec, Genre, Sort, filter};

#[tokio::main]
async fn main() -> Result<()> {
    let (conn, store) = common::seeded_store().await?;
    let by_year = FindSpec::sorted(Sort::asc("publicationYear"));

    let queries = [
        ("published after 1950", filter::published_after(1950)),
        ("rating >= 4.5", filter::rating_at_least(4.5)),
        (
            "science or rating > 4.7",
            filter::any_of([filter::by_genre(Genre::Science), filter::rating_above(4.7)]),
        ),
        ("tagged classic + adventure", filter::tagged_all(&["classic", "adventure"])),
        ("published in London", filter::publisher_location("London")),
        ("no publisher location", filter::field_exists("publisher.location", false)),
        ("'the' in title", filter::title_matches("the", true)),
    ];

    for (label, f) in queries {
        let books = store.find(f, &by_year).await?;
        println!("{label}: {} books", books.len());
        for book in &books {
            println!("  {} {}", book.publication_year, book.title);
        }
    }

    conn.disconnect().await;
    Ok(())
}
