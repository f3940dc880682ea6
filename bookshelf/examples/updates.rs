//! Set, increment and add-to-set updates, and find-one-and-update.
//!
//! Run: `cargo run --example updates`

mod common;

use anyhow::Result;
use bookshelf::{FindAndModify, Genre, Sort, Update, filter};

#[tokio::main]
async fn main() -> Result<()> {
    let (conn, store) = common::seeded_store().await?;

    let outcome = store
        .update_one(
            filter::by_title("1984"),
            Update::new().set("isAvailable", true),
        )
        .await?;
    println!("1984: matched {}, modified {}", outcome.matched, outcome.modified);

    let outcome = store
        .update_many(
            filter::rating_at_least(4.7),
            Update::new().add_to_set("tags", "bestseller"),
        )
        .await?;
    println!("bestseller tag added to {} books", outcome.modified);

    let oldest = store
        .find_one_and_update(
            filter::by_genre(Genre::Science),
            Update::new().inc("rating", -0.1),
            &FindAndModify::returning_new().sorted(Sort::asc("publicationYear")),
        )
        .await?;
    if let Some(book) = oldest {
        println!(
            "{} rating is now {:.1}",
            book.title,
            book.rating.unwrap_or_default()
        );
    }

    let removed = store.delete_many(filter::tagged("cult classic")).await?;
    println!("removed {removed} cult classics");

    conn.disconnect().await;
    Ok(())
}
