//! The query tour: one pass over every query family, printing each result.
//!
//! Steps run strictly one after another. The text search step is the only
//! one allowed to fail without stopping the tour.

use std::num::NonZeroU32;

use serde_json::json;
use tracing::{info, warn};

use crate::book::Genre;
use crate::config::Config;
use crate::connection::Connection;
use crate::error::{BookshelfError, Result};
use crate::formatter::{print_results, print_value};
use crate::query::{
    AuthorTally, FindAndModify, FindSpec, GenreCount, RatingSummary, Sort, Update,
    average_rating_after, count_per_genre, filter, projection, prolific_authors,
};
use crate::store::BookStore;

/// Books per page in the pagination step.
const PAGE_SIZE: NonZeroU32 = NonZeroU32::MIN.saturating_add(1);

/// Terms used for the text search step.
pub const TEXT_SEARCH_TERMS: &str = "history universe exploration";

/// Connect, run the tour, and disconnect whether or not the tour succeeded.
///
/// Failures are wrapped in [`BookshelfError::Tour`] with the original error
/// kept as the source.
pub async fn run_queries(config: &Config) -> Result<()> {
    let conn = Connection::connect(config).await?;
    let result = run_tour(&conn.books()).await;
    conn.disconnect().await;
    result.map_err(|e| BookshelfError::Tour {
        source: Box::new(e),
    })
}

/// Run every query family against `store`.
pub async fn run_tour(store: &BookStore) -> Result<()> {
    info!("Starting query tour");
    basic_finds(store).await?;
    comparisons(store).await?;
    logical(store).await?;
    element(store).await?;
    evaluation(store).await?;
    arrays_and_embedded(store).await?;
    projection_sort_page(store).await?;
    counts(store).await?;
    updates(store).await?;
    deletes(store).await?;
    aggregations(store).await?;
    info!("Query tour completed");
    Ok(())
}

async fn basic_finds(store: &BookStore) -> Result<()> {
    let all = store.find(filter::all(), &FindSpec::new()).await?;
    print_results("Find All Books", &all);

    let austen = store.find_one(filter::by_author("Jane Austen")).await?;
    print_value("Find One Book by Author 'Jane Austen'", &austen);

    let hobbit = store.find_one(filter::by_title("The Hobbit")).await?;
    match hobbit.and_then(|b| b.id) {
        Some(id) => {
            let by_id = store.find_by_id(id).await?;
            print_value(&format!("Find Book by ID ({id})"), &by_id);
        }
        None => warn!("Could not find 'The Hobbit' to look up by id"),
    }
    Ok(())
}

async fn comparisons(store: &BookStore) -> Result<()> {
    let all = FindSpec::new();
    let steps = [
        ("Books Published After 1950 ($gt)", filter::published_after(1950)),
        ("Books with Rating >= 4.5 ($gte)", filter::rating_at_least(4.5)),
        ("Books with <= 300 Pages ($lte)", filter::pages_at_most(300)),
        ("Books Not by Jane Austen ($ne)", filter::not_by_author("Jane Austen")),
        (
            "Books in 'Science' or 'Fantasy' Genre ($in)",
            filter::genre_in(&[Genre::Science, Genre::Fantasy]),
        ),
        (
            "Books Not in 'Fiction' or 'Mystery' ($nin)",
            filter::genre_not_in(&[Genre::Fiction, Genre::Mystery]),
        ),
    ];
    for (label, f) in steps {
        print_results(label, &store.find(f, &all).await?);
    }
    Ok(())
}

async fn logical(store: &BookStore) -> Result<()> {
    let all = FindSpec::new();
    let steps = [
        (
            "Fiction Books Published After 1900 (Implicit $and)",
            filter::genre_published_after(Genre::Fiction, 1900),
        ),
        (
            "Fiction Books Published After 1900 (Explicit $and)",
            filter::all_of([
                filter::by_genre(Genre::Fiction),
                filter::published_after(1900),
            ]),
        ),
        (
            "Books: Genre 'Science' OR Rating > 4.7 ($or)",
            filter::any_of([filter::by_genre(Genre::Science), filter::rating_above(4.7)]),
        ),
        ("Books NOT 'Fantasy' Genre ($not)", filter::genre_not(Genre::Fantasy)),
        (
            "Books: Neither 'Fiction' NOR 'Mystery' ($nor)",
            filter::none_of([
                filter::by_genre(Genre::Fiction),
                filter::by_genre(Genre::Mystery),
            ]),
        ),
    ];
    for (label, f) in steps {
        print_results(label, &store.find(f, &all).await?);
    }
    Ok(())
}

async fn element(store: &BookStore) -> Result<()> {
    let all = FindSpec::new();
    let steps = [
        (
            "Books Where Publisher Field Exists ($exists: true)",
            filter::field_exists("publisher", true),
        ),
        (
            "Books Where publisher.location Field Does Not Exist ($exists: false)",
            filter::field_exists("publisher.location", false),
        ),
        ("Books Where 'tags' Field is an Array ($type)", filter::tags_are_array()),
    ];
    for (label, f) in steps {
        print_results(label, &store.find(f, &all).await?);
    }
    Ok(())
}

async fn evaluation(store: &BookStore) -> Result<()> {
    let classic = store
        .find(filter::title_matches("classic", true), &FindSpec::new())
        .await?;
    print_results("Books with 'classic' in Title ($regex, case-insensitive)", &classic);

    match store.text_search(TEXT_SEARCH_TERMS).await {
        Ok(hits) => print_results(
            &format!("Text Search for '{TEXT_SEARCH_TERMS}' ($text)"),
            &hits,
        ),
        Err(e) => warn!(
            error = %e,
            "Text search failed; run the seed first so the text index on title and description exists"
        ),
    }
    Ok(())
}

async fn arrays_and_embedded(store: &BookStore) -> Result<()> {
    let all = FindSpec::new();
    let steps = [
        ("Books Tagged 'sci-fi'", filter::tagged("sci-fi")),
        (
            "Books Tagged 'classic' AND 'adventure' ($all)",
            filter::tagged_all(&["classic", "adventure"]),
        ),
        (
            "Books Tagged 'history' OR 'comedy' ($in)",
            filter::tagged_any(&["history", "comedy"]),
        ),
        ("Books with Exactly 3 Tags ($size)", filter::tag_count(3)),
        (
            "Books Published by 'Pan Books' (Dot Notation)",
            filter::publisher_name("Pan Books"),
        ),
        ("Books Published in 'London'", filter::publisher_location("London")),
    ];
    for (label, f) in steps {
        print_results(label, &store.find(f, &all).await?);
    }
    Ok(())
}

async fn projection_sort_page(store: &BookStore) -> Result<()> {
    let titles = store
        .find_projected(
            filter::all(),
            projection(&["title", "author"]),
            &FindSpec::new(),
        )
        .await?;
    print_results("Get Only Title and Author (Projection)", &titles);

    let by_year = store
        .find(
            filter::all(),
            &FindSpec::sorted(Sort::asc("publicationYear")),
        )
        .await?;
    print_results("Books Sorted by Publication Year Ascending", &by_year);

    let by_rating = store
        .find(
            filter::all(),
            &FindSpec::sorted(Sort::desc("rating").then_asc("title")),
        )
        .await?;
    print_results("Books Sorted by Rating Desc, Title Asc", &by_rating);

    let page = store
        .find(filter::all(), &FindSpec::sorted(Sort::asc("title")).page(2, PAGE_SIZE))
        .await?;
    print_results("Pagination: Get 3rd and 4th Books (Sorted by Title)", &page);
    Ok(())
}

async fn counts(store: &BookStore) -> Result<()> {
    let total = store.count(filter::all()).await?;
    print_value("Total Number of Books (countDocuments)", &json!({ "count": total }));

    let fiction = store.count(filter::by_genre(Genre::Fiction)).await?;
    print_value("Number of Fiction Books", &json!({ "count": fiction }));

    let estimated = store.estimated_count().await?;
    print_value(
        "Estimated Total Books (estimatedDocumentCount)",
        &json!({ "estimatedCount": estimated }),
    );
    Ok(())
}

async fn updates(store: &BookStore) -> Result<()> {
    let outcome = store
        .update_one(
            filter::by_title("1984"),
            Update::new().set("isAvailable", true).set("rating", 4.4),
        )
        .await?;
    print_value("Update '1984' to isAvailable: true (updateOne)", &outcome);
    let updated = store
        .find_projected(
            filter::by_title("1984"),
            projection(&["title", "isAvailable", "rating"]),
            &FindSpec::new().limit(1),
        )
        .await?;
    print_results("Verify '1984' update", &updated);

    let outcome = store
        .update_many(
            filter::rating_at_least(4.7),
            Update::new().add_to_set("tags", "bestseller"),
        )
        .await?;
    print_value(
        "Add 'bestseller' tag to Books with Rating >= 4.7 (updateMany)",
        &outcome,
    );
    let bestsellers = store
        .find_projected(
            filter::tagged("bestseller"),
            projection(&["title", "rating", "tags"]),
            &FindSpec::new(),
        )
        .await?;
    print_results("Verify 'bestseller' tag addition", &bestsellers);

    let oldest_science = store
        .find_one_and_update(
            filter::by_genre(Genre::Science),
            Update::new().inc("rating", -0.1),
            &FindAndModify::returning_new().sorted(Sort::asc("publicationYear")),
        )
        .await?;
    print_value(
        "Find oldest Science book, decrement rating, return new doc (findOneAndUpdate)",
        &oldest_science,
    );
    Ok(())
}

async fn deletes(store: &BookStore) -> Result<()> {
    let deleted = store.delete_one(filter::published_before(1900)).await?;
    print_value(
        "Delete One Book Published Before 1900 (deleteOne)",
        &json!({ "deletedCount": deleted }),
    );

    let deleted = store.delete_many(filter::tagged("cult classic")).await?;
    print_value(
        "Delete All Books Tagged 'cult classic' (deleteMany)",
        &json!({ "deletedCount": deleted }),
    );
    Ok(())
}

async fn aggregations(store: &BookStore) -> Result<()> {
    let per_genre: Vec<GenreCount> = store.aggregate_as(count_per_genre(true)).await?;
    print_results("Aggregation: Count Books per Genre (Available Only)", &per_genre);

    let average: Vec<RatingSummary> = store.aggregate_as(average_rating_after(2000)).await?;
    print_results(
        "Aggregation: Average Rating for Books Published After 2000",
        &average,
    );

    let prolific: Vec<AuthorTally> = store.aggregate_as(prolific_authors(1)).await?;
    print_results("Aggregation: Authors with More Than One Book", &prolific);
    Ok(())
}
