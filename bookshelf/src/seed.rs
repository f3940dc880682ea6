//! Sample data and the destructive reseed routine.

use mongodb::bson::{self, Document, doc};
use serde::Serialize;
use tracing::{info, warn};

use crate::book::{Book, Genre};
use crate::config::Config;
use crate::connection::Connection;
use crate::error::Result;
use crate::store::BookStore;

/// Genre substituted for sample records whose genre is not allowed.
pub const DEFAULT_GENRE: Genre = Genre::Fiction;

/// What a seed run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    /// Books removed before inserting.
    pub cleared: u64,
    /// Books inserted.
    pub inserted: usize,
}

/// The ten sample records, untyped. "Becoming" carries a genre outside the
/// allowed set on purpose.
pub fn sample_books() -> Vec<Document> {
    vec![
        doc! {
            "title": "The Hitchhiker's Guide to the Galaxy",
            "author": "Douglas Adams",
            "genre": "Science",
            "publicationYear": 1979,
            "isbn": "978-0345391803",
            "rating": 4.5,
            "tags": ["comedy", "sci-fi", "cult classic", "adventure"],
            "isAvailable": true,
            "pages": 224,
            "publisher": { "name": "Pan Books", "location": "London" },
            "description": "A hilarious satirical science fiction series.",
        },
        doc! {
            "title": "Pride and Prejudice",
            "author": "Jane Austen",
            "genre": "Fiction",
            "publicationYear": 1813,
            "isbn": "978-0141439518",
            "rating": 4.7,
            "tags": ["romance", "classic", "regency", "social commentary"],
            "isAvailable": true,
            "pages": 432,
            "description": "A classic novel exploring themes of love, marriage, and social status in Regency England.",
        },
        doc! {
            "title": "1984",
            "author": "George Orwell",
            "genre": "Fiction",
            "publicationYear": 1949,
            "isbn": "978-0451524935",
            "rating": 4.3,
            "tags": ["dystopian", "political fiction", "classic", "surveillance"],
            "isAvailable": false,
            "pages": 328,
            "publisher": { "name": "Secker & Warburg", "location": "London" },
        },
        doc! {
            "title": "Sapiens: A Brief History of Humankind",
            "author": "Yuval Noah Harari",
            "genre": "Non-Fiction",
            "publicationYear": 2011,
            "isbn": "978-0062316097",
            "rating": 4.8,
            "tags": ["history", "anthropology", "science", "evolution"],
            "isAvailable": true,
            "pages": 464,
            "publisher": { "name": "Harper" },
        },
        doc! {
            "title": "The Hobbit",
            "author": "J.R.R. Tolkien",
            "genre": "Fantasy",
            "publicationYear": 1937,
            "isbn": "978-0547928227",
            "rating": 4.6,
            "tags": ["fantasy", "adventure", "classic", "middle-earth"],
            "isAvailable": true,
            "pages": 310,
            "description": "An introductory tale to the world of Middle-earth, following Bilbo Baggins.",
        },
        doc! {
            "title": "Cosmos",
            "author": "Carl Sagan",
            "genre": "Science",
            "publicationYear": 1980,
            "isbn": "978-0345539434",
            "rating": 4.9,
            "tags": ["science", "astronomy", "cosmology", "popular science"],
            "isAvailable": true,
            "pages": 384,
            "publisher": { "name": "Random House" },
            "description": "Explores the universe and our place within it.",
        },
        doc! {
            "title": "A Brief History of Time",
            "author": "Stephen Hawking",
            "genre": "Science",
            "publicationYear": 1988,
            "isbn": "978-0553380163",
            "rating": 4.4,
            "tags": ["science", "physics", "cosmology", "black holes"],
            "isAvailable": false,
            "pages": 212,
        },
        doc! {
            "title": "The Da Vinci Code",
            "author": "Dan Brown",
            "genre": "Mystery",
            "publicationYear": 2003,
            "isbn": "978-0307474278",
            "rating": 4.1,
            "tags": ["mystery", "thriller", "conspiracy", "symbology"],
            "isAvailable": true,
            "pages": 454,
            "publisher": { "name": "Doubleday", "location": "New York" },
            "description": "A gripping thriller involving symbology, secret societies, and religious history.",
        },
        doc! {
            "title": "Becoming",
            "author": "Michelle Obama",
            "genre": "Biography",
            "publicationYear": 2018,
            "isbn": "978-1524763138",
            "rating": 4.8,
            "tags": ["biography", "memoir", "politics", "inspirational"],
            "isAvailable": true,
            "pages": 426,
            "publisher": { "name": "Crown Publishing Group" },
            "description": "The memoir of the former First Lady of the United States.",
        },
        doc! {
            "title": "The Girl with the Dragon Tattoo",
            "author": "Stieg Larsson",
            "genre": "Mystery",
            "publicationYear": 2005,
            "isbn": "978-0307949486",
            "rating": 4.2,
            "tags": ["mystery", "thriller", "crime", "nordic noir"],
            "isAvailable": true,
            "pages": 672,
            "publisher": { "name": "Norstedts Förlag", "location": "Stockholm" },
            "description": "A complex mystery involving a journalist and a hacker.",
        },
    ]
}

/// Decode raw records into books, replacing any genre outside the allowed
/// set with [`DEFAULT_GENRE`]. A record missing a required field fails the
/// whole batch.
pub fn normalize(samples: Vec<Document>) -> Result<Vec<Book>> {
    samples
        .into_iter()
        .map(|mut raw| -> Result<Book> {
            let invalid = match raw.get_str("genre") {
                Ok(genre) if genre.parse::<Genre>().is_err() => Some(genre.to_string()),
                _ => None,
            };
            if let Some(genre) = invalid {
                let title = raw.get_str("title").unwrap_or("<untitled>");
                warn!(
                    title,
                    genre = %genre,
                    fallback = %DEFAULT_GENRE,
                    "Book has an invalid genre, substituting the default"
                );
                raw.insert("genre", DEFAULT_GENRE);
            }
            Ok(bson::from_document(raw)?)
        })
        .collect()
}

/// Replace the collection's contents with `samples`.
///
/// Delete and insert are separate operations: a failure between them
/// leaves the collection empty. Records are decoded before anything is
/// deleted, so malformed input never wipes the collection.
pub async fn seed(store: &BookStore, samples: Vec<Document>) -> Result<SeedReport> {
    let books = normalize(samples)?;
    store.ensure_schema().await?;

    info!("Clearing all existing books");
    let cleared = store.clear().await?;

    info!(count = books.len(), "Inserting books");
    let inserted = store.insert_many(books).await?.len();

    info!(cleared, inserted, "All books have been added");
    Ok(SeedReport { cleared, inserted })
}

/// Connect, seed the sample books, disconnect.
pub async fn run_seed(config: &Config) -> Result<SeedReport> {
    let conn = Connection::connect(config).await?;
    let result = seed(&conn.books(), sample_books()).await;
    conn.disconnect().await;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_samples() {
        assert_eq!(sample_books().len(), 10);
    }

    #[test]
    fn invalid_genre_becomes_default() {
        let books = normalize(sample_books()).unwrap();
        let becoming = books.iter().find(|b| b.title == "Becoming").unwrap();
        assert_eq!(becoming.genre, DEFAULT_GENRE);
    }

    #[test]
    fn valid_genres_are_untouched() {
        let books = normalize(sample_books()).unwrap();
        let hobbit = books.iter().find(|b| b.title == "The Hobbit").unwrap();
        assert_eq!(hobbit.genre, Genre::Fantasy);
        let sapiens = books.iter().find(|b| b.author == "Yuval Noah Harari").unwrap();
        assert_eq!(sapiens.genre, Genre::NonFiction);
    }

    #[test]
    fn exactly_three_science_books() {
        let books = normalize(sample_books()).unwrap();
        let mut science: Vec<_> = books
            .iter()
            .filter(|b| b.genre == Genre::Science)
            .map(|b| b.title.as_str())
            .collect();
        science.sort_unstable();
        assert_eq!(
            science,
            [
                "A Brief History of Time",
                "Cosmos",
                "The Hitchhiker's Guide to the Galaxy"
            ]
        );
    }

    #[test]
    fn optional_fields_survive_decoding() {
        let books = normalize(sample_books()).unwrap();
        let brief = books
            .iter()
            .find(|b| b.title == "A Brief History of Time")
            .unwrap();
        assert_eq!(brief.publisher, None);
        assert_eq!(brief.pages, Some(212));
        let harper = books.iter().find(|b| b.title.starts_with("Sapiens")).unwrap();
        assert_eq!(
            harper.publisher.as_ref().and_then(|p| p.location.as_deref()),
            None
        );
    }

    #[test]
    fn missing_required_field_fails() {
        let raw = vec![doc! { "title": "Untitled", "genre": "Fiction" }];
        assert!(normalize(raw).is_err());
    }

    #[test]
    fn all_samples_validate() {
        for book in normalize(sample_books()).unwrap() {
            book.validate().unwrap();
        }
    }
}
