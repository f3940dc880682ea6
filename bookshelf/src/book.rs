//! The `Book` record, its genre enum and the schema declarations that back
//! the `books` collection.

use std::fmt;
use std::str::FromStr;

use mongodb::IndexModel;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{DateTime, Document, doc};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::error::{BookshelfError, Result};

/// Book genre. Only these five values may be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Genre {
    /// Fiction.
    Fiction,
    /// Non-fiction, stored as `Non-Fiction`.
    #[serde(rename = "Non-Fiction")]
    NonFiction,
    /// Science.
    Science,
    /// Fantasy.
    Fantasy,
    /// Mystery.
    Mystery,
}

impl Genre {
    /// Every genre, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Fiction,
        Self::NonFiction,
        Self::Science,
        Self::Fantasy,
        Self::Mystery,
    ];

    /// The stored name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fiction => "Fiction",
            Self::NonFiction => "Non-Fiction",
            Self::Science => "Science",
            Self::Fantasy => "Fantasy",
            Self::Mystery => "Mystery",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = BookshelfError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| BookshelfError::InvalidGenre(s.to_string()))
    }
}

impl From<Genre> for mongodb::bson::Bson {
    fn from(genre: Genre) -> Self {
        Self::String(genre.as_str().to_string())
    }
}

/// Publisher details embedded in a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publisher {
    /// Publisher name (required).
    pub name: String,
    /// City or region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl Publisher {
    /// Publisher with a name only.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
        }
    }

    /// Set the location.
    #[must_use]
    pub fn located_in(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// A book as stored in the `books` collection.
///
/// Absent optional fields are not written, so `$exists: false` matches them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Store-assigned identifier.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    /// Title.
    pub title: String,
    /// Author.
    pub author: String,
    /// Genre.
    pub genre: Genre,
    /// Year of first publication.
    pub publication_year: i32,
    /// ISBN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    /// Average reader rating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Free-form tags, in insertion order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Whether a copy can be borrowed.
    #[serde(default)]
    pub is_available: bool,
    /// Page count.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<i32>,
    /// Publisher.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<Publisher>,
    /// Blurb; part of the text index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Insert time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    /// Last write time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl Book {
    /// Collection the records live in.
    pub const COLLECTION: &'static str = "books";

    /// A book with the required fields set and everything else defaulted.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        genre: Genre,
        publication_year: i32,
    ) -> Self {
        Self {
            id: None,
            title: title.into(),
            author: author.into(),
            genre,
            publication_year,
            isbn: None,
            rating: None,
            tags: Vec::new(),
            is_available: false,
            pages: None,
            publisher: None,
            description: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Set the ISBN.
    #[must_use]
    pub fn with_isbn(mut self, isbn: impl Into<String>) -> Self {
        self.isbn = Some(isbn.into());
        self
    }

    /// Set the rating.
    #[must_use]
    pub const fn with_rating(mut self, rating: f64) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Replace the tags.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Set availability.
    #[must_use]
    pub const fn available(mut self, is_available: bool) -> Self {
        self.is_available = is_available;
        self
    }

    /// Set the page count.
    #[must_use]
    pub const fn with_pages(mut self, pages: i32) -> Self {
        self.pages = Some(pages);
        self
    }

    /// Set the publisher.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Publisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check the invariants the type system does not already cover.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(BookshelfError::Validation {
                field: "title",
                reason: "must not be blank",
            });
        }
        if self.author.trim().is_empty() {
            return Err(BookshelfError::Validation {
                field: "author",
                reason: "must not be blank",
            });
        }
        if let Some(publisher) = &self.publisher
            && publisher.name.trim().is_empty()
        {
            return Err(BookshelfError::Validation {
                field: "publisher.name",
                reason: "must not be blank",
            });
        }
        Ok(())
    }

    /// Indexes declared on the collection.
    pub fn indexes() -> Vec<IndexModel> {
        vec![
            index(doc! { "title": 1 }, "title_1"),
            index(doc! { "author": 1 }, "author_1"),
            index(doc! { "genre": 1, "rating": -1 }, "genre_1_rating_-1"),
            index(
                doc! { "title": "text", "description": "text" },
                "title_text_description_text",
            ),
        ]
    }

    /// `$jsonSchema` validator installed on the collection.
    pub fn json_schema() -> Document {
        let genres: Vec<&str> = Genre::ALL.iter().map(|g| g.as_str()).collect();
        doc! {
            "$jsonSchema": {
                "bsonType": "object",
                "required": ["title", "author", "genre", "publicationYear"],
                "properties": {
                    "title": { "bsonType": "string", "minLength": 1 },
                    "author": { "bsonType": "string", "minLength": 1 },
                    "genre": { "enum": genres },
                    "publicationYear": { "bsonType": ["int", "long"] },
                    "isbn": { "bsonType": "string" },
                    "rating": { "bsonType": ["double", "int", "long", "decimal"] },
                    "tags": { "bsonType": "array", "items": { "bsonType": "string" } },
                    "isAvailable": { "bsonType": "bool" },
                    "pages": { "bsonType": ["int", "long"] },
                    "publisher": {
                        "bsonType": "object",
                        "required": ["name"],
                        "properties": {
                            "name": { "bsonType": "string" },
                            "location": { "bsonType": "string" },
                        },
                    },
                    "description": { "bsonType": "string" },
                    "createdAt": { "bsonType": "date" },
                    "updatedAt": { "bsonType": "date" },
                },
            }
        }
    }
}

fn index(keys: Document, name: &str) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().name(name.to_string()).build())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson;

    fn hobbit() -> Book {
        Book::new("The Hobbit", "J.R.R. Tolkien", Genre::Fantasy, 1937)
            .with_rating(4.6)
            .with_tags(["fantasy", "adventure"])
            .available(true)
    }

    #[test]
    fn genre_names_round_trip_through_from_str() {
        for genre in Genre::ALL {
            assert_eq!(genre.as_str().parse::<Genre>().unwrap(), genre);
        }
        assert!(matches!(
            "Biography".parse::<Genre>(),
            Err(BookshelfError::InvalidGenre(g)) if g == "Biography"
        ));
    }

    #[test]
    fn non_fiction_serializes_with_hyphen() {
        let doc = bson::to_document(&Book::new("Sapiens", "Harari", Genre::NonFiction, 2011))
            .unwrap();
        assert_eq!(doc.get_str("genre").unwrap(), "Non-Fiction");
    }

    #[test]
    fn stored_field_names_are_camel_case() {
        let doc = bson::to_document(&hobbit()).unwrap();
        assert_eq!(doc.get_i32("publicationYear").unwrap(), 1937);
        assert!(doc.get_bool("isAvailable").unwrap());
        assert!(!doc.contains_key("_id"));
    }

    #[test]
    fn absent_optionals_are_not_written() {
        let doc = bson::to_document(&hobbit()).unwrap();
        for key in ["isbn", "pages", "publisher", "description", "createdAt"] {
            assert!(!doc.contains_key(key), "{key} should be absent");
        }
        // tags always present so `$type: "array"` matches
        assert!(doc.get_array("tags").is_ok());
    }

    #[test]
    fn missing_optionals_deserialize_to_defaults() {
        let doc = doc! {
            "title": "Cosmos",
            "author": "Carl Sagan",
            "genre": "Science",
            "publicationYear": 1980,
        };
        let book: Book = bson::from_document(doc).unwrap();
        assert!(!book.is_available);
        assert!(book.tags.is_empty());
        assert_eq!(book.publisher, None);
    }

    #[test]
    fn out_of_enum_genre_fails_to_decode() {
        let doc = doc! {
            "title": "Becoming",
            "author": "Michelle Obama",
            "genre": "Biography",
            "publicationYear": 2018,
        };
        assert!(bson::from_document::<Book>(doc).is_err());
    }

    #[test]
    fn validate_rejects_blank_required_fields() {
        let mut book = hobbit();
        book.title = " ".into();
        assert!(matches!(
            book.validate(),
            Err(BookshelfError::Validation { field: "title", .. })
        ));

        let mut book = hobbit();
        book.author.clear();
        assert!(matches!(
            book.validate(),
            Err(BookshelfError::Validation { field: "author", .. })
        ));

        let book = hobbit().with_publisher(Publisher::new(""));
        assert!(matches!(
            book.validate(),
            Err(BookshelfError::Validation {
                field: "publisher.name",
                ..
            })
        ));

        assert!(hobbit().validate().is_ok());
    }

    #[test]
    fn declares_four_indexes_with_descending_rating() {
        let indexes = Book::indexes();
        assert_eq!(indexes.len(), 4);
        assert_eq!(indexes[2].keys, doc! { "genre": 1, "rating": -1 });
        assert_eq!(
            indexes[3].keys,
            doc! { "title": "text", "description": "text" }
        );
    }

    #[test]
    fn json_schema_lists_all_genres() {
        let schema = Book::json_schema();
        let genres = schema
            .get_document("$jsonSchema")
            .and_then(|s| s.get_document("properties"))
            .and_then(|p| p.get_document("genre"))
            .and_then(|g| g.get_array("enum"))
            .unwrap();
        assert_eq!(genres.len(), 5);
    }
}
