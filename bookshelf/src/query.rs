//! Query building blocks.
//!
//! Every function here returns plain BSON, so the shape of each query can be
//! checked without a running store. `BookStore` takes these as arguments.

use std::num::NonZeroU32;

use mongodb::bson::{Bson, Document, doc};
use serde::{Deserialize, Serialize};

use crate::book::Genre;
use crate::error::{BookshelfError, Result};

/// Filters over the `books` collection.
pub mod filter {
    use super::{Bson, Document, Genre, doc};

    /// Matches every document.
    pub fn all() -> Document {
        Document::new()
    }

    /// Exact title.
    pub fn by_title(title: &str) -> Document {
        doc! { "title": title }
    }

    /// Exact author.
    pub fn by_author(author: &str) -> Document {
        doc! { "author": author }
    }

    /// Exact genre.
    pub fn by_genre(genre: Genre) -> Document {
        doc! { "genre": genre }
    }

    /// `publicationYear > year`.
    pub fn published_after(year: i32) -> Document {
        doc! { "publicationYear": { "$gt": year } }
    }

    /// `publicationYear < year`.
    pub fn published_before(year: i32) -> Document {
        doc! { "publicationYear": { "$lt": year } }
    }

    /// `rating >= min`.
    pub fn rating_at_least(min: f64) -> Document {
        doc! { "rating": { "$gte": min } }
    }

    /// `rating > min`.
    pub fn rating_above(min: f64) -> Document {
        doc! { "rating": { "$gt": min } }
    }

    /// `pages <= max`.
    pub fn pages_at_most(max: i32) -> Document {
        doc! { "pages": { "$lte": max } }
    }

    /// `author != author`.
    pub fn not_by_author(author: &str) -> Document {
        doc! { "author": { "$ne": author } }
    }

    /// Genre is one of `genres`.
    pub fn genre_in(genres: &[Genre]) -> Document {
        doc! { "genre": { "$in": genre_list(genres) } }
    }

    /// Genre is none of `genres`.
    pub fn genre_not_in(genres: &[Genre]) -> Document {
        doc! { "genre": { "$nin": genre_list(genres) } }
    }

    /// Genre is not `genre`, via `$not`.
    pub fn genre_not(genre: Genre) -> Document {
        doc! { "genre": { "$not": { "$eq": genre } } }
    }

    /// Given genre and published after `year`, as one implicit-and filter.
    pub fn genre_published_after(genre: Genre, year: i32) -> Document {
        doc! { "genre": genre, "publicationYear": { "$gt": year } }
    }

    /// Every clause must match.
    pub fn all_of(clauses: impl IntoIterator<Item = Document>) -> Document {
        doc! { "$and": clauses.into_iter().collect::<Vec<_>>() }
    }

    /// At least one clause must match.
    pub fn any_of(clauses: impl IntoIterator<Item = Document>) -> Document {
        doc! { "$or": clauses.into_iter().collect::<Vec<_>>() }
    }

    /// No clause may match.
    pub fn none_of(clauses: impl IntoIterator<Item = Document>) -> Document {
        doc! { "$nor": clauses.into_iter().collect::<Vec<_>>() }
    }

    /// Field (dot paths allowed) is present or absent.
    pub fn field_exists(path: &str, exists: bool) -> Document {
        let mut filter = Document::new();
        filter.insert(path, doc! { "$exists": exists });
        filter
    }

    /// `tags` holds an array.
    pub fn tags_are_array() -> Document {
        doc! { "tags": { "$type": "array" } }
    }

    /// Title matches a regular expression.
    pub fn title_matches(pattern: &str, case_insensitive: bool) -> Document {
        let options = if case_insensitive { "i" } else { "" };
        doc! { "title": { "$regex": pattern, "$options": options } }
    }

    /// `tags` contains `tag`.
    pub fn tagged(tag: &str) -> Document {
        doc! { "tags": tag }
    }

    /// `tags` contains every one of `tags`.
    pub fn tagged_all(tags: &[&str]) -> Document {
        doc! { "tags": { "$all": tags.to_vec() } }
    }

    /// `tags` contains at least one of `tags`.
    pub fn tagged_any(tags: &[&str]) -> Document {
        doc! { "tags": { "$in": tags.to_vec() } }
    }

    /// `tags` has exactly `count` elements.
    pub fn tag_count(count: i32) -> Document {
        doc! { "tags": { "$size": count } }
    }

    /// Embedded `publisher.name`.
    pub fn publisher_name(name: &str) -> Document {
        doc! { "publisher.name": name }
    }

    /// Embedded `publisher.location`.
    pub fn publisher_location(location: &str) -> Document {
        doc! { "publisher.location": location }
    }

    fn genre_list(genres: &[Genre]) -> Vec<Bson> {
        genres.iter().copied().map(Bson::from).collect()
    }
}

/// Sort order, keys applied in the order they were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sort(Document);

impl Sort {
    /// Ascending on `field`.
    pub fn asc(field: &str) -> Self {
        Self::default().then_asc(field)
    }

    /// Descending on `field`.
    pub fn desc(field: &str) -> Self {
        Self::default().then_desc(field)
    }

    /// Add an ascending tie-breaker.
    #[must_use]
    pub fn then_asc(mut self, field: &str) -> Self {
        self.0.insert(field, 1);
        self
    }

    /// Add a descending tie-breaker.
    #[must_use]
    pub fn then_desc(mut self, field: &str) -> Self {
        self.0.insert(field, -1);
        self
    }

    /// The sort document.
    pub fn into_document(self) -> Document {
        self.0
    }
}

/// Options for multi-document finds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindSpec {
    /// Sort order.
    pub sort: Option<Sort>,
    /// Documents to skip.
    pub skip: Option<u64>,
    /// Maximum documents to return.
    pub limit: Option<i64>,
}

impl FindSpec {
    /// No sort and no pagination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted by `sort`.
    pub fn sorted(sort: Sort) -> Self {
        Self {
            sort: Some(sort),
            ..Self::default()
        }
    }

    /// Skip `skip` documents.
    #[must_use]
    pub const fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Return at most `limit` documents.
    #[must_use]
    pub const fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// One-based page `number` of `size` documents.
    ///
    /// The size is non-zero because a limit of 0 means "no limit" to the
    /// server. Pages past `u64::MAX` documents clamp to the last skip.
    #[must_use]
    pub fn page(self, number: u64, size: NonZeroU32) -> Self {
        let size = size.get();
        let skip = number.saturating_sub(1).saturating_mul(u64::from(size));
        self.skip(skip).limit(i64::from(size))
    }
}

/// Field selection that drops `_id`.
pub fn projection(fields: &[&str]) -> Document {
    let mut doc = Document::new();
    for field in fields {
        doc.insert(*field, 1);
    }
    doc.insert("_id", 0);
    doc
}

/// An update built from modifier operators.
///
/// Every update also refreshes `updatedAt` on the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    set: Document,
    inc: Document,
    add_to_set: Document,
}

impl Update {
    /// An update with no modifiers yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// `$set` a field.
    #[must_use]
    pub fn set(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.set.insert(field, value);
        self
    }

    /// `$inc` a numeric field. Negative amounts decrement.
    #[must_use]
    pub fn inc(mut self, field: &str, amount: impl Into<Bson>) -> Self {
        self.inc.insert(field, amount);
        self
    }

    /// `$addToSet` a value onto an array field.
    #[must_use]
    pub fn add_to_set(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.add_to_set.insert(field, value);
        self
    }

    /// The update document, with the `updatedAt` stamp.
    pub fn into_document(self) -> Result<Document> {
        if self.set.is_empty() && self.inc.is_empty() && self.add_to_set.is_empty() {
            return Err(BookshelfError::EmptyUpdate);
        }
        let mut doc = Document::new();
        for (op, fields) in [
            ("$set", self.set),
            ("$inc", self.inc),
            ("$addToSet", self.add_to_set),
        ] {
            if !fields.is_empty() {
                doc.insert(op, fields);
            }
        }
        doc.insert("$currentDate", doc! { "updatedAt": true });
        Ok(doc)
    }
}

/// Options for `find_one_and_update`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindAndModify {
    /// Which match to modify when several qualify.
    pub sort: Option<Sort>,
    /// Return the document as it is after the update.
    pub return_new: bool,
}

impl FindAndModify {
    /// Return the post-update document.
    pub fn returning_new() -> Self {
        Self {
            sort: None,
            return_new: true,
        }
    }

    /// Pick the first match by `sort`.
    #[must_use]
    pub fn sorted(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }
}

/// An aggregation pipeline.
pub type Pipeline = Vec<Document>;

/// Number of books per genre.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreCount {
    /// Genre name.
    #[serde(rename = "_id")]
    pub genre: String,
    /// Books in the genre.
    pub count: i64,
}

/// Average rating over a set of books.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    /// What was averaged.
    pub description: String,
    /// Mean rating, `None` when no matched book has one.
    pub avg_rating: Option<f64>,
    /// Books matched.
    pub number_of_books: i64,
}

/// Books per author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorTally {
    /// Author name.
    pub author: String,
    /// Books by the author.
    pub number_of_books: i64,
}

/// Count books per genre, most populous first.
pub fn count_per_genre(available_only: bool) -> Pipeline {
    let mut pipeline = Vec::with_capacity(3);
    if available_only {
        pipeline.push(doc! { "$match": { "isAvailable": true } });
    }
    pipeline.push(doc! { "$group": { "_id": "$genre", "count": { "$sum": 1 } } });
    pipeline.push(doc! { "$sort": { "count": -1, "_id": 1 } });
    pipeline
}

/// Average rating of books published after `year`, as one row.
pub fn average_rating_after(year: i32) -> Pipeline {
    vec![
        doc! { "$match": { "publicationYear": { "$gt": year } } },
        doc! { "$group": {
            "_id": Bson::Null,
            "averageRating": { "$avg": "$rating" },
            "totalBooks": { "$sum": 1 },
        } },
        doc! { "$project": {
            "_id": 0,
            "description": { "$literal": format!("Average Rating for Books Published After {year}") },
            "avgRating": "$averageRating",
            "numberOfBooks": "$totalBooks",
        } },
    ]
}

/// Authors with more than `min_books` books, most prolific first.
pub fn prolific_authors(min_books: i32) -> Pipeline {
    vec![
        doc! { "$group": { "_id": "$author", "bookCount": { "$sum": 1 } } },
        doc! { "$match": { "bookCount": { "$gt": min_books } } },
        doc! { "$project": { "_id": 0, "author": "$_id", "numberOfBooks": "$bookCount" } },
        doc! { "$sort": { "numberOfBooks": -1, "author": 1 } },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_filters() {
        assert_eq!(
            filter::published_after(1950),
            doc! { "publicationYear": { "$gt": 1950 } }
        );
        assert_eq!(
            filter::rating_at_least(4.5),
            doc! { "rating": { "$gte": 4.5 } }
        );
        assert_eq!(filter::pages_at_most(300), doc! { "pages": { "$lte": 300 } });
        assert_eq!(
            filter::not_by_author("Jane Austen"),
            doc! { "author": { "$ne": "Jane Austen" } }
        );
    }

    #[test]
    fn genre_sets_use_stored_names() {
        assert_eq!(
            filter::genre_in(&[Genre::Science, Genre::NonFiction]),
            doc! { "genre": { "$in": ["Science", "Non-Fiction"] } }
        );
        assert_eq!(
            filter::genre_not_in(&[Genre::Fiction, Genre::Mystery]),
            doc! { "genre": { "$nin": ["Fiction", "Mystery"] } }
        );
        assert_eq!(
            filter::genre_not(Genre::Fantasy),
            doc! { "genre": { "$not": { "$eq": "Fantasy" } } }
        );
    }

    #[test]
    fn logical_combinators_wrap_clauses() {
        let f = filter::any_of([
            filter::by_genre(Genre::Science),
            filter::rating_above(4.7),
        ]);
        assert_eq!(
            f,
            doc! { "$or": [ { "genre": "Science" }, { "rating": { "$gt": 4.7 } } ] }
        );
        let f = filter::none_of([
            filter::by_genre(Genre::Fiction),
            filter::by_genre(Genre::Mystery),
        ]);
        assert_eq!(f.get_array("$nor").unwrap().len(), 2);
        assert!(filter::all_of([filter::all()]).contains_key("$and"));
    }

    #[test]
    fn implicit_and_keeps_both_fields() {
        let f = filter::genre_published_after(Genre::Fiction, 1900);
        assert_eq!(f.get_str("genre").unwrap(), "Fiction");
        assert!(f.get_document("publicationYear").is_ok());
    }

    #[test]
    fn element_and_array_filters() {
        assert_eq!(
            filter::field_exists("publisher.location", false),
            doc! { "publisher.location": { "$exists": false } }
        );
        assert_eq!(
            filter::tagged_all(&["classic", "adventure"]),
            doc! { "tags": { "$all": ["classic", "adventure"] } }
        );
        assert_eq!(filter::tag_count(3), doc! { "tags": { "$size": 3 } });
        assert_eq!(filter::tagged("sci-fi"), doc! { "tags": "sci-fi" });
    }

    #[test]
    fn regex_filter_carries_options() {
        assert_eq!(
            filter::title_matches("classic", true),
            doc! { "title": { "$regex": "classic", "$options": "i" } }
        );
    }

    #[test]
    fn sort_preserves_key_order() {
        let sort = Sort::desc("rating").then_asc("title").into_document();
        let keys: Vec<_> = sort.keys().map(String::as_str).collect();
        assert_eq!(keys, ["rating", "title"]);
        assert_eq!(sort.get_i32("rating").unwrap(), -1);
    }

    fn size(n: u32) -> NonZeroU32 {
        NonZeroU32::new(n).unwrap()
    }

    #[test]
    fn page_translates_to_skip_and_limit() {
        let spec = FindSpec::sorted(Sort::asc("title")).page(2, size(2));
        assert_eq!(spec.skip, Some(2));
        assert_eq!(spec.limit, Some(2));
        assert_eq!(FindSpec::new().page(0, size(5)).skip, Some(0));
    }

    #[test]
    fn huge_page_number_saturates() {
        let spec = FindSpec::new().page(u64::MAX, size(2));
        assert_eq!(spec.skip, Some(u64::MAX));
        assert_eq!(spec.limit, Some(2));
    }

    #[test]
    fn smallest_page_is_bounded() {
        let spec = FindSpec::new().page(3, NonZeroU32::MIN);
        assert_eq!(spec.skip, Some(2));
        assert_eq!(spec.limit, Some(1));
    }

    #[test]
    fn projection_excludes_id() {
        assert_eq!(
            projection(&["title", "author"]),
            doc! { "title": 1, "author": 1, "_id": 0 }
        );
    }

    #[test]
    fn update_groups_modifiers_and_stamps() {
        let update = Update::new()
            .set("isAvailable", true)
            .set("rating", 4.4)
            .add_to_set("tags", "bestseller")
            .into_document()
            .unwrap();
        assert_eq!(
            update,
            doc! {
                "$set": { "isAvailable": true, "rating": 4.4 },
                "$addToSet": { "tags": "bestseller" },
                "$currentDate": { "updatedAt": true },
            }
        );
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(matches!(
            Update::new().into_document(),
            Err(BookshelfError::EmptyUpdate)
        ));
    }

    #[test]
    fn genre_pipeline_matches_only_when_asked() {
        let all = count_per_genre(false);
        assert_eq!(all.len(), 2);
        let available = count_per_genre(true);
        assert_eq!(available[0], doc! { "$match": { "isAvailable": true } });
        assert!(available[1].contains_key("$group"));
        assert!(available[2].contains_key("$sort"));
    }

    #[test]
    fn average_pipeline_projects_renamed_fields() {
        let pipeline = average_rating_after(2000);
        let project = pipeline[2].get_document("$project").unwrap();
        assert_eq!(project.get_str("avgRating").unwrap(), "$averageRating");
        assert_eq!(project.get_str("numberOfBooks").unwrap(), "$totalBooks");
    }

    #[test]
    fn prolific_authors_filters_after_grouping() {
        let pipeline = prolific_authors(1);
        assert!(pipeline[0].contains_key("$group"));
        assert_eq!(
            pipeline[1],
            doc! { "$match": { "bookCount": { "$gt": 1 } } }
        );
    }
}
