//! `BookStore` - the read/write/aggregate surface over the `books` collection.
//!
//! Every call is awaited to completion before returning; nothing here issues
//! operations concurrently. Errors from the driver (including server-side
//! validation failures) propagate unchanged as [`BookshelfError::Database`].
//!
//! [`BookshelfError::Database`]: crate::error::BookshelfError::Database

use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, DateTime, Document, doc};
use mongodb::options::{
    CreateCollectionOptions, FindOneAndUpdateOptions, FindOptions, ReturnDocument,
};
use mongodb::{Collection, Database};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::book::Book;
use crate::error::Result;
use crate::query::{FindAndModify, FindSpec, Pipeline, Sort, Update};

/// Counts reported by an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UpdateOutcome {
    /// Documents that matched the filter.
    pub matched: u64,
    /// Documents actually changed.
    pub modified: u64,
}

/// A text-search hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredBook {
    /// The matching book.
    #[serde(flatten)]
    pub book: Book,
    /// Relevance assigned by the text index.
    pub score: f64,
}

/// Handle on the `books` collection.
#[derive(Debug, Clone)]
pub struct BookStore {
    db: Database,
    books: Collection<Book>,
}

impl BookStore {
    /// Store over `db`'s `books` collection.
    pub fn new(db: &Database) -> Self {
        Self {
            db: db.clone(),
            books: db.collection(Book::COLLECTION),
        }
    }

    /// The typed collection.
    pub const fn collection(&self) -> &Collection<Book> {
        &self.books
    }

    fn raw(&self) -> Collection<Document> {
        self.books.clone_with_type()
    }

    /// Create the collection with its validator if missing, then create the
    /// declared indexes. An existing collection keeps its validator.
    pub async fn ensure_schema(&self) -> Result<()> {
        let names = self.db.list_collection_names().await?;
        if names.iter().any(|n| n == Book::COLLECTION) {
            debug!(collection = Book::COLLECTION, "Collection exists");
        } else {
            let options = CreateCollectionOptions::builder()
                .validator(Book::json_schema())
                .build();
            self.db
                .create_collection(Book::COLLECTION)
                .with_options(options)
                .await?;
            info!(collection = Book::COLLECTION, "Created collection");
        }
        let created = self.books.create_indexes(Book::indexes()).await?;
        debug!(indexes = ?created.index_names, "Indexes ensured");
        Ok(())
    }

    /// Books matching `filter`, sorted and paginated per `spec`.
    pub async fn find(&self, filter: Document, spec: &FindSpec) -> Result<Vec<Book>> {
        debug!(?filter, ?spec, "find");
        let cursor = self
            .books
            .find(filter)
            .with_options(find_options(spec, None))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// Like [`find`](Self::find) but returning only the projected fields.
    pub async fn find_projected(
        &self,
        filter: Document,
        projection: Document,
        spec: &FindSpec,
    ) -> Result<Vec<Document>> {
        debug!(?filter, ?projection, "find projected");
        let cursor = self
            .raw()
            .find(filter)
            .with_options(find_options(spec, Some(projection)))
            .await?;
        Ok(cursor.try_collect().await?)
    }

    /// First book matching `filter`.
    pub async fn find_one(&self, filter: Document) -> Result<Option<Book>> {
        debug!(?filter, "find one");
        Ok(self.books.find_one(filter).await?)
    }

    /// Book with identifier `id`.
    pub async fn find_by_id(&self, id: ObjectId) -> Result<Option<Book>> {
        self.find_one(doc! { "_id": id }).await
    }

    /// Exact number of books matching `filter`.
    pub async fn count(&self, filter: Document) -> Result<u64> {
        Ok(self.books.count_documents(filter).await?)
    }

    /// Collection size from metadata; may lag behind recent writes.
    pub async fn estimated_count(&self) -> Result<u64> {
        Ok(self.books.estimated_document_count().await?)
    }

    /// Validate, timestamp and insert `books` in one batch.
    ///
    /// Returns the new identifiers in input order. Nothing is written if any
    /// book fails validation.
    pub async fn insert_many(&self, books: impl IntoIterator<Item = Book>) -> Result<Vec<ObjectId>> {
        let now = DateTime::now();
        let stamped = books
            .into_iter()
            .map(|mut book| -> Result<Book> {
                book.validate()?;
                book.created_at = Some(now);
                book.updated_at = Some(now);
                Ok(book)
            })
            .collect::<Result<Vec<_>>>()?;
        if stamped.is_empty() {
            return Ok(Vec::new());
        }

        let result = self.books.insert_many(&stamped).await?;
        let mut ids: Vec<_> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);
        Ok(ids
            .into_iter()
            .filter_map(|(_, id)| id.as_object_id())
            .collect())
    }

    /// Apply `update` to the first match only.
    pub async fn update_one(&self, filter: Document, update: Update) -> Result<UpdateOutcome> {
        let update = update.into_document()?;
        debug!(?filter, ?update, "update one");
        let result = self.books.update_one(filter, update).await?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    /// Apply `update` to every match.
    pub async fn update_many(&self, filter: Document, update: Update) -> Result<UpdateOutcome> {
        let update = update.into_document()?;
        debug!(?filter, ?update, "update many");
        let result = self.books.update_many(filter, update).await?;
        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    /// Atomically update one match and return it, before or after the update
    /// depending on `options.return_new`.
    pub async fn find_one_and_update(
        &self,
        filter: Document,
        update: Update,
        options: &FindAndModify,
    ) -> Result<Option<Book>> {
        let update = update.into_document()?;
        let return_document = if options.return_new {
            ReturnDocument::After
        } else {
            ReturnDocument::Before
        };
        let opts = FindOneAndUpdateOptions::builder()
            .return_document(return_document)
            .sort(options.sort.clone().map(Sort::into_document))
            .build();
        debug!(?filter, ?update, "find one and update");
        Ok(self
            .books
            .find_one_and_update(filter, update)
            .with_options(opts)
            .await?)
    }

    /// Delete the first match. Returns the number deleted (0 or 1).
    pub async fn delete_one(&self, filter: Document) -> Result<u64> {
        debug!(?filter, "delete one");
        Ok(self.books.delete_one(filter).await?.deleted_count)
    }

    /// Delete every match. Returns the number deleted.
    pub async fn delete_many(&self, filter: Document) -> Result<u64> {
        debug!(?filter, "delete many");
        Ok(self.books.delete_many(filter).await?.deleted_count)
    }

    /// Delete every book.
    pub async fn clear(&self) -> Result<u64> {
        self.delete_many(Document::new()).await
    }

    /// Run an aggregation pipeline.
    pub async fn aggregate(&self, pipeline: Pipeline) -> Result<Vec<Document>> {
        debug!(?pipeline, "aggregate");
        let cursor = self.books.aggregate(pipeline).await?;
        Ok(cursor.try_collect().await?)
    }

    /// Run an aggregation pipeline and decode each row as `T`.
    pub async fn aggregate_as<T: DeserializeOwned>(&self, pipeline: Pipeline) -> Result<Vec<T>> {
        self.aggregate(pipeline)
            .await?
            .into_iter()
            .map(|row| -> Result<T> { Ok(bson::from_document(row)?) })
            .collect()
    }

    /// Full-text search over title and description, best match first.
    ///
    /// Fails when the text index does not exist.
    pub async fn text_search(&self, terms: &str) -> Result<Vec<ScoredBook>> {
        let score = doc! { "score": { "$meta": "textScore" } };
        let options = FindOptions::builder()
            .projection(score.clone())
            .sort(score)
            .build();
        debug!(terms, "text search");
        let hits: Vec<Document> = self
            .raw()
            .find(doc! { "$text": { "$search": terms } })
            .with_options(options)
            .await?
            .try_collect()
            .await?;
        hits.into_iter().map(scored_book).collect()
    }
}

fn find_options(spec: &FindSpec, projection: Option<Document>) -> FindOptions {
    FindOptions::builder()
        .sort(spec.sort.clone().map(Sort::into_document))
        .skip(spec.skip)
        .limit(spec.limit)
        .projection(projection)
        .build()
}

fn scored_book(mut hit: Document) -> Result<ScoredBook> {
    let score = hit
        .remove("score")
        .and_then(|s| s.as_f64())
        .unwrap_or_default();
    Ok(ScoredBook {
        book: bson::from_document(hit)?,
        score,
    })
}
