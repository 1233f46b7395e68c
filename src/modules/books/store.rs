//! In-memory book store.
//!
//! The store owns every record in insertion order and enforces the
//! create/update validation rules. It is synchronous; callers that share it
//! across tasks wrap the whole store in one lock.

use bookshelf_kernel::settings::FilterMode;
use thiserror::Error;
use time::{Duration, OffsetDateTime};

use super::models::{Book, BookFilter, BookId, BookInput, BookSummary};
use crate::utils::{random_id, ID_LENGTH};

/// Caller-supplied fields violate a precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing name")]
    MissingName,
    #[error("readPage exceeds pageCount")]
    ReadPageExceedsPageCount,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("book {0} not found")]
    NotFound(BookId),

    /// A post-condition failed after an operation that should not fail.
    #[error("internal store error: {0}")]
    Internal(String),
}

/// Validated mutable fields shared by create and update.
struct BookFields {
    name: String,
    year: i32,
    author: String,
    summary: String,
    publisher: String,
    page_count: u32,
    read_page: u32,
    reading: bool,
}

impl TryFrom<BookInput> for BookFields {
    type Error = ValidationError;

    fn try_from(input: BookInput) -> Result<Self, Self::Error> {
        let name = match input.name {
            Some(name) if !name.is_empty() => name,
            _ => return Err(ValidationError::MissingName),
        };

        if input.read_page > input.page_count {
            return Err(ValidationError::ReadPageExceedsPageCount);
        }

        Ok(Self {
            name,
            year: input.year,
            author: input.author,
            summary: input.summary,
            publisher: input.publisher,
            page_count: input.page_count,
            read_page: input.read_page,
            reading: input.reading,
        })
    }
}

/// Authoritative collection of book records.
#[derive(Debug, Default)]
pub struct BookStore {
    books: Vec<Book>,
    filter_mode: FilterMode,
}

impl BookStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter_mode(filter_mode: FilterMode) -> Self {
        Self {
            books: Vec::new(),
            filter_mode,
        }
    }

    pub fn filter_mode(&self) -> FilterMode {
        self.filter_mode
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Validate `input` and append a new record, returning its fresh id.
    pub fn create(&mut self, input: BookInput) -> Result<BookId, StoreError> {
        let fields = BookFields::try_from(input)?;

        let id = BookId::from(random_id(ID_LENGTH));
        let now = OffsetDateTime::now_utc();

        self.books.push(Book {
            id: id.clone(),
            name: fields.name,
            year: fields.year,
            author: fields.author,
            summary: fields.summary,
            publisher: fields.publisher,
            page_count: fields.page_count,
            read_page: fields.read_page,
            reading: fields.reading,
            inserted_at: now,
            updated_at: now,
        });

        if self.position(id.as_str()).is_none() {
            return Err(StoreError::Internal(format!(
                "book {id} missing right after insert"
            )));
        }

        tracing::debug!(book_id = %id, count = self.books.len(), "book created");
        Ok(id)
    }

    /// Summaries of the records selected by `filter`, in insertion order.
    pub fn list(&self, filter: &BookFilter) -> Vec<BookSummary> {
        match self.filter_mode {
            FilterMode::Legacy => self.list_first_match(filter),
            FilterMode::Combined => self.list_all_match(filter),
        }
    }

    /// Only the first supplied filter applies, checked as `finished`, then
    /// `name`, then `reading`. A flag other than `"0"`/`"1"` is skipped.
    fn list_first_match(&self, filter: &BookFilter) -> Vec<BookSummary> {
        if let Some(finished) = filter.finished_flag() {
            return self.summaries(|book| book.finished() == finished);
        }

        if let Some(name) = filter.name.as_deref() {
            let needle = name.to_lowercase();
            return self.summaries(|book| book.name.to_lowercase().contains(&needle));
        }

        if let Some(reading) = filter.reading_flag() {
            return self.summaries(|book| book.reading == reading);
        }

        self.summaries(|_| true)
    }

    fn list_all_match(&self, filter: &BookFilter) -> Vec<BookSummary> {
        let needle = filter.name.as_deref().map(str::to_lowercase);
        let finished = filter.finished_flag();
        let reading = filter.reading_flag();

        self.summaries(|book| {
            finished.map_or(true, |flag| book.finished() == flag)
                && reading.map_or(true, |flag| book.reading == flag)
                && needle
                    .as_deref()
                    .map_or(true, |needle| book.name.to_lowercase().contains(needle))
        })
    }

    fn summaries(&self, keep: impl Fn(&Book) -> bool) -> Vec<BookSummary> {
        self.books
            .iter()
            .filter(|book| keep(book))
            .map(Book::summary)
            .collect()
    }

    /// Full record for `id`.
    pub fn get_by_id(&self, id: &str) -> Result<Book, StoreError> {
        self.books
            .iter()
            .find(|book| book.id == *id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Replace every mutable field of the record `id`.
    ///
    /// Validation runs before the lookup, so an invalid input is rejected
    /// even when `id` does not exist.
    pub fn update_by_id(&mut self, id: &str, input: BookInput) -> Result<(), StoreError> {
        let fields = BookFields::try_from(input)?;

        let index = self.position(id).ok_or_else(|| not_found(id))?;
        let book = &mut self.books[index];

        book.name = fields.name;
        book.year = fields.year;
        book.author = fields.author;
        book.summary = fields.summary;
        book.publisher = fields.publisher;
        book.page_count = fields.page_count;
        book.read_page = fields.read_page;
        book.reading = fields.reading;
        book.updated_at = next_update_time(book.updated_at);

        tracing::debug!(book_id = %book.id, finished = book.finished(), "book updated");
        Ok(())
    }

    /// Remove the record `id`, keeping the order of the rest.
    pub fn delete_by_id(&mut self, id: &str) -> Result<(), StoreError> {
        let index = self.position(id).ok_or_else(|| not_found(id))?;
        let removed = self.books.remove(index);

        tracing::debug!(book_id = %removed.id, count = self.books.len(), "book deleted");
        Ok(())
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.books.iter().position(|book| book.id == *id)
    }
}

fn not_found(id: &str) -> StoreError {
    StoreError::NotFound(BookId::from(id.to_string()))
}

/// Current time, nudged forward so it is always later than `previous`.
fn next_update_time(previous: OffsetDateTime) -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    if now > previous {
        now
    } else {
        previous + Duration::nanoseconds(1)
    }
}
