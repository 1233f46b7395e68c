use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use time::OffsetDateTime;

/// Opaque identifier assigned to a book at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BookId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for BookId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

/// A book record held by the store.
///
/// `finished` is not stored; it is derived from `page_count` and `read_page`
/// whenever the record is read or serialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub name: String,
    pub year: i32,
    pub author: String,
    pub summary: String,
    pub publisher: String,
    pub page_count: u32,
    pub read_page: u32,
    pub reading: bool,
    pub inserted_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Book {
    /// Whether every page has been read
    pub fn finished(&self) -> bool {
        self.page_count == self.read_page
    }

    pub fn summary(&self) -> BookSummary {
        BookSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            publisher: self.publisher.clone(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BookRepr<'a> {
    id: &'a BookId,
    name: &'a str,
    year: i32,
    author: &'a str,
    summary: &'a str,
    publisher: &'a str,
    page_count: u32,
    read_page: u32,
    finished: bool,
    reading: bool,
    #[serde(with = "time::serde::rfc3339")]
    inserted_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    updated_at: OffsetDateTime,
}

impl Serialize for Book {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        BookRepr {
            id: &self.id,
            name: &self.name,
            year: self.year,
            author: &self.author,
            summary: &self.summary,
            publisher: &self.publisher,
            page_count: self.page_count,
            read_page: self.read_page,
            finished: self.finished(),
            reading: self.reading,
            inserted_at: self.inserted_at,
            updated_at: self.updated_at,
        }
        .serialize(serializer)
    }
}

/// Reduced view returned by listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookSummary {
    pub id: BookId,
    pub name: String,
    pub publisher: String,
}

/// Caller-supplied fields for create and update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInput {
    pub name: Option<String>,
    #[serde(default)]
    pub year: i32,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub page_count: u32,
    #[serde(default)]
    pub read_page: u32,
    #[serde(default)]
    pub reading: bool,
}

/// Raw list query parameters, as received.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookFilter {
    pub name: Option<String>,
    pub reading: Option<String>,
    pub finished: Option<String>,
}

impl BookFilter {
    /// Build a filter from raw query pairs; the first value of a repeated key
    /// wins and unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut filter = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "name" => &mut filter.name,
                "reading" => &mut filter.reading,
                "finished" => &mut filter.finished,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into());
            }
        }
        filter
    }

    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn by_reading(flag: impl Into<String>) -> Self {
        Self {
            reading: Some(flag.into()),
            ..Self::default()
        }
    }

    pub fn by_finished(flag: impl Into<String>) -> Self {
        Self {
            finished: Some(flag.into()),
            ..Self::default()
        }
    }

    /// `finished` as a boolean, when it is `"0"` or `"1"`
    pub fn finished_flag(&self) -> Option<bool> {
        self.finished.as_deref().and_then(parse_flag)
    }

    /// `reading` as a boolean, when it is `"0"` or `"1"`
    pub fn reading_flag(&self) -> Option<bool> {
        self.reading.as_deref().and_then(parse_flag)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}
