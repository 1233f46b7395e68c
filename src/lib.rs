//! Bookshelf Application Library
//!
//! In-memory book records served over HTTP through the bookshelf kernel.

pub mod modules;
pub mod utils;

pub use modules::books::{
    models::{Book, BookFilter, BookId, BookInput, BookSummary},
    store::{BookStore, StoreError, ValidationError},
};
pub use modules::register_all;
