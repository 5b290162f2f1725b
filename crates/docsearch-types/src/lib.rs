//! # docsearch-types
//!
//! Shared domain types for the docsearch access layer.
//!
//! This crate defines the data structures every other crate speaks:
//! - `Document`: the typed record stored in and read back from the engine
//! - `Cursor` and `Page`: one page of search results plus the token for the next one
//! - `Settings`: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use docsearch_types::{Document, Page};
//!
//! let page = Page::empty();
//! assert!(page.documents.is_empty());
//! assert!(page.cursor.is_none());
//! ```

pub mod config;
pub mod document;
pub mod error;
pub mod page;

pub use config::Settings;
pub use document::Document;
pub use error::TypesError;
pub use page::{Cursor, Page};
