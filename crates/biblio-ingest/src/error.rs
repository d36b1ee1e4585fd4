//! Error types for source mapping.
//!
//! Only the fatal class lives here: a source document that cannot be parsed
//! aborts the whole run. Everything recoverable (duplicate keys, missing
//! identities, bad dates, occupied destinations) goes to the warnings
//! channel instead.

use thiserror::Error;

/// Result type alias for biblio-ingest operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Fatal errors during source mapping.
#[derive(Debug, Error)]
pub enum Error {
    /// The source document failed to parse.
    #[error("source document failed to parse: {0}")]
    Xml(#[from] biblio_xml::Error),

    /// The user mapping configuration failed to parse.
    #[error("user mapping configuration failed to parse: {0}")]
    UserMap(#[from] serde_json::Error),
}
