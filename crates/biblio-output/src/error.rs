//! Error types for the output encoders.
//!
//! Almost everything recoverable during encoding goes through the shared
//! warnings channel instead; only caller mistakes surface here.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A selective encode asked for a key the store does not hold.
    #[error("unknown entry key '{0}'")]
    UnknownKey(String),
}
