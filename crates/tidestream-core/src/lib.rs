pub mod abort;
pub mod config;
pub mod decoder;
pub mod error;
pub mod mode;
pub mod observer;
pub mod processor;
pub mod token;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::abort::AbortHandle;
    pub use crate::config::StreamOptions;
    pub use crate::error::{CancelReason, Result, StreamError};
    pub use crate::mode::DataType;
    pub use crate::observer::Observers;
    pub use crate::processor::ChunkProcessor;
    pub use crate::token::extract_token;
}
