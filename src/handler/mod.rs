//! Token handler: the refresh loop, its channel pair and the call-style
//! retriever built on top of it.

pub mod context;
pub mod handler;
pub mod retriever;

pub use context::Context;
pub use handler::{ExitChannel, ResultChannel, TokenChannels, TokenHandler, TokenResult};
pub use retriever::{RetrieveFuture, RetrieveTokenFn, TokenRetriever};
