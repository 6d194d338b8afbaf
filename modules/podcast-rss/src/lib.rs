//! RSS retrieval stage: discover new episodes, download audio, maintain
//! the episode manifest (spec §4.3 / C3).

mod feed;
mod retriever;
mod retry;

pub use retriever::{retrieve, RetrieveOutcome};
