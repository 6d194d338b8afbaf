//! Stateless search request handler with lazy one-time index restoration
//! (spec §4.6 / C6).

mod engine;
mod error;
mod request;
mod routes;
mod state;

pub use error::SearchApiError;
pub use request::{SearchRequest, SortBy, SortOrder};
pub use routes::build_router;
pub use state::AppState;
