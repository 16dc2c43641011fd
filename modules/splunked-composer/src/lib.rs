//! SPL Composer: turns a selection of catalog search objects into a query
//! string and an explanation. Pure and synchronous; the caller supplies the
//! catalog snapshot.

pub mod compose;
mod explain;
pub mod fragment;
pub mod request;

pub use compose::{generate, CatalogIndex};
pub use explain::SEARCH_ALL_EVENTS;
pub use request::{Components, Composition, CompositionRequest};
