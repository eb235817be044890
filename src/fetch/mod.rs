// src/fetch/mod.rs
//
// Getting rows out of a live site: submit the search, read the table,
// walk the pages.

pub mod extract;
pub mod navigate;
pub mod paginate;

pub use extract::PageExtractor;
pub use navigate::{Navigation, NavigationController};
pub use paginate::{
    advance_for, IndexAdvance, LinkTextAdvance, PageAdvance, PaginationDriver, PaginationState,
    Phase,
};
