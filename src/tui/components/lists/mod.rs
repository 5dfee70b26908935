//! Server-backed paginated lists.
//!
//! [`pagination`] is the pure offset/limit reducer, [`entity_list`] drives it
//! from an asynchronous search and [`pagination_bar`] renders the range text
//! and navigation controls shown above and below every list.

pub mod entity_list;
pub mod pagination;
pub mod pagination_bar;

pub use entity_list::*;
pub use pagination::*;
pub use pagination_bar::*;
