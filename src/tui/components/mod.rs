//! Reusable widgets shared by the pages

pub mod form;
pub mod lists;
