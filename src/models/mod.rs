//! Domain models

pub mod book;
pub mod borrower;
pub mod lending;
