//! Everything a run writes out after the search itself.
//!
//! # Submodules
//!
//! - [`history`]: Appends each completed search to a JSON history file
//! - [`text`]: Renders results, summary and answers for the terminal

pub mod history;
pub mod text;
