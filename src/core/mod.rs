//! Core data handling: QA knowledge-base source files.

pub mod qafile;

pub use qafile::{parse as parse_qa_file, QaPair};
