// src/sheets/mod.rs

pub mod cache;
pub mod mappings;
pub mod parse;
pub mod source;

pub use cache::RowCache;
pub use source::SheetClient;
