pub mod cache;
pub mod columns;
pub mod coordinates;
pub mod dataset;
pub mod dates;
pub mod error;
pub mod loader;
pub(crate) mod source;
