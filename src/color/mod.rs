pub mod error;
pub mod rgb;
pub mod scale;
