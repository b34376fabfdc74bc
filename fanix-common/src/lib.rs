//! Basic types shared by fanix crates.

mod data;

pub use crate::data::Data;
