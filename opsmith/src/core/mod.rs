//! Pure, deterministic session logic: parsing, message construction, and
//! mode derivation. No I/O lives here.

pub mod blocks;
pub mod catalog;
pub mod message;
pub mod types;
