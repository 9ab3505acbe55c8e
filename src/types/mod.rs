//! Column types that need a custom storage encoding.

pub mod uuid_array;

pub use uuid_array::{RawValue, UuidArray};
