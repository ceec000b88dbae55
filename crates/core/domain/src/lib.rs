pub mod data;

pub use data::{DataPoint, FieldValue, RawMessage};
