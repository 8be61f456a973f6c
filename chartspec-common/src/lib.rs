pub mod error;
pub mod escape;
pub mod query;

pub use serde_json;
