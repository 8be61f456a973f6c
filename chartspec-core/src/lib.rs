#[macro_use]
extern crate lazy_static;

pub mod compile;
pub mod editor;
pub mod layout;
pub mod plan;
pub mod spec;
pub mod synthesize;
pub mod theme;

pub use chartspec_common::error;
pub use chartspec_common::query;
