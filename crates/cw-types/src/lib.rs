//! # cw-types
//!
//! Core types for configuration search: typed schemas, validated
//! configurations, aggregatable score values and the error taxonomy.

pub mod config;
pub mod errors;
pub mod schema;
pub mod score;
pub mod value;

pub use config::*;
pub use errors::*;
pub use schema::*;
pub use score::*;
pub use value::*;
