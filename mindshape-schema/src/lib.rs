//! # mindshape-schema
//!
//! Schema contracts for structured model output.
//!
//! A [`Contract`] describes the shape the caller expects, either derived
//! from a Rust type with `schemars` or written by hand. [`translate`] turns
//! it into a [`ContractSpec`], which holds the provider-ready JSON Schema and
//! a compiled validator producing field-level errors.
//!
//! ## Example
//!
//! ```rust
//! use mindshape_schema::{translate, Contract};
//! use schemars::JsonSchema;
//! use serde::Deserialize;
//! use serde_json::json;
//!
//! #[derive(Deserialize, JsonSchema)]
//! struct Hat {
//!     color: String,
//!     #[schemars(range(min = 1, max = 10))]
//!     size: u8,
//! }
//!
//! let spec = translate(&Contract::<Hat>::of()).unwrap();
//! assert!(spec.validate(&json!({"color": "red", "size": 3})).is_ok());
//!
//! let errors = spec.validate(&json!({"color": "red", "size": 30})).unwrap_err();
//! assert_eq!(errors[0].path, "/size");
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod builder;
pub mod contract;
pub mod definition;
pub mod error;
pub mod transform;

pub use builder::{PropertySchema, SchemaBuilder};
pub use contract::{translate, Contract, ContractSpec};
pub use definition::ObjectJsonSchema;
pub use error::SchemaError;
pub use transform::{ensure_object_root, strip_metadata};

// Re-exported so callers can derive schemas without a direct dependency.
pub use schemars::{self, JsonSchema};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        translate, Contract, ContractSpec, JsonSchema, ObjectJsonSchema, PropertySchema,
        SchemaBuilder,
    };
}
