//! Redfish JSON Schema to OpenAPI converter
//!
//! This library converts a directory of Redfish JSON Schema files into
//! OpenAPI YAML documents plus the OpenAPI Service Document that
//! enumerates every routable path and its HTTP operations.
//!
//! The conversion has three phases per run:
//!
//! 1. per document, route bindings and action declarations are indexed
//!    into the URI and action caches, then the document is rewritten into
//!    OpenAPI form (term renames, nullable collapsing, reference
//!    reclassification);
//! 2. after all documents, the action cache is merged into the URI cache
//!    as synthetic `/Actions/<Name>` paths;
//! 3. the service document is synthesized from the finished cache.
//!
//! No failure during conversion is fatal. Every problem degrades to a
//! documented default and lands in the run's [`ConversionReport`], which
//! callers must treat as the authoritative error channel.
//!
//! # Example
//!
//! ```
//! use redfish_openapi::{Config, Converter};
//! use serde_json::json;
//!
//! let mut converter = Converter::new(Config::default(), std::path::Path::new("."));
//!
//! let document = json!({
//!     "$schema": "http://redfish.dmtf.org/schemas/v1/redfish-schema-v1.json",
//!     "copyright": "Copyright 2018 DMTF",
//!     "definitions": {
//!         "Reading": {
//!             "type": ["number", "null"],
//!             "readonly": true
//!         }
//!     }
//! });
//! let converted = converter.convert_document("Sensor.v1_0_0.json", document);
//!
//! let reading = &converted["components"]["schemas"]["Reading"];
//! assert_eq!(reading["type"], "number");
//! assert_eq!(reading["nullable"], true);
//! assert_eq!(reading["readOnly"], true);
//! ```

mod base;
mod config;
mod convert;
mod error;
mod indexer;
mod loader;
mod report;
mod resolver;
mod rewriter;
mod service_doc;
mod types;

pub use base::load_base_document;
pub use config::Config;
pub use convert::{Conversion, Converter};
pub use error::ConvertError;
pub use indexer::{
    merge_actions, scan_actions, scan_uri_info, ActionCache, ActionEntry, UriCache, UriEntry,
};
pub use loader::{collect_input_files, load_document, load_document_str};
pub use report::{ConversionReport, Diagnostic, Severity};
pub use resolver::{RefClass, Resolver};
pub use rewriter::{rewrite_document, rewrite_node};
pub use service_doc::{build_service_document, ERROR_SCHEMA_REF};
pub use types::{is_collection, is_versioned_filename, yaml_filename};

#[cfg(feature = "remote")]
pub use loader::fetch_document;
