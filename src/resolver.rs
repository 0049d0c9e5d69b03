//! External reference classification.
//!
//! The source dialect wraps a type in a union whose first branch references
//! the shared `idRef` definition to mean "this field holds a hyperlink to an
//! independently addressable resource". Such references must render as a
//! bare reference to the shared link type, while a same-named value type is
//! embedded by reference to its converted schema. Telling the two apart
//! requires inspecting the *referenced* definition, which may live in a
//! document outside the input set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::loader;
use crate::report::ConversionReport;
use crate::types::last_segment;

/// Classification of a cross-document reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefClass {
    /// A hyperlink to an independently addressable resource.
    Link,
    /// An embedded value of the referenced type.
    Value,
}

/// Obtains and inspects referenced documents to classify references.
///
/// Referenced documents are looked up in the input set first and fetched
/// over HTTP otherwise. Successful lookups are memoized for the run; a
/// failed lookup is retried the next time the document is referenced.
pub struct Resolver {
    input_dir: PathBuf,
    odata_schema: String,
    fetched: HashMap<String, Value>,
}

impl Resolver {
    pub fn new(input_dir: &Path, odata_schema: impl Into<String>) -> Self {
        Resolver {
            input_dir: input_dir.to_path_buf(),
            odata_schema: odata_schema.into(),
            fetched: HashMap::new(),
        }
    }

    /// The reference every link-type reference is rewritten to.
    pub fn link_target(&self) -> String {
        format!("{}#/components/schemas/idRef", self.odata_schema)
    }

    /// Classify a cross-document reference as link or value.
    ///
    /// Any failure along the way (document unobtainable, named definition
    /// absent) is reported and defaults to `RefClass::Value`; a plain value
    /// reference is the conservative reading.
    pub fn classify(
        &mut self,
        reference: &str,
        file: &str,
        report: &mut ConversionReport,
    ) -> RefClass {
        let url_part = reference.split('#').next().unwrap_or(reference);
        let ref_file = last_segment(url_part).to_string();
        let type_name = last_segment(reference).to_string();

        let definition = self
            .document_for(url_part, &ref_file)
            .and_then(|doc| doc.get("definitions"))
            .and_then(|defs| defs.get(&type_name));

        match definition {
            None => {
                report.error("E005", file, "", format!("could not get {}", reference));
                RefClass::Value
            }
            Some(definition) if is_id_ref_union(definition) => RefClass::Link,
            Some(_) => RefClass::Value,
        }
    }

    fn document_for(&mut self, url_part: &str, ref_file: &str) -> Option<&Value> {
        if !self.fetched.contains_key(ref_file) {
            let document = self.obtain(url_part, ref_file)?;
            self.fetched.insert(ref_file.to_string(), document);
        }
        self.fetched.get(ref_file)
    }

    fn obtain(&self, url_part: &str, ref_file: &str) -> Option<Value> {
        let local = self.input_dir.join(ref_file);
        if local.is_file() {
            return loader::load_document(&local).ok();
        }

        #[cfg(feature = "remote")]
        {
            loader::fetch_document(url_part).ok()
        }
        #[cfg(not(feature = "remote"))]
        {
            let _ = url_part;
            None
        }
    }
}

/// Returns true if a definition is the link idiom: a union whose first
/// branch references the shared `idRef` type.
fn is_id_ref_union(definition: &Value) -> bool {
    definition
        .get("anyOf")
        .and_then(Value::as_array)
        .and_then(|branches| branches.first())
        .and_then(|branch| branch.get("$ref"))
        .and_then(Value::as_str)
        .is_some_and(|reference| reference.contains("/definitions/idRef"))
}
