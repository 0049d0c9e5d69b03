//! Core terms and structural predicates for Redfish schema conversion.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Terms that have a simple one to one conversion (`term` becomes `x-term`).
pub const ONE_FOR_ONE_REPLACEMENTS: &[&str] = &[
    "longDescription",
    "enumDescriptions",
    "enumLongDescriptions",
    "enumDeprecated",
    "enumVersionDeprecated",
    "enumVersionAdded",
    "units",
    "requiredOnCreate",
    "owningEntity",
    "autoExpand",
    "release",
    "versionDeprecated",
    "versionAdded",
    "filter",
    "excerpt",
    "excerptCopy",
    "excerptCopyOnly",
];

/// Terms that are removed from the converted file entirely.
pub const REMOVED_TERMS: &[&str] = &[
    "insertable",
    "updatable",
    "deletable",
    "uris",
    "parameters",
    "requiredParameter",
    "actionResponse",
];

/// Type names exempt from the "same name as the schema file" link heuristic.
///
/// `Redundancy` is defined in a file of the same name but is embedded by
/// value, never linked.
pub const LINK_EXEMPT_TYPES: &[&str] = &["Redundancy"];

/// HTTP responses emitted per operation kind.
pub const GET_RESPONSES: &[u16] = &[200];
pub const CREATE_RESPONSES: &[u16] = &[201, 202, 204];
pub const PATCH_RESPONSES: &[u16] = &[200, 202, 204];
pub const PUT_RESPONSES: &[u16] = &[200, 202, 204];
pub const DELETE_RESPONSES: &[u16] = &[200, 202, 204];
pub const ACTION_RESPONSES: &[u16] = &[200, 202, 204];

/// Versioned schema file names take the form `Name.vX_Y_Z.json`.
static VERSIONED_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v\d+_\d+_\d+\.json$").expect("valid regex"));

/// Returns true if a JSON Schema file name carries a `vX_Y_Z` version.
pub fn is_versioned_filename(name: &str) -> bool {
    VERSIONED_FILE.is_match(name)
}

/// Maps an input `.json` file name to its output `.yaml` name.
pub fn yaml_filename(json_filename: &str) -> String {
    json_filename.replacen(".json", ".yaml", 1)
}

/// Returns the trailing segment of a `/`-separated reference or path.
pub fn last_segment(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Determines if a definition structure describes a resource collection.
///
/// Collections are a two-branch `anyOf` whose second branch is an object
/// with a `Members` property holding the item references.
pub fn is_collection(definition: &Value) -> bool {
    let Some(branches) = definition.get("anyOf").and_then(Value::as_array) else {
        return false;
    };
    if branches.len() != 2 {
        return false;
    }
    branches[1]
        .get("properties")
        .and_then(Value::as_object)
        .is_some_and(|props| props.contains_key("Members"))
}
