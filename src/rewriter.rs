//! Schema rewriting - transforms Redfish JSON Schema structures into their
//! OpenAPI form.
//!
//! The rewrite is a recursive walk over the parsed document: every mapping
//! node has the dialect-specific term rewrites applied in a fixed order,
//! then the walk descends into nested mappings and into mappings inside
//! sequences. Traversal follows document structure only; reference values
//! are rewritten as strings and never followed, so cyclic references cannot
//! cause traversal cycles.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::report::ConversionReport;
use crate::resolver::{RefClass, Resolver};
use crate::types::{is_collection, LINK_EXEMPT_TYPES, ONE_FOR_ONE_REPLACEMENTS, REMOVED_TERMS};

/// Cross-document references look like `.../<File>.json#/definitions/<Type>`.
static EXTERNAL_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+/([^/]+)\.json#/definitions/([^/]+)$").expect("valid regex"));

/// Convert a whole document in place.
///
/// Strips the top-level dialect identity markers, renames the copyright
/// field, moves `definitions` under `components`/`schemas`, then applies the
/// node rewrite to the document root.
pub fn rewrite_document(
    document: &mut Value,
    resolver: &mut Resolver,
    report: &mut ConversionReport,
    file: &str,
) {
    if let Some(map) = document.as_object_mut() {
        map.shift_remove("$schema");
        map.shift_remove("$ref");
        map.shift_remove("$id");

        if let Some(copyright) = map.shift_remove("copyright") {
            map.insert("x-copyright".to_string(), copyright);
        }
        if let Some(definitions) = map.shift_remove("definitions") {
            map.insert("components".to_string(), json!({ "schemas": definitions }));
        }
    }

    rewrite_node(document, resolver, report, file);
}

/// Rewrite one node and everything below it in place.
///
/// Non-mapping nodes are left untouched. Re-running on already-rewritten
/// structures is a no-op: every rewrite triggers on source-dialect keys
/// that the rewrite itself eliminates.
pub fn rewrite_node(
    node: &mut Value,
    resolver: &mut Resolver,
    report: &mut ConversionReport,
    file: &str,
) {
    let Some(map) = node.as_object_mut() else {
        return;
    };

    rename_vendor_terms(map);
    remove_dropped_terms(map);
    rename_read_only(map);
    rewrite_deprecated(map);
    rewrite_pattern_properties(map);
    collapse_nullable_type(map);
    collapse_nullable_union(map);
    unwrap_collections(map);
    rewrite_reference(map, resolver, report, file);

    for (_key, child) in map.iter_mut() {
        match child {
            Value::Object(_) => rewrite_node(child, resolver, report, file),
            Value::Array(items) => {
                for item in items.iter_mut() {
                    if item.is_object() {
                        rewrite_node(item, resolver, report, file);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Perform one for one replacements (meaning `term` becomes `x-term`).
fn rename_vendor_terms(map: &mut Map<String, Value>) {
    for term in ONE_FOR_ONE_REPLACEMENTS {
        if let Some(value) = map.shift_remove(*term) {
            map.insert(format!("x-{}", term), value);
        }
    }
}

fn remove_dropped_terms(map: &mut Map<String, Value>) {
    for term in REMOVED_TERMS {
        map.shift_remove(*term);
    }
}

/// The "o" is capitalized in OpenAPI.
fn rename_read_only(map: &mut Map<String, Value>) {
    if let Some(value) = map.shift_remove("readonly") {
        map.insert("readOnly".to_string(), value);
    }
}

/// `deprecated` is a built in term, but the reason text must not be lost.
///
/// Only the source form (free text) triggers the rewrite; the boolean left
/// behind by a previous rewrite is recognized as already converted.
fn rewrite_deprecated(map: &mut Map<String, Value>) {
    if !map.get("deprecated").is_some_and(Value::is_string) {
        return;
    }
    if let Some(reason) = map.shift_remove("deprecated") {
        map.insert("x-deprecatedReason".to_string(), reason);
        map.insert("deprecated".to_string(), Value::Bool(true));
    }
}

/// `patternProperties` is not in OpenAPI; the inner `type` markers are
/// redundant in the target form and dropped from each pattern's value.
fn rewrite_pattern_properties(map: &mut Map<String, Value>) {
    let Some(mut patterns) = map.shift_remove("patternProperties") else {
        return;
    };
    if let Some(patterns) = patterns.as_object_mut() {
        for (_pattern, constraint) in patterns.iter_mut() {
            if let Some(constraint) = constraint.as_object_mut() {
                constraint.shift_remove("type");
            }
        }
    }
    map.insert("x-patternProperties".to_string(), patterns);
}

/// OpenAPI doesn't allow `type` to be an array; in the Redfish usage this
/// expresses nullability, so keep the non-null alternative and flag it.
fn collapse_nullable_type(map: &mut Map<String, Value>) {
    let single = match map.get("type") {
        Some(Value::Array(alternatives)) => alternatives
            .iter()
            .find(|t| t.as_str() != Some("null"))
            .or_else(|| alternatives.first())
            .cloned(),
        _ => None,
    };
    if let Some(single) = single {
        map.insert("type".to_string(), single);
        map.insert("nullable".to_string(), Value::Bool(true));
    }
}

/// The reference form of nullability: an `anyOf` pairing one reference with
/// the null type collapses to the bare reference plus the nullable flag.
fn collapse_nullable_union(map: &mut Map<String, Value>) {
    let reference = {
        let Some(branches) = map.get("anyOf").and_then(Value::as_array) else {
            return;
        };
        let null_marker = json!({ "type": "null" });
        let has_null = branches.iter().any(|branch| *branch == null_marker);
        let non_null: Vec<&Value> = branches
            .iter()
            .filter(|branch| **branch != null_marker)
            .collect();
        match non_null.as_slice() {
            [only] if has_null => only.get("$ref").cloned(),
            _ => None,
        }
    };

    if let Some(reference) = reference {
        map.insert("$ref".to_string(), reference);
        map.shift_remove("anyOf");
        map.insert("nullable".to_string(), Value::Bool(true));
    }
}

/// Resource collections drop their `anyOf` wrapper: the second branch is
/// the payload schema, the first an alternate link form with no OpenAPI
/// rendering.
fn unwrap_collections(map: &mut Map<String, Value>) {
    for (_name, child) in map.iter_mut() {
        if !is_collection(child) {
            continue;
        }
        let second = child
            .get("anyOf")
            .and_then(Value::as_array)
            .and_then(|branches| branches.get(1))
            .cloned();
        if let Some(second) = second {
            *child = second;
        }
    }
}

/// Rewrite `$ref` to use the form `/components/schemas/` instead of
/// `/definitions/`.
fn rewrite_reference(
    map: &mut Map<String, Value>,
    resolver: &mut Resolver,
    report: &mut ConversionReport,
    file: &str,
) {
    let Some(reference) = map.get("$ref").and_then(Value::as_str) else {
        return;
    };

    let rewritten = if reference.starts_with('#') {
        reference.replacen("#/definitions/", "#/components/schemas/", 1)
    } else {
        rewrite_external_reference(reference, resolver, report, file)
    };
    map.insert("$ref".to_string(), Value::String(rewritten));
}

/// Rewrite a reference into another document.
///
/// When the referenced type name matches the file stem this might be a
/// resource link; the resolver inspects the referenced definition to decide.
/// Links collapse to the shared `idRef` location, everything else keeps its
/// target with the extension and container segments converted.
fn rewrite_external_reference(
    reference: &str,
    resolver: &mut Resolver,
    report: &mut ConversionReport,
    file: &str,
) -> String {
    if let Some(caps) = EXTERNAL_REF.captures(reference) {
        let stem = &caps[1];
        let type_name = &caps[2];
        if stem == type_name
            && !LINK_EXEMPT_TYPES.contains(&stem)
            && resolver.classify(reference, file, report) == RefClass::Link
        {
            return resolver.link_target();
        }
    }
    reference.replacen(".json#/definitions/", ".yaml#/components/schemas/", 1)
}
