//! Seeding the caches from a previously generated service document.
//!
//! When extending an existing API description the prior document is parsed
//! back into the same cache shape the indexer produces, so new input layers
//! on top without clobbering earlier entries. A path with a GET operation
//! is a resource; a path without one is an action.

use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::Value;

use crate::indexer::{ActionCache, ActionEntry, UriCache, UriEntry};
use crate::report::ConversionReport;
use crate::service_doc::ERROR_SCHEMA_REF;
use crate::types::last_segment;

/// Versioned schema file embedded in a reference, e.g. `Chassis.v1_10_0.yaml`.
static VERSIONED_YAML: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9]+\.v\d+_\d+_\d+\.yaml)").expect("valid regex"));

const GET_REF: &str = "/get/responses/200/content/application~1json/schema/$ref";
const POST_BODY_REF: &str = "/post/requestBody/content/application~1json/schema/$ref";
const POST_RESPONSE_REF: &str = "/post/responses/200/content/application~1json/schema/$ref";

/// Initialize the caches from an existing service document.
///
/// Failure to open or parse the base document leaves the caches unseeded;
/// the run continues as if no base had been given.
pub fn load_base_document(
    path: &Path,
    uris: &mut UriCache,
    actions: &mut ActionCache,
    extensions: &IndexMap<String, Vec<String>>,
    report: &mut ConversionReport,
) {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            report.warning("W001", "", "", format!("could not open {}: {}", path.display(), err));
            return;
        }
    };

    let document: Value = match serde_yaml::from_str(&content) {
        Ok(document) => document,
        Err(err) => {
            report.warning("W001", "", "", format!("could not parse {}: {}", path.display(), err));
            return;
        }
    };

    let Some(paths) = document.get("paths").and_then(Value::as_object) else {
        report.warning("W001", "", "", format!("{} carries no paths", path.display()));
        return;
    };

    for (uri, item) in paths {
        if item.get("get").is_some() {
            load_resource_path(uri, item, uris, extensions, report);
        } else {
            load_action_path(uri, item, actions, report);
        }
    }
}

fn load_resource_path(
    uri: &str,
    item: &Value,
    uris: &mut UriCache,
    extensions: &IndexMap<String, Vec<String>>,
    report: &mut ConversionReport,
) {
    let Some(reference) = item.pointer(GET_REF).and_then(Value::as_str) else {
        report.warning("W001", "", uri, "base path has no GET response reference");
        return;
    };

    let mut entry = UriEntry {
        reference: reference.to_string(),
        request_body: reference.to_string(),
        insertable: false,
        updatable: item.get("patch").is_some(),
        deletable: item.get("delete").is_some(),
        action: false,
        action_response: None,
    };
    if item.get("post").is_some() {
        entry.insertable = true;
        if let Some(body) = item.pointer(POST_BODY_REF).and_then(Value::as_str) {
            entry.request_body = body.to_string();
        }
    }

    let type_name = last_segment(reference).to_string();
    uris.insert(uri.to_string(), entry.clone());

    // Registered aliases receive a copy of the canonical entry.
    if let Some(extra_uris) = extensions.get(&type_name) {
        for extra in extra_uris {
            uris.insert(extra.clone(), entry.clone());
        }
    }
}

fn load_action_path(
    uri: &str,
    item: &Value,
    actions: &mut ActionCache,
    report: &mut ConversionReport,
) {
    let Some(reference) = item.pointer(POST_BODY_REF).and_then(Value::as_str) else {
        report.warning("W001", "", uri, "base action has no request body reference");
        return;
    };
    let Some(response) = item.pointer(POST_RESPONSE_REF).and_then(Value::as_str) else {
        report.warning("W001", "", uri, "base action has no 200 response reference");
        return;
    };
    let Some(captures) = VERSIONED_YAML.captures(reference) else {
        report.warning(
            "W001",
            "",
            uri,
            format!("cannot locate source document in {}", reference),
        );
        return;
    };

    let yaml_file = captures[1].to_string();
    let action_name = format!("#{}", last_segment(uri));
    let action_response = if response == ERROR_SCHEMA_REF {
        None
    } else {
        Some(local_fragment(response))
    };

    actions.entry(yaml_file).or_default().insert(
        action_name,
        ActionEntry {
            reference: local_fragment(reference),
            action_response,
        },
    );
}

/// Reduce a reference to its document-local `#/...` fragment.
fn local_fragment(reference: &str) -> String {
    format!("#{}", reference.rsplit('#').next().unwrap_or(""))
}
