//! URI and action indexing.
//!
//! Two-pass metadata extraction that drives service document synthesis.
//! Pass 1 runs per document before rewriting: route bindings and verb
//! permissions feed the URI cache, action definitions feed the action
//! cache. Pass 2 runs once after every document has been processed and
//! merges the action cache into the URI cache as synthetic
//! `/Actions/<Name>` sub-paths. Resource entries are never mutated after
//! pass 1; pass 2 only adds.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde_json::{json, Map, Value};

use crate::report::ConversionReport;
use crate::types::{is_collection, last_segment, yaml_filename};

/// The one known case where a collection resource and its respective
/// singular resource are owned by two different groups.
const SWORDFISH_SCHEMA_BASE: &str = "http://redfish.dmtf.org/schemas/swordfish/v1";

/// Captures the directory part of a `.../<Name>.json` member reference.
static MEMBERS_BASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)/\w+\.json").expect("valid regex"));

/// One routable path and the semantics needed to describe its operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriEntry {
    /// Canonical schema reference for GET responses.
    pub reference: String,
    /// Reference for request bodies. Matches `reference` except for
    /// collections, where bodies carry the member type.
    pub request_body: String,
    pub insertable: bool,
    pub updatable: bool,
    pub deletable: bool,
    /// True for synthetic `/Actions/<Name>` paths.
    pub action: bool,
    /// Distinct response schema for an action; `None` means the generic
    /// error payload doubles as the success body.
    pub action_response: Option<String>,
}

/// One action declared by a resource document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEntry {
    /// Document-local reference to the synthesized request body type.
    pub reference: String,
    /// Document-local reference to a distinct response type, if declared.
    pub action_response: Option<String>,
}

/// Path template -> entry, in registration order.
pub type UriCache = IndexMap<String, UriEntry>;

/// Target file name -> action name -> entry.
pub type ActionCache = IndexMap<String, IndexMap<String, ActionEntry>>;

/// Pass 1a: register one URI cache entry per route binding declared by the
/// document's definitions.
///
/// A definition missing a verb-permission term gets the permission denied
/// and a diagnostic; a definition without a usable reference shape has its
/// route bindings skipped entirely.
pub fn scan_uri_info(
    doc: &Value,
    filename: &str,
    uris: &mut UriCache,
    report: &mut ConversionReport,
) {
    let Some(definitions) = doc.get("definitions").and_then(Value::as_object) else {
        return;
    };

    for (def_name, definition) in definitions {
        let Some(bindings) = definition.get("uris").and_then(Value::as_array) else {
            continue;
        };

        let insertable = verb_flag(definition, "insertable", def_name, filename, report);
        let updatable = verb_flag(definition, "updatable", def_name, filename, report);
        let deletable = verb_flag(definition, "deletable", def_name, filename, report);

        let Some((reference, request_body)) = canonical_references(def_name, definition) else {
            report.error(
                "E003",
                filename,
                format!("/definitions/{}", def_name),
                format!("no usable anyOf reference found for {}", def_name),
            );
            continue;
        };

        for uri in bindings.iter().filter_map(Value::as_str) {
            uris.insert(
                uri.to_string(),
                UriEntry {
                    reference: reference.clone(),
                    request_body: request_body.clone(),
                    insertable,
                    updatable,
                    deletable,
                    action: false,
                    action_response: None,
                },
            );
        }
    }
}

fn verb_flag(
    definition: &Value,
    term: &str,
    def_name: &str,
    filename: &str,
    report: &mut ConversionReport,
) -> bool {
    match definition.get(term) {
        Some(value) => value.as_bool().unwrap_or(false),
        None => {
            report.error(
                "E002",
                filename,
                format!("/definitions/{}", def_name),
                format!("no {} term found for {}", term, def_name),
            );
            false
        }
    }
}

/// Compute the canonical GET-response reference and request-body reference
/// for a route-bound definition.
///
/// Collections derive both from the `Members` item reference: the GET
/// response is the collection schema living next to the member's document,
/// the request body is the member type itself.
fn canonical_references(def_name: &str, definition: &Value) -> Option<(String, String)> {
    if is_collection(definition) {
        let members_ref = definition
            .pointer("/anyOf/1/properties/Members/items/$ref")?
            .as_str()?;
        let base = if def_name == "DriveCollection" {
            SWORDFISH_SCHEMA_BASE.to_string()
        } else {
            MEMBERS_BASE.captures(members_ref)?.get(1)?.as_str().to_string()
        };
        let reference = format!("{}/{}.yaml#/components/schemas/{}", base, def_name, def_name);
        let request_body =
            members_ref.replacen(".json#/definitions/", ".yaml#/components/schemas/", 1);
        Some((reference, request_body))
    } else {
        let reference = definition
            .get("anyOf")?
            .as_array()?
            .last()?
            .get("$ref")?
            .as_str()?
            .replacen(".json#/definitions/", ".yaml#/components/schemas/", 1);
        Some((reference.clone(), reference))
    }
}

/// Pass 1b: extract the document's action definitions.
///
/// For every action under the root resource's Actions container this
/// synthesizes a `<Name>RequestBody` definition from the action's declared
/// parameters and records the action keyed by the document's target file
/// name. Any structural failure discards the whole document's actions:
/// neither cache entries nor synthesized definitions are committed.
pub fn scan_actions(
    doc: &mut Value,
    filename: &str,
    actions: &mut ActionCache,
    report: &mut ConversionReport,
) {
    // The top-level $ref names the root resource type; its absence means
    // this document does not describe a resource.
    let Some(resource_name) = doc
        .get("$ref")
        .and_then(Value::as_str)
        .map(|r| last_segment(r).to_string())
    else {
        return;
    };

    // Resources without an Actions property have nothing to register.
    let Some(container_name) = doc
        .pointer(&format!("/definitions/{}/properties/Actions/$ref", resource_name))
        .and_then(Value::as_str)
        .map(|r| last_segment(r).to_string())
    else {
        return;
    };

    match collect_actions(doc, &container_name) {
        Ok((request_bodies, staged)) => {
            if let Some(definitions) = doc.get_mut("definitions").and_then(Value::as_object_mut) {
                for (name, body) in request_bodies {
                    definitions.insert(name, body);
                }
            }
            actions
                .entry(yaml_filename(filename))
                .or_default()
                .extend(staged);
        }
        Err(()) => {
            report.error("E004", filename, "", format!("malformed action found in {}", filename));
        }
    }
}

type StagedActions = (Vec<(String, Value)>, IndexMap<String, ActionEntry>);

fn collect_actions(doc: &Value, container_name: &str) -> Result<StagedActions, ()> {
    let definitions = doc.get("definitions").and_then(Value::as_object).ok_or(())?;
    let action_props = definitions
        .get(container_name)
        .and_then(|c| c.get("properties"))
        .and_then(Value::as_object)
        .ok_or(())?;

    let mut request_bodies = Vec::new();
    let mut staged = IndexMap::new();

    for (action_name, action_prop) in action_props {
        if action_name == "Oem" {
            continue;
        }

        let action_def_name = action_prop
            .get("$ref")
            .and_then(Value::as_str)
            .map(last_segment)
            .ok_or(())?;
        let action_def = definitions.get(action_def_name).ok_or(())?;

        let description = action_def.get("description").ok_or(())?.clone();
        let long_description = action_def.get("longDescription").ok_or(())?.clone();
        let parameters = action_def
            .get("parameters")
            .and_then(Value::as_object)
            .ok_or(())?;

        // The request body type carries the action's parameters as
        // ordinary properties, with the mandatory ones marked required.
        let mut body = Map::new();
        body.insert("type".to_string(), json!("object"));
        body.insert("additionalProperties".to_string(), json!(false));
        body.insert("description".to_string(), description);
        body.insert("longDescription".to_string(), long_description);
        body.insert("properties".to_string(), Value::Object(parameters.clone()));

        let mut required: Vec<&String> = parameters
            .iter()
            .filter(|(_, parameter)| parameter.get("requiredParameter").is_some())
            .map(|(name, _)| name)
            .collect();
        required.sort();
        if !required.is_empty() {
            body.insert("required".to_string(), json!(required));
        }

        let action_response = match action_def.get("actionResponse") {
            None => None,
            Some(response) => {
                let target = response.get("$ref").and_then(Value::as_str).ok_or(())?;
                Some(format!("#/components/schemas/{}", last_segment(target)))
            }
        };

        request_bodies.push((
            format!("{}RequestBody", action_def_name),
            Value::Object(body),
        ));
        staged.insert(
            action_name.clone(),
            ActionEntry {
                reference: format!("#/components/schemas/{}RequestBody", action_def_name),
                action_response,
            },
        );
    }

    Ok((request_bodies, staged))
}

/// Pass 2: attach every action to the resource paths whose canonical
/// reference originates from the action's document.
pub fn merge_actions(uris: &mut UriCache, actions: &ActionCache) {
    let mut action_entries = UriCache::new();

    for (action_file, file_actions) in actions {
        let needle = format!("/{}", action_file);
        for (uri, entry) in uris.iter() {
            if !entry.reference.contains(&needle) {
                continue;
            }
            let document_part = entry.reference.split('#').next().unwrap_or("");
            for (action_name, action) in file_actions {
                let local_name = action_name.strip_prefix('#').unwrap_or(action_name);
                let action_uri = format!("{}/Actions/{}", uri, local_name);
                action_entries.insert(
                    action_uri,
                    UriEntry {
                        reference: format!("{}{}", document_part, action.reference),
                        request_body: format!("{}{}", document_part, action.reference),
                        insertable: false,
                        updatable: false,
                        deletable: false,
                        action: true,
                        action_response: action
                            .action_response
                            .as_ref()
                            .map(|response| format!("{}{}", document_part, response)),
                    },
                );
            }
        }
    }

    uris.extend(action_entries);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chassis_doc() -> Value {
        json!({
            "$schema": "http://redfish.dmtf.org/schemas/v1/redfish-schema-v1.json",
            "$ref": "#/definitions/Chassis",
            "definitions": {
                "Chassis": {
                    "type": "object",
                    "insertable": false,
                    "updatable": true,
                    "deletable": false,
                    "uris": [
                        "/redfish/v1/Chassis/{ChassisId}"
                    ],
                    "anyOf": [
                        { "$ref": "http://redfish.dmtf.org/schemas/v1/odata-v4.json#/definitions/idRef" },
                        { "$ref": "http://redfish.dmtf.org/schemas/v1/Chassis.v1_10_0.json#/definitions/Chassis" }
                    ]
                }
            }
        })
    }

    #[test]
    fn singular_resource_registers_one_entry_per_uri() {
        let mut doc = chassis_doc();
        doc["definitions"]["Chassis"]["uris"] = json!([
            "/redfish/v1/Chassis/{ChassisId}",
            "/redfish/v1/CompositionService/ResourceBlocks/{ResourceBlockId}/Chassis/{ChassisId}"
        ]);

        let mut uris = UriCache::new();
        let mut report = ConversionReport::new();
        scan_uri_info(&doc, "Chassis.v1_10_0.json", &mut uris, &mut report);

        assert_eq!(uris.len(), 2);
        let expected =
            "http://redfish.dmtf.org/schemas/v1/Chassis.v1_10_0.yaml#/components/schemas/Chassis";
        for (_, entry) in uris.iter() {
            assert_eq!(entry.reference, expected);
            assert_eq!(entry.request_body, expected);
            assert!(!entry.insertable);
            assert!(entry.updatable);
            assert!(!entry.deletable);
            assert!(!entry.action);
        }
        assert!(report.is_ok());
    }

    #[test]
    fn collection_request_body_is_member_type() {
        let doc = json!({
            "definitions": {
                "ChassisCollection": {
                    "insertable": true,
                    "updatable": false,
                    "deletable": false,
                    "uris": ["/redfish/v1/Chassis"],
                    "anyOf": [
                        { "$ref": "http://redfish.dmtf.org/schemas/v1/odata-v4.json#/definitions/idRef" },
                        {
                            "type": "object",
                            "properties": {
                                "Members": {
                                    "type": "array",
                                    "items": { "$ref": "http://redfish.dmtf.org/schemas/v1/Chassis.json#/definitions/Chassis" }
                                }
                            }
                        }
                    ]
                }
            }
        });

        let mut uris = UriCache::new();
        let mut report = ConversionReport::new();
        scan_uri_info(&doc, "ChassisCollection.json", &mut uris, &mut report);

        let entry = &uris["/redfish/v1/Chassis"];
        assert_eq!(
            entry.reference,
            "http://redfish.dmtf.org/schemas/v1/ChassisCollection.yaml#/components/schemas/ChassisCollection"
        );
        assert_eq!(
            entry.request_body,
            "http://redfish.dmtf.org/schemas/v1/Chassis.yaml#/components/schemas/Chassis"
        );
        assert!(entry.insertable);
    }

    #[test]
    fn drive_collection_uses_swordfish_base() {
        let doc = json!({
            "definitions": {
                "DriveCollection": {
                    "insertable": false,
                    "updatable": false,
                    "deletable": false,
                    "uris": ["/redfish/v1/Chassis/{ChassisId}/Drives"],
                    "anyOf": [
                        { "$ref": "http://redfish.dmtf.org/schemas/v1/odata-v4.json#/definitions/idRef" },
                        {
                            "type": "object",
                            "properties": {
                                "Members": {
                                    "type": "array",
                                    "items": { "$ref": "http://redfish.dmtf.org/schemas/v1/Drive.json#/definitions/Drive" }
                                }
                            }
                        }
                    ]
                }
            }
        });

        let mut uris = UriCache::new();
        let mut report = ConversionReport::new();
        scan_uri_info(&doc, "DriveCollection.json", &mut uris, &mut report);

        let entry = &uris["/redfish/v1/Chassis/{ChassisId}/Drives"];
        assert_eq!(
            entry.reference,
            "http://redfish.dmtf.org/schemas/swordfish/v1/DriveCollection.yaml#/components/schemas/DriveCollection"
        );
    }

    #[test]
    fn missing_verb_terms_default_to_disallowed() {
        let mut doc = chassis_doc();
        let definition = doc["definitions"]["Chassis"].as_object_mut().unwrap();
        definition.remove("insertable");
        definition.remove("updatable");
        definition.remove("deletable");

        let mut uris = UriCache::new();
        let mut report = ConversionReport::new();
        scan_uri_info(&doc, "Chassis.v1_10_0.json", &mut uris, &mut report);

        let entry = &uris["/redfish/v1/Chassis/{ChassisId}"];
        assert!(!entry.insertable && !entry.updatable && !entry.deletable);
        assert_eq!(report.errors(), 3);
        assert!(report.diagnostics.iter().all(|d| d.code == "E002"));
    }

    #[test]
    fn definition_without_reference_shape_is_skipped() {
        let doc = json!({
            "definitions": {
                "Broken": {
                    "insertable": false,
                    "updatable": false,
                    "deletable": false,
                    "uris": ["/redfish/v1/Broken"],
                    "type": "object"
                }
            }
        });

        let mut uris = UriCache::new();
        let mut report = ConversionReport::new();
        scan_uri_info(&doc, "Broken.json", &mut uris, &mut report);

        assert!(uris.is_empty());
        assert!(report.diagnostics.iter().any(|d| d.code == "E003"));
    }

    fn system_doc_with_reset() -> Value {
        json!({
            "$ref": "#/definitions/ComputerSystem",
            "definitions": {
                "ComputerSystem": {
                    "type": "object",
                    "properties": {
                        "Actions": { "$ref": "#/definitions/Actions" }
                    }
                },
                "Actions": {
                    "type": "object",
                    "properties": {
                        "#ComputerSystem.Reset": { "$ref": "#/definitions/Reset" },
                        "Oem": { "$ref": "#/definitions/OemActions" }
                    }
                },
                "Reset": {
                    "description": "This action resets the system.",
                    "longDescription": "This action shall reset the system.",
                    "parameters": {
                        "ResetType": {
                            "$ref": "http://redfish.dmtf.org/schemas/v1/Resource.json#/definitions/ResetType",
                            "requiredParameter": true
                        },
                        "Delay": {
                            "type": "integer"
                        }
                    }
                },
                "OemActions": {
                    "type": "object",
                    "properties": {}
                }
            }
        })
    }

    #[test]
    fn actions_synthesize_request_body_definitions() {
        let mut doc = system_doc_with_reset();
        let mut actions = ActionCache::new();
        let mut report = ConversionReport::new();
        scan_actions(&mut doc, "ComputerSystem.v1_0_0.json", &mut actions, &mut report);

        let body = &doc["definitions"]["ResetRequestBody"];
        assert_eq!(body["type"], "object");
        assert_eq!(body["additionalProperties"], false);
        assert_eq!(body["description"], "This action resets the system.");
        assert_eq!(body["required"], json!(["ResetType"]));
        assert!(body["properties"]["ResetType"].is_object());
        assert!(body["properties"]["Delay"].is_object());

        let entry = &actions["ComputerSystem.v1_0_0.yaml"]["#ComputerSystem.Reset"];
        assert_eq!(entry.reference, "#/components/schemas/ResetRequestBody");
        assert_eq!(entry.action_response, None);
        assert!(report.is_ok());
    }

    #[test]
    fn oem_slot_is_not_an_action() {
        let mut doc = system_doc_with_reset();
        let mut actions = ActionCache::new();
        let mut report = ConversionReport::new();
        scan_actions(&mut doc, "ComputerSystem.v1_0_0.json", &mut actions, &mut report);

        assert_eq!(actions["ComputerSystem.v1_0_0.yaml"].len(), 1);
        assert!(doc["definitions"].get("OemActionsRequestBody").is_none());
    }

    #[test]
    fn distinct_action_response_is_recorded() {
        let mut doc = system_doc_with_reset();
        doc["definitions"]["Reset"]["actionResponse"] =
            json!({ "$ref": "#/definitions/ResetResult" });

        let mut actions = ActionCache::new();
        let mut report = ConversionReport::new();
        scan_actions(&mut doc, "ComputerSystem.v1_0_0.json", &mut actions, &mut report);

        let entry = &actions["ComputerSystem.v1_0_0.yaml"]["#ComputerSystem.Reset"];
        assert_eq!(
            entry.action_response,
            Some("#/components/schemas/ResetResult".to_string())
        );
    }

    #[test]
    fn malformed_action_discards_all_document_actions() {
        let mut doc = system_doc_with_reset();
        // A second action with no parameters block poisons the whole scan.
        doc["definitions"]["Actions"]["properties"]["#ComputerSystem.Add"] =
            json!({ "$ref": "#/definitions/Add" });
        doc["definitions"]["Add"] = json!({
            "description": "Add a system.",
            "longDescription": "This action shall add a system."
        });

        let mut actions = ActionCache::new();
        let mut report = ConversionReport::new();
        scan_actions(&mut doc, "ComputerSystem.v1_0_0.json", &mut actions, &mut report);

        assert!(actions.is_empty());
        assert!(doc["definitions"].get("ResetRequestBody").is_none());
        assert_eq!(report.errors(), 1);
        assert_eq!(report.diagnostics[0].code, "E004");
    }

    #[test]
    fn document_without_root_reference_has_no_actions() {
        let mut doc = json!({
            "definitions": { "Thing": { "type": "object" } }
        });
        let mut actions = ActionCache::new();
        let mut report = ConversionReport::new();
        scan_actions(&mut doc, "Thing.json", &mut actions, &mut report);

        assert!(actions.is_empty());
        assert!(report.is_ok());
    }

    #[test]
    fn merge_attaches_actions_to_matching_resources() {
        let mut uris = UriCache::new();
        uris.insert(
            "/redfish/v1/Systems/{ComputerSystemId}".to_string(),
            UriEntry {
                reference: "http://redfish.dmtf.org/schemas/v1/ComputerSystem.v1_0_0.yaml#/components/schemas/ComputerSystem".to_string(),
                request_body: "http://redfish.dmtf.org/schemas/v1/ComputerSystem.v1_0_0.yaml#/components/schemas/ComputerSystem".to_string(),
                insertable: false,
                updatable: true,
                deletable: false,
                action: false,
                action_response: None,
            },
        );
        uris.insert(
            "/redfish/v1/Chassis/{ChassisId}".to_string(),
            UriEntry {
                reference: "http://redfish.dmtf.org/schemas/v1/Chassis.v1_0_0.yaml#/components/schemas/Chassis".to_string(),
                request_body: "http://redfish.dmtf.org/schemas/v1/Chassis.v1_0_0.yaml#/components/schemas/Chassis".to_string(),
                insertable: false,
                updatable: true,
                deletable: false,
                action: false,
                action_response: None,
            },
        );

        let mut actions = ActionCache::new();
        let mut file_actions = IndexMap::new();
        file_actions.insert(
            "#ComputerSystem.Reset".to_string(),
            ActionEntry {
                reference: "#/components/schemas/ResetRequestBody".to_string(),
                action_response: Some("#/components/schemas/ResetResult".to_string()),
            },
        );
        actions.insert("ComputerSystem.v1_0_0.yaml".to_string(), file_actions);

        let resource_snapshot = uris.clone();
        merge_actions(&mut uris, &actions);

        let action_entry =
            &uris["/redfish/v1/Systems/{ComputerSystemId}/Actions/ComputerSystem.Reset"];
        assert!(action_entry.action);
        assert!(!action_entry.insertable && !action_entry.updatable && !action_entry.deletable);
        assert_eq!(
            action_entry.reference,
            "http://redfish.dmtf.org/schemas/v1/ComputerSystem.v1_0_0.yaml#/components/schemas/ResetRequestBody"
        );
        assert_eq!(action_entry.request_body, action_entry.reference);
        assert_eq!(
            action_entry.action_response,
            Some("http://redfish.dmtf.org/schemas/v1/ComputerSystem.v1_0_0.yaml#/components/schemas/ResetResult".to_string())
        );

        // No action path under the unrelated resource.
        assert!(!uris.keys().any(|u| u.starts_with("/redfish/v1/Chassis/{ChassisId}/Actions")));

        // Resource entries are untouched by the merge.
        for (uri, entry) in &resource_snapshot {
            assert_eq!(&uris[uri], entry);
        }
    }
}
