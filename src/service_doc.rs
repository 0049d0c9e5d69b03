//! Service document synthesis.
//!
//! Consumes the finished URI cache and emits one operation descriptor per
//! allowed HTTP verb per path, with path parameters derived from the URI
//! template and a response descriptor per status code.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{json, Map, Value};

use crate::config::Config;
use crate::indexer::{UriCache, UriEntry};
use crate::report::ConversionReport;
use crate::types::{
    last_segment, ACTION_RESPONSES, CREATE_RESPONSES, DELETE_RESPONSES, GET_RESPONSES,
    PATCH_RESPONSES, PUT_RESPONSES,
};

/// Where the shared error payload lives in the generated document.
pub const ERROR_SCHEMA_REF: &str = "#/components/schemas/RedfishError";

static URI_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9]+)\}").expect("valid regex"));

/// URI template tokens name the resource they identify, e.g. `ChassisId`.
static PARAM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)Id\d?$").expect("valid regex"));

/// Build the top-level routing document from the URI cache.
pub fn build_service_document(
    uris: &UriCache,
    config: &Config,
    report: &mut ConversionReport,
) -> Value {
    let mut paths = Map::new();
    for (uri, entry) in uris {
        let mut item = Map::new();
        if !entry.action {
            item.insert(
                "get".to_string(),
                generate_operation(uri, entry, GET_RESPONSES, false, config, report),
            );
            if entry.insertable {
                item.insert(
                    "post".to_string(),
                    generate_operation(uri, entry, CREATE_RESPONSES, true, config, report),
                );
            }
            if entry.updatable {
                item.insert(
                    "patch".to_string(),
                    generate_operation(uri, entry, PATCH_RESPONSES, true, config, report),
                );
                item.insert(
                    "put".to_string(),
                    generate_operation(uri, entry, PUT_RESPONSES, true, config, report),
                );
            }
            if entry.deletable {
                item.insert(
                    "delete".to_string(),
                    generate_operation(uri, entry, DELETE_RESPONSES, false, config, report),
                );
            }
        } else {
            item.insert(
                "post".to_string(),
                generate_operation(uri, entry, ACTION_RESPONSES, true, config, report),
            );
        }
        paths.insert(uri.clone(), Value::Object(item));
    }

    let mut document = Map::new();
    document.insert("openapi".to_string(), json!("3.0.1"));
    document.insert("info".to_string(), config.info.clone());
    document.insert(
        "components".to_string(),
        json!({ "schemas": { "RedfishError": redfish_error(&config.message_ref) } }),
    );
    document.insert("paths".to_string(), Value::Object(paths));
    Value::Object(document)
}

/// Create an operation object for one verb on one path.
fn generate_operation(
    uri: &str,
    entry: &UriEntry,
    responses: &[u16],
    with_request_body: bool,
    config: &Config,
    report: &mut ConversionReport,
) -> Value {
    let mut operation = Map::new();

    if let Some(parameters) = generate_parameters(uri, report) {
        operation.insert("parameters".to_string(), parameters);
    }

    if with_request_body {
        operation.insert(
            "requestBody".to_string(),
            json!({
                "required": true,
                "content": {
                    "application/json": { "schema": { "$ref": entry.request_body } }
                }
            }),
        );
    }

    let mut response_map = Map::new();
    for status in responses {
        response_map.insert(status.to_string(), generate_response(uri, entry, *status, config));
    }
    response_map.insert("default".to_string(), generate_response(uri, entry, 500, config));
    operation.insert("responses".to_string(), Value::Object(response_map));

    Value::Object(operation)
}

/// Create the path parameter array for a URI template.
///
/// Every `{Token}` becomes a required string parameter. The generated
/// description assumes the token names the resource's Id property; a token
/// that does not is reported and left without a description.
fn generate_parameters(uri: &str, report: &mut ConversionReport) -> Option<Value> {
    let mut parameters = Vec::new();

    for captures in URI_PARAM.captures_iter(uri) {
        let name = &captures[1];
        let mut parameter = Map::new();
        parameter.insert("name".to_string(), json!(name));
        parameter.insert("in".to_string(), json!("path"));
        parameter.insert("required".to_string(), json!(true));
        parameter.insert("schema".to_string(), json!({ "type": "string" }));
        match PARAM_ID.captures(name) {
            Some(id_captures) => {
                parameter.insert(
                    "description".to_string(),
                    json!(format!(
                        "The value of the Id property of the {} resource",
                        &id_captures[1]
                    )),
                );
            }
            None => {
                report.error(
                    "E006",
                    "",
                    uri,
                    format!("token {{{}}} does not end in 'Id'", name),
                );
            }
        }
        parameters.push(Value::Object(parameter));
    }

    if parameters.is_empty() {
        None
    } else {
        Some(Value::Array(parameters))
    }
}

/// Create the response object for one HTTP status.
fn generate_response(uri: &str, entry: &UriEntry, status: u16, config: &Config) -> Value {
    let body = |reference: &str| json!({ "application/json": { "schema": { "$ref": reference } } });

    match status {
        200 if !entry.action => json!({
            "description": format!(
                "The response contains a representation of the {} resource",
                last_segment(&entry.reference)
            ),
            "content": body(&entry.reference)
        }),
        // An action with no declared response falls back to the error
        // payload as its success body.
        200 => {
            let action_name = uri.rsplit('.').next().unwrap_or(uri);
            let content = match &entry.action_response {
                Some(response) => body(response),
                None => body(ERROR_SCHEMA_REF),
            };
            json!({
                "description": format!(
                    "The response contains the results of the {} action",
                    action_name
                ),
                "content": content
            })
        }
        201 => json!({
            "description": format!(
                "A resource of type {} has been created",
                last_segment(&entry.request_body)
            ),
            "content": body(&entry.request_body)
        }),
        202 => json!({
            "description": "Accepted; a Task has been generated",
            "content": body(&config.task_ref)
        }),
        204 => json!({ "description": "Success, but no response data" }),
        301 => json!({
            "description": "Resource moved",
            "content": body(&entry.reference)
        }),
        302 => json!({
            "description": "Resource found",
            "content": body(&entry.reference)
        }),
        304 => json!({ "description": "Resource not modified" }),
        _ => json!({
            "description": "Error condition",
            "content": body(ERROR_SCHEMA_REF)
        }),
    }
}

/// The one hard-coded error payload every error response references.
fn redfish_error(message_ref: &str) -> Value {
    json!({
        "description": "The error payload from a Redfish Service.",
        "x-longDescription": "The Redfish Specification-described type shall contain an error payload from a Redfish Service.",
        "type": "object",
        "properties": {
            "error": {
                "description": "The properties that describe an error from a Redfish Service.",
                "x-longDescription": "The Redfish Specification-described type shall contain properties that describe an error from a Redfish Service.",
                "type": "object",
                "properties": {
                    "code": {
                        "description": "A string indicating a specific MessageId from a Message Registry.",
                        "x-longDescription": "This property shall contain a string indicating a specific MessageId from a Message Registry.",
                        "readOnly": true,
                        "type": "string"
                    },
                    "message": {
                        "description": "A human-readable error message corresponding to the message in a Message Registry.",
                        "x-longDescription": "This property shall contain a human-readable error message corresponding to the message in a Message Registry.",
                        "readOnly": true,
                        "type": "string"
                    },
                    "@Message.ExtendedInfo": {
                        "description": "An array of messages describing one or more error messages.",
                        "x-longDescription": "This property shall be an array of message objects describing one or more error messages.",
                        "type": "array",
                        "items": {
                            "$ref": message_ref
                        }
                    }
                },
                "required": [
                    "code",
                    "message"
                ]
            }
        },
        "required": [
            "error"
        ]
    })
}
