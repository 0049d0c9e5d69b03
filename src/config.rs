//! Converter configuration.
//!
//! Loaded from a JSON file using the key spelling of the Redfish tooling
//! configuration format (`OutputFile`, `ODataSchema`, ...). Every key except
//! `info` has a DMTF-published default.

use std::path::Path;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ConvertError;

const DEF_OUTPUT_FILE: &str = "openapi.yaml";
const DEF_ODATA_SCHEMA: &str = "http://redfish.dmtf.org/schemas/v1/odata-v4.yaml";
const DEF_MESSAGE_REF: &str =
    "http://redfish.dmtf.org/schemas/v1/Message.v1_0_8.yaml#/components/schemas/Message";
const DEF_TASK_REF: &str =
    "http://redfish.dmtf.org/schemas/v1/Task.v1_4_2.yaml#/components/schemas/Task";

/// Output options for a conversion run.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// File name for the OpenAPI service document.
    #[serde(rename = "OutputFile", default = "default_output_file")]
    pub output_file: String,

    /// Location of the OData schema file; link-type references resolve here.
    #[serde(rename = "ODataSchema", default = "default_odata_schema")]
    pub odata_schema: String,

    /// Location of the shared Message schema.
    #[serde(rename = "MessageRef", default = "default_message_ref")]
    pub message_ref: String,

    /// Location of the shared Task schema.
    #[serde(rename = "TaskRef", default = "default_task_ref")]
    pub task_ref: String,

    /// The `info` block to embed in the service document. Required.
    #[serde(rename = "info", default)]
    pub info: Value,

    /// Additional URIs to register per resource type when extending a base
    /// service document.
    #[serde(rename = "Extensions", default)]
    pub extensions: IndexMap<String, Vec<String>>,
}

fn default_output_file() -> String {
    DEF_OUTPUT_FILE.to_string()
}

fn default_odata_schema() -> String {
    DEF_ODATA_SCHEMA.to_string()
}

fn default_message_ref() -> String {
    DEF_MESSAGE_REF.to_string()
}

fn default_task_ref() -> String {
    DEF_TASK_REF.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            output_file: default_output_file(),
            odata_schema: default_odata_schema(),
            message_ref: default_message_ref(),
            task_ref: default_task_ref(),
            info: Value::Null,
            extensions: IndexMap::new(),
        }
    }
}

impl Config {
    /// Load a configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns `ConvertError::InvalidConfig` if the file carries no `info`
    /// block; I/O and parse failures map to the corresponding errors.
    pub fn from_file(path: &Path) -> Result<Config, ConvertError> {
        if !path.exists() {
            return Err(ConvertError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConvertError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Config =
            serde_json::from_str(&content).map_err(|source| ConvertError::InvalidJson { source })?;

        if config.info.is_null() {
            return Err(ConvertError::InvalidConfig {
                message: format!("{} does not contain 'info' data", path.display()),
            });
        }

        Ok(config)
    }
}
