//! Parameter metadata and type-tag resolution.
//!
//! Every option the CLI understands is described by a [`ParamDef`], whether
//! it comes from the static flag set or from a task declaration in the
//! catalog. The declared type tag is a free-form string in the catalog;
//! [`ParamKind::resolve`] maps it onto the small set of value kinds the
//! argument parser knows how to coerce.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Value kind used for parsing and coercion of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ParamKind {
    String,
    Boolean,
    Number,
    Object,
    Array,
}

impl ParamKind {
    /// Resolve a declared type tag to a value kind.
    ///
    /// Case-insensitive, recognizes the usual synonyms and never fails:
    /// an unset or unrecognized tag falls back to `String`.
    pub fn resolve(tag: Option<&str>) -> ParamKind {
        let Some(tag) = tag else {
            return ParamKind::String;
        };

        match tag.to_lowercase().as_str() {
            "string" => ParamKind::String,
            "bool" | "boolean" => ParamKind::Boolean,
            "int" | "integer" | "num" | "numeric" | "float" => ParamKind::Number,
            "object" => ParamKind::Object,
            "array" => ParamKind::Array,
            _ => ParamKind::String,
        }
    }
}

/// How a parameter may be collected interactively when otherwise unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    /// Prompt with normal echo.
    Text,
    /// Prompt without echoing the entered value.
    Hidden,
}

/// Declaration of a single CLI parameter.
///
/// The same shape serves the static flag set and the task parameters from
/// the catalog; `optional` defaults to true when absent, and any `input`
/// marker makes the parameter eligible for interactive prompting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamDef {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<InputMode>,
}

impl ParamDef {
    pub fn new(name: &str, type_tag: &str, description: &str) -> Self {
        ParamDef {
            name: name.to_string(),
            type_tag: Some(type_tag.to_string()),
            description: Some(description.to_string()),
            optional: None,
            input: None,
        }
    }

    pub fn with_input(mut self, input: InputMode) -> Self {
        self.input = Some(input);
        self
    }

    pub fn kind(&self) -> ParamKind {
        ParamKind::resolve(self.type_tag.as_deref())
    }

    /// A parameter is hard-required when it is explicitly non-optional and
    /// cannot be filled through an interactive prompt.
    pub fn is_required(&self) -> bool {
        self.optional == Some(false) && self.input.is_none()
    }

    pub fn description(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}
