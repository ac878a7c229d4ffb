//! The API catalog: a declarative description of every operation the CLI
//! can invoke.
//!
//! A catalog document has a base `url` and a `data` map from class name to
//! an ordered list of task definitions. It is loaded once at startup and
//! never mutated afterwards; the resolution engine and the help renderer
//! only ever read it.

use crate::param::ParamDef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use strum::{Display, EnumString};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("invalid API catalog: {reason}")]
    Invalid { reason: String },
    #[error("unknown API class: {class}")]
    UnknownClass { class: String },
    #[error("unknown API task: {class} -> {task}")]
    UnknownTask { class: String, task: String },
}

/// HTTP method a task dispatches with, after normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    Get,
    Put,
    Delete,
    Post,
}

impl HttpMethod {
    /// Normalize a declared method tag. Absent or unrecognized values
    /// (including e.g. `"patch"`) coerce to `POST`.
    pub fn from_tag(tag: Option<&str>) -> HttpMethod {
        tag.and_then(|t| HttpMethod::from_str(t).ok())
            .unwrap_or(HttpMethod::Post)
    }

    /// True when parameters travel in the query string rather than a body.
    pub fn uses_query(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }
}

/// Declared return-type metadata for a task, used only by the help views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnDef {
    #[serde(rename = "type")]
    pub type_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A single invocable operation within a class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDef {
    /// Task name, the second positional argument on the command line.
    pub cmd: String,
    /// Declared HTTP method; normalized through [`HttpMethod::from_tag`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Route suffix appended to the catalog base URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub param: Vec<ParamDef>,
    #[serde(rename = "return", skip_serializing_if = "Option::is_none")]
    pub returns: Option<ReturnDef>,
}

impl TaskDef {
    pub fn effective_method(&self) -> HttpMethod {
        HttpMethod::from_tag(self.method.as_deref())
    }
}

/// The full API description: base URL plus class → tasks mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    /// Base URL every task route is appended to.
    pub url: String,
    /// Classes in the catalog, each with its tasks in declaration order.
    pub data: BTreeMap<String, Vec<TaskDef>>,
}

impl Catalog {
    /// Load a catalog document from a file, selecting the parser by
    /// extension exactly like the config loader does.
    pub fn load(path: &Path) -> Result<Catalog, CatalogError> {
        debug!("Loading API catalog from {}...", path.display());

        let content = std::fs::read_to_string(path).map_err(|e| CatalogError::Invalid {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let catalog: Catalog = match extension.as_str() {
            "json" => serde_json::from_str(&content).map_err(|e| CatalogError::Invalid {
                reason: e.to_string(),
            })?,
            "yml" | "yaml" => serde_yaml::from_str(&content).map_err(|e| CatalogError::Invalid {
                reason: e.to_string(),
            })?,
            other => {
                return Err(CatalogError::Invalid {
                    reason: format!("unsupported catalog file extension: .{}", other),
                })
            }
        };

        url::Url::parse(&catalog.url).map_err(|e| CatalogError::Invalid {
            reason: format!("invalid base URL {:?}: {}", catalog.url, e),
        })?;

        Ok(catalog)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn tasks(&self, class: &str) -> Option<&[TaskDef]> {
        self.data.get(class).map(Vec::as_slice)
    }

    /// Find the task definition for a (class, task) pair.
    ///
    /// Unknown class and unknown task are distinct failures so the caller
    /// can render a distinct message for each. Duplicate task names within
    /// a class resolve to the first match in declaration order.
    pub fn lookup(&self, class: &str, task: &str) -> Result<&TaskDef, CatalogError> {
        let tasks = self.data.get(class).ok_or_else(|| CatalogError::UnknownClass {
            class: class.to_string(),
        })?;

        tasks
            .iter()
            .find(|t| t.cmd == task)
            .ok_or_else(|| CatalogError::UnknownTask {
                class: class.to_string(),
                task: task.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_catalog() -> Catalog {
        serde_json::from_str(
            r#"{
                "url": "https://api.example.com",
                "data": {
                    "user": [
                        {"cmd": "list", "method": "get", "route": "/users"},
                        {"cmd": "create", "method": "post", "route": "/users",
                         "param": [{"name": "email", "type": "string", "optional": false}],
                         "return": {"type": "object", "description": "The new user"}},
                        {"cmd": "create", "method": "put", "route": "/users/alt"}
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_method_normalization() {
        assert_eq!(HttpMethod::from_tag(Some("get")), HttpMethod::Get);
        assert_eq!(HttpMethod::from_tag(Some("GET")), HttpMethod::Get);
        assert_eq!(HttpMethod::from_tag(Some("Put")), HttpMethod::Put);
        assert_eq!(HttpMethod::from_tag(Some("delete")), HttpMethod::Delete);
        assert_eq!(HttpMethod::from_tag(Some("patch")), HttpMethod::Post);
        assert_eq!(HttpMethod::from_tag(Some("garbage")), HttpMethod::Post);
        assert_eq!(HttpMethod::from_tag(None), HttpMethod::Post);
    }

    #[test]
    fn test_method_display_is_uppercase() {
        assert_eq!(HttpMethod::Get.to_string(), "GET");
        assert_eq!(HttpMethod::Post.to_string(), "POST");
    }

    #[test]
    fn test_lookup_distinguishes_unknown_class_from_unknown_task() {
        let catalog = sample_catalog();

        match catalog.lookup("project", "list") {
            Err(CatalogError::UnknownClass { class }) => assert_eq!(class, "project"),
            other => panic!("expected UnknownClass, got {:?}", other),
        }

        match catalog.lookup("user", "remove") {
            Err(CatalogError::UnknownTask { class, task }) => {
                assert_eq!(class, "user");
                assert_eq!(task, "remove");
            }
            other => panic!("expected UnknownTask, got {:?}", other),
        }
    }

    #[test]
    fn test_lookup_duplicate_task_resolves_to_first_match() {
        let catalog = sample_catalog();
        let task = catalog.lookup("user", "create").unwrap();
        assert_eq!(task.effective_method(), HttpMethod::Post);
    }

    #[test]
    fn test_load_rejects_unknown_extension_and_bad_documents() {
        let dir = tempfile::tempdir().unwrap();

        let ini = dir.path().join("catalog.ini");
        std::fs::write(&ini, "url=nope").unwrap();
        assert!(matches!(
            Catalog::load(&ini),
            Err(CatalogError::Invalid { .. })
        ));

        let json = dir.path().join("catalog.json");
        std::fs::write(&json, "{not json").unwrap();
        assert!(matches!(
            Catalog::load(&json),
            Err(CatalogError::Invalid { .. })
        ));

        let missing = dir.path().join("absent.json");
        assert!(matches!(
            Catalog::load(&missing),
            Err(CatalogError::Invalid { .. })
        ));
    }

    #[test]
    fn test_load_accepts_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.yml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "url: https://api.example.com").unwrap();
        writeln!(file, "data:").unwrap();
        writeln!(file, "  note:").unwrap();
        writeln!(file, "    - cmd: list").unwrap();
        writeln!(file, "      method: get").unwrap();

        let catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.lookup("note", "list").unwrap().effective_method(), HttpMethod::Get);
    }

    #[test]
    fn test_load_rejects_invalid_base_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{"url": "not a url", "data": {}}"#).unwrap();
        assert!(matches!(
            Catalog::load(&path),
            Err(CatalogError::Invalid { .. })
        ));
    }
}
