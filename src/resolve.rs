//! Option resolution engine.
//!
//! This is the heart of the crate: given raw process arguments it determines
//! the active class and task, builds the combined flag schema, merges the
//! three option sources (CLI flags, config file, and later the interactive
//! prompts) and validates the result against the parameter metadata.
//!
//! Resolution is modeled as a value, not control flow: the engine returns a
//! [`Resolution`] variant the driver pattern-matches on, and every failure
//! is a typed [`ResolveError`] that the driver turns into a help view.

use crate::app::AppConfig;
use crate::argparse::{self, Schema};
use crate::catalog::{Catalog, CatalogError, HttpMethod, TaskDef};
use crate::config::{self, ConfigError};
use crate::param::ParamDef;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, trace};

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("no API class specified")]
    MissingClass,
    #[error("no API task specified")]
    MissingTask,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("the following parameters are missing: {}", param_names(.0))]
    MissingParameters(Vec<ParamDef>),
}

fn param_names(params: &[ParamDef]) -> String {
    params
        .iter()
        .map(|p| p.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// The merged key → value map consulted at dispatch time.
///
/// Built by layering, highest precedence first: CLI flags, config-file
/// values for keys the CLI left unset, then interactively prompted values.
/// Conceptually frozen once dispatch begins.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ResolvedOptions {
    values: BTreeMap<String, Value>,
}

impl ResolvedOptions {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Fetch an option, falling back to the given default when unset.
    pub fn get_or<V: Into<Value>>(&self, key: &str, default: V) -> Value {
        self.values
            .get(key)
            .cloned()
            .unwrap_or_else(|| default.into())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: String, value: Value) {
        self.values.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// What the help renderer already knows when it is invoked.
#[derive(Debug, Clone, PartialEq)]
pub struct HelpTopic {
    pub class: Option<String>,
    pub task: Option<String>,
}

/// A fully resolved task invocation, ready for the prompt phase and then
/// dispatch.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub class: String,
    pub task: TaskDef,
    pub method: HttpMethod,
    pub options: ResolvedOptions,
    /// Parameters eligible for interactive prompting, in registration
    /// order: static set first, then the task declarations.
    pub interactive: Vec<ParamDef>,
    /// Positional tokens beyond class and task, passed through untouched.
    pub extra_args: Vec<String>,
}

/// Outcome of a successful resolution run.
#[derive(Debug)]
pub enum Resolution {
    /// The `--help` flag was set; no dispatch happens.
    Help(HelpTopic),
    /// All hard requirements are satisfied; gaps left are destined for
    /// interactive fill.
    Ready(Invocation),
}

pub struct Resolver<'a> {
    catalog: &'a Catalog,
    settings: &'a AppConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(catalog: &'a Catalog, settings: &'a AppConfig) -> Self {
        Resolver { catalog, settings }
    }

    /// Resolve raw process arguments into a dispatchable invocation.
    ///
    /// Runs the argument parser twice: once with the static schema to
    /// discover the class/task positionals and the `--config`/`--help`
    /// flags, and once with the combined schema so task-declared flags are
    /// recognized too.
    pub fn resolve(&self, argv: &[String]) -> Result<Resolution, ResolveError> {
        let static_schema = schema_for(&self.settings.static_params);
        let first_pass = argparse::parse(&static_schema, &self.settings.shortcuts, argv);

        let mut positionals = first_pass.remainder.into_iter();
        let class = match &self.settings.fixed_class {
            Some(class) => Some(class.clone()),
            None => positionals.next(),
        };
        let task_name = positionals.next();
        let extra_args: Vec<String> = positionals.collect();

        if first_pass.flags.contains_key("help") {
            debug!("Help requested, skipping dispatch");
            return Ok(Resolution::Help(HelpTopic {
                class,
                task: task_name,
            }));
        }

        let class = class.ok_or(ResolveError::MissingClass)?;
        let task_name = task_name.ok_or(ResolveError::MissingTask)?;
        debug!("Resolving task {} -> {}", class, task_name);

        let task = self.catalog.lookup(&class, &task_name)?.clone();

        // Combined schema: the static set plus the task declarations, the
        // task's type tag winning on a name collision.
        let mut schema = static_schema;
        for param in &task.param {
            schema.insert(param.name.clone(), param.kind());
        }

        let full_pass = argparse::parse(&schema, &self.settings.shortcuts, argv);
        let mut options = ResolvedOptions::default();
        for (name, value) in full_pass.flags {
            options.insert(name, value);
        }

        self.merge_config(&mut options, &task)?;

        let mut missing = Vec::new();
        let mut interactive: Vec<ParamDef> = Vec::new();
        for param in self.settings.static_params.iter().chain(task.param.iter()) {
            if param.is_required() && !options.contains(&param.name) {
                missing.push(param.clone());
            }
            if param.input.is_some() && !interactive.iter().any(|p| p.name == param.name) {
                interactive.push(param.clone());
            }
        }

        if !missing.is_empty() {
            return Err(ResolveError::MissingParameters(missing));
        }

        let method = task.effective_method();
        trace!("Resolved {} option(s), method {}", options.len(), method);

        Ok(Resolution::Ready(Invocation {
            class,
            task,
            method,
            options,
            interactive,
            extra_args,
        }))
    }

    /// Adopt config-file values for declared parameters the CLI left unset.
    ///
    /// An explicit `--config` always wins over the default location; the
    /// default-location file is consulted only when it exists.
    fn merge_config(
        &self,
        options: &mut ResolvedOptions,
        task: &TaskDef,
    ) -> Result<(), ConfigError> {
        let config_path = match options.get("config").and_then(Value::as_str) {
            Some(path) => Some(PathBuf::from(path)),
            None => self
                .settings
                .default_config
                .as_ref()
                .filter(|path| path.exists())
                .cloned(),
        };

        let Some(config_path) = config_path else {
            return Ok(());
        };

        let file_values = config::load(&config_path)?;
        for param in self.settings.static_params.iter().chain(task.param.iter()) {
            if options.contains(&param.name) {
                continue;
            }
            if let Some(value) = file_values.get(&param.name) {
                trace!("Adopting {} from config file", param.name);
                options.insert(param.name.clone(), value.clone());
            }
        }

        Ok(())
    }
}

fn schema_for(params: &[ParamDef]) -> Schema {
    params
        .iter()
        .map(|param| (param.name.clone(), param.kind()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppConfig;
    use crate::param::InputMode;
    use serde_json::json;

    fn catalog() -> Catalog {
        serde_json::from_str(
            r#"{
                "url": "https://api.example.com",
                "data": {
                    "user": [
                        {"cmd": "list", "method": "get", "route": "/users"},
                        {"cmd": "create", "route": "/users", "param": [
                            {"name": "email", "type": "string", "optional": false},
                            {"name": "age", "type": "int"},
                            {"name": "nickname", "type": "string", "input": "text"}
                        ]}
                    ]
                }
            }"#,
        )
        .unwrap()
    }

    fn settings() -> AppConfig {
        AppConfig::builder().without_default_config().build()
    }

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|a| a.to_string()).collect()
    }

    fn resolve(catalog: &Catalog, settings: &AppConfig, args: &[&str]) -> Result<Resolution, ResolveError> {
        Resolver::new(catalog, settings).resolve(&argv(args))
    }

    #[test]
    fn test_missing_required_parameter_fails_before_dispatch() {
        let catalog = catalog();
        let settings = settings();

        match resolve(&catalog, &settings, &["user", "create"]) {
            Err(ResolveError::MissingParameters(params)) => {
                assert_eq!(params.len(), 1);
                assert_eq!(params[0].name, "email");
            }
            other => panic!("expected MissingParameters, got {:?}", other),
        }
    }

    #[test]
    fn test_resolves_task_params_and_extra_positionals() {
        let catalog = catalog();
        let settings = settings();

        let resolution = resolve(
            &catalog,
            &settings,
            &["user", "create", "extra1", "--email", "a@b.c", "--age", "30", "extra2"],
        )
        .unwrap();

        let Resolution::Ready(invocation) = resolution else {
            panic!("expected Ready");
        };
        assert_eq!(invocation.class, "user");
        assert_eq!(invocation.task.cmd, "create");
        assert_eq!(invocation.method, HttpMethod::Post);
        assert_eq!(invocation.options.get("email"), Some(&json!("a@b.c")));
        assert_eq!(invocation.options.get("age"), Some(&json!(30)));
        assert_eq!(invocation.extra_args, vec!["extra1", "extra2"]);
    }

    #[test]
    fn test_help_flag_short_circuits_with_known_context() {
        let catalog = catalog();
        let settings = settings();

        match resolve(&catalog, &settings, &["user", "--help"]).unwrap() {
            Resolution::Help(topic) => {
                assert_eq!(topic.class.as_deref(), Some("user"));
                assert_eq!(topic.task, None);
            }
            other => panic!("expected Help, got {:?}", other),
        }

        // Help wins even for a class/task pair that does not exist.
        match resolve(&catalog, &settings, &["ghost", "boo", "-h"]).unwrap() {
            Resolution::Help(topic) => {
                assert_eq!(topic.class.as_deref(), Some("ghost"));
                assert_eq!(topic.task.as_deref(), Some("boo"));
            }
            other => panic!("expected Help, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_class_and_task_are_distinct() {
        let catalog = catalog();
        let settings = settings();

        assert!(matches!(
            resolve(&catalog, &settings, &[]),
            Err(ResolveError::MissingClass)
        ));
        assert!(matches!(
            resolve(&catalog, &settings, &["user"]),
            Err(ResolveError::MissingTask)
        ));
    }

    #[test]
    fn test_unknown_class_and_task_surface_catalog_errors() {
        let catalog = catalog();
        let settings = settings();

        assert!(matches!(
            resolve(&catalog, &settings, &["project", "list"]),
            Err(ResolveError::Catalog(CatalogError::UnknownClass { .. }))
        ));
        assert!(matches!(
            resolve(&catalog, &settings, &["user", "destroy"]),
            Err(ResolveError::Catalog(CatalogError::UnknownTask { .. }))
        ));
    }

    #[test]
    fn test_cli_value_wins_over_config_value() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("config.json");
        std::fs::write(&config_file, r#"{"host": "from-config", "email": "cfg@b.c"}"#).unwrap();

        let catalog = catalog();
        let settings = settings();

        let resolution = resolve(
            &catalog,
            &settings,
            &[
                "user",
                "create",
                "--host",
                "from-cli",
                "--email",
                "a@b.c",
                "--config",
                config_file.to_str().unwrap(),
            ],
        )
        .unwrap();

        let Resolution::Ready(invocation) = resolution else {
            panic!("expected Ready");
        };
        assert_eq!(invocation.options.get("host"), Some(&json!("from-cli")));
        assert_eq!(invocation.options.get("email"), Some(&json!("a@b.c")));
    }

    #[test]
    fn test_config_fills_required_parameter() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("config.yml");
        std::fs::write(&config_file, "email: cfg@b.c\n").unwrap();

        let catalog = catalog();
        let settings = settings();

        let resolution = resolve(
            &catalog,
            &settings,
            &["user", "create", "-c", config_file.to_str().unwrap()],
        )
        .unwrap();

        let Resolution::Ready(invocation) = resolution else {
            panic!("expected Ready");
        };
        assert_eq!(invocation.options.get("email"), Some(&json!("cfg@b.c")));
    }

    #[test]
    fn test_explicit_config_path_must_exist() {
        let catalog = catalog();
        let settings = settings();

        let result = resolve(
            &catalog,
            &settings,
            &["user", "list", "--config", "/no/such/file.json"],
        );
        assert!(matches!(
            result,
            Err(ResolveError::Config(ConfigError::NotFound { .. }))
        ));
    }

    #[test]
    fn test_unsupported_config_extension_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("config.ini");
        std::fs::write(&config_file, "host=example.com").unwrap();

        let catalog = catalog();
        let settings = settings();

        let result = resolve(
            &catalog,
            &settings,
            &["user", "list", "--config", config_file.to_str().unwrap()],
        );
        assert!(matches!(
            result,
            Err(ResolveError::Config(ConfigError::UnsupportedFormat { .. }))
        ));
    }

    #[test]
    fn test_default_config_used_only_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let default_file = dir.path().join("config.yml");

        let catalog = catalog();
        let mut settings = settings();
        settings.default_config = Some(default_file.clone());

        // File absent: silently skipped, no failure.
        let resolution = resolve(&catalog, &settings, &["user", "list"]).unwrap();
        let Resolution::Ready(invocation) = resolution else {
            panic!("expected Ready");
        };
        assert!(invocation.options.get("host").is_none());

        // File present: adopted for unset keys.
        std::fs::write(&default_file, "host: default-host\n").unwrap();
        let resolution = resolve(&catalog, &settings, &["user", "list"]).unwrap();
        let Resolution::Ready(invocation) = resolution else {
            panic!("expected Ready");
        };
        assert_eq!(invocation.options.get("host"), Some(&json!("default-host")));
    }

    #[test]
    fn test_interactive_registration_order() {
        let catalog = catalog();
        let settings = settings();

        let resolution = resolve(&catalog, &settings, &["user", "create", "--email", "a@b.c"]).unwrap();
        let Resolution::Ready(invocation) = resolution else {
            panic!("expected Ready");
        };

        // Static set first (username, password), then the task's own
        // promptable parameter.
        let names: Vec<&str> = invocation.interactive.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["username", "password", "nickname"]);
        assert_eq!(invocation.interactive[1].input, Some(InputMode::Hidden));
    }

    #[test]
    fn test_fixed_class_skips_first_positional() {
        let catalog = catalog();
        let mut settings = settings();
        settings.fixed_class = Some("user".to_string());

        let resolution = resolve(&catalog, &settings, &["list"]).unwrap();
        let Resolution::Ready(invocation) = resolution else {
            panic!("expected Ready");
        };
        assert_eq!(invocation.class, "user");
        assert_eq!(invocation.task.cmd, "list");
        assert_eq!(invocation.method, HttpMethod::Get);
    }

    #[test]
    fn test_get_or_returns_default_when_unset() {
        let mut options = ResolvedOptions::default();
        options.insert("host".to_string(), json!("example.com"));

        assert_eq!(options.get_or("host", "fallback"), json!("example.com"));
        assert_eq!(options.get_or("absent", "fallback"), json!("fallback"));
    }
}
