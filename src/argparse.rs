//! Argument parser adapter.
//!
//! The resolution engine hands this module a flag schema (name → value
//! kind) and a shorthand map, and gets back the recognized options plus the
//! leftover positional tokens. The actual tokenizing is delegated to clap's
//! builder API; the schema is rebuilt from scratch on every call because it
//! changes between the static pass and the combined pass.

use crate::param::ParamKind;
use clap::{Arg, ArgAction, Command};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

/// Flag schema for one parser run: option name → value kind.
pub type Schema = BTreeMap<String, ParamKind>;

/// Shorthand aliases: single character → long option name.
pub type Shortcuts = BTreeMap<char, String>;

/// Result of one parser run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedArgs {
    /// Recognized options, coerced according to their declared kind.
    pub flags: BTreeMap<String, Value>,
    /// Positional tokens left over after option extraction.
    pub remainder: Vec<String>,
}

const REMAINDER_ID: &str = "__remainder";

/// Parse `argv` against the given schema.
///
/// The schema acts as a filter, not a validator: flags absent from it are
/// silently dropped and never appear in the result. This permissive parsing
/// is inherited deliberately from the original option tokenizer contract;
/// it tolerates unknown flags but it also masks typos, so it must not be
/// relied on as a correctness guarantee.
pub fn parse(schema: &Schema, shortcuts: &Shortcuts, argv: &[String]) -> ParsedArgs {
    let mut command = Command::new("apicli")
        .no_binary_name(true)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .ignore_errors(true)
        .arg(Arg::new(REMAINDER_ID).num_args(0..));

    for (name, kind) in schema {
        if name == REMAINDER_ID {
            continue;
        }

        let mut arg = Arg::new(name.clone()).long(name.clone());
        if let Some((ch, _)) = shortcuts.iter().find(|(_, target)| *target == name) {
            arg = arg.short(*ch);
        }
        arg = match kind {
            ParamKind::Boolean => arg.action(ArgAction::SetTrue),
            ParamKind::Array => arg.action(ArgAction::Append),
            _ => arg.action(ArgAction::Set),
        };
        command = command.arg(arg);
    }

    let matches = match command.try_get_matches_from(argv) {
        Ok(matches) => matches,
        Err(e) => {
            debug!("Argument tokenizing failed: {}", e);
            return ParsedArgs::default();
        }
    };

    let mut flags = BTreeMap::new();
    for (name, kind) in schema {
        if name == REMAINDER_ID {
            continue;
        }
        match kind {
            ParamKind::Boolean => {
                if matches.get_flag(name) {
                    flags.insert(name.clone(), Value::Bool(true));
                }
            }
            ParamKind::Array => {
                if let Some(values) = matches.get_many::<String>(name) {
                    let items = values.map(|v| Value::String(v.clone())).collect();
                    flags.insert(name.clone(), Value::Array(items));
                }
            }
            _ => {
                if let Some(value) = matches.get_one::<String>(name) {
                    flags.insert(name.clone(), coerce(*kind, value));
                }
            }
        }
    }

    let remainder = matches
        .get_many::<String>(REMAINDER_ID)
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    ParsedArgs { flags, remainder }
}

/// Coerce a raw token into the declared value kind. Coercion is lenient:
/// anything that does not parse as the declared kind stays a string.
fn coerce(kind: ParamKind, raw: &str) -> Value {
    match kind {
        ParamKind::Number => {
            if let Ok(n) = raw.parse::<i64>() {
                return Value::Number(n.into());
            }
            raw.parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(raw.to_string()))
        }
        ParamKind::Object => match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => value,
            _ => Value::String(raw.to_string()),
        },
        _ => Value::String(raw.to_string()),
    }
}
