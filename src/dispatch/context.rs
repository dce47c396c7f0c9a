//! The invocation context handed to a plugin.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

/// Option key that never crosses the process boundary.
const PARENT_KEY: &str = "parent";

/// A sub-command invocation: its name, positional arguments and options.
///
/// Option keys starting with `_`, and the key `parent`, are internal to the
/// argument parser and are left out when the context is serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InvocationContext {
    pub command: String,
    pub args: Vec<String>,
    #[serde(serialize_with = "serialize_public_options")]
    pub options: Map<String, Value>,
}

impl InvocationContext {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            ..Default::default()
        }
    }

    /// Parse the raw arguments that followed the sub-command name.
    ///
    /// `--key=value` sets a string, `--key` sets `true`, `--no-key` sets
    /// `false` and `-abc` sets `a`, `b` and `c`. Everything after `--` is
    /// positional. Keys are camel-cased (`--target-path` → `targetPath`).
    pub fn from_raw_args(command: impl Into<String>, raw: &[String]) -> Self {
        let mut context = Self::new(command);
        let mut rest_positional = false;

        for arg in raw {
            if rest_positional {
                context.args.push(arg.clone());
            } else if arg == "--" {
                rest_positional = true;
            } else if let Some(long) = arg.strip_prefix("--") {
                let (key, value) = match long.split_once('=') {
                    Some((key, value)) => (key, Value::String(value.to_string())),
                    None => match long.strip_prefix("no-") {
                        Some(key) => (key, Value::Bool(false)),
                        None => (long, Value::Bool(true)),
                    },
                };
                let key = camel_case(key);
                if key.is_empty() {
                    // `--no-` and `--=x` name no option.
                    context.args.push(arg.clone());
                } else {
                    context.set_option(&key, value);
                }
            } else if let Some(short) = arg.strip_prefix('-').filter(|s| !s.is_empty()) {
                for flag in short.chars() {
                    context.set_option(&flag.to_string(), Value::Bool(true));
                }
            } else {
                context.args.push(arg.clone());
            }
        }

        context
    }

    pub fn set_option(&mut self, key: &str, value: Value) {
        self.options.insert(key.to_string(), value);
    }

    /// Options that survive serialization.
    pub fn public_options(&self) -> Map<String, Value> {
        self.options
            .iter()
            .filter(|(key, _)| is_public_key(key))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// The context as a JSON value.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "command": self.command,
            "args": self.args,
            "options": self.public_options(),
        })
    }
}

fn is_public_key(key: &str) -> bool {
    !key.starts_with('_') && key != PARENT_KEY
}

fn serialize_public_options<S: Serializer>(
    options: &Map<String, Value>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(options.iter().filter(|(key, _)| is_public_key(key)))
}

/// `kebab-case` → `kebabCase`.
fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper_next = false;
    for c in key.chars() {
        if c == '-' {
            upper_next = !out.is_empty();
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}
