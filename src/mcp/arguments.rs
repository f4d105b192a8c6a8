//! Typed tool arguments.
//!
//! Raw `arguments` objects are checked once against the tool's declared
//! parameters: required members must be present, optional members get their
//! default, and empty optional strings count as absent. The result is a
//! [`ToolCall`] that the gateway can turn into a backend query without further
//! checks.

use super::registry::{ParamSpec, ParamType, ToolDefinition, ToolKind};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("Missing required argument: {0}")]
    Missing(&'static str),

    #[error("Invalid argument '{name}': expected {expected}")]
    InvalidType {
        name: &'static str,
        expected: &'static str,
    },

    #[error("Invalid argument '{name}': must be one of {}", .allowed.join(", "))]
    NotAllowed {
        name: &'static str,
        allowed: &'static [&'static str],
    },

    #[error("Provide at least one of: {}", .0.join(" or "))]
    MissingOneOf(&'static [&'static str]),

    #[error("Tool arguments must be a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FdaDrugLookup {
    pub drug_name: String,
    pub search_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubmedSearch {
    pub query: String,
    pub max_results: i64,
    pub date_range: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthTopics {
    pub topic: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClinicalTrialsSearch {
    pub condition: String,
    pub status: String,
    pub max_results: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcdLookup {
    pub code: Option<String>,
    pub description: Option<String>,
    pub max_results: i64,
}

/// A validated invocation of one registered tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    FdaDrugLookup(FdaDrugLookup),
    PubmedSearch(PubmedSearch),
    HealthTopics(HealthTopics),
    ClinicalTrialsSearch(ClinicalTrialsSearch),
    LookupIcdCode(IcdLookup),
}

impl ToolCall {
    pub fn parse(tool: &ToolDefinition, arguments: &Value) -> Result<Self, ArgumentError> {
        let empty = Map::new();
        let raw = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(ArgumentError::NotAnObject),
        };

        let mut args = Arguments::validate(tool, raw)?;

        let call = match tool.kind {
            ToolKind::FdaDrugLookup => ToolCall::FdaDrugLookup(FdaDrugLookup {
                drug_name: args.string("drug_name")?,
                search_type: args.string("search_type")?,
            }),
            ToolKind::PubmedSearch => ToolCall::PubmedSearch(PubmedSearch {
                query: args.string("query")?,
                max_results: args.integer("max_results")?,
                date_range: args.string("date_range")?,
            }),
            ToolKind::HealthTopics => ToolCall::HealthTopics(HealthTopics {
                topic: args.string("topic")?,
                language: args.string("language")?,
            }),
            ToolKind::ClinicalTrialsSearch => {
                ToolCall::ClinicalTrialsSearch(ClinicalTrialsSearch {
                    condition: args.string("condition")?,
                    status: args.string("status")?,
                    max_results: args.integer("max_results")?,
                })
            }
            ToolKind::LookupIcdCode => {
                let code = args.optional_string("code");
                let description = args.optional_string("description");
                if code.is_none() && description.is_none() {
                    return Err(ArgumentError::MissingOneOf(&["code", "description"]));
                }
                ToolCall::LookupIcdCode(IcdLookup {
                    code,
                    description,
                    max_results: args.integer("max_results")?,
                })
            }
        };

        Ok(call)
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolCall::FdaDrugLookup(_) => ToolKind::FdaDrugLookup,
            ToolCall::PubmedSearch(_) => ToolKind::PubmedSearch,
            ToolCall::HealthTopics(_) => ToolKind::HealthTopics,
            ToolCall::ClinicalTrialsSearch(_) => ToolKind::ClinicalTrialsSearch,
            ToolCall::LookupIcdCode(_) => ToolKind::LookupIcdCode,
        }
    }

    /// Backend query parameters. Absent optionals are left out entirely.
    pub fn query(&self) -> Map<String, Value> {
        let mut query = Map::new();
        match self {
            ToolCall::FdaDrugLookup(args) => {
                query.insert("drug_name".into(), args.drug_name.clone().into());
                query.insert("search_type".into(), args.search_type.clone().into());
            }
            ToolCall::PubmedSearch(args) => {
                query.insert("query".into(), args.query.clone().into());
                query.insert("max_results".into(), args.max_results.into());
                query.insert("date_range".into(), args.date_range.clone().into());
            }
            ToolCall::HealthTopics(args) => {
                query.insert("topic".into(), args.topic.clone().into());
                query.insert("language".into(), args.language.clone().into());
            }
            ToolCall::ClinicalTrialsSearch(args) => {
                query.insert("condition".into(), args.condition.clone().into());
                query.insert("status".into(), args.status.clone().into());
                query.insert("max_results".into(), args.max_results.into());
            }
            ToolCall::LookupIcdCode(args) => {
                if let Some(code) = &args.code {
                    query.insert("code".into(), code.clone().into());
                }
                if let Some(description) = &args.description {
                    query.insert("description".into(), description.clone().into());
                }
                query.insert("max_results".into(), args.max_results.into());
            }
        }
        query
    }
}

/// Arguments after schema validation, with defaults applied
struct Arguments {
    values: Map<String, Value>,
}

impl Arguments {
    fn validate(tool: &ToolDefinition, raw: &Map<String, Value>) -> Result<Self, ArgumentError> {
        let mut values = Map::new();

        for spec in &tool.params {
            let supplied = raw.get(spec.name).filter(|value| !is_blank(value));
            let value = match (supplied, spec.required, spec.default) {
                (Some(value), _, _) => coerce(spec, value)?,
                (None, true, _) => return Err(ArgumentError::Missing(spec.name)),
                (None, false, Some(default)) => default.to_value(),
                (None, false, None) => continue,
            };
            values.insert(spec.name.to_string(), value);
        }

        for name in raw.keys() {
            if tool.param(name).is_none() {
                debug!(tool = tool.name, argument = %name, "Ignoring undeclared argument");
            }
        }

        Ok(Self { values })
    }

    fn string(&mut self, name: &'static str) -> Result<String, ArgumentError> {
        self.optional_string(name)
            .ok_or(ArgumentError::Missing(name))
    }

    fn optional_string(&mut self, name: &'static str) -> Option<String> {
        match self.values.remove(name) {
            Some(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    fn integer(&mut self, name: &'static str) -> Result<i64, ArgumentError> {
        self.values
            .remove(name)
            .and_then(|value| value.as_i64())
            .ok_or(ArgumentError::Missing(name))
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Accepts numbers for string parameters and integer strings for integer
/// parameters; anything else is a type error.
fn coerce(spec: &ParamSpec, value: &Value) -> Result<Value, ArgumentError> {
    let invalid = || ArgumentError::InvalidType {
        name: spec.name,
        expected: spec.param_type.as_str(),
    };

    let coerced = match (spec.param_type, value) {
        (ParamType::String, Value::String(_)) => value.clone(),
        (ParamType::String, Value::Number(n)) => Value::String(n.to_string()),
        (ParamType::Integer, Value::Number(n)) => {
            n.as_i64().map(Value::from).ok_or_else(invalid)?
        }
        (ParamType::Integer, Value::String(s)) => s
            .trim()
            .parse::<i64>()
            .map(Value::from)
            .map_err(|_| invalid())?,
        _ => return Err(invalid()),
    };

    if let (Some(allowed), Value::String(s)) = (spec.allowed, &coerced) {
        if !allowed.iter().any(|choice| *choice == s.as_str()) {
            return Err(ArgumentError::NotAllowed {
                name: spec.name,
                allowed,
            });
        }
    }

    Ok(coerced)
}
