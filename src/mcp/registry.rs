//! Static catalog of the healthcare tools and their input schemas.
//!
//! Names, parameters and defaults are part of the wire contract: `tools/list`
//! serves the cached listing built here, so the output is identical on every call.

use super::error::McpError;
use serde_json::{json, Map, Value};

/// One variant per tool. The registry is built from `ToolKind::ALL`, so every
/// routable tool has a definition and every definition is routable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    FdaDrugLookup,
    PubmedSearch,
    HealthTopics,
    ClinicalTrialsSearch,
    LookupIcdCode,
}

impl ToolKind {
    pub const ALL: [ToolKind; 5] = [
        ToolKind::FdaDrugLookup,
        ToolKind::PubmedSearch,
        ToolKind::HealthTopics,
        ToolKind::ClinicalTrialsSearch,
        ToolKind::LookupIcdCode,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::FdaDrugLookup => "fda_drug_lookup",
            ToolKind::PubmedSearch => "pubmed_search",
            ToolKind::HealthTopics => "health_topics",
            ToolKind::ClinicalTrialsSearch => "clinical_trials_search",
            ToolKind::LookupIcdCode => "lookup_icd_code",
        }
    }

    fn definition(self) -> ToolDefinition {
        use ParamType::{Integer, String};

        let (description, params) = match self {
            ToolKind::FdaDrugLookup => (
                "Look up FDA drug information",
                vec![
                    ParamSpec::required("drug_name", String, "Name of the drug to search for"),
                    ParamSpec::optional(
                        "search_type",
                        String,
                        "Type of search (general, label, adverse_events)",
                        Some(ParamDefault::Str("general")),
                    )
                    .one_of(&["general", "label", "adverse_events"]),
                ],
            ),
            ToolKind::PubmedSearch => (
                "Search PubMed for medical literature",
                vec![
                    ParamSpec::required("query", String, "Search query for medical literature"),
                    ParamSpec::optional(
                        "max_results",
                        Integer,
                        "Maximum number of results to return",
                        Some(ParamDefault::Int(5)),
                    ),
                    ParamSpec::optional(
                        "date_range",
                        String,
                        "Limit to articles published within years (e.g. '5' for last 5 years)",
                        Some(ParamDefault::Str("")),
                    ),
                ],
            ),
            ToolKind::HealthTopics => (
                "Get health topic information from Health.gov",
                vec![
                    ParamSpec::required("topic", String, "Health topic to search for"),
                    ParamSpec::optional(
                        "language",
                        String,
                        "Language for content (en or es)",
                        Some(ParamDefault::Str("en")),
                    )
                    .one_of(&["en", "es"]),
                ],
            ),
            ToolKind::ClinicalTrialsSearch => (
                "Search for clinical trials",
                vec![
                    ParamSpec::required(
                        "condition",
                        String,
                        "Medical condition or disease to search for",
                    ),
                    ParamSpec::optional(
                        "status",
                        String,
                        "Trial status (recruiting, completed, active, not_recruiting, or all)",
                        Some(ParamDefault::Str("recruiting")),
                    ),
                    ParamSpec::optional(
                        "max_results",
                        Integer,
                        "Maximum number of results to return",
                        Some(ParamDefault::Int(10)),
                    ),
                ],
            ),
            ToolKind::LookupIcdCode => (
                "Look up ICD-10 codes and medical terminology",
                vec![
                    ParamSpec::optional("code", String, "ICD-10 code to look up", None),
                    ParamSpec::optional(
                        "description",
                        String,
                        "Medical condition description to search for",
                        None,
                    ),
                    ParamSpec::optional(
                        "max_results",
                        Integer,
                        "Maximum number of results to return",
                        Some(ParamDefault::Int(10)),
                    ),
                ],
            ),
        };

        ToolDefinition {
            kind: self,
            name: self.name(),
            description,
            params,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Integer,
}

impl ParamType {
    pub fn as_str(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDefault {
    Str(&'static str),
    Int(i64),
}

impl ParamDefault {
    pub fn to_value(self) -> Value {
        match self {
            ParamDefault::Str(s) => Value::String(s.to_string()),
            ParamDefault::Int(n) => Value::from(n),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub param_type: ParamType,
    pub description: &'static str,
    pub default: Option<ParamDefault>,
    pub required: bool,
    /// Accepted values for enumerated string parameters. Not part of the wire schema.
    pub allowed: Option<&'static [&'static str]>,
}

impl ParamSpec {
    fn required(name: &'static str, param_type: ParamType, description: &'static str) -> Self {
        Self {
            name,
            param_type,
            description,
            default: None,
            required: true,
            allowed: None,
        }
    }

    fn optional(
        name: &'static str,
        param_type: ParamType,
        description: &'static str,
        default: Option<ParamDefault>,
    ) -> Self {
        Self {
            name,
            param_type,
            description,
            default,
            required: false,
            allowed: None,
        }
    }

    fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = Some(allowed);
        self
    }

    fn schema(&self) -> Value {
        let mut property = Map::new();
        property.insert("type".into(), json!(self.param_type.as_str()));
        property.insert("description".into(), json!(self.description));
        if let Some(default) = self.default {
            property.insert("default".into(), default.to_value());
        }
        Value::Object(property)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDefinition {
    pub kind: ToolKind,
    pub name: &'static str,
    pub description: &'static str,
    /// Declaration order is the order of `inputSchema.properties`
    pub params: Vec<ParamSpec>,
}

impl ToolDefinition {
    pub fn param(&self, name: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn required_params(&self) -> Vec<&'static str> {
        self.params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect()
    }

    /// JSON-Schema `object` with `properties` and `required`
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|p| (p.name.to_string(), p.schema()))
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": self.required_params()
        })
    }

    pub fn to_wire(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema()
        })
    }
}

/// Immutable after construction; shared read-only between sessions.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
    listing: Value,
}

impl ToolRegistry {
    pub fn new() -> Self {
        let tools: Vec<ToolDefinition> = ToolKind::ALL
            .into_iter()
            .map(ToolKind::definition)
            .collect();
        let wire: Vec<Value> = tools.iter().map(ToolDefinition::to_wire).collect();

        Self {
            tools,
            listing: json!({ "tools": wire }),
        }
    }

    pub fn list_tools(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn lookup(&self, name: &str) -> Result<&ToolDefinition, McpError> {
        self.tools
            .iter()
            .find(|tool| tool.name == name)
            .ok_or_else(|| McpError::ToolNotFound(name.to_string()))
    }

    /// The `tools/list` result: `{"tools": [...]}`
    pub fn listing(&self) -> &Value {
        &self.listing
    }

    pub fn wire_tools(&self) -> Value {
        self.listing["tools"].clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|tool| tool.name).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
