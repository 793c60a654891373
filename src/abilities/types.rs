//! Type definitions for abilities and their classification.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A named, schema-described capability an AI planner may invoke.
///
/// Mirrors the MCP tool descriptor shape (`name`, `description`,
/// `inputSchema`) so `list_tools` responses deserialize directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ability {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub input_schema: InputSchema,
}

impl Ability {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema: InputSchema::default(),
        }
    }

    /// Adds a schema property, marking it required when asked.
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        entry_type: &str,
        description: impl Into<String>,
        required: bool,
    ) -> Self {
        let name = name.into();
        if required {
            self.input_schema.required.push(name.clone());
        }
        self.input_schema.properties.insert(
            name,
            SchemaEntry {
                entry_type: Some(Value::String(entry_type.to_string())),
                description: Some(description.into()),
                extra: Map::new(),
            },
        );
        self
    }

    /// The synthetic web search ability registered alongside every corpus.
    pub fn web_search() -> Self {
        Ability::new(
            "web-search",
            "Search the web for current information, documentation and examples",
        )
        .with_property("query", "string", "The search query", true)
    }

    pub fn description_or_empty(&self) -> &str {
        self.description.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type", default = "default_schema_type")]
    pub schema_type: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: BTreeMap<String, SchemaEntry>,

    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

impl Default for InputSchema {
    fn default() -> Self {
        Self {
            schema_type: default_schema_type(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }
}

/// One property of an ability's input schema.
///
/// Only `type` and `description` are interpreted; everything else
/// (enums, nested schemas, defaults) is carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SchemaEntry {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SchemaEntry {
    /// Human-readable type, joining union types like `["string", "null"]`.
    pub fn type_label(&self) -> String {
        match &self.entry_type {
            Some(Value::String(t)) => t.clone(),
            Some(Value::Array(types)) => {
                let names: Vec<&str> = types.iter().filter_map(|t| t.as_str()).collect();
                if names.is_empty() {
                    "any".to_string()
                } else {
                    names.join("|")
                }
            }
            _ => "any".to_string(),
        }
    }
}

/// Where an ability lives in the catalog tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityPath {
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub ability_name: String,
}

impl AbilityPath {
    /// Slash-separated form, e.g. `github/repos/list-github-repos`.
    pub fn display_path(&self) -> String {
        match &self.subcategory {
            Some(sub) => format!("{}/{}/{}", self.category, sub, self.ability_name),
            None => format!("{}/{}", self.category, self.ability_name),
        }
    }
}

fn default_schema_type() -> String {
    "object".to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
