use super::constants::USER_SYSTEM;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntrySchema {
    #[serde(rename = "type")]
    pub r#type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    #[serde(rename = "type", default)]
    pub r#type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(rename = "default", default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(rename = "entry_schema", alias = "entry-schema", default, skip_serializing_if = "Option::is_none")]
    pub entry_schema: Option<EntrySchema>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl PropertyDefinition {
    pub fn of_type(r#type: impl Into<String>) -> Self {
        Self { r#type: r#type.into(), ..Default::default() }
    }

    pub fn is_required(&self) -> bool {
        self.required.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    #[default]
    Pending,
    Success,
    Failure,
    /// Not attempted because a dependency did not resolve.
    Blocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyIdentifier {
    pub name: String,
    pub value: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResourceAssignment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<PropertyDefinition>,
    #[serde(default)]
    pub input_param: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dictionary_source: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i32>,
    #[serde(default)]
    pub status: AssignmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_identifiers: Vec<KeyIdentifier>,
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |s| s.trim().is_empty())
}

impl ResourceAssignment {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    pub fn with_dictionary(mut self, dictionary_name: impl Into<String>) -> Self {
        self.dictionary_name = Some(dictionary_name.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.dictionary_source = Some(source.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.property = Some(property);
        self
    }

    pub fn dictionary_name(&self) -> &str {
        self.dictionary_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.name)
    }

    pub fn source(&self) -> Option<&str> {
        self.dictionary_source.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn has_blank_source(&self) -> bool {
        blank(&self.dictionary_source)
    }

    pub fn has_blank_dictionary_name(&self) -> bool {
        blank(&self.dictionary_name)
    }

    /// Graph label used in validation messages: `(dictionaryName:name)`.
    pub fn label(&self) -> String {
        format!("({}:{})", self.dictionary_name(), self.name)
    }

    pub fn value(&self) -> Option<&Value> {
        self.property.as_ref().and_then(|p| p.value.as_ref())
    }

    pub fn is_resolved(&self) -> bool {
        self.status == AssignmentStatus::Success
    }

    pub fn is_required(&self) -> bool {
        self.property.as_ref().map_or(false, PropertyDefinition::is_required)
    }

    pub fn set_resolved(&mut self, value: Option<Value>) {
        self.property.get_or_insert_with(PropertyDefinition::default).value = value;
        self.status = AssignmentStatus::Success;
        self.message = None;
        self.touch();
    }

    pub fn set_failed(&mut self, message: impl Into<String>) {
        self.status = AssignmentStatus::Failure;
        self.message = Some(message.into());
        self.touch();
    }

    pub fn set_blocked(&mut self, message: impl Into<String>) {
        self.status = AssignmentStatus::Blocked;
        self.message = Some(message.into());
        self.touch();
    }

    pub fn record_key_identifiers(&mut self, bindings: &IndexMap<String, Value>) {
        self.key_identifiers.extend(
            bindings
                .iter()
                .map(|(name, value)| KeyIdentifier { name: name.clone(), value: value.clone() }),
        );
    }

    fn touch(&mut self) {
        self.updated_date = Some(Utc::now());
        self.updated_by = Some(USER_SYSTEM.to_string());
    }
}
