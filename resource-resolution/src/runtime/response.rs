use crate::meta::ResourceAssignment;
use crate::util::SourceError;
use indexmap::IndexMap;
use serde_json::{Map, Value};

pub const PRIMITIVE_TYPES: [&str; 7] = ["string", "integer", "float", "double", "boolean", "timestamp", "json"];
pub const COLLECTION_TYPES: [&str; 2] = ["list", "array"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    Primitive,
    Collection,
    Complex,
}

impl ValueShape {
    pub fn of(r#type: &str) -> Self {
        if r#type.is_empty() || PRIMITIVE_TYPES.contains(&r#type) {
            ValueShape::Primitive
        } else if COLLECTION_TYPES.contains(&r#type) {
            ValueShape::Collection
        } else {
            ValueShape::Complex
        }
    }
}

/// Projects a raw source result onto the assignment's property type.
/// `output_mapping` maps an output name to the response field it is read
/// from.
pub fn project(
    ra: &ResourceAssignment,
    output_mapping: &IndexMap<String, String>,
    response: &Value,
) -> Result<Value, SourceError> {
    let r#type = ra.property.as_ref().map(|p| p.r#type.as_str()).unwrap_or_default();
    match ValueShape::of(r#type) {
        ValueShape::Primitive => primitive(output_mapping, response),
        ValueShape::Collection => collection(ra, output_mapping, response),
        ValueShape::Complex => Ok(complex(ra, output_mapping, response)),
    }
}

fn primitive(output_mapping: &IndexMap<String, String>, response: &Value) -> Result<Value, SourceError> {
    let field = output_mapping.values().next();
    let element = match (response, field) {
        (Value::Array(items), None) => items
            .first()
            .ok_or_else(|| SourceError::Mapping("no element found in the response".into()))?,
        (Value::Array(items), Some(field)) => items
            .iter()
            .find(|item| item.get(field).is_some())
            .ok_or_else(|| {
                SourceError::Mapping(format!("no response element carries output key mapping ({field})"))
            })?,
        _ => response,
    };
    match (element, field) {
        (Value::Object(map), Some(field)) => map.get(field).cloned().ok_or_else(|| {
            SourceError::Mapping(format!("no response element carries output key mapping ({field})"))
        }),
        _ => Ok(element.clone()),
    }
}

fn mapped_object(output_mapping: &IndexMap<String, String>, element: &Value) -> Value {
    let object: Map<String, Value> = output_mapping
        .iter()
        .map(|(name, field)| (name.clone(), element.get(field).cloned().unwrap_or(Value::Null)))
        .collect();
    Value::Object(object)
}

fn collection(
    ra: &ResourceAssignment,
    output_mapping: &IndexMap<String, String>,
    response: &Value,
) -> Result<Value, SourceError> {
    let has_entry_schema = ra
        .property
        .as_ref()
        .and_then(|p| p.entry_schema.as_ref())
        .map_or(false, |schema| !schema.r#type.trim().is_empty());
    if !has_entry_schema {
        return Err(SourceError::Mapping(format!(
            "no entry schema declared for collection ({})",
            ra.dictionary_name()
        )));
    }

    let items: Vec<Value> = match (response, output_mapping.is_empty()) {
        (Value::Array(items), false) => items.iter().map(|item| mapped_object(output_mapping, item)).collect(),
        (Value::Object(map), false) => output_mapping
            .iter()
            .map(|(name, field)| {
                let mut object = Map::new();
                object.insert(name.clone(), map.get(field).cloned().unwrap_or(Value::Null));
                Value::Object(object)
            })
            .collect(),
        (_, false) => {
            return Err(SourceError::Mapping(
                "key-value response expected for output key mapping".into(),
            ))
        }
        (Value::Array(items), true) => items.clone(),
        (Value::Object(map), true) => map
            .iter()
            .map(|(k, v)| {
                let mut object = Map::new();
                object.insert(k.clone(), v.clone());
                Value::Object(object)
            })
            .collect(),
        (other, true) => vec![other.clone()],
    };
    Ok(Value::Array(items))
}

fn complex(ra: &ResourceAssignment, output_mapping: &IndexMap<String, String>, response: &Value) -> Value {
    if output_mapping.is_empty() {
        let mut object = Map::new();
        object.insert(ra.dictionary_name().to_string(), response.clone());
        return Value::Object(object);
    }
    mapped_object(output_mapping, response)
}
