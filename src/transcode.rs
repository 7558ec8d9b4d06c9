//! JSON ↔ schema transcoding: generates a JSON-Schema view of a message
//! descriptor, and converts JSON arguments to/from the binary wire form
//! of a dynamically resolved message type.

use crate::error::{McpError, McpResult};
use prost::Message;
use prost_reflect::{DynamicMessage, Kind, MessageDescriptor};
use serde_json::{json, Value};
use std::collections::HashSet;

#[cfg(test)]
use prost_types::{
    field_descriptor_proto::{Label, Type},
    DescriptorProto, FieldDescriptorProto, FileDescriptorProto,
};

const WELL_KNOWN_TIMESTAMP: &str = "google.protobuf.Timestamp";
const WELL_KNOWN_DURATION: &str = "google.protobuf.Duration";
const WELL_KNOWN_ANY: &str = "google.protobuf.Any";
const WELL_KNOWN_STRUCT: &str = "google.protobuf.Struct";
const WELL_KNOWN_VALUE: &str = "google.protobuf.Value";

/// Generates a JSON-Schema-ish view of `descriptor`. Recursive message
/// types are short-circuited to `{"type":"object"}` on re-entry so
/// self-referential schemas (e.g. tree-shaped messages) still terminate.
pub fn message_to_json_schema(descriptor: &MessageDescriptor) -> Value {
    let mut visited = HashSet::new();
    message_schema(descriptor, &mut visited)
}

fn message_schema(descriptor: &MessageDescriptor, visited: &mut HashSet<String>) -> Value {
    let full_name = descriptor.full_name().to_string();

    match full_name.as_str() {
        WELL_KNOWN_TIMESTAMP => return json!({"type": "string", "format": "date-time"}),
        WELL_KNOWN_DURATION => return json!({"type": "string"}),
        WELL_KNOWN_ANY => {
            return json!({
                "type": "object",
                "properties": { "@type": { "type": "string" } },
                "additionalProperties": true
            })
        }
        WELL_KNOWN_STRUCT => return json!({"type": "object"}),
        WELL_KNOWN_VALUE => return json!({}),
        _ => {}
    }

    if !visited.insert(full_name.clone()) {
        return json!({"type": "object"});
    }

    let mut properties = serde_json::Map::new();
    for field in descriptor.fields() {
        properties.insert(field.json_name().to_string(), field_schema(&field, visited));
    }
    visited.remove(&full_name);

    json!({
        "type": "object",
        "properties": Value::Object(properties),
    })
}

fn field_schema(field: &prost_reflect::FieldDescriptor, visited: &mut HashSet<String>) -> Value {
    if field.is_map() {
        let map_entry = field.kind();
        let value_field = match &map_entry {
            Kind::Message(m) => m.fields().find(|f| f.name() == "value"),
            _ => None,
        };
        let value_schema = value_field
            .map(|f| field_schema(&f, visited))
            .unwrap_or(json!({"type": "string"}));
        return json!({"type": "object", "additionalProperties": value_schema});
    }

    if field.is_list() {
        let items = scalar_or_message_schema(field, visited);
        return json!({"type": "array", "items": items});
    }

    scalar_or_message_schema(field, visited)
}

fn scalar_or_message_schema(field: &prost_reflect::FieldDescriptor, visited: &mut HashSet<String>) -> Value {
    match field.kind() {
        Kind::Bool => json!({"type": "boolean"}),
        Kind::String => json!({"type": "string"}),
        Kind::Bytes => json!({"type": "string", "contentEncoding": "base64"}),
        Kind::Int32
        | Kind::Int64
        | Kind::Uint32
        | Kind::Uint64
        | Kind::Sint32
        | Kind::Sint64
        | Kind::Fixed32
        | Kind::Fixed64
        | Kind::Sfixed32
        | Kind::Sfixed64 => json!({"type": "integer"}),
        Kind::Float | Kind::Double => json!({"type": "number"}),
        Kind::Enum(e) => {
            let values: Vec<String> = e.values().map(|v| v.name().to_string()).collect();
            json!({"type": "string", "enum": values})
        }
        Kind::Message(m) => message_schema(&m, visited),
    }
}

/// Decodes `arguments` into an empty dynamic message of `descriptor`'s
/// type, tolerating unknown fields, then re-encodes it to the binary wire
/// form the registry/handler expects.
pub fn json_to_binary(descriptor: &MessageDescriptor, arguments: &Value) -> McpResult<Vec<u8>> {
    let message = DynamicMessage::deserialize(descriptor.clone(), arguments)
        .map_err(|e| McpError::MalformedMessage(e.to_string()))?;
    let mut buf = Vec::with_capacity(message.encoded_len());
    message
        .encode(&mut buf)
        .map_err(|e| McpError::Internal(e.to_string()))?;
    Ok(buf)
}

/// Decodes binary-encoded bytes of `descriptor`'s type back into a JSON
/// value (used to render tool results that carry a schema reference).
pub fn binary_to_json(descriptor: &MessageDescriptor, bytes: &[u8]) -> McpResult<Value> {
    let message = DynamicMessage::decode(descriptor.clone(), bytes)
        .map_err(|e| McpError::MalformedMessage(e.to_string()))?;
    serde_json::to_value(&message).map_err(McpError::Json)
}
