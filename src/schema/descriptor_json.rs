//! Converts the registry's JSON descriptor representation into
//! `prost_types::FileDescriptorProto`.
//!
//! The registry's `GetImage` RPC returns each file following protobuf's
//! canonical JSON mapping (camelCase field names, enums spelled out as
//! their string names) rather than binary-encoded bytes, so `prost`'s
//! `Message::decode` doesn't apply here. These shadow structs mirror just
//! the shape of `descriptor.proto` this crate needs; any field they don't
//! declare is dropped silently by `serde_json`, which is the unknown-field
//! tolerance the resolver requires.

use crate::error::{McpError, McpResult};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, MessageOptions, OneofDescriptorProto,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JsonFileDescriptorProto {
    name: Option<String>,
    package: Option<String>,
    dependency: Vec<String>,
    message_type: Vec<JsonDescriptorProto>,
    enum_type: Vec<JsonEnumDescriptorProto>,
    syntax: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct JsonDescriptorProto {
    name: Option<String>,
    field: Vec<JsonFieldDescriptorProto>,
    nested_type: Vec<JsonDescriptorProto>,
    enum_type: Vec<JsonEnumDescriptorProto>,
    oneof_decl: Vec<JsonOneofDescriptorProto>,
    options: Option<JsonMessageOptions>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct JsonMessageOptions {
    map_entry: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct JsonOneofDescriptorProto {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct JsonFieldDescriptorProto {
    name: Option<String>,
    number: Option<i32>,
    label: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    type_name: Option<String>,
    oneof_index: Option<i32>,
    json_name: Option<String>,
    proto3_optional: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct JsonEnumDescriptorProto {
    name: Option<String>,
    value: Vec<JsonEnumValueDescriptorProto>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct JsonEnumValueDescriptorProto {
    name: Option<String>,
    number: Option<i32>,
}

impl JsonFileDescriptorProto {
    pub fn into_proto(self) -> McpResult<FileDescriptorProto> {
        Ok(FileDescriptorProto {
            name: self.name,
            package: self.package,
            dependency: self.dependency,
            message_type: convert_all(self.message_type, JsonDescriptorProto::into_proto)?,
            enum_type: convert_all(self.enum_type, JsonEnumDescriptorProto::into_proto)?,
            syntax: self.syntax,
            ..Default::default()
        })
    }
}

impl JsonDescriptorProto {
    fn into_proto(self) -> McpResult<DescriptorProto> {
        Ok(DescriptorProto {
            name: self.name,
            field: convert_all(self.field, JsonFieldDescriptorProto::into_proto)?,
            nested_type: convert_all(self.nested_type, JsonDescriptorProto::into_proto)?,
            enum_type: convert_all(self.enum_type, JsonEnumDescriptorProto::into_proto)?,
            oneof_decl: self
                .oneof_decl
                .into_iter()
                .map(|o| OneofDescriptorProto {
                    name: o.name,
                    ..Default::default()
                })
                .collect(),
            options: self.options.map(|o| MessageOptions {
                map_entry: o.map_entry,
                ..Default::default()
            }),
            ..Default::default()
        })
    }
}

impl JsonFieldDescriptorProto {
    fn into_proto(self) -> McpResult<FieldDescriptorProto> {
        let label = self
            .label
            .map(|s| {
                Label::from_str_name(&s)
                    .ok_or_else(|| McpError::MalformedMessage(format!("unknown field label: {s}")))
            })
            .transpose()?
            .map(|l| l as i32);
        let kind = self
            .kind
            .map(|s| {
                Type::from_str_name(&s)
                    .ok_or_else(|| McpError::MalformedMessage(format!("unknown field type: {s}")))
            })
            .transpose()?
            .map(|t| t as i32);

        Ok(FieldDescriptorProto {
            name: self.name,
            number: self.number,
            label,
            r#type: kind,
            type_name: self.type_name,
            oneof_index: self.oneof_index,
            json_name: self.json_name,
            proto3_optional: self.proto3_optional,
            ..Default::default()
        })
    }
}

impl JsonEnumDescriptorProto {
    fn into_proto(self) -> McpResult<EnumDescriptorProto> {
        Ok(EnumDescriptorProto {
            name: self.name,
            value: self
                .value
                .into_iter()
                .map(|v| EnumValueDescriptorProto {
                    name: v.name,
                    number: v.number,
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        })
    }
}

fn convert_all<T, U>(items: Vec<T>, f: impl Fn(T) -> McpResult<U>) -> McpResult<Vec<U>> {
    items.into_iter().map(f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_a_message_with_a_labeled_typed_field() {
        let json = r#"{
            "name": "foo.proto",
            "package": "acme.v1",
            "messageType": [{
                "name": "CreateTaskRequest",
                "field": [
                    {"name": "title", "number": 1, "label": "LABEL_OPTIONAL", "type": "TYPE_STRING", "jsonName": "title"}
                ]
            }]
        }"#;
        let parsed: JsonFileDescriptorProto = serde_json::from_str(json).unwrap();
        let proto = parsed.into_proto().unwrap();
        assert_eq!(proto.package.as_deref(), Some("acme.v1"));
        let message = &proto.message_type[0];
        assert_eq!(message.name.as_deref(), Some("CreateTaskRequest"));
        let field = &message.field[0];
        assert_eq!(field.r#type, Some(Type::String as i32));
        assert_eq!(field.label, Some(Label::Optional as i32));
    }

    #[test]
    fn unrecognized_json_fields_are_tolerated_rather_than_rejected() {
        let json = r#"{
            "name": "foo.proto",
            "somethingThisCrateDoesNotModel": 42,
            "messageType": [{"name": "Foo", "aCompletelyUnknownKey": "value"}]
        }"#;
        let parsed: JsonFileDescriptorProto = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.message_type[0].name.as_deref(), Some("Foo"));
    }

    #[test]
    fn unknown_enum_string_name_is_a_malformed_message_error() {
        let json = r#"{
            "name": "foo.proto",
            "messageType": [{
                "name": "Foo",
                "field": [{"name": "bar", "number": 1, "type": "TYPE_NOT_A_REAL_TYPE"}]
            }]
        }"#;
        let parsed: JsonFileDescriptorProto = serde_json::from_str(json).unwrap();
        let err = parsed.into_proto().unwrap_err();
        assert!(matches!(err, McpError::MalformedMessage(_)));
    }
}
