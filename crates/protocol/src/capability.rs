use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Map, Value};
use std::fmt;

/// The three capability namespaces. Ids are unique within a namespace, not across them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    Resource,
    Tool,
    Prompt,
}

impl CapabilityKind {
    pub const ALL: [CapabilityKind; 3] = [Self::Resource, Self::Tool, Self::Prompt];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resource => "resource",
            Self::Tool => "tool",
            Self::Prompt => "prompt",
        }
    }

    /// Accepts both singular and plural spellings (`tool`, `tools`).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "resource" | "resources" => Some(Self::Resource),
            "tool" | "tools" => Some(Self::Tool),
            "prompt" | "prompts" => Some(Self::Prompt),
            _ => None,
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document the server can hand out by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    pub id: &'static str,
    pub display_name: &'static str,
    pub media_type: &'static str,
    pub description: &'static str,
}

/// Primitive kind of a tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Boolean,
    /// A string restricted to the listed values.
    Enum(&'static [&'static str]),
}

impl ParamKind {
    pub const fn json_type(self) -> &'static str {
        match self {
            Self::String | Self::Enum(_) => "string",
            Self::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamDefault {
    Str(&'static str),
    Bool(bool),
}

impl ParamDefault {
    pub fn to_value(self) -> Value {
        match self {
            Self::Str(value) => Value::String(value.to_string()),
            Self::Bool(value) => Value::Bool(value),
        }
    }
}

/// One entry of a tool's input shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<ParamDefault>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub id: &'static str,
    pub description: &'static str,
    pub input_shape: &'static [ParamSpec],
}

impl ToolDescriptor {
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.input_shape.iter().find(|param| param.name == name)
    }

    /// JSON Schema object published to clients for this tool's arguments.
    pub fn input_schema(&self) -> Map<String, Value> {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for param in self.input_shape {
            let mut prop = Map::new();
            prop.insert("type".into(), json!(param.kind.json_type()));
            prop.insert("description".into(), json!(param.description));
            if let ParamKind::Enum(values) = param.kind {
                prop.insert("enum".into(), json!(values));
            }
            if let Some(default) = param.default {
                prop.insert("default".into(), default.to_value());
            }
            properties.insert(param.name.to_string(), Value::Object(prop));
            if param.required {
                required.push(param.name);
            }
        }

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        schema.insert("required".into(), json!(required));
        schema.insert("additionalProperties".into(), json!(false));
        schema
    }
}

impl Serialize for ToolDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_struct("ToolDescriptor", 3)?;
        out.serialize_field("id", self.id)?;
        out.serialize_field("description", self.description)?;
        out.serialize_field("inputSchema", &self.input_schema())?;
        out.end()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PromptParam {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PromptDescriptor {
    pub id: &'static str,
    pub description: &'static str,
    pub parameters: &'static [PromptParam],
}

impl PromptDescriptor {
    pub fn param(&self, name: &str) -> Option<&'static PromptParam> {
        self.parameters.iter().find(|param| param.name == name)
    }
}

/// Borrowed view over any registered descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Descriptor<'a> {
    Resource(&'a ResourceDescriptor),
    Tool(&'a ToolDescriptor),
    Prompt(&'a PromptDescriptor),
}

impl Descriptor<'_> {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Resource(d) => d.id,
            Self::Tool(d) => d.id,
            Self::Prompt(d) => d.id,
        }
    }

    pub fn kind(&self) -> CapabilityKind {
        match self {
            Self::Resource(_) => CapabilityKind::Resource,
            Self::Tool(_) => CapabilityKind::Tool,
            Self::Prompt(_) => CapabilityKind::Prompt,
        }
    }
}
