//! Parsed schema AST consumed by the converter.
//!
//! The parser that produces this tree lives outside this crate; it hands the
//! tree over as JSON, so every node here is `serde`-deserializable. Tags use the
//! `type` key, node payload keys are camelCase.

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use serde_path_to_error::{Path, Segment};
use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;

/// Annotation key that selects the JavaScript representation of a type.
pub const JS_TYPE_ANNOTATION: &str = "js.type";

/// Annotation value asking for 64-bit integers to be carried as `Long`.
pub const LONG_ANNOTATION_VALUE: &str = "Long";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFile {
    /// Absolute path of the schema file this tree was parsed from.
    pub path: PathBuf,

    #[serde(default)]
    pub headers: Vec<Header>,

    #[serde(default)]
    pub definitions: Vec<Definition>,
}

impl SchemaFile {
    /// Include paths in header order.
    pub fn includes(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().filter_map(|header| match header {
            Header::Include { path } => Some(path.as_str()),
            _ => None,
        })
    }

    /// Looks up a top-level definition by its declared name.
    pub fn definition(&self, name: &str) -> Option<&Definition> {
        self.definitions.iter().find(|def| def.name() == Some(name))
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Header {
    Include {
        path: String,
    },
    Namespace {
        scope: String,
        name: String,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    Struct(StructDef),
    Exception(StructDef),
    Union(StructDef),
    Enum(EnumDef),
    Typedef(TypedefDef),
    Service(ServiceDef),
    Const(ConstDef),
    /// A node kind this tool does not know how to render.
    Other { kind: String, name: Option<String> },
}

impl Definition {
    pub fn name(&self) -> Option<&str> {
        match self {
            Definition::Struct(def) | Definition::Exception(def) | Definition::Union(def) => {
                Some(def.name.as_str())
            }
            Definition::Enum(def) => Some(def.name.as_str()),
            Definition::Typedef(def) => Some(def.name.as_str()),
            Definition::Service(def) => Some(def.name.as_str()),
            Definition::Const(def) => Some(def.name.as_str()),
            Definition::Other { name, .. } => name.as_deref(),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Definition::Struct(_) => "Struct",
            Definition::Exception(_) => "Exception",
            Definition::Union(_) => "Union",
            Definition::Enum(_) => "Enum",
            Definition::Typedef(_) => "Typedef",
            Definition::Service(_) => "Service",
            Definition::Const(_) => "Const",
            Definition::Other { kind, .. } => kind.as_str(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StructDef {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(default)]
    pub id: Option<i32>,
    pub name: String,
    pub value_type: TypeRef,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnumDef {
    pub name: String,
    #[serde(default)]
    pub members: Vec<EnumMember>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EnumMember {
    pub name: String,
    #[serde(default)]
    pub value: Option<i64>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TypedefDef {
    pub name: String,
    pub value_type: TypeRef,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDef {
    pub name: String,
    #[serde(default)]
    pub functions: Vec<Function>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub name: String,
    #[serde(default)]
    pub params: Vec<Field>,
    #[serde(default = "TypeRef::void")]
    pub returns: TypeRef,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConstDef {
    pub name: String,
    pub value_type: TypeRef,
    pub value: ConstValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Bool,
    Byte,
    I8,
    I16,
    I32,
    I64,
    Double,
    String,
    Binary,
    Void,
}

impl Primitive {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Primitive::Bool,
            "byte" => Primitive::Byte,
            "i8" => Primitive::I8,
            "i16" => Primitive::I16,
            "i32" => Primitive::I32,
            "i64" => Primitive::I64,
            "double" => Primitive::Double,
            "string" => Primitive::String,
            "binary" => Primitive::Binary,
            "void" => Primitive::Void,
            _ => return None,
        })
    }
}

pub type Annotations = IndexMap<String, String>;

#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Primitive(Primitive),
    List(Box<TypeRef>),
    Set(Box<TypeRef>),
    Map(Box<TypeRef>, Box<TypeRef>),
    Named(String),
    Annotated(Box<TypeRef>, Annotations),
    /// A type node kind this tool does not know how to render.
    Unknown(String),
}

impl TypeRef {
    pub fn void() -> Self {
        TypeRef::Primitive(Primitive::Void)
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn list(element: TypeRef) -> Self {
        TypeRef::List(Box::new(element))
    }

    pub fn set(element: TypeRef) -> Self {
        TypeRef::Set(Box::new(element))
    }

    pub fn map(key: TypeRef, value: TypeRef) -> Self {
        TypeRef::Map(Box::new(key), Box::new(value))
    }

    /// `i64 (js.type = "Long")`
    pub fn long() -> Self {
        let mut annotations = Annotations::new();
        annotations.insert(
            JS_TYPE_ANNOTATION.to_string(),
            LONG_ANNOTATION_VALUE.to_string(),
        );
        TypeRef::Annotated(Box::new(TypeRef::Primitive(Primitive::I64)), annotations)
    }

    /// Whether this node is an `i64` carrying the `js.type = "Long"` marker.
    pub fn is_long(&self) -> bool {
        match self {
            TypeRef::Annotated(inner, annotations) => {
                matches!(**inner, TypeRef::Primitive(Primitive::I64))
                    && annotations
                        .get(JS_TYPE_ANNOTATION)
                        .is_some_and(|value| value == LONG_ANNOTATION_VALUE)
            }
            _ => false,
        }
    }

    /// Whether the marker appears anywhere in this type, containers included.
    pub fn uses_long(&self) -> bool {
        match self {
            TypeRef::Annotated(inner, _) => self.is_long() || inner.uses_long(),
            TypeRef::List(element) | TypeRef::Set(element) => element.uses_long(),
            TypeRef::Map(key, value) => key.uses_long() || value.uses_long(),
            TypeRef::Primitive(_) | TypeRef::Named(_) | TypeRef::Unknown(_) => false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum ConstValue {
    Literal { value: Literal },
    List { values: Vec<ConstValue> },
    Map { entries: Vec<ConstEntry> },
    Identifier { name: String },
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConstEntry {
    pub key: ConstValue,
    pub value: ConstValue,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
}

// Tagged nodes are buffered, their `type` tag read, then the matching shape
// decoded with its own path tracker. Failures carry the path below the node,
// which the enclosing tracker extends, so errors point at the exact JSON key.

impl<'de> Deserialize<'de> for Definition {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let node = TaggedNode::read(deserializer)?;
        let def = match node.kind.as_str() {
            "Struct" => Definition::Struct(node.decode()?),
            "Exception" => Definition::Exception(node.decode()?),
            "Union" => Definition::Union(node.decode()?),
            "Enum" => Definition::Enum(node.decode()?),
            "Typedef" => Definition::Typedef(node.decode()?),
            "Service" => Definition::Service(node.decode()?),
            "Const" => Definition::Const(node.decode()?),
            _ => Definition::Other {
                name: node.body.get("name").and_then(Value::as_str).map(str::to_string),
                kind: node.kind,
            },
        };
        Ok(def)
    }
}

#[derive(Deserialize)]
struct PrimitiveNode {
    name: String,
}

#[derive(Deserialize)]
struct ElementNode {
    element: Box<TypeRef>,
}

#[derive(Deserialize)]
struct MapNode {
    key: Box<TypeRef>,
    value: Box<TypeRef>,
}

#[derive(Deserialize)]
struct NamedNode {
    name: String,
}

#[derive(Deserialize)]
struct AnnotatedNode {
    inner: Box<TypeRef>,
    #[serde(default)]
    annotations: Annotations,
}

impl<'de> Deserialize<'de> for TypeRef {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let node = TaggedNode::read(deserializer)?;
        let ty = match node.kind.as_str() {
            "Primitive" => {
                let PrimitiveNode { name } = node.decode()?;
                match Primitive::from_name(&name) {
                    Some(primitive) => TypeRef::Primitive(primitive),
                    None => TypeRef::Unknown(format!("Primitive({name})")),
                }
            }
            "List" => TypeRef::List(node.decode::<ElementNode>()?.element),
            "Set" => TypeRef::Set(node.decode::<ElementNode>()?.element),
            "Map" => {
                let MapNode { key, value } = node.decode()?;
                TypeRef::Map(key, value)
            }
            "Named" => TypeRef::Named(node.decode::<NamedNode>()?.name),
            "Annotated" => {
                let AnnotatedNode { inner, annotations } = node.decode()?;
                TypeRef::Annotated(inner, annotations)
            }
            _ => TypeRef::Unknown(node.kind),
        };
        Ok(ty)
    }
}

struct TaggedNode<E> {
    kind: String,
    body: Value,
    error: PhantomData<E>,
}

impl<E: serde::de::Error> TaggedNode<E> {
    fn read<'de, D>(deserializer: D) -> std::result::Result<Self, E>
    where
        D: Deserializer<'de, Error = E>,
    {
        let body = Value::deserialize(deserializer)?;
        let kind = body
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| E::custom("missing string field `type`"))?
            .to_string();
        Ok(Self {
            kind,
            body,
            error: PhantomData,
        })
    }

    fn decode<T: DeserializeOwned>(&self) -> std::result::Result<T, E> {
        decode(self.body.clone()).map_err(E::custom)
    }
}

/// A decode failure and the path of the JSON key it happened at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    pub path: String,
    pub message: String,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{} (at `{}`)", self.message, self.path)
        }
    }
}

/// Decodes `value`, locating any failure down to the offending key.
pub fn decode<T: DeserializeOwned>(value: Value) -> std::result::Result<T, DecodeError> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let outer = render_path(err.path());
        let inner = err.into_inner().to_string();
        let (message, below) = split_located(&inner);
        DecodeError {
            path: join_path(&outer, below),
            message: message.to_string(),
        }
    })
}

fn render_path(path: &Path) -> String {
    let mut rendered = String::new();
    for segment in path.iter() {
        let key = match segment {
            Segment::Seq { index } => {
                rendered.push_str(&format!("[{index}]"));
                continue;
            }
            Segment::Map { key } => key.as_str(),
            Segment::Enum { variant } => variant.as_str(),
            Segment::Unknown => "?",
        };
        if !rendered.is_empty() {
            rendered.push('.');
        }
        rendered.push_str(key);
    }
    rendered
}

/// Splits a message produced by [`DecodeError`]'s `Display` back into its
/// message and path.
fn split_located(message: &str) -> (&str, &str) {
    const OPEN: &str = " (at `";
    const CLOSE: &str = "`)";
    match message.rfind(OPEN) {
        Some(start) if message.ends_with(CLOSE) => (
            &message[..start],
            &message[start + OPEN.len()..message.len() - CLOSE.len()],
        ),
        _ => (message, ""),
    }
}

fn join_path(outer: &str, inner: &str) -> String {
    match (outer.is_empty(), inner.is_empty()) {
        (_, true) => outer.to_string(),
        (true, false) => inner.to_string(),
        (false, false) if inner.starts_with('[') => format!("{outer}{inner}"),
        (false, false) => format!("{outer}.{inner}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_definition_kind_becomes_other() {
        let def: Definition =
            serde_json::from_value(json!({ "type": "Interaction", "name": "Chat" })).unwrap();
        assert_eq!(
            def,
            Definition::Other {
                kind: "Interaction".to_string(),
                name: Some("Chat".to_string()),
            }
        );
    }

    #[test]
    fn malformed_known_definition_is_an_error() {
        let err = decode::<Definition>(json!({ "type": "Struct", "fields": [] })).unwrap_err();
        assert_eq!(err.message, "missing field `name`");
    }

    #[test]
    fn missing_tag_is_an_error() {
        assert!(decode::<TypeRef>(json!({ "name": "i32" })).is_err());
    }

    #[test]
    fn nested_errors_keep_their_full_path() {
        let err = decode::<SchemaFile>(json!({
            "path": "/x.thrift",
            "definitions": [{
                "type": "Struct",
                "name": "User",
                "fields": [{
                    "name": "tags",
                    "valueType": {
                        "type": "List",
                        "element": { "type": "Named", "name": 5 }
                    }
                }]
            }]
        }))
        .unwrap_err();

        assert_eq!(err.path, "definitions[0].fields[0].valueType.element.name");
        assert_eq!(err.message, "invalid type: integer `5`, expected a string");
    }

    #[test]
    fn type_refs_decode_recursively() {
        let ty: TypeRef = serde_json::from_value(json!({
            "type": "Map",
            "key": { "type": "Primitive", "name": "string" },
            "value": {
                "type": "List",
                "element": {
                    "type": "Annotated",
                    "inner": { "type": "Primitive", "name": "i64" },
                    "annotations": { "js.type": "Long" }
                }
            }
        }))
        .unwrap();

        assert_eq!(
            ty,
            TypeRef::map(TypeRef::Primitive(Primitive::String), TypeRef::list(TypeRef::long()))
        );
        assert!(ty.uses_long());
        assert!(!ty.is_long());
    }

    #[test]
    fn unknown_type_kind_is_kept() {
        let ty: TypeRef = serde_json::from_value(json!({ "type": "Stream" })).unwrap();
        assert_eq!(ty, TypeRef::Unknown("Stream".to_string()));
    }

    #[test]
    fn unknown_primitive_is_kept() {
        let ty: TypeRef =
            serde_json::from_value(json!({ "type": "Primitive", "name": "uuid" })).unwrap();
        assert_eq!(ty, TypeRef::Unknown("Primitive(uuid)".to_string()));
    }

    #[test]
    fn function_return_defaults_to_void() {
        let function: Function = serde_json::from_value(json!({ "name": "ping" })).unwrap();
        assert_eq!(function.returns, TypeRef::void());
        assert!(function.params.is_empty());
    }

    #[test]
    fn literals_keep_their_scalar_kind() {
        let values: Vec<Literal> = serde_json::from_value(json!([true, 3, 2.5, "x"])).unwrap();
        assert_eq!(
            values,
            vec![
                Literal::Bool(true),
                Literal::Int(3),
                Literal::Double(2.5),
                Literal::String("x".to_string()),
            ]
        );
    }
}
