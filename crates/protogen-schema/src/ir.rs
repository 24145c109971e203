//! In-memory schema graph.
//!
//! A [`Schema`] is a set of [`ProtoFile`]s, each owning the type definitions it
//! declares. Types refer to each other by fully-qualified name; after linking,
//! every reference names a type present in the same schema.

use std::collections::BTreeMap;

/// A complete, linked schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    /// Source files, ordered by path.
    pub files: Vec<ProtoFile>,
}

/// A single `.proto` source unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtoFile {
    /// Path relative to its source root (e.g. `squareup/geology/period.proto`).
    pub path: String,
    /// Declared package, if any.
    pub package: Option<String>,
    /// Imported file paths, as written.
    pub imports: Vec<String>,
    /// File-level options (`java_package`, ...), values unquoted.
    pub options: BTreeMap<String, String>,
    /// Top-level types in declaration order.
    pub types: Vec<TypeDef>,
}

/// A message, enum, or service declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    /// Fully-qualified name (e.g. `squareup.geology.Period`).
    pub name: String,
    /// Documentation comment.
    pub docs: Option<String>,
    /// The type's shape.
    pub kind: TypeDefKind,
    /// Types declared inside this one.
    pub nested: Vec<TypeDef>,
}

/// The kind of type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDefKind {
    Message(MessageDef),
    Enum(EnumDef),
    Service(ServiceDef),
    /// A message kept only to hold retained nested types.
    Enclosing,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageDef {
    pub fields: Vec<Field>,
}

/// A message field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub tag: u32,
    pub label: Label,
    pub ty: FieldType,
    pub docs: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Optional,
    Required,
    Repeated,
}

/// A field's type: a scalar, or a reference to another type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Scalar(Scalar),
    /// Fully-qualified once linked; as written before.
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool,
    Bytes,
    Double,
    Float,
    Fixed32,
    Fixed64,
    Int32,
    Int64,
    Sfixed32,
    Sfixed64,
    Sint32,
    Sint64,
    String,
    Uint32,
    Uint64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumDef {
    pub constants: Vec<EnumConstant>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstant {
    pub name: String,
    pub tag: i32,
    pub docs: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceDef {
    pub rpcs: Vec<Rpc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rpc {
    pub name: String,
    pub request: String,
    pub response: String,
    pub client_streaming: bool,
    pub server_streaming: bool,
    pub docs: Option<String>,
}

impl Scalar {
    /// Look up a scalar by its `.proto` keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "bool" => Self::Bool,
            "bytes" => Self::Bytes,
            "double" => Self::Double,
            "float" => Self::Float,
            "fixed32" => Self::Fixed32,
            "fixed64" => Self::Fixed64,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "sfixed32" => Self::Sfixed32,
            "sfixed64" => Self::Sfixed64,
            "sint32" => Self::Sint32,
            "sint64" => Self::Sint64,
            "string" => Self::String,
            "uint32" => Self::Uint32,
            "uint64" => Self::Uint64,
            _ => return None,
        })
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Bytes => "bytes",
            Self::Double => "double",
            Self::Float => "float",
            Self::Fixed32 => "fixed32",
            Self::Fixed64 => "fixed64",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Sfixed32 => "sfixed32",
            Self::Sfixed64 => "sfixed64",
            Self::Sint32 => "sint32",
            Self::Sint64 => "sint64",
            Self::String => "string",
            Self::Uint32 => "uint32",
            Self::Uint64 => "uint64",
        }
    }
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: ProtoFile) {
        self.files.push(file);
    }

    /// Returns the file at `path`.
    pub fn file(&self, path: &str) -> Option<&ProtoFile> {
        self.files.iter().find(|f| f.path == path)
    }

    /// Every type in the schema, nested types included, depth-first.
    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.files.iter().flat_map(|f| f.all_types())
    }

    /// Find a type by fully-qualified name.
    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types().find(|t| t.name == name)
    }

    /// Number of types, nested types included.
    pub fn type_count(&self) -> usize {
        self.types().count()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ProtoFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn with_type(mut self, ty: TypeDef) -> Self {
        self.types.push(ty);
        self
    }

    /// Every type declared in this file, nested types included, depth-first.
    pub fn all_types(&self) -> impl Iterator<Item = &TypeDef> {
        let mut stack: Vec<&TypeDef> = self.types.iter().rev().collect();
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.nested.iter().rev());
            Some(next)
        })
    }

    /// Value of a file-level option, e.g. `java_package`.
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }
}

impl TypeDef {
    pub fn message(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            name: name.into(),
            docs: None,
            kind: TypeDefKind::Message(MessageDef { fields }),
            nested: Vec::new(),
        }
    }

    pub fn enumeration(name: impl Into<String>, constants: Vec<(&str, i32)>) -> Self {
        Self {
            name: name.into(),
            docs: None,
            kind: TypeDefKind::Enum(EnumDef {
                constants: constants
                    .into_iter()
                    .map(|(name, tag)| EnumConstant {
                        name: name.to_string(),
                        tag,
                        docs: None,
                    })
                    .collect(),
            }),
            nested: Vec::new(),
        }
    }

    pub fn service(name: impl Into<String>, rpcs: Vec<Rpc>) -> Self {
        Self {
            name: name.into(),
            docs: None,
            kind: TypeDefKind::Service(ServiceDef { rpcs }),
            nested: Vec::new(),
        }
    }

    pub fn with_docs(mut self, docs: impl Into<String>) -> Self {
        self.docs = Some(docs.into());
        self
    }

    pub fn with_nested(mut self, nested: TypeDef) -> Self {
        self.nested.push(nested);
        self
    }

    /// The last segment of the fully-qualified name.
    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }

    /// Fully-qualified names of the types this definition refers to directly.
    ///
    /// Nested types are not dependencies of their enclosing type.
    pub fn dependencies(&self) -> Vec<&str> {
        match &self.kind {
            TypeDefKind::Message(message) => message
                .fields
                .iter()
                .filter_map(|f| match &f.ty {
                    FieldType::Named(name) => Some(name.as_str()),
                    FieldType::Scalar(_) => None,
                })
                .collect(),
            TypeDefKind::Service(service) => service
                .rpcs
                .iter()
                .flat_map(|rpc| [rpc.request.as_str(), rpc.response.as_str()])
                .collect(),
            TypeDefKind::Enum(_) | TypeDefKind::Enclosing => Vec::new(),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            TypeDefKind::Message(_) => "message",
            TypeDefKind::Enum(_) => "enum",
            TypeDefKind::Service(_) => "service",
            TypeDefKind::Enclosing => "enclosing",
        }
    }
}

impl Field {
    pub fn optional(name: impl Into<String>, tag: u32, ty: FieldType) -> Self {
        Self::new(name, tag, Label::Optional, ty)
    }

    pub fn required(name: impl Into<String>, tag: u32, ty: FieldType) -> Self {
        Self::new(name, tag, Label::Required, ty)
    }

    pub fn repeated(name: impl Into<String>, tag: u32, ty: FieldType) -> Self {
        Self::new(name, tag, Label::Repeated, ty)
    }

    fn new(name: impl Into<String>, tag: u32, label: Label, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            tag,
            label,
            ty,
            docs: None,
        }
    }
}

impl FieldType {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl Rpc {
    pub fn unary(
        name: impl Into<String>,
        request: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            request: request.into(),
            response: response.into(),
            client_streaming: false,
            server_streaming: false,
            docs: None,
        }
    }
}

/// The last dotted segment of `name`.
pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person_schema() -> Schema {
        let mut schema = Schema::new();
        schema.add(
            ProtoFile::new("person.proto").with_package("tutorial").with_type(
                TypeDef::message(
                    "tutorial.Person",
                    vec![
                        Field::required("name", 1, FieldType::Scalar(Scalar::String)),
                        Field::repeated("phone", 4, FieldType::named("tutorial.Person.PhoneNumber")),
                    ],
                )
                .with_nested(TypeDef::enumeration(
                    "tutorial.Person.PhoneType",
                    vec![("MOBILE", 0), ("HOME", 1)],
                ))
                .with_nested(TypeDef::message(
                    "tutorial.Person.PhoneNumber",
                    vec![Field::optional(
                        "type",
                        2,
                        FieldType::named("tutorial.Person.PhoneType"),
                    )],
                )),
            ),
        );
        schema
    }

    #[test]
    fn test_types_walks_nested_depth_first() {
        let schema = person_schema();
        let names: Vec<&str> = schema.types().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "tutorial.Person",
                "tutorial.Person.PhoneType",
                "tutorial.Person.PhoneNumber"
            ]
        );
        assert_eq!(schema.type_count(), 3);
    }

    #[test]
    fn test_dependencies_exclude_nested_types() {
        let schema = person_schema();
        let person = schema.get("tutorial.Person").unwrap();
        assert_eq!(person.dependencies(), ["tutorial.Person.PhoneNumber"]);
        assert_eq!(person.simple_name(), "Person");
    }

    #[test]
    fn test_service_depends_on_request_and_response() {
        let service = TypeDef::service(
            "greet.Greeter",
            vec![Rpc::unary("SayHello", "greet.HelloRequest", "greet.HelloReply")],
        );
        assert_eq!(
            service.dependencies(),
            ["greet.HelloRequest", "greet.HelloReply"]
        );
    }

    #[test]
    fn test_scalar_keywords_round_trip() {
        for keyword in ["bool", "bytes", "sfixed64", "uint32", "string"] {
            assert_eq!(Scalar::from_keyword(keyword).unwrap().keyword(), keyword);
        }
        assert!(Scalar::from_keyword("Person").is_none());
    }
}
