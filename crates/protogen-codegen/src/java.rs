//! Java backend.
//!
//! One file per top-level type; nested types become static member classes.

use crate::backend::GeneratorOptions;
use crate::names::{NameTable, doc_comment, file_header, lower_camel};
use crate::profile::Profile;
use crate::traits::{GenerateError, GeneratedFile, Generator};
use protogen_schema::{
    EnumDef, Field, FieldType, Label, MessageDef, Rpc, Scalar, Schema, ServiceDef, TypeDef,
    TypeDefKind,
};

const NULLABLE_IMPORT: &str = "androidx.annotation.Nullable";

/// Java reserved words that cannot be used as field names.
const KEYWORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "final", "finally", "float",
    "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "package", "private", "protected", "public", "return", "short", "static",
    "strictfp", "super", "switch", "synchronized", "this", "throw", "throws", "transient", "try",
    "void", "volatile", "while", "true", "false", "null",
];

pub struct JavaGenerator {
    names: NameTable,
    options: GeneratorOptions,
}

impl JavaGenerator {
    pub fn new(schema: &Schema, profile: &Profile, options: GeneratorOptions) -> Self {
        Self {
            names: NameTable::new(schema, profile),
            options,
        }
    }

    fn render(&self, ty: &TypeDef, depth: usize, out: &mut String) -> Result<(), GenerateError> {
        let indent = "  ".repeat(depth);
        let modifier = if depth == 0 { "" } else { "static " };
        out.push_str(&doc_comment(ty.docs.as_deref(), &indent));

        match &ty.kind {
            TypeDefKind::Message(message) => {
                self.render_message(ty, message, &indent, modifier, out)?;
            }
            TypeDefKind::Enum(enumeration) => {
                render_enum(ty, enumeration, &indent, out);
            }
            TypeDefKind::Service(service) => {
                self.render_service(ty, service, &indent, modifier, out)?;
            }
            TypeDefKind::Enclosing => {
                let name = ty.simple_name();
                out.push_str(&format!("{indent}public {modifier}final class {name} {{\n"));
                out.push_str(&format!("{indent}  private {name}() {{\n"));
                out.push_str(&format!("{indent}    throw new AssertionError();\n"));
                out.push_str(&format!("{indent}  }}\n"));
            }
        }

        for nested in &ty.nested {
            out.push('\n');
            self.render(nested, depth + 1, out)?;
        }
        out.push_str(&format!("{indent}}}\n"));
        Ok(())
    }

    fn render_message(
        &self,
        ty: &TypeDef,
        message: &MessageDef,
        indent: &str,
        modifier: &str,
        out: &mut String,
    ) -> Result<(), GenerateError> {
        let name = ty.simple_name();
        let implements = if self.options.android {
            " implements android.os.Parcelable"
        } else {
            ""
        };
        out.push_str(&format!(
            "{indent}public {modifier}final class {name}{implements} {{\n"
        ));

        let mut fields = Vec::with_capacity(message.fields.len());
        for field in &message.fields {
            fields.push((field_name(&field.name), self.field_type(ty, field)?));
        }

        for (field, (field_name, java_type)) in message.fields.iter().zip(&fields) {
            out.push_str(&doc_comment(field.docs.as_deref(), &format!("{indent}  ")));
            if let FieldType::Named(reference) = &field.ty
                && let Some(adapter) = self.names.adapter(reference)
            {
                out.push_str(&format!("{indent}  // Adapter: {adapter}\n"));
            }
            let nullable = if self.options.annotations() && field.label == Label::Optional {
                "@Nullable "
            } else {
                ""
            };
            out.push_str(&format!(
                "{indent}  {nullable}public final {java_type} {field_name};\n"
            ));
        }
        if !fields.is_empty() {
            out.push('\n');
        }

        let params: Vec<String> = fields.iter().map(|(n, t)| format!("{t} {n}")).collect();
        out.push_str(&format!(
            "{indent}  public {name}({}) {{\n",
            params.join(", ")
        ));
        for (field_name, _) in &fields {
            out.push_str(&format!("{indent}    this.{field_name} = {field_name};\n"));
        }
        out.push_str(&format!("{indent}  }}\n"));

        if !self.options.compact {
            let names: Vec<&str> = fields.iter().map(|(n, _)| n.as_str()).collect();
            render_value_methods(name, &names, indent, out);
        }
        Ok(())
    }

    fn render_service(
        &self,
        ty: &TypeDef,
        service: &ServiceDef,
        indent: &str,
        modifier: &str,
        out: &mut String,
    ) -> Result<(), GenerateError> {
        out.push_str(&format!(
            "{indent}public {modifier}interface {} {{\n",
            ty.simple_name()
        ));
        for (i, rpc) in service.rpcs.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&doc_comment(rpc.docs.as_deref(), &format!("{indent}  ")));
            let (request, response) = self.rpc_types(ty, rpc)?;
            out.push_str(&format!(
                "{indent}  {response} {}({request} request);\n",
                lower_camel(&rpc.name)
            ));
        }
        Ok(())
    }

    fn rpc_types(&self, ty: &TypeDef, rpc: &Rpc) -> Result<(String, String), GenerateError> {
        let request = self.reference(ty, &rpc.request)?;
        let response = self.reference(ty, &rpc.response)?;
        let wrap = |streaming: bool, name: String| {
            if streaming {
                format!("java.util.Iterator<{name}>")
            } else {
                name
            }
        };
        Ok((
            wrap(rpc.client_streaming, request),
            wrap(rpc.server_streaming, response),
        ))
    }

    fn field_type(&self, ty: &TypeDef, field: &Field) -> Result<String, GenerateError> {
        let element = match &field.ty {
            FieldType::Scalar(scalar) => java_scalar(*scalar).to_string(),
            FieldType::Named(reference) => self.reference(ty, reference)?,
        };
        Ok(match field.label {
            Label::Repeated => format!("java.util.List<{element}>"),
            Label::Optional | Label::Required => element,
        })
    }

    fn reference(&self, ty: &TypeDef, reference: &str) -> Result<String, GenerateError> {
        self.names
            .reference(reference)
            .ok_or_else(|| GenerateError::UnknownType {
                referrer: ty.name.clone(),
                reference: reference.to_string(),
            })
    }
}

impl Generator for JavaGenerator {
    fn name(&self) -> &'static str {
        "java"
    }

    fn extension(&self) -> &'static str {
        "java"
    }

    fn generate(&self, ty: &TypeDef) -> Result<GeneratedFile, GenerateError> {
        let undeclared = || GenerateError::Undeclared(ty.name.clone());
        let path = self
            .names
            .output_path(ty, self.extension())
            .ok_or_else(undeclared)?;
        let source = self.names.source(&ty.name).ok_or_else(undeclared)?;
        let package = self.names.package(&ty.name).ok_or_else(undeclared)?;

        let mut body = String::new();
        self.render(ty, 0, &mut body)?;

        let mut contents = file_header(source, package, ";");
        if self.options.annotations() && has_optional_field(ty) {
            contents.push_str(&format!("\nimport {NULLABLE_IMPORT};\n"));
        }
        contents.push('\n');
        contents.push_str(&body);
        Ok(GeneratedFile { path, contents })
    }
}

fn render_enum(ty: &TypeDef, enumeration: &EnumDef, indent: &str, out: &mut String) {
    let name = ty.simple_name();
    out.push_str(&format!("{indent}public enum {name} {{\n"));
    if enumeration.constants.is_empty() {
        out.push_str(&format!("{indent}  ;\n"));
    }
    let last = enumeration.constants.len().saturating_sub(1);
    for (i, constant) in enumeration.constants.iter().enumerate() {
        out.push_str(&doc_comment(constant.docs.as_deref(), &format!("{indent}  ")));
        let separator = if i == last { ";" } else { "," };
        out.push_str(&format!(
            "{indent}  {}({}){separator}\n",
            constant.name, constant.tag
        ));
    }

    out.push_str(&format!("\n{indent}  public final int value;\n\n"));
    out.push_str(&format!("{indent}  {name}(int value) {{\n"));
    out.push_str(&format!("{indent}    this.value = value;\n"));
    out.push_str(&format!("{indent}  }}\n\n"));
    out.push_str(&format!(
        "{indent}  /** Returns the constant with the given value, or null. */\n"
    ));
    out.push_str(&format!(
        "{indent}  public static {name} fromValue(int value) {{\n"
    ));
    out.push_str(&format!("{indent}    for ({name} constant : values()) {{\n"));
    out.push_str(&format!(
        "{indent}      if (constant.value == value) return constant;\n"
    ));
    out.push_str(&format!("{indent}    }}\n"));
    out.push_str(&format!("{indent}    return null;\n"));
    out.push_str(&format!("{indent}  }}\n"));
}

/// `equals`, `hashCode` and `toString` over `fields`.
fn render_value_methods(name: &str, fields: &[&str], indent: &str, out: &mut String) {
    out.push_str(&format!("\n{indent}  @Override\n"));
    out.push_str(&format!("{indent}  public boolean equals(Object other) {{\n"));
    if fields.is_empty() {
        out.push_str(&format!("{indent}    return other instanceof {name};\n"));
    } else {
        out.push_str(&format!("{indent}    if (other == this) return true;\n"));
        out.push_str(&format!(
            "{indent}    if (!(other instanceof {name})) return false;\n"
        ));
        out.push_str(&format!("{indent}    {name} o = ({name}) other;\n"));
        let comparisons: Vec<String> = fields
            .iter()
            .map(|f| format!("java.util.Objects.equals({f}, o.{f})"))
            .collect();
        out.push_str(&format!(
            "{indent}    return {};\n",
            comparisons.join(&format!("\n{indent}        && "))
        ));
    }
    out.push_str(&format!("{indent}  }}\n"));

    out.push_str(&format!("\n{indent}  @Override\n"));
    out.push_str(&format!("{indent}  public int hashCode() {{\n"));
    if fields.is_empty() {
        out.push_str(&format!("{indent}    return 0;\n"));
    } else {
        out.push_str(&format!(
            "{indent}    return java.util.Objects.hash({});\n",
            fields.join(", ")
        ));
    }
    out.push_str(&format!("{indent}  }}\n"));

    let parts: Vec<String> = fields
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let separator = if i == 0 { "" } else { ", " };
            format!("\"{separator}{f}=\" + {f}")
        })
        .collect();
    let body = if parts.is_empty() {
        format!("\"{name}{{}}\"")
    } else {
        format!("\"{name}{{\" + {} + \"}}\"", parts.join(" + "))
    };
    out.push_str(&format!("\n{indent}  @Override\n"));
    out.push_str(&format!("{indent}  public String toString() {{\n"));
    out.push_str(&format!("{indent}    return {body};\n"));
    out.push_str(&format!("{indent}  }}\n"));
}

fn has_optional_field(ty: &TypeDef) -> bool {
    let optional = matches!(
        &ty.kind,
        TypeDefKind::Message(m) if m.fields.iter().any(|f| f.label == Label::Optional)
    );
    optional || ty.nested.iter().any(has_optional_field)
}

fn java_scalar(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Bool => "Boolean",
        Scalar::Bytes => "okio.ByteString",
        Scalar::Double => "Double",
        Scalar::Float => "Float",
        Scalar::Int32 | Scalar::Uint32 | Scalar::Sint32 | Scalar::Fixed32 | Scalar::Sfixed32 => {
            "Integer"
        }
        Scalar::Int64 | Scalar::Uint64 | Scalar::Sint64 | Scalar::Fixed64 | Scalar::Sfixed64 => {
            "Long"
        }
        Scalar::String => "String",
    }
}

fn field_name(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("{name}_")
    } else {
        name.to_string()
    }
}
