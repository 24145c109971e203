//! Kotlin backend.

use crate::backend::GeneratorOptions;
use crate::names::{NameTable, doc_comment, file_header, lower_camel};
use crate::profile::Profile;
use crate::traits::{GenerateError, GeneratedFile, Generator};
use protogen_schema::{
    EnumDef, Field, FieldType, Label, MessageDef, Scalar, Schema, ServiceDef, TypeDef, TypeDefKind,
};

/// Hard keywords that must be escaped with backticks.
const KEYWORDS: &[&str] = &[
    "as", "break", "class", "continue", "do", "else", "false", "for", "fun", "if", "in",
    "interface", "is", "null", "object", "package", "return", "super", "this", "throw", "true",
    "try", "typealias", "typeof", "val", "var", "when", "while",
];

pub struct KotlinGenerator {
    names: NameTable,
    options: GeneratorOptions,
}

impl KotlinGenerator {
    pub fn new(schema: &Schema, profile: &Profile, options: GeneratorOptions) -> Self {
        Self {
            names: NameTable::new(schema, profile),
            options,
        }
    }

    fn render(&self, ty: &TypeDef, depth: usize, out: &mut String) -> Result<(), GenerateError> {
        let indent = "  ".repeat(depth);
        out.push_str(&doc_comment(ty.docs.as_deref(), &indent));

        let mut nested = String::new();
        for (i, child) in ty.nested.iter().enumerate() {
            if i > 0 {
                nested.push('\n');
            }
            self.render(child, depth + 1, &mut nested)?;
        }

        match &ty.kind {
            TypeDefKind::Message(message) => {
                self.render_message(ty, message, &indent, &nested, out)?;
            }
            TypeDefKind::Enum(enumeration) => {
                render_enum(ty, enumeration, &indent, &nested, out);
            }
            TypeDefKind::Service(service) => {
                self.render_service(ty, service, &indent, &nested, out)?;
            }
            TypeDefKind::Enclosing => {
                out.push_str(&format!(
                    "{indent}class {} private constructor() {{\n",
                    ty.simple_name()
                ));
                out.push_str(&nested);
                out.push_str(&format!("{indent}}}\n"));
            }
        }
        Ok(())
    }

    fn render_message(
        &self,
        ty: &TypeDef,
        message: &MessageDef,
        indent: &str,
        nested: &str,
        out: &mut String,
    ) -> Result<(), GenerateError> {
        let name = ty.simple_name();
        if self.options.android {
            out.push_str(&format!("{indent}@Parcelize\n"));
        }

        if message.fields.is_empty() {
            out.push_str(&format!("{indent}class {name}"));
        } else {
            out.push_str(&format!("{indent}data class {name}(\n"));
            for field in &message.fields {
                out.push_str(&doc_comment(field.docs.as_deref(), &format!("{indent}  ")));
                if let FieldType::Named(reference) = &field.ty
                    && let Some(adapter) = self.names.adapter(reference)
                {
                    out.push_str(&format!("{indent}  // Adapter: {adapter}\n"));
                }
                out.push_str(&format!(
                    "{indent}  val {}: {},\n",
                    field_name(&field.name),
                    self.field_type(ty, field)?
                ));
            }
            out.push_str(&format!("{indent})"));
        }
        if self.options.android {
            out.push_str(" : Parcelable");
        }

        if nested.is_empty() {
            out.push('\n');
        } else {
            out.push_str(" {\n");
            out.push_str(nested);
            out.push_str(&format!("{indent}}}\n"));
        }
        Ok(())
    }

    fn render_service(
        &self,
        ty: &TypeDef,
        service: &ServiceDef,
        indent: &str,
        nested: &str,
        out: &mut String,
    ) -> Result<(), GenerateError> {
        out.push_str(&format!("{indent}interface {} {{\n", ty.simple_name()));
        for (i, rpc) in service.rpcs.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&doc_comment(rpc.docs.as_deref(), &format!("{indent}  ")));
            let request = self.reference(ty, &rpc.request, rpc.client_streaming)?;
            let response = self.reference(ty, &rpc.response, rpc.server_streaming)?;
            out.push_str(&format!(
                "{indent}  fun {}(request: {request}): {response}\n",
                lower_camel(&rpc.name)
            ));
        }
        if !nested.is_empty() {
            out.push('\n');
            out.push_str(nested);
        }
        out.push_str(&format!("{indent}}}\n"));
        Ok(())
    }

    fn reference(
        &self,
        ty: &TypeDef,
        reference: &str,
        streaming: bool,
    ) -> Result<String, GenerateError> {
        let name = self
            .names
            .reference(reference)
            .ok_or_else(|| GenerateError::UnknownType {
                referrer: ty.name.clone(),
                reference: reference.to_string(),
            })?;
        Ok(if streaming {
            format!("Sequence<{name}>")
        } else {
            name
        })
    }

    /// The declared type plus its default, e.g. `String? = null`.
    fn field_type(&self, ty: &TypeDef, field: &Field) -> Result<String, GenerateError> {
        let element = match &field.ty {
            FieldType::Scalar(scalar) => kotlin_scalar(*scalar).to_string(),
            FieldType::Named(reference) => self.reference(ty, reference, false)?,
        };
        Ok(match field.label {
            Label::Optional => format!("{element}? = null"),
            Label::Required => element,
            Label::Repeated => format!("List<{element}> = emptyList()"),
        })
    }
}

impl Generator for KotlinGenerator {
    fn name(&self) -> &'static str {
        "kotlin"
    }

    fn extension(&self) -> &'static str {
        "kt"
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

        let mut contents = file_header(source, package, "");
        if self.options.android && has_message(ty) {
            contents.push_str("\nimport android.os.Parcelable\n");
            contents.push_str("import kotlinx.parcelize.Parcelize\n");
        }
        contents.push('\n');
        contents.push_str(&body);
        Ok(GeneratedFile { path, contents })
    }
}

fn render_enum(ty: &TypeDef, enumeration: &EnumDef, indent: &str, nested: &str, out: &mut String) {
    let name = ty.simple_name();
    out.push_str(&format!("{indent}enum class {name}(val value: Int) {{\n"));
    for constant in &enumeration.constants {
        out.push_str(&doc_comment(constant.docs.as_deref(), &format!("{indent}  ")));
        out.push_str(&format!("{indent}  {}({}),\n", constant.name, constant.tag));
    }
    out.push_str(&format!("{indent}  ;\n\n"));
    out.push_str(&format!("{indent}  companion object {{\n"));
    out.push_str(&format!(
        "{indent}    /** Returns the constant with the given value, or null. */\n"
    ));
    out.push_str(&format!(
        "{indent}    fun fromValue(value: Int): {name}? = values().firstOrNull {{ it.value == value }}\n"
    ));
    out.push_str(&format!("{indent}  }}\n"));
    if !nested.is_empty() {
        out.push('\n');
        out.push_str(nested);
    }
    out.push_str(&format!("{indent}}}\n"));
}

fn has_message(ty: &TypeDef) -> bool {
    matches!(ty.kind, TypeDefKind::Message(_)) || ty.nested.iter().any(has_message)
}

fn kotlin_scalar(scalar: Scalar) -> &'static str {
    match scalar {
        Scalar::Bool => "Boolean",
        Scalar::Bytes => "okio.ByteString",
        Scalar::Double => "Double",
        Scalar::Float => "Float",
        Scalar::Int32 | Scalar::Uint32 | Scalar::Sint32 | Scalar::Fixed32 | Scalar::Sfixed32 => {
            "Int"
        }
        Scalar::Int64 | Scalar::Uint64 | Scalar::Sint64 | Scalar::Fixed64 | Scalar::Sfixed64 => {
            "Long"
        }
        Scalar::String => "String",
    }
}

fn field_name(name: &str) -> String {
    if KEYWORDS.contains(&name) {
        format!("`{name}`")
    } else {
        name.to_string()
    }
}
