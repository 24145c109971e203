//! Mapping from proto type names to target-language names and output paths.

use crate::profile::{Profile, TypeConfig};
use protogen_schema::{Schema, TypeDef};
use std::collections::HashMap;
use std::path::PathBuf;

/// Marker written at the top of every generated file.
pub const MARKER: &str = "// Code generated by protogen, do not edit.";

#[derive(Debug, Clone)]
struct Entry {
    /// Target package, from `java_package` or the proto package.
    package: String,
    /// Dotted class name relative to the package (`Outer.Inner`).
    class: String,
    /// Path of the declaring `.proto` file.
    source: String,
    /// Profile override, if any.
    config: Option<TypeConfig>,
}

/// Resolves proto type names for one generator.
///
/// Built once from the pruned schema; references to types outside it resolve
/// to `None`.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    entries: HashMap<String, Entry>,
}

impl NameTable {
    pub fn new(schema: &Schema, profile: &Profile) -> Self {
        let mut entries = HashMap::new();
        for file in &schema.files {
            let proto_package = file.package.as_deref().unwrap_or("");
            let package = file.option("java_package").unwrap_or(proto_package);
            for ty in file.all_types() {
                let class = ty
                    .name
                    .strip_prefix(proto_package)
                    .and_then(|rest| rest.strip_prefix('.'))
                    .unwrap_or(&ty.name)
                    .to_string();
                entries.insert(
                    ty.name.clone(),
                    Entry {
                        package: package.to_string(),
                        class,
                        source: file.path.clone(),
                        config: profile.get(&ty.name).cloned(),
                    },
                );
            }
        }
        Self { entries }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Fully-qualified target name used when referring to `name`. Profile
    /// targets replace the generated class.
    pub fn reference(&self, name: &str) -> Option<String> {
        let entry = self.entries.get(name)?;
        Some(match &entry.config {
            Some(config) => config.target.clone(),
            None => qualify(&entry.package, &entry.class),
        })
    }

    pub fn adapter(&self, name: &str) -> Option<&str> {
        self.entries.get(name)?.config.as_ref()?.adapter.as_deref()
    }

    pub fn package(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|e| e.package.as_str())
    }

    pub fn source(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(|e| e.source.as_str())
    }

    /// `com/example/Period.<extension>` for a type declared in package
    /// `com.example`.
    pub fn output_path(&self, ty: &TypeDef, extension: &str) -> Option<PathBuf> {
        let entry = self.entries.get(&ty.name)?;
        let mut path: PathBuf = entry
            .package
            .split('.')
            .filter(|segment| !segment.is_empty())
            .collect();
        path.push(format!("{}.{extension}", ty.simple_name()));
        Some(path)
    }
}

fn qualify(package: &str, class: &str) -> String {
    if package.is_empty() {
        class.to_string()
    } else {
        format!("{package}.{class}")
    }
}

/// Marker plus source line, followed by the package declaration if any.
pub(crate) fn file_header(source: &str, package: &str, terminator: &str) -> String {
    let mut out = format!("{MARKER}\n// Source: {source}\n");
    if !package.is_empty() {
        out.push_str(&format!("package {package}{terminator}\n"));
    }
    out
}

/// `say_hello` or `SayHello` to `sayHello`.
pub(crate) fn lower_camel(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for (i, c) in name.chars().enumerate() {
        if c == '_' {
            upper_next = !out.is_empty();
        } else if i == 0 {
            out.extend(c.to_lowercase());
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Documentation comment lines, indented, in `/** ... */` form.
pub(crate) fn doc_comment(docs: Option<&str>, indent: &str) -> String {
    let Some(docs) = docs.filter(|d| !d.trim().is_empty()) else {
        return String::new();
    };
    let mut out = format!("{indent}/**\n");
    for line in docs.lines() {
        let line = line.replace("*/", "*&#47;");
        if line.is_empty() {
            out.push_str(&format!("{indent} *\n"));
        } else {
            out.push_str(&format!("{indent} * {line}\n"));
        }
    }
    out.push_str(&format!("{indent} */\n"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use protogen_schema::ProtoFile;

    fn schema() -> Schema {
        let mut schema = Schema::new();
        let mut file = ProtoFile::new("squareup/geology/period.proto")
            .with_package("squareup.geology")
            .with_type(
                TypeDef::message("squareup.geology.Period", vec![])
                    .with_nested(TypeDef::enumeration("squareup.geology.Period.Era", vec![])),
            );
        file.options
            .insert("java_package".to_string(), "com.squareup.geology".to_string());
        schema.add(file);
        schema.add(ProtoFile::new("bare.proto").with_type(TypeDef::message("Bare", vec![])));
        schema
    }

    #[test]
    fn test_java_package_wins() {
        let names = NameTable::new(&schema(), &Profile::default());
        assert_eq!(
            names.reference("squareup.geology.Period.Era").as_deref(),
            Some("com.squareup.geology.Period.Era")
        );
        assert_eq!(
            names.source("squareup.geology.Period.Era"),
            Some("squareup/geology/period.proto")
        );
    }

    #[test]
    fn test_output_path() {
        let schema = schema();
        let names = NameTable::new(&schema, &Profile::default());
        let period = schema.get("squareup.geology.Period").unwrap();
        assert_eq!(
            names.output_path(period, "java").unwrap(),
            PathBuf::from("com/squareup/geology/Period.java")
        );
        let bare = schema.get("Bare").unwrap();
        assert_eq!(names.output_path(bare, "kt").unwrap(), PathBuf::from("Bare.kt"));
    }

    #[test]
    fn test_profile_target_replaces_reference() {
        let mut profile = Profile::default();
        profile.types.insert(
            "squareup.geology.Period".to_string(),
            TypeConfig {
                target: "java.time.Period".to_string(),
                adapter: Some("com.example.PeriodAdapter".to_string()),
            },
        );
        let names = NameTable::new(&schema(), &profile);
        assert_eq!(
            names.reference("squareup.geology.Period").as_deref(),
            Some("java.time.Period")
        );
        assert_eq!(
            names.adapter("squareup.geology.Period"),
            Some("com.example.PeriodAdapter")
        );
        assert_eq!(names.reference("squareup.geology.Missing"), None);
    }

    #[test]
    fn test_lower_camel() {
        assert_eq!(lower_camel("SayHello"), "sayHello");
        assert_eq!(lower_camel("phone_number"), "phoneNumber");
        assert_eq!(lower_camel("name"), "name");
        assert_eq!(lower_camel("_private"), "private");
    }
}
