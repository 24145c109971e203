//! End-to-end compiles against `.proto` files in scratch directories.

use protogen::{CompileError, Compiler, CompilerConfig, EmitError, OutputTarget};
use protogen_codegen::{BackendKind, GenerateError};
use protogen_schema::IdentifierSet;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use walkdir::WalkDir;

const A_PROTO: &str = r#"
syntax = "proto2";
package pkg;

// The thing everyone depends on.
message X {
  optional string name = 1;
}

message Y {
  repeated int32 values = 1;
}
"#;

const B_PROTO: &str = r#"
syntax = "proto2";
package pkg;

import "A.proto";

message Z {
  optional X x = 1;
}
"#;

const DESCRIPTOR_PROTO: &str = r#"
syntax = "proto2";
package google.protobuf;
option java_package = "com.google.protobuf";

message FileOptions {
  optional string java_package = 1;
}
"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            dir: TempDir::new().unwrap(),
        };
        fixture.write("protos/A.proto", A_PROTO);
        fixture.write("protos/B.proto", B_PROTO);
        fixture
    }

    fn write(&self, path: &str, contents: &str) {
        let path = self.dir.path().join(path);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn protos(&self) -> PathBuf {
        self.dir.path().join("protos")
    }

    fn out(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn config(&self, backend: BackendKind, out: &str) -> CompilerConfig {
        let mut config = CompilerConfig::new(OutputTarget::new(backend, self.out(out)));
        config.proto_paths.push(self.protos());
        config
    }
}

fn rules(includes: &[&str], excludes: &[&str]) -> IdentifierSet {
    let mut builder = IdentifierSet::builder();
    for rule in includes {
        builder.include(*rule);
    }
    for rule in excludes {
        builder.exclude(*rule);
    }
    builder.build().unwrap()
}

/// Every file under `root`, keyed by its path relative to `root`.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, String> {
    if !root.exists() {
        return BTreeMap::new();
    }
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap().to_path_buf();
            (relative, std::fs::read_to_string(e.path()).unwrap())
        })
        .collect()
}

fn relative(paths: &[PathBuf], root: &Path) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.strip_prefix(root).unwrap().display().to_string())
        .collect()
}

#[test]
fn test_no_identifiers_emits_every_type() {
    let fixture = Fixture::new();
    let report = Compiler::new(fixture.config(BackendKind::Java, "out"))
        .compile()
        .unwrap();

    assert_eq!(
        relative(&report.files, &fixture.out("out")),
        ["pkg/X.java", "pkg/Y.java", "pkg/Z.java"]
    );
    assert_eq!(report.types_loaded, 3);
    assert_eq!(report.types_emitted, 3);

    let z = std::fs::read_to_string(fixture.out("out/pkg/Z.java")).unwrap();
    assert!(z.starts_with("// Code generated by protogen, do not edit.\n// Source: B.proto\n"));
    assert!(z.contains("public final pkg.X x;"));
}

#[test]
fn test_include_single_root() {
    let fixture = Fixture::new();
    let mut config = fixture.config(BackendKind::Java, "out");
    config.identifiers = rules(&["pkg.X"], &[]);
    let report = Compiler::new(config).compile().unwrap();

    assert_eq!(relative(&report.files, &fixture.out("out")), ["pkg/X.java"]);
    assert!(report.unused_includes.is_empty());
    assert_eq!(report.types_loaded, 3);
    assert_eq!(report.types_emitted, 1);
}

#[test]
fn test_excluded_dependency_leaves_dangling_reference() {
    let fixture = Fixture::new();
    let mut config = fixture.config(BackendKind::Java, "out");
    config.identifiers = rules(&["pkg.*"], &["pkg.X"]);
    config.concurrency = 2;

    let err = Compiler::new(config).compile().unwrap_err();
    match err {
        CompileError::Emit(EmitError::Generate { type_name, source }) => {
            assert_eq!(type_name, "pkg.Z");
            assert_eq!(
                source,
                GenerateError::UnknownType {
                    referrer: "pkg.Z".to_string(),
                    reference: "pkg.X".to_string(),
                }
            );
        }
        other => panic!("unexpected error: {other}"),
    }

    // The sibling worker still wrote Y; X was pruned away.
    let written = snapshot(&fixture.out("out"));
    assert!(written.contains_key(Path::new("pkg/Y.java")));
    assert!(!written.contains_key(Path::new("pkg/X.java")));
    assert!(!written.contains_key(Path::new("pkg/Z.java")));
}

#[test]
fn test_unused_rules_reported() {
    let fixture = Fixture::new();
    let mut config = fixture.config(BackendKind::Java, "out");
    config.identifiers = rules(&["pkg.Y", "nowhere.*"], &["pkg.Nothing"]);
    let report = Compiler::new(config).compile().unwrap();

    assert_eq!(report.unused_includes, ["nowhere.*"]);
    assert_eq!(report.unused_excludes, ["pkg.Nothing"]);
    assert_eq!(relative(&report.files, &fixture.out("out")), ["pkg/Y.java"]);
}

#[test]
fn test_named_files_filter() {
    let fixture = Fixture::new();

    // B.proto is named; A.proto only comes in as an import.
    let mut config = fixture.config(BackendKind::Java, "inclusive");
    config.source_files = vec!["B.proto".to_string()];
    let report = Compiler::new(config).compile().unwrap();
    assert_eq!(
        relative(&report.files, &fixture.out("inclusive")),
        ["pkg/X.java", "pkg/Y.java", "pkg/Z.java"]
    );

    let mut config = fixture.config(BackendKind::Java, "named");
    config.source_files = vec!["B.proto".to_string()];
    config.named_files_only = true;
    let report = Compiler::new(config).compile().unwrap();
    assert_eq!(relative(&report.files, &fixture.out("named")), ["pkg/Z.java"]);
}

#[test]
fn test_descriptor_always_emitted() {
    let fixture = Fixture::new();
    fixture.write("protos/google/protobuf/descriptor.proto", DESCRIPTOR_PROTO);
    fixture.write(
        "protos/C.proto",
        "package pkg;\nimport \"google/protobuf/descriptor.proto\";\n\
         message C { optional google.protobuf.FileOptions options = 1; }\n",
    );

    let mut config = fixture.config(BackendKind::Java, "out");
    config.source_files = vec!["C.proto".to_string()];
    config.named_files_only = true;
    let report = Compiler::new(config).compile().unwrap();
    assert_eq!(
        relative(&report.files, &fixture.out("out")),
        ["com/google/protobuf/FileOptions.java", "pkg/C.java"]
    );
}

#[test]
fn test_output_independent_of_worker_count() {
    let fixture = Fixture::new();

    let mut config = fixture.config(BackendKind::Kotlin, "one");
    config.concurrency = 1;
    Compiler::new(config).compile().unwrap();

    let mut config = fixture.config(BackendKind::Kotlin, "eight");
    config.concurrency = 8;
    Compiler::new(config).compile().unwrap();

    let one = snapshot(&fixture.out("one"));
    assert_eq!(one.len(), 3);
    assert_eq!(one, snapshot(&fixture.out("eight")));
}

#[test]
fn test_dry_run_writes_nothing() {
    let fixture = Fixture::new();

    let mut config = fixture.config(BackendKind::Java, "out");
    config.dry_run = true;
    let dry = Compiler::new(config).compile().unwrap();
    assert!(dry.dry_run);
    assert!(!fixture.out("out").exists());

    let real = Compiler::new(fixture.config(BackendKind::Java, "out"))
        .compile()
        .unwrap();
    assert_eq!(dry.files, real.files);
    for path in &real.files {
        assert!(path.is_file());
    }
}

#[test]
fn test_regeneration_is_byte_identical() {
    let fixture = Fixture::new();
    let compiler = Compiler::new(fixture.config(BackendKind::Java, "out"));

    compiler.compile().unwrap();
    let first = snapshot(&fixture.out("out"));
    compiler.compile().unwrap();
    assert_eq!(first, snapshot(&fixture.out("out")));
}

#[test]
fn test_interrupted_before_emission() {
    let fixture = Fixture::new();
    let compiler = Compiler::new(fixture.config(BackendKind::Java, "out"));
    compiler.shutdown_signal().raise();

    let err = compiler.compile().unwrap_err();
    assert!(matches!(err, CompileError::Interrupted));
    assert!(snapshot(&fixture.out("out")).is_empty());
}

#[test]
fn test_profile_replaces_references() {
    let fixture = Fixture::new();
    fixture.write(
        "protos/java.profile.toml",
        "[types.\"pkg.X\"]\ntarget = \"java.time.Instant\"\n",
    );
    Compiler::new(fixture.config(BackendKind::Java, "out"))
        .compile()
        .unwrap();

    let z = std::fs::read_to_string(fixture.out("out/pkg/Z.java")).unwrap();
    assert!(z.contains("public final java.time.Instant x;"));
}

#[test]
fn test_profile_with_unknown_type_fails() {
    let fixture = Fixture::new();
    fixture.write(
        "protos/kotlin.profile.toml",
        "[types.\"pkg.Missing\"]\ntarget = \"kotlin.Any\"\n",
    );
    let err = Compiler::new(fixture.config(BackendKind::Kotlin, "out"))
        .compile()
        .unwrap_err();
    assert!(matches!(err, CompileError::Profile(_)));
    assert!(!fixture.out("out").exists());
}

#[test]
fn test_missing_proto_is_load_error() {
    let fixture = Fixture::new();
    let mut config = fixture.config(BackendKind::Java, "out");
    config.source_files = vec!["Missing.proto".to_string()];
    let err = Compiler::new(config).compile().unwrap_err();
    assert!(matches!(err, CompileError::Load(_)));
}
