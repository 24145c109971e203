//! Protobuf schema graph for protogen.
//!
//! `protogen-schema` turns `.proto` sources into a linked [`Schema`] and prunes
//! it down to the types a compilation actually needs.
//!
//! # Architecture
//!
//! ```text
//! .proto files ──> parse ──> ProtoLoader ──> Schema ──> prune(IdentifierSet) ──> Pruned
//!                  (parse.rs) (loader.rs)    (ir.rs)    (prune.rs, identifier.rs)
//! ```
//!
//! # Example
//!
//! ```
//! use protogen_schema::{IdentifierSet, parse_proto, loader::link, Schema};
//!
//! let file = parse_proto(
//!     "geology.proto",
//!     "package geo; message Period { optional string name = 1; } message Rock {}",
//! )
//! .unwrap();
//! let mut schema = Schema::new();
//! schema.add(file);
//! let schema = link(schema).unwrap();
//!
//! let mut rules = IdentifierSet::builder();
//! rules.include("geo.Period");
//! let pruned = schema.prune(&rules.build().unwrap());
//! assert!(pruned.schema.get("geo.Period").is_some());
//! assert!(pruned.schema.get("geo.Rock").is_none());
//! ```

pub mod identifier;
pub mod ir;
pub mod loader;
pub mod parse;
pub mod prune;

pub use identifier::{IdentifierError, IdentifierSet, IdentifierSetBuilder, Rule};
pub use ir::{
    EnumConstant, EnumDef, Field, FieldType, Label, MessageDef, ProtoFile, Rpc, Scalar, Schema,
    ServiceDef, TypeDef, TypeDefKind,
};
pub use loader::{LoadError, ProtoLoader, SchemaLoader};
pub use parse::{ParseError, parse_proto};
pub use prune::Pruned;
