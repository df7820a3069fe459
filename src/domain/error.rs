// Error taxonomy for the inlining engine.
// Every error here is fatal to the current inline invocation; there is no
// recovery or partial result.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TangleError>;

#[derive(Debug, Error)]
pub enum TangleError {
    /// A module top-level statement that is not a recognized definition or
    /// one of the permitted structural-noise shapes.
    #[error("invalid module member at line {line}: {detail}")]
    InvalidModuleMember { line: u32, detail: String },

    /// A class-body statement that is not a recognized member definition.
    #[error("invalid class member at line {line}: {detail}")]
    InvalidClassMember { line: u32, detail: String },

    /// An import names a symbol the target fragment does not define.
    #[error("no definition for {name} in {fragment}")]
    NoDefinition { name: String, fragment: String },

    /// An import names a symbol the target fragment defines more than once.
    /// `candidates` lists every matching definition so the author can
    /// disambiguate.
    #[error("multiple definitions for {name} in {fragment}:\n{candidates}")]
    MultipleDefinitions {
        name: String,
        fragment: String,
        candidates: String,
    },

    /// A decorated class that is not a well-formed patch: wrong marker,
    /// extra decorators or arguments, or an argument that does not match
    /// the class's own name.
    #[error("malformed patch on class {class} at line {line}: {detail}")]
    MalformedPatch {
        class: String,
        line: u32,
        detail: String,
    },

    /// Relative, wildcard, renamed, or fragment-less imports are outside
    /// the inlining model.
    #[error("unsupported import at line {line}: {detail}")]
    UnsupportedImport { line: u32, detail: String },

    /// The fragment graph contains a cycle through this identifier.
    #[error("import cycle detected while loading fragment {fragment}")]
    ImportCycle { fragment: String },

    #[error("failed to load fragment {fragment}")]
    Load {
        fragment: String,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error in {source_name} at line {line}: {detail}")]
    Syntax {
        source_name: String,
        line: u32,
        detail: String,
    },

    /// The pretty-printer met a non-canonical node it cannot guarantee to
    /// reproduce as source text.
    #[error("cannot unparse non-canonical node: {detail}")]
    Unprintable { detail: String },
}
