// Boundary traits between the inlining engine and its collaborators.
// The domain core never touches the filesystem or concrete syntax directly;
// everything flows through these ports.

use crate::domain::ast::Module;
use crate::domain::error::Result;

/// Maps a fragment identifier (e.g. a dotted module name) to its source
/// text. Must be deterministic: the same identifier always yields the same
/// text within one inline invocation.
pub trait FragmentLoader {
    fn load(&self, fragment: &str) -> Result<String>;
}

/// Turns source text into a normalized syntax tree. Implementations must
/// apply the canonicalizing rewrite before returning, so the engine only
/// ever sees canonical node shapes.
pub trait SourceParser {
    fn parse(&self, text: &str, source_name: &str) -> Result<Module>;
}

/// Turns a canonical tree back into re-parseable source text. Fails on
/// trees containing legacy shapes; callers wanting a best-effort rendering
/// use `infrastructure::unparser::unparse_or_dump`.
pub trait SourceUnparser {
    fn unparse(&self, module: &Module) -> Result<String>;
}
