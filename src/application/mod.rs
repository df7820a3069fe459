// Use-case layer: composes the domain passes over injected ports.

use crate::domain::ast::{self, Module};
use crate::domain::error::Result;
use crate::domain::imports::ImportResolver;
use crate::domain::patch::PatchResolver;
use crate::ports::{FragmentLoader, SourceParser};

/// Assembles a single self-contained tree out of a root module and the
/// fragments it references: import inlining first, then patch merging,
/// then position bookkeeping. The caller's tree is never mutated.
pub struct InlineUsecase<'a> {
    pub loader: &'a dyn FragmentLoader,
    pub parser: &'a dyn SourceParser,
}

impl InlineUsecase<'_> {
    /// `inline(tree) -> tree'`. Idempotent on trees that already contain
    /// no imports and no patch markers.
    pub fn run(&self, module: &Module) -> Result<Module> {
        let mut imports = ImportResolver::new(self.loader, self.parser);
        let resolved = imports.resolve(module.clone())?;
        let merged = PatchResolver::new().resolve(resolved)?;
        Ok(ast::fix_locations(merged))
    }
}
