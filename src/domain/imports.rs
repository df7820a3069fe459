// Import resolver.
//
// Rewrites every `from <fragment> import name, ...` statement into the
// definitions it refers to, spliced in place in the surrounding statement
// list. Referenced fragments are loaded through the injected ports, fully
// resolved recursively, and memoized in a per-resolver cache so repeated
// imports of the same fragment never re-parse or re-resolve it.

use std::collections::HashMap;

use crate::domain::ast::{dump, ImportName, Module, Stmt, StmtKind};
use crate::domain::classify;
use crate::domain::error::{Result, TangleError};
use crate::ports::{FragmentLoader, SourceParser};

pub struct ImportResolver<'a> {
    loader: &'a dyn FragmentLoader,
    parser: &'a dyn SourceParser,
    /// Fragment identifier -> fully import-resolved tree. Read-only after
    /// insertion; splices clone out of it.
    cache: HashMap<String, Module>,
    /// Fragments currently being resolved, innermost last. A re-entry here
    /// means the fragment graph has a cycle; fail fast instead of recursing
    /// without bound.
    loading: Vec<String>,
}

impl<'a> ImportResolver<'a> {
    pub fn new(loader: &'a dyn FragmentLoader, parser: &'a dyn SourceParser) -> Self {
        Self {
            loader,
            parser,
            cache: HashMap::new(),
            loading: Vec::new(),
        }
    }

    /// Rewrite every from-import in the tree, in any statement list.
    pub fn resolve(&mut self, module: Module) -> Result<Module> {
        let body = self.resolve_body(module.body)?;
        Ok(Module::new(body))
    }

    fn resolve_body(&mut self, body: Vec<Stmt>) -> Result<Vec<Stmt>> {
        let mut out = Vec::with_capacity(body.len());
        for stmt in body {
            match stmt.kind {
                StmtKind::ImportFrom { level, module, names } => {
                    out.extend(self.splice(stmt.line, level, module, &names)?);
                }
                kind => out.push(self.resolve_stmt(Stmt::new(stmt.line, kind))?),
            }
        }
        Ok(out)
    }

    fn resolve_stmt(&mut self, stmt: Stmt) -> Result<Stmt> {
        let kind = match stmt.kind {
            StmtKind::ClassDef(mut class) => {
                class.body = self.resolve_body(class.body)?;
                StmtKind::ClassDef(class)
            }
            StmtKind::FunctionDef(mut func) => {
                func.body = self.resolve_body(func.body)?;
                StmtKind::FunctionDef(func)
            }
            StmtKind::If { test, body, orelse } => StmtKind::If {
                test,
                body: self.resolve_body(body)?,
                orelse: self.resolve_body(orelse)?,
            },
            StmtKind::While { test, body } => StmtKind::While {
                test,
                body: self.resolve_body(body)?,
            },
            StmtKind::For { target, iter, body } => StmtKind::For {
                target,
                iter,
                body: self.resolve_body(body)?,
            },
            other => other,
        };
        Ok(Stmt::new(stmt.line, kind))
    }

    /// Resolve one from-import into the definitions it names, in the
    /// caller's requested order.
    fn splice(
        &mut self,
        line: u32,
        level: u32,
        module: Option<String>,
        names: &[ImportName],
    ) -> Result<Vec<Stmt>> {
        if level != 0 {
            return Err(TangleError::UnsupportedImport {
                line,
                detail: "relative fragment references cannot be inlined".to_string(),
            });
        }
        let fragment = module.ok_or_else(|| TangleError::UnsupportedImport {
            line,
            detail: "import names no explicit fragment".to_string(),
        })?;
        for name in names {
            if name.name == "*" {
                return Err(TangleError::UnsupportedImport {
                    line,
                    detail: format!("wildcard import from {}", fragment),
                });
            }
            if let Some(alias) = &name.alias {
                return Err(TangleError::UnsupportedImport {
                    line,
                    detail: format!(
                        "renamed import {} as {} from {}",
                        name.name, alias, fragment
                    ),
                });
            }
        }

        let defs = {
            let tree = self.load(&fragment)?;
            classify::module_definitions(tree)?
        };

        let mut spliced = Vec::with_capacity(names.len());
        for name in names {
            let matching: Vec<&Stmt> = defs
                .iter()
                .filter(|(def_name, _)| *def_name == name.name)
                .map(|(_, stmt)| stmt)
                .collect();
            match matching.as_slice() {
                [] => {
                    return Err(TangleError::NoDefinition {
                        name: name.name.clone(),
                        fragment: fragment.clone(),
                    })
                }
                [single] => spliced.push((*single).clone()),
                many => {
                    let candidates = many
                        .iter()
                        .map(|stmt| format!("  {}", dump(*stmt)))
                        .collect::<Vec<_>>()
                        .join("\n");
                    return Err(TangleError::MultipleDefinitions {
                        name: name.name.clone(),
                        fragment: fragment.clone(),
                        candidates,
                    });
                }
            }
        }
        Ok(spliced)
    }

    /// Load a fragment's fully resolved tree, memoized per resolver.
    fn load(&mut self, fragment: &str) -> Result<&Module> {
        if !self.cache.contains_key(fragment) {
            if self.loading.iter().any(|f| f == fragment) {
                return Err(TangleError::ImportCycle {
                    fragment: fragment.to_string(),
                });
            }
            self.loading.push(fragment.to_string());
            let resolved = self.load_uncached(fragment);
            self.loading.pop();
            self.cache.insert(fragment.to_string(), resolved?);
        }
        Ok(&self.cache[fragment])
    }

    fn load_uncached(&mut self, fragment: &str) -> Result<Module> {
        let text = self.loader.load(fragment)?;
        let tree = self.parser.parse(&text, fragment)?;
        self.resolve(tree)
    }
}
