// Patch resolver.
//
// A patch is a class redefinition carrying exactly one `patch(Name)` marker
// decorator whose argument names the class itself; its members merge into
// the base class of the same name. Because a patch may be declared before
// or after its base class in the same tree, resolution takes two full
// passes: pass 1 removes every patch class and records it in the patch
// table, pass 2 rebuilds every remaining class that has recorded patches.
// The result is independent of declaration order.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::domain::ast::{ClassDef, Expr, Module, Stmt, StmtKind};
use crate::domain::classify;
use crate::domain::error::{Result, TangleError};

#[derive(Default)]
pub struct PatchResolver {
    /// Target class name -> patches in declaration order.
    patches: HashMap<String, Vec<ClassDef>>,
}

impl PatchResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge every patch in the tree into its base class. The input must
    /// already be import-free.
    pub fn resolve(mut self, module: Module) -> Result<Module> {
        let collected = self.collect_body(module.body)?;
        let merged = self.merge_body(collected)?;
        Ok(Module::new(merged))
    }

    // Pass 1: remove patch classes everywhere, record them in order.
    fn collect_body(&mut self, body: Vec<Stmt>) -> Result<Vec<Stmt>> {
        let mut out = Vec::with_capacity(body.len());
        for stmt in body {
            let kind = match stmt.kind {
                StmtKind::ClassDef(class) => {
                    if let Some(target) = patch_target(&class, stmt.line)? {
                        self.patches.entry(target).or_default().push(class);
                        continue;
                    }
                    let mut class = class;
                    class.body = self.collect_body(class.body)?;
                    StmtKind::ClassDef(class)
                }
                StmtKind::FunctionDef(mut func) => {
                    func.body = self.collect_body(func.body)?;
                    StmtKind::FunctionDef(func)
                }
                StmtKind::If { test, body, orelse } => StmtKind::If {
                    test,
                    body: self.collect_body(body)?,
                    orelse: self.collect_body(orelse)?,
                },
                StmtKind::While { test, body } => StmtKind::While {
                    test,
                    body: self.collect_body(body)?,
                },
                StmtKind::For { target, iter, body } => StmtKind::For {
                    target,
                    iter,
                    body: self.collect_body(body)?,
                },
                other => other,
            };
            out.push(Stmt::new(stmt.line, kind));
        }
        Ok(out)
    }

    // Pass 2: rebuild every remaining class that has patches recorded.
    fn merge_body(&self, body: Vec<Stmt>) -> Result<Vec<Stmt>> {
        let mut out = Vec::with_capacity(body.len());
        for stmt in body {
            let kind = match stmt.kind {
                StmtKind::ClassDef(class) => {
                    let mut class = match self.patches.get(&class.name) {
                        Some(patches) => merge_members(class, patches)?,
                        None => class,
                    };
                    class.body = self.merge_body(class.body)?;
                    StmtKind::ClassDef(class)
                }
                StmtKind::FunctionDef(mut func) => {
                    func.body = self.merge_body(func.body)?;
                    StmtKind::FunctionDef(func)
                }
                StmtKind::If { test, body, orelse } => StmtKind::If {
                    test,
                    body: self.merge_body(body)?,
                    orelse: self.merge_body(orelse)?,
                },
                StmtKind::While { test, body } => StmtKind::While {
                    test,
                    body: self.merge_body(body)?,
                },
                StmtKind::For { target, iter, body } => StmtKind::For {
                    target,
                    iter,
                    body: self.merge_body(body)?,
                },
                other => other,
            };
            out.push(Stmt::new(stmt.line, kind));
        }
        Ok(out)
    }
}

/// Rebuild a base class with its patches applied, in declaration order.
///
/// Members land in an order-preserving map: the base's own members
/// establish position; a patch member with the same name overwrites in
/// place; a patch-only member appends. Later patches win on conflicts.
/// There is no way for a patch to reorder or delete a base member.
fn merge_members(base: ClassDef, patches: &[ClassDef]) -> Result<ClassDef> {
    let mut members: IndexMap<String, Stmt> = IndexMap::new();
    for (name, stmt) in classify::class_members(&base)? {
        members.insert(name, stmt);
    }
    for patch in patches {
        for (name, stmt) in classify::class_members(patch)? {
            // IndexMap::insert keeps the original position for existing
            // keys and appends new ones, which is exactly the merge rule.
            members.insert(name, stmt);
        }
    }
    Ok(ClassDef {
        name: base.name,
        bases: base.bases,
        keywords: base.keywords,
        body: members.into_values().collect(),
        decorators: Vec::new(),
    })
}

/// Decide whether a class is a patch, and of what.
///
/// An undecorated class is plain. A decorated class must carry exactly one
/// marker of the shape `patch(Name)` or `<qualifier>.patch(Name)` with no
/// keywords, and the argument must equal the class's own name (the
/// redundancy is a required self-consistency check). Anything else is a
/// malformed patch.
fn patch_target(class: &ClassDef, line: u32) -> Result<Option<String>> {
    if class.decorators.is_empty() {
        return Ok(None);
    }
    let malformed = |detail: &str| TangleError::MalformedPatch {
        class: class.name.clone(),
        line,
        detail: detail.to_string(),
    };
    let [decorator] = class.decorators.as_slice() else {
        return Err(malformed("expected exactly one patch marker decorator"));
    };
    let Expr::Call { func, args, keywords } = decorator else {
        return Err(malformed("decorator is not a patch(...) call"));
    };
    let is_marker = match func.as_ref() {
        Expr::Name(name) => name == "patch",
        Expr::Attribute { value, attr } => {
            attr == "patch" && matches!(value.as_ref(), Expr::Name(_))
        }
        _ => false,
    };
    if !is_marker {
        return Err(malformed("decorator is not a patch(...) call"));
    }
    if !keywords.is_empty() {
        return Err(malformed("patch marker takes no keyword arguments"));
    }
    let [Expr::Name(target)] = args.as_slice() else {
        return Err(malformed("patch marker takes exactly one plain name"));
    };
    if *target != class.name {
        return Err(malformed("patch target does not match the class's own name"));
    }
    Ok(Some(target.clone()))
}
