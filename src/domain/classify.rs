// Definition classifier.
//
// Single source of truth for "what counts as a named thing that can be
// imported or patched". Both the module level and the class level share the
// ordered-sequence-of-named-definitions model; they differ only in which
// structural-noise statements they are allowed to skip. Anything
// unrecognized is a hard error — silently skipping unknown constructs would
// drop code from the assembled output without a trace.

use crate::domain::ast::{dump, ClassDef, Constant, Expr, Module, Stmt, StmtKind};
use crate::domain::error::{Result, TangleError};

/// Classify a module's top-level statements into `(name, definition)` pairs.
///
/// Skipped without yielding: imports, docstring expression statements, the
/// `sys.modules` registry hack, and the `if __name__ == "__main__"` guard.
/// Tuple-unpacking assignments expand into one synthesized single-target
/// assignment per target/value pair.
pub fn module_definitions(module: &Module) -> Result<Vec<(String, Stmt)>> {
    let mut defs = Vec::new();
    for stmt in &module.body {
        match &stmt.kind {
            StmtKind::Import { .. } | StmtKind::ImportFrom { .. } => {}
            _ if is_docstring(stmt) => {}
            _ if is_registry_hack(stmt) => {}
            _ if is_main_guard(stmt) => {}
            StmtKind::ClassDef(class) => defs.push((class.name.clone(), stmt.clone())),
            StmtKind::FunctionDef(func) => defs.push((func.name.clone(), stmt.clone())),
            StmtKind::Assign { targets, value } => {
                expand_assign(stmt, targets, value, MemberContext::Module, &mut defs)?;
            }
            _ => {
                return Err(TangleError::InvalidModuleMember {
                    line: stmt.line,
                    detail: dump(stmt),
                })
            }
        }
    }
    Ok(defs)
}

/// Classify a class body into `(name, member)` pairs.
///
/// Same shapes as the module level minus the module-only skips; an import
/// or nested class inside a class body is structural corruption.
pub fn class_members(class: &ClassDef) -> Result<Vec<(String, Stmt)>> {
    let mut members = Vec::new();
    for stmt in &class.body {
        match &stmt.kind {
            _ if is_docstring(stmt) => {}
            StmtKind::FunctionDef(func) => members.push((func.name.clone(), stmt.clone())),
            StmtKind::Assign { targets, value } => {
                expand_assign(stmt, targets, value, MemberContext::Class, &mut members)?;
            }
            _ => {
                return Err(TangleError::InvalidClassMember {
                    line: stmt.line,
                    detail: dump(stmt),
                })
            }
        }
    }
    Ok(members)
}

#[derive(Clone, Copy)]
enum MemberContext {
    Module,
    Class,
}

impl MemberContext {
    fn error(self, stmt: &Stmt) -> TangleError {
        match self {
            MemberContext::Module => TangleError::InvalidModuleMember {
                line: stmt.line,
                detail: dump(stmt),
            },
            MemberContext::Class => TangleError::InvalidClassMember {
                line: stmt.line,
                detail: dump(stmt),
            },
        }
    }
}

/// Expand an assignment into named definitions. A single-name target yields
/// the statement as-is; a tuple target must pair with a tuple literal value
/// of the same arity and yields one synthesized assignment per pair.
fn expand_assign(
    stmt: &Stmt,
    targets: &[Expr],
    value: &Expr,
    context: MemberContext,
    out: &mut Vec<(String, Stmt)>,
) -> Result<()> {
    if targets.len() != 1 {
        return Err(context.error(stmt));
    }
    match &targets[0] {
        Expr::Name(name) => {
            out.push((name.clone(), stmt.clone()));
            Ok(())
        }
        Expr::Tuple(vars) => {
            let vals = match value {
                Expr::Tuple(vals) if vals.len() == vars.len() => vals,
                _ => return Err(context.error(stmt)),
            };
            for (var, val) in vars.iter().zip(vals) {
                let name = match var {
                    Expr::Name(name) => name.clone(),
                    _ => return Err(context.error(stmt)),
                };
                let single = Stmt::new(
                    stmt.line,
                    StmtKind::Assign {
                        targets: vec![var.clone()],
                        value: val.clone(),
                    },
                );
                out.push((name, single));
            }
            Ok(())
        }
        _ => Err(context.error(stmt)),
    }
}

/// A bare string-literal expression statement (a docstring).
pub fn is_docstring(stmt: &Stmt) -> bool {
    matches!(
        &stmt.kind,
        StmtKind::Expr(Expr::Constant(Constant::Str(_)))
    )
}

/// `sys.modules[...].attr = ...` — registers a fragment under an alias
/// before it is fully defined. Noise at module level, never a definition.
fn is_registry_hack(stmt: &Stmt) -> bool {
    let StmtKind::Assign { targets, .. } = &stmt.kind else {
        return false;
    };
    let [Expr::Attribute { value, .. }] = targets.as_slice() else {
        return false;
    };
    let Expr::Subscript { value, .. } = value.as_ref() else {
        return false;
    };
    let Expr::Attribute { value, attr } = value.as_ref() else {
        return false;
    };
    attr == "modules" && matches!(value.as_ref(), Expr::Name(n) if n == "sys")
}

/// `if __name__ == "__main__":` — the run-only-when-executed guard.
fn is_main_guard(stmt: &Stmt) -> bool {
    let StmtKind::If { test, .. } = &stmt.kind else {
        return false;
    };
    let Expr::Compare { left, op, right } = test else {
        return false;
    };
    *op == crate::domain::ast::CmpOp::Eq
        && matches!(left.as_ref(), Expr::Name(n) if n == "__name__")
        && matches!(
            right.as_ref(),
            Expr::Constant(Constant::Str(s)) if s == "__main__"
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::CmpOp;

    fn assign(line: u32, target: Expr, value: Expr) -> Stmt {
        Stmt::new(line, StmtKind::Assign { targets: vec![target], value })
    }

    fn class_def(name: &str, body: Vec<Stmt>) -> Stmt {
        Stmt::new(
            1,
            StmtKind::ClassDef(ClassDef {
                name: name.to_string(),
                bases: vec![],
                keywords: vec![],
                body,
                decorators: vec![],
            }),
        )
    }

    #[test]
    fn module_yields_classes_functions_and_bindings() {
        let module = Module::new(vec![
            class_def("Browser", vec![Stmt::new(2, StmtKind::Pass)]),
            assign(3, Expr::name("WIDTH"), Expr::int(800)),
        ]);
        let defs = module_definitions(&module).unwrap();
        let names: Vec<&str> = defs.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Browser", "WIDTH"]);
    }

    #[test]
    fn module_skips_imports_docstrings_and_guards() {
        let module = Module::new(vec![
            Stmt::new(1, StmtKind::Expr(Expr::string("module docstring"))),
            Stmt::new(2, StmtKind::Import { modules: vec!["sys".to_string()] }),
            Stmt::new(
                3,
                StmtKind::If {
                    test: Expr::Compare {
                        left: Box::new(Expr::name("__name__")),
                        op: CmpOp::Eq,
                        right: Box::new(Expr::string("__main__")),
                    },
                    body: vec![Stmt::new(4, StmtKind::Pass)],
                    orelse: vec![],
                },
            ),
            assign(5, Expr::name("x"), Expr::int(1)),
        ]);
        let defs = module_definitions(&module).unwrap();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].0, "x");
    }

    #[test]
    fn module_skips_sys_modules_registry_hack() {
        // sys.modules["tkinter"].font = something
        let target = Expr::Attribute {
            value: Box::new(Expr::Subscript {
                value: Box::new(Expr::attribute(Expr::name("sys"), "modules")),
                index: Box::new(Expr::string("tkinter")),
            }),
            attr: "font".to_string(),
        };
        let module = Module::new(vec![assign(1, target, Expr::name("stub"))]);
        assert!(module_definitions(&module).unwrap().is_empty());
    }

    #[test]
    fn tuple_unpack_expands_to_single_bindings() {
        let module = Module::new(vec![assign(
            1,
            Expr::Tuple(vec![Expr::name("x"), Expr::name("y")]),
            Expr::Tuple(vec![Expr::int(1), Expr::int(2)]),
        )]);
        let defs = module_definitions(&module).unwrap();
        assert_eq!(defs.len(), 2);
        assert_eq!(defs[0].0, "x");
        assert_eq!(
            defs[0].1.kind,
            StmtKind::Assign { targets: vec![Expr::name("x")], value: Expr::int(1) }
        );
        assert_eq!(defs[1].0, "y");
        assert_eq!(
            defs[1].1.kind,
            StmtKind::Assign { targets: vec![Expr::name("y")], value: Expr::int(2) }
        );
    }

    #[test]
    fn tuple_unpack_arity_mismatch_is_fatal() {
        let module = Module::new(vec![assign(
            1,
            Expr::Tuple(vec![Expr::name("x"), Expr::name("y")]),
            Expr::Tuple(vec![Expr::int(1)]),
        )]);
        assert!(matches!(
            module_definitions(&module),
            Err(TangleError::InvalidModuleMember { line: 1, .. })
        ));
    }

    #[test]
    fn tuple_unpack_requires_tuple_value() {
        let module = Module::new(vec![assign(
            1,
            Expr::Tuple(vec![Expr::name("x"), Expr::name("y")]),
            Expr::call(Expr::name("make_pair"), vec![]),
        )]);
        assert!(module_definitions(&module).is_err());
    }

    #[test]
    fn unrecognized_module_statement_is_fatal() {
        let module = Module::new(vec![Stmt::new(
            9,
            StmtKind::Expr(Expr::call(Expr::name("print"), vec![])),
        )]);
        assert!(matches!(
            module_definitions(&module),
            Err(TangleError::InvalidModuleMember { line: 9, .. })
        ));
    }

    #[test]
    fn class_yields_methods_and_fields() {
        let class = ClassDef {
            name: "Tab".to_string(),
            bases: vec![],
            keywords: vec![],
            body: vec![
                Stmt::new(2, StmtKind::Expr(Expr::string("doc"))),
                Stmt::new(
                    3,
                    StmtKind::FunctionDef(crate::domain::ast::FunctionDef {
                        name: "load".to_string(),
                        params: vec![crate::domain::ast::Param::plain("self")],
                        body: vec![Stmt::new(4, StmtKind::Pass)],
                        decorators: vec![],
                    }),
                ),
                assign(5, Expr::name("SCROLL_STEP"), Expr::int(100)),
            ],
            decorators: vec![],
        };
        let members = class_members(&class).unwrap();
        let names: Vec<&str> = members.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["load", "SCROLL_STEP"]);
    }

    #[test]
    fn import_inside_class_body_is_fatal() {
        let class = ClassDef {
            name: "Tab".to_string(),
            bases: vec![],
            keywords: vec![],
            body: vec![Stmt::new(
                2,
                StmtKind::ImportFrom {
                    level: 0,
                    module: Some("helpers".to_string()),
                    names: vec![crate::domain::ast::ImportName {
                        name: "tree_to_list".to_string(),
                        alias: None,
                    }],
                },
            )],
            decorators: vec![],
        };
        assert!(matches!(
            class_members(&class),
            Err(TangleError::InvalidClassMember { line: 2, .. })
        ));
    }
}
