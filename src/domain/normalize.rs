// Canonicalizing rewrite for legacy node shapes.
//
// Older front ends emit dedicated nodes for numeric literals, string
// literals, named singleton constants, ellipsis literals, extended
// multi-dimensional subscripts, and single-index subscript wrappers. This
// pass rewrites all of them into the canonical shapes once, right after
// parsing, so the classifier and both resolvers match on a fixed node set.
// The transform is total over valid parser output and has no error cases.

use crate::domain::ast::{Constant, Expr, Module, Stmt, StmtKind};

pub fn normalize_module(module: Module) -> Module {
    Module { body: normalize_body(module.body) }
}

fn normalize_body(body: Vec<Stmt>) -> Vec<Stmt> {
    body.into_iter().map(normalize_stmt).collect()
}

fn normalize_stmt(stmt: Stmt) -> Stmt {
    let kind = match stmt.kind {
        StmtKind::ClassDef(mut class) => {
            class.bases = class.bases.into_iter().map(normalize_expr).collect();
            class.keywords = class
                .keywords
                .into_iter()
                .map(|mut kw| {
                    kw.value = normalize_expr(kw.value);
                    kw
                })
                .collect();
            class.body = normalize_body(class.body);
            class.decorators = class.decorators.into_iter().map(normalize_expr).collect();
            StmtKind::ClassDef(class)
        }
        StmtKind::FunctionDef(mut func) => {
            for param in &mut func.params {
                param.default = param.default.take().map(normalize_expr);
            }
            func.body = normalize_body(func.body);
            func.decorators = func.decorators.into_iter().map(normalize_expr).collect();
            StmtKind::FunctionDef(func)
        }
        StmtKind::Assign { targets, value } => StmtKind::Assign {
            targets: targets.into_iter().map(normalize_expr).collect(),
            value: normalize_expr(value),
        },
        StmtKind::If { test, body, orelse } => StmtKind::If {
            test: normalize_expr(test),
            body: normalize_body(body),
            orelse: normalize_body(orelse),
        },
        StmtKind::While { test, body } => StmtKind::While {
            test: normalize_expr(test),
            body: normalize_body(body),
        },
        StmtKind::For { target, iter, body } => StmtKind::For {
            target: normalize_expr(target),
            iter: normalize_expr(iter),
            body: normalize_body(body),
        },
        StmtKind::Return(value) => StmtKind::Return(value.map(normalize_expr)),
        StmtKind::Raise(value) => StmtKind::Raise(value.map(normalize_expr)),
        StmtKind::Expr(expr) => StmtKind::Expr(normalize_expr(expr)),
        passthrough @ (StmtKind::Import { .. }
        | StmtKind::ImportFrom { .. }
        | StmtKind::Pass) => passthrough,
    };
    Stmt { line: stmt.line, kind }
}

fn normalize_expr(expr: Expr) -> Expr {
    match expr {
        // Legacy shapes collapse to canonical ones.
        Expr::Num { value } => Expr::Constant(value),
        Expr::Str { value } => Expr::Constant(Constant::Str(value)),
        Expr::NameConstant { value } => Expr::Constant(value),
        Expr::EllipsisLiteral => Expr::Constant(Constant::Ellipsis),
        Expr::ExtSlice { dims } => {
            Expr::Tuple(dims.into_iter().map(normalize_expr).collect())
        }
        Expr::Index { value } => normalize_expr(*value),

        // Canonical shapes recurse structurally.
        Expr::Tuple(items) => Expr::Tuple(items.into_iter().map(normalize_expr).collect()),
        Expr::List(items) => Expr::List(items.into_iter().map(normalize_expr).collect()),
        Expr::Dict(pairs) => Expr::Dict(
            pairs
                .into_iter()
                .map(|(k, v)| (normalize_expr(k), normalize_expr(v)))
                .collect(),
        ),
        Expr::Attribute { value, attr } => Expr::Attribute {
            value: Box::new(normalize_expr(*value)),
            attr,
        },
        Expr::Subscript { value, index } => Expr::Subscript {
            value: Box::new(normalize_expr(*value)),
            index: Box::new(normalize_expr(*index)),
        },
        Expr::Call { func, args, keywords } => Expr::Call {
            func: Box::new(normalize_expr(*func)),
            args: args.into_iter().map(normalize_expr).collect(),
            keywords: keywords
                .into_iter()
                .map(|mut kw| {
                    kw.value = normalize_expr(kw.value);
                    kw
                })
                .collect(),
        },
        Expr::Compare { left, op, right } => Expr::Compare {
            left: Box::new(normalize_expr(*left)),
            op,
            right: Box::new(normalize_expr(*right)),
        },
        Expr::BinaryOp { left, op, right } => Expr::BinaryOp {
            left: Box::new(normalize_expr(*left)),
            op,
            right: Box::new(normalize_expr(*right)),
        },
        Expr::UnaryOp { op, operand } => Expr::UnaryOp {
            op,
            operand: Box::new(normalize_expr(*operand)),
        },
        leaf @ (Expr::Name(_) | Expr::Constant(_)) => leaf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ast::Stmt;

    fn module_of(expr: Expr) -> Module {
        Module::new(vec![Stmt::new(1, StmtKind::Expr(expr))])
    }

    fn first_expr(module: &Module) -> &Expr {
        match &module.body[0].kind {
            StmtKind::Expr(e) => e,
            other => panic!("expected expression statement, got {:?}", other),
        }
    }

    #[test]
    fn legacy_literals_become_constants() {
        let cases = vec![
            (Expr::Num { value: Constant::Int(3) }, Expr::int(3)),
            (Expr::Str { value: "hi".to_string() }, Expr::string("hi")),
            (
                Expr::NameConstant { value: Constant::Bool(true) },
                Expr::Constant(Constant::Bool(true)),
            ),
            (Expr::EllipsisLiteral, Expr::Constant(Constant::Ellipsis)),
        ];
        for (legacy, canonical) in cases {
            let normalized = normalize_module(module_of(legacy));
            assert_eq!(first_expr(&normalized), &canonical);
        }
    }

    #[test]
    fn ext_slice_becomes_tuple_index() {
        let legacy = Expr::Subscript {
            value: Box::new(Expr::name("grid")),
            index: Box::new(Expr::ExtSlice {
                dims: vec![
                    Expr::Index { value: Box::new(Expr::int(0)) },
                    Expr::Index { value: Box::new(Expr::int(1)) },
                ],
            }),
        };
        let normalized = normalize_module(module_of(legacy));
        let expected = Expr::Subscript {
            value: Box::new(Expr::name("grid")),
            index: Box::new(Expr::Tuple(vec![Expr::int(0), Expr::int(1)])),
        };
        assert_eq!(first_expr(&normalized), &expected);
    }

    #[test]
    fn index_wrapper_is_unwrapped() {
        let legacy = Expr::Subscript {
            value: Box::new(Expr::name("xs")),
            index: Box::new(Expr::Index { value: Box::new(Expr::int(0)) }),
        };
        let normalized = normalize_module(module_of(legacy));
        let expected = Expr::Subscript {
            value: Box::new(Expr::name("xs")),
            index: Box::new(Expr::int(0)),
        };
        assert_eq!(first_expr(&normalized), &expected);
    }

    #[test]
    fn legacy_shapes_are_rewritten_in_nested_bodies() {
        let module = Module::new(vec![Stmt::new(
            1,
            StmtKind::If {
                test: Expr::NameConstant { value: Constant::Bool(true) },
                body: vec![Stmt::new(
                    2,
                    StmtKind::Return(Some(Expr::Str { value: "x".to_string() })),
                )],
                orelse: vec![],
            },
        )]);
        let normalized = normalize_module(module);
        match &normalized.body[0].kind {
            StmtKind::If { test, body, .. } => {
                assert_eq!(test, &Expr::Constant(Constant::Bool(true)));
                assert_eq!(
                    body[0].kind,
                    StmtKind::Return(Some(Expr::string("x")))
                );
            }
            other => panic!("expected if, got {:?}", other),
        }
    }

    #[test]
    fn canonical_trees_pass_through_unchanged() {
        let module = module_of(Expr::call(
            Expr::attribute(Expr::name("browser"), "load"),
            vec![Expr::string("http://example.org")],
        ));
        assert_eq!(normalize_module(module.clone()), module);
    }
}
