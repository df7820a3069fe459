// Pretty-printer for canonical trees.
//
// Guaranteed to reproduce valid, re-parseable source for any tree made only
// of canonical node shapes. Trees still containing legacy shapes cannot be
// printed; `unparse_or_dump` degrades to a raw structural dump for those,
// optionally wrapped as an inline comment flagging that manual conversion
// is needed.

use crate::domain::ast::{
    dump, BinOp, ClassDef, CmpOp, Constant, Expr, FunctionDef, Module, Stmt, StmtKind, UnaryOp,
};
use crate::domain::error::{Result, TangleError};
use crate::ports::SourceUnparser;

const INDENT: &str = "    ";

pub struct PrettyUnparser;

impl SourceUnparser for PrettyUnparser {
    fn unparse(&self, module: &Module) -> Result<String> {
        let mut out = String::new();
        for stmt in &module.body {
            write_stmt(&mut out, stmt, 0)?;
        }
        Ok(out)
    }
}

/// Unparse, falling back to a structural dump for trees the printer cannot
/// guarantee. With `explain` the dump is wrapped as a comment so the output
/// flags itself as needing manual conversion.
pub fn unparse_or_dump(module: &Module, explain: bool) -> String {
    match PrettyUnparser.unparse(module) {
        Ok(text) => text,
        Err(_) if explain => format!("# Please convert manually: {}\n", dump(module)),
        Err(_) => dump(module),
    }
}

fn write_stmt(out: &mut String, stmt: &Stmt, level: usize) -> Result<()> {
    let pad = INDENT.repeat(level);
    match &stmt.kind {
        StmtKind::ClassDef(class) => write_class(out, class, level)?,
        StmtKind::FunctionDef(func) => write_def(out, func, level)?,
        StmtKind::Assign { targets, value } => {
            out.push_str(&pad);
            for target in targets {
                write_expr(out, target)?;
                out.push_str(" = ");
            }
            write_expr(out, value)?;
            out.push('\n');
        }
        StmtKind::Import { modules } => {
            out.push_str(&pad);
            out.push_str("import ");
            out.push_str(&modules.join(", "));
            out.push('\n');
        }
        StmtKind::ImportFrom { level: dots, module, names } => {
            out.push_str(&pad);
            out.push_str("from ");
            out.push_str(&".".repeat(*dots as usize));
            if let Some(module) = module {
                out.push_str(module);
            }
            out.push_str(" import ");
            let rendered: Vec<String> = names
                .iter()
                .map(|n| match &n.alias {
                    Some(alias) => format!("{} as {}", n.name, alias),
                    None => n.name.clone(),
                })
                .collect();
            out.push_str(&rendered.join(", "));
            out.push('\n');
        }
        StmtKind::If { test, body, orelse } => {
            out.push_str(&pad);
            out.push_str("if ");
            write_expr(out, test)?;
            out.push_str(":\n");
            write_body(out, body, level + 1)?;
            if !orelse.is_empty() {
                out.push_str(&pad);
                out.push_str("else:\n");
                write_body(out, orelse, level + 1)?;
            }
        }
        StmtKind::While { test, body } => {
            out.push_str(&pad);
            out.push_str("while ");
            write_expr(out, test)?;
            out.push_str(":\n");
            write_body(out, body, level + 1)?;
        }
        StmtKind::For { target, iter, body } => {
            out.push_str(&pad);
            out.push_str("for ");
            write_expr(out, target)?;
            out.push_str(" in ");
            write_expr(out, iter)?;
            out.push_str(":\n");
            write_body(out, body, level + 1)?;
        }
        StmtKind::Return(value) => {
            out.push_str(&pad);
            out.push_str("return");
            if let Some(value) = value {
                out.push(' ');
                write_expr(out, value)?;
            }
            out.push('\n');
        }
        StmtKind::Raise(value) => {
            out.push_str(&pad);
            out.push_str("raise");
            if let Some(value) = value {
                out.push(' ');
                write_expr(out, value)?;
            }
            out.push('\n');
        }
        StmtKind::Pass => {
            out.push_str(&pad);
            out.push_str("pass\n");
        }
        StmtKind::Expr(expr) => {
            out.push_str(&pad);
            write_expr(out, expr)?;
            out.push('\n');
        }
    }
    Ok(())
}

fn write_body(out: &mut String, body: &[Stmt], level: usize) -> Result<()> {
    if body.is_empty() {
        out.push_str(&INDENT.repeat(level));
        out.push_str("pass\n");
        return Ok(());
    }
    for stmt in body {
        write_stmt(out, stmt, level)?;
    }
    Ok(())
}

fn write_class(out: &mut String, class: &ClassDef, level: usize) -> Result<()> {
    let pad = INDENT.repeat(level);
    for decorator in &class.decorators {
        out.push_str(&pad);
        out.push('@');
        write_expr(out, decorator)?;
        out.push('\n');
    }
    out.push_str(&pad);
    out.push_str("class ");
    out.push_str(&class.name);
    if !class.bases.is_empty() || !class.keywords.is_empty() {
        out.push('(');
        let mut first = true;
        for base in &class.bases {
            if !first {
                out.push_str(", ");
            }
            first = false;
            write_expr(out, base)?;
        }
        for kw in &class.keywords {
            if !first {
                out.push_str(", ");
            }
            first = false;
            out.push_str(&kw.arg);
            out.push('=');
            write_expr(out, &kw.value)?;
        }
        out.push(')');
    }
    out.push_str(":\n");
    write_body(out, &class.body, level + 1)
}

fn write_def(out: &mut String, func: &FunctionDef, level: usize) -> Result<()> {
    let pad = INDENT.repeat(level);
    for decorator in &func.decorators {
        out.push_str(&pad);
        out.push('@');
        write_expr(out, decorator)?;
        out.push('\n');
    }
    out.push_str(&pad);
    out.push_str("def ");
    out.push_str(&func.name);
    out.push('(');
    for (i, param) in func.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&param.name);
        if let Some(default) = &param.default {
            out.push('=');
            write_expr(out, default)?;
        }
    }
    out.push_str("):\n");
    write_body(out, &func.body, level + 1)
}

fn write_expr(out: &mut String, expr: &Expr) -> Result<()> {
    match expr {
        Expr::Name(name) => out.push_str(name),
        Expr::Constant(value) => write_constant(out, value),
        Expr::Tuple(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, item)?;
            }
            if items.len() == 1 {
                out.push(',');
            }
            out.push(')');
        }
        Expr::List(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, item)?;
            }
            out.push(']');
        }
        Expr::Dict(pairs) => {
            out.push('{');
            for (i, (key, value)) in pairs.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, key)?;
                out.push_str(": ");
                write_expr(out, value)?;
            }
            out.push('}');
        }
        Expr::Attribute { value, attr } => {
            write_operand(out, value)?;
            out.push('.');
            out.push_str(attr);
        }
        Expr::Subscript { value, index } => {
            write_operand(out, value)?;
            out.push('[');
            match index.as_ref() {
                // A tuple index prints bare: grid[0, 1].
                Expr::Tuple(items) if !items.is_empty() => {
                    for (i, item) in items.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        write_expr(out, item)?;
                    }
                }
                other => write_expr(out, other)?,
            }
            out.push(']');
        }
        Expr::Call { func, args, keywords } => {
            write_operand(out, func)?;
            out.push('(');
            let mut first = true;
            for arg in args {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                write_expr(out, arg)?;
            }
            for kw in keywords {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                out.push_str(&kw.arg);
                out.push('=');
                write_expr(out, &kw.value)?;
            }
            out.push(')');
        }
        Expr::Compare { left, op, right } => {
            write_operand(out, left)?;
            out.push_str(match op {
                CmpOp::Eq => " == ",
                CmpOp::NotEq => " != ",
                CmpOp::Lt => " < ",
                CmpOp::LtE => " <= ",
                CmpOp::Gt => " > ",
                CmpOp::GtE => " >= ",
            });
            write_operand(out, right)?;
        }
        Expr::BinaryOp { left, op, right } => {
            write_operand(out, left)?;
            out.push_str(match op {
                BinOp::Add => " + ",
                BinOp::Sub => " - ",
                BinOp::Mul => " * ",
                BinOp::Div => " / ",
                BinOp::Mod => " % ",
                BinOp::And => " and ",
                BinOp::Or => " or ",
            });
            write_operand(out, right)?;
        }
        Expr::UnaryOp { op, operand } => {
            out.push_str(match op {
                UnaryOp::Not => "not ",
                UnaryOp::Neg => "-",
            });
            write_operand(out, operand)?;
        }
        legacy @ (Expr::Num { .. }
        | Expr::Str { .. }
        | Expr::NameConstant { .. }
        | Expr::EllipsisLiteral
        | Expr::ExtSlice { .. }
        | Expr::Index { .. }) => {
            return Err(TangleError::Unprintable { detail: dump(legacy) });
        }
    }
    Ok(())
}

/// Like `write_expr` but parenthesizes compound operands so precedence
/// survives a round trip.
fn write_operand(out: &mut String, expr: &Expr) -> Result<()> {
    match expr {
        Expr::Compare { .. } | Expr::BinaryOp { .. } | Expr::UnaryOp { .. } => {
            out.push('(');
            write_expr(out, expr)?;
            out.push(')');
            Ok(())
        }
        _ => write_expr(out, expr),
    }
}

fn write_constant(out: &mut String, value: &Constant) {
    match value {
        Constant::Int(n) => out.push_str(&n.to_string()),
        Constant::Float(x) => out.push_str(&x.to_string()),
        Constant::Str(s) => {
            out.push('"');
            for c in s.chars() {
                match c {
                    '"' => out.push_str("\\\""),
                    '\\' => out.push_str("\\\\"),
                    '\n' => out.push_str("\\n"),
                    '\t' => out.push_str("\\t"),
                    other => out.push(other),
                }
            }
            out.push('"');
        }
        Constant::Bool(true) => out.push_str("True"),
        Constant::Bool(false) => out.push_str("False"),
        Constant::None => out.push_str("None"),
        Constant::Ellipsis => out.push_str("..."),
    }
}
