// Recursive-descent parser for the fragment language subset.
//
// Covers exactly the statement and expression shapes the engine classifies:
// class/function definitions (with decorators), assignments, both import
// forms, `if`/`while`/`for` suites, `return`/`raise`/`pass`, and plain
// expression statements. The output tree is canonicalized before being
// handed to the caller.

use crate::domain::ast::{
    BinOp, ClassDef, CmpOp, Constant, Expr, FunctionDef, ImportName, Keyword, Module, Param,
    Stmt, StmtKind, UnaryOp,
};
use crate::domain::error::{Result, TangleError};
use crate::domain::normalize;
use crate::infrastructure::lexer::{lex, LexItem, Spanned, Tok};
use crate::ports::SourceParser;

/// The shipped `SourceParser` implementation.
pub struct DefaultParser;

impl SourceParser for DefaultParser {
    fn parse(&self, text: &str, source_name: &str) -> Result<Module> {
        let toks = lex(text, source_name)?;
        let mut parser = Parser { toks, pos: 0, source_name };
        let module = parser.parse_module()?;
        Ok(normalize::normalize_module(module))
    }
}

struct Parser<'a> {
    toks: Vec<Spanned>,
    pos: usize,
    source_name: &'a str,
}

impl Parser<'_> {
    fn parse_module(&mut self) -> Result<Module> {
        let mut body = Vec::new();
        while self.pos < self.toks.len() {
            body.push(self.parse_statement()?);
        }
        Ok(Module::new(body))
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> Option<&LexItem> {
        self.toks.get(self.pos).map(|s| &s.item)
    }

    fn peek_at(&self, offset: usize) -> Option<&LexItem> {
        self.toks.get(self.pos + offset).map(|s| &s.item)
    }

    fn line(&self) -> u32 {
        self.toks
            .get(self.pos)
            .or_else(|| self.toks.last())
            .map(|s| s.line)
            .unwrap_or(1)
    }

    fn error(&self, detail: impl Into<String>) -> TangleError {
        TangleError::Syntax {
            source_name: self.source_name.to_string(),
            line: self.line(),
            detail: detail.into(),
        }
    }

    fn advance(&mut self) -> Option<LexItem> {
        let item = self.toks.get(self.pos).map(|s| s.item.clone());
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn eat(&mut self, wanted: &LexItem) -> bool {
        if self.peek() == Some(wanted) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_tok(&mut self, wanted: Tok) -> bool {
        self.eat(&LexItem::Tok(wanted))
    }

    fn expect_tok(&mut self, wanted: Tok) -> Result<()> {
        if self.eat_tok(wanted.clone()) {
            Ok(())
        } else {
            Err(self.error(format!("expected {:?}, found {:?}", wanted, self.peek())))
        }
    }

    fn expect_newline(&mut self) -> Result<()> {
        if self.eat(&LexItem::Newline) {
            Ok(())
        } else {
            Err(self.error(format!("expected end of line, found {:?}", self.peek())))
        }
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.peek() {
            Some(LexItem::Tok(Tok::Ident(name))) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            other => Err(self.error(format!("expected a name, found {:?}", other))),
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_statement(&mut self) -> Result<Stmt> {
        let line = self.line();
        match self.peek() {
            Some(LexItem::Tok(Tok::At)) => self.parse_decorated(),
            Some(LexItem::Tok(Tok::Class)) => self.parse_class(line, Vec::new()),
            Some(LexItem::Tok(Tok::Def)) => self.parse_def(line, Vec::new()),
            Some(LexItem::Tok(Tok::If)) => self.parse_if(line),
            Some(LexItem::Tok(Tok::While)) => {
                self.pos += 1;
                let test = self.parse_expr()?;
                let body = self.parse_suite()?;
                Ok(Stmt::new(line, StmtKind::While { test, body }))
            }
            Some(LexItem::Tok(Tok::For)) => {
                self.pos += 1;
                let target = self.parse_expr_list()?;
                self.expect_tok(Tok::In)?;
                let iter = self.parse_expr_list()?;
                let body = self.parse_suite()?;
                Ok(Stmt::new(line, StmtKind::For { target, iter, body }))
            }
            _ => {
                let stmt = self.parse_simple_statement(line)?;
                self.expect_newline()?;
                Ok(stmt)
            }
        }
    }

    fn parse_simple_statement(&mut self, line: u32) -> Result<Stmt> {
        match self.peek() {
            Some(LexItem::Tok(Tok::Pass)) => {
                self.pos += 1;
                Ok(Stmt::new(line, StmtKind::Pass))
            }
            Some(LexItem::Tok(Tok::Return)) => {
                self.pos += 1;
                let value = if self.peek() == Some(&LexItem::Newline) {
                    None
                } else {
                    Some(self.parse_expr_list()?)
                };
                Ok(Stmt::new(line, StmtKind::Return(value)))
            }
            Some(LexItem::Tok(Tok::Raise)) => {
                self.pos += 1;
                let value = if self.peek() == Some(&LexItem::Newline) {
                    None
                } else {
                    Some(self.parse_expr()?)
                };
                Ok(Stmt::new(line, StmtKind::Raise(value)))
            }
            Some(LexItem::Tok(Tok::Import)) => {
                self.pos += 1;
                let mut modules = vec![self.parse_dotted_name()?];
                while self.eat_tok(Tok::Comma) {
                    modules.push(self.parse_dotted_name()?);
                }
                Ok(Stmt::new(line, StmtKind::Import { modules }))
            }
            Some(LexItem::Tok(Tok::From)) => self.parse_import_from(line),
            _ => self.parse_assign_or_expr(line),
        }
    }

    fn parse_dotted_name(&mut self) -> Result<String> {
        let mut name = self.expect_ident()?;
        while self.eat_tok(Tok::Dot) {
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Ok(name)
    }

    fn parse_import_from(&mut self, line: u32) -> Result<Stmt> {
        self.expect_tok(Tok::From)?;
        let mut level = 0u32;
        while self.eat_tok(Tok::Dot) {
            level += 1;
        }
        let module = match self.peek() {
            Some(LexItem::Tok(Tok::Import)) => None,
            _ => Some(self.parse_dotted_name()?),
        };
        self.expect_tok(Tok::Import)?;
        let mut names = Vec::new();
        loop {
            let name = if self.eat_tok(Tok::Star) {
                "*".to_string()
            } else {
                self.expect_ident()?
            };
            let alias = if self.eat_tok(Tok::As) {
                Some(self.expect_ident()?)
            } else {
                None
            };
            names.push(ImportName { name, alias });
            if !self.eat_tok(Tok::Comma) {
                break;
            }
        }
        Ok(Stmt::new(line, StmtKind::ImportFrom { level, module, names }))
    }

    fn parse_assign_or_expr(&mut self, line: u32) -> Result<Stmt> {
        let first = self.parse_expr_list()?;
        if self.peek() != Some(&LexItem::Tok(Tok::Assign)) {
            return Ok(Stmt::new(line, StmtKind::Expr(first)));
        }
        let mut parts = vec![first];
        while self.eat_tok(Tok::Assign) {
            parts.push(self.parse_expr_list()?);
        }
        let value = parts.pop().ok_or_else(|| self.error("empty assignment"))?;
        Ok(Stmt::new(line, StmtKind::Assign { targets: parts, value }))
    }

    fn parse_decorated(&mut self) -> Result<Stmt> {
        let line = self.line();
        let mut decorators = Vec::new();
        while self.eat_tok(Tok::At) {
            decorators.push(self.parse_expr()?);
            self.expect_newline()?;
        }
        match self.peek() {
            Some(LexItem::Tok(Tok::Class)) => self.parse_class(line, decorators),
            Some(LexItem::Tok(Tok::Def)) => self.parse_def(line, decorators),
            other => Err(self.error(format!(
                "decorators must precede a class or function, found {:?}",
                other
            ))),
        }
    }

    fn parse_class(&mut self, line: u32, decorators: Vec<Expr>) -> Result<Stmt> {
        self.expect_tok(Tok::Class)?;
        let name = self.expect_ident()?;
        let mut bases = Vec::new();
        let mut keywords = Vec::new();
        if self.eat_tok(Tok::LParen) {
            self.parse_call_args(&mut bases, &mut keywords)?;
            self.expect_tok(Tok::RParen)?;
        }
        let body = self.parse_suite()?;
        Ok(Stmt::new(
            line,
            StmtKind::ClassDef(ClassDef { name, bases, keywords, body, decorators }),
        ))
    }

    fn parse_def(&mut self, line: u32, decorators: Vec<Expr>) -> Result<Stmt> {
        self.expect_tok(Tok::Def)?;
        let name = self.expect_ident()?;
        self.expect_tok(Tok::LParen)?;
        let mut params = Vec::new();
        if self.peek() != Some(&LexItem::Tok(Tok::RParen)) {
            loop {
                let param_name = self.expect_ident()?;
                let default = if self.eat_tok(Tok::Assign) {
                    Some(self.parse_expr()?)
                } else {
                    None
                };
                params.push(Param { name: param_name, default });
                if !self.eat_tok(Tok::Comma) {
                    break;
                }
            }
        }
        self.expect_tok(Tok::RParen)?;
        let body = self.parse_suite()?;
        Ok(Stmt::new(
            line,
            StmtKind::FunctionDef(FunctionDef { name, params, body, decorators }),
        ))
    }

    fn parse_if(&mut self, line: u32) -> Result<Stmt> {
        // `elif` chains become nested If statements in the orelse slot.
        self.pos += 1;
        let test = self.parse_expr()?;
        let body = self.parse_suite()?;
        let orelse = match self.peek() {
            Some(LexItem::Tok(Tok::Elif)) => {
                let elif_line = self.line();
                vec![self.parse_if(elif_line)?]
            }
            Some(LexItem::Tok(Tok::Else)) => {
                self.pos += 1;
                self.parse_suite()?
            }
            _ => Vec::new(),
        };
        Ok(Stmt::new(line, StmtKind::If { test, body, orelse }))
    }

    /// `: NEWLINE INDENT stmt+ DEDENT`, or a single simple statement on the
    /// same line.
    fn parse_suite(&mut self) -> Result<Vec<Stmt>> {
        self.expect_tok(Tok::Colon)?;
        if !self.eat(&LexItem::Newline) {
            let line = self.line();
            let stmt = self.parse_simple_statement(line)?;
            self.expect_newline()?;
            return Ok(vec![stmt]);
        }
        if !self.eat(&LexItem::Indent) {
            return Err(self.error("expected an indented block"));
        }
        let mut body = Vec::new();
        while !self.eat(&LexItem::Dedent) {
            if self.pos >= self.toks.len() {
                return Err(self.error("unexpected end of source in indented block"));
            }
            body.push(self.parse_statement()?);
        }
        Ok(body)
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// An expression, or a bare comma-separated tuple of expressions.
    fn parse_expr_list(&mut self) -> Result<Expr> {
        let first = self.parse_expr()?;
        if self.peek() != Some(&LexItem::Tok(Tok::Comma)) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_tok(Tok::Comma) {
            if self.at_expr_terminator() {
                break;
            }
            items.push(self.parse_expr()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn at_expr_terminator(&self) -> bool {
        matches!(
            self.peek(),
            None | Some(LexItem::Newline)
                | Some(LexItem::Tok(Tok::Assign))
                | Some(LexItem::Tok(Tok::Colon))
                | Some(LexItem::Tok(Tok::RParen))
                | Some(LexItem::Tok(Tok::RBracket))
                | Some(LexItem::Tok(Tok::RBrace))
                | Some(LexItem::Tok(Tok::In))
        )
    }

    fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr> {
        let mut left = self.parse_and()?;
        while self.eat_tok(Tok::Or) {
            let right = self.parse_and()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op: BinOp::Or,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr> {
        let mut left = self.parse_not()?;
        while self.eat_tok(Tok::And) {
            let right = self.parse_not()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op: BinOp::And,
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr> {
        if self.eat_tok(Tok::Not) {
            let operand = self.parse_not()?;
            return Ok(Expr::UnaryOp { op: UnaryOp::Not, operand: Box::new(operand) });
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> Result<Expr> {
        let left = self.parse_arith()?;
        let op = match self.peek() {
            Some(LexItem::Tok(Tok::EqEq)) => CmpOp::Eq,
            Some(LexItem::Tok(Tok::NotEq)) => CmpOp::NotEq,
            Some(LexItem::Tok(Tok::Lt)) => CmpOp::Lt,
            Some(LexItem::Tok(Tok::LtE)) => CmpOp::LtE,
            Some(LexItem::Tok(Tok::Gt)) => CmpOp::Gt,
            Some(LexItem::Tok(Tok::GtE)) => CmpOp::GtE,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.parse_arith()?;
        Ok(Expr::Compare {
            left: Box::new(left),
            op,
            right: Box::new(right),
        })
    }

    fn parse_arith(&mut self) -> Result<Expr> {
        let mut left = self.parse_term()?;
        loop {
            let op = match self.peek() {
                Some(LexItem::Tok(Tok::Plus)) => BinOp::Add,
                Some(LexItem::Tok(Tok::Minus)) => BinOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_term()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
    }

    fn parse_term(&mut self) -> Result<Expr> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(LexItem::Tok(Tok::Star)) => BinOp::Mul,
                Some(LexItem::Tok(Tok::Slash)) => BinOp::Div,
                Some(LexItem::Tok(Tok::Percent)) => BinOp::Mod,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.parse_unary()?;
            left = Expr::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        if self.eat_tok(Tok::Minus) {
            let operand = self.parse_unary()?;
            return Ok(Expr::UnaryOp { op: UnaryOp::Neg, operand: Box::new(operand) });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr> {
        let mut expr = self.parse_atom()?;
        loop {
            if self.eat_tok(Tok::Dot) {
                let attr = self.expect_ident()?;
                expr = Expr::Attribute { value: Box::new(expr), attr };
            } else if self.eat_tok(Tok::LParen) {
                let mut args = Vec::new();
                let mut keywords = Vec::new();
                self.parse_call_args(&mut args, &mut keywords)?;
                self.expect_tok(Tok::RParen)?;
                expr = Expr::Call { func: Box::new(expr), args, keywords };
            } else if self.eat_tok(Tok::LBracket) {
                let index = self.parse_expr_list()?;
                self.expect_tok(Tok::RBracket)?;
                expr = Expr::Subscript {
                    value: Box::new(expr),
                    index: Box::new(index),
                };
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma-separated call or class-header arguments: positional
    /// expressions and `name=value` keywords.
    fn parse_call_args(&mut self, args: &mut Vec<Expr>, keywords: &mut Vec<Keyword>) -> Result<()> {
        if self.peek() == Some(&LexItem::Tok(Tok::RParen)) {
            return Ok(());
        }
        loop {
            let is_keyword = matches!(self.peek(), Some(LexItem::Tok(Tok::Ident(_))))
                && self.peek_at(1) == Some(&LexItem::Tok(Tok::Assign));
            if is_keyword {
                let arg = self.expect_ident()?;
                self.expect_tok(Tok::Assign)?;
                let value = self.parse_expr()?;
                keywords.push(Keyword { arg, value });
            } else {
                args.push(self.parse_expr()?);
            }
            if !self.eat_tok(Tok::Comma) {
                return Ok(());
            }
            if self.peek() == Some(&LexItem::Tok(Tok::RParen)) {
                return Ok(());
            }
        }
    }

    fn parse_atom(&mut self) -> Result<Expr> {
        match self.advance() {
            Some(LexItem::Tok(Tok::Ident(name))) => Ok(Expr::Name(name)),
            Some(LexItem::Tok(Tok::Int(n))) => Ok(Expr::Constant(Constant::Int(n))),
            Some(LexItem::Tok(Tok::Float(x))) => Ok(Expr::Constant(Constant::Float(x))),
            Some(LexItem::Tok(Tok::Str(s))) => Ok(Expr::Constant(Constant::Str(s))),
            Some(LexItem::Tok(Tok::True)) => Ok(Expr::Constant(Constant::Bool(true))),
            Some(LexItem::Tok(Tok::False)) => Ok(Expr::Constant(Constant::Bool(false))),
            Some(LexItem::Tok(Tok::NoneLit)) => Ok(Expr::Constant(Constant::None)),
            Some(LexItem::Tok(Tok::Ellipsis)) => Ok(Expr::Constant(Constant::Ellipsis)),
            Some(LexItem::Tok(Tok::LParen)) => {
                if self.eat_tok(Tok::RParen) {
                    return Ok(Expr::Tuple(Vec::new()));
                }
                let inner = self.parse_expr_list()?;
                self.expect_tok(Tok::RParen)?;
                Ok(inner)
            }
            Some(LexItem::Tok(Tok::LBracket)) => {
                let mut items = Vec::new();
                while !self.eat_tok(Tok::RBracket) {
                    items.push(self.parse_expr()?);
                    if !self.eat_tok(Tok::Comma) {
                        self.expect_tok(Tok::RBracket)?;
                        break;
                    }
                }
                Ok(Expr::List(items))
            }
            Some(LexItem::Tok(Tok::LBrace)) => {
                let mut pairs = Vec::new();
                while !self.eat_tok(Tok::RBrace) {
                    let key = self.parse_expr()?;
                    self.expect_tok(Tok::Colon)?;
                    let value = self.parse_expr()?;
                    pairs.push((key, value));
                    if !self.eat_tok(Tok::Comma) {
                        self.expect_tok(Tok::RBrace)?;
                        break;
                    }
                }
                Ok(Expr::Dict(pairs))
            }
            other => {
                self.pos = self.pos.saturating_sub(1);
                Err(self.error(format!("expected an expression, found {:?}", other)))
            }
        }
    }
}
