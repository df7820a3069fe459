// Lexer for the fragment language.
//
// Two stages: logos produces word-level tokens for one logical line at a
// time, and a line driver turns leading whitespace into INDENT/DEDENT
// tokens against an indentation stack. Lines ending inside an open bracket
// continue the logical line, so bracketed expressions may span lines.

use logos::{Lexer, Logos};

use crate::domain::error::{Result, TangleError};

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
#[logos(skip r"#[^\n]*")]
pub enum Tok {
    #[token("class")]
    Class,
    #[token("def")]
    Def,
    #[token("from")]
    From,
    #[token("import")]
    Import,
    #[token("as")]
    As,
    #[token("if")]
    If,
    #[token("elif")]
    Elif,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("in")]
    In,
    #[token("return")]
    Return,
    #[token("raise")]
    Raise,
    #[token("pass")]
    Pass,
    #[token("and")]
    And,
    #[token("or")]
    Or,
    #[token("not")]
    Not,
    #[token("True")]
    True,
    #[token("False")]
    False,
    #[token("None")]
    NoneLit,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    Ident(String),
    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    #[regex(r#""([^"\\\n]|\\.)*""#, unescape)]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, unescape)]
    Str(String),

    #[token("...")]
    Ellipsis,
    #[token("==")]
    EqEq,
    #[token("!=")]
    NotEq,
    #[token("<=")]
    LtE,
    #[token(">=")]
    GtE,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("=")]
    Assign,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("@")]
    At,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
}

fn unescape(lex: &mut Lexer<Tok>) -> Option<String> {
    let slice = lex.slice();
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            other => {
                // Unknown escapes pass through verbatim.
                out.push('\\');
                out.push(other);
            }
        }
    }
    Some(out)
}

/// One element of the lexed stream: a word token or a layout token.
#[derive(Debug, Clone, PartialEq)]
pub enum LexItem {
    Tok(Tok),
    Newline,
    Indent,
    Dedent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub item: LexItem,
    pub line: u32,
}

impl Spanned {
    fn new(item: LexItem, line: u32) -> Self {
        Self { item, line }
    }
}

/// Lex a whole source into a flat token stream with layout tokens.
pub fn lex(source: &str, source_name: &str) -> Result<Vec<Spanned>> {
    let syntax = |line: u32, detail: String| TangleError::Syntax {
        source_name: source_name.to_string(),
        line,
        detail,
    };

    let mut out: Vec<Spanned> = Vec::new();
    let mut indents: Vec<usize> = vec![0];
    let mut depth: i64 = 0;
    let mut last_line = 1u32;

    for (idx, raw) in source.lines().enumerate() {
        let line = idx as u32 + 1;
        last_line = line;

        let content = if depth == 0 {
            let trimmed = raw.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let indent = raw.len() - trimmed.len();
            if raw[..indent].contains('\t') {
                return Err(syntax(line, "tabs in indentation are not supported".to_string()));
            }
            if indent > *indents.last().unwrap_or(&0) {
                indents.push(indent);
                out.push(Spanned::new(LexItem::Indent, line));
            } else {
                while indent < *indents.last().unwrap_or(&0) {
                    indents.pop();
                    out.push(Spanned::new(LexItem::Dedent, line));
                }
                if indent != *indents.last().unwrap_or(&0) {
                    return Err(syntax(
                        line,
                        "unindent does not match any outer indentation level".to_string(),
                    ));
                }
            }
            trimmed
        } else {
            raw
        };

        for result in Tok::lexer(content).spanned() {
            let (tok, span) = result;
            let tok = tok.map_err(|_| {
                syntax(
                    line,
                    format!("unexpected character {:?}", &content[span.clone()]),
                )
            })?;
            match tok {
                Tok::LParen | Tok::LBracket | Tok::LBrace => depth += 1,
                Tok::RParen | Tok::RBracket | Tok::RBrace => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return Err(syntax(line, "unbalanced closing bracket".to_string()));
            }
            out.push(Spanned::new(LexItem::Tok(tok), line));
        }

        if depth == 0 {
            out.push(Spanned::new(LexItem::Newline, line));
        }
    }

    if depth > 0 {
        return Err(syntax(last_line, "unexpected end of source inside brackets".to_string()));
    }
    while indents.len() > 1 {
        indents.pop();
        out.push(Spanned::new(LexItem::Dedent, last_line));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(source: &str) -> Vec<LexItem> {
        lex(source, "<test>").unwrap().into_iter().map(|s| s.item).collect()
    }

    #[test]
    fn flat_statements_end_with_newline() {
        assert_eq!(
            items("x = 1\n"),
            vec![
                LexItem::Tok(Tok::Ident("x".to_string())),
                LexItem::Tok(Tok::Assign),
                LexItem::Tok(Tok::Int(1)),
                LexItem::Newline,
            ]
        );
    }

    #[test]
    fn suites_produce_indent_and_dedent() {
        let toks = items("def f():\n    pass\nx = 1\n");
        let layout: Vec<&LexItem> = toks
            .iter()
            .filter(|i| !matches!(i, LexItem::Tok(_)))
            .collect();
        assert_eq!(
            layout,
            vec![
                &LexItem::Newline,
                &LexItem::Indent,
                &LexItem::Newline,
                &LexItem::Dedent,
                &LexItem::Newline,
            ]
        );
    }

    #[test]
    fn blank_and_comment_lines_are_invisible_to_layout() {
        let toks = items("def f():\n\n    # setup\n    pass\n");
        assert_eq!(toks.iter().filter(|i| **i == LexItem::Indent).count(), 1);
        assert_eq!(toks.iter().filter(|i| **i == LexItem::Dedent).count(), 1);
    }

    #[test]
    fn open_brackets_continue_the_logical_line() {
        let toks = items("x = f(1,\n      2)\n");
        assert_eq!(toks.iter().filter(|i| **i == LexItem::Newline).count(), 1);
        assert_eq!(toks.iter().filter(|i| **i == LexItem::Indent).count(), 0);
    }

    #[test]
    fn string_escapes_are_decoded() {
        let toks = items(r#"s = "a\nb""#);
        assert!(toks.contains(&LexItem::Tok(Tok::Str("a\nb".to_string()))));
    }

    #[test]
    fn inconsistent_dedent_is_a_syntax_error() {
        let err = lex("if x:\n        pass\n    pass\n", "<test>").unwrap_err();
        assert!(matches!(err, TangleError::Syntax { line: 3, .. }));
    }

    #[test]
    fn keywords_beat_identifiers() {
        let toks = items("classify = 1\nclass C:\n    pass\n");
        assert!(toks.contains(&LexItem::Tok(Tok::Ident("classify".to_string()))));
        assert!(toks.contains(&LexItem::Tok(Tok::Class)));
    }
}
