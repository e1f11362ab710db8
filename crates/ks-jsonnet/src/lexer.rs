//! Tokenizer for template source.

use crate::ast::Span;
use ks_types::{KsError, Result};

/// Token variants.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier or keyword
    Ident(String),
    /// Number literal as written
    Number(String),
    /// String literal, unescaped
    Str(String),
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `;`
    Semicolon,
    /// `$`
    Dollar,
    /// `:`, `::`, `:::` with an optional leading `+`
    Colon {
        /// `+:` form
        plus: bool,
        /// Number of colons (1..=3)
        count: u8,
    },
    /// Any other operator (`+`, `==`, `=`, `&&`, ...)
    Op(&'static str),
    /// End of input
    Eof,
}

/// A token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What it is
    pub kind: TokenKind,
    /// Where it is
    pub span: Span,
}

const OPERATORS: &[&str] = &[
    "==", "!=", "<=", ">=", "<<", ">>", "&&", "||", "+", "-", "*", "/", "%", "<", ">", "!", "~",
    "&", "|", "^", "=",
];

/// 1-based line and column of a byte offset.
pub fn position(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0) + 1;
    (line, column)
}

/// Build a parse error pointing at `offset`.
pub fn error_at(source: &str, offset: usize, message: impl AsRef<str>) -> KsError {
    let (line, column) = position(source, offset);
    KsError::Parse(format!("{}:{}: {}", line, column, message.as_ref()))
}

/// Tokenize template source.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self, ahead: usize) -> Option<u8> {
        self.bytes.get(self.pos + ahead).copied()
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia()?;
            let start = self.pos;
            let Some(c) = self.peek(0) else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(start, start),
                });
                return Ok(tokens);
            };

            let kind = match c {
                b'{' => self.single(TokenKind::LBrace),
                b'}' => self.single(TokenKind::RBrace),
                b'[' => self.single(TokenKind::LBracket),
                b']' => self.single(TokenKind::RBracket),
                b'(' => self.single(TokenKind::LParen),
                b')' => self.single(TokenKind::RParen),
                b',' => self.single(TokenKind::Comma),
                b'.' if !self.peek(1).is_some_and(|d| d.is_ascii_digit()) => self.single(TokenKind::Dot),
                b';' => self.single(TokenKind::Semicolon),
                b'$' => self.single(TokenKind::Dollar),
                b':' => self.colon(false),
                b'+' if self.peek(1) == Some(b':') => {
                    self.pos += 1;
                    self.colon(true)
                }
                b'"' | b'\'' => TokenKind::Str(self.quoted(c)?),
                b'@' => TokenKind::Str(self.verbatim()?),
                b'|' if self.source[self.pos..].starts_with("|||") => TokenKind::Str(self.text_block()?),
                b'0'..=b'9' | b'.' => TokenKind::Number(self.number()?),
                c if c == b'_' || c.is_ascii_alphabetic() => TokenKind::Ident(self.ident()),
                _ => self.operator()?,
            };

            tokens.push(Token {
                kind,
                span: Span::new(start, self.pos),
            });
        }
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn colon(&mut self, plus: bool) -> TokenKind {
        let mut count = 0;
        while count < 3 && self.peek(0) == Some(b':') {
            self.pos += 1;
            count += 1;
        }
        TokenKind::Colon { plus, count }
    }

    fn skip_trivia(&mut self) -> Result<()> {
        while let Some(c) = self.peek(0) {
            match c {
                b' ' | b'\t' | b'\r' | b'\n' => self.pos += 1,
                b'#' => self.skip_line(),
                b'/' if self.peek(1) == Some(b'/') => self.skip_line(),
                b'/' if self.peek(1) == Some(b'*') => {
                    let start = self.pos;
                    match self.source[self.pos + 2..].find("*/") {
                        Some(end) => self.pos += end + 4,
                        None => return Err(error_at(self.source, start, "unterminated comment")),
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn skip_line(&mut self) {
        while let Some(c) = self.peek(0) {
            if c == b'\n' {
                break;
            }
            self.pos += 1;
        }
    }

    fn ident(&mut self) -> String {
        let start = self.pos;
        while self.peek(0).is_some_and(|c| c == b'_' || c.is_ascii_alphanumeric()) {
            self.pos += 1;
        }
        self.source[start..self.pos].to_string()
    }

    fn number(&mut self) -> Result<String> {
        let start = self.pos;
        let digits = |lexer: &mut Self| {
            let from = lexer.pos;
            while lexer.peek(0).is_some_and(|c| c.is_ascii_digit()) {
                lexer.pos += 1;
            }
            lexer.pos > from
        };

        let whole = digits(self);
        if self.peek(0) == Some(b'.') {
            self.pos += 1;
            if !digits(self) {
                return Err(error_at(self.source, self.pos, "expected digits after '.'"));
            }
        } else if !whole {
            return Err(error_at(self.source, start, "malformed number"));
        }
        if matches!(self.peek(0), Some(b'e') | Some(b'E')) {
            self.pos += 1;
            if matches!(self.peek(0), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            if !digits(self) {
                return Err(error_at(self.source, self.pos, "expected exponent digits"));
            }
        }
        Ok(self.source[start..self.pos].to_string())
    }

    fn quoted(&mut self, quote: u8) -> Result<String> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            let rest = &self.source[self.pos..];
            let Some(ch) = rest.chars().next() else {
                return Err(error_at(self.source, start, "unterminated string"));
            };
            self.pos += ch.len_utf8();
            match ch {
                c if c as u32 == quote as u32 => return Ok(out),
                '\\' => out.push(self.escape()?),
                c => out.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char> {
        let at = self.pos;
        let Some(c) = self.peek(0) else {
            return Err(error_at(self.source, at, "unterminated escape"));
        };
        self.pos += 1;
        Ok(match c {
            b'"' => '"',
            b'\'' => '\'',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let code = self.hex4(at)?;
                if (0xD800..0xDC00).contains(&code) && self.source[self.pos..].starts_with("\\u") {
                    self.pos += 2;
                    let low = self.hex4(at)?;
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low.wrapping_sub(0xDC00) & 0x3FF);
                    char::from_u32(combined).ok_or_else(|| error_at(self.source, at, "invalid surrogate pair"))?
                } else {
                    char::from_u32(code).ok_or_else(|| error_at(self.source, at, "invalid unicode escape"))?
                }
            }
            _ => return Err(error_at(self.source, at, format!("unknown escape '\\{}'", c as char))),
        })
    }

    fn hex4(&mut self, at: usize) -> Result<u32> {
        let digits = self
            .source
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| error_at(self.source, at, "truncated unicode escape"))?;
        let code = u32::from_str_radix(digits, 16)
            .map_err(|_| error_at(self.source, at, "invalid unicode escape"))?;
        self.pos += 4;
        Ok(code)
    }

    fn verbatim(&mut self) -> Result<String> {
        let start = self.pos;
        let quote = match self.peek(1) {
            Some(q @ (b'"' | b'\'')) => q as char,
            _ => return Err(error_at(self.source, start, "expected quote after '@'")),
        };
        self.pos += 2;
        let mut out = String::new();
        loop {
            let rest = &self.source[self.pos..];
            let Some(ch) = rest.chars().next() else {
                return Err(error_at(self.source, start, "unterminated verbatim string"));
            };
            self.pos += ch.len_utf8();
            if ch == quote {
                if rest[1..].starts_with(quote) {
                    self.pos += 1;
                    out.push(quote);
                } else {
                    return Ok(out);
                }
            } else {
                out.push(ch);
            }
        }
    }

    fn text_block(&mut self) -> Result<String> {
        let start = self.pos;
        self.pos += 3;
        // Rest of the opening line must be blank.
        while matches!(self.peek(0), Some(b' ') | Some(b'\t') | Some(b'\r')) {
            self.pos += 1;
        }
        if self.peek(0) != Some(b'\n') {
            return Err(error_at(self.source, start, "text block must start on a new line"));
        }
        self.pos += 1;

        let first_line = &self.source[self.pos..];
        let indent: String = first_line.chars().take_while(|c| *c == ' ' || *c == '\t').collect();
        if indent.is_empty() {
            return Err(error_at(self.source, self.pos, "text block lines must be indented"));
        }

        let mut out = String::new();
        loop {
            let rest = &self.source[self.pos..];
            if rest.is_empty() {
                return Err(error_at(self.source, start, "unterminated text block"));
            }
            let line_end = rest.find('\n').map(|i| i + 1).unwrap_or(rest.len());
            let line = &rest[..line_end];

            if let Some(body) = line.strip_prefix(indent.as_str()) {
                out.push_str(body);
                self.pos += line_end;
            } else if line.trim().is_empty() && !line.trim_start().starts_with("|||") && line.ends_with('\n') {
                out.push('\n');
                self.pos += line_end;
            } else {
                let trimmed = line.trim_start();
                if trimmed.starts_with("|||") {
                    self.pos += line.len() - trimmed.len() + 3;
                    return Ok(out);
                }
                return Err(error_at(self.source, self.pos, "text block line is under-indented"));
            }
        }
    }

    fn operator(&mut self) -> Result<TokenKind> {
        let rest = &self.source[self.pos..];
        match OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            Some(op) => {
                self.pos += op.len();
                Ok(TokenKind::Op(op))
            }
            None => {
                let ch = rest.chars().next().unwrap_or('?');
                Err(error_at(self.source, self.pos, format!("unexpected character '{}'", ch)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_field_markers() {
        assert_eq!(
            kinds("a+: b:: c::: d:"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Colon { plus: true, count: 1 },
                TokenKind::Ident("b".into()),
                TokenKind::Colon { plus: false, count: 2 },
                TokenKind::Ident("c".into()),
                TokenKind::Colon { plus: false, count: 3 },
                TokenKind::Ident("d".into()),
                TokenKind::Colon { plus: false, count: 1 },
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_strings_and_comments() {
        let tokens = kinds("// note\n\"a\\n\\u0041\" # more\n'b' /* c */ @\"x\"\"y\"");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Str("a\nA".into()),
                TokenKind::Str("b".into()),
                TokenKind::Str("x\"y".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_text_block() {
        let tokens = kinds("|||\n  line one\n    nested\n|||");
        assert_eq!(tokens[0], TokenKind::Str("line one\n  nested\n".into()));
    }

    #[test]
    fn test_numbers_and_spans() {
        let tokens = tokenize("x = 1.5e3;").unwrap();
        assert_eq!(tokens[2].kind, TokenKind::Number("1.5e3".into()));
        assert_eq!(tokens[2].span, Span::new(4, 9));
    }

    #[test]
    fn test_error_position() {
        let err = tokenize("{\n  a: \"open\n").unwrap_err();
        assert!(err.to_string().contains("2:6"), "{}", err);
    }
}
