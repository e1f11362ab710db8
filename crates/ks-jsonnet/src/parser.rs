//! Recursive-descent parser producing a span-carrying [`Expr`].

use crate::ast::*;
use crate::lexer::{error_at, tokenize, Token, TokenKind};
use ks_types::{KsError, Result};

const RESERVED: &[&str] = &[
    "assert", "else", "error", "false", "for", "function", "if", "import", "importstr", "in",
    "local", "null", "tailstrict", "then", "self", "super", "true",
];

/// Parse template source into an expression tree.
pub fn parse(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        last_end: 0,
    };
    let expr = parser.expr()?;
    match parser.peek() {
        TokenKind::Eof => Ok(expr),
        _ => Err(parser.error("expected end of input")),
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    last_end: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &TokenKind {
        self.peek_at(0)
    }

    fn peek_at(&self, ahead: usize) -> &TokenKind {
        let index = (self.pos + ahead).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn start(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span.start
    }

    fn advance(&mut self) -> Token {
        let index = self.pos.min(self.tokens.len() - 1);
        let token = self.tokens[index].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        self.last_end = token.span.end;
        token
    }

    fn error(&self, message: impl AsRef<str>) -> KsError {
        error_at(self.source, self.start(), message)
    }

    fn is_keyword(&self, word: &str) -> bool {
        matches!(self.peek(), TokenKind::Ident(name) if name == word)
    }

    fn eat_keyword(&mut self, word: &str) -> bool {
        if self.is_keyword(word) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token> {
        if *self.peek() == kind {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected {}", what)))
        }
    }

    fn expect_keyword(&mut self, word: &str) -> Result<()> {
        if self.eat_keyword(word) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", word)))
        }
    }

    fn expect_op(&mut self, op: &str) -> Result<()> {
        if matches!(self.peek(), TokenKind::Op(found) if *found == op) {
            self.advance();
            Ok(())
        } else {
            Err(self.error(format!("expected '{}'", op)))
        }
    }

    fn identifier(&mut self) -> Result<String> {
        match self.peek().clone() {
            TokenKind::Ident(name) if !RESERVED.contains(&name.as_str()) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("expected identifier")),
        }
    }

    fn string_literal(&mut self) -> Result<String> {
        match self.peek().clone() {
            TokenKind::Str(value) => {
                self.advance();
                Ok(value)
            }
            _ => Err(self.error("expected string literal")),
        }
    }

    fn finish(&self, start: usize, kind: ExprKind) -> Expr {
        Expr {
            kind,
            span: Span::new(start, self.last_end),
        }
    }

    fn expr(&mut self) -> Result<Expr> {
        self.binary(1)
    }

    fn peek_binary(&self) -> Option<BinaryOp> {
        Some(match self.peek() {
            TokenKind::Op(op) => match *op {
                "*" => BinaryOp::Mul,
                "/" => BinaryOp::Div,
                "%" => BinaryOp::Mod,
                "+" => BinaryOp::Add,
                "-" => BinaryOp::Sub,
                "<<" => BinaryOp::Shl,
                ">>" => BinaryOp::Shr,
                "<" => BinaryOp::Lt,
                "<=" => BinaryOp::Le,
                ">" => BinaryOp::Gt,
                ">=" => BinaryOp::Ge,
                "==" => BinaryOp::Eq,
                "!=" => BinaryOp::Ne,
                "&" => BinaryOp::BitAnd,
                "^" => BinaryOp::BitXor,
                "|" => BinaryOp::BitOr,
                "&&" => BinaryOp::And,
                "||" => BinaryOp::Or,
                _ => return None,
            },
            TokenKind::Ident(word) if word == "in" => BinaryOp::In,
            _ => return None,
        })
    }

    fn binary(&mut self, min_precedence: u8) -> Result<Expr> {
        let mut lhs = self.unary()?;
        while let Some(op) = self.peek_binary() {
            if op.precedence() < min_precedence {
                break;
            }
            self.advance();
            let rhs = self.binary(op.precedence() + 1)?;
            let span = lhs.span.to(rhs.span);
            lhs = Expr {
                kind: ExprKind::Binary(Box::new(lhs), op, Box::new(rhs)),
                span,
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Expr> {
        let start = self.start();
        let op = match self.peek() {
            TokenKind::Op("-") => Some(UnaryOp::Neg),
            TokenKind::Op("+") => Some(UnaryOp::Pos),
            TokenKind::Op("!") => Some(UnaryOp::Not),
            TokenKind::Op("~") => Some(UnaryOp::BitNot),
            _ => None,
        };
        match op {
            Some(op) => {
                self.advance();
                let operand = self.unary()?;
                Ok(self.finish(start, ExprKind::Unary(op, Box::new(operand))))
            }
            None => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr> {
        let start = self.start();
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.advance();
                    let name = match self.peek().clone() {
                        TokenKind::Ident(name) => {
                            self.advance();
                            name
                        }
                        _ => return Err(self.error("expected field name after '.'")),
                    };
                    expr = self.finish(start, ExprKind::Field(Box::new(expr), name));
                }
                TokenKind::LBracket => {
                    self.advance();
                    expr = self.index_or_slice(start, expr)?;
                }
                TokenKind::LParen => {
                    self.advance();
                    let args = self.args()?;
                    self.eat_keyword("tailstrict");
                    expr = self.finish(start, ExprKind::Call(Box::new(expr), args));
                }
                TokenKind::LBrace => {
                    let object = self.object()?;
                    let span = expr.span.to(object.span);
                    expr = Expr {
                        kind: ExprKind::Binary(Box::new(expr), BinaryOp::Add, Box::new(object)),
                        span,
                    };
                }
                _ => return Ok(expr),
            }
        }
    }

    /// The rest of `target[...]` after the opening bracket.
    fn index_or_slice(&mut self, start: usize, target: Expr) -> Result<Expr> {
        let mut parts: [Option<Box<Expr>>; 3] = [None, None, None];
        let mut slot = 0;
        loop {
            match self.peek().clone() {
                TokenKind::RBracket => break,
                TokenKind::Colon { plus: false, count } => {
                    slot += count as usize;
                    if slot > 2 {
                        return Err(self.error("too many ':' in slice"));
                    }
                    self.advance();
                }
                _ => {
                    if parts[slot].is_some() {
                        return Err(self.error("expected ']'"));
                    }
                    parts[slot] = Some(Box::new(self.expr()?));
                }
            }
        }
        self.expect(TokenKind::RBracket, "']'")?;

        let [from, to, step] = parts;
        let kind = match (slot, from) {
            (0, Some(index)) => ExprKind::Index(Box::new(target), index),
            (0, None) => return Err(self.error("expected index")),
            (_, from) => ExprKind::Slice(Box::new(target), from, to, step),
        };
        Ok(self.finish(start, kind))
    }

    /// `for` and `if` clauses closing a comprehension; the first must be `for`.
    fn comp_specs(&mut self) -> Result<Vec<CompSpec>> {
        let mut specs = Vec::new();
        loop {
            if self.eat_keyword("for") {
                let name = self.identifier()?;
                self.expect_keyword("in")?;
                specs.push(CompSpec::For(name, self.expr()?));
            } else if !specs.is_empty() && self.eat_keyword("if") {
                specs.push(CompSpec::If(self.expr()?));
            } else if specs.is_empty() {
                return Err(self.error("expected 'for'"));
            } else {
                return Ok(specs);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let start = self.start();
        let token = self.peek().clone();
        match token {
            TokenKind::Number(raw) => {
                self.advance();
                Ok(self.finish(start, ExprKind::Number(raw)))
            }
            TokenKind::Str(value) => {
                self.advance();
                Ok(self.finish(start, ExprKind::Str(value)))
            }
            TokenKind::Dollar => {
                self.advance();
                Ok(self.finish(start, ExprKind::Dollar))
            }
            TokenKind::LBrace => self.object(),
            TokenKind::LBracket => self.array(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(self.finish(start, ExprKind::Paren(Box::new(inner))))
            }
            TokenKind::Ident(word) => self.keyword_or_var(start, &word),
            TokenKind::Eof => Err(self.error("unexpected end of input")),
            _ => Err(self.error("unexpected token")),
        }
    }

    fn keyword_or_var(&mut self, start: usize, word: &str) -> Result<Expr> {
        self.advance();
        let kind = match word {
            "null" => ExprKind::Null,
            "true" => ExprKind::Bool(true),
            "false" => ExprKind::Bool(false),
            "self" => ExprKind::SelfRef,
            "super" => ExprKind::Super,
            "import" => ExprKind::Import(self.string_literal()?),
            "importstr" => ExprKind::ImportStr(self.string_literal()?),
            "error" => ExprKind::Error(Box::new(self.expr()?)),
            "local" => {
                let mut binds = vec![self.bind()?];
                while matches!(self.peek(), TokenKind::Comma) {
                    self.advance();
                    binds.push(self.bind()?);
                }
                self.expect(TokenKind::Semicolon, "';'")?;
                let body = self.expr()?;
                ExprKind::Local(binds, Box::new(body))
            }
            "if" => {
                let cond = self.expr()?;
                self.expect_keyword("then")?;
                let then = self.expr()?;
                let otherwise = if self.eat_keyword("else") {
                    Some(Box::new(self.expr()?))
                } else {
                    None
                };
                ExprKind::If(Box::new(cond), Box::new(then), otherwise)
            }
            "function" => {
                self.expect(TokenKind::LParen, "'('")?;
                let params = self.params()?;
                let body = self.expr()?;
                ExprKind::Function(params, Box::new(body))
            }
            "assert" => {
                let (cond, message) = self.assertion()?;
                self.expect(TokenKind::Semicolon, "';'")?;
                let rest = self.expr()?;
                ExprKind::Assert(Box::new(cond), message.map(Box::new), Box::new(rest))
            }
            word if RESERVED.contains(&word) => {
                return Err(error_at(self.source, start, format!("unexpected keyword '{}'", word)))
            }
            name => ExprKind::Var(name.to_string()),
        };
        Ok(self.finish(start, kind))
    }

    fn assertion(&mut self) -> Result<(Expr, Option<Expr>)> {
        let cond = self.expr()?;
        let message = if matches!(self.peek(), TokenKind::Colon { plus: false, count: 1 }) {
            self.advance();
            Some(self.expr()?)
        } else {
            None
        };
        Ok((cond, message))
    }

    fn bind(&mut self) -> Result<Bind> {
        let name = self.identifier()?;
        let params = if matches!(self.peek(), TokenKind::LParen) {
            self.advance();
            Some(self.params()?)
        } else {
            None
        };
        self.expect_op("=")?;
        let value = self.expr()?;
        Ok(Bind { name, params, value })
    }

    /// Parameters after the opening parenthesis, through the closing one.
    fn params(&mut self) -> Result<Vec<Param>> {
        let mut params = Vec::new();
        while !matches!(self.peek(), TokenKind::RParen) {
            let name = self.identifier()?;
            let default = if matches!(self.peek(), TokenKind::Op("=")) {
                self.advance();
                Some(self.expr()?)
            } else {
                None
            };
            params.push(Param { name, default });
            if matches!(self.peek(), TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(params)
    }

    /// Call arguments after the opening parenthesis, through the closing one.
    fn args(&mut self) -> Result<Vec<Arg>> {
        let mut args = Vec::new();
        while !matches!(self.peek(), TokenKind::RParen) {
            let named = matches!(self.peek(), TokenKind::Ident(_))
                && matches!(self.peek_at(1), TokenKind::Op("="));
            let name = if named { Some(self.identifier()?) } else { None };
            if named {
                self.advance();
            }
            let value = self.expr()?;
            args.push(Arg { name, value });
            if matches!(self.peek(), TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        Ok(args)
    }

    fn array(&mut self) -> Result<Expr> {
        let start = self.start();
        self.expect(TokenKind::LBracket, "'['")?;
        let mut items = Vec::new();
        while !matches!(self.peek(), TokenKind::RBracket) {
            items.push(self.expr()?);
            if self.is_keyword("for") && items.len() == 1 {
                let specs = self.comp_specs()?;
                self.expect(TokenKind::RBracket, "']'")?;
                let item = items.remove(0);
                return Ok(self.finish(start, ExprKind::ArrayComp(Box::new(item), specs)));
            }
            if matches!(self.peek(), TokenKind::Comma) {
                self.advance();
            } else {
                break;
            }
        }
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(self.finish(start, ExprKind::Array(items)))
    }

    fn object(&mut self) -> Result<Expr> {
        let start = self.start();
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut members = Vec::new();
        while !matches!(self.peek(), TokenKind::RBrace) {
            members.push(self.member()?);
            let comma = matches!(self.peek(), TokenKind::Comma);
            if comma {
                self.advance();
            }
            if self.is_keyword("for") {
                let specs = self.comp_specs()?;
                self.expect(TokenKind::RBrace, "'}'")?;
                return Ok(self.finish(start, ExprKind::ObjectComp(members, specs)));
            }
            if !comma && !matches!(self.peek(), TokenKind::RBrace) {
                return Err(self.error("expected ',' or '}'"));
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(self.finish(start, ExprKind::Object(members)))
    }

    fn member(&mut self) -> Result<Member> {
        let start = self.start();
        if self.eat_keyword("local") {
            let bind = self.bind()?;
            return Ok(Member::Local(bind, Span::new(start, self.last_end)));
        }
        if self.eat_keyword("assert") {
            let (cond, message) = self.assertion()?;
            return Ok(Member::Assert(cond, message, Span::new(start, self.last_end)));
        }

        let key = match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                FieldKey::Ident(name)
            }
            TokenKind::Str(name) => {
                self.advance();
                FieldKey::Str(name)
            }
            TokenKind::LBracket => {
                self.advance();
                let key = self.expr()?;
                self.expect(TokenKind::RBracket, "']'")?;
                FieldKey::Computed(Box::new(key))
            }
            _ => return Err(self.error("expected field name")),
        };

        let params = if matches!(self.peek(), TokenKind::LParen) {
            self.advance();
            Some(self.params()?)
        } else {
            None
        };

        let (plus, visibility) = match *self.peek() {
            TokenKind::Colon { plus, count } => {
                self.advance();
                let visibility = match count {
                    1 => Visibility::Default,
                    2 => Visibility::Hidden,
                    _ => Visibility::Forced,
                };
                (plus, visibility)
            }
            _ => return Err(self.error("expected ':' after field name")),
        };

        let value = self.expr()?;
        Ok(Member::Field(Field {
            key,
            plus,
            visibility,
            params,
            value,
            span: Span::new(start, self.last_end),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params_document() {
        let source = "{\n  global: {},\n  components: {\n    \"guestbook-ui\": { replicas: 1 },\n  },\n}\n";
        let expr = parse(source).unwrap();
        let components = expr.find_field("components").unwrap();
        let ui = components.value.find_field("guestbook-ui").unwrap();
        let replicas = ui.value.find_field("replicas").unwrap();
        assert_eq!(replicas.value.kind, ExprKind::Number("1".into()));
        assert_eq!(&source[replicas.span.start..replicas.span.end], "replicas: 1");
        assert_eq!(&source[ui.value.span.start..ui.value.span.end], "{ replicas: 1 }");
    }

    #[test]
    fn test_parse_component_chain() {
        let source = r#"local k = import "k8s.libsonnet";
local params = std.extVar("__ksonnet/params").components["web"];
local deployment = k.apps.v1.deployment;
deployment.new() + deployment.mixin.spec.withReplicas(params.replicas)"#;
        let expr = parse(source).unwrap();
        let ExprKind::Local(binds, _) = &expr.kind else {
            panic!("expected local");
        };
        assert_eq!(binds[0].name, "k");
        assert_eq!(binds[0].value.kind, ExprKind::Import("k8s.libsonnet".into()));
    }

    #[test]
    fn test_precedence() {
        let expr = parse("1 + 2 * 3 == 7 && true").unwrap();
        let ExprKind::Binary(lhs, BinaryOp::And, _) = &expr.kind else {
            panic!("expected &&, got {:?}", expr.kind);
        };
        assert!(matches!(lhs.kind, ExprKind::Binary(_, BinaryOp::Eq, _)));
    }

    #[test]
    fn test_field_markers_and_methods() {
        let expr = parse("{ a+: {}, b:: 1, c::: 2, f(x, y=1): x, [\"d\"]: 3, local z = 1, assert true }").unwrap();
        let members = expr.as_object().unwrap();
        assert_eq!(members.len(), 7);
        let Member::Field(a) = &members[0] else { panic!() };
        assert!(a.plus);
        let Member::Field(f) = &members[3] else { panic!() };
        assert_eq!(f.params.as_ref().map(Vec::len), Some(2));
        assert!(matches!(members[5], Member::Local(..)));
    }

    #[test]
    fn test_implicit_object_plus() {
        let expr = parse("base { x: 1 }").unwrap();
        assert!(matches!(expr.kind, ExprKind::Binary(_, BinaryOp::Add, _)));
    }

    #[test]
    fn test_named_arguments_and_functions() {
        let expr = parse("local f(a, b=2) = a + b; f(1, b=3)").unwrap();
        let ExprKind::Local(_, body) = expr.kind else { panic!() };
        let ExprKind::Call(_, args) = body.kind else { panic!() };
        assert_eq!(args[1].name.as_deref(), Some("b"));
    }

    #[test]
    fn test_comprehensions() {
        let expr = parse("[x * 2 for x in [1, 2] if x > 1]").unwrap();
        match expr.kind {
            ExprKind::ArrayComp(item, specs) => {
                assert!(matches!(item.kind, ExprKind::Binary(..)));
                assert_eq!(specs.len(), 2);
                assert!(matches!(&specs[0], CompSpec::For(name, _) if name == "x"));
                assert!(matches!(&specs[1], CompSpec::If(_)));
            }
            other => panic!("unexpected {:?}", other),
        }

        let source = "{ local base = 1, [n]: base for n in names }";
        let expr = parse(source).unwrap();
        assert_eq!(expr.span, Span::new(0, source.len()));
        match expr.kind {
            ExprKind::ObjectComp(members, specs) => {
                assert_eq!(members.len(), 2);
                assert_eq!(specs.len(), 1);
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(parse("[x for]").is_err());
        assert!(parse("[1, x for x in y]").is_err());
    }

    #[test]
    fn test_slices() {
        let source = "xs[1:]";
        let expr = parse(source).unwrap();
        assert_eq!(expr.span, Span::new(0, source.len()));
        match expr.kind {
            ExprKind::Slice(_, from, to, step) => {
                assert!(from.is_some());
                assert!(to.is_none() && step.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }

        match parse("xs[::2]").unwrap().kind {
            ExprKind::Slice(_, from, to, step) => {
                assert!(from.is_none() && to.is_none());
                assert!(step.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(parse("xs[0:1:1]").unwrap().kind, ExprKind::Slice(..)));
        assert!(matches!(parse("xs[0]").unwrap().kind, ExprKind::Index(..)));
        assert!(parse("xs[]").is_err());
        assert!(parse("xs[0:1:2:3]").is_err());
    }

    #[test]
    fn test_errors_carry_position() {
        let err = parse("{\n  a: 1\n  b: 2\n}").unwrap_err();
        assert!(matches!(err, KsError::Parse(_)));
        assert!(err.to_string().contains("3:3"), "{}", err);
    }
}
