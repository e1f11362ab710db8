//! Template syntax tree.
//!
//! Parsed nodes carry the byte span they came from so edits can splice the
//! original text. Nodes built in memory use [`Span::SYNTHETIC`].

/// Byte range `[start, end)` in the source a node was parsed from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// Offset of the first byte
    pub start: usize,
    /// Offset one past the last byte
    pub end: usize,
}

impl Span {
    /// Span of nodes that were not parsed from text.
    pub const SYNTHETIC: Span = Span { start: 0, end: 0 };

    /// Create a span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both.
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// An expression with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    /// What the expression is
    pub kind: ExprKind,
    /// Where it came from
    pub span: Span,
}

/// Expression variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// `null`
    Null,
    /// `true` / `false`
    Bool(bool),
    /// A number literal, kept as written
    Number(String),
    /// A string literal, unescaped
    Str(String),
    /// `[a, b]`
    Array(Vec<Expr>),
    /// `{ ... }`
    Object(Vec<Member>),
    /// A variable reference
    Var(String),
    /// `self`
    SelfRef,
    /// `$`
    Dollar,
    /// `super`
    Super,
    /// `target.name`
    Field(Box<Expr>, String),
    /// `target[index]`
    Index(Box<Expr>, Box<Expr>),
    /// `target(args)`
    Call(Box<Expr>, Vec<Arg>),
    /// Prefix operator
    Unary(UnaryOp, Box<Expr>),
    /// Infix operator
    Binary(Box<Expr>, BinaryOp, Box<Expr>),
    /// `local a = x, b = y; body`
    Local(Vec<Bind>, Box<Expr>),
    /// `if c then a else b`
    If(Box<Expr>, Box<Expr>, Option<Box<Expr>>),
    /// `function(params) body`
    Function(Vec<Param>, Box<Expr>),
    /// `import "path"`
    Import(String),
    /// `importstr "path"`
    ImportStr(String),
    /// `error msg`
    Error(Box<Expr>),
    /// `assert cond : msg; rest`
    Assert(Box<Expr>, Option<Box<Expr>>, Box<Expr>),
    /// `( expr )`
    Paren(Box<Expr>),
    /// `target[start:end:step]`, any part optional
    Slice(Box<Expr>, Option<Box<Expr>>, Option<Box<Expr>>, Option<Box<Expr>>),
    /// `[item for x in xs if cond]`
    ArrayComp(Box<Expr>, Vec<CompSpec>),
    /// `{ [key]: value for x in xs }`; members hold the field and any locals
    ObjectComp(Vec<Member>, Vec<CompSpec>),
}

/// One `for` or `if` clause of a comprehension.
#[derive(Debug, Clone, PartialEq)]
pub enum CompSpec {
    /// `for name in source`
    For(String, Expr),
    /// `if cond`
    If(Expr),
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `+`
    Pos,
    /// `!`
    Not,
    /// `~`
    BitNot,
}

/// Infix operators, grouped by precedence in [`BinaryOp::precedence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `in`
    In,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `&`
    BitAnd,
    /// `^`
    BitXor,
    /// `|`
    BitOr,
    /// `&&`
    And,
    /// `||`
    Or,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 10,
            BinaryOp::Add | BinaryOp::Sub => 9,
            BinaryOp::Shl | BinaryOp::Shr => 8,
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge | BinaryOp::In => 7,
            BinaryOp::Eq | BinaryOp::Ne => 6,
            BinaryOp::BitAnd => 5,
            BinaryOp::BitXor => 4,
            BinaryOp::BitOr => 3,
            BinaryOp::And => 2,
            BinaryOp::Or => 1,
        }
    }

    /// Operator text.
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitXor => "^",
            BinaryOp::BitOr => "|",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
        }
    }
}

/// A call argument, positional or named.
#[derive(Debug, Clone, PartialEq)]
pub struct Arg {
    /// `name=` for named arguments
    pub name: Option<String>,
    /// Argument value
    pub value: Expr,
}

/// A function parameter with optional default.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Parameter name
    pub name: String,
    /// Default value
    pub default: Option<Expr>,
}

/// A `local` binding, optionally with function sugar `local f(x) = ...`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bind {
    /// Bound name
    pub name: String,
    /// Parameters when declared with function sugar
    pub params: Option<Vec<Param>>,
    /// Bound value
    pub value: Expr,
}

/// Field visibility marker: `:`, `::` or `:::`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    /// `:`
    #[default]
    Default,
    /// `::`
    Hidden,
    /// `:::`
    Forced,
}

impl Visibility {
    /// Marker text.
    pub fn symbol(self) -> &'static str {
        match self {
            Visibility::Default => ":",
            Visibility::Hidden => "::",
            Visibility::Forced => ":::",
        }
    }
}

/// Object field key.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKey {
    /// Bare identifier key
    Ident(String),
    /// Quoted key
    Str(String),
    /// `[expr]` key
    Computed(Box<Expr>),
}

impl FieldKey {
    /// The static name of the key, if it has one.
    pub fn name(&self) -> Option<&str> {
        match self {
            FieldKey::Ident(name) | FieldKey::Str(name) => Some(name),
            FieldKey::Computed(_) => None,
        }
    }
}

/// An object field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Key
    pub key: FieldKey,
    /// `+:` inheritance marker
    pub plus: bool,
    /// Visibility
    pub visibility: Visibility,
    /// Parameters for method sugar `f(x): ...`
    pub params: Option<Vec<Param>>,
    /// Field value
    pub value: Expr,
    /// Span from the key to the end of the value
    pub span: Span,
}

/// An object member.
#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    /// A field
    Field(Field),
    /// An object-level `local`
    Local(Bind, Span),
    /// An object-level `assert`
    Assert(Expr, Option<Expr>, Span),
}

impl Member {
    /// Source span of the member.
    pub fn span(&self) -> Span {
        match self {
            Member::Field(field) => field.span,
            Member::Local(_, span) | Member::Assert(_, _, span) => *span,
        }
    }
}

impl Expr {
    /// Build a node without a source position.
    pub fn synthetic(kind: ExprKind) -> Self {
        Self {
            kind,
            span: Span::SYNTHETIC,
        }
    }

    /// A variable reference.
    pub fn var(name: impl Into<String>) -> Self {
        Self::synthetic(ExprKind::Var(name.into()))
    }

    /// A string literal.
    pub fn string(value: impl Into<String>) -> Self {
        Self::synthetic(ExprKind::Str(value.into()))
    }

    /// `self.name`, or `self["name"]` when printed with a non-identifier name.
    pub fn field(self, name: impl Into<String>) -> Self {
        Self::synthetic(ExprKind::Field(Box::new(self), name.into()))
    }

    /// `self[index]`
    pub fn index(self, index: Expr) -> Self {
        Self::synthetic(ExprKind::Index(Box::new(self), Box::new(index)))
    }

    /// `self(args...)` with positional arguments.
    pub fn call(self, args: Vec<Expr>) -> Self {
        let args = args.into_iter().map(|value| Arg { name: None, value }).collect();
        Self::synthetic(ExprKind::Call(Box::new(self), args))
    }

    /// `self + rhs`
    pub fn plus(self, rhs: Expr) -> Self {
        Self::synthetic(ExprKind::Binary(Box::new(self), BinaryOp::Add, Box::new(rhs)))
    }

    /// `local name = value; self`
    pub fn bound_by(self, name: impl Into<String>, value: Expr) -> Self {
        let bind = Bind {
            name: name.into(),
            params: None,
            value,
        };
        Self::synthetic(ExprKind::Local(vec![bind], Box::new(self)))
    }

    /// An object of plain fields.
    pub fn object(fields: Vec<(String, Expr)>) -> Self {
        let members = fields
            .into_iter()
            .map(|(name, value)| {
                Member::Field(Field {
                    key: FieldKey::Str(name),
                    plus: false,
                    visibility: Visibility::Default,
                    params: None,
                    value,
                    span: Span::SYNTHETIC,
                })
            })
            .collect();
        Self::synthetic(ExprKind::Object(members))
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner) => inner.unparen(),
            _ => self,
        }
    }

    /// Object members if this is (a parenthesised) object literal.
    pub fn as_object(&self) -> Option<&[Member]> {
        match &self.unparen().kind {
            ExprKind::Object(members) => Some(members),
            _ => None,
        }
    }

    /// The first field with the given static name.
    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.as_object()?.iter().find_map(|member| match member {
            Member::Field(field) if field.key.name() == Some(name) => Some(field),
            _ => None,
        })
    }
}
