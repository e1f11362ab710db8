//! Canonical source rendering for expression trees.

use crate::ast::*;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern"));

const KEYWORDS: &[&str] = &[
    "assert", "else", "error", "false", "for", "function", "if", "import", "importstr", "in",
    "local", "null", "tailstrict", "then", "self", "super", "true",
];

const INDENT: usize = 2;
const INLINE_ARRAY_WIDTH: usize = 60;

/// True if `name` can be written bare as a field name or after `.`.
pub fn is_identifier(name: &str) -> bool {
    IDENTIFIER.is_match(name) && !KEYWORDS.contains(&name)
}

/// A double-quoted string literal.
pub fn quote(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

/// A field key, bare when possible.
pub fn key(name: &str) -> String {
    if is_identifier(name) {
        name.to_string()
    } else {
        quote(name)
    }
}

/// Render an expression at column zero.
pub fn print(expr: &Expr) -> String {
    print_at(expr, 0)
}

/// Render an expression whose first line continues a line indented by
/// `indent` columns; nested lines are indented relative to it.
pub fn print_at(expr: &Expr, indent: usize) -> String {
    render(expr, indent)
}

fn pad(indent: usize) -> String {
    " ".repeat(indent)
}

/// Binding strength used to decide where parentheses are needed.
fn strength(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::Binary(_, op, _) => op.precedence(),
        ExprKind::Unary(..) => 11,
        ExprKind::Local(..)
        | ExprKind::If(..)
        | ExprKind::Function(..)
        | ExprKind::Error(..)
        | ExprKind::Assert(..) => 0,
        _ => 12,
    }
}

fn wrapped(expr: &Expr, indent: usize, needs_parens: bool) -> String {
    let text = render(expr, indent);
    if needs_parens {
        format!("({})", text)
    } else {
        text
    }
}

fn render(expr: &Expr, indent: usize) -> String {
    match &expr.kind {
        ExprKind::Null => "null".to_string(),
        ExprKind::Bool(value) => value.to_string(),
        ExprKind::Number(raw) => raw.clone(),
        ExprKind::Str(value) => quote(value),
        ExprKind::Array(items) => render_array(items, indent),
        ExprKind::Object(members) => render_object(members, indent),
        ExprKind::Var(name) => name.clone(),
        ExprKind::SelfRef => "self".to_string(),
        ExprKind::Dollar => "$".to_string(),
        ExprKind::Super => "super".to_string(),
        ExprKind::Field(target, name) => {
            let target = wrapped(target, indent, strength(target) < 12);
            if is_identifier(name) {
                format!("{}.{}", target, name)
            } else {
                format!("{}[{}]", target, quote(name))
            }
        }
        ExprKind::Index(target, index) => {
            format!("{}[{}]", wrapped(target, indent, strength(target) < 12), render(index, indent))
        }
        ExprKind::Call(target, args) => {
            let args: Vec<String> = args
                .iter()
                .map(|arg| match &arg.name {
                    Some(name) => format!("{}={}", name, render(&arg.value, indent)),
                    None => render(&arg.value, indent),
                })
                .collect();
            format!("{}({})", wrapped(target, indent, strength(target) < 12), args.join(", "))
        }
        ExprKind::Unary(op, operand) => {
            let symbol = match op {
                UnaryOp::Neg => "-",
                UnaryOp::Pos => "+",
                UnaryOp::Not => "!",
                UnaryOp::BitNot => "~",
            };
            format!("{}{}", symbol, wrapped(operand, indent, strength(operand) < 11))
        }
        ExprKind::Binary(lhs, op, rhs) => {
            let precedence = op.precedence();
            format!(
                "{} {} {}",
                wrapped(lhs, indent, strength(lhs) < precedence),
                op.symbol(),
                wrapped(rhs, indent, strength(rhs) <= precedence)
            )
        }
        ExprKind::Local(binds, body) => {
            let binds: Vec<String> = binds.iter().map(|bind| render_bind(bind, indent)).collect();
            format!("local {};\n{}{}", binds.join(", "), pad(indent), render(body, indent))
        }
        ExprKind::If(cond, then, otherwise) => {
            let mut out = format!("if {} then {}", render(cond, indent), render(then, indent));
            if let Some(otherwise) = otherwise {
                out.push_str(" else ");
                out.push_str(&render(otherwise, indent));
            }
            out
        }
        ExprKind::Function(params, body) => {
            format!("function({}) {}", render_params(params, indent), render(body, indent))
        }
        ExprKind::Import(path) => format!("import {}", quote(path)),
        ExprKind::ImportStr(path) => format!("importstr {}", quote(path)),
        ExprKind::Error(message) => format!("error {}", render(message, indent)),
        ExprKind::Assert(cond, message, rest) => {
            format!(
                "{};\n{}{}",
                render_assert(cond, message.as_deref(), indent),
                pad(indent),
                render(rest, indent)
            )
        }
        ExprKind::Paren(inner) => format!("({})", render(inner, indent)),
        ExprKind::Slice(target, from, to, step) => {
            let part = |slot: &Option<Box<Expr>>| {
                slot.as_ref().map(|expr| render(expr, indent)).unwrap_or_default()
            };
            let step = match step {
                Some(_) => format!(":{}", part(step)),
                None => String::new(),
            };
            format!(
                "{}[{}:{}{}]",
                wrapped(target, indent, strength(target) < 12),
                part(from),
                part(to),
                step
            )
        }
        ExprKind::ArrayComp(item, specs) => {
            format!("[{}{}]", render(item, indent), render_specs(specs, indent))
        }
        ExprKind::ObjectComp(members, specs) => {
            let members: Vec<String> =
                members.iter().map(|member| render_member(member, indent)).collect();
            format!("{{ {}{} }}", members.join(", "), render_specs(specs, indent))
        }
    }
}

fn render_specs(specs: &[CompSpec], indent: usize) -> String {
    specs
        .iter()
        .map(|spec| match spec {
            CompSpec::For(name, source) => format!(" for {} in {}", name, render(source, indent)),
            CompSpec::If(cond) => format!(" if {}", render(cond, indent)),
        })
        .collect()
}

fn render_params(params: &[Param], indent: usize) -> String {
    params
        .iter()
        .map(|param| match &param.default {
            Some(default) => format!("{}={}", param.name, render(default, indent)),
            None => param.name.clone(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_bind(bind: &Bind, indent: usize) -> String {
    match &bind.params {
        Some(params) => format!(
            "{}({}) = {}",
            bind.name,
            render_params(params, indent),
            render(&bind.value, indent)
        ),
        None => format!("{} = {}", bind.name, render(&bind.value, indent)),
    }
}

fn render_assert(cond: &Expr, message: Option<&Expr>, indent: usize) -> String {
    match message {
        Some(message) => format!("assert {} : {}", render(cond, indent), render(message, indent)),
        None => format!("assert {}", render(cond, indent)),
    }
}

fn is_scalar(expr: &Expr) -> bool {
    !matches!(
        expr.unparen().kind,
        ExprKind::Array(_) | ExprKind::Object(_) | ExprKind::Local(..) | ExprKind::Function(..)
    )
}

fn render_array(items: &[Expr], indent: usize) -> String {
    if items.is_empty() {
        return "[]".to_string();
    }

    if items.iter().all(is_scalar) {
        let inline: Vec<String> = items.iter().map(|item| render(item, indent)).collect();
        let inline = format!("[{}]", inline.join(", "));
        if inline.len() <= INLINE_ARRAY_WIDTH && !inline.contains('\n') {
            return inline;
        }
    }

    let inner = indent + INDENT;
    let mut out = String::from("[\n");
    for item in items {
        out.push_str(&pad(inner));
        out.push_str(&render(item, inner));
        out.push_str(",\n");
    }
    out.push_str(&pad(indent));
    out.push(']');
    out
}

fn render_object(members: &[Member], indent: usize) -> String {
    if members.is_empty() {
        return "{}".to_string();
    }

    let inner = indent + INDENT;
    let mut out = String::from("{\n");
    for member in members {
        out.push_str(&pad(inner));
        out.push_str(&render_member(member, inner));
        out.push_str(",\n");
    }
    out.push_str(&pad(indent));
    out.push('}');
    out
}

fn render_member(member: &Member, indent: usize) -> String {
    match member {
        Member::Field(field) => {
            let mut out = match &field.key {
                FieldKey::Ident(name) | FieldKey::Str(name) => key(name),
                FieldKey::Computed(expr) => format!("[{}]", render(expr, indent)),
            };
            if let Some(params) = &field.params {
                out.push_str(&format!("({})", render_params(params, indent)));
            }
            if field.plus {
                out.push('+');
            }
            out.push_str(field.visibility.symbol());
            out.push(' ');
            out.push_str(&render(&field.value, indent));
            out
        }
        Member::Local(bind, _) => format!("local {}", render_bind(bind, indent)),
        Member::Assert(cond, message, _) => render_assert(cond, message.as_ref(), indent),
    }
}
