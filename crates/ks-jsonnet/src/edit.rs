//! Structural patches over template source.
//!
//! A [`Document`] pairs source text with its parsed tree. Patches never
//! mutate either; they return new source in which only the edited byte range
//! differs from the original.

use crate::ast::{Expr, ExprKind, Field, BinaryOp};
use crate::parser::parse;
use crate::printer::{key, print_at};
use ks_types::{bail, KsError, Result};
use tracing::trace;

/// Parsed template source.
#[derive(Debug, Clone)]
pub struct Document {
    source: String,
    root: Expr,
}

struct Splice {
    start: usize,
    end: usize,
    text: String,
}

impl Document {
    /// Parse source text.
    pub fn parse(source: impl Into<String>) -> Result<Self> {
        let source = source.into();
        let root = parse(&source)?;
        Ok(Self { source, root })
    }

    /// The original source text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed tree.
    pub fn root(&self) -> &Expr {
        &self.root
    }

    /// The object literal the document evaluates to, looking through
    /// leading `local`s, parentheses and `base + { ... }` extension.
    pub fn top_object(&self) -> Result<&Expr> {
        fn descend(expr: &Expr) -> Option<&Expr> {
            match &expr.kind {
                ExprKind::Object(_) => Some(expr),
                ExprKind::Local(_, body) => descend(body),
                ExprKind::Paren(inner) => descend(inner),
                ExprKind::Binary(_, BinaryOp::Add, rhs) => descend(rhs),
                _ => None,
            }
        }
        descend(&self.root)
            .ok_or_else(|| KsError::NotAnObject("document is not an object literal".to_string()))
    }

    /// Field at a path of keys below the top object.
    pub fn field<S: AsRef<str>>(&self, path: &[S]) -> Option<&Field> {
        let mut object = self.top_object().ok()?;
        let mut found = None;
        for segment in path {
            let field = object.find_field(segment.as_ref())?;
            object = field.value.unparen();
            found = Some(field);
        }
        found
    }

    /// Source text of an expression from this document.
    pub fn text(&self, expr: &Expr) -> &str {
        &self.source[expr.span.start..expr.span.end]
    }

    /// Set the field at `path` to `value`, creating missing objects along the
    /// way. Returns the edited source.
    pub fn set_field<S: AsRef<str>>(&self, path: &[S], value: &Expr) -> Result<String> {
        let Some((last, parents)) = path.split_last() else {
            bail!(Validation, "empty field path");
        };

        let mut object = self.top_object()?;
        for (depth, segment) in parents.iter().enumerate() {
            let segment = segment.as_ref();
            match object.find_field(segment) {
                Some(field) => {
                    let inner = field.value.unparen();
                    if inner.as_object().is_none() {
                        bail!(NotAnObject, "{}", joined(&path[..=depth]));
                    }
                    object = inner;
                }
                None => {
                    let nested = path[depth + 1..].iter().rev().fold(value.clone(), |acc, key| {
                        Expr::object(vec![(key.as_ref().to_string(), acc)])
                    });
                    trace!("Creating {} under missing parent", joined(path));
                    return Ok(self.apply(self.insert(object, segment, &nested)));
                }
            }
        }

        let splices = match object.find_field(last.as_ref()) {
            Some(field) => vec![self.replace(field, value)],
            None => self.insert(object, last.as_ref(), value),
        };
        Ok(self.apply(splices))
    }

    /// Remove the field at `path`. Returns the edited source.
    pub fn remove_field<S: AsRef<str>>(&self, path: &[S]) -> Result<String> {
        let field = self
            .field(path)
            .ok_or_else(|| KsError::NotFound(joined(path)))?;

        let bytes = self.source.as_bytes();
        let mut end = field.span.end;
        let mut cursor = skip_blanks(bytes, end);
        let trailing_comma = bytes.get(cursor) == Some(&b',');
        if trailing_comma {
            end = cursor + 1;
            cursor = skip_blanks(bytes, end);
        }

        let line_start = line_start(&self.source, field.span.start);
        let alone_on_line = self.source[line_start..field.span.start].trim().is_empty()
            && matches!(bytes.get(cursor), None | Some(b'\n') | Some(b'\r'));

        let splice = if alone_on_line {
            let mut stop = cursor;
            if bytes.get(stop) == Some(&b'\r') {
                stop += 1;
            }
            if bytes.get(stop) == Some(&b'\n') {
                stop += 1;
            }
            Splice {
                start: line_start,
                end: stop,
                text: String::new(),
            }
        } else if let (false, Some(comma)) = (trailing_comma, preceding_comma(bytes, field.span.start)) {
            Splice {
                start: comma,
                end,
                text: String::new(),
            }
        } else {
            Splice {
                start: field.span.start,
                end: cursor,
                text: String::new(),
            }
        };
        Ok(self.apply(vec![splice]))
    }

    fn replace(&self, field: &Field, value: &Expr) -> Splice {
        let indent = indent_of(&self.source, field.span.start);
        Splice {
            start: field.value.span.start,
            end: field.value.span.end,
            text: print_at(value, indent),
        }
    }

    fn insert(&self, object: &Expr, name: &str, value: &Expr) -> Vec<Splice> {
        let open = object.span.start;
        let close = object.span.end.saturating_sub(1);
        let members = object.as_object().unwrap_or(&[]);
        let bytes = self.source.as_bytes();
        let close_on_own_line = self.source[line_start(&self.source, close)..close].trim().is_empty();

        let Some(last) = members.last() else {
            let member_indent = indent_of(&self.source, open) + 2;
            let entry = format!("{}: {}", key(name), print_at(value, member_indent));
            let interior = &self.source[open + 1..close];
            if interior.trim().is_empty() {
                return vec![Splice {
                    start: open + 1,
                    end: close,
                    text: format!("\n{}{},\n{}", pad(member_indent), entry, pad(indent_of(&self.source, open))),
                }];
            }
            if close_on_own_line {
                return vec![Splice {
                    start: line_start(&self.source, close),
                    end: line_start(&self.source, close),
                    text: format!("{}{},\n", pad(member_indent), entry),
                }];
            }
            return vec![Splice {
                start: close,
                end: close,
                text: format!(" {} ", entry),
            }];
        };

        let last_end = last.span().end;
        let has_comma = bytes.get(skip_blanks_and_newlines(bytes, last_end)) == Some(&b',');

        if close_on_own_line {
            let member_indent = indent_of(&self.source, last.span().start);
            let entry = format!("{}: {}", key(name), print_at(value, member_indent));
            let at = line_start(&self.source, close);
            let mut splices = Vec::new();
            if !has_comma {
                splices.push(Splice {
                    start: last_end,
                    end: last_end,
                    text: ",".to_string(),
                });
            }
            splices.push(Splice {
                start: at,
                end: at,
                text: format!("{}{},\n", pad(member_indent), entry),
            });
            return splices;
        }

        let entry = format!("{}: {}", key(name), print_at(value, indent_of(&self.source, open)));
        if has_comma {
            let comma = skip_blanks_and_newlines(bytes, last_end);
            vec![Splice {
                start: comma + 1,
                end: comma + 1,
                text: format!(" {}", entry),
            }]
        } else {
            vec![Splice {
                start: last_end,
                end: last_end,
                text: format!(", {}", entry),
            }]
        }
    }

    fn apply(&self, mut splices: Vec<Splice>) -> String {
        splices.sort_by(|a, b| b.start.cmp(&a.start));
        let mut out = self.source.clone();
        for splice in splices {
            out.replace_range(splice.start..splice.end, &splice.text);
        }
        out
    }
}

fn joined<S: AsRef<str>>(path: &[S]) -> String {
    path.iter().map(|s| s.as_ref()).collect::<Vec<&str>>().join(".")
}

fn pad(indent: usize) -> String {
    " ".repeat(indent)
}

fn line_start(source: &str, offset: usize) -> usize {
    source[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

/// Width of the leading whitespace on the line containing `offset`.
fn indent_of(source: &str, offset: usize) -> usize {
    let start = line_start(source, offset);
    source[start..]
        .bytes()
        .take_while(|b| *b == b' ' || *b == b'\t')
        .count()
}

fn skip_blanks(bytes: &[u8], mut at: usize) -> usize {
    while matches!(bytes.get(at), Some(b' ') | Some(b'\t')) {
        at += 1;
    }
    at
}

/// Offset of a comma separated from `at` only by spaces or tabs.
fn preceding_comma(bytes: &[u8], at: usize) -> Option<usize> {
    let mut i = at;
    while i > 0 && matches!(bytes[i - 1], b' ' | b'\t') {
        i -= 1;
    }
    (i > 0 && bytes[i - 1] == b',').then(|| i - 1)
}

fn skip_blanks_and_newlines(bytes: &[u8], mut at: usize) -> usize {
    while matches!(bytes.get(at), Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n')) {
        at += 1;
    }
    at
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::from_json;
    use serde_json::json;

    const PARAMS: &str = r#"// namespace parameters
{
  global: {
    // shared by every component
  },
  components: {
    // web frontend
    "guestbook-ui": {
      containerPort: 80,
      image: "gcr.io/heptio-images/ks-guestbook-demo:0.1",
      name: "guestbook-ui",
      replicas: 1,
    },
    redis: { name: "redis" },
  },
}
"#;

    fn doc() -> Document {
        Document::parse(PARAMS).unwrap()
    }

    #[test]
    fn test_replace_existing_value() {
        let edited = doc()
            .set_field(&["components", "guestbook-ui", "replicas"], &from_json(&json!(4)))
            .unwrap();
        assert_eq!(edited, PARAMS.replace("replicas: 1,", "replicas: 4,"));
    }

    #[test]
    fn test_insert_into_multiline_object() {
        let edited = doc()
            .set_field(&["components", "guestbook-ui", "type"], &from_json(&json!("ClusterIP")))
            .unwrap();
        assert_eq!(
            edited,
            PARAMS.replace("replicas: 1,\n", "replicas: 1,\n      type: \"ClusterIP\",\n")
        );
    }

    #[test]
    fn test_insert_into_inline_object() {
        let edited = doc()
            .set_field(&["components", "redis", "replicas"], &from_json(&json!(2)))
            .unwrap();
        assert_eq!(
            edited,
            PARAMS.replace("{ name: \"redis\" }", "{ name: \"redis\", replicas: 2 }")
        );
    }

    #[test]
    fn test_insert_creates_missing_parents() {
        let edited = doc()
            .set_field(&["components", "nginx", "replicas"], &from_json(&json!(3)))
            .unwrap();
        assert!(edited.contains("    nginx: {\n      replicas: 3,\n    },\n  },\n}"), "{}", edited);
        assert!(edited.starts_with(&PARAMS[..PARAMS.find("  },\n}").unwrap()]));
    }

    #[test]
    fn test_insert_into_empty_object_keeps_comment() {
        let edited = doc().set_field(&["global", "env"], &from_json(&json!("prod"))).unwrap();
        assert!(
            edited.contains("  global: {\n    // shared by every component\n    env: \"prod\",\n  },"),
            "{}",
            edited
        );
    }

    #[test]
    fn test_insert_into_bare_empty_object() {
        let source = "{\n  global: {},\n  components: {},\n}\n";
        let edited = Document::parse(source)
            .unwrap()
            .set_field(&["components", "web", "replicas"], &from_json(&json!(1)))
            .unwrap();
        assert_eq!(
            edited,
            "{\n  global: {},\n  components: {\n    web: {\n      replicas: 1,\n    },\n  },\n}\n"
        );
    }

    #[test]
    fn test_add_missing_trailing_comma() {
        let source = "{\n  a: 1\n}";
        let edited = Document::parse(source)
            .unwrap()
            .set_field(&["b"], &from_json(&json!(2)))
            .unwrap();
        assert_eq!(edited, "{\n  a: 1,\n  b: 2,\n}");
    }

    #[test]
    fn test_remove_field_line() {
        let edited = doc().remove_field(&["components", "guestbook-ui", "name"]).unwrap();
        assert_eq!(edited, PARAMS.replace("      name: \"guestbook-ui\",\n", ""));
    }

    #[test]
    fn test_remove_inline_field() {
        let source = "{ a: 1, b: 2 }";
        let document = Document::parse(source).unwrap();
        assert_eq!(document.remove_field(&["a"]).unwrap(), "{ b: 2 }");
        assert_eq!(document.remove_field(&["b"]).unwrap(), "{ a: 1 }");
    }

    #[test]
    fn test_remove_missing_is_not_found() {
        let err = doc().remove_field(&["components", "redis", "image"]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_set_through_scalar_is_not_an_object() {
        let err = doc()
            .set_field(&["components", "redis", "name", "x"], &from_json(&json!(1)))
            .unwrap_err();
        assert!(matches!(err, KsError::NotAnObject(_)));
    }

    #[test]
    fn test_set_multiline_value_is_indented() {
        let edited = doc()
            .set_field(&["components", "redis", "labels"], &from_json(&json!({"app": "redis"})))
            .unwrap();
        let reparsed = Document::parse(edited).unwrap();
        let labels = reparsed.field(&["components", "redis", "labels", "app"]).unwrap();
        assert_eq!(labels.value.kind, ExprKind::Str("redis".into()));
    }
}
