//! Assembling component source from constructor groups.

use crate::constructor::Groups;
use ks_jsonnet::{print, Expr};
use ks_types::{bail, Result};

/// External variable carrying resolved parameters at evaluation time.
pub const PARAMS_EXT_VAR: &str = "__ksonnet/params";

/// A binding placed ahead of the generated declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Import {
    /// `local <name> = import "<path>";`
    File {
        /// Local name
        name: String,
        /// Import path
        path: String,
    },
    /// `local <name> = std.extVar("__ksonnet/params").components["<component>"];`
    Params {
        /// Local name
        name: String,
        /// Component whose parameters are selected
        component: String,
    },
}

impl Import {
    fn name(&self) -> &str {
        match self {
            Import::File { name, .. } | Import::Params { name, .. } => name,
        }
    }

    fn value(&self) -> Expr {
        match self {
            Import::File { path, .. } => Expr::synthetic(ks_jsonnet::ExprKind::Import(path.clone())),
            Import::Params { component, .. } => Expr::var("std")
                .field("extVar")
                .call(vec![Expr::string(PARAMS_EXT_VAR)])
                .field("components")
                .index(Expr::string(component.as_str())),
        }
    }
}

/// Renders generated components.
#[derive(Debug, Clone)]
pub struct ComponentEmitter {
    library: String,
    params: String,
}

impl ComponentEmitter {
    /// `library` and `params` are the local names setter chains start from
    /// and read arguments from; both must be bound by the imports passed to
    /// [`ComponentEmitter::emit`].
    pub fn new(library: impl Into<String>, params: impl Into<String>) -> Self {
        Self {
            library: library.into(),
            params: params.into(),
        }
    }

    /// Emit component source.
    ///
    /// `kind` is the library path of the kind (`[group, version, kind]`).
    /// The root expression merges `<kind>Init` with every group in the
    /// order the groups were added.
    pub fn emit<S: AsRef<str>>(&self, kind: &[S], groups: &Groups, imports: &[Import]) -> Result<String> {
        let Some(kind_name) = kind.last() else {
            bail!(Serialization, "empty kind selector");
        };
        for required in [&self.library, &self.params] {
            if !imports.iter().any(|import| import.name() == required.as_str()) {
                bail!(Serialization, "no import binds '{}'", required);
            }
        }

        let init = format!("{}Init", kind_name.as_ref());
        let root = groups
            .values()
            .fold(Expr::var(init.as_str()), |acc, group| acc.plus(Expr::var(group.name.as_str())));

        let constructor = kind
            .iter()
            .fold(Expr::var(self.library.as_str()), |expr, segment| expr.field(segment.as_ref()))
            .field("new")
            .call(vec![]);

        let mut body = root.bound_by(init, constructor);
        for group in groups.values().rev() {
            body = body.bound_by(group.name.as_str(), group.expression(&self.library, &self.params));
        }
        for import in imports.iter().rev() {
            body = body.bound_by(import.name(), import.value());
        }

        let mut source = print(&body);
        source.push('\n');
        Ok(source)
    }
}

impl Default for ComponentEmitter {
    fn default() -> Self {
        Self::new("k", "params")
    }
}
