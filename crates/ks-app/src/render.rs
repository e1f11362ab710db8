//! Rendering components into concrete objects.

use crate::app::App;
use crate::component::Component;
use crate::environment::Environment;
use crate::namespace::Namespace;
use ks_core::util::{data::load_yaml_documents, merge_patch, slurp};
use ks_manifest::PARAMS_EXT_VAR;
use ks_params::{COMPONENTS, GLOBAL};
use ks_types::{bail, ComponentFormat, ExtVars, KsError, OutputFormat, Result, TemplateEvaluator};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use tracing::{debug, trace};

/// External variable describing the target environment.
pub const ENV_EXT_VAR: &str = "__ksonnet/environments";

/// Evaluated params of one namespace in one environment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamsView {
    namespace: Value,
    environment: Value,
}

impl ParamsView {
    /// Combine an evaluated namespace document with optional environment
    /// overrides.
    pub fn new(namespace: Value, environment: Option<Value>) -> Self {
        Self {
            namespace,
            environment: environment.unwrap_or(Value::Null),
        }
    }

    fn section(document: &Value, key: &str) -> Value {
        document.get(key).cloned().unwrap_or_else(|| json!({}))
    }

    fn component_of(document: &Value, component: &str) -> Value {
        document
            .get(COMPONENTS)
            .and_then(|c| c.get(component))
            .cloned()
            .unwrap_or_else(|| json!({}))
    }

    /// Globals after environment overrides.
    pub fn global(&self) -> Value {
        merge_patch(
            Self::section(&self.namespace, GLOBAL),
            Self::section(&self.environment, GLOBAL),
        )
    }

    /// A component's parameters: its own values with environment overrides,
    /// then globals patched over the result.
    pub fn component(&self, component: &str) -> Value {
        let own = merge_patch(
            Self::component_of(&self.namespace, component),
            Self::component_of(&self.environment, component),
        );
        merge_patch(own, self.global())
    }

    /// The document bound to the params external variable for `component`.
    pub fn document(&self, component: &str) -> Value {
        let mut components = Map::new();
        components.insert(component.to_string(), self.component(component));
        json!({ COMPONENTS: components, GLOBAL: self.global() })
    }
}

/// Evaluates components against their resolved parameters.
pub struct Renderer<'a> {
    app: &'a App,
    evaluator: &'a dyn TemplateEvaluator,
}

impl<'a> Renderer<'a> {
    /// Renderer over `app` using `evaluator` for template sources.
    pub fn new(app: &'a App, evaluator: &'a dyn TemplateEvaluator) -> Self {
        Self { app, evaluator }
    }

    /// Every object of the components `env` targets, optionally limited to
    /// components named in `only`. Objects keep component order.
    pub fn render(&self, env: Option<&Environment>, only: &[String]) -> Result<Vec<Value>> {
        let namespaces = match env.map(Environment::targets).transpose()?.flatten() {
            Some(targets) => targets
                .iter()
                .map(|name| Namespace::open(self.app, name))
                .collect::<Result<Vec<_>>>()?,
            None => Namespace::list(self.app)?,
        };

        let mut objects = Vec::new();
        let mut matched = 0;
        for namespace in &namespaces {
            let components: Vec<Component> = namespace
                .components()?
                .into_iter()
                .filter(|c| only.is_empty() || only.iter().any(|o| o == c.name.as_str() || *o == c.qualified_name()))
                .collect();
            if components.is_empty() {
                continue;
            }
            matched += components.len();

            let view = self.params_view(namespace, env)?;
            for component in &components {
                objects.extend(self.render_component(component, &view, env)?);
            }
        }

        if !only.is_empty() && matched == 0 {
            bail!(NotFound, "component {}", only.join(", "));
        }
        debug!("Rendered {} object(s) from {} namespace(s)", objects.len(), namespaces.len());
        Ok(objects)
    }

    /// Evaluated params of `namespace`, with `env` overrides if given.
    pub fn params_view(&self, namespace: &Namespace, env: Option<&Environment>) -> Result<ParamsView> {
        let vars = match env {
            Some(env) => ExtVars::new().with_code(ENV_EXT_VAR, environment_document(env).to_string()),
            None => ExtVars::new(),
        };
        let namespace_doc = self.evaluate_params(namespace.params().path(), &vars)?;
        let environment_doc = match env {
            Some(env) if env.params().exists() => Some(self.evaluate_params(env.params().path(), &vars)?),
            _ => None,
        };
        Ok(ParamsView::new(namespace_doc, environment_doc))
    }

    fn evaluate_params(&self, path: &std::path::Path, vars: &ExtVars) -> Result<Value> {
        trace!("Evaluating params {:?}", path);
        let output = self.evaluator.evaluate_file(path, vars)?;
        Ok(serde_json::from_str(&output)?)
    }

    /// Objects produced by one component.
    pub fn render_component(&self, component: &Component, view: &ParamsView, env: Option<&Environment>) -> Result<Vec<Value>> {
        debug!("Rendering component '{}'", component);
        match component.format {
            ComponentFormat::Yaml => {
                let documents = load_yaml_documents(&slurp(&component.path)?)?;
                documents
                    .into_iter()
                    .map(|doc| flatten_objects(doc, component))
                    .collect::<Result<Vec<_>>>()
                    .map(|nested| nested.into_iter().flatten().collect())
            }
            ComponentFormat::Jsonnet => {
                let mut vars = ExtVars::new().with_code(PARAMS_EXT_VAR, view.document(component.name.as_str()).to_string());
                if let Some(env) = env {
                    vars = vars.with_code(ENV_EXT_VAR, environment_document(env).to_string());
                }
                let output = self.evaluator.evaluate_file(&component.path, &vars)?;
                let value: Value = serde_json::from_str(&output)?;
                flatten_objects(value, component)
            }
        }
    }
}

fn environment_document(env: &Environment) -> Value {
    json!({
        "name": env.name.as_str(),
        "server": env.spec.server,
        "namespace": env.spec.namespace,
    })
}

/// Objects in an evaluated value: a single object, an array of objects, or
/// the items of a `List`.
pub fn flatten_objects(value: Value, component: &Component) -> Result<Vec<Value>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| flatten_objects(item, component))
            .collect::<Result<Vec<_>>>()
            .map(|nested| nested.into_iter().flatten().collect()),
        Value::Object(mut map) => {
            let is_list = map.get("kind").and_then(Value::as_str) == Some("List");
            match map.remove("items") {
                Some(items) if is_list => flatten_objects(items, component),
                Some(items) => {
                    map.insert("items".to_string(), items);
                    Ok(vec![Value::Object(map)])
                }
                None if map.is_empty() => Ok(Vec::new()),
                None => Ok(vec![Value::Object(map)]),
            }
        }
        Value::Null => Ok(Vec::new()),
        other => Err(KsError::InvalidManifest(format!(
            "component '{}' produced a {} instead of objects",
            component,
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn kind_rank(object: &Value) -> u8 {
    match object.get("kind").and_then(Value::as_str) {
        Some("Namespace") => 0,
        Some("CustomResourceDefinition") => 1,
        _ => 2,
    }
}

fn text<'a>(object: &'a Value, pointer: &str) -> &'a str {
    object.pointer(pointer).and_then(Value::as_str).unwrap_or("")
}

fn sort_key(object: &Value) -> (u8, &str, &str, &str) {
    (
        kind_rank(object),
        text(object, "/kind"),
        text(object, "/metadata/namespace"),
        text(object, "/metadata/name"),
    )
}

fn apply_order(a: &Value, b: &Value) -> Ordering {
    sort_key(a).cmp(&sort_key(b))
}

/// Order objects for creation: namespaces, then CRDs, then everything else
/// by kind, namespace and name.
pub fn sort_for_apply(objects: &mut [Value]) {
    objects.sort_by(apply_order);
}

/// Reverse of [`sort_for_apply`].
pub fn sort_for_delete(objects: &mut [Value]) {
    objects.sort_by(|a, b| apply_order(b, a));
}

/// Serialize objects for display.
pub fn format_objects(objects: &[Value], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            let list = json!({ "apiVersion": "v1", "kind": "List", "items": objects });
            let mut out = serde_json::to_string_pretty(&list)?;
            out.push('\n');
            Ok(out)
        }
        OutputFormat::Yaml => {
            let mut out = String::new();
            for object in objects {
                out.push_str("---\n");
                out.push_str(&serde_yaml::to_string(object)?);
            }
            Ok(out)
        }
    }
}
