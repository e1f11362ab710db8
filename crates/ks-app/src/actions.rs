//! Show, apply and delete over an environment.

use crate::app::App;
use crate::environment::Environment;
use crate::render::{format_objects, sort_for_apply, sort_for_delete, Renderer};
use ks_types::{ApplyOptions, DeleteOptions, ObjectClient, OutputFormat, Result, TemplateEvaluator};
use serde_json::Value;
use tracing::info;

/// Which components to act on.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Environment name; `None` renders namespace params only
    pub env: Option<String>,
    /// Component names, `<ns>/<name>` or bare; empty selects all
    pub components: Vec<String>,
}

impl Selection {
    fn environment(&self, app: &App) -> Result<Option<Environment>> {
        self.env.as_deref().map(|name| Environment::open(app, name)).transpose()
    }
}

/// Rendered objects of a selection, serialized.
pub fn show(app: &App, evaluator: &dyn TemplateEvaluator, selection: &Selection, format: OutputFormat) -> Result<String> {
    let env = selection.environment(app)?;
    let mut objects = Renderer::new(app, evaluator).render(env.as_ref(), &selection.components)?;
    sort_for_apply(&mut objects);
    format_objects(&objects, format)
}

/// Render a selection and hand it to `client` for apply. Returns the
/// objects sent, in apply order.
pub async fn apply(
    app: &App,
    evaluator: &dyn TemplateEvaluator,
    client: &dyn ObjectClient,
    selection: &Selection,
    mut options: ApplyOptions,
) -> Result<Vec<Value>> {
    let env = selection.environment(app)?;
    let mut objects = Renderer::new(app, evaluator).render(env.as_ref(), &selection.components)?;
    sort_for_apply(&mut objects);

    if let Some(env) = &env {
        options.client = merge_client(env.client_config(), options.client);
    }
    info!("Applying {} object(s){}", objects.len(), if options.dry_run { " (dry run)" } else { "" });
    client.apply(&objects, &options).await?;
    Ok(objects)
}

/// Render a selection and hand it to `client` for deletion, in reverse
/// apply order.
pub async fn delete(
    app: &App,
    evaluator: &dyn TemplateEvaluator,
    client: &dyn ObjectClient,
    selection: &Selection,
    mut options: DeleteOptions,
) -> Result<Vec<Value>> {
    let env = selection.environment(app)?;
    let mut objects = Renderer::new(app, evaluator).render(env.as_ref(), &selection.components)?;
    sort_for_delete(&mut objects);

    if let Some(env) = &env {
        options.client = merge_client(env.client_config(), options.client);
    }
    info!("Deleting {} object(s)", objects.len());
    client.delete(&objects, &options).await?;
    Ok(objects)
}

/// Connection from the environment, with explicitly given values winning.
fn merge_client(env: ks_types::ClientConfig, explicit: ks_types::ClientConfig) -> ks_types::ClientConfig {
    ks_types::ClientConfig {
        context: explicit.context.or(env.context),
        kubeconfig: explicit.kubeconfig.or(env.kubeconfig),
        namespace: explicit.namespace.or(env.namespace),
        server: explicit.server.or(env.server),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ks_types::ClientConfig;

    #[test]
    fn test_merge_client_prefers_explicit() {
        let env = ClientConfig {
            context: Some("env-context".into()),
            namespace: Some("prod".into()),
            ..Default::default()
        };
        let explicit = ClientConfig {
            context: Some("cli-context".into()),
            ..Default::default()
        };
        let merged = merge_client(env, explicit);
        assert_eq!(merged.context.as_deref(), Some("cli-context"));
        assert_eq!(merged.namespace.as_deref(), Some("prod"));
        assert!(merged.server.is_none());
    }
}
