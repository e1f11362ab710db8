use async_trait::async_trait;
use ks_app::actions::{self, Selection};
use ks_app::{App, Environment, Renderer};
use ks_core::EnvironmentSpec;
use ks_types::{
    ApplyOptions, DeleteOptions, EnvName, ExtVars, ObjectClient, OutputFormat, Result, TemplateEvaluator,
};
use mockall::mock;
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;

mock! {
    Evaluator {}
    impl TemplateEvaluator for Evaluator {
        fn evaluate_file(&self, path: &Path, vars: &ExtVars) -> Result<String>;
        fn evaluate_snippet(&self, source: &str, base_dir: &Path, vars: &ExtVars) -> Result<String>;
    }
}

mock! {
    Client {}
    #[async_trait]
    impl ObjectClient for Client {
        async fn apply(&self, objects: &[Value], options: &ApplyOptions) -> Result<()>;
        async fn delete(&self, objects: &[Value], options: &DeleteOptions) -> Result<()>;
    }
}

/// Stands in for the jsonnet binary: params files evaluate to fixed
/// documents, the web component to a Deployment built from its params.
fn evaluator() -> MockEvaluator {
    let mut evaluator = MockEvaluator::new();
    evaluator.expect_evaluate_file().returning(|path, vars| {
        let file = path.to_string_lossy();
        let output = if file.contains("environments") {
            json!({"global": {}, "components": {"web": {"replicas": 3}}})
        } else if file.ends_with("params.libsonnet") {
            json!({"global": {"tier": "frontend"}, "components": {"web": {"replicas": 1, "image": "nginx"}}})
        } else {
            let params: Value = serde_json::from_str(&vars.code["__ksonnet/params"]).unwrap();
            let web = &params["components"]["web"];
            json!({
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "metadata": {"name": "web", "labels": {"tier": web["tier"]}},
                "spec": {"replicas": web["replicas"], "template": {"spec": {"containers": [{"image": web["image"]}]}}}
            })
        };
        Ok(output.to_string())
    });
    evaluator
}

fn app(dir: &TempDir) -> App {
    let mut app = App::init(dir.path(), "guestbook").unwrap();
    let components = app.components_dir();
    std::fs::write(components.join("web.jsonnet"), "// generated\n").unwrap();
    std::fs::write(
        components.join("namespace.yaml"),
        "apiVersion: v1\nkind: Namespace\nmetadata:\n  name: guestbook\n",
    )
    .unwrap();

    let spec = EnvironmentSpec {
        namespace: Some("guestbook".to_string()),
        context: Some("kind-prod".to_string()),
        ..Default::default()
    };
    Environment::add(&mut app, &EnvName::new("prod").unwrap(), spec).unwrap();
    app
}

fn prod() -> Selection {
    Selection {
        env: Some("prod".to_string()),
        components: Vec::new(),
    }
}

#[test]
fn params_evaluate_against_target_environment() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let mut evaluator = MockEvaluator::new();
    evaluator.expect_evaluate_file().returning(|path, vars| {
        let file = path.to_string_lossy();
        let output = if file.contains("environments") {
            json!({"global": {}, "components": {}})
        } else if file.ends_with("params.libsonnet") {
            let env: Value = serde_json::from_str(&vars.code["__ksonnet/environments"]).unwrap();
            json!({"global": {"tier": env["namespace"]}, "components": {"web": {"replicas": 1}}})
        } else {
            let params: Value = serde_json::from_str(&vars.code["__ksonnet/params"]).unwrap();
            json!({
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "metadata": {"name": "web", "labels": {"tier": params["components"]["web"]["tier"]}}
            })
        };
        Ok(output.to_string())
    });

    let out = actions::show(&app, &evaluator, &prod(), OutputFormat::Json).unwrap();
    let list: Value = serde_json::from_str(&out).unwrap();
    let deployment = &list["items"][1];
    assert_eq!(deployment["kind"], json!("Deployment"));
    assert_eq!(deployment["metadata"]["labels"]["tier"], json!("guestbook"));
}

#[test]
fn show_merges_environment_params() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let out = actions::show(&app, &evaluator(), &prod(), OutputFormat::Json).unwrap();
    let list: Value = serde_json::from_str(&out).unwrap();
    let items = list["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["kind"], json!("Namespace"));
    assert_eq!(items[1]["spec"]["replicas"], json!(3));
    assert_eq!(items[1]["metadata"]["labels"]["tier"], json!("frontend"));
    assert_eq!(items[1]["spec"]["template"]["spec"]["containers"][0]["image"], json!("nginx"));
}

#[test]
fn show_without_environment_uses_namespace_params() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let selection = Selection {
        env: None,
        components: vec!["web".to_string()],
    };

    let out = actions::show(&app, &evaluator(), &selection, OutputFormat::Yaml).unwrap();
    assert!(out.starts_with("---\napiVersion: apps/v1\nkind: Deployment\n"));
    assert!(out.contains("replicas: 1"));
    assert!(!out.contains("kind: Namespace"));
}

#[test]
fn unknown_component_is_not_found() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);
    let env = Environment::open(&app, "prod").unwrap();
    let err = Renderer::new(&app, &evaluator())
        .render(Some(&env), &["missing".to_string()])
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn apply_sends_ordered_objects_with_env_connection() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let mut client = MockClient::new();
    client
        .expect_apply()
        .withf(|objects, options| {
            objects.len() == 2
                && objects[0]["kind"] == json!("Namespace")
                && objects[1]["spec"]["replicas"] == json!(3)
                && options.client.namespace.as_deref() == Some("guestbook")
                && options.client.context.as_deref() == Some("kind-prod")
                && options.dry_run
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let options = ApplyOptions {
        dry_run: true,
        ..Default::default()
    };
    let sent = actions::apply(&app, &evaluator(), &client, &prod(), options).await.unwrap();
    assert_eq!(sent.len(), 2);
}

#[tokio::test]
async fn delete_reverses_apply_order() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let mut client = MockClient::new();
    client
        .expect_delete()
        .withf(|objects, options| {
            objects[0]["kind"] == json!("Deployment")
                && objects[1]["kind"] == json!("Namespace")
                && options.grace_period == Some(5)
        })
        .times(1)
        .returning(|_, _| Ok(()));

    let options = DeleteOptions {
        grace_period: Some(5),
        ..Default::default()
    };
    actions::delete(&app, &evaluator(), &client, &prod(), options).await.unwrap();
}

#[tokio::test]
async fn client_failure_propagates() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let mut client = MockClient::new();
    client
        .expect_apply()
        .returning(|_, _| Err(ks_types::KsError::Client("connection refused".to_string())));

    let err = actions::apply(&app, &evaluator(), &client, &prod(), ApplyOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ks_types::KsError::Client(_)));
}
