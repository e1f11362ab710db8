use ks_params::document::{component_params, delete_component_param, set_component_param};
use ks_params::{ParamOptions, ParamStore};
use proptest::prelude::*;
use serde_json::{json, Value};
use tempfile::TempDir;

const BASE: &str = r#"// hand-edited
{
  global: {
    namespace: "default",
  },
  components: {
    redis: {
      name: "redis",   // keep this comment
      replicas: 1,
    },
    web: { image: "nginx:1.7.9" },
  },
}
"#;

const REDIS_BLOCK: &str = "    redis: {\n      name: \"redis\",   // keep this comment\n      replicas: 1,\n    },\n";

fn component() -> impl Strategy<Value = String> {
    prop_oneof![Just("web".to_string()), Just("guestbook-ui".to_string()), "[a-z][a-z0-9]{0,6}"]
        .prop_filter("redis is the untouched neighbour", |name| name != "redis")
}

fn key() -> impl Strategy<Value = String> {
    "[a-z][a-zA-Z0-9]{0,8}"
}

fn value() -> impl Strategy<Value = Value> {
    let scalar = prop_oneof![
        (-1_000_000i64..1_000_000).prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        "[ -~]{0,12}".prop_map(Value::from),
        Just(Value::Null),
    ];
    prop_oneof![
        3 => scalar.clone(),
        1 => prop::collection::vec(scalar.clone(), 0..4).prop_map(Value::from),
        1 => prop::collection::btree_map("[a-z]{1,5}", scalar, 0..3)
            .prop_map(|map| Value::Object(map.into_iter().collect())),
    ]
}

proptest! {
    #[test]
    fn set_get_delete_round_trip(component in component(), key in key(), value in value()) {
        let edited = set_component_param(BASE, &component, &[key.as_str()], &value).unwrap();
        let params = component_params(&edited, &component).unwrap();
        prop_assert_eq!(params.get(&key), Some(&value.to_string()));
        prop_assert!(edited.contains(REDIS_BLOCK));

        let removed = delete_component_param(&edited, &component, &[key.as_str()]).unwrap();
        prop_assert!(!component_params(&removed, &component).unwrap().contains_key(&key));
        prop_assert!(removed.contains(REDIS_BLOCK));
        prop_assert!(removed.starts_with("// hand-edited\n{\n  global: {\n    namespace: \"default\",\n  },\n"), "global block changed");
    }

    #[test]
    fn set_is_stable(component in component(), key in key(), value in value()) {
        let once = set_component_param(BASE, &component, &[key.as_str()], &value).unwrap();
        let twice = set_component_param(&once, &component, &[key.as_str()], &value).unwrap();
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn store_edits_leave_neighbours_untouched() {
    let dir = TempDir::new().unwrap();
    let store = ParamStore::new(dir.path().join("params.libsonnet"));
    std::fs::write(store.path(), BASE).unwrap();

    store
        .set("web", &["replicas"], &json!(3), ParamOptions::default())
        .unwrap();
    store.set_global(&["env"], &json!("prod")).unwrap();

    let (source, _) = store.read().unwrap();
    assert!(source.contains(REDIS_BLOCK));
    assert!(source.contains("web: { image: \"nginx:1.7.9\", replicas: 3 },"));
    assert_eq!(store.globals().unwrap()["env"], "\"prod\"");

    store
        .delete("web", &["replicas"], ParamOptions::default())
        .unwrap();
    store.delete_global(&["env"]).unwrap();
    assert_eq!(store.read().unwrap().0, BASE);
}
