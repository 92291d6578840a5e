use super::*;

#[test]
fn plan_prints_manifest_per_target() {
    let ctx = TestContext::with_project();
    ctx.write_config(TWO_HANDLERS);

    let output = ctx
        .depack()
        .args(["plan", "--graph", "graph.json", "--skip-peers"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let manifests: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(manifests["a"]["name"], "svc-a");
    assert_eq!(manifests["a"]["dependencies"]["lodash"], "4.17.21");
    assert!(manifests["a"]["dependencies"].get("aws-sdk").is_none());
    assert!(manifests["a"]["dependencies"].get("fs").is_none());
    assert_eq!(
        manifests["b"]["dependencies"]["subscriptions-transport-ws"],
        "0.9.19"
    );
    assert!(manifests["b"]["dependencies"].get("lodash").is_none());
}

#[test]
fn plan_does_not_write_manifests() {
    let ctx = TestContext::with_project();
    ctx.write_config(TWO_HANDLERS);
    ctx.create_output_dirs(&["a", "b"]);

    ctx.depack()
        .args(["plan", "--graph", "graph.json", "--skip-peers"])
        .assert()
        .success();

    ctx.temp
        .child(".webpack/a/package.json")
        .assert(predicate::path::missing());
}

#[test]
fn plan_combined_output() {
    let ctx = TestContext::with_project();
    ctx.write_config(
        r#"
blacklist: [aws-sdk]
entries:
  a: ./src/a
  b: ./src/b
output:
  path: dist
  combined: true
"#,
    );

    ctx.depack()
        .args(["plan", "--graph", "graph.json", "--skip-peers"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"combined\""))
        .stdout(predicate::str::contains("\"name\": \"svc\""))
        .stdout(predicate::str::contains("lodash"))
        .stdout(predicate::str::contains("subscriptions-transport-ws"));
}

#[test]
fn plan_reports_output_collision() {
    let ctx = TestContext::with_project();
    ctx.write_config(
        r#"
entries:
  a: ./src/a
  b: ./src/b
output:
  path: dist
"#,
    );

    ctx.depack()
        .args(["plan", "--graph", "graph.json", "--skip-peers"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Output collision"))
        .stderr(predicate::str::contains("[name]"));
}

#[test]
fn invalid_blacklist_pattern_fails() {
    let ctx = TestContext::with_project();
    ctx.write_config("blacklist: ['/([/']\nentries:\n  a: ./src/a\n");

    ctx.depack()
        .args(["plan", "--graph", "graph.json", "--skip-peers"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}
