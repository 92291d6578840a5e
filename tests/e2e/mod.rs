use assert_cmd::Command;
use assert_fs::{prelude::*, TempDir};
use predicates::prelude::*;
use serde_json::json;

pub mod pack;
pub mod plan;

/// Isolated project directory with a bundler graph for two handlers
pub struct TestContext {
    pub temp: TempDir,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();
        Self { temp }
    }

    /// A project where handler `a` imports lodash, aws-sdk and fs and
    /// handler `b` imports only subscriptions-transport-ws.
    pub fn with_project() -> Self {
        let ctx = Self::new();
        ctx.temp
            .child("package.json")
            .write_str(
                r#"{
  "name": "svc",
  "dependencies": {
    "lodash": "4.17.21",
    "aws-sdk": "^2.1000.0",
    "subscriptions-transport-ws": "0.9.19"
  }
}"#,
            )
            .unwrap();
        ctx.temp.child("src").create_dir_all().unwrap();
        ctx.write_graph();
        ctx
    }

    /// Create a Command for running depack inside the project
    pub fn depack(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("depack").unwrap();
        cmd.current_dir(&self.temp);
        cmd.env("RUST_LOG", "depack=warn");
        cmd
    }

    pub fn write_config(&self, content: &str) {
        self.temp.child("depack.yaml").write_str(content).unwrap();
    }

    pub fn create_output_dirs(&self, targets: &[&str]) {
        for target in targets {
            self.temp
                .child(format!(".webpack/{}", target))
                .create_dir_all()
                .unwrap();
        }
    }

    fn write_graph(&self) {
        let src = self.temp.child("src").path().to_path_buf();
        let graph = json!({
            "modules": [
                { "id": "a", "request": "./src/a", "kind": { "type": "internal", "resource": src.join("a.ts") }, "importers": [ { "type": "entry" } ] },
                { "id": "b", "request": "./src/b", "kind": { "type": "internal", "resource": src.join("b.ts") }, "importers": [ { "type": "entry" } ] },
                { "id": "lodash", "request": "lodash/fp", "kind": { "type": "external", "issuer_dir": src }, "importers": [ { "type": "module", "id": "a" } ] },
                { "id": "aws", "request": "aws-sdk", "kind": { "type": "external", "issuer_dir": src }, "importers": [ { "type": "module", "id": "a" } ] },
                { "id": "fs", "request": "fs", "kind": { "type": "external", "issuer_dir": src }, "importers": [ { "type": "module", "id": "a" } ] },
                { "id": "ws", "request": "subscriptions-transport-ws", "kind": { "type": "external", "issuer_dir": src }, "importers": [ { "type": "module", "id": "b" } ] }
            ]
        });
        self.temp
            .child("graph.json")
            .write_str(&serde_json::to_string_pretty(&graph).unwrap())
            .unwrap();
    }
}

/// Config for the two-handler project
pub const TWO_HANDLERS: &str = r#"
blacklist:
  - aws-sdk
entries:
  a: ./src/a
  b: ./src/b
"#;

#[test]
fn help_lists_subcommands() {
    let ctx = TestContext::new();
    ctx.depack()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pack"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn missing_graph_file_fails() {
    let ctx = TestContext::new();
    ctx.write_config(TWO_HANDLERS);
    ctx.depack()
        .args(["plan", "--graph", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn malformed_graph_fails_with_help() {
    let ctx = TestContext::new();
    ctx.write_config(TWO_HANDLERS);
    ctx.temp.child("graph.json").write_str("{ \"modules\": 3 }").unwrap();
    ctx.depack()
        .args(["plan", "--graph", "graph.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Module graph error"))
        .stderr(predicate::str::contains("help:"));
}
