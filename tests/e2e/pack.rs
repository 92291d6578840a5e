use super::*;

#[test]
fn pack_fails_when_output_dir_missing() {
    let ctx = TestContext::with_project();
    ctx.write_config(TWO_HANDLERS);

    ctx.depack()
        .args(["pack", "--graph", "graph.json", "--skip-peers"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Output directory does not exist"))
        .stderr(predicate::str::contains("2 target(s) failed"));

    ctx.temp
        .child(".webpack/a/package.json")
        .assert(predicate::path::missing());
}

#[cfg(unix)]
mod fake_package_manager {
    use super::*;
    use serial_test::serial;
    use std::os::unix::fs::PermissionsExt;

    /// Install a shell script that answers peer queries and logs installs
    fn install_fake(ctx: &TestContext, install_exit: i32) -> String {
        let script = format!(
            r#"#!/bin/sh
if [ "$1" = "info" ]; then
  if [ "$2" = "subscriptions-transport-ws@0.9.19" ]; then
    echo '{{"type":"inline","data":{{"graphql":"^15.0.0"}}}}'
  fi
  exit 0
fi
echo "$@" > install.log
if [ {code} -ne 0 ]; then
  echo "registry unreachable" >&2
  exit {code}
fi
mkdir -p node_modules
"#,
            code = install_exit
        );
        let fake = ctx.temp.child("fake-pm");
        fake.write_str(&script).unwrap();
        let mut perms = std::fs::metadata(fake.path()).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(fake.path(), perms).unwrap();
        fake.path().display().to_string()
    }

    fn config_with(bin: &str) -> String {
        format!("package_manager_bin: {}\n{}", bin, TWO_HANDLERS)
    }

    #[test]
    #[serial]
    fn pack_installs_every_target() {
        let ctx = TestContext::with_project();
        let bin = install_fake(&ctx, 0);
        ctx.write_config(&config_with(&bin));
        ctx.create_output_dirs(&["a", "b"]);

        ctx.depack()
            .args(["pack", "--graph", "graph.json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Installed packages for a"))
            .stdout(predicate::str::contains("Installed packages for b"));

        ctx.temp
            .child(".webpack/b/package.json")
            .assert(predicate::str::contains("\"graphql\": \"^15.0.0\""))
            .assert(predicate::str::contains("svc-b"));
        ctx.temp
            .child(".webpack/a/package.json")
            .assert(predicate::str::contains("lodash"))
            .assert(predicate::str::contains("aws-sdk").not());
        ctx.temp
            .child(".webpack/a/install.log")
            .assert(predicate::str::contains("install --cache"));
        ctx.temp
            .child(".webpack/a/.depack-cache")
            .assert(predicate::path::missing());
    }

    #[test]
    #[serial]
    fn pack_reports_install_failure() {
        let ctx = TestContext::with_project();
        let bin = install_fake(&ctx, 3);
        ctx.write_config(&config_with(&bin));
        ctx.create_output_dirs(&["a", "b"]);

        ctx.depack()
            .args(["pack", "--graph", "graph.json", "--skip-peers"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("exited with code 3"))
            .stderr(predicate::str::contains("registry unreachable"))
            .stderr(predicate::str::contains("2 target(s) failed"));

        ctx.temp
            .child(".webpack/a/package.json")
            .assert(predicate::path::exists());
    }
}
