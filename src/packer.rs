//! The packer pipeline: attribute once, then expand and install per target.

use crate::core::{DepackError, DepackResult};
use crate::di::ServiceContainer;
use crate::graph::ModuleGraph;
use crate::install::{InstallOrchestrator, InstallPlan, TargetFailure, TargetPlanner};
use crate::peers::PeerDependencyExpander;
use crate::resolver::{Attribution, Blacklist, DependencyAccumulator, ModuleAttributor};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Counts from one attribution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributionSummary {
    pub externals: usize,
    pub attributed: usize,
    pub builtin: usize,
    pub blacklisted: usize,
    pub unresolved: usize,
}

/// Outcome of installing every target
#[derive(Debug, Default)]
pub struct PackReport {
    /// Targets installed successfully, by name
    pub installed: Vec<String>,
    /// Targets that failed, by name
    pub failed: Vec<TargetFailure>,
}

impl PackReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// `Err(TargetsFailed)` when any target failed
    pub fn into_result(self) -> DepackResult<()> {
        if self.failed.is_empty() {
            Ok(())
        } else {
            Err(DepackError::TargetsFailed(self.failed.len()))
        }
    }
}

/// Extracts the runtime packages each entry needs and installs them
///
/// `finish_modules` runs synchronously once the bundler has finalized its
/// graph; `plan` and `done` then work per target, concurrently, on the
/// finished records.
pub struct DependencyPacker {
    services: ServiceContainer,
    blacklist: Blacklist,
    accumulator: DependencyAccumulator,
    attributed: bool,
}

impl DependencyPacker {
    /// Create a packer; fails on an invalid blacklist pattern
    pub fn new(services: ServiceContainer) -> DepackResult<Self> {
        let blacklist = Blacklist::new(services.config().blacklist())?;
        Ok(Self {
            services,
            blacklist,
            accumulator: DependencyAccumulator::new(),
            attributed: false,
        })
    }

    /// Attribute every external module of the finalized graph
    ///
    /// Replaces the records of any previous pass. Never fails: unresolved and
    /// blacklisted requests are logged and skipped.
    pub fn finish_modules(&mut self, graph: &ModuleGraph) -> AttributionSummary {
        self.accumulator.clear();
        let mut attributor = ModuleAttributor::new(self.blacklist.clone());
        let mut summary = AttributionSummary::default();

        for request in graph.externals() {
            summary.externals += 1;
            match attributor.attribute(graph, &request) {
                Attribution::Attributed {
                    name,
                    range,
                    entries,
                } => {
                    summary.attributed += 1;
                    self.accumulator.record(&entries, &name, &range);
                }
                Attribution::Builtin => summary.builtin += 1,
                Attribution::Blacklisted { .. } => summary.blacklisted += 1,
                Attribution::Unresolved => summary.unresolved += 1,
            }
        }

        self.attributed = true;
        info!(
            externals = summary.externals,
            attributed = summary.attributed,
            unresolved = summary.unresolved,
            blacklisted = summary.blacklisted,
            "attributed external modules"
        );
        summary
    }

    /// Per-entry records from the last attribution pass
    pub fn accumulator(&self) -> &DependencyAccumulator {
        &self.accumulator
    }

    /// Final install plans, with peers merged when `expand_peers` is set
    pub async fn plan(&self, expand_peers: bool) -> (Vec<InstallPlan>, Vec<TargetFailure>) {
        let (plans, failures) = self.target_plans();
        if !expand_peers {
            return (plans, failures);
        }

        let expander = Arc::new(self.expander());
        let mut join_set = JoinSet::new();
        for plan in plans {
            let expander = Arc::clone(&expander);
            join_set.spawn(async move { expand_plan(&expander, plan).await });
        }

        let mut expanded = Vec::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(plan) => expanded.push(plan),
                Err(e) => warn!(error = %e, "peer expansion task failed"),
            }
        }
        expanded.sort_by(|a, b| a.target.cmp(&b.target));

        (expanded, failures)
    }

    /// Expand and install every target concurrently
    ///
    /// A failing target never stops its siblings; the report lists both.
    pub async fn done(&self, expand_peers: bool) -> PackReport {
        let (plans, mut failed) = self.target_plans();

        let expander = Arc::new(self.expander());
        let orchestrator = Arc::new(InstallOrchestrator::new(self.services.package_manager()));
        let mut join_set = JoinSet::new();

        for plan in plans {
            let expander = Arc::clone(&expander);
            let orchestrator = Arc::clone(&orchestrator);
            join_set.spawn(async move {
                let plan = if expand_peers {
                    expand_plan(&expander, plan).await
                } else {
                    plan
                };
                match orchestrator.install_for(&plan).await {
                    Ok(()) => Ok(plan.target),
                    Err(e) => Err(TargetFailure::new(plan.target, e)),
                }
            });
        }

        let mut installed = Vec::new();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(Ok(target)) => installed.push(target),
                Ok(Err(failure)) => failed.push(failure),
                Err(e) => failed.push(TargetFailure::new(
                    "<unknown>",
                    DepackError::PackageManager(format!("install task failed: {}", e)),
                )),
            }
        }

        installed.sort();
        failed.sort_by(|a, b| a.target.cmp(&b.target));
        PackReport { installed, failed }
    }

    fn target_plans(&self) -> (Vec<InstallPlan>, Vec<TargetFailure>) {
        if !self.attributed {
            warn!("planning before the module graph was attributed; records are empty");
        }
        TargetPlanner::new(self.services.config()).plan(&self.accumulator)
    }

    fn expander(&self) -> PeerDependencyExpander {
        PeerDependencyExpander::new(
            self.services.package_manager(),
            self.services.config().max_concurrent_queries(),
        )
        .with_blacklist(self.blacklist.clone())
    }
}

async fn expand_plan(expander: &PeerDependencyExpander, mut plan: InstallPlan) -> InstallPlan {
    plan.manifest.dependencies = expander.expand(&plan.manifest.dependencies).await;
    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::package::manifest::PackageManifest;
    use crate::di::mocks::{MockConfigProvider, MockPackageManager};
    use crate::graph::{Module, ModuleId};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Two handlers sharing one package, with a nested app manifest that
    /// does not declare everything the handlers import.
    fn project() -> (TempDir, ModuleGraph) {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let src = root.join("app").join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(
            root.join("package.json"),
            r#"{ "name": "svc", "dependencies": { "amazon-dax-client": "^1.2.0" } }"#,
        )
        .unwrap();
        fs::write(
            root.join("app").join("package.json"),
            r#"{
                "name": "app",
                "dependencies": {
                    "lodash": "^4.17.21",
                    "aws-sdk": "^2.1000.0",
                    "subscriptions-transport-ws": "^0.9.0"
                }
            }"#,
        )
        .unwrap();

        let graph = handlers_graph(&src, true);
        (temp, graph)
    }

    fn handlers_graph(src: &Path, b_imports_ws: bool) -> ModuleGraph {
        let mut graph = ModuleGraph::new();
        graph
            .add_module(Module::internal("a", "./src/a", src.join("a.ts")))
            .unwrap();
        graph
            .add_module(Module::internal("b", "./src/b", src.join("b.ts")))
            .unwrap();
        for (id, request) in [
            ("lodash", "lodash/fp"),
            ("aws", "aws-sdk/clients/s3"),
            ("ws", "subscriptions-transport-ws"),
            ("dax", "amazon-dax-client"),
            ("fs", "fs"),
        ] {
            graph
                .add_module(Module::external(id, request, src))
                .unwrap();
        }
        for (from, to) in [("a", "lodash"), ("a", "aws"), ("a", "ws"), ("a", "fs")] {
            graph
                .add_import(&ModuleId::new(from), &ModuleId::new(to))
                .unwrap();
        }
        graph
            .add_import(&ModuleId::new("b"), &ModuleId::new("dax"))
            .unwrap();
        if b_imports_ws {
            graph
                .add_import(&ModuleId::new("b"), &ModuleId::new("ws"))
                .unwrap();
        }
        graph.mark_entry(&ModuleId::new("a")).unwrap();
        graph.mark_entry(&ModuleId::new("b")).unwrap();
        graph
    }

    fn config(root: &Path) -> MockConfigProvider {
        MockConfigProvider {
            base_dir: root.to_path_buf(),
            blacklist: vec!["aws-sdk".to_string()],
            project_name: Some("svc".to_string()),
            ..Default::default()
        }
        .with_entry("a", &["./src/a"])
        .with_entry("b", &["./src/b"])
    }

    fn packer(config: MockConfigProvider, pm: &MockPackageManager) -> DependencyPacker {
        let services = ServiceContainer::with_providers(Arc::new(config), Arc::new(pm.clone()));
        DependencyPacker::new(services).unwrap()
    }

    fn create_output_dirs(root: &Path) {
        fs::create_dir_all(root.join(".webpack/a")).unwrap();
        fs::create_dir_all(root.join(".webpack/b")).unwrap();
    }

    fn written(root: &Path, target: &str) -> PackageManifest {
        PackageManifest::load(&root.join(".webpack").join(target)).unwrap()
    }

    #[test]
    fn test_finish_modules_summary() {
        let (temp, graph) = project();
        let mut packer = packer(config(temp.path()), &MockPackageManager::new());

        let summary = packer.finish_modules(&graph);
        assert_eq!(
            summary,
            AttributionSummary {
                externals: 5,
                attributed: 3,
                builtin: 1,
                blacklisted: 1,
                unresolved: 0,
            }
        );

        let a = packer.accumulator().record_for("./src/a").unwrap();
        assert_eq!(a.get("lodash").map(String::as_str), Some("^4.17.21"));
        assert!(!a.contains_key("aws-sdk"));
        assert!(!a.contains_key("fs"));

        let b = packer.accumulator().record_for("./src/b").unwrap();
        assert_eq!(b.get("amazon-dax-client").map(String::as_str), Some("^1.2.0"));
        assert!(b.contains_key("subscriptions-transport-ws"));
    }

    #[test]
    fn test_finish_modules_is_idempotent() {
        let (temp, graph) = project();
        let mut packer = packer(config(temp.path()), &MockPackageManager::new());

        packer.finish_modules(&graph);
        let first = packer.accumulator().record_for("./src/a").cloned();
        packer.finish_modules(&graph);
        assert_eq!(packer.accumulator().record_for("./src/a").cloned(), first);
        assert_eq!(packer.accumulator().entries().count(), 2);
    }

    #[test]
    fn test_removed_import_leaves_only_that_entry() {
        let (temp, graph) = project();
        let mut packer = packer(config(temp.path()), &MockPackageManager::new());
        packer.finish_modules(&graph);
        let first_pass = packer.accumulator().clone();

        let src = temp.path().join("app").join("src");
        let without_ws = handlers_graph(&src, false);
        packer.finish_modules(&without_ws);

        let a = packer.accumulator().record_for("./src/a").unwrap();
        assert!(a.contains_key("subscriptions-transport-ws"));
        let b = packer.accumulator().record_for("./src/b").unwrap();
        assert!(!b.contains_key("subscriptions-transport-ws"));
        assert!(b.contains_key("amazon-dax-client"));

        // Recording the second pass on top of the first keeps the stale entry
        let mut stale = first_pass;
        let mut attributor = ModuleAttributor::new(Blacklist::new(&["aws-sdk"]).unwrap());
        for request in without_ws.externals() {
            if let Attribution::Attributed {
                name,
                range,
                entries,
            } = attributor.attribute(&without_ws, &request)
            {
                stale.record(&entries, &name, &range);
            }
        }
        let stale_b = stale.record_for("./src/b").unwrap();
        assert!(stale_b.contains_key("subscriptions-transport-ws"));
    }

    #[tokio::test]
    async fn test_peers_never_reintroduce_blacklisted_or_builtin_packages() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(
            temp.path().join("package.json"),
            r#"{ "dependencies": { "aws-cdk-lib": "2.0.0", "aws-sdk": "^2.0.0" } }"#,
        )
        .unwrap();

        let mut graph = ModuleGraph::new();
        graph
            .add_module(Module::internal("main", "./src/main", src.join("main.ts")))
            .unwrap();
        graph
            .add_module(Module::external("cdk", "aws-cdk-lib", &src))
            .unwrap();
        graph
            .add_import(&ModuleId::new("main"), &ModuleId::new("cdk"))
            .unwrap();
        graph.mark_entry(&ModuleId::new("main")).unwrap();

        let config = MockConfigProvider {
            base_dir: temp.path().to_path_buf(),
            blacklist: vec!["aws-sdk".to_string()],
            ..Default::default()
        }
        .with_entry("main", &["./src/main"]);
        let pm = MockPackageManager::new().with_peers(
            "aws-cdk-lib",
            "2.0.0",
            r#"{"aws-sdk":"^2.0.0","fs":"*"}"#,
        );
        let mut packer = packer(config, &pm);
        packer.finish_modules(&graph);

        let (plans, failures) = packer.plan(true).await;
        assert!(failures.is_empty());
        let deps = &plans[0].manifest.dependencies;
        assert_eq!(deps.keys().collect::<Vec<_>>(), vec!["aws-cdk-lib"]);
        assert_eq!(pm.queries(), vec!["aws-cdk-lib@2.0.0"]);
    }

    #[tokio::test]
    async fn test_done_installs_every_target() {
        let (temp, graph) = project();
        create_output_dirs(temp.path());
        let pm = MockPackageManager::new().with_peers(
            "subscriptions-transport-ws",
            "0.9.0",
            r#"{"type":"inline","data":{"graphql":"^15.0.0"}}"#,
        );
        let mut packer = packer(config(temp.path()), &pm);
        packer.finish_modules(&graph);

        let report = packer.done(true).await;
        assert!(report.is_success());
        assert_eq!(report.installed, vec!["a", "b"]);

        let a = written(temp.path(), "a");
        assert_eq!(a.name.as_deref(), Some("svc-a"));
        assert_eq!(
            a.dependencies.keys().collect::<Vec<_>>(),
            vec!["graphql", "lodash", "subscriptions-transport-ws"]
        );

        let b = written(temp.path(), "b");
        assert_eq!(b.dependency("graphql"), Some("^15.0.0"));
        assert_eq!(b.dependency("amazon-dax-client"), Some("^1.2.0"));
        assert!(b.dependency("lodash").is_none());

        assert_eq!(pm.installs().len(), 2);
        assert!(!temp.path().join(".webpack/a/.depack-cache").exists());
    }

    #[tokio::test]
    async fn test_done_without_peers_skips_queries() {
        let (temp, graph) = project();
        create_output_dirs(temp.path());
        let pm = MockPackageManager::new();
        let mut packer = packer(config(temp.path()), &pm);
        packer.finish_modules(&graph);

        let report = packer.done(false).await;
        assert!(report.is_success());
        assert!(pm.queries().is_empty());
        assert!(written(temp.path(), "a").dependency("graphql").is_none());
    }

    #[tokio::test]
    async fn test_missing_output_dir_fails_only_that_target() {
        let (temp, graph) = project();
        fs::create_dir_all(temp.path().join(".webpack/b")).unwrap();
        let pm = MockPackageManager::new();
        let mut packer = packer(config(temp.path()), &pm);
        packer.finish_modules(&graph);

        let report = packer.done(true).await;
        assert_eq!(report.installed, vec!["b"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].target, "a");
        assert!(matches!(
            report.failed[0].error,
            DepackError::MissingOutputDir(_)
        ));
        assert!(matches!(
            report.into_result(),
            Err(DepackError::TargetsFailed(1))
        ));
    }

    #[tokio::test]
    async fn test_install_failure_is_isolated() {
        let (temp, graph) = project();
        create_output_dirs(temp.path());
        let pm = MockPackageManager::new().with_failing_install("a", 1, "ERESOLVE");
        let mut packer = packer(config(temp.path()), &pm);
        packer.finish_modules(&graph);

        let report = packer.done(true).await;
        assert_eq!(report.installed, vec!["b"]);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].to_string().contains("ERESOLVE"));
    }

    #[tokio::test]
    async fn test_failed_peer_query_keeps_direct_dependencies() {
        let (temp, graph) = project();
        let pm = MockPackageManager::new().with_failing_peers("lodash", "4.17.21");
        let mut packer = packer(config(temp.path()), &pm);
        packer.finish_modules(&graph);

        let (plans, failures) = packer.plan(true).await;
        assert!(failures.is_empty());
        assert_eq!(plans[0].target, "a");
        assert!(plans[0].manifest.dependencies.contains_key("lodash"));
        assert!(pm.queries().contains(&"lodash@4.17.21".to_string()));
    }

    #[tokio::test]
    async fn test_plan_before_attribution_is_empty() {
        let (temp, _graph) = project();
        let packer = packer(config(temp.path()), &MockPackageManager::new());

        let (plans, _) = packer.plan(false).await;
        assert!(plans.iter().all(|p| p.manifest.dependencies.is_empty()));
    }

    #[test]
    fn test_invalid_blacklist_pattern() {
        let mut config = MockConfigProvider::default();
        config.blacklist = vec!["/([/".to_string()];
        let services = ServiceContainer::with_providers(
            Arc::new(config),
            Arc::new(MockPackageManager::new()),
        );
        assert!(matches!(
            DependencyPacker::new(services),
            Err(DepackError::Config(_))
        ));
    }
}
