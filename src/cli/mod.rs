use depack::config::Config;
use depack::core::error_help::format_error_with_help;
use depack::core::DepackResult;
use depack::di::ServiceContainer;
use depack::graph::ModuleGraph;
use depack::install::TargetFailure;
use depack::DependencyPacker;
use std::path::PathBuf;

pub mod pack;
pub mod plan;

/// Options shared by `pack` and `plan`
pub struct GraphOptions {
    pub config: PathBuf,
    pub graph: PathBuf,
    pub skip_peers: bool,
}

/// Load config and graph, then attribute every external module
fn attributed_packer(options: &GraphOptions) -> DepackResult<DependencyPacker> {
    let config = Config::load(&options.config)?;
    let graph = ModuleGraph::load(&options.graph)?;

    let mut packer = DependencyPacker::new(ServiceContainer::new(config))?;
    let summary = packer.finish_modules(&graph);
    if summary.unresolved > 0 {
        eprintln!(
            "⚠ {} external module(s) could not be attributed to a declared package",
            summary.unresolved
        );
    }
    Ok(packer)
}

fn report_failures(failures: &[TargetFailure]) {
    for failure in failures {
        eprintln!("✗ {}", failure.target);
        eprintln!("{}", format_error_with_help(&failure.error));
    }
}
