use super::{attributed_packer, report_failures, GraphOptions};
use depack::core::DepackResult;

pub async fn run(options: GraphOptions) -> DepackResult<()> {
    let packer = attributed_packer(&options)?;
    let report = packer.done(!options.skip_peers).await;

    for target in &report.installed {
        println!("✓ Installed packages for {}", target);
    }
    report_failures(&report.failed);

    report.into_result()
}
