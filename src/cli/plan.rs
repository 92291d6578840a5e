use super::{attributed_packer, report_failures, GraphOptions};
use depack::core::{DepackError, DepackResult};
use depack::TargetManifest;
use std::collections::BTreeMap;

pub async fn run(options: GraphOptions) -> DepackResult<()> {
    let packer = attributed_packer(&options)?;
    let (plans, failures) = packer.plan(!options.skip_peers).await;

    let manifests: BTreeMap<String, TargetManifest> = plans
        .into_iter()
        .map(|plan| (plan.target, plan.manifest))
        .collect();
    println!("{}", serde_json::to_string_pretty(&manifests)?);

    report_failures(&failures);
    if failures.is_empty() {
        Ok(())
    } else {
        Err(DepackError::TargetsFailed(failures.len()))
    }
}
