use crate::core::version::{pinned_version, Version};
use crate::core::{DepackError, DepackResult};
use crate::di::PackageManagerClient;
use crate::resolver::builtins::is_builtin;
use crate::resolver::{Blacklist, DependencyRecord};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Peer name -> range, as declared by one package
pub type PeerExpansion = BTreeMap<String, String>;

/// Parse the stdout of a peer dependency query
///
/// Accepts a plain mapping, a `{ "type": ..., "data": <mapping> }` envelope,
/// or nothing at all (no peers declared).
pub fn parse_peer_response(stdout: &str) -> DepackResult<PeerExpansion> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(PeerExpansion::new());
    }

    let value: Value = serde_json::from_str(trimmed)?;
    let mapping = match value {
        Value::Object(ref object) if object.contains_key("type") && object.contains_key("data") => {
            &object["data"]
        }
        ref other => other,
    };

    match mapping {
        Value::Null => Ok(PeerExpansion::new()),
        Value::Object(object) => object
            .iter()
            .map(|(name, range)| match range {
                Value::String(range) => Ok((name.clone(), range.clone())),
                other => Err(DepackError::PackageManager(format!(
                    "Peer dependency '{}' has a non-string range: {}",
                    name, other
                ))),
            })
            .collect(),
        other => Err(DepackError::PackageManager(format!(
            "Unexpected peer dependency response: {}",
            other
        ))),
    }
}

/// Adds each package's declared peers to a dependency record
///
/// Queries run concurrently, bounded by `max_concurrent`. Each query task
/// returns its own immutable result; the expander merges them afterwards in
/// package-name order, so completion order never changes the output.
/// Peers that are platform built-ins or blacklisted are dropped.
pub struct PeerDependencyExpander {
    client: Arc<dyn PackageManagerClient>,
    max_concurrent: usize,
    blacklist: Blacklist,
}

impl PeerDependencyExpander {
    /// Create a new expander
    pub fn new(client: Arc<dyn PackageManagerClient>, max_concurrent: usize) -> Self {
        Self {
            client,
            max_concurrent: max_concurrent.max(1),
            blacklist: Blacklist::default(),
        }
    }

    /// Drop peers matching `blacklist`
    pub fn with_blacklist(mut self, blacklist: Blacklist) -> Self {
        self.blacklist = blacklist;
        self
    }

    /// Return `record` plus the peers of every package pinned to a concrete version
    ///
    /// Explicit entries are never overwritten and peers of added peers are not
    /// queried. A failed or malformed query skips that package only.
    pub async fn expand(&self, record: &DependencyRecord) -> DependencyRecord {
        let queries: Vec<(String, Version)> = record
            .iter()
            .filter_map(|(name, range)| match pinned_version(range) {
                Some(version) => Some((name.clone(), version)),
                None => {
                    debug!(package = %name, range = %range, "range is not a plain version; skipping peer query");
                    None
                }
            })
            .collect();

        let mut results: Vec<(String, PeerExpansion)> = Vec::new();
        let mut join_set = JoinSet::new();

        for (name, version) in queries {
            if join_set.len() >= self.max_concurrent {
                // Wait for one query to complete before adding another
                if let Some(result) = join_set.join_next().await {
                    Self::collect(result, &mut results);
                }
            }

            let client = Arc::clone(&self.client);
            join_set.spawn(async move { Self::query(client.as_ref(), name, version).await });
        }

        while let Some(result) = join_set.join_next().await {
            Self::collect(result, &mut results);
        }

        merge_peers(record, results, &self.blacklist)
    }

    async fn query(
        client: &dyn PackageManagerClient,
        name: String,
        version: Version,
    ) -> Option<(String, PeerExpansion)> {
        let peers = client
            .peer_dependencies(&name, &version)
            .await
            .and_then(|stdout| parse_peer_response(&stdout));

        match peers {
            Ok(peers) => Some((name, peers)),
            Err(e) => {
                warn!(package = %name, %version, error = %e, "peer dependency query failed; skipping");
                None
            }
        }
    }

    fn collect(
        result: Result<Option<(String, PeerExpansion)>, tokio::task::JoinError>,
        results: &mut Vec<(String, PeerExpansion)>,
    ) {
        match result {
            Ok(Some(found)) => results.push(found),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "peer dependency query task failed"),
        }
    }
}

/// Insert peers into a copy of `record`, in package-name order, without overriding
///
/// Built-in and blacklisted peers never enter the record.
pub fn merge_peers(
    record: &DependencyRecord,
    mut results: Vec<(String, PeerExpansion)>,
    blacklist: &Blacklist,
) -> DependencyRecord {
    results.sort_by(|a, b| a.0.cmp(&b.0));

    let mut merged = record.clone();
    for (package, peers) in results {
        for (peer, range) in peers {
            if is_builtin(&peer) {
                debug!(package = %package, peer = %peer, "dropping built-in peer dependency");
                continue;
            }
            if blacklist.matches(&peer) {
                info!(package = %package, peer = %peer, "dropping blacklisted peer dependency");
                continue;
            }
            if !merged.contains_key(&peer) {
                debug!(package = %package, peer = %peer, range = %range, "adding peer dependency");
                merged.insert(peer, range);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::di::mocks::MockPackageManager;

    fn record(pairs: &[(&str, &str)]) -> DependencyRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_direct_mapping() {
        let peers = parse_peer_response(r#"{"react":"^18.0.0"}"#).unwrap();
        assert_eq!(peers.get("react").map(String::as_str), Some("^18.0.0"));
    }

    #[test]
    fn test_parse_envelope() {
        let peers =
            parse_peer_response(r#"{"type":"inline","data":{"peer-a":"^2.0.0"}}"#).unwrap();
        assert_eq!(peers, record(&[("peer-a", "^2.0.0")]));
    }

    #[test]
    fn test_parse_empty_and_null() {
        assert!(parse_peer_response("").unwrap().is_empty());
        assert!(parse_peer_response("  \n").unwrap().is_empty());
        assert!(parse_peer_response(r#"{"type":"inspect","data":null}"#)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_peer_response("not json").is_err());
        assert!(parse_peer_response(r#"["a"]"#).is_err());
        assert!(parse_peer_response(r#"{"peer":1}"#).is_err());
    }

    #[tokio::test]
    async fn test_expand_merges_envelope_peers() {
        let pm = MockPackageManager::new().with_peers(
            "pkg",
            "1.0.0",
            r#"{"type":"inline","data":{"peer-a":"^2.0.0"}}"#,
        );
        let expander = PeerDependencyExpander::new(Arc::new(pm.clone()), 4);

        let expanded = expander.expand(&record(&[("pkg", "^1.0.0")])).await;

        assert_eq!(expanded, record(&[("pkg", "^1.0.0"), ("peer-a", "^2.0.0")]));
        assert_eq!(pm.queries(), vec!["pkg@1.0.0"]);
    }

    #[tokio::test]
    async fn test_expand_never_overrides_explicit_entries() {
        let pm = MockPackageManager::new().with_peers("pkg", "1.0.0", r#"{"peer-a":"^2.0.0"}"#);
        let expander = PeerDependencyExpander::new(Arc::new(pm), 4);

        let expanded = expander
            .expand(&record(&[("pkg", "1.0.0"), ("peer-a", "~2.1.0")]))
            .await;

        assert_eq!(expanded.get("peer-a").map(String::as_str), Some("~2.1.0"));
    }

    #[tokio::test]
    async fn test_expand_skips_failed_and_malformed_queries() {
        let pm = MockPackageManager::new()
            .with_failing_peers("broken", "1.0.0")
            .with_peers("garbled", "2.0.0", "<html>")
            .with_peers("good", "3.0.0", r#"{"peer-ok":"^1.0.0"}"#);
        let expander = PeerDependencyExpander::new(Arc::new(pm), 1);

        let expanded = expander
            .expand(&record(&[
                ("broken", "^1.0.0"),
                ("garbled", "^2.0.0"),
                ("good", "^3.0.0"),
            ]))
            .await;

        assert_eq!(expanded.len(), 4);
        assert!(expanded.contains_key("peer-ok"));
    }

    #[tokio::test]
    async fn test_expand_skips_complex_ranges() {
        let pm = MockPackageManager::new();
        let expander = PeerDependencyExpander::new(Arc::new(pm.clone()), 4);

        let expanded = expander
            .expand(&record(&[("a", ">=1.0.0 <2.0.0"), ("b", "latest"), ("c", "~1.2.3")]))
            .await;

        assert_eq!(expanded.len(), 3);
        assert_eq!(pm.queries(), vec!["c@1.2.3"]);
    }

    #[tokio::test]
    async fn test_expand_is_single_level() {
        let pm = MockPackageManager::new()
            .with_peers("pkg", "1.0.0", r#"{"peer-a":"2.0.0"}"#)
            .with_peers("peer-a", "2.0.0", r#"{"peer-b":"3.0.0"}"#);
        let expander = PeerDependencyExpander::new(Arc::new(pm.clone()), 4);

        let expanded = expander.expand(&record(&[("pkg", "1.0.0")])).await;

        assert!(expanded.contains_key("peer-a"));
        assert!(!expanded.contains_key("peer-b"));
        assert_eq!(pm.queries(), vec!["pkg@1.0.0"]);
    }

    #[test]
    fn test_merge_peers_is_order_independent() {
        let base = record(&[("a", "1.0.0"), ("b", "1.0.0")]);
        let from_a = ("a".to_string(), record(&[("shared", "^1.0.0")]));
        let from_b = ("b".to_string(), record(&[("shared", "^2.0.0")]));

        let one = merge_peers(&base, vec![from_a.clone(), from_b.clone()], &Blacklist::default());
        let two = merge_peers(&base, vec![from_b, from_a], &Blacklist::default());

        assert_eq!(one, two);
        assert_eq!(one.get("shared").map(String::as_str), Some("^1.0.0"));
    }

    #[tokio::test]
    async fn test_expand_drops_blacklisted_and_builtin_peers() {
        let pm = MockPackageManager::new().with_peers(
            "aws-cdk-lib",
            "2.0.0",
            r#"{"aws-sdk":"^2.0.0","fs":"*","node:path":"*","constructs":"^10.0.0"}"#,
        );
        let expander = PeerDependencyExpander::new(Arc::new(pm), 4)
            .with_blacklist(Blacklist::new(&["aws-sdk"]).unwrap());

        let expanded = expander.expand(&record(&[("aws-cdk-lib", "2.0.0")])).await;

        assert_eq!(
            expanded,
            record(&[("aws-cdk-lib", "2.0.0"), ("constructs", "^10.0.0")])
        );
    }

    #[test]
    fn test_merge_peers_honours_regex_blacklist() {
        let base = record(&[("pkg", "1.0.0")]);
        let peers = (
            "pkg".to_string(),
            record(&[("@aws-sdk/client-s3", "^3.0.0"), ("peer-a", "^1.0.0")]),
        );
        let blacklist = Blacklist::new(&["/^@aws-sdk/"]).unwrap();

        let merged = merge_peers(&base, vec![peers], &blacklist);

        assert!(!merged.contains_key("@aws-sdk/client-s3"));
        assert!(merged.contains_key("peer-a"));
    }
}
