//! Declarative default rules and the single evaluator that applies them.
//!
//! A rule is `(key, default, optional predicate)`. Evaluation never overwrites:
//! every write goes through [`ConfigDocument::set_if_absent`], so whatever the
//! caller put in the partial document survives.

use std::fmt;

use flashgen_core::{ConfigDocument, DocumentError, Value};
use flashgen_topology::{naming, ClusterTopology};
use tracing::trace;

pub const DEFAULT_CLUSTER_LOG: &str = "/data0/logs/flash_cluster_manager.log";
pub const DEFAULT_ERROR_LOG: &str = "/data0/logs/error.log";
pub const DEFAULT_SERVER_LOG: &str = "/data0/logs/server.log";

pub const SERVER_LOG_KEY: &str = "logger.log";
pub const ERROR_LOG_KEY: &str = "logger.errorlog";
pub const CLUSTER_LOG_KEY: &str = "flash.flash_cluster.log";

/// Decides whether a rule applies, given the document as built so far.
pub type Predicate = fn(&ConfigDocument, &ClusterTopology) -> bool;

#[derive(Clone)]
pub struct DefaultRule {
    pub key: &'static str,
    pub value: Value,
    pub predicate: Option<Predicate>,
}

impl fmt::Debug for DefaultRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultRule")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("conditional", &self.predicate.is_some())
            .finish()
    }
}

impl DefaultRule {
    pub fn new(key: &'static str, value: impl Into<Value>) -> Self {
        Self { key, value: value.into(), predicate: None }
    }

    pub fn when(mut self, predicate: Predicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    pub fn applies(&self, doc: &ConfigDocument, topo: &ClusterTopology) -> bool {
        self.predicate.map_or(true, |p| p(doc, topo))
    }
}

/// Apply `rules` in order. Returns how many keys were written.
pub fn apply_rules(doc: &mut ConfigDocument, topo: &ClusterTopology, rules: &[DefaultRule]) -> Result<usize, DocumentError> {
    let mut written = 0usize;
    for rule in rules {
        if !rule.applies(doc, topo) {
            trace!(key = rule.key, "rule predicate not met");
            continue;
        }
        if doc.set_if_absent(rule.key, rule.value.clone())? {
            written += 1;
        }
    }
    Ok(written)
}

/// How a dialect lays out the data directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageLayout {
    /// `path = "/data0/db,/data1/db"`
    Flat,
    /// `storage.main.dir = ["/data0/db", "/data1/db"]`
    Hierarchical,
}

/// One `/data<i>/db` per declared volume, at least one.
pub fn storage_paths(claims: usize) -> Vec<String> {
    (0..claims.max(1)).map(|i| format!("/data{}/db", i)).collect()
}

pub(crate) fn storage_rules(layout: StorageLayout, topo: &ClusterTopology) -> Vec<DefaultRule> {
    let paths = storage_paths(topo.storage_claims);
    match layout {
        StorageLayout::Flat => vec![DefaultRule::new("path", paths.join(","))],
        StorageLayout::Hierarchical => vec![
            // documents carried over from the flat layout keep their `path`
            DefaultRule::new("storage.main.dir", paths).when(|doc, _| !doc.contains("path")),
            DefaultRule::new("storage.raft.dir", vec!["/data0/kvstore"]).when(|doc, _| !doc.contains("raft.kvstore_path")),
        ],
    }
}

pub(crate) fn log_path_rules() -> Vec<DefaultRule> {
    vec![
        DefaultRule::new(ERROR_LOG_KEY, DEFAULT_ERROR_LOG),
        DefaultRule::new(SERVER_LOG_KEY, DEFAULT_SERVER_LOG),
    ]
}

/// Addresses under `flash.*` plus the cluster manager log.
pub(crate) fn flash_address_rules(topo: &ClusterTopology) -> Vec<DefaultRule> {
    let resolver = topo.resolver();
    let listen = topo.listen_host();
    vec![
        DefaultRule::new("flash.tidb_status_addr", resolver.compute_tier_status_address()),
        DefaultRule::new("flash.service_addr", listen.bind(naming::ENGINE_SERVICE_PORT)),
        DefaultRule::new(CLUSTER_LOG_KEY, DEFAULT_CLUSTER_LOG),
        DefaultRule::new("flash.proxy.addr", listen.bind(naming::PROXY_PORT)),
        DefaultRule::new("flash.proxy.advertise-addr", resolver.proxy_peer_address()),
        DefaultRule::new("flash.proxy.data-dir", "/data0/proxy"),
        DefaultRule::new("flash.proxy.config", "/data0/proxy.toml"),
    ]
}

pub(crate) fn placement_rule(topo: &ClusterTopology) -> DefaultRule {
    DefaultRule::new("raft.pd_addr", topo.resolver().placement_service_address())
}

/// The proxy document is the same in both dialects.
pub(crate) fn proxy_rules(topo: &ClusterTopology) -> Vec<DefaultRule> {
    let resolver = topo.resolver();
    vec![
        DefaultRule::new("log-level", "info"),
        DefaultRule::new("server.engine-addr", resolver.engine_peer_address()),
        DefaultRule::new("server.status-addr", topo.listen_host().bind(naming::PROXY_STATUS_PORT)),
        DefaultRule::new("server.advertise-status-addr", resolver.proxy_status_address()),
    ]
}

/// Fill only the three log file paths. The sidecar builder needs these even
/// when no full synthesis has run.
pub fn ensure_log_defaults(doc: &mut ConfigDocument) -> Result<(), DocumentError> {
    doc.set_if_absent(CLUSTER_LOG_KEY, DEFAULT_CLUSTER_LOG)?;
    doc.set_if_absent(ERROR_LOG_KEY, DEFAULT_ERROR_LOG)?;
    doc.set_if_absent(SERVER_LOG_KEY, DEFAULT_SERVER_LOG)?;
    Ok(())
}
