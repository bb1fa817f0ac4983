//! Flashgen synthesis: builds the effective engine and proxy configuration of a
//! storage node from a partial user document and the cluster topology.
//!
//! Flow: pick a [`Dialect`] from the engine version, apply that dialect's default
//! rules with set-if-absent semantics, then run the [`TlsAugmenter`]. The caller's
//! documents are cloned first and never touched.

#![forbid(unsafe_code)]

use flashgen_core::{ConfigDocument, DocumentError};
use flashgen_topology::ClusterTopology;
use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::debug;

mod current;
mod dialect;
mod legacy;
pub mod rules;
pub mod tls;

pub use dialect::{parse_version, select_dialect, try_select_dialect, Dialect, DIALECT_THRESHOLD};
pub use rules::{apply_rules, ensure_log_defaults, DefaultRule, StorageLayout};
pub use tls::TlsAugmenter;

#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("invalid engine version '{version}': {source}")]
    VersionParse { version: String, source: semver::Error },
}

/// User-supplied documents; either may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialConfig {
    #[serde(alias = "config", skip_serializing_if = "Option::is_none")]
    pub engine: Option<ConfigDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ConfigDocument>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthOptions {
    /// Reject unparsable engine versions instead of falling back to the legacy dialect.
    pub strict_version: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizedConfig {
    pub dialect: Dialect,
    pub engine: ConfigDocument,
    pub proxy: ConfigDocument,
}

/// Synthesize with default options (lenient version handling).
pub fn synthesize(topo: &ClusterTopology, partial: &PartialConfig) -> Result<SynthesizedConfig, SynthError> {
    synthesize_with(topo, partial, SynthOptions::default())
}

pub fn synthesize_with(topo: &ClusterTopology, partial: &PartialConfig, opts: SynthOptions) -> Result<SynthesizedConfig, SynthError> {
    let dialect = if opts.strict_version { try_select_dialect(&topo.version)? } else { select_dialect(&topo.version) };

    let mut engine = partial.engine.clone().unwrap_or_default();
    let mut proxy = partial.proxy.clone().unwrap_or_default();

    let written = apply_rules(&mut engine, topo, &dialect.engine_rules(topo))?
        + apply_rules(&mut proxy, topo, &dialect.proxy_rules(topo))?;
    TlsAugmenter::new(dialect).apply(topo.tls_enabled, &mut engine, &mut proxy)?;

    counter!("synth_runs", 1u64, "dialect" => dialect.name());
    counter!("synth_rules_applied", written as u64);
    debug!(
        cluster = %topo.name,
        ns = %topo.namespace,
        dialect = %dialect,
        tls = topo.tls_enabled,
        defaults_written = written,
        "config synthesized"
    );
    Ok(SynthesizedConfig { dialect, engine, proxy })
}
