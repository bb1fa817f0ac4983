//! Schema generations and version-based selection between them.

use std::fmt;

use flashgen_topology::ClusterTopology;
use metrics::counter;
use semver::Version;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::rules::{self, DefaultRule, StorageLayout};
use crate::{current, legacy, SynthError};

/// First engine version that reads the hierarchical schema.
pub const DIALECT_THRESHOLD: Version = Version::new(5, 4, 0);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Before 5.4.0: flat `path`, explicit quotas/users/profiles.
    Legacy,
    /// 5.4.0 and later: `storage.main.dir`, lean defaults.
    Current,
}

impl Dialect {
    pub fn for_version(version: &Version) -> Self {
        if *version >= DIALECT_THRESHOLD { Dialect::Current } else { Dialect::Legacy }
    }

    pub fn name(self) -> &'static str {
        match self { Dialect::Legacy => "legacy", Dialect::Current => "current" }
    }

    pub fn storage_layout(self) -> StorageLayout {
        match self { Dialect::Legacy => StorageLayout::Flat, Dialect::Current => StorageLayout::Hierarchical }
    }

    /// Whether a non-TLS cluster has the secure port keys stripped. Only the
    /// legacy generation does this.
    pub fn clears_secure_ports_without_tls(self) -> bool { matches!(self, Dialect::Legacy) }

    /// Storage directories first, then the generation's own table.
    pub fn engine_rules(self, topo: &ClusterTopology) -> Vec<DefaultRule> {
        let mut out = rules::storage_rules(self.storage_layout(), topo);
        out.extend(match self {
            Dialect::Legacy => legacy::engine_rules(topo),
            Dialect::Current => current::engine_rules(topo),
        });
        out
    }

    pub fn proxy_rules(self, topo: &ClusterTopology) -> Vec<DefaultRule> { rules::proxy_rules(topo) }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Parse an engine version. Accepts a leading `v` and `major.minor` shorthand.
pub fn parse_version(raw: &str) -> Result<Version, semver::Error> {
    let trimmed = raw.trim();
    let s = trimmed.strip_prefix('v').unwrap_or(trimmed);
    match Version::parse(s) {
        Ok(v) => Ok(v),
        Err(e) => {
            let parts: Vec<&str> = s.split('.').collect();
            let short = parts.len() == 2 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()));
            if short { Version::parse(&format!("{}.0", s)) } else { Err(e) }
        }
    }
}

/// Strict selection: an unparsable version is an error.
pub fn try_select_dialect(version: &str) -> Result<Dialect, SynthError> {
    let parsed = parse_version(version).map_err(|source| SynthError::VersionParse { version: version.to_string(), source })?;
    let dialect = Dialect::for_version(&parsed);
    debug!(version = %parsed, dialect = %dialect, "dialect selected");
    Ok(dialect)
}

/// Lenient selection: an unparsable version (`latest`, `nightly`, empty) falls
/// back to the legacy dialect.
pub fn select_dialect(version: &str) -> Dialect {
    match try_select_dialect(version) {
        Ok(d) => d,
        Err(e) => {
            warn!(error = %e, "falling back to legacy config dialect");
            counter!("synth_version_fallback", 1u64);
            Dialect::Legacy
        }
    }
}
