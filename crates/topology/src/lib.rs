//! Flashgen topology: the facts a synthesis call is given about the cluster, and
//! the addresses derived from them.

#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

pub mod naming;
mod resolver;

pub use resolver::TopologyResolver;

/// Another, separately declared cluster that this one borrows components from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceCluster {
    pub name: String,
    /// Empty means "same namespace as the local cluster".
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub cluster_domain: String,
}

/// Immutable inputs for one synthesis call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterTopology {
    pub name: String,
    pub namespace: String,
    pub cluster_domain: String,
    /// Engine version, e.g. `v5.4.0`.
    pub version: String,
    pub prefer_ipv6: bool,
    pub tls_enabled: bool,
    /// Number of declared storage volumes.
    pub storage_claims: usize,
    pub reference: Option<ReferenceCluster>,
    pub across_k8s: bool,
    pub no_local_pd: bool,
    pub no_local_tidb: bool,
}

impl ClusterTopology {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self { name: name.into(), namespace: namespace.into(), ..Self::default() }
    }

    /// A reference cluster with a name is declared.
    pub fn heterogeneous(&self) -> bool {
        self.reference.as_ref().is_some_and(|r| !r.name.is_empty())
    }

    /// The reference cluster, only when heterogeneous.
    pub fn reference(&self) -> Option<&ReferenceCluster> {
        self.reference.as_ref().filter(|r| !r.name.is_empty())
    }

    /// Namespace the reference cluster lives in, defaulting to ours.
    pub fn reference_namespace<'a>(&'a self, r: &'a ReferenceCluster) -> &'a str {
        if r.namespace.is_empty() { &self.namespace } else { &r.namespace }
    }

    pub fn listen_host(&self) -> ListenHost {
        if self.prefer_ipv6 { ListenHost::V6 } else { ListenHost::V4 }
    }

    pub fn resolver(&self) -> TopologyResolver<'_> { TopologyResolver::new(self) }
}

/// Wildcard bind address. The proxy and the engine spell the IPv6 form differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ListenHost {
    V4,
    V6,
}

impl ListenHost {
    /// Host part for `host:port` bind strings (`[::]` under IPv6).
    pub fn proxy_literal(self) -> &'static str {
        match self { ListenHost::V4 => "0.0.0.0", ListenHost::V6 => "[::]" }
    }

    /// Value for the engine's `listen_host` field, which must be `::` and not `[::]`.
    pub fn engine_literal(self) -> &'static str {
        match self { ListenHost::V4 => "0.0.0.0", ListenHost::V6 => "::" }
    }

    pub fn bind(self, port: u16) -> String { format!("{}:{}", self.proxy_literal(), port) }

    pub fn is_ipv6(self) -> bool { matches!(self, ListenHost::V6) }
}
