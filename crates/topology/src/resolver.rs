use tracing::trace;

use crate::naming::{self, service_addr};
use crate::ClusterTopology;

/// Pure address derivations over a [`ClusterTopology`]. Every function is total.
#[derive(Debug, Clone, Copy)]
pub struct TopologyResolver<'a> {
    topo: &'a ClusterTopology,
}

impl<'a> TopologyResolver<'a> {
    pub fn new(topo: &'a ClusterTopology) -> Self { Self { topo } }

    /// Placement service (PD) client address.
    ///
    /// Across Kubernetes clusters the address is only known at runtime, so the
    /// discovery sentinel wins over everything else. A heterogeneous cluster
    /// without its own PD talks to the reference cluster's PD. Otherwise the
    /// local PD is reached without a domain suffix.
    pub fn placement_service_address(&self) -> String {
        let t = self.topo;
        if t.across_k8s {
            return naming::PD_ADDR_SENTINEL.to_string();
        }
        if t.no_local_pd {
            if let Some(r) = t.reference() {
                trace!(reference = %r.name, "placement service from reference cluster");
                return service_addr(
                    &naming::pd_service(&r.name),
                    t.reference_namespace(r),
                    &r.cluster_domain,
                    naming::PD_PORT,
                );
            }
        }
        service_addr(&naming::pd_service(&t.name), &t.namespace, "", naming::PD_PORT)
    }

    /// Status address of the compute tier (TiDB).
    ///
    /// Across Kubernetes clusters the reference cluster's peer (headless)
    /// service is used so every pod stays individually addressable.
    pub fn compute_tier_status_address(&self) -> String {
        let t = self.topo;
        if t.no_local_tidb {
            if let Some(r) = t.reference() {
                let service = if t.across_k8s {
                    naming::tidb_peer_service(&r.name)
                } else {
                    naming::tidb_service(&r.name)
                };
                return service_addr(&service, t.reference_namespace(r), &r.cluster_domain, naming::TIDB_STATUS_PORT);
            }
        }
        service_addr(&naming::tidb_service(&t.name), &t.namespace, "", naming::TIDB_STATUS_PORT)
    }

    /// Per-pod address through the local peer service:
    /// `<cluster>-tiflash-POD_NUM.<cluster>-tiflash-peer.<ns>.svc<suffix>:<port>`.
    pub fn peer_address(&self, port: u16) -> String {
        let t = self.topo;
        format!(
            "{}-{}.{}.{}.svc{}:{}",
            naming::tiflash_set(&t.name),
            naming::POD_NUM_TOKEN,
            naming::tiflash_peer_service(&t.name),
            t.namespace,
            naming::domain_suffix(&t.cluster_domain),
            port
        )
    }

    /// Address the proxy advertises to peers.
    pub fn proxy_peer_address(&self) -> String { self.peer_address(naming::PROXY_PORT) }

    /// Address the proxy advertises for status reporting.
    pub fn proxy_status_address(&self) -> String { self.peer_address(naming::PROXY_STATUS_PORT) }

    /// Address the proxy uses to reach the engine in the same pod.
    pub fn engine_peer_address(&self) -> String { self.peer_address(naming::ENGINE_SERVICE_PORT) }
}
