//! Service names, ports and placeholder tokens shared by every address.

pub const PD_PORT: u16 = 2379;
pub const TIDB_STATUS_PORT: u16 = 10080;
pub const ENGINE_SERVICE_PORT: u16 = 3930;
pub const PROXY_PORT: u16 = 20170;
pub const PROXY_STATUS_PORT: u16 = 20292;
pub const METRICS_PORT: u16 = 8234;

/// Replaced by the startup script with an address obtained from discovery.
pub const PD_ADDR_SENTINEL: &str = "PD_ADDR";
/// Replaced by the workload controller with the pod ordinal.
pub const POD_NUM_TOKEN: &str = "POD_NUM";

pub fn pd_service(cluster: &str) -> String { format!("{}-pd", cluster) }

pub fn tidb_service(cluster: &str) -> String { format!("{}-tidb", cluster) }

pub fn tidb_peer_service(cluster: &str) -> String { format!("{}-tidb-peer", cluster) }

pub fn tiflash_set(cluster: &str) -> String { format!("{}-tiflash", cluster) }

pub fn tiflash_peer_service(cluster: &str) -> String { format!("{}-tiflash-peer", cluster) }

/// `""` for an empty domain, else `.<domain>`.
pub fn domain_suffix(cluster_domain: &str) -> String {
    if cluster_domain.is_empty() { String::new() } else { format!(".{}", cluster_domain) }
}

/// `<service>.<namespace>.svc<suffix>:<port>`
pub fn service_addr(service: &str, namespace: &str, cluster_domain: &str, port: u16) -> String {
    format!("{}.{}.svc{}:{}", service, namespace, domain_suffix(cluster_domain), port)
}
