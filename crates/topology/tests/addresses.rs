#![forbid(unsafe_code)]

use flashgen_topology::{ClusterTopology, ReferenceCluster};

fn topo() -> ClusterTopology {
    let mut t = ClusterTopology::new("basic", "db");
    t.cluster_domain = "east.local".into();
    t
}

fn with_reference(mut t: ClusterTopology) -> ClusterTopology {
    t.reference = Some(ReferenceCluster {
        name: "main".into(),
        namespace: "shared".into(),
        cluster_domain: "west.local".into(),
    });
    t
}

#[test]
fn local_placement_service_has_no_domain_suffix() {
    let t = topo();
    assert_eq!(t.resolver().placement_service_address(), "basic-pd.db.svc:2379");
}

#[test]
fn across_k8s_always_uses_discovery_sentinel() {
    for (no_local_pd, reference) in [(false, false), (true, false), (true, true), (false, true)] {
        let mut t = topo();
        if reference { t = with_reference(t); }
        t.no_local_pd = no_local_pd;
        t.across_k8s = true;
        assert_eq!(t.resolver().placement_service_address(), "PD_ADDR");
    }
}

#[test]
fn heterogeneous_without_local_pd_uses_reference() {
    let mut t = with_reference(topo());
    t.no_local_pd = true;
    assert_eq!(t.resolver().placement_service_address(), "main-pd.shared.svc.west.local:2379");

    // with a local PD the reference is ignored
    t.no_local_pd = false;
    assert_eq!(t.resolver().placement_service_address(), "basic-pd.db.svc:2379");
}

#[test]
fn no_local_pd_without_reference_falls_back_to_local() {
    let mut t = topo();
    t.no_local_pd = true;
    assert_eq!(t.resolver().placement_service_address(), "basic-pd.db.svc:2379");
}

#[test]
fn compute_tier_status_address_variants() {
    let mut t = with_reference(topo());
    assert_eq!(t.resolver().compute_tier_status_address(), "basic-tidb.db.svc:10080");

    t.no_local_tidb = true;
    assert_eq!(t.resolver().compute_tier_status_address(), "main-tidb.shared.svc.west.local:10080");

    t.across_k8s = true;
    assert_eq!(t.resolver().compute_tier_status_address(), "main-tidb-peer.shared.svc.west.local:10080");

    let mut lonely = topo();
    lonely.no_local_tidb = true;
    assert_eq!(lonely.resolver().compute_tier_status_address(), "basic-tidb.db.svc:10080");
}

#[test]
fn reference_without_namespace_stays_in_local_namespace() {
    let mut t = topo();
    t.reference = Some(ReferenceCluster { name: "main".into(), ..Default::default() });
    t.no_local_pd = true;
    assert_eq!(t.resolver().placement_service_address(), "main-pd.db.svc:2379");
}

#[test]
fn proxy_addresses_use_local_peer_service() {
    let t = with_reference(topo());
    let r = t.resolver();
    assert_eq!(r.proxy_peer_address(), "basic-tiflash-POD_NUM.basic-tiflash-peer.db.svc.east.local:20170");
    assert_eq!(r.proxy_status_address(), "basic-tiflash-POD_NUM.basic-tiflash-peer.db.svc.east.local:20292");
    assert_eq!(r.engine_peer_address(), "basic-tiflash-POD_NUM.basic-tiflash-peer.db.svc.east.local:3930");
}
