//! Engine defaults for 5.4.0 and later.

use flashgen_topology::{naming, ClusterTopology};

use crate::rules::{flash_address_rules, log_path_rules, placement_rule, DefaultRule};

pub(crate) fn engine_rules(topo: &ClusterTopology) -> Vec<DefaultRule> {
    let mut rules = vec![
        DefaultRule::new("tmp_path", "/data0/tmp"),
        DefaultRule::new("tcp_port", 9000),
        DefaultRule::new("http_port", 8123),
    ];
    rules.extend(flash_address_rules(topo));
    rules.extend(log_path_rules());
    rules.push(placement_rule(topo));
    rules.extend([
        DefaultRule::new("listen_host", topo.listen_host().engine_literal()).when(|_, t| t.listen_host().is_ipv6()),
        DefaultRule::new("status.metrics_port", naming::METRICS_PORT).when(|_, t| t.listen_host().is_ipv6()),
    ]);
    rules
}
