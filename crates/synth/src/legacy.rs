//! Engine defaults for versions before the 5.4.0 schema change.

use flashgen_topology::{naming, ClusterTopology};

use crate::rules::{flash_address_rules, log_path_rules, placement_rule, DefaultRule};

pub(crate) fn engine_rules(topo: &ClusterTopology) -> Vec<DefaultRule> {
    let mut rules = vec![
        DefaultRule::new("tmp_path", "/data0/tmp"),
        DefaultRule::new("display_name", "TiFlash"),
        DefaultRule::new("default_profile", "default"),
        DefaultRule::new("path_realtime_mode", false),
        DefaultRule::new("mark_cache_size", 5_368_709_120i64),
        DefaultRule::new("minmax_index_cache_size", 5_368_709_120i64),
        // both port families; the TLS step removes whichever does not apply
        DefaultRule::new("tcp_port", 9000),
        DefaultRule::new("tcp_port_secure", 9000),
        DefaultRule::new("https_port", 8123),
        DefaultRule::new("http_port", 8123),
        DefaultRule::new("interserver_http_port", 9009),
    ];

    rules.extend(flash_address_rules(topo));
    rules.extend([
        DefaultRule::new("flash.overlap_threshold", 0.6),
        DefaultRule::new("flash.compact_log_min_period", 200),
        DefaultRule::new("flash.flash_cluster.cluster_manager_path", "/tiflash/flash_cluster_manager"),
        DefaultRule::new("flash.flash_cluster.refresh_interval", 20),
        DefaultRule::new("flash.flash_cluster.update_rule_interval", 10),
        DefaultRule::new("flash.flash_cluster.master_ttl", 60),
    ]);

    rules.extend(log_path_rules());
    rules.extend([
        DefaultRule::new("logger.size", "100M"),
        DefaultRule::new("logger.level", "information"),
        DefaultRule::new("logger.count", 10),
        DefaultRule::new("application.runAsDaemon", true),
        DefaultRule::new("raft.kvstore_path", "/data0/kvstore"),
        DefaultRule::new("raft.storage_engine", "dt"),
    ]);
    rules.push(placement_rule(topo));

    rules.extend([
        DefaultRule::new("listen_host", topo.listen_host().engine_literal()),
        DefaultRule::new("status.metrics_port", naming::METRICS_PORT),
    ]);
    rules.extend(policy_rules());
    rules
}

/// Quotas, users and profiles. Fixed values, nothing derived.
fn policy_rules() -> Vec<DefaultRule> {
    vec![
        DefaultRule::new("quotas.default.interval.duration", 3600),
        DefaultRule::new("quotas.default.interval.queries", 0),
        DefaultRule::new("quotas.default.interval.errors", 0),
        DefaultRule::new("quotas.default.interval.result_rows", 0),
        DefaultRule::new("quotas.default.interval.read_rows", 0),
        DefaultRule::new("quotas.default.interval.execution_time", 0),
        DefaultRule::new("users.readonly.profile", "readonly"),
        DefaultRule::new("users.readonly.quota", "default"),
        DefaultRule::new("users.readonly.networks.ip", "::/0"),
        DefaultRule::new("users.readonly.password", ""),
        DefaultRule::new("users.default.profile", "default"),
        DefaultRule::new("users.default.quota", "default"),
        DefaultRule::new("users.default.networks.ip", "::/0"),
        DefaultRule::new("users.default.password", ""),
        DefaultRule::new("profiles.readonly.readonly", 1),
        DefaultRule::new("profiles.default.max_memory_usage", 10_000_000_000i64),
        DefaultRule::new("profiles.default.load_balancing", "random"),
        DefaultRule::new("profiles.default.use_uncompressed_cache", 0),
    ]
}
