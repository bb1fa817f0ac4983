#![forbid(unsafe_code)]

use std::io::Write;

use flashgen_kubehub::{build_sidecar_containers, cluster_from_object, load_cluster_file, SIDECAR_NAMES};
use flashgen_synth::{synthesize, Dialect};

fn tidb_cluster() -> serde_json::Value {
    serde_json::json!({
        "apiVersion": "pingcap.com/v1alpha1",
        "kind": "TidbCluster",
        "metadata": { "name": "basic", "namespace": "db" },
        "spec": {
            "version": "v5.4.0",
            "clusterDomain": "east.local",
            "tlsCluster": { "enabled": true },
            "cluster": { "name": "main", "namespace": "shared", "clusterDomain": "west.local" },
            "tiflash": {
                "baseImage": "pingcap/tiflash",
                "storageClaims": [ { "storageClassName": "local" }, { "storageClassName": "local" } ],
                "config": {
                    "config": { "logger": { "level": "debug" }, "security": { "cert_allowed_cn": ["tidb"] } },
                    "proxy": { "log-level": "warn" }
                }
            }
        }
    })
}

#[test]
fn reads_topology_from_cluster_object() {
    let src = cluster_from_object(&tidb_cluster()).unwrap();
    let t = &src.topology;
    assert_eq!(t.name, "basic");
    assert_eq!(t.namespace, "db");
    assert_eq!(t.version, "v5.4.0");
    assert!(t.tls_enabled);
    assert!(t.heterogeneous());
    assert!(t.no_local_pd);
    assert!(t.no_local_tidb);
    assert!(!t.across_k8s);
    assert_eq!(t.storage_claims, 2);
    assert_eq!(src.helper_image, "busybox:1.26.2");
    assert_eq!(src.partial.proxy.as_ref().unwrap().get_str("log-level").unwrap(), Some("warn"));
}

#[test]
fn object_feeds_synthesis() {
    let src = cluster_from_object(&tidb_cluster()).unwrap();
    let out = synthesize(&src.topology, &src.partial).unwrap();
    assert_eq!(out.dialect, Dialect::Current);
    assert_eq!(out.engine.get_str("raft.pd_addr").unwrap(), Some("main-pd.shared.svc.west.local:2379"));
    assert_eq!(out.engine.get_str("logger.level").unwrap(), Some("debug"));
    assert_eq!(out.proxy.get_str("log-level").unwrap(), Some("warn"));
    assert!(out.proxy.get("security.cert-allowed-cn").is_some());
}

#[test]
fn local_components_are_detected() {
    let mut obj = tidb_cluster();
    obj["spec"]["pd"] = serde_json::json!({ "replicas": 3 });
    obj["spec"]["tidb"] = serde_json::json!({ "replicas": 2 });
    let src = cluster_from_object(&obj).unwrap();
    assert!(!src.topology.no_local_pd);
    assert!(!src.topology.no_local_tidb);
}

#[test]
fn encoded_config_string_is_rejected() {
    let mut obj = tidb_cluster();
    obj["spec"]["tiflash"]["config"]["config"] = serde_json::json!("[logger]\nlevel = \"debug\"\n");
    let err = cluster_from_object(&obj).unwrap_err();
    assert!(err.to_string().contains("spec.tiflash.config.config"));
}

#[test]
fn missing_tiflash_is_an_error() {
    let mut obj = tidb_cluster();
    obj["spec"].as_object_mut().unwrap().remove("tiflash");
    assert!(cluster_from_object(&obj).is_err());
}

#[test]
fn loads_yaml_file() {
    let yaml = r#"
metadata:
  name: basic
spec:
  version: v5.3.0
  preferIPv6: true
  pd: {}
  tiflash:
    version: v5.4.2
"#;
    let dir = std::env::temp_dir().join(format!("flashgen-kubehub-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("tc.yaml");
    std::fs::File::create(&path).unwrap().write_all(yaml.as_bytes()).unwrap();

    let src = load_cluster_file(&path).unwrap();
    assert_eq!(src.topology.namespace, "default");
    assert_eq!(src.topology.version, "v5.4.2");
    assert!(src.topology.prefer_ipv6);
    assert!(!src.topology.no_local_pd);
    assert!(src.partial.engine.is_none());
    std::fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn sidecars_follow_log_paths() {
    let mut src = cluster_from_object(&tidb_cluster()).unwrap();
    let engine = src.partial.engine.get_or_insert_with(Default::default);
    engine.set("logger.errorlog", "/logs/error.log").unwrap();
    engine.set("flash.flash_cluster.log", "cluster.log").unwrap();

    let containers = build_sidecar_containers(engine, &src.helper_image, Some("IfNotPresent"), None).unwrap();
    let names: Vec<&str> = containers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, SIDECAR_NAMES.to_vec());

    let server = &containers[0];
    assert_eq!(server.image.as_deref(), Some("busybox:1.26.2"));
    assert_eq!(server.image_pull_policy.as_deref(), Some("IfNotPresent"));
    let mounts = server.volume_mounts.as_ref().unwrap();
    assert_eq!(mounts[0].name, "data0");
    assert_eq!(mounts[0].mount_path, "/data0");
    assert_eq!(
        server.command.as_ref().unwrap()[2],
        "touch /data0/logs/server.log; tail -n0 -F /data0/logs/server.log;"
    );

    let error = &containers[1];
    assert_eq!(error.volume_mounts.as_ref().unwrap()[0].mount_path, "/logs");

    // a bare file name cannot be mapped to a volume
    assert!(containers[2].volume_mounts.is_none());
}

#[test]
fn sidecars_reject_non_string_log_path() {
    let mut engine = flashgen_core::ConfigDocument::new();
    engine.set("logger.log", vec!["/a.log", "/b.log"]).unwrap();
    let err = build_sidecar_containers(&engine, "busybox", None, None).unwrap_err();
    assert_eq!(err.to_string(), "type mismatch at 'logger.log': expected string, found list");
}

#[test]
fn log_tailer_resources_reach_every_sidecar() {
    use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

    let mut obj = tidb_cluster();
    obj["spec"]["tiflash"]["logTailer"] = serde_json::json!({
        "requests": { "cpu": "100m", "memory": "64Mi" },
        "limits": { "memory": "128Mi" }
    });
    let src = cluster_from_object(&obj).unwrap();
    let resources = src.log_tailer_resources.as_ref().unwrap();
    assert_eq!(resources.requests.as_ref().unwrap()["cpu"], Quantity("100m".into()));

    let engine = src.partial.engine.clone().unwrap_or_default();
    let containers =
        build_sidecar_containers(&engine, &src.helper_image, src.helper_pull_policy.as_deref(), Some(resources)).unwrap();
    for c in &containers {
        let r = c.resources.as_ref().unwrap();
        assert_eq!(r.limits.as_ref().unwrap()["memory"], Quantity("128Mi".into()), "{}", c.name);
        assert_eq!(r.requests.as_ref().unwrap()["memory"], Quantity("64Mi".into()), "{}", c.name);
    }

    assert!(cluster_from_object(&tidb_cluster()).unwrap().log_tailer_resources.is_none());
}

#[test]
fn untagged_image_selects_latest_over_version_fields() {
    let mut obj = tidb_cluster();
    obj["spec"]["tiflash"]["image"] = serde_json::json!("pingcap/tiflash");
    obj["spec"]["tiflash"]["version"] = serde_json::json!("v5.4.1");
    let src = cluster_from_object(&obj).unwrap();
    assert_eq!(src.topology.version, "latest");
    assert_eq!(synthesize(&src.topology, &src.partial).unwrap().dialect, Dialect::Legacy);
}
