//! Flashgen kubehub: turns a TidbCluster object (live or from a file) into the
//! inputs of a synthesis call, and builds the log-tailing sidecars.

#![forbid(unsafe_code)]

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use flashgen_core::ConfigDocument;
use flashgen_synth::PartialConfig;
use flashgen_topology::{ClusterTopology, ReferenceCluster};
use k8s_openapi::api::core::v1::ResourceRequirements;
use kube::{
    api::Api,
    core::{ApiResource, DynamicObject, GroupVersionKind},
    Client,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::{debug, info};

mod sidecar;

pub use sidecar::{build_sidecar_containers, SIDECAR_NAMES};

pub const TIDB_CLUSTER_GROUP: &str = "pingcap.com";
pub const TIDB_CLUSTER_VERSION: &str = "v1alpha1";
pub const TIDB_CLUSTER_KIND: &str = "TidbCluster";
pub const DEFAULT_HELPER_IMAGE: &str = "busybox:1.26.2";

/// Everything a synthesis call and the sidecar builder need from one cluster object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClusterSource {
    pub topology: ClusterTopology,
    pub partial: PartialConfig,
    pub helper_image: String,
    pub helper_pull_policy: Option<String>,
    /// Requests/limits for each log-tailing sidecar (`spec.tiflash.logTailer`).
    pub log_tailer_resources: Option<ResourceRequirements>,
}

fn str_at<'a>(v: &'a Json, path: &[&str]) -> Option<&'a str> {
    let mut cur = v;
    for seg in path {
        cur = cur.get(*seg)?;
    }
    cur.as_str()
}

fn bool_at(v: &Json, path: &[&str]) -> bool {
    let mut cur = v;
    for seg in path {
        match cur.get(*seg) {
            Some(next) => cur = next,
            None => return false,
        }
    }
    cur.as_bool().unwrap_or(false)
}

fn present(v: &Json, key: &str) -> bool {
    v.get(key).map(|x| !x.is_null()).unwrap_or(false)
}

/// Tag of `image` if it has one (`repo/name:tag`), ignoring registry ports.
fn image_tag(image: &str) -> Option<&str> {
    let last = image.rsplit('/').next()?;
    last.split_once(':').map(|(_, tag)| tag).filter(|t| !t.is_empty())
}

/// Engine version. An explicit `tiflash.image` decides on its own: its tag, or
/// `latest` when untagged. Otherwise `tiflash.version`, else `spec.version`,
/// else `latest`.
fn tiflash_version(spec: &Json) -> String {
    if let Some(image) = str_at(spec, &["tiflash", "image"]).filter(|s| !s.is_empty()) {
        return image_tag(image).unwrap_or("latest").to_string();
    }
    str_at(spec, &["tiflash", "version"])
        .or_else(|| str_at(spec, &["version"]))
        .filter(|s| !s.is_empty())
        .unwrap_or("latest")
        .to_string()
}

fn config_doc(v: Option<&Json>, what: &str) -> Result<Option<ConfigDocument>> {
    match v {
        None | Some(Json::Null) => Ok(None),
        Some(Json::String(_)) => bail!("{} is an encoded string; only structured config is supported", what),
        Some(obj) => ConfigDocument::from_json(obj.clone()).map(Some).with_context(|| format!("parsing {}", what)),
    }
}

/// Read a TidbCluster-shaped JSON object.
pub fn cluster_from_object(obj: &Json) -> Result<ClusterSource> {
    let name = str_at(obj, &["metadata", "name"]).ok_or_else(|| anyhow!("object missing metadata.name"))?;
    let namespace = str_at(obj, &["metadata", "namespace"]).unwrap_or("default");
    let spec = obj.get("spec").ok_or_else(|| anyhow!("object missing spec"))?;
    let tiflash = spec.get("tiflash").ok_or_else(|| anyhow!("cluster {}/{} has no tiflash component", namespace, name))?;

    let reference = spec.get("cluster").filter(|c| !c.is_null()).map(|c| ReferenceCluster {
        name: str_at(c, &["name"]).unwrap_or_default().to_string(),
        namespace: str_at(c, &["namespace"]).unwrap_or_default().to_string(),
        cluster_domain: str_at(c, &["clusterDomain"]).unwrap_or_default().to_string(),
    });

    let topology = ClusterTopology {
        name: name.to_string(),
        namespace: namespace.to_string(),
        cluster_domain: str_at(spec, &["clusterDomain"]).unwrap_or_default().to_string(),
        version: tiflash_version(spec),
        prefer_ipv6: bool_at(spec, &["preferIPv6"]),
        tls_enabled: bool_at(spec, &["tlsCluster", "enabled"]),
        storage_claims: tiflash.get("storageClaims").and_then(|c| c.as_array()).map(|a| a.len()).unwrap_or(0),
        reference,
        across_k8s: bool_at(spec, &["acrossK8s"]),
        no_local_pd: !present(spec, "pd"),
        no_local_tidb: !present(spec, "tidb"),
    };

    let config = tiflash.get("config");
    let partial = PartialConfig {
        engine: config_doc(config.and_then(|c| c.get("config")), "spec.tiflash.config.config")?,
        proxy: config_doc(config.and_then(|c| c.get("proxy")), "spec.tiflash.config.proxy")?,
    };

    let helper_image = str_at(spec, &["helper", "image"]).unwrap_or(DEFAULT_HELPER_IMAGE).to_string();
    let helper_pull_policy = str_at(spec, &["helper", "imagePullPolicy"]).map(str::to_string);
    let log_tailer_resources = match tiflash.get("logTailer") {
        None | Some(Json::Null) => None,
        Some(lt) => Some(
            serde_json::from_value::<ResourceRequirements>(lt.clone()).context("parsing spec.tiflash.logTailer")?,
        ),
    };

    debug!(cluster = %name, ns = %namespace, version = %topology.version, "cluster object parsed");
    Ok(ClusterSource { topology, partial, helper_image, helper_pull_policy, log_tailer_resources })
}

/// Load a cluster object from a YAML or JSON file.
pub fn load_cluster_file(path: &Path) -> Result<ClusterSource> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let yaml: serde_yaml::Value = serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    let json = serde_json::to_value(yaml).context("converting YAML to JSON")?;
    cluster_from_object(&json)
}

/// Fetch a TidbCluster from the API server.
pub async fn fetch_cluster(namespace: &str, name: &str) -> Result<ClusterSource> {
    let client = Client::try_default().await.context("building kube client")?;
    let gvk = GroupVersionKind::gvk(TIDB_CLUSTER_GROUP, TIDB_CLUSTER_VERSION, TIDB_CLUSTER_KIND);
    let ar = ApiResource::from_gvk(&gvk);
    let api: Api<DynamicObject> = Api::namespaced_with(client, namespace, &ar);
    let obj = api.get(name).await.with_context(|| format!("getting {} {}/{}", TIDB_CLUSTER_KIND, namespace, name))?;
    let raw = serde_json::to_value(&obj).context("serializing DynamicObject")?;
    info!(cluster = %name, ns = %namespace, "cluster fetched");
    cluster_from_object(&raw)
}
