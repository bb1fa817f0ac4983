use flashgen_core::{ConfigDocument, DocumentError};
use flashgen_synth::rules::{
    ensure_log_defaults, CLUSTER_LOG_KEY, DEFAULT_CLUSTER_LOG, DEFAULT_ERROR_LOG, DEFAULT_SERVER_LOG, ERROR_LOG_KEY,
    SERVER_LOG_KEY,
};
use k8s_openapi::api::core::v1::{Container, ResourceRequirements, VolumeMount};

/// Container names, in the order they are built.
pub const SIDECAR_NAMES: [&str; 3] = ["serverlog", "errorlog", "clusterlog"];

/// One tailing container per engine log file (server, error, cluster manager).
///
/// Paths come from the engine document with the log defaults filled in; the
/// caller's document is not modified. Fails only if a log key holds a non-string.
pub fn build_sidecar_containers(
    engine: &ConfigDocument,
    image: &str,
    pull_policy: Option<&str>,
    resources: Option<&ResourceRequirements>,
) -> Result<Vec<Container>, DocumentError> {
    let mut doc = engine.clone();
    ensure_log_defaults(&mut doc)?;

    let sources = [
        (SERVER_LOG_KEY, DEFAULT_SERVER_LOG),
        (ERROR_LOG_KEY, DEFAULT_ERROR_LOG),
        (CLUSTER_LOG_KEY, DEFAULT_CLUSTER_LOG),
    ];
    let mut out = Vec::with_capacity(sources.len());
    for (name, (key, default)) in SIDECAR_NAMES.iter().zip(sources) {
        let path = doc.get_str(key)?.unwrap_or(default);
        out.push(tail_container(name, path, image, pull_policy, resources));
    }
    Ok(out)
}

fn tail_container(
    name: &str,
    path: &str,
    image: &str,
    pull_policy: Option<&str>,
    resources: Option<&ResourceRequirements>,
) -> Container {
    // "/data0/logs/x.log" -> mount volume "data0" at "/data0"; shorter paths get no mount
    let parts: Vec<&str> = path.split('/').collect();
    let volume_mounts = if parts.len() >= 3 {
        let volume = parts[1];
        Some(vec![VolumeMount { name: volume.to_string(), mount_path: format!("/{}", volume), ..Default::default() }])
    } else {
        None
    };
    Container {
        name: name.to_string(),
        image: Some(image.to_string()),
        image_pull_policy: pull_policy.map(str::to_string),
        resources: resources.cloned(),
        volume_mounts,
        command: Some(vec![
            "sh".to_string(),
            "-c".to_string(),
            format!("touch {p}; tail -n0 -F {p};", p = path),
        ]),
        ..Default::default()
    }
}
