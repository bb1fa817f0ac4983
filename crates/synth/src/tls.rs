//! Final TLS posture pass over the engine/proxy document pair.

use flashgen_core::{ConfigDocument, DocumentError};
use tracing::debug;

use crate::Dialect;

/// Where the cluster client certificate secret is mounted in the pod.
pub const CERT_MOUNT_PATH: &str = "/var/lib/tiflash-tls";
pub const CA_FILE: &str = "ca.crt";
pub const CERT_FILE: &str = "tls.crt";
pub const KEY_FILE: &str = "tls.key";

pub const TCP_PORT: &str = "tcp_port";
pub const HTTP_PORT: &str = "http_port";
pub const TCP_PORT_SECURE: &str = "tcp_port_secure";
pub const HTTPS_PORT: &str = "https_port";

/// Engine keys use `_`, proxy keys use `-`.
const ENGINE_CERT_KEYS: [&str; 3] = ["security.ca_path", "security.cert_path", "security.key_path"];
const PROXY_CERT_KEYS: [&str; 3] = ["security.ca-path", "security.cert-path", "security.key-path"];
const ENGINE_ALLOWED_CN: &str = "security.cert_allowed_cn";
const PROXY_ALLOWED_CN: &str = "security.cert-allowed-cn";

pub fn cert_paths() -> [String; 3] {
    [CA_FILE, CERT_FILE, KEY_FILE].map(|f| format!("{}/{}", CERT_MOUNT_PATH, f))
}

#[derive(Debug, Clone, Copy)]
pub struct TlsAugmenter {
    dialect: Dialect,
}

impl TlsAugmenter {
    pub fn new(dialect: Dialect) -> Self { Self { dialect } }

    pub fn apply(&self, tls_enabled: bool, engine: &mut ConfigDocument, proxy: &mut ConfigDocument) -> Result<(), DocumentError> {
        if tls_enabled {
            self.enable(engine, proxy)
        } else {
            self.disable(engine);
            Ok(())
        }
    }

    fn enable(&self, engine: &mut ConfigDocument, proxy: &mut ConfigDocument) -> Result<(), DocumentError> {
        let paths = cert_paths();
        for (key, path) in ENGINE_CERT_KEYS.iter().zip(paths.iter()) {
            engine.set(key, path.as_str())?;
        }
        for (key, path) in PROXY_CERT_KEYS.iter().zip(paths.iter()) {
            proxy.set(key, path.as_str())?;
        }

        engine.set_if_absent(TCP_PORT_SECURE, 9000)?;
        engine.set_if_absent(HTTPS_PORT, 8123)?;
        engine.delete(HTTP_PORT);
        engine.delete(TCP_PORT);

        if !proxy.contains(PROXY_ALLOWED_CN) {
            if let Some(cn) = engine.get(ENGINE_ALLOWED_CN).cloned() {
                debug!("propagating allowed client names to proxy");
                proxy.set(PROXY_ALLOWED_CN, cn)?;
            }
        }
        Ok(())
    }

    fn disable(&self, engine: &mut ConfigDocument) {
        if self.dialect.clears_secure_ports_without_tls() {
            engine.delete(HTTPS_PORT);
            engine.delete(TCP_PORT_SECURE);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cert_paths_live_under_mount() {
        assert_eq!(
            cert_paths(),
            [
                "/var/lib/tiflash-tls/ca.crt".to_string(),
                "/var/lib/tiflash-tls/tls.crt".to_string(),
                "/var/lib/tiflash-tls/tls.key".to_string(),
            ]
        );
    }

    #[test]
    fn user_cert_paths_are_overridden() {
        let mut engine = ConfigDocument::new();
        engine.set("security.ca_path", "/mine/ca.crt").unwrap();
        let mut proxy = ConfigDocument::new();
        TlsAugmenter::new(Dialect::Current).apply(true, &mut engine, &mut proxy).unwrap();
        assert_eq!(engine.get_str("security.ca_path").unwrap(), Some("/var/lib/tiflash-tls/ca.crt"));
        assert_eq!(proxy.get_str("security.key-path").unwrap(), Some("/var/lib/tiflash-tls/tls.key"));
    }

    #[test]
    fn allowed_cn_is_not_overwritten_on_proxy() {
        let mut engine = ConfigDocument::new();
        engine.set(ENGINE_ALLOWED_CN, vec!["tidb"]).unwrap();
        let mut proxy = ConfigDocument::new();
        proxy.set(PROXY_ALLOWED_CN, vec!["tikv"]).unwrap();
        TlsAugmenter::new(Dialect::Legacy).apply(true, &mut engine, &mut proxy).unwrap();
        assert_eq!(proxy.get_string_list(PROXY_ALLOWED_CN).unwrap(), Some(vec!["tikv"]));
    }

    #[test]
    fn allowed_cn_never_flows_from_proxy_to_engine() {
        let mut engine = ConfigDocument::new();
        let mut proxy = ConfigDocument::new();
        proxy.set(PROXY_ALLOWED_CN, vec!["tikv"]).unwrap();
        TlsAugmenter::new(Dialect::Legacy).apply(true, &mut engine, &mut proxy).unwrap();
        assert!(engine.get(ENGINE_ALLOWED_CN).is_none());
    }

    #[test]
    fn disabled_tls_leaves_certs_alone() {
        let mut engine = ConfigDocument::new();
        engine.set(TCP_PORT_SECURE, 9000).unwrap();
        let mut proxy = ConfigDocument::new();
        TlsAugmenter::new(Dialect::Current).apply(false, &mut engine, &mut proxy).unwrap();
        assert_eq!(engine.get_integer(TCP_PORT_SECURE).unwrap(), Some(9000));
        assert!(engine.get("security.ca_path").is_none());
        assert!(proxy.is_empty());
    }
}
