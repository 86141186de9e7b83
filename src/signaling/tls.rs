use crate::{
    signaling::server_settings::ServerSettings,
    tls_utils::{load_certs, load_pinned_root_store, load_private_key},
};
use rustls::{ClientConfig, ServerConfig};
use std::{io, path::Path, sync::Arc};

/// ClientConfig for the signaling client, trusting ONLY the CA in `ca_path`.
///
/// This is what we'll pass to `SignalingClient::connect_tls`.
pub fn build_signaling_client_config(ca_path: impl AsRef<Path>) -> io::Result<Arc<ClientConfig>> {
    let root_store = load_pinned_root_store(ca_path)?;

    let config = ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    Ok(Arc::new(config))
}

/// ServerConfig for the signaling server, using *no* client auth.
///
/// `Ok(None)` when `tls_cert_path` / `tls_key_path` are not both configured;
/// the server then speaks plain TCP. Built once at startup and shared by every
/// accepted connection.
pub fn build_signaling_server_config(
    settings: &ServerSettings,
) -> io::Result<Option<Arc<ServerConfig>>> {
    let Some((cert_path, key_path)) = settings.tls_paths() else {
        return Ok(None);
    };
    let certs = load_certs(cert_path)?;
    let key = load_private_key(key_path)?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| {
            io::Error::new(io::ErrorKind::InvalidData, format!("TLS config error: {e}"))
        })?;

    Ok(Some(Arc::new(config)))
}
