//! rustls client configuration
//!
//! Pipelining is an HTTP/1.1 feature, so the config only ever offers
//! `http/1.1` over ALPN; a server that picked `h2` would desynchronize the
//! very first response.

use std::sync::Arc;

use rustls::pki_types::CertificateDer;
use rustls::{ClientConfig, RootCertStore};

use crate::error::{self, Result};

const ALPN_HTTP11: &[u8] = b"http/1.1";

/// Client config trusting the webpki root set.
///
/// # Errors
///
/// Returns a connect error if the ring provider rejects the default
/// protocol versions.
pub fn default_client_config() -> Result<Arc<ClientConfig>> {
    client_config_with_roots(std::iter::empty())
}

/// Client config trusting the webpki root set plus `extra_roots`.
///
/// # Errors
///
/// Returns a connect error if the provider cannot be configured.
pub fn client_config_with_roots<I>(extra_roots: I) -> Result<Arc<ClientConfig>>
where
    I: IntoIterator<Item = CertificateDer<'static>>,
{
    let mut root_store = RootCertStore::empty();
    root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    for cert in extra_roots {
        if let Err(e) = root_store.add(cert) {
            tracing::warn!("Failed to add custom root certificate: {}", e);
        }
    }

    let roots = root_store.len();
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let mut config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(error::connect)?
        .with_root_certificates(root_store)
        .with_no_client_auth();
    config.alpn_protocols = vec![ALPN_HTTP11.to_vec()];

    tracing::debug!(roots, "TLS client config built");
    Ok(Arc::new(config))
}
