//! Platform trust store access

use crate::error::{CertError, Result};

/// DER certificates of the platform trust store.
///
/// Individual load errors are logged; only a store without any certificate
/// and with errors fails.
pub fn load_platform_certificates() -> Result<Vec<Vec<u8>>> {
    let result = rustls_native_certs::load_native_certs();

    for e in &result.errors {
        tracing::warn!("Platform certificate load error: {}", e);
    }
    if result.certs.is_empty() && !result.errors.is_empty() {
        return Err(CertError::not_found(format!(
            "platform certificates ({} errors)",
            result.errors.len()
        )));
    }

    tracing::debug!("Loaded {} platform certificates", result.certs.len());
    Ok(result.certs.iter().map(|cert| cert.as_ref().to_vec()).collect())
}
