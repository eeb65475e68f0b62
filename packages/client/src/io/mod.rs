//! Codec providers and reader dispatch

pub mod der_provider;
pub mod dispatch;
pub mod glob;
pub mod pem_provider;
pub mod provider;
pub mod registry;
pub mod url;

pub use der_provider::DerProvider;
pub use dispatch::{read_file, read_string, read_url};
pub use pem_provider::PemProvider;
pub use provider::{CertProvider, CertReader, CertWriter, ReadOutcome};
pub use registry::ProviderRegistry;
pub use url::{FileUrlOpener, HttpUrlOpener, SchemeUrlOpener, UrlOpener};

/// Default alias for objects read from a resource: the bare file stem.
#[must_use]
pub fn alias_from_resource(resource: &str) -> String {
    let file_name = resource
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(resource);
    let stem = match file_name.rfind('.') {
        Some(dot) if dot > 0 => &file_name[..dot],
        _ => file_name,
    };

    if stem.is_empty() {
        "cert".to_string()
    } else {
        stem.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_from_resource() {
        assert_eq!(alias_from_resource("/etc/ssl/server.pem"), "server");
        assert_eq!(alias_from_resource("C:\\certs\\ca.crt"), "ca");
        assert_eq!(alias_from_resource("https://example.org/chain.pem"), "chain");
        assert_eq!(alias_from_resource(".hidden"), ".hidden");
        assert_eq!(alias_from_resource(""), "cert");
    }
}
