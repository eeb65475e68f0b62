//! CertMgr Public API
//!
//! Load certificate stores from files, URLs, TLS peers or the platform trust
//! store, inspect their issuer graph and export or generate objects through
//! fluent builders.

#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]

pub mod builder;

pub use builder::*;

// Re-export the engine types callers work with
pub use certmgr_core::{
    CertError, CertKey, CertObject, CertObjectKind, CertObjectStore, CertWriter, DerProvider, EngineConfig,
    ExportOptions, FixedPassword, GeneralName, GeneralNames, GenerateIssuer, KeyAlgorithm, NoPassword,
    PasswordCallback, PasswordMode, PemProvider, ProviderRegistry, Result, SignatureAlgorithm, UserCertStore,
    UserCertStoreEntry, UserCertStoreEntryId, X509ExtensionData,
};
pub use certmgr_core::x509::extensions;

/// Main entry point providing static builder methods
pub struct CertMgr;

impl CertMgr {
    /// Start loading a certificate store.
    #[must_use]
    pub fn store<'a>() -> StoreBuilder<'a> {
        StoreBuilder::new()
    }

    /// Start exporting an entry.
    #[must_use]
    pub fn export<'s, 'a>(entry: UserCertStoreEntry<'s>) -> ExportBuilder<'s, 'a> {
        ExportBuilder::new(entry)
    }

    /// Start generating a key pair and certificate.
    #[must_use]
    pub fn generate<'a>(alias: impl Into<String>, dn: impl Into<String>) -> GenerateBuilder<'a> {
        GenerateBuilder::new(alias, dn)
    }
}
