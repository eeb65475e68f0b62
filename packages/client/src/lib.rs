//! # CertMgr Core
//!
//! Certificate object engine: typed certificate objects, pluggable codec
//! providers, X.509 extension codecs and the issuer graph of a loaded store.
//!
//! ## Features
//!
//! - **Object stores** holding certificates, keys, requests and revocation lists per alias
//! - **Codec providers** for PEM and DER with glob based reader dispatch
//! - **Extension codecs** for the common X.509 extensions with a raw fallback
//! - **Issuer graph** with validity, revocation and CA capability predicates
//! - **Export assembly** of entries and their issuer chains
//! - **Certificate generation** backed by `rcgen`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use certmgr_core::{EngineConfig, ProviderRegistry, StoreLoader};
//!
//! let loader = StoreLoader::new(ProviderRegistry::builtin(), EngineConfig::default());
//! let store = loader.load_file(std::path::Path::new("chain.pem"))?;
//!
//! for (depth, entry) in store.walk() {
//!     println!("{:indent$}{} valid={}", "", entry, entry.is_valid(), indent = depth * 2);
//! }
//! # Ok::<(), certmgr_core::CertError>(())
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod asn1;
pub mod certs;
pub mod config;
pub mod error;
pub mod io;
pub mod net;
pub mod x509;

pub use certs::{
    export_objects, export_to_directory, export_to_file, export_to_text, generate, CertKey, CertObject,
    CertObjectKind, CertObjectStore, ExportOptions, FixedPassword, GenerateCertRequest, GenerateIssuer,
    KeyAlgorithm, NoPassword, Password, PasswordCallback, SignatureAlgorithm, StoreLoader, UserCertStore,
    UserCertStoreEntry, UserCertStoreEntryId,
};
pub use config::{EngineConfig, FormatLimits, PasswordMode};
pub use error::{CertError, DecodeError, Result};
pub use io::{CertReader, CertWriter, DerProvider, PemProvider, ProviderRegistry, ReadOutcome};
pub use x509::{Attributes, ExtensionData, GeneralName, GeneralNames, X509ExtensionData};
