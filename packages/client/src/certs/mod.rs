//! Certificate objects, store entries and their issuer graph

pub mod entry_id;
pub mod export;
pub mod generate;
pub mod objects;
pub mod password;
pub mod sources;
pub mod store;

pub use entry_id::UserCertStoreEntryId;
pub use export::{
    create_unique_file, export_objects, export_to_directory, export_to_file, export_to_text, issuer_chain,
    ExportOptions,
};
pub use generate::{generate, GenerateCertRequest, GenerateIssuer, KeyAlgorithm, SignatureAlgorithm};
pub use objects::{
    AliasGroup, CertKey, CertObject, CertObjectKind, CertObjectStore, CertObjectStoreEntry, EncryptedCertKey,
    StoredKey,
};
pub use password::{FixedPassword, NoPassword, Password, PasswordCallback};
pub use sources::StoreLoader;
pub use store::{UserCertStore, UserCertStoreEntry, EXTERNAL_ALIAS};
