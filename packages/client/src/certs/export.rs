//! Export assembly: collecting an entry's objects and writing them out

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::{CertError, Result};
use crate::io::CertWriter;

use super::entry_id::UserCertStoreEntryId;
use super::objects::CertObjectStore;
use super::password::PasswordCallback;
use super::store::UserCertStoreEntry;

/// Placeholder for the running index in file name templates.
pub const INDEX_PLACEHOLDER: &str = "%d";

/// Which objects an export collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    pub cert: bool,
    /// Intermediate issuer certificates up to the root.
    pub chain: bool,
    /// The self-signed root, only together with `chain`.
    pub chain_root: bool,
    pub key: bool,
    pub csr: bool,
    pub crl: bool,
    /// Encrypt private keys under a new password.
    pub encrypt: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            cert: true,
            chain: false,
            chain_root: false,
            key: false,
            csr: false,
            crl: false,
            encrypt: false,
        }
    }
}

fn export_alias(id: &UserCertStoreEntryId) -> String {
    if id.rank() == 0 {
        id.alias().to_string()
    } else {
        format!("{}-{}", id.alias(), id.rank())
    }
}

/// An export alias not yet taken in `store`, suffixed on collision.
fn unused_alias(store: &CertObjectStore, id: &UserCertStoreEntryId) -> String {
    let base = export_alias(id);
    let taken = store.aliases();

    if !taken.contains(&base.as_str()) {
        return base;
    }
    (2u64..)
        .map(|suffix| format!("{base}-{suffix}"))
        .find(|alias| !taken.contains(&alias.as_str()))
        .unwrap_or_else(|| base.clone())
}

/// Collect the selected objects of an entry, its chain included.
///
/// Keys are decrypted through `password`. The issuer walk is bounded by the
/// store's `max_chain_depth`; a cycle or a longer walk fails with
/// `InvalidArgument`.
pub fn export_objects(
    entry: UserCertStoreEntry<'_>,
    options: &ExportOptions,
    password: &dyn PasswordCallback,
) -> Result<CertObjectStore> {
    let mut store = CertObjectStore::new();
    let alias = export_alias(entry.id());

    if options.cert && entry.has_crt() {
        store.add_crt(alias.clone(), entry.crt()?.clone())?;
    }
    if options.key && entry.has_key() {
        store.add_key(alias.clone(), entry.key_with(password)?)?;
    }
    if options.csr && entry.has_csr() {
        store.add_csr(alias.clone(), entry.csr()?.clone())?;
    }
    if options.crl && entry.has_crl() {
        store.add_crl(alias.clone(), entry.crl()?.clone())?;
    }
    if options.chain {
        for issuer in issuer_chain(entry)? {
            if (!issuer.is_self_signed() || options.chain_root) && issuer.has_crt() {
                let alias = unused_alias(&store, issuer.id());
                store.add_crt(alias, issuer.crt()?.clone())?;
            }
        }
    }
    Ok(store)
}

/// The issuers of an entry, nearest first, ending with the self-signed root.
pub fn issuer_chain(entry: UserCertStoreEntry<'_>) -> Result<Vec<UserCertStoreEntry<'_>>> {
    let max_depth = entry.store().config().max_chain_depth;
    let mut visited = HashSet::from([entry.id().clone()]);
    let mut chain = Vec::new();
    let mut current = entry;

    while !current.is_self_signed() {
        current = current.issuer();

        if !visited.insert(current.id().clone()) {
            tracing::warn!("Issuer chain of {} revisits {}", entry.id(), current.id());
            return Err(CertError::invalid_argument(format!(
                "issuer chain of {} is cyclic at {}",
                entry.id(),
                current.id()
            )));
        }
        if chain.len() >= max_depth {
            tracing::warn!("Issuer chain of {} exceeds {} entries", entry.id(), max_depth);
            return Err(CertError::invalid_argument(format!(
                "issuer chain of {} exceeds {max_depth} entries",
                entry.id()
            )));
        }
        chain.push(current);
    }
    Ok(chain)
}

fn new_password(password: &dyn PasswordCallback, resource: &str) -> Result<super::password::Password> {
    password
        .query_new_password(resource)
        .ok_or_else(|| CertError::password_required(resource))
}

fn check_encryption(writer: &dyn CertWriter) -> Result<()> {
    if writer.is_encryption_supported() {
        Ok(())
    } else {
        Err(CertError::invalid_argument(format!(
            "{} format does not support encryption",
            writer.name()
        )))
    }
}

/// Write a store, encrypting keys under a new password when asked.
pub fn write_store(
    writer: &dyn CertWriter,
    output: &mut dyn Write,
    store: &CertObjectStore,
    resource: &str,
    encrypt: bool,
    password: &dyn PasswordCallback,
) -> Result<()> {
    if encrypt {
        check_encryption(writer)?;
        let new_password = new_password(password, resource)?;

        writer.write_encrypted_binary(output, store, resource, &new_password)
    } else {
        writer.write_binary(output, store, resource)
    }
}

/// Write all objects into one file, replacing it.
pub fn export_to_file(
    writer: &dyn CertWriter,
    store: &CertObjectStore,
    path: &Path,
    encrypt: bool,
    password: &dyn PasswordCallback,
) -> Result<()> {
    let resource = path.display().to_string();
    let mut output = BufWriter::new(File::create(path)?);

    write_store(writer, &mut output, store, &resource, encrypt, password)?;
    output.flush()?;
    tracing::info!("Exported {} objects to {}", store.len(), resource);
    Ok(())
}

/// Write every object into its own new file named `<alias>-<n><ext>`.
///
/// Existing files are never overwritten. Returns the created paths.
pub fn export_to_directory(
    writer: &dyn CertWriter,
    store: &CertObjectStore,
    directory: &Path,
    encrypt: bool,
    password: &dyn PasswordCallback,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(store.len());

    for entry in store {
        let template = format!("{}-{INDEX_PLACEHOLDER}{}", entry.alias(), writer.file_extension());
        let (file, path) = create_unique_file(directory, &template)?;
        let resource = path.display().to_string();
        let mut output = BufWriter::new(file);

        write_store(writer, &mut output, &CertObjectStore::wrap(entry), &resource, encrypt, password)?;
        output.flush()?;
        paths.push(path);
    }
    tracing::info!("Exported {} objects to {}", paths.len(), directory.display());
    Ok(paths)
}

/// Render all objects as text with `\n` line endings.
pub fn export_to_text(
    writer: &dyn CertWriter,
    store: &CertObjectStore,
    resource: &str,
    encrypt: bool,
    password: &dyn PasswordCallback,
) -> Result<String> {
    if !writer.is_text() {
        return Err(CertError::invalid_argument(format!(
            "{} format has no text form",
            writer.name()
        )));
    }
    let text = if encrypt {
        check_encryption(writer)?;
        let new_password = new_password(password, resource)?;

        writer.write_encrypted_string(store, resource, &new_password)?
    } else {
        writer.write_string(store, resource)?
    };
    Ok(normalize_line_endings(&text))
}

#[must_use]
pub fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}

/// Exclusively create the first free file of a numbered template.
///
/// The index starts at 1. A template yielding the same name twice fails with
/// `InvalidArgument`; I/O errors other than an existing file propagate.
pub fn create_unique_file(directory: &Path, template: &str) -> Result<(File, PathBuf)> {
    let mut previous: Option<String> = None;
    let mut index: u64 = 1;

    loop {
        let name = template.replacen(INDEX_PLACEHOLDER, &index.to_string(), 1);

        if previous.as_deref() == Some(name.as_str()) {
            return Err(CertError::invalid_argument(format!(
                "file name template '{template}' does not yield unique names"
            )));
        }

        let path = directory.join(&name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                tracing::debug!("{} exists, trying next index", path.display());
                previous = Some(name);
                index += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}
