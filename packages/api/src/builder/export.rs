//! `ExportBuilder`: fluent export of a store entry

use std::path::{Path, PathBuf};

use certmgr_core::certs::export::{self, ExportOptions};
use certmgr_core::{
    CertError, CertObjectStore, CertWriter, NoPassword, PasswordCallback, PemProvider, ProviderRegistry, Result,
    UserCertStoreEntry,
};

/// Builder exporting one entry, by default its certificate as PEM.
///
/// ```rust,no_run
/// use certmgr::CertMgr;
///
/// let store = CertMgr::store().file("server.pem").load()?;
/// for entry in store.entries() {
///     let text = CertMgr::export(entry).chain().key().to_text()?;
///     println!("{text}");
/// }
/// # Ok::<(), certmgr::CertError>(())
/// ```
pub struct ExportBuilder<'s, 'a> {
    pub(crate) entry: UserCertStoreEntry<'s>,
    pub(crate) options: ExportOptions,
    pub(crate) registry: &'a ProviderRegistry,
    pub(crate) format: String,
    pub(crate) password: &'a dyn PasswordCallback,
    pub(crate) debug_enabled: bool,
}

impl<'s, 'a> ExportBuilder<'s, 'a> {
    #[must_use]
    pub fn new(entry: UserCertStoreEntry<'s>) -> Self {
        Self {
            entry,
            options: ExportOptions::default(),
            registry: ProviderRegistry::builtin(),
            format: PemProvider::NAME.to_string(),
            password: &NoPassword,
            debug_enabled: false,
        }
    }

    #[must_use]
    pub fn options(mut self, options: ExportOptions) -> Self {
        self.options = options;
        self
    }

    /// Include the issuer certificates below the root.
    #[must_use]
    pub fn chain(mut self) -> Self {
        self.options.chain = true;
        self
    }

    /// Include the whole chain up to and including the root.
    #[must_use]
    pub fn chain_root(mut self) -> Self {
        self.options.chain = true;
        self.options.chain_root = true;
        self
    }

    #[must_use]
    pub fn key(mut self) -> Self {
        self.options.key = true;
        self
    }

    #[must_use]
    pub fn csr(mut self) -> Self {
        self.options.csr = true;
        self
    }

    #[must_use]
    pub fn crl(mut self) -> Self {
        self.options.crl = true;
        self
    }

    #[must_use]
    pub fn without_cert(mut self) -> Self {
        self.options.cert = false;
        self
    }

    /// Encrypt keys under a password from `query_new_password`.
    #[must_use]
    pub fn encrypt(mut self) -> Self {
        self.options.encrypt = true;
        self
    }

    /// Writer name, e.g. `PEM` or `DER`.
    #[must_use]
    pub fn format(mut self, name: impl Into<String>) -> Self {
        self.format = name.into();
        self
    }

    #[must_use]
    pub fn registry(mut self, registry: &'a ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn password(mut self, password: &'a dyn PasswordCallback) -> Self {
        self.password = password;
        self
    }

    #[must_use]
    pub fn debug(mut self) -> Self {
        self.debug_enabled = true;
        self
    }

    fn writer(&self) -> Result<&'a dyn CertWriter> {
        self.registry
            .writer(&self.format)
            .ok_or_else(|| CertError::not_found(format!("writer '{}'", self.format)))
    }

    /// The collected objects without writing them.
    pub fn objects(&self) -> Result<CertObjectStore> {
        let objects = export::export_objects(self.entry, &self.options, self.password)?;

        if self.debug_enabled {
            tracing::debug!("Collected {} objects of {} for export", objects.len(), self.entry.id());
        }
        Ok(objects)
    }

    pub fn to_file(self, path: impl AsRef<Path>) -> Result<()> {
        let writer = self.writer()?;

        export::export_to_file(writer, &self.objects()?, path.as_ref(), self.options.encrypt, self.password)
    }

    /// One new file per object; returns the created paths.
    pub fn to_directory(self, directory: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let writer = self.writer()?;

        export::export_to_directory(
            writer,
            &self.objects()?,
            directory.as_ref(),
            self.options.encrypt,
            self.password,
        )
    }

    /// Text form with `\n` line endings, e.g. for the clipboard.
    pub fn to_text(self) -> Result<String> {
        let writer = self.writer()?;
        let resource = self.entry.id().to_string();

        export::export_to_text(writer, &self.objects()?, &resource, self.options.encrypt, self.password)
    }
}
