//! `GenerateBuilder`: fluent certificate generation

use std::time::{Duration, SystemTime};

use certmgr_core::{
    generate, CertError, CertObjectStore, GenerateCertRequest, GenerateIssuer, KeyAlgorithm, NoPassword,
    PasswordCallback, Result, SignatureAlgorithm, UserCertStoreEntry, X509ExtensionData,
};

/// Builder for a new key pair and certificate.
///
/// ```rust,no_run
/// use certmgr::CertMgr;
/// use std::time::Duration;
///
/// let objects = CertMgr::generate("ca", "CN=Example CA")
///     .valid_for(Duration::from_secs(365 * 24 * 3600))
///     .generate()?;
/// # Ok::<(), certmgr::CertError>(())
/// ```
pub struct GenerateBuilder<'a> {
    pub(crate) request: GenerateCertRequest,
    pub(crate) issued_by: Option<UserCertStoreEntry<'a>>,
    pub(crate) password: &'a dyn PasswordCallback,
}

impl<'a> GenerateBuilder<'a> {
    #[must_use]
    pub fn new(alias: impl Into<String>, dn: impl Into<String>) -> Self {
        Self {
            request: GenerateCertRequest::new(alias, dn),
            issued_by: None,
            password: &NoPassword,
        }
    }

    #[must_use]
    pub fn key_algorithm(mut self, algorithm: KeyAlgorithm) -> Self {
        self.request.key_algorithm = algorithm;
        self
    }

    /// Key size in bits, for example 3072 for RSA.
    #[must_use]
    pub fn key_size(mut self, bits: u32) -> Self {
        self.request.key_size = Some(bits);
        self
    }

    #[must_use]
    pub fn signature_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.request.signature_algorithm = Some(algorithm);
        self
    }

    #[must_use]
    pub fn not_before(mut self, time: SystemTime) -> Self {
        self.request.not_before = Some(time);
        self
    }

    #[must_use]
    pub fn not_after(mut self, time: SystemTime) -> Self {
        self.request.not_after = Some(time);
        self
    }

    /// Valid from now on for the given duration.
    #[must_use]
    pub fn valid_for(self, duration: Duration) -> Self {
        let now = SystemTime::now();

        self.not_before(now).not_after(now + duration)
    }

    #[must_use]
    pub fn serial(mut self, serial: u64) -> Self {
        self.request.serial = Some(serial);
        self
    }

    #[must_use]
    pub fn extension(mut self, extension: X509ExtensionData) -> Self {
        self.request.extensions.push(extension);
        self
    }

    #[must_use]
    pub fn issuer(mut self, issuer: GenerateIssuer) -> Self {
        self.request.issuer = Some(issuer);
        self
    }

    /// Sign with the certificate and key of a store entry.
    #[must_use]
    pub fn issued_by(mut self, entry: UserCertStoreEntry<'a>) -> Self {
        self.issued_by = Some(entry);
        self
    }

    /// Callback for decrypting the issuer key.
    #[must_use]
    pub fn password(mut self, password: &'a dyn PasswordCallback) -> Self {
        self.password = password;
        self
    }

    /// Generate the key and the certificate.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the issuing entry cannot issue certificates.
    pub fn generate(mut self) -> Result<CertObjectStore> {
        if let Some(entry) = self.issued_by {
            if !entry.can_issue() {
                return Err(CertError::invalid_argument(format!("{} cannot issue certificates", entry.id())));
            }
            self.request.issuer = Some(GenerateIssuer {
                crt: entry.crt()?.clone(),
                key: entry.key_with(self.password)?,
            });
        }
        generate(&self.request)
    }
}
