//! Provider registry
//!
//! The builtin registry is initialized once per process and read-only
//! afterwards. Dispatch receives the registry explicitly so that tests can
//! supply their own providers.

use std::sync::{Arc, OnceLock};

use crate::error::Result;

use super::der_provider::DerProvider;
use super::glob::{matches_any, GlobPattern};
use super::pem_provider::PemProvider;
use super::provider::{CertReader, CertWriter};

struct RegisteredReader {
    reader: Arc<dyn CertReader>,
    patterns: Vec<GlobPattern>,
}

/// Ordered set of registered readers and writers.
#[derive(Default)]
pub struct ProviderRegistry {
    readers: Vec<RegisteredReader>,
    writers: Vec<Arc<dyn CertWriter>>,
}

static BUILTIN: OnceLock<ProviderRegistry> = OnceLock::new();

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process wide registry of builtin providers.
    pub fn builtin() -> &'static ProviderRegistry {
        BUILTIN.get_or_init(|| {
            let registry = Self::with_builtin_providers();
            tracing::debug!(
                "Initialized provider registry: readers={:?}, writers={:?}",
                registry.reader_names(),
                registry.writer_names()
            );
            registry
        })
    }

    /// A fresh registry holding the builtin providers in fixed order.
    #[must_use]
    pub fn with_builtin_providers() -> Self {
        let mut registry = Self::new();
        let pem = Arc::new(PemProvider);
        let der = Arc::new(DerProvider);

        for reader in [pem.clone() as Arc<dyn CertReader>, der.clone() as Arc<dyn CertReader>] {
            if let Err(e) = registry.register_reader(reader) {
                tracing::error!("Failed to register builtin reader: {}", e);
            }
        }
        registry.register_writer(pem);
        registry.register_writer(der);
        registry
    }

    /// Register a reader after all previously registered ones.
    pub fn register_reader(&mut self, reader: Arc<dyn CertReader>) -> Result<()> {
        let patterns = reader
            .file_patterns()
            .iter()
            .map(|pattern| GlobPattern::new(pattern))
            .collect::<Result<Vec<_>>>()?;

        self.readers.push(RegisteredReader { reader, patterns });
        Ok(())
    }

    pub fn register_writer(&mut self, writer: Arc<dyn CertWriter>) {
        self.writers.push(writer);
    }

    /// Readers in registration order.
    pub fn readers(&self) -> impl Iterator<Item = &dyn CertReader> {
        self.readers.iter().map(|registered| registered.reader.as_ref())
    }

    /// Writers in registration order.
    pub fn writers(&self) -> impl Iterator<Item = &dyn CertWriter> {
        self.writers.iter().map(AsRef::as_ref)
    }

    #[must_use]
    pub fn reader(&self, name: &str) -> Option<&dyn CertReader> {
        self.readers().find(|reader| reader.name() == name)
    }

    #[must_use]
    pub fn writer(&self, name: &str) -> Option<&dyn CertWriter> {
        self.writers().find(|writer| writer.name() == name)
    }

    /// Readers ordered for a file name: pattern matches first, then the
    /// rest, both in registration order.
    #[must_use]
    pub fn readers_for_file(&self, file_name: &str) -> Vec<&dyn CertReader> {
        let (matching, other): (Vec<_>, Vec<_>) = self
            .readers
            .iter()
            .partition(|registered| matches_any(&registered.patterns, file_name));

        matching
            .into_iter()
            .chain(other)
            .map(|registered| registered.reader.as_ref())
            .collect()
    }

    fn reader_names(&self) -> Vec<&'static str> {
        self.readers().map(|reader| reader.name()).collect()
    }

    fn writer_names(&self) -> Vec<&'static str> {
        self.writers().map(|writer| writer.name()).collect()
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("readers", &self.reader_names())
            .field("writers", &self.writer_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_order() {
        let registry = ProviderRegistry::builtin();

        assert_eq!(registry.reader_names(), vec![PemProvider::NAME, DerProvider::NAME]);
        assert!(registry.writer(PemProvider::NAME).is_some_and(|writer| writer.is_text()));
    }

    #[test]
    fn test_file_name_bias() {
        let registry = ProviderRegistry::with_builtin_providers();

        let names: Vec<_> = registry.readers_for_file("server.der").iter().map(|r| r.name()).collect();
        assert_eq!(names, vec![DerProvider::NAME, PemProvider::NAME]);

        // both match, registration order is kept
        let names: Vec<_> = registry.readers_for_file("server.crt").iter().map(|r| r.name()).collect();
        assert_eq!(names, vec![PemProvider::NAME, DerProvider::NAME]);

        // nothing matches, nothing is excluded
        assert_eq!(registry.readers_for_file("server.txt").len(), 2);
    }
}
