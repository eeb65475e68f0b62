//! Store construction from files, URLs, string data, TLS peers and the
//! platform trust store

use std::fs;
use std::path::{Path, PathBuf};

use url::Url;

use crate::config::EngineConfig;
use crate::error::{CertError, Result};
use crate::io::{dispatch, ProviderRegistry, SchemeUrlOpener, UrlOpener};
use crate::net;

use super::objects::{CertObject, CertObjectStore};
use super::password::{select_callback, NoPassword, PasswordCallback};
use super::store::UserCertStore;

/// Loads [`UserCertStore`]s through the registered readers.
pub struct StoreLoader<'a> {
    registry: &'a ProviderRegistry,
    password: &'a dyn PasswordCallback,
    opener: Option<&'a dyn UrlOpener>,
    config: EngineConfig,
}

impl<'a> StoreLoader<'a> {
    #[must_use]
    pub fn new(registry: &'a ProviderRegistry, config: EngineConfig) -> Self {
        Self {
            registry,
            password: &NoPassword,
            opener: None,
            config,
        }
    }

    #[must_use]
    pub fn with_password(mut self, password: &'a dyn PasswordCallback) -> Self {
        self.password = password;
        self
    }

    #[must_use]
    pub fn with_url_opener(mut self, opener: &'a dyn UrlOpener) -> Self {
        self.opener = Some(opener);
        self
    }

    fn password(&self) -> &'a dyn PasswordCallback {
        select_callback(self.config.password_mode, self.password)
    }

    fn build(&self, sources: Vec<(String, CertObjectStore)>) -> UserCertStore {
        UserCertStore::from_object_stores(sources, self.config.clone())
    }

    /// Load a single file; unrecognized content yields an empty store.
    pub fn load_file(&self, path: &Path) -> Result<UserCertStore> {
        self.load_files(&[path.to_path_buf()])
    }

    /// Load a list of files; a directory contributes its regular files.
    pub fn load_files(&self, paths: &[PathBuf]) -> Result<UserCertStore> {
        let mut sources = Vec::new();

        for path in expand_paths(paths)? {
            if let Some(store) = dispatch::read_file(self.registry, &path, self.password())? {
                sources.push((path.display().to_string(), store));
            }
        }
        Ok(self.build(sources))
    }

    /// Load a URL; `file`, `http` and `https` are handled unless a custom
    /// opener is set. Unrecognized content yields an empty store.
    pub fn load_url(&self, url: &Url) -> Result<UserCertStore> {
        let default_opener = SchemeUrlOpener::new(self.config.url_timeout);
        let opener: &dyn UrlOpener = match self.opener {
            Some(opener) => opener,
            None if SchemeUrlOpener::supports(url) => &default_opener,
            None => {
                return Err(CertError::invalid_argument(format!(
                    "unsupported URL scheme '{}' in {url}",
                    url.scheme()
                )));
            }
        };
        let mut sources = Vec::new();

        if let Some(store) = dispatch::read_url(self.registry, url, opener, self.password())? {
            sources.push((url.to_string(), store));
        }
        Ok(self.build(sources))
    }

    /// Load string data; unrecognized data is a not-found error.
    pub fn load_data(&self, data: &str, resource: &str) -> Result<UserCertStore> {
        let store = dispatch::read_string(self.registry, data, resource, self.password())?;

        Ok(self.build(vec![(resource.to_string(), store)]))
    }

    /// Capture the certificates presented by a TLS server.
    pub fn load_server(&self, host: &str, port: u16) -> Result<UserCertStore> {
        let certificates = net::fetch_peer_certificates(host, port, self.config.ssl_connect_timeout)?;
        let resource = format!("{host}:{port}");

        Ok(self.build(vec![(resource, certificate_store(host, &certificates)?)]))
    }

    /// Load the platform trust store.
    pub fn load_platform(&self) -> Result<UserCertStore> {
        let certificates = net::load_platform_certificates()?;

        Ok(self.build(vec![("platform".to_string(), certificate_store("platform", &certificates)?)]))
    }
}

/// Regular files of the given paths, directories expanded one level and sorted.
fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut entries = fs::read_dir(path)?
                .map(|entry| entry.map(|entry| entry.path()))
                .collect::<std::io::Result<Vec<_>>>()?;

            entries.retain(|entry| entry.is_file());
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }
    Ok(files)
}

/// One alias per certificate, numbered in presentation order.
fn certificate_store(base_alias: &str, certificates: &[Vec<u8>]) -> Result<CertObjectStore> {
    let mut store = CertObjectStore::new();

    for (index, der) in certificates.iter().enumerate() {
        match CertObject::crt_from_der(der) {
            Ok(object) => store.add(format!("{base_alias}-{}", index + 1), object)?,
            Err(e) => tracing::debug!("Skipping undecodable certificate #{} of {}: {}", index + 1, base_alias, e),
        }
    }
    if store.is_empty() && !certificates.is_empty() {
        return Err(CertError::not_found(format!("no decodable certificate from {base_alias}")));
    }
    Ok(store)
}
