//! `StoreBuilder`: fluent loading of certificate stores

use std::path::PathBuf;

use certmgr_core::config::Validator;
use certmgr_core::io::UrlOpener;
use certmgr_core::{CertError, EngineConfig, PasswordCallback, ProviderRegistry, Result, StoreLoader, UserCertStore};
use url::Url;

/// Where a store is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreSource {
    Files(Vec<PathBuf>),
    Url(String),
    Data { data: String, resource: String },
    Server { host: String, port: u16 },
    Platform,
}

/// Builder for loading a [`UserCertStore`].
///
/// ```rust,no_run
/// use certmgr::CertMgr;
///
/// let store = CertMgr::store().file("chain.pem").load()?;
/// # Ok::<(), certmgr::CertError>(())
/// ```
pub struct StoreBuilder<'a> {
    pub(crate) registry: &'a ProviderRegistry,
    pub(crate) config: EngineConfig,
    pub(crate) password: Option<&'a dyn PasswordCallback>,
    pub(crate) url_opener: Option<&'a dyn UrlOpener>,
    pub(crate) source: Option<StoreSource>,
    pub(crate) debug_enabled: bool,
}

impl<'a> StoreBuilder<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: ProviderRegistry::builtin(),
            config: EngineConfig::default(),
            password: None,
            url_opener: None,
            source: None,
            debug_enabled: false,
        }
    }

    /// Use another provider registry than the builtin one.
    #[must_use]
    pub fn registry(mut self, registry: &'a ProviderRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Callback answering password queries for encrypted keys.
    #[must_use]
    pub fn password(mut self, password: &'a dyn PasswordCallback) -> Self {
        self.password = Some(password);
        self
    }

    /// Opener replacing the built-in `file`, `http` and `https` handling.
    #[must_use]
    pub fn url_opener(mut self, opener: &'a dyn UrlOpener) -> Self {
        self.url_opener = Some(opener);
        self
    }

    /// Log the load at debug level.
    #[must_use]
    pub fn debug(mut self) -> Self {
        self.debug_enabled = true;
        self
    }

    #[must_use]
    pub fn file(self, path: impl Into<PathBuf>) -> Self {
        self.files([path.into()])
    }

    /// Files or directories; a directory contributes its regular files.
    #[must_use]
    pub fn files<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.source = Some(StoreSource::Files(paths.into_iter().map(Into::into).collect()));
        self
    }

    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.source = Some(StoreSource::Url(url.into()));
        self
    }

    #[must_use]
    pub fn data(mut self, data: impl Into<String>, resource: impl Into<String>) -> Self {
        self.source = Some(StoreSource::Data {
            data: data.into(),
            resource: resource.into(),
        });
        self
    }

    /// Certificates presented by a TLS server.
    #[must_use]
    pub fn server(mut self, host: impl Into<String>, port: u16) -> Self {
        self.source = Some(StoreSource::Server {
            host: host.into(),
            port,
        });
        self
    }

    /// The platform trust store.
    #[must_use]
    pub fn platform(mut self) -> Self {
        self.source = Some(StoreSource::Platform);
        self
    }

    /// Load the store from the selected source.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` without a source or for a malformed URL, otherwise
    /// whatever the source reports.
    pub fn load(self) -> Result<UserCertStore> {
        self.config.validate()?;

        let source = self
            .source
            .ok_or_else(|| CertError::invalid_argument("no store source selected"))?;

        if self.debug_enabled {
            tracing::debug!("Loading certificate store from {:?}", source);
        }

        let mut loader = StoreLoader::new(self.registry, self.config);
        if let Some(password) = self.password {
            loader = loader.with_password(password);
        }
        if let Some(opener) = self.url_opener {
            loader = loader.with_url_opener(opener);
        }

        let store = match &source {
            StoreSource::Files(paths) => loader.load_files(paths)?,
            StoreSource::Url(url) => {
                let url = Url::parse(url).map_err(|e| CertError::invalid_argument(format!("invalid URL '{url}': {e}")))?;
                loader.load_url(&url)?
            }
            StoreSource::Data { data, resource } => loader.load_data(data, resource)?,
            StoreSource::Server { host, port } => loader.load_server(host, *port)?,
            StoreSource::Platform => loader.load_platform()?,
        };

        if self.debug_enabled {
            tracing::debug!("Loaded {} entries from {:?}", store.len(), source);
        }
        Ok(store)
    }
}

impl Default for StoreBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}
