//! Reader dispatch over format-ambiguous input
//!
//! The file name only biases the trial order; every reader gets a chance.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use url::Url;

use crate::certs::objects::CertObjectStore;
use crate::certs::password::PasswordCallback;
use crate::error::{CertError, Result};

use super::provider::{CertReader, ReadOutcome};
use super::registry::ProviderRegistry;
use super::url::{url_file_name, UrlOpener};

/// Result of a single trial decode.
enum Trial {
    Done(CertObjectStore),
    Next,
}

fn evaluate(reader: &dyn CertReader, resource: &str, outcome: Result<ReadOutcome>) -> Result<Trial> {
    match outcome {
        Ok(ReadOutcome::Recognized(store)) => {
            tracing::debug!("{} recognized {} ({} objects)", reader.name(), resource, store.len());
            Ok(Trial::Done(store))
        }
        Ok(ReadOutcome::NotRecognized) => Ok(Trial::Next),
        Err(e) if e.is_password_required() => Err(e),
        Err(e) => {
            tracing::debug!("{} failed to read {}: {}", reader.name(), resource, e);
            Ok(Trial::Next)
        }
    }
}

/// Read a file trying every registered reader.
///
/// Returns `Ok(None)` when no reader recognizes the data. Failing to open
/// the file is an error.
pub fn read_file(
    registry: &ProviderRegistry,
    path: &Path,
    password: &dyn PasswordCallback,
) -> Result<Option<CertObjectStore>> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let resource = path.display().to_string();

    for reader in registry.readers_for_file(&file_name) {
        let mut input = BufReader::new(File::open(path)?);
        let outcome = reader.read_binary(&mut input, &resource, password);

        if let Trial::Done(store) = evaluate(reader, &resource, outcome)? {
            return Ok(Some(store));
        }
    }
    tracing::debug!("No certificate data recognized in {}", resource);
    Ok(None)
}

/// Read a URL trying every registered reader; open failures are skipped too.
pub fn read_url(
    registry: &ProviderRegistry,
    url: &Url,
    opener: &dyn UrlOpener,
    password: &dyn PasswordCallback,
) -> Result<Option<CertObjectStore>> {
    let file_name = url_file_name(url);
    let resource = url.to_string();

    for reader in registry.readers_for_file(&file_name) {
        let mut input = match opener.open(url) {
            Ok(input) => input,
            Err(e) => {
                tracing::debug!("{} could not open {}: {}", reader.name(), resource, e);
                continue;
            }
        };
        let outcome = reader.read_binary(&mut input, &resource, password);

        if let Trial::Done(store) = evaluate(reader, &resource, outcome)? {
            return Ok(Some(store));
        }
    }
    tracing::debug!("No certificate data recognized in {}", resource);
    Ok(None)
}

/// Read string data trying every reader in registration order.
///
/// Unrecognized data is a [`CertError::NotFound`] error.
pub fn read_string(
    registry: &ProviderRegistry,
    data: &str,
    resource: &str,
    password: &dyn PasswordCallback,
) -> Result<CertObjectStore> {
    for reader in registry.readers() {
        let outcome = reader.read_string(data, resource, password);

        if let Trial::Done(store) = evaluate(reader, resource, outcome)? {
            return Ok(store);
        }
    }
    Err(CertError::not_found(format!("no certificate data recognized in {resource}")))
}
