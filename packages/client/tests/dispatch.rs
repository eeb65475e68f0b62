//! Reader dispatch order and outcomes

mod common;

use std::io::{BufRead, BufReader, Cursor, Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use certmgr_core::io::{dispatch, CertProvider, CertReader, ReadOutcome, UrlOpener};
use certmgr_core::{CertError, EngineConfig, NoPassword, PasswordCallback, ProviderRegistry, Result, StoreLoader};
use url::Url;

/// Reader recording its invocations and never recognizing anything.
struct RecordingReader {
    name: &'static str,
    patterns: &'static [&'static str],
    calls: Arc<Mutex<Vec<&'static str>>>,
    fail_with_password: bool,
}

impl CertProvider for RecordingReader {
    fn name(&self) -> &'static str {
        self.name
    }

    fn file_patterns(&self) -> &'static [&'static str] {
        self.patterns
    }

    fn file_type(&self) -> &'static str {
        "test"
    }

    fn file_extension(&self) -> &'static str {
        ".test"
    }

    fn is_encryption_supported(&self) -> bool {
        false
    }

    fn is_text(&self) -> bool {
        true
    }
}

impl CertReader for RecordingReader {
    fn read_binary(&self, input: &mut dyn Read, resource: &str, _password: &dyn PasswordCallback) -> Result<ReadOutcome> {
        let mut data = Vec::new();
        input.read_to_end(&mut data)?;
        self.calls.lock().expect("calls lock").push(self.name);

        if self.fail_with_password {
            Err(CertError::password_required(resource))
        } else {
            Ok(ReadOutcome::NotRecognized)
        }
    }
}

fn reader(name: &'static str, patterns: &'static [&'static str], calls: &Arc<Mutex<Vec<&'static str>>>) -> Arc<RecordingReader> {
    Arc::new(RecordingReader {
        name,
        patterns,
        calls: calls.clone(),
        fail_with_password: false,
    })
}

#[test]
fn test_matching_reader_tried_first() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ProviderRegistry::new();
    registry.register_reader(reader("R2", &["*.der"], &calls)).expect("register R2");
    registry.register_reader(reader("R", &["*.pem"], &calls)).expect("register R");

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("chain.pem");
    std::fs::write(&path, "irrelevant").expect("write file");

    let result = dispatch::read_file(&registry, &path, &NoPassword).expect("dispatch should not fail");

    assert!(result.is_none());
    assert_eq!(*calls.lock().expect("calls lock"), vec!["R", "R2"]);
}

#[test]
fn test_unrecognized_file_is_empty_outcome() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("readme.pem");
    std::fs::write(&path, "just some text").expect("write file");

    let result = dispatch::read_file(ProviderRegistry::builtin(), &path, &NoPassword).expect("dispatch should not fail");

    assert!(result.is_none());
}

#[test]
fn test_missing_file_is_error() {
    let dir = tempfile::tempdir().expect("temp dir");

    let err = dispatch::read_file(ProviderRegistry::builtin(), &dir.path().join("missing.pem"), &NoPassword)
        .expect_err("missing file should fail");

    assert!(err.is_io());
}

#[test]
fn test_unrecognized_string_is_not_found() {
    let err = dispatch::read_string(ProviderRegistry::builtin(), "just some text", "clipboard", &NoPassword)
        .expect_err("text is no certificate");

    assert!(err.is_not_found());
}

#[test]
fn test_password_required_propagates() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ProviderRegistry::new();
    registry
        .register_reader(Arc::new(RecordingReader {
            name: "locked",
            patterns: &["*.p12"],
            calls: calls.clone(),
            fail_with_password: true,
        }))
        .expect("register locked");
    registry.register_reader(reader("other", &[], &calls)).expect("register other");

    let err = dispatch::read_string(&registry, "data", "store.p12", &NoPassword).expect_err("password required");

    assert!(err.is_password_required());
    assert_eq!(*calls.lock().expect("calls lock"), vec!["locked"]);
}

#[test]
fn test_builtin_readers_recognize_pem_and_der() {
    let ca = common::root("Root");
    let dir = tempfile::tempdir().expect("temp dir");
    let der_path = dir.path().join("root.cer");
    let pem_path = dir.path().join("root.pem");
    std::fs::write(&der_path, &ca.cert_der).expect("write der");
    std::fs::write(&pem_path, ca.pem_with_key()).expect("write pem");

    let der = dispatch::read_file(ProviderRegistry::builtin(), &der_path, &NoPassword)
        .expect("dispatch der")
        .expect("DER recognized");
    let pem = dispatch::read_file(ProviderRegistry::builtin(), &pem_path, &NoPassword)
        .expect("dispatch pem")
        .expect("PEM recognized");

    assert_eq!(der.len(), 1);
    assert_eq!(der.aliases(), vec!["root"]);
    assert_eq!(pem.len(), 2);
    assert_eq!(pem.aliases(), vec!["root"]);
}

/// Opener serving fixed data, failing the first `failures` opens.
struct FlakyOpener {
    data: Vec<u8>,
    failures: usize,
    opened: AtomicUsize,
}

impl FlakyOpener {
    fn new(data: &[u8], failures: usize) -> Self {
        Self {
            data: data.to_vec(),
            failures,
            opened: AtomicUsize::new(0),
        }
    }
}

impl UrlOpener for FlakyOpener {
    fn open(&self, url: &Url) -> Result<Box<dyn Read>> {
        if self.opened.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, url.to_string()).into());
        }
        Ok(Box::new(Cursor::new(self.data.clone())))
    }
}

#[test]
fn test_url_readers_follow_last_segment() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut registry = ProviderRegistry::new();
    registry.register_reader(reader("R2", &["*.der"], &calls)).expect("register R2");
    registry.register_reader(reader("R", &["*.pem"], &calls)).expect("register R");

    let url = Url::parse("https://example.org/certs/chain.pem?download=1").expect("url");
    let opener = FlakyOpener::new(b"irrelevant", 0);

    let result = dispatch::read_url(&registry, &url, &opener, &NoPassword).expect("dispatch should not fail");

    assert!(result.is_none());
    assert_eq!(*calls.lock().expect("calls lock"), vec!["R", "R2"]);
}

#[test]
fn test_url_open_failure_moves_to_next_reader() {
    let ca = common::root("Root");
    let url = Url::parse("https://example.org/chain.pem").expect("url");
    let opener = FlakyOpener::new(&ca.cert_der, 1);

    let store = dispatch::read_url(ProviderRegistry::builtin(), &url, &opener, &NoPassword)
        .expect("dispatch should not fail")
        .expect("DER reader recognizes the data");

    assert_eq!(opener.opened.load(Ordering::SeqCst), 2);
    assert_eq!(store.aliases(), vec!["chain"]);
}

#[test]
fn test_url_exhausted_readers_is_empty_outcome() {
    let url = Url::parse("https://example.org/chain.pem").expect("url");
    let opener = FlakyOpener::new(b"", usize::MAX);

    let result = dispatch::read_url(ProviderRegistry::builtin(), &url, &opener, &NoPassword)
        .expect("open failures are not surfaced");

    assert!(result.is_none());
}

/// Serve `body` over HTTP/1.0 with the given status line to every connection.
fn serve(status: &'static str, body: String) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("local addr").port();

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut request = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut line = String::new();

            while request.read_line(&mut line).map(|n| n > 0).unwrap_or(false) && line != "\r\n" {
                line.clear();
            }
            let response = format!(
                "HTTP/1.0 {status}\r\nContent-Type: application/x-pem-file\r\nContent-Length: {}\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });
    port
}

#[test]
fn test_load_url_over_http() {
    let ca = common::root("Root");
    let port = serve("200 OK", ca.cert_pem.clone());
    let url = Url::parse(&format!("http://127.0.0.1:{port}/root.pem")).expect("url");

    let store = StoreLoader::new(ProviderRegistry::builtin(), EngineConfig::default())
        .load_url(&url)
        .expect("load url");

    assert_eq!(store.entries().count(), 1);
    assert_eq!(common::entry(&store, "Root").id().to_string(), "root");
}

#[test]
fn test_load_url_http_error_is_empty_store() {
    let port = serve("404 Not Found", String::new());
    let url = Url::parse(&format!("http://127.0.0.1:{port}/missing.pem")).expect("url");

    let store = StoreLoader::new(ProviderRegistry::builtin(), EngineConfig::default())
        .load_url(&url)
        .expect("load url");

    assert_eq!(store.entries().count(), 0);
}

#[test]
fn test_load_url_rejects_unsupported_scheme() {
    let url = Url::parse("ftp://example.org/root.pem").expect("url");

    let err = StoreLoader::new(ProviderRegistry::builtin(), EngineConfig::default())
        .load_url(&url)
        .expect_err("ftp is not supported");

    assert!(matches!(err, CertError::InvalidArgument(_)));
}
