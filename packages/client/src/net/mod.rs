//! Certificate sources outside of the file system

pub mod platform;
pub mod ssl_peer;

pub use platform::load_platform_certificates;
pub use ssl_peer::fetch_peer_certificates;
