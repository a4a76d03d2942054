//! SHA-256 digest maps, zip manifests and checksum sidecars.

pub mod cli;
pub mod digest_map;
pub mod hashing;
pub mod logging;
pub mod manifest;
pub mod paths;
pub mod pool;
pub mod sidecar;
