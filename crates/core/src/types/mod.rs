//! Core domain types shared across the workspace

pub mod fingerprint;

pub use fingerprint::Fingerprint;
