//! Shipyard PyPI - PyPI index polling for the shipyard CLI
//!
//! After a publish, PyPI takes a short while to serve the new version
//! from its JSON metadata endpoint. This crate polls that endpoint at a
//! fixed interval until the version appears or attempts run out.

mod client;

pub use client::{Error, PyPiClient, Result};
