//! # aluforce_core
//!
//! Core authentication and permission logic for the Aluforce ERP.

pub mod auth;
pub mod config;
pub mod db;
pub mod models;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
