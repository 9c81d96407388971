//! # rfshuttle Core Library
//!
//! Helpers for a remote test runner that ships suites to a test server over a
//! text-only RPC channel and runs them there.
//!
//! ## Key Modules
//!
//! - [`bundle`]: zips directory trees into transport text and unpacks them again.
//! - [`transport`]: the base64 boundary between bytes and RPC payload text.
//! - [`textio`]: reads and writes text files in an explicit encoding.
//! - [`address`]: turns a user-supplied server address into a dialable URL.
//! - [`ancestry`]: suite trees and the ancestor path used to place a suite remotely.
//!
//! ## Examples
//!
//! ```
//! use rfshuttle::address::{normalize_address, DEFAULT_PORT};
//! use rfshuttle::ancestry::SuiteTree;
//!
//! assert_eq!(normalize_address("localhost", DEFAULT_PORT), "http://localhost:8270");
//!
//! let mut tree = SuiteTree::new();
//! let test = tree.chain(&["Root", "Mid", "Leaf", "Login"]).unwrap();
//! assert_eq!(tree.ancestor_path(test).unwrap(), "Root/Mid/Leaf");
//! ```

pub mod address;
pub mod ancestry;
pub mod bundle;
pub mod cli;
pub mod cli_runner;
pub mod error;
pub use error::{Result, ShuttleError};
pub mod telemetry;
pub mod textio;
pub mod transport;

// Cross-platform filesystem wrapper
pub mod fsx;
