//! Remote server address normalization.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

/// Port the remote test server listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 8270;

lazy_static! {
    static ref PORT_SUFFIX: Regex = Regex::new(r"^.*:[0-9]{1,5}$").unwrap();
}

/// Turns a user-supplied server address into a URL the RPC client can dial.
///
/// A `:default_port` suffix is added when the address does not already end in
/// `:<1-5 digits>`, then `http://` is prepended unless the address already starts
/// with `http` in any case.
///
/// The port check looks only at the tail of the string, so a scheme-qualified
/// host without a port still gets one: `http://myhost` becomes
/// `http://myhost:8270`. Existing callers depend on this.
///
/// Surrounding whitespace is trimmed first, so an address read together with
/// its trailing newline is treated like the bare address.
pub fn normalize_address(address: &str, default_port: u16) -> String {
    let address = address.trim();
    let mut normalized = if PORT_SUFFIX.is_match(address) {
        address.to_string()
    } else {
        format!("{address}:{default_port}")
    };
    let has_scheme = normalized
        .get(..4)
        .map_or(false, |prefix| prefix.eq_ignore_ascii_case("http"));
    if !has_scheme {
        normalized.insert_str(0, "http://");
    }
    debug!(address, %normalized, "normalize_address");
    normalized
}
