//! Classification of asset addresses into external URLs and local paths.

use std::sync::OnceLock;

use regex::Regex;

/// Where an address points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressClass {
    /// Carries a scheme (`https://`, `ftp://`) or is protocol relative (`//cdn`).
    /// Always treated as present; never read from disk.
    External,
    /// Resolved against the kind's source directory.
    Local,
}

fn scheme_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:[a-z][a-z0-9+.\-]*:)?//").expect("invalid scheme regex")
    })
}

/// Classify an address by the presence of a scheme prefix.
pub fn classify(address: &str) -> AddressClass {
    if scheme_pattern().is_match(address.trim_start()) {
        AddressClass::External
    } else {
        AddressClass::Local
    }
}

/// Shorthand for `classify(address) == AddressClass::External`.
pub fn is_external(address: &str) -> bool {
    classify(address) == AddressClass::External
}
