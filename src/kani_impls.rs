//! Kani proof harnesses for the percent-encoding primitives.
//!
//! # Usage
//!
//! Kani is not a Cargo dependency. Install and run with:
//!
//! ```bash
//! cargo install --locked kani-verifier
//! cargo kani setup
//! cargo kani --features kani
//! ```
//!
//! This module is only compiled when using Kani (`#[cfg(kani)]`).

use crate::escape::{ByteSet, hex_value, pct_triplet};

/// Predefined sets, for picking one nondeterministically
const SETS: [ByteSet; 6] = [
    ByteSet::EMPTY,
    ByteSet::RFC2396_UNRESERVED,
    ByteSet::RFC2396_RESERVED,
    ByteSet::RFC3986_UNRESERVED,
    ByteSet::RFC3986_SUB_DELIMS,
    ByteSet::RFC3986_GEN_DELIMS,
];

fn arbitrary_set() -> ByteSet {
    let idx: usize = kani::any();
    SETS[idx % SETS.len()]
}

#[kani::proof]
fn triplet_decodes_to_octet() {
    let b: u8 = kani::any();
    let [pct, hi, lo] = pct_triplet(b);
    assert_eq!(pct, b'%');
    let hi = hex_value(hi).unwrap();
    let lo = hex_value(lo).unwrap();
    assert_eq!((hi << 4) | lo, b);
}

#[kani::proof]
fn triplet_is_upper_case() {
    let b: u8 = kani::any();
    let [_, hi, lo] = pct_triplet(b);
    assert!(!hi.is_ascii_lowercase());
    assert!(!lo.is_ascii_lowercase());
}

#[kani::proof]
fn hex_value_is_a_nibble() {
    let b: u8 = kani::any();
    if let Some(v) = hex_value(b) {
        assert!(v < 16);
        assert!(b.is_ascii_hexdigit());
    } else {
        assert!(!b.is_ascii_hexdigit());
    }
}

#[kani::proof]
fn sets_never_allow_percent_or_non_ascii() {
    let set = arbitrary_set();
    let b: u8 = kani::any();
    if set.contains(b) {
        assert!(b.is_ascii());
        assert!(b != b'%');
    }
}

#[kani::proof]
fn union_and_difference_are_pointwise() {
    let a = arbitrary_set();
    let c = arbitrary_set();
    let b: u8 = kani::any();
    assert_eq!(a.union(c).contains(b), a.contains(b) || c.contains(b));
    assert_eq!(a.difference(c).contains(b), a.contains(b) && !c.contains(b));
}
