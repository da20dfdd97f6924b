//! Probe source generation and family classification
//!
//! This module owns the static side of probing: the compiler family enum and
//! the minimal source fragments compiled to make a toolchain announce itself.

pub mod family;
pub mod fragment;

pub use family::CompilerFamily;
pub use fragment::{FragmentError, ProbeFragment, ProbeKind, DELIMITER};
