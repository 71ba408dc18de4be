//! Typed memory access layer for the memory domains of an emulated machine.

/// Host-side capability traits and reference domain containers.
pub mod domain;
pub use domain::{
    ByteDomain, DomainInfo, DomainList, DomainListError, Machine, MemoryDomain, MemoryDomains,
    StaticMachine,
};

/// Pure width, byte-order and range-clipping helpers.
pub mod access;
pub use access::{
    byte_shift, clip_range, offset_address, sign_extend, AccessRequest, AccessWidth, Endianness,
    RangeClip,
};

/// Diagnostics channel, sinks and counters.
pub mod diag;
pub use diag::{
    Diagnostic, DiagnosticChannel, DiagnosticCounters, DiagnosticKind, DiagnosticSink,
    RecordingSink, Severity, TracingSink,
};

/// Fatal error taxonomy surfaced to callers.
pub mod error;
pub use error::MemoryApiError;

/// Lazy current-domain binding and name resolution.
pub mod resolver;
pub use resolver::{DomainBinding, DomainResolver, Resolution};

/// Byte-primitive accessor engine.
pub mod engine;
pub use engine::MAX_RANGE_LEN;

/// SHA-256 digests over in-bounds domain ranges.
pub mod hash;
pub use hash::{digest_hex, hash_bounds, DIGEST_HEX_LEN};

/// Caller-facing memory API.
pub mod api;
pub use api::{ApiConfig, MemoryApi};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
