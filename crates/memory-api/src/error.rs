use thiserror::Error;

use crate::DiagnosticKind;

/// Failures that abort an operation instead of degrading to a default value.
///
/// Every other anomaly (unknown domain names, out-of-range bytes, non-writable
/// domains) is reported through the diagnostics channel and the operation
/// continues.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum MemoryApiError {
    /// The machine exposes no usable memory-domain capability.
    #[error("{machine} does not implement memory domains")]
    UnsupportedCapability {
        /// Human-readable machine name.
        machine: String,
    },
    /// A hash range starts outside the domain or runs past its end.
    #[error(
        "address {addr} + count {count} is outside the bounds of domain {domain} (size {size})"
    )]
    HashRangeInvalid {
        /// Requested start address.
        addr: i64,
        /// Requested byte count.
        count: usize,
        /// Name of the resolved domain.
        domain: String,
        /// Size of the resolved domain in bytes.
        size: u64,
    },
}

impl MemoryApiError {
    /// Returns the diagnostic kind reported alongside this error.
    #[must_use]
    pub const fn kind(&self) -> DiagnosticKind {
        match self {
            Self::UnsupportedCapability { .. } => DiagnosticKind::UnsupportedCapability,
            Self::HashRangeInvalid { .. } => DiagnosticKind::HashRangeInvalid,
        }
    }
}
