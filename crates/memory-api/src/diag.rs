//! Diagnostics channel for recoverable and fatal memory-access anomalies.
//!
//! The channel is purely observational: emitting a diagnostic never changes
//! the outcome of the operation that produced it.

use std::fmt;

/// Severity attached to every emitted diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Severity {
    /// A default or no-op was substituted and the operation continued.
    Warning,
    /// An operation was rejected outright, whether or not the call itself fails.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Error => f.write_str("error"),
        }
    }
}

/// Anomaly taxonomy used for diagnostics aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum DiagnosticKind {
    /// Machine exposes no memory-domain capability.
    UnsupportedCapability,
    /// Domain name lookup failed.
    DomainNotFound,
    /// Read touched addresses outside the domain.
    OutOfRangeRead,
    /// Write touched addresses outside the domain.
    OutOfRangeWrite,
    /// Write targeted a domain without poke support.
    ///
    /// No byte of the write is applied, so this reports at error severity even
    /// though the call still returns `Ok`.
    NotWritable,
    /// Read targeted a domain without peek support.
    NotReadable,
    /// Hash range was partially or fully outside the domain.
    HashRangeInvalid,
}

impl DiagnosticKind {
    /// All kinds in counter order.
    pub const ALL: [Self; 7] = [
        Self::UnsupportedCapability,
        Self::DomainNotFound,
        Self::OutOfRangeRead,
        Self::OutOfRangeWrite,
        Self::NotWritable,
        Self::NotReadable,
        Self::HashRangeInvalid,
    ];

    /// Returns the severity reported for this kind.
    ///
    /// Severity is independent of [`Self::is_fatal`]: a rejected write is an
    /// error that the caller never sees as a failure.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::DomainNotFound
            | Self::OutOfRangeRead
            | Self::OutOfRangeWrite
            | Self::NotReadable => Severity::Warning,
            Self::UnsupportedCapability | Self::NotWritable | Self::HashRangeInvalid => {
                Severity::Error
            }
        }
    }

    /// Kinds that are also surfaced to the caller as a [`crate::MemoryApiError`].
    #[must_use]
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::UnsupportedCapability | Self::HashRangeInvalid)
    }

    const fn index(self) -> usize {
        match self {
            Self::UnsupportedCapability => 0,
            Self::DomainNotFound => 1,
            Self::OutOfRangeRead => 2,
            Self::OutOfRangeWrite => 3,
            Self::NotWritable => 4,
            Self::NotReadable => 5,
            Self::HashRangeInvalid => 6,
        }
    }
}

/// One human-readable anomaly report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Anomaly classification.
    pub kind: DiagnosticKind,
    /// Human-readable description naming the address, domain and size involved.
    pub message: String,
}

impl Diagnostic {
    /// Creates a diagnostic of `kind` with `message`.
    #[must_use]
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the severity implied by the diagnostic kind.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.kind.severity()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity(), self.message)
    }
}

/// Receiver for diagnostics emitted by the memory API.
pub trait DiagnosticSink {
    /// Records one diagnostic in emission order.
    fn emit(&mut self, diagnostic: &Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(&Diagnostic),
{
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self(diagnostic);
    }
}

/// Default sink forwarding diagnostics to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        match diagnostic.severity() {
            Severity::Warning => tracing::warn!(
                target: "memory_api::diag",
                kind = ?diagnostic.kind,
                "{}",
                diagnostic.message
            ),
            Severity::Error => tracing::error!(
                target: "memory_api::diag",
                kind = ?diagnostic.kind,
                "{}",
                diagnostic.message
            ),
        }
    }
}

/// Sink that keeps every diagnostic in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordingSink {
    diagnostics: Vec<Diagnostic>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns recorded diagnostics in emission order.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of recorded diagnostics.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns `true` when nothing has been recorded.
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Number of recorded diagnostics of `kind`.
    #[must_use]
    pub fn count_of(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }

    /// Returns the most recent diagnostic.
    #[must_use]
    pub fn last(&self) -> Option<&Diagnostic> {
        self.diagnostics.last()
    }

    /// Removes and returns all recorded diagnostics.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        self.diagnostics.push(diagnostic.clone());
    }
}

/// Saturating per-kind diagnostic counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DiagnosticCounters {
    counts: [u32; DiagnosticKind::ALL.len()],
    last_kind: Option<DiagnosticKind>,
}

impl DiagnosticCounters {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one occurrence of `kind`.
    pub fn record(&mut self, kind: DiagnosticKind) {
        let slot = &mut self.counts[kind.index()];
        *slot = slot.saturating_add(1);
        self.last_kind = Some(kind);
    }

    /// Occurrences of `kind` since creation or the last reset.
    #[must_use]
    pub const fn count(&self, kind: DiagnosticKind) -> u32 {
        self.counts[kind.index()]
    }

    /// Saturating sum over all kinds.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.counts
            .iter()
            .fold(0_u32, |acc, count| acc.saturating_add(*count))
    }

    /// Kind of the most recently recorded diagnostic.
    #[must_use]
    pub const fn last_kind(&self) -> Option<DiagnosticKind> {
        self.last_kind
    }

    /// Resets every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Sink plus counters; the single route every anomaly takes.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticChannel<S> {
    sink: S,
    counters: DiagnosticCounters,
}

impl<S: DiagnosticSink> DiagnosticChannel<S> {
    /// Wraps `sink` with zeroed counters.
    #[must_use]
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            counters: DiagnosticCounters::default(),
        }
    }

    /// Counts and forwards one diagnostic.
    pub fn emit(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        let diagnostic = Diagnostic::new(kind, message);
        self.counters.record(kind);
        self.sink.emit(&diagnostic);
    }

    /// Returns the wrapped sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Returns the wrapped sink mutably.
    #[allow(clippy::missing_const_for_fn)]
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Returns the counters.
    #[must_use]
    pub const fn counters(&self) -> &DiagnosticCounters {
        &self.counters
    }

    /// Resets the counters without touching the sink.
    pub fn reset_counters(&mut self) {
        self.counters.reset();
    }

    /// Consumes the channel and returns the sink.
    #[must_use]
    pub fn into_sink(self) -> S {
        self.sink
    }
}
