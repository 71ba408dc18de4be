//! Current-domain binding and caller name resolution.
//!
//! The binding starts [`DomainBinding::Unbound`] and is bound to the system
//! bus (or main memory when there is no bus) the first time a domain is
//! needed. Afterwards it only changes through a successful
//! [`DomainResolver::select`]; failed selections leave it untouched.

use crate::{DiagnosticChannel, DiagnosticKind, DiagnosticSink, MemoryDomains};

/// Current-domain binding state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DomainBinding {
    /// No domain used yet.
    #[default]
    Unbound,
    /// Bound to the domain at this registry index.
    Bound(usize),
}

/// How a caller-supplied domain name was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// The named domain exists.
    Named(usize),
    /// The name was unknown; the current domain was used instead.
    Fallback(usize),
    /// No name was given; the current domain was used.
    Current(usize),
}

impl Resolution {
    /// Registry index of the resolved domain.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Named(index) | Self::Fallback(index) | Self::Current(index) => index,
        }
    }
}

/// Tracks the current domain of one accessor instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DomainResolver {
    binding: DomainBinding,
}

impl DomainResolver {
    /// Creates an unbound resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            binding: DomainBinding::Unbound,
        }
    }

    /// Current binding state.
    #[must_use]
    pub const fn binding(&self) -> DomainBinding {
        self.binding
    }

    /// Index of the current domain, binding the default on first use.
    ///
    /// Returns `None` only when the registry has no usable default domain.
    pub fn current(&mut self, domains: &dyn MemoryDomains) -> Option<usize> {
        if let DomainBinding::Bound(index) = self.binding {
            if index < domains.len() {
                return Some(index);
            }
        }

        let index = default_index(domains)?;
        tracing::trace!(index, "binding default memory domain");
        self.binding = DomainBinding::Bound(index);
        Some(index)
    }

    /// Rebinds to the domain named `name`.
    ///
    /// Unknown names emit [`DiagnosticKind::DomainNotFound`], keep the
    /// current binding and return `false`.
    pub fn select<S: DiagnosticSink>(
        &mut self,
        domains: &dyn MemoryDomains,
        name: &str,
        diagnostics: &mut DiagnosticChannel<S>,
    ) -> bool {
        if let Some(index) = domains.position(name) {
            tracing::debug!(name, index, "selected memory domain");
            self.binding = DomainBinding::Bound(index);
            true
        } else {
            diagnostics.emit(
                DiagnosticKind::DomainNotFound,
                format!("Unable to find domain: {name}"),
            );
            false
        }
    }

    /// Resolves an optional caller-supplied name.
    ///
    /// Empty names count as absent. Unknown names emit
    /// [`DiagnosticKind::DomainNotFound`] and fall back to the current domain.
    pub fn resolve<S: DiagnosticSink>(
        &mut self,
        domains: &dyn MemoryDomains,
        name: Option<&str>,
        diagnostics: &mut DiagnosticChannel<S>,
    ) -> Option<Resolution> {
        match name.filter(|name| !name.is_empty()) {
            Some(name) => {
                if let Some(index) = domains.position(name) {
                    return Some(Resolution::Named(index));
                }
                diagnostics.emit(
                    DiagnosticKind::DomainNotFound,
                    format!("Unable to find domain: {name}, falling back to current"),
                );
                self.current(domains).map(Resolution::Fallback)
            }
            None => self.current(domains).map(Resolution::Current),
        }
    }
}

fn default_index(domains: &dyn MemoryDomains) -> Option<usize> {
    let len = domains.len();
    domains
        .system_bus()
        .filter(|&index| index < len)
        .or_else(|| Some(domains.main_memory()).filter(|&index| index < len))
}
