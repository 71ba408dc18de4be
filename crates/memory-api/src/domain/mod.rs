//! Capability traits a host machine implements to expose its memory domains.

/// Reference in-memory domain containers.
pub mod store;

pub use store::{ByteDomain, DomainList, DomainListError, StaticMachine};

/// One named, sized, byte-addressable address space.
///
/// Addresses passed to [`MemoryDomain::peek_byte`] and
/// [`MemoryDomain::poke_byte`] are always below [`MemoryDomain::size`]; the
/// access layer never forwards an out-of-range address.
pub trait MemoryDomain {
    /// Unique domain name within its machine.
    fn name(&self) -> &str;

    /// Size in bytes; valid addresses are `0..size`.
    fn size(&self) -> u64;

    /// Whether bytes can be peeked.
    fn is_readable(&self) -> bool {
        true
    }

    /// Whether bytes can be poked.
    fn is_writable(&self) -> bool;

    /// Reads one byte without bus side effects.
    fn peek_byte(&self, addr: u64) -> u8;

    /// Writes one byte without bus side effects.
    fn poke_byte(&mut self, addr: u64, value: u8);
}

/// Ordered set of domains exposed by a machine.
pub trait MemoryDomains {
    /// Number of domains.
    fn len(&self) -> usize;

    /// Returns `true` when no domain is exposed.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Domain at `index` in registry order.
    fn domain(&self, index: usize) -> Option<&dyn MemoryDomain>;

    /// Mutable domain at `index` in registry order.
    fn domain_mut(&mut self, index: usize) -> Option<&mut dyn MemoryDomain>;

    /// Index of the system-bus domain, when the machine has one.
    fn system_bus(&self) -> Option<usize> {
        None
    }

    /// Index of the main-memory domain.
    fn main_memory(&self) -> usize {
        0
    }

    /// Index of the domain named `name`.
    fn position(&self, name: &str) -> Option<usize> {
        (0..self.len()).find(|&index| self.domain(index).is_some_and(|d| d.name() == name))
    }
}

/// Host machine handle consumed by the memory API.
pub trait Machine {
    /// Human-readable machine name used in diagnostics.
    fn name(&self) -> &str;

    /// Memory-domain capability, when the machine has one.
    fn memory_domains_mut(&mut self) -> Option<&mut dyn MemoryDomains>;
}

/// Snapshot of one domain's identity and capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DomainInfo {
    /// Domain name.
    pub name: String,
    /// Size in bytes.
    pub size: u64,
    /// Peek support.
    pub readable: bool,
    /// Poke support.
    pub writable: bool,
    /// Whether this is the machine's system bus.
    pub is_system_bus: bool,
}

impl DomainInfo {
    /// Captures the state of `domain`.
    #[must_use]
    pub fn of(domain: &dyn MemoryDomain, is_system_bus: bool) -> Self {
        Self {
            name: domain.name().to_string(),
            size: domain.size(),
            readable: domain.is_readable(),
            writable: domain.is_writable(),
            is_system_bus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DomainInfo, MemoryDomains};
    use crate::{ByteDomain, DomainList};

    #[test]
    fn position_finds_domains_by_exact_name() {
        let domains = DomainList::new(vec![
            ByteDomain::new("RAM", 16),
            ByteDomain::read_only("ROM", vec![0; 8]),
        ])
        .expect("unique names");

        assert_eq!(domains.position("RAM"), Some(0));
        assert_eq!(domains.position("ROM"), Some(1));
        assert_eq!(domains.position("rom"), None);
        assert_eq!(domains.position(""), None);
    }

    #[test]
    fn info_snapshot_reflects_flags() {
        let rom = ByteDomain::read_only("ROM", vec![0; 8]);
        let info = DomainInfo::of(&rom, false);
        assert_eq!(info.name, "ROM");
        assert_eq!(info.size, 8);
        assert!(info.readable);
        assert!(!info.writable);
        assert!(!info.is_system_bus);
    }
}
