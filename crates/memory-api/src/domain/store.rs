//! Boxed-slice domains and an ordered domain list for hosts without their own.

use thiserror::Error;

use super::{Machine, MemoryDomain, MemoryDomains};

/// Domain backed by a zero-initialized or preloaded byte buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ByteDomain {
    name: String,
    bytes: Box<[u8]>,
    readable: bool,
    writable: bool,
}

impl ByteDomain {
    /// Creates a zeroed writable domain of `size` bytes.
    #[must_use]
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self::with_bytes(name, vec![0; size])
    }

    /// Creates a writable domain holding `bytes`.
    #[must_use]
    pub fn with_bytes(name: impl Into<String>, bytes: impl Into<Box<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            readable: true,
            writable: true,
        }
    }

    /// Creates a read-only domain holding `bytes`.
    #[must_use]
    pub fn read_only(name: impl Into<String>, bytes: impl Into<Box<[u8]>>) -> Self {
        Self::with_bytes(name, bytes).writable(false)
    }

    /// Overrides the write capability.
    #[must_use]
    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }

    /// Overrides the read capability.
    #[must_use]
    pub fn readable(mut self, readable: bool) -> Self {
        self.readable = readable;
        self
    }

    /// Backing bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Backing bytes, mutably, bypassing the write capability.
    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl MemoryDomain for ByteDomain {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    fn is_readable(&self) -> bool {
        self.readable
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn peek_byte(&self, addr: u64) -> u8 {
        usize::try_from(addr)
            .ok()
            .and_then(|index| self.bytes.get(index).copied())
            .unwrap_or(0)
    }

    fn poke_byte(&mut self, addr: u64, value: u8) {
        if let Some(slot) = usize::try_from(addr)
            .ok()
            .and_then(|index| self.bytes.get_mut(index))
        {
            *slot = value;
        }
    }
}

/// Errors raised while assembling a [`DomainList`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum DomainListError {
    /// Two domains share a name.
    #[error("duplicate memory domain name: {0}")]
    DuplicateName(String),
    /// A designated domain name is not in the list.
    #[error("unknown memory domain: {0}")]
    UnknownDomain(String),
}

/// Ordered domain registry with optional system-bus and main-memory designation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DomainList {
    domains: Vec<ByteDomain>,
    system_bus: Option<usize>,
    main_memory: usize,
}

impl DomainList {
    /// Builds a registry; the first domain is main memory.
    ///
    /// # Errors
    ///
    /// Returns [`DomainListError::DuplicateName`] when two domains share a name.
    pub fn new(domains: Vec<ByteDomain>) -> Result<Self, DomainListError> {
        for (index, domain) in domains.iter().enumerate() {
            if domains[..index].iter().any(|d| d.name == domain.name) {
                return Err(DomainListError::DuplicateName(domain.name.clone()));
            }
        }
        Ok(Self {
            domains,
            system_bus: None,
            main_memory: 0,
        })
    }

    /// Designates the domain named `name` as the system bus.
    ///
    /// # Errors
    ///
    /// Returns [`DomainListError::UnknownDomain`] when no domain is named `name`.
    pub fn with_system_bus(mut self, name: &str) -> Result<Self, DomainListError> {
        self.system_bus = Some(self.require(name)?);
        Ok(self)
    }

    /// Designates the domain named `name` as main memory.
    ///
    /// # Errors
    ///
    /// Returns [`DomainListError::UnknownDomain`] when no domain is named `name`.
    pub fn with_main_memory(mut self, name: &str) -> Result<Self, DomainListError> {
        self.main_memory = self.require(name)?;
        Ok(self)
    }

    /// Domain named `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ByteDomain> {
        self.domains.iter().find(|d| d.name == name)
    }

    /// Mutable domain named `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ByteDomain> {
        self.domains.iter_mut().find(|d| d.name == name)
    }

    fn require(&self, name: &str) -> Result<usize, DomainListError> {
        self.position(name)
            .ok_or_else(|| DomainListError::UnknownDomain(name.to_string()))
    }
}

impl MemoryDomains for DomainList {
    fn len(&self) -> usize {
        self.domains.len()
    }

    fn domain(&self, index: usize) -> Option<&dyn MemoryDomain> {
        self.domains.get(index).map(|d| d as &dyn MemoryDomain)
    }

    fn domain_mut(&mut self, index: usize) -> Option<&mut dyn MemoryDomain> {
        self.domains
            .get_mut(index)
            .map(|d| d as &mut dyn MemoryDomain)
    }

    fn system_bus(&self) -> Option<usize> {
        self.system_bus
    }

    fn main_memory(&self) -> usize {
        self.main_memory
    }
}

/// Named machine holding an optional domain registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticMachine {
    name: String,
    domains: Option<DomainList>,
}

impl StaticMachine {
    /// Machine exposing `domains`.
    #[must_use]
    pub fn new(name: impl Into<String>, domains: DomainList) -> Self {
        Self {
            name: name.into(),
            domains: Some(domains),
        }
    }

    /// Machine without a memory-domain capability.
    #[must_use]
    pub fn without_domains(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domains: None,
        }
    }

    /// Bytes of the domain named `name`.
    #[must_use]
    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        self.domains.as_ref()?.get(name).map(ByteDomain::bytes)
    }

    /// Mutable bytes of the domain named `name`.
    pub fn bytes_mut(&mut self, name: &str) -> Option<&mut [u8]> {
        self.domains.as_mut()?.get_mut(name).map(ByteDomain::bytes_mut)
    }
}

impl Machine for StaticMachine {
    fn name(&self) -> &str {
        &self.name
    }

    fn memory_domains_mut(&mut self) -> Option<&mut dyn MemoryDomains> {
        self.domains.as_mut().map(|d| d as &mut dyn MemoryDomains)
    }
}
