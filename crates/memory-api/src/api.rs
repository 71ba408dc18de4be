//! Caller-facing memory API over one machine's memory domains.
//!
//! Every accessor takes an optional domain name. `None` (or an empty name)
//! targets the current domain; unknown names fall back to it with a
//! diagnostic. Only a missing domain capability and invalid hash ranges are
//! returned as errors.

use std::fmt;

use crate::{
    engine, hash, AccessRequest, AccessWidth, DiagnosticChannel, DiagnosticCounters,
    DiagnosticKind, DiagnosticSink, DomainBinding, DomainInfo, DomainResolver, Endianness,
    Machine, MemoryApiError, MemoryDomain, MemoryDomains, TracingSink,
};

/// Construction-time settings for a [`MemoryApi`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ApiConfig {
    /// Initial byte order.
    pub endianness: Endianness,
    /// Domain selected on construction instead of the lazy default.
    pub default_domain: Option<String>,
}

/// Typed, endianness-aware accessor bound to one machine.
///
/// The API holds the machine's domain capability exclusively for its
/// lifetime, so accesses cannot interleave with the machine's own execution.
pub struct MemoryApi<'m, S: DiagnosticSink = TracingSink> {
    machine: String,
    domains: Option<&'m mut dyn MemoryDomains>,
    resolver: DomainResolver,
    endianness: Endianness,
    diagnostics: DiagnosticChannel<S>,
}

impl<S: DiagnosticSink> fmt::Debug for MemoryApi<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryApi")
            .field("machine", &self.machine)
            .field("has_domains", &self.domains.is_some())
            .field("binding", &self.resolver.binding())
            .field("endianness", &self.endianness)
            .field("counters", self.diagnostics.counters())
            .finish_non_exhaustive()
    }
}

impl<'m> MemoryApi<'m> {
    /// Creates an API logging diagnostics through `tracing`.
    pub fn new<M: Machine + ?Sized>(machine: &'m mut M) -> Self {
        Self::with_sink(machine, TracingSink)
    }
}

impl<'m, S: DiagnosticSink> MemoryApi<'m, S> {
    /// Creates an API reporting diagnostics to `sink`.
    pub fn with_sink<M: Machine + ?Sized>(machine: &'m mut M, sink: S) -> Self {
        Self::with_config(machine, &ApiConfig::default(), sink)
    }

    /// Creates an API from `config`, reporting diagnostics to `sink`.
    ///
    /// The domain capability is queried once, here.
    pub fn with_config<M: Machine + ?Sized>(
        machine: &'m mut M,
        config: &ApiConfig,
        sink: S,
    ) -> Self {
        let name = machine.name().to_string();
        let domains = machine.memory_domains_mut();
        if domains.is_none() {
            tracing::debug!(machine = %name, "machine exposes no memory domains");
        }

        let mut api = Self {
            machine: name,
            domains,
            resolver: DomainResolver::new(),
            endianness: config.endianness,
            diagnostics: DiagnosticChannel::new(sink),
        };
        if let (Some(default), Some(domains)) =
            (config.default_domain.as_deref(), api.domains.as_deref())
        {
            api.resolver.select(domains, default, &mut api.diagnostics);
        }
        api
    }

    /// Name of the bound machine.
    #[must_use]
    pub fn machine_name(&self) -> &str {
        &self.machine
    }

    /// Current binding state of the resolver.
    #[must_use]
    pub const fn binding(&self) -> DomainBinding {
        self.resolver.binding()
    }

    /// Names of every domain in registry order.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn list_domains(&mut self) -> Result<Vec<String>, MemoryApiError> {
        let domains = self.capability()?;
        Ok((0..domains.len())
            .filter_map(|index| domains.domain(index))
            .map(|domain| domain.name().to_string())
            .collect())
    }

    /// Looks up a domain by exact name without emitting diagnostics.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn find_domain(&mut self, name: &str) -> Result<Option<DomainInfo>, MemoryApiError> {
        let domains = self.capability()?;
        Ok(domains.position(name).and_then(|index| {
            domains
                .domain(index)
                .map(|domain| DomainInfo::of(domain, domains.system_bus() == Some(index)))
        }))
    }

    /// Current domain, binding the default on first use.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn current_domain(&mut self) -> Result<DomainInfo, MemoryApiError> {
        self.domain_info(None)
    }

    /// Name of the current domain.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn current_domain_name(&mut self) -> Result<String, MemoryApiError> {
        self.domain_info(None).map(|info| info.name)
    }

    /// Size of the current domain.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn current_domain_size(&mut self) -> Result<u64, MemoryApiError> {
        self.domain_info(None).map(|info| info.size)
    }

    /// Size of the named (or current) domain.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn domain_size(&mut self, domain: Option<&str>) -> Result<u64, MemoryApiError> {
        self.domain_info(domain).map(|info| info.size)
    }

    /// Makes `name` the current domain.
    ///
    /// Returns `Ok(false)` and keeps the current domain when `name` is unknown.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn select_domain(&mut self, name: &str) -> Result<bool, MemoryApiError> {
        let Self {
            machine,
            domains,
            resolver,
            diagnostics,
            ..
        } = self;
        match domains.as_deref() {
            Some(domains) => Ok(resolver.select(domains, name, diagnostics)),
            None => Err(unsupported(machine, diagnostics)),
        }
    }

    /// Current byte order.
    #[must_use]
    pub const fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Sets the byte order for all subsequent multi-byte accesses.
    pub const fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    /// Switches between big- and little-endian access.
    pub const fn set_big_endian(&mut self, enabled: bool) {
        self.set_endianness(Endianness::from_big(enabled));
    }

    /// Builds a request at the current byte order.
    #[must_use]
    pub const fn request(&self, address: i64, width: AccessWidth, signed: bool) -> AccessRequest {
        AccessRequest {
            address,
            width,
            signed,
            endianness: self.endianness,
        }
    }

    /// Reads `request`, sign-extending when it is signed.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn read(
        &mut self,
        request: &AccessRequest,
        domain: Option<&str>,
    ) -> Result<i64, MemoryApiError> {
        self.with_domain(domain, |target, diagnostics| {
            request.interpret(engine::read_unsigned(target, diagnostics, request))
        })
    }

    /// Writes the low bytes of `value` as described by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn write(
        &mut self,
        request: &AccessRequest,
        value: u32,
        domain: Option<&str>,
    ) -> Result<(), MemoryApiError> {
        self.with_domain(domain, |target, diagnostics| {
            engine::write_unsigned(target, diagnostics, request, value);
        })
    }

    /// Unsigned read of `width` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn read_unsigned(
        &mut self,
        addr: i64,
        width: AccessWidth,
        domain: Option<&str>,
    ) -> Result<u32, MemoryApiError> {
        let request = self.request(addr, width, false);
        self.with_domain(domain, |target, diagnostics| {
            engine::read_unsigned(target, diagnostics, &request)
        })
    }

    /// Sign-extended read of `width` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn read_signed(
        &mut self,
        addr: i64,
        width: AccessWidth,
        domain: Option<&str>,
    ) -> Result<i32, MemoryApiError> {
        self.read_unsigned(addr, width, domain)
            .map(|raw| crate::sign_extend(raw, width))
    }

    /// Writes the low `width` bytes of `value`.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn write_unsigned(
        &mut self,
        addr: i64,
        width: AccessWidth,
        value: u32,
        domain: Option<&str>,
    ) -> Result<(), MemoryApiError> {
        let request = self.request(addr, width, false);
        self.write(&request, value, domain)
    }

    /// Writes the low `width` bytes of the two's-complement `value`.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn write_signed(
        &mut self,
        addr: i64,
        width: AccessWidth,
        value: i32,
        domain: Option<&str>,
    ) -> Result<(), MemoryApiError> {
        self.write_unsigned(addr, width, u32::from_le_bytes(value.to_le_bytes()), domain)
    }

    /// Reads one byte.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn read_byte(&mut self, addr: i64, domain: Option<&str>) -> Result<u8, MemoryApiError> {
        self.read_u8(addr, domain)
    }

    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn write_byte(
        &mut self,
        addr: i64,
        value: u8,
        domain: Option<&str>,
    ) -> Result<(), MemoryApiError> {
        self.write_u8(addr, value, domain)
    }

    /// Reads `length` bytes, zero-filling positions outside the domain.
    ///
    /// A `length` above [`crate::MAX_RANGE_LEN`] yields an empty buffer and an
    /// out-of-range diagnostic.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn read_byte_range(
        &mut self,
        addr: i64,
        length: usize,
        domain: Option<&str>,
    ) -> Result<Vec<u8>, MemoryApiError> {
        self.with_domain(domain, |target, diagnostics| {
            engine::read_range(target, diagnostics, addr, length)
        })
    }

    /// Writes `bytes`, dropping positions outside the domain.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn write_byte_range(
        &mut self,
        addr: i64,
        bytes: &[u8],
        domain: Option<&str>,
    ) -> Result<(), MemoryApiError> {
        self.with_domain(domain, |target, diagnostics| {
            engine::write_range(target, diagnostics, addr, bytes);
        })
    }

    /// Reads an IEEE-754 single-precision value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn read_float(&mut self, addr: i64, domain: Option<&str>) -> Result<f32, MemoryApiError> {
        self.read_unsigned(addr, AccessWidth::Bits32, domain)
            .map(f32::from_bits)
    }

    /// Writes an IEEE-754 single-precision value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn write_float(
        &mut self,
        addr: i64,
        value: f32,
        domain: Option<&str>,
    ) -> Result<(), MemoryApiError> {
        self.write_unsigned(addr, AccessWidth::Bits32, value.to_bits(), domain)
    }

    /// Reads a signed byte.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn read_s8(&mut self, addr: i64, domain: Option<&str>) -> Result<i8, MemoryApiError> {
        self.read_unsigned(addr, AccessWidth::Bits8, domain)
            .map(|raw| i8::from_le_bytes([raw.to_le_bytes()[0]]))
    }

    /// Reads an unsigned byte.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn read_u8(&mut self, addr: i64, domain: Option<&str>) -> Result<u8, MemoryApiError> {
        self.read_unsigned(addr, AccessWidth::Bits8, domain)
            .map(|raw| raw.to_le_bytes()[0])
    }

    /// Reads a signed 16-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn read_s16(&mut self, addr: i64, domain: Option<&str>) -> Result<i16, MemoryApiError> {
        self.read_unsigned(addr, AccessWidth::Bits16, domain)
            .map(|raw| {
                let [lo, hi, ..] = raw.to_le_bytes();
                i16::from_le_bytes([lo, hi])
            })
    }

    /// Reads an unsigned 16-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn read_u16(&mut self, addr: i64, domain: Option<&str>) -> Result<u16, MemoryApiError> {
        self.read_unsigned(addr, AccessWidth::Bits16, domain)
            .map(|raw| {
                let [lo, hi, ..] = raw.to_le_bytes();
                u16::from_le_bytes([lo, hi])
            })
    }

    /// Reads a sign-extended 24-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn read_s24(&mut self, addr: i64, domain: Option<&str>) -> Result<i32, MemoryApiError> {
        self.read_signed(addr, AccessWidth::Bits24, domain)
    }

    /// Reads an unsigned 24-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn read_u24(&mut self, addr: i64, domain: Option<&str>) -> Result<u32, MemoryApiError> {
        self.read_unsigned(addr, AccessWidth::Bits24, domain)
    }

    /// Reads a signed 32-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn read_s32(&mut self, addr: i64, domain: Option<&str>) -> Result<i32, MemoryApiError> {
        self.read_signed(addr, AccessWidth::Bits32, domain)
    }

    /// Reads an unsigned 32-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn read_u32(&mut self, addr: i64, domain: Option<&str>) -> Result<u32, MemoryApiError> {
        self.read_unsigned(addr, AccessWidth::Bits32, domain)
    }

    /// Writes a signed byte.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn write_s8(
        &mut self,
        addr: i64,
        value: i8,
        domain: Option<&str>,
    ) -> Result<(), MemoryApiError> {
        self.write_signed(addr, AccessWidth::Bits8, i32::from(value), domain)
    }

    /// Writes an unsigned byte.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn write_u8(
        &mut self,
        addr: i64,
        value: u8,
        domain: Option<&str>,
    ) -> Result<(), MemoryApiError> {
        self.write_unsigned(addr, AccessWidth::Bits8, u32::from(value), domain)
    }

    /// Writes a signed 16-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn write_s16(
        &mut self,
        addr: i64,
        value: i16,
        domain: Option<&str>,
    ) -> Result<(), MemoryApiError> {
        self.write_signed(addr, AccessWidth::Bits16, i32::from(value), domain)
    }

    /// Writes an unsigned 16-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn write_u16(
        &mut self,
        addr: i64,
        value: u16,
        domain: Option<&str>,
    ) -> Result<(), MemoryApiError> {
        self.write_unsigned(addr, AccessWidth::Bits16, u32::from(value), domain)
    }

    /// Writes the low 24 bits of a signed value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn write_s24(
        &mut self,
        addr: i64,
        value: i32,
        domain: Option<&str>,
    ) -> Result<(), MemoryApiError> {
        self.write_signed(addr, AccessWidth::Bits24, value, domain)
    }

    /// Writes the low 24 bits of an unsigned value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn write_u24(
        &mut self,
        addr: i64,
        value: u32,
        domain: Option<&str>,
    ) -> Result<(), MemoryApiError> {
        self.write_unsigned(addr, AccessWidth::Bits24, value, domain)
    }

    /// Writes a signed 32-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn write_s32(
        &mut self,
        addr: i64,
        value: i32,
        domain: Option<&str>,
    ) -> Result<(), MemoryApiError> {
        self.write_signed(addr, AccessWidth::Bits32, value, domain)
    }

    /// Writes an unsigned 32-bit value.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::UnsupportedCapability`] when the machine has
    /// no memory domains.
    pub fn write_u32(
        &mut self,
        addr: i64,
        value: u32,
        domain: Option<&str>,
    ) -> Result<(), MemoryApiError> {
        self.write_unsigned(addr, AccessWidth::Bits32, value, domain)
    }

    /// SHA-256 of exactly `count` bytes at `addr`, as 64 uppercase hex digits.
    ///
    /// No bytes are read unless the whole range lies inside the domain.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryApiError::HashRangeInvalid`] when `addr` is outside the
    /// domain, when `addr + count` runs past its end, or when the domain is
    /// not readable; [`MemoryApiError::UnsupportedCapability`] when the machine
    /// has no memory domains.
    pub fn hash_region(
        &mut self,
        addr: i64,
        count: usize,
        domain: Option<&str>,
    ) -> Result<String, MemoryApiError> {
        let index = self.resolve_index(domain)?;
        let Self {
            machine,
            domains,
            diagnostics,
            ..
        } = self;
        let Some(target) = domains.as_deref().and_then(|d| d.domain(index)) else {
            return Err(unsupported(machine, diagnostics));
        };

        if !target.is_readable() {
            diagnostics.emit(
                DiagnosticKind::NotReadable,
                format!("the domain {} is not readable", target.name()),
            );
        }
        let bounds = hash::hash_bounds(addr, count, target.size()).filter(|_| target.is_readable());
        let Some(range) = bounds else {
            let error = MemoryApiError::HashRangeInvalid {
                addr,
                count,
                domain: target.name().to_string(),
                size: target.size(),
            };
            diagnostics.emit(DiagnosticKind::HashRangeInvalid, error.to_string());
            return Err(error);
        };
        Ok(hash::hash_domain_range(target, range))
    }

    /// Per-kind diagnostic counters.
    #[must_use]
    pub const fn diagnostic_counters(&self) -> &DiagnosticCounters {
        self.diagnostics.counters()
    }

    /// Resets the diagnostic counters.
    pub fn reset_diagnostic_counters(&mut self) {
        self.diagnostics.reset_counters();
    }

    /// Diagnostic sink.
    #[must_use]
    pub const fn sink(&self) -> &S {
        self.diagnostics.sink()
    }

    /// Diagnostic sink, mutably.
    #[allow(clippy::missing_const_for_fn)]
    pub fn sink_mut(&mut self) -> &mut S {
        self.diagnostics.sink_mut()
    }

    /// Releases the machine and returns the diagnostic sink.
    #[must_use]
    pub fn into_sink(self) -> S {
        self.diagnostics.into_sink()
    }

    fn capability(&mut self) -> Result<&dyn MemoryDomains, MemoryApiError> {
        let Self {
            machine,
            domains,
            diagnostics,
            ..
        } = self;
        match domains.as_deref() {
            Some(domains) => Ok(domains),
            None => Err(unsupported(machine, diagnostics)),
        }
    }

    fn resolve_index(&mut self, name: Option<&str>) -> Result<usize, MemoryApiError> {
        let Self {
            machine,
            domains,
            resolver,
            diagnostics,
            ..
        } = self;
        let Some(domains) = domains.as_deref() else {
            return Err(unsupported(machine, diagnostics));
        };
        if let Some(resolution) = resolver.resolve(domains, name, diagnostics) {
            return Ok(resolution.index());
        }

        let error = MemoryApiError::UnsupportedCapability {
            machine: machine.clone(),
        };
        diagnostics.emit(
            DiagnosticKind::UnsupportedCapability,
            format!("{machine} exposes no usable memory domain"),
        );
        Err(error)
    }

    fn domain_info(&mut self, name: Option<&str>) -> Result<DomainInfo, MemoryApiError> {
        let index = self.resolve_index(name)?;
        let Self {
            machine,
            domains,
            diagnostics,
            ..
        } = self;
        let info = domains.as_deref().and_then(|domains| {
            domains
                .domain(index)
                .map(|domain| DomainInfo::of(domain, domains.system_bus() == Some(index)))
        });
        info.ok_or_else(|| unsupported(machine, diagnostics))
    }

    fn with_domain<T>(
        &mut self,
        name: Option<&str>,
        op: impl FnOnce(&mut dyn MemoryDomain, &mut DiagnosticChannel<S>) -> T,
    ) -> Result<T, MemoryApiError> {
        let index = self.resolve_index(name)?;
        let Self {
            machine,
            domains,
            diagnostics,
            ..
        } = self;
        match domains.as_deref_mut().and_then(|d| d.domain_mut(index)) {
            Some(target) => Ok(op(target, diagnostics)),
            None => Err(unsupported(machine, diagnostics)),
        }
    }
}

fn unsupported<S: DiagnosticSink>(
    machine: &str,
    diagnostics: &mut DiagnosticChannel<S>,
) -> MemoryApiError {
    let error = MemoryApiError::UnsupportedCapability {
        machine: machine.to_string(),
    };
    diagnostics.emit(DiagnosticKind::UnsupportedCapability, error.to_string());
    error
}

#[cfg(test)]
mod tests {
    use super::{ApiConfig, MemoryApi};
    use crate::{
        ByteDomain, DiagnosticKind, DomainBinding, DomainList, Endianness, MemoryApiError,
        RecordingSink, StaticMachine,
    };

    fn machine() -> StaticMachine {
        let domains = DomainList::new(vec![
            ByteDomain::new("RAM", 0x1_0000),
            ByteDomain::read_only("ROM", vec![0xEA; 16]),
            ByteDomain::new("System Bus", 0x1_0000),
        ])
        .expect("unique names")
        .with_system_bus("System Bus")
        .expect("known domain");
        StaticMachine::new("C64", domains)
    }

    #[test]
    fn current_domain_defaults_to_system_bus() {
        let mut machine = machine();
        let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

        assert_eq!(api.binding(), DomainBinding::Unbound);
        let current = api.current_domain().expect("domains present");
        assert_eq!(current.name, "System Bus");
        assert!(current.is_system_bus);
        assert_eq!(api.binding(), DomainBinding::Bound(2));
    }

    #[test]
    fn config_selects_default_domain_and_endianness() {
        let mut machine = machine();
        let config = ApiConfig {
            endianness: Endianness::Big,
            default_domain: Some("RAM".to_string()),
        };
        let mut api = MemoryApi::with_config(&mut machine, &config, RecordingSink::new());

        assert_eq!(api.endianness(), Endianness::Big);
        assert_eq!(api.current_domain_name().expect("domains present"), "RAM");
        assert!(api.sink().is_empty());
    }

    #[test]
    fn unknown_default_domain_keeps_lazy_binding() {
        let mut machine = machine();
        let config = ApiConfig {
            default_domain: Some("VRAM".to_string()),
            ..ApiConfig::default()
        };
        let mut api = MemoryApi::with_config(&mut machine, &config, RecordingSink::new());

        assert_eq!(api.sink().count_of(DiagnosticKind::DomainNotFound), 1);
        assert_eq!(api.binding(), DomainBinding::Unbound);
        assert_eq!(
            api.current_domain_name().expect("domains present"),
            "System Bus"
        );
    }

    #[test]
    fn missing_capability_fails_every_call() {
        let mut machine = StaticMachine::without_domains("Pong");
        let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());
        let expected = MemoryApiError::UnsupportedCapability {
            machine: "Pong".to_string(),
        };

        assert_eq!(api.list_domains(), Err(expected.clone()));
        assert_eq!(api.read_u8(0, None), Err(expected.clone()));
        assert_eq!(api.write_u8(0, 1, None), Err(expected.clone()));
        assert_eq!(api.select_domain("RAM"), Err(expected.clone()));
        assert_eq!(api.hash_region(0, 1, None), Err(expected));
        assert_eq!(
            api.sink().count_of(DiagnosticKind::UnsupportedCapability),
            5
        );
        assert_eq!(
            api.sink().last().map(|d| d.message.as_str()),
            Some("Pong does not implement memory domains")
        );
    }

    #[test]
    fn empty_registry_is_unsupported_for_accessors() {
        let mut machine = StaticMachine::new("Empty", DomainList::default());
        let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

        assert_eq!(api.list_domains(), Ok(Vec::new()));
        assert!(matches!(
            api.read_u8(0, None),
            Err(MemoryApiError::UnsupportedCapability { .. })
        ));
    }

    #[test]
    fn counters_track_emitted_diagnostics() {
        let mut machine = machine();
        let mut api = MemoryApi::with_sink(&mut machine, RecordingSink::new());

        api.read_u8(0x1_0000, None).expect("domains present");
        api.write_u8(0, 1, Some("ROM")).expect("domains present");
        api.read_u8(0, Some("VRAM")).expect("domains present");

        let counters = api.diagnostic_counters();
        assert_eq!(counters.count(DiagnosticKind::OutOfRangeRead), 1);
        assert_eq!(counters.count(DiagnosticKind::NotWritable), 1);
        assert_eq!(counters.count(DiagnosticKind::DomainNotFound), 1);
        assert_eq!(counters.last_kind(), Some(DiagnosticKind::DomainNotFound));

        api.reset_diagnostic_counters();
        assert_eq!(api.diagnostic_counters().total(), 0);
        assert_eq!(api.into_sink().len(), 3);
    }

    #[test]
    fn debug_output_does_not_expose_domains() {
        let mut machine = machine();
        let api = MemoryApi::with_sink(&mut machine, RecordingSink::new());
        let rendered = format!("{api:?}");
        assert!(rendered.contains("C64"));
        assert!(rendered.contains("has_domains: true"));
    }
}
