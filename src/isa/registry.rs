//! The instruction registry: lookup by mnemonic and by encoding.
//!
//! A registry is assembled once through [`RegistryBuilder`] and is read-only
//! afterwards, so one instance can be shared by any number of sessions.
//!
//! Building follows two rules:
//! - a second instruction with an already registered mnemonic is skipped
//!   with a warning diagnostic;
//! - a malformed or ambiguous instruction is fatal: the builder refuses to
//!   produce a registry at all.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use thiserror::Error;

use super::descriptor::{Descriptor, EncodingKey};
use super::format::{self, EncodeError, Operands};
use super::instruction::{Disassembly, Instruction};
use super::op::{Format, Op};
use super::table::STANDARD;
use crate::diagnostics::{Diagnostic, Severity};
use crate::error::{TrapCause, VmResult};

/// Fatal problems found while building a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An instruction's identifying fields are missing, out of range, or not
    /// meaningful for its format.
    #[error("instruction '{mnemonic}' is malformed: {reason}")]
    Malformed {
        /// The offending instruction.
        mnemonic: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
    /// Some word would match two instructions equally well.
    #[error("instructions '{first}' and '{second}' have ambiguous encodings")]
    Ambiguous {
        /// The instruction registered first.
        first: &'static str,
        /// The instruction that clashes with it.
        second: &'static str,
    },
    /// Two instructions share an opcode but not an encoding format.
    #[error("opcode {opcode:#04x} is shared by {first:?}-type and {second:?}-type instructions")]
    FormatConflict {
        /// The shared opcode.
        opcode: u8,
        /// Format of the instruction registered first.
        first: Format,
        /// Format of the clashing instruction.
        second: Format,
    },
}

/// Collects instruction descriptors and validates them into a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    entries: Vec<Descriptor>,
    diagnostics: Vec<Diagnostic>,
    failure: Option<RegistryError>,
}

impl RegistryBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one instruction.
    ///
    /// A duplicate mnemonic is not an error: the descriptor is skipped and a
    /// warning diagnostic is recorded.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if the descriptor is malformed or clashes
    /// with an existing encoding. The builder is then unusable: every later
    /// call, including [`build`](Self::build), returns the same error.
    pub fn register(&mut self, descriptor: Descriptor) -> Result<(), RegistryError> {
        if let Some(err) = &self.failure {
            return Err(*err);
        }

        match self.admit(descriptor) {
            Ok(()) => Ok(()),
            Err(err) => {
                self.record(Diagnostic::fatal(err.to_string()));
                self.failure = Some(err);
                Err(err)
            }
        }
    }

    /// Register every descriptor in order, stopping at the first fatal error.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`] encountered.
    pub fn register_all(&mut self, descriptors: &[Descriptor]) -> Result<(), RegistryError> {
        descriptors.iter().try_for_each(|d| self.register(*d))
    }

    /// Diagnostics recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Finish building.
    ///
    /// # Errors
    ///
    /// Returns the fatal error recorded during registration, if any.
    pub fn build(self) -> Result<Registry, RegistryError> {
        if let Some(err) = self.failure {
            return Err(err);
        }
        Ok(Registry::from_entries(self.entries, self.diagnostics))
    }

    fn admit(&mut self, descriptor: Descriptor) -> Result<(), RegistryError> {
        validate(&descriptor)?;

        if self.entries.iter().any(|e| e.mnemonic == descriptor.mnemonic) {
            self.record(Diagnostic::warning(format!(
                "duplicated instruction name: '{}', skip this",
                descriptor.mnemonic
            )));
            return Ok(());
        }

        for existing in self.entries.iter().filter(|e| e.opcode == descriptor.opcode) {
            if existing.format() != descriptor.format() {
                return Err(RegistryError::FormatConflict {
                    opcode: descriptor.opcode,
                    first: existing.format(),
                    second: descriptor.format(),
                });
            }
            if ambiguous(existing, &descriptor) {
                return Err(RegistryError::Ambiguous {
                    first: existing.mnemonic,
                    second: descriptor.mnemonic,
                });
            }
        }

        self.entries.push(descriptor);
        Ok(())
    }

    fn record(&mut self, diagnostic: Diagnostic) {
        diagnostic.emit();
        self.diagnostics.push(diagnostic);
    }
}

/// Check the selector fields against the instruction's format.
fn validate(d: &Descriptor) -> Result<(), RegistryError> {
    let malformed = |reason| RegistryError::Malformed {
        mnemonic: d.mnemonic,
        reason,
    };
    let format = d.format();

    if d.mnemonic.is_empty() {
        return Err(malformed("empty mnemonic"));
    }
    if d.opcode > 0x7F {
        return Err(malformed("opcode wider than 7 bits"));
    }
    if d.opcode & 0b11 != 0b11 {
        return Err(malformed("opcode is not a 32-bit encoding"));
    }
    if d.funct3.is_some_and(|f| f > 0b111) {
        return Err(malformed("funct3 wider than 3 bits"));
    }
    if d.funct7.is_some_and(|f| f > 0x7F) {
        return Err(malformed("funct7 wider than 7 bits"));
    }
    if d.funct12.is_some_and(|f| f > 0xFFF) {
        return Err(malformed("funct12 wider than 12 bits"));
    }
    if d.funct3.is_some() && !format.has_funct3() {
        return Err(malformed("funct3 is not a field of this format"));
    }
    if d.funct7.is_some() && !format.has_funct7() {
        return Err(malformed("funct7 is not a field of this format"));
    }
    if d.funct12.is_some() && !format.has_funct12() {
        return Err(malformed("funct12 is not a field of this format"));
    }
    if d.funct7.is_some() && d.funct12.is_some() {
        return Err(malformed("funct7 and funct12 overlap"));
    }
    if format.has_funct3() && d.funct3.is_none() {
        return Err(malformed("missing funct3"));
    }
    if format == Format::R && d.funct7.is_none() {
        return Err(malformed("missing funct7"));
    }
    Ok(())
}

/// Two descriptors are ambiguous when some word matches both and neither
/// is strictly narrower than the other.
fn ambiguous(a: &Descriptor, b: &Descriptor) -> bool {
    fn compatible<T: PartialEq>(x: Option<T>, y: Option<T>) -> bool {
        match (x, y) {
            (Some(x), Some(y)) => x == y,
            _ => true,
        }
    }
    fn covers<T>(x: Option<T>, y: Option<T>) -> bool {
        x.is_some() || y.is_none()
    }

    let overlaps = a.opcode == b.opcode
        && compatible(a.funct3, b.funct3)
        && compatible(a.funct7, b.funct7)
        && compatible(a.funct12, b.funct12);
    if !overlaps {
        return false;
    }
    // `a` refines `b` if it constrains every field `b` does.
    let a_refines_b =
        covers(a.funct3, b.funct3) && covers(a.funct7, b.funct7) && covers(a.funct12, b.funct12);
    let b_refines_a =
        covers(b.funct3, a.funct3) && covers(b.funct7, a.funct7) && covers(b.funct12, a.funct12);
    a.key() == b.key() || a_refines_b == b_refines_a
}

/// The set of instructions known to the simulator.
#[derive(Debug)]
pub struct Registry {
    /// Sorted by mnemonic.
    entries: Vec<Descriptor>,
    by_mnemonic: HashMap<&'static str, usize>,
    by_op: HashMap<Op, usize>,
    /// Indexed by the 7-bit opcode.
    by_opcode: [Vec<usize>; 128],
    diagnostics: Vec<Diagnostic>,
}

static STANDARD_REGISTRY: LazyLock<Registry> = LazyLock::new(|| match Registry::standard() {
    Ok(registry) => registry,
    Err(err) => panic!("instruction registry failed to build: {err}"),
});

/// The process-wide registry of every standard instruction.
///
/// Built on first use and shared read-only afterwards.
///
/// # Panics
///
/// Panics if the standard instruction table is malformed. That is a defect
/// in the table itself, so no partial registry is ever handed out.
pub fn registry() -> &'static Registry {
    &STANDARD_REGISTRY
}

impl Registry {
    /// Build a registry from the standard instruction table.
    ///
    /// # Errors
    ///
    /// Returns a [`RegistryError`] if the table is malformed.
    pub fn standard() -> Result<Self, RegistryError> {
        let mut builder = RegistryBuilder::new();
        builder.register_all(STANDARD)?;
        builder.build()
    }

    fn from_entries(mut entries: Vec<Descriptor>, diagnostics: Vec<Diagnostic>) -> Self {
        entries.sort_by_key(|d| d.mnemonic);

        let mut by_mnemonic = HashMap::with_capacity(entries.len());
        let mut by_op = HashMap::with_capacity(entries.len());
        let mut by_opcode: [Vec<usize>; 128] = std::array::from_fn(|_| Vec::new());
        for (index, desc) in entries.iter().enumerate() {
            by_mnemonic.insert(desc.mnemonic, index);
            by_op.entry(desc.op).or_insert(index);
            by_opcode[usize::from(desc.opcode)].push(index);
        }

        Self {
            entries,
            by_mnemonic,
            by_op,
            by_opcode,
            diagnostics,
        }
    }

    /// Number of registered instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no instruction is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All instructions, sorted by mnemonic.
    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.entries.iter()
    }

    /// Warnings recorded while this registry was built.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Number of recorded diagnostics of the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    /// Whether an instruction with this mnemonic exists.
    #[must_use]
    pub fn contains(&self, mnemonic: &str) -> bool {
        self.by_mnemonic.contains_key(mnemonic)
    }

    /// Find an instruction by mnemonic.
    #[must_use]
    pub fn lookup_by_mnemonic(&self, mnemonic: &str) -> Option<&Descriptor> {
        self.by_mnemonic.get(mnemonic).map(|&i| &self.entries[i])
    }

    /// Find the narrowest instruction whose selector fields all agree with
    /// `key`.
    ///
    /// Instructions that need no funct3/funct7/funct12 match on opcode alone;
    /// among several matches the one constraining the most fields wins.
    #[must_use]
    pub fn lookup_by_encoding(&self, key: &EncodingKey) -> Option<&Descriptor> {
        self.by_opcode
            .get(usize::from(key.opcode))?
            .iter()
            .map(|&i| &self.entries[i])
            .filter(|d| d.matches(key))
            .max_by_key(|d| d.specificity())
    }

    /// Find the instruction performing `op`.
    #[must_use]
    pub fn lookup_by_op(&self, op: Op) -> Option<&Descriptor> {
        self.by_op.get(&op).map(|&i| &self.entries[i])
    }

    /// Decode a 32-bit instruction word.
    ///
    /// # Errors
    ///
    /// Returns [`TrapCause::InvalidInstruction`] if no registered instruction
    /// matches the word.
    pub fn decode(&self, word: u32) -> VmResult<Instruction> {
        let invalid = TrapCause::InvalidInstruction(word);
        let candidates = &self.by_opcode[(word & 0x7F) as usize];
        let format = candidates
            .first()
            .map(|&i| self.entries[i].format())
            .ok_or(invalid)?;

        // Only single precision (fmt = 00) is implemented; rounding modes
        // 5 and 6 are reserved.
        let unsupported = format == Format::R4
            && ((word >> 25) & 0b11 != 0 || matches!((word >> 12) & 0b111, 5 | 6));
        if unsupported {
            return Err(invalid);
        }

        let key = EncodingKey::from_word(word, format);
        let desc = self.lookup_by_encoding(&key).ok_or(invalid)?;
        Instruction::from_parts(desc.op, format::decode(format, word)).ok_or(invalid)
    }

    /// Encode an instruction from its mnemonic and operands.
    ///
    /// # Errors
    ///
    /// Returns an [`EncodeError`] if the mnemonic is unknown, the operands are
    /// of the wrong format, or a field does not fit. An immediate that would
    /// overwrite a selector field (a shift amount above 31, a non-zero
    /// immediate on `ecall`) is reported as out of range.
    pub fn encode(&self, mnemonic: &str, operands: Operands) -> Result<u32, EncodeError> {
        let desc = self
            .lookup_by_mnemonic(mnemonic)
            .ok_or_else(|| EncodeError::UnknownMnemonic(mnemonic.to_string()))?;

        if operands.format() != desc.format() {
            return Err(EncodeError::FormatMismatch {
                mnemonic: desc.mnemonic,
                expected: desc.format(),
                found: operands.format(),
            });
        }
        operands.validate()?;

        let fields = operands.encode();
        if fields & selector_mask(desc) != 0 {
            return Err(EncodeError::ImmediateOutOfRange {
                imm: operands.imm().unwrap_or_default(),
                format: desc.format(),
            });
        }
        Ok(fields | desc.selector_bits())
    }

    /// Render a decoded instruction in assembly syntax.
    #[must_use]
    pub fn disassemble(&self, inst: Instruction) -> Disassembly<'_> {
        let mnemonic = self
            .lookup_by_op(inst.op())
            .map_or("unknown", |d| d.mnemonic);
        Disassembly { mnemonic, inst }
    }
}

/// Word bits operands of `desc` must leave clear: the format's fixed
/// fields plus any funct7/funct12 selector that overlaps the immediate.
fn selector_mask(desc: &Descriptor) -> u32 {
    let mut mask = desc.format().selector_mask();
    if desc.funct7.is_some() {
        mask |= 0xFE00_0000;
    }
    if desc.funct12.is_some() {
        mask |= 0xFFF0_0000;
    }
    mask
}

/// Sorted listing: one descriptor per entry, separated by newlines.
impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, desc) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{desc}")?;
        }
        Ok(())
    }
}
