//! Register ID space.
//!
//! Register IDs occupy a 6-bit field. `0` means "no register". IDs `60..=63` are
//! internal scratch registers used by micro-operation sequences and cannot be named by
//! guest instructions.

use std::fmt;

use crate::common::error::CoreError;
use crate::common::reg::RegisterAccess;

/// Encoded value meaning "no register operand".
pub const NO_REGISTER: u8 = 0;

/// A register identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum RegisterId {
    /// Data register 0.
    Rd0 = 1,
    /// Data register 1.
    Rd1 = 2,
    /// Data register 2.
    Rd2 = 3,
    /// Data register 3.
    Rd3 = 4,
    /// Data register 4.
    Rd4 = 5,
    /// Data register 5.
    Rd5 = 6,
    /// Data register 6.
    Rd6 = 7,
    /// Data register 7.
    Rd7 = 8,
    /// Data register 8.
    Rd8 = 9,
    /// Data register 9.
    Rd9 = 10,
    /// Data register A.
    Rda = 11,
    /// Data register B.
    Rdb = 12,
    /// Data register C.
    Rdc = 13,
    /// Data register D.
    Rdd = 14,
    /// Data register E.
    Rde = 15,
    /// Data register F.
    Rdf = 16,
    /// Condition-code register.
    Ccr = 17,
    /// Control register 0.
    Cr0 = 18,
    /// Stack pointer.
    Stp = 19,
    /// Frame base pointer.
    Fbp = 20,
    /// Virtual address translation table address.
    Vatta = 21,
    /// Interrupt descriptor table address.
    Idt = 22,
    /// Interrupt return address.
    Ira = 23,
    /// Instruction pointer.
    Ip = 24,
    /// Trap return address.
    Tra = 25,
    /// Trap descriptor table address.
    Tdta = 26,
    /// Kernel shadow stack pointer.
    Kstp = 27,
    /// Kernel shadow frame base pointer.
    Kfbp = 28,
    /// Kernel shadow instruction pointer.
    Kip = 29,
    /// Scratch: second operand of composite sequences.
    Tmp = 60,
    /// Scratch: operand size for IP and stack arithmetic.
    Size = 61,
    /// Scratch: trailing immediate word.
    Imm = 62,
    /// Scratch: fetched instruction word.
    Fetch = 63,
}

impl RegisterId {
    /// Data registers in order.
    pub const DATA: [Self; 16] = [
        Self::Rd0,
        Self::Rd1,
        Self::Rd2,
        Self::Rd3,
        Self::Rd4,
        Self::Rd5,
        Self::Rd6,
        Self::Rd7,
        Self::Rd8,
        Self::Rd9,
        Self::Rda,
        Self::Rdb,
        Self::Rdc,
        Self::Rdd,
        Self::Rde,
        Self::Rdf,
    ];

    /// Every defined register, architectural then internal.
    pub const ALL: [Self; 33] = [
        Self::Rd0,
        Self::Rd1,
        Self::Rd2,
        Self::Rd3,
        Self::Rd4,
        Self::Rd5,
        Self::Rd6,
        Self::Rd7,
        Self::Rd8,
        Self::Rd9,
        Self::Rda,
        Self::Rdb,
        Self::Rdc,
        Self::Rdd,
        Self::Rde,
        Self::Rdf,
        Self::Ccr,
        Self::Cr0,
        Self::Stp,
        Self::Fbp,
        Self::Vatta,
        Self::Idt,
        Self::Ira,
        Self::Ip,
        Self::Tra,
        Self::Tdta,
        Self::Kstp,
        Self::Kfbp,
        Self::Kip,
        Self::Tmp,
        Self::Size,
        Self::Imm,
        Self::Fetch,
    ];

    /// Looks up any defined ID, internal ones included.
    pub const fn from_u8(raw: u8) -> Option<Self> {
        let mut i = 0;
        while i < Self::ALL.len() {
            if Self::ALL[i] as u8 == raw {
                return Some(Self::ALL[i]);
            }
            i += 1;
        }
        None
    }

    /// Resolves a register field of a guest instruction.
    ///
    /// Returns `Ok(None)` for [`NO_REGISTER`], and an error for undefined or internal IDs.
    pub fn decode_operand(raw: u8) -> Result<Option<Self>, CoreError> {
        if raw == NO_REGISTER {
            return Ok(None);
        }
        match Self::from_u8(raw) {
            Some(id) if !id.is_internal() => Ok(Some(id)),
            _ => Err(CoreError::InvalidRegister(raw)),
        }
    }

    /// Returns the encoded ID.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Returns the register-file slot.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns the data register `RD<n>`, if `n < 16`.
    pub const fn data(n: usize) -> Option<Self> {
        if n < Self::DATA.len() { Some(Self::DATA[n]) } else { None }
    }

    /// Returns `true` for scratch registers reserved to micro-operation sequences.
    pub const fn is_internal(self) -> bool {
        (self as u8) >= Self::Tmp as u8
    }

    /// Returns the access gates this register is created with.
    pub const fn access(self) -> RegisterAccess {
        match self {
            Self::Cr0
            | Self::Vatta
            | Self::Idt
            | Self::Tra
            | Self::Tdta
            | Self::Kstp
            | Self::Kfbp
            | Self::Kip => RegisterAccess::KERNEL,
            Self::Ip | Self::Ccr | Self::Tmp | Self::Size | Self::Imm | Self::Fetch => {
                RegisterAccess::NO_MOVE
            }
            _ => RegisterAccess::OPEN,
        }
    }

    /// Returns the assembler name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Rd0 => "RD0",
            Self::Rd1 => "RD1",
            Self::Rd2 => "RD2",
            Self::Rd3 => "RD3",
            Self::Rd4 => "RD4",
            Self::Rd5 => "RD5",
            Self::Rd6 => "RD6",
            Self::Rd7 => "RD7",
            Self::Rd8 => "RD8",
            Self::Rd9 => "RD9",
            Self::Rda => "RDA",
            Self::Rdb => "RDB",
            Self::Rdc => "RDC",
            Self::Rdd => "RDD",
            Self::Rde => "RDE",
            Self::Rdf => "RDF",
            Self::Ccr => "CCR",
            Self::Cr0 => "CR0",
            Self::Stp => "STP",
            Self::Fbp => "FBP",
            Self::Vatta => "VATTA",
            Self::Idt => "IDT",
            Self::Ira => "IRA",
            Self::Ip => "IP",
            Self::Tra => "TRA",
            Self::Tdta => "TDTA",
            Self::Kstp => "KSTP",
            Self::Kfbp => "KFBP",
            Self::Kip => "KIP",
            Self::Tmp => "%tmp",
            Self::Size => "%size",
            Self::Imm => "%imm",
            Self::Fetch => "%fetch",
        }
    }
}

impl fmt::Display for RegisterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
