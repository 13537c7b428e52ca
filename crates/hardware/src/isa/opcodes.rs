//! Opcode catalogue.
//!
//! Opcodes occupy the low 16 bits of an instruction word. Values outside this
//! catalogue decode fine at the codec level; the execution-time dispatcher rejects them.

use std::fmt;

/// An opcode of the instruction set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Opcode {
    /// No operation.
    Nop = 0x0000,
    /// Power off the executing core.
    Halt = 0x0001,
    /// `first = second`.
    MovRegReg = 0x0010,
    /// `first = mem[second]`.
    MovRegMem = 0x0011,
    /// `mem[first] = second`.
    MovMemReg = 0x0012,
    /// `first = imm`.
    MovRegCon = 0x0013,
    /// `mem[first] = imm`.
    MovMemCon = 0x0014,
    /// Push `first`.
    PushReg = 0x0020,
    /// Push `mem[first]`.
    PushMem = 0x0021,
    /// Push `imm`.
    PushCon = 0x0022,
    /// Pop into `first`.
    PopReg = 0x0023,
    /// Pop into `mem[first]`.
    PopMem = 0x0024,
    /// Exchange `first` and `second`.
    Swap = 0x0025,
    /// `first += second`.
    Add = 0x0030,
    /// `first -= second`.
    Sub = 0x0031,
    /// `first += 1`.
    Inc = 0x0032,
    /// `first -= 1`.
    Dec = 0x0033,
    /// Unsigned `first *= second`.
    Mul = 0x0034,
    /// Signed `first *= second`.
    Imul = 0x0035,
    /// Unsigned divide; quotient to `first`, remainder to `second`.
    Div = 0x0036,
    /// Signed divide; quotient to `first`, remainder to `second`.
    Idiv = 0x0037,
    /// `first &= second`.
    And = 0x0038,
    /// `first |= second`.
    Or = 0x0039,
    /// `first ^= second`.
    Xor = 0x003a,
    /// `first = !first`.
    Not = 0x003b,
    /// `first <<= second`.
    Shl = 0x003c,
    /// Logical `first >>= second`.
    Shr = 0x003d,
    /// Set flags from `first - second`.
    Cmp = 0x003e,
    /// Float `first += second`.
    Fadd = 0x0040,
    /// Float `first -= second`.
    Fsub = 0x0041,
    /// Float `first *= second`.
    Fmul = 0x0042,
    /// Float `first /= second`.
    Fdiv = 0x0043,
    /// Set flags from float `first - second`.
    Fcmp = 0x0044,
    /// Jump to the address in `first`.
    JmpMem = 0x0050,
    /// Jump to `imm`.
    JmpCon = 0x0051,
    /// Jump to `first` if equal.
    JeqMem = 0x0052,
    /// Jump to `imm` if equal.
    JeqCon = 0x0053,
    /// Jump to `first` if not equal.
    JneMem = 0x0054,
    /// Jump to `imm` if not equal.
    JneCon = 0x0055,
    /// Jump to `first` if signed less.
    JltMem = 0x0056,
    /// Jump to `imm` if signed less.
    JltCon = 0x0057,
    /// Jump to `first` if signed less or equal.
    JleMem = 0x0058,
    /// Jump to `imm` if signed less or equal.
    JleCon = 0x0059,
    /// Jump to `first` if signed greater.
    JgtMem = 0x005a,
    /// Jump to `imm` if signed greater.
    JgtCon = 0x005b,
    /// Jump to `first` if signed greater or equal.
    JgeMem = 0x005c,
    /// Jump to `imm` if signed greater or equal.
    JgeCon = 0x005d,
    /// Jump to `first` if unsigned above.
    JaMem = 0x005e,
    /// Jump to `imm` if unsigned above.
    JaCon = 0x005f,
    /// Jump to `first` if unsigned above or equal.
    JaeMem = 0x0060,
    /// Jump to `imm` if unsigned above or equal.
    JaeCon = 0x0061,
    /// Jump to `first` if unsigned below.
    JbMem = 0x0062,
    /// Jump to `imm` if unsigned below.
    JbCon = 0x0063,
    /// Jump to `first` if unsigned below or equal.
    JbeMem = 0x0064,
    /// Jump to `imm` if unsigned below or equal.
    JbeCon = 0x0065,
    /// Push the return address and jump to `first`.
    CallMem = 0x0070,
    /// Push the return address and jump to `imm`.
    CallCon = 0x0071,
    /// Pop the return address into `IP`.
    Ret = 0x0072,
    /// Port input (reserved).
    InRegReg = 0x0080,
    /// Port input (reserved).
    InRegCon = 0x0081,
    /// Port input (reserved).
    InConReg = 0x0082,
    /// Port input (reserved).
    InConCon = 0x0083,
    /// Port output (reserved).
    OutRegReg = 0x0084,
    /// Port output (reserved).
    OutRegCon = 0x0085,
    /// Port output (reserved).
    OutConReg = 0x0086,
    /// Port output (reserved).
    OutConCon = 0x0087,
    /// Raise a software interrupt.
    Int = 0x0090,
    /// Return from an interrupt handler.
    Iret = 0x0091,
    /// Write identification values into `RD0..RD3`.
    Cpuid = 0x0092,
}

impl Opcode {
    /// Every catalogued opcode.
    pub const ALL: &'static [Self] = &[
        Self::Nop,
        Self::Halt,
        Self::MovRegReg,
        Self::MovRegMem,
        Self::MovMemReg,
        Self::MovRegCon,
        Self::MovMemCon,
        Self::PushReg,
        Self::PushMem,
        Self::PushCon,
        Self::PopReg,
        Self::PopMem,
        Self::Swap,
        Self::Add,
        Self::Sub,
        Self::Inc,
        Self::Dec,
        Self::Mul,
        Self::Imul,
        Self::Div,
        Self::Idiv,
        Self::And,
        Self::Or,
        Self::Xor,
        Self::Not,
        Self::Shl,
        Self::Shr,
        Self::Cmp,
        Self::Fadd,
        Self::Fsub,
        Self::Fmul,
        Self::Fdiv,
        Self::Fcmp,
        Self::JmpMem,
        Self::JmpCon,
        Self::JeqMem,
        Self::JeqCon,
        Self::JneMem,
        Self::JneCon,
        Self::JltMem,
        Self::JltCon,
        Self::JleMem,
        Self::JleCon,
        Self::JgtMem,
        Self::JgtCon,
        Self::JgeMem,
        Self::JgeCon,
        Self::JaMem,
        Self::JaCon,
        Self::JaeMem,
        Self::JaeCon,
        Self::JbMem,
        Self::JbCon,
        Self::JbeMem,
        Self::JbeCon,
        Self::CallMem,
        Self::CallCon,
        Self::Ret,
        Self::InRegReg,
        Self::InRegCon,
        Self::InConReg,
        Self::InConCon,
        Self::OutRegReg,
        Self::OutRegCon,
        Self::OutConReg,
        Self::OutConCon,
        Self::Int,
        Self::Iret,
        Self::Cpuid,
    ];

    /// Looks up an opcode value.
    pub fn from_u16(raw: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| *op as u16 == raw)
    }

    /// Returns the encoded value.
    pub const fn value(self) -> u16 {
        self as u16
    }

    /// Returns `true` for the reserved port I/O family.
    pub const fn is_port_io(self) -> bool {
        matches!(
            self,
            Self::InRegReg
                | Self::InRegCon
                | Self::InConReg
                | Self::InConCon
                | Self::OutRegReg
                | Self::OutRegCon
                | Self::OutConReg
                | Self::OutConCon
        )
    }

    /// Returns the assembler mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Nop => "NOP",
            Self::Halt => "HALT",
            Self::MovRegReg => "MOV_REG_REG",
            Self::MovRegMem => "MOV_REG_MEM",
            Self::MovMemReg => "MOV_MEM_REG",
            Self::MovRegCon => "MOV_REG_CON",
            Self::MovMemCon => "MOV_MEM_CON",
            Self::PushReg => "PUSH_REG",
            Self::PushMem => "PUSH_MEM",
            Self::PushCon => "PUSH_CON",
            Self::PopReg => "POP_REG",
            Self::PopMem => "POP_MEM",
            Self::Swap => "SWAP",
            Self::Add => "ADD",
            Self::Sub => "SUB",
            Self::Inc => "INC",
            Self::Dec => "DEC",
            Self::Mul => "MUL",
            Self::Imul => "IMUL",
            Self::Div => "DIV",
            Self::Idiv => "IDIV",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
            Self::Not => "NOT",
            Self::Shl => "SHL",
            Self::Shr => "SHR",
            Self::Cmp => "CMP",
            Self::Fadd => "FADD",
            Self::Fsub => "FSUB",
            Self::Fmul => "FMUL",
            Self::Fdiv => "FDIV",
            Self::Fcmp => "FCMP",
            Self::JmpMem => "JMP_MEM",
            Self::JmpCon => "JMP_CON",
            Self::JeqMem => "JEQ_MEM",
            Self::JeqCon => "JEQ_CON",
            Self::JneMem => "JNE_MEM",
            Self::JneCon => "JNE_CON",
            Self::JltMem => "JLT_MEM",
            Self::JltCon => "JLT_CON",
            Self::JleMem => "JLE_MEM",
            Self::JleCon => "JLE_CON",
            Self::JgtMem => "JGT_MEM",
            Self::JgtCon => "JGT_CON",
            Self::JgeMem => "JGE_MEM",
            Self::JgeCon => "JGE_CON",
            Self::JaMem => "JA_MEM",
            Self::JaCon => "JA_CON",
            Self::JaeMem => "JAE_MEM",
            Self::JaeCon => "JAE_CON",
            Self::JbMem => "JB_MEM",
            Self::JbCon => "JB_CON",
            Self::JbeMem => "JBE_MEM",
            Self::JbeCon => "JBE_CON",
            Self::CallMem => "CALL_MEM",
            Self::CallCon => "CALL_CON",
            Self::Ret => "RET",
            Self::InRegReg => "IN_REG_REG",
            Self::InRegCon => "IN_REG_CON",
            Self::InConReg => "IN_CON_REG",
            Self::InConCon => "IN_CON_CON",
            Self::OutRegReg => "OUT_REG_REG",
            Self::OutRegCon => "OUT_REG_CON",
            Self::OutConReg => "OUT_CON_REG",
            Self::OutConCon => "OUT_CON_CON",
            Self::Int => "INT",
            Self::Iret => "IRET",
            Self::Cpuid => "CPUID",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
