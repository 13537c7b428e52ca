//! Micro-operations.
//!
//! A machine instruction executes as a short queue of micro-operations. Each one is a
//! resumable state machine: [`MicroOp::step`] advances it by one pipeline cycle and
//! reports whether it finished. This module provides:
//! 1. **MicroOp:** The variants and their step functions.
//! 2. **Condition:** The predicate table of conditional jumps.
//! 3. **Sequences:** Composite helpers for IP advance, fetch, immediates, push and pop.
//!
//! Memory micro-ops split their 4-byte transfer into byte messages on the bus and
//! suspend until every byte (or acknowledgement) has come back.

use std::fmt;

use tracing::debug;

use super::ExecutionContext;
use super::decode;
use crate::common::addr::Address;
use crate::common::clock::Step;
use crate::common::constants::WORD_SIZE;
use crate::common::error::CoreError;
use crate::common::reg::ConditionCodes;
use crate::core::units::alu::{Alu, AluOp};
use crate::isa::registers::RegisterId;
use crate::soc::message::{IoMessage, IoQueue};

/// Predicate evaluated by `JumpIfCondition` against the condition codes.
///
/// The unsigned and signed relations read the flags left by `CMP a, b` (`a - b`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Condition {
    /// Unconditional.
    Always,
    /// `a == b`: zero.
    Equal,
    /// `a != b`: not zero.
    NotEqual,
    /// Unsigned `a > b`: no carry and not zero.
    Above,
    /// Unsigned `a >= b`: no carry.
    AboveOrEqual,
    /// Unsigned `a < b`: carry.
    Below,
    /// Unsigned `a <= b`: carry or zero.
    BelowOrEqual,
    /// Signed `a < b`: sign differs from overflow.
    Less,
    /// Signed `a <= b`: zero, or sign differs from overflow.
    LessOrEqual,
    /// Signed `a > b`: not zero and sign equals overflow.
    Greater,
    /// Signed `a >= b`: sign equals overflow.
    GreaterOrEqual,
}

impl Condition {
    /// Evaluates the predicate.
    pub const fn holds(self, flags: ConditionCodes) -> bool {
        let (z, c, s, o) = (flags.zero(), flags.carry(), flags.sign(), flags.overflow());
        match self {
            Self::Always => true,
            Self::Equal => z,
            Self::NotEqual => !z,
            Self::Above => !c && !z,
            Self::AboveOrEqual => !c,
            Self::Below => c,
            Self::BelowOrEqual => c || z,
            Self::Less => s != o,
            Self::LessOrEqual => z || s != o,
            Self::Greater => !z && s == o,
            Self::GreaterOrEqual => s == o,
        }
    }
}

/// In-flight state of a memory read.
#[derive(Clone, Debug)]
pub struct PendingRead {
    base: Address,
    reply: IoQueue,
    bytes: [Option<u8>; WORD_SIZE as usize],
}

/// In-flight state of a memory write.
#[derive(Clone, Debug)]
pub struct PendingWrite {
    ack: IoQueue,
    acked: u32,
}

/// One atomic step of instruction execution.
#[derive(Clone, Debug)]
pub enum MicroOp {
    /// `dest = mem[address]` (4 bytes, big-endian).
    ReadMemory {
        /// Destination register.
        dest: RegisterId,
        /// Register holding the source address.
        address: RegisterId,
        /// Set once the byte reads are on the bus.
        pending: Option<PendingRead>,
    },
    /// `mem[address] = src` (4 bytes, big-endian).
    WriteMemory {
        /// Register holding the target address.
        address: RegisterId,
        /// Source register.
        src: RegisterId,
        /// Set once the byte writes are on the bus.
        pending: Option<PendingWrite>,
    },
    /// `dest = src`.
    CopyRegister {
        /// Destination register.
        dest: RegisterId,
        /// Source register.
        src: RegisterId,
    },
    /// `dest = value` (big-endian bytes).
    WriteRegister {
        /// Destination register.
        dest: RegisterId,
        /// Literal bytes.
        value: [u8; 4],
    },
    /// `left = left op right`, optionally recording flags.
    AluOperation {
        /// Operation kind.
        op: AluOp,
        /// Left operand and result register.
        left: RegisterId,
        /// Right operand (receives the remainder of a division).
        right: RegisterId,
        /// Condition-code register to update, if any.
        flags: Option<RegisterId>,
        /// Latency cycles already spent.
        elapsed: u32,
    },
    /// Expand the instruction word held in `src` into micro-operations.
    InstructionDecode {
        /// Register holding the fetched word.
        src: RegisterId,
    },
    /// `IP = target` when `condition` holds.
    JumpIfCondition {
        /// Register holding the destination.
        target: RegisterId,
        /// Predicate on the condition codes.
        condition: Condition,
    },
    /// Push the id held in `id` onto the package interrupt queue.
    RaiseInterrupt {
        /// Register holding the interrupt id.
        id: RegisterId,
    },
    /// CPU identification keyed by the request code in `request`.
    Identify {
        /// Register holding the request code.
        request: RegisterId,
    },
}

impl MicroOp {
    /// Fresh `ReadMemory`.
    pub const fn read_memory(dest: RegisterId, address: RegisterId) -> Self {
        Self::ReadMemory {
            dest,
            address,
            pending: None,
        }
    }

    /// Fresh `WriteMemory`.
    pub const fn write_memory(address: RegisterId, src: RegisterId) -> Self {
        Self::WriteMemory {
            address,
            src,
            pending: None,
        }
    }

    /// `CopyRegister`.
    pub const fn copy(dest: RegisterId, src: RegisterId) -> Self {
        Self::CopyRegister { dest, src }
    }

    /// `WriteRegister` of an unsigned literal.
    pub const fn write_u32(dest: RegisterId, value: u32) -> Self {
        Self::WriteRegister {
            dest,
            value: value.to_be_bytes(),
        }
    }

    /// Fresh `AluOperation`.
    pub const fn alu(
        op: AluOp,
        left: RegisterId,
        right: RegisterId,
        flags: Option<RegisterId>,
    ) -> Self {
        Self::AluOperation {
            op,
            left,
            right,
            flags,
            elapsed: 0,
        }
    }

    /// Short variant name for traces.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ReadMemory { .. } => "ReadMemory",
            Self::WriteMemory { .. } => "WriteMemory",
            Self::CopyRegister { .. } => "CopyRegister",
            Self::WriteRegister { .. } => "WriteRegister",
            Self::AluOperation { .. } => "AluOperation",
            Self::InstructionDecode { .. } => "InstructionDecode",
            Self::JumpIfCondition { .. } => "JumpIfCondition",
            Self::RaiseInterrupt { .. } => "RaiseInterrupt",
            Self::Identify { .. } => "Identify",
        }
    }

    /// Advances the operation by one cycle.
    ///
    /// # Returns
    ///
    /// `Step::Done` when the operation completed in this cycle. Errors are fatal to
    /// the core.
    pub fn step(&mut self, ctx: &mut ExecutionContext<'_>) -> Result<Step, CoreError> {
        match self {
            Self::ReadMemory {
                dest,
                address,
                pending,
            } => step_read(ctx, *dest, *address, pending),
            Self::WriteMemory {
                address,
                src,
                pending,
            } => step_write(ctx, *address, *src, pending),
            Self::CopyRegister { dest, src } => {
                let value = ctx.read(*src)?;
                ctx.write(*dest, value)?;
                Ok(Step::Done)
            }
            Self::WriteRegister { dest, value } => {
                ctx.write(*dest, u32::from_be_bytes(*value))?;
                Ok(Step::Done)
            }
            Self::AluOperation {
                op,
                left,
                right,
                flags,
                elapsed,
            } => {
                if *elapsed < ctx.env.alu.latency(*op) {
                    *elapsed += 1;
                    ctx.state.stats.alu_idle_cycles += 1;
                    return Ok(Step::Pending);
                }
                let a = ctx.read(*left)?;
                let b = ctx.read(*right)?;
                let outcome = Alu::compute(*op, a, b);
                ctx.write(*left, outcome.left)?;
                if let Some(remainder) = outcome.right {
                    ctx.write(*right, remainder)?;
                }
                if let Some(ccr) = flags {
                    ctx.write(*ccr, outcome.flags.bits())?;
                }
                Ok(Step::Done)
            }
            Self::InstructionDecode { src } => {
                decode::decode(ctx, *src)?;
                Ok(Step::Done)
            }
            Self::JumpIfCondition { target, condition } => {
                if condition.holds(ctx.state.regs.flags()) {
                    let destination = ctx.read(*target)?;
                    ctx.write(RegisterId::Ip, destination)?;
                }
                Ok(Step::Done)
            }
            Self::RaiseInterrupt { id } => {
                let id = ctx.read(*id)?;
                ctx.env.link.interrupts.push(id);
                ctx.state.stats.interrupts_raised += 1;
                debug!(core = ctx.env.core_id, id, "interrupt raised");
                Ok(Step::Done)
            }
            Self::Identify { request } => {
                let request = ctx.read(*request)?;
                identify(ctx, request)?;
                Ok(Step::Done)
            }
        }
    }
}

impl fmt::Display for MicroOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadMemory { dest, address, .. } => write!(f, "{dest} <- mem[{address}]"),
            Self::WriteMemory { address, src, .. } => write!(f, "mem[{address}] <- {src}"),
            Self::CopyRegister { dest, src } => write!(f, "{dest} <- {src}"),
            Self::WriteRegister { dest, value } => {
                write!(f, "{dest} <- {:#010x}", u32::from_be_bytes(*value))
            }
            Self::AluOperation {
                op, left, right, flags, ..
            } => match flags {
                Some(ccr) => write!(f, "{op} {left}, {right} -> {ccr}"),
                None => write!(f, "{op} {left}, {right}"),
            },
            Self::InstructionDecode { src } => write!(f, "decode {src}"),
            Self::JumpIfCondition { target, condition } => {
                write!(f, "jump {target} if {condition:?}")
            }
            Self::RaiseInterrupt { id } => write!(f, "raise {id}"),
            Self::Identify { request } => write!(f, "cpuid {request}"),
        }
    }
}

fn step_read(
    ctx: &mut ExecutionContext<'_>,
    dest: RegisterId,
    address: RegisterId,
    pending: &mut Option<PendingRead>,
) -> Result<Step, CoreError> {
    let Some(read) = pending.as_mut() else {
        let base = Address::from(ctx.read(address)?);
        let reply = IoQueue::new();
        for i in 0..u64::from(WORD_SIZE) {
            ctx.env
                .bus
                .push_io_message(IoMessage::read(base + i, reply.clone()))?;
        }
        *pending = Some(PendingRead {
            base,
            reply,
            bytes: [None; WORD_SIZE as usize],
        });
        return Ok(Step::Pending);
    };

    while let Some(message) = read.reply.pop() {
        if let IoMessage::Write { address, value, .. } = message {
            let slot = usize::try_from(address - read.base).unwrap_or(usize::MAX);
            if let Some(byte) = read.bytes.get_mut(slot) {
                *byte = Some(value);
            }
        }
    }

    let mut word = [0_u8; WORD_SIZE as usize];
    for (out, byte) in word.iter_mut().zip(read.bytes) {
        match byte {
            Some(b) => *out = b,
            None => return Ok(Step::Pending),
        }
    }
    ctx.write(dest, u32::from_be_bytes(word))?;
    ctx.state.stats.bytes_read += u64::from(WORD_SIZE);
    Ok(Step::Done)
}

fn step_write(
    ctx: &mut ExecutionContext<'_>,
    address: RegisterId,
    src: RegisterId,
    pending: &mut Option<PendingWrite>,
) -> Result<Step, CoreError> {
    let Some(write) = pending.as_mut() else {
        let base = Address::from(ctx.read(address)?);
        let bytes = ctx.read(src)?.to_be_bytes();
        let ack = IoQueue::new();
        for (i, byte) in (0_u64..).zip(bytes) {
            ctx.env
                .bus
                .push_io_message(IoMessage::acked_write(base + i, byte, ack.clone()))?;
        }
        *pending = Some(PendingWrite { ack, acked: 0 });
        return Ok(Step::Pending);
    };

    while write.ack.pop().is_some() {
        write.acked += 1;
    }
    if write.acked < WORD_SIZE {
        return Ok(Step::Pending);
    }
    ctx.state.stats.bytes_written += u64::from(WORD_SIZE);
    Ok(Step::Done)
}

fn identify(ctx: &mut ExecutionContext<'_>, request: u32) -> Result<(), CoreError> {
    let env = ctx.env;
    match request {
        0 => {
            for (reg, chunk) in RegisterId::DATA.iter().zip(env.link.vendor.chunks_exact(4)) {
                let word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                ctx.write(*reg, word)?;
            }
        }
        1 => {
            ctx.write(RegisterId::Rd0, env.core_id)?;
            ctx.write(RegisterId::Rd1, env.link.package_id)?;
        }
        2 => {
            ctx.write(RegisterId::Rd0, env.link.cores)?;
            ctx.write(RegisterId::Rd1, env.link.cores)?;
        }
        other => return Err(CoreError::UnknownCpuIdRequest(other)),
    }
    Ok(())
}

/// `IP += 4`.
pub fn advance_ip() -> [MicroOp; 2] {
    [
        MicroOp::write_u32(RegisterId::Size, WORD_SIZE),
        MicroOp::alu(AluOp::Add, RegisterId::Ip, RegisterId::Size, None),
    ]
}

/// Loads the next instruction word at `IP` and decodes it.
pub fn fetch_next() -> [MicroOp; 2] {
    [
        MicroOp::read_memory(RegisterId::Fetch, RegisterId::Ip),
        MicroOp::InstructionDecode {
            src: RegisterId::Fetch,
        },
    ]
}

/// Loads the trailing immediate at `IP` into `IMM` and steps over it.
pub fn fetch_immediate() -> [MicroOp; 3] {
    let [size, add] = advance_ip();
    [
        MicroOp::read_memory(RegisterId::Imm, RegisterId::Ip),
        size,
        add,
    ]
}

/// Pre-decrement push of `src`.
pub fn push(src: RegisterId) -> [MicroOp; 3] {
    [
        MicroOp::write_u32(RegisterId::Size, WORD_SIZE),
        MicroOp::alu(AluOp::Sub, RegisterId::Stp, RegisterId::Size, None),
        MicroOp::write_memory(RegisterId::Stp, src),
    ]
}

/// Post-increment pop into `dest`.
pub fn pop(dest: RegisterId) -> [MicroOp; 3] {
    [
        MicroOp::read_memory(dest, RegisterId::Stp),
        MicroOp::write_u32(RegisterId::Size, WORD_SIZE),
        MicroOp::alu(AluOp::Add, RegisterId::Stp, RegisterId::Size, None),
    ]
}
