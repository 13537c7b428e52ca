//! Execution-time instruction dispatch.
//!
//! This module turns a fetched instruction word into the micro-operations that
//! implement it. It provides:
//! 1. **Expansion:** A pure table from (opcode, operands) to a micro-op sequence.
//! 2. **Decode:** The `InstructionDecode` micro-op body, which also handles HALT,
//!    IRET bookkeeping and interrupt delivery.
//!
//! Every sequence except HALT has the same frame: advance `IP` by one word, an
//! optional trailing-immediate fetch, the body, then fetch and decode the next word.

use tracing::debug;

use super::ExecutionContext;
use super::microop::{
    Condition, MicroOp, advance_ip, fetch_immediate, fetch_next, pop, push,
};
use crate::common::power::PowerStatus;
use crate::common::error::CoreError;
use crate::core::units::alu::AluOp;
use crate::isa::instruction::InstructionWord;
use crate::isa::opcodes::Opcode;
use crate::isa::registers::RegisterId;

/// Returns the operand or a `MissingOperand` error.
fn need(
    reg: Option<RegisterId>,
    opcode: Opcode,
    operand: &'static str,
) -> Result<RegisterId, CoreError> {
    reg.ok_or(CoreError::MissingOperand { opcode, operand })
}

/// Condition and operand kind of a jump opcode; `true` means the target is an immediate.
const fn jump_condition(opcode: Opcode) -> Option<(Condition, bool)> {
    let entry = match opcode {
        Opcode::JmpMem => (Condition::Always, false),
        Opcode::JmpCon => (Condition::Always, true),
        Opcode::JeqMem => (Condition::Equal, false),
        Opcode::JeqCon => (Condition::Equal, true),
        Opcode::JneMem => (Condition::NotEqual, false),
        Opcode::JneCon => (Condition::NotEqual, true),
        Opcode::JltMem => (Condition::Less, false),
        Opcode::JltCon => (Condition::Less, true),
        Opcode::JleMem => (Condition::LessOrEqual, false),
        Opcode::JleCon => (Condition::LessOrEqual, true),
        Opcode::JgtMem => (Condition::Greater, false),
        Opcode::JgtCon => (Condition::Greater, true),
        Opcode::JgeMem => (Condition::GreaterOrEqual, false),
        Opcode::JgeCon => (Condition::GreaterOrEqual, true),
        Opcode::JaMem => (Condition::Above, false),
        Opcode::JaCon => (Condition::Above, true),
        Opcode::JaeMem => (Condition::AboveOrEqual, false),
        Opcode::JaeCon => (Condition::AboveOrEqual, true),
        Opcode::JbMem => (Condition::Below, false),
        Opcode::JbCon => (Condition::Below, true),
        Opcode::JbeMem => (Condition::BelowOrEqual, false),
        Opcode::JbeCon => (Condition::BelowOrEqual, true),
        _ => return None,
    };
    Some(entry)
}

/// ALU operation of a two-register arithmetic opcode.
const fn binary_op(opcode: Opcode) -> Option<AluOp> {
    let op = match opcode {
        Opcode::Add => AluOp::Add,
        Opcode::Sub => AluOp::Sub,
        Opcode::Mul => AluOp::UnsignedMul,
        Opcode::Imul => AluOp::SignedMul,
        Opcode::Div => AluOp::UnsignedDiv,
        Opcode::Idiv => AluOp::SignedDiv,
        Opcode::And => AluOp::And,
        Opcode::Or => AluOp::Or,
        Opcode::Xor => AluOp::Xor,
        Opcode::Shl => AluOp::Shl,
        Opcode::Shr => AluOp::Shr,
        Opcode::Fadd => AluOp::FAdd,
        Opcode::Fsub => AluOp::FSub,
        Opcode::Fmul => AluOp::FMul,
        Opcode::Fdiv => AluOp::FDiv,
        _ => return None,
    };
    Some(op)
}

/// Expands one instruction into its micro-operation sequence.
///
/// # Arguments
///
/// * `opcode` - The dispatched opcode.
/// * `first`  - First register operand, if encoded.
/// * `second` - Second register operand, if encoded.
/// * `wide`   - Size flag; selects the immediate form of `INT`.
///
/// # Returns
///
/// The sequence to append, empty for HALT. Reserved opcodes and missing operands
/// are errors.
pub fn expand(
    opcode: Opcode,
    first: Option<RegisterId>,
    second: Option<RegisterId>,
    wide: bool,
) -> Result<Vec<MicroOp>, CoreError> {
    if opcode == Opcode::Halt {
        return Ok(Vec::new());
    }
    if opcode.is_port_io() {
        return Err(CoreError::UnimplementedOpcode(opcode));
    }

    let a = || need(first, opcode, "first");
    let b = || need(second, opcode, "second");
    let ccr = Some(RegisterId::Ccr);

    let mut ops: Vec<MicroOp> = advance_ip().into();

    if let Some(op) = binary_op(opcode) {
        ops.push(MicroOp::alu(op, a()?, b()?, ccr));
    } else if let Some((condition, immediate)) = jump_condition(opcode) {
        let target = if immediate {
            ops.extend(fetch_immediate());
            RegisterId::Imm
        } else {
            a()?
        };
        ops.push(MicroOp::JumpIfCondition { target, condition });
    } else {
        match opcode {
            Opcode::Nop => {}
            Opcode::MovRegReg => ops.push(MicroOp::copy(a()?, b()?)),
            Opcode::MovRegMem => ops.push(MicroOp::read_memory(a()?, b()?)),
            Opcode::MovMemReg => ops.push(MicroOp::write_memory(a()?, b()?)),
            Opcode::MovRegCon => {
                let dest = a()?;
                ops.extend(fetch_immediate());
                ops.push(MicroOp::copy(dest, RegisterId::Imm));
            }
            Opcode::MovMemCon => {
                let address = a()?;
                ops.extend(fetch_immediate());
                ops.push(MicroOp::write_memory(address, RegisterId::Imm));
            }
            Opcode::PushReg => ops.extend(push(a()?)),
            Opcode::PushMem => {
                ops.push(MicroOp::read_memory(RegisterId::Tmp, a()?));
                ops.extend(push(RegisterId::Tmp));
            }
            Opcode::PushCon => {
                ops.extend(fetch_immediate());
                ops.extend(push(RegisterId::Imm));
            }
            Opcode::PopReg => ops.extend(pop(a()?)),
            Opcode::PopMem => {
                let address = a()?;
                ops.extend(pop(RegisterId::Tmp));
                ops.push(MicroOp::write_memory(address, RegisterId::Tmp));
            }
            Opcode::Swap => {
                let (x, y) = (a()?, b()?);
                ops.extend([
                    MicroOp::copy(RegisterId::Tmp, x),
                    MicroOp::copy(x, y),
                    MicroOp::copy(y, RegisterId::Tmp),
                ]);
            }
            Opcode::Inc | Opcode::Dec => {
                let op = if opcode == Opcode::Inc {
                    AluOp::Add
                } else {
                    AluOp::Sub
                };
                ops.extend([
                    MicroOp::write_u32(RegisterId::Tmp, 1),
                    MicroOp::alu(op, a()?, RegisterId::Tmp, ccr),
                ]);
            }
            Opcode::Not => ops.extend([
                MicroOp::write_u32(RegisterId::Tmp, u32::MAX),
                MicroOp::alu(AluOp::Xor, a()?, RegisterId::Tmp, ccr),
            ]),
            Opcode::Cmp | Opcode::Fcmp => {
                let op = if opcode == Opcode::Cmp {
                    AluOp::Sub
                } else {
                    AluOp::FSub
                };
                ops.extend([
                    MicroOp::copy(RegisterId::Tmp, a()?),
                    MicroOp::alu(op, RegisterId::Tmp, b()?, ccr),
                ]);
            }
            Opcode::CallMem => {
                let target = a()?;
                ops.extend(push(RegisterId::Ip));
                ops.push(MicroOp::copy(RegisterId::Ip, target));
            }
            Opcode::CallCon => {
                ops.extend(fetch_immediate());
                ops.extend(push(RegisterId::Ip));
                ops.push(MicroOp::copy(RegisterId::Ip, RegisterId::Imm));
            }
            Opcode::Ret => ops.extend(pop(RegisterId::Ip)),
            Opcode::Int => {
                let id = if wide {
                    ops.extend(fetch_immediate());
                    RegisterId::Imm
                } else {
                    a()?
                };
                ops.push(MicroOp::RaiseInterrupt { id });
            }
            Opcode::Iret => {
                ops.extend(pop(RegisterId::Ccr));
                for reg in RegisterId::DATA.iter().rev() {
                    ops.extend(pop(*reg));
                }
                ops.extend(pop(RegisterId::Ip));
            }
            Opcode::Cpuid => ops.push(MicroOp::Identify { request: a()? }),
            _ => return Err(CoreError::UnimplementedOpcode(opcode)),
        }
    }

    ops.extend(fetch_next());
    Ok(ops)
}

/// Sequence entering the handler of interrupt `id`.
///
/// Saves `IP` (the undecoded instruction), the data registers and `CCR` on the
/// stack, records the return address in `IRA`, loads `IP` from the descriptor
/// table slot and resumes fetching there.
pub fn interrupt_entry(table: u32, id: u32) -> Vec<MicroOp> {
    let slot = table.wrapping_add(id.wrapping_mul(4));
    let mut ops: Vec<MicroOp> = push(RegisterId::Ip).into();
    for reg in RegisterId::DATA {
        ops.extend(push(reg));
    }
    ops.extend(push(RegisterId::Ccr));
    ops.extend([
        MicroOp::copy(RegisterId::Ira, RegisterId::Ip),
        MicroOp::write_u32(RegisterId::Tmp, slot),
        MicroOp::read_memory(RegisterId::Ip, RegisterId::Tmp),
    ]);
    ops.extend(fetch_next());
    ops
}

/// Body of the `InstructionDecode` micro-op.
///
/// Delivers a pending interrupt instead of decoding when the core is not already
/// in a handler and `IDT` is set. Otherwise dispatches the word held in `src`.
pub fn decode(ctx: &mut ExecutionContext<'_>, src: RegisterId) -> Result<(), CoreError> {
    let table = ctx.state.regs.read(RegisterId::Idt);
    if !ctx.state.in_interrupt && table != 0 {
        if let Some(id) = ctx.env.link.interrupts.pop() {
            ctx.state.in_interrupt = true;
            ctx.state.stats.interrupts_delivered += 1;
            debug!(core = ctx.env.core_id, id, "interrupt delivered");
            ctx.queue.extend(interrupt_entry(table, id));
            return Ok(());
        }
    }

    let raw = ctx.read(src)?;
    let word = InstructionWord::decode(raw);
    let opcode = word
        .opcode()
        .ok_or(CoreError::UnknownOpcode(word.opcode))?;
    let first = RegisterId::decode_operand(word.first)?;
    let second = RegisterId::decode_operand(word.second)?;
    ctx.state.stats.instructions_decoded += 1;
    debug!(
        core = ctx.env.core_id,
        ip = ctx.state.regs.read(RegisterId::Ip),
        %opcode,
        "dispatch"
    );

    match opcode {
        Opcode::Halt => {
            ctx.state.halt_requested = true;
            ctx.env.status.set(PowerStatus::Stopping);
        }
        Opcode::Iret => ctx.state.in_interrupt = false,
        _ => {}
    }

    ctx.queue.extend(expand(opcode, first, second, word.wide)?);
    Ok(())
}
