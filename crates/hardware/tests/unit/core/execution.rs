//! # Program Execution Tests
//!
//! Short programs run on the threaded machine: every core and device has its own
//! worker, and results are read back once the machine is off again.

use std::thread;
use std::time::Duration;

use microsim_core::common::error::{CoreError, SimError};
use microsim_core::common::power::PowerStatus;
use microsim_core::common::reg::{ConditionCodes, PrivilegeMode};
use microsim_core::config::{AluConfig, DeviceConfig, RomConfig};
use microsim_core::isa::{Opcode, RegisterId};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::builder::Program;
use crate::common::harness::{TEST_RAM_SIZE, TestContext, wait_until};

use RegisterId::{Rd0, Rd1, Rd2, Rd3, Rd4, Rd5};

/// Verifies the smallest program: load an immediate and halt.
#[test]
fn test_mov_immediate_then_halt() {
    let program = Program::new().mov_imm(Rd0, 0xFF).halt();
    let (machine, result) = TestContext::new().with_program(program).run();

    let stats = result.unwrap();
    assert_eq!(machine.reg(Rd0), 255);
    assert_eq!(machine.reg(RegisterId::Ip), 8);
    assert_eq!(machine.board.package().core(0).unwrap().status(), PowerStatus::Off);
    assert_eq!(machine.board.status(), PowerStatus::Off);
    assert_eq!(stats.instructions_decoded, 2);
    // initial fetch (2) + MOV sequence (8); HALT queues nothing
    assert_eq!(stats.micro_ops_retired, 10);
    assert_eq!(stats.bytes_read, 12);
    assert_eq!(stats.bytes_written, 0);
}

/// Verifies that the core boots with the stack at the end of RAM.
#[test]
fn test_stack_starts_at_ram_end() {
    let ram = DeviceConfig::default().with_size(1024).with_latency(0);
    let (machine, result) = TestContext::new()
        .with_ram(vec![ram, ram.with_size(2048)])
        .with_program(Program::new().halt())
        .run();

    let _ = result.unwrap();
    assert_eq!(machine.reg(RegisterId::Stp), 3072);
    assert_eq!(machine.reg(RegisterId::Fbp), 3072);
}

/// Verifies pre-decrement push, post-increment pop and the memory forms.
#[test]
fn test_stack_discipline() {
    let program = Program::new()
        .mov_imm(Rd0, 0x1234)
        .push(Rd0)
        .pop(Rd1)
        .push_imm(0x55)
        .pop(Rd2)
        .mov_imm(Rd3, 0x300)
        .mov_imm(Rd4, 0xABCD)
        .store(Rd3, Rd4)
        .push_mem(Rd3)
        .mov_imm(Rd5, 0x304)
        .pop_mem(Rd5)
        .push(Rd0)
        .halt();
    let (machine, result) = TestContext::new().with_program(program).run();

    let _ = result.unwrap();
    assert_eq!(machine.reg(Rd1), 0x1234);
    assert_eq!(machine.reg(Rd2), 0x55);
    assert_eq!(machine.word(0x304), 0xABCD);
    let top = TEST_RAM_SIZE as u32;
    assert_eq!(machine.reg(RegisterId::Stp), top - 4);
    assert_eq!(machine.word(top - 4), 0x1234);
}

/// Verifies that CALL pushes the return address and RET pops it.
#[test]
fn test_call_and_return() {
    let main = Program::new().call(0x40).mov_imm(Rd1, 2).halt();
    let routine = Program::at(0x40).mov_imm(Rd0, 9).ret();
    let (machine, result) = TestContext::new()
        .with_program(main)
        .with_program(routine)
        .run();

    let _ = result.unwrap();
    assert_eq!(machine.reg(Rd0), 9);
    assert_eq!(machine.reg(Rd1), 2);
    assert_eq!(machine.reg(RegisterId::Stp), TEST_RAM_SIZE as u32);
    // return address: the word after CALL and its immediate
    assert_eq!(machine.word(TEST_RAM_SIZE as u32 - 4), 8);
}

/// Verifies conditional jumps after CMP, taken and not taken.
#[rstest]
#[case(3, 3, Opcode::JeqCon, true)]
#[case(3, 4, Opcode::JeqCon, false)]
#[case(3, 4, Opcode::JneCon, true)]
#[case(0xFFFF_FFFF, 1, Opcode::JltCon, true)]
#[case(0xFFFF_FFFF, 1, Opcode::JbCon, false)]
#[case(0xFFFF_FFFF, 1, Opcode::JaCon, true)]
#[case(5, 2, Opcode::JgtCon, true)]
#[case(2, 5, Opcode::JgeCon, false)]
#[case(2, 5, Opcode::JleCon, true)]
#[case(2, 2, Opcode::JaeCon, true)]
#[case(2, 2, Opcode::JbeCon, true)]
fn test_compare_and_branch(
    #[case] a: u32,
    #[case] b: u32,
    #[case] jump: Opcode,
    #[case] taken: bool,
) {
    let program = Program::new()
        .mov_imm(Rd0, a)
        .mov_imm(Rd1, b)
        .cmp(Rd0, Rd1)
        .jump(jump, 0x40)
        .mov_imm(Rd2, 1)
        .halt();
    let target = Program::at(0x40).mov_imm(Rd2, 2).halt();
    let (machine, result) = TestContext::new()
        .with_program(program)
        .with_program(target)
        .run();

    let _ = result.unwrap();
    assert_eq!(machine.reg(Rd2), if taken { 2 } else { 1 });
    // CMP leaves both operands untouched
    assert_eq!(machine.reg(Rd0), a);
    assert_eq!(machine.reg(Rd1), b);
}

/// Verifies the register-target jumps after CMP, taken and not taken.
#[rstest]
#[case(0, 1, Opcode::JmpMem, true)]
#[case(3, 3, Opcode::JeqMem, true)]
#[case(3, 4, Opcode::JeqMem, false)]
#[case(3, 4, Opcode::JneMem, true)]
#[case(2, 5, Opcode::JltMem, true)]
#[case(0xFFFF_FFFF, 1, Opcode::JaMem, true)]
#[case(5, 2, Opcode::JbeMem, false)]
fn test_compare_and_branch_through_register(
    #[case] a: u32,
    #[case] b: u32,
    #[case] jump: Opcode,
    #[case] taken: bool,
) {
    let program = Program::new()
        .mov_imm(Rd0, a)
        .mov_imm(Rd1, b)
        .mov_imm(Rd3, 0x40)
        .cmp(Rd0, Rd1)
        .op_r(jump, Rd3)
        .mov_imm(Rd2, 1)
        .halt();
    let target = Program::at(0x40).mov_imm(Rd2, 2).halt();
    let (machine, result) = TestContext::new()
        .with_program(program)
        .with_program(target)
        .run();

    let _ = result.unwrap();
    assert_eq!(machine.reg(Rd2), if taken { 2 } else { 1 });
    assert_eq!(machine.reg(Rd3), 0x40);
}

/// Verifies CALL through a register followed by a register-target conditional jump.
#[test]
fn test_call_and_jump_through_registers() {
    let main = Program::new()
        .mov_imm(Rd0, 0x40)
        .mov_imm(Rd4, 0x80)
        .op_r(Opcode::CallMem, Rd0)
        .mov_imm(Rd2, 7)
        .cmp(Rd1, Rd2)
        .op_r(Opcode::JeqMem, Rd4)
        .mov_imm(Rd5, 1)
        .halt();
    let routine = Program::at(0x40).mov_imm(Rd1, 7).ret();
    let equal = Program::at(0x80).mov_imm(Rd5, 2).halt();
    let (machine, result) = TestContext::new()
        .with_program(main)
        .with_program(routine)
        .with_program(equal)
        .run();

    let _ = result.unwrap();
    assert_eq!(machine.reg(Rd1), 7);
    assert_eq!(machine.reg(Rd5), 2);
    assert_eq!(machine.reg(RegisterId::Stp), TEST_RAM_SIZE as u32);
    // return address: the word after CALL_MEM, which carries no immediate
    assert_eq!(machine.word(TEST_RAM_SIZE as u32 - 4), 20);
}

/// Verifies a countdown loop built from DEC and a backwards jump.
#[test]
fn test_countdown_loop() {
    let program = Program::new().mov_imm(Rd0, 5).mov_imm(Rd1, 0).mov_imm(Rd2, 0);
    let top = program.here();
    let program = program
        .op_r(Opcode::Inc, Rd1)
        .op_r(Opcode::Dec, Rd0)
        .cmp(Rd0, Rd2)
        .jump(Opcode::JneCon, top)
        .halt();
    let (machine, result) = TestContext::new()
        .with_alu(AluConfig::immediate())
        .with_program(program)
        .run();

    let _ = result.unwrap();
    assert_eq!(machine.reg(Rd0), 0);
    assert_eq!(machine.reg(Rd1), 5);
}

/// Verifies integer arithmetic written back to both operands.
#[test]
fn test_integer_arithmetic() {
    let program = Program::new()
        .mov_imm(Rd0, 17)
        .mov_imm(Rd1, 5)
        .alu(Opcode::Div, Rd0, Rd1)
        .mov_imm(Rd2, 6)
        .mov_imm(Rd3, 7)
        .alu(Opcode::Mul, Rd2, Rd3)
        .mov_int(Rd4, -8)
        .mov_imm(Rd5, 2)
        .alu(Opcode::Idiv, Rd4, Rd5)
        .halt();
    let (machine, result) = TestContext::new().with_program(program).run();

    let _ = result.unwrap();
    assert_eq!(machine.reg(Rd0), 3);
    assert_eq!(machine.reg(Rd1), 2);
    assert_eq!(machine.reg(Rd2), 42);
    assert_eq!(machine.reg(Rd4) as i32, -4);
}

/// Verifies that division by zero is a flag, not a fault.
#[test]
fn test_division_by_zero_sets_flag() {
    let program = Program::new()
        .mov_imm(Rd0, 10)
        .mov_imm(Rd1, 0)
        .alu(Opcode::Div, Rd0, Rd1)
        .halt();
    let (machine, result) = TestContext::new().with_program(program).run();

    let _ = result.unwrap();
    assert_eq!(machine.reg(Rd0), 0);
    assert_eq!(machine.reg(Rd1), 0);
    let flags = ConditionCodes(machine.reg(RegisterId::Ccr));
    assert!(flags.zero_division());
    assert!(flags.zero());
}

/// Verifies SWAP, NOT and the float ALU on register bits.
#[test]
fn test_swap_not_and_float() {
    let program = Program::new()
        .mov_imm(Rd0, 1)
        .mov_imm(Rd1, 2)
        .op_rr(Opcode::Swap, Rd0, Rd1)
        .mov_imm(Rd2, 0x0F0F_0F0F)
        .op_r(Opcode::Not, Rd2)
        .mov_float(Rd3, 1.5)
        .mov_float(Rd4, 2.25)
        .alu(Opcode::Fadd, Rd3, Rd4)
        .halt();
    let (machine, result) = TestContext::new().with_program(program).run();

    let _ = result.unwrap();
    assert_eq!(machine.reg(Rd0), 2);
    assert_eq!(machine.reg(Rd1), 1);
    assert_eq!(machine.reg(Rd2), 0xF0F0_F0F0);
    assert_eq!(f32::from_bits(machine.reg(Rd3)), 3.75);
}

/// Verifies the CPUID vendor, identity and core-count requests.
#[test]
fn test_cpuid() {
    let program = Program::new()
        .mov_imm(Rd5, 0)
        .cpuid(Rd5)
        .mov(RegisterId::Rd6, Rd0)
        .mov(RegisterId::Rd7, Rd3)
        .mov_imm(Rd5, 1)
        .cpuid(Rd5)
        .mov(RegisterId::Rd8, Rd1)
        .mov_imm(Rd5, 2)
        .cpuid(Rd5)
        .halt();
    let (machine, result) = TestContext::new()
        .with_vendor("TestVendorString")
        .with_package_id(7)
        .with_cores(2)
        .with_program(program)
        .run();

    let _ = result.unwrap();
    for core in 0..2 {
        assert_eq!(machine.core_reg(core, RegisterId::Rd6), u32::from_be_bytes(*b"Test"));
        assert_eq!(machine.core_reg(core, RegisterId::Rd7), u32::from_be_bytes(*b"ring"));
        assert_eq!(machine.core_reg(core, RegisterId::Rd8), 7);
        assert_eq!(machine.core_reg(core, Rd0), 2);
        assert_eq!(machine.core_reg(core, Rd1), 2);
    }
}

/// Verifies that short vendor names are space-padded.
#[test]
fn test_cpuid_vendor_padding() {
    let program = Program::new().mov_imm(Rd5, 0).cpuid(Rd5).halt();
    let (machine, result) = TestContext::new()
        .with_vendor("Acme")
        .with_program(program)
        .run();

    let _ = result.unwrap();
    assert_eq!(machine.reg(Rd0), u32::from_be_bytes(*b"Acme"));
    assert_eq!(machine.reg(Rd1), u32::from_be_bytes(*b"    "));
}

/// Verifies that an undefined CPUID request stops the core with an error.
#[test]
fn test_unknown_cpuid_request() {
    let program = Program::new().mov_imm(Rd5, 3).cpuid(Rd5).halt();
    let (_, result) = TestContext::new().with_program(program).run();
    assert_eq!(
        result,
        Err(SimError::Core(CoreError::UnknownCpuIdRequest(3)))
    );
}

/// Verifies that an unknown opcode stops the core with an error.
#[test]
fn test_unknown_opcode_stops_core() {
    let program = Program::new().nop().word(0x0000_FFFF);
    let (machine, result) = TestContext::new().with_program(program).run();
    assert_eq!(result, Err(SimError::Core(CoreError::UnknownOpcode(0xFFFF))));
    assert_eq!(machine.board.status(), PowerStatus::Off);
}

/// Verifies that reserved port I/O opcodes are rejected.
#[test]
fn test_port_io_is_unimplemented() {
    let program = Program::new().op_rr(Opcode::InRegReg, Rd0, Rd1).halt();
    let (_, result) = TestContext::new().with_program(program).run();
    assert_eq!(
        result,
        Err(SimError::Core(CoreError::UnimplementedOpcode(Opcode::InRegReg)))
    );
}

/// Verifies that user mode cannot program the interrupt table.
#[test]
fn test_user_mode_privilege_violation() {
    let program = Program::new().mov_imm(RegisterId::Idt, 0x200).halt();
    let (_, result) = TestContext::new()
        .with_privilege(PrivilegeMode::User)
        .with_program(program)
        .run();
    assert_eq!(
        result,
        Err(SimError::Core(CoreError::PrivilegeViolation(RegisterId::Idt)))
    );
}

/// Verifies that a program running off the end of RAM faults on the fetch.
#[test]
fn test_fetch_past_ram_end_faults() {
    let ram = DeviceConfig::default().with_size(16).with_latency(0);
    let (_, result) = TestContext::new()
        .with_ram(vec![ram])
        .with_program(Program::new().nop().nop().nop().nop())
        .run();
    assert!(matches!(result, Err(SimError::Core(CoreError::Bus(_)))));
}

/// Verifies that an endless loop keeps running until the machine is powered off.
#[test]
fn test_power_off_stops_endless_loop() {
    let program = Program::new().mov_imm(Rd0, 1);
    let top = program.here();
    let program = program.op_r(Opcode::Inc, Rd1).jmp(top);
    let machine = TestContext::new().with_program(program).build();
    let board = &machine.board;

    board.power_on().unwrap();
    assert_eq!(board.status(), PowerStatus::On);
    thread::sleep(Duration::from_millis(50));
    assert_eq!(board.status(), PowerStatus::On);
    board.power_off().unwrap();

    assert_eq!(board.status(), PowerStatus::Off);
    assert_eq!(machine.reg(Rd0), 1);
    assert!(machine.reg(Rd1) > 0);
    let ip = machine.reg(RegisterId::Ip);
    assert!((top..top + 16).contains(&ip), "ip {ip:#x} left the loop");
}

/// Verifies that powering off a core which already executed HALT joins its worker.
#[test]
fn test_power_off_after_halt_joins_worker() {
    let program = Program::new().mov_imm(Rd0, 5).halt();
    let machine = TestContext::new().with_program(program).build();
    let board = &machine.board;
    let Some(core) = board.package().core(0) else {
        panic!("package has no core 0");
    };

    board.power_on().unwrap();
    assert!(wait_until(Duration::from_secs(1), || {
        core.status() == PowerStatus::Off
    }));
    assert!(core.has_worker());

    core.power_off().unwrap();
    assert!(!core.has_worker());
    assert_eq!(core.register(Rd0), Some(5));
    assert!(matches!(core.power_off(), Err(SimError::Power(_))));

    board.power_off().unwrap();
    assert_eq!(board.status(), PowerStatus::Off);
    assert_eq!(machine.reg(Rd0), 5);
}

/// Verifies that a fault surfaces through power-off when the core stopped on its own.
#[test]
fn test_power_off_after_fault_reports_error() {
    let machine = TestContext::new()
        .with_program(Program::new().op_rr(Opcode::InRegReg, Rd0, Rd1))
        .build();
    let board = &machine.board;
    let Some(core) = board.package().core(0) else {
        panic!("package has no core 0");
    };

    board.power_on().unwrap();
    assert!(wait_until(Duration::from_secs(1), || {
        core.status() == PowerStatus::Off
    }));
    assert!(matches!(board.power_off(), Err(SimError::Core(_))));
    assert!(!core.has_worker());
}

/// Verifies that powering a faulted core back on reaps its previous worker.
#[test]
fn test_power_on_reaps_faulted_worker() {
    let machine = TestContext::new()
        .with_program(Program::new().op_rr(Opcode::InRegReg, Rd0, Rd1))
        .build();
    let board = &machine.board;
    let Some(core) = board.package().core(0) else {
        panic!("package has no core 0");
    };
    let stopped = || wait_until(Duration::from_secs(1), || core.status() == PowerStatus::Off);

    board.power_on().unwrap();
    assert!(stopped());
    core.power_on(board.bus(), board.package().link()).unwrap();
    assert!(stopped());
    assert!(matches!(core.power_off(), Err(SimError::Core(_))));

    board.power_off().unwrap();
    assert!(!core.has_worker());
}

/// Verifies that a second power-on of a running machine is rejected.
#[test]
fn test_double_power_on_rejected() {
    let program = Program::new();
    let top = program.here();
    let machine = TestContext::new().with_program(program.jmp(top)).build();
    let board = &machine.board;

    board.power_on().unwrap();
    assert!(matches!(board.power_on(), Err(SimError::Power(_))));
    assert_eq!(board.status(), PowerStatus::On);
    board.power_off().unwrap();
    assert!(matches!(board.power_off(), Err(SimError::Power(_))));
}

/// Verifies that registers reset between runs while memory persists.
#[test]
fn test_memory_persists_across_power_cycles() {
    let program = Program::new()
        .mov_imm(Rd1, 0x100)
        .load(Rd0, Rd1)
        .op_r(Opcode::Inc, Rd0)
        .store(Rd1, Rd0)
        .halt();
    let machine = TestContext::new().with_program(program).build();

    let _ = machine.board.run().unwrap();
    let _ = machine.board.run().unwrap();

    assert_eq!(machine.word(0x100), 2);
    assert_eq!(machine.reg(Rd0), 2);
}

/// Verifies that ROM serves code and reads while silently dropping writes.
#[test]
fn test_rom_ignores_writes() {
    let rom = RomConfig::default();
    let base = rom.base as u32;
    let data = base + 0x100;
    let program = Program::at(base)
        .mov_imm(Rd0, data)
        .mov_imm(Rd1, 5)
        .store(Rd0, Rd1)
        .load(Rd2, Rd0)
        .halt();
    let (machine, result) = TestContext::new()
        .with_rom(rom)
        .with_entry(base)
        .with_program(program)
        .with_image(data, 0xCAFE_BABE_u32.to_be_bytes().to_vec())
        .run();

    let _ = result.unwrap();
    assert_eq!(machine.reg(Rd2), 0xCAFE_BABE);
    assert_eq!(machine.word(data), 0xCAFE_BABE);
}

/// Verifies that every core of a package runs and halts independently.
#[test]
fn test_multicore_halt() {
    let program = Program::new()
        .mov_imm(Rd5, 1)
        .cpuid(Rd5)
        .halt();
    let (machine, result) = TestContext::new().with_cores(4).with_program(program).run();

    let stats = result.unwrap();
    assert_eq!(stats.instructions_decoded, 4 * 3);
    for core in 0..4 {
        assert_eq!(machine.core_reg(core, Rd0), core as u32);
    }
    assert!(wait_until(Duration::from_secs(1), || {
        machine.board.package().status() == PowerStatus::Off
    }));
}
