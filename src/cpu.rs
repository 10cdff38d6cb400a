//! The CPU step loop: fetch, decode, execute, trace, watchpoint check, per
//! `exec(n)` call, driving the `RUNNING/STOP/END/ABORT/QUIT` state machine.

use crate::decode::decode_instruction;
use crate::elf::FunctionTable;
use crate::error::EmulatorError;
use crate::executor::{self, Outcome};
use crate::expr::{MemoryRead, RegisterLookup};
use crate::inst::format_instruction;
use crate::memory::Memory;
use crate::regs::{Gpr, RegisterFile};
use crate::trace::{Ftrace, MemDirection, Mtrace, RingBuffer};
use crate::watchpoint::WatchpointPool;

pub const DEFAULT_RING_CAPACITY: usize = 16;

/// "Run until halt" sentinel for [`Cpu::exec`].
pub const UNBOUNDED: u64 = u64::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineState {
    Running,
    Stop,
    End { exit_code: i32 },
    Abort,
    Quit,
}

pub struct Cpu {
    regs: RegisterFile,
    mem: Memory,
    ring: RingBuffer,
    mtrace: Mtrace,
    ftrace: Ftrace,
    watchpoints: WatchpointPool,
    instruction_count: u64,
    state: MachineState,
}

impl Cpu {
    pub fn new(mem: Memory, entry_pc: u32, functions: FunctionTable) -> Self {
        let mut regs = RegisterFile::new();
        regs.set_pc(entry_pc);
        Cpu {
            regs,
            mem,
            ring: RingBuffer::new(DEFAULT_RING_CAPACITY),
            mtrace: Mtrace::disabled(),
            ftrace: Ftrace::new(functions, None),
            watchpoints: WatchpointPool::new(),
            instruction_count: 0,
            state: MachineState::Running,
        }
    }

    /// Mirror every retired instruction's trace line to `sink` (the
    /// `-itrace` log), in addition to the in-memory ring buffer.
    pub fn enable_itrace(&mut self, sink: Box<dyn std::io::Write + Send>) {
        self.ring.enable_sink(sink);
    }

    pub fn enable_mtrace(&mut self, sink: Box<dyn std::io::Write + Send>) {
        self.mtrace = Mtrace::enabled(sink);
    }

    pub fn enable_ftrace(&mut self, functions: FunctionTable, sink: Box<dyn std::io::Write + Send>) {
        self.ftrace = Ftrace::new(functions, Some(sink));
    }

    pub fn regs(&self) -> &RegisterFile {
        &self.regs
    }

    pub fn mem(&self) -> &Memory {
        &self.mem
    }

    pub fn watchpoints(&self) -> &WatchpointPool {
        &self.watchpoints
    }

    pub fn watchpoints_mut(&mut self) -> &mut WatchpointPool {
        &mut self.watchpoints
    }

    pub fn state(&self) -> MachineState {
        self.state
    }

    pub fn instruction_count(&self) -> u64 {
        self.instruction_count
    }

    pub fn ring_buffer(&self) -> &RingBuffer {
        &self.ring
    }

    pub fn request_quit(&mut self) {
        self.state = MachineState::Quit;
    }

    /// Evaluate a debugger expression against the live register file and
    /// memory (registers and `DEREF` both see current, not snapshotted,
    /// state).
    pub fn evaluate_expr(&self, text: &str) -> Result<u32, crate::error::CommandError> {
        let regs = RegBridge(&self.regs);
        let mem = MemBridge(&self.mem);
        crate::expr::evaluate(text, &regs, &mem)
    }

    pub fn add_watchpoint(&mut self, expr: &str) -> Result<usize, crate::error::CommandError> {
        let regs = RegBridge(&self.regs);
        let mem = MemBridge(&self.mem);
        self.watchpoints.add(expr, &regs, &mem)
    }

    pub fn remove_watchpoint(&mut self, id: usize) -> Result<(), crate::error::CommandError> {
        self.watchpoints.remove(id)
    }

    /// Run up to `n` instructions (pass [`UNBOUNDED`] to run until halt).
    /// Returns the machine state at the point `exec` stopped driving the
    /// loop, matching the seven-step order: snapshot, fetch, decode+execute,
    /// trace, commit pc, watchpoint check, terminal-state check.
    pub fn exec(&mut self, n: u64) -> Result<MachineState, EmulatorError> {
        let mut remaining = n;
        loop {
            if remaining == 0 {
                return Ok(self.state);
            }
            if !matches!(self.state, MachineState::Running) {
                return Ok(self.state);
            }

            let pc = self.regs.pc();
            let snpc = pc.wrapping_add(4);
            let mut dnpc = snpc;

            let inst = match self.mem.fetch_instruction(pc) {
                Ok(word) => word,
                Err(e) => {
                    self.state = MachineState::Abort;
                    log::error!("instruction fetch failed: {e}\n{}", self.ring.dump());
                    return Err(e);
                }
            };

            let decoded = decode_instruction(inst);
            let outcome = self.run_one(&decoded, pc, &mut dnpc)?;

            let line = format!(
                "0x{pc:08x}: {:08x}    {}",
                inst.swap_bytes(),
                format_instruction(&decoded)
            );
            self.ring.push(line.clone());
            log::trace!("{line}");
            if matches!(outcome, Outcome::Jump) {
                self.ftrace.on_jump(&decoded, pc, dnpc);
            }

            self.regs.write(Gpr::Zero, 0);
            self.regs.set_pc(dnpc);
            self.instruction_count += 1;

            match outcome {
                Outcome::Ebreak { a0 } => {
                    self.state = MachineState::End {
                        exit_code: if a0 == 0 { 0 } else { 1 },
                    };
                }
                Outcome::Illegal => {
                    self.state = MachineState::Abort;
                    let e = EmulatorError::IllegalInstruction { pc, instruction: inst };
                    log::error!("{e}\n{}", self.ring.dump());
                    return Err(e);
                }
                _ => {}
            }

            if matches!(self.state, MachineState::Running) {
                let bridge = RegBridge(&self.regs);
                let mem_bridge = MemBridge(&self.mem);
                let changes = self.watchpoints.check(&bridge, &mem_bridge);
                for change in &changes {
                    println!(
                        "Watchpoint[{}] {} changed from {} to {}",
                        change.id, change.expression, change.old_value, change.new_value
                    );
                }
                if !changes.is_empty() {
                    self.state = MachineState::Stop;
                }
            }

            remaining -= 1;
            if !matches!(self.state, MachineState::Running) {
                return Ok(self.state);
            }
        }
    }

    fn run_one(&mut self, decoded: &crate::inst::Decoded, pc: u32, dnpc: &mut u32) -> Result<Outcome, EmulatorError> {
        use crate::inst::Op;
        let is_load = matches!(decoded.op, Op::Lb | Op::Lh | Op::Lw | Op::Lbu | Op::Lhu);
        let is_store = matches!(decoded.op, Op::Sb | Op::Sh | Op::Sw);
        let addr = self.regs.read(decoded.rs1).wrapping_add(decoded.imm as u32);

        let outcome = executor::execute(decoded, pc, dnpc, &mut self.regs, &mut self.mem)?;

        if is_load {
            let len = match decoded.op {
                Op::Lb | Op::Lbu => 1,
                Op::Lh | Op::Lhu => 2,
                _ => 4,
            };
            let value = self.mem.read(addr, len, pc).unwrap_or(0);
            self.mtrace.log(addr, len, value, MemDirection::Read);
        }
        if is_store {
            let len = match decoded.op {
                Op::Sb => 1,
                Op::Sh => 2,
                _ => 4,
            };
            let value = self.regs.read(decoded.rs2);
            self.mtrace.log(addr, len, value, MemDirection::Write);
        }

        Ok(outcome)
    }
}

/// Bridges the register file into the expression evaluator's `$reg` lookup:
/// ABI/numeric names via [`Gpr::from_name`], plus the special `pc` pseudo-reg.
struct RegBridge<'a>(&'a RegisterFile);

impl RegisterLookup for RegBridge<'_> {
    fn lookup(&self, name: &str) -> Option<u32> {
        if name == "pc" {
            return Some(self.0.pc());
        }
        Gpr::from_name(name).map(|g| self.0.read(g))
    }
}

struct MemBridge<'a>(&'a Memory);

impl MemoryRead for MemBridge<'_> {
    fn read_byte(&self, addr: u32) -> Option<u8> {
        self.0.read_byte(addr).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asm_addi(rd: u32, rs1: u32, imm: i32) -> u32 {
        ((imm as u32 & 0xfff) << 20) | (rs1 << 15) | (rd << 7) | 0b0010011
    }

    fn asm_ebreak() -> u32 {
        0b000000000001_00000_000_00000_1110011
    }

    fn asm_lui(rd: u32, imm: u32) -> u32 {
        (imm << 12) | (rd << 7) | 0b0110111
    }

    fn asm_blt(rs1: u32, rs2: u32, imm: i32) -> u32 {
        let imm = imm as u32;
        let bit12 = (imm >> 12) & 1;
        let bits10_5 = (imm >> 5) & 0x3f;
        let bits4_1 = (imm >> 1) & 0xf;
        let bit11 = (imm >> 11) & 1;
        (bit12 << 31)
            | (bits10_5 << 25)
            | (rs2 << 20)
            | (rs1 << 15)
            | (0b100 << 12)
            | (bits4_1 << 8)
            | (bit11 << 7)
            | 0b1100011
    }

    #[test]
    fn lui_addi_ebreak_exits_zero() {
        let mut image = Vec::new();
        image.extend_from_slice(&asm_lui(5, 0x12345).to_le_bytes());
        image.extend_from_slice(&asm_addi(5, 5, 0x678).to_le_bytes());
        image.extend_from_slice(&asm_addi(10, 0, 0).to_le_bytes());
        image.extend_from_slice(&asm_ebreak().to_le_bytes());
        let mem = Memory::with_image(0x8000_0000, &image, 4096);
        let mut cpu = Cpu::new(mem, 0x8000_0000, FunctionTable::new());
        let state = cpu.exec(UNBOUNDED).unwrap();
        assert_eq!(state, MachineState::End { exit_code: 0 });
        assert_eq!(cpu.regs().read(Gpr::new(5)), 0x12345678);
    }

    #[test]
    fn addi_negative_then_ebreak_exits_nonzero() {
        let mut image = Vec::new();
        image.extend_from_slice(&asm_addi(10, 0, -1).to_le_bytes());
        image.extend_from_slice(&asm_ebreak().to_le_bytes());
        let mem = Memory::with_image(0x8000_0000, &image, 4096);
        let mut cpu = Cpu::new(mem, 0x8000_0000, FunctionTable::new());
        let state = cpu.exec(UNBOUNDED).unwrap();
        assert_eq!(state, MachineState::End { exit_code: 1 });
    }

    #[test]
    fn watchpoint_stops_run_on_first_change() {
        let mut image = Vec::new();
        image.extend_from_slice(&asm_addi(1, 0, 0).to_le_bytes());
        image.extend_from_slice(&asm_addi(2, 0, 10).to_le_bytes());
        image.extend_from_slice(&asm_addi(1, 1, 1).to_le_bytes()); // loop: (offset 8)
        image.extend_from_slice(&asm_blt(1, 2, -4).to_le_bytes()); // blt x1, x2, loop
        image.extend_from_slice(&asm_addi(10, 0, 0).to_le_bytes());
        image.extend_from_slice(&asm_ebreak().to_le_bytes());
        let mem = Memory::with_image(0x8000_0000, &image, 4096);
        let mut cpu = Cpu::new(mem, 0x8000_0000, FunctionTable::new());

        let bridge_regs = RegBridge(&cpu.regs);
        let bridge_mem = MemBridge(&cpu.mem);
        cpu.watchpoints.add("$x1", &bridge_regs, &bridge_mem).unwrap();
        drop(bridge_regs);
        drop(bridge_mem);

        let state = cpu.exec(UNBOUNDED).unwrap();
        assert_eq!(state, MachineState::Stop);
        assert_eq!(cpu.regs().read(Gpr::new(1)), 1);
    }

    #[test]
    fn illegal_instruction_aborts_with_fatal_error() {
        let mut image = Vec::new();
        image.extend_from_slice(&0xffff_ffffu32.to_le_bytes());
        let mem = Memory::with_image(0x8000_0000, &image, 4096);
        let mut cpu = Cpu::new(mem, 0x8000_0000, FunctionTable::new());

        let err = cpu.exec(UNBOUNDED).unwrap_err();
        assert!(matches!(
            err,
            EmulatorError::IllegalInstruction { pc: 0x8000_0000, instruction: 0xffff_ffff }
        ));
        assert_eq!(cpu.state(), MachineState::Abort);
    }
}
