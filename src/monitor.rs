//! Debugger command interface. The REPL (line reading, command dispatch) is
//! out of scope; this is the API it drives — one method per command in
//! §6's CLI surface table, each returning a status the REPL uses to decide
//! whether to prompt again.

use crate::cpu::{Cpu, MachineState, UNBOUNDED};
use crate::error::{CommandError, EmulatorError};

/// Base the `p`/`px` commands print a value in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Radix {
    Decimal,
    Hex,
}

/// What happened after running a monitor command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// Command succeeded; REPL prints `message` and prompts again.
    Ok { message: String },
    /// Command failed; REPL reports the error and prompts again.
    Failed(String),
    /// The debuggee halted (`END`/`ABORT`) or the user asked to quit; the
    /// REPL should not prompt for further stepping commands.
    Halted(MachineState),
}

pub struct Monitor<'a> {
    cpu: &'a mut Cpu,
}

impl<'a> Monitor<'a> {
    pub fn new(cpu: &'a mut Cpu) -> Self {
        Monitor { cpu }
    }

    /// `c` — continue until halt.
    pub fn continue_(&mut self) -> Result<Status, EmulatorError> {
        self.run(UNBOUNDED)
    }

    /// `si [N=1]` — step N instructions.
    pub fn step(&mut self, n: u64) -> Result<Status, EmulatorError> {
        self.run(n)
    }

    fn run(&mut self, n: u64) -> Result<Status, EmulatorError> {
        let state = self.cpu.exec(n)?;
        Ok(match state {
            MachineState::Running | MachineState::Stop => Status::Ok {
                message: format!("stopped after {} instruction(s)", self.cpu.instruction_count()),
            },
            other => Status::Halted(other),
        })
    }

    /// `q` — request machine shutdown.
    pub fn quit(&mut self) -> Status {
        self.cpu.request_quit();
        Status::Halted(MachineState::Quit)
    }

    /// `info r` — dump all registers and the PC.
    pub fn info_registers(&self) -> Status {
        Status::Ok {
            message: self.cpu.regs().format_dump(),
        }
    }

    /// `info w` — list live watchpoints.
    pub fn info_watchpoints(&self) -> Status {
        let lines: Vec<String> = self
            .cpu
            .watchpoints()
            .display()
            .into_iter()
            .map(|(id, expr)| format!("Watchpoint[{id}]: {expr}"))
            .collect();
        Status::Ok {
            message: if lines.is_empty() {
                "no watchpoints".to_string()
            } else {
                lines.join("\n")
            },
        }
    }

    /// `x N ADDR` — print N words starting at ADDR (ADDR is an expression,
    /// evaluated in hex-address context).
    pub fn examine(&self, count: u32, address_expr: &str) -> Status {
        match self.cpu.evaluate_expr(address_expr) {
            Ok(addr) => {
                let mut lines = Vec::with_capacity(count as usize);
                for i in 0..count {
                    let a = addr.wrapping_add(i * 4);
                    match self.cpu.mem().read(a, 4, self.cpu.regs().pc()) {
                        Ok(word) => lines.push(format!("0x{a:08x}: 0x{word:08x}")),
                        Err(e) => lines.push(format!("0x{a:08x}: <{e}>")),
                    }
                }
                Status::Ok {
                    message: lines.join("\n"),
                }
            }
            Err(e) => Status::Failed(e.to_string()),
        }
    }

    /// `p EXPR` / `px EXPR` — print EXPR's value in the given radix.
    pub fn print(&self, expr: &str, radix: Radix) -> Status {
        match self.cpu.evaluate_expr(expr) {
            Ok(value) => Status::Ok {
                message: match radix {
                    Radix::Decimal => format!("{value}"),
                    Radix::Hex => format!("0x{value:08x}"),
                },
            },
            Err(e) => Status::Failed(e.to_string()),
        }
    }

    /// `w EXPR` — add a watchpoint.
    pub fn watch(&mut self, expr: &str) -> Status {
        match self.cpu.add_watchpoint(expr) {
            Ok(id) => Status::Ok {
                message: format!("Watchpoint[{id}]: {expr}"),
            },
            Err(e) => Status::Failed(e.to_string()),
        }
    }

    /// `d ID` — delete a watchpoint.
    pub fn delete(&mut self, id: usize) -> Status {
        match self.cpu.remove_watchpoint(id) {
            Ok(()) => Status::Ok {
                message: format!("deleted watchpoint {id}"),
            },
            Err(e) => Status::Failed(e.to_string()),
        }
    }

    /// `help [name]` — list all commands or describe one.
    pub fn help(&self, name: Option<&str>) -> Status {
        const COMMANDS: &[(&str, &str)] = &[
            ("help", "help [name] - print commands or one command's description"),
            ("c", "c - continue until halt"),
            ("q", "q - quit"),
            ("si", "si [N=1] - step N instructions"),
            ("info", "info r|w - show registers or watchpoints"),
            ("x", "x N ADDR - print N words at ADDR"),
            ("p", "p EXPR - print EXPR in decimal"),
            ("px", "px EXPR - print EXPR in hex"),
            ("w", "w EXPR - add watchpoint"),
            ("d", "d ID - delete watchpoint ID"),
        ];
        match name {
            None => Status::Ok {
                message: COMMANDS.iter().map(|(_, d)| *d).collect::<Vec<_>>().join("\n"),
            },
            Some(n) => match COMMANDS.iter().find(|(cmd, _)| *cmd == n) {
                Some((_, d)) => Status::Ok {
                    message: d.to_string(),
                },
                None => Status::Failed(CommandError::BadArgument(format!("no such command '{n}'")).to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::FunctionTable;
    use crate::memory::Memory;

    fn asm_ebreak() -> u32 {
        0b000000000001_00000_000_00000_1110011
    }

    fn running_cpu() -> Cpu {
        let mut image = Vec::new();
        image.extend_from_slice(&asm_ebreak().to_le_bytes());
        let mem = Memory::with_image(0x8000_0000, &image, 4096);
        Cpu::new(mem, 0x8000_0000, FunctionTable::new())
    }

    #[test]
    fn continue_runs_to_ebreak() {
        let mut cpu = running_cpu();
        let mut monitor = Monitor::new(&mut cpu);
        let status = monitor.continue_().unwrap();
        assert_eq!(status, Status::Halted(MachineState::End { exit_code: 0 }));
    }

    #[test]
    fn print_decimal_and_hex() {
        let mut cpu = running_cpu();
        let monitor = Monitor::new(&mut cpu);
        assert_eq!(
            monitor.print("1 + 2", Radix::Decimal),
            Status::Ok { message: "3".to_string() }
        );
        assert_eq!(
            monitor.print("0x10", Radix::Hex),
            Status::Ok { message: "0x00000010".to_string() }
        );
    }

    #[test]
    fn watch_then_delete() {
        let mut cpu = running_cpu();
        let mut monitor = Monitor::new(&mut cpu);
        let status = monitor.watch("1 + 1");
        let id = match status {
            Status::Ok { message } => {
                assert!(message.starts_with("Watchpoint[0]"));
                0
            }
            other => panic!("expected Ok, got {other:?}"),
        };
        let status = monitor.delete(id);
        assert_eq!(status, Status::Ok { message: "deleted watchpoint 0".to_string() });
    }

    #[test]
    fn help_describes_known_command() {
        let mut cpu = running_cpu();
        let monitor = Monitor::new(&mut cpu);
        match monitor.help(Some("si")) {
            Status::Ok { message } => assert!(message.contains("step")),
            other => panic!("expected Ok, got {other:?}"),
        }
    }
}
