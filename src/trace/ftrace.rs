//! ELF-symbol-driven function call/return tracer.
//!
//! Classification is heuristic: a jump to a known function's `begin_addr` is
//! a call, the canonical `jalr x0, 1(x1)` return sequence is a return.
//! Unknown jump targets are silently ignored.

use std::io::Write;

use crate::elf::FunctionTable;
use crate::inst::Decoded;
use crate::regs::Gpr;

pub struct Ftrace {
    functions: FunctionTable,
    call_stack: Vec<String>,
    sink: Option<Box<dyn Write + Send>>,
}

impl Ftrace {
    pub fn new(functions: FunctionTable, sink: Option<Box<dyn Write + Send>>) -> Self {
        Ftrace {
            functions,
            call_stack: Vec::new(),
            sink,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    /// Observe one retired jump-style instruction.
    ///
    /// `pc` is the instruction's address, `dnpc` the target it jumped to.
    pub fn on_jump(&mut self, d: &Decoded, pc: u32, dnpc: u32) {
        if self.is_return(d) {
            if let Some(name) = self.call_stack.pop() {
                self.emit(pc, self.call_stack.len(), &format!("ret [{name}]"));
            }
            return;
        }
        if let Some(name) = self.functions.lookup_begin(dnpc) {
            let depth = self.call_stack.len();
            self.call_stack.push(name.clone());
            self.emit(pc, depth, &format!("call [{name}@0x{dnpc:08x}]"));
        }
    }

    fn is_return(&self, d: &Decoded) -> bool {
        matches!(d.op, crate::inst::Op::Jalr)
            && matches!(d.rd, Gpr::Zero)
            && matches!(d.rs1, Gpr::Ra)
            && d.imm == 0
    }

    fn emit(&mut self, pc: u32, depth: usize, text: &str) {
        let Some(sink) = self.sink.as_mut() else {
            return;
        };
        let indent = "\t".repeat(depth);
        let _ = writeln!(sink, "PC@0x{pc:08x}: {indent}{text}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inst::{InstType, Op};

    fn jalr_ret() -> Decoded {
        Decoded {
            op: Op::Jalr,
            itype: InstType::I,
            rd: Gpr::Zero,
            rs1: Gpr::Ra,
            rs2: Gpr::Zero,
            imm: 0,
        }
    }

    fn jal_call() -> Decoded {
        Decoded {
            op: Op::Jal,
            itype: InstType::J,
            rd: Gpr::Ra,
            rs1: Gpr::Zero,
            rs2: Gpr::Zero,
            imm: 0,
        }
    }

    #[test]
    fn call_then_return_balances_depth() {
        let mut table = FunctionTable::new();
        table.insert("main".into(), 0x1000, 0x1010);
        let mut ft = Ftrace::new(table, None);
        ft.on_jump(&jal_call(), 0x2000, 0x1000);
        assert_eq!(ft.call_stack.len(), 1);
        ft.on_jump(&jalr_ret(), 0x1008, 0x2004);
        assert_eq!(ft.call_stack.len(), 0);
    }

    #[test]
    fn unknown_target_is_ignored() {
        let ft_table = FunctionTable::new();
        let mut ft = Ftrace::new(ft_table, None);
        ft.on_jump(&jal_call(), 0x2000, 0x9999);
        assert_eq!(ft.call_stack.len(), 0);
    }
}
