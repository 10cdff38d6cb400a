//! Decoded-instruction representation shared by the decoder and executor.

use crate::regs::Gpr;

/// RISC-V instruction encoding family, used to know which immediate formula
/// and which operand slots apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstType {
    R,
    I,
    S,
    B,
    U,
    J,
    /// No operands beyond the opcode itself (EBREAK, the illegal catch-all).
    N,
}

/// Instruction mnemonic. One variant per RV32I + M-extension opcode, plus
/// `Illegal` for the catch-all pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Lui,
    Auipc,
    Jal,
    Jalr,
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    Sb,
    Sh,
    Sw,
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Srai,
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Div,
    Divu,
    Rem,
    Remu,
    Ebreak,
    Illegal,
}

impl Op {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::Lui => "lui",
            Op::Auipc => "auipc",
            Op::Jal => "jal",
            Op::Jalr => "jalr",
            Op::Beq => "beq",
            Op::Bne => "bne",
            Op::Blt => "blt",
            Op::Bge => "bge",
            Op::Bltu => "bltu",
            Op::Bgeu => "bgeu",
            Op::Lb => "lb",
            Op::Lh => "lh",
            Op::Lw => "lw",
            Op::Lbu => "lbu",
            Op::Lhu => "lhu",
            Op::Sb => "sb",
            Op::Sh => "sh",
            Op::Sw => "sw",
            Op::Addi => "addi",
            Op::Slti => "slti",
            Op::Sltiu => "sltiu",
            Op::Xori => "xori",
            Op::Ori => "ori",
            Op::Andi => "andi",
            Op::Slli => "slli",
            Op::Srli => "srli",
            Op::Srai => "srai",
            Op::Add => "add",
            Op::Sub => "sub",
            Op::Sll => "sll",
            Op::Slt => "slt",
            Op::Sltu => "sltu",
            Op::Xor => "xor",
            Op::Srl => "srl",
            Op::Sra => "sra",
            Op::Or => "or",
            Op::And => "and",
            Op::Mul => "mul",
            Op::Mulh => "mulh",
            Op::Mulhsu => "mulhsu",
            Op::Mulhu => "mulhu",
            Op::Div => "div",
            Op::Divu => "divu",
            Op::Rem => "rem",
            Op::Remu => "remu",
            Op::Ebreak => "ebreak",
            Op::Illegal => ".word",
        }
    }
}

/// A fully-decoded instruction: mnemonic plus extracted operand fields.
/// `rd`/`rs1`/`rs2` are populated even for types that don't use them as
/// `Gpr::Zero`; the executor only reads the fields its `Op` actually uses.
#[derive(Debug, Clone, Copy)]
pub struct Decoded {
    pub op: Op,
    pub itype: InstType,
    pub rd: Gpr,
    pub rs1: Gpr,
    pub rs2: Gpr,
    pub imm: i32,
}

/// Format an immediate the way a disassembler would: small values in
/// decimal, large ones in hex.
pub fn format_imm(imm: i32) -> String {
    if (-32..=31).contains(&imm) {
        format!("{imm}")
    } else {
        format!("0x{:08x}", imm as u32)
    }
}

/// Render one decoded instruction as assembly-like text for trace lines.
pub fn format_instruction(d: &Decoded) -> String {
    let m = d.op.mnemonic();
    match d.itype {
        InstType::R => format!("{m} {}, {}, {}", d.rd, d.rs1, d.rs2),
        InstType::I => match d.op {
            Op::Lb | Op::Lh | Op::Lw | Op::Lbu | Op::Lhu => {
                format!("{m} {}, {}({})", d.rd, format_imm(d.imm), d.rs1)
            }
            Op::Slli | Op::Srli | Op::Srai => {
                format!("{m} {}, {}, {}", d.rd, d.rs1, d.imm)
            }
            Op::Jalr => format!("{m} {}, {}({})", d.rd, format_imm(d.imm), d.rs1),
            _ => format!("{m} {}, {}, {}", d.rd, d.rs1, format_imm(d.imm)),
        },
        InstType::S => format!("{m} {}, {}({})", d.rs2, format_imm(d.imm), d.rs1),
        InstType::B => format!("{m} {}, {}, {}", d.rs1, d.rs2, format_imm(d.imm)),
        InstType::U => format!("{m} {}, {}", d.rd, format_imm(d.imm)),
        InstType::J => format!("{m} {}, {}", d.rd, format_imm(d.imm)),
        InstType::N => m.to_string(),
    }
}
