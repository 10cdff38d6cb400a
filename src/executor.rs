//! Per-opcode executor actions.
//!
//! Each function is a pure action over the decoded operands, the register
//! file, and memory; it returns the outcome needed to update `dnpc` and to
//! build the trace line. `MUL`/`DIV` family semantics exactly follow the
//! RISC-V spec's 64-bit-intermediate and divide-by-zero rules.

use crate::error::EmulatorError;
use crate::inst::{Decoded, Op};
use crate::memory::Memory;
use crate::regs::RegisterFile;

/// What a single instruction did, for tracing and ftrace classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Normal,
    Branch { taken: bool },
    Jump,
    Ebreak { a0: u32 },
    Illegal,
}

/// Execute one decoded instruction.
///
/// `pc` is the address of the instruction itself; `snpc` is `pc + 4`. On
/// return, `*dnpc` holds the next PC to commit (callers initialize it to
/// `snpc` before calling, matching the step record's invariant).
pub fn execute(
    d: &Decoded,
    pc: u32,
    dnpc: &mut u32,
    regs: &mut RegisterFile,
    mem: &mut Memory,
) -> Result<Outcome, EmulatorError> {
    let rs1 = regs.read(d.rs1);
    let rs2 = regs.read(d.rs2);

    match d.op {
        Op::Lui => {
            regs.write(d.rd, d.imm as u32);
            Ok(Outcome::Normal)
        }
        Op::Auipc => {
            regs.write(d.rd, pc.wrapping_add(d.imm as u32));
            Ok(Outcome::Normal)
        }
        Op::Jal => {
            *dnpc = pc.wrapping_add(d.imm as u32);
            regs.write(d.rd, pc.wrapping_add(4));
            Ok(Outcome::Jump)
        }
        Op::Jalr => {
            *dnpc = rs1.wrapping_add(d.imm as u32) & !1u32;
            regs.write(d.rd, pc.wrapping_add(4));
            Ok(Outcome::Jump)
        }
        Op::Beq | Op::Bne | Op::Blt | Op::Bge | Op::Bltu | Op::Bgeu => {
            let taken = match d.op {
                Op::Beq => rs1 == rs2,
                Op::Bne => rs1 != rs2,
                Op::Blt => (rs1 as i32) < (rs2 as i32),
                Op::Bge => (rs1 as i32) >= (rs2 as i32),
                Op::Bltu => rs1 < rs2,
                Op::Bgeu => rs1 >= rs2,
                _ => unreachable!(),
            };
            if taken {
                *dnpc = pc.wrapping_add(d.imm as u32);
            }
            Ok(Outcome::Branch { taken })
        }
        Op::Lb | Op::Lh | Op::Lw | Op::Lbu | Op::Lhu => {
            let addr = rs1.wrapping_add(d.imm as u32);
            let (len, sign_extend_bits) = match d.op {
                Op::Lb => (1, Some(8)),
                Op::Lh => (2, Some(16)),
                Op::Lw => (4, None),
                Op::Lbu => (1, None),
                Op::Lhu => (2, None),
                _ => unreachable!(),
            };
            let raw = mem.read(addr, len, pc)?;
            let value = match sign_extend_bits {
                Some(width) => {
                    let shift = 32 - width;
                    (((raw << shift) as i32) >> shift) as u32
                }
                None => raw,
            };
            regs.write(d.rd, value);
            Ok(Outcome::Normal)
        }
        Op::Sb | Op::Sh | Op::Sw => {
            let addr = rs1.wrapping_add(d.imm as u32);
            let len = match d.op {
                Op::Sb => 1,
                Op::Sh => 2,
                Op::Sw => 4,
                _ => unreachable!(),
            };
            mem.write(addr, len, rs2, pc)?;
            Ok(Outcome::Normal)
        }
        Op::Addi => {
            regs.write(d.rd, rs1.wrapping_add(d.imm as u32));
            Ok(Outcome::Normal)
        }
        Op::Slti => {
            regs.write(d.rd, ((rs1 as i32) < d.imm) as u32);
            Ok(Outcome::Normal)
        }
        Op::Sltiu => {
            regs.write(d.rd, (rs1 < (d.imm as u32)) as u32);
            Ok(Outcome::Normal)
        }
        Op::Xori => {
            regs.write(d.rd, rs1 ^ (d.imm as u32));
            Ok(Outcome::Normal)
        }
        Op::Ori => {
            regs.write(d.rd, rs1 | (d.imm as u32));
            Ok(Outcome::Normal)
        }
        Op::Andi => {
            regs.write(d.rd, rs1 & (d.imm as u32));
            Ok(Outcome::Normal)
        }
        Op::Slli => {
            regs.write(d.rd, rs1 << (d.imm as u32 & 0x1f));
            Ok(Outcome::Normal)
        }
        Op::Srli => {
            regs.write(d.rd, rs1 >> (d.imm as u32 & 0x1f));
            Ok(Outcome::Normal)
        }
        Op::Srai => {
            regs.write(d.rd, ((rs1 as i32) >> (d.imm as u32 & 0x1f)) as u32);
            Ok(Outcome::Normal)
        }
        Op::Add => {
            regs.write(d.rd, rs1.wrapping_add(rs2));
            Ok(Outcome::Normal)
        }
        Op::Sub => {
            regs.write(d.rd, rs1.wrapping_sub(rs2));
            Ok(Outcome::Normal)
        }
        Op::Sll => {
            regs.write(d.rd, rs1 << (rs2 & 0x1f));
            Ok(Outcome::Normal)
        }
        Op::Slt => {
            regs.write(d.rd, ((rs1 as i32) < (rs2 as i32)) as u32);
            Ok(Outcome::Normal)
        }
        Op::Sltu => {
            regs.write(d.rd, (rs1 < rs2) as u32);
            Ok(Outcome::Normal)
        }
        Op::Xor => {
            regs.write(d.rd, rs1 ^ rs2);
            Ok(Outcome::Normal)
        }
        Op::Srl => {
            regs.write(d.rd, rs1 >> (rs2 & 0x1f));
            Ok(Outcome::Normal)
        }
        Op::Sra => {
            regs.write(d.rd, ((rs1 as i32) >> (rs2 & 0x1f)) as u32);
            Ok(Outcome::Normal)
        }
        Op::Or => {
            regs.write(d.rd, rs1 | rs2);
            Ok(Outcome::Normal)
        }
        Op::And => {
            regs.write(d.rd, rs1 & rs2);
            Ok(Outcome::Normal)
        }
        Op::Mul => {
            regs.write(d.rd, rs1.wrapping_mul(rs2));
            Ok(Outcome::Normal)
        }
        Op::Mulh => {
            let a = rs1 as i32 as i64;
            let b = rs2 as i32 as i64;
            let product = a.wrapping_mul(b);
            regs.write(d.rd, (product >> 32) as u32);
            Ok(Outcome::Normal)
        }
        Op::Mulhsu => {
            let a = rs1 as i32 as i64 as i128;
            let b = rs2 as u64 as i128;
            let product = a.wrapping_mul(b);
            regs.write(d.rd, (product >> 32) as u32);
            Ok(Outcome::Normal)
        }
        Op::Mulhu => {
            let a = rs1 as u64;
            let b = rs2 as u64;
            let product = a.wrapping_mul(b);
            regs.write(d.rd, (product >> 32) as u32);
            Ok(Outcome::Normal)
        }
        Op::Div => {
            let a = rs1 as i32;
            let b = rs2 as i32;
            let result = if b == 0 {
                -1i32
            } else if a == i32::MIN && b == -1 {
                i32::MIN
            } else {
                a.wrapping_div(b)
            };
            regs.write(d.rd, result as u32);
            Ok(Outcome::Normal)
        }
        Op::Divu => {
            let result = if rs2 == 0 { u32::MAX } else { rs1 / rs2 };
            regs.write(d.rd, result);
            Ok(Outcome::Normal)
        }
        Op::Rem => {
            let a = rs1 as i32;
            let b = rs2 as i32;
            let result = if b == 0 {
                a
            } else if a == i32::MIN && b == -1 {
                0
            } else {
                a.wrapping_rem(b)
            };
            regs.write(d.rd, result as u32);
            Ok(Outcome::Normal)
        }
        Op::Remu => {
            let result = if rs2 == 0 { rs1 } else { rs1 % rs2 };
            regs.write(d.rd, result);
            Ok(Outcome::Normal)
        }
        Op::Ebreak => Ok(Outcome::Ebreak { a0: regs.read(crate::regs::Gpr::A0) }),
        Op::Illegal => Ok(Outcome::Illegal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_instruction;

    fn run_one(word: u32, regs: &mut RegisterFile, mem: &mut Memory) -> Outcome {
        let d = decode_instruction(word);
        let pc = regs.pc();
        let mut dnpc = pc.wrapping_add(4);
        execute(&d, pc, &mut dnpc, regs, mem).unwrap()
    }

    #[test]
    fn mulh_law_matches_64_bit_product() {
        use crate::regs::Gpr;
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new(0, 4);
        regs.write(Gpr::T0, 0xffff_ffff); // -1
        regs.write(Gpr::T1, 5);
        // mul x2, t0, t1 ; mulh x3, t0, t1 (rs1=x5=t0, rs2=x6=t1)
        let mul = (0b0000000 << 25) | (6 << 20) | (5 << 15) | (0b000 << 12) | (2 << 7) | 0b0110011;
        let mulh = (0b0000001 << 25) | (6 << 20) | (5 << 15) | (0b001 << 12) | (3 << 7) | 0b0110011;
        run_one(mul, &mut regs, &mut mem);
        run_one(mulh, &mut regs, &mut mem);
        let lo = regs.read(Gpr::new(2)) as i64;
        let hi = regs.read(Gpr::new(3)) as i32 as i64;
        let combined = (hi << 32) | (lo & 0xffff_ffff);
        assert_eq!(combined, (-1i64) * 5);
    }

    #[test]
    fn div_by_zero_returns_all_ones() {
        use crate::regs::Gpr;
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new(0, 4);
        regs.write(Gpr::T0, 42);
        regs.write(Gpr::T1, 0);
        // div x2, t0, t1
        let div = (0b0000001 << 25) | (6 << 20) | (5 << 15) | (0b100 << 12) | (2 << 7) | 0b0110011;
        run_one(div, &mut regs, &mut mem);
        assert_eq!(regs.read(Gpr::new(2)), u32::MAX);
    }

    #[test]
    fn div_overflow_int_min_by_minus_one() {
        use crate::regs::Gpr;
        let mut regs = RegisterFile::new();
        let mut mem = Memory::new(0, 4);
        regs.write(Gpr::T0, i32::MIN as u32);
        regs.write(Gpr::T1, 0xffff_ffff); // -1
        let div = (0b0000001 << 25) | (6 << 20) | (5 << 15) | (0b100 << 12) | (2 << 7) | 0b0110011;
        run_one(div, &mut regs, &mut mem);
        assert_eq!(regs.read(Gpr::new(2)), i32::MIN as u32);
    }
}
