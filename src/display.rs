use core::fmt;

use crate::{EffectiveAddress, Instruction, Opcode, Operand, Register};

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.opcode)?;
        for i in 0..self.operand_count() {
            f.write_str(if i == 0 { " " } else { ", " })?;
            write!(f, "{}", self.operands[i as usize])?;
        }
        Ok(())
    }
}

impl fmt::Debug for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        <Operand as fmt::Display>::fmt(self, f)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Nothing => f.write_str("BUG"),
            Operand::Register(reg) => write!(f, "{}", reg),
            Operand::Memory(base, disp) => {
                if *disp < 0 {
                    // widen first, `-i16::MIN` does not fit an i16
                    write!(f, "[{} - {}]", base, -(*disp as i32))
                } else if *disp > 0 {
                    write!(f, "[{} + {}]", base, disp)
                } else {
                    write!(f, "[{}]", base)
                }
            }
            Operand::DirectAddress(addr) => write!(f, "[{}]", addr),
            Operand::ImmediateU8(imm) => write!(f, "{}", imm),
            Operand::ImmediateU16(imm) => write!(f, "{}", imm),
        }
    }
}

impl Register {
    /// the assembler name of this register, like `al` or `sp`.
    pub fn name(&self) -> &'static str {
        match self {
            Register::AL => "al",
            Register::CL => "cl",
            Register::DL => "dl",
            Register::BL => "bl",
            Register::AH => "ah",
            Register::CH => "ch",
            Register::DH => "dh",
            Register::BH => "bh",
            Register::AX => "ax",
            Register::CX => "cx",
            Register::DX => "dx",
            Register::BX => "bx",
            Register::SP => "sp",
            Register::BP => "bp",
            Register::SI => "si",
            Register::DI => "di",
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl EffectiveAddress {
    /// the expression as written between brackets, like `bx + si`.
    pub fn name(&self) -> &'static str {
        match self {
            EffectiveAddress::BxSi => "bx + si",
            EffectiveAddress::BxDi => "bx + di",
            EffectiveAddress::BpSi => "bp + si",
            EffectiveAddress::BpDi => "bp + di",
            EffectiveAddress::Si => "si",
            EffectiveAddress::Di => "di",
            EffectiveAddress::Bp => "bp",
            EffectiveAddress::Bx => "bx",
        }
    }
}

impl fmt::Display for EffectiveAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        <Opcode as fmt::Display>::fmt(self, f)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Opcode::MOV => {
                f.write_str("mov")
            },
        }
    }
}
