//! # `yaxpeax-8086`, a decoder for 8086 `mov` instructions
//!
//! the 8086 spends a surprising amount of its opcode map on `mov`. `yaxpeax-8086` decodes the
//! register and memory forms of it: register/memory to or from register (`100010dw`),
//! immediate to register or memory (`1100011w`), immediate to register (`1011wreg`), and the
//! accumulator forms with a direct address (`1010000w`, `1010001w`). segment register moves are
//! not decoded, since without segment prefixes there is nothing interesting to say about them.
//!
//! most of the fun is in the `mod`/`reg`/`r/m` byte. `mod = 11` selects a register by `r/m`,
//! the other three modes select a memory operand with a base/index expression and a 0, 1, or 2
//! byte displacement. the exception is `mod = 00, r/m = 110`, which would be `[bp]` but instead
//! is a bare 16-bit address. `[bp]` has to be written as `[bp + 0]` with an 8-bit displacement.
//!
//! ## usage
//!
//! the fastest way to decode an 8086 instruction is through
//! [`InstDecoder::decode_slice()`]:
//! ```
//! use yaxpeax_8086::InstDecoder;
//!
//! let inst = InstDecoder::decode_slice(&[0x89, 0xd9]).unwrap();
//!
//! assert_eq!("mov cx, bx", inst.to_string());
//! ```
//!
//! opcodes and operands are available on the decoded instruction, as well as its length and
//! operand count:
//! ```
//! use yaxpeax_8086::{EffectiveAddress, InstDecoder, Opcode, Operand, Register, Shape};
//!
//! let inst = InstDecoder::decode_slice(&[0x8b, 0x41, 0xdb]).unwrap();
//!
//! assert_eq!("mov ax, [bx + di - 37]", inst.to_string());
//! assert_eq!(inst.operand_count(), 2);
//! assert_eq!(inst.len(), 3);
//! assert_eq!(inst.opcode(), Opcode::MOV);
//! assert_eq!(inst.shape(), Shape::RegisterToRegister);
//! assert_eq!(inst.operand(0), Operand::Register(Register::AX));
//! assert_eq!(inst.operand(1), Operand::Memory(EffectiveAddress::BxDi, -37));
//! ```
//!
//! whole listings can be decoded with [`disassemble_into`], which writes one line per
//! instruction to any [`core::fmt::Write`]:
//! ```
//! use yaxpeax_8086::{disassemble_into, InstDecoder};
//!
//! let mut listing = String::new();
//! let count = disassemble_into(&InstDecoder::default(), &[0xb1, 0x0c, 0xc6, 0x06, 0x00, 0x00, 0x07], &mut listing).unwrap();
//!
//! assert_eq!(count, 2);
//! assert_eq!(listing, "mov cl, 12\nmov [0], 7\n");
//! ```
//!
//! additionally, `yaxpeax-8086` implements `yaxpeax-arch` traits for generic use, such as
//! [`yaxpeax_arch::LengthedInstruction`]. [`yaxpeax_arch::Arch`] is implemented by
//! the unit struct [`I8086`].
//!
//! ## `#![no_std]`
//!
//! the library is `no_std`. the `std` feature adds `std::error::Error` impls, and the `cli`
//! feature (on by default) builds the `dis8086` binary.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

mod display;
mod listing;
mod tables;

pub use listing::{disassemble_into, Instructions, ListingError, ASM_HEADER};
pub use tables::{EFFECTIVE_ADDRESSES, REGISTERS};

use log::trace;
use yaxpeax_arch::{AddressDiff, Arch, Decoder, LengthedInstruction, Reader, ReadError};

/// a trivial struct for [`yaxpeax_arch::Arch`] to be implemented on. it's only interesting for the
/// associated type parameters.
#[derive(Hash, Eq, PartialEq, Debug, Copy, Clone)]
pub struct I8086;

impl Arch for I8086 {
    type Address = u16;
    type Word = u8;
    type Instruction = Instruction;
    type Decoder = InstDecoder;
    type DecodeError = DecodeError;
    type Operand = Operand;
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DecodeError {
    /// no input was available to start an instruction. between instructions, this is just the
    /// end of the stream.
    ExhaustedInput,
    /// input ran out partway through an instruction; the opcode (and possibly more) was read, but
    /// a byte the encoding requires was missing.
    TruncatedInstruction,
    /// the opcode byte does not match any encoding this decoder knows.
    UnrecognizedOpcode(u8),
    /// the mode byte has a field combination with no defined meaning. only reported by a
    /// [`InstDecoder::strict`] decoder.
    InvalidFieldCombination(u8),
}

impl From<ReadError> for DecodeError {
    fn from(_e: ReadError) -> Self {
        DecodeError::ExhaustedInput
    }
}

impl core::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use yaxpeax_arch::DecodeError;
        match self {
            Self::UnrecognizedOpcode(byte) |
            Self::InvalidFieldCombination(byte) => {
                write!(f, "{} ({:#04x})", self.description(), byte)
            }
            _ => f.write_str(self.description()),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

impl yaxpeax_arch::DecodeError for DecodeError {
    fn data_exhausted(&self) -> bool {
        matches!(self, DecodeError::ExhaustedInput | DecodeError::TruncatedInstruction)
    }
    fn bad_opcode(&self) -> bool {
        matches!(self, DecodeError::UnrecognizedOpcode(_))
    }
    fn bad_operand(&self) -> bool {
        matches!(self, DecodeError::InvalidFieldCombination(_))
    }
    fn description(&self) -> &'static str {
        match self {
            DecodeError::ExhaustedInput => "exhausted input",
            DecodeError::TruncatedInstruction => "truncated instruction",
            DecodeError::UnrecognizedOpcode(_) => "unrecognized opcode",
            DecodeError::InvalidFieldCombination(_) => "invalid field combination",
        }
    }
}

/// an 8086 general purpose register, as named by a 3-bit register field and the `w` bit.
///
/// variants are ordered so that the low three bits of the discriminant are the register field
/// and bit 3 is `w`.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum Register {
    AL, CL, DL, BL, AH, CH, DH, BH,
    AX, CX, DX, BX, SP, BP, SI, DI,
}

impl Register {
    /// the 3-bit field that selects this register.
    pub const fn code(&self) -> u8 {
        (*self as u8) & 0b111
    }

    /// `true` for the 16-bit registers, selected with `w = 1`.
    pub const fn is_wide(&self) -> bool {
        (*self as u8) >> 3 != 0
    }

    /// the index of this register in [`REGISTERS`], `(field << 1) | w`.
    pub const fn index(&self) -> usize {
        ((self.code() << 1) | self.is_wide() as u8) as usize
    }
}

/// the base/index part of a memory operand, selected by the 3-bit `r/m` field. variants are in
/// `r/m` order.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum EffectiveAddress {
    BxSi,
    BxDi,
    BpSi,
    BpDi,
    Si,
    Di,
    Bp,
    Bx,
}

impl EffectiveAddress {
    /// the `r/m` field that selects this expression.
    pub const fn rm(&self) -> u8 {
        *self as u8
    }
}

/// how the `r/m` field of a mode byte is interpreted, from the two `mod` bits.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum AddressingMode {
    /// `mod = 00`: memory, no displacement. `r/m = 110` is a direct 16-bit address instead.
    MemoryNoDisplacement,
    /// `mod = 01`: memory with a sign-extended 8-bit displacement.
    MemoryByteDisplacement,
    /// `mod = 10`: memory with a 16-bit displacement.
    MemoryWordDisplacement,
    /// `mod = 11`: `r/m` is a register.
    RegisterDirect,
}

impl AddressingMode {
    /// the addressing mode for the `mod` field of `mode_byte` (bits 7-6).
    pub fn of_mode_byte(mode_byte: u8) -> Self {
        match mode_byte >> 6 {
            0b00 => AddressingMode::MemoryNoDisplacement,
            0b01 => AddressingMode::MemoryByteDisplacement,
            0b10 => AddressingMode::MemoryWordDisplacement,
            _ => AddressingMode::RegisterDirect,
        }
    }

    /// the two `mod` bits, unshifted.
    pub fn mod_bits(&self) -> u8 {
        match self {
            AddressingMode::MemoryNoDisplacement => 0b00,
            AddressingMode::MemoryByteDisplacement => 0b01,
            AddressingMode::MemoryWordDisplacement => 0b10,
            AddressingMode::RegisterDirect => 0b11,
        }
    }
}

/// which of the `mov` encodings an opcode byte selects. this decides what, if anything, follows
/// the opcode.
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum Shape {
    /// `100010dw`, a mode byte, then displacement bytes as `mod` requires. one operand is the
    /// `reg` register, the other is `r/m`; `d` picks which is the destination.
    RegisterToRegister,
    /// `1100011w`, a mode byte, displacement bytes, then an 8- or 16-bit immediate.
    ImmediateToRegisterOrMemory,
    /// `1011wreg`, then an 8- or 16-bit immediate.
    ImmediateToRegister,
    /// `1010000w`, then a 16-bit address loaded into `al` or `ax`.
    MemoryToAccumulator,
    /// `1010001w`, then a 16-bit address `al` or `ax` is stored to.
    AccumulatorToMemory,
}

/// find the encoding `opcode` selects.
///
/// entries in the opcode table are tried in order and the first match wins. the table's
/// patterns do not overlap, but the order is kept fixed regardless.
pub fn classify(opcode: u8) -> Result<Shape, DecodeError> {
    tables::OPCODES
        .iter()
        .find(|entry| entry.matches(opcode))
        .map(|entry| entry.shape())
        .ok_or(DecodeError::UnrecognizedOpcode(opcode))
}

/// an 8086 instruction.
///
/// instructions have an [`Opcode`] and up to two [`Operand`]s, destination first. they are one to
/// six bytes long.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Instruction {
    opcode: Opcode,
    operands: [Operand; 2],
    shape: Shape,
    /// set for shapes that carry a mode byte.
    mode: Option<AddressingMode>,
    length: u8,
}

impl Default for Instruction {
    fn default() -> Instruction {
        Instruction {
            opcode: Opcode::MOV,
            operands: [Operand::Nothing, Operand::Nothing],
            shape: Shape::RegisterToRegister,
            mode: None,
            length: 0,
        }
    }
}

impl Instruction {
    fn reset(&mut self) {
        *self = Instruction::default();
    }

    /// the length of this instruction, in bytes.
    pub fn len(&self) -> u8 {
        self.length
    }

    /// get the number of operands in this instruction.
    ///
    /// calls to `Instruction::operand` for indices between 0 and this value will return an operand
    /// other than `Operand::Nothing`.
    pub fn operand_count(&self) -> u8 {
        if self.operands[0] == Operand::Nothing {
            0
        } else if self.operands[1] == Operand::Nothing {
            1
        } else {
            2
        }
    }

    /// get the `Operand` at the provided index.
    ///
    /// indices above `1` will always yield `Operand::Nothing`.
    pub fn operand(&self, idx: u8) -> Operand {
        self.operands.get(idx as usize).copied().unwrap_or(Operand::Nothing)
    }

    /// get the `Opcode` of this instruction.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// the encoding this instruction was decoded from.
    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// the addressing mode of this instruction's mode byte, if it has one.
    pub fn addressing_mode(&self) -> Option<AddressingMode> {
        self.mode
    }
}

impl LengthedInstruction for Instruction {
    type Unit = AddressDiff<<I8086 as Arch>::Address>;
    fn min_size() -> Self::Unit {
        AddressDiff::from_const(2)
    }
    fn len(&self) -> Self::Unit {
        AddressDiff::from_const(self.length as u16)
    }
}

impl yaxpeax_arch::Instruction for Instruction {
    fn well_defined(&self) -> bool { true }
}

/// an operand for an 8086 instruction.
#[derive(Copy, Clone, Hash, PartialEq, Eq)]
pub enum Operand {
    /// no operand in this position.
    ///
    /// `Instruction::operand` returns this for indices past `operand_count()`.
    Nothing,
    /// a general purpose register.
    Register(Register),
    /// memory at a base/index expression plus a signed displacement. a displacement of `0` is
    /// not displayed, whether or not the encoding had displacement bytes.
    Memory(EffectiveAddress, i16),
    /// memory at an absolute 16-bit address, from `mod = 00, r/m = 110` or the accumulator
    /// forms.
    DirectAddress(u16),
    /// an 8-bit immediate.
    ImmediateU8(u8),
    /// a 16-bit immediate.
    ImmediateU16(u16),
}

/// an 8086 instruction's operation.
#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Hash, PartialEq, Eq)]
pub enum Opcode {
    /// `Move`
    MOV,
}

/// a reader over raw 8086 machine code.
///
/// reads never partially succeed: a `next_n` that would run off the end of the input returns
/// [`ReadError::ExhaustedInput`] and consumes nothing.
pub struct I8086Reader<'a> {
    underlying: &'a [u8],
    mark: usize,
    offset: usize,
}

impl<'a> I8086Reader<'a> {
    pub fn of_u8(data: &'a [u8]) -> Self {
        I8086Reader {
            underlying: data,
            mark: 0,
            offset: 0,
        }
    }

    /// `true` once every byte of the input has been read.
    pub fn is_exhausted(&self) -> bool {
        self.offset >= self.underlying.len()
    }

    /// the offset of the next byte to read, from the start of the input.
    pub fn position(&self) -> usize {
        self.offset
    }
}

impl<'a> Reader<u16, u8> for I8086Reader<'a> {
    fn next(&mut self) -> Result<u8, ReadError> {
        if let Some(byte) = self.underlying.get(self.offset) {
            self.offset += 1;
            Ok(*byte)
        } else {
            Err(ReadError::ExhaustedInput)
        }
    }

    fn next_n(&mut self, buf: &mut [u8]) -> Result<(), ReadError> {
        let end = self.offset + buf.len();
        let bytes = self.underlying.get(self.offset..end).ok_or(ReadError::ExhaustedInput)?;
        buf.copy_from_slice(bytes);
        self.offset = end;
        Ok(())
    }

    fn mark(&mut self) {
        self.mark = self.offset;
    }

    fn offset(&mut self) -> u16 {
        (self.offset - self.mark) as u16
    }

    // 8086 addresses are 16 bits, so this wraps for inputs over 64k.
    fn total_offset(&mut self) -> u16 {
        self.offset as u16
    }
}

/// an 8086 instruction decoder.
///
/// the default decoder renders byte displacements sign-extended and ignores the `reg` field of
/// `mov r/m, imm`. both can be changed with the builder methods below.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct InstDecoder {
    raw_byte_displacements: bool,
    strict: bool,
}

impl InstDecoder {
    /// decode a slice of bytes into an instruction (or error)
    ///
    /// this is just a higher-level interface to the [`InstDecoder`] impl of
    /// [`yaxpeax_arch::Decoder`].
    pub fn decode_slice(data: &[u8]) -> Result<Instruction, <I8086 as Arch>::DecodeError> {
        InstDecoder::default()
            .decode(&mut I8086Reader::of_u8(data))
    }

    /// zero-extend 8-bit displacements instead of sign-extending them, so `[bx + di - 37]`
    /// decodes as `[bx + di + 219]`. some early 8086 disassemblers print displacements this way.
    pub fn raw_byte_displacements(mut self) -> Self {
        self.raw_byte_displacements = true;
        self
    }

    /// reject `mov r/m, imm` encodings whose `reg` field is not `000` with
    /// [`DecodeError::InvalidFieldCombination`].
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    /// iterate over every instruction in `data`, see [`Instructions`].
    pub fn instructions<'a>(&self, data: &'a [u8]) -> Instructions<'a> {
        Instructions::new(*self, data)
    }

    fn decode_register_to_register<T: Reader<u16, u8>>(&self, inst: &mut Instruction, opcode: u8, words: &mut T) -> Result<(), DecodeError> {
        let wide = opcode & 0b01 != 0;
        let reg_is_destination = opcode & 0b10 != 0;
        let mode_byte = read_u8(words)?;

        let reg = Operand::Register(tables::register((mode_byte >> 3) & 0b111, wide));
        let (mode, rm) = self.decode_rm(mode_byte, wide, words)?;

        inst.mode = Some(mode);
        inst.operands = if reg_is_destination {
            [reg, rm]
        } else {
            [rm, reg]
        };
        Ok(())
    }

    fn decode_immediate_to_register_or_memory<T: Reader<u16, u8>>(&self, inst: &mut Instruction, opcode: u8, words: &mut T) -> Result<(), DecodeError> {
        let wide = opcode & 0b1 != 0;
        let mode_byte = read_u8(words)?;

        if self.strict && (mode_byte >> 3) & 0b111 != 0 {
            return Err(DecodeError::InvalidFieldCombination(mode_byte));
        }

        let (mode, dest) = self.decode_rm(mode_byte, wide, words)?;
        inst.mode = Some(mode);
        inst.operands = [dest, read_immediate(wide, words)?];
        Ok(())
    }

    fn decode_immediate_to_register<T: Reader<u16, u8>>(&self, inst: &mut Instruction, opcode: u8, words: &mut T) -> Result<(), DecodeError> {
        let wide = opcode & 0b1000 != 0;
        let dest = tables::register(opcode & 0b111, wide);

        inst.operands = [Operand::Register(dest), read_immediate(wide, words)?];
        Ok(())
    }

    fn decode_accumulator_move<T: Reader<u16, u8>>(&self, inst: &mut Instruction, opcode: u8, words: &mut T) -> Result<(), DecodeError> {
        let accumulator = Operand::Register(if opcode & 0b1 != 0 {
            Register::AX
        } else {
            Register::AL
        });
        let address = Operand::DirectAddress(read_u16(words)?);

        inst.operands = if inst.shape == Shape::AccumulatorToMemory {
            [address, accumulator]
        } else {
            [accumulator, address]
        };
        Ok(())
    }

    /// decode the `r/m` operand for `mode_byte`, reading whatever displacement bytes `mod`
    /// requires.
    fn decode_rm<T: Reader<u16, u8>>(&self, mode_byte: u8, wide: bool, words: &mut T) -> Result<(AddressingMode, Operand), DecodeError> {
        let mode = AddressingMode::of_mode_byte(mode_byte);
        let rm = mode_byte & 0b111;

        let operand = match mode {
            AddressingMode::RegisterDirect => {
                Operand::Register(tables::register(rm, wide))
            }
            AddressingMode::MemoryNoDisplacement => {
                if rm == 0b110 {
                    Operand::DirectAddress(read_u16(words)?)
                } else {
                    Operand::Memory(tables::effective_address(rm), 0)
                }
            }
            AddressingMode::MemoryByteDisplacement => {
                let disp = read_u8(words)?;
                let disp = if self.raw_byte_displacements {
                    disp as i16
                } else {
                    disp as i8 as i16
                };
                Operand::Memory(tables::effective_address(rm), disp)
            }
            AddressingMode::MemoryWordDisplacement => {
                let disp = read_u16(words)? as i16;
                Operand::Memory(tables::effective_address(rm), disp)
            }
        };

        Ok((mode, operand))
    }
}

/// a failed read is only a clean end of input if nothing of the current instruction was read yet.
fn read_error<T: Reader<u16, u8>>(words: &mut T) -> DecodeError {
    if words.offset() == 0 {
        DecodeError::ExhaustedInput
    } else {
        DecodeError::TruncatedInstruction
    }
}

fn read_u8<T: Reader<u16, u8>>(words: &mut T) -> Result<u8, DecodeError> {
    match words.next() {
        Ok(byte) => Ok(byte),
        Err(_) => Err(read_error(words)),
    }
}

fn read_u16<T: Reader<u16, u8>>(words: &mut T) -> Result<u16, DecodeError> {
    let mut buf = [0u8; 2];
    match words.next_n(&mut buf) {
        Ok(()) => Ok(u16::from_le_bytes(buf)),
        Err(_) => Err(read_error(words)),
    }
}

fn read_immediate<T: Reader<u16, u8>>(wide: bool, words: &mut T) -> Result<Operand, DecodeError> {
    if wide {
        Ok(Operand::ImmediateU16(read_u16(words)?))
    } else {
        Ok(Operand::ImmediateU8(read_u8(words)?))
    }
}

impl Decoder<I8086> for InstDecoder {
    fn decode_into<T: Reader<<I8086 as Arch>::Address, <I8086 as Arch>::Word>>(&self, inst: &mut Instruction, words: &mut T) -> Result<(), <I8086 as Arch>::DecodeError> {
        inst.reset();
        words.mark();
        let opcode = read_u8(words)?;

        let shape = classify(opcode)?;
        inst.shape = shape;

        match shape {
            Shape::RegisterToRegister => {
                self.decode_register_to_register(inst, opcode, words)?;
            }
            Shape::ImmediateToRegisterOrMemory => {
                self.decode_immediate_to_register_or_memory(inst, opcode, words)?;
            }
            Shape::ImmediateToRegister => {
                self.decode_immediate_to_register(inst, opcode, words)?;
            }
            Shape::MemoryToAccumulator |
            Shape::AccumulatorToMemory => {
                self.decode_accumulator_move(inst, opcode, words)?;
            }
        }

        inst.length = words.offset() as u8;
        trace!("decoded {:?} from opcode {:#04x}, {} bytes", shape, opcode, inst.length);
        Ok(())
    }
}
