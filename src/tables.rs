use crate::{EffectiveAddress, Register, Shape};

/// registers selected by a 3-bit `reg` field (or `r/m`, when `mod = 11`) and the `w` bit. index
/// with `(field << 1) | w`.
pub const REGISTERS: [Register; 16] = [
    Register::AL, Register::AX,
    Register::CL, Register::CX,
    Register::DL, Register::DX,
    Register::BL, Register::BX,
    Register::AH, Register::SP,
    Register::CH, Register::BP,
    Register::DH, Register::SI,
    Register::BH, Register::DI,
];

/// base/index expressions for memory operands, indexed by the 3-bit `r/m` field. `r/m = 110` with
/// `mod = 00` never reaches this table; that's a direct address.
pub const EFFECTIVE_ADDRESSES: [EffectiveAddress; 8] = [
    EffectiveAddress::BxSi,
    EffectiveAddress::BxDi,
    EffectiveAddress::BpSi,
    EffectiveAddress::BpDi,
    EffectiveAddress::Si,
    EffectiveAddress::Di,
    EffectiveAddress::Bp,
    EffectiveAddress::Bx,
];

// every entry must sit at the index its own encoding computes.
const _: () = {
    let mut i = 0;
    while i < REGISTERS.len() {
        assert!(REGISTERS[i].index() == i);
        i += 1;
    }
    let mut i = 0;
    while i < EFFECTIVE_ADDRESSES.len() {
        assert!(EFFECTIVE_ADDRESSES[i].rm() as usize == i);
        i += 1;
    }
};

/// `field` must already be masked to three bits.
pub(crate) fn register(field: u8, wide: bool) -> Register {
    debug_assert!(field < 8);
    REGISTERS[((field << 1) | wide as u8) as usize]
}

/// `rm` must already be masked to three bits.
pub(crate) fn effective_address(rm: u8) -> EffectiveAddress {
    debug_assert!(rm < 8);
    EFFECTIVE_ADDRESSES[rm as usize]
}

/// one entry of the opcode table: the bits of `pattern` above its don't-care bits, and the shape
/// an opcode with those bits decodes as.
pub(crate) struct OpcodePattern {
    pattern: u8,
    mask: u8,
    shape: Shape,
}

impl OpcodePattern {
    const fn new(pattern: u8, dont_care: u32, shape: Shape) -> Self {
        let mask = !0u8 << dont_care;
        OpcodePattern {
            pattern: pattern & mask,
            mask,
            shape,
        }
    }

    pub(crate) fn matches(&self, opcode: u8) -> bool {
        opcode & self.mask == self.pattern
    }

    pub(crate) fn shape(&self) -> Shape {
        self.shape
    }
}

/// `mov` encodings, in the order they are tried.
pub(crate) const OPCODES: [OpcodePattern; 5] = [
    // 100010dw
    OpcodePattern::new(0b1000_1000, 2, Shape::RegisterToRegister),
    // 1100011w
    OpcodePattern::new(0b1100_0110, 1, Shape::ImmediateToRegisterOrMemory),
    // 1011wreg
    OpcodePattern::new(0b1011_0000, 4, Shape::ImmediateToRegister),
    // 1010000w
    OpcodePattern::new(0b1010_0000, 1, Shape::MemoryToAccumulator),
    // 1010001w
    OpcodePattern::new(0b1010_0010, 1, Shape::AccumulatorToMemory),
];
