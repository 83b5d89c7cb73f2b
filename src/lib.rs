//! # `yaxpeax-8086`, a decoder for the 8086 `mov` family
//!
//! `yaxpeax-8086` decodes the data-movement `mov` encodings of the Intel 8086: register/memory
//! to or from register, immediate to register/memory, immediate to register, the accumulator
//! forms with a direct 16-bit address, and moves to or from segment registers. other opcode
//! families are reported as [`DecodeError::UnrecognizedOpcode`]; [`Opcode`] is where they would
//! be added.
//!
//! decoded instructions render as nasm-flavored text:
//! ```
//! use yaxpeax_8086::InstDecoder;
//!
//! let inst = InstDecoder::decode_slice(&[0x8b, 0x5e, 0x05]).unwrap();
//!
//! assert_eq!("mov bx, [bp+5]", inst.to_string());
//! assert_eq!(inst.len(), 3);
//! ```
//!
//! whole streams of instructions are decoded with [`Instructions`], or rendered line by line
//! with [`write_listing`]:
//! ```
//! use yaxpeax_8086::{write_listing, DisplayStyle, InstDecoder};
//! use yaxpeax_arch::U8Reader;
//!
//! let mut listing = String::new();
//! let mut reader = U8Reader::new(&[0x89, 0xd8, 0xb8, 0x05, 0x00]);
//! let count = write_listing(&InstDecoder::default(), &mut reader, &mut listing, DisplayStyle::default()).unwrap();
//!
//! assert_eq!(count, 2);
//! assert_eq!(listing, "mov ax, bx\nmov ax, 5\n");
//! ```
//!
//! `yaxpeax-8086` implements the `yaxpeax-arch` traits; [`yaxpeax_arch::Arch`] is implemented by
//! the unit struct [`I8086`].
//!
//! ## `#![no_std]`
//!
//! the decoder itself is `no_std`. the `std` feature only adds `std::error::Error` impls, and
//! the `cli` feature builds the `dis8086` binary.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

mod display;
mod listing;

pub use display::{DisplayStyle, InstructionDisplay, SizeHints};
pub use listing::{write_listing, Instructions, ListingError};

use core::fmt;

use yaxpeax_arch::{AddressDiff, Arch, Decoder, LengthedInstruction, Reader, ReadError, U8Reader};

/// a trivial struct for [`yaxpeax_arch::Arch`] to be implemented on. it's only interesting for the
/// associated type parameters.
#[derive(Hash, Eq, PartialEq, Debug, Copy, Clone)]
pub struct I8086;

impl Arch for I8086 {
    type Address = u32;
    type Word = u8;
    type Instruction = Instruction;
    type DecodeError = DecodeError;
    type Decoder = InstDecoder;
    type Operand = Operand;
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash)]
pub enum DecodeError {
    /// the leading byte at `offset` is not the first byte of any instruction this decoder knows.
    UnrecognizedOpcode { offset: u32, byte: u8 },
    /// the instruction needs another byte, but the input ended at `offset`.
    UnexpectedEndOfStream { offset: u32 },
}

impl DecodeError {
    /// the byte offset, from the start of the reader, this error was detected at.
    pub fn offset(&self) -> u32 {
        match self {
            DecodeError::UnrecognizedOpcode { offset, .. } => *offset,
            DecodeError::UnexpectedEndOfStream { offset } => *offset,
        }
    }
}

/// the decoder reads through its own helpers and always knows where input ran out. this
/// conversion exists for generic `yaxpeax-arch` callers, and has no offset to report but `0`.
impl From<ReadError> for DecodeError {
    fn from(_e: ReadError) -> Self {
        DecodeError::UnexpectedEndOfStream { offset: 0 }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::UnrecognizedOpcode { offset, byte } => {
                write!(f, "unrecognized opcode 0x{:02x} at offset 0x{:x}", byte, offset)
            }
            DecodeError::UnexpectedEndOfStream { offset } => {
                write!(f, "unexpected end of stream at offset 0x{:x}", offset)
            }
        }
    }
}

impl yaxpeax_arch::DecodeError for DecodeError {
    fn data_exhausted(&self) -> bool {
        matches!(self, DecodeError::UnexpectedEndOfStream { .. })
    }
    fn bad_opcode(&self) -> bool {
        matches!(self, DecodeError::UnrecognizedOpcode { .. })
    }
    fn bad_operand(&self) -> bool {
        // every modrm, register, and displacement bit pattern is defined for the forms decoded
        // here, so operands are never the problem.
        false
    }
    fn description(&self) -> &'static str {
        match self {
            DecodeError::UnrecognizedOpcode { .. } => "unrecognized opcode",
            DecodeError::UnexpectedEndOfStream { .. } => "unexpected end of stream",
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DecodeError {}

/// an 8086 `mov`-family instruction.
///
/// instructions have a [`Width`] and two [`Operand`]s, stored in intel order: destination
/// first, then source.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Instruction {
    opcode: Opcode,
    width: Width,
    operands: [Operand; 2],
    length: u8,
}

impl Instruction {
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// the operand size, selected by the `w` bit of the leading byte for most forms.
    pub fn width(&self) -> Width {
        self.width
    }

    pub fn destination(&self) -> Operand {
        self.operands[0]
    }

    pub fn source(&self) -> Operand {
        self.operands[1]
    }

    /// the number of bytes this instruction was decoded from.
    pub fn len(&self) -> u8 {
        self.length
    }
}

impl Default for Instruction {
    fn default() -> Instruction {
        Instruction {
            opcode: Opcode::MOV,
            width: Width::Word,
            operands: [Operand::Nothing, Operand::Nothing],
            length: 0,
        }
    }
}

impl LengthedInstruction for Instruction {
    type Unit = AddressDiff<<I8086 as Arch>::Address>;
    fn min_size() -> Self::Unit {
        AddressDiff::from_const(2)
    }
    fn len(&self) -> Self::Unit {
        AddressDiff::from_const(self.length as u32)
    }
}

impl yaxpeax_arch::Instruction for Instruction {
    // only well-formed instructions decode at all
    fn well_defined(&self) -> bool { true }
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Opcode {
    MOV,
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Width {
    Byte,
    Word,
}

impl Width {
    const fn from_w_bit(w: u8) -> Width {
        if w & 1 == 0 {
            Width::Byte
        } else {
            Width::Word
        }
    }

    pub fn bits(&self) -> u8 {
        match self {
            Width::Byte => 8,
            Width::Word => 16,
        }
    }
}

/// one of the eight 8-bit or eight 16-bit general purpose registers.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Register {
    AL, CL, DL, BL, AH, CH, DH, BH,
    AX, CX, DX, BX, SP, BP, SI, DI,
}

const BYTE_REGISTERS: [Register; 8] = [
    Register::AL, Register::CL, Register::DL, Register::BL,
    Register::AH, Register::CH, Register::DH, Register::BH,
];

const WORD_REGISTERS: [Register; 8] = [
    Register::AX, Register::CX, Register::DX, Register::BX,
    Register::SP, Register::BP, Register::SI, Register::DI,
];

impl Register {
    /// the register named by a 3-bit `reg` or `r/m` selector at operand size `width`. only the
    /// low three bits of `selector` are consulted.
    pub fn from_selector(selector: u8, width: Width) -> Register {
        let table = match width {
            Width::Byte => &BYTE_REGISTERS,
            Width::Word => &WORD_REGISTERS,
        };
        table[(selector & 0b111) as usize]
    }

    pub fn width(&self) -> Width {
        if BYTE_REGISTERS.contains(self) {
            Width::Byte
        } else {
            Width::Word
        }
    }

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

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum SegmentRegister {
    ES, CS, SS, DS,
}

impl SegmentRegister {
    /// the segment register named by the `sr` bits of a modrm `reg` field. the 8086 ignores the
    /// high bit of the field, so only the low two bits of `selector` are consulted.
    pub fn from_selector(selector: u8) -> SegmentRegister {
        [SegmentRegister::ES, SegmentRegister::CS, SegmentRegister::SS, SegmentRegister::DS]
            [(selector & 0b11) as usize]
    }

    pub fn name(&self) -> &'static str {
        match self {
            SegmentRegister::ES => "es",
            SegmentRegister::CS => "cs",
            SegmentRegister::SS => "ss",
            SegmentRegister::DS => "ds",
        }
    }
}

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Operand {
    /// no operand in this position.
    ///
    /// only a default-constructed `Instruction` holds this; every decoded instruction has both
    /// operands.
    Nothing,
    Register(Register),
    Segment(SegmentRegister),
    /// an effective address `[base+index+displacement]`. 8-bit displacements are sign-extended
    /// when decoded, so `displacement` is the actual signed offset.
    ///
    /// `base` is `None` only in principle: the one modrm encoding without a base register
    /// decodes to `Operand::DirectAddress` instead.
    Memory { base: Option<Register>, index: Option<Register>, displacement: i16 },
    /// a memory access to the absolute 16-bit address.
    DirectAddress(u16),
    /// a literal value, zero-extended from one byte when `width` is `Width::Byte`.
    Immediate { value: u16, width: Width },
}

impl Operand {
    pub fn is_memory(&self) -> bool {
        matches!(self, Operand::Memory { .. } | Operand::DirectAddress(_))
    }
}

/// base and index registers for each memory-mode `r/m` selector.
const EFFECTIVE_ADDRESSES: [(Register, Option<Register>); 8] = [
    (Register::BX, Some(Register::SI)),
    (Register::BX, Some(Register::DI)),
    (Register::BP, Some(Register::SI)),
    (Register::BP, Some(Register::DI)),
    (Register::SI, None),
    (Register::DI, None),
    (Register::BP, None),
    (Register::BX, None),
];

/// the base and optional index register of a memory-mode `r/m` selector. only the low three bits
/// of `r_m` are consulted.
///
/// `r/m = 110` reports `bp` here; with `mod = 00` that encoding is a direct address instead, which
/// the decoder handles before consulting this table.
pub fn effective_address(r_m: u8) -> (Register, Option<Register>) {
    EFFECTIVE_ADDRESSES[(r_m & 0b111) as usize]
}

/// how many displacement bytes follow the modrm byte for `r_m` under memory mode `mode`, as the
/// width of the displacement, or `None` for no displacement at all.
///
/// `mod = 11` names a register, not memory, and has no displacement.
pub fn displacement_width(r_m: u8, mode: u8) -> Option<Width> {
    match mode & 0b11 {
        0b00 => if r_m & 0b111 == 0b110 { Some(Width::Word) } else { None },
        0b01 => Some(Width::Byte),
        0b10 => Some(Width::Word),
        _ => None,
    }
}

/// where an operand comes from in an instruction's encoding.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub enum Role {
    /// the modrm `reg` field, or a register selected by the leading byte (including the implied
    /// accumulator).
    Reg,
    /// the modrm `r/m` field: a register, an effective address, or a direct address.
    RM,
    /// a literal following all other fields.
    Immediate,
    /// the direct address of the accumulator forms, immediately after the leading byte.
    AccumulatorMemory,
    /// the modrm `sr` field of the segment register forms.
    Segment,
}

/// the layout of an instruction as determined by its leading byte: which fields follow, how wide
/// the operands are, and which field is the source or destination.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq)]
pub struct Shape {
    pub uses_modrm: bool,
    /// the register selector is the low three bits of the leading byte.
    pub uses_explicit_reg: bool,
    pub uses_immediate: bool,
    /// the accumulator (`al` or `ax`) is implied, and a 16-bit address follows the leading byte.
    pub uses_fixed_accumulator: bool,
    /// the modrm `reg` field selects a segment register rather than a general purpose one.
    pub uses_segment_reg: bool,
    pub width: Width,
    pub source: Role,
    pub destination: Role,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Form {
    /// `1 0 0 0 1 0 d w | mod reg r/m`
    RegRM,
    /// `1 1 0 0 0 1 1 w | mod 0 0 0 r/m | data | data if w`
    ImmRM,
    /// `1 0 1 1 w reg | data | data if w`
    ImmReg,
    /// `1 0 1 0 0 0 d w | addr-lo | addr-hi`; `d` clear loads the accumulator.
    AccMem,
    /// `1 0 0 0 1 1 d 0 | mod 0 sr r/m`
    SegRM,
}

impl Form {
    const fn shape(self, byte: u8) -> Shape {
        match self {
            Form::RegRM => {
                let (source, destination) = if byte & 0b10 == 0 {
                    (Role::Reg, Role::RM)
                } else {
                    (Role::RM, Role::Reg)
                };
                Shape {
                    uses_modrm: true,
                    uses_explicit_reg: false,
                    uses_immediate: false,
                    uses_fixed_accumulator: false,
                    uses_segment_reg: false,
                    width: Width::from_w_bit(byte),
                    source,
                    destination,
                }
            }
            Form::ImmRM => Shape {
                uses_modrm: true,
                uses_explicit_reg: false,
                uses_immediate: true,
                uses_fixed_accumulator: false,
                uses_segment_reg: false,
                width: Width::from_w_bit(byte),
                source: Role::Immediate,
                destination: Role::RM,
            },
            Form::ImmReg => Shape {
                uses_modrm: false,
                uses_explicit_reg: true,
                uses_immediate: true,
                uses_fixed_accumulator: false,
                uses_segment_reg: false,
                width: Width::from_w_bit(byte >> 3),
                source: Role::Immediate,
                destination: Role::Reg,
            },
            Form::AccMem => {
                let (source, destination) = if byte & 0b10 == 0 {
                    (Role::AccumulatorMemory, Role::Reg)
                } else {
                    (Role::Reg, Role::AccumulatorMemory)
                };
                Shape {
                    uses_modrm: false,
                    uses_explicit_reg: false,
                    uses_immediate: false,
                    uses_fixed_accumulator: true,
                    uses_segment_reg: false,
                    width: Width::from_w_bit(byte),
                    source,
                    destination,
                }
            }
            Form::SegRM => {
                let (source, destination) = if byte & 0b10 == 0 {
                    (Role::Segment, Role::RM)
                } else {
                    (Role::RM, Role::Segment)
                };
                Shape {
                    uses_modrm: true,
                    uses_explicit_reg: false,
                    uses_immediate: false,
                    uses_fixed_accumulator: false,
                    uses_segment_reg: true,
                    width: Width::Word,
                    source,
                    destination,
                }
            }
        }
    }
}

/// `(mask, pattern, form)`: a leading byte `b` is an instance of `form` when `b & mask == pattern`.
const OPCODE_CLASSES: [(u8, u8, Form); 5] = [
    (0b1111_1100, 0b1000_1000, Form::RegRM),
    (0b1111_1110, 0b1100_0110, Form::ImmRM),
    (0b1111_0000, 0b1011_0000, Form::ImmReg),
    (0b1111_1100, 0b1010_0000, Form::AccMem),
    (0b1111_1101, 0b1000_1100, Form::SegRM),
];

const fn build_shape_table() -> [Option<Shape>; 256] {
    let mut table = [None; 256];
    let mut byte = 0;
    while byte < 256 {
        let mut i = 0;
        while i < OPCODE_CLASSES.len() {
            let (mask, pattern, form) = OPCODE_CLASSES[i];
            if byte as u8 & mask == pattern {
                table[byte] = Some(form.shape(byte as u8));
            }
            i += 1;
        }
        byte += 1;
    }
    table
}

static SHAPES: [Option<Shape>; 256] = build_shape_table();

/// the [`Shape`] of instructions starting with `byte`, or `None` if no decoded form starts with
/// it.
pub fn classify(byte: u8) -> Option<Shape> {
    SHAPES[byte as usize]
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct ModRM {
    mode: u8,
    reg: u8,
    r_m: u8,
}

impl ModRM {
    fn from_byte(b: u8) -> ModRM {
        ModRM {
            mode: b >> 6,
            reg: (b >> 3) & 0b111,
            r_m: b & 0b111,
        }
    }
}

/// operands built from one instruction's fields, before they are assigned to source or
/// destination.
#[derive(Debug, Default)]
struct Fields {
    reg: Option<Operand>,
    r_m: Option<Operand>,
    immediate: Option<Operand>,
    accumulator_memory: Option<Operand>,
    segment: Option<Operand>,
}

impl Fields {
    fn operand(&self, role: Role) -> Operand {
        let operand = match role {
            Role::Reg => self.reg,
            Role::RM => self.r_m,
            Role::Immediate => self.immediate,
            Role::AccumulatorMemory => self.accumulator_memory,
            Role::Segment => self.segment,
        };
        match operand {
            Some(operand) => operand,
            None => unreachable!("shape routes {:?} to a field that was not decoded", role),
        }
    }
}

/// an 8086 instruction decoder.
///
/// there are no decode options for the 8086, so this is a trivial struct that exists only for the
/// [`yaxpeax_arch::Decoder`] trait impl.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub struct InstDecoder { }

impl InstDecoder {
    /// decode one instruction from the start of `data`. trailing bytes are ignored.
    pub fn decode_slice(data: &[u8]) -> Result<Instruction, <I8086 as Arch>::DecodeError> {
        let mut reader = U8Reader::new(data);
        InstDecoder::default().decode(&mut reader)
    }
}

trait DecodeHandler<T: Reader<<I8086 as Arch>::Address, <I8086 as Arch>::Word>> {
    /// bytes are read one at a time, so a short read reports the offset where input actually ran
    /// out rather than where the field started.
    #[inline(always)]
    fn read_u8(&mut self, words: &mut T) -> Result<u8, <I8086 as Arch>::DecodeError> {
        let offset = words.total_offset();
        let b = words.next().map_err(|_| DecodeError::UnexpectedEndOfStream { offset })?;
        self.on_word_read(b);
        Ok(b)
    }
    #[inline(always)]
    fn read_u16(&mut self, words: &mut T) -> Result<u16, <I8086 as Arch>::DecodeError> {
        let lo = self.read_u8(words)?;
        let hi = self.read_u8(words)?;
        Ok(u16::from_le_bytes([lo, hi]))
    }
    fn read_immediate(&mut self, width: Width, words: &mut T) -> Result<Operand, <I8086 as Arch>::DecodeError> {
        let value = match width {
            Width::Byte => self.read_u8(words)? as u16,
            Width::Word => self.read_u16(words)?,
        };
        Ok(Operand::Immediate { value, width })
    }
    /// decode the `r/m` side of a modrm byte, along with any displacement or direct address
    /// following it.
    fn decode_rm(&mut self, modrm: ModRM, width: Width, words: &mut T) -> Result<Operand, <I8086 as Arch>::DecodeError> {
        if modrm.mode == 0b11 {
            return Ok(Operand::Register(Register::from_selector(modrm.r_m, width)));
        }

        if modrm.mode == 0b00 && modrm.r_m == 0b110 {
            // no base register: two bytes of absolute address, and no displacement
            return Ok(Operand::DirectAddress(self.read_u16(words)?));
        }

        let (base, index) = effective_address(modrm.r_m);
        let displacement = match displacement_width(modrm.r_m, modrm.mode) {
            None => 0,
            Some(Width::Byte) => self.read_u8(words)? as i8 as i16,
            Some(Width::Word) => self.read_u16(words)? as i16,
        };
        Ok(Operand::Memory { base: Some(base), index, displacement })
    }
    /// read every field after the leading byte `opc` that `shape` calls for, in encoding order.
    fn decode_fields(&mut self, opc: u8, shape: &Shape, words: &mut T) -> Result<Fields, <I8086 as Arch>::DecodeError> {
        let mut fields = Fields::default();

        if shape.uses_modrm {
            let modrm = ModRM::from_byte(self.read_u8(words)?);
            if shape.uses_segment_reg {
                fields.segment = Some(Operand::Segment(SegmentRegister::from_selector(modrm.reg)));
            } else if !shape.uses_immediate {
                // the `reg` field of immediate-to-r/m is an opcode extension, not an operand
                fields.reg = Some(Operand::Register(Register::from_selector(modrm.reg, shape.width)));
            }
            fields.r_m = Some(self.decode_rm(modrm, shape.width, words)?);
        }

        if shape.uses_explicit_reg {
            fields.reg = Some(Operand::Register(Register::from_selector(opc, shape.width)));
        }

        if shape.uses_immediate {
            fields.immediate = Some(self.read_immediate(shape.width, words)?);
        }

        if shape.uses_fixed_accumulator {
            fields.reg = Some(Operand::Register(Register::from_selector(0, shape.width)));
            fields.accumulator_memory = Some(Operand::DirectAddress(self.read_u16(words)?));
        }

        Ok(fields)
    }
    fn on_decode_start(&mut self) {}
    fn on_decode_end(&mut self) {}
    fn on_opcode_decoded(&mut self, _opcode: Opcode, _width: Width) -> Result<(), <I8086 as Arch>::DecodeError> { Ok(()) }
    fn on_operand_decoded(&mut self, _number: u8, _operand: Operand) -> Result<(), <I8086 as Arch>::DecodeError> { Ok(()) }
    fn on_word_read(&mut self, _word: <I8086 as Arch>::Word) {}
}

impl<T: Reader<<I8086 as Arch>::Address, <I8086 as Arch>::Word>> DecodeHandler<T> for Instruction {
    fn on_decode_start(&mut self) {
        self.length = 0;
        self.opcode = Opcode::MOV;
        self.width = Width::Word;
        self.operands = [Operand::Nothing, Operand::Nothing];
    }
    fn on_opcode_decoded(&mut self, opcode: Opcode, width: Width) -> Result<(), <I8086 as Arch>::DecodeError> {
        self.opcode = opcode;
        self.width = width;
        Ok(())
    }
    fn on_operand_decoded(&mut self, number: u8, operand: Operand) -> Result<(), <I8086 as Arch>::DecodeError> {
        self.operands[number as usize] = operand;
        Ok(())
    }
    fn on_word_read(&mut self, _word: <I8086 as Arch>::Word) {
        self.length += 1;
    }
}

impl Decoder<I8086> for InstDecoder {
    fn decode_into<T: Reader<<I8086 as Arch>::Address, <I8086 as Arch>::Word>>(&self, inst: &mut Instruction, words: &mut T) -> Result<(), <I8086 as Arch>::DecodeError> {
        decode_inst(self, inst, words)
    }
}

fn decode_inst<
    T: Reader<<I8086 as Arch>::Address, <I8086 as Arch>::Word>,
    H: DecodeHandler<T>,
>(_decoder: &<I8086 as Arch>::Decoder, handler: &mut H, words: &mut T) -> Result<(), <I8086 as Arch>::DecodeError> {
    handler.on_decode_start();

    let offset = words.total_offset();
    let opc: u8 = handler.read_u8(words)?;

    let shape = classify(opc).ok_or(DecodeError::UnrecognizedOpcode { offset, byte: opc })?;
    handler.on_opcode_decoded(Opcode::MOV, shape.width)?;

    let fields = handler.decode_fields(opc, &shape, words)?;
    handler.on_operand_decoded(0, fields.operand(shape.destination))?;
    handler.on_operand_decoded(1, fields.operand(shape.source))?;

    handler.on_decode_end();
    Ok(())
}

#[test]
fn register_selectors_are_injective_per_width() {
    for width in [Width::Byte, Width::Word] {
        for a in 0..8u8 {
            assert_eq!(Register::from_selector(a, width).width(), width);
            for b in 0..8u8 {
                if a != b {
                    assert_ne!(Register::from_selector(a, width), Register::from_selector(b, width));
                }
            }
        }
    }
}

#[test]
fn displacement_widths_follow_mode() {
    for r_m in 0..8u8 {
        let expected = if r_m == 0b110 { Some(Width::Word) } else { None };
        assert_eq!(displacement_width(r_m, 0b00), expected);
        assert_eq!(displacement_width(r_m, 0b01), Some(Width::Byte));
        assert_eq!(displacement_width(r_m, 0b10), Some(Width::Word));
        assert_eq!(displacement_width(r_m, 0b11), None);
    }
}

#[test]
fn index_registers_only_for_low_selectors() {
    for r_m in 0..8u8 {
        let (base, index) = effective_address(r_m);
        assert!(matches!(base, Register::BX | Register::BP | Register::SI | Register::DI));
        assert_eq!(index.is_some(), r_m < 4);
    }
}

#[test]
fn classes_do_not_overlap() {
    for byte in 0..=255u8 {
        let matching = OPCODE_CLASSES
            .iter()
            .filter(|(mask, pattern, _)| byte & mask == *pattern)
            .count();
        assert!(matching <= 1, "byte {:#04x} matches {} opcode classes", byte, matching);
        assert_eq!(matching == 1, classify(byte).is_some());
    }
}

#[test]
fn direction_bit_swaps_roles() {
    let to_rm = classify(0x89).expect("mov r/m16, r16");
    assert_eq!((to_rm.source, to_rm.destination), (Role::Reg, Role::RM));
    assert_eq!(to_rm.width, Width::Word);

    let to_reg = classify(0x8a).expect("mov r8, r/m8");
    assert_eq!((to_reg.source, to_reg.destination), (Role::RM, Role::Reg));
    assert_eq!(to_reg.width, Width::Byte);

    let load_acc = classify(0xa1).expect("mov ax, moffs16");
    assert_eq!((load_acc.source, load_acc.destination), (Role::AccumulatorMemory, Role::Reg));

    let store_acc = classify(0xa2).expect("mov moffs8, al");
    assert_eq!((store_acc.source, store_acc.destination), (Role::Reg, Role::AccumulatorMemory));
}

#[test]
fn immediate_to_register_width_is_bit_three() {
    for byte in 0xb0..=0xbfu8 {
        let shape = classify(byte).expect("mov reg, imm");
        assert!(shape.uses_explicit_reg && shape.uses_immediate && !shape.uses_modrm);
        let expected = if byte < 0xb8 { Width::Byte } else { Width::Word };
        assert_eq!(shape.width, expected);
    }
}
