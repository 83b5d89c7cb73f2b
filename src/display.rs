use core::fmt;

use crate::{Instruction, Opcode, Operand, Width};

/// when an immediate operand is written with a `byte` or `word` keyword.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
pub enum SizeHints {
    /// only when the other operand is a memory reference, where the operand size would
    /// otherwise be ambiguous: `mov [bp+di], byte 7`, but `mov cl, 12`.
    #[default]
    Memory,
    /// on every immediate: `mov cl, byte 12`.
    Always,
}

/// options for rendering instructions as text. `Instruction`'s `Display` impl uses
/// `DisplayStyle::default()`.
#[derive(Debug, Default, Copy, Clone, Hash, PartialEq, Eq)]
pub struct DisplayStyle {
    pub size_hints: SizeHints,
}

impl Instruction {
    /// render this instruction with `style` rather than the default style.
    pub fn display_with(&self, style: DisplayStyle) -> InstructionDisplay<'_> {
        InstructionDisplay { instr: self, style }
    }
}

/// an [`Instruction`] paired with the [`DisplayStyle`] to render it with.
pub struct InstructionDisplay<'instr> {
    instr: &'instr Instruction,
    style: DisplayStyle,
}

impl InstructionDisplay<'_> {
    fn write_operand(&self, f: &mut fmt::Formatter, operand: &Operand, other: &Operand) -> fmt::Result {
        match operand {
            Operand::Immediate { value, width } => {
                let hinted = match self.style.size_hints {
                    SizeHints::Memory => other.is_memory(),
                    SizeHints::Always => true,
                };
                if hinted {
                    write!(f, "{} {}", width, value)
                } else {
                    write!(f, "{}", value)
                }
            }
            _ => fmt::Display::fmt(operand, f),
        }
    }
}

impl fmt::Display for InstructionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.instr.opcode())?;
        let dest = self.instr.destination();
        let src = self.instr.source();
        if dest != Operand::Nothing {
            f.write_str(" ")?;
            self.write_operand(f, &dest, &src)?;
        }
        if src != Operand::Nothing {
            f.write_str(", ")?;
            self.write_operand(f, &src, &dest)?;
        }
        Ok(())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.display_with(DisplayStyle::default()), f)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Opcode::MOV => f.write_str("mov"),
        }
    }
}

impl fmt::Display for Width {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Width::Byte => f.write_str("byte"),
            Width::Word => f.write_str("word"),
        }
    }
}

/// operands on their own render immediates with their size keyword; only a whole instruction
/// knows whether the keyword is redundant.
impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Nothing => Ok(()),
            Operand::Register(reg) => f.write_str(reg.name()),
            Operand::Segment(sreg) => f.write_str(sreg.name()),
            Operand::Memory { base, index, displacement } => {
                f.write_str("[")?;
                let mut has_reg = false;
                if let Some(base) = base {
                    f.write_str(base.name())?;
                    has_reg = true;
                }
                if let Some(index) = index {
                    if has_reg {
                        f.write_str("+")?;
                    }
                    f.write_str(index.name())?;
                    has_reg = true;
                }
                if !has_reg {
                    write!(f, "{}", displacement)?;
                } else if *displacement > 0 {
                    write!(f, "+{}", displacement)?;
                } else if *displacement < 0 {
                    // carries its own `-`
                    write!(f, "{}", displacement)?;
                }
                f.write_str("]")
            }
            Operand::DirectAddress(addr) => {
                write!(f, "[{}]", addr)
            }
            Operand::Immediate { value, width } => {
                write!(f, "{} {}", width, value)
            }
        }
    }
}
