use core::fmt;
use core::iter::FusedIterator;

use log::{debug, trace};
use yaxpeax_arch::{Arch, Decoder, Reader};

use crate::{DecodeError, DisplayStyle, I8086, InstDecoder, Instruction};

/// decodes instructions back to back from a reader.
///
/// iteration ends cleanly when the reader is exhausted exactly at an instruction boundary. if the
/// input ends partway through an instruction, or a byte is not a recognized opcode, the error is
/// yielded once and iteration stops; no attempt is made to resynchronize.
pub struct Instructions<'r, T> {
    decoder: InstDecoder,
    words: &'r mut T,
    done: bool,
}

impl<'r, T: Reader<<I8086 as Arch>::Address, <I8086 as Arch>::Word>> Instructions<'r, T> {
    pub fn new(decoder: InstDecoder, words: &'r mut T) -> Self {
        Instructions { decoder, words, done: false }
    }
}

impl<T: Reader<<I8086 as Arch>::Address, <I8086 as Arch>::Word>> Iterator for Instructions<'_, T> {
    type Item = Result<Instruction, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let start = self.words.total_offset();
        let mut inst = Instruction::default();
        match self.decoder.decode_into(&mut inst, &mut *self.words) {
            Ok(()) => {
                trace!("{:#06x}: {}", start, inst);
                Some(Ok(inst))
            }
            Err(DecodeError::UnexpectedEndOfStream { offset }) if offset == start => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<T: Reader<<I8086 as Arch>::Address, <I8086 as Arch>::Word>> FusedIterator for Instructions<'_, T> {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ListingError {
    Decode(DecodeError),
    /// the sink refused a line.
    Write(fmt::Error),
}

impl From<DecodeError> for ListingError {
    fn from(e: DecodeError) -> Self {
        ListingError::Decode(e)
    }
}

impl fmt::Display for ListingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ListingError::Decode(e) => fmt::Display::fmt(e, f),
            ListingError::Write(_) => f.write_str("could not write to listing"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ListingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListingError::Decode(e) => Some(e),
            ListingError::Write(e) => Some(e),
        }
    }
}

/// decode every instruction in `words` and write each to `out` as one newline-terminated line,
/// rendered with `style`.
///
/// returns the number of instructions written. on a decode error, the lines for every
/// instruction before the failing one have already been written, and nothing is written for the
/// failing instruction itself.
pub fn write_listing<T, W>(
    decoder: &InstDecoder,
    words: &mut T,
    out: &mut W,
    style: DisplayStyle,
) -> Result<usize, ListingError>
where
    T: Reader<<I8086 as Arch>::Address, <I8086 as Arch>::Word>,
    W: fmt::Write,
{
    let mut count = 0;
    for inst in Instructions::new(*decoder, words) {
        let inst = match inst {
            Ok(inst) => inst,
            Err(e) => {
                debug!("listing stopped after {} instructions: {}", count, e);
                return Err(e.into());
            }
        };
        writeln!(out, "{}", inst.display_with(style)).map_err(ListingError::Write)?;
        count += 1;
    }
    debug!("listing complete: {} instructions", count);
    Ok(count)
}
