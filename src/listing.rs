//! decoding whole buffers of machine code, one instruction after another.

use core::fmt;
use core::iter::FusedIterator;

use log::{debug, trace};
use yaxpeax_arch::Decoder;

use crate::{DecodeError, I8086Reader, InstDecoder, Instruction};

/// the first line of a listing, telling the assembler to produce 16-bit code.
pub const ASM_HEADER: &str = "bits 16";

/// an error that ended a listing early.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ListingError {
    /// the instruction starting at `offset` could not be decoded.
    Decode { offset: usize, error: DecodeError },
    /// the output sink refused a write.
    Write,
}

impl From<fmt::Error> for ListingError {
    fn from(_e: fmt::Error) -> Self {
        ListingError::Write
    }
}

impl fmt::Display for ListingError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ListingError::Decode { offset, error } => {
                write!(f, "invalid instruction at offset {:#06x}: {}", offset, error)
            }
            ListingError::Write => f.write_str("failed to write listing"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ListingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListingError::Decode { error, .. } => Some(error),
            ListingError::Write => None,
        }
    }
}

/// an iterator over the instructions of a buffer and the offset each one starts at.
///
/// iteration ends cleanly when the buffer is used up between two instructions. a decode error is
/// yielded once, and nothing after it: there is no attempt to resynchronize past bad bytes.
pub struct Instructions<'a> {
    decoder: InstDecoder,
    reader: I8086Reader<'a>,
    failed: bool,
}

impl<'a> Instructions<'a> {
    pub fn new(decoder: InstDecoder, data: &'a [u8]) -> Self {
        Instructions {
            decoder,
            reader: I8086Reader::of_u8(data),
            failed: false,
        }
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<(usize, Instruction), ListingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.reader.is_exhausted() {
            return None;
        }

        let offset = self.reader.position();
        match self.decoder.decode(&mut self.reader) {
            Ok(inst) => {
                trace!("{:#06x}: {}", offset, inst);
                Some(Ok((offset, inst)))
            }
            Err(error) => {
                debug!("stopping at {:#06x}: {}", offset, error);
                self.failed = true;
                Some(Err(ListingError::Decode { offset, error }))
            }
        }
    }
}

impl<'a> FusedIterator for Instructions<'a> {}

/// decode all of `data`, writing each instruction to `out` on its own line. returns the number of
/// instructions written.
///
/// on error, lines for every instruction before the bad one have already been written to `out`.
/// the `bits 16` header is not written; see [`ASM_HEADER`].
pub fn disassemble_into<W: fmt::Write>(decoder: &InstDecoder, data: &[u8], out: &mut W) -> Result<usize, ListingError> {
    let mut count = 0;
    for decoded in decoder.instructions(data) {
        let (_offset, inst) = decoded?;
        writeln!(out, "{}", inst)?;
        count += 1;
    }
    Ok(count)
}
