//! Big-endian cursor helpers shared by the segment and frame codecs.

use crate::error::SegmentError;
use crate::topology::IfId;

/// Read cursor over a borrowed byte slice.
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8], SegmentError> {
        if self.remaining() < n {
            return Err(SegmentError::TooShort {
                min: self.pos + n,
                actual: self.buf.len(),
            });
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, SegmentError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, SegmentError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, SegmentError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, SegmentError> {
        let mut arr = [0u8; 8];
        arr.copy_from_slice(self.take(8)?);
        Ok(u64::from_be_bytes(arr))
    }

    pub(crate) fn read_ifid(&mut self) -> Result<IfId, SegmentError> {
        Ok(IfId(u64::from(self.read_u16()?)))
    }

    /// Fail if any input is left unconsumed.
    pub(crate) fn finish(self) -> Result<(), SegmentError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(SegmentError::TrailingBytes(n)),
        }
    }
}

/// Append an interface id as a u16.
pub(crate) fn put_ifid(out: &mut Vec<u8>, ifid: IfId) -> Result<(), SegmentError> {
    let v = u16::try_from(ifid.0).map_err(|_| SegmentError::IfIdOutOfRange(ifid))?;
    out.extend_from_slice(&v.to_be_bytes());
    Ok(())
}

/// Append a count as a single byte.
pub(crate) fn put_count(out: &mut Vec<u8>, what: &'static str, count: usize) -> Result<(), SegmentError> {
    let v = u8::try_from(count).map_err(|_| SegmentError::TooMany { what, count })?;
    out.push(v);
    Ok(())
}
