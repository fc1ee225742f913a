/*
    MdaFox

    Copyright 2024 The MdaFox Authors

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/xdr/reader.rs

    A bounds-checked XDR read cursor.
*/

use crate::{
    io::{Read, ReadSeek, Seek, SeekFrom},
    util::{get_length, xdr_padding},
    xdr::XdrCodec,
    MdaError,
};
use binrw::BinRead;

/// A read cursor over an XDR stream.
///
/// The reader knows the total length of its source and checks every read against it before
/// touching the source, so a corrupt length or count field produces [MdaError::TruncatedData]
/// instead of a huge allocation or a short read.
pub struct XdrReader<'c, R> {
    inner: R,
    codec: &'c dyn XdrCodec,
    pos: u64,
    len: u64,
}

impl<'c, R: ReadSeek> XdrReader<'c, R> {
    pub fn new(mut inner: R, codec: &'c dyn XdrCodec) -> Result<Self, MdaError> {
        let len = get_length(&mut inner)?;
        let pos = inner.stream_position()?;
        Ok(Self { inner, codec, pos, len })
    }

    /// The total length of the underlying source in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn codec(&self) -> &'c dyn XdrCodec {
        self.codec
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Reposition the cursor. Seeking past the end of the source is an error; seeking to the
    /// very end is allowed (the next read will fail).
    pub fn seek(&mut self, pos: u64) -> Result<(), MdaError> {
        if pos > self.len {
            return Err(MdaError::TruncatedData {
                offset: pos,
                needed: pos - self.len,
            });
        }
        self.inner
            .seek(SeekFrom::Start(pos))
            .map_err(|e| MdaError::from(e).at(pos))?;
        self.pos = pos;
        Ok(())
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Verify that `bytes` more bytes are available at the current position.
    fn reserve(&self, bytes: u64) -> Result<(), MdaError> {
        let available = self.len.saturating_sub(self.pos);
        if bytes > available {
            return Err(MdaError::TruncatedData {
                offset: self.pos,
                needed: bytes - available,
            });
        }
        Ok(())
    }

    fn read_scalar<T>(&mut self, size: u64) -> Result<T, MdaError>
    where
        T: BinRead,
        for<'a> T::Args<'a>: Default,
    {
        self.reserve(size)?;
        let value = T::read_be(&mut self.inner).map_err(|e| MdaError::from(e).at(self.pos))?;
        self.pos += size;
        Ok(value)
    }

    pub fn read_i32(&mut self) -> Result<i32, MdaError> {
        self.read_scalar(4)
    }

    pub fn read_f32(&mut self) -> Result<f32, MdaError> {
        self.read_scalar(4)
    }

    pub fn read_f64(&mut self) -> Result<f64, MdaError> {
        self.read_scalar(8)
    }

    /// Read a fixed-layout binrw structure.
    pub fn read_record<T>(&mut self) -> Result<T, MdaError>
    where
        T: BinRead,
        for<'a> T::Args<'a>: Default,
    {
        let start = self.pos;
        let record = T::read_be(&mut self.inner).map_err(|e| {
            if e.is_eof() {
                MdaError::TruncatedData {
                    offset: start,
                    needed: 1,
                }
            }
            else {
                MdaError::from(e).at(start)
            }
        })?;
        self.pos = self.inner.stream_position().map_err(|e| MdaError::from(e).at(start))?;
        Ok(record)
    }

    /// Read a length word and return it as a byte count, rejecting negative lengths.
    fn read_length(&mut self) -> Result<usize, MdaError> {
        let offset = self.pos;
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| MdaError::corrupt(offset, format!("negative string length {}", len)))
    }

    /// Read an XDR string: a length word, that many bytes, then padding to the next 4-byte
    /// boundary. A zero length yields an empty string and consumes nothing further.
    pub fn read_string(&mut self) -> Result<String, MdaError> {
        let len = self.read_length()?;
        if len == 0 {
            return Ok(String::new());
        }
        let padded = len + xdr_padding(len);
        self.reserve(padded as u64)?;
        let mut buf = vec![0u8; padded];
        self.inner
            .read_exact(&mut buf)
            .map_err(|e| MdaError::from(e).at(self.pos))?;
        self.pos += padded as u64;
        buf.truncate(len);
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Read an MDA optional string: a length word, followed by an XDR string only when the length
    /// word is non-zero.
    pub fn read_optional_string(&mut self) -> Result<String, MdaError> {
        match self.read_i32()? {
            0 => Ok(String::new()),
            _ => self.read_string(),
        }
    }

    /// Step over an MDA optional string without decoding it.
    pub fn skip_optional_string(&mut self) -> Result<(), MdaError> {
        if self.read_i32()? != 0 {
            let len = self.read_length()?;
            let padded = (len + xdr_padding(len)) as u64;
            self.reserve(padded)?;
            self.seek(self.pos + padded)?;
        }
        Ok(())
    }

    pub fn read_i32_array(&mut self, n: usize) -> Result<Vec<i32>, MdaError> {
        self.reserve((n as u64).saturating_mul(4))?;
        let values = self
            .codec
            .read_i32_array(&mut self.inner, n)
            .map_err(|e| e.at(self.pos))?;
        self.pos += n as u64 * 4;
        Ok(values)
    }

    pub fn read_f32_array(&mut self, n: usize) -> Result<Vec<f32>, MdaError> {
        self.reserve((n as u64).saturating_mul(4))?;
        let values = self
            .codec
            .read_f32_array(&mut self.inner, n)
            .map_err(|e| e.at(self.pos))?;
        self.pos += n as u64 * 4;
        Ok(values)
    }

    pub fn read_f64_array(&mut self, n: usize) -> Result<Vec<f64>, MdaError> {
        self.reserve((n as u64).saturating_mul(8))?;
        let values = self
            .codec
            .read_f64_array(&mut self.inner, n)
            .map_err(|e| e.at(self.pos))?;
        self.pos += n as u64 * 8;
        Ok(values)
    }
}
