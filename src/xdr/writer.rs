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

    src/xdr/writer.rs

    An XDR write cursor.
*/

use crate::{
    io::{Seek, Write, WriteSeek},
    util::xdr_padding,
    xdr::XdrCodec,
    MdaError,
};
use binrw::BinWrite;

const PADDING: [u8; 3] = [0; 3];

/// A write cursor producing an XDR stream. Mirrors [XdrReader](crate::xdr::XdrReader).
pub struct XdrWriter<'c, W> {
    inner: W,
    codec: &'c dyn XdrCodec,
}

impl<'c, W: WriteSeek> XdrWriter<'c, W> {
    pub fn new(inner: W, codec: &'c dyn XdrCodec) -> Self {
        Self { inner, codec }
    }

    pub fn position(&mut self) -> Result<u64, MdaError> {
        Ok(self.inner.stream_position()?)
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn write_i32(&mut self, value: i32) -> Result<(), MdaError> {
        Ok(value.write_be(&mut self.inner)?)
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), MdaError> {
        Ok(value.write_be(&mut self.inner)?)
    }

    pub fn write_f64(&mut self, value: f64) -> Result<(), MdaError> {
        Ok(value.write_be(&mut self.inner)?)
    }

    /// Write a fixed-layout binrw structure.
    pub fn write_record<T>(&mut self, record: &T) -> Result<(), MdaError>
    where
        T: BinWrite,
        for<'a> T::Args<'a>: Default,
    {
        Ok(record.write_be(&mut self.inner)?)
    }

    /// Write a length word and check it fits in an XDR int.
    pub fn write_len(&mut self, len: usize) -> Result<(), MdaError> {
        let len = i32::try_from(len).map_err(|_| MdaError::InvalidModel(format!("length {} exceeds i32", len)))?;
        self.write_i32(len)
    }

    /// Write an XDR string: length word, bytes, zero padding to a 4-byte boundary.
    pub fn write_string(&mut self, value: &str) -> Result<(), MdaError> {
        let bytes = value.as_bytes();
        self.write_len(bytes.len())?;
        self.inner.write_all(bytes)?;
        self.inner.write_all(&PADDING[..xdr_padding(bytes.len())])?;
        Ok(())
    }

    /// Write an MDA optional string: the byte length, then the XDR string only if non-empty.
    pub fn write_optional_string(&mut self, value: &str) -> Result<(), MdaError> {
        self.write_len(value.len())?;
        if !value.is_empty() {
            self.write_string(value)?;
        }
        Ok(())
    }

    pub fn write_i32_array(&mut self, values: &[i32]) -> Result<(), MdaError> {
        self.codec.write_i32_array(&mut self.inner, values)
    }

    pub fn write_f32_array(&mut self, values: &[f32]) -> Result<(), MdaError> {
        self.codec.write_f32_array(&mut self.inner, values)
    }

    pub fn write_f64_array(&mut self, values: &[f64]) -> Result<(), MdaError> {
        self.codec.write_f64_array(&mut self.inner, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        io::Cursor,
        xdr::{BulkCodec, XdrReader},
    };

    #[test]
    fn test_string_padding() {
        let mut xdr = XdrWriter::new(Cursor::new(Vec::new()), &BulkCodec);
        xdr.write_string("abcde").unwrap();
        xdr.write_string("").unwrap();
        xdr.write_string("wxyz").unwrap();
        let bytes = xdr.into_inner().into_inner();
        assert_eq!(
            bytes,
            vec![0, 0, 0, 5, b'a', b'b', b'c', b'd', b'e', 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 4, b'w', b'x', b'y', b'z']
        );
    }

    #[test]
    fn test_optional_string_read_back() {
        let mut xdr = XdrWriter::new(Cursor::new(Vec::new()), &BulkCodec);
        xdr.write_optional_string("LINEAR").unwrap();
        xdr.write_optional_string("").unwrap();
        xdr.write_f32(1.5).unwrap();
        let bytes = xdr.into_inner().into_inner();
        assert_eq!(bytes.len(), 4 + 4 + 8 + 4 + 4);

        let mut xdr = XdrReader::new(Cursor::new(bytes), &BulkCodec).unwrap();
        assert_eq!(xdr.read_optional_string().unwrap(), "LINEAR");
        assert_eq!(xdr.read_optional_string().unwrap(), "");
        assert_eq!(xdr.read_f32().unwrap(), 1.5);
    }
}
