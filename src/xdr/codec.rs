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

    src/xdr/codec.rs

    Array conversion strategies for XDR data blocks.
*/

use crate::{
    io::{Read, ReadSeek, Write, WriteSeek},
    MdaError,
};
use binrw::{BinRead, BinWrite};
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A strategy for converting runs of XDR array elements to and from native values.
///
/// Row data blocks in an MDA file can hold millions of values, so how they are converted matters
/// for large files. The codec is chosen by the caller and handed to the decoder or encoder
/// through [DecodeOptions](crate::DecodeOptions) / [EncodeOptions](crate::EncodeOptions).
///
/// Implementations may assume the caller has already verified that `n` elements are available in
/// the source.
pub trait XdrCodec: DynClone + Debug + Send + Sync {
    /// A short name for logging.
    fn name(&self) -> &'static str;
    fn read_i32_array(&self, src: &mut dyn ReadSeek, n: usize) -> Result<Vec<i32>, MdaError>;
    fn read_f32_array(&self, src: &mut dyn ReadSeek, n: usize) -> Result<Vec<f32>, MdaError>;
    fn read_f64_array(&self, src: &mut dyn ReadSeek, n: usize) -> Result<Vec<f64>, MdaError>;
    fn write_i32_array(&self, dst: &mut dyn WriteSeek, values: &[i32]) -> Result<(), MdaError>;
    fn write_f32_array(&self, dst: &mut dyn WriteSeek, values: &[f32]) -> Result<(), MdaError>;
    fn write_f64_array(&self, dst: &mut dyn WriteSeek, values: &[f64]) -> Result<(), MdaError>;
}

dyn_clone::clone_trait_object!(XdrCodec);

/// Converts array elements one at a time through binrw.
#[derive(Copy, Clone, Debug, Default)]
pub struct ScalarCodec;

fn read_each<T>(mut src: &mut dyn ReadSeek, n: usize) -> Result<Vec<T>, MdaError>
where
    T: BinRead,
    for<'a> T::Args<'a>: Default,
{
    let mut values = Vec::with_capacity(n);
    for _ in 0..n {
        values.push(T::read_be(&mut src)?);
    }
    Ok(values)
}

fn write_each<T>(mut dst: &mut dyn WriteSeek, values: &[T]) -> Result<(), MdaError>
where
    T: BinWrite,
    for<'a> T::Args<'a>: Default,
{
    for value in values {
        value.write_be(&mut dst)?;
    }
    Ok(())
}

impl XdrCodec for ScalarCodec {
    fn name(&self) -> &'static str {
        "scalar"
    }

    fn read_i32_array(&self, src: &mut dyn ReadSeek, n: usize) -> Result<Vec<i32>, MdaError> {
        read_each(src, n)
    }

    fn read_f32_array(&self, src: &mut dyn ReadSeek, n: usize) -> Result<Vec<f32>, MdaError> {
        read_each(src, n)
    }

    fn read_f64_array(&self, src: &mut dyn ReadSeek, n: usize) -> Result<Vec<f64>, MdaError> {
        read_each(src, n)
    }

    fn write_i32_array(&self, dst: &mut dyn WriteSeek, values: &[i32]) -> Result<(), MdaError> {
        write_each(dst, values)
    }

    fn write_f32_array(&self, dst: &mut dyn WriteSeek, values: &[f32]) -> Result<(), MdaError> {
        write_each(dst, values)
    }

    fn write_f64_array(&self, dst: &mut dyn WriteSeek, values: &[f64]) -> Result<(), MdaError> {
        write_each(dst, values)
    }
}

/// Reads or writes a whole array as one block and converts it in memory. This is the default
/// codec and is considerably faster than [ScalarCodec] on large row data blocks.
#[derive(Copy, Clone, Debug, Default)]
pub struct BulkCodec;

impl XdrCodec for BulkCodec {
    fn name(&self) -> &'static str {
        "bulk"
    }

    fn read_i32_array(&self, src: &mut dyn ReadSeek, n: usize) -> Result<Vec<i32>, MdaError> {
        let mut buf = vec![0u8; n * 4];
        src.read_exact(&mut buf)?;
        Ok(bytemuck::cast_slice::<u8, [u8; 4]>(&buf)
            .iter()
            .map(|word| i32::from_be_bytes(*word))
            .collect())
    }

    fn read_f32_array(&self, src: &mut dyn ReadSeek, n: usize) -> Result<Vec<f32>, MdaError> {
        let mut buf = vec![0u8; n * 4];
        src.read_exact(&mut buf)?;
        Ok(bytemuck::cast_slice::<u8, [u8; 4]>(&buf)
            .iter()
            .map(|word| f32::from_be_bytes(*word))
            .collect())
    }

    fn read_f64_array(&self, src: &mut dyn ReadSeek, n: usize) -> Result<Vec<f64>, MdaError> {
        let mut buf = vec![0u8; n * 8];
        src.read_exact(&mut buf)?;
        Ok(bytemuck::cast_slice::<u8, [u8; 8]>(&buf)
            .iter()
            .map(|word| f64::from_be_bytes(*word))
            .collect())
    }

    fn write_i32_array(&self, dst: &mut dyn WriteSeek, values: &[i32]) -> Result<(), MdaError> {
        let words: Vec<[u8; 4]> = values.iter().map(|v| v.to_be_bytes()).collect();
        dst.write_all(bytemuck::cast_slice(&words))?;
        Ok(())
    }

    fn write_f32_array(&self, dst: &mut dyn WriteSeek, values: &[f32]) -> Result<(), MdaError> {
        let words: Vec<[u8; 4]> = values.iter().map(|v| v.to_be_bytes()).collect();
        dst.write_all(bytemuck::cast_slice(&words))?;
        Ok(())
    }

    fn write_f64_array(&self, dst: &mut dyn WriteSeek, values: &[f64]) -> Result<(), MdaError> {
        let words: Vec<[u8; 8]> = values.iter().map(|v| v.to_be_bytes()).collect();
        dst.write_all(bytemuck::cast_slice(&words))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{Cursor, Seek, SeekFrom};

    fn codecs() -> Vec<Box<dyn XdrCodec>> {
        vec![Box::new(ScalarCodec), Box::new(BulkCodec)]
    }

    #[test]
    fn test_f64_big_endian_layout() {
        for codec in codecs() {
            let mut out = Cursor::new(Vec::new());
            codec.write_f64_array(&mut out, &[1.0]).unwrap();
            assert_eq!(out.into_inner(), vec![0x3F, 0xF0, 0, 0, 0, 0, 0, 0], "codec {}", codec.name());
        }
    }

    #[test]
    fn test_codecs_agree() {
        let ints = [0, 1, -1, i32::MAX, i32::MIN, 0x1234_5678];
        let floats = [0.0f32, -2.5, 1.0e-7, f32::MAX];
        let doubles = [0.0f64, 3.25, -1.0e300, std::f64::consts::PI];

        let mut encoded: Vec<Vec<u8>> = Vec::new();
        for codec in codecs() {
            let mut out = Cursor::new(Vec::new());
            codec.write_i32_array(&mut out, &ints).unwrap();
            codec.write_f32_array(&mut out, &floats).unwrap();
            codec.write_f64_array(&mut out, &doubles).unwrap();
            encoded.push(out.into_inner());
        }
        assert_eq!(encoded[0], encoded[1]);
        assert_eq!(encoded[0].len(), ints.len() * 4 + floats.len() * 4 + doubles.len() * 8);

        for codec in codecs() {
            let mut src = Cursor::new(encoded[0].clone());
            src.seek(SeekFrom::Start(0)).unwrap();
            assert_eq!(codec.read_i32_array(&mut src, ints.len()).unwrap(), ints);
            assert_eq!(codec.read_f32_array(&mut src, floats.len()).unwrap(), floats);
            assert_eq!(codec.read_f64_array(&mut src, doubles.len()).unwrap(), doubles);
        }
    }

    #[test]
    fn test_boxed_codec_clones() {
        let codec: Box<dyn XdrCodec> = Box::new(BulkCodec);
        let copy = codec.clone();
        assert_eq!(copy.name(), "bulk");
    }
}
