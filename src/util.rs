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

    src/util.rs

    Miscellaneous utility functions.
*/

use crate::{
    io::{Seek, SeekFrom},
    xdr::XDR_UNIT,
};

/// Return the total length of a seekable source. The stream position is restored afterwards.
pub(crate) fn get_length<T: Seek>(source: &mut T) -> Result<u64, crate::io::Error> {
    let pos = source.stream_position()?;
    // Seek to the end of the source
    let length = source.seek(SeekFrom::End(0))?;
    // Seek back to where we were
    source.seek(SeekFrom::Start(pos))?;
    Ok(length)
}

/// The number of zero bytes that follow `len` bytes of string data to reach a 4-byte boundary.
#[inline]
pub(crate) fn xdr_padding(len: usize) -> usize {
    (XDR_UNIT - (len % XDR_UNIT)) % XDR_UNIT
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::Cursor;

    #[test]
    fn test_xdr_padding() {
        assert_eq!(xdr_padding(0), 0);
        assert_eq!(xdr_padding(1), 3);
        assert_eq!(xdr_padding(2), 2);
        assert_eq!(xdr_padding(3), 1);
        assert_eq!(xdr_padding(4), 0);
        assert_eq!(xdr_padding(13), 3);
    }

    #[test]
    fn test_get_length_restores_position() {
        let mut cursor = Cursor::new(vec![0u8; 37]);
        cursor.seek(SeekFrom::Start(11)).unwrap();
        assert_eq!(get_length(&mut cursor).unwrap(), 37);
        assert_eq!(cursor.position(), 11);
    }
}
