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

    src/xdr/mod.rs

    XDR primitive encoding.
*/

//! Primitive XDR (RFC 1832) encoding used by MDA files: big-endian 4-byte integers, IEEE floats
//! and doubles, and length-prefixed strings padded to a 4-byte boundary.
//!
//! [XdrReader] and [XdrWriter] are cursors over a seekable source or sink. Runs of array elements
//! are converted by an [XdrCodec] strategy supplied by the caller.

mod codec;
mod reader;
mod writer;

pub use codec::{BulkCodec, ScalarCodec, XdrCodec};
pub use reader::XdrReader;
pub use writer::XdrWriter;

/// The XDR basic block size. Every encoded item occupies a multiple of this many bytes.
pub const XDR_UNIT: usize = 4;
