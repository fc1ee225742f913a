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

    src/records.rs

    Fixed-layout record groups of the MDA format, defined with binrw.
*/

//! Fixed-layout groups of the MDA wire format.

use binrw::binrw;

/// The fixed prefix of the file header. It is followed by `rank` planned point counts, the
/// isRegular flag and the extra-PV offset.
#[derive(Debug)]
#[binrw]
#[brw(big)]
pub(crate) struct FileHeaderPrefix {
    pub version: f32,
    pub scan_number: i32,
    pub rank: i32,
}

/// Written after the planned point counts.
#[derive(Debug)]
#[binrw]
#[brw(big)]
pub(crate) struct FileHeaderSuffix {
    pub is_regular: i32,
    pub extra_pv_offset: i32,
}

/// The first three words of every scan record.
#[derive(Debug)]
#[binrw]
#[brw(big)]
pub(crate) struct ScanPreamble {
    pub rank: i32,
    pub requested_points: i32,
    pub acquired_points: i32,
}

/// Positioner, detector and trigger counts, following the scan name and timestamp.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[binrw]
#[brw(big)]
pub(crate) struct ChannelCounts {
    pub positioners: i32,
    pub detectors: i32,
    pub triggers: i32,
}

/// Size of the file header for a file of the given rank.
pub(crate) fn file_header_len(rank: usize) -> u64 {
    // version, scan number, rank, dimensions, isRegular, extra PV offset
    (4 + 4 + 4 + 4 * rank + 4 + 4) as u64
}
