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

    src/skim.rs

    Reading the shape of a scan file without its data.
*/

//! Reading the shape of a file without its data.

use crate::{
    file_reader::read_file_header,
    io::{BufReader, ReadSeek},
    scan_reader::read_scan_head,
    types::{FileSummary, ScanSummary},
    xdr::{ScalarCodec, XdrReader},
    MdaError,
};
use std::{fs::File, path::Path};

/// Read the file header and the header of the first record at each level.
///
/// Descent follows the first child offset of each record and stops at a record that acquired no
/// points. Such a file is reported as empty, not as an error.
pub fn skim_reader<R: ReadSeek>(reader: R) -> Result<FileSummary, MdaError> {
    let mut xdr = XdrReader::new(reader, &ScalarCodec)?;
    let header = read_file_header(&mut xdr)?;

    let mut levels = Vec::new();
    let mut offset = xdr.position();
    let mut expected_rank = header.rank;
    loop {
        let head = read_scan_head(&mut xdr, offset)?;
        if head.rank != expected_rank {
            return Err(MdaError::corrupt(
                offset,
                format!("expected a rank {} record, found rank {}", expected_rank, head.rank),
            ));
        }
        log::trace!(
            "skim_reader(): level {} at {:#x}: {}/{} points",
            levels.len(),
            offset,
            head.acquired_points,
            head.requested_points
        );

        levels.push(ScanSummary {
            rank: head.rank,
            requested_points: head.requested_points,
            acquired_points: head.acquired_points,
            positioner_count: head.positioners(),
            detector_count: head.detectors(),
            trigger_count: head.triggers(),
            name: head.name,
            timestamp: head.timestamp,
        });

        if head.acquired_points == 0 {
            log::debug!("skim_reader(): level {} contains no data", levels.len() - 1);
            break;
        }
        if head.rank <= 1 {
            break;
        }

        let child_offset = head.child_offsets[0];
        if child_offset <= 0 || child_offset as u64 >= xdr.len() {
            return Err(MdaError::corrupt(
                offset,
                format!("child offset {:#x} lies outside the file", child_offset),
            ));
        }
        offset = child_offset as u64;
        expected_rank -= 1;
    }

    Ok(FileSummary { header, levels })
}

/// Skim the file at `path`.
pub fn skim_file(path: impl AsRef<Path>) -> Result<FileSummary, MdaError> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    skim_reader(reader)
}
