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

    src/scan_reader.rs

    Decoding of individual scan records.
*/

//! Decoding of a single scan record.

use crate::{
    io::ReadSeek,
    records::{ChannelCounts, ScanPreamble},
    types::{Detector, DetectorInfo, Positioner, PositionerInfo, ScanDimension, Trigger},
    xdr::XdrReader,
    MdaError,
    CORRUPT_RANK_LIMIT,
};

/// Where the variable-length parts of a scan record were found.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct ScanLayout {
    /// Offset of the record itself.
    pub offset: u64,
    /// Offset of the first detector header, directly after the positioner headers.
    pub detector_offset: u64,
    /// Offset of the row data block.
    pub data_offset: u64,
}

impl ScanLayout {
    pub(crate) fn det_to_data(&self) -> u64 {
        self.data_offset - self.detector_offset
    }
}

/// The part of a scan record read by every decoder, up to and including the channel counts.
#[derive(Debug)]
pub(crate) struct ScanHead {
    pub rank: usize,
    pub requested_points: usize,
    pub acquired_points: usize,
    pub child_offsets: Vec<i32>,
    pub name: String,
    pub timestamp: String,
    pub counts: ChannelCounts,
}

impl ScanHead {
    pub(crate) fn positioners(&self) -> usize {
        self.counts.positioners as usize
    }

    pub(crate) fn detectors(&self) -> usize {
        self.counts.detectors as usize
    }

    pub(crate) fn triggers(&self) -> usize {
        self.counts.triggers as usize
    }
}

/// Read the scan record header at `offset` up to the channel counts.
pub(crate) fn read_scan_head<R: ReadSeek>(xdr: &mut XdrReader<R>, offset: u64) -> Result<ScanHead, MdaError> {
    xdr.seek(offset)?;
    let preamble: ScanPreamble = xdr.read_record()?;

    if preamble.rank < 0 || preamble.rank > CORRUPT_RANK_LIMIT {
        return Err(MdaError::corrupt(offset, format!("rank {} is out of range", preamble.rank)));
    }
    if preamble.requested_points < 0 || preamble.acquired_points < 0 {
        return Err(MdaError::corrupt(
            offset,
            format!(
                "negative point count ({} requested, {} acquired)",
                preamble.requested_points, preamble.acquired_points
            ),
        ));
    }
    if preamble.acquired_points > preamble.requested_points {
        return Err(MdaError::corrupt(
            offset,
            format!(
                "{} points acquired but only {} requested",
                preamble.acquired_points, preamble.requested_points
            ),
        ));
    }

    let rank = preamble.rank as usize;
    let requested_points = preamble.requested_points as usize;
    let child_offsets = if rank > 1 {
        xdr.read_i32_array(requested_points)?
    }
    else {
        Vec::new()
    };

    let name = xdr.read_optional_string()?;
    let timestamp = xdr.read_optional_string()?;

    let counts_offset = xdr.position();
    let counts: ChannelCounts = xdr.read_record()?;
    if counts.positioners < 0 || counts.detectors < 0 || counts.triggers < 0 {
        return Err(MdaError::corrupt(counts_offset, format!("negative channel count {:?}", counts)));
    }

    Ok(ScanHead {
        rank,
        requested_points,
        acquired_points: preamble.acquired_points as usize,
        child_offsets,
        name,
        timestamp,
        counts,
    })
}

fn read_positioner_info<R: ReadSeek>(xdr: &mut XdrReader<R>) -> Result<PositionerInfo, MdaError> {
    Ok(PositionerInfo {
        number: xdr.read_i32()?,
        pv_name: xdr.read_optional_string()?,
        description: xdr.read_optional_string()?,
        step_mode: xdr.read_optional_string()?,
        unit: xdr.read_optional_string()?,
        readback_pv_name: xdr.read_optional_string()?,
        readback_description: xdr.read_optional_string()?,
        readback_unit: xdr.read_optional_string()?,
    })
}

fn read_detector_info<R: ReadSeek>(xdr: &mut XdrReader<R>) -> Result<DetectorInfo, MdaError> {
    Ok(DetectorInfo {
        number: xdr.read_i32()?,
        pv_name: xdr.read_optional_string()?,
        description: xdr.read_optional_string()?,
        unit: xdr.read_optional_string()?,
    })
}

fn read_trigger<R: ReadSeek>(xdr: &mut XdrReader<R>) -> Result<Trigger, MdaError> {
    Ok(Trigger {
        number: xdr.read_i32()?,
        pv_name: xdr.read_optional_string()?,
        command: xdr.read_f32()?,
    })
}

/// Split a channel-major block into one vector per channel.
fn split_channels<T: Clone>(block: Vec<T>, channels: usize, points: usize) -> Vec<Vec<T>> {
    if points == 0 {
        return vec![Vec::new(); channels];
    }
    block.chunks(points).map(|c| c.to_vec()).collect()
}

/// Read the row data block at the current position: all positioner values, then all detector
/// values, each grouped by channel.
fn read_row_data<R: ReadSeek>(
    xdr: &mut XdrReader<R>,
    acquired: usize,
    n_pos: usize,
    n_det: usize,
) -> Result<(Vec<Vec<f64>>, Vec<Vec<f32>>), MdaError> {
    let offset = xdr.position();
    let n_pos_values = n_pos
        .checked_mul(acquired)
        .ok_or_else(|| MdaError::corrupt(offset, "positioner data size overflows"))?;
    let n_det_values = n_det
        .checked_mul(acquired)
        .ok_or_else(|| MdaError::corrupt(offset, "detector data size overflows"))?;

    let pos_block = xdr.read_f64_array(n_pos_values)?;
    let det_block = xdr.read_f32_array(n_det_values)?;
    Ok((
        split_channels(pos_block, n_pos, acquired),
        split_channels(det_block, n_det, acquired),
    ))
}

/// Decode the complete scan record at `offset`. Child records are not followed.
pub(crate) fn read_scan<R: ReadSeek>(
    xdr: &mut XdrReader<R>,
    offset: u64,
) -> Result<(ScanDimension, ScanLayout), MdaError> {
    let head = read_scan_head(xdr, offset)?;

    let mut positioner_info = Vec::new();
    for _ in 0..head.positioners() {
        positioner_info.push(read_positioner_info(xdr)?);
    }
    let detector_offset = xdr.position();
    let mut detector_info = Vec::new();
    for _ in 0..head.detectors() {
        detector_info.push(read_detector_info(xdr)?);
    }
    let mut triggers = Vec::new();
    for _ in 0..head.triggers() {
        triggers.push(read_trigger(xdr)?);
    }
    let data_offset = xdr.position();

    let (pos_data, det_data) = read_row_data(xdr, head.acquired_points, head.positioners(), head.detectors())?;
    log::trace!(
        "read_scan(): rank {} at {:#x}: {}/{} points, {} positioners, {} detectors, {} triggers",
        head.rank,
        offset,
        head.acquired_points,
        head.requested_points,
        head.positioners(),
        head.detectors(),
        head.triggers()
    );

    let dimension = assemble(head, positioner_info, detector_info, triggers, pos_data, det_data);
    Ok((
        dimension,
        ScanLayout {
            offset,
            detector_offset,
            data_offset,
        },
    ))
}

fn assemble(
    head: ScanHead,
    positioner_info: Vec<PositionerInfo>,
    detector_info: Vec<DetectorInfo>,
    triggers: Vec<Trigger>,
    pos_data: Vec<Vec<f64>>,
    det_data: Vec<Vec<f32>>,
) -> ScanDimension {
    ScanDimension {
        rank: head.rank,
        requested_points: head.requested_points,
        acquired_points: head.acquired_points,
        name: head.name,
        timestamp: head.timestamp,
        positioners: positioner_info
            .into_iter()
            .zip(pos_data)
            .map(|(info, data)| Positioner { info, data })
            .collect(),
        detectors: detector_info
            .into_iter()
            .zip(det_data)
            .map(|(info, data)| Detector { info, data })
            .collect(),
        triggers,
        child_offsets: head.child_offsets,
        children: Vec::new(),
    }
}

/// Channel metadata and header geometry of the first record read at a level. Later records at
/// the same level are expected to repeat it.
#[derive(Clone, Debug)]
pub(crate) struct LevelTemplate {
    pub counts: ChannelCounts,
    pub positioners: Vec<PositionerInfo>,
    pub detectors: Vec<DetectorInfo>,
    pub triggers: Vec<Trigger>,
    pub det_to_data: u64,
}

impl LevelTemplate {
    pub(crate) fn new(scan: &ScanDimension, layout: &ScanLayout) -> Self {
        Self {
            counts: ChannelCounts {
                positioners: scan.positioners.len() as i32,
                detectors: scan.detectors.len() as i32,
                triggers: scan.triggers.len() as i32,
            },
            positioners: scan.positioner_info().cloned().collect(),
            detectors: scan.detector_info().cloned().collect(),
            triggers: scan.triggers.clone(),
            det_to_data: layout.det_to_data(),
        }
    }
}

#[derive(Debug)]
pub(crate) enum QuickRead {
    Done(ScanDimension, ScanLayout),
    /// The record's headers did not match the template. Nothing was decoded.
    Drift { expected: u64, actual: u64 },
}

/// Decode the scan record at `offset` without decoding its header strings. The channel headers are
/// stepped over by length and the resulting data offset checked against the template's geometry.
/// On a match the record borrows its channel metadata from the template.
pub(crate) fn read_scan_quick<R: ReadSeek>(
    xdr: &mut XdrReader<R>,
    offset: u64,
    template: &LevelTemplate,
) -> Result<QuickRead, MdaError> {
    let head = read_scan_head(xdr, offset)?;

    // Strings are skipped; numbers and trigger commands are kept per record. A count that
    // differs from the template shows up as drift below.
    let mut positioners = template.positioners.clone();
    for i in 0..head.positioners() {
        let number = xdr.read_i32()?;
        for _ in 0..7 {
            xdr.skip_optional_string()?;
        }
        if let Some(info) = positioners.get_mut(i) {
            info.number = number;
        }
    }
    let detector_offset = xdr.position();
    let mut detectors = template.detectors.clone();
    for i in 0..head.detectors() {
        let number = xdr.read_i32()?;
        for _ in 0..3 {
            xdr.skip_optional_string()?;
        }
        if let Some(info) = detectors.get_mut(i) {
            info.number = number;
        }
    }
    let mut triggers = template.triggers.clone();
    for i in 0..head.triggers() {
        let number = xdr.read_i32()?;
        xdr.skip_optional_string()?;
        let command = xdr.read_f32()?;
        if let Some(trigger) = triggers.get_mut(i) {
            trigger.number = number;
            trigger.command = command;
        }
    }

    let actual = xdr.position();
    let expected = detector_offset + template.det_to_data;
    if actual != expected || head.counts != template.counts {
        return Ok(QuickRead::Drift { expected, actual });
    }

    let (pos_data, det_data) = read_row_data(xdr, head.acquired_points, head.positioners(), head.detectors())?;
    let dimension = assemble(head, positioners, detectors, triggers, pos_data, det_data);
    Ok(QuickRead::Done(
        dimension,
        ScanLayout {
            offset,
            detector_offset,
            data_offset: actual,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        io::Cursor,
        xdr::{BulkCodec, XdrWriter},
    };

    fn preamble(rank: i32, requested: i32, acquired: i32) -> Vec<u8> {
        let mut xdr = XdrWriter::new(Cursor::new(Vec::new()), &BulkCodec);
        xdr.write_i32(rank).unwrap();
        xdr.write_i32(requested).unwrap();
        xdr.write_i32(acquired).unwrap();
        xdr.into_inner().into_inner()
    }

    fn read_head(bytes: Vec<u8>) -> Result<ScanHead, MdaError> {
        let mut xdr = XdrReader::new(Cursor::new(bytes), &BulkCodec).unwrap();
        read_scan_head(&mut xdr, 0)
    }

    #[test]
    fn test_rank_bounds() {
        for rank in [21, -1] {
            assert!(matches!(
                read_head(preamble(rank, 1, 1)),
                Err(MdaError::CorruptScan { offset: 0, .. })
            ));
        }
    }

    #[test]
    fn test_acquired_exceeds_requested() {
        assert!(matches!(
            read_head(preamble(1, 2, 3)),
            Err(MdaError::CorruptScan { .. })
        ));
        assert!(matches!(
            read_head(preamble(1, -2, 0)),
            Err(MdaError::CorruptScan { .. })
        ));
    }

    #[test]
    fn test_empty_record() {
        let mut bytes = preamble(1, 4, 0);
        // No name, no timestamp, no channels.
        bytes.extend_from_slice(&[0u8; 20]);
        let mut xdr = XdrReader::new(Cursor::new(bytes), &BulkCodec).unwrap();
        let (scan, layout) = read_scan(&mut xdr, 0).unwrap();
        assert_eq!(scan.acquired_points, 0);
        assert_eq!(scan.requested_points, 4);
        assert!(scan.positioners.is_empty());
        assert_eq!(layout.detector_offset, 32);
        assert_eq!(layout.det_to_data(), 0);
    }

    #[test]
    fn test_split_channels() {
        let split = split_channels(vec![1, 2, 3, 4, 5, 6], 2, 3);
        assert_eq!(split, vec![vec![1, 2, 3], vec![4, 5, 6]]);
        let split: Vec<Vec<u8>> = split_channels(Vec::new(), 3, 0);
        assert_eq!(split.len(), 3);
    }
}
