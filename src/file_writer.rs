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

    src/file_writer.rs

    Encoding of complete MDA files.
*/

//! Encoding of complete MDA files.
//!
//! A parent record stores the absolute offsets of its children, which come after it in the file.
//! The encoder therefore works in phases: every record is serialized and sized first, offsets are
//! assigned in a pre-order walk, the pointer tables are filled in from those offsets, and only
//! then is anything written to the output.

use crate::{
    extra_pv::write_extra_pvs,
    io::{BufWriter, Cursor, Write},
    records::{file_header_len, ChannelCounts, FileHeaderPrefix, FileHeaderSuffix, ScanPreamble},
    types::{MdaFile, ScanDimension},
    xdr::{BulkCodec, XdrCodec, XdrWriter},
    MdaError,
    MAXIMUM_RANK,
    MDA_VERSION,
    MDA_VERSION_TOLERANCE,
};
use std::path::Path;
use tempfile::NamedTempFile;

/// Options controlling how a file is encoded.
#[derive(Clone, Debug)]
pub struct EncodeOptions {
    /// The array conversion strategy.
    pub codec: Box<dyn XdrCodec>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            codec: Box::new(BulkCodec),
        }
    }
}

impl EncodeOptions {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_codec(mut self, codec: impl XdrCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }
}

/// The phases of an encode, in order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EncodeState {
    /// Serializing every record and measuring it.
    SizingChildren,
    /// Assigning each record its absolute offset.
    AssigningOffsets,
    /// Filling in the child offset tables.
    PatchingPointerTables,
    /// Writing the output.
    Emitting,
    Done,
}

/// A scan record serialized into its separately sized parts.
struct SizedScan<'a> {
    scan: &'a ScanDimension,
    preamble: Vec<u8>,
    header: Vec<u8>,
    data: Vec<u8>,
    offset: u64,
    table: Vec<i32>,
    children: Vec<SizedScan<'a>>,
}

impl SizedScan<'_> {
    /// Size of the pointer table. Only rank > 1 records have one.
    fn table_len(&self) -> u64 {
        if self.scan.rank > 1 {
            self.scan.requested_points as u64 * 4
        }
        else {
            0
        }
    }

    fn size(&self) -> u64 {
        (self.preamble.len() + self.header.len() + self.data.len()) as u64 + self.table_len()
    }
}

fn to_i32(value: usize, what: &str) -> Result<i32, MdaError> {
    i32::try_from(value).map_err(|_| MdaError::InvalidModel(format!("{} {} exceeds i32", what, value)))
}

/// Serializes an [MdaFile] into the on-disk layout, one phase at a time.
pub struct FileEncoder<'a> {
    file: &'a MdaFile,
    codec: Box<dyn XdrCodec>,
    state: EncodeState,
}

impl<'a> FileEncoder<'a> {
    pub fn new(file: &'a MdaFile, options: &EncodeOptions) -> Self {
        Self {
            file,
            codec: options.codec.clone(),
            state: EncodeState::SizingChildren,
        }
    }

    /// The phase the encoder is in, or stopped in if an encode failed.
    pub fn state(&self) -> EncodeState {
        self.state
    }

    fn transition(&mut self, next: EncodeState) {
        log::debug!("FileEncoder::transition(): {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn segment<F>(&self, f: F) -> Result<Vec<u8>, MdaError>
    where
        F: FnOnce(&mut XdrWriter<'_, Cursor<Vec<u8>>>) -> Result<(), MdaError>,
    {
        let mut xdr = XdrWriter::new(Cursor::new(Vec::new()), self.codec.as_ref());
        f(&mut xdr)?;
        Ok(xdr.into_inner().into_inner())
    }

    fn size_scan(&self, scan: &'a ScanDimension) -> Result<SizedScan<'a>, MdaError> {
        let preamble = self.segment(|xdr| {
            xdr.write_record(&ScanPreamble {
                rank: to_i32(scan.rank, "rank")?,
                requested_points: to_i32(scan.requested_points, "requested points")?,
                acquired_points: to_i32(scan.acquired_points, "acquired points")?,
            })
        })?;

        let header = self.segment(|xdr| {
            xdr.write_optional_string(&scan.name)?;
            xdr.write_optional_string(&scan.timestamp)?;
            xdr.write_record(&ChannelCounts {
                positioners: to_i32(scan.positioners.len(), "positioner count")?,
                detectors: to_i32(scan.detectors.len(), "detector count")?,
                triggers: to_i32(scan.triggers.len(), "trigger count")?,
            })?;
            for p in scan.positioner_info() {
                xdr.write_i32(p.number)?;
                for s in [
                    &p.pv_name,
                    &p.description,
                    &p.step_mode,
                    &p.unit,
                    &p.readback_pv_name,
                    &p.readback_description,
                    &p.readback_unit,
                ] {
                    xdr.write_optional_string(s)?;
                }
            }
            for d in scan.detector_info() {
                xdr.write_i32(d.number)?;
                xdr.write_optional_string(&d.pv_name)?;
                xdr.write_optional_string(&d.description)?;
                xdr.write_optional_string(&d.unit)?;
            }
            for t in &scan.triggers {
                xdr.write_i32(t.number)?;
                xdr.write_optional_string(&t.pv_name)?;
                xdr.write_f32(t.command)?;
            }
            Ok(())
        })?;

        let data = self.segment(|xdr| {
            for p in &scan.positioners {
                xdr.write_f64_array(&p.data)?;
            }
            for d in &scan.detectors {
                xdr.write_f32_array(&d.data)?;
            }
            Ok(())
        })?;

        let children = scan
            .children
            .iter()
            .map(|child| self.size_scan(child))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SizedScan {
            scan,
            preamble,
            header,
            data,
            offset: 0,
            table: Vec::new(),
            children,
        })
    }

    /// Encode the file into `out`, returning the number of bytes written.
    pub fn encode<W: Write>(&mut self, mut out: W) -> Result<u64, MdaError> {
        self.state = EncodeState::SizingChildren;
        validate_model(self.file)?;
        let rank = self.file.header.rank;

        let file = self.file;
        let mut root = self.size_scan(&file.scan)?;
        let extra_block = self.segment(|xdr| write_extra_pvs(xdr, &file.extra_pvs))?;

        self.transition(EncodeState::AssigningOffsets);
        let mut next = file_header_len(rank);
        assign_offsets(&mut root, &mut next);
        let extra_pv_offset = next;
        let total = extra_pv_offset + extra_block.len() as u64;
        if total > i32::MAX as u64 {
            return Err(MdaError::InvalidModel(format!(
                "encoded size {} exceeds the largest offset a file can hold",
                total
            )));
        }

        self.transition(EncodeState::PatchingPointerTables);
        patch_tables(&mut root);

        self.transition(EncodeState::Emitting);
        let header = &file.header;
        let file_header = self.segment(|xdr| {
            xdr.write_record(&FileHeaderPrefix {
                version: header.version,
                scan_number: header.scan_number,
                rank: rank as i32,
            })?;
            xdr.write_i32_array(&header.dimensions)?;
            xdr.write_record(&FileHeaderSuffix {
                is_regular: header.is_regular as i32,
                extra_pv_offset: extra_pv_offset as i32,
            })
        })?;

        out.write_all(&file_header)?;
        let mut written = file_header.len() as u64;
        written += self.emit(&root, &mut out)?;
        out.write_all(&extra_block)?;
        written += extra_block.len() as u64;
        out.flush()?;

        if written != total {
            return Err(MdaError::InvalidModel(format!(
                "wrote {} bytes but laid out {}",
                written, total
            )));
        }
        self.transition(EncodeState::Done);
        log::debug!("FileEncoder::encode(): wrote {} bytes, extra PVs at {:#x}", written, extra_pv_offset);
        Ok(written)
    }

    fn emit<W: Write>(&self, node: &SizedScan, out: &mut W) -> Result<u64, MdaError> {
        let table = self.segment(|xdr| xdr.write_i32_array(&node.table))?;
        out.write_all(&node.preamble)?;
        out.write_all(&table)?;
        out.write_all(&node.header)?;
        out.write_all(&node.data)?;
        log::trace!(
            "FileEncoder::emit(): rank {} record at {:#x}, {} bytes",
            node.scan.rank,
            node.offset,
            node.size()
        );

        let mut written = (node.preamble.len() + table.len() + node.header.len() + node.data.len()) as u64;
        for child in &node.children {
            written += self.emit(child, out)?;
        }
        Ok(written)
    }
}

fn assign_offsets(node: &mut SizedScan, next: &mut u64) {
    node.offset = *next;
    *next += node.size();
    for child in &mut node.children {
        assign_offsets(child, next);
    }
}

fn patch_tables(node: &mut SizedScan) {
    if node.scan.rank > 1 {
        let mut table: Vec<i32> = node.children.iter().map(|c| c.offset as i32).collect();
        table.resize(node.scan.requested_points, 0);
        node.table = table;
    }
    for child in &mut node.children {
        patch_tables(child);
    }
}

fn validate_scan(scan: &ScanDimension, path: &str) -> Result<(), MdaError> {
    let invalid = |what: String| -> Result<(), MdaError> { Err(MdaError::InvalidModel(format!("scan {}: {}", path, what))) };

    if scan.rank == 0 || scan.rank > MAXIMUM_RANK {
        return invalid(format!("rank {} is not supported", scan.rank));
    }
    if scan.acquired_points > scan.requested_points {
        return invalid(format!(
            "{} points acquired but only {} requested",
            scan.acquired_points, scan.requested_points
        ));
    }
    for p in &scan.positioners {
        if p.data.len() != scan.acquired_points {
            return invalid(format!(
                "positioner {} has {} values for {} points",
                p.info.number,
                p.data.len(),
                scan.acquired_points
            ));
        }
    }
    for d in &scan.detectors {
        if d.data.len() != scan.acquired_points {
            return invalid(format!(
                "detector {} has {} values for {} points",
                d.info.number,
                d.data.len(),
                scan.acquired_points
            ));
        }
    }

    if scan.rank == 1 {
        if !scan.children.is_empty() {
            return invalid("a rank 1 scan cannot have children".to_string());
        }
        return Ok(());
    }
    if scan.children.len() != scan.acquired_points {
        return invalid(format!(
            "{} children for {} acquired points",
            scan.children.len(),
            scan.acquired_points
        ));
    }
    for (i, child) in scan.children.iter().enumerate() {
        if child.rank + 1 != scan.rank {
            return invalid(format!("child {} has rank {}", i, child.rank));
        }
        validate_scan(child, &format!("{}/{}", path, i))?;
    }
    Ok(())
}

/// Check that the model describes a file that can be written and read back.
pub(crate) fn validate_model(file: &MdaFile) -> Result<(), MdaError> {
    let header = &file.header;
    let version_ok = (header.version - MDA_VERSION).abs() <= MDA_VERSION_TOLERANCE;
    if !version_ok {
        return Err(MdaError::InvalidModel(format!("version {} cannot be written", header.version)));
    }
    if header.rank == 0 || header.rank > MAXIMUM_RANK {
        return Err(MdaError::InvalidModel(format!("file rank {} is not supported", header.rank)));
    }
    if header.dimensions.len() != header.rank {
        return Err(MdaError::InvalidModel(format!(
            "{} dimensions for a rank {} file",
            header.dimensions.len(),
            header.rank
        )));
    }
    if file.scan.rank != header.rank {
        return Err(MdaError::InvalidModel(format!(
            "root scan has rank {} in a rank {} file",
            file.scan.rank, header.rank
        )));
    }
    validate_scan(&file.scan, "0")?;
    for pv in &file.extra_pvs {
        pv.validate()?;
    }
    Ok(())
}

/// Encode `file` into `writer` with the given options, returning the number of bytes written.
pub fn encode_writer<W: Write>(file: &MdaFile, writer: W, options: &EncodeOptions) -> Result<u64, MdaError> {
    FileEncoder::new(file, options).encode(writer)
}

/// Encode `file` into a new buffer.
pub fn encode_to_vec(file: &MdaFile) -> Result<Vec<u8>, MdaError> {
    let mut buf = Vec::new();
    encode_writer(file, &mut buf, &EncodeOptions::default())?;
    Ok(buf)
}

/// Encode `file` to `path` with the given options.
///
/// The file is written to a temporary file in the same directory and renamed over `path` only
/// once it is complete, so a failed encode never leaves a partial file behind.
pub fn encode_file_with(file: &MdaFile, path: impl AsRef<Path>, options: &EncodeOptions) -> Result<(), MdaError> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        encode_writer(file, &mut writer, options)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| MdaError::IoError(e.error))?;
    log::debug!("encode_file_with(): wrote {}", path.display());
    Ok(())
}

/// Encode `file` to `path`.
pub fn encode_file(file: &MdaFile, path: impl AsRef<Path>) -> Result<(), MdaError> {
    encode_file_with(file, path, &EncodeOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Detector, DetectorInfo, FileHeader};

    fn one_dimensional() -> MdaFile {
        let mut scan = ScanDimension::new(1, 4);
        scan.acquired_points = 2;
        scan.name = "xxx:scan1".into();
        scan.detectors.push(Detector {
            info: DetectorInfo::default(),
            data: vec![1.0, 2.0],
        });
        MdaFile {
            header: FileHeader::new(7, vec![4]),
            scan,
            extra_pvs: Vec::new(),
        }
    }

    #[test]
    fn test_state_reaches_done() {
        let file = one_dimensional();
        let mut encoder = FileEncoder::new(&file, &EncodeOptions::default());
        assert_eq!(encoder.state(), EncodeState::SizingChildren);
        let mut out = Vec::new();
        let written = encoder.encode(&mut out).unwrap();
        assert_eq!(encoder.state(), EncodeState::Done);
        assert_eq!(written as usize, out.len());
    }

    #[test]
    fn test_layout() {
        let bytes = encode_to_vec(&one_dimensional()).unwrap();
        // header: 4 + 4 + 4 + 4 + 4 + 4
        // record: preamble 12, name 4 + 4 + 12, time 4, counts 12, detector header 16, data 8
        // extra PV block: 4
        assert_eq!(bytes.len(), 24 + 12 + 20 + 4 + 12 + 16 + 8 + 4);
        let extra = i32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]);
        assert_eq!(extra as usize, bytes.len() - 4);
    }

    #[test]
    fn test_validation() {
        let mut file = one_dimensional();
        file.scan.detectors[0].data.push(3.0);
        assert!(matches!(encode_to_vec(&file), Err(MdaError::InvalidModel(_))));

        let mut file = one_dimensional();
        file.header.dimensions.push(1);
        assert!(matches!(encode_to_vec(&file), Err(MdaError::InvalidModel(_))));

        let mut file = one_dimensional();
        file.scan.acquired_points = 5;
        assert!(matches!(encode_to_vec(&file), Err(MdaError::InvalidModel(_))));

        let mut file = one_dimensional();
        file.header.version = 1.2;
        assert!(matches!(encode_to_vec(&file), Err(MdaError::InvalidModel(_))));
    }

    #[test]
    fn test_failed_encode_stops_in_sizing() {
        let mut file = one_dimensional();
        file.scan.rank = 2;
        file.header.rank = 2;
        file.header.dimensions = vec![4, 1];
        let mut encoder = FileEncoder::new(&file, &EncodeOptions::default());
        assert!(encoder.encode(Vec::new()).is_err());
        assert_eq!(encoder.state(), EncodeState::SizingChildren);
    }
}
