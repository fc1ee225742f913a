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

    src/file_reader.rs

    Decoding of complete MDA files.
*/

//! Decoding of complete MDA files.

use crate::{
    diagnostics::Diagnostic,
    extra_pv::read_extra_pvs,
    io::{BufReader, ReadSeek},
    levels::build_levels,
    records::{FileHeaderPrefix, FileHeaderSuffix},
    scan_reader::{read_scan, read_scan_quick, LevelTemplate, QuickRead},
    types::{env::describe_levels, FileHeader, MdaFile, ScanDimension, ScanLevel},
    xdr::{BulkCodec, XdrCodec, XdrReader},
    MdaError,
    CORRUPT_RANK_LIMIT,
    MAXIMUM_RANK,
    MDA_VERSION,
    MDA_VERSION_TOLERANCE,
};
use std::{fs::File, path::Path};

/// Options controlling how a file is decoded.
#[derive(Clone, Debug)]
pub struct DecodeOptions {
    /// Number of scan levels to read, starting from the outermost. Deeper records are not visited.
    pub max_rank: usize,
    /// Decode records after the first at each level without decoding their header strings,
    /// borrowing channel metadata from the first record instead.
    pub quick: bool,
    /// The array conversion strategy.
    pub codec: Box<dyn XdrCodec>,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_rank: MAXIMUM_RANK,
            quick: false,
            codec: Box::new(BulkCodec),
        }
    }
}

impl DecodeOptions {
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the number of levels to read. Values are clamped to 1 through [MAXIMUM_RANK].
    pub fn with_max_rank(mut self, max_rank: usize) -> Self {
        self.max_rank = max_rank.clamp(1, MAXIMUM_RANK);
        self
    }

    pub fn with_quick(mut self, quick: bool) -> Self {
        self.quick = quick;
        self
    }

    pub fn with_codec(mut self, codec: impl XdrCodec + 'static) -> Self {
        self.codec = Box::new(codec);
        self
    }
}

/// The result of decoding a file.
#[derive(Clone, Debug)]
pub struct Decoded {
    /// The scan record tree and extra PVs as stored.
    pub file: MdaFile,
    /// Per-dimension views of the channel data, outermost first.
    pub levels: Vec<ScanLevel>,
    /// Recoverable problems found while decoding.
    pub diagnostics: Vec<Diagnostic>,
}

impl Decoded {
    /// Returns true if the file was decoded with warnings.
    pub fn is_degraded(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn level(&self, level: usize) -> Option<&ScanLevel> {
        self.levels.get(level)
    }

    /// Fill empty channel descriptions from the extra PVs, in both the tree and the level views.
    pub fn with_env_descriptions(mut self) -> Self {
        describe_levels(&mut self.levels, &self.file.extra_pvs);
        self.file = self.file.with_env_descriptions();
        self
    }
}

/// Read and check the file header at the start of the source. Leaves the reader positioned at
/// the root scan record.
pub(crate) fn read_file_header<R: ReadSeek>(xdr: &mut XdrReader<R>) -> Result<FileHeader, MdaError> {
    xdr.seek(0)?;
    let prefix: FileHeaderPrefix = xdr.read_record()?;

    // NaN fails this comparison too.
    let version_ok = (prefix.version - MDA_VERSION).abs() <= MDA_VERSION_TOLERANCE;
    if !version_ok {
        return Err(MdaError::VersionMismatch {
            version: prefix.version,
        });
    }
    if prefix.rank < 0 || prefix.rank > CORRUPT_RANK_LIMIT {
        return Err(MdaError::corrupt(8, format!("file rank {} is out of range", prefix.rank)));
    }
    if prefix.rank == 0 || prefix.rank as usize > MAXIMUM_RANK {
        return Err(MdaError::UnsupportedRank {
            offset: 8,
            rank: prefix.rank,
        });
    }

    let rank = prefix.rank as usize;
    let dimensions = xdr.read_i32_array(rank)?;
    let suffix_offset = xdr.position();
    let suffix: FileHeaderSuffix = xdr.read_record()?;
    let extra_pv_offset = u32::try_from(suffix.extra_pv_offset).map_err(|_| {
        MdaError::corrupt(
            suffix_offset + 4,
            format!("negative extra PV offset {}", suffix.extra_pv_offset),
        )
    })?;

    log::debug!(
        "read_file_header(): version {:.2} scan {} rank {} dimensions {:?} extra PVs at {:#x}",
        prefix.version,
        prefix.scan_number,
        rank,
        dimensions,
        extra_pv_offset
    );
    Ok(FileHeader {
        version: prefix.version,
        scan_number: prefix.scan_number,
        rank,
        dimensions,
        is_regular: suffix.is_regular != 0,
        extra_pv_offset,
    })
}

struct TreeReader<'x, 'c, R> {
    xdr: &'x mut XdrReader<'c, R>,
    max_rank: usize,
    quick: bool,
    templates: Vec<LevelTemplate>,
    diagnostics: Vec<Diagnostic>,
}

impl<R: ReadSeek> TreeReader<'_, '_, R> {
    fn read_record(&mut self, offset: u64, depth: usize) -> Result<ScanDimension, MdaError> {
        if self.quick {
            if let Some(template) = self.templates.get(depth) {
                match read_scan_quick(self.xdr, offset, template)? {
                    QuickRead::Done(scan, _) => return Ok(scan),
                    QuickRead::Drift { expected, actual } => {
                        log::warn!(
                            "read_record(): level {} record at {:#x} has data at {:#x}, expected {:#x}; reading in full",
                            depth,
                            offset,
                            actual,
                            expected
                        );
                        self.diagnostics.push(Diagnostic::HeaderDrift {
                            level: depth,
                            offset,
                            expected,
                            actual,
                        });
                    }
                }
            }
        }

        let (scan, layout) = read_scan(self.xdr, offset)?;
        if depth == self.templates.len() {
            self.templates.push(LevelTemplate::new(&scan, &layout));
        }
        Ok(scan)
    }

    /// Decode the record at `offset` and, within the configured depth, all records below it.
    fn read_node(&mut self, offset: u64, depth: usize, expected_rank: usize) -> Result<ScanDimension, MdaError> {
        let mut scan = self.read_record(offset, depth)?;
        if scan.rank != expected_rank {
            return Err(MdaError::corrupt(
                offset,
                format!("expected a rank {} record, found rank {}", expected_rank, scan.rank),
            ));
        }

        if scan.rank > 1 && depth + 1 < self.max_rank {
            let mut children = Vec::with_capacity(scan.acquired_points);
            // Offsets past the acquired points are never valid.
            for &child_offset in &scan.child_offsets[..scan.acquired_points] {
                if child_offset <= 0 || child_offset as u64 >= self.xdr.len() {
                    return Err(MdaError::corrupt(
                        offset,
                        format!("child offset {:#x} lies outside the file", child_offset),
                    ));
                }
                children.push(self.read_node(child_offset as u64, depth + 1, scan.rank - 1)?);
            }
            scan.children = children;
        }
        Ok(scan)
    }
}

/// Decode a complete MDA file from a seekable source.
pub fn decode_reader<R: ReadSeek>(reader: R, options: &DecodeOptions) -> Result<Decoded, MdaError> {
    let mut xdr = XdrReader::new(reader, options.codec.as_ref())?;
    log::debug!(
        "decode_reader(): {} bytes, max rank {}, quick: {}, codec: {}",
        xdr.len(),
        options.max_rank,
        options.quick,
        options.codec.name()
    );

    let header = read_file_header(&mut xdr)?;
    let root_offset = xdr.position();

    let mut tree = TreeReader {
        xdr: &mut xdr,
        max_rank: options.max_rank,
        quick: options.quick,
        templates: Vec::new(),
        diagnostics: Vec::new(),
    };
    let scan = tree.read_node(root_offset, 0, header.rank)?;
    let mut diagnostics = tree.diagnostics;

    let extra_pvs = match header.extra_pv_offset {
        0 => Vec::new(),
        offset => read_extra_pvs(&mut xdr, offset as u64)?,
    };

    let levels = build_levels(&scan, &mut diagnostics);
    Ok(Decoded {
        file: MdaFile {
            header,
            scan,
            extra_pvs,
        },
        levels,
        diagnostics,
    })
}

/// Decode the file at `path` with the given options.
pub fn decode_file_with(path: impl AsRef<Path>, options: &DecodeOptions) -> Result<Decoded, MdaError> {
    let path = path.as_ref();
    log::debug!("decode_file_with(): opening {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    decode_reader(reader, options)
}

/// Decode the file at `path`, reading at most `max_rank` levels of nesting.
pub fn decode_file(path: impl AsRef<Path>, max_rank: usize) -> Result<Decoded, MdaError> {
    decode_file_with(path, &DecodeOptions::new().with_max_rank(max_rank))
}
