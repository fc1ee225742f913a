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

    src/lib.rs

    The main library crate for mdafox.
*/

//! # mdafox
//!
//! mdafox reads and writes MDA files, the multi-dimensional scan files written by the EPICS
//! `sscan` record (via the `saveData` task) at synchrotron beamlines.
//!
//! An MDA file is a big-endian XDR stream: a short file header, a tree of scan records linked by
//! absolute file offsets (one record per executed scan, up to four levels deep), and a trailing
//! block of "extra" PV values captured once per file.
//!
//! The main entry points are:
//! * [decode_file] / [decode_reader] - decode a whole file into an [MdaFile] tree plus shaped
//!   per-dimension [ScanLevel] views and a list of recoverable [Diagnostic]s.
//! * [skim_file] / [skim_reader] - read just enough of each level to report its shape.
//! * [encode_file] / [encode_writer] - serialize an [MdaFile] back into the on-disk layout.
//! * [MdaFile::combine], [MdaFile::apply_scalar] and [MdaFile::fixed] - detector arithmetic and
//!   trimming a scan to its acquired size.

mod ascii;
mod diagnostics;
mod extra_pv;
mod file_reader;
mod file_writer;
pub mod io;
mod levels;
mod ops;
mod records;
mod scan_reader;
mod skim;
pub mod types;
mod util;
pub mod xdr;

use thiserror::Error;

/// The only MDA file format version this crate understands.
pub const MDA_VERSION: f32 = 1.3;
/// Allowed deviation of a file's version field from [MDA_VERSION].
pub const MDA_VERSION_TOLERANCE: f32 = 0.01;
/// The deepest scan nesting supported by the codec.
pub const MAXIMUM_RANK: usize = 4;
/// Ranks above this value (or below zero) can only come from a corrupt file.
pub(crate) const CORRUPT_RANK_LIMIT: i32 = 20;

#[derive(Debug, Error)]
pub enum MdaError {
    #[error("An IO error occurred reading or writing the scan file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("An IO error occurred reading the scan file at offset {offset:#x}: {source}")]
    ReadError {
        offset: u64,
        #[source]
        source: std::io::Error,
    },
    #[error("The scan record at offset {offset:#x} is corrupt: {reason}")]
    CorruptScan { offset: u64, reason: String },
    #[error("The scan file is truncated at offset {offset:#x} ({needed} more bytes required)")]
    TruncatedData { offset: u64, needed: u64 },
    #[error("Unsupported MDA file version {version:.3}; is this really an MDA file?")]
    VersionMismatch { version: f32 },
    #[error("Unsupported scan rank {rank} at offset {offset:#x}; ranks 1 through 4 are supported")]
    UnsupportedRank { offset: u64, rank: i32 },
    #[error("The scan model cannot be encoded: {0}")]
    InvalidModel(String),
    #[error("A binary structure at offset {offset:#x} could not be parsed: {reason}")]
    FormatParseError { offset: u64, reason: String },
    #[error("The scans cannot be combined: {0}")]
    IncompatibleScans(String),
}

impl From<binrw::Error> for MdaError {
    fn from(err: binrw::Error) -> Self {
        match err {
            binrw::Error::Io(e) => MdaError::IoError(e),
            // Readers re-tag this with the offset of the failed read.
            other => MdaError::FormatParseError {
                offset: 0,
                reason: other.to_string(),
            },
        }
    }
}

impl MdaError {
    pub(crate) fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        MdaError::CorruptScan {
            offset,
            reason: reason.into(),
        }
    }

    /// Attach the offset of a failed read to errors that do not carry one yet.
    pub(crate) fn at(self, offset: u64) -> Self {
        match self {
            MdaError::IoError(source) => MdaError::ReadError { offset, source },
            MdaError::FormatParseError { reason, .. } => MdaError::FormatParseError { offset, reason },
            other => other,
        }
    }

    /// The file offset the error refers to, if it arose while decoding.
    pub fn offset(&self) -> Option<u64> {
        match self {
            MdaError::ReadError { offset, .. }
            | MdaError::CorruptScan { offset, .. }
            | MdaError::TruncatedData { offset, .. }
            | MdaError::UnsupportedRank { offset, .. }
            | MdaError::FormatParseError { offset, .. } => Some(*offset),
            MdaError::VersionMismatch { .. } => Some(0),
            _ => None,
        }
    }

    /// Returns true if the error indicates damaged or incomplete file contents, as opposed to an
    /// error from the operating system or an unencodable model.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            MdaError::CorruptScan { .. }
                | MdaError::TruncatedData { .. }
                | MdaError::VersionMismatch { .. }
                | MdaError::UnsupportedRank { .. }
                | MdaError::FormatParseError { .. }
        )
    }
}

pub use crate::{
    ascii::write_ascii,
    diagnostics::Diagnostic,
    file_reader::{decode_file, decode_file_with, decode_reader, DecodeOptions, Decoded},
    file_writer::{encode_file, encode_file_with, encode_to_vec, encode_writer, EncodeOptions, EncodeState, FileEncoder},
    ops::MdaOp,
    skim::{skim_file, skim_reader},
    types::{
        ChannelKind,
        DbrClass,
        DbrKind,
        Detector,
        DetectorInfo,
        EpicsType,
        ExtraPv,
        ExtraPvValue,
        FileHeader,
        FileSummary,
        LevelDetector,
        LevelPositioner,
        MdaFile,
        Positioner,
        PositionerInfo,
        ScanArray,
        ScanDimension,
        ScanLevel,
        ScanSummary,
        Trigger,
    },
};
