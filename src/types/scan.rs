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

    src/types/scan.rs

    The scan record tree.
*/

use crate::types::ExtraPv;
use std::fmt::{self, Display, Formatter};

/// The fixed header at the start of every MDA file.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileHeader {
    /// File format version. Only 1.3 is understood.
    pub version: f32,
    pub scan_number: i32,
    /// Number of nested scan dimensions, 1 through 4.
    pub rank: usize,
    /// Planned point counts, outermost dimension first.
    pub dimensions: Vec<i32>,
    pub is_regular: bool,
    /// Absolute offset of the extra PV block, or 0 if the file has none. Set by the encoder.
    pub extra_pv_offset: u32,
}

impl FileHeader {
    pub fn new(scan_number: i32, dimensions: Vec<i32>) -> Self {
        Self {
            version: crate::MDA_VERSION,
            scan_number,
            rank: dimensions.len(),
            dimensions,
            is_regular: true,
            extra_pv_offset: 0,
        }
    }
}

/// Identifies one of the three channel lists of a scan record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChannelKind {
    Positioner,
    Detector,
    Trigger,
}

impl Display for ChannelKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Positioner => write!(f, "positioner"),
            ChannelKind::Detector => write!(f, "detector"),
            ChannelKind::Trigger => write!(f, "trigger"),
        }
    }
}

/// The header fields of a positioner channel.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PositionerInfo {
    /// Positioner index within the sscan record, starting at 0.
    pub number: i32,
    pub pv_name: String,
    pub description: String,
    /// "LINEAR", "TABLE" or "FLY".
    pub step_mode: String,
    pub unit: String,
    pub readback_pv_name: String,
    pub readback_description: String,
    pub readback_unit: String,
}

impl PositionerInfo {
    /// The name of the sscan record field driving this positioner, `P1` through `P4`.
    pub fn field_name(&self) -> String {
        match self.number {
            n @ 0..=3 => format!("P{}", n + 1),
            _ => "?".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Positioner {
    pub info: PositionerInfo,
    /// One value per acquired point.
    pub data: Vec<f64>,
}

/// The header fields of a detector channel.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetectorInfo {
    /// Detector index within the sscan record, starting at 0.
    pub number: i32,
    pub pv_name: String,
    pub description: String,
    pub unit: String,
}

impl DetectorInfo {
    /// The name of the sscan record field reading this detector, `D01` through `D99`.
    pub fn field_name(&self) -> String {
        match self.number {
            n @ 0..=98 => format!("D{:02}", n + 1),
            _ => "?".to_string(),
        }
    }

    /// The field name used by sscan records with only 15 hexadecimal-numbered detectors, `D1`
    /// through `DF`, followed by `D01` through `D70`.
    pub fn legacy_field_name(&self) -> String {
        match self.number {
            n @ 0..=14 => format!("D{:X}", n + 1),
            n @ 15..=84 => format!("D{:02}", n - 14),
            _ => "?".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Detector {
    pub info: DetectorInfo,
    /// One value per acquired point.
    pub data: Vec<f32>,
}

/// A detector trigger: a PV written before each point is acquired.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Trigger {
    pub number: i32,
    pub pv_name: String,
    /// The value written to `pv_name`.
    pub command: f32,
}

/// One execution of one sscan record: a single scan record of the file tree.
///
/// Records of rank > 1 own one child record per acquired point. The child offset table is kept
/// exactly as read so a decoded file can be inspected, but the encoder always recomputes it.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanDimension {
    /// 1 for the innermost dimension.
    pub rank: usize,
    pub requested_points: usize,
    pub acquired_points: usize,
    /// Name of the sscan record that acquired the data.
    pub name: String,
    /// Time at which this scan started.
    pub timestamp: String,
    pub positioners: Vec<Positioner>,
    pub detectors: Vec<Detector>,
    pub triggers: Vec<Trigger>,
    /// Absolute file offsets of the lower-rank records. `requested_points` entries for rank > 1.
    pub child_offsets: Vec<i32>,
    pub children: Vec<ScanDimension>,
}

impl ScanDimension {
    /// Create an empty record of the given rank and planned size.
    pub fn new(rank: usize, requested_points: usize) -> Self {
        Self {
            rank,
            requested_points,
            ..Default::default()
        }
    }

    pub fn channel_count(&self, kind: ChannelKind) -> usize {
        match kind {
            ChannelKind::Positioner => self.positioners.len(),
            ChannelKind::Detector => self.detectors.len(),
            ChannelKind::Trigger => self.triggers.len(),
        }
    }

    pub fn positioner_info(&self) -> impl Iterator<Item = &PositionerInfo> {
        self.positioners.iter().map(|p| &p.info)
    }

    pub fn detector_info(&self) -> impl Iterator<Item = &DetectorInfo> {
        self.detectors.iter().map(|d| &d.info)
    }

    /// Return the first record at each depth below and including this one.
    pub fn first_descendants(&self) -> Vec<&ScanDimension> {
        let mut out = vec![self];
        let mut node = self;
        while let Some(child) = node.children.first() {
            out.push(child);
            node = child;
        }
        out
    }
}

/// A complete MDA file: its header, the root scan record tree and the extra PVs.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MdaFile {
    pub header: FileHeader,
    pub scan: ScanDimension,
    pub extra_pvs: Vec<ExtraPv>,
}

impl MdaFile {
    pub fn extra_pv(&self, name: &str) -> Option<&ExtraPv> {
        self.extra_pvs.iter().find(|pv| pv.name == name)
    }
}
