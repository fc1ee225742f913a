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

    src/types/summary.rs

    Results of skimming a scan file.
*/

use crate::types::FileHeader;
use std::fmt::{self, Display, Formatter};

/// The header of one scan level as reported by the skimmer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanSummary {
    pub rank: usize,
    pub requested_points: usize,
    pub acquired_points: usize,
    pub name: String,
    pub timestamp: String,
    pub positioner_count: usize,
    pub detector_count: usize,
    pub trigger_count: usize,
}

impl Display for ScanSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rank {} \"{}\" {}/{} pts; {} positioners, {} detectors, {} triggers",
            self.rank,
            self.name,
            self.acquired_points,
            self.requested_points,
            self.positioner_count,
            self.detector_count,
            self.trigger_count
        )
    }
}

/// The shape of a file without its data: the file header and one summary per level reached,
/// outermost first.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FileSummary {
    pub header: FileHeader,
    pub levels: Vec<ScanSummary>,
}

impl FileSummary {
    /// Returns true if the outermost scan acquired no points.
    pub fn is_empty(&self) -> bool {
        self.levels.first().map_or(true, |l| l.acquired_points == 0)
    }

    /// Acquired point counts per level, outermost first.
    pub fn acquired_dimensions(&self) -> Vec<usize> {
        self.levels.iter().map(|l| l.acquired_points).collect()
    }

    /// Returns true if every level down to the file's rank was reached.
    pub fn is_complete(&self) -> bool {
        self.levels.len() == self.header.rank
    }
}
