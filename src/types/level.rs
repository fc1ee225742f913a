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

    src/types/level.rs

    Shaped per-dimension channel data.
*/

use crate::types::{DetectorInfo, PositionerInfo, Trigger};
use std::fmt::{self, Display, Formatter};

/// A nested array of channel data. Level `k` of a file (0 = outermost) nests `k` times: the
/// outermost level is plain points, the next is one row of points per outer point, and so on.
///
/// Rows are not required to have equal length. Scans aborted partway leave shorter rows, and
/// those are kept as-is.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanArray<T> {
    Points(Vec<T>),
    Nested(Vec<ScanArray<T>>),
}

impl<T> Default for ScanArray<T> {
    fn default() -> Self {
        ScanArray::Points(Vec::new())
    }
}

impl<T> ScanArray<T> {
    /// Number of entries at the top level.
    pub fn len(&self) -> usize {
        match self {
            ScanArray::Points(points) => points.len(),
            ScanArray::Nested(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of dimensions.
    pub fn ndim(&self) -> usize {
        match self {
            ScanArray::Points(_) => 1,
            ScanArray::Nested(rows) => 1 + rows.iter().map(|r| r.ndim()).max().unwrap_or(1),
        }
    }

    /// The extent of each dimension. For ragged arrays this is the longest row at each depth.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = vec![0; self.ndim()];
        self.fill_shape(0, &mut shape);
        shape
    }

    fn fill_shape(&self, depth: usize, shape: &mut [usize]) {
        shape[depth] = shape[depth].max(self.len());
        if let ScanArray::Nested(rows) = self {
            for row in rows {
                row.fill_shape(depth + 1, shape);
            }
        }
    }

    /// Element at the given index path, or `None` if the path is out of range or the wrong depth.
    pub fn get(&self, index: &[usize]) -> Option<&T> {
        match (self, index) {
            (ScanArray::Points(points), [i]) => points.get(*i),
            (ScanArray::Nested(rows), [i, rest @ ..]) => rows.get(*i)?.get(rest),
            _ => None,
        }
    }

    pub fn as_points(&self) -> Option<&[T]> {
        match self {
            ScanArray::Points(points) => Some(points),
            ScanArray::Nested(_) => None,
        }
    }

    /// The rows of a two-dimensional array.
    pub fn rows(&self) -> Option<Vec<&[T]>> {
        match self {
            ScanArray::Nested(rows) => rows.iter().map(|r| r.as_points()).collect(),
            ScanArray::Points(_) => None,
        }
    }

    /// Iterate over all points in acquisition order.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        match self {
            ScanArray::Points(points) => Box::new(points.iter()),
            ScanArray::Nested(rows) => Box::new(rows.iter().flat_map(|r| r.iter())),
        }
    }
}

impl<T: Clone> ScanArray<T> {
    /// All points in acquisition order.
    pub fn flatten(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelPositioner {
    pub info: PositionerInfo,
    pub data: ScanArray<f64>,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LevelDetector {
    pub info: DetectorInfo,
    pub data: ScanArray<f32>,
}

/// All data of one scan dimension gathered across the file.
///
/// The scalar fields and channel metadata come from the first record read at this level. Channel
/// data is collected from every record at the level, nested by the outer dimensions.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanLevel {
    /// 0 for the outermost dimension.
    pub level: usize,
    pub rank: usize,
    pub requested_points: usize,
    pub acquired_points: usize,
    pub name: String,
    pub timestamp: String,
    pub positioners: Vec<LevelPositioner>,
    pub detectors: Vec<LevelDetector>,
    pub triggers: Vec<Trigger>,
}

impl ScanLevel {
    /// Number of dimensions of this level's data arrays.
    pub fn dim(&self) -> usize {
        self.level + 1
    }
}

impl Display for ScanLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}D data (not read in)", self.dim())
        }
        else {
            write!(
                f,
                "{}D data from \"{}\" acquired on {}:\n{}/{} pts; {} positioners, {} detectors",
                self.dim(),
                self.name,
                self.timestamp,
                self.acquired_points,
                self.requested_points,
                self.positioners.len(),
                self.detectors.len()
            )
        }
    }
}
