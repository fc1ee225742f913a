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

    src/ops.rs

    Detector arithmetic between scans, and trimming scans to their acquired size.
*/

//! Detector arithmetic between scans, and trimming a scan to the points it actually acquired.

use crate::{MdaError, MdaFile, ScanDimension};
use std::{fmt::Display, str::FromStr};

/// An elementwise operation applied to detector data.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum MdaOp {
    Add,
    Sub,
    Mul,
    Div,
    /// The greater of the two values.
    Max,
    /// The lesser of the two values.
    Min,
}

impl MdaOp {
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            MdaOp::Add => a + b,
            MdaOp::Sub => a - b,
            MdaOp::Mul => a * b,
            MdaOp::Div => a / b,
            MdaOp::Max => a.max(b),
            MdaOp::Min => a.min(b),
        }
    }

    fn apply_f32(self, a: f32, b: f64) -> f32 {
        self.apply(a as f64, b) as f32
    }
}

impl FromStr for MdaOp {
    type Err = &'static str;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "+" | "add" => Ok(MdaOp::Add),
            "-" | "sub" => Ok(MdaOp::Sub),
            "*" | "x" | "mul" => Ok(MdaOp::Mul),
            "/" | "div" => Ok(MdaOp::Div),
            ">" | "max" => Ok(MdaOp::Max),
            "<" | "min" => Ok(MdaOp::Min),
            _ => Err("Invalid operation; expected one of '+', '-', '*', '/', '>' or '<'"),
        }
    }
}

impl Display for MdaOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            MdaOp::Add => "+",
            MdaOp::Sub => "-",
            MdaOp::Mul => "*",
            MdaOp::Div => "/",
            MdaOp::Max => ">",
            MdaOp::Min => "<",
        };
        write!(f, "{}", symbol)
    }
}

fn incompatible(rank: usize, what: &str, left: usize, right: usize) -> MdaError {
    MdaError::IncompatibleScans(format!("rank {} records differ in {} ({} vs {})", rank, what, left, right))
}

fn combine_dimension(op: MdaOp, left: &mut ScanDimension, right: &ScanDimension) -> Result<(), MdaError> {
    let rank = left.rank;
    if left.detectors.len() != right.detectors.len() {
        return Err(incompatible(rank, "detector count", left.detectors.len(), right.detectors.len()));
    }
    if left.requested_points != right.requested_points {
        return Err(incompatible(rank, "requested points", left.requested_points, right.requested_points));
    }
    if left.acquired_points != right.acquired_points {
        return Err(incompatible(rank, "acquired points", left.acquired_points, right.acquired_points));
    }
    if left.children.len() != right.children.len() {
        return Err(incompatible(rank, "child records", left.children.len(), right.children.len()));
    }

    for (a, b) in left.detectors.iter_mut().zip(&right.detectors) {
        if a.data.len() != b.data.len() {
            return Err(incompatible(rank, "detector data length", a.data.len(), b.data.len()));
        }
        for (x, y) in a.data.iter_mut().zip(&b.data) {
            *x = op.apply_f32(*x, *y as f64);
        }
    }
    for (a, b) in left.children.iter_mut().zip(&right.children) {
        combine_dimension(op, a, b)?;
    }
    Ok(())
}

fn apply_scalar_dimension(op: MdaOp, scan: &mut ScanDimension, scalar: f64) {
    for detector in &mut scan.detectors {
        for x in &mut detector.data {
            *x = op.apply_f32(*x, scalar);
        }
    }
    for child in &mut scan.children {
        apply_scalar_dimension(op, child, scalar);
    }
}

fn fix_dimension(scan: &mut ScanDimension) {
    let points = scan.acquired_points;
    scan.requested_points = points;
    for positioner in &mut scan.positioners {
        positioner.data.truncate(points);
    }
    for detector in &mut scan.detectors {
        detector.data.truncate(points);
    }
    scan.child_offsets.truncate(points);
    scan.children.truncate(points);
    for child in &mut scan.children {
        fix_dimension(child);
    }
}

impl MdaFile {
    /// Combine the detector data of two files of the same shape, point by point. Positioner
    /// data, metadata and extra PVs are taken from `self`.
    pub fn combine(&self, op: MdaOp, other: &MdaFile) -> Result<MdaFile, MdaError> {
        if self.header.rank != other.header.rank {
            return Err(incompatible(self.header.rank, "file rank", self.header.rank, other.header.rank));
        }
        log::debug!(
            "MdaFile::combine(): scan {} {} scan {}",
            self.header.scan_number,
            op,
            other.header.scan_number
        );
        let mut result = self.clone();
        combine_dimension(op, &mut result.scan, &other.scan)?;
        Ok(result)
    }

    /// Apply `op` between every detector value and `scalar`.
    pub fn apply_scalar(&self, op: MdaOp, scalar: f64) -> MdaFile {
        log::debug!("MdaFile::apply_scalar(): {} {}", op, scalar);
        let mut result = self.clone();
        apply_scalar_dimension(op, &mut result.scan, scalar);
        result
    }

    /// Return a copy trimmed to the points actually acquired, as if every scan had been planned
    /// with exactly that many points. The header dimensions are taken from the first record at
    /// each level, and are 0 for levels with no records.
    pub fn fixed(&self) -> MdaFile {
        let mut result = self.clone();
        fix_dimension(&mut result.scan);

        let mut dimensions = Vec::with_capacity(result.header.rank);
        let mut level = Some(&result.scan);
        for _ in 0..result.header.rank {
            dimensions.push(level.map_or(0, |scan| scan.acquired_points as i32));
            level = level.and_then(|scan| scan.children.first());
        }
        log::debug!("MdaFile::fixed(): dimensions {:?} -> {:?}", self.header.dimensions, dimensions);
        result.header.dimensions = dimensions;
        result
    }
}
