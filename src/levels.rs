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

    src/levels.rs

    Per-dimension views built from the scan record tree.
*/

//! Reconstruction of per-dimension arrays from the scan record tree.

use crate::{
    diagnostics::Diagnostic,
    types::{ChannelKind, LevelDetector, LevelPositioner, ScanArray, ScanDimension, ScanLevel},
};

fn collect<'a>(node: &'a ScanDimension, depth: usize, out: &mut Vec<Vec<&'a ScanDimension>>) {
    if out.len() <= depth {
        out.push(Vec::new());
    }
    out[depth].push(node);
    for child in &node.children {
        collect(child, depth + 1, out);
    }
}

type ChannelData<T> = fn(&ScanDimension, usize) -> &[T];

fn positioner_data(scan: &ScanDimension, j: usize) -> &[f64] {
    &scan.positioners[j].data
}

fn detector_data(scan: &ScanDimension, j: usize) -> &[f32] {
    &scan.detectors[j].data
}

/// Gather channel `j` from every record `depth` levels below `node`, nested by the records in
/// between.
fn gather<T: Clone>(node: &ScanDimension, depth: usize, j: usize, channel: ChannelData<T>) -> ScanArray<T> {
    if depth == 0 {
        ScanArray::Points(channel(node, j).to_vec())
    }
    else {
        ScanArray::Nested(node.children.iter().map(|c| gather(c, depth - 1, j, channel)).collect())
    }
}

/// Find the channel count shared by all records of a level, reporting each record that differs
/// from the first.
fn common_count(level: usize, records: &[&ScanDimension], kind: ChannelKind, diagnostics: &mut Vec<Diagnostic>) -> usize {
    let first = records[0].channel_count(kind);
    let mut common = first;
    for record in &records[1..] {
        let found = record.channel_count(kind);
        if found != first {
            log::warn!(
                "build_levels(): level {}: first scan had {} {}s; this one has {}",
                level,
                first,
                kind,
                found
            );
            diagnostics.push(Diagnostic::ChannelCountMismatch {
                level,
                channel: kind,
                first,
                found,
            });
        }
        common = common.min(found);
    }
    common
}

/// Build the shaped view of every level present in the tree, outermost first.
pub(crate) fn build_levels(root: &ScanDimension, diagnostics: &mut Vec<Diagnostic>) -> Vec<ScanLevel> {
    let mut by_depth = Vec::new();
    collect(root, 0, &mut by_depth);

    let mut levels = Vec::with_capacity(by_depth.len());
    for (level, records) in by_depth.iter().enumerate() {
        let first = records[0];
        let n_pos = common_count(level, records, ChannelKind::Positioner, diagnostics);
        let n_det = common_count(level, records, ChannelKind::Detector, diagnostics);
        common_count(level, records, ChannelKind::Trigger, diagnostics);

        let positioners = (0..n_pos)
            .map(|j| LevelPositioner {
                info: first.positioners[j].info.clone(),
                data: gather(root, level, j, positioner_data),
            })
            .collect();
        let detectors = (0..n_det)
            .map(|j| LevelDetector {
                info: first.detectors[j].info.clone(),
                data: gather(root, level, j, detector_data),
            })
            .collect();

        levels.push(ScanLevel {
            level,
            rank: first.rank,
            requested_points: first.requested_points,
            acquired_points: first.acquired_points,
            name: first.name.clone(),
            timestamp: first.timestamp.clone(),
            positioners,
            detectors,
            triggers: first.triggers.clone(),
        });
    }
    levels
}
