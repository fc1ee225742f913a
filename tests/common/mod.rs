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

    tests/common/mod.rs

    Common support routines for tests
*/
#![allow(dead_code)]

use hex::encode;
use mdafox::{
    Detector,
    DetectorInfo,
    ExtraPv,
    FileHeader,
    MdaFile,
    Positioner,
    PositionerInfo,
    ScanDimension,
    Trigger,
};
use sha1::{Digest, Sha1};

pub const TIMESTAMP: &str = "OCT 18, 2026 10:00:00.000000000";

pub fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn compute_slice_hash(slice: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(slice);
    let result = hasher.finalize();

    encode(result)
}

/// Read the big-endian i32 at `offset`.
pub fn be_i32(bytes: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes(bytes[offset..offset + 4].try_into().unwrap())
}

pub fn positioner(number: i32, rank: usize, seed: usize, points: usize) -> Positioner {
    Positioner {
        info: PositionerInfo {
            number,
            pv_name: format!("xxx:m{}.VAL", rank),
            description: format!("motor {}", rank),
            step_mode: "LINEAR".to_string(),
            unit: "mm".to_string(),
            readback_pv_name: format!("xxx:m{}.RBV", rank),
            readback_description: format!("motor {} readback", rank),
            readback_unit: "mm".to_string(),
        },
        data: (0..points).map(|i| seed as f64 * 100.0 + i as f64 * 0.5).collect(),
    }
}

pub fn detector(number: i32, rank: usize, seed: usize, points: usize) -> Detector {
    Detector {
        info: DetectorInfo {
            number,
            pv_name: format!("xxx:scaler{}.S{}", rank, number + 1),
            description: format!("counter {}", number + 1),
            unit: "cts".to_string(),
        },
        data: (0..points)
            .map(|i| (seed * 1000 + i) as f32 * (number + 1) as f32)
            .collect(),
    }
}

/// Build a scan tree. `requested` and `acquired` hold one entry per rank, outermost first.
/// Every record carries one positioner, two detectors and one trigger.
pub fn build_scan(requested: &[usize], acquired: &[usize], seed: usize) -> ScanDimension {
    let rank = requested.len();
    let points = acquired[0];
    let mut scan = ScanDimension::new(rank, requested[0]);
    scan.acquired_points = points;
    scan.name = format!("xxx:scan{}", rank);
    scan.timestamp = TIMESTAMP.to_string();
    scan.positioners.push(positioner(0, rank, seed, points));
    scan.detectors.push(detector(0, rank, seed, points));
    scan.detectors.push(detector(1, rank, seed, points));
    scan.triggers.push(Trigger {
        number: 0,
        pv_name: format!("xxx:scan{}.EXSC", rank - 1),
        command: 1.0,
    });
    if rank > 1 {
        scan.children = (0..points)
            .map(|i| build_scan(&requested[1..], &acquired[1..], seed * 10 + i + 1))
            .collect();
    }
    scan
}

/// One extra PV of each value kind.
pub fn extra_pvs() -> Vec<ExtraPv> {
    vec![
        ExtraPv::string("xxx:userStringCalc1.SVAL", "beamline", "2-BM"),
        ExtraPv::char_text("xxx:filename", "file name", "", "scan_0001"),
        ExtraPv::short("xxx:short", "a short", "counts", vec![-3, 7]),
        ExtraPv::long("xxx:long", "a long", "counts", vec![123456789]),
        ExtraPv::float("xxx:ring_current", "ring current", "mA", vec![101.5]),
        ExtraPv::double("xxx:energy", "mono energy", "keV", vec![12.398, 8.048, 0.0]),
    ]
}

pub fn build_file(requested: &[usize], acquired: &[usize]) -> MdaFile {
    MdaFile {
        header: FileHeader::new(42, requested.iter().map(|&n| n as i32).collect()),
        scan: build_scan(requested, acquired, 0),
        extra_pvs: extra_pvs(),
    }
}

/// Number of records in a tree.
pub fn count_records(scan: &ScanDimension) -> usize {
    1 + scan.children.iter().map(count_records).sum::<usize>()
}

fn clear_offsets(scan: &mut ScanDimension) {
    scan.child_offsets.clear();
    for child in &mut scan.children {
        clear_offsets(child);
    }
}

/// Clear the fields the encoder assigns, so a decoded file compares equal to the model it was
/// encoded from.
pub fn without_offsets(mut file: MdaFile) -> MdaFile {
    file.header.extra_pv_offset = 0;
    clear_offsets(&mut file.scan);
    file
}
