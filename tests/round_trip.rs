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

    tests/round_trip.rs

    Encode and decode synthetic scan files of every supported rank
*/

mod common;

use common::*;
use mdafox::{
    decode_reader,
    encode_to_vec,
    encode_writer,
    io::Cursor,
    xdr::{BulkCodec, ScalarCodec},
    DbrKind,
    DecodeOptions,
    Decoded,
    Detector,
    DetectorInfo,
    EncodeOptions,
    ExtraPv,
    ExtraPvValue,
    FileHeader,
    MdaFile,
    Positioner,
    PositionerInfo,
    ScanArray,
    ScanDimension,
};

fn decode(bytes: &[u8]) -> Decoded {
    decode_reader(Cursor::new(bytes.to_vec()), &DecodeOptions::default()).unwrap()
}

/// Check that every child offset of `scan` points at a record of the next lower rank.
fn check_offsets(bytes: &[u8], scan: &ScanDimension) {
    if scan.rank == 1 {
        assert!(scan.child_offsets.is_empty());
        return;
    }
    assert_eq!(scan.child_offsets.len(), scan.requested_points);
    for (i, &offset) in scan.child_offsets.iter().enumerate() {
        if i < scan.acquired_points {
            assert!(offset > 0 && (offset as usize) < bytes.len());
            assert_eq!(be_i32(bytes, offset as usize), scan.rank as i32 - 1);
        }
        else {
            assert_eq!(offset, 0);
        }
    }
    for child in &scan.children {
        check_offsets(bytes, child);
    }
}

#[test]
fn test_one_dimensional_scan() {
    init();
    let mut scan = ScanDimension::new(1, 5);
    scan.acquired_points = 5;
    scan.name = "xxx:scan1".to_string();
    scan.timestamp = TIMESTAMP.to_string();
    scan.positioners.push(Positioner {
        info: PositionerInfo {
            pv_name: "xxx:m1.VAL".to_string(),
            ..Default::default()
        },
        data: vec![0.0, 1.0, 2.0, 3.0, 4.0],
    });
    scan.detectors.push(Detector {
        info: DetectorInfo {
            pv_name: "xxx:scaler1.S2".to_string(),
            ..Default::default()
        },
        data: vec![0.0, 1.0, 4.0, 9.0, 16.0],
    });
    let file = MdaFile {
        header: FileHeader::new(1, vec![5]),
        scan,
        extra_pvs: Vec::new(),
    };

    let bytes = encode_to_vec(&file).unwrap();
    let decoded = decode(&bytes);
    let root = &decoded.file.scan;
    assert_eq!(root.acquired_points, 5);
    assert_eq!(root.positioners[0].data, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    assert_eq!(root.detectors[0].data, vec![0.0, 1.0, 4.0, 9.0, 16.0]);
    assert!(decoded.file.extra_pvs.is_empty());
    assert!(!decoded.is_degraded());

    let level = decoded.level(0).unwrap();
    assert_eq!(
        level.detectors[0].data,
        ScanArray::Points(vec![0.0, 1.0, 4.0, 9.0, 16.0])
    );
    assert_eq!(without_offsets(decoded.file), file);
}

#[test]
fn test_two_dimensional_scan() {
    init();
    let file = build_file(&[2, 3], &[2, 3]);
    let bytes = encode_to_vec(&file).unwrap();
    let decoded = decode(&bytes);

    let root = &decoded.file.scan;
    assert_eq!(root.children.len(), 2);
    check_offsets(&bytes, root);

    let inner = decoded.level(1).unwrap();
    assert_eq!(inner.rank, 1);
    assert_eq!(inner.acquired_points, 3);
    let expected: Vec<Vec<f32>> = file
        .scan
        .children
        .iter()
        .map(|c| c.detectors[1].data.clone())
        .collect();
    let rows = inner.detectors[1].data.rows().unwrap();
    assert_eq!(rows.len(), 2);
    for (row, want) in rows.iter().zip(&expected) {
        assert_eq!(*row, want.as_slice());
    }
    assert_eq!(inner.detectors[1].data.shape(), vec![2, 3]);
    assert_eq!(without_offsets(decoded.file), file);
}

#[test]
fn test_every_rank() {
    init();
    let shapes: [(&[usize], &[usize]); 4] = [
        (&[4], &[4]),
        (&[3, 2], &[3, 2]),
        (&[2, 3, 2], &[2, 3, 2]),
        (&[2, 2, 2, 3], &[2, 2, 2, 3]),
    ];
    for (requested, acquired) in shapes {
        let file = build_file(requested, acquired);
        let bytes = encode_to_vec(&file).unwrap();
        let decoded = decode(&bytes);
        let rank = requested.len();

        assert_eq!(decoded.file.header.rank, rank);
        assert_eq!(decoded.levels.len(), rank);
        for (k, level) in decoded.levels.iter().enumerate() {
            assert_eq!(level.level, k);
            assert_eq!(level.rank, rank - k);
            assert_eq!(level.detectors.len(), 2);
            assert_eq!(level.detectors[0].data.ndim(), k + 1);
            assert_eq!(level.detectors[0].data.shape(), acquired[..=k].to_vec());
        }
        check_offsets(&bytes, &decoded.file.scan);
        assert_eq!(count_records(&decoded.file.scan), count_records(&file.scan));

        // A second encode of the decoded file reproduces the original bytes.
        let again = encode_to_vec(&decoded.file).unwrap();
        assert_eq!(compute_slice_hash(&again), compute_slice_hash(&bytes));
        assert_eq!(without_offsets(decoded.file), file);
    }
}

#[test]
fn test_partial_scan() {
    init();
    // Outer scan aborted after 2 of 5 points.
    let file = build_file(&[5, 4], &[2, 4]);
    let bytes = encode_to_vec(&file).unwrap();
    let decoded = decode(&bytes);

    let root = &decoded.file.scan;
    assert_eq!(root.requested_points, 5);
    assert_eq!(root.acquired_points, 2);
    assert_eq!(root.child_offsets.len(), 5);
    assert_eq!(&root.child_offsets[2..], &[0, 0, 0]);
    assert_eq!(root.children.len(), 2);
    check_offsets(&bytes, root);
    assert_eq!(decoded.level(1).unwrap().detectors[0].data.shape(), vec![2, 4]);
}

#[test]
fn test_ragged_inner_scan() {
    init();
    let mut file = build_file(&[3, 4], &[3, 4]);
    // The last inner scan was aborted after one point.
    let last = &mut file.scan.children[2];
    last.acquired_points = 1;
    last.positioners[0].data.truncate(1);
    for d in &mut last.detectors {
        d.data.truncate(1);
    }

    let decoded = decode(&encode_to_vec(&file).unwrap());
    let inner = decoded.level(1).unwrap();
    let rows = inner.positioners[0].data.rows().unwrap();
    assert_eq!(rows.iter().map(|r| r.len()).collect::<Vec<_>>(), vec![4, 4, 1]);
    assert_eq!(inner.positioners[0].data.shape(), vec![3, 4]);
    assert_eq!(without_offsets(decoded.file), file);
}

#[test]
fn test_empty_scan() {
    init();
    let file = build_file(&[10, 5], &[0, 5]);
    assert!(file.scan.children.is_empty());
    let bytes = encode_to_vec(&file).unwrap();
    let decoded = decode(&bytes);

    assert_eq!(decoded.file.scan.acquired_points, 0);
    assert_eq!(decoded.file.scan.child_offsets, vec![0; 10]);
    assert_eq!(decoded.levels.len(), 1);
    assert!(decoded.levels[0].positioners[0].data.is_empty());
}

#[test]
fn test_extra_pv_types() {
    init();
    let mut file = build_file(&[3], &[3]);
    file.extra_pvs.push(ExtraPv::new(
        "xxx:mode",
        "operating mode",
        mdafox::EpicsType::new(mdafox::DbrClass::Time, DbrKind::Enum),
        Some(String::new()),
        ExtraPvValue::Enum(vec![2]),
    ));
    let decoded = decode(&encode_to_vec(&file).unwrap());
    assert_eq!(decoded.file.extra_pvs, file.extra_pvs);

    let kinds: Vec<DbrKind> = decoded.file.extra_pvs.iter().map(|pv| pv.epics_type.kind).collect();
    assert_eq!(
        kinds,
        vec![
            DbrKind::String,
            DbrKind::Char,
            DbrKind::Short,
            DbrKind::Long,
            DbrKind::Float,
            DbrKind::Double,
            DbrKind::Enum,
        ]
    );
    let energy = decoded.file.extra_pv("xxx:energy").unwrap();
    assert_eq!(energy.value, ExtraPvValue::Double(vec![12.398, 8.048, 0.0]));
    assert_eq!(energy.unit.as_deref(), Some("keV"));
    let beamline = decoded.file.extra_pv("xxx:userStringCalc1.SVAL").unwrap();
    assert_eq!(beamline.value.as_text(), Some("2-BM"));
    assert_eq!(beamline.unit, None);
}

#[test]
fn test_codecs_agree() {
    init();
    let file = build_file(&[3, 2, 2], &[3, 2, 2]);

    let mut bulk = Vec::new();
    encode_writer(&file, &mut bulk, &EncodeOptions::new().with_codec(BulkCodec)).unwrap();
    let mut scalar = Vec::new();
    encode_writer(&file, &mut scalar, &EncodeOptions::new().with_codec(ScalarCodec)).unwrap();
    assert_eq!(bulk, scalar);

    let a = decode_reader(Cursor::new(bulk.clone()), &DecodeOptions::new().with_codec(BulkCodec)).unwrap();
    let b = decode_reader(Cursor::new(bulk), &DecodeOptions::new().with_codec(ScalarCodec)).unwrap();
    assert_eq!(a.file, b.file);
    assert_eq!(a.levels, b.levels);
}

#[test]
fn test_max_rank() {
    init();
    let file = build_file(&[2, 3, 4], &[2, 3, 4]);
    let bytes = encode_to_vec(&file).unwrap();

    let decoded = decode_reader(Cursor::new(bytes.clone()), &DecodeOptions::new().with_max_rank(2)).unwrap();
    assert_eq!(decoded.levels.len(), 2);
    assert_eq!(decoded.file.scan.children.len(), 2);
    assert!(decoded.file.scan.children.iter().all(|c| c.children.is_empty()));
    // The offsets of the records that were not read are still reported.
    assert_eq!(decoded.file.scan.children[0].child_offsets.len(), 3);

    let decoded = decode_reader(Cursor::new(bytes), &DecodeOptions::new().with_max_rank(1)).unwrap();
    assert_eq!(decoded.levels.len(), 1);
    assert!(decoded.file.scan.children.is_empty());
}
