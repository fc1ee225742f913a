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

    tests/ops.rs

    Detector arithmetic and trimming on encoded files
*/

mod common;

use common::*;
use mdafox::{decode_reader, encode_to_vec, io::Cursor, DecodeOptions, MdaError, MdaOp};

#[test]
fn test_fixed_file_round_trip() {
    init();
    // Planned 4 rows, stopped after 2.
    let file = build_file(&[4, 3], &[2, 3]);
    let fixed = file.fixed();
    assert_eq!(fixed.header.dimensions, vec![2, 3]);

    let bytes = encode_to_vec(&fixed).unwrap();
    assert!(bytes.len() < encode_to_vec(&file).unwrap().len());
    let decoded = decode_reader(Cursor::new(bytes), &DecodeOptions::new()).unwrap();
    assert!(!decoded.is_degraded());
    assert_eq!(decoded.file.scan.requested_points, 2);
    assert_eq!(decoded.file.scan.child_offsets.len(), 2);
    assert_eq!(without_offsets(decoded.file), without_offsets(fixed));
}

#[test]
fn test_combine_decoded_files() {
    init();
    let bytes = encode_to_vec(&build_file(&[3, 4], &[3, 4])).unwrap();
    let a = decode_reader(Cursor::new(bytes.clone()), &DecodeOptions::new()).unwrap().file;
    let b = decode_reader(Cursor::new(bytes), &DecodeOptions::new()).unwrap().file;

    let sum = a.combine(MdaOp::Add, &b).unwrap();
    assert_eq!(sum, a.apply_scalar(MdaOp::Mul, 2.0));
    assert_eq!(sum.scan.children[2].positioners, a.scan.children[2].positioners);

    let other = build_file(&[3, 5], &[3, 5]);
    assert!(matches!(a.combine(MdaOp::Add, &other), Err(MdaError::IncompatibleScans(_))));
}
