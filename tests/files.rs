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

    tests/files.rs

    Reading and writing scan files on disk
*/

mod common;

use common::*;
use mdafox::{decode_file, decode_file_with, encode_file, DecodeOptions, ExtraPv, MdaError};

#[test]
fn test_file_round_trip() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("xxx_0002.mda");
    let file = build_file(&[4, 3], &[4, 3]);

    encode_file(&file, &path).unwrap();
    let decoded = decode_file(&path, 2).unwrap();
    assert_eq!(without_offsets(decoded.file.clone()), file);

    // Writing over an existing file replaces it.
    let smaller = build_file(&[2], &[2]);
    encode_file(&smaller, &path).unwrap();
    let decoded = decode_file(&path, 4).unwrap();
    assert_eq!(without_offsets(decoded.file), smaller);
}

#[test]
fn test_failed_encode_keeps_existing_file() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("xxx_0003.mda");
    let file = build_file(&[3], &[3]);
    encode_file(&file, &path).unwrap();
    let before = std::fs::read(&path).unwrap();

    let mut invalid = build_file(&[3], &[3]);
    invalid.scan.detectors[0].data.pop();
    assert!(matches!(encode_file(&invalid, &path), Err(MdaError::InvalidModel(_))));

    assert_eq!(std::fs::read(&path).unwrap(), before);
    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 1, "the temporary file was left behind");
}

#[test]
fn test_missing_file() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let result = decode_file(dir.path().join("missing.mda"), 4);
    match result {
        Err(e @ MdaError::IoError(_)) => assert!(!e.is_data_error()),
        other => panic!("expected IoError, got {:?}", other.map(|d| d.file.header)),
    }
}

#[test]
fn test_env_descriptions() {
    init();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("xxx_0004.mda");
    let mut file = build_file(&[2, 2], &[2, 2]);
    for d in &mut file.scan.detectors {
        d.info.description.clear();
    }
    file.extra_pvs.push(ExtraPv::string("xxx:scaler2.NM1", "", "I0"));
    encode_file(&file, &path).unwrap();

    let decoded = decode_file_with(&path, &DecodeOptions::new().with_quick(true))
        .unwrap()
        .with_env_descriptions();
    assert_eq!(decoded.file.scan.detectors[0].info.description, "{I0}");
    assert_eq!(decoded.levels[0].detectors[0].info.description, "{I0}");
    // No description PV for S2.
    assert_eq!(decoded.file.scan.detectors[1].info.description, "");
    // Channels that already have a description keep it.
    assert_eq!(decoded.levels[1].detectors[0].info.description, "counter 1");
}
