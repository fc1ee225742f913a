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

    src/types/env.rs

    Channel descriptions recovered from extra PVs.
*/

//! Channel descriptions from the scan environment.
//!
//! saveData does not record descriptions for mca ROI or scaler channels, but the description
//! PVs of those records are usually saved as extra PVs. This fills in the gaps.

use crate::types::{ExtraPv, MdaFile, ScanDimension};

/// Map a field of an mca or scaler record to the field holding its description.
fn description_field(field: &str) -> Option<String> {
    let mut chars = field.chars();
    let prefix = chars.next()?;
    let number = chars.as_str();
    if number.starts_with('0') {
        return None;
    }
    let n: u32 = number.parse().ok()?;
    match prefix {
        'R' if (1..=32).contains(&n) => Some(format!("R{}NM", n)),
        'S' if (1..=64).contains(&n) => Some(format!("NM{}", n)),
        _ => None,
    }
}

/// Look up a description for the PV `pv_name` among `extra_pvs`. Returns the value of the
/// matching description PV in braces, or `None` if there is no match or the value is blank.
pub fn find_env_description(pv_name: &str, extra_pvs: &[ExtraPv]) -> Option<String> {
    let (record, field) = pv_name.split_once('.')?;
    if field.contains('.') {
        return None;
    }
    let desc_pv = format!("{}.{}", record, description_field(field)?);
    let pv = extra_pvs.iter().find(|pv| pv.name == desc_pv)?;
    let text = pv.value.to_string();
    if text.trim().is_empty() {
        return None;
    }
    Some(format!("{{{}}}", text))
}

fn describe(description: &mut String, pv_name: &str, extra_pvs: &[ExtraPv]) {
    if description.is_empty() {
        if let Some(found) = find_env_description(pv_name, extra_pvs) {
            *description = found;
        }
    }
}

fn describe_scan(scan: &mut ScanDimension, extra_pvs: &[ExtraPv]) {
    for p in &mut scan.positioners {
        describe(&mut p.info.description, &p.info.pv_name, extra_pvs);
    }
    for d in &mut scan.detectors {
        describe(&mut d.info.description, &d.info.pv_name, extra_pvs);
    }
    for child in &mut scan.children {
        describe_scan(child, extra_pvs);
    }
}

impl MdaFile {
    /// Fill empty positioner and detector descriptions from the extra PVs, returning the
    /// updated file.
    pub fn with_env_descriptions(mut self) -> Self {
        describe_scan(&mut self.scan, &self.extra_pvs);
        self
    }
}

pub(crate) fn describe_levels(levels: &mut [crate::types::ScanLevel], extra_pvs: &[ExtraPv]) {
    for level in levels {
        for p in &mut level.positioners {
            describe(&mut p.info.description, &p.info.pv_name, extra_pvs);
        }
        for d in &mut level.detectors {
            describe(&mut d.info.description, &d.info.pv_name, extra_pvs);
        }
    }
}
