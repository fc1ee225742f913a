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

    src/ascii.rs

    Text table export of decoded scan files.
*/

//! Text table export of decoded files, in the layout of the `mda2ascii` tool.

use crate::{io::Write, types::ScanLevel, Decoded, MdaError};

const MIN_COLUMN_WIDTH: usize = 15;

struct Column<'a> {
    width: usize,
    field: String,
    pv_name: &'a str,
    description: &'a str,
}

impl<'a> Column<'a> {
    fn new(field: String, pv_name: &'a str, description: &'a str) -> Self {
        let width = MIN_COLUMN_WIDTH
            .max(pv_name.len() + 1)
            .max(description.len() + 1)
            .max(field.len() + 1);
        Self {
            width,
            field,
            pv_name,
            description,
        }
    }
}

fn columns(level: &ScanLevel) -> Vec<Column<'_>> {
    let positioners = level
        .positioners
        .iter()
        .map(|p| Column::new(p.info.field_name(), &p.info.pv_name, &p.info.description));
    let detectors = level
        .detectors
        .iter()
        .map(|d| Column::new(d.info.field_name(), &d.info.pv_name, &d.info.description));
    positioners.chain(detectors).collect()
}

/// Left-justify a value in `width` columns with 8 decimals, leaving a space where a minus sign
/// would go for non-negative values.
fn data_cell(value: f64, width: usize) -> String {
    let sign = if value.is_sign_negative() { "" } else { " " };
    format!("{:<width$}", format!("{}{:.8}", sign, value), width = width)
}

fn join_counts(levels: &[ScanLevel], count: impl Fn(&ScanLevel) -> usize) -> String {
    // Innermost level first.
    levels.iter().rev().map(|l| count(l).to_string()).collect::<Vec<_>>().join(",")
}

/// Write `decoded` as a commented text table.
///
/// The outermost level is written as one row per point. For two-dimensional files each channel of
/// the inner level follows as a block with one line per outer point. Deeper levels are not written.
pub fn write_ascii<W: Write>(decoded: &Decoded, file_name: &str, out: &mut W) -> Result<(), MdaError> {
    let header = &decoded.file.header;
    let Some(outer) = decoded.levels.first() else {
        return Err(MdaError::InvalidModel("decoded file has no scan levels".to_string()));
    };

    writeln!(out, "### {} is a {}-dimensional file", file_name, header.rank)?;
    writeln!(
        out,
        "### Number of data points      = [{}]",
        join_counts(&decoded.levels, |l| l.acquired_points)
    )?;
    writeln!(
        out,
        "### Number of detector signals = [{}]",
        join_counts(&decoded.levels, |l| l.detectors.len())
    )?;

    writeln!(out, "#\n# Scan-environment PV values:")?;
    let key_len = decoded.file.extra_pvs.iter().map(|pv| pv.name.len()).max().unwrap_or(0);
    for pv in &decoded.file.extra_pvs {
        writeln!(
            out,
            "#{:<width$} (\"{}\", \"{}\", {})",
            pv.name,
            pv.description,
            pv.unit.as_deref().unwrap_or_default(),
            pv.value,
            width = key_len
        )?;
    }

    let columns = columns(outer);
    let table_width = 1 + columns.iter().map(|c| c.width).sum::<usize>();
    let separator = "#".repeat(table_width);

    writeln!(out, "\n#{}", outer)?;
    writeln!(out, "#  scan date, time: {}", outer.timestamp)?;
    writeln!(out, "{}", separator)?;

    for row in [
        columns.iter().map(|c| c.field.as_str()).collect::<Vec<_>>(),
        columns.iter().map(|c| c.pv_name).collect(),
        columns.iter().map(|c| c.description).collect(),
    ] {
        write!(out, "#")?;
        for (text, column) in row.iter().zip(&columns) {
            write!(out, "{:<width$}", text, width = column.width)?;
        }
        writeln!(out)?;
    }
    writeln!(out, "{}", separator)?;

    let n_pos = outer.positioners.len();
    for i in 0..outer.acquired_points {
        for (j, column) in columns.iter().enumerate() {
            let value = if j < n_pos {
                outer.positioners[j].data.get(&[i]).copied()
            }
            else {
                outer.detectors[j - n_pos].data.get(&[i]).map(|v| *v as f64)
            };
            write!(out, "{}", data_cell(value.unwrap_or(f64::NAN), column.width))?;
        }
        writeln!(out)?;
    }

    if let Some(inner) = decoded.levels.get(1) {
        writeln!(out, "\n# 2D data")?;
        for (i, p) in inner.positioners.iter().enumerate() {
            writeln!(
                out,
                "\n# Positioner {} (.{}) PV:'{}' desc:'{}'",
                i,
                p.info.field_name(),
                p.info.pv_name,
                p.info.description
            )?;
            for row in p.data.rows().unwrap_or_default() {
                for value in row {
                    write!(out, "{:.6} ", value)?;
                }
                writeln!(out)?;
            }
        }
        for (i, d) in inner.detectors.iter().enumerate() {
            writeln!(
                out,
                "\n# Detector {} (.{}) PV:'{}' desc:'{}'",
                i,
                d.info.field_name(),
                d.info.pv_name,
                d.info.description
            )?;
            for row in d.data.rows().unwrap_or_default() {
                for value in row {
                    write!(out, "{:.6} ", value)?;
                }
                writeln!(out)?;
            }
        }
    }

    if decoded.levels.len() > 2 {
        writeln!(out, "\n# Can't write 3D (or higher) data")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_cell() {
        assert_eq!(data_cell(1.0, 15), " 1.00000000    ");
        assert_eq!(data_cell(-2.5, 15), "-2.50000000    ");
        assert_eq!(data_cell(123.0, 5), " 123.00000000");
    }

    #[test]
    fn test_column_width() {
        let c = Column::new("P1".to_string(), "xxx:long:motor:name.VAL", "");
        assert_eq!(c.width, 24);
        let c = Column::new("D01".to_string(), "a", "b");
        assert_eq!(c.width, MIN_COLUMN_WIDTH);
    }
}
