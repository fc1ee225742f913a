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

    src/extra_pv.rs

    Reading and writing the extra PV block.
*/

//! The extra PV block stored after the scan records.

use crate::{
    io::{ReadSeek, WriteSeek},
    types::{DbrKind, EpicsType, ExtraPv, ExtraPvValue},
    xdr::{XdrReader, XdrWriter},
    MdaError,
};

fn read_count<R: ReadSeek>(xdr: &mut XdrReader<R>, what: &str) -> Result<usize, MdaError> {
    let offset = xdr.position();
    let count = xdr.read_i32()?;
    usize::try_from(count).map_err(|_| MdaError::corrupt(offset, format!("negative {} count {}", what, count)))
}

fn read_extra_pv<R: ReadSeek>(xdr: &mut XdrReader<R>) -> Result<ExtraPv, MdaError> {
    let name = xdr.read_optional_string()?;
    let description = xdr.read_optional_string()?;

    let type_offset = xdr.position();
    let code = xdr.read_i32()?;
    let epics_type = EpicsType::from_code(code)
        .ok_or_else(|| MdaError::corrupt(type_offset, format!("unknown EPICS type code {} for PV '{}'", code, name)))?;

    let (count, unit) = if epics_type.is_string() {
        (1, None)
    }
    else {
        let count = read_count(xdr, "element")?;
        (count, Some(xdr.read_optional_string()?))
    };

    let value = match epics_type.kind {
        DbrKind::String => ExtraPvValue::String(xdr.read_optional_string()?),
        DbrKind::Char => {
            let value_offset = xdr.position();
            let mut bytes = Vec::with_capacity(count);
            for (i, c) in xdr.read_i32_array(count)?.into_iter().enumerate() {
                if c == 0 {
                    break;
                }
                let byte = u8::try_from(c).map_err(|_| {
                    MdaError::corrupt(
                        value_offset + 4 * i as u64,
                        format!("character value {} of PV '{}' is out of range", c, name),
                    )
                })?;
                bytes.push(byte);
            }
            ExtraPvValue::Char(String::from_utf8_lossy(&bytes).into_owned())
        }
        DbrKind::Short => ExtraPvValue::Short(xdr.read_i32_array(count)?),
        DbrKind::Enum => ExtraPvValue::Enum(xdr.read_i32_array(count)?),
        DbrKind::Long => ExtraPvValue::Long(xdr.read_i32_array(count)?),
        DbrKind::Float => ExtraPvValue::Float(xdr.read_f32_array(count)?),
        DbrKind::Double => ExtraPvValue::Double(xdr.read_f64_array(count)?),
    };

    log::trace!("read_extra_pv(): {} ({}) x{} = {}", name, epics_type, count, value);
    Ok(ExtraPv {
        name,
        description,
        epics_type,
        unit,
        count,
        value,
    })
}

/// Decode the count-prefixed extra PV list at `offset`.
pub(crate) fn read_extra_pvs<R: ReadSeek>(xdr: &mut XdrReader<R>, offset: u64) -> Result<Vec<ExtraPv>, MdaError> {
    xdr.seek(offset)?;
    let count = read_count(xdr, "extra PV")?;
    log::debug!("read_extra_pvs(): {} extra PVs at {:#x}", count, offset);

    let mut pvs = Vec::new();
    for _ in 0..count {
        pvs.push(read_extra_pv(xdr)?);
    }
    Ok(pvs)
}

fn write_extra_pv<W: WriteSeek>(xdr: &mut XdrWriter<W>, pv: &ExtraPv) -> Result<(), MdaError> {
    xdr.write_optional_string(&pv.name)?;
    xdr.write_optional_string(&pv.description)?;
    xdr.write_i32(pv.epics_type.code())?;
    if !pv.epics_type.is_string() {
        xdr.write_len(pv.count)?;
        xdr.write_optional_string(pv.unit.as_deref().unwrap_or_default())?;
    }

    match &pv.value {
        ExtraPvValue::String(s) => xdr.write_optional_string(s),
        ExtraPvValue::Char(text) => {
            let mut chars: Vec<i32> = text.bytes().map(i32::from).collect();
            chars.resize(pv.count, 0);
            xdr.write_i32_array(&chars)
        }
        ExtraPvValue::Short(v) | ExtraPvValue::Enum(v) | ExtraPvValue::Long(v) => xdr.write_i32_array(v),
        ExtraPvValue::Float(v) => xdr.write_f32_array(v),
        ExtraPvValue::Double(v) => xdr.write_f64_array(v),
    }
}

/// Serialize the extra PV block. The PVs are expected to have been validated.
pub(crate) fn write_extra_pvs<W: WriteSeek>(xdr: &mut XdrWriter<W>, pvs: &[ExtraPv]) -> Result<(), MdaError> {
    xdr.write_len(pvs.len())?;
    for pv in pvs {
        write_extra_pv(xdr, pv)?;
    }
    Ok(())
}
