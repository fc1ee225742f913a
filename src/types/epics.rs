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

    src/types/epics.rs

    EPICS DBR type codes and extra PV values.
*/

//! EPICS channel access type codes and extra PV values.

use crate::MdaError;
use std::fmt::{self, Display, Formatter};
use strum::IntoEnumIterator;

/// The base value type of an EPICS DBR type code.
#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DbrKind {
    String = 0,
    Short = 1,
    Float = 2,
    Enum = 3,
    Char = 4,
    Long = 5,
    Double = 6,
}

impl Display for DbrKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            DbrKind::String => "STRING",
            DbrKind::Short => "SHORT",
            DbrKind::Float => "FLOAT",
            DbrKind::Enum => "ENUM",
            DbrKind::Char => "CHAR",
            DbrKind::Long => "LONG",
            DbrKind::Double => "DOUBLE",
        };
        write!(f, "{}", name)
    }
}

/// The qualifier class of an EPICS DBR type code. The class never changes how a value is stored.
#[repr(i32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DbrClass {
    Plain = 0,
    Status = 1,
    Time = 2,
    Graphic = 3,
    Control = 4,
}

impl DbrClass {
    fn prefix(&self) -> &'static str {
        match self {
            DbrClass::Plain => "",
            DbrClass::Status => "STS_",
            DbrClass::Time => "TIME_",
            DbrClass::Graphic => "GR_",
            DbrClass::Control => "CTRL_",
        }
    }
}

const KIND_COUNT: i32 = 7;

/// A DBR type code, split into its class and base kind.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpicsType {
    pub class: DbrClass,
    pub kind: DbrKind,
}

impl EpicsType {
    pub const fn new(class: DbrClass, kind: DbrKind) -> Self {
        Self { class, kind }
    }

    /// The wire code, `class * 7 + kind`.
    pub fn code(&self) -> i32 {
        self.class as i32 * KIND_COUNT + self.kind as i32
    }

    /// Decode a wire code. Codes outside 0..=34 have no meaning and return `None`.
    pub fn from_code(code: i32) -> Option<Self> {
        if code < 0 {
            return None;
        }
        let class = DbrClass::iter().find(|c| *c as i32 == code / KIND_COUNT)?;
        let kind = DbrKind::iter().find(|k| *k as i32 == code % KIND_COUNT)?;
        Some(Self { class, kind })
    }

    pub fn is_string(&self) -> bool {
        self.kind == DbrKind::String
    }
}

impl Display for EpicsType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "DBR_{}{}", self.class.prefix(), self.kind)
    }
}

/// The value of an extra PV. The variant always agrees with the kind of the PV's [EpicsType].
///
/// Integer kinds are stored as 4-byte integers on disk and are kept at that width here.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExtraPvValue {
    String(String),
    /// A character array, interpreted as a null-terminated string.
    Char(String),
    Short(Vec<i32>),
    Enum(Vec<i32>),
    Long(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

fn write_list<T: Display>(f: &mut Formatter<'_>, values: &[T]) -> fmt::Result {
    if values.len() == 1 {
        return write!(f, "{}", values[0]);
    }
    write!(f, "[")?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", v)?;
    }
    write!(f, "]")
}

impl ExtraPvValue {
    pub fn kind(&self) -> DbrKind {
        match self {
            ExtraPvValue::String(_) => DbrKind::String,
            ExtraPvValue::Char(_) => DbrKind::Char,
            ExtraPvValue::Short(_) => DbrKind::Short,
            ExtraPvValue::Enum(_) => DbrKind::Enum,
            ExtraPvValue::Long(_) => DbrKind::Long,
            ExtraPvValue::Float(_) => DbrKind::Float,
            ExtraPvValue::Double(_) => DbrKind::Double,
        }
    }

    /// The value as text, for the string and character kinds.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExtraPvValue::String(s) | ExtraPvValue::Char(s) => Some(s),
            _ => None,
        }
    }

    /// Number of array elements the value occupies on disk, before any character padding.
    pub fn len(&self) -> usize {
        match self {
            ExtraPvValue::String(_) => 1,
            ExtraPvValue::Char(s) => s.len(),
            ExtraPvValue::Short(v) | ExtraPvValue::Enum(v) | ExtraPvValue::Long(v) => v.len(),
            ExtraPvValue::Float(v) => v.len(),
            ExtraPvValue::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Display for ExtraPvValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ExtraPvValue::String(s) | ExtraPvValue::Char(s) => write!(f, "{}", s),
            ExtraPvValue::Short(v) | ExtraPvValue::Enum(v) | ExtraPvValue::Long(v) => write_list(f, v),
            ExtraPvValue::Float(v) => write_list(f, v),
            ExtraPvValue::Double(v) => write_list(f, v),
        }
    }
}

/// A process variable recorded once per file, outside the scan tree.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExtraPv {
    pub name: String,
    pub description: String,
    pub epics_type: EpicsType,
    /// Engineering units. Not stored for string values.
    pub unit: Option<String>,
    /// Element count as stored. For character arrays this may exceed the text length.
    pub count: usize,
    pub value: ExtraPvValue,
}

impl ExtraPv {
    /// Create an extra PV with an explicit type. The element count is taken from the value.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        epics_type: EpicsType,
        unit: Option<String>,
        value: ExtraPvValue,
    ) -> Self {
        let count = match &value {
            // Leave room for the terminator.
            ExtraPvValue::Char(s) => s.len() + 1,
            other => other.len(),
        };
        Self {
            name: name.into(),
            description: description.into(),
            epics_type,
            unit,
            count,
            value,
        }
    }

    /// A plain `DBR_STRING` PV.
    pub fn string(name: impl Into<String>, description: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            name,
            description,
            EpicsType::new(DbrClass::Plain, DbrKind::String),
            None,
            ExtraPvValue::String(value.into()),
        )
    }

    pub fn char_text(
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self::control(name, description, unit, ExtraPvValue::Char(text.into()))
    }

    pub fn short(name: impl Into<String>, description: impl Into<String>, unit: impl Into<String>, v: Vec<i32>) -> Self {
        Self::control(name, description, unit, ExtraPvValue::Short(v))
    }

    pub fn long(name: impl Into<String>, description: impl Into<String>, unit: impl Into<String>, v: Vec<i32>) -> Self {
        Self::control(name, description, unit, ExtraPvValue::Long(v))
    }

    pub fn float(name: impl Into<String>, description: impl Into<String>, unit: impl Into<String>, v: Vec<f32>) -> Self {
        Self::control(name, description, unit, ExtraPvValue::Float(v))
    }

    pub fn double(name: impl Into<String>, description: impl Into<String>, unit: impl Into<String>, v: Vec<f64>) -> Self {
        Self::control(name, description, unit, ExtraPvValue::Double(v))
    }

    // saveData writes numeric PVs with their DBR_CTRL type codes.
    fn control(
        name: impl Into<String>,
        description: impl Into<String>,
        unit: impl Into<String>,
        value: ExtraPvValue,
    ) -> Self {
        let epics_type = EpicsType::new(DbrClass::Control, value.kind());
        Self::new(name, description, epics_type, Some(unit.into()), value)
    }

    /// Check that the type, unit, count and value agree with each other.
    pub fn validate(&self) -> Result<(), MdaError> {
        let invalid = |what: String| -> Result<(), MdaError> {
            Err(MdaError::InvalidModel(format!("extra PV '{}': {}", self.name, what)))
        };

        if self.epics_type.kind != self.value.kind() {
            return invalid(format!("type {} does not match a {} value", self.epics_type, self.value.kind()));
        }
        match (&self.value, &self.unit) {
            (ExtraPvValue::String(_), Some(_)) => return invalid("string values have no unit".to_string()),
            (ExtraPvValue::String(_), None) if self.count != 1 => {
                return invalid(format!("string values have a count of 1, not {}", self.count))
            }
            (ExtraPvValue::String(_), None) => return Ok(()),
            (_, None) => return invalid("non-string values require a unit".to_string()),
            _ => {}
        }
        match &self.value {
            ExtraPvValue::Char(text) => {
                if text.len() > self.count {
                    return invalid(format!("text of {} bytes exceeds count {}", text.len(), self.count));
                }
                if text.as_bytes().contains(&0) {
                    return invalid("character value contains a null byte".to_string());
                }
            }
            value if value.len() != self.count => {
                return invalid(format!("count {} does not match {} values", self.count, value.len()));
            }
            _ => {}
        }
        Ok(())
    }
}
