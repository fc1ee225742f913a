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

    src/diagnostics.rs

    Recoverable problems reported by the decoder.
*/

use crate::types::ChannelKind;
use std::fmt::{self, Display, Formatter};

/// A problem found while decoding that did not prevent the file from being read.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Diagnostic {
    /// A record's header did not end where the first record at its level predicted, so the quick
    /// path could not be used and the record was read in full.
    HeaderDrift {
        /// 0 for the outermost level.
        level: usize,
        /// Offset of the record.
        offset: u64,
        /// Predicted offset of the record's data.
        expected: u64,
        /// Actual offset of the record's data.
        actual: u64,
    },
    /// A record had a different number of channels than the first record at its level. The
    /// level's shaped data is truncated to the smaller count.
    ChannelCountMismatch {
        level: usize,
        channel: ChannelKind,
        first: usize,
        found: usize,
    },
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::HeaderDrift {
                level,
                offset,
                expected,
                actual,
            } => write!(
                f,
                "level {}: scan record at {:#x} has data at {:#x}, expected {:#x}",
                level, offset, actual, expected
            ),
            Diagnostic::ChannelCountMismatch {
                level,
                channel,
                first,
                found,
            } => write!(
                f,
                "level {}: first scan had {} {}s; this one has {}",
                level, first, channel, found
            ),
        }
    }
}
