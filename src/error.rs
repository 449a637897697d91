use nom::error::{ErrorKind, ParseError};
use nom::Needed;
use std::fmt;

/// Errors raised while decoding (or encoding) a capture
///
/// Unsupported frame types and unknown information elements are not errors: they are
/// reported as explicit markers in the decoded records. The end of a capture is not an
/// error either, see [`CaptureReader::next_frame`](crate::CaptureReader::next_frame).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DissectError {
    /// The buffer is shorter than a fixed layout requires
    ///
    /// `offset` is relative to the buffer passed to the public entry point.
    BufferTooShort {
        offset: usize,
        needed: usize,
        available: usize,
    },
    /// A record given to `encode` has no value for this field
    MissingField(&'static str),
    /// A record value is a scalar where the layout declares an array (or the
    /// opposite), or an array has the wrong number of elements
    FieldKindMismatch(&'static str),
    /// A record value does not fit the width of its field
    ValueOutOfRange(&'static str),
    /// The capture header does not start with a known magic number
    InvalidMagic(u32),
    /// Only version 2.4 of the capture format is supported
    InvalidVersion { major: u16, minor: u16 },
    /// Microsecond part of a record timestamp is >= 1_000_000
    InvalidTimestamp(u32),
    /// The capture ends in the middle of a header or a record
    TruncatedCapture { expected: usize, available: usize },
    /// The radiotap header declares a length larger than the captured data
    InvalidRadiotapHeader {
        header_length: usize,
        available: usize,
    },
    /// The underlying reader returned an error
    ReadError,
    /// Serialization failed
    SerializeError,
    /// A record declares a payload larger than the reader accepts
    RecordTooLarge { length: usize, limit: usize },
    /// Error raised by a nom combinator
    NomError(ErrorKind),
}

impl DissectError {
    /// Shift the offset of a `BufferTooShort` error by `base` bytes
    pub(crate) fn at(self, base: usize) -> DissectError {
        match self {
            DissectError::BufferTooShort {
                offset,
                needed,
                available,
            } => DissectError::BufferTooShort {
                offset: offset + base,
                needed,
                available,
            },
            e => e,
        }
    }

    /// Returns true for errors caused by missing bytes
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            DissectError::BufferTooShort { .. } | DissectError::TruncatedCapture { .. }
        )
    }

    /// Returns true for errors caused by invalid values in otherwise complete data
    pub fn is_format_violation(&self) -> bool {
        matches!(
            self,
            DissectError::InvalidMagic(_)
                | DissectError::InvalidVersion { .. }
                | DissectError::InvalidTimestamp(_)
                | DissectError::InvalidRadiotapHeader { .. }
                | DissectError::RecordTooLarge { .. }
        )
    }
}

/// Rebase the offset of an error returned by a parser that was called at `base`
pub(crate) fn rebase(e: nom::Err<DissectError>, base: usize) -> nom::Err<DissectError> {
    e.map(|e| e.at(base))
}

impl<I> ParseError<I> for DissectError {
    fn from_error_kind(_input: I, kind: ErrorKind) -> Self {
        DissectError::NomError(kind)
    }
    fn append(_input: I, _kind: ErrorKind, other: Self) -> Self {
        other
    }
}

impl From<nom::Err<DissectError>> for DissectError {
    fn from(e: nom::Err<DissectError>) -> Self {
        match e {
            nom::Err::Error(e) | nom::Err::Failure(e) => e,
            nom::Err::Incomplete(Needed::Size(_)) | nom::Err::Incomplete(Needed::Unknown) => {
                DissectError::NomError(ErrorKind::Complete)
            }
        }
    }
}

impl fmt::Display for DissectError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DissectError::BufferTooShort {
                offset,
                needed,
                available,
            } => write!(
                f,
                "buffer too short at offset {}: needed {} bytes, {} available",
                offset, needed, available
            ),
            DissectError::MissingField(name) => write!(f, "missing value for field '{}'", name),
            DissectError::FieldKindMismatch(name) => {
                write!(f, "value does not match the layout of field '{}'", name)
            }
            DissectError::ValueOutOfRange(name) => {
                write!(f, "value out of range for field '{}'", name)
            }
            DissectError::InvalidMagic(magic) => write!(f, "invalid magic number 0x{:08x}", magic),
            DissectError::InvalidVersion { major, minor } => {
                write!(f, "unsupported capture version {}.{}", major, minor)
            }
            DissectError::InvalidTimestamp(usec) => {
                write!(f, "invalid timestamp: {} microseconds", usec)
            }
            DissectError::TruncatedCapture {
                expected,
                available,
            } => write!(
                f,
                "truncated capture: expected {} bytes, {} available",
                expected, available
            ),
            DissectError::InvalidRadiotapHeader {
                header_length,
                available,
            } => write!(
                f,
                "invalid radiotap header: length {} exceeds {} available bytes",
                header_length, available
            ),
            DissectError::ReadError => write!(f, "read error"),
            DissectError::SerializeError => write!(f, "serialization error"),
            DissectError::RecordTooLarge { length, limit } => write!(
                f,
                "frame record of {} bytes exceeds the limit of {} bytes",
                length, limit
            ),
            DissectError::NomError(kind) => write!(f, "nom error: {:?}", kind),
        }
    }
}

impl std::error::Error for DissectError {}
