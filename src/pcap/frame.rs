use log::trace;
use nom::bytes::streaming::take;
use nom::{IResult, Needed};
use std::time::Duration;

use crate::endianness::Endianness;
use crate::error::DissectError;
use crate::radiotap::{decode_radiotap, RadiotapFrame};
use crate::structure::{Field, Layout, Primitive, Record};

/// Size of the header preceding each captured payload
pub const FRAME_RECORD_HEADER_SIZE: usize = 16;

const FRAME_RECORD_FIELDS: &[Field] = &[
    Field::scalar("ts_sec", Primitive::U32),
    Field::scalar("ts_usec", Primitive::U32),
    Field::scalar("incl_len", Primitive::U32),
    Field::scalar("orig_len", Primitive::U32),
];

pub const fn frame_record_layout(endianness: Endianness) -> Layout {
    Layout::new(endianness, FRAME_RECORD_FIELDS)
}

/// Header of a frame record
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameRecordHeader {
    pub ts_sec: u32,
    /// Microseconds, always < 1_000_000 once decoded
    pub ts_usec: u32,
    /// Number of payload bytes stored in the capture
    pub caplen: u32,
    /// Length of the frame on the wire
    pub origlen: u32,
}

impl FrameRecordHeader {
    fn from_record(record: &Record) -> Result<FrameRecordHeader, DissectError> {
        Ok(FrameRecordHeader {
            ts_sec: record.get_u32("ts_sec")?,
            ts_usec: record.get_u32("ts_usec")?,
            caplen: record.get_u32("incl_len")?,
            origlen: record.get_u32("orig_len")?,
        })
    }

    pub(crate) fn to_record(&self) -> Record {
        Record::with_capacity(FRAME_RECORD_FIELDS.len())
            .with("ts_sec", self.ts_sec)
            .with("ts_usec", self.ts_usec)
            .with("incl_len", self.caplen)
            .with("orig_len", self.origlen)
    }

    /// Capture time, since the Unix epoch
    pub fn timestamp(&self) -> Duration {
        Duration::new(u64::from(self.ts_sec), self.ts_usec.saturating_mul(1000))
    }
}

/// A frame record whose payload has not been decoded yet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawFrame<'a> {
    pub header: FrameRecordHeader,
    pub data: &'a [u8],
}

/// A frame record with its radiotap payload decoded
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureFrame {
    pub header: FrameRecordHeader,
    pub radiotap: RadiotapFrame,
}

impl CaptureFrame {
    /// Decode the payload of a raw frame
    pub fn decode(raw: &RawFrame) -> Result<CaptureFrame, DissectError> {
        let radiotap = decode_radiotap(raw.data)?;
        Ok(CaptureFrame {
            header: raw.header,
            radiotap,
        })
    }

    #[inline]
    pub fn timestamp(&self) -> Duration {
        self.header.timestamp()
    }
}

/// Read a frame record header and its payload
///
/// This parser is streaming: if `i` does not hold the whole record, it returns
/// `nom::Err::Incomplete` with the number of missing bytes.
pub fn parse_frame_record(
    i: &[u8],
    endianness: Endianness,
) -> IResult<&[u8], RawFrame, DissectError> {
    if i.len() < FRAME_RECORD_HEADER_SIZE {
        return Err(nom::Err::Incomplete(Needed::new(
            FRAME_RECORD_HEADER_SIZE - i.len(),
        )));
    }
    let (i, record) = frame_record_layout(endianness).decode(i)?;
    let header = FrameRecordHeader::from_record(&record).map_err(nom::Err::Error)?;
    if header.ts_usec >= 1_000_000 {
        return Err(nom::Err::Error(DissectError::InvalidTimestamp(header.ts_usec)));
    }
    let (i, data) = take::<_, _, DissectError>(header.caplen as usize)(i)?;
    trace!("frame record caplen={} origlen={}", header.caplen, header.origlen);
    Ok((i, RawFrame { header, data }))
}

/// Convert an `Incomplete` result into the error reported at the end of a capture
pub(crate) fn truncated(e: nom::Err<DissectError>, available: usize) -> DissectError {
    match e {
        nom::Err::Incomplete(Needed::Size(n)) => DissectError::TruncatedCapture {
            expected: available.saturating_add(usize::from(n)),
            available,
        },
        nom::Err::Incomplete(Needed::Unknown) => DissectError::TruncatedCapture {
            expected: available + 1,
            available,
        },
        nom::Err::Error(e) | nom::Err::Failure(e) => e,
    }
}
