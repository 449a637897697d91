use crate::error::DissectError;
use crate::pcap::{
    parse_capture_header, parse_frame_record, truncated, CaptureFrame, CaptureHeader,
    FRAME_RECORD_HEADER_SIZE, PCAP_HEADER_SIZE,
};
use circular::Buffer;
use log::{debug, trace};
use nom::{Needed, Offset};
use std::convert::TryFrom;
use std::io::Read;

/// Default capacity of the circular buffer used by [`CaptureReader`]
pub const DEFAULT_CAPACITY: usize = 65536;

type FrameResult = Result<CaptureFrame, DissectError>;

/// Largest payload accepted by [`CaptureReader`], whatever the snaplen of the capture
pub const MAX_RECORD_SIZE: usize = 16 * 1024 * 1024;

/// Streaming iterator over a capture read from any `Read` source
///
/// ## Capture Reader
///
/// This reader is based on a circular buffer, so memory usage stays constant and it can be
/// used to parse huge files or infinite streams. The capture header is read and validated
/// when the reader is created; each call to `next_frame` then returns the next frame with
/// its radiotap payload decoded.
///
/// The buffer grows (doubling its capacity) when it is full and a single record still does
/// not fit. A record is limited to the snaplen of the capture (at least
/// `DEFAULT_CAPACITY`, at most `MAX_RECORD_SIZE`); larger records are a `RecordTooLarge`
/// error. Using a large capacity (at least 65k) is advised to avoid frequent reads and
/// buffer shifts.
///
/// ## Example
///
/// ```rust
/// use wifi_pcap_parser::*;
/// use std::fs::File;
///
/// # let path = "assets/probe-requests.pcap";
/// let file = File::open(path).unwrap();
/// let mut reader = CaptureReader::new(DEFAULT_CAPACITY, file).expect("CaptureReader");
/// let mut num_frames = 0;
/// loop {
///     match reader.next_frame() {
///         Ok(Some(frame)) => {
///             println!("frame of {} bytes", frame.header.caplen);
///             num_frames += 1;
///         }
///         Ok(None) => break,
///         Err(e) => panic!("error while reading: {}", e),
///     }
/// }
/// assert_eq!(num_frames, 100);
/// ```
pub struct CaptureReader<R>
where
    R: Read,
{
    header: CaptureHeader,
    reader: R,
    buffer: Buffer,
    consumed: usize,
    frame_index: usize,
    reader_exhausted: bool,
}

impl<R> CaptureReader<R>
where
    R: Read,
{
    /// Creates a new `CaptureReader<R>` with the provided buffer capacity, and reads the
    /// capture header.
    pub fn new(capacity: usize, reader: R) -> Result<CaptureReader<R>, DissectError> {
        let buffer = Buffer::with_capacity(capacity.max(PCAP_HEADER_SIZE));
        Self::from_buffer(buffer, reader)
    }

    /// Creates a new `CaptureReader<R>` using the provided `Buffer`.
    pub fn from_buffer(buffer: Buffer, reader: R) -> Result<CaptureReader<R>, DissectError> {
        let mut reader = CaptureReader {
            header: CaptureHeader::default(),
            reader,
            buffer,
            consumed: 0,
            frame_index: 0,
            reader_exhausted: false,
        };
        while reader.buffer.available_data() < PCAP_HEADER_SIZE && !reader.reader_exhausted {
            if reader.buffer.available_space() == 0 {
                let capacity = reader.buffer.capacity();
                reader.buffer.grow(capacity + PCAP_HEADER_SIZE);
            }
            reader.refill()?;
        }
        let (rem, header) = parse_capture_header(reader.buffer.data())?;
        let offset = reader.buffer.data().offset(rem);
        reader.header = header;
        reader.consume(offset);
        Ok(reader)
    }

    /// The capture file header
    pub fn header(&self) -> &CaptureHeader {
        &self.header
    }

    /// Number of bytes consumed from the source so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Read the next frame
    ///
    /// Returns `Ok(None)` when the source ends cleanly between two records, and
    /// `TruncatedCapture` when it ends in the middle of one. An error in the payload of a
    /// frame does not affect the position of the reader: the next call returns the next
    /// frame.
    pub fn next_frame(&mut self) -> Result<Option<CaptureFrame>, DissectError> {
        match self.next_record()? {
            Some(frame) => frame.map(Some),
            None => Ok(None),
        }
    }

    /// Iterate over the remaining frames
    pub fn frames(self) -> Frames<R> {
        Frames {
            reader: self,
            failed: false,
        }
    }

    /// Read the next record and decode its payload
    ///
    /// The outer error is a container error, after which the position in the source is
    /// lost. The inner result is the payload decoding result.
    fn next_record(&mut self) -> Result<Option<FrameResult>, DissectError> {
        loop {
            if self.buffer.available_data() == 0 && self.reader_exhausted {
                debug!("end of capture after {} frames", self.frame_index);
                return Ok(None);
            }
            let data = self.buffer.data();
            match parse_frame_record(data, self.header.endianness) {
                Ok((rem, raw)) => {
                    let offset = data.offset(rem);
                    trace!("frame {} at offset {}", self.frame_index, self.consumed);
                    let frame = CaptureFrame::decode(&raw);
                    self.frame_index += 1;
                    self.consume(offset);
                    return Ok(Some(frame));
                }
                Err(nom::Err::Incomplete(n)) => {
                    if self.reader_exhausted {
                        // expected more bytes but reader is EOF, truncated capture
                        let available = self.buffer.available_data();
                        return Err(truncated(nom::Err::Incomplete(n), available));
                    }
                    self.buffer.shift();
                    if self.buffer.available_space() == 0 {
                        self.grow(n)?;
                    }
                    self.refill()?;
                }
                Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => return Err(e),
            }
        }
    }

    /// Largest record (header included) the buffer may grow to
    fn record_limit(&self) -> usize {
        let snaplen = usize::try_from(self.header.snaplen).unwrap_or(MAX_RECORD_SIZE);
        FRAME_RECORD_HEADER_SIZE + snaplen.max(DEFAULT_CAPACITY).min(MAX_RECORD_SIZE)
    }

    /// Double the capacity of a full buffer, up to the record limit
    fn grow(&mut self, needed: Needed) -> Result<(), DissectError> {
        let capacity = self.buffer.capacity();
        let wanted = match needed {
            Needed::Size(n) => self.buffer.available_data().saturating_add(usize::from(n)),
            Needed::Unknown => capacity + 1,
        };
        let limit = self.record_limit();
        if wanted > limit {
            return Err(DissectError::RecordTooLarge {
                length: wanted.saturating_sub(FRAME_RECORD_HEADER_SIZE),
                limit: limit - FRAME_RECORD_HEADER_SIZE,
            });
        }
        let new_capacity = capacity.saturating_mul(2).min(limit).max(wanted);
        debug!("growing capture buffer to {} bytes", new_capacity);
        self.buffer.grow(new_capacity);
        Ok(())
    }

    fn consume(&mut self, offset: usize) {
        self.consumed += offset;
        self.buffer.consume(offset);
    }

    fn refill(&mut self) -> Result<(), DissectError> {
        self.buffer.shift();
        let space = self.buffer.space();
        // check if available space is empty, so we can distinguish
        // a read() returning 0 because of EOF or because we requested 0
        if space.is_empty() {
            return Ok(());
        }
        let sz = self.reader.read(space).or(Err(DissectError::ReadError))?;
        self.reader_exhausted = sz == 0;
        self.buffer.fill(sz);
        Ok(())
    }
}

/// Iterator returned by [`CaptureReader::frames`]
///
/// An error in the payload of a frame is returned for that frame only. The iterator stops
/// after the end of the capture or after the first container error.
pub struct Frames<R>
where
    R: Read,
{
    reader: CaptureReader<R>,
    failed: bool,
}

impl<R> Frames<R>
where
    R: Read,
{
    pub fn header(&self) -> &CaptureHeader {
        self.reader.header()
    }
}

impl<R> Iterator for Frames<R>
where
    R: Read,
{
    type Item = Result<CaptureFrame, DissectError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.next_record() {
            Ok(frame) => frame,
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
