use crate::error::DissectError;
use crate::pcap::{parse_capture_header, parse_frame_record, truncated, CaptureFrame, CaptureHeader};
use std::fmt;

/// Iterator over a capture already loaded in memory
///
/// Each item is the next frame with its payload decoded. An error in the payload of a frame
/// is returned for that frame only, and iteration continues with the next record. After a
/// container error (truncated record, invalid timestamp), the iterator returns `None`.
///
/// ```rust
/// use wifi_pcap_parser::*;
///
/// # let path = "assets/beacon.pcap";
/// let data = std::fs::read(path).unwrap();
/// let slice = CaptureSlice::from_slice(&data).expect("capture header");
/// assert_eq!(slice.header.network, Linktype::IEEE802_11_RADIOTAP);
/// for frame in slice {
///     let frame = frame.expect("frame");
///     println!("{:?}: {}", frame.timestamp(), frame.radiotap.ieee80211.subtype_name());
/// }
/// ```
pub struct CaptureSlice<'a> {
    pub header: CaptureHeader,
    // remaining (unparsed) data
    rem: &'a [u8],
    failed: bool,
}

impl<'a> CaptureSlice<'a> {
    pub fn from_slice(i: &'a [u8]) -> Result<CaptureSlice<'a>, DissectError> {
        let (rem, header) = parse_capture_header(i)?;
        Ok(CaptureSlice {
            header,
            rem,
            failed: false,
        })
    }

    /// Bytes not read yet
    pub fn remaining(&self) -> &'a [u8] {
        self.rem
    }
}

impl<'a> Iterator for CaptureSlice<'a> {
    type Item = Result<CaptureFrame, DissectError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.rem.is_empty() || self.failed {
            return None;
        }
        match parse_frame_record(self.rem, self.header.endianness) {
            Ok((rem, raw)) => {
                self.rem = rem;
                Some(CaptureFrame::decode(&raw))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(truncated(e, self.rem.len())))
            }
        }
    }
}

impl<'a> fmt::Debug for CaptureSlice<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        f.debug_struct("CaptureSlice")
            .field("header", &self.header)
            .field("remaining", &self.rem.len())
            .finish()
    }
}

/// A capture header and all its frames
#[derive(Debug)]
pub struct Capture {
    pub header: CaptureHeader,
    pub frames: Vec<CaptureFrame>,
}

/// Parse a whole capture
///
/// Note: this requires the file to be fully loaded to memory. Fails on the first error,
/// including errors in frame payloads.
pub fn parse_capture(i: &[u8]) -> Result<Capture, DissectError> {
    let slice = CaptureSlice::from_slice(i)?;
    let header = slice.header.clone();
    let frames = slice.collect::<Result<Vec<_>, _>>()?;
    Ok(Capture { header, frames })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcap::header::tests::PCAP_HDR_LE;

    #[test]
    fn test_empty_capture() {
        let capture = parse_capture(PCAP_HDR_LE).expect("empty capture");
        assert!(capture.frames.is_empty());
        assert_eq!(capture.header.snaplen, 180);
    }

    #[test]
    fn test_truncated_record() {
        let mut data = PCAP_HDR_LE.to_vec();
        data.extend_from_slice(&[0u8; 7]);
        let mut slice = CaptureSlice::from_slice(&data).expect("header");
        assert_eq!(
            slice.next(),
            Some(Err(DissectError::TruncatedCapture {
                expected: 16,
                available: 7
            }))
        );
        assert_eq!(slice.next(), None);
        assert!(parse_capture(&data).is_err());
    }
}
