use log::{debug, warn};
use nom::IResult;
use std::convert::TryFrom;

use crate::endianness::Endianness;
use crate::error::DissectError;
use crate::linktype::Linktype;
use crate::structure::{Field, Layout, Primitive, Record};

/// Magic number of a capture file with microsecond timestamps, in file byte order
pub const PCAP_MAGIC: u32 = 0xa1b2_c3d4;

/// Size of the capture file header
pub const PCAP_HEADER_SIZE: usize = 24;

const CAPTURE_HEADER_FIELDS: &[Field] = &[
    Field::scalar("magic_number", Primitive::U32),
    Field::scalar("version_major", Primitive::U16),
    Field::scalar("version_minor", Primitive::U16),
    Field::scalar("thiszone", Primitive::I32),
    Field::scalar("sigfigs", Primitive::U32),
    Field::scalar("snaplen", Primitive::U32),
    Field::scalar("network", Primitive::I32),
];

/// Layout of the capture file header for the given byte order
pub const fn capture_header_layout(endianness: Endianness) -> Layout {
    Layout::new(endianness, CAPTURE_HEADER_FIELDS)
}

/// Capture file global header
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureHeader {
    /// File format and byte ordering. Always `0xa1b2c3d4` once decoded: the byte order
    /// of the file is stored in `endianness`.
    pub magic_number: u32,
    /// Version major number (2)
    pub version_major: u16,
    /// Version minor number (4)
    pub version_minor: u16,
    /// The correction time in seconds between GMT (UTC) and the local timezone of the
    /// following packet header timestamps
    pub thiszone: i32,
    /// In theory, the accuracy of time stamps in the capture; in practice, all tools set it to 0
    pub sigfigs: u32,
    /// max len of captured packets, in octets
    pub snaplen: u32,
    /// Data link type
    pub network: Linktype,
    /// Byte order of the file, probed from the magic number
    pub endianness: Endianness,
}

impl CaptureHeader {
    /// Build a little-endian version 2.4 header
    pub fn new(snaplen: u32, network: Linktype) -> CaptureHeader {
        CaptureHeader {
            magic_number: PCAP_MAGIC,
            version_major: 2,
            version_minor: 4,
            thiszone: 0,
            sigfigs: 0,
            snaplen,
            network,
            endianness: Endianness::Little,
        }
    }

    pub const fn size(&self) -> usize {
        PCAP_HEADER_SIZE
    }

    pub fn is_bigendian(&self) -> bool {
        self.endianness == Endianness::Big
    }

    pub fn layout(&self) -> Layout {
        capture_header_layout(self.endianness)
    }

    fn from_record(record: &Record, endianness: Endianness) -> Result<CaptureHeader, DissectError> {
        Ok(CaptureHeader {
            magic_number: record.get_u32("magic_number")?,
            version_major: record.get_u16("version_major")?,
            version_minor: record.get_u16("version_minor")?,
            thiszone: record.get_i32("thiszone")?,
            sigfigs: record.get_u32("sigfigs")?,
            snaplen: record.get_u32("snaplen")?,
            network: Linktype(record.get_i32("network")?),
            endianness,
        })
    }

    pub(crate) fn to_record(&self) -> Record {
        Record::with_capacity(CAPTURE_HEADER_FIELDS.len())
            .with("magic_number", self.magic_number)
            .with("version_major", self.version_major)
            .with("version_minor", self.version_minor)
            .with("thiszone", self.thiszone)
            .with("sigfigs", self.sigfigs)
            .with("snaplen", self.snaplen)
            .with("network", self.network.0)
    }
}

impl Default for CaptureHeader {
    fn default() -> Self {
        CaptureHeader::new(65535, Linktype::IEEE802_11_RADIOTAP)
    }
}

/// Find the byte order of a capture from its first 4 bytes
///
/// The magic number must match `0xa1b2c3d4` exactly, read either as little-endian or as
/// big-endian. Any other value (including the nanosecond and "modified" pcap variants) is
/// rejected.
pub fn probe_endianness(magic: [u8; 4]) -> Result<Endianness, DissectError> {
    if u32::from_le_bytes(magic) == PCAP_MAGIC {
        Ok(Endianness::Little)
    } else if u32::from_be_bytes(magic) == PCAP_MAGIC {
        Ok(Endianness::Big)
    } else {
        Err(DissectError::InvalidMagic(u32::from_le_bytes(magic)))
    }
}

/// Read the capture file global header
///
/// The byte order of the file is probed from the magic number, then the rest of the header
/// is decoded in that order. Only version 2.4 is accepted.
pub fn parse_capture_header(i: &[u8]) -> IResult<&[u8], CaptureHeader, DissectError> {
    let truncated = |available| {
        nom::Err::Error(DissectError::TruncatedCapture {
            expected: PCAP_HEADER_SIZE,
            available,
        })
    };
    let magic = i
        .get(..4)
        .and_then(|m| <[u8; 4]>::try_from(m).ok())
        .ok_or_else(|| truncated(i.len()))?;
    let endianness = probe_endianness(magic).map_err(nom::Err::Error)?;
    if i.len() < PCAP_HEADER_SIZE {
        return Err(truncated(i.len()));
    }
    let (rem, record) = capture_header_layout(endianness).decode(i)?;
    let header = CaptureHeader::from_record(&record, endianness).map_err(nom::Err::Error)?;
    if header.version_major != 2 || header.version_minor != 4 {
        return Err(nom::Err::Error(DissectError::InvalidVersion {
            major: header.version_major,
            minor: header.version_minor,
        }));
    }
    if header.thiszone != 0 || header.sigfigs != 0 {
        warn!(
            "capture header has thiszone={} sigfigs={}, expected 0",
            header.thiszone, header.sigfigs
        );
    }
    if header.network != Linktype::IEEE802_11_RADIOTAP {
        warn!(
            "link type {} is not radiotap, payloads are decoded as radiotap anyway",
            header.network
        );
    }
    debug!(
        "capture header version {}.{}, {:?} endian, snaplen {}, link type {}",
        header.version_major,
        header.version_minor,
        header.endianness,
        header.snaplen,
        header.network
    );
    Ok((rem, header))
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use hex_literal::hex;

    // little-endian radiotap capture, snaplen 180
    pub const PCAP_HDR_LE: &[u8] = &hex!(
        "
D4 C3 B2 A1 02 00 04 00 00 00 00 00 00 00 00 00
B4 00 00 00 7F 00 00 00"
    );

    pub const PCAP_HDR_BE: &[u8] = &hex!(
        "
A1 B2 C3 D4 00 02 00 04 00 00 00 00 00 00 00 00
00 00 00 B4 00 00 00 7F"
    );

    #[test]
    fn test_parse_capture_header_le() {
        let (rem, hdr) = parse_capture_header(PCAP_HDR_LE).expect("header parsing failed");
        assert!(rem.is_empty());
        assert_eq!(hdr.magic_number, PCAP_MAGIC);
        assert_eq!(hdr.version_major, 2);
        assert_eq!(hdr.version_minor, 4);
        assert_eq!(hdr.thiszone, 0);
        assert_eq!(hdr.sigfigs, 0);
        assert_eq!(hdr.snaplen, 180);
        assert_eq!(hdr.network, Linktype::IEEE802_11_RADIOTAP);
        assert!(!hdr.is_bigendian());
    }

    #[test]
    fn test_parse_capture_header_be() {
        let (rem, hdr) = parse_capture_header(PCAP_HDR_BE).expect("header parsing failed");
        assert!(rem.is_empty());
        assert_eq!(hdr.magic_number, PCAP_MAGIC);
        assert_eq!(hdr.snaplen, 180);
        assert_eq!(hdr.network, Linktype(127));
        assert!(hdr.is_bigendian());
    }

    #[test]
    fn test_probe_endianness() {
        assert_eq!(probe_endianness(hex!("D4 C3 B2 A1")), Ok(Endianness::Little));
        assert_eq!(probe_endianness(hex!("A1 B2 C3 D4")), Ok(Endianness::Big));
        // half-swapped and nanosecond magics are not accepted
        assert!(probe_endianness(hex!("C3 D4 A1 B2")).is_err());
        assert!(probe_endianness(hex!("4D 3C B2 A1")).is_err());
        assert!(probe_endianness(hex!("00 00 00 00")).is_err());
    }

    #[test]
    fn test_invalid_magic() {
        let mut data = PCAP_HDR_LE.to_vec();
        data[0] = 0xd5;
        match parse_capture_header(&data) {
            Err(nom::Err::Error(DissectError::InvalidMagic(m))) => assert_eq!(m, 0xa1b2_c3d5),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_invalid_version() {
        let mut data = PCAP_HDR_LE.to_vec();
        data[6] = 0x03;
        match parse_capture_header(&data) {
            Err(nom::Err::Error(DissectError::InvalidVersion { major, minor })) => {
                assert_eq!((major, minor), (2, 3));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_truncated_header() {
        match parse_capture_header(&PCAP_HDR_LE[..10]) {
            Err(nom::Err::Error(DissectError::TruncatedCapture {
                expected,
                available,
            })) => {
                assert_eq!(expected, 24);
                assert_eq!(available, 10);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(parse_capture_header(&[]).is_err());
    }

    #[test]
    fn test_header_encode() {
        let hdr = CaptureHeader::new(180, Linktype::IEEE802_11_RADIOTAP);
        let data = hdr.layout().encode(&hdr.to_record()).expect("encode");
        assert_eq!(data, PCAP_HDR_LE);
    }
}
