//! Radiotap header
//!
//! The radiotap header carries radio information (rate, channel, signal, ...) captured
//! along with an 802.11 frame. It starts with a 4-byte preamble, followed by a chain of
//! 32-bit presence bitmaps and by the present fields, each aligned on its natural
//! boundary. All values are little-endian.
//!
//! See <http://www.radiotap.org/> for details.

use log::{debug, warn};

use crate::endianness::Endianness;
use crate::error::{rebase, DissectError};
use crate::ieee80211::{decode_ieee80211, Dot11Frame};
use crate::structure::{Field, Layout, Primitive, Record, Structure};

mod fields;

pub use fields::*;

/// Bit of a presence bitmap announcing another bitmap
pub const PRESENCE_EXT: u32 = 1 << 31;

const PRESENCE_FIELDS: &[Field] = &[Field::scalar("present", Primitive::U32)];
const PRESENCE_LAYOUT: Layout = Layout::new(Endianness::Little, PRESENCE_FIELDS);

const PREAMBLE_FIELDS: &[Field] = &[
    Field::scalar("version", Primitive::U8),
    Field::scalar("pad", Primitive::U8),
    Field::scalar("header_length", Primitive::U16),
];

/// Fixed start of the radiotap header
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RadiotapPreamble {
    pub version: u8,
    pub pad: u8,
    /// Length of the whole radiotap header, preamble and fields included
    pub header_length: u16,
}

impl Structure for RadiotapPreamble {
    const LAYOUT: Layout = Layout::new(Endianness::Little, PREAMBLE_FIELDS);

    fn from_record(record: &Record) -> Result<Self, DissectError> {
        Ok(RadiotapPreamble {
            version: record.get_u8("version")?,
            pad: record.get_u8("pad")?,
            header_length: record.get_u16("header_length")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::with_capacity(3)
            .with("version", self.version)
            .with("pad", self.pad)
            .with("header_length", self.header_length)
    }
}

/// A decoded radiotap header, with the 802.11 frame that follows it
#[derive(Clone, Debug, PartialEq)]
pub struct RadiotapFrame {
    pub version: u8,
    pub header_length: u16,
    /// Raw presence bitmaps, in chain order
    pub bitmaps: Vec<u32>,
    /// Indices of the present fields, in ascending order
    pub present: Vec<u32>,
    pub fields: RadiotapFields,
    pub ieee80211: Dot11Frame,
}

impl RadiotapFrame {
    /// Returns true if field `index` is marked present
    pub fn is_present(&self, index: u32) -> bool {
        self.present.binary_search(&index).is_ok()
    }
}

/// Expand a presence bitmap chain into present field indices
///
/// Bit `b` of bitmap `n` designates field `b + 32 * n`. The extension bit (31) of each
/// bitmap is not a field.
pub fn present_indices(bitmaps: &[u32]) -> Vec<u32> {
    let mut present = Vec::new();
    for (n, bitmap) in (0u32..).zip(bitmaps) {
        for b in 0..31 {
            if bitmap & (1 << b) != 0 {
                present.push(b + 32 * n);
            }
        }
    }
    present
}

/// Read the presence bitmap chain starting at `offset` in `header`
///
/// Returns the bitmaps and the offset following the chain.
fn decode_presence_chain(
    header: &[u8],
    mut offset: usize,
) -> Result<(Vec<u32>, usize), DissectError> {
    let mut bitmaps = Vec::new();
    loop {
        let data = header.get(offset..).unwrap_or(&[]);
        let (_, record) = PRESENCE_LAYOUT
            .decode(data)
            .map_err(|e| rebase(e, offset))?;
        let bitmap = record.get_u32("present")?;
        bitmaps.push(bitmap);
        offset += PRESENCE_LAYOUT.byte_width();
        if bitmap & PRESENCE_EXT == 0 {
            return Ok((bitmaps, offset));
        }
    }
}

/// Decode a radiotap header and the 802.11 frame following it
///
/// Decoding never reads past the declared header length: a field (or bitmap) crossing
/// that boundary is a `BufferTooShort` error. Offsets in errors are relative to `i`.
pub fn decode_radiotap(i: &[u8]) -> Result<RadiotapFrame, DissectError> {
    let (_, preamble) = RadiotapPreamble::unpack(i)?;
    let header_length = usize::from(preamble.header_length);
    if header_length > i.len() || header_length < RadiotapPreamble::size() {
        return Err(DissectError::InvalidRadiotapHeader {
            header_length,
            available: i.len(),
        });
    }
    if preamble.version != 0 {
        warn!("unexpected radiotap version {}", preamble.version);
    }
    let (header, payload) = i.split_at(header_length);
    let (bitmaps, offset) = decode_presence_chain(header, RadiotapPreamble::size())?;
    let present = present_indices(&bitmaps);
    debug!(
        "radiotap header: {} bytes, {} bitmap(s), present {:?}",
        header_length,
        bitmaps.len(),
        present
    );
    let fields = decode_fields(header, offset, &present)?;
    let ieee80211 = decode_ieee80211(payload).map_err(|e| e.at(header_length))?;
    Ok(RadiotapFrame {
        version: preamble.version,
        header_length: preamble.header_length,
        bitmaps,
        present,
        fields,
        ieee80211,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    // flags, rate, channel, antenna signal, antenna, dB antenna signal
    const RADIOTAP_HDR: &[u8] = &hex!("00 00 11 00 2e 18 00 00 00 02 60 09 80 00 c3 00 00");

    // probe request, wildcard SSID, no rates
    const PROBE_REQUEST: &[u8] = &hex!(
        "
40 00 00 00 ff ff ff ff ff ff 11 11 11 11 11 11
ff ff ff ff ff ff 10 00 00 00"
    );

    fn frame(header: &[u8]) -> Vec<u8> {
        let mut v = header.to_vec();
        v.extend_from_slice(PROBE_REQUEST);
        v
    }

    #[test]
    fn test_present_indices() {
        assert_eq!(present_indices(&[0x0000_182e]), vec![1, 2, 3, 5, 11, 12]);
        // bit 0 of the second bitmap is field 32, bit 2 of the third is field 66
        assert_eq!(
            present_indices(&[0x8000_0002, 0x8000_0001, 0x0000_0004]),
            vec![1, 32, 66]
        );
        assert!(present_indices(&[PRESENCE_EXT]).is_empty());
    }

    #[test]
    fn test_decode_radiotap() {
        let data = frame(RADIOTAP_HDR);
        let rt = decode_radiotap(&data).expect("radiotap");
        assert_eq!(rt.version, 0);
        assert_eq!(rt.header_length, 17);
        assert_eq!(rt.present, vec![1, 2, 3, 5, 11, 12]);
        assert!(rt.is_present(11));
        assert!(!rt.is_present(0));
        let flags = rt.fields.flags.expect("flags");
        assert_eq!(flags, RadiotapFlags::default());
        assert_eq!(rt.fields.rate, Some(1.0));
        let channel = rt.fields.channel.expect("channel");
        assert_eq!(channel.frequency, 2400);
        assert!(channel.flags.band_2ghz);
        assert_eq!(rt.fields.antenna_signal, Some(-61));
        assert_eq!(rt.fields.antenna, Some(0));
        assert_eq!(rt.fields.db_antenna_signal, Some(0));
        assert_eq!(rt.ieee80211.subtype_name(), "Probe request");
    }

    #[test]
    fn test_extended_bitmaps() {
        // two bitmaps: tsft in the first, field 33 (no decoder) in the second;
        // tsft is aligned on 8 bytes, after the 12 bytes of preamble and bitmaps
        let header = hex!(
            "
00 00 18 00 01 00 00 80 02 00 00 00 00 00 00 00
40 42 0f 00 00 00 00 00"
        );
        let rt = decode_radiotap(&frame(&header)).expect("radiotap");
        assert_eq!(rt.bitmaps, vec![0x8000_0001, 0x0000_0002]);
        assert_eq!(rt.present, vec![0, 33]);
        assert_eq!(rt.fields.tsft, Some(std::time::Duration::from_secs(1)));
    }

    #[test]
    fn test_header_length_exceeds_buffer() {
        let data = hex!("00 00 40 00 00 00 00 00");
        assert_eq!(
            decode_radiotap(&data),
            Err(DissectError::InvalidRadiotapHeader {
                header_length: 64,
                available: 8
            })
        );
        let data = hex!("00 00 02 00 00 00 00 00");
        assert!(matches!(
            decode_radiotap(&data),
            Err(DissectError::InvalidRadiotapHeader { .. })
        ));
    }

    #[test]
    fn test_field_crosses_header_length() {
        // channel announced but the header stops after the bitmap
        let mut data = hex!("00 00 0a 00 08 00 00 00 00 00").to_vec();
        data.extend_from_slice(PROBE_REQUEST);
        match decode_radiotap(&data) {
            Err(DissectError::BufferTooShort {
                offset, available, ..
            }) => {
                assert_eq!(offset, 8);
                assert_eq!(available, 2);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_short_buffer() {
        assert!(matches!(
            decode_radiotap(&[0, 0]),
            Err(DissectError::BufferTooShort { .. })
        ));
    }

    #[test]
    fn test_preamble_pack() {
        let preamble = RadiotapPreamble {
            version: 0,
            pad: 0,
            header_length: 17,
        };
        assert_eq!(preamble.pack(), Ok(vec![0, 0, 17, 0]));
        assert_eq!(RadiotapPreamble::unpack(&[0, 0, 17, 0]), Ok((&[][..], preamble)));
    }
}
