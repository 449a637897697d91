//! Registry of the radiotap fields this crate decodes
//!
//! See <http://www.radiotap.org/fields/defined> for the definition, width and alignment of
//! each field.

use log::{trace, warn};
use rusticata_macros::align_n2;
use std::time::Duration;

use crate::endianness::Endianness;
use crate::error::{rebase, DissectError};
use crate::structure::{Field, Layout, Primitive, Record};

/// `Flags` field (index 1)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RadiotapFlags {
    pub during_cfp: bool,
    pub short_preamble: bool,
    pub wep: bool,
    pub fragmentation: bool,
    /// Frame includes the FCS
    pub includes_fcs: bool,
    /// Frame has padding between the 802.11 header and payload
    pub padded: bool,
    pub failed_fcs_check: bool,
    pub raw: u8,
}

impl From<u8> for RadiotapFlags {
    fn from(raw: u8) -> Self {
        RadiotapFlags {
            during_cfp: raw & 0x01 != 0,
            short_preamble: raw & 0x02 != 0,
            wep: raw & 0x04 != 0,
            fragmentation: raw & 0x08 != 0,
            includes_fcs: raw & 0x10 != 0,
            padded: raw & 0x20 != 0,
            failed_fcs_check: raw & 0x40 != 0,
            raw,
        }
    }
}

/// Channel flags, part of the `Channel` field
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelFlags {
    pub turbo: bool,
    pub cck: bool,
    pub ofdm: bool,
    pub band_2ghz: bool,
    pub band_5ghz: bool,
    pub passive: bool,
    pub dynamic: bool,
    pub gfsk: bool,
    pub raw: u16,
}

impl From<u16> for ChannelFlags {
    fn from(raw: u16) -> Self {
        ChannelFlags {
            turbo: raw & 0x0010 != 0,
            cck: raw & 0x0020 != 0,
            ofdm: raw & 0x0040 != 0,
            band_2ghz: raw & 0x0080 != 0,
            band_5ghz: raw & 0x0100 != 0,
            passive: raw & 0x0200 != 0,
            dynamic: raw & 0x0400 != 0,
            gfsk: raw & 0x0800 != 0,
            raw,
        }
    }
}

/// `Channel` field (index 3)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Channel {
    /// Frequency in MHz
    pub frequency: u16,
    pub flags: ChannelFlags,
}

/// `FHSS` field (index 4)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fhss {
    pub hop_set: u8,
    pub hop_pattern: u8,
}

/// `RX flags` field (index 14)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RxFlags {
    pub plcp_crc_failed: bool,
    pub raw: u16,
}

impl From<u16> for RxFlags {
    fn from(raw: u16) -> Self {
        RxFlags {
            plcp_crc_failed: raw & 0x0002 != 0,
            raw,
        }
    }
}

/// Values of the radiotap fields present in a header
///
/// Fields which are not present (or present but without a registered decoder) are `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RadiotapFields {
    /// Value of the MAC's 64-bit 802.11 Time Synchronization Function timer when the
    /// first bit of the MPDU arrived at the MAC
    pub tsft: Option<Duration>,
    pub flags: Option<RadiotapFlags>,
    /// TX/RX data rate, in Mbps
    pub rate: Option<f64>,
    pub channel: Option<Channel>,
    pub fhss: Option<Fhss>,
    /// dBm
    pub antenna_signal: Option<i8>,
    /// dBm
    pub antenna_noise: Option<i8>,
    pub lock_quality: Option<u16>,
    pub tx_attenuation: Option<u16>,
    pub db_tx_attenuation: Option<u16>,
    pub dbm_tx_power: Option<i8>,
    /// Antenna index
    pub antenna: Option<u8>,
    pub db_antenna_signal: Option<u8>,
    pub db_antenna_noise: Option<u8>,
    pub rx_flags: Option<RxFlags>,
}

type ApplyFn = fn(&Record, &mut RadiotapFields) -> Result<(), DissectError>;

/// A radiotap field with a registered decoder
pub struct RadiotapField {
    /// Bit index in the presence bitmap chain
    pub index: u32,
    pub name: &'static str,
    /// Required alignment, from the start of the radiotap header
    pub align: usize,
    fields: &'static [Field],
    apply: ApplyFn,
}

impl RadiotapField {
    /// Layout of the field value (radiotap values are little-endian)
    pub const fn layout(&self) -> Layout {
        Layout::new(Endianness::Little, self.fields)
    }
}

macro_rules! radiotap_field {
    ($index:expr, $name:expr, $align:expr, $fields:expr, $apply:expr) => {
        RadiotapField {
            index: $index,
            name: $name,
            align: $align,
            fields: $fields,
            apply: $apply,
        }
    };
}

/// Registered fields, in ascending index order
pub const RADIOTAP_FIELDS: &[RadiotapField] = &[
    radiotap_field!(0, "tsft", 8, &[Field::scalar("tsft", Primitive::U64)], |r, f| {
        f.tsft = Some(Duration::from_micros(r.get_u64("tsft")?));
        Ok(())
    }),
    radiotap_field!(1, "flags", 1, &[Field::scalar("flags", Primitive::U8)], |r, f| {
        f.flags = Some(RadiotapFlags::from(r.get_u8("flags")?));
        Ok(())
    }),
    // in units of 500 kbps
    radiotap_field!(2, "rate", 1, &[Field::scalar("rate", Primitive::U8)], |r, f| {
        f.rate = Some(f64::from(r.get_u8("rate")?) / 2.0);
        Ok(())
    }),
    radiotap_field!(
        3,
        "channel",
        2,
        &[
            Field::scalar("frequency", Primitive::U16),
            Field::scalar("flags", Primitive::U16),
        ],
        |r, f| {
            f.channel = Some(Channel {
                frequency: r.get_u16("frequency")?,
                flags: ChannelFlags::from(r.get_u16("flags")?),
            });
            Ok(())
        }
    ),
    radiotap_field!(
        4,
        "fhss",
        2,
        &[
            Field::scalar("hop_set", Primitive::U8),
            Field::scalar("hop_pattern", Primitive::U8),
        ],
        |r, f| {
            f.fhss = Some(Fhss {
                hop_set: r.get_u8("hop_set")?,
                hop_pattern: r.get_u8("hop_pattern")?,
            });
            Ok(())
        }
    ),
    radiotap_field!(5, "antenna_signal", 1, &[Field::scalar("dbm", Primitive::I8)], |r, f| {
        f.antenna_signal = Some(r.get_i8("dbm")?);
        Ok(())
    }),
    radiotap_field!(6, "antenna_noise", 1, &[Field::scalar("dbm", Primitive::I8)], |r, f| {
        f.antenna_noise = Some(r.get_i8("dbm")?);
        Ok(())
    }),
    radiotap_field!(7, "lock_quality", 2, &[Field::scalar("v", Primitive::U16)], |r, f| {
        f.lock_quality = Some(r.get_u16("v")?);
        Ok(())
    }),
    radiotap_field!(8, "tx_attenuation", 2, &[Field::scalar("v", Primitive::U16)], |r, f| {
        f.tx_attenuation = Some(r.get_u16("v")?);
        Ok(())
    }),
    radiotap_field!(9, "db_tx_attenuation", 2, &[Field::scalar("v", Primitive::U16)], |r, f| {
        f.db_tx_attenuation = Some(r.get_u16("v")?);
        Ok(())
    }),
    radiotap_field!(10, "dbm_tx_power", 1, &[Field::scalar("dbm", Primitive::I8)], |r, f| {
        f.dbm_tx_power = Some(r.get_i8("dbm")?);
        Ok(())
    }),
    radiotap_field!(11, "antenna", 1, &[Field::scalar("index", Primitive::U8)], |r, f| {
        f.antenna = Some(r.get_u8("index")?);
        Ok(())
    }),
    radiotap_field!(12, "db_antenna_signal", 1, &[Field::scalar("db", Primitive::U8)], |r, f| {
        f.db_antenna_signal = Some(r.get_u8("db")?);
        Ok(())
    }),
    radiotap_field!(13, "db_antenna_noise", 1, &[Field::scalar("db", Primitive::U8)], |r, f| {
        f.db_antenna_noise = Some(r.get_u8("db")?);
        Ok(())
    }),
    radiotap_field!(14, "rx_flags", 2, &[Field::scalar("rx_flags", Primitive::U16)], |r, f| {
        f.rx_flags = Some(RxFlags::from(r.get_u16("rx_flags")?));
        Ok(())
    }),
];

/// Find the registered decoder for a field index
pub fn lookup_field(index: u32) -> Option<&'static RadiotapField> {
    RADIOTAP_FIELDS.iter().find(|f| f.index == index)
}

/// Decode the present fields of a radiotap header
///
/// `header` is the whole radiotap header (preamble included), `offset` points after the
/// presence bitmap chain and `present` lists the present field indices in ascending order.
///
/// Present fields without a registered decoder are skipped without consuming any byte, so
/// the offsets of the fields that follow them are not reliable.
pub(crate) fn decode_fields(
    header: &[u8],
    mut offset: usize,
    present: &[u32],
) -> Result<RadiotapFields, DissectError> {
    let mut fields = RadiotapFields::default();
    for &index in present {
        let field = match lookup_field(index) {
            Some(field) => field,
            None => {
                warn!("radiotap field {} present but not supported", index);
                continue;
            }
        };
        offset = align_n2!(offset, field.align);
        let data = header.get(offset..).unwrap_or(&[]);
        let layout = field.layout();
        let (_, record) = layout
            .decode(data)
            .map_err(|e| rebase(e, offset))?;
        trace!("radiotap field {} ({}) at offset {}", index, field.name, offset);
        (field.apply)(&record, &mut fields)?;
        offset += layout.byte_width();
    }
    Ok(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_sorted() {
        let indices: Vec<_> = RADIOTAP_FIELDS.iter().map(|f| f.index).collect();
        assert_eq!(indices, (0..=14).collect::<Vec<_>>());
        for f in RADIOTAP_FIELDS {
            assert!(f.align.is_power_of_two());
        }
        assert_eq!(lookup_field(3).map(|f| f.layout().byte_width()), Some(4));
        assert!(lookup_field(15).is_none());
    }

    #[test]
    fn test_decode_fields_alignment() {
        // 8-byte header, then flags at 8, channel aligned from 9 to 10, antenna signal at 14
        let mut header = vec![0u8; 8];
        header.extend_from_slice(&[0x10, 0xff, 0x85, 0x09, 0xc0, 0x00, 0xc3]);
        let fields = decode_fields(&header, 8, &[1, 3, 5]).expect("fields");
        let flags = fields.flags.expect("flags");
        assert!(flags.includes_fcs);
        assert!(!flags.wep);
        let channel = fields.channel.expect("channel");
        assert_eq!(channel.frequency, 2437);
        assert!(channel.flags.ofdm);
        assert!(channel.flags.band_2ghz);
        assert!(!channel.flags.band_5ghz);
        assert_eq!(fields.antenna_signal, Some(-61));
        assert_eq!(fields.rate, None);
    }

    #[test]
    fn test_decode_tsft() {
        let mut header = vec![0u8; 8];
        header.extend_from_slice(&1_000_000u64.to_le_bytes());
        let fields = decode_fields(&header, 8, &[0]).expect("fields");
        assert_eq!(fields.tsft, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_unknown_field_skipped() {
        // field 20 has no decoder, the rate that follows is read at the same offset
        let header = [0, 0, 0, 0, 0, 0, 0, 0, 0x04];
        let fields = decode_fields(&header, 8, &[2, 20]).expect("fields");
        assert_eq!(fields.rate, Some(2.0));
        let fields = decode_fields(&header, 8, &[20]).expect("fields");
        assert_eq!(fields, RadiotapFields::default());
    }

    #[test]
    fn test_field_past_header() {
        let header = [0u8; 9];
        match decode_fields(&header, 9, &[3]) {
            Err(DissectError::BufferTooShort { offset, needed, .. }) => {
                assert_eq!(offset, 10);
                assert_eq!(needed, 4);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }
}
