use std::fmt;

use crate::endianness::Endianness;
use crate::error::DissectError;
use crate::ieee80211::FrameControl;
use crate::structure::{Field, Layout, Primitive, Record, Structure};

/// IEEE 802 MAC address
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub const BROADCAST: MacAddress = MacAddress([0xff; 6]);

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let a = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            a[0], a[1], a[2], a[3], a[4], a[5]
        )
    }
}

impl fmt::Debug for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

const MAC_HEADER_FIELDS: &[Field] = &[
    Field::array("fc", Primitive::U8, 2),
    Field::scalar("duration", Primitive::U16),
    Field::array("addr1", Primitive::U8, 6),
    Field::array("addr2", Primitive::U8, 6),
    Field::array("addr3", Primitive::U8, 6),
    Field::scalar("seq", Primitive::U16),
];

/// MAC header of management frames (802.11-2012 8.3.3.1)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MacHeader {
    pub frame_control: FrameControl,
    pub duration: u16,
    /// Destination address
    pub addr1: MacAddress,
    /// Source address
    pub addr2: MacAddress,
    /// BSSID
    pub addr3: MacAddress,
    /// Raw sequence control
    pub seq: u16,
}

impl MacHeader {
    pub fn sequence_number(&self) -> u16 {
        self.seq >> 4
    }

    pub fn fragment_number(&self) -> u8 {
        (self.seq & 0x0f) as u8
    }
}

impl Structure for MacHeader {
    const LAYOUT: Layout = Layout::new(Endianness::Little, MAC_HEADER_FIELDS);

    fn from_record(record: &Record) -> Result<Self, DissectError> {
        Ok(MacHeader {
            frame_control: FrameControl::from_bytes(record.get_bytes("fc")?),
            duration: record.get_u16("duration")?,
            addr1: MacAddress(record.get_bytes("addr1")?),
            addr2: MacAddress(record.get_bytes("addr2")?),
            addr3: MacAddress(record.get_bytes("addr3")?),
            seq: record.get_u16("seq")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::with_capacity(MAC_HEADER_FIELDS.len())
            .with("fc", self.frame_control.raw)
            .with("duration", self.duration)
            .with("addr1", self.addr1.0)
            .with("addr2", self.addr2.0)
            .with("addr3", self.addr3.0)
            .with("seq", self.seq)
    }
}
