use rusticata_macros::newtype_enum;

use crate::endianness::Endianness;
use crate::error::DissectError;
use crate::structure::{Field, Layout, Primitive, Record, Structure};

// 802.11-2012 8.2.4.1.1
const FC0_VERSION_MASK: u8 = 0x03;
const FC0_TYPE_MASK: u8 = 0x03 << 2;
const FC0_SUBTYPE_MASK: u8 = 0x0f << 4;
const FC1_TODS_MASK: u8 = 0x01 << 1;
const FC1_FROMDS_MASK: u8 = 0x01 << 2;

/// Frame type, as the unshifted bits 2-3 of the first frame control byte
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct FrameType(pub u8);

newtype_enum! {
impl display FrameType {
    Management = 0x00,
    Control = 0x04,
    Data = 0x08,
}
}

/// Subtypes of management frames (unshifted bits 4-7)
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct ManagementSubtype(pub u8);

newtype_enum! {
impl debug ManagementSubtype {
    AssocRequest = 0x00,
    AssocResponse = 0x10,
    ReassocRequest = 0x20,
    ReassocResponse = 0x30,
    ProbeRequest = 0x40,
    ProbeResponse = 0x50,
    Beacon = 0x80,
    Atim = 0x90,
    Disassoc = 0xa0,
    Auth = 0xb0,
    Deauth = 0xc0,
    Action = 0xd0,
    ActionNoAck = 0xe0, // 11n
}
}

/// Subtypes of control frames
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct ControlSubtype(pub u8);

newtype_enum! {
impl debug ControlSubtype {
    Wrapper = 0x70, // 11n
    BlockAckRequest = 0x80,
    BlockAck = 0x90,
    PsPoll = 0xa0,
    Rts = 0xb0,
    Cts = 0xc0,
    Ack = 0xd0,
    CfEnd = 0xe0,
    CfEndAck = 0xf0,
}
}

/// Subtypes of data frames (bit combination)
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct DataSubtype(pub u8);

newtype_enum! {
impl debug DataSubtype {
    Data = 0x00,
    DataCfAck = 0x10,
    DataCfPoll = 0x20,
    DataCfAckCfPoll = 0x30,
    NoData = 0x40,
    CfAck = 0x50,
    CfPoll = 0x60,
    CfAckCfPoll = 0x70,
    Qos = 0x80,
}
}

fn management_subtype_name(subtype: ManagementSubtype) -> &'static str {
    match subtype {
        ManagementSubtype::AssocRequest => "Assoc request",
        ManagementSubtype::AssocResponse => "Assoc response",
        ManagementSubtype::ReassocRequest => "Reassoc request",
        ManagementSubtype::ReassocResponse => "Reassoc response",
        ManagementSubtype::ProbeRequest => "Probe request",
        ManagementSubtype::ProbeResponse => "Probe response",
        ManagementSubtype::Beacon => "Beacon",
        ManagementSubtype::Atim => "ATIM",
        ManagementSubtype::Disassoc => "Disassoc",
        ManagementSubtype::Auth => "Auth",
        ManagementSubtype::Deauth => "Deauth",
        ManagementSubtype::Action => "Action",
        ManagementSubtype::ActionNoAck => "Action no ack",
        _ => "Unknown",
    }
}

fn control_subtype_name(subtype: ControlSubtype) -> &'static str {
    match subtype {
        ControlSubtype::Wrapper => "Wrapper",
        ControlSubtype::BlockAckRequest => "Block ack request",
        ControlSubtype::BlockAck => "Block ack",
        ControlSubtype::PsPoll => "PS poll",
        ControlSubtype::Rts => "RTS",
        ControlSubtype::Cts => "CTS",
        ControlSubtype::Ack => "ACK",
        ControlSubtype::CfEnd => "CF end",
        ControlSubtype::CfEndAck => "CF end ack",
        _ => "Unknown",
    }
}

fn data_subtype_name(subtype: DataSubtype) -> &'static str {
    match subtype {
        DataSubtype::Data => "Data",
        DataSubtype::DataCfAck => "Data CF ack",
        DataSubtype::DataCfPoll => "Data CF poll",
        DataSubtype::DataCfAckCfPoll => "Data CF ack CF poll",
        DataSubtype::NoData => "No data",
        DataSubtype::CfAck => "CF ack",
        DataSubtype::CfPoll => "CF poll",
        DataSubtype::CfAckCfPoll => "CF ack CF poll",
        DataSubtype::Qos => "QoS",
        _ => "Unknown",
    }
}

const FRAME_CONTROL_FIELDS: &[Field] = &[Field::array("fc", Primitive::U8, 2)];

/// Frame control field, the first 2 bytes of every 802.11 frame
///
/// Type and subtype keep their position in the first byte: a beacon has type `0x00` and
/// subtype `0x80`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameControl {
    pub version: u8,
    pub frame_type: FrameType,
    pub subtype: u8,
    pub to_ds: bool,
    pub from_ds: bool,
    pub raw: [u8; 2],
}

impl FrameControl {
    pub fn from_bytes(fc: [u8; 2]) -> FrameControl {
        FrameControl {
            version: fc[0] & FC0_VERSION_MASK,
            frame_type: FrameType(fc[0] & FC0_TYPE_MASK),
            subtype: fc[0] & FC0_SUBTYPE_MASK,
            to_ds: fc[1] & FC1_TODS_MASK != 0,
            from_ds: fc[1] & FC1_FROMDS_MASK != 0,
            raw: fc,
        }
    }

    #[inline]
    pub fn is_type(&self, frame_type: FrameType, subtype: u8) -> bool {
        self.frame_type == frame_type && self.subtype == subtype
    }

    /// Human-readable name of the subtype, e.g. "Beacon" or "CTS"
    pub fn subtype_name(&self) -> &'static str {
        match self.frame_type {
            FrameType::Management => management_subtype_name(ManagementSubtype(self.subtype)),
            FrameType::Control => control_subtype_name(ControlSubtype(self.subtype)),
            FrameType::Data => data_subtype_name(DataSubtype(self.subtype)),
            _ => "Unknown",
        }
    }
}

impl Structure for FrameControl {
    const LAYOUT: Layout = Layout::new(Endianness::Little, FRAME_CONTROL_FIELDS);

    fn from_record(record: &Record) -> Result<Self, DissectError> {
        Ok(FrameControl::from_bytes(record.get_bytes("fc")?))
    }

    fn to_record(&self) -> Record {
        Record::with_capacity(1).with("fc", self.raw)
    }
}
