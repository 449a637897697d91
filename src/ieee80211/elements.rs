//! Information elements (802.11-2012 8.4.2)
//!
//! Elements are `(id, length, value)` triples. The length byte alone tells where the next
//! element starts, so elements of unknown type are skipped without being interpreted.

use log::trace;
use rusticata_macros::newtype_enum;
use std::borrow::Cow;

use crate::endianness::Endianness;
use crate::error::{rebase, DissectError};
use crate::structure::{Field, Layout, Primitive, Record, Structure};

/// Maximum length of a valid SSID
pub const SSID_MAX_LENGTH: usize = 32;

#[derive(Clone, Copy, Default, Eq, PartialEq)]
pub struct ElementId(pub u8);

newtype_enum! {
impl debug ElementId {
    Ssid = 0,
    SupportedRates = 1,
    FhParameterSet = 2,
    DsssParameterSet = 3,
    CfParameterSet = 4,
    Tim = 5,
    IbssParameterSet = 6,
    Country = 7,
}
}

const ELEMENT_HEADER_FIELDS: &[Field] = &[
    Field::scalar("element_id", Primitive::U8),
    Field::scalar("length", Primitive::U8),
];

/// Element id and length
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ElementHeader {
    pub element_id: ElementId,
    pub length: u8,
}

impl Structure for ElementHeader {
    const LAYOUT: Layout = Layout::new(Endianness::Little, ELEMENT_HEADER_FIELDS);

    fn from_record(record: &Record) -> Result<Self, DissectError> {
        Ok(ElementHeader {
            element_id: ElementId(record.get_u8("element_id")?),
            length: record.get_u8("length")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::with_capacity(2)
            .with("element_id", self.element_id.0)
            .with("length", self.length)
    }
}

const TIM_HEADER_FIELDS: &[Field] = &[
    Field::scalar("dtim_count", Primitive::U8),
    Field::scalar("dtim_period", Primitive::U8),
    Field::scalar("bitmap_control", Primitive::U8),
];

struct TimHeader {
    dtim_count: u8,
    dtim_period: u8,
    bitmap_control: u8,
}

impl Structure for TimHeader {
    const LAYOUT: Layout = Layout::new(Endianness::Little, TIM_HEADER_FIELDS);

    fn from_record(record: &Record) -> Result<Self, DissectError> {
        Ok(TimHeader {
            dtim_count: record.get_u8("dtim_count")?,
            dtim_period: record.get_u8("dtim_period")?,
            bitmap_control: record.get_u8("bitmap_control")?,
        })
    }

    fn to_record(&self) -> Record {
        Record::with_capacity(3)
            .with("dtim_count", self.dtim_count)
            .with("dtim_period", self.dtim_period)
            .with("bitmap_control", self.bitmap_control)
    }
}

/// SSID element
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ssid {
    pub bytes: Vec<u8>,
    /// The SSID is longer than 32 bytes
    pub invalid_length: bool,
}

impl Ssid {
    /// SSID as text, invalid UTF-8 sequences being replaced
    pub fn as_str(&self) -> Cow<str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Supported rates element, in Mbps
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SupportedRates {
    /// Rates of the basic rate set (high bit set)
    pub mandatory: Vec<f64>,
    pub optional: Vec<f64>,
}

impl SupportedRates {
    pub fn from_bytes(i: &[u8]) -> SupportedRates {
        let mut rates = SupportedRates::default();
        for &b in i {
            if b & 0x80 != 0 {
                rates.mandatory.push(f64::from(b & 0x7f) / 2.0);
            } else {
                rates.optional.push(f64::from(b) / 2.0);
            }
        }
        rates
    }
}

/// DSSS parameter set element
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DsssParameterSet {
    /// `None` if the element is empty
    pub current_channel: Option<u8>,
    /// The length of the element is not 1
    pub invalid_length: bool,
}

/// Traffic Indication Map element
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tim {
    pub dtim_count: u8,
    pub dtim_period: u8,
    pub multicast_buffered: bool,
    pub bitmap_offset: u8,
    /// Partial virtual bitmap, not interpreted
    pub bitmap: Vec<u8>,
}

/// Country element
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Country {
    pub country_string: String,
}

/// A decoded information element
#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    Ssid(Ssid),
    SupportedRates(SupportedRates),
    DsssParameterSet(DsssParameterSet),
    Tim(Tim),
    Country(Country),
    /// Element with no decoder. Its value is skipped.
    Unsupported { id: ElementId, length: u8 },
}

/// Decode one element from the start of `i`
///
/// Returns the element and the number of bytes consumed, always `2 + length`.
pub fn decode_element(i: &[u8]) -> Result<(Element, usize), DissectError> {
    let (rem, header) = ElementHeader::unpack(i)?;
    let length = usize::from(header.length);
    let value = rem.get(..length).ok_or(DissectError::BufferTooShort {
        offset: ElementHeader::size(),
        needed: length,
        available: rem.len(),
    })?;
    trace!("element {:?} length {}", header.element_id, length);
    let element = match header.element_id {
        ElementId::Ssid => Element::Ssid(Ssid {
            bytes: value.to_vec(),
            invalid_length: length > SSID_MAX_LENGTH,
        }),
        ElementId::SupportedRates => Element::SupportedRates(SupportedRates::from_bytes(value)),
        ElementId::DsssParameterSet => Element::DsssParameterSet(DsssParameterSet {
            current_channel: value.first().copied(),
            invalid_length: length != 1,
        }),
        ElementId::Tim => {
            let (bitmap, tim) = TimHeader::unpack(value)
                .map_err(|e| rebase(e, ElementHeader::size()))?;
            Element::Tim(Tim {
                dtim_count: tim.dtim_count,
                dtim_period: tim.dtim_period,
                multicast_buffered: tim.bitmap_control & 0x80 != 0,
                bitmap_offset: tim.bitmap_control & 0x7f,
                bitmap: bitmap.to_vec(),
            })
        }
        ElementId::Country => {
            let code = &value[..value.len().min(3)];
            Element::Country(Country {
                country_string: String::from_utf8_lossy(code).into_owned(),
            })
        }
        id => Element::Unsupported {
            id,
            length: header.length,
        },
    };
    Ok((element, ElementHeader::size() + length))
}

/// Fields contributed by the elements of a frame body
///
/// When an element appears more than once, the last one wins.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementFields {
    pub ssid: Option<Ssid>,
    pub supported_rates: Option<SupportedRates>,
    pub dsss: Option<DsssParameterSet>,
    pub tim: Option<Tim>,
    pub country: Option<Country>,
    /// Ids of skipped elements, in stream order
    pub unsupported: Vec<ElementId>,
}

impl ElementFields {
    pub fn merge(&mut self, element: Element) {
        match element {
            Element::Ssid(v) => self.ssid = Some(v),
            Element::SupportedRates(v) => self.supported_rates = Some(v),
            Element::DsssParameterSet(v) => self.dsss = Some(v),
            Element::Tim(v) => self.tim = Some(v),
            Element::Country(v) => self.country = Some(v),
            Element::Unsupported { id, .. } => self.unsupported.push(id),
        }
    }
}

/// Decode an element stream until the region is exhausted
pub fn decode_elements(i: &[u8]) -> Result<ElementFields, DissectError> {
    let mut fields = ElementFields::default();
    let mut offset = 0;
    while offset < i.len() {
        let (element, consumed) = decode_element(&i[offset..]).map_err(|e| e.at(offset))?;
        fields.merge(element);
        offset += consumed;
    }
    Ok(fields)
}
