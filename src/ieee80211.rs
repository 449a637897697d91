//! IEEE 802.11 frames
//!
//! The frame control field is probed first, then the (type, subtype) pair selects a
//! decoder in a dispatch table. Beacons and probe requests are decoded; any other frame is
//! reported as [`Dot11Frame::Unsupported`], which is not an error.

use log::trace;
use std::time::Duration;

use crate::error::{rebase, DissectError};
use crate::structure::Structure;

mod elements;
mod fixed;
mod frame_control;
mod header;

pub use elements::*;
pub use fixed::*;
pub use frame_control::*;
pub use header::*;

/// Beacon frame (802.11-2012 8.3.3.2)
#[derive(Clone, Debug, PartialEq)]
pub struct Beacon {
    pub header: MacHeader,
    /// TSF timer of the sender, in microseconds
    pub timestamp: u64,
    pub beacon_interval: Duration,
    pub capabilities: CapabilityInfo,
    pub elements: ElementFields,
}

/// Probe request frame (802.11-2012 8.3.3.9)
#[derive(Clone, Debug, PartialEq)]
pub struct ProbeRequest {
    pub header: MacHeader,
    pub elements: ElementFields,
}

/// A decoded 802.11 frame
#[derive(Clone, Debug, PartialEq)]
pub enum Dot11Frame {
    Beacon(Beacon),
    ProbeRequest(ProbeRequest),
    /// Frame without a decoder: only the frame control field is decoded
    Unsupported {
        frame_control: FrameControl,
        type_not_supported: bool,
        subtype_not_supported: bool,
    },
}

impl Dot11Frame {
    pub fn frame_control(&self) -> &FrameControl {
        match self {
            Dot11Frame::Beacon(b) => &b.header.frame_control,
            Dot11Frame::ProbeRequest(p) => &p.header.frame_control,
            Dot11Frame::Unsupported { frame_control, .. } => frame_control,
        }
    }

    /// The MAC header, if the frame was decoded
    pub fn header(&self) -> Option<&MacHeader> {
        match self {
            Dot11Frame::Beacon(b) => Some(&b.header),
            Dot11Frame::ProbeRequest(p) => Some(&p.header),
            Dot11Frame::Unsupported { .. } => None,
        }
    }

    /// Elements of the frame body, if the frame was decoded
    pub fn elements(&self) -> Option<&ElementFields> {
        match self {
            Dot11Frame::Beacon(b) => Some(&b.elements),
            Dot11Frame::ProbeRequest(p) => Some(&p.elements),
            Dot11Frame::Unsupported { .. } => None,
        }
    }

    #[inline]
    pub fn subtype_name(&self) -> &'static str {
        self.frame_control().subtype_name()
    }
}

type DecodeFn = fn(&[u8]) -> Result<Dot11Frame, DissectError>;

/// Decoders, by (type, subtype)
const DOT11_DECODERS: &[(FrameType, u8, DecodeFn)] = &[
    (FrameType::Management, ManagementSubtype::Beacon.0, decode_beacon),
    (FrameType::Management, ManagementSubtype::ProbeRequest.0, decode_probe_request),
];

/// Split the MAC header from the frame body
fn decode_mac_header(i: &[u8]) -> Result<(MacHeader, &[u8]), DissectError> {
    let (body, header) = MacHeader::unpack(i)?;
    trace!(
        "802.11 {} from {} to {}",
        header.frame_control.subtype_name(),
        header.addr2,
        header.addr1
    );
    Ok((header, body))
}

fn decode_beacon(i: &[u8]) -> Result<Dot11Frame, DissectError> {
    let (header, body) = decode_mac_header(i)?;
    let mut offset = MacHeader::size();
    let (rem, timestamp) = TimestampField::unpack(body).map_err(|e| rebase(e, offset))?;
    offset += TimestampField::size();
    let (rem, interval) = BeaconIntervalField::unpack(rem).map_err(|e| rebase(e, offset))?;
    offset += BeaconIntervalField::size();
    let (rem, capabilities) = CapabilityInfo::unpack(rem).map_err(|e| rebase(e, offset))?;
    offset += CapabilityInfo::size();
    let elements = decode_elements(rem).map_err(|e| e.at(offset))?;
    Ok(Dot11Frame::Beacon(Beacon {
        header,
        timestamp: timestamp.0,
        beacon_interval: interval.0,
        capabilities,
        elements,
    }))
}

fn decode_probe_request(i: &[u8]) -> Result<Dot11Frame, DissectError> {
    let (header, body) = decode_mac_header(i)?;
    let elements = decode_elements(body).map_err(|e| e.at(MacHeader::size()))?;
    Ok(Dot11Frame::ProbeRequest(ProbeRequest { header, elements }))
}

/// Decode an 802.11 frame
pub fn decode_ieee80211(i: &[u8]) -> Result<Dot11Frame, DissectError> {
    let (_, fc) = FrameControl::unpack(i)?;
    let decoder = DOT11_DECODERS
        .iter()
        .find(|(frame_type, subtype, _)| fc.is_type(*frame_type, *subtype));
    match decoder {
        Some((_, _, decode)) => decode(i),
        None => {
            trace!("802.11 frame {:?} not supported", fc);
            Ok(Dot11Frame::Unsupported {
                frame_control: fc,
                type_not_supported: fc.frame_type != FrameType::Management,
                subtype_not_supported: true,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    pub const BEACON: &[u8] = &hex!(
        "
80 00 00 00 12 34 56 78 9a bc 11 11 11 11 11 11
22 22 22 22 22 22 01 00
00 00 00 00 00 00 00 00 64 00 00 00
00 04 41 42 43 44
01 08 82 84 8b 96 24 30 48 6c
05 04 00 01 00 00"
    );

    #[test]
    fn test_decode_beacon() {
        let frame = decode_ieee80211(BEACON).expect("beacon");
        let beacon = match frame {
            Dot11Frame::Beacon(b) => b,
            f => panic!("unexpected frame {:?}", f),
        };
        assert_eq!(beacon.header.addr1, MacAddress(hex!("12 34 56 78 9a bc")));
        assert_eq!(beacon.header.sequence_number(), 0);
        assert_eq!(beacon.header.fragment_number(), 1);
        assert_eq!(beacon.timestamp, 0);
        assert_eq!(beacon.beacon_interval, Duration::from_micros(102_400));
        assert_eq!(beacon.capabilities, CapabilityInfo::default());
        let ssid = beacon.elements.ssid.expect("ssid");
        assert_eq!(ssid.as_str(), "ABCD");
        let tim = beacon.elements.tim.expect("tim");
        assert_eq!(tim.dtim_period, 1);
        assert!(tim.bitmap.is_empty());
    }

    #[test]
    fn test_decode_probe_request() {
        let mut data = BEACON[..24].to_vec();
        data[0] = 0x40;
        data.extend_from_slice(&hex!("00 00 01 02 82 84"));
        let frame = decode_ieee80211(&data).expect("probe request");
        assert_eq!(frame.subtype_name(), "Probe request");
        let elements = frame.elements().expect("elements");
        assert_eq!(elements.ssid.as_ref().map(|s| s.bytes.len()), Some(0));
        assert_eq!(
            elements.supported_rates.as_ref().map(|r| r.mandatory.clone()),
            Some(vec![1.0, 2.0])
        );
    }

    #[test]
    fn test_unsupported_frames() {
        // CTS, 10 bytes only: nothing but the frame control is decoded
        let frame = decode_ieee80211(&hex!("c4 00 00 00 12 34 56 78 9a bc")).expect("cts");
        match frame {
            Dot11Frame::Unsupported {
                frame_control,
                type_not_supported,
                subtype_not_supported,
            } => {
                assert_eq!(frame_control.frame_type, FrameType::Control);
                assert!(type_not_supported);
                assert!(subtype_not_supported);
            }
            f => panic!("unexpected frame {:?}", f),
        }
        // probe response
        let frame = decode_ieee80211(&hex!("50 00")).expect("probe response");
        assert_eq!(frame.subtype_name(), "Probe response");
        assert!(frame.header().is_none());
        match frame {
            Dot11Frame::Unsupported {
                type_not_supported,
                subtype_not_supported,
                ..
            } => {
                assert!(!type_not_supported);
                assert!(subtype_not_supported);
            }
            f => panic!("unexpected frame {:?}", f),
        }
    }

    #[test]
    fn test_truncated_beacon() {
        // header complete, fixed fields cut inside the beacon interval
        match decode_ieee80211(&BEACON[..33]) {
            Err(DissectError::BufferTooShort {
                offset,
                needed,
                available,
            }) => {
                assert_eq!(offset, 32);
                assert_eq!(needed, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected result {:?}", other),
        }
        assert!(matches!(
            decode_ieee80211(&[0x80]),
            Err(DissectError::BufferTooShort { .. })
        ));
    }

    #[test]
    fn test_element_offsets_are_absolute() {
        let mut data = BEACON.to_vec();
        // SSID length 4 -> 40
        data[37] = 40;
        match decode_ieee80211(&data) {
            Err(DissectError::BufferTooShort { offset, .. }) => assert_eq!(offset, 38),
            other => panic!("unexpected result {:?}", other),
        }
    }
}
