//! # 802.11 capture parser
//!
//! This crate decodes captured wireless traffic, layer by layer:
//!
//! - the capture file container (legacy pcap, little or big-endian, microsecond timestamps),
//! - the [radiotap](http://www.radiotap.org/) header of each captured frame,
//! - the 802.11 MAC header, with dedicated decoders for beacons and probe requests,
//! - the information elements of the frame body.
//!
//! Each layer produces a typed record and attaches the record of the layer it
//! encapsulates: a [`CaptureFrame`] holds a [`RadiotapFrame`](radiotap::RadiotapFrame),
//! which holds a [`Dot11Frame`](ieee80211::Dot11Frame).
//!
//! All fixed-size records are described with the declarative layouts of the
//! [`structure`] module, which centralizes byte order and width handling for both
//! decoding and encoding.
//!
//! # Example: streaming parser
//!
//! The following code shows how to read a capture file with a [`CaptureReader`], which
//! uses a circular buffer so memory usage does not depend on the file size.
//!
//! ```rust
//! use wifi_pcap_parser::*;
//! use wifi_pcap_parser::ieee80211::Dot11Frame;
//! use std::fs::File;
//!
//! # let path = "assets/beacon.pcap";
//! let file = File::open(path).unwrap();
//! let reader = CaptureReader::new(65536, file).expect("CaptureReader");
//! for frame in reader.frames() {
//!     let frame = frame.expect("error while reading");
//!     if let Dot11Frame::Beacon(beacon) = &frame.radiotap.ieee80211 {
//!         let ssid = beacon.elements.ssid.as_ref().map(|s| s.as_str());
//!         println!("beacon from {}: {:?}", beacon.header.addr2, ssid);
//!     }
//! }
//! ```
//!
//! For data already loaded in memory, use [`CaptureSlice`] or [`parse_capture`].

mod endianness;
mod error;
mod linktype;
pub use endianness::*;
pub use error::*;
pub use linktype::*;

pub mod structure;

pub mod pcap;
pub use pcap::*;

pub mod ieee80211;
pub mod radiotap;
pub use ieee80211::{decode_element, decode_elements, decode_ieee80211};
pub use radiotap::decode_radiotap;

mod serialize;
pub use serialize::*;
