use crate::endianness::Endianness;
use crate::error::DissectError;
use crate::ieee80211::MacHeader;
use crate::pcap::*;
use crate::radiotap::RadiotapPreamble;
use crate::structure::Structure;
use cookie_factory::combinator::slice;
use cookie_factory::gen;
use cookie_factory::sequence::tuple;
use std::convert::TryFrom;

/// Common trait for all serialization functions
pub trait ToVec {
    /// Serialize to bytes representation.
    /// Check values and fix all fields before serializing.
    fn to_vec(&mut self) -> Result<Vec<u8>, DissectError> {
        self.fix();
        self.to_vec_raw()
    }

    /// Check and correct all fields: use magic, fix lengths fields and other values if possible.
    fn fix(&mut self) {}

    /// Serialize to bytes representation. Do not check values
    fn to_vec_raw(&self) -> Result<Vec<u8>, DissectError>;
}

impl ToVec for CaptureHeader {
    /// Use the microsecond magic and version 2.4, with no timezone correction
    fn fix(&mut self) {
        self.magic_number = PCAP_MAGIC;
        self.version_major = 2;
        self.version_minor = 4;
        self.thiszone = 0;
        self.sigfigs = 0;
    }

    /// Serialize using the byte order of the header
    fn to_vec_raw(&self) -> Result<Vec<u8>, DissectError> {
        self.layout().encode(&self.to_record())
    }
}

/// Serialize a frame record header and its payload, in the given byte order
pub fn gen_frame_record(
    frame: &RawFrame,
    endianness: Endianness,
) -> Result<Vec<u8>, DissectError> {
    if u32::try_from(frame.data.len()).is_err() {
        return Err(DissectError::ValueOutOfRange("incl_len"));
    }
    let header = frame_record_layout(endianness).encode(&frame.header.to_record())?;
    let mut v = Vec::with_capacity(header.len() + frame.data.len());
    gen(tuple((slice(&header), slice(frame.data))), &mut v)
        // pcap records have no alignment constraints
        .map(|res| res.0.to_vec())
        .or(Err(DissectError::SerializeError))
}

impl<'a> ToVec for RawFrame<'a> {
    /// Set the captured length to the payload length
    ///
    /// Payloads longer than `u32::MAX` are left unchanged and rejected when serialized.
    fn fix(&mut self) {
        if let Ok(caplen) = u32::try_from(self.data.len()) {
            self.header.caplen = caplen;
            self.header.origlen = self.header.origlen.max(caplen);
        }
    }

    /// Serialize in little-endian order
    fn to_vec_raw(&self) -> Result<Vec<u8>, DissectError> {
        gen_frame_record(self, Endianness::Little)
    }
}

impl ToVec for RadiotapPreamble {
    fn fix(&mut self) {
        self.version = 0;
        self.pad = 0;
        self.header_length = self.header_length.max(RadiotapPreamble::size() as u16);
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, DissectError> {
        self.pack()
    }
}

impl ToVec for MacHeader {
    fn to_vec_raw(&self) -> Result<Vec<u8>, DissectError> {
        self.pack()
    }
}
