//! Fixed-length fields of management frame bodies (802.11-2012 8.4.1)

use std::convert::TryFrom;
use std::time::Duration;

use crate::endianness::Endianness;
use crate::error::DissectError;
use crate::structure::{Field, Layout, Primitive, Record, Structure};

/// Duration of a Time Unit, in microseconds
pub const TU_MICROS: u64 = 1024;

const TIMESTAMP_FIELDS: &[Field] = &[Field::scalar("timestamp", Primitive::U64)];
const BEACON_INTERVAL_FIELDS: &[Field] = &[Field::scalar("beacon_interval", Primitive::U16)];
const CAPABILITY_FIELDS: &[Field] = &[Field::array("capability", Primitive::U8, 2)];

/// TSF timer of the sender, in microseconds
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimestampField(pub u64);

impl Structure for TimestampField {
    const LAYOUT: Layout = Layout::new(Endianness::Little, TIMESTAMP_FIELDS);

    fn from_record(record: &Record) -> Result<Self, DissectError> {
        Ok(TimestampField(record.get_u64("timestamp")?))
    }

    fn to_record(&self) -> Record {
        Record::with_capacity(1).with("timestamp", self.0)
    }
}

/// Time between two beacons
///
/// Encoded as a number of Time Units (1 TU = 1024 µs).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BeaconIntervalField(pub Duration);

impl Structure for BeaconIntervalField {
    const LAYOUT: Layout = Layout::new(Endianness::Little, BEACON_INTERVAL_FIELDS);

    fn from_record(record: &Record) -> Result<Self, DissectError> {
        let tu = record.get_u16("beacon_interval")?;
        Ok(BeaconIntervalField(Duration::from_micros(
            u64::from(tu) * TU_MICROS,
        )))
    }

    fn to_record(&self) -> Record {
        let tu = self.0.as_micros() / u128::from(TU_MICROS);
        // values that do not fit are rejected by the layout encoder
        let tu = u64::try_from(tu).unwrap_or(u64::MAX);
        Record::with_capacity(1).with("beacon_interval", tu)
    }
}

/// Capability information field (802.11-2012 8.4.1.4)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CapabilityInfo {
    pub ess: bool,
    pub ibss: bool,
    pub cf_pollable: bool,
    pub cf_poll_request: bool,
    pub privacy: bool,
    pub short_preamble: bool,
    pub pbcc: bool,
    pub channel_agility: bool,
    pub short_slot_time: bool,
    pub dsss_ofdm: bool,
    pub raw: [u8; 2],
}

impl CapabilityInfo {
    pub fn from_bytes(cap: [u8; 2]) -> CapabilityInfo {
        CapabilityInfo {
            ess: cap[0] & 0x01 != 0,
            ibss: cap[0] & 0x02 != 0,
            cf_pollable: cap[0] & 0x04 != 0,
            cf_poll_request: cap[0] & 0x08 != 0,
            privacy: cap[0] & 0x10 != 0,
            short_preamble: cap[0] & 0x20 != 0,
            pbcc: cap[0] & 0x40 != 0,
            channel_agility: cap[0] & 0x80 != 0,
            short_slot_time: cap[1] & 0x04 != 0,
            dsss_ofdm: cap[1] & 0x20 != 0,
            raw: cap,
        }
    }
}

impl Structure for CapabilityInfo {
    const LAYOUT: Layout = Layout::new(Endianness::Little, CAPABILITY_FIELDS);

    fn from_record(record: &Record) -> Result<Self, DissectError> {
        Ok(CapabilityInfo::from_bytes(record.get_bytes("capability")?))
    }

    fn to_record(&self) -> Record {
        Record::with_capacity(1).with("capability", self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_beacon_interval() {
        let (_, interval) = BeaconIntervalField::unpack(&[100, 0]).expect("interval");
        assert_eq!(interval.0, Duration::from_micros(102_400));
        assert_eq!(interval.pack(), Ok(vec![100, 0]));
    }

    #[test]
    fn test_beacon_interval_out_of_range() {
        let interval = BeaconIntervalField(Duration::from_secs(3600));
        assert_eq!(
            interval.pack(),
            Err(DissectError::ValueOutOfRange("beacon_interval"))
        );
    }

    #[test]
    fn test_capability_info() {
        // ESS, privacy, short slot time
        let (rem, cap) = CapabilityInfo::unpack(&[0x11, 0x04]).expect("capability");
        assert!(rem.is_empty());
        assert!(cap.ess);
        assert!(cap.privacy);
        assert!(cap.short_slot_time);
        assert!(!cap.ibss);
        assert!(!cap.channel_agility);
        assert!(!cap.dsss_ofdm);
        let cap = CapabilityInfo::from_bytes([0x80, 0x20]);
        assert!(cap.channel_agility);
        assert!(!cap.ess);
        assert!(cap.dsss_ofdm);
    }

    #[test]
    fn test_timestamp() {
        let (_, ts) = TimestampField::unpack(&[1, 0, 0, 0, 0, 0, 0, 0]).expect("timestamp");
        assert_eq!(ts, TimestampField(1));
    }
}
