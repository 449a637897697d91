use rusticata_macros::newtype_enum;

/// Data link type
///
/// The link-layer header type specifies the type of headers at the beginning
/// of the packet. Only `IEEE802_11_RADIOTAP` payloads are decoded by this crate.
///
/// See <http://www.tcpdump.org/linktypes.html>
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Linktype(pub i32);

newtype_enum! {
impl display Linktype {
    NULL = 0,
    ETHERNET = 1,

    // IEEE 802.11 wireless LAN, no radio header
    IEEE802_11 = 105,
    // Prism monitor mode information followed by an 802.11 header
    IEEE802_11_PRISM = 119,
    // Radiotap link-layer information followed by an 802.11 header
    IEEE802_11_RADIOTAP = 127,
    // AVS monitor mode information followed by an 802.11 header
    IEEE802_11_AVS = 163,
    // Per-Packet Information
    PPI = 192,
}
}

#[cfg(test)]
mod tests {
    use super::Linktype;

    #[test]
    fn test_linktype_display() {
        assert_eq!(Linktype(127).to_string(), "IEEE802_11_RADIOTAP");
        assert_eq!(Linktype::IEEE802_11_RADIOTAP, Linktype(127));
    }
}
