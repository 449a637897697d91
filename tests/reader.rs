use std::fs::File;
use std::io::{BufReader, Read};

use wifi_pcap_parser::ieee80211::Dot11Frame;
use wifi_pcap_parser::*;

#[test]
fn test_empty_reader_error() {
    let empty: &[u8] = &[];
    let res = CaptureReader::new(1024, empty);
    assert!(matches!(
        res.map(|_| ()),
        Err(DissectError::TruncatedCapture {
            expected: 24,
            available: 0
        })
    ));
}

#[test]
fn test_reader_beacon() {
    let path = "assets/beacon.pcap";
    let file = File::open(path).unwrap();
    let mut reader = CaptureReader::new(DEFAULT_CAPACITY, file).expect("CaptureReader");
    assert_eq!(reader.header().network, Linktype::IEEE802_11_RADIOTAP);
    let frame = reader.next_frame().expect("frame").expect("one frame");
    assert!(matches!(frame.radiotap.ieee80211, Dot11Frame::Beacon(_)));
    assert_eq!(reader.next_frame(), Ok(None));
    assert_eq!(reader.consumed(), 115);
}

#[test]
fn test_reader_probe_requests() {
    let path = "assets/probe-requests.pcap";
    let file = File::open(path).unwrap();
    let buffered = BufReader::new(file);
    let reader = CaptureReader::new(65536, buffered).expect("CaptureReader");
    let mut num_frames = 0;
    for (idx, frame) in reader.frames().enumerate() {
        let frame = frame.expect("error while reading");
        assert_eq!(frame.header.ts_sec, 1000 + idx as u32);
        assert_eq!(frame.radiotap.ieee80211.subtype_name(), "Probe request");
        num_frames += 1;
    }
    assert_eq!(num_frames, 100);
}

#[test]
fn test_reader_small_buffer() {
    // the buffer is smaller than a single record, and has to grow
    let path = "assets/probe-requests.pcap";
    let file = File::open(path).unwrap();
    let reader = CaptureReader::new(32, file).expect("CaptureReader");
    let frames: Vec<_> = reader.frames().collect();
    assert_eq!(frames.len(), 100);
    assert!(frames.iter().all(|f| f.is_ok()));
}

#[test]
fn test_reader_one_byte_reads() {
    // a source returning at most one byte per read
    struct Trickle<'a>(&'a [u8]);

    impl<'a> Read for Trickle<'a> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match (self.0.split_first(), buf.first_mut()) {
                (Some((b, rem)), Some(out)) => {
                    *out = *b;
                    self.0 = rem;
                    Ok(1)
                }
                _ => Ok(0),
            }
        }
    }

    let data = std::fs::read("assets/beacon.pcap").unwrap();
    let reader = CaptureReader::new(1024, Trickle(&data)).expect("CaptureReader");
    let frames: Vec<_> = reader.frames().collect();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].as_ref().map(|f| f.header.caplen), Ok(75));
}

#[test]
fn test_truncated_capture() {
    let path = "assets/truncated.pcap";
    let file = File::open(path).unwrap();
    let mut reader = CaptureReader::new(65536, file).expect("CaptureReader");
    assert_eq!(
        reader.next_frame(),
        Err(DissectError::TruncatedCapture {
            expected: 91,
            available: 81
        })
    );
}

#[test]
fn test_frames_stop_after_error() {
    let mut data = std::fs::read("assets/probe-requests.pcap").unwrap();
    // ts_usec of the third record
    let offset = 24 + 2 * 73 + 4;
    data[offset..offset + 4].copy_from_slice(&2_000_000u32.to_le_bytes());
    let reader = CaptureReader::new(4096, &data[..]).expect("CaptureReader");
    let frames: Vec<_> = reader.frames().collect();
    assert_eq!(frames.len(), 3);
    assert!(frames[0].is_ok());
    assert!(frames[1].is_ok());
    assert_eq!(frames[2], Err(DissectError::InvalidTimestamp(2_000_000)));
}

fn probe_capture_header() -> Vec<u8> {
    let data = std::fs::read("assets/probe-requests.pcap").unwrap();
    data[..24].to_vec()
}

#[test]
fn test_huge_caplen_truncated() {
    // record header announcing 0xfffffff0 bytes, followed by 4 bytes only
    let mut data = probe_capture_header();
    data.extend_from_slice(&[0; 8]);
    data.extend_from_slice(&0xffff_fff0u32.to_le_bytes());
    data.extend_from_slice(&0xffff_fff0u32.to_le_bytes());
    data.extend_from_slice(&[1, 2, 3, 4]);
    let mut reader = CaptureReader::new(DEFAULT_CAPACITY, &data[..]).expect("CaptureReader");
    let res = reader.next_frame();
    assert!(
        matches!(
            res,
            Err(DissectError::TruncatedCapture {
                expected,
                available: 20
            }) if expected as u64 == 16 + 0xffff_fff0
        ),
        "unexpected result {:?}",
        res
    );
}

#[test]
fn test_record_too_large() {
    // a valid-looking record larger than the snaplen, from an endless source
    let mut data = probe_capture_header();
    data.extend_from_slice(&[0; 8]);
    data.extend_from_slice(&100_000u32.to_le_bytes());
    data.extend_from_slice(&100_000u32.to_le_bytes());
    let source = std::io::Cursor::new(data).chain(std::io::repeat(0));
    let reader = CaptureReader::new(4096, source).expect("CaptureReader");
    let frames: Vec<_> = reader.frames().collect();
    assert_eq!(
        frames,
        vec![Err(DissectError::RecordTooLarge {
            length: 100_000,
            limit: 65536
        })]
    );
}

#[test]
fn test_bad_payload_does_not_stop_frames() {
    let mut data = std::fs::read("assets/probe-requests.pcap").unwrap();
    // radiotap header_length of the second record
    let offset = 24 + 73 + 16 + 2;
    data[offset..offset + 2].copy_from_slice(&0xffffu16.to_le_bytes());
    let reader = CaptureReader::new(DEFAULT_CAPACITY, &data[..]).expect("CaptureReader");
    let frames: Vec<_> = reader.frames().collect();
    assert_eq!(frames.len(), 100);
    assert_eq!(
        frames[1],
        Err(DissectError::InvalidRadiotapHeader {
            header_length: 0xffff,
            available: 57
        })
    );
    assert_eq!(frames.iter().filter(|f| f.is_ok()).count(), 99);
    assert_eq!(frames[99].as_ref().map(|f| f.header.ts_sec), Ok(1099));
}
