use std::env;
use std::error::Error;
use std::fs::File;
use wifi_pcap_parser::ieee80211::Dot11Frame;
use wifi_pcap_parser::radiotap::RadiotapFrame;
use wifi_pcap_parser::*;

fn main() {
    let args: Vec<_> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: dot11-info <filename> ...");
        std::process::exit(1);
    }
    for arg in &args {
        if let Err(e) = print_capture_info(arg) {
            eprintln!("{}: {}", arg, e);
        }
    }
}

fn print_capture_info(arg: &str) -> Result<(), Box<dyn Error>> {
    println!("Name: {}", arg);

    let file = File::open(arg)?;
    let file_size = file.metadata()?.len();
    println!("\tfile size: {}", file_size);

    let reader = CaptureReader::new(DEFAULT_CAPACITY, file)?;
    let header = reader.header();
    let byte_order = if header.is_bigendian() {
        "big endian"
    } else {
        "little endian"
    };
    println!(
        "\tversion: {}.{}, {}",
        header.version_major, header.version_minor, byte_order
    );
    if header.thiszone != 0 {
        println!("\ttzoff: {}", header.thiszone);
    }
    if header.sigfigs != 0 {
        println!("\tsigfigs: {}", header.sigfigs);
    }
    println!("\tsnaplen: {}", header.snaplen);
    println!("\tData Link Type: {}", header.network);

    let mut num_frames = 0;
    for frame in reader.frames() {
        let frame = frame?;
        let ts = frame.timestamp();
        println!(
            "\tframe {}: recorded {}.{:06}, length {}, original length {}",
            num_frames,
            ts.as_secs(),
            ts.subsec_micros(),
            frame.header.caplen,
            frame.header.origlen
        );
        print_radiotap_info(&frame.radiotap);
        print_dot11_info(&frame.radiotap.ieee80211);
        num_frames += 1;
    }
    println!("\tnum_frames: {}", num_frames);

    Ok(())
}

fn print_radiotap_info(radiotap: &RadiotapFrame) {
    let fields = &radiotap.fields;
    let mut options = Vec::new();
    if let Some(channel) = fields.channel {
        options.push(format!("frequency: {}", channel.frequency));
        let f = channel.flags;
        for (set, name) in &[
            (f.turbo, "turbo channel"),
            (f.cck, "cck channel"),
            (f.ofdm, "ofdm channel"),
            (f.band_2ghz, "band 2ghz"),
            (f.band_5ghz, "band 5ghz"),
            (f.passive, "passive"),
            (f.dynamic, "dynamic"),
            (f.gfsk, "gfsk"),
        ] {
            if *set {
                options.push(name.to_string());
            }
        }
    }
    if let Some(f) = fields.flags {
        for (set, name) in &[
            (f.during_cfp, "during cfp"),
            (f.short_preamble, "short preamble"),
            (f.wep, "wep"),
            (f.fragmentation, "fragmentation"),
            (f.includes_fcs, "includes fcs"),
            (f.padded, "padded"),
            (f.failed_fcs_check, "failed fcs check"),
        ] {
            if *set {
                options.push(name.to_string());
            }
        }
    }
    if let Some(rate) = fields.rate {
        options.push(format!("rate: {} Mbps", rate));
    }
    if let Some(signal) = fields.antenna_signal {
        options.push(format!("signal: {} dBm", signal));
    }
    println!("\t\tradiotap: {}", options.join(", "));
}

fn print_dot11_info(frame: &Dot11Frame) {
    let fc = frame.frame_control();
    println!(
        "\t\tieee80211 frame type: {} subtype: {}",
        fc.frame_type,
        frame.subtype_name()
    );
    if let Some(header) = frame.header() {
        println!(
            "\t\t\tfrom {} to {} (bssid {})",
            header.addr2, header.addr1, header.addr3
        );
    }
    if let Some(elements) = frame.elements() {
        if let Some(ssid) = &elements.ssid {
            println!("\t\t\tssid: {:?}", ssid.as_str());
        }
        if let Some(rates) = &elements.supported_rates {
            println!(
                "\t\t\trates: {:?} optional: {:?}",
                rates.mandatory, rates.optional
            );
        }
        if let Some(channel) = elements.dsss.and_then(|d| d.current_channel) {
            println!("\t\t\tchannel: {}", channel);
        }
    }
}
