//! Capture file container
//!
//! A capture starts with a 24-byte header (see [`CaptureHeader`]), followed by frame
//! records. Each record is a 16-byte header followed by the captured bytes; the captured
//! bytes start with a radiotap header.
//!
//! The byte order of the file is probed from the magic number, and applies to the
//! capture header and to every frame record header.

mod capture;
mod frame;
mod header;
mod reader;

pub use capture::*;
pub use frame::*;
pub use header::*;
pub use reader::*;
