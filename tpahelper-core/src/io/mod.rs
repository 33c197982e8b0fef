//! File I/O: decoded packet dumps in, atomic artifacts out.
//!
//! The packet decoder writes one JSON document per capture. Two layouts are
//! accepted:
//!
//! - [`DumpLayout::Array`] - a top-level array of packets (decoder default)
//! - [`DumpLayout::Lines`] - one packet object per line
//!
//! Packets are handed to a callback one at a time, so a dump is never held
//! in memory as a whole.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tpahelper_core::io::PacketDumpReader;
//!
//! let mut reader = PacketDumpReader::open("target_dnp3.json").unwrap();
//! let packets = reader.process_packets(|_packet| {
//!     // extract point values...
//! }).unwrap();
//! println!("{packets} packets");
//! ```

mod atomic;
mod dump;

pub use atomic::{temp_path, write_atomic, write_atomic_with};
pub use dump::{DumpLayout, PacketDumpReader};
