//! Streaming reader for decoded packet dumps.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::de::{Deserializer, SeqAccess, Visitor};

use crate::error::DumpError;
use crate::tree::Node;

/// Top-level layout of a packet dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpLayout {
    /// `[ {...}, {...} ]`
    Array,
    /// `{...}\n{...}\n`
    Lines,
}

/// Reads packets from a decoder dump.
pub struct PacketDumpReader<R> {
    reader: R,
}

impl PacketDumpReader<BufReader<File>> {
    /// Open a dump file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, DumpError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| DumpError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> PacketDumpReader<R> {
    /// Wrap any buffered reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Skip leading whitespace and report the layout, or `None` for an
    /// empty dump.
    fn detect_layout(&mut self) -> Result<Option<DumpLayout>, DumpError> {
        loop {
            let buf = self.reader.fill_buf().map_err(|e| DumpError::Malformed {
                packets: 0,
                reason: e.to_string(),
            })?;
            if buf.is_empty() {
                return Ok(None);
            }

            match buf.iter().position(|b| !b.is_ascii_whitespace()) {
                Some(pos) => {
                    let layout = if buf[pos] == b'[' {
                        DumpLayout::Array
                    } else {
                        DumpLayout::Lines
                    };
                    self.reader.consume(pos);
                    return Ok(Some(layout));
                }
                None => {
                    let len = buf.len();
                    self.reader.consume(len);
                }
            }
        }
    }

    /// Feed every packet to `on_packet`, in dump order.
    ///
    /// Returns the number of packets delivered. On a syntax error the
    /// packets before it have already been delivered; the error carries
    /// that count.
    pub fn process_packets<F>(&mut self, mut on_packet: F) -> Result<u64, DumpError>
    where
        F: FnMut(Node),
    {
        let layout = match self.detect_layout()? {
            Some(layout) => layout,
            None => return Ok(0),
        };

        let mut delivered = 0u64;
        let result = match layout {
            DumpLayout::Array => self.read_array(&mut on_packet, &mut delivered),
            DumpLayout::Lines => self.read_lines(&mut on_packet, &mut delivered),
        };

        result.map_err(|e| DumpError::Malformed {
            packets: delivered,
            reason: e.to_string(),
        })?;
        Ok(delivered)
    }

    fn read_array<F>(&mut self, on_packet: &mut F, delivered: &mut u64) -> serde_json::Result<()>
    where
        F: FnMut(Node),
    {
        let mut de = serde_json::Deserializer::from_reader(&mut self.reader);
        (&mut de).deserialize_seq(PacketSeq {
            on_packet,
            delivered,
        })?;
        de.end()
    }

    fn read_lines<F>(&mut self, on_packet: &mut F, delivered: &mut u64) -> serde_json::Result<()>
    where
        F: FnMut(Node),
    {
        let stream = serde_json::Deserializer::from_reader(&mut self.reader).into_iter::<Node>();
        for packet in stream {
            on_packet(packet?);
            *delivered += 1;
        }
        Ok(())
    }
}

/// Visits the top-level array one element at a time.
struct PacketSeq<'f, F> {
    on_packet: &'f mut F,
    delivered: &'f mut u64,
}

impl<'de, F> Visitor<'de> for PacketSeq<'_, F>
where
    F: FnMut(Node),
{
    type Value = ();

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("an array of packets")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        while let Some(packet) = seq.next_element::<Node>()? {
            (self.on_packet)(packet);
            *self.delivered += 1;
        }
        Ok(())
    }
}
