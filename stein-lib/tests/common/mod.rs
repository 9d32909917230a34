#![allow(dead_code)]
use std::path::PathBuf;

use stein::event::DecodedEvent;
use stein::output::{EventWriter, Format};

pub fn fixture_path(name: &str) -> PathBuf {
    let mut path =
        PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR not set"));
    path.push("tests/fixtures");
    path.push(name);
    path
}

pub fn fixture_text(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("failed to read fixture")
}

/// Format bytes as a flight software hex dump line, e.g., `0x01, 0x02,`
pub fn hex_dump_line(dat: &[u8]) -> String {
    dat.iter()
        .map(|b| format!("0x{b:02x},"))
        .collect::<Vec<String>>()
        .join(" ")
}

/// A 512 byte packet with `subframe` repeated to fill the subframe region.
pub fn packet_with_subframe(subframe: &[u8]) -> Vec<u8> {
    let mut dat = vec![0xaf, 0, 0, 0, 0, 0, 0];
    dat.extend(subframe.iter().cycle().take(495));
    dat.extend([0u8; 10]);
    dat
}

/// Render events as a text event list with column header.
pub fn render_text<I>(events: I) -> String
where
    I: IntoIterator<Item = stein::Result<DecodedEvent>>,
{
    let mut writer = EventWriter::new(Vec::new(), Format::Text);
    writer.write_header().unwrap();
    writer.write_events(events).unwrap();
    String::from_utf8(writer.into_inner()).unwrap()
}
