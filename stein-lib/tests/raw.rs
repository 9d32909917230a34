mod common;

use std::fs::File;
use std::io::BufReader;

use stein::decode::decode_raw_records;
use stein::raw::read_records;
use stein::sub20;

use common::{fixture_path, fixture_text, render_text};

#[test]
fn decode_fixture() {
    let file = BufReader::new(File::open(fixture_path("raw_events.dat")).unwrap());
    let mut events = decode_raw_records(read_records(file));
    let text = render_text(events.by_ref());

    // trailing 2 bytes are not a complete record
    assert_eq!(text, fixture_text("raw_events.txt"));
    assert_eq!(events.summary().events, 50);
}

#[test]
fn sub20_converts_to_raw() {
    let tmpdir = tempfile::tempdir().unwrap();
    let out_path = tmpdir.path().join("binary.log");

    let src = BufReader::new(File::open(fixture_path("sub20.log")).unwrap());
    let count = sub20::convert(src, File::create(&out_path).unwrap()).unwrap();
    assert_eq!(count, 50);

    let expected = std::fs::read(fixture_path("raw_events.dat")).unwrap();
    let converted = std::fs::read(&out_path).unwrap();
    assert_eq!(converted, expected[..200]);

    let events = decode_raw_records(read_records(File::open(&out_path).unwrap()));
    assert_eq!(render_text(events), fixture_text("raw_events.txt"));
}
