#![cfg(feature = "cli")]

use std::process::Command;

use anyhow::Result;
use exicodec::{Event, read_events, write_events};

fn exicodec() -> Command {
    Command::new(env!("CARGO_BIN_EXE_exicodec"))
}

#[test]
fn encode_then_decode_with_the_schemaless_grammar() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let events_path = dir.path().join("events.json");
    let encoded_path = dir.path().join("out.exi");
    let decoded_path = dir.path().join("decoded.json");

    let events = vec![
        Event::StartDocument,
        Event::start("config"),
        Event::value("port", 8080i64),
        Event::value("host", "localhost"),
        Event::EndContainer,
        Event::EndDocument,
    ];
    write_events(std::fs::File::create(&events_path)?, &events)?;

    let status = exicodec()
        .arg("encode")
        .arg("--events")
        .arg(&events_path)
        .arg("-o")
        .arg(&encoded_path)
        .args(["--alignment", "compression", "--block-size", "1"])
        .status()?;
    assert!(status.success());

    let status = exicodec()
        .arg("decode")
        .arg(&encoded_path)
        .arg("-o")
        .arg(&decoded_path)
        .status()?;
    assert!(status.success());

    let decoded = read_events(std::fs::File::open(&decoded_path)?)?;
    assert_eq!(decoded, events);
    Ok(())
}

#[test]
fn corrupt_input_fails() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("bad.exi");
    std::fs::write(&path, [0x00, 0x01])?;
    let output = exicodec().arg("decode").arg(&path).output()?;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid data"));
    Ok(())
}
