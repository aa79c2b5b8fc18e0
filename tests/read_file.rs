use coolmidi::{bytes::from_hex, prelude::*};
use pretty_assertions::assert_eq;

const TWO_TRACKS: &[u8] = include_bytes!("../test-asset/TwoTracks.mid");

fn parse_error(bytes: &[u8]) -> ParseError {
    MidiFile::parse(bytes)
        .unwrap_err()
        .parse_error()
        .cloned()
        .expect("expected a parse error, not a truncation")
}

#[test]
fn accepts_format_one_header() {
    let file = MidiFile::parse(TWO_TRACKS).unwrap();
    let header = file.header();
    assert_eq!(header.format_type(), coolmidi::file::FormatType::Simultaneous);
    assert_eq!(header.ntracks(), 2);
    assert_eq!(header.tickdiv(), 480);
    assert!(header.uses_ticks_per_beat());
    assert_eq!(file.timing().ticks_per_quarter_note(), Some(480));
}

#[test]
fn rejects_mutated_header() {
    for i in 0..4 {
        let mut bytes = TWO_TRACKS.to_vec();
        bytes[i] = b'X';
        let mut id = *b"MThd";
        id[i] = b'X';
        assert_eq!(
            parse_error(&bytes),
            ParseError::Header(HeaderError::InvalidId(id)),
            "magic byte {i}"
        );
    }

    let mut bytes = TWO_TRACKS.to_vec();
    bytes[7] = 7;
    assert_eq!(
        parse_error(&bytes),
        ParseError::Header(HeaderError::InvalidLength(7))
    );

    let mut bytes = TWO_TRACKS.to_vec();
    bytes[9] = 3;
    assert_eq!(
        parse_error(&bytes),
        ParseError::Header(HeaderError::InvalidFormat(3))
    );

    let mut bytes = TWO_TRACKS.to_vec();
    bytes[14..18].copy_from_slice(b"MTrx");
    assert!(matches!(
        parse_error(&bytes),
        ParseError::Track(TrackError::InvalidId { track: 0, .. })
    ));
}

#[test]
fn rejects_truncated_file() {
    let err = MidiFile::parse(include_bytes!("../test-asset/TwoTracksDamaged.mid")).unwrap_err();
    assert!(err.is_out_of_bounds());
}

#[test]
fn track_lengths_match_their_events() {
    let file = MidiFile::parse(TWO_TRACKS).unwrap();
    for track in file.tracks() {
        let parsed: usize = track.events().iter().map(Event::encoded_len).sum();
        assert_eq!(parsed, track.len() as usize, "track #{}", track.index());
    }
}

#[test]
fn every_track_ends_with_end_of_track() {
    let file = MidiFile::parse(TWO_TRACKS).unwrap();
    for track in file.tracks() {
        let last = track.events().last().unwrap();
        assert!(last.is_end_of_track());
        assert_eq!(last.message(), &[0xFF, 0x2F, 0x00]);
    }
}

#[test]
fn running_status_keeps_the_effective_status() {
    let file = MidiFile::parse(TWO_TRACKS).unwrap();
    let events = file.tracks()[1].events();

    let running = &events[3];
    assert!(running.running_status());
    assert_eq!(running.ticks(), 0x60);
    assert_eq!(running.message(), &[0x91, 0x40, 0x00]);
    assert_eq!(running.encoded_len(), 3);
    assert_eq!(running.channel(), Some(Channel::Two));

    let message = running.channel_message().unwrap();
    assert_eq!(message.kind, VoiceKind::NoteOn);
    assert_eq!(message.data2, Some(0));

    // the status byte is left out again when written back
    assert_eq!(file.to_bytes(), TWO_TRACKS);
}

#[test]
fn tempo_and_time_signature_reach_every_track() {
    let file = MidiFile::parse(TWO_TRACKS).unwrap();
    assert_eq!(file.tempo(), 400_000);
    for track in file.tracks() {
        assert_eq!(track.tempo(), 400_000);
        assert_eq!(track.time_signature().to_string(), "3/4");
    }
}

#[test]
fn channels_used_by_notes() {
    let file = MidiFile::parse(TWO_TRACKS).unwrap();
    let mut expected = [false; 16];
    expected[0] = true;
    expected[1] = true;
    assert_eq!(file.channels_used(), expected);
}

#[test]
fn meta_payloads() {
    let file = MidiFile::parse(TWO_TRACKS).unwrap();
    let name = &file.tracks()[1].events()[0];
    assert_eq!(name.kind(), EventKind::Meta(MetaKind::TrackName));
    assert_eq!(name.meta_payload().unwrap(), b"Bass");

    let tempo = &file.tracks()[0].events()[0];
    assert_eq!(tempo.meta_payload().unwrap(), &[0x06, 0x1A, 0x80]);
    assert_eq!(tempo.tempo(), Some(400_000));
}

#[test]
fn hexdump_round_trip() {
    let file = MidiFile::parse(TWO_TRACKS).unwrap();
    let dump = file.hexdump();
    assert!(dump.starts_with("4d546864000000060001000201e0"));
    assert!(dump.ends_with("00ff2f00"));

    let reparsed = MidiFile::parse(&from_hex(&dump).unwrap()).unwrap();
    assert_eq!(reparsed, file);
}

#[test]
fn parse_file_remembers_the_name() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/test-asset/TwoTracks.mid");
    let file = MidiFile::parse_file(path).unwrap();
    assert_eq!(file.filename(), Some("TwoTracks.mid"));
    assert!(file.to_string().starts_with("TwoTracks.mid\n"));

    let damaged = concat!(env!("CARGO_MANIFEST_DIR"), "/test-asset/TwoTracksDamaged.mid");
    assert!(matches!(
        MidiFile::parse_file(damaged),
        Err(LoadError::Parse { .. })
    ));
}
