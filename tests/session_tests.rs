// End-to-end session tests on synthetic files

mod common;

use common::*;
use mp4pcm::{decode_bytes, inspect_bytes, Error, MetadataSummary, PcmBlock, PcmSink, Session, SessionConfig, SessionSink};

const FRAME_LENGTH: usize = 64;

#[test]
fn test_round_trip_three_frames() {
    let data = simple_file(44_100, 44_100, &adts_frames(3, FRAME_LENGTH));
    let (sink, report) = decode_bytes(&data, SessionConfig::default()).unwrap();

    let metadata = sink.metadata.unwrap();
    assert_eq!(metadata.sample_rate, Some(44_100));
    assert_eq!(metadata.total_sample_count, Some(44_100));
    assert_eq!(metadata.container_size, data.len() as u64);

    let sequences: Vec<u64> = sink.blocks.iter().map(|(seq, _)| *seq).collect();
    assert_eq!(sequences, vec![0, 1, 2]);
    for (_, block) in &sink.blocks {
        assert_eq!(block.sample_count, 1024);
        assert_eq!(block.channel_count, 2);
        assert_eq!(block.samples.len(), 2048);
    }

    assert_eq!(report.frames_emitted, 3);
    assert_eq!(report.frames_failed, 0);
    assert_eq!(report.resync_skips, 0);
    assert!(report.mdat_found);
    assert!(report.malformed.is_none());
}

#[test]
fn test_bitrate_from_mdat_payload_and_duration() {
    // 192 payload bytes over one second
    let data = simple_file(1000, 1000, &adts_frames(3, FRAME_LENGTH));
    let (sink, _) = decode_bytes(&data, SessionConfig::default()).unwrap();
    let metadata = sink.metadata.unwrap();
    assert_eq!(metadata.bitrate, Some(1536));
    assert_eq!(metadata.duration_seconds, Some(1.0));
}

#[test]
fn test_zero_duration_leaves_bitrate_unset() {
    let data = simple_file(44_100, 0, &adts_frames(1, FRAME_LENGTH));
    let (sink, _) = decode_bytes(&data, SessionConfig::default()).unwrap();
    assert_eq!(sink.metadata.unwrap().bitrate, None);
}

#[test]
fn test_sample_table_overrides_movie_header() {
    let mut moov = mvhd_v0(44_100, 44_100);
    moov.extend(audio_trak(&[stsd_mp4a(1, 16, 22_050), stsz(3)]));
    let mut data = ftyp(32);
    data.extend(make_box(b"moov", &moov));
    data.extend(make_box(b"mdat", &adts_frames(3, FRAME_LENGTH)));

    let (sink, _) = decode_bytes(&data, SessionConfig::default()).unwrap();
    let metadata = sink.metadata.unwrap();
    assert_eq!(metadata.total_sample_count, Some(3));
    assert_eq!(metadata.sample_rate, Some(22_050));
    assert_eq!(metadata.channel_count, Some(1));
    assert_eq!(metadata.bits_per_sample, Some(16));
    assert_eq!(metadata.codec_tag.as_deref(), Some("mp4a"));
}

#[test]
fn test_version1_movie_header() {
    let mut data = ftyp(32);
    data.extend(make_box(b"moov", &mvhd_v1(48_000, 96_000)));
    data.extend(make_box(b"mdat", &adts_frames(1, FRAME_LENGTH)));

    let (sink, _) = decode_bytes(&data, SessionConfig::default()).unwrap();
    let metadata = sink.metadata.unwrap();
    assert_eq!(metadata.sample_rate, Some(48_000));
    assert_eq!(metadata.total_sample_count, Some(96_000));
    assert_eq!(metadata.duration_seconds, Some(2.0));
}

#[test]
fn test_large_size_mdat() {
    let mut data = ftyp(32);
    data.extend(make_box(b"moov", &mvhd_v0(44_100, 44_100)));
    data.extend(make_large_box(b"mdat", &adts_frames(2, FRAME_LENGTH)));

    let (sink, report) = decode_bytes(&data, SessionConfig::default()).unwrap();
    assert_eq!(sink.blocks.len(), 2);
    assert_eq!(report.resync_skips, 0);
}

#[test]
fn test_reset_then_rerun_is_identical() {
    let data = simple_file(44_100, 44_100, &adts_frames(4, FRAME_LENGTH));
    let mut session = Session::new(SessionConfig::default()).unwrap();

    session.append(&data).unwrap();
    let mut first = mp4pcm::CollectingSink::default();
    let first_report = session.parse(&mut first).unwrap();
    let first_record = session.metadata().clone();

    session.reset();
    assert_eq!(session.bytes_used(), 0);
    session.append(&data).unwrap();
    let mut second = mp4pcm::CollectingSink::default();
    let second_report = session.parse(&mut second).unwrap();

    assert_eq!(first.metadata, second.metadata);
    assert_eq!(first.blocks, second.blocks);
    assert_eq!(first_report, second_report);
    assert_eq!(&first_record, session.metadata());
}

#[test]
fn test_chunked_appends_match_single_append() {
    let data = simple_file(44_100, 44_100, &adts_frames(3, FRAME_LENGTH));
    let (whole, _) = decode_bytes(&data, SessionConfig::default()).unwrap();

    let mut session = Session::new(SessionConfig::default()).unwrap();
    for chunk in data.chunks(17) {
        session.append(chunk).unwrap();
    }
    let mut chunked = mp4pcm::CollectingSink::default();
    session.parse(&mut chunked).unwrap();

    assert_eq!(whole.blocks, chunked.blocks);
    assert_eq!(whole.metadata, chunked.metadata);
}

#[test]
fn test_truncated_buffer_keeps_metadata() {
    let data = simple_file(44_100, 44_100, &adts_frames(3, FRAME_LENGTH));
    let cut = &data[..data.len() - 20];

    let (sink, report) = decode_bytes(cut, SessionConfig::default()).unwrap();
    let metadata = sink.metadata.unwrap();
    assert_eq!(metadata.sample_rate, Some(44_100));
    assert_eq!(metadata.total_sample_count, Some(44_100));
    assert!(sink.blocks.is_empty());
    assert!(!report.mdat_found);
    assert!(report.malformed.unwrap().contains("mdat"));
}

#[test]
fn test_capacity_exceeded_preserves_buffer() {
    let config = SessionConfig {
        max_buffer_bytes: 100,
        ..SessionConfig::default()
    };
    let mut session = Session::new(config).unwrap();
    session.append(&[0; 80]).unwrap();

    let err = session.append(&[0; 30]).unwrap_err();
    assert!(matches!(err, Error::CapacityExceeded { capacity: 100, .. }));
    assert!(err.is_fatal());
    assert_eq!(session.bytes_used(), 80);

    // Sealed until reset
    assert!(session.append(&[0; 1]).is_err());
    session.reset();
    assert!(session.append(&[0; 1]).is_ok());
}

#[test]
fn test_stray_byte_before_frame_costs_one_skip() {
    let mut payload = adts_frames(1, FRAME_LENGTH);
    payload.push(0x00);
    payload.extend(adts_frames(2, FRAME_LENGTH));
    let data = simple_file(44_100, 44_100, &payload);

    let (sink, report) = decode_bytes(&data, SessionConfig::default()).unwrap();
    assert_eq!(sink.blocks.len(), 3);
    assert_eq!(report.resync_skips, 1);
    assert_eq!(report.false_syncs, 0);
}

#[test]
fn test_truncated_final_frame_is_skipped() {
    let mut payload = adts_frames(2, FRAME_LENGTH);
    payload.extend(&adts_frame(2, FRAME_LENGTH, 0x30)[..40]);
    let data = simple_file(44_100, 44_100, &payload);

    let (sink, report) = decode_bytes(&data, SessionConfig::default()).unwrap();
    assert_eq!(sink.blocks.len(), 2);
    assert_eq!(report.frames_failed, 1);
    assert!(sink.diagnostics.iter().any(|d| d.contains("skipped")));
}

#[test]
fn test_missing_mdat_still_delivers_metadata() {
    let mut data = ftyp(32);
    data.extend(make_box(b"moov", &mvhd_v0(8000, 16_000)));

    let (sink, report) = decode_bytes(&data, SessionConfig::default()).unwrap();
    assert_eq!(sink.metadata.unwrap().sample_rate, Some(8000));
    assert!(sink.blocks.is_empty());
    assert!(!report.mdat_found);
    assert!(sink.diagnostics.iter().any(|d| d.contains("no media data")));
}

#[test]
fn test_empty_buffer() {
    let (sink, report) = decode_bytes(&[], SessionConfig::default()).unwrap();
    let metadata = sink.metadata.unwrap();
    assert_eq!(metadata.container_size, 0);
    assert_eq!(metadata.sample_rate, None);
    assert_eq!(report, mp4pcm::ParseReport::default());
}

#[test]
fn test_frame_budget_stops_decoding() {
    let data = simple_file(44_100, 44_100, &adts_frames(5, FRAME_LENGTH));
    let config = SessionConfig {
        max_frames: 2,
        ..SessionConfig::default()
    };
    let (sink, report) = decode_bytes(&data, config).unwrap();
    assert_eq!(sink.blocks.len(), 2);
    assert!(report.budget_exhausted);
}

#[test]
fn test_video_track_is_reported() {
    let mut moov = mvhd_v0(44_100, 44_100);
    moov.extend(make_box(b"trak", &make_box(b"mdia", &hdlr(b"vide"))));
    let mut data = ftyp(32);
    data.extend(make_box(b"moov", &moov));
    data.extend(make_box(b"mdat", &adts_frames(1, FRAME_LENGTH)));

    let (sink, _) = decode_bytes(&data, SessionConfig::default()).unwrap();
    assert!(sink.diagnostics.iter().any(|d| d.contains("video")));
    assert_eq!(sink.blocks.len(), 1);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = SessionConfig {
        max_frames: 0,
        ..SessionConfig::default()
    };
    assert!(matches!(Session::new(config), Err(Error::Config(_))));
}

/// Records callback order
#[derive(Default)]
struct EventLog(Vec<String>);

impl PcmSink for EventLog {
    fn on_pcm(&mut self, sequence: u64, _block: PcmBlock) {
        self.0.push(format!("pcm {}", sequence));
    }
}

impl SessionSink for EventLog {
    fn on_metadata(&mut self, _metadata: &MetadataSummary) {
        self.0.push("metadata".to_string());
    }
}

#[test]
fn test_metadata_precedes_pcm() {
    let data = simple_file(44_100, 44_100, &adts_frames(2, FRAME_LENGTH));
    let mut session = Session::new(SessionConfig::default()).unwrap();
    session.append(&data).unwrap();

    let mut log = EventLog::default();
    session.parse(&mut log).unwrap();
    assert_eq!(log.0, vec!["metadata", "pcm 0", "pcm 1"]);
}

#[test]
fn test_inspect_delivers_metadata_without_pcm() {
    let data = simple_file(1000, 1000, &adts_frames(3, FRAME_LENGTH));
    let (inspected, report) = inspect_bytes(&data, SessionConfig::default()).unwrap();
    let (decoded, _) = decode_bytes(&data, SessionConfig::default()).unwrap();

    assert!(inspected.blocks.is_empty());
    assert_eq!(inspected.metadata, decoded.metadata);
    assert!(report.mdat_found);
    assert_eq!(report.frames_emitted, 0);
    assert_eq!(report.resync_skips, 0);
}

#[test]
fn test_inspect_reports_missing_mdat() {
    let mut data = ftyp(32);
    data.extend(make_box(b"moov", &mvhd_v0(44_100, 44_100)));
    let (sink, report) = inspect_bytes(&data, SessionConfig::default()).unwrap();
    assert!(!report.mdat_found);
    assert_eq!(sink.metadata.unwrap().sample_rate, Some(44_100));
}
