// Builders for synthetic MP4 files and ADTS frames
#![allow(dead_code)]

use mp4pcm::FrameHeader;

/// A box with a 32-bit size field
pub fn make_box(box_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(box_type);
    out.extend_from_slice(payload);
    out
}

/// A box using the 64-bit largesize form
pub fn make_large_box(box_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = 1u32.to_be_bytes().to_vec();
    out.extend_from_slice(box_type);
    out.extend_from_slice(&((payload.len() + 16) as u64).to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// ftyp box of exactly `size` bytes (at least 16)
pub fn ftyp(size: usize) -> Vec<u8> {
    let mut payload = b"M4A ".to_vec();
    payload.extend_from_slice(&0u32.to_be_bytes());
    payload.resize(size - 8, 0);
    for chunk in payload[8..].chunks_mut(4) {
        if chunk.len() == 4 {
            chunk.copy_from_slice(b"isom");
        }
    }
    make_box(b"ftyp", &payload)
}

pub fn mvhd_v0(timescale: u32, duration: u32) -> Vec<u8> {
    let mut payload = vec![0u8; 12];
    payload.extend_from_slice(&timescale.to_be_bytes());
    payload.extend_from_slice(&duration.to_be_bytes());
    payload.resize(100, 0);
    make_box(b"mvhd", &payload)
}

pub fn mvhd_v1(timescale: u32, duration: u64) -> Vec<u8> {
    let mut payload = vec![1u8, 0, 0, 0];
    payload.extend_from_slice(&[0; 16]);
    payload.extend_from_slice(&timescale.to_be_bytes());
    payload.extend_from_slice(&duration.to_be_bytes());
    payload.resize(112, 0);
    make_box(b"mvhd", &payload)
}

pub fn hdlr(handler: &[u8; 4]) -> Vec<u8> {
    let mut payload = vec![0u8; 8];
    payload.extend_from_slice(handler);
    payload.extend_from_slice(&[0; 13]);
    make_box(b"hdlr", &payload)
}

pub fn stsz(sample_count: u32) -> Vec<u8> {
    let mut payload = vec![0u8; 4];
    payload.extend_from_slice(&0u32.to_be_bytes());
    payload.extend_from_slice(&sample_count.to_be_bytes());
    make_box(b"stsz", &payload)
}

/// stsd with one version-0 mp4a entry
pub fn stsd_mp4a(channels: u16, bits: u16, sample_rate: u32) -> Vec<u8> {
    let mut entry = Vec::new();
    entry.extend_from_slice(&36u32.to_be_bytes());
    entry.extend_from_slice(b"mp4a");
    entry.extend_from_slice(&[0; 6]);
    entry.extend_from_slice(&1u16.to_be_bytes());
    entry.extend_from_slice(&[0; 8]);
    entry.extend_from_slice(&channels.to_be_bytes());
    entry.extend_from_slice(&bits.to_be_bytes());
    entry.extend_from_slice(&[0; 4]);
    entry.extend_from_slice(&(sample_rate << 16).to_be_bytes());

    let mut payload = vec![0u8; 4];
    payload.extend_from_slice(&1u32.to_be_bytes());
    payload.extend_from_slice(&entry);
    make_box(b"stsd", &payload)
}

pub fn mdhd_v0(timescale: u32, duration: u32) -> Vec<u8> {
    let mut payload = vec![0u8; 12];
    payload.extend_from_slice(&timescale.to_be_bytes());
    payload.extend_from_slice(&duration.to_be_bytes());
    payload.extend_from_slice(&[0; 4]);
    make_box(b"mdhd", &payload)
}

/// esds carrying a two-byte AudioSpecificConfig
pub fn esds(asc: [u8; 2]) -> Vec<u8> {
    let mut dec_specific = vec![0x05, asc.len() as u8];
    dec_specific.extend_from_slice(&asc);

    let mut dec_config_body = vec![0x40, 0x15, 0, 0, 0];
    dec_config_body.extend_from_slice(&0u32.to_be_bytes());
    dec_config_body.extend_from_slice(&128_000u32.to_be_bytes());
    dec_config_body.extend_from_slice(&dec_specific);
    let mut dec_config = vec![0x04, dec_config_body.len() as u8];
    dec_config.extend_from_slice(&dec_config_body);

    let mut es_body = vec![0, 1, 0];
    es_body.extend_from_slice(&dec_config);
    es_body.extend_from_slice(&[0x06, 0x01, 0x02]);

    let mut payload = vec![0, 0, 0, 0, 0x03, es_body.len() as u8];
    payload.extend_from_slice(&es_body);
    make_box(b"esds", &payload)
}

/// stsd with one mp4a entry of sound description `version` (0 or 1)
/// followed by an esds child
pub fn stsd_mp4a_esds(version: u16, channels: u16, sample_rate: u32, asc: [u8; 2]) -> Vec<u8> {
    let child = esds(asc);
    let fixed = if version == 1 { 52 } else { 36 };

    let mut entry = Vec::new();
    entry.extend_from_slice(&((fixed + child.len()) as u32).to_be_bytes());
    entry.extend_from_slice(b"mp4a");
    entry.extend_from_slice(&[0; 6]);
    entry.extend_from_slice(&1u16.to_be_bytes());
    entry.extend_from_slice(&version.to_be_bytes());
    entry.extend_from_slice(&[0; 6]);
    entry.extend_from_slice(&channels.to_be_bytes());
    entry.extend_from_slice(&16u16.to_be_bytes());
    entry.extend_from_slice(&[0; 4]);
    entry.extend_from_slice(&(sample_rate << 16).to_be_bytes());
    // samples_per_packet, bytes_per_packet, bytes_per_frame, bytes_per_sample
    entry.resize(fixed, 0);
    entry.extend(child);

    let mut payload = vec![0u8; 4];
    payload.extend_from_slice(&1u32.to_be_bytes());
    payload.extend_from_slice(&entry);
    make_box(b"stsd", &payload)
}

/// stsd whose single entry has a non-audio format such as avc1
pub fn stsd_other(format: &[u8; 4]) -> Vec<u8> {
    let mut entry = 86u32.to_be_bytes().to_vec();
    entry.extend_from_slice(format);
    entry.resize(86, 0);

    let mut payload = vec![0u8; 4];
    payload.extend_from_slice(&1u32.to_be_bytes());
    payload.extend_from_slice(&entry);
    make_box(b"stsd", &payload)
}

/// trak > mdia > (hdlr?, mdhd?, minf > stbl > children)
pub fn media_trak(handler: Option<&[u8; 4]>, mdhd: Option<Vec<u8>>, stbl_children: &[Vec<u8>]) -> Vec<u8> {
    let mut mdia = Vec::new();
    if let Some(mdhd) = mdhd {
        mdia.extend(mdhd);
    }
    if let Some(handler) = handler {
        mdia.extend(hdlr(handler));
    }
    let stbl = make_box(b"stbl", &stbl_children.concat());
    mdia.extend(make_box(b"minf", &stbl));
    make_box(b"trak", &make_box(b"mdia", &mdia))
}

/// trak > mdia > (hdlr soun, minf > stbl > children)
pub fn audio_trak(stbl_children: &[Vec<u8>]) -> Vec<u8> {
    media_trak(Some(b"soun"), None, stbl_children)
}

/// ftyp(32) + moov(children) + mdat(payload)
pub fn file_with_moov(moov_children: &[Vec<u8>], mdat_payload: &[u8]) -> Vec<u8> {
    let mut data = ftyp(32);
    data.extend(make_box(b"moov", &moov_children.concat()));
    data.extend(make_box(b"mdat", mdat_payload));
    data
}

/// One CRC-less ADTS frame, 44.1 kHz, `length` bytes including the header
pub fn adts_frame(channel_configuration: u8, length: usize, fill: u8) -> Vec<u8> {
    let mut out = FrameHeader::new(1, 4, channel_configuration, length).to_bytes().to_vec();
    out.resize(length, fill);
    out
}

pub fn adts_frames(count: usize, length: usize) -> Vec<u8> {
    (0..count)
        .flat_map(|i| adts_frame(2, length, 0x20 + i as u8))
        .collect()
}

/// ftyp(32) + moov(mvhd) + mdat(frames)
pub fn simple_file(timescale: u32, duration: u32, mdat_payload: &[u8]) -> Vec<u8> {
    let mut data = ftyp(32);
    data.extend(make_box(b"moov", &mvhd_v0(timescale, duration)));
    data.extend(make_box(b"mdat", mdat_payload));
    data
}
