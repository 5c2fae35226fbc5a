// MP4/M4A container support
//
// MP4 files are a tree of "boxes" (atoms). Audio decoding needs only a few:
//
// - ftyp: File type box
// - moov: Movie box (container)
//   - mvhd: Movie header (timescale, duration)
//   - trak: Track box (container)
//     - mdia: Media box (container)
//       - mdhd: Media header (media timescale, duration)
//       - hdlr: Handler ("soun", "vide", ...)
//       - minf: Media information box (container)
//         - stbl: Sample table box (container)
//           - stsd: Sample description (codec, channels, sample rate)
//           - stsz: Sample sizes (sample count)
// - mdat: Media data box (the ADTS bitstream)
//
// Reference:
// - ISO/IEC 14496-12: ISO Base Media File Format
// - ISO/IEC 14496-14: MP4 File Format

pub mod esds;
pub mod header;
pub mod metadata;
pub mod walker;

pub use header::BoxHeader;
pub use metadata::{MetadataExtractor, MetadataRecord, MetadataSummary};
pub use walker::{box_tree, walk_tree, BoxNode, BoxRecord, BoxVisitor, BoxWalker};

use crate::utils::io::{check_signature, read_be_u32, read_fourcc};

pub const MP4_SIGNATURE: &[u8; 4] = b"ftyp";

/// Bytes `is_mp4` needs to decide; callers may read just this much of a file
pub const DETECT_PREFIX_LEN: usize = 16;

/// Detect if a buffer starts like an MP4/M4A file
///
/// Only the first box header is inspected, so a prefix of the file is
/// enough. The box itself does not have to fit in `data`.
pub fn is_mp4(data: &[u8]) -> bool {
    // MP4 files start with ftyp, but some streams open straight on moov/mdat
    if check_signature(data, 4, MP4_SIGNATURE) {
        return true;
    }

    let (Some(size), Some(box_type)) = (read_be_u32(data, 0), read_fourcc(data, 4)) else {
        return false;
    };
    // 0 runs to end of file, 1 means a 64-bit size follows
    let plausible_size = size == 0 || size == 1 || size >= 8;
    plausible_size && matches!(&box_type, atoms::MOOV | atoms::MDAT | atoms::FREE)
}

/// MP4 box types
pub mod atoms {
    pub const FTYP: &[u8; 4] = b"ftyp";
    pub const MOOV: &[u8; 4] = b"moov";
    pub const MVHD: &[u8; 4] = b"mvhd";
    pub const TRAK: &[u8; 4] = b"trak";
    pub const MDIA: &[u8; 4] = b"mdia";
    pub const MDHD: &[u8; 4] = b"mdhd";
    pub const HDLR: &[u8; 4] = b"hdlr";
    pub const MINF: &[u8; 4] = b"minf";
    pub const STBL: &[u8; 4] = b"stbl";
    pub const STSD: &[u8; 4] = b"stsd";
    pub const STSZ: &[u8; 4] = b"stsz";
    pub const MDAT: &[u8; 4] = b"mdat";
    pub const FREE: &[u8; 4] = b"free";

    // Sample entries and their children
    pub const MP4A: &[u8; 4] = b"mp4a";
    pub const ESDS: &[u8; 4] = b"esds";

    // Handler types
    pub const SOUN: &[u8; 4] = b"soun";
    pub const VIDE: &[u8; 4] = b"vide";
}
