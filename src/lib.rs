// mp4pcm - streaming MP4 audio to PCM
//
// Bytes are appended to a session, then one `parse()` walks the MP4 box tree
// for metadata, synchronizes the ADTS frames stored in the media data box and
// decodes each frame to a block of interleaved 16-bit PCM. Results go to a
// caller-provided `SessionSink`.

pub mod adts;
pub mod config;
pub mod decoder;
pub mod error;
pub mod ingest;
pub mod mp4;
pub mod pcm;
pub mod session;
pub mod utils;

pub use adts::{FrameHeader, FrameSynchronizer, SyncedFrame};
pub use config::SessionConfig;
pub use decoder::FrameDecoder;
pub use error::{Error, Result};
pub use ingest::IngestBuffer;
pub use mp4::{box_tree, is_mp4, BoxNode, MetadataRecord, MetadataSummary};
pub use pcm::{PcmBlock, PcmEmitter, PcmSink};
pub use session::{decode_bytes, inspect_bytes, CollectingSink, ParseReport, Session, SessionSink};
