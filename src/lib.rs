//! # framedump
//!
//! Dump every frame of a video as a numbered PNG file.
//!
//! `framedump` demuxes a media file, decodes its best video stream, converts
//! each frame to RGB24, encodes it as PNG, and writes it to
//! `<dir>/000.png`, `<dir>/001.png`, … in decode order. Demuxing, decoding,
//! and scaling are done by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate; PNG encoding
//! uses either FFmpeg or the [`image`](https://crates.io/crates/image) crate.
//!
//! ## Quick Start
//!
//! ### Extract Every Frame
//!
//! ```no_run
//! use framedump::FrameExtractor;
//!
//! let summary = FrameExtractor::new("input.mp4").run()?;
//! println!("{} frames written", summary.report.frames_written);
//! # Ok::<(), framedump::ExtractError>(())
//! ```
//!
//! ### Inspect the Video Stream
//!
//! ```no_run
//! use framedump::FrameExtractor;
//!
//! let stream = FrameExtractor::new("input.mp4").probe()?;
//! println!("{}x{} {} @ {:.2} fps", stream.width, stream.height, stream.codec, stream.frames_per_second());
//! # Ok::<(), framedump::ExtractError>(())
//! ```
//!
//! ### Custom Collaborators
//!
//! [`Pipeline`] is generic over its [`Decoder`], [`FrameConverter`],
//! [`ImageEncoder`], and [`FrameWriter`], so any of the FFmpeg-backed
//! implementations can be swapped out. See the [`pipeline`] module for the
//! loop's error-recovery and draining rules.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system, with the
//! `png` encoder enabled for the default backend.

mod conversion;
pub mod converter;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod extractor;
pub mod ffmpeg;
pub mod metadata;
pub mod pipeline;
pub mod source;
pub mod writer;

pub use converter::{FrameConverter, OUTPUT_PIXEL_FORMAT, ScalingConverter};
pub use decoder::{DecodeInput, DecodeStatus, Decoder, FfmpegDecoder};
pub use encoder::{EncodedPacket, FfmpegPngEncoder, ImageEncoder, ImagePngEncoder, PngBackend};
pub use error::ExtractError;
pub use extractor::{DEFAULT_OUTPUT_DIR, ExtractionSummary, FrameExtractor};
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use metadata::StreamDescriptor;
pub use pipeline::{Pipeline, PipelineReport, PipelineState};
pub use source::{MediaSource, PacketIterator, StreamPacket};
pub use writer::{FrameWriter, NumberedFileWriter};
