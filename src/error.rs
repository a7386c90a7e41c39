//! Error types for the `framedump` crate.
//!
//! This module defines [`ExtractError`], the unified error type returned by
//! every fallible operation in the crate. Every variant is fatal to an
//! extraction run: the two recoverable conditions of the pipeline (a decoder
//! asking for more input and an encoder deferring its output) are expressed
//! as ordinary return values and never reach this type.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

/// The unified error type for all `framedump` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExtractError {
    /// The media file could not be opened.
    #[error("Failed to open media file at {path}: {reason}")]
    FileOpen {
        /// Path that was passed to [`crate::MediaSource::open`].
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The file does not contain a video stream.
    #[error("No video stream found in file")]
    NoVideoStream,

    /// No usable codec could be found or opened for the stream or the
    /// output image format.
    #[error("Codec negotiation failed: {0}")]
    CodecNegotiation(String),

    /// Reading the next packet from the container failed.
    #[error("Failed to read packet: {0}")]
    PacketRead(String),

    /// The decoder reported an unrecoverable status.
    #[error("Failed to decode video frame (code {code})")]
    Decode {
        /// Raw status code reported by the decoder.
        code: i32,
    },

    /// The decoder asked for more input after it was told no more input
    /// would arrive.
    #[error("Decoder stalled while draining: it requested more input after end of input")]
    DrainStalled,

    /// A decoded frame could not be converted to the encoder's pixel format.
    #[error("Failed to convert frame: {0}")]
    Conversion(String),

    /// A converted frame could not be encoded.
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// An encoded image could not be written to disk.
    #[error("Failed to write {path}: {source}")]
    Write {
        /// Destination file.
        path: PathBuf,
        /// Underlying I/O error.
        source: IoError,
    },

    /// The output directory could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    OutputDirectory {
        /// Directory that was requested.
        path: PathBuf,
        /// Underlying I/O error.
        source: IoError,
    },

    /// [`Pipeline::run`](crate::Pipeline::run) was called on a pipeline
    /// that has already consumed its packet source.
    #[error("Pipeline has already run to completion")]
    PipelineFinished,

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),

    /// An error from the `image` crate while encoding.
    #[error("Image processing error: {0}")]
    Image(#[from] ImageError),
}

impl From<FfmpegError> for ExtractError {
    fn from(error: FfmpegError) -> Self {
        ExtractError::Ffmpeg(error.to_string())
    }
}
