//! Container demuxing.
//!
//! [`MediaSource`] opens a media container, picks the best video stream, and
//! hands out a [`PacketIterator`] over the demuxed packets. The iterator is
//! lazy and finite: each call to `next()` reads exactly one packet, and the
//! sequence ends when the container is exhausted. There is no seeking, so a
//! second iterator over the same source yields nothing.
//!
//! # Example
//!
//! ```no_run
//! use framedump::{MediaSource, StreamPacket};
//!
//! let mut source = MediaSource::open("input.mp4")?;
//! let video = source.best_video_stream()?;
//! let video_packets = source
//!     .packets()
//!     .filter_map(Result::ok)
//!     .filter(|packet| packet.stream_index() == video.index)
//!     .count();
//! println!("{video_packets} video packets");
//! # Ok::<(), framedump::ExtractError>(())
//! ```

use std::{
    fmt::{Debug, Formatter, Result as FmtResult},
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    Error as FfmpegError, Packet, codec::Parameters,
    codec::context::Context as CodecContext, format::context::Input, media::Type,
};

use crate::{error::ExtractError, metadata::StreamDescriptor};

/// A compressed data unit tagged with the stream it belongs to.
pub trait StreamPacket {
    /// Index of the container stream this packet belongs to.
    fn stream_index(&self) -> usize;
}

impl StreamPacket for Packet {
    fn stream_index(&self) -> usize {
        self.stream()
    }
}

/// An opened media container.
///
/// Holds the FFmpeg demuxer context for as long as it lives; dropping it
/// closes the file.
pub struct MediaSource {
    pub(crate) input_context: Input,
    path: PathBuf,
}

impl Debug for MediaSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("MediaSource")
            .field("path", &self.path)
            .field("streams", &self.input_context.nb_streams())
            .finish_non_exhaustive()
    }
}

impl MediaSource {
    /// Open a media container.
    ///
    /// Initializes FFmpeg (idempotent) and opens the file.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::FileOpen`] if the file is missing or its
    /// format is not recognised.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ExtractError> {
        let path = path.as_ref().to_path_buf();
        log::debug!("Opening media source: {}", path.display());

        crate::ffmpeg::initialize().map_err(|error| ExtractError::FileOpen {
            path: path.clone(),
            reason: error.to_string(),
        })?;

        let input_context = ffmpeg_next::format::input(&path).map_err(|error| {
            ExtractError::FileOpen {
                path: path.clone(),
                reason: error.to_string(),
            }
        })?;

        Ok(Self {
            input_context,
            path,
        })
    }

    /// Describe the container's best video stream.
    ///
    /// # Errors
    ///
    /// - [`ExtractError::NoVideoStream`] if the container has no video.
    /// - [`ExtractError::CodecNegotiation`] if no decoder understands the
    ///   stream's codec parameters.
    pub fn best_video_stream(&self) -> Result<StreamDescriptor, ExtractError> {
        let stream = self
            .input_context
            .streams()
            .best(Type::Video)
            .ok_or(ExtractError::NoVideoStream)?;

        let parameters = stream.parameters();
        let codec = parameters.id().name().to_string();
        let decoder = CodecContext::from_parameters(parameters)
            .and_then(|context| context.decoder().video())
            .map_err(|error| {
                ExtractError::CodecNegotiation(format!("no decoder for {codec}: {error}"))
            })?;

        let frame_rate = stream.avg_frame_rate();
        let frame_rate = (frame_rate.numerator() > 0 && frame_rate.denominator() > 0)
            .then_some(frame_rate);

        let descriptor = StreamDescriptor {
            index: stream.index(),
            width: decoder.width(),
            height: decoder.height(),
            pixel_format: decoder.format(),
            codec,
            time_base: stream.time_base(),
            frame_rate,
        };
        log::debug!("Selected video stream: {descriptor:?}");
        Ok(descriptor)
    }

    /// Codec parameters of the stream at `index`.
    pub(crate) fn parameters(&self, index: usize) -> Result<Parameters, ExtractError> {
        self.input_context
            .stream(index)
            .map(|stream| stream.parameters())
            .ok_or(ExtractError::NoVideoStream)
    }

    /// Iterate over every packet in the container, in file order.
    pub fn packets(&mut self) -> PacketIterator<'_> {
        PacketIterator::new(self)
    }
}

/// A lazy iterator over demuxed packets.
///
/// Borrows the [`MediaSource`] mutably, so at most one packet sequence is
/// being read from a source at any time.
pub struct PacketIterator<'a> {
    source: &'a mut MediaSource,
    done: bool,
}

impl<'a> PacketIterator<'a> {
    fn new(source: &'a mut MediaSource) -> Self {
        log::debug!("Creating PacketIterator for {}", source.path.display());
        Self {
            source,
            done: false,
        }
    }
}

impl Iterator for PacketIterator<'_> {
    type Item = Result<Packet, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut packet = Packet::empty();
        match packet.read(&mut self.source.input_context) {
            Ok(()) => Some(Ok(packet)),
            Err(FfmpegError::Eof) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(ExtractError::PacketRead(error.to_string())))
            }
        }
    }
}
