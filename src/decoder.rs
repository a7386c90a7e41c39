//! Video decoding.
//!
//! The [`Decoder`] trait is the pipeline's view of a codec: one call takes a
//! packet (or the end-of-input marker) and reports a [`DecodeStatus`]. The
//! status is a closed set of outcomes, so "give me another packet" and "this
//! stream is broken" can never be confused with each other.
//!
//! [`FfmpegDecoder`] implements the trait on top of libavcodec's
//! send/receive API.

use std::collections::VecDeque;

use ffmpeg_next::{
    Error as FfmpegError, Packet, codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder, frame::Video as VideoFrame, util::error::EAGAIN,
};

use crate::{
    error::ExtractError,
    metadata::StreamDescriptor,
    source::{MediaSource, StreamPacket},
};

/// Input handed to [`Decoder::decode`].
#[derive(Debug)]
pub enum DecodeInput<'a, P> {
    /// A compressed packet from the selected stream.
    Packet(&'a P),
    /// No further packets will arrive; return whatever is still buffered.
    EndOfInput,
}

/// Outcome of a single [`Decoder::decode`] call.
#[derive(Debug)]
pub enum DecodeStatus<'a, F> {
    /// A decoded frame is available. It stays owned by the decoder and is
    /// only valid until the next call.
    Ready(&'a F),
    /// The input was consumed but no frame is available yet. Feed the next
    /// packet; never resubmit the same one.
    NeedMoreInput,
    /// The decoder has been drained and will produce no more frames.
    EndOfStream,
    /// The decoder failed with the given raw status code.
    Fatal(i32),
}

/// A video decoder, implemented per codec backend.
pub trait Decoder {
    /// Compressed input unit.
    type Packet: StreamPacket;
    /// Decoded picture.
    type Frame;

    /// Feed one input and report what the decoder produced.
    fn decode(&mut self, input: DecodeInput<'_, Self::Packet>) -> DecodeStatus<'_, Self::Frame>;
}

/// The send/receive half of a libavcodec decoder.
trait CodecSession {
    fn send_packet(&mut self, packet: &Packet) -> Result<(), FfmpegError>;
    fn send_eof(&mut self) -> Result<(), FfmpegError>;
    fn receive_frame(&mut self, frame: &mut VideoFrame) -> Result<(), FfmpegError>;
}

impl CodecSession for VideoDecoder {
    fn send_packet(&mut self, packet: &Packet) -> Result<(), FfmpegError> {
        (**self).send_packet(packet)
    }

    fn send_eof(&mut self) -> Result<(), FfmpegError> {
        (**self).send_eof()
    }

    fn receive_frame(&mut self, frame: &mut VideoFrame) -> Result<(), FfmpegError> {
        (**self).receive_frame(frame)
    }
}

/// What one round trip through a [`CodecSession`] produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Received {
    Frame,
    NeedMoreInput,
    EndOfStream,
    Fatal(i32),
}

/// Feeds a codec session, keeping the packets it refused.
struct PacketQueue<S> {
    session: S,
    backlog: VecDeque<Packet>,
    eof_sent: bool,
}

impl<S: CodecSession> PacketQueue<S> {
    fn new(session: S) -> Self {
        Self {
            session,
            backlog: VecDeque::new(),
            eof_sent: false,
        }
    }

    /// Submit `input` and try to pull one frame into `frame`.
    fn decode(&mut self, input: DecodeInput<'_, Packet>, frame: &mut VideoFrame) -> Received {
        if let Err(error) = self.submit(input) {
            return Received::Fatal(i32::from(error));
        }

        match self.session.receive_frame(frame) {
            Ok(()) => Received::Frame,
            Err(FfmpegError::Eof) => Received::EndOfStream,
            Err(error) if would_block(&error) => Received::NeedMoreInput,
            Err(error) => Received::Fatal(i32::from(error)),
        }
    }

    /// Push the backlog, then `input`, into the codec.
    fn submit(&mut self, input: DecodeInput<'_, Packet>) -> Result<(), FfmpegError> {
        while let Some(packet) = self.backlog.front() {
            match self.session.send_packet(packet) {
                Ok(()) => {
                    self.backlog.pop_front();
                }
                Err(error) if would_block(&error) => break,
                Err(error) => return Err(error),
            }
        }

        match input {
            DecodeInput::Packet(packet) if !self.backlog.is_empty() => {
                self.backlog.push_back(packet.clone());
            }
            DecodeInput::Packet(packet) => match self.session.send_packet(packet) {
                Ok(()) => {}
                Err(error) if would_block(&error) => {
                    log::trace!("Decoder full, holding packet back");
                    self.backlog.push_back(packet.clone());
                }
                Err(error) => return Err(error),
            },
            DecodeInput::EndOfInput if self.backlog.is_empty() && !self.eof_sent => {
                match self.session.send_eof() {
                    Ok(()) | Err(FfmpegError::Eof) => self.eof_sent = true,
                    Err(error) if would_block(&error) => {}
                    Err(error) => return Err(error),
                }
            }
            DecodeInput::EndOfInput => {}
        }

        Ok(())
    }
}

/// Decodes a video stream with libavcodec.
///
/// libavcodec refuses new packets while decoded output is waiting. Refused
/// packets are kept in a backlog and resubmitted, in order, before any later
/// input, so every packet reaches the codec exactly once.
pub struct FfmpegDecoder {
    queue: PacketQueue<VideoDecoder>,
    frame: VideoFrame,
}

impl FfmpegDecoder {
    /// Build a decoder for `stream` from its codec parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::CodecNegotiation`] if no decoder can be opened
    /// for the stream's codec.
    pub fn open(source: &MediaSource, stream: &StreamDescriptor) -> Result<Self, ExtractError> {
        let parameters = source.parameters(stream.index)?;
        let decoder = CodecContext::from_parameters(parameters)
            .and_then(|context| context.decoder().video())
            .map_err(|error| {
                ExtractError::CodecNegotiation(format!(
                    "cannot open {} decoder: {error}",
                    stream.codec
                ))
            })?;

        log::debug!(
            "Opened {} decoder ({}x{}, {:?})",
            stream.codec,
            decoder.width(),
            decoder.height(),
            decoder.format()
        );

        Ok(Self {
            queue: PacketQueue::new(decoder),
            frame: VideoFrame::empty(),
        })
    }
}

impl Decoder for FfmpegDecoder {
    type Packet = Packet;
    type Frame = VideoFrame;

    fn decode(&mut self, input: DecodeInput<'_, Packet>) -> DecodeStatus<'_, VideoFrame> {
        match self.queue.decode(input, &mut self.frame) {
            Received::Frame => DecodeStatus::Ready(&self.frame),
            Received::NeedMoreInput => DecodeStatus::NeedMoreInput,
            Received::EndOfStream => DecodeStatus::EndOfStream,
            Received::Fatal(code) => DecodeStatus::Fatal(code),
        }
    }
}

fn would_block(error: &FfmpegError) -> bool {
    matches!(error, FfmpegError::Other { errno } if *errno == EAGAIN)
}
