//! The decode → convert → encode → write loop.
//!
//! [`Pipeline`] owns one instance of each collaborator and the single
//! converted-frame buffer, and drives them through three states:
//!
//! 1. [`PipelineState::Streaming`]: every packet from the source is either
//!    dropped (other streams) or fed to the decoder. A decoded frame is
//!    converted, encoded, and written as the next numbered file.
//! 2. [`PipelineState::Draining`]: once the packet source is exhausted the
//!    decoder is sent the end-of-input marker until it reports
//!    [`DecodeStatus::EndOfStream`], so frames it held back for reordering
//!    still reach disk. The encoder is then flushed the same way.
//! 3. [`PipelineState::Done`]: the run is over, successfully or not.
//!
//! Only two conditions are recovered from: the decoder asking for another
//! packet ([`DecodeStatus::NeedMoreInput`]) and the encoder holding a frame
//! back (`Ok(None)` from [`ImageEncoder::encode`]). Both are resolved by moving
//! on to the next input, never by retrying the same one. Everything else
//! aborts the run at once; files already written stay on disk.
//!
//! Packets are moved into the pipeline and dropped at the end of the
//! iteration that consumed them. Encoded payloads are dropped right after
//! they are written. The converted frame lives as long as the pipeline.
//!
//! # Example
//!
//! ```no_run
//! use framedump::{
//!     FfmpegDecoder, FfmpegPngEncoder, MediaSource, NumberedFileWriter, Pipeline,
//!     ScalingConverter,
//! };
//!
//! let mut source = MediaSource::open("input.mp4")?;
//! let stream = source.best_video_stream()?;
//!
//! let decoder = FfmpegDecoder::open(&source, &stream)?;
//! let encoder = FfmpegPngEncoder::open(stream.width, stream.height)?;
//! let converter = ScalingConverter::new(&stream)?;
//! let target = converter.allocate_target();
//! let writer = NumberedFileWriter::create("frames")?;
//!
//! let mut pipeline = Pipeline::new(decoder, converter, encoder, writer, target, stream.index);
//! let report = pipeline.run(source.packets())?;
//! println!("wrote {} frames", report.frames_written);
//! # Ok::<(), framedump::ExtractError>(())
//! ```

use crate::{
    converter::FrameConverter,
    decoder::{DecodeInput, DecodeStatus, Decoder},
    encoder::ImageEncoder,
    error::ExtractError,
    source::StreamPacket,
    writer::FrameWriter,
};

/// Where a [`Pipeline`] is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Consuming the packet source.
    Streaming,
    /// Packet source exhausted; emptying the decoder and encoder.
    Draining,
    /// Finished, either successfully or by aborting.
    Done,
}

/// Counters describing one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Image files written. Files are numbered `0..frames_written`.
    pub frames_written: usize,
    /// Packets from the selected stream handed to the decoder.
    pub packets_decoded: usize,
    /// Packets from other streams, dropped without decoding.
    pub packets_skipped: usize,
    /// Packets after which the decoder asked for more input.
    pub decoder_waits: usize,
    /// Frames the encoder held back instead of emitting a payload.
    pub encoder_deferrals: usize,
    /// Frames recovered from the decoder after the packet source ran out.
    pub frames_drained: usize,
}

/// Converts, encodes, and writes frames, numbering the output files.
struct FrameOutput<C, E, W>
where
    C: FrameConverter,
    E: ImageEncoder<Frame = C::Target>,
    W: FrameWriter,
{
    converter: C,
    encoder: E,
    writer: W,
    converted: C::Target,
    next_index: usize,
    deferrals: usize,
}

impl<C, E, W> FrameOutput<C, E, W>
where
    C: FrameConverter,
    E: ImageEncoder<Frame = C::Target>,
    W: FrameWriter,
{
    fn emit(&mut self, frame: &C::Source) -> Result<(), ExtractError> {
        self.converter.convert(frame, &mut self.converted)?;

        match self.encoder.encode(&self.converted)? {
            Some(payload) => self.write(payload),
            None => {
                log::debug!("Encoder deferred frame; nothing to write yet");
                self.deferrals += 1;
                Ok(())
            }
        }
    }

    fn flush_encoder(&mut self) -> Result<(), ExtractError> {
        while let Some(payload) = self.encoder.flush()? {
            self.write(payload)?;
        }
        Ok(())
    }

    fn write(&mut self, payload: E::Payload) -> Result<(), ExtractError> {
        self.writer.write(payload.as_ref(), self.next_index)?;
        self.next_index += 1;
        Ok(())
    }
}

/// Drives one video stream from packets to numbered image files.
///
/// A pipeline runs once. Dropping it releases the decoder, encoder,
/// converter, writer, and the converted frame buffer.
pub struct Pipeline<D, C, E, W>
where
    D: Decoder,
    C: FrameConverter<Source = D::Frame>,
    E: ImageEncoder<Frame = C::Target>,
    W: FrameWriter,
{
    decoder: D,
    output: FrameOutput<C, E, W>,
    video_stream_index: usize,
    state: PipelineState,
    report: PipelineReport,
}

impl<D, C, E, W> Pipeline<D, C, E, W>
where
    D: Decoder,
    C: FrameConverter<Source = D::Frame>,
    E: ImageEncoder<Frame = C::Target>,
    W: FrameWriter,
{
    /// Assemble a pipeline for the stream at `video_stream_index`.
    ///
    /// `converted` is the destination buffer for every conversion. It must
    /// already have the size and pixel format `converter` produces.
    pub fn new(
        decoder: D,
        converter: C,
        encoder: E,
        writer: W,
        converted: C::Target,
        video_stream_index: usize,
    ) -> Self {
        Self {
            decoder,
            output: FrameOutput {
                converter,
                encoder,
                writer,
                converted,
                next_index: 0,
                deferrals: 0,
            },
            video_stream_index,
            state: PipelineState::Streaming,
            report: PipelineReport::default(),
        }
    }

    /// Current state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Number of files written so far. Also the index of the next file.
    pub fn frames_written(&self) -> usize {
        self.output.next_index
    }

    /// Consume `packets` and write every decodable frame.
    ///
    /// # Errors
    ///
    /// Aborts on the first packet-source error, fatal decode status,
    /// conversion, encode, or write failure. Returns
    /// [`ExtractError::PipelineFinished`] if the pipeline already ran.
    pub fn run<I>(&mut self, packets: I) -> Result<PipelineReport, ExtractError>
    where
        I: IntoIterator<Item = Result<D::Packet, ExtractError>>,
    {
        if self.state != PipelineState::Streaming {
            return Err(ExtractError::PipelineFinished);
        }

        let result = self.drive(packets);
        self.state = PipelineState::Done;
        result?;

        Ok(self.report())
    }

    /// Snapshot of the counters so far.
    pub fn report(&self) -> PipelineReport {
        PipelineReport {
            frames_written: self.output.next_index,
            encoder_deferrals: self.output.deferrals,
            ..self.report.clone()
        }
    }

    fn drive<I>(&mut self, packets: I) -> Result<(), ExtractError>
    where
        I: IntoIterator<Item = Result<D::Packet, ExtractError>>,
    {
        for packet in packets {
            self.stream(packet?)?;
        }

        log::info!(
            "Packet source exhausted after {} video packets, flushing decoder",
            self.report.packets_decoded
        );
        self.state = PipelineState::Draining;
        self.drain()?;
        self.output.flush_encoder()
    }

    fn stream(&mut self, packet: D::Packet) -> Result<(), ExtractError> {
        if packet.stream_index() != self.video_stream_index {
            self.report.packets_skipped += 1;
            return Ok(());
        }

        self.report.packets_decoded += 1;
        match self.decoder.decode(DecodeInput::Packet(&packet)) {
            DecodeStatus::Ready(frame) => self.output.emit(frame),
            DecodeStatus::NeedMoreInput => {
                log::trace!("Decoder needs more input");
                self.report.decoder_waits += 1;
                Ok(())
            }
            DecodeStatus::EndOfStream => {
                log::warn!("Decoder reported end of stream before end of input; ignoring packet");
                Ok(())
            }
            DecodeStatus::Fatal(code) => Err(ExtractError::Decode { code }),
        }
    }

    fn drain(&mut self) -> Result<(), ExtractError> {
        loop {
            match self.decoder.decode(DecodeInput::EndOfInput) {
                DecodeStatus::Ready(frame) => {
                    self.report.frames_drained += 1;
                    self.output.emit(frame)?;
                }
                DecodeStatus::EndOfStream => {
                    log::debug!("Decoder drained ({} frames)", self.report.frames_drained);
                    return Ok(());
                }
                DecodeStatus::NeedMoreInput => return Err(ExtractError::DrainStalled),
                DecodeStatus::Fatal(code) => return Err(ExtractError::Decode { code }),
            }
        }
    }
}
