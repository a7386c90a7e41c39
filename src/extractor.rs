//! One-call frame extraction.
//!
//! [`FrameExtractor`] wires the FFmpeg-backed collaborators into a
//! [`Pipeline`] and runs it over a single input file.
//!
//! # Example
//!
//! ```no_run
//! use framedump::{FrameExtractor, PngBackend};
//!
//! let summary = FrameExtractor::new("input.mp4")
//!     .with_output_dir("frames")
//!     .with_png_backend(PngBackend::Image)
//!     .run()?;
//! println!(
//!     "{} frames of {}x{} video written to {}",
//!     summary.report.frames_written,
//!     summary.stream.width,
//!     summary.stream.height,
//!     summary.output_dir.display()
//! );
//! # Ok::<(), framedump::ExtractError>(())
//! ```

use std::path::{Path, PathBuf};

use ffmpeg_next::frame::Video as VideoFrame;

use crate::{
    converter::ScalingConverter,
    decoder::FfmpegDecoder,
    encoder::{FfmpegPngEncoder, ImageEncoder, ImagePngEncoder, PngBackend},
    error::ExtractError,
    metadata::StreamDescriptor,
    pipeline::{Pipeline, PipelineReport},
    source::MediaSource,
    writer::NumberedFileWriter,
};

/// Directory frames are written to unless overridden.
pub const DEFAULT_OUTPUT_DIR: &str = "./tmp";

/// Result of a completed extraction.
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct ExtractionSummary {
    /// The stream frames were taken from.
    pub stream: StreamDescriptor,
    /// Directory the numbered files were written to.
    pub output_dir: PathBuf,
    /// Pipeline counters.
    pub report: PipelineReport,
}

/// Builder for a full extraction run.
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    input: PathBuf,
    output_dir: PathBuf,
    png_backend: PngBackend,
}

impl FrameExtractor {
    /// Extract from `input` into [`DEFAULT_OUTPUT_DIR`] with the default
    /// PNG backend.
    pub fn new<P: AsRef<Path>>(input: P) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            png_backend: PngBackend::default(),
        }
    }

    /// Write files into `output_dir` instead.
    pub fn with_output_dir<P: AsRef<Path>>(mut self, output_dir: P) -> Self {
        self.output_dir = output_dir.as_ref().to_path_buf();
        self
    }

    /// Choose the PNG encoder implementation.
    pub fn with_png_backend(mut self, png_backend: PngBackend) -> Self {
        self.png_backend = png_backend;
        self
    }

    /// Input file path.
    pub fn input(&self) -> &Path {
        &self.input
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Describe the input's video stream without extracting anything.
    ///
    /// # Errors
    ///
    /// Same open and stream-selection errors as [`run`](Self::run).
    pub fn probe(&self) -> Result<StreamDescriptor, ExtractError> {
        MediaSource::open(&self.input)?.best_video_stream()
    }

    /// Extract every frame of the input's best video stream.
    ///
    /// The decoder and encoder are negotiated before the output directory is
    /// touched, so an unsupported input leaves the filesystem unchanged.
    ///
    /// # Errors
    ///
    /// Returns the first fatal [`ExtractError`]. Files written before the
    /// failure are left in place.
    pub fn run(&self) -> Result<ExtractionSummary, ExtractError> {
        let mut source = MediaSource::open(&self.input)?;
        let stream = source.best_video_stream()?;
        log::info!(
            "Extracting {} stream #{} ({}x{}) from {}",
            stream.codec,
            stream.index,
            stream.width,
            stream.height,
            self.input.display()
        );

        let decoder = FfmpegDecoder::open(&source, &stream)?;
        let report = match self.png_backend {
            PngBackend::Ffmpeg => {
                let encoder = FfmpegPngEncoder::open(stream.width, stream.height)?;
                self.extract(&mut source, &stream, decoder, encoder)?
            }
            PngBackend::Image => {
                let encoder = ImagePngEncoder::new(stream.width, stream.height);
                self.extract(&mut source, &stream, decoder, encoder)?
            }
        };

        log::info!(
            "Wrote {} frames to {}",
            report.frames_written,
            self.output_dir.display()
        );

        Ok(ExtractionSummary {
            stream,
            output_dir: self.output_dir.clone(),
            report,
        })
    }

    fn extract<E>(
        &self,
        source: &mut MediaSource,
        stream: &StreamDescriptor,
        decoder: FfmpegDecoder,
        encoder: E,
    ) -> Result<PipelineReport, ExtractError>
    where
        E: ImageEncoder<Frame = VideoFrame>,
    {
        let converter = ScalingConverter::new(stream)?;
        let converted = converter.allocate_target();
        let writer = NumberedFileWriter::create(&self.output_dir)?;

        let mut pipeline = Pipeline::new(decoder, converter, encoder, writer, converted, stream.index);
        pipeline.run(source.packets())
    }
}
