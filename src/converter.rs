//! Pixel-format conversion.
//!
//! Decoded frames arrive in whatever layout the codec produces (usually a
//! planar YUV format). Image encoders want packed RGB, so every frame passes
//! through a [`FrameConverter`] that writes into a destination buffer
//! allocated once before the first frame.

use ffmpeg_next::{
    format::Pixel,
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::{error::ExtractError, metadata::StreamDescriptor};

/// Pixel format produced by [`ScalingConverter`] and consumed by the PNG
/// encoders.
pub const OUTPUT_PIXEL_FORMAT: Pixel = Pixel::RGB24;

/// Converts a decoded frame into the encoder's input format.
pub trait FrameConverter {
    /// Frame type produced by the decoder.
    type Source;
    /// Destination buffer type, reused for every frame.
    type Target;

    /// Overwrite `target` with the converted contents of `source`.
    ///
    /// Must not allocate: `target` is sized for the stream before the first
    /// call. Any failure means the decoder handed over a corrupt frame.
    fn convert(&mut self, source: &Self::Source, target: &mut Self::Target)
    -> Result<(), ExtractError>;
}

/// libswscale conversion from the stream's native format to RGB24 at the
/// source resolution.
pub struct ScalingConverter {
    scaler: ScalingContext,
    width: u32,
    height: u32,
}

impl ScalingConverter {
    /// Create a converter for frames of `stream`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Conversion`] if libswscale does not support
    /// the stream's pixel format or dimensions.
    pub fn new(stream: &StreamDescriptor) -> Result<Self, ExtractError> {
        let scaler = ScalingContext::get(
            stream.pixel_format,
            stream.width,
            stream.height,
            OUTPUT_PIXEL_FORMAT,
            stream.width,
            stream.height,
            ScalingFlags::BICUBIC,
        )
        .map_err(|error| {
            ExtractError::Conversion(format!(
                "cannot convert {:?} {}x{} to {OUTPUT_PIXEL_FORMAT:?}: {error}",
                stream.pixel_format, stream.width, stream.height
            ))
        })?;

        Ok(Self {
            scaler,
            width: stream.width,
            height: stream.height,
        })
    }

    /// Allocate the destination frame this converter writes into.
    ///
    /// Call once per run; the same frame is overwritten for every decoded
    /// picture.
    pub fn allocate_target(&self) -> VideoFrame {
        VideoFrame::new(OUTPUT_PIXEL_FORMAT, self.width, self.height)
    }
}

impl FrameConverter for ScalingConverter {
    type Source = VideoFrame;
    type Target = VideoFrame;

    fn convert(&mut self, source: &VideoFrame, target: &mut VideoFrame) -> Result<(), ExtractError> {
        if source.is_empty() {
            return Err(ExtractError::Conversion(
                "decoder returned a frame without picture data".to_string(),
            ));
        }
        if target.width() != self.width
            || target.height() != self.height
            || target.format() != OUTPUT_PIXEL_FORMAT
        {
            return Err(ExtractError::Conversion(format!(
                "destination frame is {}x{} {:?}, expected {}x{} {OUTPUT_PIXEL_FORMAT:?}",
                target.width(),
                target.height(),
                target.format(),
                self.width,
                self.height
            )));
        }

        self.scaler
            .run(source, target)
            .map_err(|error| ExtractError::Conversion(error.to_string()))
    }
}
