//! Stream metadata.
//!
//! [`StreamDescriptor`] identifies the video stream selected for extraction.
//! It is captured once when the stream is chosen and never changes for the
//! rest of the run.

use ffmpeg_next::{Rational, format::Pixel};

/// The video stream selected for extraction.
///
/// # Example
///
/// ```no_run
/// use framedump::MediaSource;
///
/// let source = MediaSource::open("input.mp4")?;
/// let stream = source.best_video_stream()?;
/// println!("stream #{} is {}x{} {}", stream.index, stream.width, stream.height, stream.codec);
/// # Ok::<(), framedump::ExtractError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct StreamDescriptor {
    /// Index of the stream within the container.
    pub index: usize,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Native pixel format of decoded frames.
    pub pixel_format: Pixel,
    /// Codec name (e.g. `"h264"`, `"vp9"`, `"mpeg4"`).
    pub codec: String,
    /// Stream time base.
    pub time_base: Rational,
    /// Average frame rate, if the container declares one.
    pub frame_rate: Option<Rational>,
}

impl StreamDescriptor {
    /// Average frames per second, or `0.0` when the rate is unknown.
    pub fn frames_per_second(&self) -> f64 {
        match self.frame_rate {
            Some(rate) if rate.denominator() != 0 => {
                rate.numerator() as f64 / rate.denominator() as f64
            }
            _ => 0.0,
        }
    }
}
