//! Still-image encoding.
//!
//! An [`ImageEncoder`] turns one converted frame into the bytes of an image
//! file. Two PNG implementations are provided and chosen with
//! [`PngBackend`]:
//!
//! - [`FfmpegPngEncoder`] drives libavcodec's PNG encoder.
//! - [`ImagePngEncoder`] uses the pure-Rust encoder from the `image` crate.
//!
//! # Example
//!
//! ```no_run
//! use ffmpeg_next::{format::Pixel, frame::Video as VideoFrame};
//! use framedump::{FfmpegPngEncoder, FrameWriter, ImageEncoder, NumberedFileWriter};
//!
//! let mut encoder = FfmpegPngEncoder::open(64, 48)?;
//! let mut writer = NumberedFileWriter::create("frames")?;
//! let frame = VideoFrame::new(Pixel::RGB24, 64, 48);
//! if let Some(payload) = encoder.encode(&frame)? {
//!     writer.write(payload.as_ref(), 0)?;
//! }
//! # Ok::<(), framedump::ExtractError>(())
//! ```

use ffmpeg_next::{
    Error as FfmpegError, Packet, Rational,
    codec::{
        Capabilities, Compliance, Id, context::Context as CodecContext,
        encoder::video::Encoder as VideoEncoder,
    },
    frame::Video as VideoFrame,
    util::error::EAGAIN,
};
use image::{ExtendedColorType, ImageEncoder as _, codecs::png::PngEncoder};

use crate::{conversion::frame_to_buffer, converter::OUTPUT_PIXEL_FORMAT, error::ExtractError};

/// Time base handed to the PNG codec context. Still images carry no timing,
/// but libavcodec refuses to open an encoder without one.
const ENCODER_TIME_BASE: Rational = Rational(1, 25);

/// Encodes converted frames into image file payloads.
pub trait ImageEncoder {
    /// Frame type accepted by the encoder.
    type Frame;
    /// Encoded bytes, ready to be written verbatim.
    type Payload: AsRef<[u8]>;

    /// Encode one frame.
    ///
    /// `Ok(None)` means the encoder buffered the frame and has nothing to
    /// emit yet; the caller skips the write for this frame. `Err` is fatal.
    fn encode(&mut self, frame: &Self::Frame) -> Result<Option<Self::Payload>, ExtractError>;

    /// Emit one payload still buffered inside the encoder, or `None` once
    /// it is empty. Called repeatedly after the last frame.
    fn flush(&mut self) -> Result<Option<Self::Payload>, ExtractError> {
        Ok(None)
    }
}

/// Which PNG encoder implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PngBackend {
    /// libavcodec's `png` encoder.
    #[default]
    Ffmpeg,
    /// The `image` crate's PNG encoder.
    Image,
}

/// An encoded packet from libavcodec.
pub struct EncodedPacket(Packet);

impl AsRef<[u8]> for EncodedPacket {
    fn as_ref(&self) -> &[u8] {
        self.0.data().unwrap_or(&[])
    }
}

/// PNG encoding through libavcodec.
pub struct FfmpegPngEncoder {
    encoder: VideoEncoder,
    eof_sent: bool,
}

impl FfmpegPngEncoder {
    /// Find and open the PNG encoder for RGB24 frames of the given size.
    ///
    /// Codecs flagged as experimental are opened with experimental strict
    /// compliance, which libavcodec otherwise refuses.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::CodecNegotiation`] if the PNG encoder is not
    /// compiled into FFmpeg or refuses to open.
    pub fn open(width: u32, height: u32) -> Result<Self, ExtractError> {
        crate::ffmpeg::initialize()?;

        let codec = ffmpeg_next::encoder::find(Id::PNG).ok_or_else(|| {
            ExtractError::CodecNegotiation("PNG encoder not available".to_string())
        })?;

        let mut encoder = CodecContext::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|error| {
                ExtractError::CodecNegotiation(format!("cannot create PNG encoder: {error}"))
            })?;

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(OUTPUT_PIXEL_FORMAT);
        encoder.set_time_base(ENCODER_TIME_BASE);

        if codec.capabilities().contains(Capabilities::EXPERIMENTAL) {
            log::debug!("PNG encoder {} is experimental, relaxing compliance", codec.name());
            encoder.compliance(Compliance::Experimental);
        }

        let encoder = encoder.open_as(codec).map_err(|error| {
            ExtractError::CodecNegotiation(format!("cannot open PNG encoder: {error}"))
        })?;

        log::debug!("Opened {} encoder ({width}x{height})", codec.name());
        Ok(Self {
            encoder,
            eof_sent: false,
        })
    }

    fn receive(&mut self) -> Result<Option<EncodedPacket>, ExtractError> {
        let mut packet = Packet::empty();
        match self.encoder.receive_packet(&mut packet) {
            Ok(()) => Ok(Some(EncodedPacket(packet))),
            Err(FfmpegError::Eof) => Ok(None),
            Err(FfmpegError::Other { errno }) if errno == EAGAIN => Ok(None),
            Err(error) => Err(ExtractError::Encode(format!("receive_packet failed: {error}"))),
        }
    }
}

impl ImageEncoder for FfmpegPngEncoder {
    type Frame = VideoFrame;
    type Payload = EncodedPacket;

    fn encode(&mut self, frame: &VideoFrame) -> Result<Option<EncodedPacket>, ExtractError> {
        self.encoder
            .send_frame(frame)
            .map_err(|error| ExtractError::Encode(format!("send_frame failed: {error}")))?;
        self.receive()
    }

    fn flush(&mut self) -> Result<Option<EncodedPacket>, ExtractError> {
        if !self.eof_sent {
            self.encoder
                .send_eof()
                .map_err(|error| ExtractError::Encode(format!("send_eof failed: {error}")))?;
            self.eof_sent = true;
        }
        self.receive()
    }
}

/// PNG encoding with the `image` crate.
///
/// Never buffers: every frame produces a payload immediately.
pub struct ImagePngEncoder {
    width: u32,
    height: u32,
}

impl ImagePngEncoder {
    /// Create an encoder for RGB24 frames of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl ImageEncoder for ImagePngEncoder {
    type Frame = VideoFrame;
    type Payload = Vec<u8>;

    fn encode(&mut self, frame: &VideoFrame) -> Result<Option<Vec<u8>>, ExtractError> {
        if frame.format() != OUTPUT_PIXEL_FORMAT
            || frame.width() != self.width
            || frame.height() != self.height
        {
            return Err(ExtractError::Encode(format!(
                "expected {}x{} {OUTPUT_PIXEL_FORMAT:?}, got {}x{} {:?}",
                self.width,
                self.height,
                frame.width(),
                frame.height(),
                frame.format()
            )));
        }

        let pixels = frame_to_buffer(frame, self.width, self.height, 3);
        let mut payload = Vec::new();
        PngEncoder::new(&mut payload).write_image(
            &pixels,
            self.width,
            self.height,
            ExtendedColorType::Rgb8,
        )?;
        Ok(Some(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_frame(width: u32, height: u32, rgb: [u8; 3]) -> VideoFrame {
        let mut frame = VideoFrame::new(OUTPUT_PIXEL_FORMAT, width, height);
        let stride = frame.stride(0);
        let data = frame.data_mut(0);
        for row in 0..height as usize {
            for col in 0..width as usize {
                let offset = row * stride + col * 3;
                data[offset..offset + 3].copy_from_slice(&rgb);
            }
        }
        frame
    }

    #[test]
    fn image_backend_encodes_decodable_png() {
        let mut encoder = ImagePngEncoder::new(16, 8);
        let payload = encoder
            .encode(&solid_frame(16, 8, [10, 20, 30]))
            .unwrap()
            .expect("image backend never defers");

        let decoded = image::load_from_memory(&payload).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (16, 8));
        assert_eq!(decoded.get_pixel(15, 7).0, [10, 20, 30]);
    }

    #[test]
    fn image_backend_rejects_wrong_size() {
        let mut encoder = ImagePngEncoder::new(16, 8);
        let result = encoder.encode(&solid_frame(8, 8, [0, 0, 0]));
        assert!(matches!(result, Err(ExtractError::Encode(_))));
    }

    #[test]
    fn ffmpeg_backend_encodes_decodable_png() {
        let mut encoder = match FfmpegPngEncoder::open(16, 8) {
            Ok(encoder) => encoder,
            Err(error) => {
                eprintln!("Skipping: {error}");
                return;
            }
        };

        let payload = encoder
            .encode(&solid_frame(16, 8, [200, 100, 50]))
            .unwrap()
            .expect("PNG encoder emits one packet per frame");

        let decoded = image::load_from_memory(payload.as_ref()).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), (16, 8));
        assert_eq!(decoded.get_pixel(0, 0).0, [200, 100, 50]);
        assert!(encoder.flush().unwrap().is_none());
    }
}
