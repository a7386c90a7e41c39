//! End-to-end extraction tests.
//!
//! Each test encodes a short MPEG-4 clip into a temporary directory and runs
//! the real FFmpeg-backed collaborators over it. Tests skip themselves when
//! the local FFmpeg build lacks the MPEG-4 or PNG encoder.

use std::path::{Path, PathBuf};

use ffmpeg_next::{
    Packet, Rational,
    codec::{Flags as CodecFlags, Id, context::Context as CodecContext, encoder::video::Encoder},
    format::{Flags as FormatFlags, Pixel, context::Output},
    frame::Video as VideoFrame,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};
use framedump::{
    DecodeInput, DecodeStatus, Decoder, ExtractError, ExtractionSummary, FfmpegDecoder,
    FrameExtractor, MediaSource, PngBackend, StreamPacket, writer::file_name,
};
use tempfile::TempDir;

const WIDTH: u32 = 64;
const HEIGHT: u32 = 48;
const FPS: i32 = 10;
const FRAME_COUNT: usize = 12;

/// Brightness of frame `index` in the generated clip.
fn gray_level(index: usize) -> u8 {
    (index * 20) as u8
}

struct Fixture {
    directory: TempDir,
    video: PathBuf,
}

impl Fixture {
    fn output(&self, name: &str) -> PathBuf {
        self.directory.path().join(name)
    }
}

fn fixture() -> Option<Fixture> {
    let directory = tempfile::tempdir().expect("Failed to create temp dir");
    let video = directory.path().join("sample.mp4");
    create_test_video(&video).then_some(Fixture { directory, video })
}

fn create_test_video(path: &Path) -> bool {
    ffmpeg_next::init().unwrap();

    let Some(codec) = ffmpeg_next::encoder::find(Id::MPEG4) else {
        eprintln!("Skipping: MPEG-4 encoder not available");
        return false;
    };

    let mut output = ffmpeg_next::format::output(path).unwrap();
    let global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);
    let mut stream = output.add_stream(codec).unwrap();

    let mut context = CodecContext::new_with_codec(codec).encoder().video().unwrap();
    context.set_width(WIDTH);
    context.set_height(HEIGHT);
    context.set_format(Pixel::YUV420P);
    context.set_time_base(Rational(1, FPS));
    context.set_frame_rate(Some(Rational(FPS, 1)));
    if global_header {
        context.set_flags(CodecFlags::GLOBAL_HEADER);
    }

    let mut encoder = context.open_as(codec).unwrap();
    stream.set_parameters(&encoder);
    output.write_header().unwrap();
    let stream_time_base = output.stream(0).unwrap().time_base();

    let mut scaler = ScalingContext::get(
        Pixel::RGB24,
        WIDTH,
        HEIGHT,
        Pixel::YUV420P,
        WIDTH,
        HEIGHT,
        ScalingFlags::BILINEAR,
    )
    .unwrap();

    for index in 0..FRAME_COUNT {
        let mut rgb_frame = VideoFrame::new(Pixel::RGB24, WIDTH, HEIGHT);
        let stride = rgb_frame.stride(0);
        let value = gray_level(index);
        let data = rgb_frame.data_mut(0);
        for row in 0..HEIGHT as usize {
            data[row * stride..row * stride + WIDTH as usize * 3].fill(value);
        }

        let mut yuv_frame = VideoFrame::empty();
        scaler.run(&rgb_frame, &mut yuv_frame).unwrap();
        yuv_frame.set_pts(Some(index as i64));

        encoder.send_frame(&yuv_frame).unwrap();
        write_packets(&mut encoder, &mut output, stream_time_base);
    }

    encoder.send_eof().unwrap();
    write_packets(&mut encoder, &mut output, stream_time_base);
    output.write_trailer().unwrap();
    true
}

fn write_packets(encoder: &mut Encoder, output: &mut Output, stream_time_base: Rational) {
    let mut packet = Packet::empty();
    while encoder.receive_packet(&mut packet).is_ok() {
        packet.set_stream(0);
        packet.rescale_ts(Rational(1, FPS), stream_time_base);
        packet.write_interleaved(output).unwrap();
    }
}

/// Run the extraction, or return `None` if FFmpeg has no PNG encoder.
fn run_or_skip(extractor: FrameExtractor) -> Option<ExtractionSummary> {
    match extractor.run() {
        Ok(summary) => Some(summary),
        Err(ExtractError::CodecNegotiation(reason)) => {
            eprintln!("Skipping: {reason}");
            None
        }
        Err(error) => panic!("extraction failed: {error}"),
    }
}

fn read_all(directory: &Path, count: usize) -> Vec<Vec<u8>> {
    (0..count)
        .map(|index| std::fs::read(directory.join(file_name(index))).unwrap())
        .collect()
}

#[test]
fn extracts_every_frame_as_numbered_png() {
    let Some(fixture) = fixture() else { return };
    let output = fixture.output("tmp");

    let Some(summary) = run_or_skip(FrameExtractor::new(&fixture.video).with_output_dir(&output))
    else {
        return;
    };

    assert_eq!(summary.report.frames_written, FRAME_COUNT);
    assert_eq!(summary.output_dir, output);
    for index in 0..FRAME_COUNT {
        let image = image::open(output.join(file_name(index)))
            .unwrap_or_else(|error| panic!("frame {index}: {error}"))
            .to_rgb8();
        assert_eq!(image.dimensions(), (WIDTH, HEIGHT));
    }
    assert!(!output.join(file_name(FRAME_COUNT)).exists());
    assert_eq!(std::fs::read_dir(&output).unwrap().count(), FRAME_COUNT);
}

#[test]
fn frames_are_written_in_decode_order() {
    let Some(fixture) = fixture() else { return };
    let output = fixture.output("ordered");

    FrameExtractor::new(&fixture.video)
        .with_output_dir(&output)
        .with_png_backend(PngBackend::Image)
        .run()
        .unwrap();

    let brightness: Vec<u8> = (0..FRAME_COUNT)
        .map(|index| {
            let image = image::open(output.join(file_name(index))).unwrap().to_rgb8();
            image.get_pixel(WIDTH / 2, HEIGHT / 2).0[1]
        })
        .collect();

    // The clip brightens by 20 levels per frame; allow for lossy coding.
    let first = i32::from(gray_level(0));
    let last = i32::from(gray_level(FRAME_COUNT - 1));
    assert!((i32::from(brightness[0]) - first).abs() < 24, "{brightness:?}");
    assert!((i32::from(brightness[FRAME_COUNT - 1]) - last).abs() < 24, "{brightness:?}");
    // Coding error is well under one step, so a swapped pair shows up as a
    // drop in brightness.
    for pair in brightness.windows(2) {
        assert!(pair[1] > pair[0], "frames out of order: {brightness:?}");
    }
}

#[test]
fn backends_produce_identical_pixels() {
    let Some(fixture) = fixture() else { return };
    let ffmpeg_output = fixture.output("ffmpeg");
    let image_output = fixture.output("image");

    let Some(_) = run_or_skip(
        FrameExtractor::new(&fixture.video)
            .with_output_dir(&ffmpeg_output)
            .with_png_backend(PngBackend::Ffmpeg),
    ) else {
        return;
    };
    let summary = FrameExtractor::new(&fixture.video)
        .with_output_dir(&image_output)
        .with_png_backend(PngBackend::Image)
        .run()
        .unwrap();
    assert_eq!(summary.report.frames_written, FRAME_COUNT);

    for index in 0..FRAME_COUNT {
        let name = file_name(index);
        let from_ffmpeg = image::open(ffmpeg_output.join(&name)).unwrap().to_rgb8();
        let from_image = image::open(image_output.join(&name)).unwrap().to_rgb8();
        assert_eq!(from_ffmpeg, from_image, "{name}");
    }
}

#[test]
fn rerun_overwrites_byte_for_byte() {
    let Some(fixture) = fixture() else { return };
    let output = fixture.output("tmp");
    let extractor = FrameExtractor::new(&fixture.video).with_output_dir(&output);

    let Some(first) = run_or_skip(extractor.clone()) else {
        return;
    };
    let first_bytes = read_all(&output, first.report.frames_written);

    let second = extractor.run().unwrap();
    let second_bytes = read_all(&output, second.report.frames_written);

    assert_eq!(first.report.frames_written, second.report.frames_written);
    assert_eq!(first_bytes, second_bytes);
}

#[test]
fn existing_files_are_replaced() {
    let Some(fixture) = fixture() else { return };
    let output = fixture.output("tmp");
    std::fs::create_dir_all(&output).unwrap();
    std::fs::write(output.join("000.png"), b"stale").unwrap();

    FrameExtractor::new(&fixture.video)
        .with_output_dir(&output)
        .with_png_backend(PngBackend::Image)
        .run()
        .unwrap();

    let image = image::open(output.join("000.png")).unwrap();
    assert_eq!(image.width(), WIDTH);
}

#[test]
fn probe_describes_stream() {
    let Some(fixture) = fixture() else { return };

    let stream = FrameExtractor::new(&fixture.video).probe().unwrap();

    assert_eq!(stream.index, 0);
    assert_eq!((stream.width, stream.height), (WIDTH, HEIGHT));
    assert_eq!(stream.codec, "mpeg4");
    assert_eq!(stream.pixel_format, Pixel::YUV420P);
    assert!(!fixture.output("tmp").exists());
}

#[test]
fn decoder_returns_every_frame_after_drain() {
    let Some(fixture) = fixture() else { return };
    let mut source = MediaSource::open(&fixture.video).unwrap();
    let stream = source.best_video_stream().unwrap();
    let mut decoder = FfmpegDecoder::open(&source, &stream).unwrap();

    let mut decoded = 0;
    for packet in source.packets() {
        let packet = packet.unwrap();
        assert_eq!(packet.stream_index(), stream.index);
        match decoder.decode(DecodeInput::Packet(&packet)) {
            DecodeStatus::Ready(frame) => {
                assert_eq!((frame.width(), frame.height()), (WIDTH, HEIGHT));
                decoded += 1;
            }
            DecodeStatus::NeedMoreInput => {}
            DecodeStatus::EndOfStream => panic!("end of stream before end of input"),
            DecodeStatus::Fatal(code) => panic!("decode failed with {code}"),
        }
    }

    loop {
        match decoder.decode(DecodeInput::EndOfInput) {
            DecodeStatus::Ready(_) => decoded += 1,
            DecodeStatus::EndOfStream => break,
            DecodeStatus::NeedMoreInput => panic!("decoder stalled while draining"),
            DecodeStatus::Fatal(code) => panic!("drain failed with {code}"),
        }
    }

    assert_eq!(decoded, FRAME_COUNT);
    assert!(matches!(
        decoder.decode(DecodeInput::EndOfInput),
        DecodeStatus::EndOfStream
    ));
    assert_eq!(source.packets().count(), 0);
}
