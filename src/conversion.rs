//! Internal pixel-buffer helpers.

use ffmpeg_next::frame::Video as VideoFrame;

/// Copy the first plane of `video_frame` into a tightly packed buffer.
///
/// FFmpeg pads each row to an alignment boundary, so `stride(0)` is often
/// larger than `width * bytes_per_pixel`. The padding is dropped.
pub(crate) fn frame_to_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_len = (width as usize) * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_len {
        data[..row_len * (height as usize)].to_vec()
    } else {
        data.chunks(stride)
            .take(height as usize)
            .flat_map(|row| &row[..row_len])
            .copied()
            .collect()
    }
}
