//! Per-category metadata extraction for leaf and unknown files.
//!
//! Only file headers are read. Nothing here panics or returns an error:
//! a file that cannot be read or decoded yields [`FileMetadata::Failed`],
//! and a file type without an extractor yields `None`.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};

use bd_core::{AudioMetadata, FileMetadata, ImageMetadata, ModelMetadata, TextMetadata};
use camino::Utf8Path;
use tracing::debug;

const IMAGE_TYPES: &[&str] = &[
    "jpg", "jpeg", "png", "tiff", "tif", "bmp", "gif", "webp", "exr", "hdr",
];
const AUDIO_TYPES: &[&str] = &["mp3", "wav", "flac", "aac", "ogg", "aiff"];
const TEXT_TYPES: &[&str] = &["txt", "md", "rst", "csv", "json", "xml", "yaml", "yml"];
const MODEL_TYPES: &[&str] = &["obj", "fbx", "usd", "usda", "glb", "gltf"];

/// Bytes read from an image to find its dimensions. GIF frames past this
/// point are not counted.
const IMAGE_HEADER_LIMIT: u64 = 512 * 1024;

/// Bytes after the ID3 tag searched for the first MPEG audio frame.
const MP3_SCAN_LIMIT: u64 = 256 * 1024;

/// Bytes at the end of an Ogg stream searched for the last page.
const OGG_TAIL_LIMIT: u64 = 64 * 1024;

/// Layer III bitrates in kbit/s by index, for MPEG-1 and MPEG-2/2.5.
const MP3_BITRATES: [[u16; 15]; 2] = [
    [0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320],
    [0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160],
];

/// Sample rates by index, for MPEG-1, MPEG-2, and MPEG-2.5.
const MP3_SAMPLE_RATES: [[u32; 3]; 3] = [
    [44_100, 48_000, 32_000],
    [22_050, 24_000, 16_000],
    [11_025, 12_000, 8_000],
];

/// Extracts [`FileMetadata`] for non-container files.
///
/// # Examples
///
/// ```
/// use bd_core::FileMetadata;
/// use bd_scanner::MetadataExtractor;
/// use camino::Utf8Path;
///
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("notes.txt");
/// std::fs::write(&path, "two words\nthree more words\n")?;
///
/// let extractor = MetadataExtractor::new();
/// let meta = extractor.extract(Utf8Path::from_path(&path).unwrap(), "txt");
/// match meta {
///     Some(FileMetadata::Text(text)) => assert_eq!((text.line_count, text.word_count), (2, 5)),
///     other => panic!("unexpected {other:?}"),
/// }
/// assert!(extractor.extract(Utf8Path::new("/p/font.ttf"), "ttf").is_none());
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    /// Creates an extractor.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Extracts metadata for `path`, dispatching on `file_type`.
    ///
    /// Returns `None` for file types without an extractor.
    #[must_use]
    pub fn extract(&self, path: &Utf8Path, file_type: &str) -> Option<FileMetadata> {
        let result = if IMAGE_TYPES.contains(&file_type) {
            self.image(path).map(FileMetadata::Image)
        } else if AUDIO_TYPES.contains(&file_type) {
            audio(path, file_type).map(FileMetadata::Audio)
        } else if TEXT_TYPES.contains(&file_type) {
            text(path).map(FileMetadata::Text)
        } else if MODEL_TYPES.contains(&file_type) {
            model(path, file_type).map(FileMetadata::Model)
        } else {
            return None;
        };

        Some(result.unwrap_or_else(|err| {
            debug!(%path, error = %err, "Metadata extraction failed");
            FileMetadata::failed(err.to_string())
        }))
    }

    fn image(&self, path: &Utf8Path) -> io::Result<ImageMetadata> {
        let mut header = Vec::new();
        File::open(path)?
            .take(IMAGE_HEADER_LIMIT)
            .read_to_end(&mut header)?;

        let format = image_format(&header);
        let dimensions = image_dimensions(&header);
        if format.is_none() && dimensions.is_none() {
            return Err(invalid_data("unrecognized image data"));
        }

        let (width, height) = dimensions.unzip();
        Ok(ImageMetadata {
            format,
            width,
            height,
            mode: image_mode(&header),
            frame_count: frame_count(&header),
        })
    }
}

fn invalid_data(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.to_owned())
}

fn be32(bytes: &[u8], at: usize) -> Option<u32> {
    Some(u32::from_be_bytes(bytes.get(at..at + 4)?.try_into().ok()?))
}

fn round_hundredths(seconds: f64) -> f64 {
    (seconds * 100.0).round() / 100.0
}

fn image_format(header: &[u8]) -> Option<String> {
    if header.starts_with(b"#?RADIANCE") || header.starts_with(b"#?RGBE") {
        return Some("HDR".to_owned());
    }
    if header.starts_with(&[0x76, 0x2f, 0x31, 0x01]) {
        return Some("EXR".to_owned());
    }
    infer::get(header)
        .filter(|kind| kind.matcher_type() == infer::MatcherType::Image)
        .map(|kind| kind.extension().to_ascii_uppercase())
}

fn image_dimensions(header: &[u8]) -> Option<(u32, u32)> {
    let be16 = |at: usize| Some(u16::from_be_bytes([*header.get(at)?, *header.get(at + 1)?]));
    let le16 = |at: usize| Some(u16::from_le_bytes([*header.get(at)?, *header.get(at + 1)?]));
    let be32 = |at: usize| Some(u32::from_be_bytes(header.get(at..at + 4)?.try_into().ok()?));
    let le32 = |at: usize| Some(i32::from_le_bytes(header.get(at..at + 4)?.try_into().ok()?));

    if header.starts_with(b"\x89PNG\r\n\x1a\n") && header.get(12..16) == Some(b"IHDR".as_slice()) {
        return Some((be32(16)?, be32(20)?));
    }
    if header.starts_with(b"GIF8") {
        return Some((u32::from(le16(6)?), u32::from(le16(8)?)));
    }
    if header.starts_with(b"BM") {
        return Some((le32(18)?.unsigned_abs(), le32(22)?.unsigned_abs()));
    }
    if header.starts_with(&[0xFF, 0xD8]) {
        let frame = jpeg_frame(header)?;
        return Some((u32::from(be16(frame + 7)?), u32::from(be16(frame + 5)?)));
    }
    if header.starts_with(b"#?") {
        return radiance_dimensions(header);
    }
    None
}

/// Returns the offset of the first start-of-frame marker.
fn jpeg_frame(header: &[u8]) -> Option<usize> {
    let mut at = 2;
    loop {
        if *header.get(at)? != 0xFF {
            return None;
        }
        let marker = *header.get(at + 1)?;
        match marker {
            // Fill byte.
            0xFF => at += 1,
            // Markers without a length field.
            0x01 | 0xD0..=0xD8 => at += 2,
            // Start of frame, excluding DHT, JPG, and DAC.
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => return Some(at),
            _ => {
                let length = u16::from_be_bytes([*header.get(at + 2)?, *header.get(at + 3)?]);
                at += 2 + usize::from(length);
            }
        }
    }
}

fn image_mode(header: &[u8]) -> Option<String> {
    let mode = if header.starts_with(b"\x89PNG") {
        match *header.get(25)? {
            0 => "L",
            2 => "RGB",
            3 => "P",
            4 => "LA",
            6 => "RGBA",
            _ => return None,
        }
    } else if header.starts_with(b"GIF8") {
        "P"
    } else if header.starts_with(b"BM") {
        match u16::from_le_bytes([*header.get(28)?, *header.get(29)?]) {
            1 => "1",
            4 | 8 => "P",
            16 | 24 => "RGB",
            32 => "RGBA",
            _ => return None,
        }
    } else if header.starts_with(&[0xFF, 0xD8]) {
        match *header.get(jpeg_frame(header)? + 9)? {
            1 => "L",
            3 => "RGB",
            4 => "CMYK",
            _ => return None,
        }
    } else if header.starts_with(b"#?") {
        "RGB"
    } else {
        return None;
    };
    Some(mode.to_owned())
}

fn frame_count(header: &[u8]) -> Option<u32> {
    if header.starts_with(b"\x89PNG") {
        return Some(png_frames(header));
    }
    if header.starts_with(b"GIF8") {
        return gif_frames(header);
    }
    None
}

/// Reads the `acTL` frame count of an animated PNG, or 1 for a still image.
fn png_frames(header: &[u8]) -> u32 {
    let mut at = 8;
    while let (Some(length), Some(kind)) = (be32(header, at), header.get(at + 4..at + 8)) {
        match kind {
            b"acTL" => return be32(header, at + 8).unwrap_or(1),
            b"IDAT" | b"IEND" => break,
            _ => at = at.saturating_add(12).saturating_add(length as usize),
        }
    }
    1
}

/// Counts image descriptors in a GIF block stream.
fn gif_frames(header: &[u8]) -> Option<u32> {
    let mut at = 13 + gif_color_table_len(*header.get(10)?);
    let mut frames = 0;
    while let Some(&block) = header.get(at) {
        match block {
            0x21 => at = skip_sub_blocks(header, at + 2),
            0x2C => {
                let Some(&flags) = header.get(at + 9) else {
                    break;
                };
                frames += 1;
                // Descriptor, local color table, then the LZW code size byte.
                at = skip_sub_blocks(header, at + 10 + gif_color_table_len(flags) + 1);
            }
            _ => break,
        }
    }
    (frames > 0).then_some(frames)
}

fn gif_color_table_len(flags: u8) -> usize {
    if flags & 0x80 == 0 {
        0
    } else {
        3 << ((flags & 0x07) + 1)
    }
}

/// Returns the offset just past the terminator of a sub-block chain.
fn skip_sub_blocks(bytes: &[u8], mut at: usize) -> usize {
    while let Some(&length) = bytes.get(at) {
        at += 1 + usize::from(length);
        if length == 0 {
            break;
        }
    }
    at
}

fn radiance_dimensions(header: &[u8]) -> Option<(u32, u32)> {
    String::from_utf8_lossy(header)
        .lines()
        .find(|line| line.starts_with("-Y ") || line.starts_with("+Y "))
        .and_then(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            match parts.as_slice() {
                [_, height, _, width] => Some((width.parse().ok()?, height.parse().ok()?)),
                _ => None,
            }
        })
}

fn audio(path: &Utf8Path, file_type: &str) -> io::Result<AudioMetadata> {
    match file_type {
        "wav" => wav(path),
        "flac" => flac(path),
        "mp3" => mp3(path),
        "ogg" => ogg_vorbis(path),
        _ => Ok(AudioMetadata {
            format: file_type.to_owned(),
            ..AudioMetadata::default()
        }),
    }
}

fn wav(path: &Utf8Path) -> io::Result<AudioMetadata> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut riff = [0u8; 12];
    reader.read_exact(&mut riff)?;
    if &riff[0..4] != b"RIFF" || &riff[8..12] != b"WAVE" {
        return Err(invalid_data("not a RIFF/WAVE file"));
    }

    let mut format: Option<(u16, u32, u16)> = None;
    let mut data_len: Option<u32> = None;

    while format.is_none() || data_len.is_none() {
        let mut chunk = [0u8; 8];
        match reader.read_exact(&mut chunk) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
        let size = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
        let padded = i64::from(size) + i64::from(size % 2);

        if &chunk[0..4] == b"fmt " {
            let mut body = Vec::new();
            (&mut reader).take(u64::from(size)).read_to_end(&mut body)?;
            if body.len() < 16 {
                return Err(invalid_data("truncated fmt chunk"));
            }
            format = Some((
                u16::from_le_bytes([body[2], body[3]]),
                u32::from_le_bytes([body[4], body[5], body[6], body[7]]),
                u16::from_le_bytes([body[14], body[15]]),
            ));
            reader.seek_relative(i64::from(size % 2))?;
        } else {
            if &chunk[0..4] == b"data" {
                data_len = Some(size);
            }
            reader.seek_relative(padded)?;
        }
    }

    let (channels, sample_rate, bit_depth) = format.ok_or_else(|| invalid_data("missing fmt chunk"))?;
    let data_len = data_len.ok_or_else(|| invalid_data("missing data chunk"))?;

    let frame_size = u32::from(channels) * u32::from(bit_depth.div_ceil(8));
    let duration = if frame_size == 0 || sample_rate == 0 {
        0.0
    } else {
        f64::from(data_len / frame_size) / f64::from(sample_rate)
    };

    Ok(AudioMetadata {
        format: "wav".to_owned(),
        channels: Some(channels),
        sample_rate: Some(sample_rate),
        bit_depth: Some(bit_depth),
        bitrate: None,
        duration_seconds: Some(round_hundredths(duration)),
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)] // Fields are masked to width
fn flac(path: &Utf8Path) -> io::Result<AudioMetadata> {
    let mut header = [0u8; 42];
    File::open(path)?.read_exact(&mut header)?;
    if &header[0..4] != b"fLaC" || header[4] & 0x7F != 0 {
        return Err(invalid_data("missing FLAC STREAMINFO block"));
    }

    // Sample rate (20 bits), channels - 1 (3), bits - 1 (5), total samples (36).
    let mut packed = [0u8; 8];
    packed.copy_from_slice(&header[18..26]);
    let packed = u64::from_be_bytes(packed);
    let sample_rate = (packed >> 44) as u32;
    let channels = ((packed >> 41) & 0x07) as u16 + 1;
    let bit_depth = ((packed >> 36) & 0x1F) as u16 + 1;
    let samples = packed & 0x0F_FFFF_FFFF;

    let duration = if sample_rate == 0 {
        0.0
    } else {
        samples as f64 / f64::from(sample_rate)
    };
    Ok(AudioMetadata {
        format: "flac".to_owned(),
        channels: Some(channels),
        sample_rate: Some(sample_rate),
        bit_depth: Some(bit_depth),
        bitrate: None,
        duration_seconds: Some(round_hundredths(duration)),
    })
}

/// A decoded MPEG Layer III frame header.
struct Mp3Frame {
    /// 0 for MPEG-1, 1 for MPEG-2, 2 for MPEG-2.5.
    version: usize,
    bitrate: u32,
    sample_rate: u32,
    channels: u16,
}

impl Mp3Frame {
    fn parse(bytes: &[u8]) -> Option<Self> {
        let word = be32(bytes, 0)?;
        if word >> 21 != 0x7FF || (word >> 17) & 0b11 != 0b01 {
            return None;
        }
        let version = match (word >> 19) & 0b11 {
            0b11 => 0,
            0b10 => 1,
            0b00 => 2,
            _ => return None,
        };
        let bitrate_index = ((word >> 12) & 0x0F) as usize;
        let rate_index = ((word >> 10) & 0b11) as usize;
        if bitrate_index == 0 || bitrate_index == 15 || rate_index == 3 {
            return None;
        }

        Some(Self {
            version,
            bitrate: u32::from(MP3_BITRATES[version.min(1)][bitrate_index]) * 1000,
            sample_rate: MP3_SAMPLE_RATES[version][rate_index],
            channels: if (word >> 6) & 0b11 == 0b11 { 1 } else { 2 },
        })
    }

    const fn samples_per_frame(&self) -> u32 {
        if self.version == 0 { 1152 } else { 576 }
    }

    /// Length of the side information that precedes a Xing header.
    const fn side_info_len(&self) -> usize {
        match (self.version == 0, self.channels == 1) {
            (true, false) => 32,
            (true, true) | (false, false) => 17,
            (false, true) => 9,
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)] // Durations and bitrates are small positive values
fn mp3(path: &Utf8Path) -> io::Result<AudioMetadata> {
    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();

    let mut tag = [0u8; 10];
    let mut audio_start = 0;
    if file.read_exact(&mut tag).is_ok() && tag.starts_with(b"ID3") {
        let size = tag[6..10].iter().fold(0u64, |acc, b| (acc << 7) | u64::from(b & 0x7F));
        let footer = if tag[5] & 0x10 == 0 { 0 } else { 10 };
        audio_start = 10 + size + footer;
    }
    file.seek(SeekFrom::Start(audio_start))?;
    let mut head = Vec::new();
    file.take(MP3_SCAN_LIMIT).read_to_end(&mut head)?;

    let (offset, frame) = (0..head.len())
        .find_map(|at| Mp3Frame::parse(&head[at..]).map(|frame| (at, frame)))
        .ok_or_else(|| invalid_data("no MPEG audio frame found"))?;
    let audio_bytes = file_len.saturating_sub(audio_start + offset as u64) as f64;

    // A Xing or Info header in the first frame carries the frame count of VBR streams.
    let xing = offset + 4 + frame.side_info_len();
    let frames = match head.get(xing..xing + 4) {
        Some(b"Xing" | b"Info") => be32(&head, xing + 4)
            .filter(|flags| flags & 1 == 1)
            .and_then(|_| be32(&head, xing + 8))
            .filter(|count| *count > 0),
        _ => None,
    };

    let (duration, bitrate) = match frames {
        Some(count) => {
            let duration = f64::from(count) * f64::from(frame.samples_per_frame())
                / f64::from(frame.sample_rate);
            (duration, (audio_bytes * 8.0 / duration) as u32)
        }
        None => (audio_bytes * 8.0 / f64::from(frame.bitrate), frame.bitrate),
    };

    Ok(AudioMetadata {
        format: "mp3".to_owned(),
        channels: Some(frame.channels),
        sample_rate: Some(frame.sample_rate),
        bit_depth: None,
        bitrate: Some(bitrate),
        duration_seconds: Some(round_hundredths(duration)),
    })
}

#[allow(clippy::cast_precision_loss)] // Granule positions fit comfortably in f64
fn ogg_vorbis(path: &Utf8Path) -> io::Result<AudioMetadata> {
    let mut file = File::open(path)?;
    let file_len = file.metadata()?.len();

    let mut head = Vec::new();
    (&mut file).take(512).read_to_end(&mut head)?;
    if !head.starts_with(b"OggS") {
        return Err(invalid_data("not an Ogg stream"));
    }
    // The identification packet follows the page header and its segment table.
    let packet = 27 + usize::from(*head.get(26).ok_or_else(|| invalid_data("truncated Ogg page"))?);
    if head.get(packet..packet + 7) != Some(b"\x01vorbis".as_slice()) {
        return Err(invalid_data("missing Vorbis identification header"));
    }
    let channels = head.get(packet + 11).copied();
    let sample_rate = head
        .get(packet + 12..packet + 16)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| invalid_data("truncated Vorbis identification header"))?;

    file.seek(SeekFrom::Start(file_len.saturating_sub(OGG_TAIL_LIMIT)))?;
    let mut tail = Vec::new();
    file.read_to_end(&mut tail)?;
    let granule = tail
        .windows(4)
        .rposition(|w| w == b"OggS")
        .and_then(|at| tail.get(at + 6..at + 14))
        .and_then(|b| b.try_into().ok())
        .map_or(0, i64::from_le_bytes);

    let duration = if sample_rate == 0 || granule <= 0 {
        0.0
    } else {
        granule as f64 / f64::from(sample_rate)
    };
    Ok(AudioMetadata {
        format: "ogg".to_owned(),
        channels: channels.map(u16::from),
        sample_rate: Some(sample_rate),
        bit_depth: None,
        bitrate: None,
        duration_seconds: Some(round_hundredths(duration)),
    })
}

fn read_lossy(path: &Utf8Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn text(path: &Utf8Path) -> io::Result<TextMetadata> {
    let content = read_lossy(path)?;
    Ok(TextMetadata {
        line_count: content.lines().count(),
        word_count: content.split_whitespace().count(),
    })
}

fn model(path: &Utf8Path, file_type: &str) -> io::Result<ModelMetadata> {
    if file_type != "obj" {
        return Ok(ModelMetadata {
            model_type: file_type.to_owned(),
            ..ModelMetadata::default()
        });
    }

    let content = read_lossy(path)?;
    let (mut vertices, mut faces, mut normals, mut texture_coords) = (0, 0, 0, 0);
    for line in content.lines().map(str::trim_start) {
        match line.split_whitespace().next() {
            Some("v") => vertices += 1,
            Some("f") => faces += 1,
            Some("vn") => normals += 1,
            Some("vt") => texture_coords += 1,
            _ => {}
        }
    }

    Ok(ModelMetadata {
        model_type: "obj".to_owned(),
        vertices: Some(vertices),
        faces: Some(faces),
        normals: Some(normals),
        texture_coords: Some(texture_coords),
    })
}

#[cfg(test)]
mod tests {
    use camino::Utf8PathBuf;

    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> Utf8PathBuf {
        let path = Utf8Path::from_path(dir.path()).unwrap().join(name);
        std::fs::write(&path, bytes).unwrap();
        path
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = b"\x89PNG\r\n\x1a\n\0\0\0\x0dIHDR".to_vec();
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0]);
        bytes
    }

    fn wav_bytes(channels: u16, rate: u32, bits: u16, data_len: u32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVE");
        bytes.extend_from_slice(b"fmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&channels.to_le_bytes());
        bytes.extend_from_slice(&rate.to_le_bytes());
        let block = u32::from(channels) * u32::from(bits / 8);
        bytes.extend_from_slice(&(rate * block).to_le_bytes());
        bytes.extend_from_slice(&(block as u16).to_le_bytes());
        bytes.extend_from_slice(&bits.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(bytes.len() + data_len as usize, 0);
        bytes
    }

    #[test]
    fn test_png_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "a.png", &png(640, 480));
        let meta = MetadataExtractor::new().extract(&path, "png");
        assert_eq!(
            meta,
            Some(FileMetadata::Image(ImageMetadata {
                format: Some("PNG".to_owned()),
                width: Some(640),
                height: Some(480),
                mode: Some("RGBA".to_owned()),
                frame_count: Some(1),
            }))
        );
    }

    #[test]
    fn test_apng_frame_count() {
        let mut apng = png(16, 16);
        // IHDR CRC, then an acTL chunk announcing 12 frames.
        apng.extend_from_slice(&[0; 4]);
        apng.extend_from_slice(&8u32.to_be_bytes());
        apng.extend_from_slice(b"acTL");
        apng.extend_from_slice(&12u32.to_be_bytes());
        apng.extend_from_slice(&0u32.to_be_bytes());
        assert_eq!(frame_count(&apng), Some(12));
    }

    #[test]
    fn test_gif_frames_and_mode() {
        // Global color table with two entries.
        let mut gif = b"GIF89a".to_vec();
        gif.extend_from_slice(&[0x02, 0x00, 0x02, 0x00, 0x80, 0, 0]);
        gif.extend_from_slice(&[0; 6]);
        for _ in 0..3 {
            // Graphic control extension.
            gif.extend_from_slice(&[0x21, 0xF9, 0x04, 0, 0, 0, 0, 0x00]);
            // Image descriptor, LZW code size, one data sub-block.
            gif.extend_from_slice(&[0x2C, 0, 0, 0, 0, 0x02, 0, 0x02, 0, 0x00]);
            gif.extend_from_slice(&[0x02, 0x02, 0x4C, 0x01, 0x00]);
        }
        gif.push(0x3B);

        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "spin.gif", &gif);
        let Some(FileMetadata::Image(image)) = MetadataExtractor::new().extract(&path, "gif") else {
            panic!("expected image metadata");
        };
        assert_eq!(image.dimensions().as_deref(), Some("2x2"));
        assert_eq!(image.mode.as_deref(), Some("P"));
        assert_eq!(image.frame_count, Some(3));
    }

    #[test]
    fn test_jpeg_mode_from_components() {
        let mut jpeg = vec![0xFF, 0xD8];
        jpeg.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x10, 0x00, 0x20, 0x03]);
        assert_eq!(image_mode(&jpeg).as_deref(), Some("RGB"));
        assert_eq!(frame_count(&jpeg), None);

        let last = jpeg.len() - 1;
        jpeg[last] = 1;
        assert_eq!(image_mode(&jpeg).as_deref(), Some("L"));
    }

    #[test]
    fn test_gif_and_bmp_dimensions() {
        let mut gif = b"GIF89a".to_vec();
        gif.extend_from_slice(&[0x20, 0x00, 0x10, 0x00, 0, 0, 0]);
        assert_eq!(image_dimensions(&gif), Some((32, 16)));

        let mut bmp = vec![0u8; 26];
        bmp[0..2].copy_from_slice(b"BM");
        bmp[18..22].copy_from_slice(&100i32.to_le_bytes());
        bmp[22..26].copy_from_slice(&(-50i32).to_le_bytes());
        assert_eq!(image_dimensions(&bmp), Some((100, 50)));
    }

    #[test]
    fn test_jpeg_dimensions_skip_app_segments() {
        let mut jpeg = vec![0xFF, 0xD8];
        // APP0 with a 16 byte payload.
        jpeg.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x10]);
        jpeg.extend_from_slice(&[0u8; 14]);
        // SOF0: length, precision, height, width.
        jpeg.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x11, 0x08, 0x01, 0xE0, 0x02, 0x80]);
        assert_eq!(image_dimensions(&jpeg), Some((640, 480)));
    }

    #[test]
    fn test_radiance_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "sky.hdr",
            b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n\n-Y 512 +X 1024\n\x02\x02",
        );
        let Some(FileMetadata::Image(image)) = MetadataExtractor::new().extract(&path, "hdr") else {
            panic!("expected image metadata");
        };
        assert_eq!(image.format.as_deref(), Some("HDR"));
        assert_eq!(image.dimensions().as_deref(), Some("1024x512"));
    }

    #[test]
    fn test_corrupt_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "broken.png", b"definitely not an image");
        let meta = MetadataExtractor::new().extract(&path, "png");
        assert!(matches!(meta, Some(FileMetadata::Failed { .. })));
    }

    #[test]
    fn test_missing_file_fails() {
        let meta = MetadataExtractor::new().extract(Utf8Path::new("/no/such/file.txt"), "txt");
        assert!(meta.and_then(|m| m.error().map(str::to_owned)).is_some());
    }

    #[test]
    fn test_wav_parameters() {
        let dir = tempfile::tempdir().unwrap();
        // 0.5 s of 16-bit stereo at 8 kHz.
        let path = write(&dir, "beep.wav", &wav_bytes(2, 8_000, 16, 16_000));
        let Some(FileMetadata::Audio(audio)) = MetadataExtractor::new().extract(&path, "wav") else {
            panic!("expected audio metadata");
        };
        assert_eq!(audio.channels, Some(2));
        assert_eq!(audio.sample_rate, Some(8_000));
        assert_eq!(audio.bit_depth, Some(16));
        assert_eq!(audio.duration_seconds, Some(0.5));
    }

    #[test]
    fn test_flac_streaminfo() {
        // 2 s of 24-bit stereo at 48 kHz.
        let packed: u64 = (48_000 << 44) | (1 << 41) | (23 << 36) | 96_000;
        let mut flac = b"fLaC".to_vec();
        flac.extend_from_slice(&[0x80, 0x00, 0x00, 34]);
        flac.extend_from_slice(&[0; 10]);
        flac.extend_from_slice(&packed.to_be_bytes());
        flac.extend_from_slice(&[0; 16]);

        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "score.flac", &flac);
        assert_eq!(
            MetadataExtractor::new().extract(&path, "flac"),
            Some(FileMetadata::Audio(AudioMetadata {
                format: "flac".to_owned(),
                channels: Some(2),
                sample_rate: Some(48_000),
                bit_depth: Some(24),
                bitrate: None,
                duration_seconds: Some(2.0),
            }))
        );
    }

    #[test]
    fn test_mp3_constant_bitrate_after_id3() {
        // ID3v2 tag with a 10 byte body, then 128 kbit/s stereo frames at 44.1 kHz.
        let mut mp3 = b"ID3\x03\x00\x00\x00\x00\x00\x0a".to_vec();
        mp3.extend_from_slice(&[0; 10]);
        mp3.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
        mp3.resize(20 + 16_000, 0);

        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "theme.mp3", &mp3);
        let Some(FileMetadata::Audio(audio)) = MetadataExtractor::new().extract(&path, "mp3") else {
            panic!("expected audio metadata");
        };
        assert_eq!(audio.bitrate, Some(128_000));
        assert_eq!(audio.sample_rate, Some(44_100));
        assert_eq!(audio.channels, Some(2));
        assert_eq!(audio.duration_seconds, Some(1.0));
    }

    #[test]
    fn test_mp3_xing_frame_count() {
        // Mono MPEG-1 at 48 kHz: 125 frames of 1152 samples last 3 s.
        let mut mp3 = vec![0xFF, 0xFB, 0x94, 0xC0];
        mp3.extend_from_slice(&[0; 17]);
        mp3.extend_from_slice(b"Xing");
        mp3.extend_from_slice(&1u32.to_be_bytes());
        mp3.extend_from_slice(&125u32.to_be_bytes());
        mp3.resize(48_000, 0);

        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "vbr.mp3", &mp3);
        let Some(FileMetadata::Audio(audio)) = MetadataExtractor::new().extract(&path, "mp3") else {
            panic!("expected audio metadata");
        };
        assert_eq!(audio.channels, Some(1));
        assert_eq!(audio.sample_rate, Some(48_000));
        assert_eq!(audio.duration_seconds, Some(3.0));
        assert_eq!(audio.bitrate, Some(128_000));
    }

    #[test]
    fn test_mp3_without_frames_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "empty.mp3", b"ID3");
        assert!(matches!(
            MetadataExtractor::new().extract(&path, "mp3"),
            Some(FileMetadata::Failed { .. })
        ));
    }

    fn ogg_page(header_type: u8, granule: i64, segments: &[u8]) -> Vec<u8> {
        let mut page = b"OggS".to_vec();
        page.push(0);
        page.push(header_type);
        page.extend_from_slice(&granule.to_le_bytes());
        page.extend_from_slice(&[0; 12]);
        page.push(segments.len() as u8);
        page.extend_from_slice(segments);
        page
    }

    #[test]
    fn test_ogg_vorbis_duration_from_last_granule() {
        let mut ogg = ogg_page(0x02, 0, &[30]);
        ogg.extend_from_slice(b"\x01vorbis");
        ogg.extend_from_slice(&0u32.to_le_bytes());
        ogg.push(2);
        ogg.extend_from_slice(&44_100u32.to_le_bytes());
        ogg.extend_from_slice(&[0; 14]);
        ogg.extend_from_slice(&[0; 1024]);
        ogg.extend(ogg_page(0x04, 88_200, &[]));

        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "ambience.ogg", &ogg);
        assert_eq!(
            MetadataExtractor::new().extract(&path, "ogg"),
            Some(FileMetadata::Audio(AudioMetadata {
                format: "ogg".to_owned(),
                channels: Some(2),
                sample_rate: Some(44_100),
                bit_depth: None,
                bitrate: None,
                duration_seconds: Some(2.0),
            }))
        );
    }

    #[test]
    fn test_other_audio_reports_format_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "theme.aiff", b"FORM");
        let meta = MetadataExtractor::new().extract(&path, "aiff");
        assert_eq!(
            meta,
            Some(FileMetadata::Audio(AudioMetadata {
                format: "aiff".to_owned(),
                ..AudioMetadata::default()
            }))
        );
    }

    #[test]
    fn test_invalid_wav_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "fake.wav", b"RIFX0000WAVE");
        assert!(matches!(
            MetadataExtractor::new().extract(&path, "wav"),
            Some(FileMetadata::Failed { .. })
        ));
    }

    #[test]
    fn test_text_counts_lossy() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "notes.md", b"# Title\n\nsome \xFF words here\nlast");
        let meta = MetadataExtractor::new().extract(&path, "md");
        assert_eq!(
            meta,
            Some(FileMetadata::Text(TextMetadata {
                line_count: 4,
                word_count: 7,
            }))
        );
    }

    #[test]
    fn test_obj_counts() {
        let dir = tempfile::tempdir().unwrap();
        let obj = "# cube\nv 0 0 0\nv 1 0 0\nv 1 1 0\nvt 0 0\nvn 0 0 1\nvn 0 0 1\nf 1 2 3\n";
        let path = write(&dir, "tri.obj", obj.as_bytes());
        let meta = MetadataExtractor::new().extract(&path, "obj");
        assert_eq!(
            meta,
            Some(FileMetadata::Model(ModelMetadata {
                model_type: "obj".to_owned(),
                vertices: Some(3),
                faces: Some(1),
                normals: Some(2),
                texture_coords: Some(1),
            }))
        );
    }

    #[test]
    fn test_other_models_report_type() {
        let meta = MetadataExtractor::new().extract(Utf8Path::new("/p/rig.fbx"), "fbx");
        assert_eq!(
            meta,
            Some(FileMetadata::Model(ModelMetadata {
                model_type: "fbx".to_owned(),
                ..ModelMetadata::default()
            }))
        );
    }

    #[test]
    fn test_unrecognized_types_yield_none() {
        let extractor = MetadataExtractor::new();
        for ty in ["ttf", "pdf", "blend", "unknown", "psd"] {
            assert!(extractor.extract(Utf8Path::new("/p/x"), ty).is_none(), "{ty}");
        }
    }
}
