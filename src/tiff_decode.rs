//! In-memory GeoTIFF subset decoder.
//!
//! Parses a fetched byte buffer into a [`DecodedRaster`]: dimensions,
//! 8-bit display samples in the container's native layout, and the
//! geographic bounding box when geolocation tags are present.
//!
//! Supported container shape:
//! - Classic TIFF, either byte order, first directory only (multi-page
//!   files render their first page)
//! - Strip- and tile-organized sample data
//! - Compression: none, LZW, Deflate, Zstd, JPEG
//! - Horizontal-differencing predictor for 8- and 16-bit samples
//! - Chunky (interleaved) and planar sample layouts
//! - Sample formats u8/i8/u16/i16/u32/i32/f32/f64, normalized to 8-bit
//!   for display
//!
//! Geolocation follows the `GeoTIFF` tag set: `ModelPixelScale` +
//! `ModelTiepoint` define the pixel-to-world affine transform, applied to
//! the corner pixels to produce the extent. The `GeoKey` directory is
//! consulted only to reject projected coordinate systems (see DESIGN.md);
//! no reprojection is performed.

use std::collections::HashMap;
use std::io::Read;

use tracing::{debug, warn};

use crate::error::DecodeError;
use crate::geometry::GeoBounds;
use crate::raster::{DecodedRaster, RasterSamples, SampleLayout};

// TIFF tag constants
const TAG_IMAGE_WIDTH: u16 = 256;
const TAG_IMAGE_LENGTH: u16 = 257;
const TAG_BITS_PER_SAMPLE: u16 = 258;
const TAG_COMPRESSION: u16 = 259;
const TAG_STRIP_OFFSETS: u16 = 273;
const TAG_SAMPLES_PER_PIXEL: u16 = 277;
const TAG_ROWS_PER_STRIP: u16 = 278;
const TAG_STRIP_BYTE_COUNTS: u16 = 279;
const TAG_PLANAR_CONFIGURATION: u16 = 284;
const TAG_PREDICTOR: u16 = 317;
const TAG_TILE_WIDTH: u16 = 322;
const TAG_TILE_LENGTH: u16 = 323;
const TAG_TILE_OFFSETS: u16 = 324;
const TAG_TILE_BYTE_COUNTS: u16 = 325;
const TAG_SAMPLE_FORMAT: u16 = 339;
const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
const TAG_MODEL_TIEPOINT: u16 = 33922;
const TAG_GEO_KEY_DIRECTORY: u16 = 34735;

// GeoKey constants
const GEO_KEY_GEOGRAPHIC_TYPE: u16 = 2048;
const GEO_KEY_PROJECTED_CRS: u16 = 3072;

// Compression constants
const COMPRESSION_NONE: u16 = 1;
const COMPRESSION_LZW: u16 = 5;
const COMPRESSION_JPEG: u16 = 7;
const COMPRESSION_DEFLATE: u16 = 8;
const COMPRESSION_DEFLATE_OLD: u16 = 32946;
const COMPRESSION_ZSTD: u16 = 50000;

// Sample format constants
const SAMPLE_FORMAT_UINT: u16 = 1;
const SAMPLE_FORMAT_INT: u16 = 2;
const SAMPLE_FORMAT_FLOAT: u16 = 3;

/// Sample storage type detected from TIFF tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleType {
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    F32,
    F64,
}

impl SampleType {
    fn bytes_per_sample(self) -> usize {
        match self {
            SampleType::U8 | SampleType::I8 => 1,
            SampleType::U16 | SampleType::I16 => 2,
            SampleType::U32 | SampleType::I32 | SampleType::F32 => 4,
            SampleType::F64 => 8,
        }
    }

    fn from_tags(bits_per_sample: u16, sample_format: u16) -> Option<Self> {
        match (sample_format, bits_per_sample) {
            (SAMPLE_FORMAT_UINT, 8) => Some(SampleType::U8),
            (SAMPLE_FORMAT_UINT, 16) => Some(SampleType::U16),
            (SAMPLE_FORMAT_UINT, 32) => Some(SampleType::U32),
            (SAMPLE_FORMAT_INT, 8) => Some(SampleType::I8),
            (SAMPLE_FORMAT_INT, 16) => Some(SampleType::I16),
            (SAMPLE_FORMAT_INT, 32) => Some(SampleType::I32),
            (SAMPLE_FORMAT_FLOAT, 32) => Some(SampleType::F32),
            (SAMPLE_FORMAT_FLOAT, 64) => Some(SampleType::F64),
            // Default to unsigned when the format tag is absent
            (_, 8) => Some(SampleType::U8),
            (_, 16) => Some(SampleType::U16),
            (_, 32) => Some(SampleType::U32),
            _ => None,
        }
    }
}

/// Compression method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Compression {
    None,
    Lzw,
    Jpeg,
    Deflate,
    Zstd,
}

impl Compression {
    fn from_tag(value: u16) -> Option<Self> {
        match value {
            COMPRESSION_NONE => Some(Compression::None),
            COMPRESSION_LZW => Some(Compression::Lzw),
            COMPRESSION_JPEG => Some(Compression::Jpeg),
            COMPRESSION_DEFLATE | COMPRESSION_DEFLATE_OLD => Some(Compression::Deflate),
            COMPRESSION_ZSTD => Some(Compression::Zstd),
            _ => None,
        }
    }
}

/// Pixel-to-world affine transform from the `GeoTIFF` tag pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoTransform {
    /// Pixel scale (`x_scale`, `y_scale`, `z_scale`)
    pub pixel_scale: Option<[f64; 3]>,
    /// Tiepoint (i, j, k, x, y, z) - maps pixel (i,j,k) to world (x,y,z)
    pub tiepoint: Option<[f64; 6]>,
}

impl GeoTransform {
    /// Convert pixel coordinates to world coordinates.
    #[must_use]
    pub fn pixel_to_world(&self, px: f64, py: f64) -> Option<(f64, f64)> {
        let scale = self.pixel_scale?;
        let tie = self.tiepoint?;

        let world_x = tie[3] + (px - tie[0]) * scale[0];
        let world_y = tie[4] - (py - tie[1]) * scale[1]; // Y is typically inverted

        Some((world_x, world_y))
    }

    /// World extent of an image of the given pixel size, from its corner
    /// pixels.
    #[must_use]
    pub fn extent(&self, width: usize, height: usize) -> Option<GeoBounds> {
        let (x0, y0) = self.pixel_to_world(0.0, 0.0)?;
        let (x1, y1) = self.pixel_to_world(width as f64, height as f64)?;
        Some(GeoBounds::from_corners(x0, y0, x1, y1))
    }
}

/// Coordinate reference system hint from the `GeoKey` directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrsKind {
    Geographic(u16),
    Projected(u16),
}

/// How the sample data is chunked in the file.
#[derive(Debug)]
enum ChunkLayout {
    Strips {
        offsets: Vec<u64>,
        byte_counts: Vec<u64>,
        rows_per_strip: usize,
    },
    Tiles {
        offsets: Vec<u64>,
        byte_counts: Vec<u64>,
        tile_width: usize,
        tile_height: usize,
    },
}

/// Everything parsed from the first image directory.
struct TiffInfo {
    little_endian: bool,
    width: usize,
    height: usize,
    bands: usize,
    bits_per_sample: u16,
    sample_type: SampleType,
    compression: Compression,
    predictor: u16,
    /// 1 = chunky (interleaved), 2 = planar
    planar_config: u16,
    chunks: ChunkLayout,
    geo_transform: GeoTransform,
    crs: Option<CrsKind>,
}

/// Decode a raster payload, preferring interleaved samples.
///
/// Equivalent to `decode_with_layout(bytes, SampleLayout::Interleaved)`.
pub fn decode(bytes: &[u8]) -> Result<DecodedRaster, DecodeError> {
    decode_with_layout(bytes, SampleLayout::Interleaved)
}

/// Decode a raster payload, requesting a sample layout.
///
/// The request is best-effort: when the container's native layout differs
/// from the preferred one, the decoder fails over to the native form
/// instead of erroring, and the band resolver adapts. Check
/// [`RasterSamples::layout`] on the result when the distinction matters.
pub fn decode_with_layout(
    bytes: &[u8],
    preferred: SampleLayout,
) -> Result<DecodedRaster, DecodeError> {
    let info = parse_info(bytes)?;
    let samples = assemble_samples(&info, bytes)?;

    if samples.layout() != preferred {
        debug!(
            requested = ?preferred,
            native = ?samples.layout(),
            "sample layout request failed over to container's native form"
        );
    }

    let bounds = geographic_bounds(&info);

    Ok(DecodedRaster {
        width: info.width,
        height: info.height,
        samples,
        bit_depth: info.bits_per_sample,
        bounds,
    })
}

/// Bounding box from the geolocation tags, suppressed for projected CRS.
fn geographic_bounds(info: &TiffInfo) -> Option<GeoBounds> {
    let extent = info.geo_transform.extent(info.width, info.height)?;

    match info.crs {
        Some(CrsKind::Projected(code)) => {
            warn!(epsg = code, "raster uses a projected CRS; omitting map overlay bounds");
            None
        }
        Some(CrsKind::Geographic(code)) if !(4000..5000).contains(&code) => {
            warn!(epsg = code, "unrecognized geographic CRS code; omitting map overlay bounds");
            None
        }
        _ => Some(extent),
    }
}

// ============================================================================
// Header and directory parsing
// ============================================================================

#[derive(Debug, Clone)]
struct IfdEntry {
    field_type: u16,
    count: u32,
    value_offset: u32,
    raw_bytes: [u8; 4],
}

type TagMap = HashMap<u16, IfdEntry>;

/// Bounds-checked slice access; truncation is a decode error, never a
/// panic.
fn slice_at(bytes: &[u8], offset: u64, len: usize) -> Result<&[u8], DecodeError> {
    let start = usize::try_from(offset).map_err(|_| DecodeError::Truncated {
        offset,
        needed: len,
        available: bytes.len(),
    })?;
    let end = start.checked_add(len).ok_or(DecodeError::Truncated {
        offset,
        needed: len,
        available: bytes.len(),
    })?;
    bytes.get(start..end).ok_or(DecodeError::Truncated {
        offset,
        needed: len,
        available: bytes.len(),
    })
}

#[inline]
fn read_u16(bytes: &[u8], little_endian: bool) -> u16 {
    if little_endian {
        u16::from_le_bytes([bytes[0], bytes[1]])
    } else {
        u16::from_be_bytes([bytes[0], bytes[1]])
    }
}

#[inline]
fn read_u32(bytes: &[u8], little_endian: bool) -> u32 {
    if little_endian {
        u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    } else {
        u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

#[inline]
fn read_f64(bytes: &[u8], little_endian: bool) -> f64 {
    if little_endian {
        f64::from_le_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ])
    } else {
        f64::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ])
    }
}

fn parse_info(bytes: &[u8]) -> Result<TiffInfo, DecodeError> {
    let header = slice_at(bytes, 0, 8)?;

    let little_endian = match &header[0..2] {
        b"II" => true,
        b"MM" => false,
        other => {
            return Err(DecodeError::InvalidSignature(format!(
                "unexpected byte-order mark {other:02x?}"
            )));
        }
    };

    let version = read_u16(&header[2..4], little_endian);
    if version != 42 {
        return Err(DecodeError::InvalidSignature(format!(
            "unexpected TIFF version {version}"
        )));
    }

    let ifd_offset = u64::from(read_u32(&header[4..8], little_endian));

    // First directory only; multi-page containers render their first page.
    let tags = parse_ifd(bytes, ifd_offset, little_endian)?;

    let width = get_tag_value(&tags, TAG_IMAGE_WIDTH, little_endian)
        .ok_or(DecodeError::MissingResource("ImageWidth tag"))? as usize;
    let height = get_tag_value(&tags, TAG_IMAGE_LENGTH, little_endian)
        .ok_or(DecodeError::MissingResource("ImageLength tag"))? as usize;

    if width == 0 || height == 0 {
        return Err(DecodeError::MissingResource("non-empty image dimensions"));
    }

    // BitsPerSample carries one SHORT per band; all bands share a depth in
    // the shapes we accept, so the first value decides.
    let bits_per_sample = get_tag_values(bytes, &tags, TAG_BITS_PER_SAMPLE, little_endian)?
        .and_then(|v| v.first().copied())
        .unwrap_or(8) as u16;
    let sample_format = get_tag_value(&tags, TAG_SAMPLE_FORMAT, little_endian).unwrap_or(1) as u16;
    let bands = get_tag_value(&tags, TAG_SAMPLES_PER_PIXEL, little_endian).unwrap_or(1) as usize;
    let compression_val =
        get_tag_value(&tags, TAG_COMPRESSION, little_endian).unwrap_or(1) as u16;
    let predictor = get_tag_value(&tags, TAG_PREDICTOR, little_endian).unwrap_or(1) as u16;
    let planar_config =
        get_tag_value(&tags, TAG_PLANAR_CONFIGURATION, little_endian).unwrap_or(1) as u16;

    let sample_type = SampleType::from_tags(bits_per_sample, sample_format).ok_or(
        DecodeError::Unsupported {
            what: "sample depth",
            value: u32::from(bits_per_sample),
        },
    )?;

    let compression =
        Compression::from_tag(compression_val).ok_or(DecodeError::Unsupported {
            what: "compression",
            value: u32::from(compression_val),
        })?;

    if bands == 0 {
        return Err(DecodeError::MissingResource("at least one sample band"));
    }

    let chunks = if tags.contains_key(&TAG_TILE_OFFSETS) {
        let tile_width = get_tag_value(&tags, TAG_TILE_WIDTH, little_endian)
            .ok_or(DecodeError::MissingResource("TileWidth tag"))? as usize;
        let tile_height = get_tag_value(&tags, TAG_TILE_LENGTH, little_endian)
            .ok_or(DecodeError::MissingResource("TileLength tag"))? as usize;
        if tile_width == 0 || tile_height == 0 {
            return Err(DecodeError::MissingResource("non-empty tile dimensions"));
        }
        let offsets = get_tag_values(bytes, &tags, TAG_TILE_OFFSETS, little_endian)?
            .ok_or(DecodeError::MissingResource("TileOffsets tag"))?;
        let byte_counts = get_tag_values(bytes, &tags, TAG_TILE_BYTE_COUNTS, little_endian)?
            .ok_or(DecodeError::MissingResource("TileByteCounts tag"))?;
        ChunkLayout::Tiles {
            offsets: offsets.into_iter().map(u64::from).collect(),
            byte_counts: byte_counts.into_iter().map(u64::from).collect(),
            tile_width,
            tile_height,
        }
    } else if tags.contains_key(&TAG_STRIP_OFFSETS) {
        let rows_per_strip = get_tag_value(&tags, TAG_ROWS_PER_STRIP, little_endian)
            .map_or(height, |v| v as usize)
            .clamp(1, height.max(1));
        let offsets = get_tag_values(bytes, &tags, TAG_STRIP_OFFSETS, little_endian)?
            .ok_or(DecodeError::MissingResource("StripOffsets tag"))?;
        let byte_counts = get_tag_values(bytes, &tags, TAG_STRIP_BYTE_COUNTS, little_endian)?
            .ok_or(DecodeError::MissingResource("StripByteCounts tag"))?;
        ChunkLayout::Strips {
            offsets: offsets.into_iter().map(u64::from).collect(),
            byte_counts: byte_counts.into_iter().map(u64::from).collect(),
            rows_per_strip,
        }
    } else {
        return Err(DecodeError::MissingResource("strip or tile offsets"));
    };

    let pixel_scale = get_tag_f64s(bytes, &tags, TAG_MODEL_PIXEL_SCALE, little_endian, 3)?;
    let tiepoint = get_tag_f64s(bytes, &tags, TAG_MODEL_TIEPOINT, little_endian, 6)?;

    let geo_transform = GeoTransform {
        pixel_scale: pixel_scale.map(|v| [v[0], v[1], v[2]]),
        tiepoint: tiepoint.map(|v| [v[0], v[1], v[2], v[3], v[4], v[5]]),
    };

    let crs = read_crs_from_geokeys(bytes, &tags, little_endian)?;

    Ok(TiffInfo {
        little_endian,
        width,
        height,
        bands,
        bits_per_sample,
        sample_type,
        compression,
        predictor,
        planar_config,
        chunks,
        geo_transform,
        crs,
    })
}

fn parse_ifd(bytes: &[u8], ifd_offset: u64, little_endian: bool) -> Result<TagMap, DecodeError> {
    let count_bytes = slice_at(bytes, ifd_offset, 2)?;
    let entry_count = read_u16(count_bytes, little_endian) as usize;
    if entry_count == 0 {
        return Err(DecodeError::MissingResource("image directory entries"));
    }

    let entries_bytes = slice_at(bytes, ifd_offset + 2, entry_count * 12)?;

    let mut tags: TagMap = HashMap::with_capacity(entry_count);
    for i in 0..entry_count {
        let entry = &entries_bytes[i * 12..(i + 1) * 12];
        let tag = read_u16(&entry[0..2], little_endian);
        let field_type = read_u16(&entry[2..4], little_endian);
        let count = read_u32(&entry[4..8], little_endian);
        let value_offset = read_u32(&entry[8..12], little_endian);

        tags.insert(
            tag,
            IfdEntry {
                field_type,
                count,
                value_offset,
                raw_bytes: [entry[8], entry[9], entry[10], entry[11]],
            },
        );
    }

    Ok(tags)
}

/// Inline scalar value of a BYTE/SHORT/LONG tag with count 1.
fn get_tag_value(tags: &TagMap, tag: u16, little_endian: bool) -> Option<u32> {
    let entry = tags.get(&tag)?;
    if entry.count != 1 {
        return None;
    }
    match entry.field_type {
        1 => Some(u32::from(entry.raw_bytes[0])),
        3 => Some(u32::from(read_u16(&entry.raw_bytes, little_endian))),
        4 => Some(entry.value_offset),
        _ => None,
    }
}

/// Array of SHORT/LONG values, inline when they fit the 4-byte field,
/// otherwise read from the value offset.
fn get_tag_values(
    bytes: &[u8],
    tags: &TagMap,
    tag: u16,
    little_endian: bool,
) -> Result<Option<Vec<u32>>, DecodeError> {
    let Some(entry) = tags.get(&tag) else {
        return Ok(None);
    };

    let type_size = match entry.field_type {
        3 => 2usize,
        4 => 4usize,
        _ => {
            return Err(DecodeError::Unsupported {
                what: "tag field type",
                value: u32::from(entry.field_type),
            });
        }
    };

    let total_bytes = entry.count as usize * type_size;
    let raw: &[u8] = if total_bytes <= 4 {
        &entry.raw_bytes[..total_bytes]
    } else {
        slice_at(bytes, u64::from(entry.value_offset), total_bytes)?
    };

    let mut values = Vec::with_capacity(entry.count as usize);
    for chunk in raw.chunks_exact(type_size) {
        let value = match entry.field_type {
            3 => u32::from(read_u16(chunk, little_endian)),
            4 => read_u32(chunk, little_endian),
            _ => unreachable!(),
        };
        values.push(value);
    }
    Ok(Some(values))
}

/// DOUBLE array with a minimum element count; absent or short arrays
/// read as `None`.
fn get_tag_f64s(
    bytes: &[u8],
    tags: &TagMap,
    tag: u16,
    little_endian: bool,
    min_count: usize,
) -> Result<Option<Vec<f64>>, DecodeError> {
    let Some(entry) = tags.get(&tag) else {
        return Ok(None);
    };
    if entry.field_type != 12 || (entry.count as usize) < min_count {
        return Ok(None);
    }

    let total_bytes = entry.count as usize * 8;
    let raw = slice_at(bytes, u64::from(entry.value_offset), total_bytes)?;

    let mut values = Vec::with_capacity(entry.count as usize);
    for chunk in raw.chunks_exact(8) {
        values.push(read_f64(chunk, little_endian));
    }
    Ok(Some(values))
}

/// CRS code from the `GeoKey` directory, if one is declared.
fn read_crs_from_geokeys(
    bytes: &[u8],
    tags: &TagMap,
    little_endian: bool,
) -> Result<Option<CrsKind>, DecodeError> {
    let Some(entry) = tags.get(&TAG_GEO_KEY_DIRECTORY) else {
        return Ok(None);
    };
    if entry.field_type != 3 {
        return Ok(None);
    }

    let total_bytes = entry.count as usize * 2;
    let raw: &[u8] = if total_bytes <= 4 {
        &entry.raw_bytes[..total_bytes]
    } else {
        slice_at(bytes, u64::from(entry.value_offset), total_bytes)?
    };

    // Header: KeyDirectoryVersion, KeyRevision, MinorRevision, NumberOfKeys,
    // then (KeyID, TIFFTagLocation, Count, Value) per key.
    if raw.len() < 8 {
        return Ok(None);
    }
    let num_keys = read_u16(&raw[6..8], little_endian) as usize;

    let mut geographic = None;
    let mut projected = None;
    for i in 0..num_keys {
        let offset = 8 + i * 8;
        if offset + 8 > raw.len() {
            break;
        }
        let key_id = read_u16(&raw[offset..], little_endian);
        let value = read_u16(&raw[offset + 6..], little_endian);

        if key_id == GEO_KEY_GEOGRAPHIC_TYPE && value > 0 {
            geographic = Some(value);
        }
        if key_id == GEO_KEY_PROJECTED_CRS && value > 0 {
            projected = Some(value);
        }
    }

    // A projected system wins: its model coordinates are meters, not
    // degrees, so the overlay must be suppressed.
    Ok(match (projected, geographic) {
        (Some(code), _) => Some(CrsKind::Projected(code)),
        (None, Some(code)) => Some(CrsKind::Geographic(code)),
        (None, None) => None,
    })
}

// ============================================================================
// Sample assembly
// ============================================================================

fn assemble_samples(info: &TiffInfo, bytes: &[u8]) -> Result<RasterSamples, DecodeError> {
    match info.planar_config {
        1 => assemble_interleaved(info, bytes),
        2 => assemble_planar(info, bytes),
        other => Err(DecodeError::Unsupported {
            what: "planar configuration",
            value: u32::from(other),
        }),
    }
}

/// Chunky layout: one pass over the chunks into a single interleaved
/// buffer.
fn assemble_interleaved(info: &TiffInfo, bytes: &[u8]) -> Result<RasterSamples, DecodeError> {
    let bps = info.sample_type.bytes_per_sample();
    let row_bytes = info.width * info.bands * bps;
    let mut raw = vec![0u8; info.height * row_bytes];

    match &info.chunks {
        ChunkLayout::Strips {
            offsets,
            byte_counts,
            rows_per_strip,
        } => {
            for (strip_idx, (&offset, &count)) in offsets.iter().zip(byte_counts).enumerate() {
                let row_start = strip_idx * rows_per_strip;
                if row_start >= info.height {
                    break;
                }
                let rows = (*rows_per_strip).min(info.height - row_start);
                let expected = rows * row_bytes;

                let data = read_chunk(info, bytes, offset, count, expected, info.bands)?;
                let dst = row_start * row_bytes;
                raw[dst..dst + expected].copy_from_slice(&data[..expected]);
            }
        }
        ChunkLayout::Tiles {
            offsets,
            byte_counts,
            tile_width,
            tile_height,
        } => {
            let tiles_across = info.width.div_ceil(*tile_width);
            let tile_row_bytes = tile_width * info.bands * bps;

            for (tile_idx, (&offset, &count)) in offsets.iter().zip(byte_counts).enumerate() {
                let tile_col = tile_idx % tiles_across;
                let tile_row = tile_idx / tiles_across;
                let x0 = tile_col * tile_width;
                let y0 = tile_row * tile_height;
                if x0 >= info.width || y0 >= info.height {
                    continue;
                }

                let expected = tile_row_bytes * tile_height;
                let data = read_chunk(info, bytes, offset, count, expected, info.bands)?;

                let cols = (*tile_width).min(info.width - x0);
                let rows = (*tile_height).min(info.height - y0);
                let copy_bytes = cols * info.bands * bps;
                for ty in 0..rows {
                    let src = ty * tile_row_bytes;
                    let dst = (y0 + ty) * row_bytes + x0 * info.bands * bps;
                    raw[dst..dst + copy_bytes].copy_from_slice(&data[src..src + copy_bytes]);
                }
            }
        }
    }

    Ok(RasterSamples::Interleaved {
        data: normalize_to_u8(&raw, info.sample_type, info.little_endian),
        band_count: info.bands,
    })
}

/// Planar layout: strips are grouped per band, all of band 0 first.
/// Planar tiled files are out of shape for this decoder.
fn assemble_planar(info: &TiffInfo, bytes: &[u8]) -> Result<RasterSamples, DecodeError> {
    let ChunkLayout::Strips {
        offsets,
        byte_counts,
        rows_per_strip,
    } = &info.chunks
    else {
        return Err(DecodeError::Unsupported {
            what: "planar tiled layout",
            value: 2,
        });
    };

    let bps = info.sample_type.bytes_per_sample();
    let row_bytes = info.width * bps;
    let strips_per_band = info.height.div_ceil(*rows_per_strip);

    if offsets.len() < strips_per_band * info.bands {
        return Err(DecodeError::MissingResource("per-band strip offsets"));
    }

    let mut bands = Vec::with_capacity(info.bands);
    for band in 0..info.bands {
        let mut raw = vec![0u8; info.height * row_bytes];
        for strip in 0..strips_per_band {
            let chunk_idx = band * strips_per_band + strip;
            let offset = offsets[chunk_idx];
            let count = byte_counts[chunk_idx];

            let row_start = strip * rows_per_strip;
            let rows = (*rows_per_strip).min(info.height - row_start);
            let expected = rows * row_bytes;

            let data = read_chunk(info, bytes, offset, count, expected, 1)?;
            let dst = row_start * row_bytes;
            raw[dst..dst + expected].copy_from_slice(&data[..expected]);
        }
        bands.push(normalize_to_u8(&raw, info.sample_type, info.little_endian));
    }

    Ok(RasterSamples::Planar(bands))
}

/// Fetch, decompress, and un-predict one chunk of sample data.
///
/// `channels` is the interleave stride inside the chunk: the band count
/// for chunky data, 1 for a planar band strip.
fn read_chunk(
    info: &TiffInfo,
    bytes: &[u8],
    offset: u64,
    byte_count: u64,
    expected: usize,
    channels: usize,
) -> Result<Vec<u8>, DecodeError> {
    // A zero-length chunk is valid sparse data: filled background.
    if byte_count == 0 {
        return Ok(vec![0u8; expected]);
    }

    let compressed = slice_at(bytes, offset, byte_count as usize)?;
    let mut data = decompress_chunk(compressed, info.compression, expected, channels)?;

    // Short chunks pad with zeros rather than failing the whole render.
    if data.len() < expected {
        data.resize(expected, 0);
    }

    apply_predictor(
        &mut data,
        info.predictor,
        info.width,
        channels,
        info.sample_type.bytes_per_sample(),
        info.little_endian,
    )?;

    Ok(data)
}

fn decompress_chunk(
    compressed: &[u8],
    compression: Compression,
    expected: usize,
    channels: usize,
) -> Result<Vec<u8>, DecodeError> {
    match compression {
        Compression::None => Ok(compressed[..compressed.len().min(expected)].to_vec()),
        Compression::Deflate => {
            let mut decoder = flate2::read::ZlibDecoder::new(compressed);
            let mut out = Vec::with_capacity(expected);
            decoder
                .read_to_end(&mut out)
                .map_err(|e| DecodeError::Decompress(format!("deflate: {e}")))?;
            Ok(out)
        }
        Compression::Lzw => {
            let mut decoder =
                weezl::decode::Decoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8);
            decoder
                .decode(compressed)
                .map_err(|e| DecodeError::Decompress(format!("lzw: {e}")))
        }
        Compression::Zstd => zstd::stream::decode_all(compressed)
            .map_err(|e| DecodeError::Decompress(format!("zstd: {e}"))),
        Compression::Jpeg => {
            let decoded = image::load_from_memory(compressed)
                .map_err(|e| DecodeError::Decompress(format!("jpeg: {e}")))?;
            if channels >= 3 {
                Ok(decoded.to_rgb8().into_raw())
            } else {
                Ok(decoded.to_luma8().into_raw())
            }
        }
    }
}

/// Reverse horizontal differencing (predictor 2) in place.
fn apply_predictor(
    data: &mut [u8],
    predictor: u16,
    width: usize,
    channels: usize,
    bytes_per_sample: usize,
    little_endian: bool,
) -> Result<(), DecodeError> {
    match predictor {
        1 => Ok(()),
        2 => {
            let row_samples = width * channels;
            match bytes_per_sample {
                1 => {
                    for row in data.chunks_mut(row_samples) {
                        for i in channels..row.len() {
                            row[i] = row[i].wrapping_add(row[i - channels]);
                        }
                    }
                    Ok(())
                }
                2 => {
                    let row_bytes = row_samples * 2;
                    for row in data.chunks_mut(row_bytes) {
                        let samples = row.len() / 2;
                        for i in channels..samples {
                            let prev = read_u16(&row[(i - channels) * 2..], little_endian);
                            let cur = read_u16(&row[i * 2..], little_endian);
                            let sum = cur.wrapping_add(prev);
                            let out = if little_endian {
                                sum.to_le_bytes()
                            } else {
                                sum.to_be_bytes()
                            };
                            row[i * 2..i * 2 + 2].copy_from_slice(&out);
                        }
                    }
                    Ok(())
                }
                _ => Err(DecodeError::Unsupported {
                    what: "predictor sample width",
                    value: bytes_per_sample as u32,
                }),
            }
        }
        other => Err(DecodeError::Unsupported {
            what: "predictor",
            value: u32::from(other),
        }),
    }
}

/// Normalize raw samples of any supported type to 8-bit display values.
///
/// Wider integers keep their high byte; floats clamp to 0..255. The
/// display pipeline assumes 8-bit and this keeps deeper imagery visible
/// without a min/max stretch pass.
fn normalize_to_u8(raw: &[u8], sample_type: SampleType, little_endian: bool) -> Vec<u8> {
    match sample_type {
        SampleType::U8 => raw.to_vec(),
        SampleType::I8 => raw.iter().map(|&b| (b as i8).max(0) as u8).collect(),
        SampleType::U16 => raw
            .chunks_exact(2)
            .map(|c| (read_u16(c, little_endian) >> 8) as u8)
            .collect(),
        SampleType::I16 => raw
            .chunks_exact(2)
            .map(|c| {
                let v = read_u16(c, little_endian) as i16;
                v.clamp(0, 255) as u8
            })
            .collect(),
        SampleType::U32 => raw
            .chunks_exact(4)
            .map(|c| (read_u32(c, little_endian) >> 24) as u8)
            .collect(),
        SampleType::I32 => raw
            .chunks_exact(4)
            .map(|c| {
                let v = read_u32(c, little_endian) as i32;
                v.clamp(0, 255) as u8
            })
            .collect(),
        SampleType::F32 => raw
            .chunks_exact(4)
            .map(|c| {
                let bits = read_u32(c, little_endian);
                f32::from_bits(bits).clamp(0.0, 255.0) as u8
            })
            .collect(),
        SampleType::F64 => raw
            .chunks_exact(8)
            .map(|c| read_f64(c, little_endian).clamp(0.0, 255.0) as u8)
            .collect(),
    }
}

/// Synthetic TIFF fixtures shared by the decoder tests and the preview
/// pipeline tests.
#[cfg(test)]
pub(crate) mod testutil {
    use super::*;

    /// Minimal little-endian TIFF writer for synthetic fixtures: strip
    /// data first, then value arrays, then the IFD.
    pub(crate) struct TiffBuilder {
        entries: Vec<(u16, u16, u32, u32)>,
        body: Vec<u8>,
        next_ifd_offset: u32,
    }

    impl TiffBuilder {
        pub(crate) fn new() -> Self {
            Self {
                entries: Vec::new(),
                // Header is 8 bytes; body data starts right after it.
                body: Vec::new(),
                next_ifd_offset: 0,
            }
        }

        pub(crate) fn data_offset(&self) -> u32 {
            8 + self.body.len() as u32
        }

        pub(crate) fn push_data(&mut self, data: &[u8]) -> u32 {
            let offset = self.data_offset();
            self.body.extend_from_slice(data);
            // Keep word alignment for following arrays.
            if self.body.len() % 2 == 1 {
                self.body.push(0);
            }
            offset
        }

        pub(crate) fn entry_short(&mut self, tag: u16, value: u16) {
            self.entries.push((tag, 3, 1, u32::from(value)));
        }

        pub(crate) fn entry_long(&mut self, tag: u16, value: u32) {
            self.entries.push((tag, 4, 1, value));
        }

        pub(crate) fn entry_shorts(&mut self, tag: u16, values: &[u16]) {
            if values.len() == 1 {
                self.entry_short(tag, values[0]);
            } else if values.len() == 2 {
                let packed = u32::from(values[0]) | (u32::from(values[1]) << 16);
                self.entries.push((tag, 3, 2, packed));
            } else {
                let mut raw = Vec::with_capacity(values.len() * 2);
                for v in values {
                    raw.extend_from_slice(&v.to_le_bytes());
                }
                let offset = self.push_data(&raw);
                self.entries.push((tag, 3, values.len() as u32, offset));
            }
        }

        pub(crate) fn entry_longs(&mut self, tag: u16, values: &[u32]) {
            if values.len() == 1 {
                self.entry_long(tag, values[0]);
            } else {
                let mut raw = Vec::with_capacity(values.len() * 4);
                for v in values {
                    raw.extend_from_slice(&v.to_le_bytes());
                }
                let offset = self.push_data(&raw);
                self.entries.push((tag, 4, values.len() as u32, offset));
            }
        }

        pub(crate) fn entry_doubles(&mut self, tag: u16, values: &[f64]) {
            let mut raw = Vec::with_capacity(values.len() * 8);
            for v in values {
                raw.extend_from_slice(&v.to_le_bytes());
            }
            let offset = self.push_data(&raw);
            self.entries.push((tag, 12, values.len() as u32, offset));
        }

        pub(crate) fn build(mut self) -> Vec<u8> {
            let ifd_offset = self.data_offset();
            self.entries.sort_by_key(|e| e.0);

            let mut out = Vec::new();
            out.extend_from_slice(b"II");
            out.extend_from_slice(&42u16.to_le_bytes());
            out.extend_from_slice(&ifd_offset.to_le_bytes());
            out.extend_from_slice(&self.body);

            out.extend_from_slice(&(self.entries.len() as u16).to_le_bytes());
            for (tag, field_type, count, value) in &self.entries {
                out.extend_from_slice(&tag.to_le_bytes());
                out.extend_from_slice(&field_type.to_le_bytes());
                out.extend_from_slice(&count.to_le_bytes());
                out.extend_from_slice(&value.to_le_bytes());
            }
            out.extend_from_slice(&self.next_ifd_offset.to_le_bytes());
            out
        }
    }

    /// 2x2 interleaved RGB image, uncompressed. Returns the file and its
    /// expected interleaved sample bytes.
    pub(crate) fn chunky_rgb_2x2() -> (Vec<u8>, Vec<u8>) {
        #[rustfmt::skip]
        let pixels = vec![
            10, 20, 30,  40, 50, 60,
            70, 80, 90,  100, 110, 120,
        ];
        let mut b = TiffBuilder::new();
        let strip_offset = b.push_data(&pixels);
        b.entry_long(TAG_IMAGE_WIDTH, 2);
        b.entry_long(TAG_IMAGE_LENGTH, 2);
        b.entry_shorts(TAG_BITS_PER_SAMPLE, &[8, 8, 8]);
        b.entry_short(TAG_SAMPLES_PER_PIXEL, 3);
        b.entry_short(TAG_COMPRESSION, COMPRESSION_NONE);
        b.entry_long(TAG_ROWS_PER_STRIP, 2);
        b.entry_longs(TAG_STRIP_OFFSETS, &[strip_offset]);
        b.entry_longs(TAG_STRIP_BYTE_COUNTS, &[pixels.len() as u32]);
        (b.build(), pixels)
    }

    /// 2x2 grayscale image with geolocation tags: 0.5 degree pixels
    /// anchored at (20.0 E, 30.0 N), optional `GeoKey` directory.
    pub(crate) fn geotagged(geokeys: Option<&[u16]>) -> Vec<u8> {
        let mut b = TiffBuilder::new();
        let strip = b.push_data(&[0, 0, 0, 0]);
        b.entry_long(TAG_IMAGE_WIDTH, 2);
        b.entry_long(TAG_IMAGE_LENGTH, 2);
        b.entry_short(TAG_BITS_PER_SAMPLE, 8);
        b.entry_short(TAG_SAMPLES_PER_PIXEL, 1);
        b.entry_long(TAG_ROWS_PER_STRIP, 2);
        b.entry_longs(TAG_STRIP_OFFSETS, &[strip]);
        b.entry_longs(TAG_STRIP_BYTE_COUNTS, &[4]);
        b.entry_doubles(TAG_MODEL_PIXEL_SCALE, &[0.5, 0.5, 0.0]);
        b.entry_doubles(TAG_MODEL_TIEPOINT, &[0.0, 0.0, 0.0, 20.0, 30.0, 0.0]);
        if let Some(keys) = geokeys {
            b.entry_shorts(TAG_GEO_KEY_DIRECTORY, keys);
        }
        b.build()
    }
}

#[cfg(test)]
mod tests {
    use super::testutil::*;
    use super::*;
    use std::io::Write;

    #[test]
    fn decodes_chunky_rgb() {
        let (tiff, pixels) = chunky_rgb_2x2();
        let raster = decode(&tiff).unwrap();
        assert_eq!(raster.width, 2);
        assert_eq!(raster.height, 2);
        assert_eq!(raster.bit_depth, 8);
        assert_eq!(raster.bounds, None);
        assert_eq!(
            raster.samples,
            RasterSamples::Interleaved {
                data: pixels,
                band_count: 3
            }
        );
    }

    #[test]
    fn decodes_grayscale_single_strip_per_row() {
        let mut b = TiffBuilder::new();
        let s0 = b.push_data(&[1, 2, 3]);
        let s1 = b.push_data(&[4, 5, 6]);
        b.entry_long(TAG_IMAGE_WIDTH, 3);
        b.entry_long(TAG_IMAGE_LENGTH, 2);
        b.entry_short(TAG_BITS_PER_SAMPLE, 8);
        b.entry_short(TAG_SAMPLES_PER_PIXEL, 1);
        b.entry_long(TAG_ROWS_PER_STRIP, 1);
        b.entry_longs(TAG_STRIP_OFFSETS, &[s0, s1]);
        b.entry_longs(TAG_STRIP_BYTE_COUNTS, &[3, 3]);
        let raster = decode(&b.build()).unwrap();
        assert_eq!(
            raster.samples,
            RasterSamples::Interleaved {
                data: vec![1, 2, 3, 4, 5, 6],
                band_count: 1
            }
        );
    }

    #[test]
    fn planar_file_fails_over_interleaved_request() {
        // Two bands, one strip each: band 0 then band 1.
        let mut b = TiffBuilder::new();
        let band0 = b.push_data(&[1, 2, 3, 4]);
        let band1 = b.push_data(&[5, 6, 7, 8]);
        b.entry_long(TAG_IMAGE_WIDTH, 2);
        b.entry_long(TAG_IMAGE_LENGTH, 2);
        b.entry_short(TAG_BITS_PER_SAMPLE, 8);
        b.entry_short(TAG_SAMPLES_PER_PIXEL, 2);
        b.entry_short(TAG_PLANAR_CONFIGURATION, 2);
        b.entry_long(TAG_ROWS_PER_STRIP, 2);
        b.entry_longs(TAG_STRIP_OFFSETS, &[band0, band1]);
        b.entry_longs(TAG_STRIP_BYTE_COUNTS, &[4, 4]);
        let tiff = b.build();

        // The interleaved request must not error; it yields planar form.
        let raster = decode_with_layout(&tiff, SampleLayout::Interleaved).unwrap();
        assert_eq!(raster.samples.layout(), SampleLayout::Planar);
        assert_eq!(
            raster.samples,
            RasterSamples::Planar(vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]])
        );
    }

    #[test]
    fn sixteen_bit_samples_keep_high_byte() {
        let values: [u16; 4] = [0x0000, 0x1234, 0xABCD, 0xFFFF];
        let mut raw = Vec::new();
        for v in values {
            raw.extend_from_slice(&v.to_le_bytes());
        }
        let mut b = TiffBuilder::new();
        let strip = b.push_data(&raw);
        b.entry_long(TAG_IMAGE_WIDTH, 2);
        b.entry_long(TAG_IMAGE_LENGTH, 2);
        b.entry_short(TAG_BITS_PER_SAMPLE, 16);
        b.entry_short(TAG_SAMPLES_PER_PIXEL, 1);
        b.entry_long(TAG_ROWS_PER_STRIP, 2);
        b.entry_longs(TAG_STRIP_OFFSETS, &[strip]);
        b.entry_longs(TAG_STRIP_BYTE_COUNTS, &[raw.len() as u32]);
        let raster = decode(&b.build()).unwrap();
        assert_eq!(raster.bit_depth, 16);
        assert_eq!(
            raster.samples,
            RasterSamples::Interleaved {
                data: vec![0x00, 0x12, 0xAB, 0xFF],
                band_count: 1
            }
        );
    }

    #[test]
    fn deflate_strip_matches_uncompressed() {
        let pixels: Vec<u8> = (0u8..12).collect();
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&pixels).unwrap();
        let compressed = encoder.finish().unwrap();

        let mut b = TiffBuilder::new();
        let strip = b.push_data(&compressed);
        b.entry_long(TAG_IMAGE_WIDTH, 2);
        b.entry_long(TAG_IMAGE_LENGTH, 2);
        b.entry_shorts(TAG_BITS_PER_SAMPLE, &[8, 8, 8]);
        b.entry_short(TAG_SAMPLES_PER_PIXEL, 3);
        b.entry_short(TAG_COMPRESSION, COMPRESSION_DEFLATE);
        b.entry_long(TAG_ROWS_PER_STRIP, 2);
        b.entry_longs(TAG_STRIP_OFFSETS, &[strip]);
        b.entry_longs(TAG_STRIP_BYTE_COUNTS, &[compressed.len() as u32]);
        let raster = decode(&b.build()).unwrap();
        assert_eq!(
            raster.samples,
            RasterSamples::Interleaved {
                data: pixels,
                band_count: 3
            }
        );
    }

    #[test]
    fn lzw_strip_matches_uncompressed() {
        let pixels: Vec<u8> = vec![9, 9, 9, 9, 1, 2, 3, 4];
        let compressed = weezl::encode::Encoder::with_tiff_size_switch(weezl::BitOrder::Msb, 8)
            .encode(&pixels)
            .unwrap();

        let mut b = TiffBuilder::new();
        let strip = b.push_data(&compressed);
        b.entry_long(TAG_IMAGE_WIDTH, 4);
        b.entry_long(TAG_IMAGE_LENGTH, 2);
        b.entry_short(TAG_BITS_PER_SAMPLE, 8);
        b.entry_short(TAG_SAMPLES_PER_PIXEL, 1);
        b.entry_short(TAG_COMPRESSION, COMPRESSION_LZW);
        b.entry_long(TAG_ROWS_PER_STRIP, 2);
        b.entry_longs(TAG_STRIP_OFFSETS, &[strip]);
        b.entry_longs(TAG_STRIP_BYTE_COUNTS, &[compressed.len() as u32]);
        let raster = decode(&b.build()).unwrap();
        assert_eq!(
            raster.samples,
            RasterSamples::Interleaved {
                data: pixels,
                band_count: 1
            }
        );
    }

    #[test]
    fn predictor_2_reverses_horizontal_differencing() {
        // Source row 10, 20, 30, 40 differenced to 10, 10, 10, 10.
        let mut b = TiffBuilder::new();
        let strip = b.push_data(&[10, 10, 10, 10]);
        b.entry_long(TAG_IMAGE_WIDTH, 4);
        b.entry_long(TAG_IMAGE_LENGTH, 1);
        b.entry_short(TAG_BITS_PER_SAMPLE, 8);
        b.entry_short(TAG_SAMPLES_PER_PIXEL, 1);
        b.entry_short(TAG_PREDICTOR, 2);
        b.entry_long(TAG_ROWS_PER_STRIP, 1);
        b.entry_longs(TAG_STRIP_OFFSETS, &[strip]);
        b.entry_longs(TAG_STRIP_BYTE_COUNTS, &[4]);
        let raster = decode(&b.build()).unwrap();
        assert_eq!(
            raster.samples,
            RasterSamples::Interleaved {
                data: vec![10, 20, 30, 40],
                band_count: 1
            }
        );
    }

    #[test]
    fn tiled_layout_clips_edge_tiles() {
        // 3x3 image, 2x2 tiles: four tiles with clipped right/bottom edges.
        let tile = |v: u8| vec![v, v, v, v];
        let mut b = TiffBuilder::new();
        let t0 = b.push_data(&tile(1));
        let t1 = b.push_data(&tile(2));
        let t2 = b.push_data(&tile(3));
        let t3 = b.push_data(&tile(4));
        b.entry_long(TAG_IMAGE_WIDTH, 3);
        b.entry_long(TAG_IMAGE_LENGTH, 3);
        b.entry_short(TAG_BITS_PER_SAMPLE, 8);
        b.entry_short(TAG_SAMPLES_PER_PIXEL, 1);
        b.entry_long(TAG_TILE_WIDTH, 2);
        b.entry_long(TAG_TILE_LENGTH, 2);
        b.entry_longs(TAG_TILE_OFFSETS, &[t0, t1, t2, t3]);
        b.entry_longs(TAG_TILE_BYTE_COUNTS, &[4, 4, 4, 4]);
        let raster = decode(&b.build()).unwrap();
        assert_eq!(
            raster.samples,
            RasterSamples::Interleaved {
                data: vec![1, 1, 2, 1, 1, 2, 3, 3, 4],
                band_count: 1
            }
        );
    }

    #[test]
    fn geotags_produce_bounds() {
        let raster = decode(&geotagged(None)).unwrap();
        let bounds = raster.bounds.unwrap();
        assert_eq!(bounds, GeoBounds::new(29.0, 20.0, 30.0, 21.0));
    }

    #[test]
    fn geographic_crs_keeps_bounds() {
        // Directory header + one key: GeographicTypeGeoKey = 4326
        let keys = [1, 1, 0, 1, GEO_KEY_GEOGRAPHIC_TYPE, 0, 1, 4326];
        let raster = decode(&geotagged(Some(&keys))).unwrap();
        assert!(raster.bounds.is_some());
    }

    #[test]
    fn projected_crs_suppresses_bounds() {
        // ProjectedCSTypeGeoKey = 32633 (UTM 33N): meters, not degrees.
        let keys = [1, 1, 0, 1, GEO_KEY_PROJECTED_CRS, 0, 1, 32633];
        let raster = decode(&geotagged(Some(&keys))).unwrap();
        assert_eq!(raster.bounds, None);
    }

    #[test]
    fn multi_page_renders_first_page_only() {
        let (mut tiff, pixels) = chunky_rgb_2x2();
        // Chain a bogus second directory; the first page still decodes.
        let second_ifd = tiff.len() as u32;
        let next_ptr = tiff.len() - 4;
        tiff[next_ptr..next_ptr + 4].copy_from_slice(&second_ifd.to_le_bytes());
        tiff.extend_from_slice(&0u16.to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes());

        let raster = decode(&tiff).unwrap();
        assert_eq!((raster.width, raster.height), (2, 2));
        assert_eq!(
            raster.samples,
            RasterSamples::Interleaved {
                data: pixels,
                band_count: 3
            }
        );
    }

    #[test]
    fn truncated_buffer_is_a_decode_error() {
        let (tiff, _) = chunky_rgb_2x2();
        let err = decode(&tiff[..10]).unwrap_err();
        assert!(matches!(err, DecodeError::Truncated { .. }));
    }

    #[test]
    fn garbage_is_an_invalid_signature() {
        let err = decode(b"PK\x03\x04 definitely not a raster").unwrap_err();
        assert!(matches!(err, DecodeError::InvalidSignature(_)));
    }

    #[test]
    fn missing_strip_offsets_is_a_missing_resource() {
        let mut b = TiffBuilder::new();
        b.entry_long(TAG_IMAGE_WIDTH, 2);
        b.entry_long(TAG_IMAGE_LENGTH, 2);
        b.entry_short(TAG_BITS_PER_SAMPLE, 8);
        let err = decode(&b.build()).unwrap_err();
        assert!(matches!(err, DecodeError::MissingResource(_)));
    }
}
