//! CPU-side preview images of a generation: grayscale elevation and blended
//! material classes, written out as RGBA PNG files.

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use strata_config::OutputConfig;
use strata_mesh::TerrainMesh;
use strata_terrain::{ErosionMap, Heightmap, MaterialParams};
use tracing::info;

/// File name of the grayscale elevation preview.
pub const HEIGHTMAP_PNG: &str = "heightmap.png";
/// File name of the material classification preview.
pub const MATERIAL_PNG: &str = "materials.png";

/// Width of the blend band around each material threshold.
const BLEND_BAND: f32 = 0.05;

/// Errors from encoding or writing previews.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PNG encoding failed: {0}")]
    Encoding(#[from] png::EncodingError),

    /// Nothing has been generated yet.
    #[error("no terrain to export")]
    NoTerrain,
}

/// Row-major RGBA image, one pixel per terrain cell.
#[derive(Clone, Debug, PartialEq)]
pub struct PreviewImage {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes.
    pub pixels: Vec<u8>,
}

impl PreviewImage {
    /// Opaque black image.
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels = vec![0; width as usize * height as usize * 4];
        for alpha in pixels.iter_mut().skip(3).step_by(4) {
            *alpha = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[idx..idx + 3].copy_from_slice(&rgb);
        self.pixels[idx + 3] = 255;
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        ]
    }

    /// Encode as an 8-bit RGBA PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, ExportError> {
        let mut png_buf = Vec::new();
        {
            let mut encoder = png::Encoder::new(Cursor::new(&mut png_buf), self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
            writer.finish()?;
        }
        Ok(png_buf)
    }

    /// Encode and write to `path`, creating parent directories.
    pub fn write_png(&self, path: &Path) -> Result<(), ExportError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.encode_png()?)?;
        Ok(())
    }
}

/// Grayscale elevation, normalised to the grid's own finite min/max.
///
/// A flat grid renders black.
pub fn render_heightmap(heightmap: &Heightmap) -> PreviewImage {
    let res = heightmap.resolution();
    let (lo, hi) = heightmap.min_max();
    let range = hi - lo;
    let mut image = PreviewImage::new(res, res);
    for y in 0..res {
        for x in 0..res {
            let t = if range > 0.0 {
                (heightmap.get(x, y) - lo) / range
            } else {
                0.0
            };
            let v = (t.clamp(0.0, 1.0) * 255.0).round() as u8;
            image.set_pixel(x, y, [v, v, v]);
        }
    }
    image
}

/// Colour of one cell.
///
/// `height_fraction` is elevation over `height_scale`; `slope` is
/// `1 - normal.y`; `erosion` is the erosion-map value (negative = deposit).
/// Rock overrides grass on steep cells, snow covers high cells that are not
/// rock, and sediment tints net deposits.
pub fn material_color(
    height_fraction: f32,
    slope: f32,
    erosion: f32,
    material: &MaterialParams,
) -> [u8; 3] {
    let rock = smoothstep(
        material.rock_slope - BLEND_BAND,
        material.rock_slope + BLEND_BAND,
        slope,
    );
    let snow = smoothstep(
        material.snow_height - BLEND_BAND,
        material.snow_height + BLEND_BAND,
        height_fraction,
    ) * (1.0 - rock);
    let sediment = smoothstep(
        material.sediment_threshold,
        material.sediment_threshold * 2.0,
        -erosion,
    );

    let mut color = to_f32(material.grass_color);
    color = mix(color, to_f32(material.rock_color), rock);
    color = mix(color, to_f32(material.snow_color), snow);
    color = mix(color, to_f32(material.sediment_color), sediment);
    color.map(|c| c.round().clamp(0.0, 255.0) as u8)
}

/// Material classes per cell, using the mesh's per-vertex slope.
///
/// # Panics
///
/// Panics if the mesh was not extracted from a grid of the heightmap's resolution.
pub fn render_materials(
    heightmap: &Heightmap,
    erosion: &ErosionMap,
    mesh: &TerrainMesh,
    material: &MaterialParams,
    height_scale: f32,
) -> PreviewImage {
    let res = heightmap.resolution();
    assert_eq!(
        mesh.vertex_count(),
        res as usize * res as usize,
        "mesh does not match the heightmap"
    );
    let scale = if height_scale > 0.0 { height_scale } else { 1.0 };
    let mut image = PreviewImage::new(res, res);
    for y in 0..res {
        for x in 0..res {
            let i = heightmap.index(x, y);
            let color = material_color(
                heightmap.get(x, y) / scale,
                mesh.slopes[i],
                erosion.get(x, y),
                material,
            );
            image.set_pixel(x, y, color);
        }
    }
    image
}

/// Write whichever previews `output` enables into `output.directory`.
///
/// Returns the paths written.
pub fn write_previews(
    output: &OutputConfig,
    heightmap: &Heightmap,
    erosion: &ErosionMap,
    mesh: &TerrainMesh,
    material: &MaterialParams,
    height_scale: f32,
) -> Result<Vec<PathBuf>, ExportError> {
    let mut written = Vec::new();
    if output.write_heightmap_png {
        let path = output.directory.join(HEIGHTMAP_PNG);
        render_heightmap(heightmap).write_png(&path)?;
        written.push(path);
    }
    if output.write_material_png {
        let path = output.directory.join(MATERIAL_PNG);
        render_materials(heightmap, erosion, mesh, material, height_scale).write_png(&path)?;
        written.push(path);
    }
    for path in &written {
        info!(path = %path.display(), "wrote preview");
    }
    Ok(written)
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x >= edge0 { 1.0 } else { 0.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn to_f32(c: [u8; 3]) -> [f32; 3] {
    c.map(f32::from)
}

fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_classes() {
        let m = MaterialParams::default();
        assert_eq!(material_color(0.1, 0.0, 0.0, &m), m.grass_color);
        assert_eq!(material_color(0.1, 0.9, 0.0, &m), m.rock_color);
        assert_eq!(material_color(0.99, 0.0, 0.0, &m), m.snow_color);
        assert_eq!(material_color(0.1, 0.0, -1.0, &m), m.sediment_color);
    }

    #[test]
    fn test_rock_suppresses_snow() {
        let m = MaterialParams::default();
        assert_eq!(material_color(0.99, 0.9, 0.0, &m), m.rock_color);
    }

    #[test]
    fn test_eroded_cells_are_not_sediment() {
        let m = MaterialParams::default();
        assert_eq!(material_color(0.1, 0.0, 5.0, &m), m.grass_color);
    }

    #[test]
    fn test_heightmap_preview_spans_full_range() {
        let grid = Heightmap::from_cells(2, vec![0.0, 10.0, 5.0, 10.0]);
        let image = render_heightmap(&grid);
        assert_eq!(image.get_pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(image.get_pixel(1, 0), [255, 255, 255, 255]);
        assert_eq!(image.get_pixel(0, 1)[0], 128);
    }

    #[test]
    fn test_flat_heightmap_renders_black() {
        let image = render_heightmap(&Heightmap::new(3));
        assert!(image.pixels.chunks_exact(4).all(|p| p == [0, 0, 0, 255]));
    }

    #[test]
    fn test_png_roundtrip_header() {
        let image = PreviewImage::new(7, 5);
        let bytes = image.encode_png().unwrap();
        let decoder = png::Decoder::new(Cursor::new(bytes));
        let reader = decoder.read_info().unwrap();
        assert_eq!(reader.info().width, 7);
        assert_eq!(reader.info().height, 5);
    }

    #[test]
    fn test_write_previews_respects_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let heightmap = Heightmap::new(4);
        let erosion = ErosionMap::new(4);
        let mesh = TerrainMesh::extract(&heightmap, &erosion, 4.0);
        let output = OutputConfig {
            directory: dir.path().join("out"),
            write_heightmap_png: true,
            write_material_png: false,
        };
        let written = write_previews(
            &output,
            &heightmap,
            &erosion,
            &mesh,
            &MaterialParams::default(),
            100.0,
        )
        .unwrap();
        assert_eq!(written, vec![dir.path().join("out").join(HEIGHTMAP_PNG)]);
        assert!(written[0].exists());
        assert!(!dir.path().join("out").join(MATERIAL_PNG).exists());
    }
}
