//! Render Projector: where each cell lands on screen and what color it gets.
//!
//! Pure math, no drawing. The macroquad side uploads `fill_rgba` output as a
//! texture and stretches it over `grid_rect`.

use rayon::prelude::*;

use crate::application::{Camera, Viewport};
use crate::domain::{CellRecord, Grid};

/// Background for dead cells in both modes
pub const DEAD_COLOR: Rgb = Rgb::new(0.05, 0.05, 0.1);
/// Live cells in simple mode
pub const SIMPLE_ALIVE_COLOR: Rgb = Rgb::new(0.2, 0.6, 1.0);

const SATURATION: f32 = 0.8;
const LIGHTNESS: f32 = 0.5;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    /// Hue keyed on the cached neighborhood mask
    #[default]
    Neighborhood,
    Simple,
}

impl ColorMode {
    pub fn toggled(self) -> Self {
        match self {
            ColorMode::Neighborhood => ColorMode::Simple,
            ColorMode::Simple => ColorMode::Neighborhood,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColorMode::Neighborhood => "Neighborhood",
            ColorMode::Simple => "Simple",
        }
    }

    /// Color for one packed cell word
    pub fn color(self, raw: u32) -> Rgb {
        let cell = CellRecord::unpack(raw);
        if !cell.is_alive() {
            return DEAD_COLOR;
        }
        match self {
            ColorMode::Neighborhood => neighborhood_color(cell.neighborhood()),
            ColorMode::Simple => SIMPLE_ALIVE_COLOR,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [channel(self.r), channel(self.g), channel(self.b), 255]
    }
}

/// Map the 256 masks evenly around the hue wheel
pub fn neighborhood_color(mask: u8) -> Rgb {
    hsl_to_rgb(mask as f32 * 360.0 / 256.0, SATURATION, LIGHTNESS)
}

/// HSL to RGB, hue in degrees [0, 360)
pub fn hsl_to_rgb(hue: f32, s: f32, l: f32) -> Rgb {
    let h = hue / 360.0;
    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - ((h * 6.0) % 2.0 - 1.0).abs());
    let m = l - c / 2.0;

    let (r, g, b) = match (h * 6.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    Rgb::new(r + m, g + m, b + m)
}

/// Axis-aligned quad in normalized device coordinates (y up)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// Screen rectangle in logical pixels (y down)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

pub struct Projector {
    pub viewport: Viewport,
    pub color_mode: ColorMode,
}

impl Projector {
    pub fn new(viewport: Viewport, color_mode: ColorMode) -> Self {
        Self {
            viewport,
            color_mode,
        }
    }

    /// Device-pixel offset of a grid point from the camera focus
    fn device_offset(&self, camera: &Camera, gx: f32, gy: f32) -> (f32, f32) {
        let scale = camera.device_cell_size() * camera.zoom;
        ((gx - camera.x) * scale, (gy - camera.y) * scale)
    }

    /// NDC quad for cell (x, y). The camera focus maps to the origin.
    pub fn cell_quad(&self, camera: &Camera, x: usize, y: usize) -> Quad {
        let (w, h) = (self.viewport.device_width(), self.viewport.device_height());
        let (x0, y0) = self.device_offset(camera, x as f32, y as f32);
        let (x1, y1) = self.device_offset(camera, x as f32 + 1.0, y as f32 + 1.0);
        Quad {
            left: x0 / w * 2.0,
            top: -(y0 / h * 2.0),
            right: x1 / w * 2.0,
            bottom: -(y1 / h * 2.0),
        }
    }

    /// Logical-pixel rectangle covered by a `width x height` grid
    pub fn grid_rect(&self, camera: &Camera, width: usize, height: usize) -> ScreenRect {
        let (x0, y0) = camera.grid_to_screen(0.0, 0.0, &self.viewport);
        let (x1, y1) = camera.grid_to_screen(width as f32, height as f32, &self.viewport);
        ScreenRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }

    /// Write one RGBA texel per cell, row-major, rows split across rayon
    pub fn fill_rgba(&self, grid: &Grid, out: &mut [u8]) {
        let (width, _) = grid.dimensions();
        debug_assert_eq!(out.len(), grid.len() * 4);
        if width == 0 {
            return;
        }
        let mode = self.color_mode;

        out.par_chunks_mut(width * 4)
            .zip(grid.raw().par_chunks(width))
            .for_each(|(texels, cells)| {
                texels
                    .chunks_exact_mut(4)
                    .zip(cells)
                    .for_each(|(texel, &raw)| texel.copy_from_slice(&mode.color(raw).to_rgba8()));
            });
    }
}
