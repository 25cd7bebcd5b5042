/// Wheel deltas are capped at this magnitude before normalizing
const WHEEL_DELTA_CAP: f32 = 50.0;
/// Zoom change for a full-strength wheel event
const WHEEL_ZOOM_STEP: f32 = 0.05;
const MIN_ZOOM: f32 = 0.1;
const MAX_ZOOM: f32 = 20.0;

/// Size of the target surface in logical (CSS-style) pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub device_pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, device_pixel_ratio: f32) -> Self {
        Self {
            width,
            height,
            device_pixel_ratio: if device_pixel_ratio > 0.0 { device_pixel_ratio } else { 1.0 },
        }
    }

    pub fn device_width(&self) -> f32 {
        self.width * self.device_pixel_ratio
    }

    pub fn device_height(&self) -> f32 {
        self.height * self.device_pixel_ratio
    }

    /// Grid that covers the viewport at `base_cell_size` pixels per cell
    pub fn grid_dimensions(&self, base_cell_size: f32) -> (usize, usize) {
        let width = (self.width / base_cell_size).floor().max(1.0) as usize;
        let height = (self.height / base_cell_size).floor().max(1.0) as usize;
        (width, height)
    }
}

/// Camera tracks the grid-space point shown at the viewport center and a
/// zoom factor. It only affects rendering, never the simulation.
#[derive(Clone, Debug, PartialEq)]
pub struct Camera {
    pub x: f32,
    pub y: f32,
    pub zoom: f32,
    device_pixel_ratio: f32,
    base_cell_size: f32,
}

impl Camera {
    /// Camera centered on a `width x height` grid at fit-to-screen zoom
    pub fn new(grid_width: usize, grid_height: usize, device_pixel_ratio: f32, base_cell_size: f32) -> Self {
        let mut camera = Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
            device_pixel_ratio,
            base_cell_size,
        };
        camera.resize(grid_width, grid_height);
        camera
    }

    pub fn device_pixel_ratio(&self) -> f32 {
        self.device_pixel_ratio
    }

    pub fn base_cell_size(&self) -> f32 {
        self.base_cell_size
    }

    /// Cell edge in device pixels before zoom
    pub fn device_cell_size(&self) -> f32 {
        self.base_cell_size * self.device_pixel_ratio
    }

    /// Zoom at which one cell covers `base_cell_size` device pixels
    pub fn fit_zoom(&self) -> f32 {
        1.0 / self.device_pixel_ratio
    }

    pub fn zoom_bounds(&self) -> (f32, f32) {
        (MIN_ZOOM / self.device_pixel_ratio, MAX_ZOOM / self.device_pixel_ratio)
    }

    /// Drag by a screen-pixel delta. The view moves opposite to the cursor.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let scale = self.zoom * self.base_cell_size;
        self.x -= dx / scale;
        self.y -= dy / scale;
    }

    /// Apply one wheel event (browser convention: positive delta zooms in)
    pub fn zoom_wheel(&mut self, delta_y: f32) {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return;
        }
        let normalized = delta_y.signum() * delta_y.abs().min(WHEEL_DELTA_CAP) / WHEEL_DELTA_CAP;
        let factor = 1.0 + normalized * WHEEL_ZOOM_STEP;
        let (min, max) = self.zoom_bounds();
        self.zoom = (self.zoom * factor).clamp(min, max);
    }

    /// Recenter on the grid and reset to fit-to-screen zoom
    pub fn resize(&mut self, grid_width: usize, grid_height: usize) {
        self.x = grid_width as f32 / 2.0;
        self.y = grid_height as f32 / 2.0;
        self.zoom = self.fit_zoom();
    }

    pub fn set_device_pixel_ratio(&mut self, device_pixel_ratio: f32) {
        if device_pixel_ratio > 0.0 {
            self.device_pixel_ratio = device_pixel_ratio;
        }
    }

    /// Logical pixels per cell at the current zoom
    fn screen_cell_size(&self) -> f32 {
        self.base_cell_size * self.zoom
    }

    /// Convert screen coordinates (logical pixels) to grid coordinates
    pub fn screen_to_grid(&self, screen_x: f32, screen_y: f32, viewport: &Viewport) -> (f32, f32) {
        let scale = self.screen_cell_size();
        (
            self.x + (screen_x - viewport.width / 2.0) / scale,
            self.y + (screen_y - viewport.height / 2.0) / scale,
        )
    }

    /// Convert grid coordinates to screen coordinates (logical pixels)
    pub fn grid_to_screen(&self, grid_x: f32, grid_y: f32, viewport: &Viewport) -> (f32, f32) {
        let scale = self.screen_cell_size();
        (
            viewport.width / 2.0 + (grid_x - self.x) * scale,
            viewport.height / 2.0 + (grid_y - self.y) * scale,
        )
    }
}
