mod projector;

pub use projector::{
    ColorMode, DEAD_COLOR, Projector, Quad, Rgb, SIMPLE_ALIVE_COLOR, ScreenRect, hsl_to_rgb,
    neighborhood_color,
};

use macroquad::prelude::*;

use crate::application::LifeView;
use crate::domain::Grid;
use crate::ui::{Button, PANEL_WIDTH, buttons_bottom, panel_x};

/// Format large numbers with K/M/B suffixes
fn format_number(n: usize) -> String {
    if n >= 1_000_000_000 {
        format!("{:.1}B", n as f64 / 1_000_000_000.0)
    } else if n >= 1_000_000 {
        format!("{:.1}M", n as f64 / 1_000_000.0)
    } else if n >= 1_000 {
        format!("{:.1}K", n as f64 / 1_000.0)
    } else {
        format!("{}", n)
    }
}

/// One texel per cell, re-filled every frame and stretched over the grid's
/// screen rectangle with nearest filtering.
pub struct GridRenderer {
    image: Image,
    texture: Texture2D,
}

impl GridRenderer {
    /// None if the grid is too large for a single texture
    pub fn new(width: usize, height: usize) -> Option<Self> {
        let (w, h) = (u16::try_from(width).ok()?, u16::try_from(height).ok()?);
        let image = Image::gen_image_color(w, h, BLACK);
        let texture = Texture2D::from_image(&image);
        texture.set_filter(FilterMode::Nearest);
        Some(Self { image, texture })
    }

    fn matches(&self, grid: &Grid) -> bool {
        (self.image.width as usize, self.image.height as usize) == grid.dimensions()
    }

    /// Recreate the texture when the grid size changes
    pub fn ensure_size(renderer: &mut Option<Self>, grid: &Grid) {
        if renderer.as_ref().is_some_and(|r| r.matches(grid)) {
            return;
        }
        let (width, height) = grid.dimensions();
        *renderer = Self::new(width, height);
        if renderer.is_none() {
            log::warn!("{width}x{height} grid exceeds texture limits, not drawing");
        }
    }

    /// Draw the current buffer through the view's camera and projector
    pub fn draw(&mut self, view: &LifeView, grid: &Grid) {
        let projector = view.projector();
        projector.fill_rgba(grid, &mut self.image.bytes);
        self.texture.update(&self.image);

        let (width, height) = grid.dimensions();
        let rect = projector.grid_rect(view.camera(), width, height);
        draw_texture_ex(
            &self.texture,
            rect.x,
            rect.y,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(rect.width, rect.height)),
                ..Default::default()
            },
        );
    }
}

/// Draw control panel background
fn draw_panel_background() {
    draw_rectangle(
        panel_x(),
        0.0,
        PANEL_WIDTH,
        screen_height(),
        Color::from_rgba(30, 30, 30, 255),
    );
}

/// Helper to draw text labels
fn draw_text_label(text: &str, x: f32, y: f32, size: f32, color: Color) {
    draw_text(text, x, y, size, color);
}

/// Draw the control panel with buttons and stats
pub fn draw_controls(view: &LifeView, buttons: &[Button], mouse_pos: (f32, f32)) {
    draw_panel_background();
    buttons.iter().for_each(|btn| btn.draw(mouse_pos));

    let px = panel_x();
    let top = buttons_bottom(buttons) + 24.0;
    let (gw, gh) = view.dimensions();
    let value_color = Color::from_rgba(180, 180, 180, 255);

    let status = if view.is_playing() { "Running" } else { "Paused" };
    let status_color = if view.is_playing() {
        Color::from_rgba(0, 255, 0, 255)
    } else {
        Color::from_rgba(255, 165, 0, 255)
    };

    let labels = [
        ("Generation:".to_owned(), 16.0, WHITE),
        (format!("{}", view.generation()), 20.0, Color::from_rgba(0, 255, 150, 255)),
        (status.to_owned(), 16.0, status_color),
        (format!("Speed: {:.0} gen/s", view.tick_rate()), 14.0, value_color),
        (format!("Density: {:.0}%", view.density()), 14.0, value_color),
        (format!("Colors: {}", view.color_mode().name()), 14.0, value_color),
        (format!("Zoom: {:.2}x", view.zoom()), 14.0, value_color),
        (format!("Grid: {gw}x{gh}"), 14.0, value_color),
        (format!("Alive: {}", format_number(view.population())), 14.0, value_color),
        (format!("Seed: {}", view.seed().name()), 12.0, GRAY),
        (format!("{} | FPS: {}", view.backend_name(), get_fps()), 12.0, GRAY),
    ];

    labels.iter().enumerate().for_each(|(i, (text, size, color))| {
        draw_text_label(text, px + 4.0, top + i as f32 * 20.0, *size, *color);
    });

    let failures = view.device_failures();
    if failures > 0 {
        draw_text_label(
            &format!("Device errors: {failures}"),
            px + 4.0,
            top + labels.len() as f32 * 20.0,
            12.0,
            Color::from_rgba(255, 80, 80, 255),
        );
    }

    let help = [
        "Drag: pan | Wheel: zoom",
        "Space play  S step  C clear",
        "R random  N colors  H home",
        "Up/Down speed  [ ] density",
        "1-6 patterns",
    ];
    let help_top = screen_height() - help.len() as f32 * 14.0 - 8.0;
    help.iter().enumerate().for_each(|(i, line)| {
        draw_text_label(line, px + 4.0, help_top + i as f32 * 14.0, 12.0, GRAY);
    });
}

/// Full-window notice shown instead of the view when compute is unavailable
pub fn draw_unsupported(reason: &str) {
    clear_background(Color::from_rgba(15, 15, 25, 255));
    let lines = [
        ("GPU compute is not available", 32.0, Color::from_rgba(255, 120, 120, 255)),
        (reason, 18.0, LIGHTGRAY),
        ("Try another device or driver, or run with --cpu.", 18.0, GRAY),
    ];
    let mut y = screen_height() / 2.0 - 40.0;
    for (text, size, color) in lines {
        let dims = measure_text(text, None, size as u16, 1.0);
        draw_text(text, (screen_width() - dims.width) / 2.0, y, size, color);
        y += size + 16.0;
    }
}

#[cfg(test)]
mod tests {
    use super::format_number;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1_500), "1.5K");
        assert_eq!(format_number(2_000_000), "2.0M");
        assert_eq!(format_number(3_100_000_000), "3.1B");
    }
}
