use macroquad::prelude::*;

use super::UiAction;

/// Button UI component with hover and click detection
#[derive(Clone, Debug)]
pub struct Button {
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    text: String,
    action: UiAction,
    enabled: bool,
    color: Color,
    hover_color: Color,
}

impl Button {
    pub fn new(x: f32, y: f32, width: f32, height: f32, text: impl Into<String>, action: UiAction) -> Self {
        Self {
            x,
            y,
            width,
            height,
            text: text.into(),
            action,
            enabled: true,
            color: Color::from_rgba(70, 130, 180, 255),
            hover_color: Color::from_rgba(100, 149, 237, 255),
        }
    }

    /// Disabled buttons draw greyed out and never report clicks
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Highlight as the active choice of a group
    pub fn with_selected(mut self, selected: bool) -> Self {
        if selected {
            self.color = Color::from_rgba(46, 139, 87, 255);
            self.hover_color = Color::from_rgba(60, 179, 113, 255);
        }
        self
    }

    pub fn action(&self) -> UiAction {
        self.action
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn label(&self) -> &str {
        &self.text
    }

    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        (self.x, self.y, self.width, self.height)
    }

    /// Check if mouse is hovering over button
    pub fn is_hovered(&self, mouse_pos: (f32, f32)) -> bool {
        mouse_pos.0 >= self.x
            && mouse_pos.0 <= self.x + self.width
            && mouse_pos.1 >= self.y
            && mouse_pos.1 <= self.y + self.height
    }

    /// Draw button with hover effect
    pub fn draw(&self, mouse_pos: (f32, f32)) {
        let (color, text_color) = if !self.enabled {
            (Color::from_rgba(60, 60, 60, 255), GRAY)
        } else if self.is_hovered(mouse_pos) {
            (self.hover_color, WHITE)
        } else {
            (self.color, WHITE)
        };

        draw_rectangle(self.x, self.y, self.width, self.height, color);
        draw_rectangle_lines(self.x, self.y, self.width, self.height, 2.0, WHITE);

        let font_size = if self.height < 34.0 { 16 } else { 20 };
        let text_size = measure_text(&self.text, None, font_size, 1.0);
        draw_text(
            &self.text,
            self.x + (self.width - text_size.width) / 2.0,
            self.y + (self.height + text_size.height) / 2.0,
            font_size as f32,
            text_color,
        );
    }

    /// Check if button was clicked this frame
    pub fn is_clicked(&self, mouse_pos: (f32, f32)) -> bool {
        self.enabled && self.is_hovered(mouse_pos) && is_mouse_button_pressed(MouseButton::Left)
    }
}
