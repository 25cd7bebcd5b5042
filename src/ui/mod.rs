mod button;

pub use button::Button;

use crate::domain::Motif;
use macroquad::prelude::{screen_height, screen_width};

pub const PANEL_WIDTH: f32 = 180.0;
pub const BUTTON_HEIGHT: f32 = 36.0;
const SMALL_BUTTON_HEIGHT: f32 = 28.0;
const GAP: f32 = 6.0;

/// Rate change per speed click, in ticks/s
pub const SPEED_STEP: f64 = 1.0;
/// Density change per click, in percent
pub const DENSITY_STEP: f64 = 5.0;

/// Everything a button or key can ask for
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum UiAction {
    TogglePlay,
    Step,
    Clear,
    Randomize,
    ToggleColors,
    Speed(f64),
    Density(f64),
    Seed(Motif),
    Recenter,
}

/// Get the X position where the panel starts (right side)
pub fn panel_x() -> f32 {
    screen_width() - PANEL_WIDTH
}

/// Get the width of the grid area
pub fn grid_area_width() -> f32 {
    (screen_width() - PANEL_WIDTH).max(1.0)
}

/// Get the height of the grid area
pub fn grid_area_height() -> f32 {
    screen_height().max(1.0)
}

/// Create UI buttons with standard layout
pub fn create_buttons(playing: bool, selected: Option<Motif>) -> Vec<Button> {
    layout_buttons(panel_x(), playing, selected)
}

/// Panel layout starting at `px`. Step is disabled while playing.
pub fn layout_buttons(px: f32, playing: bool, selected: Option<Motif>) -> Vec<Button> {
    let half = (PANEL_WIDTH - GAP) / 2.0;
    let right = px + half + GAP;
    let row = |n: f32| 20.0 + n * (BUTTON_HEIGHT + GAP);
    let small_row = |n: f32| row(3.0) + n * (SMALL_BUTTON_HEIGHT + GAP);

    let mut buttons = vec![
        Button::new(
            px,
            row(0.0),
            PANEL_WIDTH,
            BUTTON_HEIGHT,
            if playing { "Pause" } else { "Play" },
            UiAction::TogglePlay,
        ),
        Button::new(px, row(1.0), half, BUTTON_HEIGHT, "Step", UiAction::Step).with_enabled(!playing),
        Button::new(right, row(1.0), half, BUTTON_HEIGHT, "Clear", UiAction::Clear),
        Button::new(px, row(2.0), half, BUTTON_HEIGHT, "Random", UiAction::Randomize),
        Button::new(right, row(2.0), half, BUTTON_HEIGHT, "Colors", UiAction::ToggleColors),
        Button::new(px, small_row(0.0), half, SMALL_BUTTON_HEIGHT, "Speed -", UiAction::Speed(-SPEED_STEP)),
        Button::new(right, small_row(0.0), half, SMALL_BUTTON_HEIGHT, "Speed +", UiAction::Speed(SPEED_STEP)),
        Button::new(px, small_row(1.0), half, SMALL_BUTTON_HEIGHT, "Dens -", UiAction::Density(-DENSITY_STEP)),
        Button::new(right, small_row(1.0), half, SMALL_BUTTON_HEIGHT, "Dens +", UiAction::Density(DENSITY_STEP)),
    ];

    buttons.extend(Motif::ALL.iter().enumerate().map(|(i, &motif)| {
        let x = if i % 2 == 0 { px } else { right };
        let y = small_row(2.0 + (i / 2) as f32);
        Button::new(x, y, half, SMALL_BUTTON_HEIGHT, short_name(motif), UiAction::Seed(motif))
            .with_selected(selected == Some(motif))
    }));

    buttons
}

/// Bottom edge of the button block, for placing text below it
pub fn buttons_bottom(buttons: &[Button]) -> f32 {
    buttons
        .iter()
        .map(|button| {
            let (_, y, _, h) = button.bounds();
            y + h
        })
        .fold(0.0, f32::max)
}

fn short_name(motif: Motif) -> &'static str {
    match motif {
        Motif::Glider => "Glider",
        Motif::Pulsar => "Pulsar",
        Motif::GosperGun => "Gosper",
        Motif::Pentadecathlon => "Penta",
        Motif::LightweightSpaceship => "LWSS",
        Motif::RPentomino => "R-pent",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn overlaps(a: &Button, b: &Button) -> bool {
        let (ax, ay, aw, ah) = a.bounds();
        let (bx, by, bw, bh) = b.bounds();
        ax < bx + bw && bx < ax + aw && ay < by + bh && by < ay + ah
    }

    #[test]
    fn test_step_disabled_while_playing() {
        let step = |playing| {
            layout_buttons(0.0, playing, None)
                .into_iter()
                .find(|b| b.action() == UiAction::Step)
                .map(|b| b.is_enabled())
        };
        assert_eq!(step(true), Some(false));
        assert_eq!(step(false), Some(true));
    }

    #[test]
    fn test_every_motif_has_a_button() {
        let buttons = layout_buttons(100.0, false, Some(Motif::Pulsar));
        for motif in Motif::ALL {
            assert!(buttons.iter().any(|b| b.action() == UiAction::Seed(motif)));
        }
    }

    #[test]
    fn test_buttons_do_not_overlap_and_stay_in_panel() {
        let px = 500.0;
        let buttons = layout_buttons(px, false, None);
        for (i, a) in buttons.iter().enumerate() {
            let (x, _, w, _) = a.bounds();
            assert!(x >= px && x + w <= px + PANEL_WIDTH + 0.01, "{}", a.label());
            for b in &buttons[i + 1..] {
                assert!(!overlaps(a, b), "{} overlaps {}", a.label(), b.label());
            }
        }
        assert!(buttons_bottom(&buttons) > 300.0);
    }

    #[test]
    fn test_hover_hit_test() {
        let button = Button::new(10.0, 10.0, 50.0, 20.0, "x", UiAction::Clear);
        assert!(button.is_hovered((10.0, 10.0)));
        assert!(button.is_hovered((60.0, 30.0)));
        assert!(!button.is_hovered((61.0, 15.0)));
    }
}
