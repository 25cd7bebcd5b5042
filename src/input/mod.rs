use macroquad::prelude::*;

use crate::application::{Command, LifeView, ParamChange};
use crate::domain::Motif;
use crate::error::EngineResult;
use crate::ui::{Button, DENSITY_STEP, SPEED_STEP, UiAction, grid_area_width};

/// Pixel delta reported for one wheel notch
const WHEEL_NOTCH_PIXELS: f32 = 100.0;

/// Primary-button drag in progress over the grid
#[derive(Debug, Default)]
pub struct DragState {
    last: Option<(f32, f32)>,
}

impl DragState {
    /// Feed one pointer sample; returns the delta since the last one
    pub fn update(&mut self, pressed: bool, down: bool, over_grid: bool, pos: (f32, f32)) -> Option<(f32, f32)> {
        if pressed && over_grid {
            self.last = Some(pos);
            return None;
        }
        if !down {
            self.last = None;
            return None;
        }
        let last = self.last?;
        self.last = Some(pos);
        Some((pos.0 - last.0, pos.1 - last.1))
    }
}

/// Drag with the left button pans the view
pub fn handle_pan(view: &mut LifeView, drag: &mut DragState, mouse_pos: (f32, f32)) {
    let delta = drag.update(
        is_mouse_button_pressed(MouseButton::Left),
        is_mouse_button_down(MouseButton::Left),
        mouse_pos.0 < grid_area_width(),
        mouse_pos,
    );
    if let Some((dx, dy)) = delta {
        view.pan(dx, dy);
    }
}

/// Handle zoom with mouse wheel
pub fn handle_zoom(view: &mut LifeView, mouse_pos: (f32, f32)) {
    let wheel = mouse_wheel().1;
    if wheel != 0.0 && mouse_pos.0 < grid_area_width() {
        view.wheel(wheel_delta(wheel));
    }
}

/// Convert a macroquad wheel reading (up is positive) into a browser-style
/// delta (down is positive), where positive zooms in.
pub fn wheel_delta(wheel_y: f32) -> f32 {
    -wheel_y * WHEEL_NOTCH_PIXELS
}

/// Keyboard bindings
pub fn key_action(key: KeyCode) -> Option<UiAction> {
    let action = match key {
        KeyCode::Space => UiAction::TogglePlay,
        KeyCode::S => UiAction::Step,
        KeyCode::C => UiAction::Clear,
        KeyCode::R => UiAction::Randomize,
        KeyCode::N => UiAction::ToggleColors,
        KeyCode::Up => UiAction::Speed(SPEED_STEP),
        KeyCode::Down => UiAction::Speed(-SPEED_STEP),
        KeyCode::LeftBracket => UiAction::Density(-DENSITY_STEP),
        KeyCode::RightBracket => UiAction::Density(DENSITY_STEP),
        KeyCode::H => UiAction::Recenter,
        KeyCode::Key1 => UiAction::Seed(Motif::Glider),
        KeyCode::Key2 => UiAction::Seed(Motif::Pulsar),
        KeyCode::Key3 => UiAction::Seed(Motif::GosperGun),
        KeyCode::Key4 => UiAction::Seed(Motif::Pentadecathlon),
        KeyCode::Key5 => UiAction::Seed(Motif::LightweightSpaceship),
        KeyCode::Key6 => UiAction::Seed(Motif::RPentomino),
        _ => return None,
    };
    Some(action)
}

/// Apply one UI action to the view
pub fn apply_action(view: &mut LifeView, action: UiAction) -> EngineResult<()> {
    match action {
        UiAction::TogglePlay => view.command(Command::TogglePlay)?,
        UiAction::Step => view.command(Command::Step)?,
        UiAction::Clear => view.command(Command::Clear)?,
        UiAction::Randomize => view.command(Command::Reseed(None))?,
        UiAction::Seed(motif) => view.command(Command::Reseed(Some(motif)))?,
        UiAction::ToggleColors => {
            let mode = view.color_mode().toggled();
            view.set_param(ParamChange::ColorMode(mode));
        }
        UiAction::Speed(delta) => view.set_param(ParamChange::TickRate(view.tick_rate() + delta)),
        UiAction::Density(delta) => view.set_param(ParamChange::Density(view.density() + delta)),
        UiAction::Recenter => view.recenter(),
    }
    Ok(())
}

/// Collect this frame's actions from keys and button clicks
pub fn collect_actions(buttons: &[Button], mouse_pos: (f32, f32)) -> Vec<UiAction> {
    let keys = get_keys_pressed().into_iter().filter_map(key_action);
    let clicks = buttons
        .iter()
        .filter(|button| button.is_clicked(mouse_pos))
        .map(Button::action);
    keys.chain(clicks).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::Viewport;
    use crate::backend::CpuBackend;
    use crate::config::Config;

    fn view() -> LifeView {
        let config = Config {
            rng_seed: Some(3),
            ..Config::default()
        };
        LifeView::mount(Box::new(CpuBackend::new(true)), Viewport::new(30.0, 30.0, 1.0), &config).unwrap()
    }

    #[test]
    fn test_drag_reports_deltas_only_after_press_on_grid() {
        let mut drag = DragState::default();
        // Held down without a press on the grid: nothing
        assert_eq!(drag.update(false, true, true, (5.0, 5.0)), None);
        assert_eq!(drag.update(true, true, true, (10.0, 10.0)), None);
        assert_eq!(drag.update(false, true, false, (14.0, 7.0)), Some((4.0, -3.0)));
        assert_eq!(drag.update(false, false, true, (20.0, 20.0)), None);
        assert_eq!(drag.update(false, true, true, (25.0, 25.0)), None);
    }

    #[test]
    fn test_press_off_grid_does_not_start_drag() {
        let mut drag = DragState::default();
        assert_eq!(drag.update(true, true, false, (900.0, 10.0)), None);
        assert_eq!(drag.update(false, true, false, (905.0, 10.0)), None);
    }

    #[test]
    fn test_wheel_down_zooms_in() {
        assert!(wheel_delta(-1.0) > 0.0);
        assert!(wheel_delta(1.0) < 0.0);
    }

    #[test]
    fn test_digit_keys_pick_motifs_in_order() {
        let keys = [KeyCode::Key1, KeyCode::Key2, KeyCode::Key3, KeyCode::Key4, KeyCode::Key5, KeyCode::Key6];
        for (key, motif) in keys.into_iter().zip(Motif::ALL) {
            assert_eq!(key_action(key), Some(UiAction::Seed(motif)));
        }
        assert_eq!(key_action(KeyCode::Q), None);
    }

    #[test]
    fn test_apply_speed_and_density_steps() {
        let mut view = view();
        apply_action(&mut view, UiAction::Speed(SPEED_STEP)).unwrap();
        assert_eq!(view.tick_rate(), 31.0);
        apply_action(&mut view, UiAction::Density(-DENSITY_STEP)).unwrap();
        assert_eq!(view.density(), 25.0);

        for _ in 0..40 {
            apply_action(&mut view, UiAction::Density(DENSITY_STEP)).unwrap();
        }
        assert_eq!(view.density(), 80.0);
    }

    #[test]
    fn test_apply_toggle_play_and_seed() {
        let mut view = view();
        apply_action(&mut view, UiAction::TogglePlay).unwrap();
        assert!(view.is_playing());
        apply_action(&mut view, UiAction::Seed(Motif::LightweightSpaceship)).unwrap();
        assert_eq!(view.population(), 9);
        apply_action(&mut view, UiAction::Clear).unwrap();
        assert!(!view.is_playing());
        assert_eq!(view.population(), 0);
    }
}
