use macroquad::prelude::*;

use gpu_life::{
    BackendKind, Capability, ComputeBackend, Config, CpuBackend, GpuBackend, LifeView, Seed, Viewport,
    gpu,
    input::{self, DragState},
    rendering::{self, DEAD_COLOR, GridRenderer},
    ui,
};

fn window_conf() -> Conf {
    Conf {
        window_title: "GPU Game of Life".to_owned(),
        window_width: 1200,
        window_height: 800,
        window_resizable: true,
        ..Default::default()
    }
}

/// Grid area of the window, left of the panel
fn current_viewport() -> Viewport {
    Viewport::new(ui::grid_area_width(), ui::grid_area_height(), screen_dpi_scale())
}

/// Build the backend the config asks for, or the reason it can't exist
fn select_backend(config: &Config) -> Result<Box<dyn ComputeBackend>, String> {
    match config.backend {
        BackendKind::Cpu => Ok(Box::new(CpuBackend::new(true))),
        BackendKind::Gpu => match gpu::probe() {
            Capability::Ready(context) => {
                let backend = GpuBackend::new(context);
                log::info!("compute on {}", backend.adapter_name());
                Ok(Box::new(backend))
            }
            Capability::Unsupported(reason) => Err(reason),
        },
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();
    let config = Config::from_args(std::env::args().skip(1));

    let mounted = select_backend(&config)
        .and_then(|backend| LifeView::mount(backend, current_viewport(), &config).map_err(|e| e.to_string()));
    let mut view = match mounted {
        Ok(view) => view,
        Err(reason) => {
            log::error!("cannot start simulation: {reason}");
            loop {
                rendering::draw_unsupported(&reason);
                next_frame().await;
            }
        }
    };

    let mut drag = DragState::default();
    let mut renderer: Option<GridRenderer> = None;
    let background = Color::new(DEAD_COLOR.r, DEAD_COLOR.g, DEAD_COLOR.b, 1.0);

    loop {
        let mouse_pos = mouse_position();

        if let Err(e) = view.resize(current_viewport()) {
            log::warn!("resize failed, keeping the current grid: {e}");
        }

        let selected = match view.seed() {
            Seed::Motif(motif) => Some(motif),
            Seed::Random { .. } => None,
        };
        let buttons = ui::create_buttons(view.is_playing(), selected);
        for action in input::collect_actions(&buttons, mouse_pos) {
            if let Err(e) = input::apply_action(&mut view, action) {
                log::warn!("{action:?} failed: {e}");
            }
        }
        input::handle_zoom(&mut view, mouse_pos);
        input::handle_pan(&mut view, &mut drag, mouse_pos);

        if let Err(e) = view.frame(get_time() * 1000.0) {
            log::error!("frame loop stopped: {e}");
            break;
        }

        clear_background(background);
        if let Some(grid) = view.current() {
            GridRenderer::ensure_size(&mut renderer, grid);
            if let Some(renderer) = renderer.as_mut() {
                renderer.draw(&view, grid);
            }
        }
        rendering::draw_controls(&view, &buttons, mouse_pos);

        next_frame().await;
    }

    view.unmount();
}
