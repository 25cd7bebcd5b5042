use crate::application::clamp_tick_rate;
use crate::domain::{Motif, Seed};
use crate::rendering::ColorMode;

/// Density range offered by the UI controls
pub const MIN_DENSITY: f64 = 5.0;
pub const MAX_DENSITY: f64 = 80.0;

/// Clamp a density percentage to the UI range
pub fn clamp_density(density: f64) -> f64 {
    if density.is_nan() {
        return MIN_DENSITY;
    }
    density.clamp(MIN_DENSITY, MAX_DENSITY)
}

/// Where the rule kernel runs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Gpu,
    /// Rows fanned out over the rayon pool
    Cpu,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Target ticks per second, always within 1..=120
    pub tick_rate: f64,
    /// Percent of cells alive after a random reseed
    pub density: f64,
    /// Logical pixels per cell at fit zoom; sets the grid size
    pub base_cell_size: f32,
    pub color_mode: ColorMode,
    pub backend: BackendKind,
    /// Motif for the first seed; random when `None`
    pub initial_motif: Option<Motif>,
    /// Fixed RNG seed for reproducible random fills
    pub rng_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_rate: 30.0,
            density: 30.0,
            base_cell_size: 1.0,
            color_mode: ColorMode::Neighborhood,
            backend: BackendKind::Gpu,
            initial_motif: None,
            rng_seed: None,
        }
    }
}

impl Config {
    /// Parse command-line flags (without the program name). Unknown flags
    /// and unparsable values are logged and skipped.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(arg) = args.next() {
            let (flag, inline) = match arg.split_once('=') {
                Some((flag, value)) => (flag.to_lowercase(), Some(value.to_owned())),
                None => (arg.to_lowercase(), None),
            };

            match flag.as_str() {
                "--cpu" => config.backend = BackendKind::Cpu,
                "--gpu" => config.backend = BackendKind::Gpu,
                "--simple-colors" => config.color_mode = ColorMode::Simple,
                "--rate" | "--density" | "--cell-size" | "--seed" | "--rng-seed" => {
                    let Some(value) = inline.or_else(|| args.next()) else {
                        log::warn!("{flag} needs a value");
                        continue;
                    };
                    config.apply_value(&flag, &value);
                }
                _ => log::warn!("ignoring unknown argument '{arg}'"),
            }
        }

        config
    }

    fn apply_value(&mut self, flag: &str, value: &str) {
        let value = value.trim();
        let parsed = match flag {
            "--rate" => value.parse::<f64>().map(|rate| self.tick_rate = clamp_tick_rate(rate)).is_ok(),
            "--density" => value.parse::<f64>().map(|d| self.density = clamp_density(d)).is_ok(),
            "--cell-size" => value
                .parse::<f32>()
                .map(|size| self.base_cell_size = size.clamp(1.0, 64.0))
                .is_ok(),
            "--rng-seed" => value.parse::<u64>().map(|seed| self.rng_seed = Some(seed)).is_ok(),
            "--seed" if value.eq_ignore_ascii_case("random") => {
                self.initial_motif = None;
                true
            }
            "--seed" => match value.parse::<Motif>() {
                Ok(motif) => {
                    self.initial_motif = Some(motif);
                    true
                }
                Err(e) => {
                    log::warn!("{e}");
                    return;
                }
            },
            _ => false,
        };

        if !parsed {
            log::warn!("ignoring invalid value '{value}' for {flag}");
        }
    }

    /// Seed used when the view is first mounted
    pub fn initial_seed(&self) -> Seed {
        match self.initial_motif {
            Some(motif) => Seed::Motif(motif),
            None => Seed::Random {
                density: self.density,
            },
        }
    }
}
