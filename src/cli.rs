use std::path::PathBuf;

use clap::Parser;

use crate::{error::SetupError, particle::SpawnArea};

/// A GPU particle field drawn as textured points
#[derive(Parser, Debug)]
#[command()]
pub struct Args {
    /// Total Particles
    #[arg(short, long, default_value_t = 2_000_000)]
    pub particles: u32,

    /// The framerate the field will run at
    ///
    /// `0` runs as fast as possible
    #[arg(short, long, default_value_t = 60)]
    pub framerate: u32,

    /// Image sampled by the particles, a generated pattern is used if omitted
    #[arg(short, long)]
    pub texture: Option<PathBuf>,

    /// Seed for the initial particle placement
    #[arg(long)]
    pub seed: Option<u64>,

    /// Half width of the area particles are spawned in
    #[arg(long, default_value_t = 1800.0)]
    pub spawn_width: f32,

    /// Half height of the area particles are spawned in
    #[arg(long, default_value_t = 1200.0)]
    pub spawn_height: f32,

    /// Multiplier applied to the frame time
    #[arg(long, default_value_t = 1.0)]
    pub time_scale: f32,
}

/// Validated startup settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldConfig {
    pub particles: u32,
    pub framerate: u32,
    pub texture: Option<PathBuf>,
    pub seed: Option<u64>,
    pub spawn_area: SpawnArea,
    pub time_scale: f32,
}

impl Args {
    pub fn config(self) -> Result<FieldConfig, SetupError> {
        if self.particles == 0 {
            return Err(SetupError::InvalidConfig(
                "particle count must be greater than zero".into(),
            ));
        }

        let spawn_area = SpawnArea::new(self.spawn_width, self.spawn_height)
            .ok_or_else(|| {
                SetupError::InvalidConfig(format!(
                    "spawn area {}x{} must be positive and finite",
                    self.spawn_width, self.spawn_height
                ))
            })?;

        if !(self.time_scale >= 0.0 && self.time_scale.is_finite()) {
            return Err(SetupError::InvalidConfig(format!(
                "time scale {} must be a finite non-negative number",
                self.time_scale
            )));
        }

        Ok(FieldConfig {
            particles: self.particles,
            framerate: self.framerate,
            texture: self.texture,
            seed: self.seed,
            spawn_area,
            time_scale: self.time_scale,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<FieldConfig, SetupError> {
        let mut argv = vec!["particle_field"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).expect("arguments parse").config()
    }

    #[test]
    fn defaults_match_the_reference_field() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.particles, 2_000_000);
        assert_eq!(config.framerate, 60);
        assert_eq!(config.texture, None);
        assert_eq!(config.spawn_area, SpawnArea::new(1800.0, 1200.0).unwrap());
        assert_eq!(config.time_scale, 1.0);
    }

    #[test]
    fn flags_override_defaults() {
        let config = parse(&[
            "-p",
            "4096",
            "--framerate",
            "0",
            "--texture",
            "farm.png",
            "--seed",
            "7",
        ])
        .unwrap();

        assert_eq!(config.particles, 4096);
        assert_eq!(config.framerate, 0);
        assert_eq!(config.texture, Some(PathBuf::from("farm.png")));
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn zero_particles_is_rejected() {
        assert!(matches!(
            parse(&["--particles", "0"]),
            Err(SetupError::InvalidConfig(_))
        ));
    }

    #[test]
    fn degenerate_spawn_area_is_rejected() {
        assert!(matches!(
            parse(&["--spawn-width", "0"]),
            Err(SetupError::InvalidConfig(_))
        ));
    }

    #[test]
    fn negative_time_scale_is_rejected() {
        assert!(matches!(
            parse(&["--time-scale=-1"]),
            Err(SetupError::InvalidConfig(_))
        ));
    }
}
