//! Subcommand handlers and run setup.

use std::path::Path;

use super::args::{ConfigAction, RunArgs};
use crate::camera::{
    CameraDevice, DeniedCamera, Resolution, StillImageCamera, SyntheticCamera, UnavailableCamera,
};
use crate::config::{self, CameraConfig, CameraSource, Config, ConfigError};

/// Load the config named by `--config` (must exist) or the default one (may
/// be absent), then layer the environment and the flags on top.
pub fn resolve_config(args: &RunArgs) -> Result<Config, ConfigError> {
    let mut cfg = match args.config.as_deref() {
        Some(path) => Config::load_from_explicit(path)?,
        None => Config::load(None).unwrap_or_else(|e| {
            log::warn!("Failed to load config file: {}; using defaults", e);
            Config::default()
        }),
    };

    // CLI > environment > file > defaults
    cfg.apply_env();
    if let Some(camera) = args.camera {
        cfg.camera.source = camera.into();
    }
    if let Some(ref image) = args.image {
        cfg.camera.image = Some(image.clone());
        if args.camera.is_none() {
            cfg.camera.source = CameraSource::Image;
        }
    }
    if args.no_mirror {
        cfg.camera.mirror = false;
    }
    if args.no_analytics {
        cfg.analytics.enabled = false;
    }
    if let Some(ref url) = args.booking_url {
        cfg.assets.booking_url = url.clone();
    }

    cfg.validate()?;
    Ok(cfg)
}

/// Camera device for the configured source.
pub fn build_camera(camera: &CameraConfig) -> Box<dyn CameraDevice> {
    match (camera.source, camera.image.as_ref()) {
        (CameraSource::Synthetic, _) => Box::new(SyntheticCamera::new(Resolution::MEDIUM)),
        (CameraSource::Image, Some(path)) => Box::new(StillImageCamera::new(path.clone())),
        (CameraSource::Image, None) => {
            log::warn!("Image camera selected without an image; no camera available");
            Box::new(UnavailableCamera::new())
        }
        (CameraSource::None, _) => Box::new(UnavailableCamera::new()),
        (CameraSource::Denied, _) => Box::new(DeniedCamera::new()),
    }
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, path: Option<&Path>) -> Result<(), ConfigError> {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(config::default_path);

    match action {
        ConfigAction::Show => {
            let mut cfg = match path {
                Some(p) => Config::load_from_explicit(p)?,
                None => Config::load(None)?,
            };
            cfg.apply_env();

            if config_path.exists() {
                println!("# Config file: {} (exists)", config_path.display());
            } else {
                println!("# Config file: {} (not found, using defaults)", config_path.display());
            }
            println!();
            print!("{}", cfg.to_toml()?);
        }
        ConfigAction::Init => {
            if config_path.exists() {
                eprintln!("Config file already exists: {}", config_path.display());
                eprintln!("Use 'smile-match config show' to view current settings.");
                return Ok(());
            }
            write_default_config(&config_path)?;
            println!("Created config file: {}", config_path.display());
        }
    }
    Ok(())
}

fn write_default_config(path: &Path) -> Result<(), ConfigError> {
    let io_err = |e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, config::DEFAULT_CONFIG_TOML).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::CameraArg;

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[camera]\nmirror = true\n[assets]\nbooking_url = \"https://file.example\"\n",
        )
        .unwrap();

        let args = RunArgs {
            config: Some(path),
            camera: Some(CameraArg::Denied),
            no_mirror: true,
            booking_url: Some("https://flag.example".to_string()),
            ..Default::default()
        };
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.camera.source, CameraSource::Denied);
        assert!(!cfg.camera.mirror);
        assert_eq!(cfg.assets.booking_url, "https://flag.example");
    }

    #[test]
    fn test_image_flag_selects_image_source() {
        let (_dir, path) = write_empty_config();
        let args = RunArgs {
            config: Some(path),
            image: Some("me.png".into()),
            ..Default::default()
        };
        let cfg = resolve_config(&args).unwrap();
        assert_eq!(cfg.camera.source, CameraSource::Image);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let args = RunArgs {
            config: Some("/definitely/not/here.toml".into()),
            ..Default::default()
        };
        assert!(matches!(
            resolve_config(&args),
            Err(ConfigError::NotFound { .. })
        ));
    }

    #[test]
    fn test_build_camera_names() {
        let mut camera = CameraConfig::default();
        assert_eq!(build_camera(&camera).name(), SyntheticCamera::new(Resolution::MEDIUM).name());
        camera.source = CameraSource::Denied;
        assert_eq!(build_camera(&camera).name(), DeniedCamera::new().name());
    }

    #[test]
    fn test_init_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        handle_config_action(ConfigAction::Init, Some(&path)).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, config::DEFAULT_CONFIG_TOML);
    }

    fn write_empty_config() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();
        (dir, path)
    }
}
