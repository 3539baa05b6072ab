use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;

use hover_plane::{
    FixedContainer, PointerEvent, RecordingBackend, SceneConfig, SceneController, TextureState,
    DISPLACEMENT, LOGO_PRIMARY, LOGO_SECONDARY,
};

const FRAME: Duration = Duration::from_micros(16_667);

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let config = match options.config.as_deref() {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("failed to load config {path}"))?,
        None => SceneConfig::default(),
    };

    if options.summary_only {
        return run_headless(config, &options);
    }

    match hover_plane::app::run(config.clone(), options.size) {
        Ok(()) => Ok(()),
        Err(err) => {
            if err
                .downcast_ref::<hover_plane::app::WindowInitError>()
                .is_some()
            {
                eprintln!(
                    "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                );
                run_headless(config, &options)
            } else {
                Err(err)
            }
        }
    }
}

/// Drives a controller against a recording backend and prints what happened.
fn run_headless(config: SceneConfig, options: &CliOptions) -> Result<()> {
    let (width, height) = options.size;
    let container = Arc::new(FixedContainer::new(width, height));
    let mut controller = SceneController::new(container, RecordingBackend::new(), config)
        .context("failed to start scene controller")?;
    controller.wait_for_textures();

    let camera = controller.camera();
    println!(
        "Scene ready: {width}x{height}, aspect {:.3}, camera fov {:.0} at ({:.1}, {:.1}, {:.1})",
        camera.aspect,
        camera.fov,
        camera.position().x,
        camera.position().y,
        camera.position().z
    );
    if let Some(mesh) = controller.plane().and_then(|plane| controller.scene().mesh(plane)) {
        println!(
            "Plane: {}x{} units, {}x{} segments",
            mesh.geometry.width,
            mesh.geometry.height,
            mesh.geometry.width_segments,
            mesh.geometry.height_segments
        );
        for slot in [LOGO_PRIMARY, LOGO_SECONDARY, DISPLACEMENT] {
            let status = match mesh.material.texture(slot).map(|texture| texture.state()) {
                Some(TextureState::Ready(image)) => format!("ready {}x{}", image.width, image.height),
                Some(TextureState::Loading) => "loading".to_string(),
                Some(TextureState::Failed(_)) => "failed".to_string(),
                Some(TextureState::Disposed) => "disposed".to_string(),
                None => "missing".to_string(),
            };
            println!(" - {slot}: {status}");
        }
    }

    for pointer in &options.pointers {
        controller.on_mouse_move(PointerEvent::moved(pointer.x, pointer.y));
        let target = controller.hover_target();
        for _ in 0..options.frames {
            controller
                .update(FRAME)
                .context("failed to render frame")?;
        }
        println!(
            "Pointer ({:.0}, {:.0}): target {:.0}, hover_state {:.3}",
            pointer.x,
            pointer.y,
            target,
            controller.hover_state()
        );
    }

    let frames = controller.backend().render_count();
    let report = controller.destroy();
    println!(
        "Destroyed after {frames} frame(s): {} geometries, {} textures released",
        report.geometries, report.textures
    );
    Ok(())
}

#[derive(Debug)]
struct CliOptions {
    config: Option<String>,
    summary_only: bool,
    size: (u32, u32),
    pointers: Vec<Vec2>,
    frames: u32,
}

const USAGE: &str = "Usage: hover-plane [--config file.json] [--summary-only] [--size WxH] [--pointer X,Y]... [--frames N]";

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self {
            config: None,
            summary_only: false,
            size: (800, 600),
            pointers: Vec::new(),
            frames: 60,
        };
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| anyhow!("{arg} expects a value. {USAGE}"))
            };
            match arg.as_str() {
                "--config" => options.config = Some(value()?),
                "--summary-only" => options.summary_only = true,
                "--size" => {
                    let raw = value()?;
                    let (width, height) = split_pair(&raw, 'x')
                        .with_context(|| format!("invalid --size {raw}, expected WxH"))?;
                    options.size = (width, height);
                }
                "--pointer" => {
                    let raw = value()?;
                    let (x, y) = split_pair::<f32>(&raw, ',')
                        .with_context(|| format!("invalid --pointer {raw}, expected X,Y"))?;
                    options.pointers.push(Vec2::new(x, y));
                }
                "--frames" => {
                    let raw = value()?;
                    options.frames = raw
                        .parse()
                        .with_context(|| format!("invalid --frames {raw}"))?;
                }
                other => return Err(anyhow!("Unknown argument: {other}. {USAGE}")),
            }
        }
        Ok(options)
    }
}

fn split_pair<T: std::str::FromStr>(raw: &str, separator: char) -> Result<(T, T)>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let (first, second) = raw
        .split_once(separator)
        .ok_or_else(|| anyhow!("missing '{separator}'"))?;
    Ok((first.trim().parse()?, second.trim().parse()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliOptions> {
        CliOptions::parse(args.iter().map(|arg| arg.to_string()))
    }

    #[test]
    fn defaults_open_an_800_by_600_window() {
        let options = parse(&[]).unwrap();
        assert_eq!(options.size, (800, 600));
        assert!(!options.summary_only);
        assert!(options.pointers.is_empty());
    }

    #[test]
    fn parses_every_flag() {
        let options = parse(&[
            "--config",
            "scene.json",
            "--summary-only",
            "--size",
            "1024x768",
            "--pointer",
            "10,20.5",
            "--pointer",
            "0,0",
            "--frames",
            "5",
        ])
        .unwrap();
        assert_eq!(options.config.as_deref(), Some("scene.json"));
        assert!(options.summary_only);
        assert_eq!(options.size, (1024, 768));
        assert_eq!(options.pointers, vec![Vec2::new(10.0, 20.5), Vec2::ZERO]);
        assert_eq!(options.frames, 5);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse(&["--size", "big"]).is_err());
        assert!(parse(&["--pointer"]).is_err());
        assert!(parse(&["--wat"]).is_err());
    }
}
