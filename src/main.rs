use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use svg_piano::keyboard::{Piano, PianoError, SvgOptions, MAX_OCTAVES};
use svg_piano::state::AppState;
use svg_piano::ui::run_ui;
use thiserror::Error;
use tracing::{error, info, warn, Level};

/// Interactive piano keyboard rendered as SVG
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Number of octaves to show, starting at note 0
    #[arg(short, long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=i64::from(MAX_OCTAVES)))]
    octaves: u8,

    /// Notes that start out sounding
    #[arg(short, long, num_args = 1.., value_parser = clap::value_parser!(u8).range(0..128))]
    active: Vec<u8>,

    /// Start with the sustain pedal engaged
    #[arg(short, long)]
    sustain: bool,

    /// Write the rendered SVG to this file ("-" for stdout) instead of opening a window
    #[arg(long, value_name = "PATH")]
    svg: Option<PathBuf>,

    /// Leave the default stylesheet out of exported SVG
    #[arg(long)]
    no_style: bool,

    /// Maximum log level
    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

#[derive(Debug, Error)]
enum AppError {
    #[error("Failed to write SVG to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Piano(#[from] PianoError),
    #[error("UI error: {0}")]
    Ui(#[from] eframe::Error),
}

fn export_svg(state: &AppState, path: &Path, options: &SvgOptions) -> Result<(), AppError> {
    let svg = Piano::new(state.props())?.render_svg_with(options);
    let result = if path == Path::new("-") {
        std::io::stdout().write_all(svg.as_bytes())
    } else {
        std::fs::write(path, &svg)
    };
    result.map_err(|source| AppError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Wrote {} bytes of SVG to {}", svg.len(), path.display());
    Ok(())
}

fn run(args: Args) -> Result<(), AppError> {
    let mut state = AppState::new();
    state.octave_count = args.octaves;
    state.sustain_pedal_engaged = args.sustain;

    let visible = args.octaves * 12;
    for id in args.active {
        if id >= visible {
            warn!("Note {} is outside the {} visible notes", id, visible);
        }
        if !state.active_notes.contains(&id) {
            state.active_notes.push(id);
        }
    }

    match args.svg {
        Some(path) => {
            let options = SvgOptions {
                embed_style: !args.no_style,
            };
            export_svg(&state, &path, &options)
        }
        None => {
            // Fail before opening a window if the layout is invalid
            Piano::new(state.props())?;
            run_ui(state)?;
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
