use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use widget_svg::{Document, RecordingSurface, RenderOverrides, RenderTarget, Session};

/// Inspect SVG documents the way widgets see them.
#[derive(Debug, Parser)]
#[command(name = "widget-svg", version, about)]
struct Cli {
    /// Log ignored attributes and unsupported features to stdout.
    #[arg(long, global = true)]
    log: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Prints `id xmin xmax ymin ymax` for elements.
    Bounds {
        file: PathBuf,

        /// Element to measure; may be repeated.  All elements with an id by default.
        #[arg(long = "id")]
        ids: Vec<String>,
    },

    /// Prints whether a point is inside the bounds of an element.
    Hit {
        file: PathBuf,

        #[arg(long)]
        id: String,

        #[arg(allow_negative_numbers = true)]
        x: f64,

        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Prints the drawing calls made while rendering.
    Trace {
        file: PathBuf,

        /// Render only this element and its descendants.
        #[arg(long)]
        id: Option<String>,

        /// Style declarations applied to every element.
        #[arg(long)]
        style: Option<String>,
    },
}

fn load(file: &Path, log: bool) -> Result<Document> {
    let source =
        fs::read_to_string(file).with_context(|| format!("could not read {}", file.display()))?;

    let session = if log {
        Session::with_logging(true)
    } else {
        Session::default()
    };

    Document::parse_with_session(&source, session)
        .with_context(|| format!("could not load {}", file.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Bounds { file, ids } => {
            let doc = load(&file, cli.log)?;
            let ids = if ids.is_empty() { doc.ids() } else { ids };

            for id in &ids {
                let b = doc.get_element_bounds(id);
                writeln!(out, "{} {} {} {} {}", id, b.xmin, b.xmax, b.ymin, b.ymax)?;
            }
        }

        Command::Hit { file, id, x, y } => {
            let doc = load(&file, cli.log)?;

            if !doc.has_element(&id) {
                anyhow::bail!("no element with id \"{}\"", id);
            }

            let answer = if doc.is_inside(&id, x, y) {
                "inside"
            } else {
                "outside"
            };
            writeln!(out, "{answer}")?;
        }

        Command::Trace { file, id, style } => {
            let doc = load(&file, cli.log)?;

            let overrides = RenderOverrides {
                target: id.as_deref().map(RenderTarget::Id),
                element_style: style,
                ..Default::default()
            };

            let mut surface = RecordingSurface::new();
            doc.render(Some(&mut surface), &overrides)
                .context("rendering failed")?;

            for op in surface.ops() {
                writeln!(out, "{op}")?;
            }
        }
    }

    Ok(())
}
