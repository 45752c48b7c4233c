use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use pollframe::rendering::{fit, SizeEnvelope, TextRenderer};
use pollframe::{FramePipeline, Payload, RenderConfig};

#[derive(Parser)]
#[command(name = "pollframe", about = "Render poll frame images")]
struct Cli {
    #[command(flatten)]
    shared: SharedArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct SharedArgs {
    /// JSON render config
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the fallback font directory
    #[arg(long, global = true)]
    font_dir: Option<PathBuf>,
    /// Override the emoji icon directory
    #[arg(long, global = true)]
    emoji_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the scene tree for a payload as JSON
    Scene {
        /// Payload JSON file, `-` for stdin
        payload: PathBuf,
    },
    /// Render a payload
    Render {
        /// Payload JSON file, `-` for stdin
        payload: PathBuf,
        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Compute a fitted font size
    Fit {
        #[arg(long)]
        length: usize,
        #[arg(long)]
        min: f64,
        #[arg(long)]
        max: f64,
        #[arg(long)]
        max_length: usize,
    },
}

fn load_config(shared: &SharedArgs) -> anyhow::Result<RenderConfig> {
    let mut config = match &shared.config {
        Some(path) => RenderConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RenderConfig::default(),
    };
    if let Some(dir) = &shared.font_dir {
        config.font_dir = dir.clone();
    }
    if let Some(dir) = &shared.emoji_dir {
        config.emoji_dir = dir.clone();
    }
    Ok(config)
}

fn read_payload(path: &Path) -> anyhow::Result<Payload> {
    let data = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    Ok(Payload::from_json(&data)?)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Fit { length, min, max, max_length } => {
            let env = SizeEnvelope::new(min, max, max_length)?;
            println!("{}", fit(length, &env));
        }
        Command::Scene { payload } => {
            let config = load_config(&cli.shared)?;
            let pipeline = FramePipeline::new(config, TextRenderer::new())?;
            let scene = pipeline.scene(&read_payload(&payload)?);
            println!("{}", scene.to_json()?);
        }
        Command::Render { payload, out } => {
            let config = load_config(&cli.shared)?;
            let pipeline = FramePipeline::new(config, TextRenderer::new())?;
            let image = pipeline.render(&read_payload(&payload)?).await?;
            match out {
                Some(path) => std::fs::write(&path, &image.data)
                    .with_context(|| format!("writing {}", path.display()))?,
                None => io::stdout().write_all(&image.data)?,
            }
        }
    }
    Ok(())
}
