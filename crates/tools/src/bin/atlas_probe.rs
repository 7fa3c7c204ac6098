use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use formats::ViewerPackage;
use foundation::viewport::Viewport;
use tools::{Probe, Script};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Replay viewer input headlessly and print label layouts")]
struct Args {
    /// Viewer package directory or manifest file
    manifest: PathBuf,

    /// Frames to simulate (extended to cover the script)
    #[arg(long, default_value_t = 1)]
    frames: u64,

    /// Input script, e.g. "drag:120; wait:5; wheel:-1; press:zoom_in"
    #[arg(long, default_value = "")]
    script: String,

    /// Viewport width in pixels
    #[arg(long, default_value_t = 1280.0)]
    width: f64,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 720.0)]
    height: f64,

    /// Lay labels out as if the document were fullscreen
    #[arg(long)]
    fullscreen: bool,

    /// Print every Nth frame (the last frame is always printed)
    #[arg(long, default_value_t = 1)]
    every: u64,

    /// Only print labels that are shown
    #[arg(long)]
    shown_only: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    if !(args.width > 0.0 && args.height > 0.0) {
        return Err(format!("viewport must be positive, got {}x{}", args.width, args.height));
    }

    let package = ViewerPackage::load(&args.manifest).map_err(|e| e.to_string())?;
    let script = Script::parse(&args.script).map_err(|e| format!("script: {e}"))?;
    let frames = args.frames.max(script.span());
    let viewport = Viewport::new(args.width, args.height);

    let mut probe =
        Probe::new(package.manifest(), viewport, args.fullscreen, &script).map_err(|e| e.to_string())?;
    info!(
        manifest = %args.manifest.display(),
        frames,
        labels = probe.labels().len(),
        "probe run"
    );
    let records = probe.run(frames, 1.0 / 60.0);

    let every = args.every.max(1);
    let last = records.len().saturating_sub(1);
    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for (i, mut record) in records.into_iter().enumerate() {
        if record.frame % every != 0 && i != last {
            continue;
        }
        if args.shown_only {
            record.labels.retain(|l| l.placement.is_shown());
        }
        let line = serde_json::to_string(&record).map_err(|e| format!("encode frame {}: {e}", record.frame))?;
        writeln!(out, "{line}").map_err(|e| format!("write stdout: {e}"))?;
    }
    out.flush().map_err(|e| format!("write stdout: {e}"))?;
    Ok(())
}
