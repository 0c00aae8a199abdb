//! Renders a seeded fractal to an equirectangular PNG.
//!
//! Parameters come from flags, optionally layered over a JSON parameter file.
//! The grid is normalized and colored through a gradient built from a JSON
//! stop file and/or `--stop` flags (grayscale when neither is given).

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use fractala_core::{
    Argb, ColorGradient, FilterKind, FractalParams, GradientBuilder, GradientStop, NoiseKind,
    Projection,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

// ── CLI ──────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "render", about = "Render a spherical fractal noise map to PNG")]
struct Args {
    /// JSON parameter file; flags below override its fields
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// JSON array of {"value", "color"} gradient stops
    #[arg(short, long)]
    gradient: Option<PathBuf>,

    /// Extra gradient stop as VALUE=COLOR, e.g. 0.5=#3f7f3f (repeatable)
    #[arg(long = "stop", value_name = "VALUE=COLOR")]
    stops: Vec<String>,

    #[arg(short, long)]
    seed: Option<u64>,

    /// Width is 2^power, height 2^(power-1)
    #[arg(long)]
    power: Option<u32>,

    #[arg(long)]
    octaves: Option<u32>,

    #[arg(long)]
    persistence: Option<f64>,

    #[arg(long)]
    lacunarity: Option<f64>,

    #[arg(long, value_enum)]
    noise: Option<NoiseArg>,

    #[arg(long, value_enum)]
    filter: Option<FilterArg>,

    /// Normalize onto [LOW, HIGH] before coloring (default [0, 1])
    #[arg(long, num_args = 2, value_names = ["LOW", "HIGH"], allow_negative_numbers = true)]
    range: Option<Vec<f64>>,

    /// Output PNG path
    #[arg(short, long, default_value = "fractal.png")]
    output: PathBuf,

    /// Print the effective parameters as JSON and exit
    #[arg(long)]
    print_params: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NoiseArg {
    Perlin,
    Simplex,
    OpenSimplex,
    Cellular,
}

impl From<NoiseArg> for NoiseKind {
    fn from(n: NoiseArg) -> Self {
        match n {
            NoiseArg::Perlin => NoiseKind::Perlin,
            NoiseArg::Simplex => NoiseKind::Simplex,
            NoiseArg::OpenSimplex => NoiseKind::OpenSimplex,
            NoiseArg::Cellular => NoiseKind::Cellular,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterArg {
    None,
    Turbulence,
    Ridged,
}

impl From<FilterArg> for FilterKind {
    fn from(f: FilterArg) -> Self {
        match f {
            FilterArg::None => FilterKind::None,
            FilterArg::Turbulence => FilterKind::Turbulence,
            FilterArg::Ridged => FilterKind::Ridged,
        }
    }
}

// ── Parameter resolution ─────────────────────────────────────────────────────

fn load_params(args: &Args) -> Result<FractalParams> {
    let mut params = match &args.params {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Cannot read {}", path.display()))?;
            FractalParams::from_json(&text)
                .with_context(|| format!("Failed to parse {}", path.display()))?
        }
        None => FractalParams::default(),
    };

    if let Some(seed) = args.seed {
        params.seed = seed;
    }
    if let Some(power) = args.power {
        params.power = power;
    }
    if let Some(octaves) = args.octaves {
        params.octaves = octaves;
    }
    if let Some(persistence) = args.persistence {
        params.persistence = persistence;
    }
    if let Some(lacunarity) = args.lacunarity {
        params.lacunarity = lacunarity;
    }
    if let Some(noise) = args.noise {
        params.noise = noise.into();
    }
    if let Some(filter) = args.filter {
        params.filter = filter.into();
    }
    Ok(params)
}

fn parse_stop(raw: &str) -> Result<(f64, Argb)> {
    let Some((value, color)) = raw.split_once('=') else {
        bail!("Gradient stop {raw:?} must look like VALUE=COLOR");
    };
    let value: f64 = value
        .trim()
        .parse()
        .with_context(|| format!("Bad stop value in {raw:?}"))?;
    let color = color
        .trim()
        .parse::<Argb>()
        .with_context(|| format!("Bad stop color in {raw:?}"))?;
    Ok((value, color))
}

fn load_gradient(file: Option<&Path>, stops: &[String]) -> Result<ColorGradient> {
    if file.is_none() && stops.is_empty() {
        return Ok(ColorGradient::grayscale());
    }

    let mut builder = GradientBuilder::new();
    if let Some(path) = file {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let from_file: Vec<GradientStop> = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        for stop in &from_file {
            builder = builder
                .add_hex(stop.value, &stop.color)
                .with_context(|| format!("Bad color in {}", path.display()))?;
        }
    }
    let extra = stops.iter().map(|s| parse_stop(s)).collect::<Result<Vec<_>>>()?;
    builder.add_all(extra).build().context("Invalid gradient")
}

// ── Main ──────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let params = load_params(&args)?;

    if args.print_params {
        println!("{}", params.to_json()?);
        return Ok(());
    }

    let (low, high) = match args.range.as_deref() {
        Some(&[low, high]) => (low, high),
        Some(other) => bail!("--range takes exactly two values, got {}", other.len()),
        None => (0.0, 1.0),
    };
    let gradient = load_gradient(args.gradient.as_deref(), &args.stops)?;
    debug!(stops = gradient.len(), "gradient ready");

    info!(
        seed = params.seed,
        power = params.power,
        octaves = params.octaves,
        noise = %params.noise,
        "rendering fractal"
    );
    let started = Instant::now();
    let fractal = params.build().context("Invalid fractal parameters")?;
    let grid = fractal.evaluate().context("Evaluation failed")?;
    let grid = grid.normalize_to(low, high).context("Invalid --range")?;
    info!(
        width = grid.width(),
        height = grid.height(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "evaluated"
    );

    let bytes: Vec<u8> = grid
        .to_argb(|v| gradient.map(v).0)
        .into_iter()
        .flat_map(|c| Argb(c).to_rgba())
        .collect();
    let img = image::RgbaImage::from_raw(grid.width() as u32, grid.height() as u32, bytes)
        .context("Pixel buffer does not match image dimensions")?;

    if let Some(dir) = args.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("Cannot create {}", dir.display()))?;
    }
    img.save(&args.output)
        .with_context(|| format!("Write failed: {}", args.output.display()))?;
    info!(path = %args.output.display(), "wrote image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_flags_parse() {
        let (v, c) = parse_stop("0.25=#102030").unwrap();
        assert_eq!(v, 0.25);
        assert_eq!(c, Argb::opaque(0x10, 0x20, 0x30));
        assert!(parse_stop("0.25").is_err());
        assert!(parse_stop("x=#000000").is_err());
        assert!(parse_stop("1=-1").is_err());
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "render", "--seed", "9", "--power", "6", "--noise", "open-simplex", "--filter", "ridged",
        ]);
        let params = load_params(&args).unwrap();
        assert_eq!(params.seed, 9);
        assert_eq!(params.power, 6);
        assert_eq!(params.noise, NoiseKind::OpenSimplex);
        assert_eq!(params.filter, FilterKind::Ridged);
        assert_eq!(params.octaves, FractalParams::default().octaves);
    }

    #[test]
    fn cellular_noise_flag() {
        let args = Args::parse_from(["render", "--noise", "cellular"]);
        assert_eq!(load_params(&args).unwrap().noise, NoiseKind::Cellular);
    }

    #[test]
    fn range_accepts_negative_bounds() {
        let args = Args::parse_from(["render", "--range", "-1", "1"]);
        assert_eq!(args.range, Some(vec![-1.0, 1.0]));
    }

    #[test]
    fn gradient_defaults_to_grayscale() {
        assert_eq!(load_gradient(None, &[]).unwrap(), ColorGradient::grayscale());
        let g = load_gradient(None, &["1=#ffffff".to_string(), "0=#000000".to_string()]).unwrap();
        assert_eq!(g, ColorGradient::grayscale());
    }
}
