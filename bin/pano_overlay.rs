//! Panorama Layout Overlay Tool
//!
//! Draw a room layout boundary on an equirectangular panorama.
//!
//! The layout file lists one corner per line as `col row` panorama pixels, ceiling and
//! floor corner interleaved for each wall edge.
//!
//! Usage:
//!   cargo run --bin pano_overlay -- -i pano.png -l layout.txt -o overlay.png

use apex_panorama::config::PanoramaConfig;
use apex_panorama::overlay::draw_boundary_from_corners;
use clap::Parser;
use image::Rgb;
use log::info;
use nalgebra::Vector2;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Draw a room layout boundary on a panorama")]
struct Cli {
    /// Input panorama image path
    #[arg(short = 'i', long)]
    input: PathBuf,

    /// Layout corner file (one `col row` pair per line)
    #[arg(short = 'l', long)]
    layout: PathBuf,

    /// Output image path
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Optional panorama configuration YAML
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,
}

fn parse_corners(text: &str) -> Result<Vec<Vector2<f64>>, Box<dyn std::error::Error>> {
    let values = text
        .split_whitespace()
        .map(str::parse::<f64>)
        .collect::<Result<Vec<f64>, _>>()?;
    if values.len() % 2 != 0 {
        return Err(format!("Layout file has an odd number of values ({})", values.len()).into());
    }
    Ok(values
        .chunks_exact(2)
        .map(|pair| Vector2::new(pair[0], pair[1]))
        .collect())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => {
            let path = path.to_str().ok_or("Config path is not valid UTF-8")?;
            PanoramaConfig::load_from_yaml(path)?
        }
        None => PanoramaConfig::default(),
    };

    let image = image::open(&cli.input)?.to_rgb8();
    info!("Loaded panorama {:?}: {}x{}", cli.input, image.width(), image.height());
    if image.dimensions() != (config.width, config.height) {
        info!(
            "Panorama size differs from configured {}x{}; corners are measured against the image",
            config.width, config.height
        );
    }

    let corners = parse_corners(&fs::read_to_string(&cli.layout)?)?;
    info!("Loaded {} layout corners from {:?}", corners.len(), cli.layout);

    let overlay = draw_boundary_from_corners(
        &corners,
        image,
        Rgb(config.boundary_color),
        &config.raster_config(),
    );

    overlay.save(&cli.output)?;
    info!("Saved overlay to {:?}", cli.output);

    Ok(())
}
