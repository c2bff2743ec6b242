use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use terrain_viewer::{
    config::{AssetConfig, ViewerConfig},
    TerrainViewerApp,
};

#[derive(Parser, Debug)]
#[command(name = "terrain-viewer")]
#[command(about = "Heightmap terrain viewer with optional glTF/OBJ asset playback")]
struct Cli {
    /// JSON config file; every field is optional
    config: Option<PathBuf>,

    /// Grayscale heightmap image
    #[arg(long)]
    heightmap: Option<PathBuf>,

    /// Render the terrain flat, ignoring any configured heightmap
    #[arg(long, conflicts_with = "heightmap")]
    flat: bool,

    /// Surface color image
    #[arg(long)]
    color_map: Option<PathBuf>,

    /// Asset to place on the terrain (.gltf, .glb or .obj)
    #[arg(long)]
    asset: Option<PathBuf>,

    /// Displacement scale in mesh units
    #[arg(long)]
    scale: Option<f32>,
}

impl Cli {
    fn apply(&self, config: &mut ViewerConfig) {
        if let Some(heightmap) = &self.heightmap {
            config.terrain.heightmap = Some(heightmap.clone());
        }
        if self.flat {
            config.terrain.heightmap = None;
        }
        if let Some(color_map) = &self.color_map {
            config.terrain.color_map = color_map.clone();
        }
        if let Some(path) = &self.asset {
            let asset = config.asset.get_or_insert_with(AssetConfig::default);
            asset.path = path.clone();
        }
        if let Some(scale) = self.scale {
            config.terrain.displacement_scale = scale;
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let app = TerrainViewerApp::new(config).context("failed to load the scene")?;
    app.run()?;
    Ok(())
}
