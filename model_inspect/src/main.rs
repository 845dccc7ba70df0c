//! Model inspection tool
//!
//! Loads a Wavefront OBJ file and prints what a renderer would see: the base
//! path for textures, the materials, and per object the vertex buffers and the
//! face ranges of each group and material.
//!
//! Usage: model_inspect data/cubescene.obj [--config loader.toml] [--summary ron]

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use scene_assets::assets::materials::TEXTURE_KEYS;
use scene_assets::foundation::logging;
use scene_assets::prelude::*;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "model_inspect", version, about = "Dump the contents of a Wavefront OBJ model")]
struct Args {
    /// OBJ file to load
    path: PathBuf,

    /// Loader configuration file (.toml or .ron)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a serialized summary instead of the full listing
    #[arg(long, value_enum)]
    summary: Option<SummaryFormat>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SummaryFormat {
    Ron,
    Toml,
}

#[derive(Error, Debug)]
enum InspectError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Load failed: {0}")]
    Load(#[from] ObjError),
    #[error("Summary serialization failed: {0}")]
    Summary(String),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => log::LevelFilter::Info,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    logging::init_with_level(level);

    match run(&args) {
        Ok(()) => Ok(()),
        Err(e) => {
            log::error!("{}: {}", args.path.display(), e);
            Err(e.into())
        }
    }
}

fn run(args: &Args) -> Result<(), InspectError> {
    let config = match &args.config {
        Some(path) => ObjLoaderConfig::load_from_file(path)?,
        None => ObjLoaderConfig::default(),
    };
    config.validate()?;
    log::debug!("Loader configuration: {:?}", config);

    let model = ObjModel::from_file_with_config(&args.path, config)?;

    match args.summary {
        Some(format) => println!("{}", serialize_summary(&model, format)?),
        None => dump_model(&model),
    }

    Ok(())
}

fn serialize_summary(model: &ObjModel, format: SummaryFormat) -> Result<String, InspectError> {
    let summary = model.summary();
    match format {
        SummaryFormat::Ron => ron::ser::to_string_pretty(&summary, ron::ser::PrettyConfig::default())
            .map_err(|e| InspectError::Summary(e.to_string())),
        SummaryFormat::Toml => toml::to_string_pretty(&summary)
            .map_err(|e| InspectError::Summary(e.to_string())),
    }
}

fn dump_model(model: &ObjModel) {
    println!("Base path for loading textures etc: {}", model.base_path.display());

    println!("Provided materials:");
    for (name, material) in &model.materials {
        println!(" Name: \"{}\"", name);
        println!("  Properties: {}", property_list(material));

        if let Some(diffuse) = material.get_vec3("Kd") {
            println!("  Diffuse color: {}, {}, {}", diffuse.x, diffuse.y, diffuse.z);
        }

        for key in TEXTURE_KEYS {
            if let Some(path) = model.texture_path(name, key) {
                println!("  Texture {}: {}", key, path.display());
            }
        }
    }

    for (name, set) in &model.objects {
        println!("Object name: \"{}\"", name);
        println!(" Number of separate vertex buffers: {}", set.buffers.len());
        for (i, buffer) in set.buffers.iter().enumerate() {
            println!("  Vertex Buffer {}:", i);
            println!("   Number of vertices: {}", buffer.len());
            println!("   Number of indices: {}", buffer.indices.len());
            println!("   Has texture coordinates: {}", buffer.has_texture());
            println!("   Has normal vectors: {}", buffer.has_normal());
        }

        for (group, materials) in &set.group_material_faces {
            println!(" Vertex group \"{}\" materials:", group);
            for (material, ranges) in materials {
                println!("  Material \"{}\":", material);
                println!("   Number of separate face ranges: {}", ranges.len());
                for range in ranges {
                    println!(
                        "    Uses VertexBuffer {} indices from: [{} .. {}]",
                        range.buffer_index,
                        range.start_index,
                        range.end().saturating_sub(1)
                    );
                    if let Some(first) = first_position(set, range) {
                        println!("     First vertex position: {}, {}, {}", first.x, first.y, first.z);
                    }
                }
            }
        }
    }
}

fn property_list(material: &Material) -> String {
    material.keys().collect::<Vec<_>>().join(" ")
}

fn first_position(set: &VertexSet, range: &IndexRange) -> Option<Vec4> {
    let buffer = set.buffer_for(range)?;
    let &index = buffer.range_indices(range).first()?;
    buffer.positions.get(index as usize).copied()
}
