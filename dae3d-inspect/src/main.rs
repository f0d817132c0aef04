//! DAE3D Inspect - print what the importer extracts from a COLLADA file
//!
//! Usage: dae3d-inspect path/to/file.dae
//! Set RUST_LOG=debug to trace the scene walk.

use std::env;
use std::fs;
use std::io;
use std::process;

use dae3d_core::ColladaImporter;
use dae3d_inspect::summarize;

fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <dae-file>", args[0]);
        process::exit(2);
    }

    let path = &args[1];
    log::info!("loading {path}");

    let text = fs::read_to_string(path).map_err(|e| {
        io::Error::new(e.kind(), format!("Failed to read COLLADA file: {}", e))
    })?;

    let importer = ColladaImporter::default();
    log::debug!("placeholder texture {:?}", importer.config().placeholder_texture);

    let meshes = importer.import_str(&text).map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("Failed to parse COLLADA: {}", e))
    })?;

    println!("Loaded {} meshes from {}", meshes.len(), path);
    for (index, mesh) in meshes.iter().enumerate() {
        println!("  {}", summarize(index, mesh));
    }

    Ok(())
}
