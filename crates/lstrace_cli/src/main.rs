//! lstrace - render a level set sphere to a PPM image

mod cli;
mod render;

use anyhow::Result;
use clap::Parser;

use cli::Args;

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let opts = args.resolve()?;
    log::debug!("Render options:\n{opts}");

    let film = render::render(&opts)?;

    let path = film.save_ppm(opts.output_stem())?;
    log::info!("Saved {}", path.display());

    Ok(())
}
