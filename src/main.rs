use clap::{value_parser, Arg, ArgAction, Command as ClapCommand};
use log::{error, LevelFilter};
use std::path::Path;
use std::process;

use geogrid_tiler::commands::{CommandFactory, GeogridCommandFactory};
use geogrid_tiler::utils::logger::Logger;

fn main() {
    let matches = ClapCommand::new("geogrid-tiler")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Cut a strip-organised GeoTIFF raster into geogrid binary tiles")
        .arg(
            Arg::new("input")
                .help("Input TIFF/BigTIFF file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .help("Output directory for tiles and the index file")
                .value_name("DIR")
                .required(false),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("TOML file with conversion settings")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("tile-x")
                .long("tile-x")
                .help("Tile width in pixels")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .required(false),
        )
        .arg(
            Arg::new("tile-y")
                .long("tile-y")
                .help("Tile height in pixels")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .required(false),
        )
        .arg(
            Arg::new("row-order")
                .long("row-order")
                .help("Orientation of the output rows")
                .value_parser(["bottom_top", "top_bottom"])
                .required(false),
        )
        .arg(
            Arg::new("traversal")
                .long("traversal")
                .help("Order in which the raster is read")
                .value_parser(["forward", "reverse"])
                .required(false),
        )
        .arg(
            Arg::new("mode")
                .long("mode")
                .help("Memory strategy: whole raster, tile row bands or single strips")
                .value_parser(["whole", "rows", "strips"])
                .required(false),
        )
        .arg(
            Arg::new("fill-value")
                .long("fill-value")
                .help("Value for padding cells of edge tiles")
                .value_name("VALUE")
                .value_parser(value_parser!(f32))
                .allow_negative_numbers(true)
                .required(false),
        )
        .arg(
            Arg::new("info")
                .short('i')
                .long("info")
                .help("Describe the raster and the planned grid, write nothing")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Hide the progress bar")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write a run record (input, output, tile counts) to this file")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let log_file = matches.get_one::<String>("log-file").map(Path::new);

    // Run records go to the file; log records go to the console through the global logger
    let logger = match Logger::new(log_file, level) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Error initializing logger: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = Logger::init_global_logger(None, level) {
        eprintln!("Error setting up global logger: {}", e);
        process::exit(1);
    }

    let factory = GeogridCommandFactory::new();
    match factory.create_command(&matches, &logger) {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Failed to create command: {}", e);
            process::exit(1);
        }
    };
}
