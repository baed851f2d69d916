//! CLI command implementations
//!
//! `main` parses arguments with clap and hands them to
//! `GeogridCommandFactory`, which picks the command to run.

pub mod command_traits;
pub mod convert_command;
pub mod info_command;

pub use command_traits::{Command, CommandFactory};
pub use convert_command::ConvertCommand;
pub use info_command::InfoCommand;

use std::path::{Path, PathBuf};

use clap::ArgMatches;
use log::debug;

use crate::config::ConversionConfig;
use crate::errors::{GeogridError, GeogridResult};
use crate::utils::logger::Logger;

pub struct GeogridCommandFactory;

impl GeogridCommandFactory {
    pub fn new() -> Self {
        GeogridCommandFactory
    }
}

impl Default for GeogridCommandFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> CommandFactory<'a> for GeogridCommandFactory {
    fn create_command(&self, args: &ArgMatches, logger: &'a Logger) -> GeogridResult<Box<dyn Command + 'a>> {
        if args.get_flag("info") {
            Ok(Box::new(InfoCommand::new(args, logger)?))
        } else {
            Ok(Box::new(ConvertCommand::new(args, logger)?))
        }
    }
}

pub(crate) fn input_path(args: &ArgMatches) -> GeogridResult<PathBuf> {
    args.get_one::<String>("input")
        .map(PathBuf::from)
        .ok_or_else(|| GeogridError::GenericError("Missing input file".to_string()))
}

/// Defaults, then the `--config` file, then individual flags
pub(crate) fn conversion_config(args: &ArgMatches) -> GeogridResult<ConversionConfig> {
    let mut config = match args.get_one::<String>("config") {
        Some(path) => ConversionConfig::from_file(Path::new(path))?,
        None => ConversionConfig::default(),
    };

    if let Some(size) = args.get_one::<usize>("tile-x") {
        config.tile_x = *size;
    }
    if let Some(size) = args.get_one::<usize>("tile-y") {
        config.tile_y = *size;
    }
    if let Some(order) = args.get_one::<String>("row-order") {
        config.set_row_order(order)?;
    }
    if let Some(traversal) = args.get_one::<String>("traversal") {
        config.set_traversal(traversal)?;
    }
    if let Some(mode) = args.get_one::<String>("mode") {
        config.set_mode(mode)?;
    }
    if let Some(fill) = args.get_one::<f32>("fill-value") {
        config.fill_value = *fill;
    }

    if config.tile_x == 0 || config.tile_y == 0 {
        return Err(GeogridError::InvalidConfig("tile size must be positive".to_string()));
    }

    debug!("Effective configuration: {:?}", config);
    Ok(config)
}
