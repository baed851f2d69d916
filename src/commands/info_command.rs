//! Raster inspection command
//!
//! Prints the TIFF structure and the tile grid a conversion would produce,
//! without writing anything.

use std::path::PathBuf;

use clap::ArgMatches;

use crate::api::describe_raster;
use crate::commands::command_traits::Command;
use crate::commands::{conversion_config, input_path};
use crate::config::ConversionConfig;
use crate::errors::GeogridResult;
use crate::utils::logger::Logger;

pub struct InfoCommand<'a> {
    input_file: PathBuf,
    config: ConversionConfig,
    verbose: bool,
    logger: &'a Logger,
}

impl<'a> InfoCommand<'a> {
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> GeogridResult<Self> {
        Ok(InfoCommand {
            input_file: input_path(args)?,
            config: conversion_config(args)?,
            verbose: args.get_flag("verbose"),
            logger,
        })
    }
}

impl<'a> Command for InfoCommand<'a> {
    fn execute(&self) -> GeogridResult<()> {
        let report = describe_raster(&self.input_file, &self.config, self.verbose)?;
        self.logger.write_line(&report)?;
        print!("{}", report);
        Ok(())
    }
}
