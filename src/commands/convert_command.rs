//! Raster to geogrid tiles conversion command

use std::path::PathBuf;

use clap::ArgMatches;
use log::info;

use crate::commands::command_traits::Command;
use crate::commands::{conversion_config, input_path};
use crate::config::ConversionConfig;
use crate::errors::GeogridResult;
use crate::geogrid::converter::GeogridConverter;
use crate::tiff::TiffRaster;
use crate::utils::logger::Logger;

pub struct ConvertCommand<'a> {
    input_file: PathBuf,
    output_dir: PathBuf,
    config: ConversionConfig,
    show_progress: bool,
    logger: &'a Logger,
}

impl<'a> ConvertCommand<'a> {
    pub fn new(args: &ArgMatches, logger: &'a Logger) -> GeogridResult<Self> {
        let input_file = input_path(args)?;
        let output_dir = match args.get_one::<String>("output") {
            Some(dir) => PathBuf::from(dir),
            None => default_output_dir(&input_file),
        };

        Ok(ConvertCommand {
            input_file,
            output_dir,
            config: conversion_config(args)?,
            show_progress: !args.get_flag("quiet"),
            logger,
        })
    }
}

/// `<input stem>_geogrid` in the working directory
fn default_output_dir(input: &std::path::Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "raster".to_string());
    PathBuf::from(format!("{}_geogrid", stem))
}

impl<'a> Command for ConvertCommand<'a> {
    fn execute(&self) -> GeogridResult<()> {
        info!(
            "Converting {} into {}",
            self.input_file.display(),
            self.output_dir.display()
        );
        self.logger.write_line(&format!("input: {}", self.input_file.display()))?;

        let mut raster = TiffRaster::open(&self.input_file)?;
        let converter = GeogridConverter::new(self.config.clone()).with_progress(self.show_progress);
        let summary = converter.run(&mut raster, &self.output_dir)?;

        self.logger.write_line(&format!(
            "output: {} ({} tiles, {} strip reads)",
            self.output_dir.display(),
            summary.tiles_written,
            summary.strips_read
        ))?;

        println!("{}", summary.index);
        println!(
            "Wrote {} tiles and index to {}",
            summary.tiles_written,
            self.output_dir.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_output_dir() {
        assert_eq!(default_output_dir(Path::new("/data/gmted2010.tif")), PathBuf::from("gmted2010_geogrid"));
    }
}
