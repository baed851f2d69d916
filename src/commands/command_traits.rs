//! Command pattern interfaces for the CLI

use crate::errors::GeogridResult;
use crate::utils::logger::Logger;

/// One executable CLI operation
pub trait Command {
    fn execute(&self) -> GeogridResult<()>;
}

/// Chooses and builds the command for a set of parsed arguments
pub trait CommandFactory<'a> {
    fn create_command(&self, args: &clap::ArgMatches, logger: &'a Logger) -> GeogridResult<Box<dyn Command + 'a>>;
}
