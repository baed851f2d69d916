pub mod api;
pub mod commands;
pub mod compression;
pub mod config;
pub mod errors;
pub mod geogrid;
pub mod io;
pub mod tiff;
pub mod utils;

pub use crate::api::GeogridTiler;
pub use crate::config::{ConversionConfig, ConversionMode};
pub use crate::errors::{GeogridError, GeogridResult};
pub use crate::geogrid::{GeogridConverter, GeogridIndex, RasterSource, RowOrder, Traversal};
pub use crate::tiff::TiffRaster;
