//! Helpers shared across modules

pub mod logger;
pub mod progress;
pub(crate) mod format_utils;
pub(crate) mod ifd_utils;
pub(crate) mod tag_utils;
