//! Configuration model for chm.
//!
//! `chm_config.yaml` lives in the state directory. A missing file, an empty
//! file, or a file with only some keys all work; unset keys fall back to
//! defaults and unknown keys are ignored.

mod model;
mod operations;


pub use model::{ChassisConfig, Config};
