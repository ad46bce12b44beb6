pub mod color;
pub mod config;

pub use color::{HexColor, InvalidHexColor};
pub use config::EngineConfig;
