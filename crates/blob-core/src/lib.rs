pub mod config;
pub mod constants;
pub mod control;
pub mod deformer;
pub mod error;
pub mod governor;
pub mod mapping;
pub mod pointer;
pub mod presets;
pub mod renderer;
pub mod shape;
pub mod state;

pub use config::*;
pub use control::*;
pub use deformer::*;
pub use error::*;
pub use governor::*;
pub use mapping::*;
pub use pointer::*;
pub use presets::Preset;
pub use renderer::*;
pub use shape::*;
pub use state::*;
