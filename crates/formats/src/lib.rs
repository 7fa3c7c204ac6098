pub mod manifest;
pub mod package;
pub mod scene_loader;

pub use manifest::*;
pub use package::*;
pub use scene_loader::*;
