pub mod camera;
pub mod components;
pub mod entity;
pub mod world;

pub use camera::*;
pub use entity::*;
pub use world::*;
