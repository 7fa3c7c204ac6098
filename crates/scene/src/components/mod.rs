pub mod bounds;
pub mod node;
pub mod transform;

pub use bounds::*;
pub use node::*;
pub use transform::*;
