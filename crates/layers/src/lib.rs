pub mod compass;
pub mod labels;
pub mod overlay;
pub mod projection;

pub use compass::CompassRules;
pub use labels::*;
pub use overlay::*;
pub use projection::{FrameView, HiddenReason, LabelLayout, Placement, Projector};
