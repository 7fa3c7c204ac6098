pub mod config;
pub mod indicator;
pub mod input;
pub mod orbit;
pub mod placement;

pub use config::OrbitConfig;
pub use indicator::{ElevationTone, Indicator};
pub use input::{Button, ControlInput, InputOutcome};
pub use orbit::{ControlsError, OrbitController, OrbitState};
pub use placement::CameraPlacement;
