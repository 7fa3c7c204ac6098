pub mod probe;
pub mod script;

pub use probe::{FrameRecord, LabelRecord, Probe};
pub use script::{Script, ScriptError, Step};
