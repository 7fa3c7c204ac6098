use controls::{Button, ControlInput};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScriptError {
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("{command}: expected {expected}, got {got:?}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
        got: String,
    },
}

/// One scripted action.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Input(ControlInput),
    /// Pointer enters the label with this text.
    Hover(String),
    Unhover,
    /// Let this many frames run before the next step.
    Wait(u64),
}

/// Input script, e.g. `drag:120; wait:5; wheel:-1; press:zoom_in; hover:Moon Palace`.
///
/// Commands are separated by `;`. Steps between two `wait`s land on the same
/// frame, applied in order before the camera update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    pub steps: Vec<Step>,
}

impl Script {
    pub fn parse(src: &str) -> Result<Self, ScriptError> {
        let mut steps = Vec::new();
        for raw in src.split(';') {
            let cmd = raw.trim();
            if cmd.is_empty() {
                continue;
            }
            let (name, arg) = match cmd.split_once(':') {
                Some((n, a)) => (n.trim(), a.trim()),
                None => (cmd, ""),
            };
            match name {
                "down" => {
                    let (x, y) = point("down", arg)?;
                    steps.push(Step::Input(ControlInput::PointerDown { x, y }));
                }
                "move" => {
                    let (x, y) = point("move", arg)?;
                    steps.push(Step::Input(ControlInput::PointerMove { x, y }));
                }
                "up" => steps.push(Step::Input(ControlInput::PointerUp)),
                "drag" => {
                    let dx = number("drag", arg)?;
                    steps.push(Step::Input(ControlInput::PointerDown { x: 0.0, y: 0.0 }));
                    steps.push(Step::Input(ControlInput::PointerMove { x: dx, y: 0.0 }));
                    steps.push(Step::Input(ControlInput::PointerUp));
                }
                "wheel" | "shift-wheel" => {
                    let delta_y = number("wheel", arg)?;
                    steps.push(Step::Input(ControlInput::Wheel {
                        delta_y,
                        modifier: name == "shift-wheel",
                    }));
                }
                "press" => {
                    let button = button_named(arg).ok_or_else(|| ScriptError::BadArgument {
                        command: "press",
                        expected: "a button name",
                        got: arg.to_string(),
                    })?;
                    steps.push(Step::Input(ControlInput::Button(button)));
                }
                "key" => {
                    // `key:` alone is the space bar.
                    let key = if arg.is_empty() && cmd.ends_with(':') { " " } else { arg };
                    let button = Button::from_key(key).ok_or_else(|| ScriptError::BadArgument {
                        command: "key",
                        expected: "a bound key",
                        got: key.to_string(),
                    })?;
                    steps.push(Step::Input(ControlInput::Button(button)));
                }
                "hover" => {
                    if arg.is_empty() {
                        return Err(ScriptError::BadArgument {
                            command: "hover",
                            expected: "label text",
                            got: String::new(),
                        });
                    }
                    steps.push(Step::Hover(arg.to_string()));
                }
                "unhover" => steps.push(Step::Unhover),
                "wait" => {
                    let n = arg.parse::<u64>().map_err(|_| ScriptError::BadArgument {
                        command: "wait",
                        expected: "a frame count",
                        got: arg.to_string(),
                    })?;
                    steps.push(Step::Wait(n));
                }
                other => return Err(ScriptError::UnknownCommand(other.to_string())),
            }
        }
        Ok(Self { steps })
    }

    /// Steps grouped by the frame they apply on.
    pub fn timeline(&self) -> Vec<(u64, Step)> {
        let mut frame = 0u64;
        let mut out = Vec::new();
        for step in &self.steps {
            match step {
                Step::Wait(n) => frame = frame.saturating_add(*n),
                other => out.push((frame, other.clone())),
            }
        }
        out
    }

    /// Frames needed to reach every step.
    pub fn span(&self) -> u64 {
        let waited: u64 = self
            .steps
            .iter()
            .map(|s| match s {
                Step::Wait(n) => *n,
                _ => 0,
            })
            .fold(0u64, u64::saturating_add);
        waited.saturating_add(1)
    }
}

fn number(command: &'static str, arg: &str) -> Result<f64, ScriptError> {
    arg.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ScriptError::BadArgument {
            command,
            expected: "a number",
            got: arg.to_string(),
        })
}

fn point(command: &'static str, arg: &str) -> Result<(f64, f64), ScriptError> {
    let bad = || ScriptError::BadArgument {
        command,
        expected: "x,y",
        got: arg.to_string(),
    };
    let (x, y) = arg.split_once(',').ok_or_else(bad)?;
    let x = x.trim().parse::<f64>().map_err(|_| bad())?;
    let y = y.trim().parse::<f64>().map_err(|_| bad())?;
    Ok((x, y))
}

fn button_named(name: &str) -> Option<Button> {
    match name {
        "zoom_in" => Some(Button::ZoomIn),
        "zoom_out" => Some(Button::ZoomOut),
        "elevation_up" => Some(Button::ElevationUp),
        "elevation_down" => Some(Button::ElevationDown),
        "label_smaller" => Some(Button::LabelSmaller),
        "label_bigger" => Some(Button::LabelBigger),
        "toggle_auto_rotate" => Some(Button::ToggleAutoRotate),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn drag_expands_to_pointer_sequence() {
        let script = Script::parse("drag:120").expect("parse");
        assert_eq!(
            script.steps,
            vec![
                Step::Input(ControlInput::PointerDown { x: 0.0, y: 0.0 }),
                Step::Input(ControlInput::PointerMove { x: 120.0, y: 0.0 }),
                Step::Input(ControlInput::PointerUp),
            ]
        );
    }

    #[test]
    fn waits_shift_later_steps() {
        let script = Script::parse("press:zoom_in; wait:3; shift-wheel:-1; wait:2; unhover").expect("parse");
        let timeline = script.timeline();
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline[0].0, 0);
        assert_eq!(
            timeline[1],
            (3, Step::Input(ControlInput::Wheel { delta_y: -1.0, modifier: true }))
        );
        assert_eq!(timeline[2], (5, Step::Unhover));
        assert_eq!(script.span(), 6);
    }

    #[test]
    fn keys_resolve_through_bindings() {
        let script = Script::parse("key:+; key:PageDown").expect("parse");
        assert_eq!(
            script.steps,
            vec![
                Step::Input(ControlInput::Button(Button::ZoomIn)),
                Step::Input(ControlInput::Button(Button::ElevationDown)),
            ]
        );
    }

    #[test]
    fn hover_keeps_inner_spaces() {
        let script = Script::parse(" hover: Moon Palace ;").expect("parse");
        assert_eq!(script.steps, vec![Step::Hover("Moon Palace".to_string())]);
    }

    #[test]
    fn empty_script_spans_one_frame() {
        let script = Script::parse("  ; ;").expect("parse");
        assert!(script.steps.is_empty());
        assert_eq!(script.span(), 1);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!(
            Script::parse("spin:4"),
            Err(ScriptError::UnknownCommand("spin".to_string()))
        );
        assert!(matches!(
            Script::parse("wheel:fast"),
            Err(ScriptError::BadArgument { command: "wheel", .. })
        ));
        assert!(matches!(
            Script::parse("down:10"),
            Err(ScriptError::BadArgument { command: "down", .. })
        ));
        assert!(matches!(
            Script::parse("press:warp"),
            Err(ScriptError::BadArgument { command: "press", .. })
        ));
    }
}
