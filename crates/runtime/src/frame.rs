use foundation::time::Time;

/// Display-frame metadata handed to every pipeline stage.
///
/// Time is derived from the index and the nominal refresh interval, not from
/// the wall clock, so a recorded input script replays to the same frames.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Nominal refresh interval (seconds).
    pub dt_s: f64,
    /// Time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }
}

#[cfg(test)]
mod tests {
    use super::Frame;
    use foundation::time::Time;

    #[test]
    fn time_follows_index() {
        let f = Frame::new(120, 1.0 / 60.0);
        assert_eq!(f.time, Time(120.0 / 60.0));
        assert!(!f.is_first());
    }

    #[test]
    fn next_keeps_interval() {
        let f0 = Frame::new(0, 0.5);
        assert!(f0.is_first());
        let f1 = f0.next();
        assert_eq!(f1.index, 1);
        assert_eq!(f1.dt_s, 0.5);
        assert_eq!(f1.time, Time(0.5));
    }
}
