use std::time::Instant;

#[derive(Debug, Clone, Copy)]
enum Source {
    Realtime,
    Fixed(f32),
}

/// Frame timing: delta since the previous update and time since the first.
///
/// The first update always yields a zero delta. Later deltas are clamped to
/// `max_delta` so a stall (debugger, window drag) does not produce a jump.
#[derive(Debug, Clone)]
pub struct FrameClock {
    source: Source,
    max_delta: f32,
    start: Option<Instant>,
    last: Option<Instant>,
    delta: f32,
    elapsed: f32,
    frame: u64,
}

impl FrameClock {
    pub fn realtime(max_delta: f32) -> Self {
        Self::with_source(Source::Realtime, max_delta)
    }

    /// Deterministic clock advancing by `step` seconds per update.
    pub fn fixed(step: f32, max_delta: f32) -> Self {
        Self::with_source(Source::Fixed(step), max_delta)
    }

    fn with_source(source: Source, max_delta: f32) -> Self {
        Self {
            source,
            max_delta,
            start: None,
            last: None,
            delta: 0.0,
            elapsed: 0.0,
            frame: 0,
        }
    }

    pub fn update(&mut self) {
        let first = self.frame == 0;
        self.frame += 1;
        match self.source {
            Source::Fixed(step) => {
                self.delta = if first { 0.0 } else { step.min(self.max_delta) };
                self.elapsed += self.delta;
            }
            Source::Realtime => {
                let now = Instant::now();
                let (Some(start), Some(last)) = (self.start, self.last) else {
                    self.start = Some(now);
                    self.last = Some(now);
                    self.delta = 0.0;
                    self.elapsed = 0.0;
                    return;
                };
                self.delta = (now - last).as_secs_f32().min(self.max_delta);
                self.elapsed = (now - start).as_secs_f32();
                self.last = Some(now);
            }
        }
    }

    /// Seconds between the last two updates.
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Seconds since the first update.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Number of updates so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }
}
