//! Time-driven scalar values sampled by the renderer every frame.
//!
//! Time is passed in explicitly as seconds, so the host decides the clock
//! and tests can step it deterministically.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Easing {
    Linear,
    OutQuad,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::OutQuad => t * (2.0 - t),
        }
    }
}

/// One leg of a looping sequence: wait `delay`, then move to `to`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub to: f32,
    pub duration: f64,
    pub delay: f64,
    pub easing: Easing,
}

impl Segment {
    pub fn new(to: f32, duration: f64) -> Self {
        Self {
            to,
            duration,
            delay: 0.0,
            easing: Easing::Linear,
        }
    }

    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay;
        self
    }

    fn span(&self) -> f64 {
        self.delay.max(0.0) + self.duration.max(0.0)
    }
}

enum Motion {
    Timing {
        from: f32,
        to: f32,
        start: f64,
        duration: f64,
        easing: Easing,
    },
    Loop {
        origin: f32,
        segments: Vec<Segment>,
        start: f64,
        cycle: f64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(f32)>;

pub struct AnimatedValue {
    value: f32,
    motion: Option<Motion>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
}

impl AnimatedValue {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            motion: None,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_animating(&self) -> bool {
        self.motion.is_some()
    }

    /// Jumps to `value`, cancelling any running animation.
    pub fn set_value(&mut self, value: f32) {
        self.motion = None;
        self.update(value);
    }

    pub fn animate_to(&mut self, to: f32, duration: f64, easing: Easing, now: f64) {
        if duration <= 0.0 {
            self.set_value(to);
            return;
        }
        self.motion = Some(Motion::Timing {
            from: self.value,
            to,
            start: now,
            duration,
            easing,
        });
    }

    /// Repeats `segments` forever. The first pass starts from the current
    /// value, later passes from the last segment's target.
    pub fn loop_sequence(&mut self, segments: Vec<Segment>, now: f64) {
        let cycle = segments.iter().map(Segment::span).sum::<f64>();
        if cycle <= 0.0 {
            if let Some(last) = segments.last() {
                self.set_value(last.to);
            }
            return;
        }
        self.motion = Some(Motion::Loop {
            origin: self.value,
            segments,
            start: now,
            cycle,
        });
    }

    /// Advances to `now`, notifying listeners. Returns whether the value is
    /// still animating afterwards.
    pub fn tick(&mut self, now: f64) -> bool {
        let Some(motion) = self.motion.as_ref() else {
            return false;
        };

        let (value, finished) = match motion {
            Motion::Timing {
                from,
                to,
                start,
                duration,
                easing,
            } => {
                let t = ((now - start) / duration).clamp(0.0, 1.0) as f32;
                if t >= 1.0 {
                    (*to, true)
                } else {
                    (from + (to - from) * easing.apply(t), false)
                }
            }
            Motion::Loop {
                origin,
                segments,
                start,
                cycle,
            } => (sample_loop(*origin, segments, now - start, *cycle), false),
        };

        if finished {
            self.motion = None;
        }
        self.update(value);
        !finished
    }

    pub fn add_listener(&mut self, listener: impl FnMut(f32) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    fn update(&mut self, value: f32) {
        self.value = value;
        for (_, listener) in &mut self.listeners {
            listener(value);
        }
    }
}

fn sample_loop(origin: f32, segments: &[Segment], elapsed: f64, cycle: f64) -> f32 {
    let Some(last) = segments.last() else {
        return origin;
    };
    if elapsed <= 0.0 {
        return origin;
    }

    let pass = (elapsed / cycle).floor();
    let mut within = elapsed - pass * cycle;
    let mut from = if pass < 1.0 { origin } else { last.to };

    for segment in segments {
        let delay = segment.delay.max(0.0);
        if within < delay {
            return from;
        }
        within -= delay;

        let duration = segment.duration.max(0.0);
        if within < duration {
            let t = (within / duration) as f32;
            return from + (segment.to - from) * segment.easing.apply(t);
        }
        within -= duration;
        from = segment.to;
    }
    last.to
}
