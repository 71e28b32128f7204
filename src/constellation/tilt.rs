use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use eframe::egui::{Pos2, Vec2, vec2};
use log::info;

use super::viewport::ViewportSize;

const ORIENTATION_RANGE_DEG: f32 = 45.0;

/// Raw sensor or pointer sample as delivered by the platform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TiltReading {
    /// Device orientation angles in degrees; missing axes read as zero.
    Orientation {
        gamma: Option<f32>,
        beta: Option<f32>,
    },
    Pointer {
        position: Pos2,
        viewport: ViewportSize,
    },
    /// Accelerometer sample in g, stamped with seconds.
    Motion { x: f32, y: f32, timestamp: f64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TiltSourceKind {
    Orientation,
    Pointer,
    Accelerometer,
    Disabled,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlatformCapabilities {
    pub orientation: bool,
    pub pointer: bool,
    pub accelerometer: bool,
}

impl PlatformCapabilities {
    pub fn preferred_tilt(self) -> TiltSourceKind {
        if self.orientation {
            TiltSourceKind::Orientation
        } else if self.pointer {
            TiltSourceKind::Pointer
        } else if self.accelerometer {
            TiltSourceKind::Accelerometer
        } else {
            TiltSourceKind::Disabled
        }
    }
}

pub type TiltListener = Box<dyn FnMut(Vec2)>;

#[derive(Default)]
struct ListenerTable {
    next_id: u64,
    listeners: Vec<(u64, TiltListener)>,
}

/// Keeps a listener registered; dropping it unsubscribes.
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    table: Weak<RefCell<ListenerTable>>,
    id: u64,
}

impl Subscription {
    fn inert() -> Self {
        Self {
            table: Weak::new(),
            id: 0,
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(table) = self.table.upgrade() else {
            return;
        };
        if let Ok(mut table) = table.try_borrow_mut() {
            table.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Emits a 2-axis offset in `[-strength, strength]` to subscribers.
pub trait TiltSource {
    fn kind(&self) -> TiltSourceKind;
    fn subscribe(&self, listener: TiltListener) -> Subscription;
    /// Feeds one platform sample. Samples of another kind are ignored.
    fn feed(&mut self, reading: TiltReading);
}

#[derive(Clone, Default)]
struct Emitter {
    table: Rc<RefCell<ListenerTable>>,
}

impl Emitter {
    fn subscribe(&self, listener: TiltListener) -> Subscription {
        let mut table = self.table.borrow_mut();
        let id = table.next_id;
        table.next_id += 1;
        table.listeners.push((id, listener));
        Subscription {
            table: Rc::downgrade(&self.table),
            id,
        }
    }

    fn emit(&self, normalized: Vec2, strength: f32) {
        let offset = vec2(
            normalized.x.clamp(-1.0, 1.0),
            normalized.y.clamp(-1.0, 1.0),
        ) * strength;
        for (_, listener) in &mut self.table.borrow_mut().listeners {
            listener(offset);
        }
    }
}

pub struct OrientationTilt {
    emitter: Emitter,
    strength: f32,
}

impl TiltSource for OrientationTilt {
    fn kind(&self) -> TiltSourceKind {
        TiltSourceKind::Orientation
    }

    fn subscribe(&self, listener: TiltListener) -> Subscription {
        self.emitter.subscribe(listener)
    }

    fn feed(&mut self, reading: TiltReading) {
        if let TiltReading::Orientation { gamma, beta } = reading {
            let normalized = vec2(
                gamma.unwrap_or(0.0) / ORIENTATION_RANGE_DEG,
                beta.unwrap_or(0.0) / ORIENTATION_RANGE_DEG,
            );
            self.emitter.emit(normalized, self.strength);
        }
    }
}

pub struct PointerTilt {
    emitter: Emitter,
    strength: f32,
}

impl TiltSource for PointerTilt {
    fn kind(&self) -> TiltSourceKind {
        TiltSourceKind::Pointer
    }

    fn subscribe(&self, listener: TiltListener) -> Subscription {
        self.emitter.subscribe(listener)
    }

    fn feed(&mut self, reading: TiltReading) {
        let TiltReading::Pointer { position, viewport } = reading else {
            return;
        };
        if !viewport.is_known() {
            return;
        }
        let normalized = vec2(
            position.x / viewport.width * 2.0 - 1.0,
            position.y / viewport.height * 2.0 - 1.0,
        );
        self.emitter.emit(normalized, self.strength);
    }
}

/// Accelerometer tilt; samples closer together than `min_interval` are
/// dropped.
pub struct AccelerometerTilt {
    emitter: Emitter,
    strength: f32,
    min_interval: f64,
    last_sample: Option<f64>,
}

impl TiltSource for AccelerometerTilt {
    fn kind(&self) -> TiltSourceKind {
        TiltSourceKind::Accelerometer
    }

    fn subscribe(&self, listener: TiltListener) -> Subscription {
        self.emitter.subscribe(listener)
    }

    fn feed(&mut self, reading: TiltReading) {
        let TiltReading::Motion { x, y, timestamp } = reading else {
            return;
        };
        if self
            .last_sample
            .is_some_and(|last| timestamp - last < self.min_interval)
        {
            return;
        }
        self.last_sample = Some(timestamp);
        self.emitter.emit(vec2(x, -y), self.strength);
    }
}

/// Stand-in when the platform offers no tilt input at all.
pub struct DisabledTilt;

impl TiltSource for DisabledTilt {
    fn kind(&self) -> TiltSourceKind {
        TiltSourceKind::Disabled
    }

    fn subscribe(&self, _listener: TiltListener) -> Subscription {
        Subscription::inert()
    }

    fn feed(&mut self, _reading: TiltReading) {}
}

pub fn create_tilt_source(
    capabilities: PlatformCapabilities,
    strength: f32,
    min_interval: f64,
) -> Box<dyn TiltSource> {
    let kind = capabilities.preferred_tilt();
    info!("event=tilt_source kind={kind:?}");
    let emitter = Emitter::default();
    match kind {
        TiltSourceKind::Orientation => Box::new(OrientationTilt { emitter, strength }),
        TiltSourceKind::Pointer => Box::new(PointerTilt { emitter, strength }),
        TiltSourceKind::Accelerometer => Box::new(AccelerometerTilt {
            emitter,
            strength,
            min_interval,
            last_sample: None,
        }),
        TiltSourceKind::Disabled => Box::new(DisabledTilt),
    }
}

/// Latest tilt offset, kept current by a subscription on the source.
pub struct TiltState {
    source: Box<dyn TiltSource>,
    offset: Rc<Cell<Vec2>>,
    subscription: Option<Subscription>,
}

impl TiltState {
    pub fn attach(source: Box<dyn TiltSource>) -> Self {
        let offset = Rc::new(Cell::new(Vec2::ZERO));
        let sink = Rc::clone(&offset);
        let subscription = source.subscribe(Box::new(move |value: Vec2| sink.set(value)));
        Self {
            source,
            offset,
            subscription: Some(subscription),
        }
    }

    pub fn kind(&self) -> TiltSourceKind {
        self.source.kind()
    }

    pub fn feed(&mut self, reading: TiltReading) {
        self.source.feed(reading);
    }

    pub fn offset(&self) -> Vec2 {
        self.offset.get()
    }

    /// Releases the subscription; later samples no longer move the offset.
    pub fn detach(&mut self) {
        self.subscription = None;
        self.offset.set(Vec2::ZERO);
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    fn state(capabilities: PlatformCapabilities) -> TiltState {
        TiltState::attach(create_tilt_source(capabilities, 24.0, 0.033))
    }

    #[test]
    fn capability_order_prefers_orientation_then_pointer() {
        let all = PlatformCapabilities {
            orientation: true,
            pointer: true,
            accelerometer: true,
        };
        assert_eq!(all.preferred_tilt(), TiltSourceKind::Orientation);
        let no_orientation = PlatformCapabilities {
            orientation: false,
            ..all
        };
        assert_eq!(no_orientation.preferred_tilt(), TiltSourceKind::Pointer);
        let motion_only = PlatformCapabilities {
            accelerometer: true,
            ..PlatformCapabilities::default()
        };
        assert_eq!(motion_only.preferred_tilt(), TiltSourceKind::Accelerometer);
        assert_eq!(
            PlatformCapabilities::default().preferred_tilt(),
            TiltSourceKind::Disabled
        );
    }

    #[test]
    fn orientation_is_normalized_and_clamped() {
        let mut tilt = state(PlatformCapabilities {
            orientation: true,
            ..Default::default()
        });
        tilt.feed(TiltReading::Orientation {
            gamma: Some(22.5),
            beta: Some(-90.0),
        });
        assert_eq!(tilt.offset(), vec2(12.0, -24.0));

        tilt.feed(TiltReading::Orientation {
            gamma: None,
            beta: None,
        });
        assert_eq!(tilt.offset(), Vec2::ZERO);
    }

    #[test]
    fn pointer_maps_viewport_to_unit_square() {
        let mut tilt = state(PlatformCapabilities {
            pointer: true,
            ..Default::default()
        });
        let viewport = ViewportSize::new(400.0, 800.0);
        tilt.feed(TiltReading::Pointer {
            position: pos2(400.0, 200.0),
            viewport,
        });
        assert_eq!(tilt.offset(), vec2(24.0, -12.0));

        tilt.feed(TiltReading::Pointer {
            position: pos2(10.0, 10.0),
            viewport: ViewportSize::new(0.0, 0.0),
        });
        assert_eq!(tilt.offset(), vec2(24.0, -12.0));
    }

    #[test]
    fn accelerometer_inverts_y_and_throttles() {
        let mut tilt = state(PlatformCapabilities {
            accelerometer: true,
            ..Default::default()
        });
        tilt.feed(TiltReading::Motion {
            x: 0.5,
            y: 0.25,
            timestamp: 1.0,
        });
        assert_eq!(tilt.offset(), vec2(12.0, -6.0));

        tilt.feed(TiltReading::Motion {
            x: 2.0,
            y: 0.0,
            timestamp: 1.01,
        });
        assert_eq!(tilt.offset(), vec2(12.0, -6.0));

        tilt.feed(TiltReading::Motion {
            x: 2.0,
            y: 0.0,
            timestamp: 1.05,
        });
        assert_eq!(tilt.offset(), vec2(24.0, 0.0));
    }

    #[test]
    fn mismatched_readings_and_disabled_source_are_no_ops() {
        let mut orientation = state(PlatformCapabilities {
            orientation: true,
            ..Default::default()
        });
        orientation.feed(TiltReading::Motion {
            x: 1.0,
            y: 1.0,
            timestamp: 0.0,
        });
        assert_eq!(orientation.offset(), Vec2::ZERO);

        let mut disabled = state(PlatformCapabilities::default());
        disabled.feed(TiltReading::Orientation {
            gamma: Some(45.0),
            beta: Some(45.0),
        });
        assert_eq!(disabled.kind(), TiltSourceKind::Disabled);
        assert_eq!(disabled.offset(), Vec2::ZERO);
    }

    #[test]
    fn detach_stops_updates() {
        let mut tilt = state(PlatformCapabilities {
            orientation: true,
            ..Default::default()
        });
        tilt.detach();
        tilt.feed(TiltReading::Orientation {
            gamma: Some(45.0),
            beta: Some(0.0),
        });
        assert_eq!(tilt.offset(), Vec2::ZERO);
    }

    #[test]
    fn dropping_subscription_unregisters_listener() {
        let mut source = create_tilt_source(
            PlatformCapabilities {
                orientation: true,
                ..Default::default()
            },
            24.0,
            0.0,
        );
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let subscription = source.subscribe(Box::new(move |_: Vec2| counter.set(counter.get() + 1)));

        source.feed(TiltReading::Orientation {
            gamma: Some(1.0),
            beta: None,
        });
        drop(subscription);
        source.feed(TiltReading::Orientation {
            gamma: Some(1.0),
            beta: None,
        });
        assert_eq!(hits.get(), 1);
    }
}
