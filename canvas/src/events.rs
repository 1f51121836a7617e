//! Event subscription seam between the engine and its host environment.
//!
//! The engine never reaches for a global window object. A host hands it an
//! [`EventSource`] that can subscribe to named events, then feeds the events
//! it receives back as typed [`InputEvent`]s through `EngineCore::dispatch`.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::input::{Button, Key, Modifiers, WheelDelta};

/// DOM-style event names the engine listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventName {
    Resize,
    KeyDown,
    KeyUp,
    PointerDown,
    PointerMove,
    PointerUp,
    PointerLeave,
    Wheel,
    TouchStart,
    TouchMove,
    TouchEnd,
    ContextMenu,
}

impl EventName {
    /// Every event the engine routes.
    pub const ALL: [EventName; 12] = [
        Self::Resize,
        Self::KeyDown,
        Self::KeyUp,
        Self::PointerDown,
        Self::PointerMove,
        Self::PointerUp,
        Self::PointerLeave,
        Self::Wheel,
        Self::TouchStart,
        Self::TouchMove,
        Self::TouchEnd,
        Self::ContextMenu,
    ];

    /// The DOM event type string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::KeyDown => "keydown",
            Self::KeyUp => "keyup",
            Self::PointerDown => "pointerdown",
            Self::PointerMove => "pointermove",
            Self::PointerUp => "pointerup",
            Self::PointerLeave => "pointerleave",
            Self::Wheel => "wheel",
            Self::TouchStart => "touchstart",
            Self::TouchMove => "touchmove",
            Self::TouchEnd => "touchend",
            Self::ContextMenu => "contextmenu",
        }
    }
}

/// Handle returned by [`EventSource::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Something that can deliver named events to the engine.
pub trait EventSource {
    fn subscribe(&mut self, event: EventName) -> SubscriptionId;

    /// Returns false if `id` was not subscribed.
    fn unsubscribe(&mut self, id: SubscriptionId) -> bool;
}

/// A host event, already decoded into engine types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputEvent {
    Resize {
        width: f64,
        height: f64,
    },
    KeyDown {
        key: Key,
        #[serde(default)]
        modifiers: Modifiers,
    },
    KeyUp {
        key: Key,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerDown {
        screen: Point,
        button: Button,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        pressure: Option<f64>,
    },
    PointerMove {
        screen: Point,
        #[serde(default)]
        modifiers: Modifiers,
        #[serde(default)]
        pressure: Option<f64>,
    },
    PointerUp {
        screen: Point,
        button: Button,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerLeave {
        screen: Point,
    },
    Wheel {
        screen: Point,
        delta: WheelDelta,
        #[serde(default)]
        modifiers: Modifiers,
    },
    TouchStart {
        touches: Vec<Point>,
    },
    TouchMove {
        touches: Vec<Point>,
    },
    TouchEnd {
        touches: Vec<Point>,
    },
    ContextMenu,
}

impl InputEvent {
    #[must_use]
    pub fn name(&self) -> EventName {
        match self {
            Self::Resize { .. } => EventName::Resize,
            Self::KeyDown { .. } => EventName::KeyDown,
            Self::KeyUp { .. } => EventName::KeyUp,
            Self::PointerDown { .. } => EventName::PointerDown,
            Self::PointerMove { .. } => EventName::PointerMove,
            Self::PointerUp { .. } => EventName::PointerUp,
            Self::PointerLeave { .. } => EventName::PointerLeave,
            Self::Wheel { .. } => EventName::Wheel,
            Self::TouchStart { .. } => EventName::TouchStart,
            Self::TouchMove { .. } => EventName::TouchMove,
            Self::TouchEnd { .. } => EventName::TouchEnd,
            Self::ContextMenu => EventName::ContextMenu,
        }
    }
}
