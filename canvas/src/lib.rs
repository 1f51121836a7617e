//! Drawing engine for the math whiteboard.
//!
//! This crate is compiled to WebAssembly and runs in the browser. It owns the
//! infinite-canvas viewport, the raster bitmap strokes are painted into, the
//! undo history, the optional vector element and text layers, and the minimap.
//! The host JavaScript layer drives a [`bindings::Board`], forwarding DOM
//! events and reacting to the returned [`engine::Action`]s; the bitmap leaves
//! the engine as a PNG data URL for analysis.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`bindings`] | `Board`, the class exported to JavaScript |
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`camera`] | Viewport value and screen/world conversions |
//! | [`viewport`] | Pan/zoom controller, listeners and smooth-pan animation |
//! | [`raster`] | Bitmap surface, stroke compositing, snapshots and PNG export |
//! | [`drawing`] | Brushes and live stroke rendering |
//! | [`history`] | Linear undo/redo log |
//! | [`elements`] | Vector drawing elements, selection and layout |
//! | [`text`] | Text elements and their edit lifecycle |
//! | [`minimap`] | Throttled overview image and viewport indicator |
//! | [`input`] | Tools, modifiers and the gesture state machine |
//! | [`events`] | Event names, the subscription seam and decoded host events |
//! | [`render`] | Scene rendering onto a 2D context |
//! | [`error`] | Crate error type |
//! | [`consts`] | Shared numeric constants (zoom limits, brush sizes, etc.) |

pub mod bindings;
pub mod camera;
pub mod consts;
pub mod drawing;
pub mod elements;
pub mod engine;
pub mod error;
pub mod events;
pub mod history;
pub mod input;
pub mod minimap;
pub mod raster;
pub mod render;
pub mod text;
pub mod viewport;
