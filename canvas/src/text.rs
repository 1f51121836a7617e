//! Text layer: free-floating text elements drawn over the bitmap.
//!
//! Text is never rasterized into the bitmap and never enters raster history.
//! The host edits the string in a DOM editor and reports it back through
//! [`TextLayer::set_text`]; committing an element whose text is blank deletes it.

#[cfg(test)]
#[path = "text_test.rs"]
mod text_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::Point;
use crate::consts::{DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE};
use crate::raster::Color;

/// Unique identifier for a text element.
pub type TextId = Uuid;

/// Typography applied to newly created text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyle {
    pub font_size: f64,
    pub font_family: String,
    pub color: Color,
    pub opacity: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            font_family: DEFAULT_FONT_FAMILY.to_owned(),
            color: Color::BLACK,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextElement {
    pub id: TextId,
    pub text: String,
    /// World-space anchor (top-left of the first line).
    pub x: f64,
    pub y: f64,
    pub rotation: f64,
    pub font_size: f64,
    pub font_family: String,
    pub color: Color,
    pub opacity: f64,
    pub is_editing: bool,
}

/// Outcome of [`TextLayer::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The element keeps its text and leaves editing mode.
    Kept,
    /// The text was blank and the element was removed.
    Deleted,
    /// No element with that id.
    Missing,
}

#[derive(Debug, Default)]
pub struct TextLayer {
    items: Vec<TextElement>,
}

impl TextLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty element at `world` in editing state. Any other element
    /// still marked as editing leaves editing state.
    pub fn create(&mut self, world: Point, style: &TextStyle) -> TextId {
        for t in &mut self.items {
            t.is_editing = false;
        }
        let id = Uuid::new_v4();
        self.items.push(TextElement {
            id,
            text: String::new(),
            x: world.x,
            y: world.y,
            rotation: 0.0,
            font_size: style.font_size,
            font_family: style.font_family.clone(),
            color: style.color,
            opacity: style.opacity,
            is_editing: true,
        });
        id
    }

    /// Replace the text. Returns false for an unknown id.
    pub fn set_text(&mut self, id: &TextId, text: &str) -> bool {
        match self.get_mut(id) {
            Some(t) => {
                text.clone_into(&mut t.text);
                true
            }
            None => false,
        }
    }

    /// Leave editing state; blank text deletes the element.
    pub fn commit(&mut self, id: &TextId) -> CommitOutcome {
        let Some(idx) = self.items.iter().position(|t| t.id == *id) else {
            return CommitOutcome::Missing;
        };
        if self.items[idx].text.trim().is_empty() {
            self.items.remove(idx);
            log::debug!("blank text {id} removed on commit");
            return CommitOutcome::Deleted;
        }
        self.items[idx].is_editing = false;
        CommitOutcome::Kept
    }

    pub fn move_by(&mut self, id: &TextId, dx: f64, dy: f64) -> bool {
        match self.get_mut(id) {
            Some(t) => {
                t.x += dx;
                t.y += dy;
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, id: &TextId) -> Option<TextElement> {
        let idx = self.items.iter().position(|t| t.id == *id)?;
        Some(self.items.remove(idx))
    }

    #[must_use]
    pub fn get(&self, id: &TextId) -> Option<&TextElement> {
        self.items.iter().find(|t| t.id == *id)
    }

    fn get_mut(&mut self, id: &TextId) -> Option<&mut TextElement> {
        self.items.iter_mut().find(|t| t.id == *id)
    }

    /// The element currently in editing state.
    #[must_use]
    pub fn editing(&self) -> Option<TextId> {
        self.items.iter().find(|t| t.is_editing).map(|t| t.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextElement> {
        self.items.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
