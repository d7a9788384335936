//! Per-document state: one `DocumentView` per mounted window.

use crate::outline::{self, HeadingNode};
use crate::tracker::TocTracker;

/// Everything the viewer knows about the currently displayed document.
/// Loading a new document rebuilds the outline from scratch and resets the
/// tracker; nothing survives from the previous document.
#[derive(Debug)]
pub struct DocumentView {
    outline: Vec<HeadingNode>,
    tracker: TocTracker,
}

impl DocumentView {
    pub fn new(markdown: &str) -> Self {
        DocumentView {
            outline: outline::outline_of(markdown),
            tracker: TocTracker::new(),
        }
    }

    pub fn load(&mut self, markdown: &str) {
        self.outline = outline::outline_of(markdown);
        self.tracker = TocTracker::new();
    }

    pub fn outline(&self) -> &[HeadingNode] {
        &self.outline
    }

    pub fn tracker_mut(&mut self) -> &mut TocTracker {
        &mut self.tracker
    }

    pub fn active_id(&self) -> &str {
        self.tracker.active_id()
    }
}
