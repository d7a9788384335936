//! Scroll-position tracking for the table of contents.
//!
//! The webview reports a snapshot of rendered heading positions on every
//! scroll tick; the tracker decides which outline entry is active. It
//! considers every rendered heading tag, not just the ones that made it
//! into the outline tree.

use serde::Deserialize;

/// How far below the viewport top a heading may sit and still count as
/// scrolled past. Pixels, fixed.
pub const ACTIVE_THRESHOLD_PX: f64 = 100.0;

/// Read-only view of the rendered headings, in document order.
///
/// Implemented by the scroll snapshot the webview sends and by synthetic
/// surfaces in tests. `top_at` returning `None` means the element is gone
/// from the render tree; the tracker skips it for that pass.
pub trait HeadingPositions {
    fn len(&self) -> usize;
    fn id_at(&self, index: usize) -> &str;
    fn top_at(&self, index: usize) -> Option<f64>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Position report for a single rendered heading.
#[derive(Debug, Clone, Deserialize)]
pub struct HeadingPosition {
    pub id: String,
    pub top: Option<f64>,
}

/// One scroll tick's worth of rendered-heading geometry, as posted by the
/// embedded page script.
#[derive(Debug, Clone, Deserialize)]
pub struct ScrollSnapshot {
    pub scroll_top: f64,
    pub headings: Vec<HeadingPosition>,
}

impl HeadingPositions for ScrollSnapshot {
    fn len(&self) -> usize {
        self.headings.len()
    }

    fn id_at(&self, index: usize) -> &str {
        &self.headings[index].id
    }

    fn top_at(&self, index: usize) -> Option<f64> {
        self.headings[index].top
    }
}

/// Tracks which heading the reader is currently looking at.
///
/// State is written from exactly two places: scroll ticks and outline
/// clicks. A scroll tick that finds no heading above the threshold keeps
/// the previous answer rather than clearing it.
#[derive(Debug)]
pub struct TocTracker {
    threshold: f64,
    active_id: String,
}

impl TocTracker {
    pub fn new() -> Self {
        TocTracker {
            threshold: ACTIVE_THRESHOLD_PX,
            active_id: String::new(),
        }
    }

    pub fn active_id(&self) -> &str {
        &self.active_id
    }

    /// Recompute the active heading for the given scroll offset.
    ///
    /// One pass over the surface: the winner is the last heading in
    /// document order whose top edge is at or above the threshold line.
    /// Returns the new id only when it changed, so callers repaint at most
    /// once per change.
    pub fn on_scroll(
        &mut self,
        surface: &dyn HeadingPositions,
        scroll_top: f64,
    ) -> Option<&str> {
        let line = scroll_top + self.threshold;
        let mut current: Option<usize> = None;

        for i in 0..surface.len() {
            // A heading that vanished mid-pass is skipped, not an error.
            let Some(top) = surface.top_at(i) else { continue };
            if top <= line {
                current = Some(i);
            }
        }

        let id = match current {
            Some(i) => surface.id_at(i),
            None => return None,
        };

        if id != self.active_id {
            self.active_id = id.to_string();
            Some(&self.active_id)
        } else {
            None
        }
    }

    /// Outline click: the target becomes active immediately, ahead of any
    /// scroll event the ensuing smooth scroll will fire.
    pub fn activate(&mut self, id: &str) {
        self.active_id = id.to_string();
    }
}

impl Default for TocTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeSurface(Vec<(&'static str, Option<f64>)>);

    impl HeadingPositions for FakeSurface {
        fn len(&self) -> usize {
            self.0.len()
        }
        fn id_at(&self, index: usize) -> &str {
            self.0[index].0
        }
        fn top_at(&self, index: usize) -> Option<f64> {
            self.0[index].1
        }
    }

    fn surface() -> FakeSurface {
        FakeSurface(vec![
            ("intro", Some(0.0)),
            ("middle", Some(300.0)),
            ("end", Some(600.0)),
        ])
    }

    #[test]
    fn last_heading_above_threshold_wins() {
        let mut tracker = TocTracker::new();
        // Threshold line at 250 + 100 = 350: past "middle", before "end".
        assert_eq!(tracker.on_scroll(&surface(), 250.0), Some("middle"));
        assert_eq!(tracker.active_id(), "middle");
    }

    #[test]
    fn scrolling_to_the_bottom_activates_the_last_heading() {
        let mut tracker = TocTracker::new();
        assert_eq!(tracker.on_scroll(&surface(), 900.0), Some("end"));
    }

    #[test]
    fn heading_exactly_on_the_line_counts() {
        let mut tracker = TocTracker::new();
        // 200 + 100 == 300, inclusive.
        assert_eq!(tracker.on_scroll(&surface(), 200.0), Some("middle"));
    }

    #[test]
    fn no_change_reports_nothing() {
        let mut tracker = TocTracker::new();
        assert_eq!(tracker.on_scroll(&surface(), 250.0), Some("middle"));
        assert_eq!(tracker.on_scroll(&surface(), 260.0), None);
        assert_eq!(tracker.active_id(), "middle");
    }

    #[test]
    fn scrolling_above_the_first_heading_keeps_the_last_answer() {
        let mut tracker = TocTracker::new();
        let high = FakeSurface(vec![("intro", Some(400.0)), ("end", Some(800.0))]);
        assert_eq!(tracker.on_scroll(&high, 500.0), Some("intro"));
        // Back above everything: state stays put.
        assert_eq!(tracker.on_scroll(&high, 0.0), None);
        assert_eq!(tracker.active_id(), "intro");
    }

    #[test]
    fn empty_surface_never_sets_an_active_id() {
        let mut tracker = TocTracker::new();
        assert_eq!(tracker.on_scroll(&FakeSurface(vec![]), 1000.0), None);
        assert_eq!(tracker.active_id(), "");
    }

    #[test]
    fn vanished_elements_are_skipped_for_the_pass() {
        let mut tracker = TocTracker::new();
        let torn = FakeSurface(vec![
            ("intro", Some(0.0)),
            ("gone", None),
            ("end", Some(600.0)),
        ]);
        assert_eq!(tracker.on_scroll(&torn, 550.0), Some("intro"));
        // Recomputation keeps working on later passes.
        assert_eq!(tracker.on_scroll(&torn, 700.0), Some("end"));
    }

    #[test]
    fn click_activates_immediately() {
        let mut tracker = TocTracker::new();
        tracker.on_scroll(&surface(), 0.0);
        tracker.activate("end");
        assert_eq!(tracker.active_id(), "end");
    }

    #[test]
    fn snapshot_decodes_from_ipc_json() {
        let snapshot: ScrollSnapshot = serde_json::from_str(
            r#"{"scroll_top": 120.5, "headings": [{"id": "intro", "top": 0.0}, {"id": "gone", "top": null}]}"#,
        )
        .unwrap();
        assert_eq!(snapshot.scroll_top, 120.5);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.id_at(0), "intro");
        assert_eq!(snapshot.top_at(1), None);
    }
}
