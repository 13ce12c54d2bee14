//! View identifiers and per-view scroll/selection state.
//!
//! Every view keeps its own [`ViewportEntry`] so switching away and back
//! preserves scroll position and row selection. The whole map lives in
//! one [`ViewportState`] owned by the input/render thread; the poll
//! thread never touches it.

use std::fmt;

/// One of the named display modes. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum View {
    /// Summary: counters, utilization, processes + workers digest.
    Main = 0,
    /// All queues with sizes and latency.
    Queues = 1,
    /// Worker processes (selectable).
    Processes = 2,
    /// In-flight jobs.
    Workers = 3,
    /// Retry set (selectable).
    Retries = 4,
    /// Scheduled set.
    Scheduled = 5,
    /// Dead set (selectable).
    Dead = 6,
    /// Pending jobs of one activated queue (selectable).
    QueueJobs = 7,
}

impl View {
    /// Number of views, for fixed-size per-view storage.
    pub const COUNT: usize = 8;

    /// Left/right navigation order. `QueueJobs` is reached only by
    /// activating a queue row, never by cycling.
    pub const CYCLE: [Self; 7] = [
        Self::Main,
        Self::Queues,
        Self::Processes,
        Self::Workers,
        Self::Retries,
        Self::Scheduled,
        Self::Dead,
    ];

    /// Whether up/down moves a row cursor instead of the viewport.
    #[must_use]
    pub const fn selectable(self) -> bool {
        matches!(
            self,
            Self::Processes | Self::Retries | Self::Dead | Self::QueueJobs
        )
    }

    /// Header title.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Main => "Overview",
            Self::Queues => "Queues",
            Self::Processes => "Processes",
            Self::Workers => "Busy Workers",
            Self::Retries => "Retries",
            Self::Scheduled => "Scheduled",
            Self::Dead => "Dead Jobs",
            Self::QueueJobs => "Queue",
        }
    }

    /// Next view in the left/right cycle. `QueueJobs` cycles from `Queues`.
    #[must_use]
    pub fn next(self) -> Self {
        let anchor = if self == Self::QueueJobs { Self::Queues } else { self };
        let i = Self::CYCLE.iter().position(|v| *v == anchor).unwrap_or(0);
        Self::CYCLE[(i + 1) % Self::CYCLE.len()]
    }

    /// Previous view in the left/right cycle.
    #[must_use]
    pub fn prev(self) -> Self {
        let anchor = if self == Self::QueueJobs { Self::Queues } else { self };
        let i = Self::CYCLE.iter().position(|v| *v == anchor).unwrap_or(0);
        Self::CYCLE[(i + Self::CYCLE.len() - 1) % Self::CYCLE.len()]
    }

    /// Reverse of the `repr(u8)` discriminant, for atomic view sharing.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Main),
            1 => Some(Self::Queues),
            2 => Some(Self::Processes),
            3 => Some(Self::Workers),
            4 => Some(Self::Retries),
            5 => Some(Self::Scheduled),
            6 => Some(Self::Dead),
            7 => Some(Self::QueueJobs),
            _ => None,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Scroll offset and selected row for one view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewportEntry {
    /// Index of the first visible row.
    pub scroll_offset: usize,
    /// Index of the selected row (meaningful only on selectable views).
    pub selected_index: usize,
}

/// The current view plus every view's retained scroll/selection memory.
#[derive(Debug, Clone)]
pub struct ViewportState {
    current: View,
    entries: [ViewportEntry; View::COUNT],
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            current: View::Main,
            entries: [ViewportEntry::default(); View::COUNT],
        }
    }
}

impl ViewportState {
    /// Minimum page size for PageUp/PageDown.
    pub const MIN_PAGE: usize = 5;

    /// Default page size for a terminal of `rows` lines.
    #[must_use]
    pub const fn default_page(rows: usize) -> usize {
        let page = rows.saturating_sub(8);
        if page < Self::MIN_PAGE { Self::MIN_PAGE } else { page }
    }

    /// The current view.
    #[must_use]
    pub const fn current(&self) -> View {
        self.current
    }

    /// Switch views. The departing view's offsets are retained.
    pub fn set_current(&mut self, view: View) {
        self.current = view;
    }

    /// The current view's entry.
    #[must_use]
    pub const fn entry(&self) -> ViewportEntry {
        self.entries[self.current as usize]
    }

    /// Entry for an arbitrary view.
    #[must_use]
    pub const fn entry_for(&self, view: View) -> ViewportEntry {
        self.entries[view as usize]
    }

    fn entry_mut(&mut self) -> &mut ViewportEntry {
        &mut self.entries[self.current as usize]
    }

    /// Scroll the viewport up one row.
    pub fn scroll_up(&mut self) {
        let e = self.entry_mut();
        e.scroll_offset = e.scroll_offset.saturating_sub(1);
    }

    /// Scroll the viewport down one row. Clamped against the item count
    /// at render time.
    pub fn scroll_down(&mut self) {
        self.entry_mut().scroll_offset += 1;
    }

    /// Move the selection up, or scroll on non-selectable views.
    pub fn select_up(&mut self) {
        if self.current.selectable() {
            let e = self.entry_mut();
            e.selected_index = e.selected_index.saturating_sub(1);
        } else {
            self.scroll_up();
        }
    }

    /// Move the selection down, or scroll on non-selectable views.
    pub fn select_down(&mut self) {
        if self.current.selectable() {
            self.entry_mut().selected_index += 1;
        } else {
            self.scroll_down();
        }
    }

    /// Page the selection (or viewport) up by `page` rows.
    pub fn page_up(&mut self, page: usize) {
        if self.current.selectable() {
            let e = self.entry_mut();
            e.selected_index = e.selected_index.saturating_sub(page);
        } else {
            let e = self.entry_mut();
            e.scroll_offset = e.scroll_offset.saturating_sub(page);
        }
    }

    /// Page the selection (or viewport) down by `page` rows.
    pub fn page_down(&mut self, page: usize) {
        if self.current.selectable() {
            self.entry_mut().selected_index += page;
        } else {
            self.entry_mut().scroll_offset += page;
        }
    }

    /// Reset the current view's scroll offset. Selection is untouched.
    pub fn reset(&mut self) {
        self.entry_mut().scroll_offset = 0;
    }

    /// Clamp the current view's offsets against live data dimensions and
    /// auto-follow the selection into the visible window.
    ///
    /// Called by the renderer before every frame, so offsets are always
    /// valid for the data actually drawn even when list sizes shrink
    /// between polls.
    pub fn clamp(&mut self, item_count: usize, visible_rows: usize) {
        let selectable = self.current.selectable();
        let e = self.entry_mut();
        e.scroll_offset = e.scroll_offset.min(item_count.saturating_sub(visible_rows));
        e.selected_index = e.selected_index.min(item_count.saturating_sub(1));
        if selectable && visible_rows > 0 {
            if e.selected_index < e.scroll_offset {
                e.scroll_offset = e.selected_index;
            } else if e.selected_index >= e.scroll_offset + visible_rows {
                e.scroll_offset = e.selected_index + 1 - visible_rows;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn cycle_wraps_both_directions() {
        assert_eq!(View::Main.next(), View::Queues);
        assert_eq!(View::Dead.next(), View::Main);
        assert_eq!(View::Main.prev(), View::Dead);
        assert_eq!(View::QueueJobs.next(), View::Processes);
        assert_eq!(View::QueueJobs.prev(), View::Main);
    }

    #[test]
    fn from_index_round_trips() {
        for view in [
            View::Main,
            View::Queues,
            View::Processes,
            View::Workers,
            View::Retries,
            View::Scheduled,
            View::Dead,
            View::QueueJobs,
        ] {
            assert_eq!(View::from_index(view as u8), Some(view));
        }
        assert_eq!(View::from_index(8), None);
    }

    #[test]
    fn selection_memory_survives_view_switch() {
        let mut vp = ViewportState::default();
        vp.set_current(View::Retries);
        vp.select_down();
        vp.select_down();
        vp.set_current(View::Queues);
        vp.scroll_down();
        vp.set_current(View::Retries);
        assert_eq!(vp.entry().selected_index, 2);
        assert_eq!(vp.entry_for(View::Queues).scroll_offset, 1);
    }

    #[test]
    fn select_delegates_to_scroll_on_plain_views() {
        let mut vp = ViewportState::default();
        vp.set_current(View::Workers);
        vp.select_down();
        vp.select_down();
        vp.select_up();
        let e = vp.entry();
        assert_eq!(e.scroll_offset, 1);
        assert_eq!(e.selected_index, 0);
    }

    #[test]
    fn reset_clears_offset_only() {
        let mut vp = ViewportState::default();
        vp.set_current(View::Dead);
        vp.select_down();
        vp.scroll_down();
        vp.reset();
        let e = vp.entry();
        assert_eq!(e.scroll_offset, 0);
        assert_eq!(e.selected_index, 1);
    }

    #[test]
    fn clamp_follows_selection_below_window() {
        let mut vp = ViewportState::default();
        vp.set_current(View::Processes);
        for _ in 0..12 {
            vp.select_down();
        }
        vp.clamp(20, 5);
        let e = vp.entry();
        assert_eq!(e.selected_index, 12);
        // Selection must sit inside [offset, offset + 5).
        assert_eq!(e.scroll_offset, 8);
    }

    #[test]
    fn clamp_follows_selection_above_window() {
        let mut vp = ViewportState::default();
        vp.set_current(View::Processes);
        for _ in 0..12 {
            vp.select_down();
        }
        vp.clamp(20, 5);
        for _ in 0..10 {
            vp.select_up();
        }
        vp.clamp(20, 5);
        let e = vp.entry();
        assert_eq!(e.selected_index, 2);
        assert_eq!(e.scroll_offset, 2);
    }

    #[test]
    fn clamp_handles_shrinking_data() {
        let mut vp = ViewportState::default();
        vp.set_current(View::Dead);
        for _ in 0..50 {
            vp.select_down();
        }
        vp.clamp(50, 10);
        vp.clamp(3, 10);
        let e = vp.entry();
        assert_eq!(e.selected_index, 2);
        assert_eq!(e.scroll_offset, 0);
    }

    #[test]
    fn clamp_empty_list_zeroes_everything() {
        let mut vp = ViewportState::default();
        vp.set_current(View::Retries);
        vp.select_down();
        vp.scroll_down();
        vp.clamp(0, 10);
        assert_eq!(vp.entry(), ViewportEntry::default());
    }

    #[test]
    fn default_page_floors_at_minimum() {
        assert_eq!(ViewportState::default_page(24), 16);
        assert_eq!(ViewportState::default_page(10), 5);
        assert_eq!(ViewportState::default_page(0), 5);
    }

    #[test]
    fn twenty_down_then_page_up_lands_low() {
        // 24-row terminal: default page is 16.
        let mut vp = ViewportState::default();
        vp.set_current(View::Processes);
        for _ in 0..20 {
            vp.select_down();
        }
        vp.page_up(ViewportState::default_page(24));
        assert!(vp.entry().selected_index < 10);
    }

    proptest! {
        #[test]
        fn clamp_invariants_hold(
            downs in 0usize..200,
            scrolls in 0usize..200,
            n in 0usize..150,
            visible in 0usize..60,
        ) {
            let mut vp = ViewportState::default();
            vp.set_current(View::Retries);
            for _ in 0..downs { vp.select_down(); }
            for _ in 0..scrolls { vp.scroll_down(); }
            vp.clamp(n, visible);
            let e = vp.entry();
            prop_assert!(e.scroll_offset <= n.saturating_sub(visible));
            prop_assert!(e.selected_index <= n.saturating_sub(1));
            if visible > 0 && n > 0 {
                prop_assert!(e.selected_index >= e.scroll_offset);
                prop_assert!(e.selected_index < e.scroll_offset + visible);
            }
        }
    }
}
