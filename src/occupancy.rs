//! Occupancy debounce.
//!
//! PIR sensors drop their output between detections even while someone
//! is still in the room.  The filter keeps reporting "occupied" for
//! `hold_ticks` control ticks after the last raw detection so a single
//! missed sample does not fade the light out.
//!
//! ```text
//!  raw:       ▁▁██▁▁▁▁▁▁▁▁▁
//!  occupied:  ▁▁██████▁▁▁▁▁   (hold_ticks = 4)
//! ```

#[derive(Debug, Clone)]
pub struct OccupancyFilter {
    hold_ticks: u32,
    /// Ticks since the last raw detection; `None` if none is being held.
    since_seen: Option<u32>,
}

impl OccupancyFilter {
    pub fn new(hold_ticks: u32) -> Self {
        Self {
            hold_ticks,
            since_seen: None,
        }
    }

    /// Age the hold by one control tick.  Call once per tick, before
    /// [`observe`](Self::observe).
    pub fn advance(&mut self) {
        if let Some(n) = self.since_seen {
            self.since_seen = Some(n.saturating_add(1));
        }
    }

    /// Feed a raw sample and return the filtered occupancy.
    ///
    /// May be called several times within one tick (between ramp steps);
    /// only [`advance`](Self::advance) moves the hold forward.
    pub fn observe(&mut self, raw_present: bool) -> bool {
        if raw_present {
            self.since_seen = Some(0);
            return true;
        }
        self.is_held()
    }

    /// Drop any pending hold (used when the window suppresses motion).
    pub fn clear(&mut self) {
        self.since_seen = None;
    }

    pub fn hold_ticks(&self) -> u32 {
        self.hold_ticks
    }

    fn is_held(&self) -> bool {
        self.hold_ticks > 0 && matches!(self.since_seen, Some(n) if n <= self.hold_ticks)
    }
}
