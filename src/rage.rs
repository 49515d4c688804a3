//! Rage-click detection over a small ring of recent click points.

const RAGE_CLICK_RADIUS_PX: i32 = 30;
const RAGE_CLICK_WINDOW_MS: u64 = 1_000;
const RAGE_CLICK_COUNT: usize = 3;

#[derive(Debug, Default)]
pub struct RageClickRing {
    clicks: Vec<(i32, i32, u64)>,
}

impl RageClickRing {
    /// Record a click; returns true when it completes a rage-click burst.
    /// The ring resets after triggering so a fourth click starts over.
    pub fn record(&mut self, x: i32, y: i32, timestamp: u64) -> bool {
        if let Some(&(last_x, last_y, last_ts)) = self.clicks.last() {
            let close = (x - last_x).abs() + (y - last_y).abs() < RAGE_CLICK_RADIUS_PX;
            let recent = timestamp.saturating_sub(last_ts) < RAGE_CLICK_WINDOW_MS;
            if close && recent {
                self.clicks.push((x, y, timestamp));
                if self.clicks.len() >= RAGE_CLICK_COUNT {
                    self.clicks.clear();
                    return true;
                }
                return false;
            }
        }
        self.clicks = vec![(x, y, timestamp)];
        false
    }
}
