/// Follow-newest decision for a message viewport
///
/// A reader who has scrolled up to re-read history must not be yanked to
/// the bottom by a poll tick; a reader already at (or near) the bottom
/// expects to follow new messages. The one exception is the viewer's own
/// outgoing message, which always pins the view to the bottom.
const NEAR_BOTTOM_DEFAULT: u64 = 100;

#[derive(Debug, Clone)]
pub struct ScrollAnchor {
    follow: bool,
    threshold: u64,
}

impl Default for ScrollAnchor {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollAnchor {
    /// Starts following, matching a freshly opened thread view.
    pub fn new() -> Self {
        Self::with_threshold(NEAR_BOTTOM_DEFAULT)
    }

    /// Custom near-bottom distance, in whatever unit the view measures
    /// (pixels for a browser-like surface, rows for a terminal).
    pub fn with_threshold(threshold: u64) -> Self {
        Self {
            follow: true,
            threshold,
        }
    }

    /// Recompute on every scroll event: near-bottom means within
    /// `threshold` units of the end of the content.
    pub fn observe(&mut self, scroll_top: u64, viewport: u64, content: u64) {
        self.follow = scroll_top + viewport >= content.saturating_sub(self.threshold);
    }

    /// Whether newly rendered messages should scroll the view to the end.
    pub fn should_follow(&self) -> bool {
        self.follow
    }

    /// The viewer's own message always lands in view.
    pub fn pin_to_bottom(&mut self) {
        self.follow = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn near_bottom_boundary_is_inclusive() {
        let mut anchor = ScrollAnchor::new();
        // 1000 units of content in a 300-unit viewport: bottom edge at
        // scroll_top 700, threshold reaches up to 600.
        anchor.observe(600, 300, 1000);
        assert!(anchor.should_follow());

        anchor.observe(599, 300, 1000);
        assert!(!anchor.should_follow());
    }

    #[test]
    fn short_content_always_follows() {
        let mut anchor = ScrollAnchor::new();
        anchor.observe(0, 300, 80);
        assert!(anchor.should_follow());
    }

    #[test]
    fn own_message_overrides_scrolled_up_reader() {
        let mut anchor = ScrollAnchor::new();
        anchor.observe(0, 300, 1000);
        assert!(!anchor.should_follow());

        anchor.pin_to_bottom();
        assert!(anchor.should_follow());
    }

    #[test]
    fn starts_following() {
        assert!(ScrollAnchor::new().should_follow());
    }

    #[test]
    fn custom_threshold_for_row_based_views() {
        let mut anchor = ScrollAnchor::with_threshold(3);
        anchor.observe(17, 10, 30);
        assert!(anchor.should_follow());
        anchor.observe(16, 10, 30);
        assert!(!anchor.should_follow());
    }
}
