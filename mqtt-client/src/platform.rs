use std::collections::HashSet;

/// Replaces the source's global `ESP32`/`SONOFF` flags with an explicit,
/// passed-in value — no process-wide mutable state.
#[derive(Debug, Clone)]
pub struct PlatformProfile {
    /// Transient OS error codes this platform raises in addition to the
    /// baseline [`crate::socket::BUSY_ERRORS`] set.
    pub extra_busy_errors: HashSet<i32>,
    /// Mandatory yield inserted after a socket read, giving an underlying
    /// RTOS time to deliver buffered bytes. Zero disables it.
    pub post_read_pause_ms: u64,
    /// Some link implementations need a yield between polls of their DHCP
    /// state machine during bring-up; irrelevant on hosted platforms.
    pub requires_yield_between_dhcp_polls: bool,
}

impl Default for PlatformProfile {
    fn default() -> Self {
        Self {
            extra_busy_errors: HashSet::new(),
            post_read_pause_ms: 0,
            requires_yield_between_dhcp_polls: false,
        }
    }
}

impl PlatformProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extra_busy_errors(mut self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.extra_busy_errors.extend(codes);
        self
    }

    pub fn with_post_read_pause_ms(mut self, ms: u64) -> Self {
        self.post_read_pause_ms = ms;
        self
    }
}
