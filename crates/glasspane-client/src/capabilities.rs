//! Platform capability check.

use tracing::error;

/// Platform features the client relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    /// Incremental media append (needed for video).
    pub media_source: bool,
    /// Unified pointer events (needed for input).
    pub pointer_events: bool,
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self {
            media_source: true,
            pointer_events: true,
        }
    }
}

impl PlatformCapabilities {
    /// Log every missing capability. The client keeps running without them.
    ///
    /// Returns the names of the missing capabilities.
    pub fn check(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if !self.media_source {
            error!(
                "this platform doesn't support incremental media append, \
                 required to play back the video stream; try upgrading"
            );
            missing.push("MediaSource");
        }
        if !self.pointer_events {
            error!("this platform doesn't support pointer events, input will not work; try upgrading");
            missing.push("PointerEvent");
        }
        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_missing() {
        assert!(PlatformCapabilities::default().check().is_empty());
        let caps = PlatformCapabilities {
            media_source: false,
            pointer_events: true,
        };
        assert_eq!(caps.check(), vec!["MediaSource"]);
    }
}
