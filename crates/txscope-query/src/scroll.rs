//! Scroll-triggered pagination
//!
//! Works on plain measurements so any front end (or a test) can feed it.

use txscope_config::ScrollConfig;

use crate::cache::{FetchHandle, TransactionQuery};

/// One reading of the scroll container
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    /// Offset of the top of the viewport
    pub scroll_top: f64,
    /// Total content height
    pub scroll_height: f64,
    /// Visible height
    pub viewport_height: f64,
}

impl ScrollMetrics {
    pub fn new(scroll_top: f64, scroll_height: f64, viewport_height: f64) -> Self {
        Self {
            scroll_top,
            scroll_height,
            viewport_height,
        }
    }

    /// Fraction of the content scrolled past the bottom edge of the viewport
    pub fn scrolled_fraction(&self) -> f64 {
        if self.scroll_height <= 0.0 {
            return 1.0;
        }
        ((self.scroll_top + self.viewport_height) / self.scroll_height).clamp(0.0, 1.0)
    }

    /// Content fits without scrolling
    pub fn fits_viewport(&self) -> bool {
        self.scroll_height <= self.viewport_height
    }
}

/// Something that can load one more page
pub trait PaginationTarget {
    fn has_more(&self) -> bool;
    /// A fetch for the active key is outstanding
    fn is_fetching(&self) -> bool;
    fn request_next(&self) -> Option<FetchHandle>;
}

impl PaginationTarget for TransactionQuery {
    fn has_more(&self) -> bool {
        self.snapshot().has_more
    }

    fn is_fetching(&self) -> bool {
        self.snapshot().is_fetching()
    }

    fn request_next(&self) -> Option<FetchHandle> {
        TransactionQuery::request_next(self)
    }
}

/// Requests the next page when the reader nears the end of the list
#[derive(Debug, Clone, Copy)]
pub struct ScrollLoader {
    threshold: f64,
}

impl Default for ScrollLoader {
    fn default() -> Self {
        Self::from(&ScrollConfig::default())
    }
}

impl From<&ScrollConfig> for ScrollLoader {
    fn from(config: &ScrollConfig) -> Self {
        Self::new(config.threshold)
    }
}

impl ScrollLoader {
    /// `threshold` is clamped into (0, 1]
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_finite() && threshold > 0.0 {
            threshold.min(1.0)
        } else {
            1.0
        };
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Handle a scroll event
    pub fn on_scroll(&self, metrics: &ScrollMetrics, target: &dyn PaginationTarget) -> Option<FetchHandle> {
        if metrics.scrolled_fraction() < self.threshold {
            return None;
        }
        self.trigger(target, "scroll")
    }

    /// Handle a content change; keeps loading while the list is shorter than the viewport
    pub fn on_content_change(&self, metrics: &ScrollMetrics, target: &dyn PaginationTarget) -> Option<FetchHandle> {
        if !metrics.fits_viewport() {
            return None;
        }
        self.trigger(target, "short content")
    }

    fn trigger(&self, target: &dyn PaginationTarget, reason: &str) -> Option<FetchHandle> {
        if target.is_fetching() || !target.has_more() {
            return None;
        }
        let handle = target.request_next()?;
        log::debug!("Next page requested ({})", reason);
        Some(handle)
    }
}
