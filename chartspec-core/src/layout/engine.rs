use crate::layout::debounce::Debouncer;
use crate::layout::{
    derive_parent_size, exceeds_noise, LayoutConfig, LayoutContext, Measurement, ParentSize,
};
use log::debug;
use std::time::Instant;

/// Keeps the [`ParentSize`] of one renderer in step with its observed container.
///
/// The host feeds resize observations through [`LayoutEngine::observe`] and drives time with
/// [`LayoutEngine::poll`]. A new size is published only after the debounce quiet period and only
/// when it moves past the noise threshold.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    context: LayoutContext,
    config: LayoutConfig,
    debouncer: Debouncer<Measurement>,
    parent_size: Option<ParentSize>,
    connected: bool,
}

impl LayoutEngine {
    pub fn new(context: LayoutContext, config: LayoutConfig) -> Self {
        let debouncer = Debouncer::new(config.debounce_wait());
        Self {
            context,
            config,
            debouncer,
            parent_size: None,
            connected: true,
        }
    }

    pub fn context(&self) -> LayoutContext {
        self.context
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn parent_size(&self) -> Option<ParentSize> {
        self.parent_size
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Initial measurement at mount, applied without debouncing.
    /// Returns the stored size when it changed.
    pub fn mount(&mut self, measurement: Measurement) -> Option<ParentSize> {
        if !self.connected || measurement.is_empty() {
            debug!("Deferring mount measurement of an empty container");
            return None;
        }
        self.apply(measurement)
    }

    /// Record a resize observation. Empty rectangles are ignored.
    pub fn observe(&mut self, measurement: Measurement, now: Instant) {
        if !self.connected {
            return;
        }
        if measurement.is_empty() {
            debug!(
                "Ignoring empty measurement {}x{}",
                measurement.width, measurement.height
            );
            return;
        }
        self.debouncer.push(measurement, now);
    }

    /// Apply the last observation once the quiet period has elapsed.
    /// Returns the new size when it replaced the stored one.
    pub fn poll(&mut self, now: Instant) -> Option<ParentSize> {
        let measurement = self.debouncer.poll(now)?;
        self.apply(measurement)
    }

    /// When the host should call [`LayoutEngine::poll`] next
    pub fn next_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Stop observing. Pending observations are dropped and the stored size is kept.
    pub fn disconnect(&mut self) {
        self.connected = false;
        self.debouncer.cancel();
    }

    fn apply(&mut self, measurement: Measurement) -> Option<ParentSize> {
        let next = derive_parent_size(&measurement, self.context, &self.config);
        if exceeds_noise(
            self.parent_size.as_ref(),
            &next,
            self.config.noise_threshold,
        ) {
            debug!(
                "Parent size {}x{} accepted ({} context)",
                next.width, next.height, self.context
            );
            self.parent_size = Some(next);
            Some(next)
        } else {
            debug!(
                "Parent size {}x{} within noise threshold, suppressed",
                next.width, next.height
            );
            None
        }
    }
}
