//! Queue for dashboard events.
//!
//! Components that need to reach the metrics view (for example the navigation
//! bar asking every chart to reset its resolution) emit a [`DashboardEvent`]
//! here instead of calling into the view directly.

use std::collections::VecDeque;

use meter_client::domain::{Reading, Resolution};

use super::Chart;

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    /// The user picked a new resolution for one chart.
    SetResolution(Chart, Resolution),
    /// Put every chart back to its initial resolution.
    ResetResolutions,
    /// A fresh batch of readings arrived for the selected meter.
    ReadingsLoaded(Vec<Reading>),
}

#[derive(Debug, Default)]
pub struct EventBus {
    events: VecDeque<DashboardEvent>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: DashboardEvent) {
        self.events.push_back(event);
    }

    /// Remove and yield all queued events in FIFO order.
    pub fn drain(&mut self) -> impl Iterator<Item = DashboardEvent> + '_ {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}
