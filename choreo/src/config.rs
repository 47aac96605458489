//! Fixture configuration and its defaults.

use crate::time::LogicalTime;

/// Default configuration for a saga test fixture
#[derive(Debug, Clone)]
pub struct FixtureConfig {
    /// Logical time the fixture clock starts at
    pub start_time: LogicalTime,

    /// Deliver events published by the saga back to the saga itself
    pub redeliver_published_events: bool,

    /// Maximum number of events delivered for one trigger, cascades included
    pub max_cascade: usize,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            start_time: LogicalTime::EPOCH,
            redeliver_published_events: REDELIVER_PUBLISHED_EVENTS,
            max_cascade: MAX_CASCADE,
        }
    }
}

/// Whether published events loop back into the saga under test.
///
/// Off by default: published events are only recorded, the way an event bus
/// without the saga subscribed would see them.
pub const REDELIVER_PUBLISHED_EVENTS: bool = false;

/// Upper bound on deliveries caused by a single trigger.
///
/// Only reachable with redelivery enabled, where a saga publishing in
/// response to its own events would otherwise loop forever.
pub const MAX_CASCADE: usize = 1000;

#[derive(Debug)]
pub struct ConfigBuilder {
    config: FixtureConfig,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: FixtureConfig::default(),
        }
    }

    pub fn start_time(mut self, time: LogicalTime) -> Self {
        self.config.start_time = time;
        self
    }

    pub fn redeliver_published_events(mut self, value: bool) -> Self {
        self.config.redeliver_published_events = value;
        self
    }

    pub fn max_cascade(mut self, max: usize) -> Self {
        self.config.max_cascade = max;
        self
    }

    pub fn build(self) -> FixtureConfig {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
