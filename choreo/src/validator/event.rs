use choreo_store::Message;

use crate::{error::Result, matcher::Matcher, recorder::RecordingEventChannel};

use super::{assert_sequence_equal, assert_sequence_matching};

#[derive(Debug, Clone)]
pub struct EventValidator {
    channel: RecordingEventChannel,
    recording: bool,
}

impl EventValidator {
    pub fn new(channel: RecordingEventChannel) -> Self {
        Self {
            channel,
            recording: false,
        }
    }

    pub fn start_recording(&mut self) {
        self.channel.reset();
        self.recording = true;
    }

    /// Events published since recording started, empty before that.
    pub fn published(&self) -> Vec<Message> {
        if self.recording {
            self.channel.messages()
        } else {
            Vec::new()
        }
    }

    pub fn assert_published_equal_to(&self, expected: &[Message]) -> Result<()> {
        assert_sequence_equal("published event", expected, &self.published())
    }

    pub fn assert_published_matching(&self, matcher: &Matcher<[Message]>) -> Result<()> {
        assert_sequence_matching("published event", matcher, &self.published())
    }
}
