use choreo_store::Message;

use crate::{error::Result, matcher::Matcher, recorder::RecordingCommandChannel};

use super::{assert_sequence_equal, assert_sequence_matching};

#[derive(Debug, Clone)]
pub struct CommandValidator {
    channel: RecordingCommandChannel,
    recording: bool,
}

impl CommandValidator {
    pub fn new(channel: RecordingCommandChannel) -> Self {
        Self {
            channel,
            recording: false,
        }
    }

    pub fn start_recording(&mut self) {
        self.channel.reset();
        self.recording = true;
    }

    /// Commands dispatched since recording started, empty before that.
    pub fn dispatched(&self) -> Vec<Message> {
        if self.recording {
            self.channel.messages()
        } else {
            Vec::new()
        }
    }

    pub fn assert_dispatched_equal_to(&self, expected: &[Message]) -> Result<()> {
        assert_sequence_equal("command", expected, &self.dispatched())
    }

    pub fn assert_dispatched_matching(&self, matcher: &Matcher<[Message]>) -> Result<()> {
        assert_sequence_matching("dispatched command", matcher, &self.dispatched())
    }
}
