//! Session message collaborator.

use std::collections::BTreeMap;

/// Receives messages posted by actions.
pub trait MessageSink {
    /// Posts `text` to a channel (`status`, `warning`, `error`).
    fn post(&mut self, channel: &str, text: &str);
}

/// A message sink that keeps every message in memory, grouped by channel.
#[derive(Clone, Debug, Default)]
pub struct MessageLog {
    channels: BTreeMap<String, Vec<String>>,
}

impl MessageLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the messages posted to a channel, oldest first.
    #[must_use]
    pub fn messages(&self, channel: &str) -> &[String] {
        self.channels.get(channel).map_or(&[], Vec::as_slice)
    }

    /// Returns the total number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.values().map(Vec::len).sum()
    }

    /// Returns true if nothing has been posted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MessageSink for MessageLog {
    fn post(&mut self, channel: &str, text: &str) {
        self.channels
            .entry(channel.to_string())
            .or_default()
            .push(text.to_string());
    }
}
