//! Notification channel towards the external bot process.
//!
//! Only the seam exists: no wire protocol is defined, so the shipped
//! channel validates its input and reports what it would open.

use tracing::info;

use crate::error::{Error, Result};

pub trait NotificationChannel {
    /// Open a channel signalling activity in `room_id`
    fn open(&mut self, room_id: &str) -> Result<()>;
}

/// Channel that records the rooms it was asked to open
#[derive(Debug, Default)]
pub struct StubChannel {
    opened: Vec<String>,
}

impl StubChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> &[String] {
        &self.opened
    }
}

impl NotificationChannel for StubChannel {
    fn open(&mut self, room_id: &str) -> Result<()> {
        let room_id = room_id.trim();
        if room_id.is_empty() {
            return Err(Error::Configuration("missing room id for the notification socket".to_string()));
        }
        info!(room = %room_id, "Opening websocket");
        self.opened.push(room_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_records_room() {
        let mut channel = StubChannel::new();
        channel.open(" room-1 ").unwrap();
        assert_eq!(channel.opened(), ["room-1".to_string()]);
    }

    #[test]
    fn test_empty_room_id_rejected() {
        let mut channel = StubChannel::new();
        assert!(matches!(channel.open("  "), Err(Error::Configuration(_))));
        assert!(channel.opened().is_empty());
    }
}
