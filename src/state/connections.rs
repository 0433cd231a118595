use crate::models::message::ServerMessage;
use crate::models::types::PlayerId;
use crate::net::output::OutputHandle;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

struct Conn {
    output: OutputHandle,
    /// Unpublished slots hold the player's place but are invisible to everyone else
    published: bool,
}

/// Live game connections, at most one per player.
#[derive(Default)]
pub struct ConnectionRegistry {
    conns: DashMap<PlayerId, Conn>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the player's slot. The slot stays invisible to everyone else until
    /// [`ConnectionRegistry::publish`]. Returns false, changing nothing, when the player already
    /// holds a slot.
    pub fn connect(&self, player_id: PlayerId, output: OutputHandle) -> bool {
        match self.conns.entry(player_id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(v) => {
                v.insert(Conn {
                    output,
                    published: false,
                });
                true
            }
        }
    }

    /// Makes a connected slot visible to presence checks and sends.
    pub fn publish(&self, player_id: PlayerId) -> bool {
        match self.conns.get_mut(&player_id) {
            Some(mut conn) => {
                conn.published = true;
                true
            }
            None => false,
        }
    }

    pub fn disconnect(&self, player_id: PlayerId) -> bool {
        self.conns.remove(&player_id).is_some()
    }

    pub fn is_present(&self, player_id: PlayerId) -> bool {
        self.conns.get(&player_id).is_some_and(|c| c.published)
    }

    pub fn get(&self, player_id: PlayerId) -> Option<OutputHandle> {
        self.conns
            .get(&player_id)
            .filter(|c| c.published)
            .map(|c| c.output.clone())
    }

    pub fn send_to(&self, player_id: PlayerId, message: impl Into<ServerMessage>) {
        if let Some(conn) = self.conns.get(&player_id).filter(|c| c.published) {
            conn.output.message(message);
        }
    }

    /// Sends to a channel the caller already holds and to the opponent, if connected.
    pub fn send_to_both(&self, message: impl Into<ServerMessage>, own: &OutputHandle, opponent: PlayerId) {
        let message = message.into();
        own.message(message.clone());
        self.send_to(opponent, message);
    }

    pub fn close(&self, player_id: PlayerId, code: u16, reason: &str) {
        if let Some(conn) = self.conns.get(&player_id).filter(|c| c.published) {
            conn.output.close(code, reason);
        }
    }

    /// Number of slots held, unpublished ones included.
    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::output::{CLOSE_NORMAL, OutFrame};

    fn connect_live(reg: &ConnectionRegistry, player_id: PlayerId, output: OutputHandle) -> bool {
        reg.connect(player_id, output) && reg.publish(player_id)
    }

    fn text(frame: Option<OutFrame>) -> String {
        match frame {
            Some(OutFrame::Message(m)) => m.message,
            other => panic!("expected a message, got {other:?}"),
        }
    }

    #[test]
    fn one_connection_per_player() {
        let reg = ConnectionRegistry::new();
        let alice = PlayerId::new();
        let (first, mut first_rx) = OutputHandle::channel();
        let (second, mut second_rx) = OutputHandle::channel();

        assert!(connect_live(&reg, alice, first));
        assert!(!connect_live(&reg, alice, second));
        assert_eq!(reg.len(), 1);

        // The surviving entry is still the first channel.
        reg.send_to(alice, ServerMessage::new("hello"));
        assert_eq!(text(first_rx.try_next()), "hello");
        assert!(second_rx.try_next().is_none());
    }

    #[test]
    fn connected_slots_stay_hidden_until_published() {
        let reg = ConnectionRegistry::new();
        let alice = PlayerId::new();
        let (out, mut rx) = OutputHandle::channel();
        let (other, _other_rx) = OutputHandle::channel();

        assert!(reg.connect(alice, out));
        assert!(!reg.connect(alice, other.clone()));
        assert!(!reg.is_present(alice));
        assert!(reg.get(alice).is_none());

        reg.send_to(alice, ServerMessage::new("too early"));
        reg.close(alice, CLOSE_NORMAL, "");
        assert!(rx.try_next().is_none());

        assert!(reg.publish(alice));
        assert!(reg.is_present(alice));
        reg.send_to(alice, ServerMessage::new("welcome"));
        assert_eq!(text(rx.try_next()), "welcome");

        assert!(!reg.publish(PlayerId::new()));
        assert!(!connect_live(&reg, alice, other));
    }

    #[test]
    fn disconnect_frees_the_slot() {
        let reg = ConnectionRegistry::new();
        let alice = PlayerId::new();
        let (out, _rx) = OutputHandle::channel();

        assert!(connect_live(&reg, alice, out.clone()));
        assert!(reg.is_present(alice));
        assert!(reg.disconnect(alice));
        assert!(!reg.disconnect(alice));
        assert!(!reg.is_present(alice));
        assert!(reg.get(alice).is_none());
        assert!(connect_live(&reg, alice, out));
    }

    #[test]
    fn send_to_absent_player_is_a_no_op() {
        let reg = ConnectionRegistry::new();
        reg.send_to(PlayerId::new(), ServerMessage::new("nobody home"));
        reg.close(PlayerId::new(), CLOSE_NORMAL, "");
        assert!(reg.is_empty());
    }

    #[test]
    fn send_to_both_skips_missing_opponent() {
        let reg = ConnectionRegistry::new();
        let (alice, mut alice_rx) = OutputHandle::channel();
        let (bob, mut bob_rx) = OutputHandle::channel();
        let bob_id = PlayerId::new();

        reg.send_to_both(ServerMessage::new("solo"), &alice, bob_id);
        assert_eq!(text(alice_rx.try_next()), "solo");

        connect_live(&reg, bob_id, bob);
        reg.send_to_both(ServerMessage::new("duo"), &alice, bob_id);
        assert_eq!(text(alice_rx.try_next()), "duo");
        assert_eq!(text(bob_rx.try_next()), "duo");
    }
}
