use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Room codes shorter than this are silently ignored.
pub const MIN_ROOM_CODE_LEN: usize = 4;

/// Simulated latency before a join resolves.
const JOIN_LATENCY: Duration = Duration::from_millis(1500);

/// How long a sync banner stays on screen.
const SYNC_BANNER_DURATION: Duration = Duration::from_millis(800);

/// The flavor of a simulated listening room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    Couple,
    Group,
}

impl RoomKind {
    pub fn capacity(&self) -> usize {
        match self {
            RoomKind::Couple => 2,
            RoomKind::Group => 4,
        }
    }

    /// The hard-coded member roster for this room flavor.
    pub fn roster(&self) -> &'static [&'static str] {
        match self {
            RoomKind::Couple => &["You", "Partner"],
            RoomKind::Group => &["You", "Alex", "Sam", "Jordan"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RoomKind::Couple => "couple",
            RoomKind::Group => "group",
        }
    }
}

/// Lifecycle of the simulated room session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomPhase {
    Idle,
    Joining,
    Joined,
}

/// A simulated room member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub name: String,
    pub active: bool,
}

/// A chat line in the room transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub user: String,
    pub text: String,
    /// Seconds since the unix epoch.
    pub sent_at: u64,
}

impl ChatMessage {
    fn new(user: &str, text: String) -> Self {
        let sent_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user: user.to_string(),
            text,
            sent_at,
        }
    }
}

/// Asynchronous room events, delivered back to the owning event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEvent {
    /// The simulated join latency elapsed.
    JoinResolved { kind: RoomKind },
    /// A sync banner expired. The generation guards against an old timer
    /// clearing a newer banner.
    SyncExpired { generation: u64 },
}

/// Client-only listening-room state machine.
///
/// There is no transport behind this: membership and "sync" latency are faked
/// with local timers, and chat is a local transcript. Timer completions are
/// reported over the event channel so the single-threaded event loop applies
/// them; pending timers are aborted when the room is left.
pub struct RoomManager {
    events: mpsc::Sender<RoomEvent>,
    kind: Option<RoomKind>,
    phase: RoomPhase,
    members: Vec<Member>,
    messages: Vec<ChatMessage>,
    sync_status: Option<String>,
    sync_generation: u64,
    timers: Vec<JoinHandle<()>>,
}

impl RoomManager {
    pub fn new(events: mpsc::Sender<RoomEvent>) -> Self {
        Self {
            events,
            kind: None,
            phase: RoomPhase::Idle,
            members: Vec::new(),
            messages: Vec::new(),
            sync_status: None,
            sync_generation: 0,
            timers: Vec::new(),
        }
    }

    pub fn phase(&self) -> RoomPhase {
        self.phase
    }

    pub fn kind(&self) -> Option<RoomKind> {
        self.kind
    }

    pub fn is_joined(&self) -> bool {
        self.phase == RoomPhase::Joined
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn sync_status(&self) -> Option<&str> {
        self.sync_status.as_deref()
    }

    /// Starts joining a room. Codes below the minimum length are a silent
    /// no-op. Returns whether a join was actually started.
    pub fn begin_join(&mut self, kind: RoomKind, code: &str) -> bool {
        if code.trim().len() < MIN_ROOM_CODE_LEN {
            log::debug!("ignoring short room code {:?}", code);
            return false;
        }
        if self.phase != RoomPhase::Idle {
            return false;
        }

        self.kind = Some(kind);
        self.phase = RoomPhase::Joining;

        let events = self.events.clone();
        self.timers.push(tokio::spawn(async move {
            tokio::time::sleep(JOIN_LATENCY).await;
            let _ = events.send(RoomEvent::JoinResolved { kind }).await;
        }));
        true
    }

    /// Applies a resolved join: populates the roster and posts the system
    /// greeting.
    pub fn complete_join(&mut self, kind: RoomKind) {
        if self.phase != RoomPhase::Joining || self.kind != Some(kind) {
            return;
        }

        self.phase = RoomPhase::Joined;
        self.members = kind
            .roster()
            .iter()
            .take(kind.capacity())
            .map(|name| Member {
                name: name.to_string(),
                active: true,
            })
            .collect();

        self.messages.push(ChatMessage::new(
            "SERVER",
            format!(
                "{} Link Established. Welcome to the Spectrum.",
                kind.label().to_uppercase()
            ),
        ));
    }

    /// Appends a chat message from the local user. Blank input is a no-op.
    pub fn send_message(&mut self, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() || !self.is_joined() {
            return false;
        }
        self.messages.push(ChatMessage::new("You", text.to_string()));
        true
    }

    /// Shows a transient "Syncing ..." banner for a player action. Purely
    /// cosmetic; does nothing when not in a room.
    pub fn broadcast_sync(&mut self, action: &str) {
        if !self.is_joined() {
            return;
        }

        self.sync_generation += 1;
        let generation = self.sync_generation;
        self.sync_status = Some(format!("Syncing {}...", action));

        let events = self.events.clone();
        self.timers.push(tokio::spawn(async move {
            tokio::time::sleep(SYNC_BANNER_DURATION).await;
            let _ = events.send(RoomEvent::SyncExpired { generation }).await;
        }));
    }

    /// Clears the sync banner if the expiry belongs to the latest one.
    pub fn expire_sync(&mut self, generation: u64) {
        if generation == self.sync_generation {
            self.sync_status = None;
        }
    }

    /// Leaves the room, aborting pending timers and resetting all state.
    pub fn leave(&mut self) {
        for timer in self.timers.drain(..) {
            timer.abort();
        }
        self.kind = None;
        self.phase = RoomPhase::Idle;
        self.members.clear();
        self.messages.clear();
        self.sync_status = None;
    }
}

impl Drop for RoomManager {
    fn drop(&mut self) {
        for timer in self.timers.drain(..) {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> (RoomManager, mpsc::Receiver<RoomEvent>) {
        let (tx, rx) = mpsc::channel(8);
        (RoomManager::new(tx), rx)
    }

    #[tokio::test]
    async fn short_code_is_a_silent_noop() {
        let (mut room, _rx) = manager();
        assert!(!room.begin_join(RoomKind::Group, "ab"));
        assert_eq!(room.phase(), RoomPhase::Idle);
        assert!(room.members().is_empty());
    }

    #[test]
    fn join_resolves_with_rostered_members() {
        tokio_test::block_on(async {
            let (mut room, mut rx) = manager();
            assert!(room.begin_join(RoomKind::Couple, "WXYZ"));
            assert_eq!(room.phase(), RoomPhase::Joining);

            let event = tokio::time::timeout(Duration::from_secs(3), rx.recv())
                .await
                .expect("timed out waiting for join")
                .expect("channel closed");
            assert_eq!(
                event,
                RoomEvent::JoinResolved {
                    kind: RoomKind::Couple
                }
            );

            room.complete_join(RoomKind::Couple);
            assert!(room.is_joined());
            assert_eq!(room.members().len(), 2);
            assert_eq!(room.messages().len(), 1);
            assert_eq!(room.messages()[0].user, "SERVER");
        });
    }

    #[tokio::test]
    async fn group_roster_has_four_members() {
        let (mut room, _rx) = manager();
        room.begin_join(RoomKind::Group, "CODE");
        room.complete_join(RoomKind::Group);
        assert_eq!(room.members().len(), 4);
        assert_eq!(room.members()[0].name, "You");
    }

    #[tokio::test]
    async fn chat_ignores_blank_messages() {
        let (mut room, _rx) = manager();
        room.begin_join(RoomKind::Group, "CODE");
        room.complete_join(RoomKind::Group);

        assert!(!room.send_message("   "));
        assert!(room.send_message("hello spectrum"));
        let last = room.messages().last().unwrap();
        assert_eq!(last.user, "You");
        assert_eq!(last.text, "hello spectrum");
    }

    #[tokio::test]
    async fn stale_sync_expiry_does_not_clear_newer_banner() {
        let (mut room, _rx) = manager();
        room.begin_join(RoomKind::Group, "CODE");
        room.complete_join(RoomKind::Group);

        room.broadcast_sync("play");
        let first_generation = room.sync_generation;
        room.broadcast_sync("skip-next");

        room.expire_sync(first_generation);
        assert_eq!(room.sync_status(), Some("Syncing skip-next..."));

        room.expire_sync(room.sync_generation);
        assert_eq!(room.sync_status(), None);
    }

    #[tokio::test]
    async fn leave_resets_everything() {
        let (mut room, _rx) = manager();
        room.begin_join(RoomKind::Couple, "CODE");
        room.complete_join(RoomKind::Couple);
        room.send_message("bye");

        room.leave();
        assert_eq!(room.phase(), RoomPhase::Idle);
        assert!(room.kind().is_none());
        assert!(room.members().is_empty());
        assert!(room.messages().is_empty());
    }
}
