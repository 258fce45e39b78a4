use super::BattleChange;
use crate::battle::{Battle, BattleView};

/// Apply-and-send boundary of the authoritative battle.
///
/// Implementations apply each change to the authoritative state and forward
/// it to every observer. Complaints are non-fatal diagnostics about malformed
/// requests.
pub trait ChangeSender {
    /// Authoritative state, reflecting every change sent so far.
    fn battle(&self) -> &dyn BattleView;

    fn apply_and_send(&mut self, change: BattleChange);

    fn complain(&mut self, message: &str);
}

/// Sender that applies changes to a local [`Battle`] and keeps the stream
/// observers would receive.
#[derive(Debug)]
pub struct LocalSender<'a> {
    battle: &'a mut Battle,
    outbox: Vec<BattleChange>,
    complaints: Vec<String>,
}

impl<'a> LocalSender<'a> {
    pub fn new(battle: &'a mut Battle) -> Self {
        Self {
            battle,
            outbox: Vec::new(),
            complaints: Vec::new(),
        }
    }

    /// Changes sent so far, in order.
    pub fn sent(&self) -> &[BattleChange] {
        &self.outbox
    }

    pub fn complaints(&self) -> &[String] {
        &self.complaints
    }

    pub fn into_sent(self) -> Vec<BattleChange> {
        self.outbox
    }
}

impl ChangeSender for LocalSender<'_> {
    fn battle(&self) -> &dyn BattleView {
        &*self.battle
    }

    fn apply_and_send(&mut self, change: BattleChange) {
        change.apply_to(&mut *self.battle);
        self.outbox.push(change);
    }

    fn complain(&mut self, message: &str) {
        tracing::warn!(complaint = message, "cast request rejected");
        self.complaints.push(message.to_owned());
    }
}
