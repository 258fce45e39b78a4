use crate::battle::{BattleState, BattleView};
use crate::change::{BattleChange, ChangeSender};

/// Destination of the changes an effect produces.
pub trait EffectSink {
    /// State as seen after every change emitted so far.
    fn view(&self) -> &dyn BattleView;

    fn emit(&mut self, change: BattleChange);

    fn complain(&mut self, message: &str);
}

/// Routes changes through the apply-and-send boundary.
pub struct SenderSink<'s> {
    sender: &'s mut dyn ChangeSender,
}

impl<'s> SenderSink<'s> {
    pub fn new(sender: &'s mut dyn ChangeSender) -> Self {
        Self { sender }
    }
}

impl EffectSink for SenderSink<'_> {
    fn view(&self) -> &dyn BattleView {
        self.sender.battle()
    }

    fn emit(&mut self, change: BattleChange) {
        self.sender.apply_and_send(change);
    }

    fn complain(&mut self, message: &str) {
        self.sender.complain(message);
    }
}

/// Applies changes to a local state; nothing is forwarded.
pub struct StateSink<'s> {
    state: &'s mut dyn BattleState,
}

impl<'s> StateSink<'s> {
    pub fn new(state: &'s mut dyn BattleState) -> Self {
        Self { state }
    }
}

impl EffectSink for StateSink<'_> {
    fn view(&self) -> &dyn BattleView {
        self.state.as_view()
    }

    fn emit(&mut self, change: BattleChange) {
        change.apply_to(&mut *self.state);
    }

    fn complain(&mut self, message: &str) {
        tracing::debug!(complaint = message, "evaluated cast rejected");
    }
}
