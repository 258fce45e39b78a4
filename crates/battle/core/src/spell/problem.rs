use std::fmt;

/// Weight of a cast problem. Critical problems rule the spell out entirely;
/// normal ones only rule out the current destination.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ProblemLevel {
    Normal,
    Critical,
}

/// Reason a spell cannot be cast.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CastProblem {
    #[error("no hero to cast with")]
    NoHero,

    #[error("spell is not in the spellbook")]
    SpellNotKnown,

    #[error("not enough mana: {required} required, {available} available")]
    NotEnoughMana { required: i32, available: i32 },

    #[error("a spell was already cast this round")]
    AlreadyCastThisRound,

    #[error("caster cannot cast now")]
    CasterCannotCast,

    #[error("no appropriate target")]
    NoAppropriateTarget,

    #[error("destination is blocked")]
    DestinationBlocked,

    #[error("spell cannot be used in {0} mode")]
    WrongMode(&'static str),

    #[error("another summoned creature already fights for this side")]
    SummonExclusive,

    #[error("spell needs a destination")]
    NoDestination,

    #[error("no allied unit to sacrifice")]
    NoVictim,
}

/// Structured result of a legality check.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Problem {
    entries: Vec<(CastProblem, ProblemLevel)>,
}

impl Problem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, problem: CastProblem, level: ProblemLevel) {
        self.entries.push((problem, level));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_critical(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, level)| *level == ProblemLevel::Critical)
    }

    pub fn entries(&self) -> &[(CastProblem, ProblemLevel)] {
        &self.entries
    }

    pub fn contains(&self, problem: &CastProblem) -> bool {
        self.entries.iter().any(|(p, _)| p == problem)
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return f.write_str("no problem");
        }
        for (i, (problem, level)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{problem} ({level})")?;
        }
        Ok(())
    }
}
