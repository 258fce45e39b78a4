//! Deterministic battle rules shared by the authoritative simulation and the AI.
//!
//! `battle-core` owns the unit model (health, ammo, bonuses), damage
//! estimation, the authoritative [`Battle`] store and the spell pipeline. All
//! mutation is expressed as [`BattleChange`] records applied through
//! [`BattleState`], so a real cast and an evaluated cast run the same code.
pub mod action;
pub mod battle;
pub mod bonus;
pub mod change;
pub mod combat;
pub mod config;
pub mod error;
pub mod hex;
pub mod rng;
pub mod spell;
pub mod unit;

pub use action::BattleAction;
pub use battle::{Battle, BattleState, BattleView, Obstacle, ObstacleKind, Reachability, SideInfo};
pub use bonus::{
    Bonus, BonusBearer, BonusDuration, BonusList, BonusSource, BonusType, BonusValueType, Selector,
    VersionedCache,
};
pub use change::{BattleChange, ChangeSender, LocalSender, UnitInfo};
pub use combat::{AttackInfo, DamageEstimate, DamageRange};
pub use config::BattleConfig;
pub use error::{BattleError, ErrorSeverity, StateError};
pub use hex::{BattleHex, HexDirection};
pub use rng::{BattleRng, MidpointRng, PcgRng};
pub use spell::{
    BattleCast, CastError, CastMode, CastParameters, CastProblem, CastReport, Caster, Destination,
    Effect, EffectContext, EffectKind, Hero, Mechanics, Problem, ProblemLevel, SpellDefinition,
    SpellId, SpellMechanics, SpellRange, Target, UnitCaster,
};
pub use unit::{
    Ammo, AmmoKind, BattleSide, CreatureId, CreatureType, HealLevel, HealPower, HealthPool,
    PersistedUnitState, PlayerId, SlotId, UnitBonuses, UnitDefinition, UnitFlags, UnitId,
    UnitSnapshot, UnitState,
};
