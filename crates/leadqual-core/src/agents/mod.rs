//! Multi-agent mode
//!
//! A [`Router`] asks its [`Planner`] what to do with each user turn. The
//! planner either answers directly or hands off to one of three specialists
//! (enrich, score, draft). Hand-offs are announced as [`HandoffEvent`]s; the
//! drafting specialist ends the turn and its output is streamed to the caller.
//! The order in which specialists are used is left to the planner.

mod planner;
mod router;
mod specialist;

pub use planner::{LlmPlanner, Planner, RouterDecision};
pub use router::{
    HandoffEvent, Router, RouterEvent, RouterReply, RouterSession, DEFAULT_MAX_HANDOFFS,
    ROUTER_NAME,
};
pub use specialist::{Specialist, SpecialistInfo, SpecialistKind, ENRICHED_PREFIX};
