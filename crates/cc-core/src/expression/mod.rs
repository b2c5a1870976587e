//! Motivation & Expression Router (C6) and its Self-Critique Check (§4.4, §4.5)

mod critique;
mod router;

pub use critique::{CritiqueInputs, CritiqueResult, PrincipleScores, SelfCritique};
pub use router::{ChannelPolicy, ExpressionRouter, RouterDecision, RoutingContext, UserStateFilter};
