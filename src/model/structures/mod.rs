pub mod competitive_tier;
pub mod phase;
