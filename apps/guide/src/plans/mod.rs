//! Day plans: composing a new plan from selected places, and reading,
//! sharing and deleting stored ones.
//!
//! A plan is written in two steps (the `plans` row, then its `plan_items`).
//! The store has no transaction across them, so `compose` removes the plan
//! row again when the second step does not complete.

pub mod compose;
pub mod handlers;
pub mod queries;
