//! Command handlers grouped by concern.

pub(crate) mod actions;
pub(crate) mod run;
