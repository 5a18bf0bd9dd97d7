//! Formatting helpers shared by the screens.

pub mod money_fmt;
