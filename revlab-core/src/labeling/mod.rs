//! Forward-outcome labeling for training data.

pub mod forward;

pub use forward::{ForwardLabeler, LabelPolicy, HORIZON};
