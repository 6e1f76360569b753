//! Variable handling split by concern.
//! - handles: reference registry
//! - list: variables request + child enumeration
//! - format: bounded display strings

mod format;
mod handles;
mod list;

pub(in crate::adapter) use handles::{VariableHandle, VariableHandles};
