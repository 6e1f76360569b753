//! Frames captured when the debuggee suspends.

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::trace::FrameRef;

use super::control::StopReason;

/// Caller chains longer than this are cut off.
const MAX_STACK_DEPTH: usize = 4096;

/// Scope handles allocated for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScopeRefs {
    pub(crate) locals: u64,
    pub(crate) globals: u64,
}

#[derive(Debug)]
pub(crate) struct SnapshotFrame {
    /// 1 for the innermost frame, counting outward.
    pub(crate) id: u32,
    pub(crate) name: String,
    pub(crate) path: String,
    pub(crate) line: u32,
    pub(crate) column: u32,
    pub(crate) frame: FrameRef,
}

/// Everything known about one suspension. Replaced wholesale on the next one.
#[derive(Debug)]
pub(crate) struct Suspension {
    pub(crate) reason: StopReason,
    pub(crate) frames: Vec<SnapshotFrame>,
    pub(crate) scopes: FxHashMap<u32, ScopeRefs>,
}

impl Suspension {
    pub(crate) fn capture(innermost: &FrameRef, reason: StopReason) -> Self {
        let mut frames = Vec::new();
        let mut cursor = Some(FrameRef::clone(innermost));
        while let Some(frame) = cursor {
            if frames.len() == MAX_STACK_DEPTH {
                warn!(depth = MAX_STACK_DEPTH, "call stack truncated");
                break;
            }
            cursor = frame.caller();
            frames.push(SnapshotFrame {
                id: u32::try_from(frames.len() + 1).unwrap_or(u32::MAX),
                name: frame.name().to_string(),
                path: frame.path().to_string(),
                line: frame.line(),
                column: frame.column(),
                frame,
            });
        }
        Self {
            reason,
            frames,
            scopes: FxHashMap::default(),
        }
    }

    pub(crate) fn frame(&self, id: u32) -> Option<&SnapshotFrame> {
        let index = usize::try_from(id).ok()?.checked_sub(1)?;
        self.frames.get(index)
    }

    pub(crate) fn innermost(&self) -> Option<&SnapshotFrame> {
        self.frames.first()
    }
}
