//! Variable reference registry.
//! - VariableHandles::alloc: hand out a fresh reference
//! - VariableHandles::retire_all: forget entries, keep the counter

use rustc_hash::FxHashMap;

use crate::value::Value;

/// Backing data for a `variablesReference`.
#[derive(Debug, Clone)]
pub(in crate::adapter) enum VariableHandle {
    /// Local bindings of a snapshot frame.
    Locals(u32),
    /// Global bindings of a snapshot frame.
    Globals(u32),
    /// Children of a composite value.
    Value(Value),
}

/// Monotonic handle allocator. Reference 0 is never issued and a reference is
/// never reissued, even after [`VariableHandles::retire_all`].
#[derive(Debug)]
pub(in crate::adapter) struct VariableHandles {
    next_ref: u64,
    handles: FxHashMap<u64, VariableHandle>,
}

impl Default for VariableHandles {
    fn default() -> Self {
        Self {
            next_ref: 1,
            handles: FxHashMap::default(),
        }
    }
}

impl VariableHandles {
    pub(in crate::adapter) fn alloc(&mut self, handle: VariableHandle) -> u64 {
        let id = self.next_ref;
        self.next_ref = self.next_ref.saturating_add(1);
        self.handles.insert(id, handle);
        id
    }

    pub(in crate::adapter) fn get(&self, reference: u64) -> Option<&VariableHandle> {
        self.handles.get(&reference)
    }

    /// Drop every live entry. Called when the suspension they describe ends.
    pub(in crate::adapter) fn retire_all(&mut self) {
        self.handles.clear();
    }

    pub(in crate::adapter) fn live(&self) -> usize {
        self.handles.len()
    }
}
