//! Line breakpoints keyed by normalized source path.

use rustc_hash::FxHashMap;

use super::util::normalize_path;

/// Breakpoint returned to the client after a `setBreakpoints` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BreakpointEntry {
    pub(crate) id: u32,
    pub(crate) line: u32,
}

#[derive(Debug, Default)]
pub(crate) struct BreakpointTable {
    /// normalized path -> line -> breakpoint id
    by_path: FxHashMap<String, FxHashMap<u32, u32>>,
    /// raw runtime path -> normalized path
    key_cache: FxHashMap<String, String>,
}

impl BreakpointTable {
    /// Replace every breakpoint for `path`. Ids run 1..=K in input order; a
    /// repeated line keeps the id of its last occurrence.
    pub(crate) fn set_breakpoints(&mut self, path: &str, lines: &[u32]) -> Vec<BreakpointEntry> {
        let key = normalize_path(path);
        let mut by_line = FxHashMap::default();
        let entries: Vec<BreakpointEntry> = lines
            .iter()
            .zip(1u32..)
            .map(|(&line, id)| {
                by_line.insert(line, id);
                BreakpointEntry { id, line }
            })
            .collect();
        if by_line.is_empty() {
            self.by_path.remove(&key);
        } else {
            self.by_path.insert(key, by_line);
        }
        entries
    }

    /// Hot-path lookup with a runtime-reported path.
    pub(crate) fn should_break(&mut self, path: &str, line: u32) -> bool {
        self.breakpoint_at(path, line).is_some()
    }

    /// Id of the breakpoint set on `path:line`, if any.
    pub(crate) fn breakpoint_at(&mut self, path: &str, line: u32) -> Option<u32> {
        if self.by_path.is_empty() {
            return None;
        }
        if !self.key_cache.contains_key(path) {
            self.key_cache.insert(path.to_string(), normalize_path(path));
        }
        self.by_path
            .get(&self.key_cache[path])
            .and_then(|lines| lines.get(&line))
            .copied()
    }

    pub(crate) fn lines_for(&self, path: &str) -> Vec<u32> {
        let mut lines: Vec<u32> = self
            .by_path
            .get(&normalize_path(path))
            .map(|lines| lines.keys().copied().collect())
            .unwrap_or_default();
        lines.sort_unstable();
        lines
    }
}
