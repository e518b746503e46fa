// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! At most one firing in flight per harvest definition

use hv_core::HarvestId;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Set of definitions currently being fired
#[derive(Clone, Default)]
pub struct FiringGuards {
    held: Arc<Mutex<HashSet<HarvestId>>>,
}

impl FiringGuards {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `id`, or `None` if another firing holds it
    pub fn try_acquire(&self, id: &HarvestId) -> Option<FiringGuard> {
        let mut held = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if !held.insert(id.clone()) {
            return None;
        }
        Some(FiringGuard {
            id: id.clone(),
            held: Arc::clone(&self.held),
        })
    }

    pub fn is_held(&self, id: &HarvestId) -> bool {
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(id)
    }
}

/// Releases its definition when dropped
pub struct FiringGuard {
    id: HarvestId,
    held: Arc<Mutex<HashSet<HarvestId>>>,
}

impl FiringGuard {
    pub fn id(&self) -> &HarvestId {
        &self.id
    }
}

impl Drop for FiringGuard {
    fn drop(&mut self) {
        self.held
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.id);
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
