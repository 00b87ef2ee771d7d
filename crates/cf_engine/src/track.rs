//! Per-session identity bookkeeping.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use core::any::Any;

use cf_utils::hash::{HashMap, HashSet};
use slotmap::{SlotMap, new_key_type};

use crate::ClassifyError;
use crate::info::SharedInfo;

// -----------------------------------------------------------------------------
// RefTracker

/// Shared handles met while classifying.
///
/// A handle seen a second time is recorded as referenced; only those get
/// a referable id in the output.
#[derive(Default)]
pub(crate) struct RefTracker {
    seen: HashSet<usize>,
    referenced: HashSet<usize>,
}

impl RefTracker {
    /// Mark `identity` as seen. Returns `false`, and records a reference,
    /// if it already was.
    pub fn visit(&mut self, identity: usize) -> bool {
        if self.seen.insert(identity) {
            true
        } else {
            self.referenced.insert(identity);
            false
        }
    }

    #[inline]
    pub fn is_referenced(&self, identity: usize) -> bool {
        self.referenced.contains(&identity)
    }
}

// -----------------------------------------------------------------------------
// SlotTable

new_key_type! {
    /// An allocated shared handle of a declassify session.
    pub(crate) struct SlotId;
}

pub(crate) struct Slot {
    pub handle: Rc<dyn Any>,
    pub info: &'static SharedInfo,
}

/// Shared handles allocated while declassifying, with their referable ids.
#[derive(Default)]
pub(crate) struct SlotTable {
    slots: SlotMap<SlotId, Slot>,
    by_id: HashMap<String, SlotId>,
}

impl SlotTable {
    /// Register an allocated handle, under `id` when the element was referable.
    pub fn insert(
        &mut self,
        handle: Rc<dyn Any>,
        info: &'static SharedInfo,
        id: Option<String>,
    ) -> Result<SlotId, ClassifyError> {
        if let Some(id) = &id
            && self.by_id.contains_key(id)
        {
            return Err(ClassifyError::Malformed(format!("duplicate referable id `{id}`")));
        }
        let slot = self.slots.insert(Slot { handle, info });
        if let Some(id) = id {
            log::trace!("slot `{id}` allocated for `{}`", info.ty().path());
            self.by_id.insert(id, slot);
        }
        Ok(slot)
    }

    #[inline]
    pub fn resolve(&self, id: &str) -> Option<SlotId> {
        self.by_id.get(id).copied()
    }

    #[inline]
    pub fn get(&self, slot: SlotId) -> Option<&Slot> {
        self.slots.get(slot)
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use alloc::string::String;
    use core::cell::RefCell;

    use super::{RefTracker, SlotTable};
    use crate::{Shared, Typed};

    #[test]
    fn second_visit_is_a_reference() {
        let mut tracker = RefTracker::default();
        assert!(tracker.visit(1));
        assert!(!tracker.is_referenced(1));
        assert!(!tracker.visit(1));
        assert!(tracker.is_referenced(1));
    }

    #[test]
    fn duplicate_ids() {
        let info = <Shared<u8>>::type_info().as_shared().unwrap();
        let mut slots = SlotTable::default();
        let handle = Rc::new(RefCell::new(0_u8));

        let slot = slots.insert(handle.clone(), info, Some(String::from("1"))).unwrap();
        assert_eq!(slots.resolve("1"), Some(slot));
        assert!(slots.insert(handle.clone(), info, None).is_ok());
        assert!(slots.insert(handle, info, Some(String::from("1"))).is_err());
        assert!(slots.resolve("2").is_none());
    }
}
