//! Tab manager observers

use std::fmt;
use std::rc::{Rc, Weak};

use crate::tab::Tab;

/// Handle for a registered [`TabManagerDelegate`]. Distinct from the
/// navigation delegate handle so one can't be used to remove the other.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ObserverId(u64);

impl fmt::Display for ObserverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "observer-{}", self.0)
    }
}

/// Observer of tab collection changes. Held weakly by the manager; every
/// method has an empty default.
pub trait TabManagerDelegate {
    fn did_select_tab(&self, _selected: Option<&Tab>, _previous: Option<&Tab>) {}

    fn did_add_tab(&self, _tab: &Tab, _index: usize, _restoring: bool) {}

    fn did_create_web_view(&self, _tab: &Tab) {}

    fn did_remove_tab(&self, _tab: &Tab, _index: usize) {}

    fn did_move_tab(&self, _tab: &Tab, _from: usize, _to: usize) {}

    fn did_restore_tabs(&self, _count: usize) {}
}

#[derive(Default)]
pub(crate) struct DelegateRegistry {
    entries: Vec<(ObserverId, Weak<dyn TabManagerDelegate>)>,
    next_id: u64,
}

impl DelegateRegistry {
    pub(crate) fn add<D: TabManagerDelegate + 'static>(&mut self, delegate: &Rc<D>) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        let delegate: Rc<dyn TabManagerDelegate> = delegate.clone();
        self.entries.push((id, Rc::downgrade(&delegate)));
        id
    }

    pub(crate) fn remove(&mut self, id: ObserverId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        self.entries.len() != before
    }

    /// Live delegates in registration order; dead entries are pruned
    pub(crate) fn live(&mut self) -> Vec<Rc<dyn TabManagerDelegate>> {
        self.entries.retain(|(_, weak)| weak.strong_count() > 0);
        self.entries.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
    }
}
