//! Back-forward list of a live web view

use skiff_session::SessionSnapshot;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackForwardList {
    /// Oldest first
    pub back: Vec<Url>,
    pub current: Url,
    /// Nearest first
    pub forward: Vec<Url>,
}

impl BackForwardList {
    pub fn new(current: Url) -> Self {
        Self {
            back: Vec::new(),
            current,
            forward: Vec::new(),
        }
    }

    /// Rebuild the list a snapshot describes
    pub fn from_snapshot(snapshot: &SessionSnapshot) -> Option<Self> {
        let index = snapshot.current_index();
        let current = snapshot.urls.get(index)?.clone();

        Some(Self {
            back: snapshot.urls[..index].to_vec(),
            current,
            forward: snapshot.urls[index + 1..].to_vec(),
        })
    }

    pub fn to_snapshot(&self, title: Option<String>) -> SessionSnapshot {
        SessionSnapshot::from_history(&self.back, self.current.clone(), &self.forward, title)
    }

    pub fn can_go_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    pub fn len(&self) -> usize {
        self.back.len() + 1 + self.forward.len()
    }

    /// New navigation: current moves to the back list and forward history is dropped
    pub fn push(&mut self, url: Url) {
        let previous = std::mem::replace(&mut self.current, url);
        self.back.push(previous);
        self.forward.clear();
    }

    pub fn go_back(&mut self) -> bool {
        let Some(url) = self.back.pop() else {
            return false;
        };
        let previous = std::mem::replace(&mut self.current, url);
        self.forward.insert(0, previous);
        true
    }

    pub fn go_forward(&mut self) -> bool {
        if self.forward.is_empty() {
            return false;
        }
        let url = self.forward.remove(0);
        let previous = std::mem::replace(&mut self.current, url);
        self.back.push(previous);
        true
    }
}
