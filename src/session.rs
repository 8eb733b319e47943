//! The single "last search" slot that follow-up questions read from.
//!
//! Each completed search replaces the slot wholesale; readers get a clone,
//! so a question asked while a new search lands sees either the old session
//! or the new one, never a mix.

use crate::models::SearchSession;
use std::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
pub struct SessionSlot {
    inner: RwLock<Option<SearchSession>>,
}

impl SessionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `session` as the current one, dropping whatever was there.
    pub fn replace(&self, session: SearchSession) {
        debug!(keyword = %session.keyword, count = session.results.len(), "Replacing session");
        let mut guard = self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(session);
    }

    /// A snapshot of the current session, if any search has completed.
    pub fn current(&self) -> Option<SearchSession> {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SearchResult;

    fn session(keyword: &str) -> SearchSession {
        SearchSession {
            keyword: keyword.to_string(),
            results: vec![SearchResult {
                title: format!("{keyword} 기사"),
                link: "https://example.com/1".to_string(),
                ..SearchResult::default()
            }],
            summary: String::new(),
        }
    }

    #[test]
    fn test_empty_until_first_search() {
        assert_eq!(SessionSlot::new().current(), None);
    }

    #[test]
    fn test_replace_overwrites_previous_session() {
        let slot = SessionSlot::new();
        slot.replace(session("경제"));
        slot.replace(session("기후"));
        assert_eq!(slot.current().unwrap().keyword, "기후");
    }

    #[test]
    fn test_snapshot_is_independent_of_later_replacements() {
        let slot = SessionSlot::new();
        slot.replace(session("경제"));
        let snapshot = slot.current().unwrap();
        slot.replace(session("기후"));
        assert_eq!(snapshot.keyword, "경제");
    }
}
