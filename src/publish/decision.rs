//! What a run does with its modifications

use crate::results::UnifiedResult;

/// Outcome of the decide step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicationDecision {
    /// Nothing was modified
    NoChange,
    /// Modifications exist but neither publishing nor failing was asked for
    ChangedNoAction,
    /// Modifications are committed, pushed and proposed as a pull request
    ChangedPublished,
    /// The run fails once any requested publication is done
    ChangedFailFast {
        /// Whether the pull request is published before failing
        publish_first: bool,
    },
}

impl PublicationDecision {
    /// Whether the commit, push and pull request steps run
    pub fn publishes(&self) -> bool {
        matches!(
            self,
            PublicationDecision::ChangedPublished
                | PublicationDecision::ChangedFailFast {
                    publish_first: true
                }
        )
    }

    /// Whether the run ends with the unpinned-found failure
    pub fn fails(&self) -> bool {
        matches!(self, PublicationDecision::ChangedFailFast { .. })
    }
}

/// Decide from the merged result and the two policy flags
pub fn decide(result: &UnifiedResult, open_pr: bool, fail_on_unpinned: bool) -> PublicationDecision {
    if !result.has_modifications() {
        return PublicationDecision::NoChange;
    }

    match (open_pr, fail_on_unpinned) {
        (false, false) => PublicationDecision::ChangedNoAction,
        (publish_first, true) => PublicationDecision::ChangedFailFast { publish_first },
        (true, false) => PublicationDecision::ChangedPublished,
    }
}
