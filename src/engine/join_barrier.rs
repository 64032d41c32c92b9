// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::engine::Message;

/// Which arrivals count toward a join node's release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinPolicy {
    /// Any arrival counts, including repeats from the same predecessor
    #[default]
    CountBased,
    /// A batch holds at most one arrival per source; repeats wait for the next batch
    DistinctSource,
}

/// Result of recording one arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// The barrier still needs `remaining` arrivals
    Waiting { remaining: usize },
    /// The barrier released this batch and was reset
    Released(Vec<Message>),
}

impl JoinOutcome {
    pub fn is_released(&self) -> bool {
        matches!(self, JoinOutcome::Released(_))
    }
}

/// Collects arrivals for a join node and releases them in batches of exactly
/// `required` messages.
///
/// Owned by a single runner, so the reset happens in the same `&mut self` call that
/// hands the batch over and no arrival can be counted twice or lost.
#[derive(Debug)]
pub struct JoinBarrier {
    required: usize,
    policy: JoinPolicy,
    batch: Vec<Message>,
    deferred: VecDeque<Message>,
}

impl JoinBarrier {
    pub fn new(required: usize, policy: JoinPolicy) -> Self {
        let required = required.max(1);
        Self {
            required,
            policy,
            batch: Vec::with_capacity(required),
            deferred: VecDeque::new(),
        }
    }

    pub fn required(&self) -> usize {
        self.required
    }

    pub fn policy(&self) -> JoinPolicy {
        self.policy
    }

    /// Arrivals counted toward the current batch
    pub fn arrived(&self) -> usize {
        self.batch.len()
    }

    pub fn remaining(&self) -> usize {
        self.required - self.batch.len()
    }

    /// Arrivals held back because their source already has a message in the batch
    pub fn deferred(&self) -> usize {
        self.deferred.len()
    }

    /// Record one arrival.
    pub fn arrive(&mut self, message: Message) -> JoinOutcome {
        if self.is_repeat(&message) {
            self.deferred.push_back(message);
            return JoinOutcome::Waiting {
                remaining: self.remaining(),
            };
        }

        self.batch.push(message);
        match self.take_if_full() {
            Some(batch) => JoinOutcome::Released(batch),
            None => JoinOutcome::Waiting {
                remaining: self.remaining(),
            },
        }
    }

    /// Replay deferred arrivals into the fresh batch after a release.
    ///
    /// Returns the next batch if the replay fills it. Call repeatedly until `None`.
    pub fn resume(&mut self) -> Option<Vec<Message>> {
        let mut still_deferred = VecDeque::new();

        while let Some(message) = self.deferred.pop_front() {
            if self.is_repeat(&message) {
                still_deferred.push_back(message);
                continue;
            }

            self.batch.push(message);
            if let Some(batch) = self.take_if_full() {
                still_deferred.append(&mut self.deferred);
                self.deferred = still_deferred;
                return Some(batch);
            }
        }

        self.deferred = still_deferred;
        None
    }

    fn is_repeat(&self, message: &Message) -> bool {
        self.policy == JoinPolicy::DistinctSource
            && self
                .batch
                .iter()
                .any(|arrived| arrived.source() == message.source())
    }

    fn take_if_full(&mut self) -> Option<Vec<Message>> {
        if self.batch.len() < self.required {
            return None;
        }
        Some(std::mem::replace(
            &mut self.batch,
            Vec::with_capacity(self.required),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from(source: &str) -> Message {
        Message::from_node(source, format!("Processed by {}", source))
    }

    #[test]
    fn test_releases_exactly_at_required_count() {
        let mut barrier = JoinBarrier::new(2, JoinPolicy::CountBased);

        assert_eq!(barrier.arrive(from("B")), JoinOutcome::Waiting { remaining: 1 });
        assert_eq!(barrier.arrived(), 1);

        match barrier.arrive(from("C")) {
            JoinOutcome::Released(batch) => {
                assert_eq!(batch.len(), 2);
                assert_eq!(batch[0].source(), Some("B"));
                assert_eq!(batch[1].source(), Some("C"));
            }
            other => panic!("Expected release, got {:?}", other),
        }

        assert_eq!(barrier.arrived(), 0);
        assert_eq!(barrier.remaining(), 2);
    }

    #[test]
    fn test_count_based_accepts_repeats_from_one_source() {
        let mut barrier = JoinBarrier::new(2, JoinPolicy::CountBased);

        assert!(!barrier.arrive(from("B")).is_released());
        assert!(barrier.arrive(from("B")).is_released());
        assert_eq!(barrier.deferred(), 0);
    }

    #[test]
    fn test_every_batch_is_exactly_required_size() {
        let mut barrier = JoinBarrier::new(3, JoinPolicy::CountBased);
        let mut releases = Vec::new();

        for i in 0..10 {
            if let JoinOutcome::Released(batch) = barrier.arrive(from(&format!("P{}", i))) {
                releases.push(batch.len());
            }
        }

        assert_eq!(releases, vec![3, 3, 3]);
        assert_eq!(barrier.arrived(), 1);
    }

    #[test]
    fn test_distinct_source_defers_repeats() {
        let mut barrier = JoinBarrier::new(2, JoinPolicy::DistinctSource);

        assert_eq!(barrier.arrive(from("B")), JoinOutcome::Waiting { remaining: 1 });
        assert_eq!(barrier.arrive(from("B")), JoinOutcome::Waiting { remaining: 1 });
        assert_eq!(barrier.deferred(), 1);

        let batch = match barrier.arrive(from("C")) {
            JoinOutcome::Released(batch) => batch,
            other => panic!("Expected release, got {:?}", other),
        };
        let sources: Vec<_> = batch.iter().map(|m| m.source()).collect();
        assert_eq!(sources, vec![Some("B"), Some("C")]);

        // the deferred B arrival opens the next batch
        assert_eq!(barrier.resume(), None);
        assert_eq!(barrier.arrived(), 1);
        assert_eq!(barrier.deferred(), 0);
    }

    #[test]
    fn test_resume_can_release_a_full_batch() {
        let mut barrier = JoinBarrier::new(2, JoinPolicy::DistinctSource);

        barrier.arrive(from("B"));
        barrier.arrive(from("B"));
        barrier.arrive(from("C"));
        barrier.arrive(from("C"));
        assert_eq!(barrier.deferred(), 1);

        // B + C released on the third arrival; the fourth went straight into the new batch
        assert_eq!(barrier.arrived(), 1);
        let batch = barrier.resume().expect("deferred B completes the batch");
        assert_eq!(batch.len(), 2);
        assert_eq!(barrier.arrived(), 0);
        assert_eq!(barrier.resume(), None);
    }

    #[test]
    fn test_single_arrival_join_releases_each_time() {
        let mut barrier = JoinBarrier::new(1, JoinPolicy::CountBased);
        assert!(barrier.arrive(from("D")).is_released());
        assert!(barrier.arrive(from("D")).is_released());
    }

    #[test]
    fn test_zero_requirement_is_clamped_to_one() {
        let barrier = JoinBarrier::new(0, JoinPolicy::CountBased);
        assert_eq!(barrier.required(), 1);
        assert_eq!(barrier.policy(), JoinPolicy::CountBased);
    }
}
