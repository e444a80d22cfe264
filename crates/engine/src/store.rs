// debughub - Debugger Coordination Hub
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Ordered breakpoint and watchpoint stores with change notification.
//!
//! Every mutation is published to subscribers as a [`StoreEvent`]. Changes and
//! removals are announced in two phases: a `Before*` event carrying the old
//! entries is sent before the store is touched, and an `After*`/`Removed` event
//! follows once it is. A subscriber that mirrors the store elsewhere can
//! therefore retract the old entry before it learns about the new one.

use std::{fmt::Debug, ops::RangeInclusive, path::PathBuf};

use debughub_common::{Breakpoint, WatchTrigger, Watchpoint};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::trace;

/// An entry that can live in a [`Store`].
pub trait StoreEntry: Clone + Debug + Send + 'static {
    /// Identity used by [`Store::find_index`].
    type Key: PartialEq + Debug;

    /// Returns the identity of this entry.
    fn key(&self) -> Self::Key;

    /// Sets the enabled flag.
    fn set_enabled(&mut self, enabled: bool);

    /// Sets the ignore count.
    fn set_ignore_count(&mut self, count: u32);
}

impl StoreEntry for Breakpoint {
    type Key = (PathBuf, u32);

    fn key(&self) -> Self::Key {
        self.location()
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn set_ignore_count(&mut self, count: u32) {
        self.ignore_count = count;
    }
}

impl StoreEntry for Watchpoint {
    type Key = (String, WatchTrigger);

    fn key(&self) -> Self::Key {
        Watchpoint::key(self)
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn set_ignore_count(&mut self, count: u32) {
        self.ignore_count = count;
    }
}

/// A change notification published by a [`Store`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent<T> {
    /// `entries` were appended at `range`.
    Inserted {
        /// Positions of the new entries
        range: RangeInclusive<usize>,
        /// The new entries, in order
        entries: Vec<T>,
    },
    /// The entries at `range` are about to change.
    BeforeChange {
        /// Positions of the changing entries
        range: RangeInclusive<usize>,
        /// Entries before the change
        old: Vec<T>,
    },
    /// The entries at `range` have changed.
    AfterChange {
        /// Positions of the changed entries
        range: RangeInclusive<usize>,
        /// Entries after the change
        new: Vec<T>,
    },
    /// The entries at `range` are about to be removed.
    BeforeRemove {
        /// Positions of the entries being removed
        range: RangeInclusive<usize>,
        /// The entries being removed
        old: Vec<T>,
    },
    /// The entries formerly at `range` are gone.
    Removed {
        /// Positions the removed entries occupied
        range: RangeInclusive<usize>,
    },
}

/// Ordered collection of entries with typed publish/subscribe notification.
///
/// Duplicate keys are accepted; [`Store::find_index`] returns the first match.
/// Positions outside the store are ignored by every write and yield `None` on reads.
#[derive(Debug)]
pub struct Store<T: StoreEntry> {
    entries: Vec<T>,
    subscribers: Vec<UnboundedSender<StoreEvent<T>>>,
}

/// Store of line breakpoints.
pub type BreakpointStore = Store<Breakpoint>;

/// Store of watch expressions.
pub type WatchpointStore = Store<Watchpoint>;

impl<T: StoreEntry> Default for Store<T> {
    fn default() -> Self {
        Self { entries: Vec::new(), subscribers: Vec::new() }
    }
}

impl<T: StoreEntry> Store<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber. Dropping the receiver unsubscribes it.
    pub fn subscribe(&mut self) -> UnboundedReceiver<StoreEvent<T>> {
        let (tx, rx) = unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    fn publish(&mut self, event: StoreEvent<T>) {
        trace!(?event, "store event");
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Appends one entry and returns its position.
    pub fn add(&mut self, entry: T) -> usize {
        let position = self.entries.len();
        self.entries.push(entry.clone());
        self.publish(StoreEvent::Inserted { range: position..=position, entries: vec![entry] });
        position
    }

    /// Appends a block of entries, announced by a single `Inserted` event.
    ///
    /// Returns the range the entries occupy, or `None` for an empty batch.
    pub fn add_batch(&mut self, entries: Vec<T>) -> Option<RangeInclusive<usize>> {
        if entries.is_empty() {
            return None;
        }
        let first = self.entries.len();
        let range = first..=first + entries.len() - 1;
        self.entries.extend(entries.iter().cloned());
        self.publish(StoreEvent::Inserted { range: range.clone(), entries });
        Some(range)
    }

    /// Applies `edit` to the entry at `position` with before/after notification.
    fn modify_at(&mut self, position: usize, edit: impl FnOnce(&mut T)) -> bool {
        let Some(old) = self.entries.get(position).cloned() else {
            return false;
        };
        self.publish(StoreEvent::BeforeChange { range: position..=position, old: vec![old] });
        let entry = &mut self.entries[position];
        edit(entry);
        let new = entry.clone();
        self.publish(StoreEvent::AfterChange { range: position..=position, new: vec![new] });
        true
    }

    /// Replaces the entry at `position`.
    pub fn set_at(&mut self, position: usize, entry: T) -> bool {
        self.modify_at(position, |slot| *slot = entry)
    }

    /// Enables or disables the entry at `position`.
    pub fn set_enabled_at(&mut self, position: usize, enabled: bool) -> bool {
        self.modify_at(position, |slot| slot.set_enabled(enabled))
    }

    /// Sets the ignore count of the entry at `position`.
    pub fn set_ignore_count_at(&mut self, position: usize, count: u32) -> bool {
        self.modify_at(position, |slot| slot.set_ignore_count(count))
    }

    /// Removes the entry at `position`.
    pub fn delete_at(&mut self, position: usize) -> bool {
        let Some(old) = self.entries.get(position).cloned() else {
            return false;
        };
        self.publish(StoreEvent::BeforeRemove { range: position..=position, old: vec![old] });
        self.entries.remove(position);
        self.publish(StoreEvent::Removed { range: position..=position });
        true
    }

    /// Removes several entries, highest position first. Invalid positions are skipped.
    ///
    /// Returns the number of removed entries.
    pub fn delete_batch(&mut self, positions: &[usize]) -> usize {
        let mut positions = positions.to_vec();
        positions.sort_unstable();
        positions.dedup();
        positions.into_iter().rev().filter(|&position| self.delete_at(position)).count()
    }

    /// Removes every entry. An empty store publishes nothing.
    pub fn delete_all(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let range = 0..=self.entries.len() - 1;
        self.publish(StoreEvent::BeforeRemove { range: range.clone(), old: self.entries.clone() });
        self.entries.clear();
        self.publish(StoreEvent::Removed { range });
    }

    /// Returns the position of the first entry with the given key.
    pub fn find_index(&self, key: &T::Key) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key() == *key)
    }

    /// Returns a copy of the entry at `position`.
    pub fn get(&self, position: usize) -> Option<T> {
        self.entries.get(position).cloned()
    }

    /// Returns a copy of every entry, in order.
    pub fn get_all(&self) -> Vec<T> {
        self.entries.clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the store holds no entry.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Store<Breakpoint> {
    /// Sets or clears the condition of the breakpoint at `position`.
    pub fn set_condition_at(&mut self, position: usize, condition: &str) -> bool {
        self.modify_at(position, |slot| slot.set_condition(condition))
    }

    /// Sets the temporary flag of the breakpoint at `position`.
    pub fn set_temporary_at(&mut self, position: usize, temporary: bool) -> bool {
        self.modify_at(position, |slot| slot.temporary = temporary)
    }
}
