//! Slab-backed storage for the connection's live streams, keyed both by a
//! dense `Key` (for O(1) access once resolved) and by the wire `StreamId`
//! (for demultiplexing inbound frames).

use std::ops;

use fnv::FnvHashMap;

use crate::frame::StreamId;

use super::stream::Stream;

#[derive(Debug)]
pub(crate) struct Store {
    slab: slab::Slab<Stream>,
    ids: FnvHashMap<StreamId, usize>,
}

/// A resolved handle into the store. Kept short-lived: `Key` is the
/// long-lived reference, `Ptr` just borrows the slab for one access.
pub(crate) struct Ptr<'a> {
    key: Key,
    slab: &'a mut slab::Slab<Stream>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct Key(usize);

impl Store {
    pub fn new() -> Store {
        Store {
            slab: slab::Slab::new(),
            ids: FnvHashMap::default(),
        }
    }

    pub fn find_by_id(&mut self, id: StreamId) -> Option<Ptr<'_>> {
        let key = *self.ids.get(&id)?;
        Some(Ptr {
            key: Key(key),
            slab: &mut self.slab,
        })
    }

    /// Inserts a stream that already has an id (remotely created, e.g. a
    /// push-promise child). Locally created streams start life unindexed --
    /// see `insert_unassigned` -- until the framer assigns them one.
    pub fn insert(&mut self, id: StreamId, stream: Stream) -> Key {
        let key = self.slab.insert(stream);
        let prev = self.ids.insert(id, key);
        assert!(prev.is_none(), "duplicate stream id {}", id);
        Key(key)
    }

    /// Inserts a locally created stream before it has a wire id.
    pub fn insert_unassigned(&mut self, stream: Stream) -> Key {
        Key(self.slab.insert(stream))
    }

    /// Indexes a previously-unassigned stream once the framer allocates it
    /// an id at serialization time.
    pub fn assign_id(&mut self, key: Key, id: StreamId) {
        let prev = self.ids.insert(id, key.0);
        assert!(prev.is_none(), "duplicate stream id {}", id);
    }

    pub fn remove(&mut self, key: Key) -> Stream {
        let stream = self.slab.remove(key.0);
        if !stream.stream_id().is_unassigned() {
            self.ids.remove(&stream.stream_id());
        }
        stream
    }

}

impl ops::Index<Key> for Store {
    type Output = Stream;

    fn index(&self, key: Key) -> &Stream {
        &self.slab[key.0]
    }
}

impl ops::IndexMut<Key> for Store {
    fn index_mut(&mut self, key: Key) -> &mut Stream {
        &mut self.slab[key.0]
    }
}

impl<'a> Ptr<'a> {
    pub fn key(&self) -> Key {
        self.key
    }
}

impl<'a> ops::Deref for Ptr<'a> {
    type Target = Stream;

    fn deref(&self) -> &Stream {
        &self.slab[self.key.0]
    }
}

impl<'a> ops::DerefMut for Ptr<'a> {
    fn deref_mut(&mut self) -> &mut Stream {
        &mut self.slab[self.key.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::streams::stream::Stream;

    #[test]
    fn insert_then_find_by_id_round_trips() {
        let mut store = Store::new();
        let id = StreamId::from(1);
        store.insert(id, Stream::new_idle(id));

        assert!(store.find_by_id(id).is_some());
        assert!(store.find_by_id(StreamId::from(3)).is_none());
    }

    #[test]
    fn unassigned_stream_becomes_findable_after_assign_id() {
        let mut store = Store::new();
        let key = store.insert_unassigned(Stream::new_init(65_535));
        let id = StreamId::from(1);

        assert!(store.find_by_id(id).is_none());
        store.assign_id(key, id);
        assert!(store.find_by_id(id).is_some());
    }
}
