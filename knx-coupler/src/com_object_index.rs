//! Ordered index of the attached communication objects
//!
//! Every received telegram has its target address looked up here, so the table is sorted by
//! address once, when the object list is attached, and searched by bisection afterwards.

use defmt_or_log::{debug, warn};
use knx_common::ComObject;

/// Maximum number of communication objects which can be attached to a coupler
///
/// Object indices are reported as bytes, so this is the largest list that can be addressed.
pub const MAX_COM_OBJECTS: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexEntry {
    address: u16,
    index: u8,
}

/// Maps group addresses to the position of the object in the attached list
///
/// Only objects with the communication flag set are indexed. When several objects share an
/// address, the one with the lowest position in the list wins.
#[derive(Debug, Clone, Default)]
pub struct ComObjectIndex {
    // Strictly increasing by address
    table: heapless::Vec<IndexEntry, MAX_COM_OBJECTS>,
}

impl ComObjectIndex {
    /// Create an empty index
    pub const fn new() -> Self {
        Self {
            table: heapless::Vec::new(),
        }
    }

    /// Build the index for a list of objects
    ///
    /// Empty lists, lists without any communication enabled object, and duplicate addresses are
    /// not errors: a warning is logged and the affected objects are simply left out of the index.
    pub fn build<O: ComObject>(objects: &[O]) -> Self {
        let mut index = Self::new();

        if objects.is_empty() {
            warn!("Attached communication object list is empty");
            return index;
        }
        let objects = if objects.len() > MAX_COM_OBJECTS {
            warn!(
                "Communication object list has {} entries, only the first {} are indexed",
                objects.len(),
                MAX_COM_OBJECTS
            );
            &objects[..MAX_COM_OBJECTS]
        } else {
            objects
        };

        let enabled = objects
            .iter()
            .filter(|obj| obj.is_communication_enabled())
            .count();
        if enabled == 0 {
            warn!("No object with communication flag in the attached list");
            return index;
        }

        // Deduct duplicate addresses, keeping the first occurrence
        let mut assigned = enabled;
        for (i, obj) in objects.iter().enumerate() {
            if !obj.is_communication_enabled() {
                continue;
            }
            let first = objects.iter().position(|other| {
                other.is_communication_enabled() && other.address() == obj.address()
            });
            if first != Some(i) {
                assigned -= 1;
                warn!(
                    "Duplicate address {:#x} on object {}, ignored",
                    obj.address(),
                    i
                );
            }
        }

        // Repeatedly select the smallest address above the last one selected. The strict
        // comparison keeps the lowest position among duplicates.
        let mut floor: u32 = 0;
        for _ in 0..assigned {
            let mut found: Option<IndexEntry> = None;
            for (j, obj) in objects.iter().enumerate() {
                if !obj.is_communication_enabled() || u32::from(obj.address()) < floor {
                    continue;
                }
                if found.map_or(true, |entry| obj.address() < entry.address) {
                    found = Some(IndexEntry {
                        address: obj.address(),
                        index: j as u8,
                    });
                }
            }
            let Some(entry) = found else {
                break;
            };
            if index.table.push(entry).is_err() {
                break;
            }
            floor = u32::from(entry.address) + 1;
        }

        debug!(
            "Indexed {} communication objects out of {}",
            index.table.len(),
            objects.len()
        );
        index
    }

    /// Find the position in the attached list of the object listening to `address`
    pub fn find(&self, address: u16) -> Option<u8> {
        self.table
            .binary_search_by_key(&address, |entry| entry.address)
            .ok()
            .map(|pos| self.table[pos].index)
    }

    /// Number of indexed objects
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// True if no object is indexed
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterate over the list positions, in ascending address order
    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.table.iter().map(|entry| entry.index)
    }
}
