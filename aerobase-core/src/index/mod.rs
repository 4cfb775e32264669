//! Immutable spatial index over positioned reference data.
//!
//! [`GeoIndex`] bulk-loads an R\*-tree over entity positions in lon/lat space
//! (`x = longitude`, `y = latitude`). The tree is only a prefilter: every
//! answer is confirmed with the great-circle distance from
//! [`crate::distance::haversine_nm`], so results are exact on the sphere even
//! though the tree itself is planar.
//!
//! Entities are sorted by identifier before loading, which makes the tree and
//! every query result independent of the order entities were supplied in.
//!
//! # Examples
//! ```
//! use aerobase_core::{Airport, Coordinate, GeoIndex};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let airports = vec![
//!     Airport::new("AP001", "ZBAA", "Beijing Capital", Coordinate::new(40.0801, 116.5846)?)?,
//!     Airport::new("AP002", "ZSPD", "Shanghai Pudong", Coordinate::new(31.1443, 121.8083)?)?,
//! ];
//! let index = GeoIndex::build(airports)?;
//!
//! let beijing = Coordinate::new(39.9042, 116.4074)?;
//! let hits = index.find_within(beijing, 50.0);
//! assert_eq!(hits.len(), 1);
//! assert_eq!(hits[0].entity.icao, "ZBAA");
//! # Ok(())
//! # }
//! ```

use std::cmp::Ordering;

use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

use crate::{
    distance::{bounding_box_for_radius, haversine_nm},
    model::Coordinate,
};

mod nearest;

/// Something with a stable identifier and a position.
pub trait Positioned {
    /// Unique identifier within its entity kind.
    fn id(&self) -> &str;

    /// Position of the entity.
    fn coordinate(&self) -> Coordinate;
}

/// An entity paired with its great-circle distance from a query point.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Proximity<T> {
    /// The matched entity.
    pub entity: T,
    /// Distance from the query point in nautical miles.
    pub distance_nm: f64,
}

impl<T: Clone> Proximity<&T> {
    /// Detach the result from the index it borrows.
    pub fn cloned(self) -> Proximity<T> {
        Proximity {
            entity: self.entity.clone(),
            distance_nm: self.distance_nm,
        }
    }
}

/// Errors raised while building a [`GeoIndex`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Two entities shared an identifier.
    #[error("duplicate identifier {id} in index input")]
    DuplicateId {
        /// Identifier that appeared more than once.
        id: String,
    },
}

/// Tree entry pointing back into the id-sorted entity table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IndexEntry {
    slot: usize,
    position: [f64; 2],
}

impl RTreeObject for IndexEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

/// Read-only spatial index answering radius and nearest-neighbour queries.
#[derive(Debug, Clone)]
pub struct GeoIndex<T> {
    entities: Vec<T>,
    tree: RTree<IndexEntry>,
}

impl<T: Positioned> GeoIndex<T> {
    /// Build an index in one bulk-load pass.
    ///
    /// # Errors
    /// Returns [`IndexError::DuplicateId`] when two entities share an id.
    pub fn build(entities: impl IntoIterator<Item = T>) -> Result<Self, IndexError> {
        let mut entities: Vec<T> = entities.into_iter().collect();
        entities.sort_by(|a, b| a.id().cmp(b.id()));
        if let Some(pair) = entities.windows(2).find(|pair| pair[0].id() == pair[1].id()) {
            return Err(IndexError::DuplicateId {
                id: pair[0].id().to_owned(),
            });
        }

        let entries = entities
            .iter()
            .enumerate()
            .map(|(slot, entity)| IndexEntry {
                slot,
                position: entity.coordinate().to_xy(),
            })
            .collect();
        let tree = RTree::bulk_load(entries);
        log::debug!("built geo-index over {} entities", entities.len());
        Ok(Self { entities, tree })
    }

    /// An index with no entities.
    pub fn empty() -> Self {
        Self {
            entities: Vec::new(),
            tree: RTree::new(),
        }
    }

    /// Every entity within `radius_nm` of `center`, nearest first.
    ///
    /// Ties in distance are ordered by identifier. A radius that is not a
    /// positive finite number yields no results.
    pub fn find_within(&self, center: Coordinate, radius_nm: f64) -> Vec<Proximity<&T>> {
        if !radius_nm.is_finite() || radius_nm <= 0.0 || self.entities.is_empty() {
            return Vec::new();
        }

        let bbox = bounding_box_for_radius(center, radius_nm);
        let mut hits: Vec<(f64, usize)> = bbox
            .rects()
            .iter()
            .flat_map(|rect| {
                let envelope = AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                );
                self.tree.locate_in_envelope_intersecting(&envelope)
            })
            .filter_map(|entry| {
                let distance = haversine_nm(center, self.entities[entry.slot].coordinate());
                (distance <= radius_nm).then_some((distance, entry.slot))
            })
            .collect();
        hits.sort_by(by_distance_then_slot);
        hits.dedup_by_key(|(_, slot)| *slot);

        hits.into_iter().map(|hit| self.proximity(hit)).collect()
    }

    /// The single closest entity to `center`, or `None` when the index is
    /// empty. Equidistant entities resolve to the smallest identifier.
    pub fn find_nearest(&self, center: Coordinate) -> Option<Proximity<&T>> {
        self.find_k_nearest(center, 1).into_iter().next()
    }

    /// Up to `k` entities closest to `center`, nearest first.
    pub fn find_k_nearest(&self, center: Coordinate, k: usize) -> Vec<Proximity<&T>> {
        nearest::k_nearest(&self.tree, center, k, |slot| {
            self.entities[slot].coordinate()
        })
        .into_iter()
        .map(|hit| self.proximity(hit))
        .collect()
    }

    /// Look up an entity by identifier.
    pub fn get(&self, id: &str) -> Option<&T> {
        self.entities
            .binary_search_by(|entity| entity.id().cmp(id))
            .ok()
            .map(|slot| &self.entities[slot])
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the index holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entities.iter()
    }

    fn proximity(&self, (distance_nm, slot): (f64, usize)) -> Proximity<&T> {
        Proximity {
            entity: &self.entities[slot],
            distance_nm,
        }
    }
}

impl<T: Positioned> Default for GeoIndex<T> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Slots follow identifier order, so this is "distance, then id".
pub(crate) fn by_distance_then_slot(a: &(f64, usize), b: &(f64, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then_with(|| a.1.cmp(&b.1))
}
