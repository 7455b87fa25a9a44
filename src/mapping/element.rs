//! The Left/Right pair shared by every mapper node.

use std::sync::Arc;

use strum::{Display, EnumIter, EnumString};

/// Which version of the library a symbol belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumIter, EnumString,
)]
pub enum ElementSide {
    /// The baseline version
    Left,
    /// The version checked for compatibility against the baseline
    Right,
}

impl ElementSide {
    /// The other side.
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            ElementSide::Left => ElementSide::Right,
            ElementSide::Right => ElementSide::Left,
        }
    }
}

/// Occupancy of a mapper node. There is no empty state.
#[derive(Debug)]
pub enum MapperState<T> {
    /// Present on the Left only: removed in Right
    LeftOnly(Arc<T>),
    /// Present on the Right only: added in Right
    RightOnly(Arc<T>),
    /// Present on both sides
    Both(Arc<T>, Arc<T>),
}

impl<T> Clone for MapperState<T> {
    fn clone(&self) -> Self {
        match self {
            MapperState::LeftOnly(left) => MapperState::LeftOnly(left.clone()),
            MapperState::RightOnly(right) => MapperState::RightOnly(right.clone()),
            MapperState::Both(left, right) => MapperState::Both(left.clone(), right.clone()),
        }
    }
}

/// An ordered pair of the same declaration in the Left and the Right version.
///
/// Created from one side; the other side is filled in once a matching symbol is seen.
#[derive(Debug, Clone)]
pub struct ElementMapper<T> {
    state: MapperState<T>,
}

impl<T> ElementMapper<T> {
    /// Create a mapper with `element` on `side`.
    pub fn new(element: Arc<T>, side: ElementSide) -> Self {
        let state = match side {
            ElementSide::Left => MapperState::LeftOnly(element),
            ElementSide::Right => MapperState::RightOnly(element),
        };
        Self { state }
    }

    /// Record `element` on `side`, replacing whatever was there.
    pub(crate) fn set(&mut self, element: Arc<T>, side: ElementSide) {
        self.state = match (&self.state, side) {
            (MapperState::LeftOnly(_), ElementSide::Left) => MapperState::LeftOnly(element),
            (MapperState::RightOnly(_), ElementSide::Right) => MapperState::RightOnly(element),
            (MapperState::LeftOnly(left), ElementSide::Right)
            | (MapperState::Both(left, _), ElementSide::Right) => {
                MapperState::Both(left.clone(), element)
            }
            (MapperState::RightOnly(right), ElementSide::Left)
            | (MapperState::Both(_, right), ElementSide::Left) => {
                MapperState::Both(element, right.clone())
            }
        };
    }

    /// Current occupancy.
    #[must_use]
    pub fn state(&self) -> &MapperState<T> {
        &self.state
    }

    /// The Left element, if present.
    #[must_use]
    pub fn left(&self) -> Option<&Arc<T>> {
        match &self.state {
            MapperState::LeftOnly(left) | MapperState::Both(left, _) => Some(left),
            MapperState::RightOnly(_) => None,
        }
    }

    /// The Right element, if present.
    #[must_use]
    pub fn right(&self) -> Option<&Arc<T>> {
        match &self.state {
            MapperState::RightOnly(right) | MapperState::Both(_, right) => Some(right),
            MapperState::LeftOnly(_) => None,
        }
    }

    /// The element on `side`, if present.
    #[must_use]
    pub fn get(&self, side: ElementSide) -> Option<&Arc<T>> {
        match side {
            ElementSide::Left => self.left(),
            ElementSide::Right => self.right(),
        }
    }

    /// Both elements, if both sides are present.
    #[must_use]
    pub fn both(&self) -> Option<(&Arc<T>, &Arc<T>)> {
        match &self.state {
            MapperState::Both(left, right) => Some((left, right)),
            _ => None,
        }
    }

    /// The Left element if present, otherwise the Right one.
    #[must_use]
    pub fn representative(&self) -> &Arc<T> {
        match &self.state {
            MapperState::LeftOnly(element)
            | MapperState::RightOnly(element)
            | MapperState::Both(element, _) => element,
        }
    }
}
