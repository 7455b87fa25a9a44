use std::{ops::Deref, sync::Arc};

use crate::{
    mapping::element::{ElementMapper, ElementSide},
    symbols::MemberDefinition,
};

/// A member present in Left, Right or both.
///
/// Rules receive the owning [`crate::mapping::TypeMapper`] next to the member mapper, so no
/// back-reference is stored here.
#[derive(Debug, Clone)]
pub struct MemberMapper {
    element: ElementMapper<MemberDefinition>,
}

impl MemberMapper {
    pub(crate) fn new(member: Arc<MemberDefinition>, side: ElementSide) -> Self {
        Self {
            element: ElementMapper::new(member, side),
        }
    }

    pub(crate) fn add(&mut self, member: Arc<MemberDefinition>, side: ElementSide) {
        self.element.set(member, side);
    }

    /// Display name of the member, taken from the Left side when present.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.representative().full_name()
    }
}

impl Deref for MemberMapper {
    type Target = ElementMapper<MemberDefinition>;

    fn deref(&self) -> &Self::Target {
        &self.element
    }
}
