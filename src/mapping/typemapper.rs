use std::{ops::Deref, sync::Arc};

use crate::{
    identity::SymbolIdentity,
    mapping::{
        element::{ElementMapper, ElementSide},
        index::MapperIndex,
        member::MemberMapper,
        settings::MapperSettings,
    },
    symbols::TypeDefinition,
};

/// A type present in Left, Right or both, with its correlated members.
///
/// Nested types get their own [`TypeMapper`] in the owning
/// [`crate::mapping::AssemblyMapper`]; they are not children of this node.
#[derive(Debug)]
pub struct TypeMapper {
    element: ElementMapper<TypeDefinition>,
    members: MapperIndex<MemberMapper>,
}

impl TypeMapper {
    pub(crate) fn new(ty: Arc<TypeDefinition>, side: ElementSide, settings: &MapperSettings) -> Self {
        let mut mapper = Self {
            element: ElementMapper::new(ty.clone(), side),
            members: MapperIndex::new(),
        };
        mapper.add_members(&ty, side, settings);
        mapper
    }

    /// Record `ty` on `side` and correlate its members.
    pub(crate) fn add(&mut self, ty: Arc<TypeDefinition>, side: ElementSide, settings: &MapperSettings) {
        self.element.set(ty.clone(), side);
        self.add_members(&ty, side, settings);
    }

    fn add_members(&mut self, ty: &TypeDefinition, side: ElementSide, settings: &MapperSettings) {
        let comparer = *settings.identity();

        for member in ty.members.iter().filter(|m| settings.include_member(m)) {
            let hash = member.identity_hash(&comparer);
            let existing = self.members.position(hash, |mapper| {
                mapper.representative().same_identity(member, &comparer)
            });

            match existing.and_then(|index| self.members.get_mut(index)) {
                Some(mapper) => mapper.add(member.clone(), side),
                None => self.members.push(hash, MemberMapper::new(member.clone(), side)),
            }
        }
    }

    /// Correlated members in first-seen order (Left members first).
    #[must_use]
    pub fn members(&self) -> &[MemberMapper] {
        self.members.as_slice()
    }

    /// Find the first member mapper with the given name.
    #[must_use]
    pub fn find_member(&self, name: &str) -> Option<&MemberMapper> {
        self.members()
            .iter()
            .find(|mapper| mapper.representative().name == name)
    }

    /// Full name of the type, taken from the Left side when present.
    #[must_use]
    pub fn full_name(&self) -> String {
        self.representative().full_name()
    }
}

impl Deref for TypeMapper {
    type Target = ElementMapper<TypeDefinition>;

    fn deref(&self) -> &Self::Target {
        &self.element
    }
}
