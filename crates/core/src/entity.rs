//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Server records keep their identity across page visits even though the
/// client only ever holds a read-only snapshot of them.
pub trait Entity {
    /// Strongly-typed record identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the record identifier.
    fn id(&self) -> &Self::Id;
}
