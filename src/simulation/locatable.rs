//! Trait for entities that have a position and an identity.
//!
//! Spatial queries (closest entity, vision cone) are written once against this
//! trait and serve creatures and food points alike.

use ndarray::Array1;

/// Trait for entities with a position on the world plane.
///
/// Any type that implements this trait:
/// - Has a position in 2D space
/// - Has an identity stable for its whole lifetime
pub trait Locatable {
    /// Returns a reference to the entity's position.
    fn pos(&self) -> &Array1<f64>;

    /// Returns the entity's unique identifier.
    fn id(&self) -> u64;
}
