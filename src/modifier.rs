//! Prioritized value transforms.

use serde::{Deserialize, Serialize};

/// The transform a [`Modifier`] performs.
///
/// Every variant is a pure function of the property's base value, the running
/// value produced by earlier modifiers, and its own parameter:
/// - `Identity` leaves the running value untouched
/// - `Add(k)` adds `k`
/// - `AddScaledBase(k)` adds `base * k`, so `AddScaledBase(0.1)` is "+10% of base"
/// - `Scale(k)` multiplies the running value by `k`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum ModifierKind {
    /// No-op
    #[default]
    Identity,
    /// Flat additive constant
    Add(f32),
    /// Additive fraction of the base value
    AddScaledBase(f32),
    /// Multiplier on the running value
    Scale(f32),
}

impl ModifierKind {
    /// Applies the transform to `current`, given the property's `base`.
    #[inline]
    #[must_use]
    pub fn apply(&self, base: f32, current: f32) -> f32 {
        match self {
            Self::Identity => current,
            Self::Add(k) => current + k,
            Self::AddScaledBase(k) => current + base * k,
            Self::Scale(k) => current * k,
        }
    }

    /// The variant's parameter, or `None` for `Identity`.
    #[inline]
    #[must_use]
    pub fn parameter(&self) -> Option<f32> {
        match self {
            Self::Identity => None,
            Self::Add(k) | Self::AddScaledBase(k) | Self::Scale(k) => Some(*k),
        }
    }
}

/// A transform plus the priority it is applied at.
///
/// Lower priorities apply first. Equal priorities keep the order in which the
/// modifiers were added to a property.
///
/// Modifiers are plain values: two modifiers with the same priority and kind
/// are interchangeable, which is what [`Property::remove_modifier`] matches on.
///
/// # Examples
///
/// ```rust
/// use cascade_props::Modifier;
///
/// let bonus = Modifier::add(10.0).with_priority(-1);
/// assert_eq!(bonus.apply(100.0, 100.0), 110.0);
///
/// let percent_of_base = Modifier::add_scaled_base(0.25);
/// assert_eq!(percent_of_base.apply(100.0, 120.0), 145.0);
///
/// assert!((Modifier::scale(1.2).apply(100.0, 110.0) - 132.0).abs() < 1e-4);
/// ```
///
/// [`Property::remove_modifier`]: crate::Property::remove_modifier
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Modifier {
    /// Application order, ascending
    pub priority: i32,
    /// What the modifier does
    pub kind: ModifierKind,
}

impl Modifier {
    /// Creates a modifier at priority 0.
    #[inline]
    #[must_use]
    pub const fn new(kind: ModifierKind) -> Self {
        Self { priority: 0, kind }
    }

    /// A modifier that changes nothing.
    #[inline]
    #[must_use]
    pub const fn identity() -> Self {
        Self::new(ModifierKind::Identity)
    }

    /// Adds a flat constant.
    #[inline]
    #[must_use]
    pub const fn add(value: f32) -> Self {
        Self::new(ModifierKind::Add(value))
    }

    /// Adds `base * multiplier`.
    #[inline]
    #[must_use]
    pub const fn add_scaled_base(multiplier: f32) -> Self {
        Self::new(ModifierKind::AddScaledBase(multiplier))
    }

    /// Multiplies the running value.
    #[inline]
    #[must_use]
    pub const fn scale(multiplier: f32) -> Self {
        Self::new(ModifierKind::Scale(multiplier))
    }

    /// Returns this modifier at a different priority.
    #[inline]
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Applies the transform; see [`ModifierKind::apply`].
    #[inline]
    #[must_use]
    pub fn apply(&self, base: f32, current: f32) -> f32 {
        self.kind.apply(base, current)
    }
}

impl From<ModifierKind> for Modifier {
    fn from(kind: ModifierKind) -> Self {
        Self::new(kind)
    }
}
