//! Registry-wide configuration.

/// Near-equality tolerance used when nothing else is configured.
///
/// Base value writes and recalculated values closer than this to the
/// previous value are treated as unchanged.
pub const DEFAULT_EPSILON: f32 = 1.0e-4;

/// Configuration shared by every property a registry creates.
///
/// [`PropertiesPlugin`](crate::PropertiesPlugin) keeps one per registry type in
/// a [`RegistryDefaults`](crate::RegistryDefaults) resource and builds
/// auto-inserted registries from it.
///
/// # Examples
///
/// ```rust
/// use cascade_props::prelude::*;
///
/// let settings = RegistrySettings::default();
/// assert_eq!(settings.epsilon, DEFAULT_EPSILON);
///
/// // Every difference counts, no matter how small
/// let exact = RegistrySettings::exact();
/// assert_eq!(exact.epsilon, 0.0);
///
/// let registry = CascadeRegistry::with_settings(RegistrySettings::with_epsilon(0.01));
/// assert_eq!(registry.settings().epsilon, 0.01);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegistrySettings {
    /// Values within this distance of each other are considered equal
    pub epsilon: f32,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            epsilon: DEFAULT_EPSILON,
        }
    }
}

impl RegistrySettings {
    /// Settings with a custom tolerance. Negative input is taken as its magnitude.
    #[must_use]
    pub fn with_epsilon(epsilon: f32) -> Self {
        Self {
            epsilon: epsilon.abs(),
        }
    }

    /// Settings where any difference at all is a change.
    #[must_use]
    pub fn exact() -> Self {
        Self::with_epsilon(0.0)
    }

    /// True if `a` and `b` are within this tolerance.
    #[inline]
    #[must_use]
    pub fn nearly_equal(&self, a: f32, b: f32) -> bool {
        nearly_equal(a, b, self.epsilon)
    }
}

/// True if `a` and `b` differ by at most `epsilon`.
#[inline]
#[must_use]
pub fn nearly_equal(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() <= epsilon
}
