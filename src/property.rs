//! A single base value run through a modifier chain.

use crate::modifier::Modifier;
use crate::settings::{DEFAULT_EPSILON, nearly_equal};

/// A change of a property's computed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueChange {
    /// Value before the recalculation
    pub old: f32,
    /// Value after the recalculation
    pub new: f32,
}

/// A base value plus an ordered list of modifiers.
///
/// The cached [`value`](Self::value) always equals the base value folded
/// through the modifiers in ascending priority order. Every mutator that can
/// move the value returns `Some(ValueChange)` when it did move by more than
/// the property's epsilon, and `None` otherwise; the owning registry turns
/// that into its value-changed event.
///
/// # Examples
///
/// ```rust
/// use cascade_props::{Modifier, Property};
///
/// let mut armor = Property::new(100.0);
/// armor.add_modifier(Modifier::scale(1.2));
/// assert!((armor.value() - 120.0).abs() < 1e-4);
///
/// // Lower priority runs first: (100 + 10) * 1.2
/// let change = armor.add_modifier(Modifier::add(10.0).with_priority(-1)).unwrap();
/// assert!((change.old - 120.0).abs() < 1e-4);
/// assert!((change.new - 132.0).abs() < 1e-4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    base_value: f32,
    value: f32,
    modifiers: Vec<Modifier>,
    epsilon: f32,
}

impl Default for Property {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Property {
    /// Creates a property with no modifiers, using [`DEFAULT_EPSILON`].
    #[must_use]
    pub fn new(base_value: f32) -> Self {
        Self::with_epsilon(base_value, DEFAULT_EPSILON)
    }

    /// Creates a property with no modifiers and a custom change tolerance.
    #[must_use]
    pub fn with_epsilon(base_value: f32, epsilon: f32) -> Self {
        Self {
            base_value,
            value: base_value,
            modifiers: Vec::new(),
            epsilon: epsilon.abs(),
        }
    }

    /// The computed value.
    #[inline]
    #[must_use]
    pub fn value(&self) -> f32 {
        self.value
    }

    /// The value before modifiers.
    #[inline]
    #[must_use]
    pub fn base_value(&self) -> f32 {
        self.base_value
    }

    /// Modifiers in application order.
    #[inline]
    #[must_use]
    pub fn modifiers(&self) -> &[Modifier] {
        &self.modifiers
    }

    /// Change tolerance.
    #[inline]
    #[must_use]
    pub fn epsilon(&self) -> f32 {
        self.epsilon
    }

    /// What the value would be for `base_value` under the current modifiers.
    #[must_use]
    pub fn compute_for(&self, base_value: f32) -> f32 {
        self.modifiers
            .iter()
            .fold(base_value, |current, modifier| {
                modifier.apply(base_value, current)
            })
    }

    /// Recomputes the cached value from the base value.
    pub fn recalculate(&mut self) -> Option<ValueChange> {
        let old = self.value;
        self.value = self.compute_for(self.base_value);
        (!nearly_equal(old, self.value, self.epsilon)).then_some(ValueChange {
            old,
            new: self.value,
        })
    }

    /// Replaces the base value and recalculates.
    ///
    /// Writes within epsilon of the current base value are ignored entirely,
    /// which is what lets a cascade settle.
    pub fn set_base_value(&mut self, base_value: f32) -> Option<ValueChange> {
        if nearly_equal(self.base_value, base_value, self.epsilon) {
            return None;
        }
        self.base_value = base_value;
        self.recalculate()
    }

    /// Inserts a modifier after any existing ones of equal priority and recalculates.
    ///
    /// Passing `None` does nothing.
    pub fn add_modifier(&mut self, modifier: impl Into<Option<Modifier>>) -> Option<ValueChange> {
        let modifier = modifier.into()?;
        self.modifiers.push(modifier);
        // stable: equal priorities keep insertion order
        self.modifiers.sort_by_key(|m| m.priority);
        self.recalculate()
    }

    /// Removes the first modifier equal to `modifier`, then recalculates.
    ///
    /// The recalculation happens even if nothing matched.
    pub fn remove_modifier(&mut self, modifier: &Modifier) -> Option<ValueChange> {
        if let Some(index) = self.modifiers.iter().position(|m| m == modifier) {
            self.modifiers.remove(index);
        }
        self.recalculate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.001
    }

    #[test]
    fn new_property_value_equals_base() {
        let p = Property::new(42.0);
        assert_eq!(p.value(), 42.0);
        assert_eq!(p.base_value(), 42.0);
        assert!(p.modifiers().is_empty());
    }

    #[test]
    fn end_to_end_numeric_example() {
        let mut p = Property::new(100.0);
        p.add_modifier(Modifier::scale(1.2));
        assert!(approx(p.value(), 120.0));

        p.add_modifier(Modifier::add(10.0).with_priority(-1));
        assert!(approx(p.value(), 132.0));
        assert_eq!(p.modifiers()[0], Modifier::add(10.0).with_priority(-1));
    }

    #[test]
    fn recalculate_is_idempotent() {
        let mut p = Property::new(10.0);
        assert!(p.add_modifier(Modifier::add(5.0)).is_some());
        let value = p.value();

        assert_eq!(p.recalculate(), None);
        assert_eq!(p.recalculate(), None);
        assert_eq!(p.value(), value);
    }

    #[test]
    fn equal_priorities_keep_insertion_order() {
        let mut p = Property::new(10.0);
        p.add_modifier(Modifier::add(1.0));
        p.add_modifier(Modifier::add(2.0));
        assert!(approx(p.value(), 13.0));
        assert_eq!(p.modifiers(), &[Modifier::add(1.0), Modifier::add(2.0)]);

        p.remove_modifier(&Modifier::add(1.0));
        p.add_modifier(Modifier::add(1.0));
        assert_eq!(p.modifiers(), &[Modifier::add(2.0), Modifier::add(1.0)]);
        assert!(approx(p.value(), 13.0));
    }

    #[test]
    fn reinsertion_reorders_non_commutative_chain() {
        let mut p = Property::new(10.0);
        p.add_modifier(Modifier::add(1.0));
        p.add_modifier(Modifier::scale(2.0));
        // (10 + 1) * 2
        assert!(approx(p.value(), 22.0));

        let change = p.remove_modifier(&Modifier::add(1.0)).unwrap();
        assert!(approx(change.new, 20.0));
        p.add_modifier(Modifier::add(1.0));
        // 10 * 2 + 1
        assert!(approx(p.value(), 21.0));
    }

    #[test]
    fn priorities_sort_ascending() {
        let mut p = Property::new(10.0);
        p.add_modifier(Modifier::scale(3.0).with_priority(5));
        p.add_modifier(Modifier::add(2.0).with_priority(-5));
        p.add_modifier(Modifier::add(1.0));
        // ((10 + 2) + 1) * 3
        assert!(approx(p.value(), 39.0));
        let priorities: Vec<i32> = p.modifiers().iter().map(|m| m.priority).collect();
        assert_eq!(priorities, vec![-5, 0, 5]);
    }

    #[test]
    fn scaled_base_reads_base_not_running_value() {
        let mut p = Property::new(100.0);
        p.add_modifier(Modifier::scale(2.0));
        p.add_modifier(Modifier::add_scaled_base(0.1).with_priority(1));
        // 100 * 2 + 100 * 0.1
        assert!(approx(p.value(), 210.0));
        assert!(approx(p.compute_for(50.0), 105.0));
        // compute_for has no side effects
        assert!(approx(p.value(), 210.0));
    }

    #[test]
    fn set_base_value_within_epsilon_is_ignored() {
        let mut p = Property::new(10.0);
        assert_eq!(p.set_base_value(10.0 + 1.0e-7), None);
        assert_eq!(p.base_value(), 10.0);

        let mut zero = Property::new(0.0);
        assert_eq!(zero.set_base_value(1.0e-7), None);
        assert_eq!(zero.base_value(), 0.0);
    }

    #[test]
    fn set_base_value_reports_change() {
        let mut p = Property::new(10.0);
        p.add_modifier(Modifier::scale(2.0));
        let change = p.set_base_value(15.0).unwrap();
        assert!(approx(change.old, 20.0));
        assert!(approx(change.new, 30.0));
        assert_eq!(p.base_value(), 15.0);
    }

    #[test]
    fn base_change_masked_by_modifiers_reports_nothing() {
        let mut p = Property::new(10.0);
        p.add_modifier(Modifier::scale(0.0));
        assert_eq!(p.set_base_value(50.0), None);
        // the base still moved even though the value did not
        assert_eq!(p.base_value(), 50.0);
        assert_eq!(p.value(), 0.0);
    }

    #[test]
    fn absent_modifier_is_ignored() {
        let mut p = Property::new(10.0);
        assert_eq!(p.add_modifier(None::<Modifier>), None);
        assert!(p.modifiers().is_empty());
    }

    #[test]
    fn identity_modifier_changes_nothing() {
        let mut p = Property::new(10.0);
        assert_eq!(p.add_modifier(Modifier::identity()), None);
        assert_eq!(p.modifiers().len(), 1);
        assert_eq!(p.value(), 10.0);
    }

    #[test]
    fn remove_missing_modifier_is_harmless() {
        let mut p = Property::new(10.0);
        p.add_modifier(Modifier::add(1.0));
        assert_eq!(p.remove_modifier(&Modifier::add(99.0)), None);
        assert_eq!(p.modifiers().len(), 1);
        assert!(approx(p.value(), 11.0));
    }

    #[test]
    fn remove_takes_only_first_match() {
        let mut p = Property::new(0.0);
        p.add_modifier(Modifier::add(1.0));
        p.add_modifier(Modifier::add(1.0));
        p.remove_modifier(&Modifier::add(1.0));
        assert_eq!(p.modifiers(), &[Modifier::add(1.0)]);
        assert!(approx(p.value(), 1.0));
    }

    #[test]
    fn custom_epsilon_controls_reporting() {
        let mut coarse = Property::with_epsilon(10.0, 0.5);
        assert_eq!(coarse.set_base_value(10.25), None);
        assert!(coarse.set_base_value(11.0).is_some());

        let mut exact = Property::with_epsilon(0.0, 0.0);
        assert!(exact.set_base_value(1.0e-7).is_some());
    }
}
