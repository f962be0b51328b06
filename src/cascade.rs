//! Hierarchical registry where values flow down the tag tree.
//!
//! A property's value becomes the base value of the properties below it that
//! have no closer registered ancestor. Creating `Stat.Health` under an
//! existing `Stat` seeds it from `Stat`; changing `Stat` later pushes the new
//! value into `Stat.Health`, which in turn pushes its own result further down.
//!
//! No tree is stored. Every hierarchy question is answered from the live set
//! of registered tags at the moment it is asked.

use std::collections::BTreeSet;

use bevy::log::{debug, trace};
use bevy::prelude::*;

use crate::forwarder::PropertyValueChanged;
use crate::listeners::SubscriptionId;
use crate::modifier::Modifier;
use crate::property::{Property, ValueChange};
use crate::registry::PropertyRegistry;
use crate::settings::RegistrySettings;
use crate::store::PropertyStore;
use crate::tag::Tag;

/// A [`PropertyRegistry`] that cascades values from ancestors to descendants.
///
/// # Examples
///
/// ```rust
/// use cascade_props::prelude::*;
///
/// let stat = Tag::new("Stat").unwrap();
/// let health = Tag::new("Stat.Health").unwrap();
///
/// let mut registry = CascadeRegistry::new();
/// registry.get_or_add_property(&stat, 50.0);
///
/// // The ancestor's value wins over the supplied base value
/// assert_eq!(registry.get_or_add_property(&health, 0.0).base_value(), 50.0);
///
/// // Changes flow down
/// registry.add_modifier(&stat, Modifier::scale(2.0));
/// assert_eq!(registry.get_property_value_or_default(&health, 0.0), 100.0);
///
/// // Reads of tags that were never created fall back to the nearest ancestor
/// let regen = Tag::new("Stat.Health.Regen").unwrap();
/// assert_eq!(registry.get_property_value_or_default(&regen, 0.0), 100.0);
/// ```
#[derive(Component, Debug, Default)]
pub struct CascadeRegistry {
    inner: PropertyRegistry,
}

impl CascadeRegistry {
    /// An empty registry with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the underlying flat registry.
    #[must_use]
    pub fn as_flat(&self) -> &PropertyRegistry {
        &self.inner
    }

    /// Gives up cascading and returns the flat registry.
    #[must_use]
    pub fn into_inner(self) -> PropertyRegistry {
        self.inner
    }

    /// The registered property closest above `tag`.
    ///
    /// Walks from the immediate parent up to the root segment and returns the
    /// first one that exists, together with its tag. Gaps are skipped, so with
    /// only `A` and `A.B.C` registered, `A.B.C` resolves to `A`.
    #[must_use]
    pub fn find_nearest_parent_property(&self, tag: &Tag) -> Option<(&Tag, &Property)> {
        tag.ancestors()
            .find_map(|ancestor| self.inner.get_key_value(&ancestor))
    }

    /// Registered tags exactly one level below `parent`.
    #[must_use]
    pub fn direct_child_tags(&self, parent: &Tag) -> Vec<Tag> {
        self.inner
            .descendants(parent)
            .filter(|tag| tag.relative_depth(parent) == Some(1))
            .cloned()
            .collect()
    }

    /// The tags that receive `parent`'s value directly when it changes.
    ///
    /// A registered descendant is included if it is a direct child, or if no
    /// tag between it and `parent` is registered. Anything with a registered
    /// intermediate is left to that intermediate's own cascade.
    #[must_use]
    pub fn children_to_update(&self, parent: &Tag) -> Vec<Tag> {
        let parent_depth = parent.depth();
        let mut frontier = BTreeSet::new();

        for tag in self.inner.descendants(parent) {
            let direct = tag.depth() == parent_depth + 1;
            if direct || !self.has_registered_between(parent_depth, tag) {
                frontier.insert(tag.clone());
            }
        }

        frontier.into_iter().collect()
    }

    fn has_registered_between(&self, parent_depth: usize, tag: &Tag) -> bool {
        (parent_depth + 1..tag.depth())
            .filter_map(|depth| tag.truncate(depth))
            .any(|intermediate| self.inner.contains(&intermediate))
    }

    /// Applies `mutation` at `tag` and cascades whatever change it broadcast.
    fn mutate_and_cascade(
        &mut self,
        tag: &Tag,
        mutation: impl FnOnce(&mut Property) -> Option<ValueChange>,
    ) -> bool {
        match self.inner.mutate(tag, mutation) {
            Some(change) => {
                self.cascade(&change);
                true
            }
            None => false,
        }
    }

    /// Pushes `change.new` into the frontier below `change.tag`, depth first.
    ///
    /// Terminates because a push equal to a child's current base value is a
    /// no-op and produces no further change.
    fn cascade(&mut self, change: &PropertyValueChanged) {
        for child in self.children_to_update(&change.tag) {
            trace!("Cascading {} from `{}` into `{}`", change.new, change.tag, child);
            if let Some(next) = self
                .inner
                .mutate(&child, |property| property.set_base_value(change.new))
            {
                self.cascade(&next);
            }
        }
    }
}

impl PropertyStore for CascadeRegistry {
    fn with_settings(settings: RegistrySettings) -> Self {
        Self {
            inner: PropertyRegistry::with_settings(settings),
        }
    }

    fn settings(&self) -> RegistrySettings {
        self.inner.settings()
    }

    fn get_property(&self, tag: &Tag) -> Option<&Property> {
        self.inner.get_property(tag)
    }

    fn get_or_add_property(&mut self, tag: &Tag, base_value: f32) -> &Property {
        if self.inner.contains(tag) {
            return self.inner.get_or_add_property(tag, base_value);
        }

        let seed = self
            .find_nearest_parent_property(tag)
            .map(|(parent, property)| {
                debug!(
                    "Seeding `{}` from `{}`: {} replaces {}",
                    tag,
                    parent,
                    property.value(),
                    base_value
                );
                property.value()
            });
        let initial = seed.unwrap_or(base_value);
        let value = self.inner.get_or_add_property(tag, initial).value();

        // A seed that overrode the caller's base counts as a base change, so
        // descendants registered before this tag pick it up.
        if seed.is_some_and(|seeded| !self.settings().nearly_equal(seeded, base_value)) {
            self.cascade(&PropertyValueChanged {
                tag: tag.clone(),
                old: base_value,
                new: value,
            });
        }

        self.inner.get_or_add_property(tag, initial)
    }

    fn get_property_value_or_default(&self, tag: &Tag, default_value: f32) -> f32 {
        self.get_property(tag)
            .or_else(|| self.find_nearest_parent_property(tag).map(|(_, property)| property))
            .map_or(default_value, Property::value)
    }

    fn all_tags(&self) -> BTreeSet<Tag> {
        self.inner.all_tags()
    }

    fn set_base_value(&mut self, tag: &Tag, base_value: f32) -> bool {
        self.mutate_and_cascade(tag, |property| property.set_base_value(base_value))
    }

    fn add_modifier(&mut self, tag: &Tag, modifier: impl Into<Option<Modifier>>) -> bool {
        let Some(modifier) = modifier.into() else {
            return false;
        };
        self.mutate_and_cascade(tag, |property| property.add_modifier(modifier))
    }

    fn remove_modifier(&mut self, tag: &Tag, modifier: &Modifier) -> bool {
        self.mutate_and_cascade(tag, |property| property.remove_modifier(modifier))
    }

    fn recalculate(&mut self, tag: &Tag) -> bool {
        self.mutate_and_cascade(tag, Property::recalculate)
    }

    fn on_property_added(
        &mut self,
        listener: impl FnMut(&Tag, &Property) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.on_property_added(listener)
    }

    fn on_value_changed(
        &mut self,
        listener: impl FnMut(&PropertyValueChanged) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.on_value_changed(listener)
    }

    fn unsubscribe_property_added(&mut self, id: SubscriptionId) -> bool {
        self.inner.unsubscribe_property_added(id)
    }

    fn unsubscribe_value_changed(&mut self, id: SubscriptionId) -> bool {
        self.inner.unsubscribe_value_changed(id)
    }
}
