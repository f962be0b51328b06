//! The operation surface shared by every registry.

use std::collections::BTreeSet;

use crate::forwarder::PropertyValueChanged;
use crate::listeners::SubscriptionId;
use crate::modifier::Modifier;
use crate::property::Property;
use crate::settings::RegistrySettings;
use crate::tag::Tag;

/// Callback for newly created properties.
pub type PropertyAddedListener = dyn FnMut(&Tag, &Property) + Send + Sync;

/// Callback for value changes, including the synthetic one fired at creation.
pub type ValueChangedListener = dyn FnMut(&PropertyValueChanged) + Send + Sync;

/// A tag-keyed collection of [`Property`] values with change notification.
///
/// Implemented by [`PropertyRegistry`](crate::PropertyRegistry) (flat) and
/// [`CascadeRegistry`](crate::CascadeRegistry) (hierarchical). Properties are
/// only mutated through the store so that every change is broadcast.
///
/// Mutators return `true` when they broadcast a value change for `tag`.
/// Addressing a tag that has no property is a silent no-op.
pub trait PropertyStore {
    /// An empty store using `settings`.
    fn with_settings(settings: RegistrySettings) -> Self
    where
        Self: Sized;

    /// The settings new properties are created with.
    fn settings(&self) -> RegistrySettings;

    /// Direct lookup.
    fn get_property(&self, tag: &Tag) -> Option<&Property>;

    /// Returns the property at `tag`, creating it first if missing.
    ///
    /// An existing property is returned unchanged and `base_value` is ignored.
    fn get_or_add_property(&mut self, tag: &Tag, base_value: f32) -> &Property;

    /// The value at `tag`, or `default_value`. Never creates a property.
    fn get_property_value_or_default(&self, tag: &Tag, default_value: f32) -> f32;

    /// Snapshot of every registered tag.
    fn all_tags(&self) -> BTreeSet<Tag>;

    /// Sets the base value of the property at `tag`.
    fn set_base_value(&mut self, tag: &Tag, base_value: f32) -> bool;

    /// Adds a modifier to the property at `tag`. `None` is ignored.
    fn add_modifier(&mut self, tag: &Tag, modifier: impl Into<Option<Modifier>>) -> bool;

    /// Removes the first equal modifier from the property at `tag`.
    fn remove_modifier(&mut self, tag: &Tag, modifier: &Modifier) -> bool;

    /// Forces a recalculation of the property at `tag`.
    fn recalculate(&mut self, tag: &Tag) -> bool;

    /// Subscribes to property creation.
    fn on_property_added(
        &mut self,
        listener: impl FnMut(&Tag, &Property) + Send + Sync + 'static,
    ) -> SubscriptionId;

    /// Subscribes to value changes.
    fn on_value_changed(
        &mut self,
        listener: impl FnMut(&PropertyValueChanged) + Send + Sync + 'static,
    ) -> SubscriptionId;

    /// Cancels an [`on_property_added`](Self::on_property_added) subscription.
    fn unsubscribe_property_added(&mut self, id: SubscriptionId) -> bool;

    /// Cancels an [`on_value_changed`](Self::on_value_changed) subscription.
    fn unsubscribe_value_changed(&mut self, id: SubscriptionId) -> bool;
}
