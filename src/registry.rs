//! Flat tag-keyed property container.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

use bevy::log::debug;
use bevy::prelude::*;

use crate::forwarder::{ChangeForwarder, PropertyValueChanged};
use crate::listeners::{Listeners, SubscriptionId};
use crate::modifier::Modifier;
use crate::property::{Property, ValueChange};
use crate::settings::RegistrySettings;
use crate::store::{PropertyAddedListener, PropertyStore, ValueChangedListener};
use crate::tag::Tag;

#[derive(Debug)]
struct Slot {
    property: Property,
    forwarder: ChangeForwarder,
}

/// Owns a set of properties keyed by [`Tag`] and re-broadcasts their changes.
///
/// Each property is created once by [`get_or_add_property`] and lives as long
/// as the registry. Creation fires *property added* followed by a synthetic
/// *value changed* whose old and new values are both the initial value.
///
/// The registry doubles as a Bevy [`Component`], so it can be attached to an
/// entity and driven through [`PropertiesPlugin`](crate::PropertiesPlugin).
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use cascade_props::prelude::*;
///
/// let speed = Tag::new("Stat.Speed").unwrap();
/// let mut registry = PropertyRegistry::new();
///
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// registry.on_value_changed(move |change| sink.lock().unwrap().push(change.new));
///
/// registry.get_or_add_property(&speed, 100.0);
/// registry.add_modifier(&speed, Modifier::scale(1.5));
///
/// assert_eq!(registry.get_property_value_or_default(&speed, 0.0), 150.0);
/// assert_eq!(*seen.lock().unwrap(), vec![100.0, 150.0]);
/// ```
///
/// [`get_or_add_property`]: PropertyStore::get_or_add_property
#[derive(Component, Debug, Default)]
pub struct PropertyRegistry {
    slots: BTreeMap<Tag, Slot>,
    settings: RegistrySettings,
    property_added: Listeners<PropertyAddedListener>,
    value_changed: Listeners<ValueChangedListener>,
}

impl PropertyRegistry {
    /// An empty registry with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// True if no property has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True if `tag` has a property.
    #[must_use]
    pub fn contains(&self, tag: &Tag) -> bool {
        self.slots.contains_key(tag)
    }

    /// Registered tags in order.
    pub fn tags(&self) -> impl Iterator<Item = &Tag> {
        self.slots.keys()
    }

    /// Properties in tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&Tag, &Property)> {
        self.slots.iter().map(|(tag, slot)| (tag, &slot.property))
    }

    /// Lookup that also hands back the registry's own copy of the key.
    #[must_use]
    pub fn get_key_value(&self, tag: &Tag) -> Option<(&Tag, &Property)> {
        self.slots
            .get_key_value(tag)
            .map(|(tag, slot)| (tag, &slot.property))
    }

    /// Registered tags strictly below `parent`, at any depth, in order.
    pub fn descendants<'a>(&'a self, parent: &Tag) -> impl Iterator<Item = &'a Tag> + use<'a> {
        let prefix = parent.descendant_prefix();
        let run = self
            .slots
            .range::<str, _>((Bound::Excluded(prefix.as_str()), Bound::Unbounded));
        run.map(|(tag, _)| tag)
            .take_while(move |tag| tag.as_str().starts_with(prefix.as_str()))
    }

    /// Runs `mutation` on the property at `tag` and broadcasts the resulting
    /// change, if any.
    ///
    /// The broadcast change is returned so a wrapping registry can react to it
    /// once every listener has seen it.
    pub(crate) fn mutate(
        &mut self,
        tag: &Tag,
        mutation: impl FnOnce(&mut Property) -> Option<ValueChange>,
    ) -> Option<PropertyValueChanged> {
        let slot = self.slots.get_mut(tag)?;
        let change = mutation(&mut slot.property)?;
        let event = slot.forwarder.forward(change)?;
        for listener in self.value_changed.iter_mut() {
            listener(&event);
        }
        Some(event)
    }
}

impl PropertyStore for PropertyRegistry {
    fn with_settings(settings: RegistrySettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    fn settings(&self) -> RegistrySettings {
        self.settings
    }

    fn get_property(&self, tag: &Tag) -> Option<&Property> {
        self.slots.get(tag).map(|slot| &slot.property)
    }

    fn get_or_add_property(&mut self, tag: &Tag, base_value: f32) -> &Property {
        let Self {
            slots,
            settings,
            property_added,
            value_changed,
        } = self;

        match slots.entry(tag.clone()) {
            Entry::Occupied(entry) => &entry.into_mut().property,
            Entry::Vacant(entry) => {
                debug!("Creating property `{}` with base value {}", tag, base_value);
                let mut forwarder = ChangeForwarder::default();
                forwarder.bind(tag.clone());
                let slot = entry.insert(Slot {
                    property: Property::with_epsilon(base_value, settings.epsilon),
                    forwarder,
                });

                for listener in property_added.iter_mut() {
                    listener(tag, &slot.property);
                }

                let initial = slot.property.value();
                if let Some(event) = slot.forwarder.forward(ValueChange {
                    old: initial,
                    new: initial,
                }) {
                    for listener in value_changed.iter_mut() {
                        listener(&event);
                    }
                }

                &slot.property
            }
        }
    }

    fn get_property_value_or_default(&self, tag: &Tag, default_value: f32) -> f32 {
        self.get_property(tag)
            .map_or(default_value, Property::value)
    }

    fn all_tags(&self) -> BTreeSet<Tag> {
        self.slots.keys().cloned().collect()
    }

    fn set_base_value(&mut self, tag: &Tag, base_value: f32) -> bool {
        self.mutate(tag, |property| property.set_base_value(base_value))
            .is_some()
    }

    fn add_modifier(&mut self, tag: &Tag, modifier: impl Into<Option<Modifier>>) -> bool {
        let Some(modifier) = modifier.into() else {
            return false;
        };
        self.mutate(tag, |property| property.add_modifier(modifier))
            .is_some()
    }

    fn remove_modifier(&mut self, tag: &Tag, modifier: &Modifier) -> bool {
        self.mutate(tag, |property| property.remove_modifier(modifier))
            .is_some()
    }

    fn recalculate(&mut self, tag: &Tag) -> bool {
        self.mutate(tag, Property::recalculate).is_some()
    }

    fn on_property_added(
        &mut self,
        listener: impl FnMut(&Tag, &Property) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.property_added.subscribe(Box::new(listener))
    }

    fn on_value_changed(
        &mut self,
        listener: impl FnMut(&PropertyValueChanged) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.value_changed.subscribe(Box::new(listener))
    }

    fn unsubscribe_property_added(&mut self, id: SubscriptionId) -> bool {
        self.property_added.unsubscribe(id)
    }

    fn unsubscribe_value_changed(&mut self, id: SubscriptionId) -> bool {
        self.value_changed.unsubscribe(id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn tag(text: &str) -> Tag {
        Tag::new(text).unwrap()
    }

    type Log = Arc<Mutex<Vec<PropertyValueChanged>>>;

    fn record_changes(registry: &mut PropertyRegistry) -> (Log, SubscriptionId) {
        let log: Log = Arc::default();
        let sink = Arc::clone(&log);
        let id = registry.on_value_changed(move |change| sink.lock().unwrap().push(change.clone()));
        (log, id)
    }

    fn changed(text: &str, old: f32, new: f32) -> PropertyValueChanged {
        PropertyValueChanged {
            tag: tag(text),
            old,
            new,
        }
    }

    #[test]
    fn get_property_has_no_side_effects() {
        let registry = PropertyRegistry::new();
        assert!(registry.get_property(&tag("A")).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn creation_fires_added_then_initial_change() {
        let mut registry = PropertyRegistry::new();
        let order = Arc::new(Mutex::new(Vec::<String>::new()));

        let sink = Arc::clone(&order);
        registry.on_property_added(move |tag, property| {
            sink.lock()
                .unwrap()
                .push(format!("added {tag} {}", property.value()));
        });
        let sink = Arc::clone(&order);
        registry.on_value_changed(move |change| {
            sink.lock()
                .unwrap()
                .push(format!("changed {} {} {}", change.tag, change.old, change.new));
        });

        let property = registry.get_or_add_property(&tag("Stat.Speed"), 7.0);
        assert_eq!(property.base_value(), 7.0);
        assert_eq!(
            *order.lock().unwrap(),
            vec!["added Stat.Speed 7", "changed Stat.Speed 7 7"]
        );
    }

    #[test]
    fn existing_property_is_returned_unchanged() {
        let mut registry = PropertyRegistry::new();
        registry.get_or_add_property(&tag("A"), 10.0);
        let (log, _) = record_changes(&mut registry);

        let property = registry.get_or_add_property(&tag("A"), 99.0);
        assert_eq!(property.base_value(), 10.0);
        assert_eq!(registry.len(), 1);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn value_or_default_never_creates() {
        let mut registry = PropertyRegistry::new();
        registry.get_or_add_property(&tag("A"), 1.0);
        let before = registry.all_tags();

        assert_eq!(registry.get_property_value_or_default(&tag("B"), 5.0), 5.0);
        assert_eq!(registry.get_property_value_or_default(&tag("A"), 5.0), 1.0);
        assert_eq!(registry.all_tags(), before);
    }

    #[test]
    fn flat_registry_does_not_fall_back_to_ancestors() {
        let mut registry = PropertyRegistry::new();
        registry.get_or_add_property(&tag("Stat"), 50.0);
        assert_eq!(registry.get_property_value_or_default(&tag("Stat.Health"), 0.0), 0.0);
        assert_eq!(registry.get_or_add_property(&tag("Stat.Health"), 0.0).base_value(), 0.0);
    }

    #[test]
    fn all_tags_is_a_snapshot() {
        let mut registry = PropertyRegistry::new();
        registry.get_or_add_property(&tag("A"), 0.0);
        let snapshot = registry.all_tags();
        registry.get_or_add_property(&tag("B"), 0.0);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.all_tags().len(), 2);
    }

    #[test]
    fn mutations_broadcast_tagged_changes() {
        let mut registry = PropertyRegistry::new();
        registry.get_or_add_property(&tag("A"), 100.0);
        let (log, _) = record_changes(&mut registry);

        assert!(registry.add_modifier(&tag("A"), Modifier::scale(1.2)));
        assert!(registry.set_base_value(&tag("A"), 50.0));
        assert!(registry.remove_modifier(&tag("A"), &Modifier::scale(1.2)));

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].tag, tag("A"));
        assert!((log[0].new - 120.0).abs() < 0.001);
        assert!((log[1].new - 60.0).abs() < 0.001);
        assert!((log[2].new - 50.0).abs() < 0.001);
    }

    #[test]
    fn changes_within_epsilon_are_silent() {
        let mut registry = PropertyRegistry::new();
        registry.get_or_add_property(&tag("A"), 10.0);
        let (log, _) = record_changes(&mut registry);

        assert!(!registry.set_base_value(&tag("A"), 10.0 + 1.0e-7));
        assert!(!registry.recalculate(&tag("A")));
        assert!(!registry.recalculate(&tag("A")));
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_tags_and_absent_modifiers_are_ignored() {
        let mut registry = PropertyRegistry::new();
        registry.get_or_add_property(&tag("A"), 10.0);

        assert!(!registry.set_base_value(&tag("Missing"), 1.0));
        assert!(!registry.add_modifier(&tag("Missing"), Modifier::add(1.0)));
        assert!(!registry.add_modifier(&tag("A"), None::<Modifier>));
        assert!(!registry.remove_modifier(&tag("A"), &Modifier::add(1.0)));
        assert!(!registry.recalculate(&tag("Missing")));
        assert_eq!(registry.len(), 1);
        assert!(registry.get_property(&tag("A")).unwrap().modifiers().is_empty());
    }

    #[test]
    fn unsubscribed_listener_stops_receiving() {
        let mut registry = PropertyRegistry::new();
        let (log, id) = record_changes(&mut registry);
        registry.get_or_add_property(&tag("A"), 1.0);
        assert!(registry.unsubscribe_value_changed(id));
        assert!(!registry.unsubscribe_value_changed(id));
        registry.set_base_value(&tag("A"), 2.0);

        assert_eq!(*log.lock().unwrap(), vec![changed("A", 1.0, 1.0)]);
    }

    #[test]
    fn property_added_unsubscribe() {
        let mut registry = PropertyRegistry::new();
        let count = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&count);
        let id = registry.on_property_added(move |_, _| *sink.lock().unwrap() += 1);

        registry.get_or_add_property(&tag("A"), 0.0);
        assert!(registry.unsubscribe_property_added(id));
        registry.get_or_add_property(&tag("B"), 0.0);
        assert_eq!(*count.lock().unwrap(), 1);
    }

    #[test]
    fn settings_flow_into_new_properties() {
        let mut registry = PropertyRegistry::with_settings(RegistrySettings::with_epsilon(0.5));
        assert_eq!(registry.get_or_add_property(&tag("A"), 1.0).epsilon(), 0.5);
        assert!(!registry.set_base_value(&tag("A"), 1.25));
        assert!(registry.set_base_value(&tag("A"), 2.0));
    }

    #[test]
    fn created_properties_report_under_their_own_tag() {
        let mut registry = PropertyRegistry::new();
        registry.get_or_add_property(&tag("A"), 1.0);
        assert_eq!(registry.slots[&tag("A")].forwarder.tag(), Some(&tag("A")));

        let slot = registry.slots.get_mut(&tag("A")).unwrap();
        assert!(!slot.forwarder.bind(tag("B")));

        let (log, _) = record_changes(&mut registry);
        registry.set_base_value(&tag("A"), 2.0);
        assert_eq!(*log.lock().unwrap(), vec![changed("A", 1.0, 2.0)]);
    }

    #[test]
    fn descendants_scan_only_the_subtree() {
        let mut registry = PropertyRegistry::new();
        for text in ["A", "A-x", "A.B", "A.B.C", "A.E.F", "A/x", "AB", "B"] {
            registry.get_or_add_property(&tag(text), 0.0);
        }
        let below: Vec<&Tag> = registry.descendants(&tag("A")).collect();
        assert_eq!(below, vec![&tag("A.B"), &tag("A.B.C"), &tag("A.E.F")]);
        assert_eq!(registry.descendants(&tag("A.B.C")).count(), 0);
        assert_eq!(registry.descendants(&tag("Z")).count(), 0);
    }

    #[test]
    fn iterates_in_tag_order() {
        let mut registry = PropertyRegistry::new();
        registry.get_or_add_property(&tag("B"), 2.0);
        registry.get_or_add_property(&tag("A"), 1.0);
        let values: Vec<(String, f32)> = registry
            .iter()
            .map(|(tag, property)| (tag.to_string(), property.value()))
            .collect();
        assert_eq!(values, vec![("A".to_string(), 1.0), ("B".to_string(), 2.0)]);
        assert!(registry.contains(&tag("A")));
        assert_eq!(registry.tags().count(), 2);
    }
}
