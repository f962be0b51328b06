//! Bevy integration: registries as components, driven by entity events.
//!
//! Mutations are requested by triggering [`ApplyPropertyCommand`] on an entity.
//! The plugin's observer applies the command to the entity's registry and
//! re-emits whatever the registry broadcast as entity-targeted
//! [`PropertyCreated`] and [`PropertyChanged`] events, in delivery order.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex};

use bevy::ecs::component::Mutable;
use bevy::prelude::*;

use crate::forwarder::PropertyValueChanged;
use crate::modifier::Modifier;
use crate::settings::RegistrySettings;
use crate::store::PropertyStore;
use crate::tag::Tag;

/// Trait alias for registries the plugin can drive.
pub trait RegistryComponent: PropertyStore + Component<Mutability = Mutable> {}
impl<R: PropertyStore + Component<Mutability = Mutable>> RegistryComponent for R {}

/// A mutation addressed to one property of a registry.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyCommand {
    /// Create the property if it does not exist yet
    GetOrAdd { tag: Tag, base_value: f32 },
    /// Replace the base value
    SetBaseValue { tag: Tag, base_value: f32 },
    /// Add a modifier
    AddModifier { tag: Tag, modifier: Modifier },
    /// Remove the first equal modifier
    RemoveModifier { tag: Tag, modifier: Modifier },
    /// Force a recalculation
    Recalculate { tag: Tag },
}

impl PropertyCommand {
    /// The property the command is addressed to.
    #[must_use]
    pub fn tag(&self) -> &Tag {
        match self {
            Self::GetOrAdd { tag, .. }
            | Self::SetBaseValue { tag, .. }
            | Self::AddModifier { tag, .. }
            | Self::RemoveModifier { tag, .. }
            | Self::Recalculate { tag } => tag,
        }
    }

    /// Runs the command against `registry`.
    pub fn apply<R: PropertyStore>(&self, registry: &mut R) {
        match self {
            Self::GetOrAdd { tag, base_value } => {
                registry.get_or_add_property(tag, *base_value);
            }
            Self::SetBaseValue { tag, base_value } => {
                registry.set_base_value(tag, *base_value);
            }
            Self::AddModifier { tag, modifier } => {
                registry.add_modifier(tag, *modifier);
            }
            Self::RemoveModifier { tag, modifier } => {
                registry.remove_modifier(tag, modifier);
            }
            Self::Recalculate { tag } => {
                registry.recalculate(tag);
            }
        }
    }
}

/// Entity event requesting a [`PropertyCommand`] on the target's registry.
///
/// ```rust
/// use bevy::prelude::*;
/// use cascade_props::prelude::*;
///
/// fn buff_strength(mut commands: Commands, entity: Entity) {
///     let strength = Tag::new("Stat.Strength").unwrap();
///     commands.trigger_targets(
///         ApplyPropertyCommand(PropertyCommand::AddModifier {
///             tag: strength,
///             modifier: Modifier::scale(1.5),
///         }),
///         entity,
///     );
/// }
/// ```
#[derive(Event, Debug, Clone, PartialEq)]
pub struct ApplyPropertyCommand(pub PropertyCommand);

/// Entity event emitted for every value change a command caused.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct PropertyChanged(pub PropertyValueChanged);

/// Entity event emitted when a command created a property.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct PropertyCreated {
    /// The new property's tag
    pub tag: Tag,
    /// Its initial value
    pub value: f32,
}

/// Settings the plugin for registry type `R` builds auto-inserted registries from.
///
/// Each [`PropertiesPlugin<R>`] inserts its own instance, so a flat and a
/// cascading plugin in the same app keep separate tolerances.
///
/// # Examples
///
/// ```rust
/// use bevy::prelude::*;
/// use cascade_props::prelude::*;
///
/// let mut app = App::new();
/// app.add_plugins(PropertiesPlugin::<PropertyRegistry>::new(
///     RegistrySettings::with_epsilon(0.5),
/// ));
/// app.add_plugins(PropertiesPlugin::<CascadeRegistry>::default());
///
/// let flat = app.world().resource::<RegistryDefaults<PropertyRegistry>>();
/// assert_eq!(flat.settings.epsilon, 0.5);
/// let cascade = app.world().resource::<RegistryDefaults<CascadeRegistry>>();
/// assert_eq!(cascade.settings.epsilon, DEFAULT_EPSILON);
/// ```
#[derive(Resource)]
pub struct RegistryDefaults<R: RegistryComponent> {
    /// Settings handed to [`PropertyStore::with_settings`]
    pub settings: RegistrySettings,
    /// Phantom data for the registry type
    _marker: PhantomData<R>,
}

impl<R: RegistryComponent> Default for RegistryDefaults<R> {
    fn default() -> Self {
        Self::new(RegistrySettings::default())
    }
}

impl<R: RegistryComponent> RegistryDefaults<R> {
    /// Wraps `settings` for registry type `R`.
    #[must_use]
    pub fn new(settings: RegistrySettings) -> Self {
        Self {
            settings,
            _marker: PhantomData,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Emitted {
    Created(PropertyCreated),
    Changed(PropertyChanged),
}

/// Applies `command` while recording everything the registry broadcasts.
fn apply_recorded<R: PropertyStore>(registry: &mut R, command: &PropertyCommand) -> Vec<Emitted> {
    let journal: Arc<Mutex<Vec<Emitted>>> = Arc::default();

    let sink = Arc::clone(&journal);
    let added = registry.on_property_added(move |tag, property| {
        if let Ok(mut journal) = sink.lock() {
            journal.push(Emitted::Created(PropertyCreated {
                tag: tag.clone(),
                value: property.value(),
            }));
        }
    });
    let sink = Arc::clone(&journal);
    let changed = registry.on_value_changed(move |change| {
        if let Ok(mut journal) = sink.lock() {
            journal.push(Emitted::Changed(PropertyChanged(change.clone())));
        }
    });

    command.apply(registry);

    registry.unsubscribe_property_added(added);
    registry.unsubscribe_value_changed(changed);

    journal
        .lock()
        .map(|mut journal| std::mem::take(&mut *journal))
        .unwrap_or_default()
}

/// Generic observer that handles `ApplyPropertyCommand` for registry type R.
///
/// If the target entity doesn't have a registry, one is inserted from the
/// [`RegistryDefaults<R>`] resource before the command is applied.
fn apply_property_command_observer<R: RegistryComponent>(
    trigger: Trigger<ApplyPropertyCommand>,
    defaults: Res<RegistryDefaults<R>>,
    mut q: Query<&mut R>,
    mut commands: Commands,
) {
    let entity = trigger.target();
    if let Ok(mut registry) = q.get_mut(entity) {
        let emitted = apply_recorded(&mut *registry, &trigger.event().0);
        for event in emitted {
            match event {
                Emitted::Created(created) => commands.trigger_targets(created, entity),
                Emitted::Changed(changed) => commands.trigger_targets(changed, entity),
            }
        }
    } else if let Ok(mut entity_commands) = commands.get_entity(entity) {
        // Entity exists but has no registry - insert one and re-trigger
        entity_commands.insert(R::with_settings(defaults.settings));
        commands.trigger_targets(trigger.event().clone(), entity);
    }
    // If entity doesn't exist, silently ignore
}

/// Plugin that lets entities carrying registry `R` receive [`ApplyPropertyCommand`].
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use cascade_props::prelude::*;
///
/// fn plugin(app: &mut App) {
///     // Hierarchical registries with the default tolerance
///     app.add_plugins(PropertiesPlugin::<CascadeRegistry>::default());
///
///     // Or flat registries that only report changes larger than 0.01
///     // app.add_plugins(PropertiesPlugin::<PropertyRegistry>::new(
///     //     RegistrySettings::with_epsilon(0.01)
///     // ));
/// }
/// ```
pub struct PropertiesPlugin<R: RegistryComponent> {
    settings: RegistrySettings,
    _marker: PhantomData<R>,
}

impl<R: RegistryComponent> Default for PropertiesPlugin<R> {
    fn default() -> Self {
        Self::new(RegistrySettings::default())
    }
}

impl<R: RegistryComponent> PropertiesPlugin<R> {
    /// Creates the plugin with the given settings.
    #[must_use]
    pub fn new(settings: RegistrySettings) -> Self {
        Self {
            settings,
            _marker: PhantomData,
        }
    }
}

impl<R: RegistryComponent> Plugin for PropertiesPlugin<R> {
    fn build(&self, app: &mut App) {
        app.insert_resource(RegistryDefaults::<R>::new(self.settings));
        app.add_observer(apply_property_command_observer::<R>);
    }
}
