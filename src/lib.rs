//! # cascade_props
//!
//! Hierarchical, tag-addressed numeric properties for Bevy games.
//!
//! A [`Property`] is a base value plus an ordered stack of [`Modifier`]s. A
//! registry stores properties under dot-separated [`Tag`]s such as
//! `Stat.Health.Max` and broadcasts every value change tagged with the
//! property it came from.
//!
//! ## Key Features
//!
//! - **Prioritised modifiers**: Add, scale and base-scaled add, applied lowest priority first
//! - **Change detection**: Writes that land within a tolerance are silent
//! - **Cascading**: [`CascadeRegistry`] pushes a parent's value down into its descendants
//! - **Observer-Based**: [`PropertiesPlugin`] drives registries on entities through Bevy observers
//!
//! ## Quick Start
//!
//! ```rust
//! use cascade_props::prelude::*;
//!
//! let stat = Tag::new("Stat").unwrap();
//! let health = Tag::new("Stat.Health").unwrap();
//!
//! let mut registry = CascadeRegistry::new();
//! registry.get_or_add_property(&stat, 100.0);
//!
//! // Children start from their nearest ancestor's value
//! registry.get_or_add_property(&health, 0.0);
//! registry.add_modifier(&health, Modifier::add(25.0));
//! assert_eq!(registry.get_property_value_or_default(&health, 0.0), 125.0);
//!
//! // Parent changes flow down into the child's base value
//! registry.set_base_value(&stat, 200.0);
//! assert_eq!(registry.get_property_value_or_default(&health, 0.0), 225.0);
//! ```
//!
//! ## With Bevy
//!
//! ```rust
//! use bevy::prelude::*;
//! use cascade_props::prelude::*;
//!
//! fn plugin(app: &mut App) {
//!     app.add_plugins(PropertiesPlugin::<CascadeRegistry>::default());
//!     app.add_observer(|trigger: Trigger<PropertyChanged>| {
//!         let change = &trigger.event().0;
//!         info!("{}: {} -> {}", change.tag, change.old, change.new);
//!     });
//! }
//!
//! fn double_speed(mut commands: Commands, entity: Entity) {
//!     commands.trigger_targets(
//!         ApplyPropertyCommand(PropertyCommand::AddModifier {
//!             tag: Tag::new("Stat.Speed").unwrap(),
//!             modifier: Modifier::scale(2.0),
//!         }),
//!         entity,
//!     );
//! }
//! ```

mod cascade;
mod forwarder;
mod listeners;
mod modifier;
mod plugin;
mod property;
mod registry;
mod settings;
mod store;
mod tag;

pub use cascade::CascadeRegistry;
pub use forwarder::{ChangeForwarder, PropertyValueChanged};
pub use listeners::{Listeners, SubscriptionId};
pub use modifier::{Modifier, ModifierKind};
pub use plugin::{
    ApplyPropertyCommand, PropertiesPlugin, PropertyChanged, PropertyCommand, PropertyCreated,
    RegistryComponent, RegistryDefaults,
};
pub use property::{Property, ValueChange};
pub use registry::PropertyRegistry;
pub use settings::{DEFAULT_EPSILON, RegistrySettings, nearly_equal};
pub use store::{PropertyAddedListener, PropertyStore, ValueChangedListener};
pub use tag::{SEPARATOR, Tag, TagError};

pub mod prelude {
    pub use crate::{
        ApplyPropertyCommand, CascadeRegistry, DEFAULT_EPSILON, Modifier, ModifierKind,
        PropertiesPlugin, Property, PropertyChanged, PropertyCommand, PropertyCreated,
        PropertyRegistry, PropertyStore, PropertyValueChanged, RegistryDefaults, RegistrySettings,
        SubscriptionId, Tag, TagError,
    };
}
