//! Cascading stats example demonstrating the cascade_props crate.
//!
//! This example shows how to:
//! - Register the plugin for hierarchical registries
//! - Create parent and child properties on an entity through commands
//! - Watch changes flow from a parent stat into its children
//!
//! Run with: `cargo run --example cascading_stats`

use bevy::prelude::*;
use cascade_props::prelude::*;

fn main() {
    App::new()
        .add_plugins(MinimalPlugins)
        .add_plugins(PropertiesPlugin::<CascadeRegistry>::default())
        .add_observer(print_created)
        .add_observer(print_changed)
        .add_systems(Startup, setup)
        .add_systems(Update, drive_demo)
        .run();
}

/// Marker component to track our demo entity
#[derive(Component)]
struct Player;

/// Counter to track demo progression, plus the tags the demo works on
#[derive(Resource)]
struct DemoState {
    frame: u32,
    stat: Tag,
    strength: Tag,
    health: Tag,
}

fn setup(mut commands: Commands) -> Result {
    // No registry yet: the plugin inserts one on the first command
    commands.spawn(Player);
    commands.insert_resource(DemoState {
        frame: 0,
        stat: "Stat".parse()?,
        strength: "Stat.Strength".parse()?,
        health: "Stat.Health".parse()?,
    });

    println!("=== cascade_props Example ===\n");
    Ok(())
}

fn print_created(trigger: Trigger<PropertyCreated>) {
    let event = trigger.event();
    println!("  + {} created at {:.1}", event.tag, event.value);
}

fn print_changed(trigger: Trigger<PropertyChanged>) {
    let change = &trigger.event().0;
    if change.old != change.new {
        println!("  ~ {}: {:.1} -> {:.1}", change.tag, change.old, change.new);
    }
}

fn send(commands: &mut Commands, entity: Entity, command: PropertyCommand) {
    commands.trigger_targets(ApplyPropertyCommand(command), entity);
}

fn drive_demo(
    mut commands: Commands,
    query: Query<(Entity, Option<&CascadeRegistry>), With<Player>>,
    mut state: ResMut<DemoState>,
) -> Result {
    state.frame += 1;

    let Ok((entity, registry)) = query.single() else {
        return Ok(());
    };

    match state.frame {
        // Frame 2: Build the stat tree
        2 => {
            println!("Frame {}: Creating Stat = 10 and two children", state.frame);
            let stats = [
                (&state.stat, 10.0),
                (&state.strength, 0.0),
                (&state.health, 0.0),
            ];
            for (tag, base_value) in stats {
                send(
                    &mut commands,
                    entity,
                    PropertyCommand::GetOrAdd {
                        tag: tag.clone(),
                        base_value,
                    },
                );
            }
        }
        // Frame 4: Health gets four times its base on top
        4 => {
            println!("\nFrame {}: Health +400% of base", state.frame);
            send(
                &mut commands,
                entity,
                PropertyCommand::AddModifier {
                    tag: state.health.clone(),
                    modifier: Modifier::add_scaled_base(4.0),
                },
            );
        }
        // Frame 6: Raise the root, children follow
        6 => {
            println!("\nFrame {}: Stat base 10 -> 15", state.frame);
            send(
                &mut commands,
                entity,
                PropertyCommand::SetBaseValue {
                    tag: state.stat.clone(),
                    base_value: 15.0,
                },
            );
        }
        // Frame 8: Double the root with a modifier
        8 => {
            println!("\nFrame {}: Stat x2", state.frame);
            send(
                &mut commands,
                entity,
                PropertyCommand::AddModifier {
                    tag: state.stat.clone(),
                    modifier: Modifier::scale(2.0),
                },
            );
        }
        // Frame 10: Take it away again
        10 => {
            println!("\nFrame {}: Removing Stat x2", state.frame);
            send(
                &mut commands,
                entity,
                PropertyCommand::RemoveModifier {
                    tag: state.stat.clone(),
                    modifier: Modifier::scale(2.0),
                },
            );
        }
        // Frame 12: Show final state
        12 => {
            println!("\nFrame {}: Final values", state.frame);
            if let Some(registry) = registry {
                for (tag, property) in registry.as_flat().iter() {
                    println!("  {tag} = {:.1}", property.value());
                }
                // Never created, read through Stat.Health
                let regen = state.health.child("Regen")?;
                println!(
                    "  {regen} (fallback) = {:.1}",
                    registry.get_property_value_or_default(&regen, 0.0)
                );
            }
            println!("\n=== Demo Complete ===");
            std::process::exit(0);
        }
        _ => {}
    }
    Ok(())
}
