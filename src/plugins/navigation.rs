//! Bevy wiring for a [`Pathfinder`] resource: terrain change events and the
//! once-per-update budget reset

use crate::map::Footprint;
use crate::pathfinding::{Pathfinder, TerrainQuery};
use bevy::prelude::*;
use std::marker::PhantomData;

/// Ordering of the navigation systems inside [`First`]
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum NavigationSet {
    ApplyTerrainChanges,
    ResetBudget,
}

/// Terrain under `position` changed; re-sample the affected navigation cells.
///
/// Mutate the terrain held by the [`Pathfinder`] before sending this.
#[derive(Event, Debug, Clone, PartialEq)]
pub struct TerrainChanged {
    pub position: Vec3,
    /// Area of a placed or removed structure; `None` updates a single cell
    pub footprint: Option<Footprint>,
}

impl TerrainChanged {
    pub fn cell(position: Vec3) -> Self {
        Self {
            position,
            footprint: None,
        }
    }

    pub fn area(position: Vec3, footprint: Footprint) -> Self {
        Self {
            position,
            footprint: Some(footprint),
        }
    }
}

/// Keeps a `Pathfinder<T>` resource in step with the app's update loop.
///
/// Grid repairs run first, then the search budget is reset, so every update
/// starts with a fresh budget and a grid that reflects last update's changes.
/// The resource itself is inserted by the app.
pub struct NavigationPlugin<T> {
    _terrain: PhantomData<fn() -> T>,
}

impl<T> Default for NavigationPlugin<T> {
    fn default() -> Self {
        Self {
            _terrain: PhantomData,
        }
    }
}

impl<T: TerrainQuery> Plugin for NavigationPlugin<T> {
    fn build(&self, app: &mut App) {
        app.add_event::<TerrainChanged>()
            .configure_sets(
                First,
                (NavigationSet::ApplyTerrainChanges, NavigationSet::ResetBudget).chain(),
            )
            .add_systems(
                First,
                (
                    apply_terrain_changes::<T>.in_set(NavigationSet::ApplyTerrainChanges),
                    reset_frame_budget::<T>.in_set(NavigationSet::ResetBudget),
                )
                    .run_if(resource_exists::<Pathfinder<T>>),
            );
    }
}

/// Read [`TerrainChanged`] and repair the grid
pub fn apply_terrain_changes<T: TerrainQuery>(
    mut events: EventReader<TerrainChanged>,
    mut pathfinder: ResMut<Pathfinder<T>>,
) {
    let mut changed = 0;
    let mut applied = 0;
    for event in events.read() {
        applied += 1;
        changed += match &event.footprint {
            Some(footprint) => pathfinder.update_footprint(event.position, footprint),
            None => match pathfinder.update_cell(event.position) {
                Some((old, new)) if old != new => 1,
                _ => 0,
            },
        };
    }

    if applied > 0 {
        debug!("Applied {applied} terrain changes, {changed} navigation cells changed");
    }
}

pub fn reset_frame_budget<T: TerrainQuery>(mut pathfinder: ResMut<Pathfinder<T>>) {
    pathfinder.reset_frame_budget();
}
