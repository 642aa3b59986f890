//! Keyed-alike group operations.
//!
//! A keyed-alike group gives two or more doors one shared change-key symbol
//! and one physical-key quantity. Member doors carry a `KA` assignment with
//! no quantity of their own.

use chrono::Utc;
use masterkey_core::{DoorId, KaGroupId, StandardId};
use masterkey_store::{Assignment, KaGroup, Keying, Store};

use crate::error::{EngineError, Result};
use crate::symbols::SymbolAllocator;
use crate::types::{CreateKaGroupRequest, EngineConfig, KaGroupUpdate};

fn dedup_preserving_order(door_ids: Vec<DoorId>) -> Vec<DoorId> {
    let mut unique: Vec<DoorId> = Vec::with_capacity(door_ids.len());
    for id in door_ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

/// Create a keyed-alike group under a master.
///
/// Member doors that hold a keyed-differ assignment are unassigned first and
/// then re-assigned as keyed alike. The shared symbol is the next free
/// keyed-alike block under the master.
///
/// # Errors
///
/// Returns an error if:
/// - fewer than two distinct doors are given (`KaGroupTooSmall`)
/// - the key quantity is zero (`InvalidKeyQuantity`)
/// - the master or a door does not exist
/// - a door already belongs to another keyed-alike group (`DoorInKaGroup`)
pub fn create_ka_group<S: Store>(
    store: &S,
    request: CreateKaGroupRequest,
    standard: StandardId,
    config: &EngineConfig,
) -> Result<KaGroup> {
    let door_ids = dedup_preserving_order(request.door_ids);
    if door_ids.len() < 2 {
        return Err(EngineError::KaGroupTooSmall {
            got: door_ids.len(),
        });
    }

    let key_quantity = request
        .key_quantity
        .unwrap_or(config.default_ka_key_quantity);
    if key_quantity == 0 {
        return Err(EngineError::InvalidKeyQuantity { got: key_quantity });
    }

    let master = store
        .get_hierarchy_level(&request.master_id)?
        .ok_or(EngineError::HierarchyLevelNotFound(request.master_id))?;

    for door_id in &door_ids {
        if store.get_door(door_id)?.is_none() {
            return Err(EngineError::DoorNotFound(door_id.clone()));
        }
        if let Some(ka_group_id) = store
            .get_assignment(door_id)?
            .and_then(|a| a.ka_group_id())
        {
            return Err(EngineError::DoorInKaGroup {
                door_id: door_id.clone(),
                ka_group_id,
            });
        }
    }

    let mut allocator = SymbolAllocator::new(
        standard,
        &store.list_hierarchy_levels()?,
        &store.list_assignments()?,
        &store.list_ka_groups()?,
    );
    let key_symbol = allocator.next_ka_symbol(&master);

    let now = Utc::now();
    let group = KaGroup {
        id: KaGroupId::generate(),
        name: request.name,
        key_symbol,
        master_id: master.id,
        master_symbol: master.key_symbol.clone(),
        door_ids,
        key_quantity,
        created_at: now,
        updated_at: now,
    };
    store.put_ka_group(&group)?;

    for door_id in &group.door_ids {
        if store.get_assignment(door_id)?.is_some() {
            store.delete_assignment(door_id)?;
        }
        store.put_assignment(&Assignment::keyed_alike(door_id.clone(), &group))?;
    }

    tracing::info!(
        ka_group_id = %group.id,
        symbol = %group.key_symbol,
        master = %master.key_symbol,
        doors = group.door_ids.len(),
        key_quantity = group.key_quantity,
        "Created keyed-alike group"
    );

    Ok(group)
}

/// Rename a group or change its key quantity.
///
/// A rename is copied to every member assignment.
///
/// # Errors
///
/// Returns `KaGroupNotFound` for an unknown group and `InvalidKeyQuantity`
/// for a zero quantity.
pub fn update_ka_group<S: Store>(
    store: &S,
    ka_group_id: &KaGroupId,
    update: KaGroupUpdate,
) -> Result<KaGroup> {
    let mut group = store
        .get_ka_group(ka_group_id)?
        .ok_or(EngineError::KaGroupNotFound(*ka_group_id))?;

    if let Some(quantity) = update.key_quantity {
        if quantity == 0 {
            return Err(EngineError::InvalidKeyQuantity { got: quantity });
        }
        group.key_quantity = quantity;
    }

    if let Some(name) = update.name {
        group.name = name;
        for mut assignment in store.list_assignments()? {
            if assignment.ka_group_id() == Some(group.id) {
                assignment.keying = Keying::KeyedAlike {
                    ka_group_id: group.id,
                    ka_group_name: group.name.clone(),
                };
                store.put_assignment(&assignment)?;
            }
        }
    }

    group.updated_at = Utc::now();
    store.put_ka_group(&group)?;

    tracing::info!(
        ka_group_id = %group.id,
        name = %group.name,
        key_quantity = group.key_quantity,
        "Updated keyed-alike group"
    );

    Ok(group)
}

/// Delete a group and unassign every member door.
///
/// Members are left without an assignment; they are not turned back into
/// keyed-differ doors.
///
/// # Errors
///
/// Returns `KaGroupNotFound` for an unknown group.
pub fn delete_ka_group<S: Store>(store: &S, ka_group_id: &KaGroupId) -> Result<KaGroup> {
    let group = store
        .get_ka_group(ka_group_id)?
        .ok_or(EngineError::KaGroupNotFound(*ka_group_id))?;

    let mut released = 0usize;
    for assignment in store.list_assignments()? {
        if assignment.ka_group_id() == Some(group.id) {
            store.delete_assignment(&assignment.door_id)?;
            released += 1;
        }
    }
    store.delete_ka_group(ka_group_id)?;

    tracing::info!(
        ka_group_id = %group.id,
        symbol = %group.key_symbol,
        released,
        "Deleted keyed-alike group"
    );

    Ok(group)
}
