//! End-to-end keying scenarios over the service and the pure planners.

use std::sync::Arc;

use chrono::Utc;
use masterkey_core::{DoorId, FacilityType, HierarchyId, KeyingApproach, StandardId};
use masterkey_engine::hierarchy::materialize;
use masterkey_engine::{
    estimate_master_count, generate_auto_assignment_plan, generate_change_key_symbol,
    generate_hierarchy_levels, generate_hierarchy_preview, validate_design, CreateKaGroupRequest,
    DesignSnapshot, EngineConfig, FindingKind, HierarchyRequest, MasterKeyEngine,
    MasterKeyService, NewHierarchyLevel, TracingObserver, ValidationMode,
};
use masterkey_store::{Assignment, Door, MemoryStore, ProjectConfig, ProjectData, Store};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("masterkey_engine=debug")
        .with_test_writer()
        .try_init();
}

fn door(id: &str) -> DoorId {
    DoorId::new(id).unwrap()
}

fn zoned_doors(zones: &[&str], per_zone: usize) -> Vec<Door> {
    zones
        .iter()
        .flat_map(|zone| {
            (0..per_zone).map(move |i| Door::new(door(&format!("{zone}-{i}"))).with_zone(*zone))
        })
        .collect()
}

fn service_with(config: ProjectConfig, doors: &[Door]) -> MasterKeyService<MemoryStore> {
    let store = Arc::new(MemoryStore::new(config));
    for d in doors {
        store.put_door(d).unwrap();
    }
    MasterKeyService::with_defaults(store)
}

fn master_id(service: &MasterKeyService<MemoryStore>, symbol: &str) -> HierarchyId {
    service
        .store()
        .list_hierarchy_levels()
        .unwrap()
        .into_iter()
        .find(|h| h.key_symbol == symbol)
        .map(|h| h.id)
        .unwrap()
}

#[test]
fn scenario_a_zone_based_ansi_assigns_every_door() {
    init_tracing();
    let doors = zoned_doors(&["East", "West", "Admin"], 4);
    let request = HierarchyRequest::new(
        StandardId::AnsiBhma,
        3,
        KeyingApproach::ZoneBased,
        FacilityType::CommercialOffice,
    );
    let config = EngineConfig::default();

    let drafts = generate_hierarchy_levels(&request, &doors, &config).unwrap();
    assert_eq!(drafts.iter().filter(|d| d.order == 0).count(), 1);
    assert_eq!(drafts.iter().filter(|d| d.order == 1).count(), 3);

    let levels = materialize(&drafts, None, Utc::now());
    let design = DesignSnapshot {
        doors: &doors,
        hierarchies: &levels,
        assignments: &[],
        ka_groups: &[],
    };
    let plan = generate_auto_assignment_plan(
        &design,
        StandardId::AnsiBhma,
        KeyingApproach::ZoneBased,
        &config,
    );

    assert_eq!(plan.total_change_keys, 12);
    assert!(plan.unassigned_doors.is_empty());
    assert_eq!(plan.master_counts.len(), 3);
    assert!(plan.master_counts.iter().all(|m| m.count == 4));
}

#[test]
fn scenario_b_en_numbering_continues_past_live_count() {
    init_tracing();
    let doors: Vec<_> = (1..=4).map(|i| Door::new(door(&format!("D{i}")))).collect();
    let service = service_with(
        ProjectConfig::new(
            StandardId::En1303,
            FacilityType::CommercialOffice,
            KeyingApproach::ZoneBased,
        ),
        &doors,
    );

    let root = service
        .add_hierarchy_level(NewHierarchyLevel {
            name: "General Master Key".to_string(),
            level_type: "GM".to_string(),
            key_symbol: "GMK".to_string(),
            order: 0,
            parent_id: None,
            description: String::new(),
            key_quantity: None,
        })
        .unwrap();
    let master = service
        .add_hierarchy_level(NewHierarchyLevel {
            name: "Master 1".to_string(),
            level_type: "MK".to_string(),
            key_symbol: "MK-1".to_string(),
            order: 1,
            parent_id: Some(root.id),
            description: String::new(),
            key_quantity: None,
        })
        .unwrap();

    let first = service
        .bulk_assign(&[door("D1"), door("D2"), door("D3")], &master.id)
        .unwrap();
    let symbols: Vec<_> = first.iter().map(|a| a.key_symbol.as_str()).collect();
    assert_eq!(symbols, vec!["CK-101", "CK-102", "CK-103"]);

    service.unassign_door(&door("D2")).unwrap();
    let next = service.assign_next_change_key(&door("D4"), &master.id).unwrap();
    assert_eq!(next.key_symbol, "CK-104");
}

#[test]
fn scenario_c_ka_group_counts_shared_key_once() {
    init_tracing();
    let doors: Vec<_> = (1..=5)
        .map(|i| Door::new(door(&format!("S{i}"))).with_zone("Stores"))
        .collect();
    let service = service_with(ProjectConfig::default(), &doors);
    service
        .generate_hierarchy(&HierarchyRequest::new(
            StandardId::AnsiBhma,
            3,
            KeyingApproach::ZoneBased,
            FacilityType::CommercialOffice,
        ))
        .unwrap();
    let aa = master_id(&service, "AA");
    let before = service.capacity().unwrap().snapshot;

    let group = service
        .create_ka_group(CreateKaGroupRequest {
            name: "Stores".to_string(),
            door_ids: doors.iter().map(|d| d.id.clone()).collect(),
            master_id: aa,
            key_quantity: Some(8),
        })
        .unwrap();
    assert_eq!(group.key_symbol, "AA10");

    let after = service.capacity().unwrap().snapshot;
    assert_eq!(after.differs_used, before.differs_used + 1);
    assert_eq!(after.total_physical_keys, before.total_physical_keys + 8);
    assert_eq!(after.total_cylinders, before.total_cylinders + 5);
}

#[test]
fn ka_and_kd_cylinders_match_and_ka_keys_are_removed_on_delete() {
    let doors = vec![
        Door::new(door("P1")).with_zone("Plant").with_qty(2),
        Door::new(door("P2")).with_zone("Plant").with_qty(3),
        Door::new(door("Q1")).with_zone("Office").with_qty(2),
        Door::new(door("Q2")).with_zone("Office").with_qty(3),
    ];
    let service = service_with(ProjectConfig::default(), &doors);
    service
        .generate_hierarchy(&HierarchyRequest::new(
            StandardId::AnsiBhma,
            3,
            KeyingApproach::ZoneBased,
            FacilityType::CommercialOffice,
        ))
        .unwrap();
    let master = master_id(&service, "AA");

    let base = service.capacity().unwrap().snapshot;
    service
        .create_ka_group(CreateKaGroupRequest {
            name: "Plant".to_string(),
            door_ids: vec![door("P1"), door("P2")],
            master_id: master,
            key_quantity: Some(7),
        })
        .unwrap();
    let with_ka = service.capacity().unwrap().snapshot;
    assert_eq!(with_ka.total_physical_keys - base.total_physical_keys, 7);
    assert_eq!(with_ka.total_cylinders - base.total_cylinders, 5);

    service
        .bulk_assign(&[door("Q1"), door("Q2")], &master)
        .unwrap();
    let with_kd = service.capacity().unwrap().snapshot;
    assert_eq!(with_kd.total_cylinders - with_ka.total_cylinders, 5);

    let group_id = service.store().list_ka_groups().unwrap()[0].id;
    service.delete_ka_group(&group_id).unwrap();
    let deleted = service.capacity().unwrap().snapshot;
    assert_eq!(with_kd.total_physical_keys - deleted.total_physical_keys, 7);
}

#[test]
fn replanning_after_partial_assignment_continues_each_master() {
    init_tracing();
    let mut doors = zoned_doors(&["East"], 3);
    let service = service_with(ProjectConfig::default(), &doors);
    service
        .generate_hierarchy(&HierarchyRequest::new(
            StandardId::AnsiBhma,
            3,
            KeyingApproach::ZoneBased,
            FacilityType::CommercialOffice,
        ))
        .unwrap();

    let plan = service.plan_assignments().unwrap();
    service.apply_plan(&plan).unwrap();
    let first: Vec<_> = plan
        .assignments
        .iter()
        .map(|a| a.change_key_symbol.clone())
        .collect();
    assert_eq!(first, vec!["AA1", "AA2", "AA3"]);

    for i in 3..5 {
        let added = Door::new(door(&format!("East-{i}"))).with_zone("East");
        service.store().put_door(&added).unwrap();
        doors.push(added);
    }

    let replan = service.plan_assignments().unwrap();
    let second: Vec<_> = replan
        .assignments
        .iter()
        .map(|a| a.change_key_symbol.as_str())
        .collect();
    assert_eq!(second, vec!["AA4", "AA5"]);
    service.apply_plan(&replan).unwrap();
    assert_eq!(service.store().list_assignments().unwrap().len(), doors.len());
}

#[test]
fn generated_masters_hang_off_the_single_root() {
    let doors = zoned_doors(&["North", "South", "East", "West"], 2);
    let config = EngineConfig::default();

    for standard in StandardId::ALL {
        for depth in 2..=4 {
            let request = HierarchyRequest::new(
                standard,
                depth,
                KeyingApproach::ZoneBased,
                FacilityType::Healthcare,
            );
            let drafts = generate_hierarchy_levels(&request, &doors, &config).unwrap();
            let levels = materialize(&drafts, None, Utc::now());

            let roots: Vec<_> = levels.iter().filter(|l| l.order == 0).collect();
            assert_eq!(roots.len(), 1);
            let masters: Vec<_> = levels.iter().filter(|l| l.order == 1).collect();
            assert_eq!(
                masters.len() as u32,
                estimate_master_count(&doors, KeyingApproach::ZoneBased, &config)
            );
            assert!(masters.iter().all(|m| m.parent_id == Some(roots[0].id)));
        }
    }
}

#[test]
fn preview_is_repeatable_and_matches_generation() {
    let doors = zoned_doors(&["East", "West", "Admin"], 5);
    let snapshot = doors.clone();
    let request = HierarchyRequest::new(
        StandardId::En1303,
        3,
        KeyingApproach::ZoneBased,
        FacilityType::Healthcare,
    );
    let config = EngineConfig::default();

    let first = generate_hierarchy_preview(&request, &doors, &config).unwrap();
    let second = generate_hierarchy_preview(&request, &doors, &config).unwrap();
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
    assert_eq!(doors, snapshot);

    let drafts = generate_hierarchy_levels(&request, &doors, &config).unwrap();
    let generated: Vec<_> = drafts
        .iter()
        .filter(|d| d.order == 1)
        .map(|d| d.key_symbol.clone())
        .collect();
    let previewed: Vec<_> = first.levels[1]
        .keys
        .iter()
        .map(|k| k.symbol.clone())
        .collect();
    assert_eq!(previewed, generated);
}

fn over_capacity_project() -> ProjectData {
    let config = ProjectConfig::new(
        StandardId::En1303,
        FacilityType::CommercialOffice,
        KeyingApproach::ZoneBased,
    );
    let request = HierarchyRequest::new(
        config.standard,
        2,
        config.approach,
        config.facility_type,
    );
    let engine_config = EngineConfig {
        min_masters: 1,
        masters_without_doors: 1,
        ..EngineConfig::default()
    };
    let drafts = generate_hierarchy_levels(&request, &[], &engine_config).unwrap();
    let hierarchies = materialize(&drafts, None, Utc::now());
    let master = &hierarchies[1];
    assert_eq!(hierarchies.len(), 2);

    let count = 7777 - hierarchies.len();
    let doors: Vec<_> = (0..count).map(|i| Door::new(door(&format!("D{i}")))).collect();
    let assignments: Vec<_> = doors
        .iter()
        .zip(0u32..)
        .map(|(d, i)| {
            Assignment::keyed_differ(
                d.id.clone(),
                master.id,
                generate_change_key_symbol(config.standard, &master.key_symbol, i),
                None,
            )
        })
        .collect();

    ProjectData {
        config,
        doors,
        hierarchies,
        assignments,
        ..ProjectData::default()
    }
}

#[test]
fn exceeding_en_differs_is_a_validation_error() {
    let data = over_capacity_project();
    let report = validate_design(
        &DesignSnapshot::from(&data),
        StandardId::En1303,
        FacilityType::CommercialOffice,
        ValidationMode::CriticalOnly,
        &TracingObserver,
    );

    let exceeded: Vec<_> = report.of_kind(FindingKind::ExceedsDiffers).collect();
    assert_eq!(exceeded.len(), 1);
    assert_eq!(exceeded[0].current, Some(7777));
    assert_eq!(exceeded[0].limit, Some(7776));
    assert!(exceeded[0].message.contains("7777 > 7776"));
    assert!(!report.is_valid());

    let service = MasterKeyService::with_defaults(Arc::new(MemoryStore::from_data(data)));
    let capacity = service.capacity().unwrap();
    assert!(capacity.snapshot.exceeds_capacity());
    assert_eq!(capacity.differs_remaining, 0);
    assert!(!service.validate(ValidationMode::Full).unwrap().is_valid());
}
