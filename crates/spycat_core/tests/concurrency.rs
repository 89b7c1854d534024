use rusqlite::Connection;
use spycat_core::db::open_db;
use spycat_core::{
    CatRepository, Mission, MissionService, NewCat, NewTarget, SqliteCatRepository,
    SqliteMissionRepository, TargetUpdate,
};
use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;

const WORKERS: usize = 6;

fn open_connections(path: &Path, count: usize) -> Vec<Connection> {
    (0..count).map(|_| open_db(path).unwrap()).collect()
}

#[test]
fn concurrent_assignments_of_one_cat_admit_exactly_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sca.db");

    let mut setup = open_db(&path).unwrap();
    let cat = SqliteCatRepository::try_new(&mut setup)
        .unwrap()
        .create_cat(&NewCat::new("Racer", 4, "Bengal", 3000))
        .unwrap();
    let mission_ids: Vec<_> = {
        let mut service = MissionService::new(SqliteMissionRepository::try_new(&mut setup).unwrap());
        (0..WORKERS)
            .map(|i| {
                service
                    .create_mission(&[NewTarget::new(format!("Target {i}"), "Finland", "")])
                    .unwrap()
                    .id
            })
            .collect()
    };

    let cat_id = cat.id;
    let barrier = Arc::new(Barrier::new(WORKERS));
    let handles: Vec<_> = open_connections(&path, WORKERS)
        .into_iter()
        .zip(mission_ids)
        .map(|(mut conn, mission_id)| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let mut service =
                    MissionService::new(SqliteMissionRepository::try_new(&mut conn).unwrap());
                barrier.wait();
                service
                    .assign_cat(mission_id, cat_id)
                    .map(|mission| mission.id)
                    .map_err(|err| err.code())
            })
        })
        .collect();

    let outcomes: Vec<Result<i64, &'static str>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();
    let winners: Vec<_> = outcomes.iter().filter_map(|o| o.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "outcomes: {outcomes:?}");
    assert!(outcomes
        .iter()
        .filter_map(|o| o.as_ref().err())
        .all(|code| *code == "cat_busy"));

    let service = MissionService::new(SqliteMissionRepository::try_new(&mut setup).unwrap());
    let owned: Vec<Mission> = service
        .list_missions()
        .unwrap()
        .into_iter()
        .filter(|m| m.cat_id == Some(cat_id))
        .collect();
    assert_eq!(owned.len(), 1);
    assert_eq!(owned[0].id, *winners[0]);
}

#[test]
fn concurrent_target_completions_complete_the_mission_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sca.db");

    let mut setup = open_db(&path).unwrap();
    let mission = MissionService::new(SqliteMissionRepository::try_new(&mut setup).unwrap())
        .create_mission(&[
            NewTarget::new("Alice", "Finland", ""),
            NewTarget::new("Bob", "Estonia", ""),
            NewTarget::new("Carol", "Latvia", ""),
        ])
        .unwrap();
    let target_ids: Vec<_> = mission.targets.iter().map(|t| t.id).collect();

    let barrier = Arc::new(Barrier::new(target_ids.len()));
    let handles: Vec<_> = open_connections(&path, target_ids.len())
        .into_iter()
        .zip(target_ids)
        .map(|(mut conn, target_id)| {
            let barrier = Arc::clone(&barrier);
            let mission_id = mission.id;
            thread::spawn(move || {
                let mut service =
                    MissionService::new(SqliteMissionRepository::try_new(&mut conn).unwrap());
                barrier.wait();
                service
                    .update_target(mission_id, target_id, &TargetUpdate::completed(true))
                    .map(|mission| mission.completed)
                    .map_err(|err| err.code())
            })
        })
        .collect();

    let outcomes: Vec<Result<bool, &'static str>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(outcomes.iter().all(Result::is_ok), "outcomes: {outcomes:?}");
    // Writers are serialized, so only the last commit observes completion.
    assert_eq!(
        outcomes.iter().filter(|o| matches!(o, Ok(true))).count(),
        1,
        "outcomes: {outcomes:?}"
    );

    let service = MissionService::new(SqliteMissionRepository::try_new(&mut setup).unwrap());
    let reloaded = service.get_mission(mission.id).unwrap();
    assert!(reloaded.completed);
    assert!(reloaded.targets.iter().all(|t| t.completed));
}

#[test]
fn concurrent_note_edits_and_completion_never_edit_frozen_notes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sca.db");

    let mut setup = open_db(&path).unwrap();
    let mission = MissionService::new(SqliteMissionRepository::try_new(&mut setup).unwrap())
        .create_mission(&[NewTarget::new("Alice", "Finland", "initial")])
        .unwrap();
    let target_id = mission.targets[0].id;

    let barrier = Arc::new(Barrier::new(2));
    let updates = [TargetUpdate::notes("late edit"), TargetUpdate::completed(true)];
    let handles: Vec<_> = open_connections(&path, 2)
        .into_iter()
        .zip(updates)
        .map(|(mut conn, update)| {
            let barrier = Arc::clone(&barrier);
            let mission_id = mission.id;
            thread::spawn(move || {
                let mut service =
                    MissionService::new(SqliteMissionRepository::try_new(&mut conn).unwrap());
                barrier.wait();
                service
                    .update_target(mission_id, target_id, &update)
                    .map(|_| ())
                    .map_err(|err| err.code())
            })
        })
        .collect();
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let service = MissionService::new(SqliteMissionRepository::try_new(&mut setup).unwrap());
    let reloaded = service.get_mission(mission.id).unwrap();
    assert!(reloaded.completed);
    match &outcomes[0] {
        Ok(()) => assert_eq!(reloaded.targets[0].notes, "late edit"),
        Err(code) => {
            assert_eq!(*code, "frozen");
            assert_eq!(reloaded.targets[0].notes, "initial");
        }
    }
    assert!(outcomes[1].is_ok());
}
