use std::io::Write;

use stagehop_core::{Event, Layer, PipeKind, WELCOME_BANNER};
use stagehop_system_bootstrap::{Bootstrap, StageLoadError, StageSource, DEMO_STAGE};
use stagehop_world::query;

#[test]
fn demo_world_is_populated() {
    let bootstrap = Bootstrap;
    let mut events = Vec::new();
    let world = bootstrap.build_world(
        bootstrap.stage_text(&StageSource::Demo),
        1024.0,
        512.0,
        &mut events,
    );

    assert_eq!(bootstrap.welcome_banner(&world), WELCOME_BANNER);
    let player = query::player(&world);
    assert_eq!(player.layer, Layer::Overworld);
    assert!(player.alive);
    assert!(!query::enemies(&world).is_empty());
    assert!(!query::items(&world).is_empty());
    assert!(query::goal(&world).is_some());
    assert_eq!(query::camera(&world).width(), 1024.0);
}

#[test]
fn demo_warp_pipes_are_paired_both_ways() {
    let mut events = Vec::new();
    let world = Bootstrap.build_world(DEMO_STAGE.to_owned(), 1024.0, 512.0, &mut events);
    let graph = query::warp_graph(&world);

    let warps: Vec<_> = graph
        .pipes()
        .iter()
        .filter(|pipe| pipe.kind() == PipeKind::Warp)
        .collect();
    assert_eq!(warps.len(), 4);

    let entries: Vec<_> = warps
        .iter()
        .filter(|pipe| pipe.gate().is_some_and(|gate| gate.can_enter))
        .collect();
    assert_eq!(entries.len(), 2);
    for entry in entries {
        let exit = graph
            .destination(entry.id())
            .expect("every entry pipe leads somewhere");
        assert_ne!(exit.layer(), entry.layer());
    }

    assert!(graph
        .pipes()
        .iter()
        .any(|pipe| pipe.kind() == PipeKind::Flower));
}

#[test]
fn stage_file_is_read_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("create temporary stage");
    writeln!(file, "0S0\n111").expect("write temporary stage");

    let text = Bootstrap.stage_text(&StageSource::File(file.path().to_path_buf()));
    let mut events = Vec::new();
    let world = Bootstrap.build_world(text, 640.0, 480.0, &mut events);

    assert_eq!(
        events.first(),
        Some(&Event::StageLoaded {
            columns: 3,
            rows: 2,
            underground_row: 2,
        })
    );
    assert_eq!(query::player(&world).bounds.x, 32.0);
}

#[test]
fn unreadable_stage_reports_its_path() {
    let directory = tempfile::tempdir().expect("create temporary directory");
    let path = directory.path().join("missing.map");

    let error = Bootstrap
        .read_stage(&path)
        .expect_err("missing stage must fail");
    let StageLoadError::Io { path: reported, .. } = &error;
    assert_eq!(reported, &path);
    assert!(error.to_string().contains("missing.map"));
}

#[test]
fn missing_stage_file_yields_an_empty_world() {
    let directory = tempfile::tempdir().expect("create temporary directory");
    let source = StageSource::File(directory.path().join("missing.map"));

    let mut events = Vec::new();
    let world = Bootstrap.build_world(Bootstrap.stage_text(&source), 1024.0, 512.0, &mut events);

    assert_eq!(query::tile_grid(&world).columns(), 0);
    assert!(query::enemies(&world).is_empty());
    assert!(query::visible_tiles(&world).is_empty());
}
