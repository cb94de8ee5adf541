//! Runs the picker against the real `fd` and `fzf` binaries.
//!
//! These need both tools on `PATH`: `cargo test -- --ignored`.

use fuzzy_folder_nvim::events::EventQueue;
use fuzzy_folder_nvim::picker::FolderPicker;
use fuzzy_folder_nvim::{EditorPicker, PickerConfig, PickerEvent, RequestId};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

fn find_in_path(candidates: &[&str]) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .flat_map(|dir| candidates.iter().map(move |name| dir.join(name)))
        .find(|candidate| candidate.is_file())
}

fn fixture_tree() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for folder in ["node_modules/x", "src/a", "src/b"] {
        std::fs::create_dir_all(dir.path().join(folder)).unwrap();
    }
    dir
}

fn real_picker(base_dir: &Path) -> EditorPicker {
    let fd = find_in_path(&["fd", "fdfind"]).expect("fd is not on PATH");
    let fzf = find_in_path(&["fzf"]).expect("fzf is not on PATH");

    let mut config = PickerConfig::with_base_dir(base_dir);
    config.fd_bin = fd.to_string_lossy().into_owned();
    config.fzf_bin = fzf.to_string_lossy().into_owned();
    FolderPicker::from_config(config, EventQueue::new()).unwrap()
}

fn normalize(items: &[String]) -> Vec<String> {
    let mut items: Vec<String> = items
        .iter()
        .map(|item| item.trim_end_matches('/').to_string())
        .collect();
    items.sort();
    items
}

fn wait_for_items(picker: &EditorPicker, request: RequestId) -> Vec<String> {
    let deadline = Instant::now() + Duration::from_secs(10);
    while Instant::now() < deadline {
        for event in picker.widget().wait(Duration::from_millis(100)) {
            match event {
                PickerEvent::Items { request: r, items, .. } if r == request => return items,
                PickerEvent::Error { message } => panic!("filter failed: {message}"),
                _ => {}
            }
        }
    }
    panic!("no result for {request}");
}

#[test]
#[ignore = "needs fd and fzf on PATH"]
fn initial_listing_excludes_configured_patterns() {
    let dir = fixture_tree();
    let picker = real_picker(dir.path());

    let items = normalize(&picker.invoke().unwrap());
    assert!(items.contains(&"src/a".to_string()), "{items:?}");
    assert!(items.contains(&"src/b".to_string()), "{items:?}");
    assert!(!items.iter().any(|item| item.contains("node_modules")), "{items:?}");

    for item in &items {
        assert!(!item.starts_with('/'), "listing should be relative: {item}");
        assert!(dir.path().join(item).is_dir());
    }
}

#[test]
#[ignore = "needs fd and fzf on PATH"]
fn typing_narrows_to_matching_folders() {
    let dir = fixture_tree();
    let picker = real_picker(dir.path());
    picker.invoke().unwrap();

    let request = picker.on_input_change("a").unwrap();
    let items = normalize(&wait_for_items(&picker, request));
    assert!(items.contains(&"src/a".to_string()), "{items:?}");
    assert!(!items.contains(&"src/b".to_string()), "{items:?}");
}

#[test]
#[ignore = "needs fd and fzf on PATH"]
fn empty_query_shows_the_full_listing() {
    let dir = fixture_tree();
    let picker = real_picker(dir.path());
    let initial = normalize(&picker.invoke().unwrap());

    let request = picker.on_input_change("").unwrap();
    assert_eq!(normalize(&wait_for_items(&picker, request)), initial);
}

#[test]
#[ignore = "needs fd and fzf on PATH"]
fn accepting_a_result_resolves_it_under_the_base_dir() {
    let dir = fixture_tree();
    let picker = real_picker(dir.path());
    picker.invoke().unwrap();

    let request = picker.on_input_change("src/b").unwrap();
    let items = wait_for_items(&picker, request);
    let first = items.first().cloned().unwrap();

    let folder = picker.accept(Some(&first)).unwrap().unwrap();
    assert!(folder.is_dir());
    assert!(folder.starts_with(dir.path()));
    assert!(!picker.is_picking());
}
