use std::fs;
use std::path::PathBuf;
use vox_profiles::{ProfileError, ProfileStore};
use vox_types::{VoiceProfile, BUILTIN_PROFILE_ID};

fn open_store(data_dir: &std::path::Path) -> ProfileStore {
    ProfileStore::open(data_dir, &data_dir.join("static")).unwrap()
}

#[test]
fn test_open_creates_an_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    let file = dir.path().join("profiles").join("profiles.json");
    assert_eq!(fs::read_to_string(&file).unwrap(), "[]");

    let profiles = store.list().unwrap();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].id, BUILTIN_PROFILE_ID);
    assert!(profiles[0].builtin);
}

#[test]
fn test_create_persists_the_recording_and_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    let profile = store
        .create("Narrator", "Some reference text.", "voice.wav", b"RIFFdata")
        .unwrap();

    assert!(profile.audio_path.ends_with(format!("{}_voice.wav", profile.id)));
    assert_eq!(fs::read(&profile.audio_path).unwrap(), b"RIFFdata");

    // Built-in first, then the new profile.
    let profiles = store.list().unwrap();
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0].id, BUILTIN_PROFILE_ID);
    assert_eq!(profiles[1], profile);

    // A second instance over the same directory sees the same data.
    let reopened = open_store(dir.path());
    assert_eq!(reopened.resolve(&profile.id).unwrap(), profile);
}

#[test]
fn test_create_strips_path_components_from_the_filename() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    let profile = store
        .create("Sneaky", "text", "../../escape.wav", b"x")
        .unwrap();

    assert!(profile.audio_path.starts_with(store.dir()));
    assert!(profile.audio_path.ends_with(format!("{}_escape.wav", profile.id)));

    let empty_name = store.create("NoName", "text", "", b"x").unwrap();
    assert!(empty_name
        .audio_path
        .ends_with(format!("{}_audio.wav", empty_name.id)));
}

#[test]
fn test_resolve_finds_builtin_and_user_profiles() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    let builtin = store.resolve(BUILTIN_PROFILE_ID).unwrap();
    assert_eq!(builtin.name, "Jennifer");

    let profile = store.create("Narrator", "text", "v.wav", b"x").unwrap();
    assert_eq!(store.resolve(&profile.id).unwrap().name, "Narrator");

    match store.resolve("nope") {
        Err(ProfileError::NotFound(id)) => assert_eq!(id, "nope"),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_delete_removes_the_record_and_recording() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    let profile = store.create("Narrator", "text", "v.wav", b"x").unwrap();
    assert!(profile.audio_path.exists());

    store.delete(&profile.id).unwrap();
    assert!(!profile.audio_path.exists());
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn test_delete_rejects_builtin_and_unknown_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    assert!(matches!(
        store.delete(BUILTIN_PROFILE_ID),
        Err(ProfileError::Builtin)
    ));
    assert!(matches!(
        store.delete("missing"),
        Err(ProfileError::NotFound(_))
    ));
}

#[test]
fn test_delete_never_follows_a_path_outside_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    // A record whose audio path points at a file elsewhere on disk, as if
    // the JSON had been edited by hand.
    let victim_dir = tempfile::tempdir().unwrap();
    let victim = victim_dir.path().join("precious.wav");
    fs::write(&victim, b"keep me").unwrap();

    let rogue = VoiceProfile {
        id: "rogue".to_string(),
        name: "Rogue".to_string(),
        ref_text: "text".to_string(),
        audio_path: victim.clone(),
        builtin: false,
    };
    let file = dir.path().join("profiles").join("profiles.json");
    fs::write(&file, serde_json::to_string(&[&rogue]).unwrap()).unwrap();

    store.delete("rogue").unwrap();

    // The record is gone but the file outside the store survives.
    assert_eq!(store.list().unwrap().len(), 1);
    assert!(victim.exists());
}

#[test]
fn test_list_picks_up_external_edits() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_store(dir.path());

    let handmade = VoiceProfile {
        id: "handmade".to_string(),
        name: "Edited In".to_string(),
        ref_text: "text".to_string(),
        audio_path: PathBuf::from("somewhere.wav"),
        builtin: false,
    };
    let file = dir.path().join("profiles").join("profiles.json");
    fs::write(&file, serde_json::to_string(&[&handmade]).unwrap()).unwrap();

    let profiles = store.list().unwrap();
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[1].name, "Edited In");
}
