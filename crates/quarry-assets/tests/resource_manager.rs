//! Registration, lookup and immediate loading through the resource manager.

mod common;

use common::{Fixture, write_pak};
use glam::Vec3;
use quarry_assets::prelude::*;
use quarry_assets::{ResourceOrigin, TextureObject};
use quarry_test_utils::{fixtures, vertex_data};

fn texture_width(fx: &Fixture, handle: Handle<Texture>) -> u32 {
    fx.manager.payload(handle).unwrap().width
}

#[test]
fn test_directory_registered_first_wins() {
    let mut fx = Fixture::new();
    fx.write("data/grass.png", &fixtures::png(2, 2));
    write_pak(
        &fx.path("data.pak"),
        &[("Grass.png", fixtures::png(4, 4)), ("tree.png", fixtures::png(8, 8))],
        None,
    );

    assert_eq!(fx.manager.add_dir(fx.path("data"), true).unwrap(), 1);
    assert_eq!(fx.manager.add_pak(fx.path("data.pak"), None).unwrap(), 1);

    let grass = fx.manager.load::<Texture>("GRASS.PNG").unwrap();
    assert_eq!(texture_width(&fx, grass), 2);
    assert!(matches!(fx.manager.resource(grass).origin(), ResourceOrigin::Loose { .. }));

    let tree = fx.manager.load::<Texture>("tree.png").unwrap();
    assert_eq!(texture_width(&fx, tree), 8);
    let shown = fx.manager.display_path(tree);
    assert!(shown.ends_with("data.pak/tree.png"), "{}", shown);
}

#[test]
fn test_pak_registered_first_wins() {
    let mut fx = Fixture::new();
    fx.write("data/grass.png", &fixtures::png(2, 2));
    write_pak(&fx.path("data.pak"), &[("grass.png", fixtures::png(4, 4))], None);

    fx.manager.add_pak(fx.path("data.pak"), None).unwrap();
    assert_eq!(fx.manager.add_dir(fx.path("data"), true).unwrap(), 0);

    let grass = fx.manager.load::<Texture>("grass.png").unwrap();
    assert_eq!(texture_width(&fx, grass), 4);
}

#[test]
fn test_load_is_idempotent() {
    let mut fx = Fixture::new();
    fx.write("data/grass.png", &fixtures::png(2, 2));
    fx.manager.add_dir(fx.path("data"), true).unwrap();

    let first = fx.manager.load::<Texture>("grass.png").unwrap();
    let second = fx.manager.load::<Texture>("grass.png").unwrap();
    fx.manager.load_instant::<Texture>("grass.png").unwrap();

    assert_eq!(first, second);
    assert_eq!(fx.manager.state(first), ResourceState::Loaded);
    assert_eq!(fx.render.count_texture_creates(), 1);

    let events: Vec<_> = fx.manager.drain_events().collect();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], ResourceEvent::Loaded { kind: ResourceType::Texture, .. }));
}

#[test]
fn test_lookup_errors() {
    let mut fx = Fixture::new();
    fx.write("data/grass.png", &fixtures::png(2, 2));
    fx.manager.add_dir(fx.path("data"), true).unwrap();

    assert!(matches!(
        fx.manager.get::<Texture>("missing.png"),
        Err(AssetError::NotFound { .. })
    ));
    assert!(matches!(
        fx.manager.load::<Sound>("grass.png"),
        Err(AssetError::TypeMismatch {
            expected: ResourceType::Sound,
            actual: ResourceType::Texture,
            ..
        })
    ));
    assert!(fx.manager.try_get::<Texture>("missing.png").is_none());
    assert!(fx.manager.try_load::<Mesh>("grass.png").is_none());
    assert_eq!(fx.render.call_count(), 0);
}

#[test]
fn test_failed_decode_stays_not_loaded() {
    let mut fx = Fixture::new();
    fx.write("data/broken.png", b"not an image");
    fx.manager.add_dir(fx.path("data"), true).unwrap();

    let err = fx.manager.load::<Texture>("broken.png").unwrap_err();
    assert!(matches!(err, AssetError::Device { .. }));
    let handle = fx.manager.get::<Texture>("broken.png").unwrap();
    assert_eq!(fx.manager.state(handle), ResourceState::NotLoaded);
    assert!(fx.manager.payload(handle).is_none());

    let events: Vec<_> = fx.manager.drain_events().collect();
    assert!(matches!(&events[..], [ResourceEvent::LoadFailed { .. }]));

    // try_load reports through events and still hands out the handle
    assert_eq!(fx.manager.try_load::<Texture>("broken.png"), Some(handle));

    // retrying is up to the caller
    fx.write("data/broken.png", &fixtures::png(1, 1));
    fx.manager.load_handle(handle).unwrap();
    assert_eq!(fx.manager.state(handle), ResourceState::Loaded);
}

#[test]
fn test_sounds_music_and_playlists() {
    let mut fx = Fixture::new();
    fx.write("sfx/hit.wav", &fixtures::wav());
    fx.write("music/intro.ogg", &fixtures::ogg());
    fx.write("music/theme.ogg", &fixtures::ogg());
    fx.manager.add_dir(fx.dir.path(), true).unwrap();

    let hit = fx.manager.load::<Sound>("hit.wav").unwrap();
    assert!(!fx.manager.payload(hit).unwrap().streamed);

    let list = MusicList::from_names(&fx.manager, ["theme.ogg", "intro.ogg"]).unwrap();
    assert_eq!(list.len(), 2);
    assert!(!list.is_loaded(&fx.manager));
    list.load(&mut fx.manager).unwrap();
    assert!(list.is_loaded(&fx.manager));
    assert_eq!(fx.audio.count_streamed(), 2);

    assert!(!MusicList::new().is_loaded(&fx.manager));
    assert!(MusicList::from_names(&fx.manager, ["hit.wav"]).is_err());
}

#[test]
fn test_playlist_loaded_with_first_track() {
    let mut fx = Fixture::new();
    fx.write("intro.ogg", &fixtures::ogg());
    fx.write("theme.ogg", &fixtures::ogg());
    fx.manager.add_dir(fx.dir.path(), false).unwrap();

    let list = MusicList::from_names(&fx.manager, ["intro.ogg", "theme.ogg"]).unwrap();
    fx.manager.load::<Music>("intro.ogg").unwrap();
    assert!(list.is_loaded(&fx.manager));
    assert_eq!(fx.manager.state(list.tracks()[1]), ResourceState::NotLoaded);
}

#[test]
fn test_fonts_and_vertex_data() {
    let mut fx = Fixture::new();
    fx.write("ui.ttf", &fixtures::ttf());
    fx.write(
        "level.phy",
        &vertex_data(3.0, &[Vec3::ZERO, Vec3::X, Vec3::Z], &[[0, 2, 1]]),
    );
    fx.manager.add_dir(fx.dir.path(), false).unwrap();

    let font = fx.manager.load::<Font>("ui.ttf").unwrap();
    assert!(fx.manager.payload(font).is_some());

    let level = fx.manager.load::<VertexData>("level.phy").unwrap();
    let geometry = fx.manager.payload(level).unwrap();
    assert_eq!(geometry.radius, 3.0);
    assert_eq!(geometry.faces, vec![[0, 2, 1]]);
    assert_eq!(fx.render.count_font_creates(), 1);
    assert_eq!(fx.render.count_buffer_creates(), 0);
}

#[test]
fn test_encrypted_pak() {
    let mut fx = Fixture::new();
    write_pak(&fx.path("data.pak"), &[("grass.png", fixtures::png(4, 4))], Some("k1"));

    assert!(fx.manager.add_pak(fx.path("data.pak"), None).is_err());
    assert!(fx.manager.add_pak(fx.path("data.pak"), Some("nope")).is_err());
    assert!(fx.manager.registry().is_empty());

    fx.manager.add_pak(fx.path("data.pak"), Some("k1")).unwrap();
    let grass = fx.manager.load::<Texture>("grass.png").unwrap();
    assert_eq!(texture_width(&fx, grass), 4);
}

#[test]
fn test_plain_pak_ignores_key() {
    let mut fx = Fixture::new();
    write_pak(&fx.path("data.pak"), &[("grass.png", fixtures::png(4, 4))], None);

    assert_eq!(fx.manager.add_pak(fx.path("data.pak"), Some("unused")).unwrap(), 1);
    let grass = fx.manager.load::<Texture>("grass.png").unwrap();
    assert_eq!(texture_width(&fx, grass), 4);
}

#[test]
fn test_mount_from_config() {
    let mut fx = Fixture::new();
    fx.write("mods/grass.png", &fixtures::png(16, 16));
    fx.write("data/grass.png", &fixtures::png(2, 2));
    fx.write("data/sub/rock.png", &fixtures::png(3, 3));
    write_pak(
        &fx.path("data.pak"),
        &[("grass.png", fixtures::png(4, 4)), ("sky.png", fixtures::png(5, 5))],
        Some("secret"),
    );

    let text = format!(
        "tick_budget_ms = 4\n\
         [[data_dirs]]\npath = '{}'\n\
         [[data_dirs]]\npath = '{}'\n\
         [[paks]]\npath = '{}'\nkey = 'secret'\n",
        fx.path("mods").display(),
        fx.path("data").display(),
        fx.path("data.pak").display(),
    );
    fx.write("resources.toml", text.as_bytes());
    let config = ResourceConfig::load(fx.path("resources.toml")).unwrap();
    assert_eq!(config.tick_budget, std::time::Duration::from_millis(4));
    assert!(config.directories.iter().all(|dir| dir.recursive));
    fx.manager.mount(&config).unwrap();

    assert_eq!(fx.manager.registry().len(), 3);
    let grass = fx.manager.load::<Texture>("grass.png").unwrap();
    assert_eq!(texture_width(&fx, grass), 16);
    assert!(fx.manager.try_load::<Texture>("rock.png").is_some());
    assert!(fx.manager.try_load::<Texture>("sky.png").is_some());

    let missing = ResourceConfig::default().with_directory(fx.path("nowhere"), true);
    assert!(matches!(
        fx.manager.mount(&missing),
        Err(AssetError::DirectoryNotFound { .. })
    ));
}

#[test]
fn test_insert_loaded() {
    let mut fx = Fixture::new();
    fx.write("grass.png", &fixtures::png(2, 2));
    fx.manager.add_dir(fx.dir.path(), false).unwrap();

    let object = TextureObject {
        id: 99,
        width: 7,
        height: 7,
    };
    let generated = fx.manager.insert_loaded::<Texture>("generated", object).unwrap();
    assert_eq!(fx.manager.state(generated), ResourceState::Loaded);
    assert_eq!(fx.manager.load::<Texture>("generated").unwrap(), generated);
    assert_eq!(texture_width(&fx, generated), 7);

    assert!(fx.manager.insert_loaded::<Texture>("GRASS.png", object).is_none());
    assert_eq!(fx.render.call_count(), 0);
}

#[test]
fn test_custom_extension() {
    let mut fx = Fixture::new();
    fx.write("splash.img", &fixtures::png(2, 2));
    fx.manager.register_extension("img", ResourceType::Texture);
    fx.manager.add_dir(fx.dir.path(), false).unwrap();

    assert!(fx.manager.load::<Texture>("splash.img").is_ok());
}
