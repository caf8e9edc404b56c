#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use quarry_assets::ResourceManager;
use quarry_pak::PakWriter;
use quarry_test_utils::{MockAudioDevice, MockRenderDevice};

pub struct Fixture {
    pub dir: tempfile::TempDir,
    pub render: Arc<MockRenderDevice>,
    pub audio: Arc<MockAudioDevice>,
    pub manager: ResourceManager,
}

impl Fixture {
    pub fn new() -> Self {
        let render = Arc::new(MockRenderDevice::new());
        let audio = Arc::new(MockAudioDevice::new());
        Self {
            dir: tempfile::tempdir().unwrap(),
            manager: ResourceManager::new(render.clone(), audio.clone()),
            render,
            audio,
        }
    }

    pub fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }

    /// Write a file below the fixture directory, creating parents.
    pub fn write(&self, name: &str, bytes: &[u8]) {
        let path = self.path(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, bytes).unwrap();
    }
}

pub fn write_pak(path: &Path, files: &[(&str, Vec<u8>)], key: Option<&str>) {
    let mut writer = PakWriter::new();
    for (name, bytes) in files {
        writer.add_bytes(*name, bytes.clone());
    }
    if let Some(key) = key {
        writer.encrypt(key, true);
    }
    writer.write(path).unwrap();
}
