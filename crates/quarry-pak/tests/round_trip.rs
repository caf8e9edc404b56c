use std::path::Path;

use quarry_pak::{Pak, PakError, PakFlags, PakWriter, cipher};

fn compressible(len: usize) -> Vec<u8> {
    b"quarry resource data "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

fn write_three(path: &Path, key: Option<(&str, bool)>) {
    let mut writer = PakWriter::new();
    writer.add_bytes("a.txt", b"hello".to_vec());
    writer.add_empty("b.bin");
    writer.add_bytes("c.dat", compressible(10_000));
    if let Some((key, full)) = key {
        writer.encrypt(key, full);
    }
    writer.write(path).unwrap();
}

#[test]
fn test_full_encrypted_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.pak");
    write_three(&path, Some(("k1", true)));

    let mut pak = Pak::open(&path, Some("k1")).unwrap();
    assert_eq!(pak.version(), 2);
    assert!(pak.is_table_encrypted());
    assert!(pak.is_content_encrypted());
    assert_eq!(pak.len(), 3);

    let names: Vec<_> = pak.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, ["a.txt", "b.bin", "c.dat"]);

    let b = pak.entry(1).unwrap();
    assert_eq!((b.size, b.stored_size), (0, 0));
    assert!(!b.is_compressed());

    let c = pak.entry(2).unwrap();
    assert_eq!(c.size, 10_000);
    assert!(c.stored_size < 5_000);
    assert!(c.is_compressed());

    assert_eq!(pak.read_entry(0).unwrap(), b"hello");
    assert!(pak.read_entry(1).unwrap().is_empty());
    assert_eq!(pak.read_entry(2).unwrap(), compressible(10_000));
}

#[test]
fn test_table_only_encryption_leaves_payloads_plain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.pak");
    write_three(&path, Some(("secret", false)));

    let bytes = std::fs::read(&path).unwrap();
    let pak = Pak::open(&path, Some("secret")).unwrap();
    assert!(pak.is_table_encrypted());
    assert!(!pak.is_content_encrypted());

    // "hello" is incompressible and stored as-is
    let a = pak.entry(0).unwrap();
    assert!(!a.is_compressed());
    let start = a.data_offset as usize;
    assert_eq!(&bytes[start..start + 5], b"hello");

    // names are not visible in the encrypted table
    assert!(!bytes.windows(5).any(|w| w == b"a.txt"));
}

#[test]
fn test_plain_archive_without_compression() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.pak");

    let mut writer = PakWriter::new();
    writer.set_compress(false);
    writer.add_bytes("c.dat", compressible(2_000));
    let stats = writer.write(&path).unwrap();
    assert_eq!(stats.files, 1);
    assert_eq!(stats.total_size, stats.stored_size);

    let mut pak = Pak::open(&path, None).unwrap();
    assert_eq!(pak.flags(), PakFlags::empty());
    assert!(!pak.entry(0).unwrap().is_compressed());
    assert_eq!(pak.read_entry(0).unwrap(), compressible(2_000));
}

#[test]
fn test_files_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("tree.png");
    std::fs::write(&source, [0x89, b'P', b'N', b'G', 1, 2, 3]).unwrap();

    let path = dir.path().join("disk.pak");
    let mut writer = PakWriter::new();
    writer.add_file(&source);
    writer.write(&path).unwrap();

    let mut pak = Pak::open(&path, None).unwrap();
    let index = pak.find("TREE.PNG").unwrap();
    assert_eq!(pak.read_entry(index).unwrap(), [0x89, b'P', b'N', b'G', 1, 2, 3]);
    assert!(pak.find("missing.png").is_none());
}

#[test]
fn test_custom_data_is_preserved() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.pak");

    let mut writer = PakWriter::new();
    writer.set_custom_data(b"build 42".to_vec());
    writer.add_bytes("a.txt", b"hello".to_vec());
    writer.write(&path).unwrap();

    let pak = Pak::open(&path, None).unwrap();
    assert_eq!(pak.custom_data(), b"build 42");
}

#[test]
fn test_missing_key() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.pak");
    write_three(&path, Some(("k1", false)));

    assert!(matches!(Pak::open(&path, None), Err(PakError::MissingKey)));
    assert!(matches!(Pak::open(&path, Some("")), Err(PakError::MissingKey)));
}

#[test]
fn test_wrong_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.pak");
    write_three(&path, Some(("k1", true)));

    assert!(Pak::open(&path, Some("k2")).is_err());
}

#[test]
fn test_corrupted_offset_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.pak");
    write_three(&path, None);

    // data_offset of the first record: header (20) + record field 12
    let mut bytes = std::fs::read(&path).unwrap();
    bytes[20 + 12..20 + 16].copy_from_slice(&u32::MAX.to_le_bytes());
    std::fs::write(&path, &bytes).unwrap();

    let err = Pak::open(&path, None).unwrap_err();
    assert!(matches!(err, PakError::BrokenEntry { index: 0, .. }), "{err}");
}

#[test]
fn test_oversized_entry_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.pak");
    write_three(&path, None);

    // stored_size of the third record
    let mut bytes = std::fs::read(&path).unwrap();
    let at = 20 + 2 * 16 + 8;
    bytes[at..at + 4].copy_from_slice(&1_000_000u32.to_le_bytes());
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        Pak::open(&path, None),
        Err(PakError::BrokenEntry { index: 2, .. })
    ));
}

#[test]
fn test_truncated_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.pak");
    write_three(&path, None);

    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..30]).unwrap();

    assert!(matches!(
        Pak::open(&path, None),
        Err(PakError::Truncated { .. })
    ));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.pak");
    match Pak::open(&missing, None) {
        Err(PakError::Io { path, .. }) => assert_eq!(path, missing),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_out_of_range_index() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.pak");
    write_three(&path, None);

    let mut pak = Pak::open(&path, None).unwrap();
    assert!(matches!(
        pak.read_entry(3),
        Err(PakError::EntryOutOfRange { index: 3, count: 3 })
    ));
}

/// Version 1 archives have a 16 byte header and no custom data.
#[test]
fn test_version1_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("old.pak");

    let key = b"old";
    let payload = b"legacy!";
    let name = b"x.txt\0";
    let table_size = 16 + name.len();
    let data_offset = 16 + table_size;

    let mut table = Vec::new();
    table.extend_from_slice(&16u32.to_le_bytes());
    table.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    table.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    table.extend_from_slice(&(data_offset as u32).to_le_bytes());
    table.extend_from_slice(name);
    cipher::crypt(&mut table, key);

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"PAK\x01");
    bytes.extend_from_slice(&PakFlags::ENCRYPTED.bits().to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&(table_size as u32).to_le_bytes());
    bytes.extend_from_slice(&table);
    bytes.extend_from_slice(payload);
    std::fs::write(&path, &bytes).unwrap();

    let mut pak = Pak::open(&path, Some("old")).unwrap();
    assert_eq!(pak.version(), 1);
    assert!(pak.custom_data().is_empty());
    assert_eq!(pak.entries()[0].name, "x.txt");
    assert_eq!(pak.read_entry(0).unwrap(), payload);
}
