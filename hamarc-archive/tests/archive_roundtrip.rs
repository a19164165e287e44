use hamarc_archive::{ArchiveOptions, CorruptionPolicy, HEADER_SIZE, HamArchive, concat};
use hamarc_core::HamArcError;
use std::fs;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn write_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    path
}

fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| (i as u8).wrapping_mul(31).wrapping_add(seed))
        .collect()
}

#[test]
fn test_insert_extract_delete() -> TestResult {
    let dir = TempDir::new()?;
    let a_data = pattern(10, 1);
    let b_data = pattern(5000, 7);
    let a = write_file(dir.path(), "a.bin", &a_data);
    let b = write_file(dir.path(), "b.bin", &b_data);
    let path = dir.path().join("test.ham");

    let mut archive = HamArchive::create(&path, ArchiveOptions::default())?;
    let report = archive.insert(&[&a, &b])?;
    assert!(report.is_complete());
    assert_eq!(archive.file_count(), 2);

    // 10 bytes: 80 data bits + 7 parity bits = 11 bytes.
    // 5000 bytes: 50 full chunks of 102 bytes.
    let entries = archive.list();
    assert_eq!(entries[0].enc_size, 11);
    assert_eq!(entries[1].enc_size, 5100);
    assert_eq!(entries[0].offset, HEADER_SIZE + 3 * 128);
    assert_eq!(entries[1].offset, entries[0].offset + 11);
    archive.close()?;
    assert_eq!(fs::metadata(&path)?.len(), 416 + 11 + 5100);

    let mut archive = HamArchive::open(&path)?;
    let out = dir.path().join("out");
    let report = archive.extract_all(&out)?;
    assert_eq!(report.processed.len(), 2);
    assert_eq!(report.corrupted_chunks, 0);
    assert_eq!(fs::read(out.join("a.bin"))?, a_data);
    assert_eq!(fs::read(out.join("b.bin"))?, b_data);

    let backups = dir.path().join("backup");
    let report = archive.delete(&["a.bin", "b.bin"], &backups)?;
    assert!(report.is_complete());
    assert_eq!(archive.file_count(), 0);
    assert_eq!(archive.free_header_slack(), 3);
    assert_eq!(fs::metadata(backups.join("b.bin"))?.len(), 5100);
    archive.close()?;

    let archive = HamArchive::open(&path)?;
    assert_eq!(archive.file_count(), 0);
    assert_eq!(fs::metadata(&path)?.len(), archive.payload_start());
    Ok(())
}

#[test]
fn test_extract_selected_and_missing() -> TestResult {
    let dir = TempDir::new()?;
    let a = write_file(dir.path(), "keep.txt", b"keep me");
    let b = write_file(dir.path(), "skip.txt", b"not me");
    let path = dir.path().join("sel.ham");

    let mut archive = HamArchive::create(&path, ArchiveOptions::default())?;
    archive.insert(&[a, b])?;

    let out = dir.path().join("out");
    let report = archive.extract(&["keep.txt", "ghost.txt"], &out)?;
    assert_eq!(report.processed, vec![out.join("keep.txt")]);
    assert_eq!(report.missing, vec!["ghost.txt".to_string()]);
    assert!(!out.join("skip.txt").exists());
    Ok(())
}

#[test]
fn test_delete_missing_name_reported() -> TestResult {
    let dir = TempDir::new()?;
    let a = write_file(dir.path(), "a", b"aaaa");
    let path = dir.path().join("d.ham");

    let mut archive = HamArchive::create(&path, ArchiveOptions::default())?;
    archive.insert(&[a])?;
    let report = archive.delete(&["zzz"], dir.path().join("bk"))?;
    assert_eq!(report.missing, vec!["zzz".to_string()]);
    assert_eq!(archive.file_count(), 1);
    Ok(())
}

#[test]
fn test_duplicate_names_first_match_wins() -> TestResult {
    let dir = TempDir::new()?;
    let first = dir.path().join("one");
    let second = dir.path().join("two");
    fs::create_dir_all(&first)?;
    fs::create_dir_all(&second)?;
    let a1 = write_file(&first, "same.txt", b"first copy");
    let a2 = write_file(&second, "same.txt", b"second copy");
    let path = dir.path().join("dup.ham");

    let mut archive = HamArchive::create(&path, ArchiveOptions::default())?;
    archive.insert(&[a1, a2])?;
    assert_eq!(archive.file_count(), 2);
    assert_eq!(archive.read_entry("same.txt")?.0, b"first copy");

    archive.delete(&["same.txt"], dir.path().join("bk"))?;
    assert_eq!(archive.file_count(), 1);
    assert_eq!(archive.read_entry("same.txt")?.0, b"second copy");
    Ok(())
}

#[test]
fn test_corrupted_payload_skip_and_strict() -> TestResult {
    let dir = TempDir::new()?;
    let data = pattern(350, 3);
    let src = write_file(dir.path(), "data.bin", &data);
    let path = dir.path().join("c.ham");

    let offset = {
        let mut archive = HamArchive::create(&path, ArchiveOptions::default())?;
        archive.insert(&[src])?;
        let offset = archive.list()[0].offset;
        archive.close()?;
        offset
    };

    // Flip one bit inside the second chunk.
    {
        let mut file = fs::OpenOptions::new().read(true).write(true).open(&path)?;
        let target = offset + 102 + 5;
        let mut bytes = fs::read(&path)?;
        bytes[target as usize] ^= 0x10;
        file.seek(SeekFrom::Start(target))?;
        file.write_all(&[bytes[target as usize]])?;
    }

    let mut archive = HamArchive::open(&path)?;
    let (decoded, report) = archive.read_entry("data.bin")?;
    assert_eq!(report.corrupted_chunks, vec![1]);
    assert_eq!(decoded.len(), data.len());
    assert_eq!(&decoded[..100], &data[..100]);
    assert!(decoded[100..200].iter().all(|&b| b == 0));
    assert_eq!(&decoded[200..], &data[200..]);

    let verified = archive.verify()?;
    assert_eq!(verified.len(), 1);
    assert!(!verified[0].1.is_clean());

    let mut strict = HamArchive::open_with(
        &path,
        ArchiveOptions::default().with_corruption_policy(CorruptionPolicy::Fail),
    )?;
    let err = strict.read_entry("data.bin").unwrap_err();
    assert!(matches!(err, HamArcError::Corrupted { chunk: 1, .. }));

    let out = dir.path().join("strict_out");
    let report = strict.extract_all(&out)?;
    assert_eq!(report.failed.len(), 1);
    assert!(!out.join("data.bin").exists());
    Ok(())
}

#[test]
fn test_concat_with_differing_chunk_sizes() -> TestResult {
    let dir = TempDir::new()?;
    let x = pattern(777, 9);
    let y = pattern(64, 200);
    let z = pattern(1, 5);
    let fx = write_file(dir.path(), "x.dat", &x);
    let fy = write_file(dir.path(), "y.dat", &y);
    let fz = write_file(dir.path(), "z.dat", &z);

    let src1 = dir.path().join("small.ham");
    let mut a = HamArchive::create(&src1, ArchiveOptions::new().with_chunk_size(13))?;
    a.insert(&[&fx, &fy])?;
    a.close()?;

    let src2 = dir.path().join("large.ham");
    let mut b = HamArchive::create(&src2, ArchiveOptions::new().with_chunk_size(400))?;
    b.insert(&[&fz])?;
    b.close()?;

    let dest = dir.path().join("merged.ham");
    let report = concat(&dest, &[&src1, &src2], ArchiveOptions::default())?;
    assert!(report.is_complete());
    assert_eq!(report.processed.len(), 3);

    let mut merged = HamArchive::open(&dest)?;
    assert_eq!(merged.config().bytes_per_chunk, 100);
    let names: Vec<_> = merged.list().iter().map(|e| e.name.clone()).collect();
    assert_eq!(names, ["x.dat", "y.dat", "z.dat"]);
    assert_eq!(merged.read_entry("x.dat")?.0, x);
    assert_eq!(merged.read_entry("y.dat")?.0, y);
    assert_eq!(merged.read_entry("z.dat")?.0, z);
    merged.check_layout()?;

    // Sources are untouched.
    assert_eq!(HamArchive::open(&src1)?.file_count(), 2);
    Ok(())
}

#[test]
fn test_concat_into_existing_archive() -> TestResult {
    let dir = TempDir::new()?;
    let f1 = write_file(dir.path(), "first", b"1111");
    let f2 = write_file(dir.path(), "second", b"22222222");

    let dest = dir.path().join("dest.ham");
    let mut d = HamArchive::create(&dest, ArchiveOptions::default())?;
    d.insert(&[&f1])?;
    d.close()?;

    let src = dir.path().join("src.ham");
    let mut s = HamArchive::create(&src, ArchiveOptions::default())?;
    s.insert(&[&f2])?;
    s.close()?;

    concat(&dest, &[&src], ArchiveOptions::default())?;
    let mut merged = HamArchive::open(&dest)?;
    assert_eq!(merged.file_count(), 2);
    assert_eq!(merged.read_entry("first")?.0, b"1111");
    assert_eq!(merged.read_entry("second")?.0, b"22222222");
    Ok(())
}

#[test]
fn test_bad_magic_rejected() -> TestResult {
    let dir = TempDir::new()?;
    let path = dir.path().join("fake.ham");
    let mut bytes = vec![0u8; 32];
    bytes[..3].copy_from_slice(b"ZIP");
    fs::write(&path, bytes)?;

    let err = HamArchive::open(&path).unwrap_err();
    assert!(err.is_format_error());
    Ok(())
}

#[test]
fn test_corrupted_offset_rejected() -> TestResult {
    let dir = TempDir::new()?;
    let src = write_file(dir.path(), "f", b"hello world");
    let path = dir.path().join("o.ham");
    let mut archive = HamArchive::create(&path, ArchiveOptions::default())?;
    archive.insert(&[src])?;
    archive.close()?;

    // Entry 0 offset field lives at header + 16.
    let mut bytes = fs::read(&path)?;
    bytes[32 + 16] = bytes[32 + 16].wrapping_add(1);
    fs::write(&path, bytes)?;

    let err = HamArchive::open(&path).unwrap_err();
    assert!(matches!(err, HamArcError::InvalidHeader { .. }));
    Ok(())
}
