//! # Directory Bundles
//!
//! Moves whole directory trees across a text-only RPC channel. A directory is
//! zipped into a temporary archive, the archive bytes are turned into transport
//! text, and the receiving side reverses the steps.
//!
//! Member names are rooted at the leaf directory name (`suites/a.robot`, never
//! `/home/me/project/suites/a.robot`), so the tree lands under the same leaf name
//! wherever it is unpacked.
//!
//! Temporary archives are `tempfile` handles with unique names; they are removed
//! when the handle drops, on success and on every error path.

use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{IoResultExt, Result, ShuttleError};
use crate::fsx as fs;
use crate::transport::{bytes_to_transport_text, transport_text_to_bytes};

const ARCHIVE_SUFFIX: &str = ".zip";

/// Zips `dir` and returns its contents as transport text.
pub fn read_binary_archive(dir: &Path) -> Result<String> {
    debug!(path = %dir.display(), "read_binary_archive");
    let bytes = pack_directory(dir)?;
    Ok(bytes_to_transport_text(&bytes))
}

/// Decodes transport text produced by [`read_binary_archive`] and unpacks it
/// next to `path`: a bundle of directory `foo` written to `/dest/foo` ends up in
/// `/dest/foo`. Existing files are overwritten.
pub fn write_binary_archive(path: &Path, transport_text: &str) -> Result<()> {
    debug!(path = %path.display(), "write_binary_archive");
    let bytes = transport_text_to_bytes(transport_text)?;

    let dest = extraction_root(path);
    fs::create_dir_all(&dest).at(&dest)?;

    let stem = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "bundle".to_string());
    let mut staging = tempfile::Builder::new()
        .prefix(&format!("{stem}-"))
        .suffix(ARCHIVE_SUFFIX)
        .tempfile_in(&dest)
        .at(&dest)?;
    let staging_path = staging.path().to_path_buf();
    staging.write_all(&bytes).at(&staging_path)?;
    staging.flush().at(&staging_path)?;
    staging.seek(SeekFrom::Start(0)).at(&staging_path)?;

    let mut archive = ZipArchive::new(staging.as_file())?;
    let written = extract_all(&mut archive, &dest)?;
    info!(dest = %dest.display(), files = written, "unpacked bundle");
    Ok(())
}

/// Builds a zip archive of `dir` and returns its bytes.
///
/// Directories are stored as explicit entries so empty ones survive the trip.
pub fn pack_directory(dir: &Path) -> Result<Vec<u8>> {
    pack_directory_in(dir, &std::env::temp_dir())
}

/// [`pack_directory`] with the temporary archive spooled in `spool_dir`.
pub(crate) fn pack_directory_in(dir: &Path, spool_dir: &Path) -> Result<Vec<u8>> {
    let meta = fs::metadata(dir).at(dir)?;
    if !meta.is_dir() {
        return Err(ShuttleError::NotADirectory(dir.to_path_buf()));
    }
    let leaf = leaf_name(dir)?;

    let mut spool = tempfile::Builder::new()
        .prefix(&format!("{}-", leaf.as_deref().unwrap_or("bundle")))
        .suffix(ARCHIVE_SUFFIX)
        .tempfile_in(spool_dir)
        .at(spool_dir)?;
    let spool_path = spool.path().to_path_buf();

    let (files, dirs) = write_archive(dir, leaf.as_deref(), &spool_path, spool.as_file_mut())?;

    let mut bytes = Vec::new();
    let file = spool.as_file_mut();
    file.seek(SeekFrom::Start(0)).at(&spool_path)?;
    file.read_to_end(&mut bytes).at(&spool_path)?;
    remove_spool(spool)?;

    info!(path = %dir.display(), files, dirs, bytes = bytes.len(), "packed directory");
    Ok(bytes)
}

/// Unpacks zip `bytes` into `dest`, creating it if needed. Returns the number
/// of files written.
pub fn unpack_archive(bytes: &[u8], dest: &Path) -> Result<usize> {
    fs::create_dir_all(dest).at(dest)?;
    let mut archive = ZipArchive::new(io::Cursor::new(bytes))?;
    extract_all(&mut archive, dest)
}

fn write_archive(dir: &Path, leaf: Option<&str>, spool: &Path, out: &mut std::fs::File) -> Result<(usize, usize)> {
    let spool_name = spool.file_name();
    let spool_real = fs::canonicalize(spool).at(spool)?;
    let mut zip = ZipWriter::new(out);
    let base = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let (mut files, mut dirs) = (0usize, 0usize);

    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        // The spool itself may live inside `dir` when the temp dir does.
        if entry.file_type().is_file()
            && entry.path().file_name() == spool_name
            && fs::canonicalize(entry.path()).map_or(false, |p| p == spool_real)
        {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(dir)
            .map_err(|_| ShuttleError::UnsafeEntry(entry.path().display().to_string()))?;
        let name = member_name(leaf, rel);
        let meta = entry.metadata()?;
        let options = match fs::unix_mode(&meta) {
            Some(mode) => base.unix_permissions(mode),
            None => base,
        };

        if entry.file_type().is_dir() {
            if name.is_empty() {
                continue;
            }
            zip.add_directory(format!("{name}/"), options)?;
            dirs += 1;
        } else if entry.file_type().is_file() {
            zip.start_file(name, options)?;
            let mut src = fs::File::open(entry.path()).at(entry.path())?;
            io::copy(&mut src, &mut zip).at(entry.path())?;
            files += 1;
        } else {
            debug!(path = %entry.path().display(), "skipping special file");
        }
    }

    zip.finish()?;
    Ok((files, dirs))
}

fn extract_all<R: Read + Seek>(archive: &mut ZipArchive<R>, dest: &Path) -> Result<usize> {
    // Validate every member before writing any of them.
    let mut targets = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        match entry.enclosed_name() {
            Some(rel) => targets.push(dest.join(rel)),
            None => {
                warn!(entry = entry.name(), "rejecting archive member outside destination");
                return Err(ShuttleError::UnsafeEntry(entry.name().to_string()));
            }
        }
    }

    let mut written = 0;
    for (i, out_path) in targets.into_iter().enumerate() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            fs::create_dir_all(&out_path).at(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
        let mut out = fs::File::create(&out_path).at(&out_path)?;
        io::copy(&mut entry, &mut out).at(&out_path)?;
        if let Some(mode) = entry.unix_mode() {
            fs::set_unix_permissions(&out_path, mode & 0o7777).at(&out_path)?;
        }
        written += 1;
    }
    Ok(written)
}

/// Directory a bundle for `path` is unpacked into.
fn extraction_root(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Name of the directory itself, after dropping trailing slashes and `.` and
/// folding `..` into the component before it. Symlinks are not followed, so a
/// link keeps its own name. Only when nothing is left to name lexically (`.`,
/// `../..`, `/`) is the path resolved on disk. `None` for a filesystem root.
fn leaf_name(dir: &Path) -> Result<Option<String>> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();
    for component in dir.components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::ParentDir => {
                parts.pop();
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    match parts.last() {
        Some(last) => Ok(Some(last.to_string_lossy().into_owned())),
        None => {
            let resolved = fs::canonicalize(dir).at(dir)?;
            Ok(resolved.file_name().map(|n| n.to_string_lossy().into_owned()))
        }
    }
}

fn member_name(leaf: Option<&str>, rel: &Path) -> String {
    let parts = leaf.into_iter().map(str::to_owned).chain(rel.components().filter_map(|c| match c {
        Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
        _ => None,
    }));
    parts.collect::<Vec<_>>().join("/")
}

fn remove_spool(spool: NamedTempFile) -> Result<()> {
    let path = spool.path().to_path_buf();
    spool.close().at(&path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_tree(root: &Path) -> PathBuf {
        let suites = root.join("suites");
        fs::create_dir_all(suites.join("nested/deeper")).unwrap();
        fs::create_dir_all(suites.join("empty")).unwrap();
        fs::write(suites.join("top.robot"), "*** Test Cases ***\nOne\n    Log  hi\n").unwrap();
        fs::write(suites.join("nested/data.bin"), [0u8, 1, 2, 3, 255]).unwrap();
        fs::write(suites.join("nested/deeper/leaf.txt"), "leaf").unwrap();
        suites
    }

    fn member_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(io::Cursor::new(bytes)).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_owned).collect();
        names.sort();
        names
    }

    #[test]
    fn members_are_rooted_at_leaf_name() {
        let tmp = tempdir().unwrap();
        let suites = sample_tree(tmp.path());
        let names = member_names(&pack_directory(&suites).unwrap());
        assert_eq!(
            names,
            vec![
                "suites/",
                "suites/empty/",
                "suites/nested/",
                "suites/nested/data.bin",
                "suites/nested/deeper/",
                "suites/nested/deeper/leaf.txt",
                "suites/top.robot",
            ]
        );
    }

    #[test]
    fn trailing_dot_segments_resolve_to_leaf() {
        let tmp = tempdir().unwrap();
        let suites = sample_tree(tmp.path());
        let names = member_names(&pack_directory(&suites.join("nested").join("..")).unwrap());
        assert!(names.iter().all(|n| n.starts_with("suites/")), "{names:?}");
    }

    #[test]
    fn unpack_reproduces_tree() {
        let tmp = tempdir().unwrap();
        let suites = sample_tree(tmp.path());
        let bytes = pack_directory(&suites).unwrap();

        let out = tempdir().unwrap();
        assert_eq!(unpack_archive(&bytes, out.path()).unwrap(), 3);
        assert_eq!(fs::read(out.path().join("suites/nested/data.bin")).unwrap(), [0u8, 1, 2, 3, 255]);
        assert_eq!(fs::read_to_string(out.path().join("suites/nested/deeper/leaf.txt")).unwrap(), "leaf");
        assert!(out.path().join("suites/empty").is_dir());
    }

    #[test]
    fn pack_rejects_plain_file() {
        let tmp = tempdir().unwrap();
        let file = tmp.path().join("file.txt");
        fs::write(&file, "x").unwrap();
        assert!(matches!(pack_directory(&file), Err(ShuttleError::NotADirectory(_))));
    }

    #[test]
    fn pack_missing_dir_is_io_error() {
        let tmp = tempdir().unwrap();
        assert!(matches!(pack_directory(&tmp.path().join("missing")), Err(ShuttleError::Io { .. })));
    }

    #[test]
    fn unpack_rejects_escaping_members_before_writing() {
        let mut buf = io::Cursor::new(Vec::new());
        {
            let mut zip = ZipWriter::new(&mut buf);
            let opts = FileOptions::default();
            zip.start_file("ok.txt", opts).unwrap();
            zip.write_all(b"fine").unwrap();
            zip.start_file("../evil.txt", opts).unwrap();
            zip.write_all(b"nope").unwrap();
            zip.finish().unwrap();
        }
        let tmp = tempdir().unwrap();
        let dest = tmp.path().join("dest");
        let err = unpack_archive(buf.get_ref(), &dest).unwrap_err();
        assert!(matches!(err, ShuttleError::UnsafeEntry(ref name) if name == "../evil.txt"));
        assert!(!dest.join("ok.txt").exists());
        assert!(!tmp.path().join("evil.txt").exists());
    }

    #[test]
    fn unpack_rejects_non_zip() {
        let tmp = tempdir().unwrap();
        assert!(matches!(unpack_archive(b"definitely not a zip", tmp.path()), Err(ShuttleError::Archive(_))));
    }

    #[test]
    fn write_binary_archive_overwrites_and_cleans_up() {
        let tmp = tempdir().unwrap();
        let suites = sample_tree(tmp.path());
        let payload = read_binary_archive(&suites).unwrap();

        let dest_root = tempdir().unwrap();
        let target = dest_root.path().join("suites");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("top.robot"), "stale").unwrap();
        fs::write(target.join("keep.me"), "untouched").unwrap();

        write_binary_archive(&target, &payload).unwrap();

        assert_eq!(
            fs::read_to_string(target.join("top.robot")).unwrap(),
            fs::read_to_string(suites.join("top.robot")).unwrap()
        );
        assert_eq!(fs::read_to_string(target.join("keep.me")).unwrap(), "untouched");
        let leftovers: Vec<_> = fs::read_dir(dest_root.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("suites")]);
    }

    #[test]
    fn staging_file_removed_when_extraction_fails() {
        let dest_root = tempdir().unwrap();
        let payload = bytes_to_transport_text(b"PK\x03\x04 but not really a zip");
        let err = write_binary_archive(&dest_root.path().join("suites"), &payload).unwrap_err();
        assert!(matches!(err, ShuttleError::Archive(_)));
        assert_eq!(fs::read_dir(dest_root.path()).unwrap().count(), 0);
    }

    #[test]
    fn extraction_root_for_bare_name_is_cwd() {
        assert_eq!(extraction_root(Path::new("suites")), PathBuf::from("."));
        assert_eq!(extraction_root(Path::new("/a/b/suites/")), PathBuf::from("/a/b"));
    }

    #[cfg(unix)]
    #[test]
    fn unix_modes_survive_roundtrip() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("bin");
        fs::create_dir(&dir).unwrap();
        let script = dir.join("run.sh");
        fs::write(&script, "#!/bin/sh\necho hi\n").unwrap();
        fs::set_unix_permissions(&script, 0o755).unwrap();

        let out = tempdir().unwrap();
        unpack_archive(&pack_directory(&dir).unwrap(), out.path()).unwrap();
        let meta = fs::metadata(out.path().join("bin/run.sh")).unwrap();
        assert_eq!(fs::unix_mode(&meta), Some(0o755));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_dir_keeps_link_name() {
        let tmp = tempdir().unwrap();
        let real = tmp.path().join("real_suites");
        fs::create_dir(&real).unwrap();
        fs::write(real.join("a.robot"), "*** Test Cases ***\n").unwrap();
        let link = tmp.path().join("suites");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let names = member_names(&pack_directory(&link).unwrap());
        assert_eq!(names, vec!["suites/", "suites/a.robot"]);
    }

    #[test]
    fn leaf_name_is_lexical() {
        let tmp = tempdir().unwrap();
        let suites = sample_tree(tmp.path());
        assert_eq!(leaf_name(&suites.join("nested/deeper/../..")).unwrap().as_deref(), Some("suites"));
        assert_eq!(leaf_name(Path::new("../relative/suites/")).unwrap().as_deref(), Some("suites"));
        assert_eq!(leaf_name(Path::new("suites/./")).unwrap().as_deref(), Some("suites"));
        // Nothing left to name lexically: resolved on disk.
        let expected = fs::canonicalize(".").unwrap().file_name().map(|n| n.to_string_lossy().into_owned());
        assert_eq!(leaf_name(Path::new(".")).unwrap(), expected);
    }

    #[test]
    fn spool_inside_packed_tree_is_not_archived() {
        let tmp = tempdir().unwrap();
        let proj = tmp.path().join("proj");
        let spool_dir = proj.join("tmp");
        fs::create_dir_all(&spool_dir).unwrap();
        fs::write(proj.join("a.txt"), "alpha").unwrap();

        let names = member_names(&pack_directory_in(&proj, &spool_dir).unwrap());
        assert_eq!(names, vec!["proj/", "proj/a.txt", "proj/tmp/"]);
        assert_eq!(fs::read_dir(&spool_dir).unwrap().count(), 0);
    }

    #[test]
    fn spool_removed_after_pack() {
        let tmp = tempdir().unwrap();
        let suites = sample_tree(tmp.path());
        let spool_dir = tempdir().unwrap();
        pack_directory_in(&suites, spool_dir.path()).unwrap();
        assert_eq!(fs::read_dir(spool_dir.path()).unwrap().count(), 0);
    }
}
