use crate::domain::error::{PackError, Result};
use crate::domain::models::{PackConfig, PackEvent, PackReport, SkippedFile};
use crate::infra::file_system::{is_same_file, read_file_text};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use walkdir::WalkDir;

/// Writes one record: a header naming the file relative to the root, the raw
/// content, then a trailing newline.
pub fn write_record<W: Write>(out: &mut W, relative: &Path, content: &str) -> io::Result<()> {
    write!(out, "\n--- FILE: {} ---\n", relative.display())?;
    out.write_all(content.as_bytes())?;
    out.write_all(b"\n")
}

pub fn pack_repository(config: &PackConfig) -> Result<PackReport> {
    pack_repository_with(config, |_| {})
}

/// Walks `config.root_path` depth-first in file-name order and appends every
/// readable, non-ignored file to a freshly truncated output document.
///
/// Directories named in the ignore rules are pruned before descending (the
/// root itself is never pruned). Files that cannot be read as text are
/// skipped and reported in [`PackReport::skipped`]; the only fatal
/// conditions are a missing root and a failure writing the output.
pub fn pack_repository_with(
    config: &PackConfig,
    mut on_event: impl FnMut(PackEvent<'_>),
) -> Result<PackReport> {
    let root = config.root_path.as_path();
    let output_path = config.output_path.as_path();
    let rules = &config.rules;

    if !root.is_dir() {
        return Err(PackError::RootNotFound(root.to_path_buf()));
    }

    info!("Packing {} into {}", root.display(), output_path.display());
    debug!("Ignored extensions: {:?}", rules.extensions);
    debug!("Ignored directories: {:?}", rules.directories);

    let file = File::create(output_path).map_err(|e| PackError::output(output_path, e))?;
    let mut writer = BufWriter::new(file);
    let output_name = output_path.file_name();

    let mut report = PackReport {
        output_path: output_path.to_path_buf(),
        ..PackReport::default()
    };

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            e.depth() == 0
                || !e.file_type().is_dir()
                || !rules.ignores_dir(&e.file_name().to_string_lossy())
        });

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                let path = err
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                warn!("Skipped {}: {}", path.display(), err);
                on_event(PackEvent::Unreadable(&path));
                report.skipped.push(SkippedFile {
                    path,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_dir() || (entry.path_is_symlink() && path.is_dir()) {
            continue;
        }

        if rules.ignores_file(&entry.file_name().to_string_lossy()) {
            debug!("Ignoring by extension: {}", path.display());
            report.ignored_count += 1;
            on_event(PackEvent::Ignored(path));
            continue;
        }

        if output_name == Some(entry.file_name()) && is_same_file(path, output_path) {
            debug!("Not packing the output file into itself: {}", path.display());
            continue;
        }

        match read_file_text(path) {
            Ok(content) => {
                let relative = path.strip_prefix(root).unwrap_or(path);
                write_record(&mut writer, relative, &content)
                    .map_err(|e| PackError::output(output_path, e))?;
                debug!("Packed {} ({} bytes)", relative.display(), content.len());
                report.packed.push(relative.to_path_buf());
                on_event(PackEvent::Packed(path));
            }
            Err(err) => {
                warn!("Skipped {}: {}", path.display(), err);
                on_event(PackEvent::Unreadable(path));
                report.skipped.push(SkippedFile {
                    path: path.to_path_buf(),
                    reason: err.to_string(),
                });
            }
        }
    }

    writer
        .flush()
        .map_err(|e| PackError::output(output_path, e))?;

    info!(
        "Packed {} files ({} ignored, {} skipped)",
        report.packed.len(),
        report.ignored_count,
        report.skipped.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::IgnoreRules;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &[u8]) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn config(root: &Path, output: &Path, exts: &str, dirs: &str) -> PackConfig {
        PackConfig {
            root_path: root.to_path_buf(),
            output_path: output.to_path_buf(),
            rules: IgnoreRules::from_lists(exts, dirs),
        }
    }

    #[test]
    fn test_packs_single_eligible_file() {
        let repo = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write(repo.path(), "a.txt", b"hello");
        write(repo.path(), "b.png", b"\x89PNG");
        write(repo.path(), ".git/config", b"[core]");

        let output = out_dir.path().join("packed.txt");
        let report = pack_repository(&config(repo.path(), &output, ".png", ".git")).unwrap();

        assert_eq!(report.packed, vec![PathBuf::from("a.txt")]);
        assert_eq!(report.ignored_count, 1);
        assert!(report.skipped.is_empty());
        assert_eq!(report.output_path, output);
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "\n--- FILE: a.txt ---\nhello\n"
        );
    }

    #[test]
    fn test_prunes_ignored_directories_at_any_depth() {
        let repo = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write(repo.path(), "src/main.rs", b"fn main() {}");
        write(repo.path(), "src/web/node_modules/pkg/index.js", b"module.exports = 1;");
        write(repo.path(), "node_modules/left-pad/index.js", b"pad");
        write(repo.path(), "deep/a/b/c/__pycache__/mod.pyc", b"cache");
        write(repo.path(), "deep/a/b/c/mod.py", b"x = 1");

        let output = out_dir.path().join("packed.txt");
        let report = pack_repository(&config(
            repo.path(),
            &output,
            "",
            "node_modules, __pycache__",
        ))
        .unwrap();

        assert_eq!(
            report.packed,
            vec![
                PathBuf::from("deep/a/b/c/mod.py"),
                PathBuf::from("src/main.rs"),
            ]
        );
        let packed = fs::read_to_string(&output).unwrap();
        assert!(!packed.contains("module.exports"));
        assert!(!packed.contains("pad"));
        assert!(!packed.contains("cache"));
    }

    #[test]
    fn test_directory_rule_does_not_match_files() {
        let repo = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write(repo.path(), "build", b"a file named like an ignored dir");

        let output = out_dir.path().join("packed.txt");
        let report = pack_repository(&config(repo.path(), &output, "", "build")).unwrap();

        assert_eq!(report.packed, vec![PathBuf::from("build")]);
    }

    #[test]
    fn test_root_itself_is_never_pruned() {
        let tmp = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let root = tmp.path().join(".git");
        write(&root, "HEAD", b"ref: refs/heads/main");

        let output = out_dir.path().join("packed.txt");
        let report = pack_repository(&config(&root, &output, "", ".git")).unwrap();

        assert_eq!(report.packed, vec![PathBuf::from("HEAD")]);
    }

    #[test]
    fn test_ignored_extensions_are_suffix_matches() {
        let repo = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write(repo.path(), "archive.tar", b"tar");
        write(repo.path(), "archive.tar.gz", b"gz");
        write(repo.path(), "docs/manual.pdf", b"pdf");
        write(repo.path(), "README.md", b"# readme");

        let output = out_dir.path().join("packed.txt");
        let report = pack_repository(&config(repo.path(), &output, ".tar, .pdf", "")).unwrap();

        assert_eq!(
            report.packed,
            vec![PathBuf::from("README.md"), PathBuf::from("archive.tar.gz")]
        );
        assert_eq!(report.ignored_count, 2);
    }

    #[test]
    fn test_unreadable_file_is_skipped_with_warning() {
        let repo = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write(repo.path(), "a.txt", b"alpha");
        write(repo.path(), "blob.dat", &[0xff, 0xfe, 0xfd, 0x00, 0x80]);
        write(repo.path(), "c.txt", b"gamma");

        let output = out_dir.path().join("packed.txt");
        let report = pack_repository(&config(repo.path(), &output, "", "")).unwrap();

        assert_eq!(
            report.packed,
            vec![PathBuf::from("a.txt"), PathBuf::from("c.txt")]
        );
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, repo.path().join("blob.dat"));
        assert!(!report.skipped[0].reason.is_empty());
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "\n--- FILE: a.txt ---\nalpha\n\n--- FILE: c.txt ---\ngamma\n"
        );
    }

    #[test]
    fn test_missing_root_creates_no_output() {
        let tmp = TempDir::new().unwrap();
        let output = tmp.path().join("packed.txt");
        let missing = tmp.path().join("does-not-exist");

        let err = pack_repository(&config(&missing, &output, "", "")).unwrap_err();

        assert!(matches!(err, PackError::RootNotFound(ref p) if p == &missing));
        assert!(err.to_string().contains("repository not found"));
        assert!(!output.exists());
    }

    #[test]
    fn test_root_that_is_a_file_is_not_found() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "file.txt", b"not a dir");
        let output = tmp.path().join("packed.txt");

        let err = pack_repository(&config(&tmp.path().join("file.txt"), &output, "", "")).unwrap_err();

        assert!(matches!(err, PackError::RootNotFound(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_output_is_truncated_on_each_run() {
        let repo = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write(repo.path(), "a.txt", b"hello");
        let output = out_dir.path().join("packed.txt");
        fs::write(&output, "stale content that must disappear").unwrap();

        pack_repository(&config(repo.path(), &output, "", "")).unwrap();

        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "\n--- FILE: a.txt ---\nhello\n"
        );
    }

    #[test]
    fn test_repeated_runs_are_byte_identical_and_skip_own_output() {
        let repo = TempDir::new().unwrap();
        write(repo.path(), "z.txt", b"last");
        write(repo.path(), "a.txt", b"first");
        write(repo.path(), "mid/m.txt", b"middle");
        let output = repo.path().join("packed_repo.txt");
        let cfg = config(repo.path(), &output, "", "");

        let first_report = pack_repository(&cfg).unwrap();
        let first = fs::read(&output).unwrap();
        let second_report = pack_repository(&cfg).unwrap();
        let second = fs::read(&output).unwrap();

        assert_eq!(first, second);
        assert_eq!(first_report.packed, second_report.packed);
        assert_eq!(
            second_report.packed,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("mid/m.txt"),
                PathBuf::from("z.txt"),
            ]
        );
    }

    #[test]
    fn test_empty_root_produces_empty_output() {
        let repo = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let output = out_dir.path().join("packed.txt");

        let report = pack_repository(&config(repo.path(), &output, "", "")).unwrap();

        assert!(report.packed.is_empty());
        assert!(output.exists());
        assert_eq!(fs::read_to_string(&output).unwrap(), "");
    }

    #[test]
    fn test_events_are_emitted_per_file() {
        let repo = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write(repo.path(), "a.txt", b"a");
        write(repo.path(), "b.png", b"png");
        write(repo.path(), "c.bin", &[0xc3, 0x28]);
        let output = out_dir.path().join("packed.txt");

        let mut events = Vec::new();
        pack_repository_with(&config(repo.path(), &output, ".png", ""), |event| {
            events.push(match event {
                PackEvent::Packed(p) => ("packed", p.to_path_buf()),
                PackEvent::Ignored(p) => ("ignored", p.to_path_buf()),
                PackEvent::Unreadable(p) => ("unreadable", p.to_path_buf()),
            });
        })
        .unwrap();

        assert_eq!(
            events,
            vec![
                ("packed", repo.path().join("a.txt")),
                ("ignored", repo.path().join("b.png")),
                ("unreadable", repo.path().join("c.bin")),
            ]
        );
    }

    #[test]
    fn test_write_record_format() {
        let mut buf = Vec::new();
        write_record(&mut buf, Path::new("notes.md"), "line one\nline two").unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "\n--- FILE: notes.md ---\nline one\nline two\n"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_socket_is_skipped_not_packed_empty() {
        let repo = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write(repo.path(), "a.txt", b"alpha");
        let sock_path = repo.path().join("agent.sock");
        let _listener = std::os::unix::net::UnixListener::bind(&sock_path).unwrap();

        let output = out_dir.path().join("packed.txt");
        let report = pack_repository(&config(repo.path(), &output, "", "")).unwrap();

        assert_eq!(report.packed, vec![PathBuf::from("a.txt")]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, sock_path);
        assert!(!fs::read_to_string(&output).unwrap().contains("agent.sock"));
    }

    #[cfg(unix)]
    fn set_mode(path: &Path, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_directory_is_skipped_and_walk_continues() {
        let repo = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write(repo.path(), "a.txt", b"alpha");
        write(repo.path(), "locked/secret.txt", b"secret");
        write(repo.path(), "z.txt", b"zeta");
        let locked = repo.path().join("locked");
        set_mode(&locked, 0o000);

        // Privileged users can still list the directory.
        if fs::read_dir(&locked).is_ok() {
            set_mode(&locked, 0o755);
            return;
        }

        let output = out_dir.path().join("packed.txt");
        let result = pack_repository(&config(repo.path(), &output, "", ""));
        set_mode(&locked, 0o755);
        let report = result.unwrap();

        assert_eq!(
            report.packed,
            vec![PathBuf::from("a.txt"), PathBuf::from("z.txt")]
        );
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, locked);
        assert!(!fs::read_to_string(&output).unwrap().contains("secret"));
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_file_is_skipped() {
        let repo = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write(repo.path(), "a.txt", b"alpha");
        write(repo.path(), "private.txt", b"private");
        let private = repo.path().join("private.txt");
        set_mode(&private, 0o000);

        if fs::File::open(&private).is_ok() {
            return;
        }

        let output = out_dir.path().join("packed.txt");
        let report = pack_repository(&config(repo.path(), &output, "", "")).unwrap();

        assert_eq!(report.packed, vec![PathBuf::from("a.txt")]);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].path, private);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_is_read_through_and_dir_not_descended() {
        let repo = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        write(elsewhere.path(), "target.txt", b"linked");
        write(elsewhere.path(), "dir/inner.txt", b"inner");
        std::os::unix::fs::symlink(elsewhere.path().join("target.txt"), repo.path().join("link.txt"))
            .unwrap();
        std::os::unix::fs::symlink(elsewhere.path().join("dir"), repo.path().join("linkdir")).unwrap();

        let output = out_dir.path().join("packed.txt");
        let report = pack_repository(&config(repo.path(), &output, "", "")).unwrap();

        assert_eq!(report.packed, vec![PathBuf::from("link.txt")]);
        assert!(report.skipped.is_empty());
        assert_eq!(
            fs::read_to_string(&output).unwrap(),
            "\n--- FILE: link.txt ---\nlinked\n"
        );
    }
}
