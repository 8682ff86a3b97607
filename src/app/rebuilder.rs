use crate::app::error::TransplantError;
use crate::app::listing::{ListingLine, ListingParser, MalformedLine};
use crate::app::models::{EntryKind, RebuildReport, RuntimeConfig, TreeEntry};
use globset::GlobSet;
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// One slot of the ancestor stack.
enum Ancestor {
    Dir { path: PathBuf, relative: PathBuf },
    /// Excluded directory; everything below it is dropped too.
    Excluded,
    /// Malformed line; its children have no trustworthy parent.
    Skipped,
}

pub struct Rebuilder {
    root: PathBuf,
    dry_run: bool,
    exclude_set: GlobSet,
}

impl Rebuilder {
    pub fn new(root: PathBuf, dry_run: bool, exclude_set: GlobSet) -> Self {
        Self {
            root,
            dry_run,
            exclude_set,
        }
    }

    /// Without a destination (dry-run only) paths are reported relative to `.`.
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let root = config
            .destination
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(root, config.dry_run, config.exclude.clone())
    }

    pub fn rebuild_file(&self, listing: &Path) -> Result<RebuildReport, TransplantError> {
        let text = fs::read_to_string(listing).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => TransplantError::ListingNotFound(listing.to_path_buf()),
            _ => TransplantError::ListingUnreadable {
                path: listing.to_path_buf(),
                source,
            },
        })?;
        self.rebuild(&text)
    }

    pub fn rebuild(&self, text: &str) -> Result<RebuildReport, TransplantError> {
        let mut report = RebuildReport::default();

        if !self.dry_run {
            self.create_dir(&self.root)?;
        }

        let mut stack = vec![Ancestor::Dir {
            path: self.root.clone(),
            relative: PathBuf::new(),
        }];

        for line in ListingParser::new(text) {
            let entry = match line {
                Ok(ListingLine::Entry(entry)) => entry,
                Ok(ListingLine::Summary(summary)) => {
                    report.summary = Some(summary);
                    continue;
                }
                Ok(ListingLine::Root(marker)) => {
                    log::debug!("root marker {:?}", marker);
                    continue;
                }
                Ok(ListingLine::Blank) => continue,
                Err(malformed) => {
                    skip(&mut report, &malformed);
                    // Later siblings replace the slot; children fall under it
                    if let Some(depth) = malformed.depth() {
                        if depth <= stack.len() {
                            stack.truncate(depth);
                            stack.push(Ancestor::Skipped);
                        }
                    }
                    continue;
                }
            };

            // Files take no slot, so anything nested under one lands here too
            if entry.depth > stack.len() {
                skip(
                    &mut report,
                    &MalformedLine::Orphan {
                        line: entry.line,
                        name: entry.name,
                        depth: entry.depth,
                    },
                );
                continue;
            }
            stack.truncate(entry.depth);

            match entry.kind {
                EntryKind::Directory => report.listed_directories += 1,
                EntryKind::File => report.listed_files += 1,
            }

            let slot = self.place(&stack[entry.depth - 1], &entry, &mut report)?;
            if let Some(slot) = slot {
                stack.push(slot);
            }
        }

        if let Some(summary) = report.summary.filter(|_| report.summary_mismatch()) {
            log::debug!(
                "listing announces {} directories and {} files, found {} and {}",
                summary.directories,
                summary
                    .files
                    .map_or_else(|| "no".to_string(), |f| f.to_string()),
                report.listed_directories,
                report.listed_files
            );
        }

        Ok(report)
    }

    /// Handles one entry under `parent`, returning the stack slot a directory opens.
    fn place(
        &self,
        parent: &Ancestor,
        entry: &TreeEntry,
        report: &mut RebuildReport,
    ) -> Result<Option<Ancestor>, TransplantError> {
        let (parent_path, parent_relative) = match parent {
            Ancestor::Dir { path, relative } => (path, relative),
            Ancestor::Excluded => {
                report.excluded += 1;
                return Ok(match entry.kind {
                    EntryKind::Directory => Some(Ancestor::Excluded),
                    EntryKind::File => None,
                });
            }
            Ancestor::Skipped => {
                log::warn!(
                    "skipping line {}: {:?} sits under a skipped line",
                    entry.line,
                    entry.name
                );
                report.skipped += 1;
                return Ok(match entry.kind {
                    EntryKind::Directory => Some(Ancestor::Skipped),
                    EntryKind::File => None,
                });
            }
        };

        let path = parent_path.join(&entry.name);
        let relative = parent_relative.join(&entry.name);

        if self.exclude_set.is_match(&relative) {
            log::info!("exclude {}", relative.display());
            report.excluded += 1;
            return Ok(match entry.kind {
                EntryKind::Directory => Some(Ancestor::Excluded),
                EntryKind::File => None,
            });
        }

        match entry.kind {
            EntryKind::Directory => {
                log::info!("{}mkdir {}", self.tag(), path.display());
                if !self.dry_run {
                    self.create_dir(&path)?;
                }
                report.directories += 1;
                Ok(Some(Ancestor::Dir { path, relative }))
            }
            EntryKind::File => {
                log::info!("{}touch {}", self.tag(), path.display());
                if !self.dry_run {
                    self.touch(&path)?;
                }
                report.files += 1;
                Ok(None)
            }
        }
    }

    fn tag(&self) -> &'static str {
        if self.dry_run {
            "[dry-run] "
        } else {
            ""
        }
    }

    fn create_dir(&self, path: &Path) -> Result<(), TransplantError> {
        fs::create_dir_all(path).map_err(|source| {
            if path.exists() && !path.is_dir() {
                TransplantError::NotADirectory(path.to_path_buf())
            } else {
                TransplantError::CreateDir {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })
    }

    /// Creates an empty file unless one is already there; never truncates.
    fn touch(&self, path: &Path) -> Result<(), TransplantError> {
        if let Some(parent) = path.parent() {
            self.create_dir(parent)?;
        }
        if path.is_file() {
            log::debug!("{} already exists", path.display());
            return Ok(());
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map(drop)
            .map_err(|source| TransplantError::CreateFile {
                path: path.to_path_buf(),
                source,
            })
    }
}

fn skip(report: &mut RebuildReport, malformed: &MalformedLine) {
    log::warn!("skipping {}", malformed);
    report.skipped += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::config::build_globset;

    const SAMPLE: &str = "
.
├── dir1
│   └── file1.txt
└── file_root.txt

2 directories, 2 files
";

    fn rebuild(dest: &Path, text: &str) -> RebuildReport {
        Rebuilder::new(dest.to_path_buf(), false, GlobSet::empty())
            .rebuild(text)
            .unwrap()
    }

    #[test]
    fn rebuilds_sample_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let listing = tmp.path().join("listing.txt");
        fs::write(&listing, SAMPLE).unwrap();
        let dest = tmp.path().join("dest");

        let report = Rebuilder::new(dest.clone(), false, GlobSet::empty())
            .rebuild_file(&listing)
            .unwrap();

        assert!(dest.join("dir1").is_dir());
        assert!(dest.join("dir1/file1.txt").is_file());
        assert!(dest.join("file_root.txt").is_file());
        assert_eq!(fs::metadata(dest.join("dir1/file1.txt")).unwrap().len(), 0);
        assert_eq!(report.directories, 1);
        assert_eq!(report.files, 2);
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn dry_run_touches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("dest");

        let report = Rebuilder::new(dest.clone(), true, GlobSet::empty())
            .rebuild(".\n└── file.txt\n\n1 directory, 1 file\n")
            .unwrap();

        assert!(!dest.exists());
        assert_eq!(report.files, 1);
    }

    #[test]
    fn rebuild_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("dest");

        rebuild(&dest, SAMPLE);
        fs::write(dest.join("file_root.txt"), "keep me").unwrap();
        rebuild(&dest, SAMPLE);

        assert_eq!(
            fs::read_to_string(dest.join("file_root.txt")).unwrap(),
            "keep me"
        );
        let mut names: Vec<_> = fs::read_dir(&dest)
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        names.sort();
        assert_eq!(names, ["dir1", "file_root.txt"]);
    }

    #[test]
    fn restores_only_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("dest");

        rebuild(&dest, SAMPLE);
        fs::write(dest.join("file_root.txt"), "sibling").unwrap();
        fs::remove_file(dest.join("dir1/file1.txt")).unwrap();
        rebuild(&dest, SAMPLE);

        assert!(dest.join("dir1/file1.txt").is_file());
        assert_eq!(
            fs::read_to_string(dest.join("file_root.txt")).unwrap(),
            "sibling"
        );
    }

    #[test]
    fn siblings_share_parent_after_deep_subtree() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("dest");
        let text = "\
.
├── a
│   ├── b
│   │   └── c
│   │       └── deep.rs
│   └── mid.rs
├── d
└── top.md
";
        let report = rebuild(&dest, text);

        assert!(dest.join("a/b/c/deep.rs").is_file());
        assert!(dest.join("a/mid.rs").is_file());
        assert!(dest.join("d").is_dir());
        assert!(dest.join("top.md").is_file());
        assert!(!dest.join("a/b/mid.rs").exists());
        assert_eq!(report.directories, 4);
        assert_eq!(report.files, 3);
    }

    #[test]
    fn malformed_lines_do_not_abort() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("dest");
        let text = "\
.
├── good
│   └── ok.txt
├─ broken
│       └── too_deep.txt
├── notes.txt
│   └── under_a_file.txt
└── last.txt
";
        let report = rebuild(&dest, text);

        assert!(dest.join("good/ok.txt").is_file());
        assert!(dest.join("notes.txt").is_file());
        assert!(dest.join("last.txt").is_file());
        assert!(!dest.join("too_deep.txt").exists());
        assert_eq!(report.skipped, 3);
    }

    #[test]
    fn file_in_the_way_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("dest");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("dir1"), "not a dir").unwrap();

        let err = Rebuilder::new(dest.clone(), false, GlobSet::empty())
            .rebuild(SAMPLE)
            .unwrap_err();

        assert!(matches!(err, TransplantError::NotADirectory(ref p) if *p == dest.join("dir1")));
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn excluded_directory_drops_subtree() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("dest");
        let text = "\
.
├── target
│   └── debug
│       └── app.d
├── src
│   ├── main.rs
│   └── trace.log
└── Cargo.toml
";
        let exclude = build_globset(&["target".into(), "**/*.log".into()]).unwrap();
        let report = Rebuilder::new(dest.clone(), false, exclude)
            .rebuild(text)
            .unwrap();

        assert!(!dest.join("target").exists());
        assert!(!dest.join("src/trace.log").exists());
        assert!(dest.join("src/main.rs").is_file());
        assert!(dest.join("Cargo.toml").is_file());
        assert_eq!(report.excluded, 4);
    }

    #[test]
    fn missing_listing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let err = Rebuilder::new(tmp.path().join("dest"), true, GlobSet::empty())
            .rebuild_file(&tmp.path().join("gone.txt"))
            .unwrap_err();
        assert!(matches!(err, TransplantError::ListingNotFound(_)));
    }

    #[test]
    fn skipped_directory_takes_its_children_along() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("dest");
        let text = "\
.
├── good
├── ..
│   ├── child.txt
│   └── nested
│       └── grandchild.txt
├─ broken
│   └── stray.txt
└── after.txt
";
        let report = rebuild(&dest, text);

        assert!(dest.join("good").is_dir());
        assert!(!dest.join("good/child.txt").exists());
        assert!(!dest.join("good/nested").exists());
        assert!(!dest.join("good/stray.txt").exists());
        assert!(!dest.join("child.txt").exists());
        assert!(dest.join("after.txt").is_file());
        assert_eq!(report.skipped, 6);
        assert_eq!(report.directories, 1);
        assert_eq!(report.files, 1);
    }

    #[test]
    fn sibling_after_skipped_line_is_placed_normally() {
        let tmp = tempfile::tempdir().unwrap();
        let dest = tmp.path().join("dest");
        let text = "\
.
└── src
    ├── ..
    └── lib.rs
";
        let report = rebuild(&dest, text);

        assert!(dest.join("src/lib.rs").is_file());
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn sample_summary_counts_the_root() {
        let tmp = tempfile::tempdir().unwrap();
        let report = Rebuilder::new(tmp.path().join("dest"), true, GlobSet::empty())
            .rebuild(SAMPLE)
            .unwrap();

        assert_eq!(report.listed_directories, 1);
        assert_eq!(report.listed_files, 2);
        assert!(report.summary_mismatch());

        let real_tree = ".\n├── dir1\n│   └── file1.txt\n└── file_root.txt\n\n1 directory, 2 files\n";
        let report = Rebuilder::new(tmp.path().join("dest"), true, GlobSet::empty())
            .rebuild(real_tree)
            .unwrap();
        assert!(!report.summary_mismatch());
    }

    #[test]
    fn non_utf8_listing_is_unreadable() {
        let tmp = tempfile::tempdir().unwrap();
        let listing = tmp.path().join("listing.txt");
        fs::write(&listing, [b'.', b'\n', 0xff, 0xfe, b'\n']).unwrap();
        let dest = tmp.path().join("dest");

        let err = Rebuilder::new(dest.clone(), false, GlobSet::empty())
            .rebuild_file(&listing)
            .unwrap_err();

        assert!(matches!(err, TransplantError::ListingUnreadable { .. }));
        assert_eq!(err.exit_code(), 1);
        assert!(!dest.exists());
    }
}
