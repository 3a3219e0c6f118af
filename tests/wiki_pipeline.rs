//! Integration tests for the wiki mutation pipeline.
//!
//! Every test runs against real bare stores and working copies in a temp
//! directory and inspects the published result through the store's
//! publish branch.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use wikistore::core::paths::WikiPaths;
use wikistore::core::types::{BranchName, RepoId};
use wikistore::git::local_copy::ORIGIN;
use wikistore::git::{sync_local, DelegateHooks, Git, GitError, HookError, HookInstaller};
use wikistore::wiki::{Phase, User, WikiError, WikiOutcome, WikiRepo, WikiService};

// =============================================================================
// Test Fixtures
// =============================================================================

struct Fixture {
    dir: TempDir,
    service: WikiService,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let paths = WikiPaths::new(dir.path().join("repos"), dir.path().join("data"));
        Self {
            service: WikiService::new(paths),
            dir,
        }
    }

    fn with_service(build: impl FnOnce(WikiPaths) -> WikiService) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let paths = WikiPaths::new(dir.path().join("repos"), dir.path().join("data"));
        Self {
            service: build(paths),
            dir,
        }
    }

    fn scratch(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn repo(id: i64) -> WikiRepo {
    WikiRepo::new(RepoId::new(id), "alice", format!("notes-{id}"))
}

fn alice() -> User {
    User::new("alice", "alice@example.com").with_full_name("Alice Liddell")
}

fn page_names(fixture: &Fixture, repo: &WikiRepo) -> Vec<String> {
    fixture
        .service
        .wiki(repo)
        .pages()
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect()
}

/// Commit `setup` into the store from a separate working copy.
fn publish_from_elsewhere(store: &Path, scratch: &Path, setup: impl FnOnce(&Path)) {
    let branch = BranchName::master();
    sync_local(store, scratch, &branch).unwrap();
    setup(scratch);
    let git = Git::open(scratch).unwrap();
    git.stage_all().unwrap();
    git.commit_staged("Bob", "bob@example.com", "external change")
        .unwrap()
        .expect("external change should commit");
    git.push(ORIGIN, &branch).unwrap();
}

// =============================================================================
// Add
// =============================================================================

mod add {
    use super::*;

    #[test]
    fn end_to_end_getting_started() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);
        assert!(!wiki.has_wiki());

        let outcome = wiki
            .add_page(&alice(), "Getting Started", "# Hello", "")
            .unwrap();

        assert!(wiki.has_wiki());
        assert!(wiki.wiki_path().ends_with("alice/notes-1.wiki.git"));
        assert_eq!(page_names(&f, &repo), vec!["Getting Started"]);
        assert_eq!(
            wiki.page_content("Getting Started").unwrap().as_deref(),
            Some("# Hello")
        );
        assert_eq!(wiki.page_content("Getting+Started").unwrap().as_deref(), Some("# Hello"));

        let commit = wiki.last_commit().unwrap().expect("store has a commit");
        assert_eq!(outcome, WikiOutcome::Committed { oid: commit.oid.clone() });
        assert_eq!(commit.summary, "Update page 'Getting Started'");
        assert_eq!(commit.author_name, "Alice Liddell");
        assert_eq!(commit.author_email, "alice@example.com");
        assert_eq!(commit.committer_name, "Alice Liddell");
        assert_eq!(commit.parent_count, 0);
        assert_eq!(wiki.commit_count().unwrap(), 1);
    }

    #[test]
    fn uses_given_message() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "Home", "hi", "Start the wiki").unwrap();

        let commit = wiki.last_commit().unwrap().unwrap();
        assert_eq!(commit.summary, "Start the wiki");
    }

    #[test]
    fn duplicate_title_is_rejected() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "Home", "first", "").unwrap();
        let err = wiki.add_page(&alice(), "Home", "second", "").unwrap_err();

        assert!(err.is_page_already_exists());
        assert_eq!(wiki.commit_count().unwrap(), 1);
        assert_eq!(page_names(&f, &repo), vec!["Home"]);
        assert_eq!(wiki.page_content("Home").unwrap().as_deref(), Some("first"));
    }

    #[test]
    fn duplicate_after_sanitizing_is_rejected() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "a b", "x", "").unwrap();
        let err = wiki.add_page(&alice(), "a/b", "y", "").unwrap_err();
        assert!(err.is_page_already_exists());
    }

    #[test]
    fn traversal_title_stays_inside_working_copy() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "../../etc/passwd", "nope", "").unwrap();
        wiki.add_page(&alice(), "..%2F..%2Fescape", "nope", "").unwrap();

        assert_eq!(page_names(&f, &repo), vec!["escape", "etc passwd"]);
        assert!(!f.dir.path().join("etc").exists());
        assert!(!f.dir.path().join("data/tmp/escape.md").exists());
    }

    #[test]
    fn empty_title_is_invalid() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        let err = wiki.add_page(&alice(), "/../.", "x", "").unwrap_err();
        assert!(matches!(err, WikiError::InvalidTitle { .. }));
        assert_eq!(wiki.commit_count().unwrap(), 0);
    }

    #[test]
    fn empty_content_is_a_page() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "Blank", "", "").unwrap();
        assert_eq!(wiki.page_content("Blank").unwrap().as_deref(), Some(""));
    }

    #[test]
    fn installs_hooks_on_new_store() {
        let f = Fixture::with_service(|paths| {
            WikiService::new(paths)
                .with_hooks(DelegateHooks::new("/usr/local/bin/forge").with_config("/etc/forge.ini"))
        });
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "Home", "hi", "").unwrap();

        let script = fs::read_to_string(wiki.wiki_path().join("hooks/pre-receive")).unwrap();
        assert!(script.contains("'/usr/local/bin/forge' hook --config='/etc/forge.ini' pre-receive"));
        assert_eq!(wiki.commit_count().unwrap(), 1);
    }

    #[test]
    fn publishes_to_configured_branch() {
        let f = Fixture::with_service(|paths| {
            WikiService::new(paths).with_branch(BranchName::new("wiki").unwrap())
        });
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "Home", "hi", "").unwrap();

        let store = Git::open(&wiki.wiki_path()).unwrap();
        assert!(store.has_branch(&BranchName::new("wiki").unwrap()).unwrap());
        assert!(!store.has_branch(&BranchName::master()).unwrap());
        assert_eq!(page_names(&f, &repo), vec!["Home"]);
    }
}

// =============================================================================
// Edit
// =============================================================================

mod edit {
    use super::*;

    #[test]
    fn overwrites_in_place() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "Home", "v1", "").unwrap();
        wiki.edit_page(&alice(), "Home", "Home", "v2", "").unwrap();

        assert_eq!(wiki.page_content("Home").unwrap().as_deref(), Some("v2"));
        assert_eq!(wiki.commit_count().unwrap(), 2);
        assert_eq!(
            wiki.last_commit().unwrap().unwrap().summary,
            "Update page 'Home'"
        );
    }

    #[test]
    fn rename_is_one_commit() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "Draft", "v1", "").unwrap();
        wiki.edit_page(&alice(), "Draft", "Final Notes", "v2", "").unwrap();

        assert_eq!(page_names(&f, &repo), vec!["Final Notes"]);
        assert_eq!(wiki.page_content("Draft").unwrap(), None);
        assert_eq!(wiki.page_content("Final Notes").unwrap().as_deref(), Some("v2"));
        assert_eq!(wiki.commit_count().unwrap(), 2);
    }

    #[test]
    fn rename_onto_existing_page_is_rejected() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "A", "a", "").unwrap();
        wiki.add_page(&alice(), "B", "b", "").unwrap();
        let err = wiki.edit_page(&alice(), "A", "B", "clobber", "").unwrap_err();

        assert!(err.is_page_already_exists());
        assert_eq!(wiki.commit_count().unwrap(), 2);
        assert_eq!(wiki.page_content("B").unwrap().as_deref(), Some("b"));
        assert_eq!(page_names(&f, &repo), vec!["A", "B"]);
    }

    #[test]
    fn identical_content_is_a_commit_failure() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "Home", "same", "").unwrap();
        let err = wiki.edit_page(&alice(), "Home", "Home", "same", "").unwrap_err();

        assert!(matches!(
            err,
            WikiError::Commit {
                phase: Phase::Commit,
                source: GitError::NothingToCommit,
            }
        ));
        assert_eq!(wiki.commit_count().unwrap(), 1);
    }

    #[test]
    fn replaces_directory_at_page_path() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.init_wiki().unwrap();
        publish_from_elsewhere(&wiki.wiki_path(), &f.scratch("elsewhere"), |dir| {
            fs::create_dir(dir.join("Home.md")).unwrap();
            fs::write(dir.join("Home.md").join("x"), "nested").unwrap();
        });

        wiki.edit_page(&alice(), "Home", "Home", "c", "").unwrap();

        let page = wiki.local_wiki_path().join("Home.md");
        assert!(fs::symlink_metadata(&page).unwrap().file_type().is_file());
        assert_eq!(wiki.page_content("Home").unwrap().as_deref(), Some("c"));
        assert_eq!(page_names(&f, &repo), vec!["Home"]);
        assert_eq!(wiki.commit_count().unwrap(), 2);
    }

    #[test]
    fn old_title_is_sanitized() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "Getting Started", "v1", "").unwrap();
        wiki.edit_page(&alice(), "Getting+Started", "Intro", "v2", "").unwrap();

        assert_eq!(page_names(&f, &repo), vec!["Intro"]);
    }
}

// =============================================================================
// Delete
// =============================================================================

mod delete {
    use super::*;

    #[test]
    fn removes_page() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "Home", "hi", "").unwrap();
        let outcome = wiki.delete_page(&alice(), "Home").unwrap();

        assert!(outcome.oid().is_some());
        assert!(page_names(&f, &repo).is_empty());
        let commit = wiki.last_commit().unwrap().unwrap();
        assert_eq!(commit.summary, "Delete page 'Home'");
        assert_eq!(commit.parent_count, 1);
    }

    #[test]
    fn nonexistent_page_succeeds_without_commit() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "Home", "hi", "").unwrap();
        let outcome = wiki.delete_page(&alice(), "Nope").unwrap();

        assert_eq!(outcome, WikiOutcome::Unchanged);
        assert_eq!(wiki.commit_count().unwrap(), 1);
    }

    #[test]
    fn nonexistent_page_in_empty_store_succeeds() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.init_wiki().unwrap();
        assert_eq!(wiki.delete_page(&alice(), "Nope").unwrap(), WikiOutcome::Unchanged);
    }

    #[test]
    fn missing_store_fails_and_creates_nothing() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        let err = wiki.delete_page(&alice(), "Home").unwrap_err();

        assert!(matches!(err, WikiError::Sync { .. }));
        assert_eq!(err.phase(), Some(Phase::SyncLocal));
        assert!(!wiki.has_wiki());
    }
}

// =============================================================================
// Working copy discipline
// =============================================================================

mod working_copy {
    use super::*;

    #[test]
    fn leftovers_are_discarded() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "Home", "original", "").unwrap();
        let local = wiki.local_wiki_path();
        fs::write(local.join("Home.md"), "scribbled").unwrap();
        fs::write(local.join("Junk.md"), "junk").unwrap();

        wiki.add_page(&alice(), "Other", "x", "").unwrap();

        assert_eq!(page_names(&f, &repo), vec!["Home", "Other"]);
        assert_eq!(wiki.page_content("Home").unwrap().as_deref(), Some("original"));
        assert!(!local.join("Junk.md").exists());
    }

    #[test]
    fn picks_up_changes_published_elsewhere() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "Home", "hi", "").unwrap();
        publish_from_elsewhere(&wiki.wiki_path(), &f.scratch("elsewhere"), |dir| {
            fs::write(dir.join("External.md"), "from bob").unwrap();
        });

        wiki.add_page(&alice(), "Other", "x", "").unwrap();

        assert_eq!(page_names(&f, &repo), vec!["External", "Home", "Other"]);
        assert_eq!(wiki.commit_count().unwrap(), 3);
    }

    #[test]
    fn rejected_duplicate_leaves_no_residue() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);

        wiki.add_page(&alice(), "Home", "hi", "").unwrap();
        wiki.add_page(&alice(), "Home", "again", "").unwrap_err();
        let outcome = wiki.add_page(&alice(), "Next", "n", "").unwrap();

        assert!(outcome.oid().is_some());
        assert_eq!(wiki.page_content("Home").unwrap().as_deref(), Some("hi"));
    }
}

// =============================================================================
// Symlinks at the destination
// =============================================================================

#[cfg(unix)]
mod symlinks {
    use super::*;
    use std::os::unix::fs::symlink;

    #[test]
    fn dangling_link_is_replaced_by_regular_file() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);
        let outside = f.scratch("outside");
        fs::create_dir_all(&outside).unwrap();
        let target = outside.join("planted");

        wiki.init_wiki().unwrap();
        publish_from_elsewhere(&wiki.wiki_path(), &f.scratch("elsewhere"), |dir| {
            symlink(&target, dir.join("Home.md")).unwrap();
        });

        wiki.add_page(&alice(), "Home", "safe", "").unwrap();

        assert!(!target.exists());
        let page = wiki.local_wiki_path().join("Home.md");
        assert!(fs::symlink_metadata(&page).unwrap().file_type().is_file());
        assert_eq!(wiki.page_content("Home").unwrap().as_deref(), Some("safe"));
        assert_eq!(page_names(&f, &repo), vec!["Home"]);
    }

    #[test]
    fn edit_through_link_leaves_target_untouched() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);
        let outside = f.scratch("outside");
        fs::create_dir_all(&outside).unwrap();
        let target = outside.join("secret");
        fs::write(&target, "untouched").unwrap();

        wiki.init_wiki().unwrap();
        publish_from_elsewhere(&wiki.wiki_path(), &f.scratch("elsewhere"), |dir| {
            symlink(&target, dir.join("Home.md")).unwrap();
        });

        wiki.edit_page(&alice(), "Home", "Home", "rewritten", "").unwrap();

        assert_eq!(fs::read_to_string(&target).unwrap(), "untouched");
        assert_eq!(wiki.page_content("Home").unwrap().as_deref(), Some("rewritten"));
    }

    #[test]
    fn add_over_live_link_is_a_duplicate() {
        let f = Fixture::new();
        let repo = repo(1);
        let wiki = f.service.wiki(&repo);
        let target = f.scratch("secret");
        fs::write(&target, "untouched").unwrap();

        wiki.init_wiki().unwrap();
        publish_from_elsewhere(&wiki.wiki_path(), &f.scratch("elsewhere"), |dir| {
            symlink(&target, dir.join("Home.md")).unwrap();
        });

        let err = wiki.add_page(&alice(), "Home", "x", "").unwrap_err();
        assert!(err.is_page_already_exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "untouched");
    }
}

// =============================================================================
// Concurrency
// =============================================================================

mod concurrency {
    use super::*;

    #[test]
    fn same_repository_serializes() {
        let f = Fixture::new();
        let repo = repo(1);

        std::thread::scope(|s| {
            for i in 0..4 {
                let service = &f.service;
                let repo = &repo;
                s.spawn(move || {
                    service
                        .wiki(repo)
                        .add_page(&alice(), &format!("Page {i}"), "x", "")
                        .unwrap();
                });
            }
        });

        let wiki = f.service.wiki(&repo);
        assert_eq!(wiki.commit_count().unwrap(), 4);
        assert_eq!(page_names(&f, &repo).len(), 4);
    }

    #[test]
    fn concurrent_duplicates_yield_one_page() {
        let f = Fixture::new();
        let repo = repo(1);

        let results: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    let service = &f.service;
                    let repo = &repo;
                    s.spawn(move || service.wiki(repo).add_page(&alice(), "Home", "x", ""))
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let ok = results.iter().filter(|r| r.is_ok()).count();
        let dup = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.is_page_already_exists()))
            .count();
        assert_eq!((ok, dup), (1, 1));
        assert_eq!(f.service.wiki(&repo).commit_count().unwrap(), 1);
    }

    #[test]
    fn distinct_repositories_proceed_independently() {
        let f = Fixture::new();
        let repos = [repo(1), repo(2), repo(3)];

        std::thread::scope(|s| {
            for repo in &repos {
                let service = &f.service;
                s.spawn(move || {
                    for i in 0..3 {
                        service
                            .wiki(repo)
                            .add_page(&alice(), &format!("Page {i}"), "x", "")
                            .unwrap();
                    }
                });
            }
        });

        for repo in &repos {
            assert_eq!(f.service.wiki(repo).commit_count().unwrap(), 3);
        }
    }

    /// Parks the first Add of one store inside hook installation, which
    /// runs while that repository's slot is held.
    struct GatedHooks {
        gated_store: PathBuf,
        entered: Mutex<mpsc::Sender<()>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl HookInstaller for GatedHooks {
        fn install(&self, store_path: &Path) -> Result<(), HookError> {
            if store_path == self.gated_store {
                self.entered.lock().unwrap().send(()).unwrap();
                // A dropped sender (failing test) also releases.
                let _ = self.release.lock().unwrap().recv();
            }
            Ok(())
        }
    }

    #[test]
    fn held_repository_blocks_only_itself() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let f = Fixture::with_service(|paths| {
            let hooks = GatedHooks {
                gated_store: paths.wiki_path("alice", "notes-1"),
                entered: Mutex::new(entered_tx),
                release: Mutex::new(release_rx),
            };
            WikiService::new(paths).with_hooks(hooks)
        });
        let held = repo(1);
        let other = repo(2);
        let timeout = Duration::from_secs(30);

        std::thread::scope(|s| {
            // Owned here so an early panic drops it and unparks the hook.
            let release_tx = release_tx;
            let service = &f.service;
            let held = &held;
            let other = &other;

            let first = s.spawn(move || service.wiki(held).add_page(&alice(), "Home", "one", ""));
            entered_rx
                .recv_timeout(timeout)
                .expect("repo 1 never reached hook installation");

            let (same_tx, same_rx) = mpsc::channel();
            let same = s.spawn(move || {
                let result = service.wiki(held).add_page(&alice(), "Second", "two", "");
                same_tx.send(()).ok();
                result
            });

            let (other_tx, other_rx) = mpsc::channel();
            let independent = s.spawn(move || {
                let result = service.wiki(other).add_page(&alice(), "Home", "other", "");
                other_tx.send(()).ok();
                result
            });

            let other_finished = other_rx.recv_timeout(timeout);
            let same_finished_early = same_rx.recv_timeout(Duration::from_millis(200));
            release_tx.send(()).unwrap();

            assert!(other_finished.is_ok(), "repo 2 waited on repo 1's slot");
            assert!(same_finished_early.is_err(), "repo 1 admitted a second mutation");
            assert!(independent.join().unwrap().is_ok());
            assert!(first.join().unwrap().is_ok());
            assert!(same.join().unwrap().is_ok());
        });

        assert_eq!(f.service.wiki(&held).commit_count().unwrap(), 2);
        assert_eq!(f.service.wiki(&other).commit_count().unwrap(), 1);
    }
}
