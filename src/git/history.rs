//! Git history extraction using libgit2
//!
//! Walks commit history with the git2 crate (Rust bindings to libgit2) and
//! derives two per-file signals: maintenance risk (churn, hotfix commits and
//! author spread over a recent window) and freshness (age of the last change).

use crate::config::GitConfig;
use crate::signals::{Freshness, FreshnessBuckets, FreshnessEntry, GitRiskRecord};
use anyhow::{Context, Result};
use chrono::{DateTime, Months, TimeZone, Utc};
use git2::{DiffOptions, Repository, Sort};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Information about a git commit.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// Short hash (12 characters)
    pub hash: String,
    /// Author name
    pub author: String,
    /// Commit time
    pub timestamp: DateTime<Utc>,
    /// Commit message (first line)
    pub subject: String,
    /// Files changed in this commit (repository-relative)
    pub files_changed: Vec<String>,
}

/// Per-file activity inside the risk window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileActivity {
    pub commits: u32,
    pub hotfixes: u32,
    pub authors: BTreeSet<String>,
}

/// Git-derived signals keyed by analyzed file path
#[derive(Debug, Clone, Default)]
pub struct GitSignals {
    pub risk: Vec<GitRiskRecord>,
    pub freshness: FreshnessBuckets,
    pub commits_scanned: usize,
}

/// Git history analyzer using libgit2.
pub struct GitHistory {
    repo: Repository,
}

impl GitHistory {
    /// Open a git repository.
    ///
    /// # Arguments
    /// * `path` - Path to the repository (or any subdirectory)
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path)
            .with_context(|| format!("Failed to open git repository at {:?}", path))?;
        debug!("Opened git repository at {:?}", repo.path());
        Ok(Self { repo })
    }

    /// Check if a path is inside a git repository.
    pub fn is_git_repo(path: &Path) -> bool {
        Repository::discover(path).is_ok()
    }

    /// Get the repository root path.
    pub fn repo_root(&self) -> Result<&Path> {
        self.repo
            .workdir()
            .context("Repository has no working directory (bare repo?)")
    }

    /// Get recent commits, newest first.
    ///
    /// # Arguments
    /// * `max_commits` - Maximum number of commits to retrieve
    /// * `since` - Optional timestamp to filter commits after
    pub fn get_recent_commits(
        &self,
        max_commits: usize,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<CommitInfo>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push_head()?;

        let mut commits = Vec::new();

        for oid_result in revwalk {
            if commits.len() >= max_commits {
                break;
            }

            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;

            // Filter by timestamp if specified
            if let Some(since_ts) = since {
                let commit_time = commit.time();
                let commit_dt = Utc.timestamp_opt(commit_time.seconds(), 0).single();
                if commit_dt.is_some_and(|dt| dt < since_ts) {
                    break; // Commits are sorted by time, so we can stop
                }
            }

            commits.push(self.extract_commit_info(&commit)?);
        }

        Ok(commits)
    }

    /// Extract commit information from a git2 Commit object.
    fn extract_commit_info(&self, commit: &git2::Commit) -> Result<CommitInfo> {
        let subject = commit
            .message()
            .unwrap_or("")
            .lines()
            .next()
            .unwrap_or("")
            .to_string();

        // Get changed files
        let parent = commit.parent(0).ok();
        let tree = commit.tree()?;
        let parent_tree = parent.as_ref().map(|p| p.tree()).transpose()?;

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let mut files_changed = Vec::new();
        diff.foreach(
            &mut |delta, _| {
                if let Some(path) = delta.new_file().path() {
                    files_changed.push(path.to_string_lossy().replace('\\', "/"));
                }
                true
            },
            None,
            None,
            None,
        )?;

        let full_hash = commit.id().to_string();
        Ok(CommitInfo {
            hash: full_hash[..12.min(full_hash.len())].to_string(),
            author: commit.author().name().unwrap_or("Unknown").to_string(),
            timestamp: Utc
                .timestamp_opt(commit.time().seconds(), 0)
                .single()
                .unwrap_or_default(),
            subject,
            files_changed,
        })
    }

    /// Time of the last commit touching each of `paths` (repository-relative).
    ///
    /// Walks the whole history with a pathspec limited to `paths` and stops
    /// once every path has been seen. Paths never touched are absent.
    pub fn last_changes(&self, paths: &[&str]) -> Result<HashMap<String, DateTime<Utc>>> {
        let mut found = HashMap::new();
        if paths.is_empty() {
            return Ok(found);
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME)?;
        revwalk.push_head()?;

        let wanted: HashSet<&str> = paths.iter().copied().collect();
        let mut diff_opts = DiffOptions::new();
        diff_opts.disable_pathspec_match(true);
        for path in paths {
            diff_opts.pathspec(*path);
        }

        for oid_result in revwalk {
            if found.len() == wanted.len() {
                break;
            }

            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;
            let parent = commit.parent(0).ok();
            let tree = commit.tree()?;
            let parent_tree = parent.as_ref().map(|p| p.tree()).transpose()?;

            let diff = self.repo.diff_tree_to_tree(
                parent_tree.as_ref(),
                Some(&tree),
                Some(&mut diff_opts),
            )?;
            if diff.deltas().len() == 0 {
                continue;
            }

            let timestamp = Utc
                .timestamp_opt(commit.time().seconds(), 0)
                .single()
                .unwrap_or_default();
            for delta in diff.deltas() {
                let Some(path) = delta.new_file().path() else {
                    continue;
                };
                let path = path.to_string_lossy().replace('\\', "/");
                if wanted.contains(path.as_str()) {
                    found.entry(path).or_insert(timestamp);
                }
            }
        }

        Ok(found)
    }

    /// Whether `path` (repository-relative) exists in the HEAD tree.
    fn is_tracked(&self, path: &str) -> bool {
        self.repo
            .head()
            .and_then(|head| head.peel_to_tree())
            .and_then(|tree| tree.get_path(Path::new(path)))
            .is_ok()
    }

    /// Map analyzed paths (relative to `target`) to repository-relative paths.
    fn repo_paths(&self, target: &Path, files: &[PathBuf]) -> Result<HashMap<String, String>> {
        let root = self.repo_root()?.canonicalize()?;
        let target = target
            .canonicalize()
            .with_context(|| format!("Failed to resolve {}", target.display()))?;
        let prefix = target.strip_prefix(&root).unwrap_or(Path::new(""));

        Ok(files
            .iter()
            .map(|f| {
                let in_repo = prefix.join(f).to_string_lossy().replace('\\', "/");
                (in_repo, f.to_string_lossy().into_owned())
            })
            .collect())
    }

    /// Risk records and freshness buckets for the analyzed `files`.
    pub fn signals(
        &self,
        target: &Path,
        files: &[PathBuf],
        config: &GitConfig,
        now: DateTime<Utc>,
    ) -> Result<GitSignals> {
        let paths = self.repo_paths(target, files)?;
        let commits = self.get_recent_commits(config.max_commits, None)?;
        let since = now.checked_sub_months(Months::new(config.months));

        let mut activity: BTreeMap<String, FileActivity> = BTreeMap::new();
        let mut last_modified: HashMap<String, DateTime<Utc>> = HashMap::new();

        for commit in &commits {
            let in_window = since.map_or(true, |s| commit.timestamp >= s);
            let hotfix = is_hotfix(&commit.subject, &config.hotfix_keywords);

            for changed in &commit.files_changed {
                let Some(file) = paths.get(changed) else {
                    continue;
                };
                // Newest first, so the first sighting is the last change
                last_modified
                    .entry(file.clone())
                    .or_insert(commit.timestamp);

                if in_window {
                    let stats = activity.entry(file.clone()).or_default();
                    stats.commits += 1;
                    stats.authors.insert(commit.author.clone());
                    if hotfix {
                        stats.hotfixes += 1;
                    }
                }
            }
        }

        // A truncated walk misses tracked files last changed before it
        let truncated = commits.len() >= config.max_commits;
        let unseen: Vec<&str> = paths
            .iter()
            .filter(|(in_repo, file)| {
                truncated
                    && !last_modified.contains_key(file.as_str())
                    && self.is_tracked(in_repo.as_str())
            })
            .map(|(in_repo, _)| in_repo.as_str())
            .collect();
        if !unseen.is_empty() {
            debug!("Looking up last change for {} older files", unseen.len());
            for (in_repo, ts) in self.last_changes(&unseen)? {
                if let Some(file) = paths.get(&in_repo) {
                    last_modified.insert(file.clone(), ts);
                }
            }
        }

        let analyzed: Vec<String> = files
            .iter()
            .map(|f| f.to_string_lossy().into_owned())
            .collect();

        debug!(
            "Scanned {} commits, {} files active in the last {} months",
            commits.len(),
            activity.len(),
            config.months
        );

        Ok(GitSignals {
            risk: risk_records(&activity),
            freshness: freshness_buckets(&analyzed, &last_modified, now, config),
            commits_scanned: commits.len(),
        })
    }
}

/// Whether a commit subject marks a hotfix (case-insensitive substring)
pub fn is_hotfix(subject: &str, keywords: &[String]) -> bool {
    let lower = subject.to_lowercase();
    keywords.iter().any(|kw| lower.contains(&kw.to_lowercase()))
}

/// Risk = 0.4·churn/max_churn + 0.4·min(hotfixes,3)/3 + 0.2·min(authors,5)/5.
///
/// Files scoring 0.1 or less are dropped. Sorted by risk (desc), then path.
pub fn risk_records(activity: &BTreeMap<String, FileActivity>) -> Vec<GitRiskRecord> {
    let max_churn = activity.values().map(|a| a.commits).max().unwrap_or(0);
    if max_churn == 0 {
        return Vec::new();
    }

    let mut records: Vec<GitRiskRecord> = activity
        .iter()
        .filter_map(|(file, a)| {
            let churn = a.commits as f64 / max_churn as f64;
            let hotfix = a.hotfixes.min(3) as f64 / 3.0;
            let authors = a.authors.len().min(5) as f64 / 5.0;
            let risk = churn * 0.4 + hotfix * 0.4 + authors * 0.2;

            (risk > 0.1).then(|| GitRiskRecord {
                file: file.clone(),
                risk_score: (risk * 100.0).round() / 100.0,
                churn: a.commits,
                hotfixes: a.hotfixes,
                authors: a.authors.len() as u32,
            })
        })
        .collect();

    records.sort_by(|a, b| {
        b.risk_score
            .total_cmp(&a.risk_score)
            .then_with(|| a.file.cmp(&b.file))
    });
    records
}

/// Bucket every analyzed file by days since its last commit.
///
/// Files absent from `last_modified` have never been committed and count as
/// active.
pub fn freshness_buckets(
    files: &[String],
    last_modified: &HashMap<String, DateTime<Utc>>,
    now: DateTime<Utc>,
    config: &GitConfig,
) -> FreshnessBuckets {
    let mut buckets = FreshnessBuckets::default();

    for file in files {
        let days = last_modified
            .get(file)
            .map(|ts| (now - *ts).num_days().max(0))
            .unwrap_or(0);

        let bucket = if days < config.active_days {
            Freshness::Active
        } else if days < config.aging_days {
            Freshness::Aging
        } else if days < config.stale_days {
            Freshness::Stale
        } else {
            Freshness::Dormant
        };

        buckets.push(
            bucket,
            FreshnessEntry {
                file: file.clone(),
                days,
            },
        );
    }

    // Oldest dormant files first
    buckets.dormant.sort_by(|a, b| b.days.cmp(&a.days));
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn commit_file(
        repo: &Repository,
        dir: &Path,
        name: &str,
        content: &str,
        message: &str,
    ) -> Result<()> {
        commit_file_at(repo, dir, name, content, message, Utc::now())
    }

    fn commit_file_at(
        repo: &Repository,
        dir: &Path,
        name: &str,
        content: &str,
        message: &str,
        when: DateTime<Utc>,
    ) -> Result<()> {
        let sig = git2::Signature::new(
            "Test User",
            "test@example.com",
            &git2::Time::new(when.timestamp(), 0),
        )?;
        let tree_id = {
            let mut index = repo.index()?;
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, content)?;
            index.add_path(Path::new(name))?;
            index.write()?;
            index.write_tree()?
        };
        let tree = repo.find_tree(tree_id)?;
        let parents = match repo.head() {
            Ok(head) => vec![head.peel_to_commit()?],
            Err(_) => vec![],
        };
        let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)?;
        Ok(())
    }

    fn create_test_repo() -> Result<(tempfile::TempDir, Repository)> {
        let dir = tempdir()?;
        let repo = Repository::init(dir.path())?;

        // Configure user for commits
        let mut config = repo.config()?;
        config.set_str("user.name", "Test User")?;
        config.set_str("user.email", "test@example.com")?;

        commit_file(&repo, dir.path(), "app/core.py", "x = 1\n", "Initial commit")?;
        commit_file(&repo, dir.path(), "app/core.py", "x = 2\n", "Fix crash in core")?;
        commit_file(&repo, dir.path(), "app/db.py", "y = 1\n", "Add db layer")?;

        Ok((dir, repo))
    }

    #[test]
    fn test_open_repo() -> Result<()> {
        let (dir, _repo) = create_test_repo()?;
        let history = GitHistory::open(dir.path())?;
        assert!(history.repo_root()?.exists());
        Ok(())
    }

    #[test]
    fn test_is_git_repo() -> Result<()> {
        let (dir, _repo) = create_test_repo()?;
        assert!(GitHistory::is_git_repo(dir.path()));

        let non_repo = tempdir()?;
        assert!(!GitHistory::is_git_repo(non_repo.path()));
        Ok(())
    }

    #[test]
    fn test_get_recent_commits() -> Result<()> {
        let (dir, _repo) = create_test_repo()?;
        let history = GitHistory::open(dir.path())?;

        let commits = history.get_recent_commits(10, None)?;
        assert_eq!(commits.len(), 3);
        assert_eq!(commits[2].subject, "Initial commit");
        assert_eq!(commits[2].files_changed, vec!["app/core.py"]);
        Ok(())
    }

    #[test]
    fn test_signals_from_history() -> Result<()> {
        let (dir, _repo) = create_test_repo()?;
        let history = GitHistory::open(dir.path())?;

        let files = vec![
            PathBuf::from("app/core.py"),
            PathBuf::from("app/db.py"),
            PathBuf::from("app/new.py"),
        ];
        let signals = history.signals(dir.path(), &files, &GitConfig::default(), Utc::now())?;

        assert_eq!(signals.commits_scanned, 3);
        let core = signals
            .risk
            .iter()
            .find(|r| r.file == "app/core.py")
            .expect("core has risk");
        assert_eq!(core.churn, 2);
        assert_eq!(core.hotfixes, 1);
        assert_eq!(core.authors, 1);
        // 0.4 * 1 + 0.4 * 1/3 + 0.2 * 1/5 = 0.573
        assert_eq!(core.risk_score, 0.57);
        assert_eq!(signals.risk[0].file, "app/core.py");

        // Everything was committed just now or never
        assert_eq!(signals.freshness.active.len(), 3);
        Ok(())
    }

    #[test]
    fn test_signals_for_subdirectory_target() -> Result<()> {
        let (dir, _repo) = create_test_repo()?;
        let history = GitHistory::open(dir.path())?;

        let files = vec![PathBuf::from("core.py")];
        let signals = history.signals(
            &dir.path().join("app"),
            &files,
            &GitConfig::default(),
            Utc::now(),
        )?;

        assert_eq!(signals.risk.len(), 1);
        assert_eq!(signals.risk[0].file, "core.py");
        Ok(())
    }

    #[test]
    fn test_freshness_past_commit_limit() -> Result<()> {
        let dir = tempdir()?;
        let repo = Repository::init(dir.path())?;
        let now = Utc::now();

        commit_file_at(
            &repo,
            dir.path(),
            "ancient.py",
            "a = 1\n",
            "Add ancient module",
            now - Duration::days(400),
        )?;
        for i in 0..3 {
            commit_file_at(
                &repo,
                dir.path(),
                "new.py",
                &format!("n = {}\n", i),
                "Tweak new module",
                now - Duration::days(3 - i),
            )?;
        }

        let history = GitHistory::open(dir.path())?;
        let config = GitConfig {
            max_commits: 2,
            ..GitConfig::default()
        };
        let files = vec![
            PathBuf::from("new.py"),
            PathBuf::from("ancient.py"),
            PathBuf::from("scratch.py"),
        ];
        let signals = history.signals(dir.path(), &files, &config, now)?;

        assert_eq!(signals.commits_scanned, 2);
        let names = |entries: &[FreshnessEntry]| {
            entries.iter().map(|e| e.file.clone()).collect::<Vec<_>>()
        };
        // scratch.py was never committed
        assert_eq!(names(&signals.freshness.active), vec!["new.py", "scratch.py"]);
        assert_eq!(names(&signals.freshness.dormant), vec!["ancient.py"]);
        assert!(signals.freshness.dormant[0].days >= 399);
        Ok(())
    }

    #[test]
    fn test_last_changes() -> Result<()> {
        let (dir, _repo) = create_test_repo()?;
        let history = GitHistory::open(dir.path())?;

        let found = history.last_changes(&["app/core.py", "app/missing.py"])?;
        assert_eq!(found.len(), 1);
        assert!(found.contains_key("app/core.py"));
        Ok(())
    }

    #[test]
    fn test_is_hotfix() {
        let keywords = GitConfig::default().hotfix_keywords;
        assert!(is_hotfix("Fix null pointer", &keywords));
        assert!(is_hotfix("URGENT: revert deploy", &keywords));
        assert!(is_hotfix("bugfix for parser", &keywords));
        assert!(!is_hotfix("Add feature flag", &keywords));
    }

    #[test]
    fn test_risk_records_formula() {
        let mut activity = BTreeMap::new();
        activity.insert(
            "hot.py".to_string(),
            FileActivity {
                commits: 10,
                hotfixes: 5,
                authors: ["a", "b", "c", "d", "e", "f"].iter().map(|s| s.to_string()).collect(),
            },
        );
        activity.insert(
            "calm.py".to_string(),
            FileActivity {
                commits: 1,
                hotfixes: 0,
                authors: ["a"].iter().map(|s| s.to_string()).collect(),
            },
        );
        activity.insert(
            "tiny.py".to_string(),
            FileActivity {
                commits: 0,
                hotfixes: 0,
                authors: BTreeSet::new(),
            },
        );

        let records = risk_records(&activity);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file, "hot.py");
        assert_eq!(records[0].risk_score, 1.0);
        // calm.py: 0.4 * 0.1 + 0.2 * 0.2 = 0.08, below the cutoff
        assert!(records.iter().all(|r| r.file != "calm.py"));
    }

    #[test]
    fn test_freshness_buckets() {
        let now = Utc::now();
        let mut last = HashMap::new();
        last.insert("a.py".to_string(), now - Duration::days(3));
        last.insert("b.py".to_string(), now - Duration::days(45));
        last.insert("c.py".to_string(), now - Duration::days(120));
        last.insert("d.py".to_string(), now - Duration::days(200));
        last.insert("e.py".to_string(), now - Duration::days(900));

        let files: Vec<String> = ["a.py", "b.py", "c.py", "d.py", "e.py", "new.py"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let buckets = freshness_buckets(&files, &last, now, &GitConfig::default());

        let names = |entries: &[FreshnessEntry]| {
            entries.iter().map(|e| e.file.clone()).collect::<Vec<_>>()
        };
        assert_eq!(names(&buckets.active), vec!["a.py", "new.py"]);
        assert_eq!(names(&buckets.aging), vec!["b.py"]);
        assert_eq!(names(&buckets.stale), vec!["c.py"]);
        assert_eq!(names(&buckets.dormant), vec!["e.py", "d.py"]);
    }
}
