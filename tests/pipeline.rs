use git2::{Repository, Signature, Time};
use std::path::Path;
use tempfile::TempDir;

use changeclass::config::DEFAULT_BUGFIX_PATTERN;
use changeclass::distiller::InMemoryDistiller;
use changeclass::github::store_builds;
use changeclass::models::{
    AtomicChange, BuildState, Category, ChangeKind, ChangeSummary, ClassificationTally,
    ExternalBuild,
};
use changeclass::{
    ClassificationPipeline, CommitPairResolver, GitBackend, HistoryIngester, HistoryStore,
    PipelineConfig, SelectionPolicy, Storage,
};

fn commit(repo: &Repository, dir: &Path, files: &[(&str, &str)], message: &str, ts: i64) -> String {
    let mut index = repo.index().unwrap();
    for (path, content) in files {
        let full = dir.join(path);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(&full, content).unwrap();
        index.add_path(Path::new(path)).unwrap();
    }
    index.write().unwrap();

    let signature = Signature::new("Dev", "dev@example.com", &Time::new(ts, 0)).unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .unwrap()
        .to_string()
}

struct History {
    dir: TempDir,
    hashes: Vec<String>,
}

/// C0 <- C1 <- C2 <- C3 where C2 adds an `if` to Service.java and C3 only
/// touches documentation.
fn history() -> History {
    let dir = tempfile::tempdir().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    let path = dir.path();

    let hashes = vec![
        commit(
            &repo,
            path,
            &[("src/Service.java", "class Service { void run() { go(); } }")],
            "initial import",
            1_700_000_000,
        ),
        commit(
            &repo,
            path,
            &[("src/Service.java", "class Service { void run() { go(); stop(); } }")],
            "stop after running",
            1_700_000_100,
        ),
        commit(
            &repo,
            path,
            &[(
                "src/Service.java",
                "class Service { void run() { if (ready) { go(); } stop(); } }",
            )],
            "fix start before ready",
            1_700_000_200,
        ),
        commit(&repo, path, &[("README.md", "docs")], "docs", 1_700_000_300),
    ];

    History { dir, hashes }
}

fn if_distiller() -> InMemoryDistiller {
    InMemoryDistiller::new().with_changes(
        "Service.java",
        vec![AtomicChange::new(ChangeKind::StatementInsert, "IF_STATEMENT")],
    )
}

#[test]
fn single_inserted_if_is_one_logic_control_change() {
    let history = history();
    let backend = GitBackend::open(history.dir.path()).unwrap();
    let storage = Storage::in_memory().unwrap();
    let summary = HistoryIngester::new(&storage, DEFAULT_BUGFIX_PATTERN)
        .unwrap()
        .ingest(&backend)
        .unwrap();
    assert_eq!(summary.commits, 4);
    assert_eq!(summary.bugfixes, 1);

    let distiller = if_distiller();
    let resolver =
        CommitPairResolver::new(&storage, &backend, SelectionPolicy::BugfixCommits).unwrap();
    let pipeline = ClassificationPipeline::new(
        &backend,
        &storage,
        &distiller,
        resolver.vcs_system().id,
        PipelineConfig::default(),
    );

    let first = pipeline.run(&resolver).unwrap();
    let second = pipeline.run(&resolver).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.processed, 1);

    let stored = storage.list_commit_changes(resolver.vcs_system().id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].old_revision, history.hashes[1]);
    assert_eq!(stored[0].new_revision, history.hashes[2]);

    let expected: ClassificationTally = [(Category::LogicControl, 1)].into_iter().collect();
    assert_eq!(stored[0].summary(), ChangeSummary::Tally(expected));
}

#[test]
fn all_commits_store_one_row_per_pair() {
    let history = history();
    let backend = GitBackend::open(history.dir.path()).unwrap();
    let storage = Storage::in_memory().unwrap();
    HistoryIngester::new(&storage, DEFAULT_BUGFIX_PATTERN)
        .unwrap()
        .ingest(&backend)
        .unwrap();

    // Nothing scripted: every eligible file counts as one OTHER.
    let distiller = InMemoryDistiller::new();
    let resolver =
        CommitPairResolver::new(&storage, &backend, SelectionPolicy::AllCommits).unwrap();
    let pipeline = ClassificationPipeline::new(
        &backend,
        &storage,
        &distiller,
        resolver.vcs_system().id,
        PipelineConfig::default(),
    );

    let summary = pipeline.run(&resolver).unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.not_analyzed, 1);
    assert_eq!(summary.failed, 0);

    let stored = storage.list_commit_changes(resolver.vcs_system().id).unwrap();
    assert_eq!(stored.len(), 3);
    assert_eq!(stored[0].new_revision, history.hashes[3]);
    assert_eq!(stored[0].changes, None);
    for row in &stored[1..] {
        let tally = row.changes.as_ref().unwrap();
        assert_eq!(tally.get(Category::Other), 1);
        assert_eq!(tally.total(), 1);
    }
}

#[test]
fn failing_build_is_paired_with_last_passing_ancestor() {
    let history = history();
    let backend = GitBackend::open(history.dir.path()).unwrap();
    let storage = Storage::in_memory().unwrap();
    let vcs_system = HistoryIngester::new(&storage, DEFAULT_BUGFIX_PATTERN)
        .unwrap()
        .ingest(&backend)
        .unwrap()
        .vcs_system;

    let build = |id: &str, state, hash: &String| ExternalBuild {
        external_id: id.to_string(),
        number: None,
        state,
        revision_hash: hash.clone(),
    };
    store_builds(
        &storage,
        &vcs_system,
        &[
            build("100", BuildState::Passed, &history.hashes[0]),
            build("101", BuildState::Started, &history.hashes[1]),
            build("102", BuildState::Failed, &history.hashes[2]),
            build("103", BuildState::Failed, &history.hashes[3]),
        ],
    )
    .unwrap();

    let distiller = if_distiller();
    let resolver =
        CommitPairResolver::new(&storage, &backend, SelectionPolicy::BuildLinked).unwrap();
    let pipeline = ClassificationPipeline::new(
        &backend,
        &storage,
        &distiller,
        vcs_system.id,
        PipelineConfig::default(),
    );
    let summary = pipeline.run(&resolver).unwrap();
    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 0);

    let id = |i: usize| {
        storage
            .commit_by_hash(vcs_system.id, &history.hashes[i])
            .unwrap()
            .unwrap()
            .id
    };
    let expected: ClassificationTally = [(Category::LogicControl, 1)].into_iter().collect();
    // C1 never finished and C2 failed, so both failures pair with C0.
    for failing in [2, 3] {
        assert_eq!(
            storage.commit_changes(id(0), id(failing)).unwrap(),
            Some(ChangeSummary::Tally(expected.clone()))
        );
    }
    assert_eq!(storage.list_commit_changes(vcs_system.id).unwrap().len(), 2);
}
