use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn retriever(workdir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("temis-retriever").unwrap();
    cmd.current_dir(workdir.path())
        .env_remove("TEMIS_CONFIG")
        .env_remove("INDEX_DIR")
        .env_remove("OLLAMA_URL")
        .env_remove("EMBED_MODEL")
        .env_remove("EMBED_DIMENSIONS")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_empty_corpus_index_then_status() {
    let workdir = TempDir::new().unwrap();
    fs::create_dir(workdir.path().join("docs")).unwrap();

    retriever(&workdir)
        .args(["index", "docs", "--index-dir", "idx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexing complete"));

    assert!(workdir.path().join("idx/manifest.json").exists());

    retriever(&workdir)
        .args(["status", "--index-dir", "idx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Total chunks:    0"))
        .stdout(predicate::str::contains("nomic-embed-text"));

    retriever(&workdir)
        .args(["search", "qualquer coisa", "--index-dir", "idx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No results found"));
}

#[test]
fn test_reindex_requires_force() {
    let workdir = TempDir::new().unwrap();
    fs::create_dir(workdir.path().join("docs")).unwrap();

    retriever(&workdir)
        .args(["index", "docs", "--index-dir", "idx"])
        .assert()
        .success();

    retriever(&workdir)
        .args(["index", "docs", "--index-dir", "idx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    retriever(&workdir)
        .args(["index", "docs", "--index-dir", "idx", "--force"])
        .assert()
        .success();
}

#[test]
fn test_search_without_index_fails() {
    let workdir = TempDir::new().unwrap();

    retriever(&workdir)
        .args(["search", "cartão", "--index-dir", "missing"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No search index found"));
}

#[test]
fn test_status_without_index_is_informational() {
    let workdir = TempDir::new().unwrap();

    retriever(&workdir)
        .args(["status", "--index-dir", "missing"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No index found"));
}

#[test]
fn test_invalid_chunking_is_rejected() {
    let workdir = TempDir::new().unwrap();
    fs::create_dir(workdir.path().join("docs")).unwrap();

    retriever(&workdir)
        .args([
            "index",
            "docs",
            "--index-dir",
            "idx",
            "--chunk-size",
            "100",
            "--chunk-overlap",
            "100",
        ])
        .assert()
        .failure();

    assert!(!workdir.path().join("idx").exists());
}

#[test]
fn test_unreadable_documents_are_listed_in_summary() {
    let workdir = TempDir::new().unwrap();
    let docs = workdir.path().join("docs");
    fs::create_dir(&docs).unwrap();
    fs::write(docs.join("latin1.txt"), [0x63u8, 0x61, 0x72, 0x74, 0xe3, 0x6f]).unwrap();

    retriever(&workdir)
        .args(["index", "docs", "--index-dir", "idx"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Skipped:"))
        .stdout(predicate::str::contains("latin1.txt"));
}
