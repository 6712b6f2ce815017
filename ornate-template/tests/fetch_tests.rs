use std::fs;

use ornate_template::{FetchError, Fetcher, FileFetcher, TemplateSource};

#[tokio::test]
async fn file_fetcher_reads_relative_to_its_base() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::create_dir_all(dir.path().join("views")).expect("mkdir");
    fs::write(dir.path().join("views/item.html"), "<li>{{ name }}</li>").expect("write");

    let fetcher = FileFetcher::new(dir.path());
    assert_eq!(fetcher.fetch("views/item.html").await.expect("read"), "<li>{{ name }}</li>");
    assert_eq!(fetcher.fetch("/views/item.html").await.expect("read"), "<li>{{ name }}</li>");
}

#[tokio::test]
async fn missing_files_are_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let fetcher = FileFetcher::new(dir.path());
    assert_eq!(
        fetcher.fetch("nope.html").await,
        Err(FetchError::NotFound("nope.html".to_string()))
    );
}

#[test]
fn identifiers_and_markup_are_told_apart() {
    assert!(TemplateSource::detect("views/item.html").is_remote());
    assert!(!TemplateSource::detect("<li>{{ name }}</li>").is_remote());
}
