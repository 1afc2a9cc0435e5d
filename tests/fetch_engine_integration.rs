//! Integration tests for the fetch engine.
//!
//! These tests run `FetchEngine` end to end against wiremock servers and
//! temporary directories, covering layout, deconfliction, skip-existing,
//! Content-Type renames and failure accounting.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use urlmirror_core::download::{DownloadError, FetchFailure};
use urlmirror_core::{
    ExecutionMode, FetchEngine, FetchStatus, FlattenMode, HttpClient, PolicyConfig, RunReport,
    SuffixPolicy,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ==================== Helper Functions ====================

/// Directory name the hierarchical layout uses for a mock server (`host:port`).
fn host_dir(server: &MockServer) -> String {
    server.address().to_string()
}

async fn mount_body(server: &MockServer, route: &str, body: &str, content_type: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body, content_type),
        )
        .mount(server)
        .await;
}

async fn run(policy: PolicyConfig, urls: &[String]) -> RunReport {
    FetchEngine::new(policy, HttpClient::new(), 10, 5)
        .unwrap()
        .run(urls)
        .await
        .unwrap()
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

fn success_path(report: &RunReport, index: usize) -> PathBuf {
    match &report.results[index].status {
        FetchStatus::Success(path) => path.clone(),
        other => panic!("expected success for result {index}, got {other:?}"),
    }
}

// ==================== Layout Tests ====================

#[tokio::test]
async fn test_hierarchical_layout_mirrors_host_and_path() {
    let server = MockServer::start().await;
    mount_body(&server, "/docs/guide.html", "<h1>guide</h1>", "text/html").await;
    let dir = TempDir::new().unwrap();
    let url = format!("{}/docs/guide.html", server.uri());

    let report = run(PolicyConfig::new(dir.path()), &[url.clone()]).await;

    let expected = dir
        .path()
        .join(host_dir(&server))
        .join("docs")
        .join("guide.html");
    assert_eq!(success_path(&report, 0), expected);
    assert_eq!(read(&expected), "<h1>guide</h1>");
    assert_eq!(report.summary.succeeded, 1);
    assert!(!report.summary.is_failure());

    let mapped = report.map.get(&url).unwrap();
    assert!(Path::new(mapped).is_absolute());
    assert!(mapped.ends_with("guide.html"));
}

#[tokio::test]
async fn test_directory_like_url_is_renamed_from_content_type() {
    let server = MockServer::start().await;
    mount_body(&server, "/docs/", "<html></html>", "text/html; charset=utf-8").await;
    let dir = TempDir::new().unwrap();

    let report = run(
        PolicyConfig::new(dir.path()),
        &[format!("{}/docs/", server.uri())],
    )
    .await;

    let docs = dir.path().join(host_dir(&server)).join("docs");
    assert_eq!(success_path(&report, 0), docs.join("index.html"));
    assert!(docs.join("index.html").exists());
    assert!(!docs.join("index").exists());
}

#[tokio::test]
async fn test_octet_stream_keeps_extensionless_name() {
    let server = MockServer::start().await;
    mount_body(&server, "/blob", "\u{1}\u{2}", "application/octet-stream").await;
    let dir = TempDir::new().unwrap();

    let report = run(
        PolicyConfig::new(dir.path()),
        &[format!("{}/blob", server.uri())],
    )
    .await;

    assert_eq!(
        success_path(&report, 0),
        dir.path().join(host_dir(&server)).join("blob")
    );
}

#[tokio::test]
async fn test_forced_suffix_is_applied_without_rename() {
    let server = MockServer::start().await;
    mount_body(&server, "/page", "plain", "text/plain").await;
    let dir = TempDir::new().unwrap();
    let policy = PolicyConfig::new(dir.path()).with_suffix(SuffixPolicy::Literal(".html".into()));

    let report = run(policy, &[format!("{}/page", server.uri())]).await;

    let expected = dir.path().join(host_dir(&server)).join("page.html");
    assert_eq!(success_path(&report, 0), expected);
    assert!(!expected.with_file_name("page").exists());
    assert_eq!(read(&expected), "plain");
}

#[tokio::test]
async fn test_suffix_none_strips_url_extension() {
    let server = MockServer::start().await;
    mount_body(&server, "/report.pdf", "%PDF", "application/pdf").await;
    let dir = TempDir::new().unwrap();
    let policy = PolicyConfig::new(dir.path()).with_suffix(SuffixPolicy::None);

    let report = run(policy, &[format!("{}/report.pdf", server.uri())]).await;

    assert_eq!(
        success_path(&report, 0),
        dir.path().join(host_dir(&server)).join("report")
    );
}

#[tokio::test]
async fn test_strip_prefix_drops_host_and_prefix_directories() {
    let server = MockServer::start().await;
    mount_body(&server, "/v1/api/users.json", "[]", "application/json").await;
    let dir = TempDir::new().unwrap();
    let policy = PolicyConfig::new(dir.path())
        .with_strip_prefix(&format!("{}/v1/", server.uri()))
        .unwrap();

    let report = run(policy, &[format!("{}/v1/api/users.json", server.uri())]).await;

    assert_eq!(
        success_path(&report, 0),
        dir.path().join("api").join("users.json")
    );
}

// ==================== Deconfliction Tests ====================

#[tokio::test]
async fn test_flatten_all_borrows_parent_segment_across_hosts() {
    let server_a = MockServer::start().await;
    let server_b = MockServer::start().await;
    mount_body(&server_a, "/x/f.txt", "from a", "text/plain").await;
    mount_body(&server_b, "/y/f.txt", "from b", "text/plain").await;
    let dir = TempDir::new().unwrap();
    let policy = PolicyConfig::new(dir.path()).with_flatten(FlattenMode::All);

    let report = run(
        policy,
        &[
            format!("{}/x/f.txt", server_a.uri()),
            format!("{}/y/f.txt", server_b.uri()),
        ],
    )
    .await;

    assert_eq!(success_path(&report, 0), dir.path().join("f.txt"));
    assert_eq!(success_path(&report, 1), dir.path().join("y-f.txt"));
    assert_eq!(read(&dir.path().join("f.txt")), "from a");
    assert_eq!(read(&dir.path().join("y-f.txt")), "from b");
}

#[tokio::test]
async fn test_flatten_all_numeric_fallback_in_input_order() {
    let server = MockServer::start().await;
    mount_body(&server, "/f.txt", "same name", "text/plain").await;
    let dir = TempDir::new().unwrap();
    let policy = PolicyConfig::new(dir.path()).with_flatten(FlattenMode::All);
    let urls: Vec<String> = (1..=3)
        .map(|v| format!("{}/f.txt?v={v}", server.uri()))
        .collect();

    let report = run(policy, &urls).await;

    assert_eq!(success_path(&report, 0), dir.path().join("f.txt"));
    assert_eq!(success_path(&report, 1), dir.path().join("f_1.txt"));
    assert_eq!(success_path(&report, 2), dir.path().join("f_2.txt"));
    assert_eq!(report.map.len(), 3);
}

#[tokio::test]
async fn test_flatten_avoids_preexisting_files() {
    let server = MockServer::start().await;
    mount_body(&server, "/x/f.txt", "new", "text/plain").await;
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("f.txt"), "old").unwrap();
    let policy = PolicyConfig::new(dir.path()).with_flatten(FlattenMode::All);

    let report = run(policy, &[format!("{}/x/f.txt", server.uri())]).await;

    assert_eq!(success_path(&report, 0), dir.path().join("x-f.txt"));
    assert_eq!(read(&dir.path().join("f.txt")), "old");
}

#[tokio::test]
async fn test_content_type_rename_respects_claims_from_same_run() {
    let server = MockServer::start().await;
    mount_body(&server, "/a/about.html", "static", "text/html").await;
    mount_body(&server, "/b/about", "dynamic", "text/html").await;
    let dir = TempDir::new().unwrap();
    let policy = PolicyConfig::new(dir.path()).with_flatten(FlattenMode::All);

    let report = FetchEngine::new(policy, HttpClient::new(), 10, 5)
        .unwrap()
        .with_mode(ExecutionMode::Sequential)
        .run(&[
            format!("{}/a/about.html", server.uri()),
            format!("{}/b/about", server.uri()),
        ])
        .await
        .unwrap();

    assert_eq!(success_path(&report, 0), dir.path().join("about.html"));
    assert_eq!(success_path(&report, 1), dir.path().join("about"));
    assert_eq!(read(&dir.path().join("about.html")), "static");
    assert_eq!(read(&dir.path().join("about")), "dynamic");
}

// ==================== Skip-Existing Tests ====================

#[tokio::test]
async fn test_skip_existing_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/f.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
        .expect(0)
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let existing = dir.path().join(host_dir(&server)).join("f.txt");
    std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
    std::fs::write(&existing, "cached").unwrap();
    let url = format!("{}/f.txt", server.uri());

    let report = run(
        PolicyConfig::new(dir.path()).with_skip_existing(true),
        &[url.clone()],
    )
    .await;

    assert!(report.results[0].is_skipped());
    assert_eq!(report.results[0].path(), Some(existing.as_path()));
    assert_eq!(report.summary.skipped, 1);
    assert!(!report.summary.is_failure());
    assert!(report.map.get(&url).is_some());
    assert_eq!(read(&existing), "cached");
}

#[tokio::test]
async fn test_without_skip_existing_file_is_overwritten() {
    let server = MockServer::start().await;
    mount_body(&server, "/f.txt", "fresh", "text/plain").await;
    let dir = TempDir::new().unwrap();
    let existing = dir.path().join(host_dir(&server)).join("f.txt");
    std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
    std::fs::write(&existing, "cached").unwrap();

    let report = run(
        PolicyConfig::new(dir.path()),
        &[format!("{}/f.txt", server.uri())],
    )
    .await;

    assert_eq!(success_path(&report, 0), existing);
    assert_eq!(read(&existing), "fresh");
}

// ==================== Failure Tests ====================

#[tokio::test]
async fn test_http_404_fails_and_leaves_no_file() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.txt"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let url = format!("{}/missing.txt", server.uri());

    let report = run(PolicyConfig::new(dir.path()), &[url.clone()]).await;

    assert!(matches!(
        report.results[0].status,
        FetchStatus::Failed(FetchFailure::Download(DownloadError::HttpStatus {
            status: 404,
            ..
        }))
    ));
    assert!(
        !dir.path()
            .join(host_dir(&server))
            .join("missing.txt")
            .exists()
    );
    assert!(report.map.get(&url).is_none());
    assert!(report.summary.is_failure());
}

#[tokio::test]
async fn test_timeout_is_reported_per_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let client = HttpClient::with_options(&urlmirror_core::ClientOptions {
        timeout: Duration::from_millis(200),
        ..Default::default()
    })
    .unwrap();

    let report = FetchEngine::new(PolicyConfig::new(dir.path()), client, 10, 5)
        .unwrap()
        .run(&[format!("{}/slow", server.uri())])
        .await
        .unwrap();

    assert!(matches!(
        report.results[0].status,
        FetchStatus::Failed(FetchFailure::Download(DownloadError::Timeout { .. }))
    ));
    assert!(!dir.path().join(host_dir(&server)).join("slow").exists());
}

#[tokio::test]
async fn test_mixed_batch_counts_every_outcome_in_order() {
    let server = MockServer::start().await;
    mount_body(&server, "/ok.txt", "ok", "text/plain").await;
    Mock::given(method("GET"))
        .and(path("/gone.txt"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;
    let dir = TempDir::new().unwrap();
    let urls = vec![
        format!("{}/ok.txt", server.uri()),
        "not a url".to_string(),
        format!("{}/gone.txt", server.uri()),
    ];

    let report = run(PolicyConfig::new(dir.path()), &urls).await;

    let in_order: Vec<&str> = report.results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(in_order, urls.iter().map(String::as_str).collect::<Vec<_>>());
    assert!(report.results[0].is_success());
    assert!(report.results[1].is_failed());
    assert!(report.results[2].is_failed());
    assert_eq!(report.summary.succeeded, 1);
    assert_eq!(report.summary.failed, 2);
    assert_eq!(report.map.len(), 1);
}

#[tokio::test]
async fn test_parent_path_that_is_a_file_fails_only_that_url() {
    let server = MockServer::start().await;
    mount_body(&server, "/docs/a.txt", "a", "text/plain").await;
    mount_body(&server, "/b.txt", "b", "text/plain").await;
    let dir = TempDir::new().unwrap();
    let host = dir.path().join(host_dir(&server));
    std::fs::create_dir_all(&host).unwrap();
    std::fs::write(host.join("docs"), "a file, not a directory").unwrap();

    let report = run(
        PolicyConfig::new(dir.path()),
        &[
            format!("{}/docs/a.txt", server.uri()),
            format!("{}/b.txt", server.uri()),
        ],
    )
    .await;

    assert!(matches!(
        report.results[0].status,
        FetchStatus::Failed(FetchFailure::ParentNotDirectory { .. })
    ));
    assert_eq!(success_path(&report, 1), host.join("b.txt"));
}

// ==================== Execution Mode Tests ====================

#[tokio::test]
async fn test_sequential_and_concurrent_modes_agree() {
    let server = MockServer::start().await;
    for i in 0..6 {
        Mock::given(method("GET"))
            .and(path(format!("/n/{i}.txt")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(format!("body {i}"))
                    .set_delay(Duration::from_millis(20 * (6 - i))),
            )
            .mount(&server)
            .await;
    }
    let urls: Vec<String> = (0..6)
        .map(|i| format!("{}/n/{i}.txt", server.uri()))
        .collect();

    let seq_dir = TempDir::new().unwrap();
    let sequential = FetchEngine::new(PolicyConfig::new(seq_dir.path()), HttpClient::new(), 10, 5)
        .unwrap()
        .with_mode(ExecutionMode::Sequential)
        .run(&urls)
        .await
        .unwrap();

    let con_dir = TempDir::new().unwrap();
    let concurrent = FetchEngine::new(PolicyConfig::new(con_dir.path()), HttpClient::new(), 4, 2)
        .unwrap()
        .run(&urls)
        .await
        .unwrap();

    assert_eq!(sequential.summary.succeeded, 6);
    assert_eq!(concurrent.summary.succeeded, 6);
    for i in 0..6 {
        let name = format!("{i}.txt");
        let seq = success_path(&sequential, i);
        let con = success_path(&concurrent, i);
        assert!(seq.ends_with(&name));
        assert!(con.ends_with(&name));
        assert_eq!(read(&con), format!("body {i}"));
    }
}

// ==================== Path Uniqueness Tests ====================

/// Every success and skip path in a run is distinct and present on disk.
fn assert_paths_unique_and_present(report: &RunReport) {
    let paths: Vec<&Path> = report.results.iter().filter_map(|r| r.path()).collect();
    for (i, a) in paths.iter().enumerate() {
        assert!(a.exists(), "reported path missing on disk: {}", a.display());
        for b in &paths[i + 1..] {
            assert_ne!(a, b, "two URLs share {}", a.display());
        }
    }
}

#[tokio::test]
async fn test_skip_existing_with_flatten_does_not_skip_files_from_same_run() {
    let server = MockServer::start().await;
    mount_body(&server, "/x/f.txt", "from x", "text/plain").await;
    mount_body(&server, "/y/f.txt", "from y", "text/plain").await;
    let dir = TempDir::new().unwrap();
    let policy = PolicyConfig::new(dir.path())
        .with_flatten(FlattenMode::All)
        .with_skip_existing(true);

    let report = FetchEngine::new(policy, HttpClient::new(), 10, 5)
        .unwrap()
        .with_mode(ExecutionMode::Sequential)
        .run(&[
            format!("{}/x/f.txt", server.uri()),
            format!("{}/y/f.txt", server.uri()),
        ])
        .await
        .unwrap();

    assert_eq!(success_path(&report, 0), dir.path().join("f.txt"));
    assert_eq!(success_path(&report, 1), dir.path().join("y-f.txt"));
    assert_eq!(read(&dir.path().join("y-f.txt")), "from y");
    assert_paths_unique_and_present(&report);
}

#[tokio::test]
async fn test_skip_existing_with_flatten_skips_preexisting_file_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/x/f.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("from x"))
        .expect(0)
        .mount(&server)
        .await;
    mount_body(&server, "/y/f.txt", "from y", "text/plain").await;
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("f.txt"), "cached").unwrap();
    let policy = PolicyConfig::new(dir.path())
        .with_flatten(FlattenMode::All)
        .with_skip_existing(true);

    let report = run(
        policy,
        &[
            format!("{}/x/f.txt", server.uri()),
            format!("{}/y/f.txt", server.uri()),
        ],
    )
    .await;

    assert!(report.results[0].is_skipped());
    assert_eq!(report.results[0].path(), Some(dir.path().join("f.txt").as_path()));
    assert_eq!(success_path(&report, 1), dir.path().join("y-f.txt"));
    assert_eq!(read(&dir.path().join("f.txt")), "cached");
    assert_paths_unique_and_present(&report);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_hierarchical_colliding_urls_get_one_writer() {
    let server = MockServer::start().await;
    mount_body(&server, "/list", "page", "text/plain").await;

    for _ in 0..20 {
        let dir = TempDir::new().unwrap();
        let urls = vec![
            format!("{}/list?page=1", server.uri()),
            format!("{}/list?page=2", server.uri()),
        ];

        let report = run(PolicyConfig::new(dir.path()), &urls).await;

        assert_eq!(
            success_path(&report, 0),
            dir.path().join(host_dir(&server)).join("list.txt")
        );
        assert!(matches!(
            report.results[1].status,
            FetchStatus::Failed(FetchFailure::PathAlreadyClaimed { .. })
        ));
        assert_eq!(report.summary.succeeded, 1);
        assert_eq!(report.summary.failed, 1);
        assert_paths_unique_and_present(&report);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_flatten_run_paths_are_unique_and_present() {
    let server = MockServer::start().await;
    for dir_name in ["a", "b", "c"] {
        mount_body(&server, &format!("/{dir_name}/index"), dir_name, "text/html").await;
    }
    mount_body(&server, "/index", "root", "text/html").await;
    let dir = TempDir::new().unwrap();
    let urls: Vec<String> = ["/a/index", "/b/index", "/c/index", "/index", "/index?again=1"]
        .iter()
        .map(|p| format!("{}{p}", server.uri()))
        .collect();

    let report = run(PolicyConfig::new(dir.path()).with_flatten(FlattenMode::All), &urls).await;

    assert_eq!(report.summary.succeeded, 5);
    assert_paths_unique_and_present(&report);
}
