#[cfg(test)]
mod integration_tests {
    use crate::{
        CliRunner, Config, MockRenderer, Record, Renderer, ResultLog, SnapshotError,
    };
    use async_trait::async_trait;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Renderer double that counts invocations and always succeeds.
    struct CountingRenderer {
        calls: AtomicUsize,
    }

    impl CountingRenderer {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Renderer for CountingRenderer {
        async fn render(&self, url: &str) -> Result<String, SnapshotError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("{}.jpg", url.replace(['/', ':'], "_")))
        }
    }

    fn test_config(dir: &Path) -> Config {
        Config {
            worker_count: 2,
            key_file: dir.join("image_key.csv"),
            thumbnails: false,
            ..Default::default()
        }
    }

    async fn write_url_file(dir: &Path, lines: &str) -> PathBuf {
        let path = dir.join("urls.txt");
        tokio::fs::write(&path, lines).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_process_renders_and_records_batch() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let renderer = Arc::new(CountingRenderer::new());
        let runner = CliRunner::with_collaborators(config.clone(), renderer.clone(), None);

        // Whitespace-padded and blank lines must be tolerated
        let input = write_url_file(
            dir.path(),
            "http://a.com\n\n  http://b.com  \n\nhttp://c.com\n",
        )
        .await;

        runner.run_process(&input).await.unwrap();

        assert_eq!(renderer.calls.load(Ordering::SeqCst), 3);
        let processed = ResultLog::new(config.key_file).load().await.unwrap();
        assert_eq!(processed.len(), 3);
        assert!(processed.contains("http://b.com"));
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let renderer = Arc::new(CountingRenderer::new());
        let runner = CliRunner::with_collaborators(config.clone(), renderer.clone(), None);

        let input = write_url_file(dir.path(), "http://a.com\nhttp://b.com\n").await;

        runner.run_process(&input).await.unwrap();
        let first_run = tokio::fs::read_to_string(&config.key_file).await.unwrap();

        runner.run_process(&input).await.unwrap();
        let second_run = tokio::fs::read_to_string(&config.key_file).await.unwrap();

        // The second run processed nothing and changed nothing
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
        assert_eq!(first_run, second_run);
    }

    #[tokio::test]
    async fn test_fully_processed_batch_never_touches_renderer() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        // Pre-populate the key file with both URLs
        let log = ResultLog::new(config.key_file.clone());
        let mut appender = log.open_appender().await.unwrap();
        for url in ["http://a.com", "http://b.com"] {
            appender
                .append(&Record::new(url.to_string(), "x.jpg".to_string(), None))
                .await
                .unwrap();
        }
        drop(appender);

        let mut mock = MockRenderer::new();
        mock.expect_render().times(0);

        let runner = CliRunner::with_collaborators(config, Arc::new(mock), None);
        let input = write_url_file(dir.path(), "http://a.com\nhttp://b.com\n").await;

        // Clean exit, zero renderer invocations
        runner.run_process(&input).await.unwrap();
    }

    #[tokio::test]
    async fn test_only_new_urls_are_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let log = ResultLog::new(config.key_file.clone());
        let mut appender = log.open_appender().await.unwrap();
        appender
            .append(&Record::new(
                "http://old.com".to_string(),
                "old.jpg".to_string(),
                None,
            ))
            .await
            .unwrap();
        drop(appender);

        let mut mock = MockRenderer::new();
        mock.expect_render()
            .with(mockall::predicate::eq("http://new.com"))
            .times(1)
            .returning(|_| Ok("new.jpg".to_string()));

        let runner = CliRunner::with_collaborators(config.clone(), Arc::new(mock), None);
        let input = write_url_file(dir.path(), "http://old.com\nhttp://new.com\n").await;

        runner.run_process(&input).await.unwrap();

        let processed = log.load().await.unwrap();
        assert_eq!(processed.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicates_within_batch_processed_independently() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let renderer = Arc::new(CountingRenderer::new());
        let runner = CliRunner::with_collaborators(config, renderer.clone(), None);

        // No intra-batch dedup: the same new URL appears twice and renders twice
        let input = write_url_file(dir.path(), "http://a.com\nhttp://a.com\n").await;
        runner.run_process(&input).await.unwrap();

        assert_eq!(renderer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_input_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let renderer = Arc::new(CountingRenderer::new());
        let runner = CliRunner::with_collaborators(config, renderer.clone(), None);

        let err = runner
            .run_process(Path::new("/nonexistent/urls.txt"))
            .await
            .unwrap_err();

        assert!(matches!(err, SnapshotError::InputError(_)));
        assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_search_on_empty_log_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let runner = CliRunner::with_collaborators(config, Arc::new(CountingRenderer::new()), None);

        runner.run_search("anything").await.unwrap();
    }

    #[tokio::test]
    async fn test_process_then_search_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let renderer = Arc::new(CountingRenderer::new());
        let runner = CliRunner::with_collaborators(config.clone(), renderer, None);

        let input = write_url_file(dir.path(), "http://a.com\nhttp://b.com/a\nhttp://c.com\n").await;
        runner.run_process(&input).await.unwrap();

        let matches = ResultLog::new(config.key_file).search("a").await.unwrap();
        let urls: Vec<&str> = matches.iter().map(|r| r.url.as_str()).collect();
        assert!(urls.contains(&"http://a.com"));
        assert!(urls.contains(&"http://b.com/a"));
        assert!(!urls.contains(&"http://c.com"));
    }
}
