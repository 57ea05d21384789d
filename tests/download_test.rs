use std::path::Path;

use pget::cli::Options;
use pget::commands;
use pget::downloader::Downloader;

const BODY: &[u8] = b"The quick brown fox jumps over the lazy dog.";

async fn mock_head(server: &mut mockito::ServerGuard, path: &str, len: usize) -> mockito::Mock {
    server
        .mock("HEAD", path)
        .with_status(200)
        .with_header("accept-ranges", "bytes")
        .with_header("content-length", &len.to_string())
        .create_async()
        .await
}

async fn mock_range(
    server: &mut mockito::ServerGuard,
    path: &str,
    body: &[u8],
    start: u64,
    end: u64,
) -> mockito::Mock {
    server
        .mock("GET", path)
        .match_header("range", format!("bytes={}-{}", start, end - 1).as_str())
        .with_status(206)
        .with_body(&body[start as usize..end as usize])
        .create_async()
        .await
}

#[tokio::test]
async fn multi_segment_download_merges_in_order() {
    let mut server = mockito::Server::new_async().await;

    // 44 bytes over 4 workers: [0,11) [11,22) [22,33) [33,44)
    let head = mock_head(&mut server, "/fox.bin", BODY.len()).await;
    let mut gets = Vec::new();
    for (start, end) in [(0u64, 11u64), (11, 22), (22, 33), (33, 44)] {
        gets.push(mock_range(&mut server, "/fox.bin", BODY, start, end).await);
    }

    let tmp = tempfile::tempdir().unwrap();
    let downloader = Downloader::new(4, false);
    let url = format!("{}/fox.bin", server.url());

    let dest = downloader.download(&url, tmp.path(), true).await.unwrap();

    assert_eq!(dest, tmp.path().join("fox").join("fox.bin"));
    assert_eq!(tokio::fs::read(&dest).await.unwrap(), BODY);
    for index in 0..4 {
        let part = tmp.path().join("fox").join(format!("fox.bin-{index}"));
        assert!(!part.exists(), "partial {index} should be consumed");
    }

    head.assert_async().await;
    for get in &gets {
        get.assert_async().await;
    }
}

#[tokio::test]
async fn one_megabyte_across_four_workers() {
    let mut server = mockito::Server::new_async().await;
    let body: Vec<u8> = (0..1_000_000u32).map(|i| (i % 251) as u8).collect();

    let _head = mock_head(&mut server, "/big.dat", body.len()).await;
    let mut gets = Vec::new();
    for (start, end) in [
        (0u64, 250_000u64),
        (250_000, 500_000),
        (500_000, 750_000),
        (750_000, 1_000_000),
    ] {
        gets.push(mock_range(&mut server, "/big.dat", &body, start, end).await);
    }

    let tmp = tempfile::tempdir().unwrap();
    let downloader = Downloader::new(4, false);
    let url = format!("{}/big.dat", server.url());

    let dest = downloader.download(&url, tmp.path(), true).await.unwrap();

    let merged = tokio::fs::read(&dest).await.unwrap();
    assert_eq!(merged.len(), 1_000_000);
    assert_eq!(merged, body);
    for index in 0..4 {
        assert!(!tmp.path().join("big").join(format!("big.dat-{index}")).exists());
    }
    for get in &gets {
        get.assert_async().await;
    }
}

#[tokio::test]
async fn probe_without_range_support_falls_back_to_single_stream() {
    let mut server = mockito::Server::new_async().await;

    let head = server
        .mock("HEAD", "/fox.bin")
        .with_status(200)
        .with_header("content-length", &BODY.len().to_string())
        .create_async()
        .await;
    let get = server
        .mock("GET", "/fox.bin")
        .with_status(200)
        .with_body(BODY)
        .create_async()
        .await;

    let tmp = tempfile::tempdir().unwrap();
    // a high concurrency setting must not matter on this path
    let downloader = Downloader::new(16, false);
    let url = format!("{}/fox.bin", server.url());

    let dest = downloader.download(&url, tmp.path(), true).await.unwrap();

    assert_eq!(tokio::fs::read(&dest).await.unwrap(), BODY);
    // no partial files on the single-stream path
    let mut entries = std::fs::read_dir(tmp.path().join("fox"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect::<Vec<_>>();
    entries.sort();
    assert_eq!(entries, vec!["fox.bin"]);

    head.assert_async().await;
    get.assert_async().await;
}

#[tokio::test]
async fn resume_requests_only_the_missing_tail() {
    let mut server = mockito::Server::new_async().await;
    let body = b"0123456789ABCDEF"; // 16 bytes over 2 workers: [0,8) [8,16)

    let _head = mock_head(&mut server, "/data.bin", body.len()).await;
    // segment 0 already holds 5 bytes, so only 5..8 may be requested
    let tail0 = mock_range(&mut server, "/data.bin", body, 5, 8).await;
    let full1 = mock_range(&mut server, "/data.bin", body, 8, 16).await;

    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("data");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(dir.join("data.bin-0"), &body[..5]).await.unwrap();

    let downloader = Downloader::new(2, true);
    let url = format!("{}/data.bin", server.url());

    let dest = downloader.download(&url, tmp.path(), true).await.unwrap();

    // byte-identical to a fresh download of the same resource
    assert_eq!(tokio::fs::read(&dest).await.unwrap(), body);
    assert!(!dir.join("data.bin-0").exists());
    assert!(!dir.join("data.bin-1").exists());

    tail0.assert_async().await;
    full1.assert_async().await;
}

#[tokio::test]
async fn resume_skips_segments_that_are_already_complete() {
    let mut server = mockito::Server::new_async().await;
    let body = b"0123456789ABCDEF";

    let _head = mock_head(&mut server, "/data.bin", body.len()).await;
    // segment 0 is complete on disk; only segment 1 has a mock, so any
    // request for segment 0 would fail the download
    let full1 = mock_range(&mut server, "/data.bin", body, 8, 16).await;

    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("data");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(dir.join("data.bin-0"), &body[..8]).await.unwrap();

    let downloader = Downloader::new(2, true);
    let url = format!("{}/data.bin", server.url());

    let dest = downloader.download(&url, tmp.path(), true).await.unwrap();

    assert_eq!(tokio::fs::read(&dest).await.unwrap(), body);
    full1.assert_async().await;
}

#[tokio::test]
async fn fresh_run_discards_stale_partial_files() {
    let mut server = mockito::Server::new_async().await;
    let body = b"0123456789ABCDEF";

    let _head = mock_head(&mut server, "/data.bin", body.len()).await;
    let full0 = mock_range(&mut server, "/data.bin", body, 0, 8).await;
    let full1 = mock_range(&mut server, "/data.bin", body, 8, 16).await;

    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("data");
    tokio::fs::create_dir_all(&dir).await.unwrap();
    // stale garbage from some earlier run; resume=false must ignore it
    tokio::fs::write(dir.join("data.bin-0"), b"GARBAGE").await.unwrap();
    tokio::fs::write(dir.join("data.bin-9"), b"junk").await.unwrap();

    let downloader = Downloader::new(2, false);
    let url = format!("{}/data.bin", server.url());

    let dest = downloader.download(&url, tmp.path(), true).await.unwrap();

    assert_eq!(tokio::fs::read(&dest).await.unwrap(), body);
    assert!(!dir.join("data.bin-9").exists(), "directory should be recreated fresh");
    full0.assert_async().await;
    full1.assert_async().await;
}

fn options(output: &Path, concurrency: usize) -> Options {
    Options {
        output: output.to_path_buf(),
        concurrency,
        resume: false,
        silent: true,
        https_only: false,
    }
}

#[tokio::test]
async fn run_substitutes_paths_into_the_original_text() {
    let mut server = mockito::Server::new_async().await;
    let _head = server
        .mock("HEAD", "/report.pdf")
        .with_status(200)
        .with_header("content-length", &BODY.len().to_string())
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/report.pdf")
        .with_status(200)
        .with_body(BODY)
        .create_async()
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let url = format!("{}/report.pdf", server.url());
    let content = format!("the report lives at {} for now", url);

    let rewritten = commands::run_downloads(content, &options(tmp.path(), 4))
        .await
        .unwrap();

    let expected = tmp.path().join("report").join("report.pdf");
    assert_eq!(
        rewritten,
        format!("the report lives at {} for now", expected.display())
    );
    assert!(expected.exists());
}

#[tokio::test]
async fn one_failing_resource_fails_the_run_but_not_the_others() {
    let mut server = mockito::Server::new_async().await;
    let _head = server
        .mock("HEAD", "/good.bin")
        .with_status(200)
        .with_header("content-length", &BODY.len().to_string())
        .create_async()
        .await;
    let _get = server
        .mock("GET", "/good.bin")
        .with_status(200)
        .with_body(BODY)
        .create_async()
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let good = format!("{}/good.bin", server.url());
    // nothing listens on port 9; the probe fails hard
    let content = format!("{} http://127.0.0.1:9/bad.bin", good);

    let err = commands::run_downloads(content, &options(tmp.path(), 4))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("1 of 2 downloads failed"));
    // the healthy resource still finished
    assert!(tmp.path().join("good").join("good.bin").exists());
}

#[tokio::test]
async fn https_only_leaves_plain_http_untouched() {
    let tmp = tempfile::tempdir().unwrap();
    let mut opts = options(tmp.path(), 4);
    opts.https_only = true;

    let content = "get http://insecure.example/f.bin today".to_string();
    let rewritten = commands::run_downloads(content.clone(), &opts).await.unwrap();

    // nothing downloaded, nothing substituted
    assert_eq!(rewritten, content);
}
