//! Asset download against a local HTTP server
#![cfg(feature = "download")]

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use katex_tags::{
    default_config, sri_hash, AssetDownloader, DownloadOptions, DownloadOutcome, Error,
    KatexRenderer,
};
use serde_json::json;
use tiny_http::{Response, Server};

const CSS: &[u8] = b".katex { font: normal 1.21em KaTeX_Main; }";
const JS: &[u8] = b"var katex = {};";
const AUTO_RENDER: &[u8] = b"function renderMathInElement() {}";
const FONT: &[u8] = b"wOF2";

/// Serve `files` (path -> body) on an ephemeral port; returns the CDN base
fn serve(files: HashMap<String, Vec<u8>>) -> String {
    let server = Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr();
    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let response = match files.get(request.url()) {
                Some(body) => Response::from_data(body.clone()),
                None => Response::from_data(b"Not Found".to_vec()).with_status_code(404),
            };
            let _ = request.respond(response);
        }
    });
    format!("http://{}/katex", addr)
}

fn dist(version: &str, with_auto_render: bool) -> HashMap<String, Vec<u8>> {
    let mut files = HashMap::new();
    let prefix = format!("/katex@{version}/dist");
    files.insert(format!("{prefix}/katex.min.css"), CSS.to_vec());
    files.insert(format!("{prefix}/katex.min.js"), JS.to_vec());
    if with_auto_render {
        files.insert(format!("{prefix}/contrib/auto-render.min.js"), AUTO_RENDER.to_vec());
    }
    files.insert(format!("{prefix}/fonts/KaTeX_Main-Regular.woff2"), FONT.to_vec());
    files
}

fn renderer(cdn: &str, css_integrity: &str) -> KatexRenderer {
    let mut cfg = default_config();
    cfg["cdn"] = json!(cdn);
    cfg["css_integrity"] = json!(css_integrity);
    cfg["js_integrity"] = json!("");
    cfg["auto_render_integrity"] = json!("");
    KatexRenderer::new(cfg).unwrap()
}

fn public_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("katex-tags-dl-{}-{}", name, std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    dir
}

fn options(force: bool) -> DownloadOptions {
    DownloadOptions {
        force,
        timeout_ms: 5000,
        ..Default::default()
    }
}

#[test]
fn downloads_required_files_and_tolerates_missing_fonts() {
    let cdn = serve(dist("0.16.28", true));
    let public = public_dir("full");
    let dl = AssetDownloader::new(&renderer(&cdn, ""), &public, options(false)).unwrap();

    let outcome = dl.run(|_| panic!("target did not exist yet")).unwrap();
    let DownloadOutcome::Completed(report) = outcome else {
        panic!("download was cancelled");
    };

    let root = public.join("vendor/katex");
    assert_eq!(fs::read(root.join("katex.min.css")).unwrap(), CSS);
    assert_eq!(fs::read(root.join("katex.min.js")).unwrap(), JS);
    assert_eq!(fs::read(root.join("contrib/auto-render.min.js")).unwrap(), AUTO_RENDER);
    assert_eq!(fs::read(root.join("fonts/KaTeX_Main-Regular.woff2")).unwrap(), FONT);

    assert_eq!(report.assets.len(), 3);
    assert_eq!(report.assets[0].integrity, sri_hash(CSS));
    assert_eq!(report.fonts_downloaded, 1);
    assert_eq!(report.font_failures.len(), 59);

    fs::remove_dir_all(&public).ok();
}

#[test]
fn missing_required_file_is_fatal() {
    let cdn = serve(dist("0.16.28", false));
    let public = public_dir("missing");
    let dl = AssetDownloader::new(&renderer(&cdn, ""), &public, options(false)).unwrap();

    match dl.run(|_| true) {
        Err(Error::Download { url, .. }) => assert!(url.ends_with("contrib/auto-render.min.js")),
        other => panic!("expected download error, got {other:?}"),
    }
    fs::remove_dir_all(&public).ok();
}

#[test]
fn integrity_mismatch_rejects_file() {
    let cdn = serve(dist("0.16.28", true));
    let public = public_dir("mismatch");
    let dl = AssetDownloader::new(&renderer(&cdn, "sha384-wrong"), &public, options(false)).unwrap();

    match dl.run(|_| true) {
        Err(Error::IntegrityMismatch { file, actual, .. }) => {
            assert_eq!(file, "katex.min.css");
            assert_eq!(actual, sri_hash(CSS));
        }
        other => panic!("expected integrity mismatch, got {other:?}"),
    }
    assert!(!public.join("vendor/katex/katex.min.css").exists());
    fs::remove_dir_all(&public).ok();
}

#[test]
fn matching_integrity_and_no_verify_both_pass() {
    let cdn = serve(dist("0.16.28", true));

    let public = public_dir("match");
    let dl = AssetDownloader::new(&renderer(&cdn, &sri_hash(CSS)), &public, options(false)).unwrap();
    assert!(matches!(dl.run(|_| true).unwrap(), DownloadOutcome::Completed(_)));
    fs::remove_dir_all(&public).ok();

    let public = public_dir("noverify");
    let opts = DownloadOptions {
        verify_integrity: false,
        ..options(false)
    };
    let dl = AssetDownloader::new(&renderer(&cdn, "sha384-wrong"), &public, opts).unwrap();
    assert!(matches!(dl.run(|_| true).unwrap(), DownloadOutcome::Completed(_)));
    fs::remove_dir_all(&public).ok();
}

#[test]
fn declining_overwrite_cancels_without_touching_files() {
    let cdn = serve(dist("0.16.28", true));
    let public = public_dir("declined");
    let root = public.join("vendor/katex");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("katex.min.css"), b"old").unwrap();

    let dl = AssetDownloader::new(&renderer(&cdn, ""), &public, options(false)).unwrap();
    let mut asked = false;
    let outcome = dl
        .run(|target| {
            asked = true;
            assert_eq!(target, root.as_path());
            false
        })
        .unwrap();

    assert!(asked);
    assert!(matches!(outcome, DownloadOutcome::Cancelled));
    assert_eq!(fs::read(root.join("katex.min.css")).unwrap(), b"old");
    fs::remove_dir_all(&public).ok();
}

#[test]
fn force_overwrites_without_asking() {
    let cdn = serve(dist("0.16.28", true));
    let public = public_dir("force");
    let root = public.join("vendor/katex");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("katex.min.css"), b"old").unwrap();

    let dl = AssetDownloader::new(&renderer(&cdn, ""), &public, options(true)).unwrap();
    let outcome = dl.run(|_| panic!("force must not prompt")).unwrap();

    assert!(matches!(outcome, DownloadOutcome::Completed(_)));
    assert_eq!(fs::read(root.join("katex.min.css")).unwrap(), CSS);
    fs::remove_dir_all(&public).ok();
}
