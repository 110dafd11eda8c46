//! The blocking dashboard client against a live dump server on an ephemeral port.

use once_cell::sync::Lazy;
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

use backoffice_mock::api::router;
use backoffice_mock::dashboard::{export_tab, DataTable, DumpClient, TABS};
use backoffice_mock::{seed_database, SeedOptions};

struct Server {
    _dir: TempDir,
    base_url: String,
}

/// Start a server in its own thread and runtime; it lives for the whole test binary
fn start_server(db_path: PathBuf, public_dir: PathBuf) -> String {
    let (tx, rx) = mpsc::channel::<SocketAddr>();

    thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("Failed to build runtime");

        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("Failed to bind");
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, router(db_path, public_dir))
                .await
                .expect("Server failed");
        });
    });

    let addr = rx
        .recv_timeout(Duration::from_secs(30))
        .expect("Server did not start");
    format!("http://{}", addr)
}

static SEEDED: Lazy<Server> = Lazy::new(|| {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("backoffice.db");
    let public_dir = dir.path().join("public");
    fs::create_dir_all(&public_dir).unwrap();

    let options = SeedOptions {
        progress: false,
        ..SeedOptions::default()
    };
    seed_database(&db_path, &options).expect("Failed to seed database");

    let base_url = start_server(db_path, public_dir.clone());
    Server {
        _dir: dir,
        base_url,
    }
});

static UNSEEDED: Lazy<Server> = Lazy::new(|| {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let base_url = start_server(dir.path().join("absent.db"), dir.path().to_path_buf());
    Server {
        _dir: dir,
        base_url,
    }
});

fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .unwrap();
    reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect()
}

#[test]
fn test_fetch_dump() {
    let mut client = DumpClient::new(&SEEDED.base_url, Some("secret".into())).unwrap();
    assert!(client.is_stale());

    let dump = client.fetch().unwrap();
    assert_eq!(dump["meta"]["totals"]["associates"], 50);
    assert!(!client.is_stale());

    for tab in TABS {
        let table = DataTable::from_path(client.fetch().unwrap(), tab.key);
        assert!(!table.is_empty(), "tab {} is empty", tab.key);
    }
}

#[test]
fn test_trailing_slash_is_ignored() {
    let mut client = DumpClient::new(&format!("{}/", SEEDED.base_url), None).unwrap();
    assert!(client.fetch().is_ok());
}

#[test]
fn test_expired_cache_refetches() {
    let mut client = DumpClient::new(&SEEDED.base_url, None)
        .unwrap()
        .with_ttl(Duration::ZERO);
    client.fetch().unwrap();
    assert!(client.is_stale());
    assert!(client.fetch().is_ok());

    client.invalidate();
    assert!(client.is_stale());
}

#[test]
fn test_server_error_is_reported() {
    let mut client = DumpClient::new(&UNSEEDED.base_url, None).unwrap();
    let err = client.fetch().unwrap_err();
    assert!(format!("{:#}", err).contains("503"), "{:#}", err);

    // The failed attempt counts; nothing cached to fall back on
    assert!(!client.is_stale());
    assert!(client.fetch().is_err());
}

/// Plain HTTP server that answers the first request with a dump and every
/// later one with a 500; returns its base URL and a request counter
fn start_flaky_server() -> (String, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap_or(0) > 0 && line != "\r\n" {
                line.clear();
            }

            let (status, body) = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                ("200 OK", r#"{"meta":{"totals":{"associates":1}},"data":{}}"#)
            } else {
                ("500 Internal Server Error", r#"{"error":{}}"#)
            };
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    (base_url, hits)
}

#[test]
fn test_failed_refresh_keeps_dump_and_waits_for_ttl() {
    let (base_url, hits) = start_flaky_server();
    let ttl = Duration::from_millis(300);
    let mut client = DumpClient::new(&base_url, None).unwrap().with_ttl(ttl);

    assert_eq!(client.fetch().unwrap()["meta"]["totals"]["associates"], 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    thread::sleep(ttl + Duration::from_millis(50));
    assert!(client.is_stale());
    assert!(client.fetch().is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    // Event-loop ticks inside the window do not go back to the server
    for _ in 0..20 {
        if client.is_stale() {
            let _ = client.fetch();
        }
    }
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(client.fetch().unwrap()["meta"]["totals"]["associates"], 1);
    assert_eq!(hits.load(Ordering::SeqCst), 2);

    // A manual refresh still goes through
    client.invalidate();
    assert!(client.fetch().is_err());
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[test]
fn test_export_filtered_tab() {
    let out = TempDir::new().unwrap();
    let path = out.path().join("invoices.csv");
    let mut client = DumpClient::new(&SEEDED.base_url, None).unwrap();

    let rows = export_tab(&mut client, "invoices", "overdue", &path).unwrap();
    assert!(rows > 0);

    let csv = read_csv(&path);
    assert_eq!(csv.len(), rows + 1);
    assert_eq!(csv[0][0], "invoice_id");
    let status = csv[0].iter().position(|c| c == "status").unwrap();
    assert!(csv[1..].iter().all(|row| row[status] == "overdue"));
}

#[test]
fn test_export_report_tab() {
    let out = TempDir::new().unwrap();
    let path = out.path().join("reports_monthly_revenue.csv");
    let mut client = DumpClient::new(&SEEDED.base_url, None).unwrap();

    let rows = export_tab(&mut client, "reports.monthly_revenue", "", &path).unwrap();
    let csv = read_csv(&path);
    assert_eq!(csv[0], vec!["month", "revenue"]);
    assert_eq!(csv.len(), rows + 1);
}

#[test]
fn test_export_unknown_tab() {
    let out = TempDir::new().unwrap();
    let mut client = DumpClient::new(&SEEDED.base_url, None).unwrap();

    let err = export_tab(&mut client, "reports", "", &out.path().join("x.csv")).unwrap_err();
    assert!(err.to_string().contains("Unknown tab"));
    assert!(!out.path().join("x.csv").exists());
}
