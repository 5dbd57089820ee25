use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use haproxy_stats::ingestion::{fetch_over_network, NetworkMode, StatsOptions};
use haproxy_stats::StatsError;

const FIXTURE: &str = include_str!("fixtures/haproxy_stat.csv");

/// Accepts one connection, records the command line, then replies with `reply`.
fn serve_tcp_once(reply: &'static str) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut line = String::new();
        BufReader::new(stream.try_clone().unwrap()).read_line(&mut line).unwrap();
        tx.send(line).unwrap();
        stream.write_all(reply.as_bytes()).unwrap();
    });

    (addr, rx)
}

#[test]
fn tcp_fetch_sends_command_and_decodes_reply() {
    let (addr, rx) = serve_tcp_once(FIXTURE);

    let records = fetch_over_network(NetworkMode::Tcp, &addr, Duration::from_secs(5), &StatsOptions::default())
        .unwrap();

    assert_eq!(rx.recv().unwrap(), "show stat\n");
    assert_eq!(records.len(), 4);
    assert_eq!(records.find("app", "web1").unwrap().int("checkCode"), 200);
}

#[test]
fn tcp_fetch_propagates_decode_error() {
    let (addr, _rx) = serve_tcp_once("# pxname,svname,\napp,web1,\"x\n");

    let err = fetch_over_network(NetworkMode::Tcp, &addr, Duration::from_secs(5), &StatsOptions::default())
        .unwrap_err();
    assert!(matches!(err, StatsError::MalformedQuote(_)), "got {err:?}");
    assert!(err.is_decode());
}

#[test]
fn tcp_fetch_times_out_when_server_stalls() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (done_tx, done_rx) = mpsc::channel::<()>();

    thread::spawn(move || {
        // Hold the connection open without replying until the client gives up.
        let (_stream, _) = listener.accept().unwrap();
        let _ = done_rx.recv_timeout(Duration::from_secs(10));
    });

    let err = fetch_over_network(NetworkMode::Tcp, &addr, Duration::from_millis(200), &StatsOptions::default())
        .unwrap_err();
    let _ = done_tx.send(());
    assert!(matches!(err, StatsError::Stream(_)), "got {err:?}");
}

#[test]
fn tcp_connect_failure_is_connection_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().to_string()
    };

    let err = fetch_over_network(NetworkMode::Tcp, &addr, Duration::from_secs(1), &StatsOptions::default())
        .unwrap_err();
    match err {
        StatsError::Connection { address, .. } => assert_eq!(address, addr),
        other => panic!("expected connection error, got {other:?}"),
    }
}

#[cfg(unix)]
mod unix {
    use std::io::{BufRead, BufReader, Write};
    use std::os::unix::net::UnixListener;
    use std::path::PathBuf;
    use std::thread;
    use std::time::Duration;

    use haproxy_stats::ingestion::{fetch_over_network, NetworkMode, StatsOptions};
    use haproxy_stats::StatsError;

    use super::FIXTURE;

    fn socket_path(tag: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("haproxy-stats-{}-{tag}.sock", std::process::id()));
        let _ = std::fs::remove_file(&path);
        path
    }

    #[test]
    fn unix_fetch_decodes_reply() {
        let path = socket_path("ok");
        let listener = UnixListener::bind(&path).unwrap();

        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut line = String::new();
            BufReader::new(stream.try_clone().unwrap()).read_line(&mut line).unwrap();
            stream.write_all(FIXTURE.as_bytes()).unwrap();
            line
        });

        let records = fetch_over_network(
            NetworkMode::Unix,
            path.to_str().unwrap(),
            Duration::from_secs(5),
            &StatsOptions::default(),
        )
        .unwrap();

        assert_eq!(server.join().unwrap(), "show stat\n");
        assert_eq!(records.len(), 4);
        assert_eq!(records.records[3].string("name"), "BACKEND");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unix_missing_socket_is_connection_error() {
        let path = socket_path("missing");
        let err = fetch_over_network(
            NetworkMode::Unix,
            path.to_str().unwrap(),
            Duration::from_secs(1),
            &StatsOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StatsError::Connection { .. }), "got {err:?}");
    }
}
