use std::io::{self, Read};

use haproxy_stats::fields::{Field, FieldDictionary};
use haproxy_stats::ingestion::{decode_from_file, decode_from_reader, QuoteErrorKind, StatsOptions};
use haproxy_stats::types::{Record, Value};
use haproxy_stats::StatsError;

fn small_options() -> StatsOptions {
    let mut opts = StatsOptions::default();
    opts.set_field_dictionary(
        FieldDictionary::empty()
            .with_field("svname", Field::text("name"))
            .with_field("pxname", Field::text("proxy"))
            .with_field("qcur", Field::number("currentQueued")),
    );
    opts
}

#[test]
fn decode_fixture_with_default_dictionary() {
    let records = decode_from_file("tests/fixtures/haproxy_stat.csv", &StatsOptions::default()).unwrap();

    assert_eq!(records.len(), 4);
    let names: Vec<&str> = records.iter().map(|r| r.string("name")).collect();
    assert_eq!(names, vec!["FRONTEND", "web1", "web2", "BACKEND"]);

    let frontend = records.find("www", "FRONTEND").unwrap();
    assert_eq!(frontend.string("status"), "OPEN");
    assert_eq!(frontend.int("currentSessions"), 12);
    assert_eq!(frontend.int("httpResponse5xx"), 8);
    assert_eq!(frontend.int("bytesOut"), 8_388_608);
    // Empty numeric cells are omitted, not zero-filled.
    assert!(!frontend.contains_key("currentQueued"));

    let web2 = records.find("app", "web2").unwrap();
    assert_eq!(web2.string("status"), "DOWN");
    assert_eq!(web2.string("checkStatus"), "L4CON");
    assert_eq!(web2.string("lastCheck"), "Connection refused");
    assert!(!web2.contains_key("checkCode"));
    assert_eq!(web2.int("totalTime"), 150);
}

#[test]
fn every_key_comes_from_the_dictionary() {
    let opts = StatsOptions::default();
    let records = decode_from_file("tests/fixtures/haproxy_stat.csv", &opts).unwrap();

    let canonical: Vec<&str> = opts.fields().iter().map(|(_, f)| f.name()).collect();
    for r in &records {
        for key in r.keys() {
            assert!(canonical.contains(&key), "unexpected key {key}");
        }
    }
}

#[test]
fn unknown_columns_are_ignored() {
    let input = "# svname,pxname,mystery,qcur,extra\nweb1,frontend,42,5,x\n";
    let records = decode_from_reader(input.as_bytes(), &small_options()).unwrap();

    let r = &records.records[0];
    assert_eq!(r.len(), 3);
    assert!(!r.contains_key("mystery"));
    assert!(r.iter().all(|(_, v)| v != &Value::Utf8("42".to_string())));
}

#[test]
fn sentinel_column_never_appears() {
    let mut opts = small_options();
    opts.set_field_dictionary(opts.fields().clone().with_field("extra", Field::text("extra")));

    let input = "# svname,pxname,qcur,extra\nweb1,frontend,5,SENTINEL\nweb2,frontend,6,SENTINEL\n";
    let records = decode_from_reader(input.as_bytes(), &opts).unwrap();

    assert_eq!(records.len(), 2);
    for r in &records {
        assert!(!r.contains_key("extra"));
    }
}

#[test]
fn round_trip_single_row() {
    let input = "# svname,pxname,qcur,extra\nweb1,frontend,5,IGNORED\n";
    let records = decode_from_reader(input.as_bytes(), &small_options()).unwrap();

    assert_eq!(
        records.into_vec(),
        vec![Record::new()
            .with("name", "web1")
            .with("proxy", "frontend")
            .with("currentQueued", 5)]
    );
}

#[test]
fn transforms_chain_in_registration_order() {
    let mut opts = small_options();
    opts.register_transform(|mut r| {
        let q = r.int("currentQueued");
        r.insert("queuedTimesTen", q * 10);
        r
    });
    // Sees the first transform's output, not the decoded record.
    opts.register_transform(|mut r| {
        let q = r.int("queuedTimesTen");
        r.insert("queuedPlusOne", q + 1);
        r.remove("currentQueued");
        r
    });

    let input = "# svname,pxname,qcur,extra\nweb1,frontend,5,x\n";
    let records = decode_from_reader(input.as_bytes(), &opts).unwrap();

    let r = &records.records[0];
    assert_eq!(r.int("queuedTimesTen"), 50);
    assert_eq!(r.int("queuedPlusOne"), 51);
    assert!(!r.contains_key("currentQueued"));
}

#[test]
fn malformed_row_fails_whole_file() {
    let err = decode_from_file("tests/fixtures/malformed_stat.csv", &StatsOptions::default()).unwrap_err();
    assert!(matches!(err, StatsError::MalformedQuote(_)), "got {err:?}");
    assert_eq!(err.to_string(), "malformed csv: unterminated quoted field on line 3");
}

#[test]
fn bare_quote_fails_whole_stream() {
    let input = "# svname,pxname,qcur,extra\nwe\"b1,frontend,5,x\nweb2,frontend,6,x\n";
    let err = decode_from_reader(input.as_bytes(), &small_options()).unwrap_err();
    match err {
        StatsError::MalformedQuote(q) => {
            assert_eq!(q.kind, QuoteErrorKind::BareQuote);
            assert_eq!(q.line, 2);
        }
        other => panic!("expected malformed quote, got {other:?}"),
    }
}

#[test]
fn unterminated_quote_with_header_field_count_fails() {
    let input = "# svname,pxname,qcur,extra\nweb1,frontend,5,x\nweb2,frontend,6,\"x\n";
    let err = decode_from_reader(input.as_bytes(), &small_options()).unwrap_err();
    assert!(
        matches!(err, StatsError::MalformedQuote(q) if q.kind == QuoteErrorKind::Unterminated),
        "got {err:?}"
    );
    assert!(err.is_decode());
}

#[test]
fn extra_field_is_a_csv_error() {
    let input = "# svname,pxname,qcur,extra\nweb1,frontend,5,x,y\n";
    let err = decode_from_reader(input.as_bytes(), &small_options()).unwrap_err();
    assert!(matches!(err, StatsError::Csv(_)), "got {err:?}");
    assert!(err.to_string().starts_with("csv error"));
}

#[test]
fn missing_file_is_io_error() {
    let err = decode_from_file("tests/fixtures/does_not_exist.csv", &StatsOptions::default()).unwrap_err();
    assert!(matches!(err, StatsError::Io(_)), "got {err:?}");
}

#[test]
fn json_dictionary_replaces_default() {
    let mut opts = StatsOptions::default();
    opts.set_field_dictionary(FieldDictionary::from_json_path("tests/fixtures/dictionary.json").unwrap());

    let records = decode_from_file("tests/fixtures/haproxy_stat.csv", &opts).unwrap();
    let web1 = &records.records[1];

    assert_eq!(web1.string("backend"), "app");
    assert_eq!(web1.string("server"), "web1");
    assert_eq!(web1.int("sessions"), 5);
    assert_eq!(web1.string("state"), "UP");
    assert_eq!(web1.len(), 4);
    // Default names are gone entirely.
    assert!(!web1.contains_key("proxy"));
}

/// Yields its data, then fails like a socket whose deadline expired.
struct FailingReader {
    data: io::Cursor<Vec<u8>>,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.data.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::TimedOut, "deadline exceeded")),
            n => Ok(n),
        }
    }
}

#[test]
fn read_failure_mid_stream_discards_records() {
    let reader = FailingReader {
        data: io::Cursor::new(b"# svname,pxname,qcur,extra\nweb1,frontend,5,x\n".to_vec()),
    };
    let err = decode_from_reader(reader, &small_options()).unwrap_err();
    assert!(matches!(err, StatsError::Stream(_)), "got {err:?}");
    assert!(!err.is_decode());
}
