use crate::*;
use crate::config::DEFAULT_QUEUE_CAPACITY;
use crate::output::write_pairs;
use crate::pipeline::{build_index, create_signatures, sketch_set, stream_pairs};
use std::sync::Arc;
use crate::setfile::{parse_line, parse_token, SetReader};
use mh_core::KeyWidth;
use std::io::{Cursor, Write};
use tempfile::NamedTempFile;

fn set_file<S: AsRef<str>>(lines: &[S]) -> NamedTempFile {
    let mut f = NamedTempFile::new().unwrap();
    for line in lines {
        writeln!(f, "{}", line.as_ref()).unwrap();
    }
    f.flush().unwrap();
    f
}

fn small_config() -> AllPairConfig {
    let mut cfg = AllPairConfig::default().with_num_hash(64);
    cfg.lsh.threshold = 0.5;
    cfg.pipeline.workers = 3;
    cfg.pipeline.queue_capacity = 2;
    cfg
}

fn tokens(prefix: &str, n: usize) -> String {
    (0..n).map(|i| format!("{prefix}{i}____1")).collect::<Vec<_>>().join(" ")
}

// ========== Set file parsing ==========

#[test]
fn test_parse_token() {
    let vc = parse_token("apple____3").unwrap();
    assert_eq!(vc.value, "apple");
    assert_eq!(vc.count, 3);
}

#[test]
fn test_parse_token_keeps_inner_separator() {
    let vc = parse_token("a____b____12").unwrap();
    assert_eq!(vc.value, "a____b");
    assert_eq!(vc.count, 12);
}

#[test]
fn test_parse_token_rejects() {
    assert!(parse_token("apple").is_none());
    assert!(parse_token("apple____").is_none());
    assert!(parse_token("apple____x").is_none());
    assert!(parse_token("apple___3").is_none());
}

#[test]
fn test_parse_line_with_id() {
    let rec = parse_line("set7 x____1 y____2", 0, 0, true).unwrap().unwrap();
    assert_eq!(rec.id, "set7");
    assert_eq!(rec.values, vec!["x", "y"]);
}

#[test]
fn test_parse_line_without_id() {
    let rec = parse_line("x____1\ty____2", 4, 2, false).unwrap().unwrap();
    assert_eq!(rec.id, "4");
    assert_eq!(rec.seq, 2);
    assert_eq!(rec.values.len(), 2);
}

#[test]
fn test_parse_line_blank() {
    assert!(parse_line("   ", 0, 0, true).unwrap().is_none());
}

#[test]
fn test_parse_line_bad_token() {
    let err = parse_line("id ok____1 broken", 3, 0, true).unwrap_err();
    match err {
        SetFileError::BadToken { line, token } => {
            assert_eq!(line, 3);
            assert_eq!(token, "broken");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_reader_skips_blank_lines() {
    let data = "a x____1\n\nb y____1\n";
    let records: Vec<SetRecord> = SetReader::new(Cursor::new(data), true)
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].id, "b");
    assert_eq!(records[1].seq, 1);

    let no_id: Vec<SetRecord> = SetReader::new(Cursor::new("x____1\n\ny____1\n"), false)
        .collect::<Result<_, _>>()
        .unwrap();
    // Ids follow line numbers, blank lines included
    assert_eq!(no_id[1].id, "2");
}

// ========== Output ==========

#[test]
fn test_pair_display_orders_ids() {
    assert_eq!(Pair::new("b", "a").to_string(), "a, b");
    assert_eq!(Pair::new("a", "b").to_string(), "a, b");
    assert!(Pair::new("x", "x").is_self());
}

#[test]
fn test_write_pairs() {
    let mut buf = Vec::new();
    let n = write_pairs(&mut buf, &[Pair::new("2", "1"), Pair::new("3", "4")]).unwrap();
    assert_eq!(n, 2);
    assert_eq!(String::from_utf8(buf).unwrap(), "1, 2\n3, 4\n");
}

// ========== Config ==========

#[test]
fn test_default_config() {
    let cfg = AllPairConfig::default();
    assert_eq!(cfg.minhash.seed, 42);
    assert_eq!(cfg.minhash.num_hash, 128);
    assert!(cfg.pipeline.has_id);
    assert!(!cfg.pipeline.self_pairs);
    assert_eq!(cfg.pipeline.queue_capacity, DEFAULT_QUEUE_CAPACITY);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_config_size_mismatch() {
    let mut cfg = AllPairConfig::default();
    cfg.lsh.signature_size = 64;
    assert!(cfg.validate().is_err());
    assert!(cfg.with_num_hash(64).validate().is_ok());
}

#[test]
fn test_config_zero_workers() {
    let mut cfg = AllPairConfig::default();
    cfg.pipeline.workers = 0;
    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_load_json() {
    let mut f = NamedTempFile::new().unwrap();
    write!(
        f,
        r#"{{"minhash": {{"seed": 7, "num_hash": 32}}, "lsh": {{"signature_size": 32, "threshold": 0.6, "key_width": "narrow"}}, "pipeline": {{"self_pairs": true}}}}"#
    )
    .unwrap();
    let cfg = AllPairConfig::load(f.path()).unwrap();
    assert_eq!(cfg.minhash.seed, 7);
    assert_eq!(cfg.lsh.key_width, KeyWidth::Narrow);
    assert!(cfg.pipeline.self_pairs);
    assert!(cfg.pipeline.has_id);
    assert!(cfg.validate().is_ok());
}

// ========== Pipeline ==========

#[test]
fn test_sketch_set_matches_minhash() {
    let rec = SetRecord { seq: 3, id: "s".into(), values: vec!["a".into(), "b".into()] };
    let cfg = small_config();
    let sig = sketch_set(&rec, &cfg.minhash);
    let mut mh = mh_lsh::Minhash::new(cfg.minhash.seed, cfg.minhash.num_hash);
    mh.push(b"a");
    mh.push(b"b");
    assert_eq!(sig.signature, mh.signature());
    assert_eq!(sig.size, 2);
    assert_eq!(sig.seq, 3);
}

#[tokio::test]
async fn test_create_signatures_keeps_file_order() {
    let lines: Vec<String> = (0..50).map(|i| format!("id{i} {}", tokens(&format!("v{i}_"), 5))).collect();
    let f = set_file(&lines);
    let sigs = create_signatures(f.path(), &small_config()).await.unwrap();
    assert_eq!(sigs.len(), 50);
    for (i, s) in sigs.iter().enumerate() {
        assert_eq!(s.seq, i);
        assert_eq!(s.id, format!("id{i}"));
        assert_eq!(s.signature.len(), 64);
    }
}

#[tokio::test]
async fn test_create_signatures_reports_bad_line() {
    let f = set_file(&["a x____1", "b not-a-pair"]);
    let err = create_signatures(f.path(), &small_config()).await.unwrap_err();
    assert!(err.to_string().contains("incorrect value count pair"));
}

#[tokio::test]
async fn test_create_signatures_missing_file() {
    let err = create_signatures(std::path::Path::new("/nonexistent/sets.txt"), &small_config()).await;
    assert!(err.is_err());
}

#[tokio::test]
async fn test_run_all_pairs() {
    let shared = tokens("w", 40);
    let f = set_file(&[
        format!("s1 {shared}"),
        format!("s2 {shared}"),
        format!("s3 {}", tokens("z", 40)),
    ]);
    let mut out = Vec::new();
    let summary = run(&small_config(), f.path(), &mut out).await.unwrap();
    assert_eq!(summary.sets, 3);
    assert_eq!(summary.pairs, 2);
    assert_eq!(String::from_utf8(out).unwrap(), "s1, s2\ns1, s2\n");
}

#[tokio::test]
async fn test_run_with_self_pairs() {
    let shared = tokens("w", 40);
    let f = set_file(&[
        format!("s1 {shared}"),
        format!("s2 {shared}"),
        format!("s3 {}", tokens("z", 40)),
    ]);
    let mut cfg = small_config();
    cfg.pipeline.self_pairs = true;
    let mut out = Vec::new();
    run(&cfg, f.path(), &mut out).await.unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "s1, s1\ns1, s2\ns1, s2\ns2, s2\ns3, s3\n"
    );
}

#[tokio::test]
async fn test_run_rejects_duplicate_ids() {
    let f = set_file(&["dup a____1", "dup b____1"]);
    let mut out = Vec::new();
    assert!(run(&small_config(), f.path(), &mut out).await.is_err());
}

#[tokio::test]
async fn test_run_rejects_invalid_threshold() {
    let f = set_file(&["a x____1"]);
    let mut cfg = small_config();
    cfg.lsh.threshold = 0.0;
    let mut out = Vec::new();
    assert!(run(&cfg, f.path(), &mut out).await.is_err());
    assert!(out.is_empty());
}

#[test]
fn test_build_index_from_sigs() {
    let cfg = small_config();
    let recs = [
        SetRecord { seq: 0, id: "a".into(), values: vec!["x".into(), "y".into()] },
        SetRecord { seq: 1, id: "b".into(), values: vec!["x".into(), "y".into()] },
    ];
    let sigs: Vec<SetSig> = recs.iter().map(|r| sketch_set(r, &cfg.minhash)).collect();
    let lsh = build_index(&sigs, &cfg.lsh).unwrap();
    assert!(lsh.is_indexed());
    assert_eq!(lsh.len(), 2);
    assert_eq!(lsh.query(&sigs[0].signature).unwrap(), vec!["a".to_string(), "b".to_string()]);
}

// ========== Pair streaming ==========

/// 60 sets in 20 groups of three identical sets.
fn grouped_sigs(cfg: &AllPairConfig) -> Vec<SetSig> {
    (0..60)
        .map(|seq| {
            let group = seq / 3;
            let values = (0..20).map(|v| format!("g{group}_{v}")).collect();
            sketch_set(&SetRecord { seq, id: format!("s{seq}"), values }, &cfg.minhash)
        })
        .collect()
}

fn expected_pairs(lsh: &mh_lsh::MinhashLsh<String>, sigs: &[SetSig]) -> String {
    let mut expected = String::new();
    for s in sigs {
        for candidate in lsh.query(&s.signature).unwrap() {
            if candidate != s.id {
                expected.push_str(&format!("{}\n", Pair::new(s.id.clone(), candidate)));
            }
        }
    }
    expected
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stream_pairs_bounded_in_flight() {
    let cfg = small_config();
    let sigs = grouped_sigs(&cfg);
    let lsh = build_index(&sigs, &cfg.lsh).unwrap();
    let expected = expected_pairs(&lsh, &sigs);
    let lsh = Arc::new(lsh);
    let sigs = Arc::new(sigs);

    for capacity in [1, 2, 5] {
        let mut out = Vec::new();
        let stats = stream_pairs(Arc::clone(&lsh), Arc::clone(&sigs), false, 8, capacity, &mut out)
            .await
            .unwrap();
        assert!(stats.max_in_flight >= 1);
        assert!(stats.max_in_flight <= capacity, "{} > {capacity}", stats.max_in_flight);
        // Two partners per set
        assert_eq!(stats.pairs, 120);
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }
}

#[tokio::test]
async fn test_stream_pairs_empty_input() {
    let cfg = small_config();
    let lsh = Arc::new(build_index(&[], &cfg.lsh).unwrap());
    let mut out = Vec::new();
    let stats = stream_pairs(lsh, Arc::new(Vec::new()), false, 4, 2, &mut out).await.unwrap();
    assert_eq!(stats.pairs, 0);
    assert_eq!(stats.max_in_flight, 0);
    assert!(out.is_empty());
}

struct FailingWriter;

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stream_pairs_write_error() {
    let cfg = small_config();
    let sigs = grouped_sigs(&cfg);
    let lsh = Arc::new(build_index(&sigs, &cfg.lsh).unwrap());
    let err = stream_pairs(lsh, Arc::new(sigs), false, 4, 2, &mut FailingWriter).await.unwrap_err();
    assert!(err.to_string().contains("writing pairs"));
}
