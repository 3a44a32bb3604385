//! Integration tests for the durable output sink

use corpusgen::error::StorageError;
use corpusgen::sink::OutputSink;
use std::fs;
use tempfile::TempDir;

fn lines(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn batches_append_as_newline_terminated_lines() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sentences.txt");
    let mut sink = OutputSink::create(&path).unwrap();

    sink.append_batch(&lines(&["a", "b"])).unwrap();
    sink.append_batch(&lines(&["c"])).unwrap();

    assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nc\n");
}

#[test]
fn each_batch_is_visible_before_the_next() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sentences.txt");
    let mut sink = OutputSink::create(&path).unwrap();

    sink.append_batch(&lines(&["first"])).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "first\n");

    sink.append_batch(&lines(&["second", "third"])).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\nthird\n");
    assert_eq!(sink.lines_written(), 3);
}

#[test]
fn new_run_discards_previous_output() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sentences.txt");
    {
        let mut sink = OutputSink::create(&path).unwrap();
        sink.append_batch(&lines(&["old run"])).unwrap();
    }

    let mut sink = OutputSink::create(&path).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
    sink.append_batch(&lines(&["new run"])).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "new run\n");
}

#[test]
fn unicode_lines_round_trip_as_utf8() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("he.txt");
    let mut sink = OutputSink::create(&path).unwrap();
    sink.append_batch(&lines(&["מה שלומך היום?", "הבוקר ירד גשם קל."]))
        .unwrap();
    let bytes = fs::read(&path).unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        "מה שלומך היום?\nהבוקר ירד גשם קל.\n"
    );
}

#[test]
fn directory_target_is_invalid() {
    let temp = TempDir::new().unwrap();
    let result = OutputSink::create(temp.path());
    assert!(matches!(result, Err(StorageError::InvalidPath(_))));
}
