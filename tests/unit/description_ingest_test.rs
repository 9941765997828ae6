//! Description record ingestion tests.

use vidscribe::descriptions::{select_primary_author, DescriptionRecord, SegmentList};

fn parse(json: &str) -> Vec<DescriptionRecord> {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_invalid_records_are_dropped() {
    let records = parse(
        r#"[
            {"id": 1, "text_history": ["Valid one."], "timestamp_start": 0, "timestamp_end": 4},
            {"id": 2, "text_history": ["No end."], "timestamp_start": 5},
            {"id": 3, "text_history": ["Backwards."], "timestamp_start": 9, "timestamp_end": 6},
            {"id": 4, "text_history": [], "timestamp_start": 10, "timestamp_end": 12},
            {"id": 5, "text_history": ["Garbled."], "timestamp_start": "abc", "timestamp_end": 20},
            {"id": 6, "text_history": ["Negative."], "timestamp_start": -1, "timestamp_end": 2},
            {"id": 7, "text_history": ["Valid two."], "timestamp_start": "30", "timestamp_end": "33"}
        ]"#,
    );

    let list = SegmentList::from_records(records);
    let ids: Vec<u64> = list.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 7]);
    assert_eq!(list.last_end_seconds(), Some(33.0));
}

#[test]
fn test_records_sorted_by_start() {
    let records = parse(
        r#"[
            {"id": 3, "text_history": ["Third."], "timestamp_start": 20, "timestamp_end": 25},
            {"id": 1, "text_history": ["First."], "timestamp_start": 0, "timestamp_end": 5},
            {"id": 2, "text_history": ["Second."], "timestamp_start": 10, "timestamp_end": 15}
        ]"#,
    );

    let list = SegmentList::from_records(records);
    assert_eq!(list.find_containing(12.0), Some(1));
    assert_eq!(list.get(1).map(|s| s.text.as_str()), Some("Second."));
    assert_eq!(list.find_containing(7.0), None);
}

#[test]
fn test_text_history_joined() {
    let records = parse(
        r#"[{"id": 1, "text_history": ["A kitchen.", " A cat jumps up. "], "timestamp_start": 0, "timestamp_end": 5}]"#,
    );

    let list = SegmentList::from_records(records);
    assert_eq!(
        list.get(0).map(|s| s.text.as_str()),
        Some("A kitchen. A cat jumps up.")
    );
}

#[test]
fn test_primary_author_selection() {
    let records = parse(
        r#"[
            {"id": 1, "text_history": ["By alice."], "username_history": ["alice"], "timestamp_start": 0, "timestamp_end": 5},
            {"id": 2, "text_history": ["By bob."], "username_history": ["bob"], "timestamp_start": 0, "timestamp_end": 5},
            {"id": 3, "text_history": ["Alice again."], "username": "alice", "timestamp_start": 5, "timestamp_end": 9}
        ]"#,
    );

    let selected = select_primary_author(records);
    let ids: Vec<u64> = selected.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 3]);
}

#[test]
fn test_anonymous_records_kept() {
    let records = parse(
        r#"[
            {"id": 1, "text_history": ["One."], "timestamp_start": 0, "timestamp_end": 5},
            {"id": 2, "text_history": ["Two."], "timestamp_start": 5, "timestamp_end": 9}
        ]"#,
    );

    assert_eq!(select_primary_author(records).len(), 2);
}
