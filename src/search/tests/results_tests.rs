use super::*;

fn row(line: u32) -> LineRef {
    LineRef {
        line,
        matches: Arc::new(MatchInfo::default()),
    }
}

#[test]
fn test_results_preserve_insertion_order() {
    let results = Results::new();
    for line in [5, 1, 9] {
        results.push(row(line));
    }
    let lines: Vec<u32> = results.rows().iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![5, 1, 9]);
}

#[test]
fn test_reorder_is_stable_and_rows_survive() {
    let results = Results::new();
    for line in [5, 1, 9, 1] {
        results.push(row(line));
    }
    results.reorder(|a, b| a.line.cmp(&b.line));
    let lines: Vec<u32> = results.rows().iter().map(|r| r.line).collect();
    assert_eq!(lines, vec![1, 1, 5, 9]);
    assert_eq!(results.len(), 4);
}

#[test]
fn test_iterator_walks_forward() {
    let results = Arc::new(Results::new());
    results.push(row(3));
    results.push(row(7));
    let mut iter = SearchIterator::new(Arc::clone(&results));
    assert!(!iter.is_empty());
    assert_eq!(iter.next().map(|r| r.line), Some(3));
    assert_eq!(iter.next().map(|r| r.line), Some(7));
    assert_eq!(iter.next().map(|r| r.line), None);
    assert!(iter.finished());
}

#[test]
fn test_iterator_deduplicates_within_a_pass() {
    let results = Arc::new(Results::new());
    for line in [3, 3, 7, 3] {
        results.push(row(line));
    }
    let mut iter = SearchIterator::new(Arc::clone(&results));
    let mut seen = Vec::new();
    while let Some(r) = iter.next() {
        seen.push(r.line);
    }
    assert_eq!(seen, vec![3, 7]);
}

#[test]
fn test_rewind_resets_the_seen_set() {
    let results = Arc::new(Results::new());
    results.push(row(3));
    results.push(row(3));
    let mut iter = SearchIterator::new(Arc::clone(&results));
    assert_eq!(iter.next().map(|r| r.line), Some(3));
    assert_eq!(iter.next().map(|r| r.line), None);
    iter.rewind();
    assert_eq!(iter.next().map(|r| r.line), Some(3));
}

#[test]
fn test_iterator_sees_rows_appended_after_creation() {
    let results = Arc::new(Results::new());
    let mut iter = SearchIterator::new(Arc::clone(&results));
    assert!(iter.is_empty());
    assert_eq!(iter.next().map(|r| r.line), None);
    results.push(row(4));
    assert_eq!(iter.next().map(|r| r.line), Some(4));
    assert!(iter.finished());
}

#[test]
fn test_empty_results() {
    let results = Results::new();
    assert!(results.is_empty());
    assert_eq!(results.len(), 0);
    assert!(results.get(0).is_none());
}
