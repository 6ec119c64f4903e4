use gridwatch_core::{Cell, IdentifierSet};
use pretty_assertions::assert_eq;

fn ids(set: &IdentifierSet) -> Vec<&str> {
    set.iter().collect()
}

#[test]
fn counts_only_identifiers_not_seen_before() {
    let mut cell = Cell::with_url("https://sfbay.craigslist.org/search/sss?query=bike");

    assert_eq!(cell.record_results(["a", "b", "c"]), 3);
    assert_eq!(cell.hits(), Some(3));
    assert_eq!(ids(cell.seen()), vec!["a", "b", "c"]);

    assert_eq!(cell.record_results(["a", "b", "d"]), 1);
    assert_eq!(cell.hits(), Some(1));
    assert_eq!(ids(cell.seen()), vec!["a", "b", "c", "d"]);
}

#[test]
fn unchanged_results_report_zero_on_second_pass() {
    let mut cell = Cell::with_url("https://x.example/search");
    cell.record_results(["a", "b"]);

    assert_eq!(cell.record_results(["a", "b"]), 0);
    assert_eq!(cell.hits(), Some(0));
}

#[test]
fn seen_set_never_shrinks() {
    let mut cell = Cell::with_url("https://x.example/search");
    let batches: [&[&str]; 5] = [&["a", "b"], &[], &["b"], &["c", "d", "e"], &["a"]];

    let mut last = 0;
    for batch in batches {
        cell.record_results(batch.iter());
        assert!(cell.seen().len() >= last);
        last = cell.seen().len();
    }
    assert_eq!(last, 5);
}

#[test]
fn empty_fetch_is_a_real_zero() {
    let mut cell = Cell::with_url("https://x.example/search");
    assert_eq!(cell.record_results(Vec::<String>::new()), 0);
    assert_eq!(cell.hits(), Some(0));
}
