use super::*;
use crate::enumerate::{enumerate, DEFAULT_MAX_REVISITS};
use crate::graph::{Passage, StoryGraph};
use crate::history::fixture::FixtureStore;
use crate::history::UnitDates;
use crate::report::identify;
use crate::sources::SourceUnit;
use chrono::TimeZone;

const START: &str = ":: Start\nYou wake in a field.\n[[A]]\n[[B]]\n";
const A: &str = ":: A\nYou walk north.\n[[End]]\n";
const B: &str = ":: B\nYou walk south.\n[[End]]\n";
const END: &str = ":: End\nThe end.\n";

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, 9, 0, 0)
        .single()
        .expect("valid date")
}

fn diamond_paths() -> Vec<EnumeratedPath> {
    let p = |name: &str, links: &[&str]| {
        Passage::new(name, name, links.iter().map(|l| l.to_string()).collect())
    };
    let graph = StoryGraph::new(
        "Start",
        vec![
            p("Start", &["A", "B"]),
            p("A", &["End"]),
            p("B", &["End"]),
            p("End", &[]),
        ],
    )
    .expect("graph");
    identify(&graph, enumerate(&graph, DEFAULT_MAX_REVISITS).expect("paths"))
}

fn one_unit_per_passage() -> SourceMap {
    let mut map = SourceMap::new();
    for name in ["Start", "A", "B", "End"] {
        let file = format!("{}.twee", name.to_lowercase());
        map.insert(name, SourceUnit::new(file.clone(), format!("/story/{file}")));
    }
    map
}

fn clean_store() -> FixtureStore {
    FixtureStore::new()
        .clean("start.twee", START)
        .clean("a.twee", A)
        .clean("b.twee", B)
        .clean("end.twee", END)
}

fn run(store: &FixtureStore, existing: &CacheMap, day: u32) -> Categorization {
    let mut detector = ChangeDetector::new(store);
    categorize(
        &diamond_paths(),
        &one_unit_per_passage(),
        existing,
        &mut detector,
        at(day),
    )
}

fn category_of(result: &Categorization, via: &str) -> Category {
    result
        .paths
        .iter()
        .find(|p| p.path.route.iter().any(|name| name == via))
        .map(|p| p.category)
        .expect("path through passage")
}

fn validate_all(records: &mut CacheMap) {
    for record in records.values_mut() {
        record.validated = true;
    }
}

#[test]
fn first_run_marks_every_path_new() {
    let result = run(&clean_store(), &CacheMap::new(), 1);
    assert_eq!(result.paths.len(), 2);
    assert_eq!(result.counts.new, 2);
    assert!(result.paths.iter().all(|p| !p.validated));
    assert!(result.paths.iter().all(|p| p.first_seen == at(1)));
    assert_eq!(result.records.len(), 2);
}

#[test]
fn unchanged_second_run_preserves_validation_and_first_seen() {
    let store = clean_store();
    let first = run(&store, &CacheMap::new(), 1);
    let mut cache = cache::merge(&CacheMap::new(), first.records);
    validate_all(&mut cache);

    let second = run(&store, &cache, 2);
    assert_eq!(second.counts.unchanged, 2);
    assert!(second.paths.iter().all(|p| p.validated));
    assert!(second.paths.iter().all(|p| p.first_seen == at(1)));
}

#[test]
fn link_only_edit_marks_path_modified_and_clears_validation() {
    let first = run(&clean_store(), &CacheMap::new(), 1);
    let mut cache = cache::merge(&CacheMap::new(), first.records);
    validate_all(&mut cache);

    let store = clean_store()
        .committed("a.twee", A)
        .current("a.twee", ":: A\nYou walk north.\n[[End]]\n[[Start]]\n");
    let result = run(&store, &cache, 2);
    assert_eq!(category_of(&result, "A"), Category::Modified);
    assert_eq!(category_of(&result, "B"), Category::Unchanged);

    let via_a = result
        .paths
        .iter()
        .find(|p| p.path.route.contains(&"A".to_string()))
        .expect("path via A");
    assert!(!via_a.validated);
    let via_b = result
        .paths
        .iter()
        .find(|p| p.path.route.contains(&"B".to_string()))
        .expect("path via B");
    assert!(via_b.validated);
}

#[test]
fn prose_edit_marks_path_new_even_when_previously_modified() {
    let first = run(&clean_store(), &CacheMap::new(), 1);
    let mut cache = cache::merge(&CacheMap::new(), first.records);
    for record in cache.values_mut() {
        record.category = Category::Modified;
    }

    let store = clean_store()
        .committed("end.twee", END)
        .current("end.twee", ":: End\nThe very end.\n");
    let result = run(&store, &cache, 2);
    assert_eq!(result.counts.new, 2);
    assert!(result.paths.iter().all(|p| p.first_seen == at(1)));
}

#[test]
fn untracked_unit_is_conservatively_new() {
    let first = run(&clean_store(), &CacheMap::new(), 1);
    let cache = cache::merge(&CacheMap::new(), first.records);

    let store = FixtureStore::new()
        .clean("start.twee", START)
        .clean("a.twee", A)
        .current("b.twee", B)
        .clean("end.twee", END);
    let result = run(&store, &cache, 2);
    assert_eq!(category_of(&result, "B"), Category::New);
    assert_eq!(category_of(&result, "A"), Category::Unchanged);
}

#[test]
fn unavailable_history_marks_every_path_new() {
    let first = run(&clean_store(), &CacheMap::new(), 1);
    let mut cache = cache::merge(&CacheMap::new(), first.records);
    validate_all(&mut cache);

    let store = FixtureStore::unavailable();
    let result = run(&store, &cache, 2);
    assert_eq!(result.counts.new, 2);
    assert!(result.paths.iter().all(|p| !p.validated));
    assert_eq!(store.committed_reads(), 0);
}

#[test]
fn unmapped_passage_is_conservatively_new() {
    let first = run(&clean_store(), &CacheMap::new(), 1);
    let cache = cache::merge(&CacheMap::new(), first.records);

    let mut sources = SourceMap::new();
    sources.insert("Start", SourceUnit::new("start.twee", "/story/start.twee"));
    sources.insert("A", SourceUnit::new("a.twee", "/story/a.twee"));
    sources.insert("End", SourceUnit::new("end.twee", "/story/end.twee"));
    let store = clean_store();
    let mut detector = ChangeDetector::new(&store);
    let result = categorize(&diamond_paths(), &sources, &cache, &mut detector, at(2));
    assert_eq!(category_of(&result, "A"), Category::Unchanged);
    assert_eq!(category_of(&result, "B"), Category::New);
}

#[test]
fn shared_units_are_classified_once_per_run() {
    let store = clean_store();
    run(&store, &CacheMap::new(), 1);
    // Start and End sit on both paths; A and B on one each.
    assert_eq!(store.committed_reads(), 4);
}

#[test]
fn route_hash_mismatch_is_new() {
    let first = run(&clean_store(), &CacheMap::new(), 1);
    let mut cache = cache::merge(&CacheMap::new(), first.records);
    for record in cache.values_mut() {
        record.route_hash = "0".repeat(64);
    }
    let result = run(&clean_store(), &cache, 2);
    assert_eq!(result.counts.new, 2);
}

#[test]
fn shared_path_id_keeps_the_first_record_and_marks_the_later_route_new() {
    let store = clean_store();
    let first = run(&store, &CacheMap::new(), 1);
    let mut cache = cache::merge(&CacheMap::new(), first.records);
    validate_all(&mut cache);

    let mut paths = diamond_paths();
    paths[1].path_id = paths[0].path_id.clone();
    let mut detector = ChangeDetector::new(&store);
    let result = categorize(&paths, &one_unit_per_passage(), &cache, &mut detector, at(2));

    assert_eq!(result.records.len(), 1);
    let kept = &result.records[&paths[0].path_id];
    assert_eq!(kept.route_hash, paths[0].route_hash);
    assert_eq!(kept.category, Category::Unchanged);
    assert!(kept.validated);

    assert_eq!(result.paths[0].category, Category::Unchanged);
    assert_eq!(result.paths[1].category, Category::New);
    assert!(!result.paths[1].validated);
    assert_eq!(result.counts.unchanged, 1);
    assert_eq!(result.counts.new, 1);
}

#[test]
fn path_dates_span_contributing_units() {
    let store = clean_store()
        .dated(
            "start.twee",
            UnitDates {
                created: at(1),
                committed: at(3),
            },
        )
        .dated(
            "a.twee",
            UnitDates {
                created: at(2),
                committed: at(5),
            },
        );
    let result = run(&store, &CacheMap::new(), 10);
    let via_a = result
        .paths
        .iter()
        .find(|p| p.path.route.contains(&"A".to_string()))
        .expect("path via A");
    assert_eq!(via_a.created_date, Some(at(2)));
    assert_eq!(via_a.commit_date, Some(at(5)));
    let via_b = result
        .paths
        .iter()
        .find(|p| p.path.route.contains(&"B".to_string()))
        .expect("path via B");
    assert_eq!(via_b.created_date, Some(at(1)));
    assert_eq!(via_b.commit_date, Some(at(3)));
}

#[test]
fn decide_category_follows_transition_table() {
    let record = PathRecord {
        path_id: "abcd1234".to_string(),
        route: "Start".to_string(),
        route_hash: "hash".to_string(),
        first_seen: at(1),
        created_date: None,
        commit_date: None,
        validated: true,
        category: Category::Unchanged,
        content_fingerprint: None,
    };
    let none = PathChanges::default();
    let links = PathChanges {
        any_changed: true,
        ..none
    };
    let prose = PathChanges {
        prose_changed: true,
        any_changed: true,
        ..none
    };
    let unknown = PathChanges {
        undetermined: true,
        ..none
    };
    assert_eq!(decide_category(None, "hash", true, none), Category::New);
    assert_eq!(decide_category(Some(&record), "hash", true, none), Category::Unchanged);
    assert_eq!(decide_category(Some(&record), "hash", true, links), Category::Modified);
    assert_eq!(decide_category(Some(&record), "hash", true, prose), Category::New);
    assert_eq!(decide_category(Some(&record), "hash", true, unknown), Category::New);
    assert_eq!(decide_category(Some(&record), "hash", false, none), Category::New);
}
