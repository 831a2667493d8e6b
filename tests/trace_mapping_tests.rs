// Integration tests for the run/request selectors of the percentile chart.
//
// Every request selector must reveal one contiguous block of traces
// (percentile bars followed by the mean line), and no two requests of the
// same run may share a trace.

use gstat::config::GstatConfig;
use gstat::discovery::load_results;
use gstat::figure::{assemble, AssembledFigure, FigureOptions};
use gstat::layout::{SelectionKey, SeriesSet, TraceLayout};
use gstat::store::AggregateStore;
use std::collections::HashSet;
use std::path::Path;

fn fixture_store() -> AggregateStore {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/results");
    load_results(&root, &GstatConfig::default()).unwrap()
}

fn build(store: &AggregateStore) -> (TraceLayout, AssembledFigure) {
    let layout = TraceLayout::plan(store, &SeriesSet::for_percentiles(store.percentiles()));
    let figure = assemble(store, &layout, &FigureOptions::default()).unwrap();
    (layout, figure)
}

/// Indices set to `true` in a button's visibility vector
fn visible_indices(visible: &[bool]) -> Vec<usize> {
    visible
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.then_some(i))
        .collect()
}

#[test]
fn test_request_buttons_show_six_contiguous_traces() {
    let store = fixture_store();
    let (layout, figure) = build(&store);
    let request_menu = &figure.figure.layout.updatemenus[1];

    assert_eq!(request_menu.buttons.len(), 6);
    for button in &request_menu.buttons {
        let visible = &button.args.0.visible;
        assert_eq!(visible.len(), layout.len());

        let indices = visible_indices(visible);
        assert_eq!(
            indices.len(),
            6,
            "button {} should show 5 bars + mean",
            button.label
        );
        let (min, max) = (indices[0], indices[indices.len() - 1]);
        assert_eq!(
            indices,
            (min..=max).collect::<Vec<_>>(),
            "gap in {}",
            button.label
        );
    }
}

#[test]
fn test_request_ranges_within_a_run_are_disjoint() {
    let store = fixture_store();
    let (layout, _) = build(&store);

    for run in layout.run_selections() {
        let SelectionKey::Run(run_key) = &run.key else {
            panic!("run selection with request key");
        };
        let mut seen = HashSet::new();
        for request in layout.requests_of(run_key) {
            for index in request.range.indices() {
                assert!(
                    seen.insert(index),
                    "trace {} claimed twice in {}",
                    index,
                    run_key
                );
                assert!(run.range.contains(index));
            }
        }
        assert_eq!(seen.len(), run.range.len());
    }
}

#[test]
fn test_hierarchy_disambiguated_requests_get_separate_blocks() {
    let store = fixture_store();
    let (layout, figure) = build(&store);

    let labels: Vec<&str> = figure
        .visibility
        .requests
        .iter()
        .map(|entry| entry.label.as_str())
        .collect();
    assert!(labels.iter().any(|l| l.ends_with("A|B|X")));
    assert!(labels.iter().any(|l| l.ends_with("C|D|E|X")));

    let ranges: Vec<_> = layout
        .request_selections()
        .iter()
        .filter(|s| matches!(&s.key, SelectionKey::Request(_, path) if path.name() == "X"))
        .map(|s| s.range)
        .collect();
    assert_eq!(ranges.len(), 2);
    assert!(!ranges[0].overlaps(&ranges[1]));
}

#[test]
fn test_run_button_shows_all_its_requests() {
    let store = fixture_store();
    let (_, figure) = build(&store);
    let run_menu = &figure.figure.layout.updatemenus[0];

    // basicsimulation-20240101120000 has three distinct requests
    let first = &run_menu.buttons[0];
    assert_eq!(
        visible_indices(&first.args.0.visible),
        (0..18).collect::<Vec<_>>()
    );
    assert_eq!(run_menu.buttons.len(), 3);
}

#[test]
fn test_traces_follow_store_order() {
    let store = fixture_store();
    let (layout, figure) = build(&store);
    assert_eq!(figure.figure.data.len(), layout.len());
    assert_eq!(layout.len(), 6 * 6);

    let first_block: Vec<String> = layout.traces()[..6]
        .iter()
        .map(|t| t.kind.label())
        .collect();
    assert_eq!(first_block, ["p50", "p75", "p95", "p99", "max", "mean"]);
    assert!(layout.traces()[..6]
        .iter()
        .all(|t| t.path.to_string() == "A|B|X"));
}
