use std::sync::Arc;

use rust_plot_pipeline::options::ChannelValue;
use rust_plot_pipeline::transforms::{
    basic, filter, initializer, reverse, shuffle, sort, InitializerFn, InitializerUpdate,
    MarkOptions, Sort, SortOrder, TransformFn,
};
use rust_plot_pipeline::types::{DataSet, DataType, Facet, Field, Schema, Value};

fn sample_dataset() -> DataSet {
    let schema = Schema::new(vec![
        Field::new("keep", DataType::Bool),
        Field::new("k", DataType::Int64),
    ]);
    DataSet::new(
        schema,
        vec![
            vec![Value::Bool(true), Value::Int64(2)],
            vec![Value::Bool(true), Value::Int64(1)],
            vec![Value::Bool(false), Value::Int64(0)],
            vec![Value::Bool(true), Value::Int64(3)],
        ],
    )
}

fn run(options: &MarkOptions, data: DataSet, facets: Vec<Facet>) -> Vec<Facet> {
    match &options.transform {
        Some(t) => t(data, facets).unwrap().1,
        None => facets,
    }
}

#[test]
fn shorthand_composes_filter_then_sort_then_reverse() {
    let options = MarkOptions {
        filter: Some(ChannelValue::from("keep")),
        sort: Some(Sort::by_value("k")),
        reverse: true,
        ..Default::default()
    };
    let compiled = basic(options, None).unwrap();
    let facets = run(&compiled, sample_dataset(), vec![vec![0, 1, 2, 3]]);
    // filter -> [0, 1, 3]; sort by k (2, 1, 3) -> [1, 0, 3]; reverse -> [3, 0, 1]
    assert_eq!(facets, vec![vec![3, 0, 1]]);
}

#[test]
fn chained_primitives_match_the_shorthand() {
    let shorthand = basic(
        MarkOptions {
            filter: Some(ChannelValue::from("keep")),
            sort: Some(Sort::by_value("k")),
            reverse: true,
            ..Default::default()
        },
        None,
    )
    .unwrap();

    let chained = filter("keep", MarkOptions::default()).unwrap();
    let chained = sort(Sort::by_value("k"), chained).unwrap();
    let chained = reverse(chained).unwrap();

    let a = run(&shorthand, sample_dataset(), vec![vec![0, 1, 2, 3]]);
    let b = run(&chained, sample_dataset(), vec![vec![0, 1, 2, 3]]);
    assert_eq!(a, b);
}

#[test]
fn transforms_are_facet_local() {
    let ds = sample_dataset();
    let input = vec![vec![0, 1], vec![2, 3]];

    for options in [
        filter("keep", MarkOptions::default()).unwrap(),
        sort(Sort::by_value("k"), MarkOptions::default()).unwrap(),
        reverse(MarkOptions::default()).unwrap(),
        shuffle(Some(7), MarkOptions::default()).unwrap(),
    ] {
        let facets = run(&options, ds.clone(), input.clone());
        assert_eq!(facets.len(), input.len());
        for (before, after) in input.iter().zip(&facets) {
            // Membership may shrink (filter) but never migrates across facets.
            assert!(after.iter().all(|i| before.contains(i)));
        }
    }
}

#[test]
fn filter_keeps_exactly_the_truthy_rows_in_order() {
    let options = filter("keep", MarkOptions::default()).unwrap();
    let facets = run(&options, sample_dataset(), vec![vec![3, 2, 1, 0]]);
    assert_eq!(facets, vec![vec![3, 1, 0]]);
}

#[test]
fn reverse_twice_restores_the_original_order() {
    let ds = sample_dataset();
    let once = reverse(MarkOptions::default()).unwrap();
    let twice = reverse(MarkOptions::default()).unwrap();
    let input = vec![vec![2, 0, 3], vec![1]];
    let facets = run(&once, ds.clone(), input.clone());
    let facets = run(&twice, ds, facets);
    assert_eq!(facets, input);
}

#[test]
fn sort_is_stable_for_equal_keys() {
    let schema = Schema::new(vec![
        Field::new("k", DataType::Int64),
        Field::new("v", DataType::Utf8),
    ]);
    let ds = DataSet::new(
        schema,
        vec![
            vec![Value::Int64(1), Value::Utf8("a".to_string())],
            vec![Value::Int64(1), Value::Utf8("b".to_string())],
        ],
    );
    let options = sort(Sort::by_value("k"), MarkOptions::default()).unwrap();
    let facets = run(&options, ds.clone(), ds.single_facet());
    assert_eq!(facets, vec![vec![0, 1]]);
}

#[test]
fn custom_comparator_orders_are_honored() {
    let options = sort(
        Sort::by_value_with(
            "k",
            SortOrder::Comparator(Arc::new(|a, b| {
                rust_plot_pipeline::order::compare_values(b, a)
            })),
        ),
        MarkOptions::default(),
    )
    .unwrap();
    let facets = run(&options, sample_dataset(), vec![vec![0, 1, 2, 3]]);
    assert_eq!(facets, vec![vec![3, 0, 1, 2]]);
}

#[test]
fn unseeded_shuffle_preserves_membership() {
    let options = shuffle(None, MarkOptions::default()).unwrap();
    let facets = run(&options, sample_dataset(), vec![vec![0, 1, 2, 3]]);
    let mut sorted = facets[0].clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![0, 1, 2, 3]);
}

#[test]
fn basic_guard_rejects_transform_after_initializer() {
    let init: InitializerFn = Arc::new(|_, _, _, _, _| Ok(InitializerUpdate::default()));
    let t: TransformFn = Arc::new(|data, facets| Ok((data, facets)));
    let options = MarkOptions {
        initializer: Some(init),
        ..Default::default()
    };
    let err = basic(options, Some(t)).unwrap_err();
    assert!(err
        .to_string()
        .contains("transforms cannot be applied after initializers"));
}

#[test]
fn initializer_guard_rejects_stage_after_explicit_transform() {
    let t: TransformFn = Arc::new(|data, facets| Ok((data, facets)));
    let init: InitializerFn = Arc::new(|_, _, _, _, _| Ok(InitializerUpdate::default()));
    let options = MarkOptions {
        transform: Some(t),
        ..Default::default()
    };
    let err = initializer(options, Some(init)).unwrap_err();
    assert!(err
        .to_string()
        .contains("transforms cannot be applied after initializers"));
}

#[test]
fn compiled_sorts_do_not_leak_through_as_options() {
    let options = MarkOptions {
        sort: Some(Sort::by_value("k")),
        ..Default::default()
    };
    let compiled = basic(options, None).unwrap();
    assert!(compiled.sort.is_none());
    assert!(compiled.transform.is_some());
}

#[test]
fn domain_sorts_survive_basic_composition_untouched() {
    let options = MarkOptions {
        sort: Some(Sort::Domain(Default::default())),
        ..Default::default()
    };
    let compiled = basic(options, None).unwrap();
    assert!(matches!(compiled.sort, Some(Sort::Domain(_))));
    assert!(compiled.transform.is_none());
}
