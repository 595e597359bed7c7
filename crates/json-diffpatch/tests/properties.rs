mod common;

use common::{apply_json_patch, assert_round_trip};
use json_diffpatch::{
    deep_equals, diff, diff_with_options, patch, reverse, to_json_patch, unpatch, DiffOptions,
};
use proptest::prelude::*;
use serde_json::Value;

fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        (-3i64..4).prop_map(Value::from),
        "[ab ]{0,6}".prop_map(Value::String),
    ]
}

/// Small value domains so that arrays repeat items and exercise moves.
fn arb_json() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(3, 40, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..7).prop_map(Value::Array),
            prop::collection::btree_map("[a-d]{1,2}", inner, 0..5)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn arb_pair() -> impl Strategy<Value = (Value, Value)> {
    prop_oneof![
        (arb_json(), arb_json()),
        // Related values are far more interesting than unrelated ones.
        (arb_json(), arb_json()).prop_map(|(left, extra)| {
            let right = match &left {
                Value::Array(items) => {
                    let mut items = items.clone();
                    let shift = items.len().min(1);
                    items.rotate_left(shift);
                    items.push(extra);
                    Value::Array(items)
                }
                Value::Object(map) => {
                    let mut map = map.clone();
                    map.insert("zz".to_string(), extra);
                    Value::Object(map)
                }
                _ => extra,
            };
            (left, right)
        }),
    ]
}

fn arb_array_pair() -> impl Strategy<Value = (Value, Value)> {
    let item = prop_oneof![
        (0i64..5).prop_map(Value::from),
        (0i64..3).prop_map(|n| serde_json::json!({"id": n, "v": n % 2})),
    ];
    (
        prop::collection::vec(item.clone(), 0..10),
        prop::collection::vec(item, 0..10),
    )
        .prop_map(|(l, r)| (Value::Array(l), Value::Array(r)))
}

fn keyed_options() -> DiffOptions {
    DiffOptions::new().with_array_object_item_key_finder(|item, _| Ok(item.get("id").cloned()))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_patch_and_unpatch_round_trip((left, right) in arb_pair()) {
        match diff(&left, &right).unwrap() {
            Some(d) => {
                prop_assert_eq!(patch(&left, &d).unwrap(), right.clone());
                prop_assert_eq!(unpatch(&right, &d).unwrap(), left);
            }
            None => prop_assert_eq!(left, right),
        }
    }

    #[test]
    fn prop_diff_with_itself_is_none(value in arb_json()) {
        prop_assert!(diff(&value, &value).unwrap().is_none());
    }

    #[test]
    fn prop_no_delta_iff_equal((left, right) in arb_pair()) {
        let options = DiffOptions::default();
        prop_assert_eq!(
            diff(&left, &right).unwrap().is_none(),
            deep_equals(&left, &right, &options).unwrap()
        );
    }

    #[test]
    fn prop_reversed_delta_patches_back((left, right) in arb_pair()) {
        if let Some(d) = diff(&left, &right).unwrap() {
            let reversed = reverse(&d).unwrap();
            prop_assert_eq!(patch(&right, &reversed).unwrap(), left.clone());
            prop_assert_eq!(unpatch(&left, &reversed).unwrap(), right);
            prop_assert_eq!(reverse(&reversed).unwrap(), d);
        }
    }

    #[test]
    fn prop_json_patch_matches_patch((left, right) in arb_pair()) {
        if let Some(d) = diff(&left, &right).unwrap() {
            let ops = to_json_patch(&left, &d).unwrap();
            prop_assert_eq!(apply_json_patch(&left, &ops).unwrap(), right);
        }
    }

    #[test]
    fn prop_array_laws_under_every_policy((left, right) in arb_array_pair()) {
        assert_round_trip(&left, &right, &DiffOptions::default());
        assert_round_trip(&left, &right, &DiffOptions::new().suppress_detect_array_move(true));
        assert_round_trip(&left, &right, &keyed_options());
        assert_round_trip(&left, &right, &keyed_options().prefer_fuzzy_array_item_match(true));
        assert_round_trip(
            &left,
            &right,
            &DiffOptions::new().array_object_item_match_by_position(true),
        );
    }

    #[test]
    fn prop_text_deltas_round_trip(left in "[a-d \n]{0,40}", right in "[a-d \n]{0,40}") {
        let options = DiffOptions::new().text_diff_min_length(1);
        let (left, right) = (Value::String(left), Value::String(right));
        assert_round_trip(&left, &right, &options);
        if let Some(d) = diff_with_options(&left, &right, &options).unwrap() {
            let reversed = reverse(&d).unwrap();
            prop_assert_eq!(patch(&right, &reversed).unwrap(), left);
        }
    }

    #[test]
    fn prop_delta_wire_form_reparses((left, right) in arb_pair()) {
        if let Some(d) = diff(&left, &right).unwrap() {
            let text = serde_json::to_string(&d).unwrap();
            let parsed: json_diffpatch::Delta = serde_json::from_str(&text).unwrap();
            prop_assert_eq!(parsed, d);
        }
    }
}
