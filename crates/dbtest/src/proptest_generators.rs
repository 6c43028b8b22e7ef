//! Property-based test generators using proptest.
//!
//! Strategies here produce values, filters and rows shaped for the sample
//! `users` table in [`fixtures`](crate::fixtures).

use common::Criteria;
use proptest::prelude::*;
use types::Value;

/// Strategy for generating random `Value` instances.
///
/// Generates a mix of Int, Text, Bool, and Null values.
pub fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::Int),
        "[a-z]{1,20}".prop_map(Value::Text),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
    ]
}

/// Strategy for user names drawn from a small pool, so filters collide.
pub fn arb_user_name() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["Ann", "Ben", "Cleo", "Dev"]).prop_map(str::to_string)
}

/// Strategy for a batch of `users` rows with distinct ids.
///
/// # Example
///
/// ```
/// use proptest::prelude::*;
/// use dbtest::proptest_generators::arb_user_rows;
///
/// proptest! {
///     #[test]
///     fn ids_are_unique(rows in arb_user_rows(8)) {
///         let mut ids: Vec<_> = rows.iter().map(|r| r.get("id").cloned()).collect();
///         ids.dedup();
///         prop_assert_eq!(ids.len(), rows.len());
///     }
/// }
/// ```
pub fn arb_user_rows(max: usize) -> impl Strategy<Value = Vec<Criteria>> {
    prop::collection::btree_map(
        100i64..1_000,
        (arb_user_name(), prop::option::of(18i64..90)),
        0..=max,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .map(|(id, (name, age))| {
                Criteria::new()
                    .with("id", id)
                    .with("name", name)
                    .with("age", age)
            })
            .collect()
    })
}

/// Strategy for filters over the `users` table: any subset of name and age.
pub fn arb_user_criteria() -> impl Strategy<Value = Criteria> {
    (
        prop::option::of(arb_user_name()),
        prop::option::of(prop::option::of(18i64..90)),
    )
        .prop_map(|(name, age)| {
            let mut criteria = Criteria::new();
            if let Some(name) = name {
                criteria.insert("name", name);
            }
            if let Some(age) = age {
                criteria.insert("age", age);
            }
            criteria
        })
}
