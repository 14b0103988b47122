//! Property tests for the command codec

use palletizer_core::{
    decode_axis_command, encode_axis_command, parse_single_command, split_commands, Axis, Step,
};
use proptest::prelude::*;

fn axis_strategy() -> impl Strategy<Value = Axis> {
    prop::sample::select(Axis::ALL.to_vec())
}

fn step_strategy() -> impl Strategy<Value = Step> {
    (any::<Option<i32>>(), any::<Option<u32>>())
        .prop_filter("step needs a field", |(p, d)| p.is_some() || d.is_some())
        .prop_map(|(position, delay_ms)| Step { position, delay_ms })
}

proptest! {
    #[test]
    fn last_position_is_the_target(axis in axis_strategy(), values in prop::collection::vec(any::<i32>(), 1..8)) {
        let text = format!(
            "{}({})",
            axis,
            values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
        );
        prop_assert_eq!(parse_single_command(&text), Some((axis, *values.last().unwrap())));
    }

    #[test]
    fn trailing_delays_are_ignored(axis in axis_strategy(), position in any::<i32>(), delays in prop::collection::vec(any::<u32>(), 1..4)) {
        let mut tokens = vec![position.to_string()];
        tokens.extend(delays.iter().map(|d| format!("d{d}")));
        let text = format!("{}({})", axis, tokens.join(","));
        prop_assert_eq!(parse_single_command(&text), Some((axis, position)));
    }

    #[test]
    fn encoded_rows_round_trip(axis in axis_strategy(), steps in prop::collection::vec(step_strategy(), 1..6)) {
        let encoded = encode_axis_command(axis, &steps).unwrap();
        let (decoded_axis, decoded) = decode_axis_command(&encoded).unwrap();
        prop_assert_eq!(decoded_axis, axis);
        prop_assert_eq!(encode_axis_command(axis, &decoded).unwrap(), encoded);
    }

    #[test]
    fn composite_split_keeps_every_axis(a in prop::collection::vec(any::<i32>(), 1..4), b in prop::collection::vec(any::<i32>(), 1..4)) {
        let join = |v: &Vec<i32>| v.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(",");
        let x = format!("x({})", join(&a));
        let y = format!("y({})", join(&b));
        let text = format!("{x},{y}");
        prop_assert_eq!(split_commands(&text), vec![x.as_str(), y.as_str()]);
    }
}

#[test]
fn unbalanced_parens_do_not_split() {
    assert_eq!(split_commands("x(1,2,y(3))"), vec!["x(1,2,y(3))"]);
    assert_eq!(split_commands("x(1,2"), vec!["x(1,2"]);
}
