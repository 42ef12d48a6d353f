use crate::{
    eld::Coset,
    params::Parameters,
    tests::test_suite::{
        generic_enumeration::{
            test_build_is_deterministic, test_counts_are_consistent, test_empty_slices_are_bounded, test_enumeration_is_complete,
            test_point_ceiling,
        },
        generic_summation::{test_all_characteristics, test_fixed_a_matches_all, test_jet},
    },
};

#[test]
fn enumeration_complete() {
    let params: Parameters = Parameters::default();
    for g in 1..=3 {
        test_enumeration_is_complete(&params, g, 6.0, Coset::Full, g as u8);
    }
}

#[test]
fn enumeration_complete_parity() {
    let params: Parameters = Parameters::default();
    for a in 0..8u64 {
        test_enumeration_is_complete(&params, 3, 12.0, Coset::Parity(a), 40 + a as u8);
    }
}

#[test]
fn counts() {
    let params: Parameters = Parameters::default();
    for g in 1..=4 {
        test_counts_are_consistent(&params, g, 5.0, Coset::Full, 10 + g as u8);
        test_counts_are_consistent(&params, g, 9.0, Coset::Parity(1), 20 + g as u8);
    }
}

#[test]
fn deterministic() {
    test_build_is_deterministic(&Parameters::default(), 3, 10.0, 7);
}

#[test]
fn point_ceiling() {
    test_point_ceiling(&Parameters::default(), 2, 6.0, 3);
}

#[test]
fn empty_slices_bounded() {
    test_empty_slices_are_bounded(&Parameters::default());
}

#[test]
fn all_characteristics() {
    let params: Parameters = Parameters::default();
    test_all_characteristics(&params, 1, 64, 1);
    test_all_characteristics(&params, 2, 64, 2);
}

#[test]
fn all_characteristics_genus_three() {
    test_all_characteristics(&Parameters::default(), 3, 53, 3);
}

#[test]
fn fixed_a() {
    test_fixed_a_matches_all(&Parameters::default(), 2, 128, 4);
}

#[test]
fn jet() {
    let params: Parameters = Parameters::default();
    test_jet(&params, 1, 3, 64, 5);
    test_jet(&params, 2, 2, 64, 6);
}
