// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use array_elements::{
    ArrayContext, ArrayLayout, ArrayObject, ArrayState, ArrayStrategy, ElementBuffer, ElementKind,
    HostArrayRecord, Options, Value,
};

fn cx() -> ArrayContext {
    ArrayContext::new(Options {
        check_invariants: true,
        ..Default::default()
    })
}

fn ints(values: impl IntoIterator<Item = i32>) -> Vec<Option<Value>> {
    values.into_iter().map(|v| Some(Value::Integer(v))).collect()
}

#[test]
fn first_write_then_gap_makes_holes() {
    let cx = cx();
    let mut array = ArrayObject::new();
    assert_eq!(array.strategy().layout(), ArrayLayout::ConstantEmpty);

    array.set_element(&cx, 0, Value::Integer(1), true).unwrap();
    assert_eq!(array.strategy().layout(), ArrayLayout::ZeroBased(ElementKind::Int));
    assert_eq!(array.length(), 1);

    array.set_element(&cx, 5, Value::Integer(2), true).unwrap();
    assert_eq!(array.strategy().layout(), ArrayLayout::Holes(ElementKind::Int));
    assert_eq!(array.state().hole_count(), 4);
    assert_eq!(array.length(), 6);
    for index in 1..5 {
        assert!(!array.has_element(index));
        assert_eq!(array.get_element(index), None);
    }
    assert_eq!(array.get_element(5), Some(Value::Integer(2)));
    assert!(array.has_holes());
}

#[test]
fn double_write_widens_whole_buffer() {
    let cx = cx();
    let mut array = ArrayObject::from_values(&ints([1, 2, 3])).unwrap();
    assert_eq!(array.strategy().layout(), ArrayLayout::ZeroBased(ElementKind::Int));

    array.set_element(&cx, 1, Value::Number(2.5), true).unwrap();
    assert_eq!(array.strategy().layout(), ArrayLayout::ZeroBased(ElementKind::Double));
    assert_eq!(
        array.to_vec(),
        vec![
            Some(Value::Number(1.0)),
            Some(Value::Number(2.5)),
            Some(Value::Number(3.0))
        ]
    );
    assert_eq!(array.length(), 3);
    assert_eq!(array.state().used_length(), 3);
}

#[test]
fn remove_range_closes_the_gap() {
    let cx = cx();
    let mut array = ArrayObject::from_values(&ints(0..10)).unwrap();
    assert_eq!(array.state().used_length(), 10);

    array.remove_range(&cx, 2, 5).unwrap();
    assert_eq!(array.state().used_length(), 7);
    assert_eq!(array.length(), 7);
    assert_eq!(array.to_vec(), ints([0, 1, 5, 6, 7, 8, 9]));
}

#[test]
fn huge_index_degrades_straight_to_sparse() {
    let cx = cx();
    let mut array = ArrayObject::new();
    array.set_element(&cx, 10_000_000, Value::Integer(7), true).unwrap();
    assert_eq!(array.strategy().layout(), ArrayLayout::Sparse);
    assert_eq!(array.length(), 10_000_001);
    assert!(!array.has_element(0));
    assert_eq!(array.get_element(10_000_000), Some(Value::Integer(7)));
    assert_eq!(array.own_index_keys(), vec![10_000_000]);
}

#[test]
fn preallocated_length_keeps_far_first_write_dense() {
    let cx = cx();
    let mut array = ArrayObject::with_length(100_000).unwrap();
    array.set_element(&cx, 50_000, Value::Integer(1), true).unwrap();
    assert!(array.strategy().layout().is_dense());
    assert_eq!(array.state().array_offset(), 50_000);
    assert_eq!(array.length(), 100_000);
    assert_eq!(array.get_element(50_000), Some(Value::Integer(1)));
    assert_eq!(array.own_index_keys(), vec![50_000]);

    array.set_element(&cx, 49_999, Value::Integer(2), true).unwrap();
    assert!(array.strategy().layout().is_dense());
    assert_eq!(array.state().used_length(), 2);
}

#[test]
fn backward_fill_of_preallocated_array_ends_zero_based() {
    let cx = ArrayContext::new(Options {
        check_invariants: false,
        ..Default::default()
    });
    let mut array = ArrayObject::with_length(10_000).unwrap();
    for index in (0..10_000u64).rev() {
        array
            .set_element(&cx, index, Value::Integer(index as i32), true)
            .unwrap();
        assert!(array.strategy().layout().is_dense());
    }
    assert_eq!(array.strategy().layout(), ArrayLayout::ZeroBased(ElementKind::Int));
    assert_eq!(array.state().used_length(), 10_000);
    assert_eq!(array.state().index_offset(), 0);
    assert_eq!(array.get_element(9_999), Some(Value::Integer(9_999)));
    array.check_invariants().unwrap();
}

#[test]
fn preallocated_length_past_flat_size_goes_sparse() {
    let cx = cx();
    let mut array = ArrayObject::with_length(2_000_000).unwrap();
    array.set_element(&cx, 1_500_000, Value::Integer(1), true).unwrap();
    assert_eq!(array.strategy().layout(), ArrayLayout::Sparse);
    assert_eq!(array.length(), 2_000_000);
}

#[test]
fn insert_before_contiguous_window_only_moves_offset() {
    let cx = cx();
    let buffer = ElementBuffer::from_elements(ElementKind::Int, &ints([1, 2, 3])).unwrap();
    let mut state = ArrayState::default();
    let strategy = ArrayStrategy::make_contiguous(&mut state, buffer, 8, 5, 0, 3).unwrap();
    assert_eq!(strategy.layout(), ArrayLayout::Contiguous(ElementKind::Int));
    assert_eq!(state.backing_store_writes(), 0);

    let strategy = strategy.insert_range(&cx, &mut state, 0, 3).unwrap();
    assert_eq!(state.backing_store_writes(), 0);
    assert_eq!(state.index_offset(), 8);
    assert_eq!(state.length(), 11);
    assert_eq!(strategy.first_element_index(&state), Some(8));
    assert_eq!(strategy.get_element(&state, 10), Some(Value::Integer(3)));
}

#[test]
fn dense_to_sparse_round_trip() {
    let cx = cx();
    let mut array = ArrayObject::new();
    let indices = [0u64, 1, 2, 7, 40, 41, 300];
    for &index in &indices {
        array
            .set_element(&cx, index, Value::Integer(index as i32 * 3), true)
            .unwrap();
    }
    array.set_element(&cx, 500, Value::from("x"), true).unwrap();
    assert_eq!(array.strategy().layout(), ArrayLayout::Holes(ElementKind::Object));
    let before: Vec<_> = (0..600)
        .map(|index| (array.has_element(index), array.get_element(index)))
        .collect();

    array.set_element(&cx, 20_000, Value::Null, true).unwrap();
    assert_eq!(array.strategy().layout(), ArrayLayout::Sparse);
    let after: Vec<_> = (0..600)
        .map(|index| (array.has_element(index), array.get_element(index)))
        .collect();
    assert_eq!(before, after);
}

#[test]
fn set_length_zero_resets_to_constant_empty() {
    let cx = cx();
    let mut array = ArrayObject::from_values(&ints([1, 2, 3])).unwrap();
    array.set_element(&cx, 1, Value::Number(0.5), true).unwrap();
    array.set_length(&cx, 0, true).unwrap();
    assert_eq!(array.strategy().layout(), ArrayLayout::ConstantEmpty);
    assert_eq!(array.length(), 0);
    array.set_element(&cx, 0, Value::Integer(1), true).unwrap();
    assert_eq!(array.strategy().layout(), ArrayLayout::ZeroBased(ElementKind::Int));
}

#[test]
fn shrinking_length_clears_slots() {
    let cx = cx();
    let handles: Vec<Option<Value>> = (0..6)
        .map(|i| Some(Value::Object(array_elements::ObjectHandle::from_u32(i))))
        .collect();
    let mut array = ArrayObject::from_values(&handles).unwrap();
    assert_eq!(array.strategy().layout(), ArrayLayout::ZeroBased(ElementKind::Reference));
    array.set_length(&cx, 2, true).unwrap();
    assert_eq!(array.state().used_length(), 2);
    assert_eq!(array.own_index_keys(), vec![0, 1]);
    array.set_length(&cx, 6, true).unwrap();
    assert!(!array.has_element(4));
    array.check_invariants().unwrap();
}

#[test]
fn constant_literal_is_copied_on_write() {
    let cx = cx();
    let literal =
        std::rc::Rc::new(ElementBuffer::from_elements(ElementKind::Int, &ints([4, 5, 6])).unwrap());
    let mut first = ArrayObject::from_constant(literal.clone()).unwrap();
    let second = ArrayObject::from_constant(literal.clone()).unwrap();
    assert_eq!(first.strategy().layout(), ArrayLayout::ConstantPacked(ElementKind::Int));

    first.set_element(&cx, 0, Value::Integer(40), true).unwrap();
    assert_eq!(first.strategy().layout(), ArrayLayout::ZeroBased(ElementKind::Int));
    assert_eq!(first.get_element(0), Some(Value::Integer(40)));
    assert_eq!(second.get_element(0), Some(Value::Integer(4)));
    assert_eq!(literal.get(0), Some(Value::Integer(4)));
}

#[test]
fn iteration_skips_holes() {
    let cx = cx();
    let mut array = ArrayObject::with_length(20).unwrap();
    for index in [3, 4, 9, 15] {
        array.set_element(&cx, index, Value::Boolean(true), true).unwrap();
    }
    assert_eq!(array.first_element_index(), Some(3));
    assert_eq!(array.last_element_index(), Some(15));
    assert_eq!(array.next_element_index(4), Some(9));
    assert_eq!(array.next_element_index(15), None);
    assert_eq!(array.previous_element_index(9), Some(4));
    assert_eq!(array.previous_element_index(3), None);
    assert_eq!(array.own_index_keys(), vec![3, 4, 9, 15]);
    assert_eq!(array.length(), 20);

    array.delete_element(&cx, 3, true).unwrap();
    assert_eq!(array.first_element_index(), Some(4));
    array.delete_element(&cx, 15, true).unwrap();
    assert_eq!(array.last_element_index(), Some(9));
    assert_eq!(array.length(), 20);
}

#[test]
fn in_bounds_fast_paths() {
    let cx = cx();
    let mut array = ArrayObject::from_values(&ints([1, 2, 3])).unwrap();
    assert_eq!(array.get_element_in_bounds(2), Ok(Value::Integer(3)));
    assert!(array.get_element_in_bounds(3).is_err());

    array.set_element_in_bounds_fast(&cx, 1, Value::Integer(20)).unwrap();
    assert_eq!(array.get_element(1), Some(Value::Integer(20)));
    assert!(array.set_element_in_bounds_fast(&cx, 3, Value::Integer(4)).is_err());
    assert!(array
        .set_element_in_bounds_fast(&cx, 0, Value::Number(0.5))
        .is_err());
    assert_eq!(array.strategy().layout(), ArrayLayout::ZeroBased(ElementKind::Int));
}

#[test]
fn cloned_backing_store_is_independent() {
    let cx = cx();
    let mut array = ArrayObject::from_values(&ints([1, 2, 3])).unwrap();
    let copy = array.strategy().clone_backing_store(array.state());
    array.set_element(&cx, 0, Value::Integer(10), true).unwrap();
    match copy {
        array_elements::BackingStore::Dense(buffer) => {
            assert_eq!(buffer.get(0), Some(Value::Integer(1)));
            assert_eq!(buffer.capacity(), 3);
        }
        other => panic!("expected a dense backing store, got {other:?}"),
    }
}
