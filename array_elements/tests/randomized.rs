// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Random operation sequences checked against a plain ordered map.

use std::{collections::BTreeMap, rc::Rc};

use array_elements::{
    ArrayContext, ArrayLayout, ArrayObject, ElementBuffer, ElementKind, ElementsError,
    ElementsResult, ExceptionType, HostArrayRecord, IntegrityLevel, LazyArraySource, ObjectHandle,
    Options, Value,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

#[derive(Debug)]
struct Model {
    elements: BTreeMap<u64, Value>,
    length: u64,
    level: IntegrityLevel,
    length_writable: bool,
}

impl Model {
    fn of(array: &ArrayObject) -> Self {
        Self {
            elements: array
                .own_index_keys()
                .into_iter()
                .filter_map(|index| Some((index, array.get_element(index)?)))
                .collect(),
            length: array.length(),
            level: array.integrity_level(),
            length_writable: array.state().length_writable(),
        }
    }

    fn accepts_write(&self, index: u64) -> bool {
        if self.level.is_frozen() || (index >= self.length && !self.length_writable) {
            return false;
        }
        self.level.is_extensible() || self.elements.contains_key(&index)
    }

    /// Length a sealed array actually ends up with when asked to shrink.
    fn clamped_length(&self, length: u64) -> u64 {
        if !self.level.is_sealed() || length >= self.length {
            return length;
        }
        match self.elements.keys().next_back() {
            Some(&last) if last >= length => last + 1,
            _ => length,
        }
    }

    fn set(&mut self, index: u64, value: Value) {
        self.elements.insert(index, value);
        self.length = self.length.max(index + 1);
    }

    fn set_length(&mut self, length: u64) {
        drop(self.elements.split_off(&length));
        self.length = length;
    }

    fn insert_range(&mut self, offset: u64, size: u64) {
        let tail = self.elements.split_off(&offset);
        self.elements
            .extend(tail.into_iter().map(|(index, value)| (index + size, value)));
        self.length += size;
    }

    fn remove_range(&mut self, start: u64, end: u64) {
        let mut tail = self.elements.split_off(&start);
        let rest = tail.split_off(&end);
        self.elements
            .extend(rest.into_iter().map(|(index, value)| (index - (end - start), value)));
        self.length -= end - start;
    }
}

fn random_value(rng: &mut StdRng, kinds: u32) -> Value {
    match rng.random_range(0..kinds) {
        0 | 1 => Value::Integer(rng.random_range(-1000..1000)),
        2 => Value::Number(rng.random_range(-1000..1000) as f64 + 0.25),
        3 => Value::Object(ObjectHandle::from_u32(rng.random_range(0..100))),
        4 => Value::from("element"),
        _ => Value::Null,
    }
}

fn random_index(rng: &mut StdRng, length: u64) -> u64 {
    match rng.random_range(0..100) {
        0 => length + rng.random_range(5001..7000),
        1..=5 => length + rng.random_range(0..50),
        _ => rng.random_range(0..=length),
    }
}

fn assert_matches(array: &ArrayObject, model: &Model, step: usize) {
    array
        .check_invariants()
        .unwrap_or_else(|error| panic!("step {step}: {error}"));
    assert_eq!(array.length(), model.length, "step {step}: length");
    let keys: Vec<u64> = model.elements.keys().copied().collect();
    assert_eq!(array.own_index_keys(), keys, "step {step}: keys");
    for (&index, expected) in &model.elements {
        let actual = array
            .get_element(index)
            .unwrap_or_else(|| panic!("step {step}: missing element {index}"));
        assert!(
            actual.same_value_zero(expected),
            "step {step}: element {index} is {actual:?}, expected {expected:?}"
        );
    }
    assert_eq!(array.first_element_index(), keys.first().copied());
    assert_eq!(array.last_element_index(), keys.last().copied());
}

/// A rejected write either throws a `TypeError` or is silently ignored.
fn assert_rejected<T: core::fmt::Debug>(outcome: ElementsResult<T>, strict: bool, step: usize) {
    match outcome {
        Err(error) => {
            assert!(strict, "step {step}: sloppy mode rejection threw {error}");
            assert_eq!(error.exception_type(), ExceptionType::TypeError, "step {step}");
        }
        Ok(value) => assert!(!strict, "step {step}: strict rejection returned {value:?}"),
    }
}

fn assert_range_edit_refused(outcome: ElementsResult<()>, step: usize) {
    assert!(
        matches!(outcome, Err(ElementsError::RangeEditNotAllowed(_))),
        "step {step}: range edit on a locked array returned {outcome:?}"
    );
}

fn run(seed: u64, mut array: ArrayObject, steps: usize, kinds: u32, lock: bool) -> ArrayObject {
    let cx = ArrayContext::new(Options {
        check_invariants: true,
        ..Default::default()
    });
    let mut rng = StdRng::seed_from_u64(seed);
    let mut model = Model::of(&array);

    for step in 0..steps {
        let length = model.length;
        let strict = rng.random_bool(0.5);
        match rng.random_range(0..100) {
            0..=48 => {
                let index = random_index(&mut rng, length);
                let value = random_value(&mut rng, kinds);
                let outcome = array.set_element(&cx, index, value.clone(), strict);
                if model.accepts_write(index) {
                    outcome.unwrap();
                    model.set(index, value);
                } else {
                    assert_rejected(outcome, strict, step);
                }
            }
            49..=63 => {
                let index = random_index(&mut rng, length);
                let outcome = array.delete_element(&cx, index, strict);
                if model.level.is_sealed() && model.elements.contains_key(&index) {
                    match outcome {
                        Ok(deleted) => assert!(!strict && !deleted, "step {step}"),
                        rejected => assert_rejected(rejected, strict, step),
                    }
                } else {
                    assert_eq!(outcome, Ok(true), "step {step}");
                    model.elements.remove(&index);
                }
            }
            64..=70 => {
                let new_length = match rng.random_range(0..10) {
                    0 => 0,
                    1..=5 => rng.random_range(0..=length),
                    _ => length + rng.random_range(0..20),
                };
                let outcome = array.set_length(&cx, new_length, strict);
                if new_length == length {
                    outcome.unwrap();
                } else if !model.length_writable {
                    assert_rejected(outcome, strict, step);
                } else {
                    let target = model.clamped_length(new_length);
                    model.set_length(target);
                    if target == new_length {
                        outcome.unwrap();
                    } else {
                        assert_rejected(outcome, strict, step);
                    }
                }
            }
            71..=82 => {
                let offset = rng.random_range(0..=length);
                let size = if rng.random_range(0..40) == 0 {
                    rng.random_range(5001..6000)
                } else {
                    rng.random_range(0..20)
                };
                let outcome = array.insert_range(&cx, offset, size);
                if model.level.is_extensible() {
                    outcome.unwrap();
                    model.insert_range(offset, size);
                } else {
                    assert_range_edit_refused(outcome, step);
                }
            }
            83..=92 => {
                let start = rng.random_range(0..=length);
                let end = rng.random_range(start..=length.min(start + 30));
                let outcome = array.remove_range(&cx, start, end);
                if model.level.is_sealed() {
                    assert_range_edit_refused(outcome, step);
                } else {
                    outcome.unwrap();
                    model.remove_range(start, end);
                }
            }
            93..=97 => {
                let from = rng.random_range(0..=length.min(10));
                let outcome = array.shift_range(&cx, from);
                if model.level.is_sealed() {
                    assert_range_edit_refused(outcome, step);
                } else {
                    outcome.unwrap();
                    model.remove_range(0, from);
                }
            }
            _ if lock => {
                let level = match rng.random_range(0..3) {
                    0 => IntegrityLevel::NonExtensible,
                    1 => IntegrityLevel::Sealed,
                    _ => IntegrityLevel::Frozen,
                };
                match level {
                    IntegrityLevel::NonExtensible => array.prevent_extensions(),
                    IntegrityLevel::Sealed => array.seal(),
                    _ => array.freeze(),
                }
                model.level = model.level.max(level);
                if model.level.is_frozen() {
                    model.length_writable = false;
                }
                assert_eq!(array.integrity_level(), model.level, "step {step}");
                assert_eq!(
                    array.state().length_writable(),
                    model.length_writable,
                    "step {step}"
                );
            }
            _ => {}
        }
        assert_matches(&array, &model, step);
    }
    array
}

#[derive(Debug)]
struct Captures {
    groups: Vec<Value>,
}

impl LazyArraySource for Captures {
    fn len(&self) -> u32 {
        self.groups.len() as u32
    }

    fn materialize_group(&self, index: u32) -> Value {
        self.groups[index as usize].clone()
    }

    fn materialize_all(&self) -> Vec<Value> {
        self.groups.clone()
    }
}

#[test]
fn random_sequences_from_empty() {
    for seed in 0..24 {
        run(seed, ArrayObject::new(), 400, 6, false);
    }
}

#[test]
fn random_integer_sequences_stay_packed_integers() {
    for seed in 100..108 {
        let array = run(seed, ArrayObject::new(), 300, 2, false);
        if let Some(kind) = array.strategy().element_kind() {
            assert_eq!(kind, ElementKind::Int);
        }
    }
}

#[test]
fn random_sequences_from_literals() {
    for seed in 200..212 {
        let elements: Vec<Option<Value>> = (0..16).map(|i| Some(Value::Integer(i))).collect();
        let literal = Rc::new(ElementBuffer::from_elements(ElementKind::Int, &elements).unwrap());
        let array = ArrayObject::from_constant(literal).unwrap();
        run(seed, array, 300, 6, false);
    }
}

#[test]
fn random_sequences_from_preallocated() {
    for seed in 300..312 {
        let array = ArrayObject::with_length(64).unwrap();
        run(seed, array, 300, 6, false);
    }
}

#[test]
fn random_sequences_from_lazy() {
    for seed in 400..412 {
        let mut rng = StdRng::seed_from_u64(seed);
        let groups = (0..rng.random_range(0..12))
            .map(|_| random_value(&mut rng, 6))
            .collect();
        let array = ArrayObject::from_lazy(Rc::new(Captures { groups }));
        assert_eq!(array.strategy().layout(), ArrayLayout::Lazy);
        run(seed, array, 300, 6, seed % 2 == 0);
    }
}

#[test]
fn random_sequences_with_integrity_levels() {
    for seed in 500..524 {
        let array = match seed % 3 {
            0 => ArrayObject::new(),
            1 => ArrayObject::with_length(32).unwrap(),
            _ => {
                let elements: Vec<Option<Value>> =
                    (0..12).map(|i| Some(Value::Integer(i))).collect();
                ArrayObject::from_values(&elements).unwrap()
            }
        };
        let array = run(seed, array, 300, 6, true);
        array.check_invariants().unwrap();
    }
}

#[test]
fn element_kinds_only_widen() {
    let cx = ArrayContext::default();
    let mut rng = StdRng::seed_from_u64(7);
    let mut array = ArrayObject::new();
    let mut widest: Option<ElementKind> = None;
    for _ in 0..500 {
        let index = rng.random_range(0..64);
        array
            .set_element(&cx, index, random_value(&mut rng, 6), true)
            .unwrap();
        if let ArrayLayout::Sparse = array.strategy().layout() {
            break;
        }
        let kind = array.strategy().element_kind();
        if let (Some(previous), Some(kind)) = (widest, kind) {
            assert!(kind.is_wider_or_equal(previous), "{kind:?} after {previous:?}");
        }
        widest = kind.or(widest);
    }
}
