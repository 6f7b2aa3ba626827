#![no_main]
//! Applies arbitrary mutations to a small buffer and checks the result
//! against an in-memory model after every step.

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lite3::{Buffer, Error, Map, NODE_ALIGNMENT, NODE_SIZE, Offset, Value, ValueRef};

const KEYS: [&str; 5] = ["a", "b", "list", "κλειδί", ""];

#[derive(Debug, Arbitrary)]
enum Scalar {
    Null,
    Bool(bool),
    I64(i64),
    F64(i32),
    Bytes(Vec<u8>),
    Str(String),
}

impl Scalar {
    fn to_value(&self) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::I64(n) => Value::I64(*n),
            Scalar::F64(n) => Value::F64(f64::from(*n) / 4.0),
            Scalar::Bytes(b) => Value::Bytes(b.clone().into()),
            Scalar::Str(s) => Value::String(s.clone()),
        }
    }
}

#[derive(Debug, Arbitrary)]
enum Op {
    Set { key: u8, value: Scalar },
    SetList { key: u8 },
    Push { value: Scalar },
    PushList,
}

#[derive(Debug, Arbitrary)]
struct Input {
    capacity: u16,
    ops: Vec<Op>,
}

fn key(k: u8) -> &'static str {
    KEYS[usize::from(k) % KEYS.len()]
}

fn set(buf: &mut Buffer<'_>, key: &str, value: &Scalar) -> lite3::Result<Offset> {
    let root = Offset::ROOT;
    let written = match value {
        Scalar::Null => buf.set_null(root, key),
        Scalar::Bool(b) => buf.set_bool(root, key, *b),
        Scalar::I64(n) => buf.set_i64(root, key, *n),
        Scalar::F64(n) => buf.set_f64(root, key, f64::from(*n) / 4.0),
        Scalar::Bytes(b) => buf.set_bytes(root, key, b),
        Scalar::Str(s) => buf.set_str(root, key, s),
    }?;
    Ok(written.offset)
}

fn push(buf: &mut Buffer<'_>, arr: Offset, value: &Scalar) -> lite3::Result<Offset> {
    match value {
        Scalar::Null => buf.push_null(arr),
        Scalar::Bool(b) => buf.push_bool(arr, *b),
        Scalar::I64(n) => buf.push_i64(arr, *n),
        Scalar::F64(n) => buf.push_f64(arr, f64::from(*n) / 4.0),
        Scalar::Bytes(b) => buf.push_bytes(arr, b),
        Scalar::Str(s) => buf.push_str(arr, s),
    }
}

/// The array most recently created under the root, if it is still the last
/// thing in the buffer.
struct List {
    key: &'static str,
    at: Offset,
    open: bool,
}

fn run(input: &Input) {
    let mut bytes = vec![0u8; NODE_SIZE + usize::from(input.capacity % 4096)];
    let mut buf = Buffer::new(&mut bytes);
    let root = buf.init_obj().unwrap();
    let mut model = Map::new();
    let mut list: Option<List> = None;

    for op in &input.ops {
        let before = buf.as_bytes().to_vec();
        let result = match op {
            Op::Set { key: k, value } => set(&mut buf, key(*k), value).map(|_| {
                model.insert(key(*k).to_owned(), value.to_value());
                if let Some(list) = &mut list {
                    list.open = false;
                }
            }),
            Op::SetList { key: k } => buf.set_arr(root, key(*k)).map(|w| {
                model.insert(key(*k).to_owned(), Value::Array(Vec::new()));
                list = Some(List {
                    key: key(*k),
                    at: w.offset,
                    open: true,
                });
            }),
            Op::Push { value } => match &list {
                None => continue,
                Some(l) => push(&mut buf, l.at, value).map(|_| {
                    assert!(l.open, "push into a sealed array succeeded");
                    if let Some(Value::Array(items)) = model.get_mut(l.key) {
                        items.push(value.to_value());
                    }
                }),
            },
            Op::PushList => match &list {
                None => continue,
                Some(l) => buf.push_arr(l.at).map(|nested| {
                    // The parent stays open: its end follows the child's.
                    assert!(l.open, "push into a sealed array succeeded");
                    assert_eq!(nested.get() % NODE_ALIGNMENT, 0);
                    if let Some(Value::Array(items)) = model.get_mut(l.key) {
                        items.push(Value::Array(Vec::new()));
                    }
                }),
            },
        };

        match result {
            Ok(()) => {}
            Err(Error::BufferFull { needed, available }) => {
                assert!(needed > available);
                assert_eq!(buf.as_bytes(), &before[..]);
            }
            Err(Error::NodeSealed { .. }) => {
                assert!(list.as_ref().is_some_and(|l| !l.open));
                assert_eq!(buf.as_bytes(), &before[..]);
            }
            Err(e) => panic!("unexpected error: {e}"),
        }
    }

    let doc = buf.doc();
    assert_eq!(doc.to_value(root).unwrap(), Value::Object(model.clone()));
    assert_eq!(doc.count(root).unwrap(), model.len());
    for entry in doc.entries(root).unwrap() {
        let entry = entry.unwrap();
        if let ValueRef::Object(at) | ValueRef::Array(at) = entry.value {
            assert_eq!(at.get() % NODE_ALIGNMENT, 0);
        }
    }
}

fuzz_target!(|input: Input| run(&input));
