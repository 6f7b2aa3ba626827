#![allow(missing_docs)]

mod common;

use lite3::{
    Buffer, Error, KEY_TAG, NODE_SIZE, Offset, PADDING_SENTINEL, Padding, Stats, ValueKind,
    ValueRef, Written,
};
use rstest::rstest;

#[rstest]
#[case::zero(Padding::Zero)]
#[case::sentinel(Padding::Sentinel)]
fn new_key_is_padded_in_front(#[case] padding: Padding) {
    let mut bytes = [0xEEu8; 1024];
    let mut buf = common::buffer(&mut bytes, padding);
    buf.init_obj().unwrap();
    assert_eq!(buf.len(), NODE_SIZE);

    // 96 + key tag + "a\0" = 99, so one byte of padding precedes the key.
    let written = buf.set_obj(Offset::ROOT, "a").unwrap();
    let b = buf.as_bytes();
    assert_eq!(b[96], padding.byte());
    assert_eq!(b[97], KEY_TAG);
    assert_eq!(&b[98..100], b"a\0");
    assert_eq!(written.offset.get(), 100);
    assert_eq!(b[100], ValueKind::Object.tag());
    assert_eq!(buf.len(), 100 + NODE_SIZE);
    assert_eq!(written.shadowed, None);
}

#[rstest]
#[case::zero(Padding::Zero)]
#[case::sentinel(Padding::Sentinel)]
fn growing_update_appends_with_padding(#[case] padding: Padding) {
    let mut bytes = [0xEEu8; 1024];
    let mut buf = common::buffer(&mut bytes, padding);
    let root = buf.init_obj().unwrap();

    let first = buf.set_str(root, "key1", "val1").unwrap();
    assert_eq!(buf.len(), 112);
    assert_eq!(first.offset.get(), 102);
    let original: [u8; 16] = [
        KEY_TAG, b'k', b'e', b'y', b'1', 0, // key
        ValueKind::String.tag(), 4, 0, 0, 0, b'v', b'a', b'l', b'1', 0, // value
    ];
    assert_eq!(&buf.as_bytes()[96..112], &original);

    // 112 + key tag + "key1\0" = 118, two bytes short of alignment.
    let update = buf.set_obj(root, "key1").unwrap();
    let b = buf.as_bytes();
    assert_eq!(&b[112..114], &[padding.byte(); 2]);
    assert_eq!(b[114], KEY_TAG);
    assert_eq!(&b[115..120], b"key1\0");
    assert_eq!(update.offset.get(), 120);
    assert_eq!(b[120], ValueKind::Object.tag());
    assert_eq!(buf.len(), 120 + NODE_SIZE);

    // The old entry is still there, byte for byte, but no longer reachable.
    assert_eq!(&b[96..112], &original);
    assert_eq!(update.shadowed, Some(first.offset));
    let doc = buf.doc();
    assert_eq!(doc.get(root, "key1"), Ok(ValueRef::Object(update.offset)));
    assert_eq!(doc.value(first.offset), Ok(ValueRef::Str("val1")));
    assert_eq!(doc.count(root), Ok(1));
    assert_eq!(
        doc.stats(root),
        Ok(Stats {
            entries: 2,
            live: 1,
            orphaned_bytes: 16,
        })
    );
}

#[test]
fn default_padding_follows_build_mode() {
    let expected = if cfg!(any(debug_assertions, feature = "debug-padding")) {
        PADDING_SENTINEL
    } else {
        0x00
    };
    let mut bytes = [0xEEu8; 512];
    let mut buf = Buffer::new(&mut bytes);
    buf.init_obj().unwrap();
    buf.set_obj(Offset::ROOT, "a").unwrap();
    assert_eq!(buf.as_bytes()[NODE_SIZE], expected);
}

#[test]
fn no_slack_rejects_insert_without_mutation() {
    let mut bytes = [0xEEu8; NODE_SIZE];
    let mut buf = Buffer::new(&mut bytes);
    buf.init_obj().unwrap();
    let before = buf.as_bytes().to_vec();

    assert_eq!(
        buf.set_str(Offset::ROOT, "k", "v"),
        Err(Error::BufferFull {
            needed: 10,
            available: 0
        })
    );
    assert_eq!(buf.len(), NODE_SIZE);
    assert_eq!(buf.as_bytes(), &before[..]);
}

#[test]
fn padding_does_not_fit_either() {
    // Room for key and header but not for the one byte of padding.
    let mut bytes = [0xEEu8; 100 + NODE_SIZE - 1];
    let mut buf = common::buffer(&mut bytes, Padding::Sentinel);
    buf.init_obj().unwrap();
    assert_eq!(
        buf.set_obj(Offset::ROOT, "a"),
        Err(Error::BufferFull {
            needed: 100,
            available: 99
        })
    );
    assert_eq!(buf.len(), NODE_SIZE);
}

#[derive(Debug, Clone, Copy)]
enum Scalar {
    Null,
    Bool,
    I64,
    F64,
    Bytes,
    Str,
}

fn set_scalar(buf: &mut Buffer<'_>, scalar: Scalar) -> lite3::Result<Written> {
    match scalar {
        Scalar::Null => buf.set_null(Offset::ROOT, "k"),
        Scalar::Bool => buf.set_bool(Offset::ROOT, "k", false),
        Scalar::I64 => buf.set_i64(Offset::ROOT, "k", 9),
        Scalar::F64 => buf.set_f64(Offset::ROOT, "k", 0.25),
        Scalar::Bytes => buf.set_bytes(Offset::ROOT, "k", b"xyz"),
        Scalar::Str => buf.set_str(Offset::ROOT, "k", "xyz"),
    }
}

#[rstest]
#[case::null(Scalar::Null, 1)]
#[case::bool(Scalar::Bool, 2)]
#[case::i64(Scalar::I64, 9)]
#[case::f64(Scalar::F64, 9)]
#[case::bytes(Scalar::Bytes, 8)]
#[case::string(Scalar::Str, 9)]
fn scalars_are_never_padded(#[case] scalar: Scalar, #[case] value_len: usize) {
    let mut bytes = [0u8; 512];
    let mut buf = common::buffer(&mut bytes, Padding::Sentinel);
    buf.init_obj().unwrap();
    // Knock the tail off alignment first.
    buf.set_bool(Offset::ROOT, "x", true).unwrap();
    let tail = buf.len();
    assert_ne!(tail % 4, 0);

    let written = set_scalar(&mut buf, scalar).unwrap();
    assert_eq!(written.offset.get(), tail + 3);
    assert_eq!(buf.len(), tail + 3 + value_len);
    assert!(!buf.as_bytes()[tail..].contains(&PADDING_SENTINEL));
}

#[test]
fn every_pad_length_occurs() {
    let mut bytes = [0u8; 4096];
    let mut buf = common::buffer(&mut bytes, Padding::Sentinel);
    let root = buf.init_obj().unwrap();
    let mut seen = [false; 4];
    for key in ["", "a", "ab", "abc", "abcd"] {
        let tail = buf.len();
        let node = buf.set_arr(root, key).unwrap().offset;
        assert_eq!(node.get() % 4, 0);
        let pad = node.get() - (tail + key.len() + 2);
        assert!(buf.as_bytes()[tail..tail + pad].iter().all(|&b| b == PADDING_SENTINEL));
        seen[pad] = true;
    }
    assert_eq!(seen, [true; 4]);
}
