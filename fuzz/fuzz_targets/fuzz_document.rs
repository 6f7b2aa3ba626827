#![no_main]
//! Reads arbitrary bytes as a document. Corrupt input must surface as an
//! error from every read path, never as a panic or an endless walk.

use libfuzzer_sys::fuzz_target;
use lite3::{Document, Offset, ValueRef};

fn walk(doc: Document<'_>, at: Offset, depth: usize) {
    if depth > 64 {
        return;
    }
    let _ = doc.stats(at);
    let _ = doc.count(at);
    match doc.value(at) {
        Ok(ValueRef::Object(obj)) => {
            if let Ok(entries) = doc.entries(obj) {
                for entry in entries.flatten() {
                    let _ = doc.get(obj, entry.key);
                    walk(doc, entry.value_offset, depth + 1);
                }
            }
            if let Ok(iter) = doc.iter(obj) {
                iter.for_each(drop);
            }
        }
        Ok(ValueRef::Array(arr)) => {
            if let Ok(elements) = doc.elements(arr) {
                for (ofs, _) in elements.flatten() {
                    walk(doc, ofs, depth + 1);
                }
            }
            let _ = doc.arr_get(arr, 0);
        }
        _ => {}
    }
}

fuzz_target!(|data: &[u8]| {
    let doc = Document::new(data);
    walk(doc, Offset::ROOT, 0);
    let _ = doc.to_value(Offset::ROOT);
});
