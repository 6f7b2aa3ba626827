#![allow(missing_docs, dead_code)]

use core::fmt::Write;

use lite3::{Buffer, BufferOptions, Padding};

pub fn buffer(bytes: &mut [u8], padding: Padding) -> Buffer<'_> {
    Buffer::with_options(bytes, BufferOptions { padding })
}

/// Sixteen bytes per line, each line prefixed with its offset.
pub fn hex(bytes: &[u8], start: usize) -> String {
    let mut out = String::new();
    for (i, line) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = line.iter().map(|b| format!("{b:02x}")).collect();
        writeln!(out, "{:04x}  {}", start + i * 16, hex.join(" ")).unwrap();
    }
    out
}
