//! Builds a small nested document in a fixed stack buffer, updates a field
//! in place and reads everything back from a copy of the bytes.
//!
//! Run with
//!
//! ```bash
//! cargo run -p lite3 --example nested_document
//! ```

use lite3::{Buffer, Document, Offset, ValueRef};

fn build(bytes: &mut [u8]) -> lite3::Result<usize> {
    let mut buf = Buffer::new(bytes);
    let root = buf.init_obj()?;
    buf.set_str(root, "service", "ingest")?;
    buf.set_i64(root, "port", 8080)?;

    let replicas = buf.set_arr(root, "replicas")?.offset;
    for host in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
        let replica = buf.push_obj(replicas)?;
        buf.set_str(replica, "host", host)?;
        buf.set_bool(replica, "healthy", true)?;
    }

    // The replicas array is sealed now; changing the port appends a new
    // entry that shadows the old one.
    let update = buf.set_i64(root, "port", 9090)?;
    println!(
        "port moved to offset {}, old value at {:?}",
        update.offset, update.shadowed
    );

    let stats = buf.doc().stats(root)?;
    println!(
        "root: {} entries, {} live, {} orphaned bytes",
        stats.entries, stats.live, stats.orphaned_bytes
    );
    Ok(buf.into_len())
}

fn main() -> lite3::Result<()> {
    let mut bytes = [0u8; 4096];
    let len = build(&mut bytes)?;

    // A document has no pointers, so a plain copy stays readable.
    let copy = bytes[..len].to_vec();
    let doc = Document::new(&copy);
    let root = Offset::ROOT;
    println!("root    = {:?}", doc.root()?.kind());

    println!("service = {}", doc.get_str(root, "service")?);
    println!("port    = {}", doc.get_i64(root, "port")?);

    let replicas = doc.get_arr(root, "replicas")?;
    for element in doc.elements(replicas)? {
        let (_, value) = element?;
        if let ValueRef::Object(replica) = value {
            println!(
                "replica {} healthy={}",
                doc.get_str(replica, "host")?,
                doc.get_bool(replica, "healthy")?
            );
        }
    }

    println!("{:#?}", doc.to_value(root)?);
    Ok(())
}
