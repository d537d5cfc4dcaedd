//! JSON-lines export of stored products
//!
//! One UTF-8 JSON object per line with the fields `title`, `price`,
//! `product_url`, `images` and `category`.

use crate::crawler::ProductRecord;
use crate::output::OutputResult;
use crate::storage::SqliteSink;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes every stored product to `output_path`, returning the count
pub fn export_products(sink: &SqliteSink, output_path: &Path) -> OutputResult<usize> {
    let products = sink.load_products()?;

    let mut writer = BufWriter::new(File::create(output_path)?);
    write_json_lines(&products, &mut writer)?;
    writer.flush()?;

    tracing::info!(
        "Exported {} product(s) to {}",
        products.len(),
        output_path.display()
    );
    Ok(products.len())
}

/// Serializes products as JSON lines
pub fn write_json_lines<W: Write>(products: &[ProductRecord], writer: &mut W) -> OutputResult<()> {
    for product in products {
        serde_json::to_writer(&mut *writer, product)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}
