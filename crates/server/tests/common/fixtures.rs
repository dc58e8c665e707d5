//! Test data fixtures.
//! Note: #[allow(dead_code)] because each test file compiles common/ separately.

use sha2::{Digest, Sha256};

/// SHA-256 of data as lowercase hex.
#[allow(dead_code)]
pub fn sha256_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Build an uncompressed tar archive with the given entries.
#[allow(dead_code)]
pub fn docs_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (path, data) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

/// The standard `mylib-1.0` documentation archive: one root directory
/// wrapping an index page, a module page and a nested source page.
#[allow(dead_code)]
pub fn mylib_archive() -> Vec<u8> {
    docs_archive(&[
        ("mylib-1.0-docs/index.html", MYLIB_INDEX_HTML),
        ("mylib-1.0-docs/Mylib.html", MYLIB_MODULE_HTML),
        ("mylib-1.0-docs/src/index.html", MYLIB_SRC_INDEX_HTML),
        ("mylib-1.0-docs/style.css", MYLIB_STYLE_CSS),
    ])
}

#[allow(dead_code)]
pub const MYLIB_INDEX_HTML: &[u8] = b"<html><body>mylib index</body></html>";
#[allow(dead_code)]
pub const MYLIB_MODULE_HTML: &[u8] = b"<html><body>module Mylib</body></html>";
#[allow(dead_code)]
pub const MYLIB_SRC_INDEX_HTML: &[u8] = b"<html><body>sources</body></html>";
#[allow(dead_code)]
pub const MYLIB_STYLE_CSS: &[u8] = b"body { margin: 0; }";
