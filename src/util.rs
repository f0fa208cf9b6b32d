use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io;
use std::path::Path;

/// Deserializes a field that the CMS may send as `null`, substituting the
/// type's default. Combine with `#[serde(default)]` to also cover missing
/// fields.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Opens a file, annotating any error with the kind of file and its path.
pub fn open(path: &Path, kind: &str) -> io::Result<File> {
    File::open(path).map_err(|e| {
        io::Error::new(
            e.kind(),
            format!("Opening {} file `{}`: {}", kind, path.display(), e),
        )
    })
}

/// Escapes `text` for inclusion in HTML element content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    // writing into a String never fails
    let _ = pulldown_cmark::escape::escape_html(&mut out, text);
    out
}
