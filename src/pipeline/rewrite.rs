//! Decrypt-and-rewrite: copy every page of a PDF into a fresh, unencrypted
//! document via lopdf.
//!
//! ## Why a fresh document?
//!
//! Saving the loaded document back would carry over whatever the source
//! trailer holds, including its `/Encrypt` dictionary. Building a new catalog
//! and page tree and copying only the objects reachable from the pages
//! guarantees the output has no encryption dictionary at all.
//!
//! All functions here are blocking; callers run them in `spawn_blocking`.

use crate::error::FileError;
use crate::output::RewriteOutcome;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::{debug, info, warn};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `/Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// Facts about a PDF, as reported by [`crate::inspect`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfInfo {
    pub page_count: usize,
    pub pdf_version: String,
    pub is_encrypted: bool,
}

/// Rewrite `source` as an unencrypted PDF at `output`.
///
/// Never panics and never returns early with an error: every failure is
/// captured in [`RewriteOutcome::Failed`] so the caller can still archive
/// the original.
pub fn rewrite_pdf(
    source: &Path,
    output: &Path,
    max_pages: Option<usize>,
    password: Option<&str>,
) -> RewriteOutcome {
    let (document, was_encrypted) = match open_document(source, password) {
        Ok(loaded) => loaded,
        Err(error) => return RewriteOutcome::Failed { error },
    };

    let pages = document.get_pages().len();

    if let Some(max) = max_pages {
        if pages > max {
            warn!(
                "Skipping {}. Exceeds maximum allowed pages ({} > {}).",
                source.display(),
                pages,
                max
            );
            return RewriteOutcome::TooManyPages {
                pages,
                max_pages: max,
            };
        }
    }

    info!(
        "{} > Nb pages: {}; Is Encrypted: {}",
        source.display(),
        pages,
        was_encrypted
    );

    let mut copy = unlocked_copy(&document);
    if let Err(error) = ensure_all_pages_copied(&copy, pages, output) {
        return RewriteOutcome::Failed { error };
    }
    match save_atomic(&mut copy, output) {
        Ok(()) => RewriteOutcome::Rewritten {
            output: output.to_path_buf(),
            pages,
            was_encrypted,
        },
        Err(error) => RewriteOutcome::Failed { error },
    }
}

/// Read page count, version and encryption flag without rewriting.
pub fn inspect_pdf(source: &Path, password: Option<&str>) -> Result<PdfInfo, FileError> {
    let (document, is_encrypted) = open_document(source, password)?;
    Ok(PdfInfo {
        page_count: document.get_pages().len(),
        pdf_version: document.version.clone(),
        is_encrypted,
    })
}

/// Load `source` and make sure its objects are decrypted.
///
/// Returns the document and whether it was encrypted on disk. The file is
/// read into memory in one go so no handle stays open while the original is
/// later moved.
pub fn open_document(source: &Path, password: Option<&str>) -> Result<(Document, bool), FileError> {
    let bytes = std::fs::read(source).map_err(|e| FileError::Read {
        path: source.to_path_buf(),
        detail: e.to_string(),
    })?;

    let mut document = Document::load_mem(&bytes).map_err(|e| {
        let detail = format!("{e:?}");
        if looks_like_password_error(&detail) {
            password_error(source, password)
        } else {
            FileError::CorruptPdf {
                path: source.to_path_buf(),
                detail: e.to_string(),
            }
        }
    })?;

    // The loader already applies the empty user password when it works.
    let was_encrypted = document.is_encrypted() || document.encryption_state.is_some();
    if document.is_encrypted() && document.encryption_state.is_none() {
        debug!("Decrypting {} with configured password", source.display());
        document
            .decrypt(password.unwrap_or(""))
            .map_err(|_| password_error(source, password))?;
    }

    Ok((document, was_encrypted))
}

fn looks_like_password_error(detail: &str) -> bool {
    let lower = detail.to_lowercase();
    lower.contains("password") || lower.contains("decrypt")
}

fn password_error(source: &Path, password: Option<&str>) -> FileError {
    match password {
        Some(_) => FileError::WrongPassword {
            path: source.to_path_buf(),
        },
        None => FileError::PasswordRequired {
            path: source.to_path_buf(),
        },
    }
}

/// Build a new document holding every page of `source`, in order.
///
/// The copy gets its own catalog and a flat page tree. Inherited page
/// attributes are written onto each page, since the source's intermediate
/// `/Pages` nodes are not copied. Objects are kept only if reachable from a
/// page (or from the `/Info` dictionary); the encryption dictionary, outlines
/// and other catalog-level structures are dropped.
pub fn unlocked_copy(source: &Document) -> Document {
    let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();
    let page_set: BTreeSet<ObjectId> = page_ids.iter().copied().collect();

    let mut target = Document::with_version(source.version.clone());
    let highest = source
        .objects
        .keys()
        .map(|id| id.0)
        .max()
        .unwrap_or(0)
        .max(source.max_id);
    let pages_id = (highest + 1, 0);
    let catalog_id = (highest + 2, 0);

    // Pages first, with inherited attributes materialised.
    let mut pending: Vec<ObjectId> = Vec::new();
    for &page_id in &page_ids {
        let mut page = match source.get_dictionary(page_id) {
            Ok(dict) => dict.clone(),
            Err(e) => {
                warn!("Page object {:?} unreadable: {}", page_id, e);
                continue;
            }
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Some(value) = inherited_attribute(source, &page, key) {
                    page.set(key.to_vec(), value);
                }
            }
        }
        page.remove(b"Parent");
        collect_dictionary_refs(&page, &mut pending);
        page.set("Parent", Object::Reference(pages_id));
        target.objects.insert(page_id, Object::Dictionary(page));
    }

    let info_id = source
        .trailer
        .get(b"Info")
        .and_then(Object::as_reference)
        .ok();
    pending.extend(info_id);

    // Then everything those pages point at.
    let mut visited: BTreeSet<ObjectId> = BTreeSet::new();
    while let Some(id) = pending.pop() {
        if page_set.contains(&id) || !visited.insert(id) {
            continue;
        }
        let Ok(object) = source.get_object(id) else {
            debug!("Dropping dangling reference {:?}", id);
            continue;
        };
        collect_refs(object, &mut pending);
        target.objects.insert(id, object.clone());
    }

    let kids: Vec<Object> = page_ids
        .iter()
        .filter(|id| target.objects.contains_key(id))
        .map(|&id| Object::Reference(id))
        .collect();
    let count = kids.len() as i64;

    target.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    target.objects.insert(
        catalog_id,
        Object::Dictionary(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        }),
    );

    target.trailer.set("Root", Object::Reference(catalog_id));
    if let Some(id) = info_id.filter(|id| target.objects.contains_key(id)) {
        target.trailer.set("Info", Object::Reference(id));
    }
    target.max_id = catalog_id.0;
    target
}

/// Refuse to write a copy that lost pages on the way.
fn ensure_all_pages_copied(copy: &Document, expected: usize, output: &Path) -> Result<(), FileError> {
    let copied = copy.get_pages().len();
    if copied == expected {
        return Ok(());
    }
    Err(FileError::Write {
        path: output.to_path_buf(),
        detail: format!("only {copied} of {expected} pages could be copied"),
    })
}

/// Walk `/Parent` links from `page` looking for `key`.
fn inherited_attribute(source: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    for _ in 0..MAX_TREE_DEPTH {
        let node = source.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

fn collect_refs(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => items.iter().for_each(|item| collect_refs(item, out)),
        Object::Dictionary(dict) => collect_dictionary_refs(dict, out),
        Object::Stream(stream) => collect_dictionary_refs(&stream.dict, out),
        _ => {}
    }
}

fn collect_dictionary_refs(dict: &Dictionary, out: &mut Vec<ObjectId>) {
    for (_, value) in dict.iter() {
        collect_refs(value, out);
    }
}

/// Save `document` next to `output` and rename it into place.
///
/// A failed save leaves no partial file behind: the temporary file is
/// removed when it is dropped.
pub fn save_atomic(document: &mut Document, output: &Path) -> Result<(), FileError> {
    let write_error = |detail: String| FileError::Write {
        path: output.to_path_buf(),
        detail,
    };

    let dir = output
        .parent()
        .ok_or_else(|| write_error("output path has no parent directory".into()))?;
    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;

    {
        let mut writer = BufWriter::new(tmp.as_file());
        document
            .save_to(&mut writer)
            .map_err(|e| write_error(e.to_string()))?;
        writer.flush().map_err(|e| write_error(e.to_string()))?;
    }

    tmp.persist(output)
        .map_err(|e| write_error(e.error.to_string()))?;
    debug!("Wrote {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::Stream;

    /// Two pages sharing inherited Resources and MediaBox on an
    /// intermediate Pages node, plus an outline the copy must drop.
    fn nested_document() -> Document {
        let mut doc = Document::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => Object::Reference(font_id) },
        });

        let root_pages_id = doc.new_object_id();
        let inner_pages_id = doc.new_object_id();

        let mut kids = Vec::new();
        for text in ["first", "second"] {
            let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(inner_pages_id),
                "Contents" => Object::Reference(content_id),
            });
            kids.push(Object::Reference(page_id));
        }

        doc.objects.insert(
            inner_pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Parent" => Object::Reference(root_pages_id),
                "Kids" => kids,
                "Count" => 2,
            }),
        );
        doc.objects.insert(
            root_pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(inner_pages_id)],
                "Count" => 2,
                "Resources" => Object::Reference(resources_id),
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(612),
                    Object::Integer(792),
                ],
            }),
        );
        let outlines_id = doc.add_object(dictionary! { "Type" => "Outlines", "Count" => 0 });
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(root_pages_id),
            "Outlines" => Object::Reference(outlines_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc
    }

    #[test]
    fn copy_keeps_pages_and_content() {
        let source = nested_document();
        let copy = unlocked_copy(&source);

        let src_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        let dst_pages: Vec<ObjectId> = copy.get_pages().into_values().collect();
        assert_eq!(dst_pages.len(), 2);

        for (s, d) in src_pages.iter().zip(&dst_pages) {
            assert_eq!(
                source.get_page_content(*s).unwrap(),
                copy.get_page_content(*d).unwrap()
            );
        }
    }

    #[test]
    fn copy_materialises_inherited_attributes() {
        let copy = unlocked_copy(&nested_document());
        for (_, page_id) in copy.get_pages() {
            let page = copy.get_dictionary(page_id).unwrap();
            assert!(page.has(b"Resources"), "page {page_id:?} lost Resources");
            assert!(page.has(b"MediaBox"), "page {page_id:?} lost MediaBox");
        }
    }

    #[test]
    fn copy_has_no_encrypt_or_outlines() {
        let copy = unlocked_copy(&nested_document());
        assert!(!copy.is_encrypted());
        assert!(copy.trailer.get(b"Encrypt").is_err());
        let has_outlines = copy.objects.values().any(|o| {
            o.as_dict()
                .and_then(|d| d.get(b"Type"))
                .and_then(Object::as_name)
                .map(|n| n == b"Outlines")
                .unwrap_or(false)
        });
        assert!(!has_outlines);
    }

    #[test]
    fn lost_pages_fail_the_rewrite() {
        let copy = unlocked_copy(&nested_document());
        let out = Path::new("/n/a.pdf");
        assert!(ensure_all_pages_copied(&copy, 2, out).is_ok());
        match ensure_all_pages_copied(&copy, 3, out) {
            Err(FileError::Write { path, detail }) => {
                assert_eq!(path, out);
                assert!(detail.contains("2 of 3"), "got: {detail}");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn page_limit_is_inclusive() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("two.pdf");
        nested_document().save(&src).unwrap();
        let out = tmp.path().join("new.pdf");

        let outcome = rewrite_pdf(&src, &out, Some(2), None);
        assert!(
            matches!(outcome, RewriteOutcome::Rewritten { pages: 2, .. }),
            "{outcome:?}"
        );
        assert!(out.exists());
    }

    #[test]
    fn save_atomic_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out.pdf");
        let mut copy = unlocked_copy(&nested_document());
        save_atomic(&mut copy, &out).unwrap();

        let reloaded = Document::load(&out).unwrap();
        assert_eq!(reloaded.get_pages().len(), 2);
        // Only the final file remains.
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 1);
    }

    #[test]
    fn garbage_is_reported_not_raised() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("bad.pdf");
        std::fs::write(&src, b"definitely not a pdf").unwrap();
        let out = tmp.path().join("new.pdf");

        let outcome = rewrite_pdf(&src, &out, None, None);
        assert!(matches!(outcome, RewriteOutcome::Failed { .. }), "{outcome:?}");
        assert!(!out.exists());
    }

    #[test]
    fn page_limit_skips_without_writing() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("two.pdf");
        nested_document().save(&src).unwrap();
        let out = tmp.path().join("new.pdf");

        let outcome = rewrite_pdf(&src, &out, Some(1), None);
        assert!(matches!(
            outcome,
            RewriteOutcome::TooManyPages {
                pages: 2,
                max_pages: 1
            }
        ));
        assert!(!out.exists());
    }

    #[test]
    fn inspect_reports_page_count() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("two.pdf");
        nested_document().save(&src).unwrap();
        let info = inspect_pdf(&src, None).unwrap();
        assert_eq!(info.page_count, 2);
        assert!(!info.is_encrypted);
        assert_eq!(info.pdf_version, "1.5");
    }

    #[test]
    fn password_errors_follow_configuration() {
        let p = Path::new("x.pdf");
        assert!(matches!(
            password_error(p, None),
            FileError::PasswordRequired { .. }
        ));
        assert!(matches!(
            password_error(p, Some("pw")),
            FileError::WrongPassword { .. }
        ));
        assert!(looks_like_password_error("Decryption(IncorrectPassword)"));
        assert!(!looks_like_password_error("Header"));
    }
}
