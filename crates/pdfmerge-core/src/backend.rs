//! PDF library seam
//!
//! Merging needs only four capabilities from a PDF library: parse bytes into a
//! document, enumerate its pages, copy pages into another document, and
//! serialize. [`PdfBackend`] names exactly those, so the merge and upload
//! logic never touch lopdf types directly. [`LopdfBackend`] is the
//! implementation used in production.

use std::collections::BTreeSet;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::error::BackendError;

/// Page attributes that may be inherited from ancestor `Pages` nodes.
const INHERITABLE_ATTRIBUTES: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Upper bound on `Parent` hops, so a cyclic page tree cannot loop forever.
const MAX_TREE_DEPTH: usize = 64;

pub trait PdfBackend {
    type Document;

    /// Create an empty document: a catalog and a page tree with no kids.
    fn create(&self) -> Self::Document;

    fn load(&self, bytes: &[u8]) -> Result<Self::Document, BackendError>;

    fn page_count(&self, document: &Self::Document) -> usize;

    /// Append every page of `source`, in stored order, to the end of `target`.
    ///
    /// Returns the number of pages appended.
    fn append_pages(
        &self,
        target: &mut Self::Document,
        source: Self::Document,
    ) -> Result<usize, BackendError>;

    fn save(&self, document: Self::Document) -> Result<Vec<u8>, BackendError>;
}

/// [`PdfBackend`] built on `lopdf`
#[derive(Debug, Clone, Copy)]
pub struct LopdfBackend {
    /// Flate-compress streams before saving
    compress: bool,
}

impl Default for LopdfBackend {
    fn default() -> Self {
        Self { compress: true }
    }
}

impl LopdfBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_compression(compress: bool) -> Self {
        Self { compress }
    }
}

impl PdfBackend for LopdfBackend {
    type Document = Document;

    fn create(&self) -> Document {
        let mut doc = Document::with_version("1.5");

        let pages = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(Vec::new())),
            ("Count", Object::Integer(0)),
        ]);
        let pages_id = doc.add_object(pages);

        let catalog = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]);
        let catalog_id = doc.add_object(catalog);

        doc.trailer.set("Root", Object::Reference(catalog_id));
        doc
    }

    fn load(&self, bytes: &[u8]) -> Result<Document, BackendError> {
        let doc = Document::load_mem(bytes).map_err(|e| BackendError::Malformed(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(BackendError::Encrypted);
        }
        Ok(doc)
    }

    fn page_count(&self, document: &Document) -> usize {
        document.get_pages().len()
    }

    /// Copy pages the way a whitelist split does: each page plus everything
    /// reachable from it, minus the source page tree and catalog. Object ids
    /// are shifted past the target's `max_id` so nothing collides.
    fn append_pages(&self, target: &mut Document, source: Document) -> Result<usize, BackendError> {
        let target_pages_id = page_tree_root(target)?;

        // get_pages is keyed by 1-based page number, so values come out in stored order
        let source_pages: Vec<ObjectId> = source.get_pages().into_values().collect();
        if source_pages.is_empty() {
            return Ok(0);
        }

        // Reparenting drops the source page tree, so pull inherited attributes
        // down onto each page while the tree is still intact
        let mut page_dicts = Vec::with_capacity(source_pages.len());
        for &page_id in &source_pages {
            let mut page = source
                .get_dictionary(page_id)
                .map_err(|e| BackendError::InvalidStructure(format!("page {:?}: {}", page_id, e)))?
                .clone();
            for key in INHERITABLE_ATTRIBUTES {
                if !page.has(key) {
                    if let Some(value) = inherited_attribute(&source, &page, key) {
                        page.set(key.to_vec(), value);
                    }
                }
            }
            page.remove(b"Parent");
            page_dicts.push((page_id, page));
        }

        let page_set: BTreeSet<ObjectId> = source_pages.iter().copied().collect();
        let kept = collect_dependencies(&source, &page_dicts, &page_set);

        let id_offset = target.max_id;
        let mut source = source;

        for id in &kept {
            if let Some(object) = source.objects.remove(id) {
                let new_id = (id.0 + id_offset, id.1);
                target
                    .objects
                    .insert(new_id, remap_object_refs(object, id_offset, &kept, &page_set));
            }
        }

        let mut new_page_refs = Vec::with_capacity(page_dicts.len());
        for (old_id, page) in page_dicts {
            let new_id = (old_id.0 + id_offset, old_id.1);
            let mut page = remap_dictionary(page, id_offset, &kept, &page_set);
            page.set("Parent", Object::Reference(target_pages_id));
            target.objects.insert(new_id, Object::Dictionary(page));
            new_page_refs.push(new_id);
        }

        target.max_id = target.max_id.max(source.max_id + id_offset);

        let appended = new_page_refs.len();
        append_to_page_tree(target, target_pages_id, new_page_refs)?;
        Ok(appended)
    }

    fn save(&self, mut document: Document) -> Result<Vec<u8>, BackendError> {
        if self.compress {
            document.compress();
        }

        let mut buffer = Vec::new();
        document
            .save_to(&mut buffer)
            .map_err(|e| BackendError::Serialize(e.to_string()))?;
        Ok(buffer)
    }
}

/// Resolve the catalog's `Pages` reference
fn page_tree_root(doc: &Document) -> Result<ObjectId, BackendError> {
    let catalog_id = doc
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BackendError::InvalidStructure("No Root reference in trailer".into()))?;

    doc.get_dictionary(catalog_id)
        .map_err(|_| BackendError::InvalidStructure("Catalog not found".into()))?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| BackendError::InvalidStructure("No Pages reference in catalog".into()))
}

/// Walk up the `Parent` chain looking for `key`
fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    None
}

fn is_tree_node(object: &Object) -> bool {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        _ => return false,
    };
    matches!(
        dict.get(b"Type"),
        Ok(Object::Name(name)) if name.as_slice() == b"Pages" || name.as_slice() == b"Catalog"
    )
}

/// Every non-page object reachable from the pages, skipping page tree nodes and the catalog
fn collect_dependencies(
    source: &Document,
    pages: &[(ObjectId, Dictionary)],
    page_set: &BTreeSet<ObjectId>,
) -> BTreeSet<ObjectId> {
    let mut pending = Vec::new();
    for (_, page) in pages {
        for (_, value) in page.iter() {
            push_references(value, &mut pending);
        }
    }

    let mut kept = BTreeSet::new();
    while let Some(id) = pending.pop() {
        if page_set.contains(&id) || kept.contains(&id) {
            continue;
        }
        let Ok(object) = source.get_object(id) else {
            continue;
        };
        if is_tree_node(object) {
            continue;
        }
        kept.insert(id);
        push_references(object, &mut pending);
    }

    kept
}

fn push_references(object: &Object, pending: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => pending.push(*id),
        Object::Array(items) => {
            for item in items {
                push_references(item, pending);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter() {
                push_references(value, pending);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter() {
                push_references(value, pending);
            }
        }
        _ => {}
    }
}

/// Recursively remap object references by `offset`.
///
/// References to objects that are not carried over become `null`, which is
/// how PDF readers treat a dangling reference anyway.
fn remap_object_refs(
    obj: Object,
    offset: u32,
    kept: &BTreeSet<ObjectId>,
    pages: &BTreeSet<ObjectId>,
) -> Object {
    match obj {
        Object::Reference(id) if kept.contains(&id) || pages.contains(&id) => {
            Object::Reference((id.0 + offset, id.1))
        }
        Object::Reference(_) => Object::Null,
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset, kept, pages))
                .collect(),
        ),
        Object::Dictionary(dict) => Object::Dictionary(remap_dictionary(dict, offset, kept, pages)),
        Object::Stream(mut stream) => {
            stream.dict = remap_dictionary(stream.dict, offset, kept, pages);
            Object::Stream(stream)
        }
        other => other,
    }
}

fn remap_dictionary(
    mut dict: Dictionary,
    offset: u32,
    kept: &BTreeSet<ObjectId>,
    pages: &BTreeSet<ObjectId>,
) -> Dictionary {
    for (_, value) in dict.iter_mut() {
        *value = remap_object_refs(std::mem::replace(value, Object::Null), offset, kept, pages);
    }
    dict
}

fn append_to_page_tree(
    doc: &mut Document,
    pages_id: ObjectId,
    new_pages: Vec<ObjectId>,
) -> Result<(), BackendError> {
    let Some(Object::Dictionary(pages_dict)) = doc.objects.get_mut(&pages_id) else {
        return Err(BackendError::InvalidStructure("Invalid pages dictionary".into()));
    };

    let mut kids = match pages_dict.get(b"Kids") {
        Ok(Object::Array(kids)) => kids.clone(),
        _ => Vec::new(),
    };
    kids.extend(new_pages.into_iter().map(Object::Reference));

    pages_dict.set("Count", Object::Integer(kids.len() as i64));
    pages_dict.set("Kids", Object::Array(kids));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{create_nested_pdf, create_test_pdf, page_labels};

    #[test]
    fn test_create_is_empty_and_saveable() {
        let backend = LopdfBackend::new();
        let doc = backend.create();
        assert_eq!(backend.page_count(&doc), 0);

        let bytes = backend.save(doc).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        let reloaded = Document::load_mem(&bytes).unwrap();
        assert_eq!(reloaded.get_pages().len(), 0);
    }

    #[test]
    fn test_load_rejects_garbage() {
        let backend = LopdfBackend::new();
        let result = backend.load(b"definitely not a pdf");
        assert!(matches!(result, Err(BackendError::Malformed(_))));
    }

    #[test]
    fn test_append_pages_reparents_onto_target_tree() {
        let backend = LopdfBackend::with_compression(false);
        let mut target = backend.create();
        let source = backend.load(&create_test_pdf(3, "Src")).unwrap();

        let appended = backend.append_pages(&mut target, source).unwrap();
        assert_eq!(appended, 3);

        let root = page_tree_root(&target).unwrap();
        for page_id in target.get_pages().into_values() {
            let page = target.get_dictionary(page_id).unwrap();
            assert_eq!(page.get(b"Parent").and_then(Object::as_reference).unwrap(), root);
        }
    }

    #[test]
    fn test_append_zero_pages_is_noop() {
        let backend = LopdfBackend::new();
        let mut target = backend.create();
        let before = target.objects.len();
        let source = backend.load(&create_test_pdf(0, "Empty")).unwrap();

        assert_eq!(backend.append_pages(&mut target, source).unwrap(), 0);
        assert_eq!(target.objects.len(), before);
    }

    #[test]
    fn test_inherited_media_box_is_materialized() {
        let backend = LopdfBackend::with_compression(false);
        let mut target = backend.create();
        let source = backend.load(&create_nested_pdf("Nested")).unwrap();

        backend.append_pages(&mut target, source).unwrap();

        let bytes = backend.save(target).unwrap();
        let merged = Document::load_mem(&bytes).unwrap();
        for page_id in merged.get_pages().into_values() {
            let page = merged.get_dictionary(page_id).unwrap();
            let media_box = page.get(b"MediaBox").and_then(Object::as_array).unwrap();
            assert_eq!(media_box.len(), 4);
        }
        assert_eq!(
            page_labels(&merged),
            vec!["Nested-Page-1", "Nested-Page-2", "Nested-Page-3"]
        );
    }

    #[test]
    fn test_source_page_tree_is_not_copied() {
        let backend = LopdfBackend::with_compression(false);
        let mut target = backend.create();
        let source = backend.load(&create_test_pdf(2, "Src")).unwrap();
        backend.append_pages(&mut target, source).unwrap();

        let tree_nodes = target
            .objects
            .values()
            .filter(|object| is_tree_node(object))
            .count();
        // Only the target's own catalog and Pages root
        assert_eq!(tree_nodes, 2);
    }

    #[test]
    fn test_remap_drops_references_outside_kept_set() {
        let kept: BTreeSet<ObjectId> = [(4, 0)].into_iter().collect();
        let pages = BTreeSet::new();
        let array = Object::Array(vec![Object::Reference((4, 0)), Object::Reference((9, 0))]);

        let remapped = remap_object_refs(array, 10, &kept, &pages);
        let items = remapped.as_array().unwrap();
        assert_eq!(items[0].as_reference().unwrap(), (14, 0));
        assert!(matches!(items[1], Object::Null));
    }
}
