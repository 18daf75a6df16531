//! Labelled PDFs for tests
//!
//! Every page carries a text marker `<prefix>-Page-<n>` in its content
//! stream, so tests can check page order after a merge.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

fn label_stream(doc: &mut Document, label: &str) -> ObjectId {
    let content = Content {
        operations: vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![Object::Name(b"F1".to_vec()), Object::Integer(12)],
            ),
            Operation::new("Td", vec![Object::Integer(50), Object::Integer(700)]),
            Operation::new(
                "Tj",
                vec![Object::String(
                    label.as_bytes().to_vec(),
                    StringFormat::Literal,
                )],
            ),
            Operation::new("ET", vec![]),
        ],
    };
    let encoded = content.encode().unwrap_or_default();
    doc.add_object(Stream::new(Dictionary::new(), encoded))
}

fn letter_media_box() -> Object {
    Object::Array(vec![
        Object::Integer(0),
        Object::Integer(0),
        Object::Integer(612),
        Object::Integer(792),
    ])
}

fn finish(mut doc: Document, pages_id: ObjectId) -> Vec<u8> {
    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .expect("saving an in-memory fixture cannot fail");
    buffer
}

/// Create a flat PDF with `num_pages` pages labelled `<prefix>-Page-1..N`.
///
/// `num_pages == 0` yields a valid document with an empty page tree.
pub fn create_test_pdf(num_pages: u32, prefix: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for page_num in 1..=num_pages {
        let content_id = label_stream(&mut doc, &format!("{}-Page-{}", prefix, page_num));
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("MediaBox", letter_media_box()),
            ("Contents", Object::Reference(content_id)),
        ]);
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        ("Kids", Object::Array(kids)),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    finish(doc, pages_id)
}

/// Create a 3-page PDF whose page tree has an intermediate node.
///
/// Page 1 hangs off the root, pages 2 and 3 off a child `Pages` node.
/// `MediaBox` lives only on the root, so every page inherits it.
pub fn create_nested_pdf(prefix: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let root_id = doc.new_object_id();
    let branch_id = doc.new_object_id();

    let page = |doc: &mut Document, parent: ObjectId, n: u32| {
        let content_id = label_stream(doc, &format!("{}-Page-{}", prefix, n));
        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(parent)),
            ("Contents", Object::Reference(content_id)),
        ]);
        Object::Reference(doc.add_object(page))
    };

    let first = page(&mut doc, root_id, 1);
    let second = page(&mut doc, branch_id, 2);
    let third = page(&mut doc, branch_id, 3);

    let branch = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Parent", Object::Reference(root_id)),
        ("Count", Object::Integer(2)),
        ("Kids", Object::Array(vec![second, third])),
    ]);
    doc.objects.insert(branch_id, Object::Dictionary(branch));

    let root = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(3)),
        ("MediaBox", letter_media_box()),
        (
            "Kids",
            Object::Array(vec![first, Object::Reference(branch_id)]),
        ),
    ]);
    doc.objects.insert(root_id, Object::Dictionary(root));

    finish(doc, root_id)
}

/// Create a labelled PDF whose trailer declares Standard security handler
/// encryption. The page content itself is left in the clear.
pub fn create_encrypted_pdf(num_pages: u32, prefix: &str) -> Vec<u8> {
    let mut doc = Document::load_mem(&create_test_pdf(num_pages, prefix))
        .expect("freshly built fixture must parse");

    let encrypt = Dictionary::from_iter(vec![
        ("Filter", Object::Name(b"Standard".to_vec())),
        ("V", Object::Integer(1)),
        ("R", Object::Integer(2)),
        ("O", Object::String(vec![0x4f; 32], StringFormat::Literal)),
        ("U", Object::String(vec![0x55; 32], StringFormat::Literal)),
        ("P", Object::Integer(-4)),
    ]);
    let encrypt_id = doc.add_object(encrypt);
    doc.trailer.set("Encrypt", Object::Reference(encrypt_id));

    let file_id = Object::String(vec![0x42; 16], StringFormat::Hexadecimal);
    doc.trailer
        .set("ID", Object::Array(vec![file_id.clone(), file_id]));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .expect("saving an in-memory fixture cannot fail");
    buffer
}

/// Read back the `<prefix>-Page-<n>` marker of every page, in page order.
pub fn page_labels(doc: &Document) -> Vec<String> {
    doc.get_pages()
        .into_values()
        .map(|page_id| {
            let content = doc.get_page_content(page_id).unwrap_or_default();
            Content::decode(&content)
                .ok()
                .and_then(|content| {
                    content
                        .operations
                        .into_iter()
                        .find(|op| op.operator == "Tj")
                        .and_then(|op| op.operands.into_iter().next())
                })
                .and_then(|operand| match operand {
                    Object::String(bytes, _) => String::from_utf8(bytes).ok(),
                    _ => None,
                })
                .unwrap_or_default()
        })
        .collect()
}
