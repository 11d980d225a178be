//! In-memory PDF builders for tests.
//!
//! Each line is written in its own text object, one leading below the previous
//! one, so every engine sees it as a separate line.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, encryption, Document, Object, Stream, StringFormat};

use super::Result;
use crate::error::PdfError;

const FONT_SIZE: i64 = 12;
const LEADING: i64 = 16;
const TOP: i64 = 800;
const LEFT: i64 = 50;
// Pages start this much lower than the previous one so the last line of a
// page and the first line of the next never share a baseline.
const PAGE_SHIFT: i64 = 7;

// Standard security handler password padding.
const PASSWORD_PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08,
    0x2E, 0x2E, 0x00, 0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];
const FILE_ID: &[u8; 16] = b"lineitem-fixture";
// Owner hash only feeds key derivation; no owner password is ever checked.
const OWNER_HASH: [u8; 32] = [0x4F; 32];

/// Build a one-page PDF with the given text lines.
pub fn text_pdf(lines: &[&str]) -> Result<Vec<u8>> {
    paged_pdf(&[lines])
}

/// Build a PDF with one page per slice of lines.
///
/// An empty slice gives a valid document with an empty page tree.
pub fn paged_pdf(pages: &[&[&str]]) -> Result<Vec<u8>> {
    save(build_document(pages)?)
}

/// Build a one-page PDF encrypted with RC4 (standard security handler,
/// revision 2) under `user_password`.
pub fn encrypted_pdf(lines: &[&str], user_password: &str) -> Result<Vec<u8>> {
    let mut doc = build_document(&[lines])?;

    let file_id = Object::String(FILE_ID.to_vec(), StringFormat::Hexadecimal);
    doc.trailer.set("ID", vec![file_id.clone(), file_id]);

    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 2_i64,
        "R" => 2_i64,
        "Length" => 40_i64,
        "P" => -4_i64,
        "O" => Object::String(OWNER_HASH.to_vec(), StringFormat::Hexadecimal),
        "CF" => dictionary! {
            "StdCF" => dictionary! {
                "CFM" => "V2",
            },
        },
        "StmF" => "StdCF",
        "StrF" => "StdCF",
    });
    doc.trailer.set("Encrypt", encrypt_id);

    let key = encryption::get_encryption_key(&doc, user_password, false)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    let user_hash = rc4(&key, &PASSWORD_PAD);
    doc.get_object_mut(encrypt_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| PdfError::Parse(e.to_string()))?
        .set("U", Object::String(user_hash, StringFormat::Hexadecimal));

    // RC4 is symmetric, so the per-object "decrypt" encrypts plain content.
    for (&id, object) in doc.objects.iter_mut() {
        if id == encrypt_id {
            continue;
        }
        let Ok(cipher) = encryption::decrypt_object(&key, id, &*object, false) else {
            continue;
        };
        match object {
            Object::Stream(stream) => stream.set_content(cipher),
            Object::String(content, _) => *content = cipher,
            _ => {}
        }
    }

    save(doc)
}

fn build_document(pages: &[&[&str]]) -> Result<Document> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for (page_index, lines) in pages.iter().enumerate() {
        let top = TOP - (page_index as i64) * PAGE_SHIFT;
        let content = Content {
            operations: page_operations(lines, top),
        };
        let encoded = content
            .encode()
            .map_err(|e| PdfError::Parse(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    Ok(doc)
}

fn save(mut doc: Document) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfError::Parse(e.to_string()))?;
    Ok(buffer)
}

fn page_operations(lines: &[&str], top: i64) -> Vec<Operation> {
    let mut operations = Vec::with_capacity(lines.len() * 5);
    for (i, line) in lines.iter().enumerate() {
        let y = top - (i as i64) * LEADING;
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), FONT_SIZE.into()]));
        operations.push(Operation::new("Td", vec![LEFT.into(), y.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("ET", vec![]));
    }
    operations
}

fn rc4(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut state: Vec<u8> = (0..=255).collect();
    let mut j: u8 = 0;
    for i in 0..256 {
        j = j.wrapping_add(state[i]).wrapping_add(key[i % key.len()]);
        state.swap(i, j as usize);
    }

    let (mut i, mut j) = (0u8, 0u8);
    data.iter()
        .map(|byte| {
            i = i.wrapping_add(1);
            j = j.wrapping_add(state[i as usize]);
            state.swap(i as usize, j as usize);
            byte ^ state[state[i as usize].wrapping_add(state[j as usize]) as usize]
        })
        .collect()
}
