use std::fs;
use std::path::{Path, PathBuf};

use printpdf::lopdf::content::{Content, Operation};
use printpdf::lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::layout::{plan_overlay, CoordinateMap, TextRun};
use crate::error::RenderError;
use crate::ledger::PropertyRecord;

/// Standard font used for every overlay string. Not embedded; every PDF
/// reader ships it.
pub const OVERLAY_FONT: &str = "Helvetica";

/// US letter in points, used when the template does not say otherwise.
const LETTER: PageBox = PageBox {
    left: 0.0,
    bottom: 0.0,
    right: 612.0,
    top: 792.0,
};

/// Parent-chain depth limit when looking up inherited page attributes.
const MAX_PAGE_TREE_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
    pub top: f32,
}

impl PageBox {
    fn contains(&self, run: &TextRun) -> bool {
        run.x >= self.left && run.x <= self.right && run.y >= self.bottom && run.y <= self.top
    }
}

/// Reads the template from disk and overlays `record` onto its first page.
pub fn render_invoice(
    template: &Path,
    record: &PropertyRecord,
    map: &CoordinateMap,
) -> Result<Vec<u8>, RenderError> {
    let bytes = fs::read(template).map_err(|e| RenderError::TemplateUnreadable {
        path: template.to_path_buf(),
        source: e,
    })?;
    render_invoice_bytes(&bytes, record, map)
}

/// Draws the record's fields over page 1 of `template` and returns a
/// single-page PDF. The whole render happens in memory, so a failure never
/// leaves output behind.
pub fn render_invoice_bytes(
    template: &[u8],
    record: &PropertyRecord,
    map: &CoordinateMap,
) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::load_mem(template)?;
    let pages = doc.get_pages();
    let (&first_page, &page_id) = pages.iter().next().ok_or(RenderError::EmptyTemplate)?;

    let page_box = media_box(&doc, page_id).unwrap_or(LETTER);
    let runs = plan_overlay(record, map);
    let off_page = runs.iter().filter(|r| !page_box.contains(r)).count();
    if off_page > 0 {
        tracing::warn!(off_page, "overlay text falls outside the template page");
    }

    let font_key = install_overlay_font(&mut doc, page_id)?;
    let overlay = overlay_stream(&runs, &font_key, map.font_size)?;
    merge_onto_page(&mut doc, page_id, overlay)?;

    let extra_pages: Vec<u32> = pages.keys().copied().filter(|&n| n != first_page).collect();
    if !extra_pages.is_empty() {
        doc.delete_pages(&extra_pages);
    }

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(out)
}

/// Writes the finished invoice through a `.part` file renamed into place,
/// removing the part file if anything fails.
pub fn write_invoice(path: &Path, bytes: &[u8]) -> Result<(), RenderError> {
    let part = part_path(path);
    let result = fs::write(&part, bytes).and_then(|()| fs::rename(&part, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&part);
        return Err(RenderError::Write {
            path: path.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}

/// `Invoice <n>.pdf`
pub fn invoice_file_name(number: u64) -> String {
    format!("Invoice {number}.pdf")
}

fn part_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Looks `key` up on the page, then up its `Parent` chain.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        if let Ok(obj) = node.get(key) {
            return resolve(doc, obj);
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

pub(crate) fn media_box(doc: &Document, page_id: ObjectId) -> Option<PageBox> {
    let values = inherited(doc, page_id, b"MediaBox")?.as_array().ok()?;
    let nums: Vec<f32> = values
        .iter()
        .filter_map(|v| resolve(doc, v).and_then(number))
        .collect();
    match nums[..] {
        [x0, y0, x1, y1] => Some(PageBox {
            left: x0.min(x1),
            bottom: y0.min(y1),
            right: x0.max(x1),
            top: y0.max(y1),
        }),
        _ => None,
    }
}

/// Adds a Type1 Helvetica font to the page's own resource dictionary and
/// returns the resource name it was registered under.
fn install_overlay_font(doc: &mut Document, page_id: ObjectId) -> Result<Vec<u8>, RenderError> {
    let mut resources = inherited(doc, page_id, b"Resources")
        .and_then(|o| o.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);
    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|o| resolve(doc, o))
        .and_then(|o| o.as_dict().ok())
        .cloned()
        .unwrap_or_else(Dictionary::new);

    let mut key = b"GenInvF1".to_vec();
    let mut n = 1;
    while fonts.has(&key) {
        n += 1;
        key = format!("GenInvF{n}").into_bytes();
    }

    let mut font = Dictionary::new();
    font.set("Type", Object::Name(b"Font".to_vec()));
    font.set("Subtype", Object::Name(b"Type1".to_vec()));
    font.set("BaseFont", Object::Name(OVERLAY_FONT.as_bytes().to_vec()));
    font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
    let font_id = doc.add_object(font);

    fonts.set(key.clone(), Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));
    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", Object::Dictionary(resources));
    Ok(key)
}

fn real(v: f32) -> Object {
    Object::Real(v.into())
}

fn overlay_stream(runs: &[TextRun], font_key: &[u8], font_size: f32) -> Result<Stream, RenderError> {
    let mut operations = vec![
        Operation::new("q", vec![]),
        Operation::new("g", vec![Object::Integer(0)]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![Object::Name(font_key.to_vec()), real(font_size)]),
    ];

    for run in runs {
        operations.push(Operation::new(
            "Tm",
            vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                real(run.x),
                real(run.y),
            ],
        ));
        operations.push(Operation::new(
            "Tj",
            vec![Object::string_literal(encode_win_ansi(&run.text))],
        ));
    }
    operations.push(Operation::new("ET", vec![]));
    operations.push(Operation::new("Q", vec![]));

    let bytes = Content { operations }
        .encode()
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    Ok(Stream::new(Dictionary::new(), bytes))
}

/// Appends the overlay after the page's own content. The template content
/// is isolated in `q … Q` so its graphics state cannot leak.
fn merge_onto_page(doc: &mut Document, page_id: ObjectId, overlay: Stream) -> Result<(), RenderError> {
    let existing: Vec<Object> = {
        let page = doc.get_dictionary(page_id)?;
        match page.get(b"Contents") {
            Ok(Object::Reference(id)) => match doc.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        }
    };

    let mut contents = Vec::with_capacity(existing.len() + 3);
    if !existing.is_empty() {
        let save = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let restore = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));
        contents.push(Object::Reference(save));
        contents.extend(existing);
        contents.push(Object::Reference(restore));
    }
    contents.push(Object::Reference(doc.add_object(overlay)));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Maps text onto WinAnsiEncoding for the standard font. Characters outside
/// it become `?`.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '„' => 0x84,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            _ => b'?',
        })
        .collect()
}
