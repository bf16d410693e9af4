use printpdf::{BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point};

use crate::error::RenderError;

// Template coordinates are written in PDF points to line up with the
// coordinate map; printpdf takes millimeters.
const PT_TO_MM: f32 = 25.4 / 72.0;
const LETTER_W_PT: f32 = 612.0;
const LETTER_H_PT: f32 = 792.0;

fn mm(pt: f32) -> Mm {
    Mm(pt * PT_TO_MM)
}

fn push_line(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    text: &str,
    font_size: f32,
    x: f32,
    y: f32,
) {
    layer.use_text(text, font_size, mm(x), mm(y), font);
}

fn draw_rule_with_thickness(layer: &PdfLayerReference, x1: f32, x2: f32, y: f32, thickness: f32) {
    layer.set_outline_thickness(thickness);
    layer.add_line(Line {
        points: vec![
            (Point::new(mm(x1), mm(y)), false),
            (Point::new(mm(x2), mm(y)), false),
        ],
        is_closed: false,
    });
}

/// A one-page US-letter invoice form whose captions sit next to the default
/// coordinate map positions. Used when no `Invoice Master.pdf` exists yet.
pub fn blank_template() -> Result<Vec<u8>, RenderError> {
    let (doc, page1, layer1) = PdfDocument::new("Invoice", mm(LETTER_W_PT), mm(LETTER_H_PT), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);

    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| RenderError::Encode(e.to_string()))?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| RenderError::Encode(e.to_string()))?;

    const LEFT: f32 = 50.0;
    const RIGHT: f32 = LETTER_W_PT - 50.0;
    let label_size = 10.0;

    push_line(&layer, &font_bold, "INVOICE", 22.0, LEFT, 730.0);
    push_line(&layer, &font, "Date:", label_size, 300.0, 742.0);
    push_line(&layer, &font, "Invoice #:", label_size, 320.0, 725.0);
    push_line(&layer, &font, "Property:", label_size, 370.0, 710.0);
    draw_rule_with_thickness(&layer, LEFT, RIGHT, 685.0, 0.85);

    push_line(&layer, &font_bold, "FROM", 11.0, LEFT, 668.0);
    push_line(&layer, &font, "Company:", label_size, LEFT, 652.0);
    push_line(&layer, &font, "Email:", label_size, LEFT, 635.0);

    push_line(&layer, &font_bold, "BILL TO", 11.0, 310.0, 668.0);
    for (label, y) in [
        ("Name:", 652.0),
        ("Address:", 617.0),
        ("City/State:", 600.0),
        ("Zip:", 583.0),
        ("Phone:", 567.0),
        ("Email:", 549.0),
    ] {
        push_line(&layer, &font, label, label_size, 310.0, y);
    }

    push_line(&layer, &font_bold, "DESCRIPTION", label_size, 60.0, 500.0);
    push_line(&layer, &font_bold, "AMOUNT", label_size, 480.0, 500.0);
    draw_rule_with_thickness(&layer, LEFT, RIGHT, 495.0, 0.6);

    draw_rule_with_thickness(&layer, 390.0, RIGHT, 258.0, 0.6);
    for (label, y) in [
        ("Subtotal", 243.0),
        ("Discount", 219.0),
        ("Fees", 197.0),
        ("Tax", 174.0),
    ] {
        push_line(&layer, &font, label, label_size, 400.0, y);
    }
    push_line(&layer, &font_bold, "TOTAL", label_size, 400.0, 152.0);

    push_line(&layer, &font, "Phone:", label_size, LEFT, 205.0);

    let mut writer = std::io::BufWriter::new(Vec::<u8>::new());
    doc.save(&mut writer).map_err(|e| RenderError::Encode(e.to_string()))?;
    writer.into_inner().map_err(|e| RenderError::Encode(e.to_string()))
}
