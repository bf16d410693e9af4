//! Invoice PDF generation: field placement, template overlay and the
//! starter template.

pub mod layout;
pub mod renderer;
pub mod template;

pub use layout::{plan_overlay, CoordinateMap, LineItemLayout, TextRun};
pub use renderer::{invoice_file_name, render_invoice, render_invoice_bytes, write_invoice};
pub use template::blank_template;
