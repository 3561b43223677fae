use lazy_static::lazy_static;
use resvg::render;
use std::panic;
use std::sync::{Arc, Mutex};
use usvg::fontdb::Database;

use crate::error::StrataRenderError;

lazy_static! {
    pub static ref FONT_DB: Mutex<Database> = Mutex::new(init_font_db());
}

fn init_font_db() -> Database {
    let mut font_database = Database::new();
    font_database.load_system_fonts();
    font_database
}

/// Rasterize an SVG document, `scale` pixels per figure unit
pub fn svg_to_png(svg: &str, scale: f32) -> Result<Vec<u8>, StrataRenderError> {
    let font_database = FONT_DB
        .lock()
        .map_err(|err| StrataRenderError::InternalError(format!("font database lock: {err}")))?
        .clone();

    // catch_unwind so a panic inside usvg/resvg surfaces as an error
    let response = panic::catch_unwind(panic::AssertUnwindSafe(move || {
        let xml_opt = usvg::roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let opts = usvg::Options {
            fontdb: Arc::new(font_database),
            ..Default::default()
        };
        let doc = usvg::roxmltree::Document::parse_with_options(svg, xml_opt)?;
        let rtree = usvg::Tree::from_xmltree(&doc, &opts)?;

        let width = (rtree.size().width() * scale).round();
        let height = (rtree.size().height() * scale).round();
        let mut pixmap = tiny_skia::Pixmap::new(width as u32, height as u32)
            .ok_or(StrataRenderError::InvalidSize { width, height })?;
        pixmap.fill(tiny_skia::Color::WHITE);

        let transform = tiny_skia::Transform::from_scale(scale, scale);
        render(&rtree, transform, &mut pixmap.as_mut());
        pixmap
            .encode_png()
            .map_err(|err| StrataRenderError::InternalError(err.to_string()))
    }));
    match response {
        Ok(result) => result,
        Err(_) => Err(StrataRenderError::InternalError(
            "rasterizer panicked".to_string(),
        )),
    }
}
