#![no_main]
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use teinte::{ThemePalette, Xlsx};

fuzz_target!(|data: &[u8]| {
    // theme documents are also fed in raw
    let _ = ThemePalette::from_xml(data);

    let mut workbook = match Xlsx::new(Cursor::new(data)) {
        Ok(workbook) => workbook,
        Err(_) => return,
    };
    let theme = workbook.theme_palette();
    for name in workbook.sheet_names() {
        let _ = workbook.row_colors(&name, theme.as_ref());
    }
});
