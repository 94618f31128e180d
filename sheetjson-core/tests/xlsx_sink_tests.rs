use sheetjson_core::{Error, FileType, JsonToExcelConverter, WriteOptions};
use std::io::{Cursor, Read, Write};
use zip::ZipArchive;

/// A 1x1 transparent PNG
const PIXEL_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

fn convert(document: &str, options: WriteOptions) -> anyhow::Result<Vec<u8>> {
    let mut output = Vec::new();
    JsonToExcelConverter::new(options).convert(document.as_bytes(), &mut output, FileType::Xlsx)?;
    Ok(output)
}

fn read_part(workbook: &[u8], name: &str) -> anyhow::Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(workbook))?;
    let mut part = archive.by_name(name)?;
    let mut content = String::new();
    part.read_to_string(&mut content)?;
    Ok(content)
}

fn has_part(workbook: &[u8], name: &str) -> anyhow::Result<bool> {
    let archive = ZipArchive::new(Cursor::new(workbook))?;
    Ok(archive.file_names().any(|n| n == name))
}

#[test]
fn test_merge_print_area_and_sheet_flags() -> anyhow::Result<()> {
    let workbook = convert(
        r#"{"sheets": [
            {"name": "First", "rows": [{"A": "x"}]},
            {"name": "Report", "color": "FF0000", "selected": true, "active": true,
             "printArea": "$A$1:$D$10",
             "rows": [
                {"A": {"value": "Total", "columns": 3}, "D": 42},
                {"A": 1, "B": 2}
             ]}
        ]}"#,
        WriteOptions::default(),
    )?;

    let workbook_xml = read_part(&workbook, "xl/workbook.xml")?;
    assert!(workbook_xml.contains(r#"name="First""#));
    assert!(workbook_xml.contains(r#"name="Report""#));
    assert!(workbook_xml.contains("_xlnm.Print_Area"));
    assert!(workbook_xml.contains("$A$1:$D$10"));

    let report = read_part(&workbook, "xl/worksheets/sheet2.xml")?;
    assert!(report.contains(r#"<mergeCell ref="A1:C1"/>"#));
    assert!(report.contains("tabColor"));
    assert!(report.contains("tabSelected=\"1\""));

    // The merged anchor keeps its value, the next column lands after the merge
    let mut excel: calamine::Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(workbook))?;
    let range = calamine::Reader::worksheet_range(&mut excel, "Report")?;
    assert_eq!(
        range.get_value((0, 0)),
        Some(&calamine::Data::String("Total".to_string()))
    );
    assert_eq!(range.get_value((0, 3)), Some(&calamine::Data::Float(42.0)));
    Ok(())
}

#[test]
fn test_images_are_embedded() -> anyhow::Result<()> {
    let mut image = tempfile::Builder::new().suffix(".png").tempfile()?;
    image.write_all(PIXEL_PNG)?;
    let url = format!("file://{}", image.path().display());

    let document = format!(
        r#"{{"sheets": [{{"name": "Pictures",
            "images": [{{"reference": "B2:D6", "url": "{}", "type": "png", "scale": 2}}],
            "rows": [{{"A": "logo below"}}]}}]}}"#,
        url
    );
    let workbook = convert(&document, WriteOptions::default())?;

    assert!(has_part(&workbook, "xl/media/image1.png")?);
    assert!(has_part(&workbook, "xl/drawings/drawing1.xml")?);
    Ok(())
}

#[test]
fn test_missing_image_fails_the_pass() {
    let err = JsonToExcelConverter::default()
        .convert(
            r#"{"sheets": [{"images": [{"reference": "A1", "url": "file:///no/such/image.png", "type": "png"}]}]}"#
                .as_bytes(),
            Vec::new(),
            FileType::Xlsx,
        )
        .unwrap_err();
    assert!(matches!(err, Error::ImageLoad { .. }));
}

#[test]
fn test_mismatched_image_type_fails_the_pass() -> anyhow::Result<()> {
    let mut image = tempfile::Builder::new().suffix(".jpg").tempfile()?;
    image.write_all(PIXEL_PNG)?;
    let document = format!(
        r#"{{"sheets": [{{"images": [{{"reference": "A1", "url": "file://{}", "type": "jpeg"}}]}}]}}"#,
        image.path().display()
    );

    let err = JsonToExcelConverter::default()
        .convert(document.as_bytes(), Vec::new(), FileType::Xlsx)
        .unwrap_err();
    assert!(matches!(err, Error::ImageLoad { ref reason, .. } if reason.contains("jpeg")));
    Ok(())
}

#[test]
fn test_nested_merges_keep_the_widest() -> anyhow::Result<()> {
    let workbook = convert(
        r#"{"sheets": [{"name": "Nested", "rows": [
            {"A": {"value": {"value": "x", "columns": 2}, "columns": 3}, "D": "after"},
            {"A": {"value": {"value": "y", "columns": 4}, "columns": 2}}
        ]}]}"#,
        WriteOptions::default(),
    )?;

    let sheet = read_part(&workbook, "xl/worksheets/sheet1.xml")?;
    assert!(sheet.contains(r#"<mergeCell ref="A1:C1"/>"#));
    assert!(sheet.contains(r#"<mergeCell ref="A2:D2"/>"#));
    assert!(!sheet.contains(r#"<mergeCell ref="A1:B1"/>"#));

    let mut excel: calamine::Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(workbook))?;
    let range = calamine::Reader::worksheet_range(&mut excel, "Nested")?;
    assert_eq!(range.get_value((0, 0)), Some(&calamine::Data::String("x".to_string())));
    assert_eq!(range.get_value((0, 3)), Some(&calamine::Data::String("after".to_string())));
    assert_eq!(range.get_value((1, 0)), Some(&calamine::Data::String("y".to_string())));
    Ok(())
}

#[test]
fn test_huge_font_height_is_capped() -> anyhow::Result<()> {
    let workbook = convert(
        r#"{"sheets": [{"rows": [{"A": {"value": "x", "fontHeight": 65535}}]}]}"#,
        WriteOptions::default(),
    )?;

    let sheet = read_part(&workbook, "xl/worksheets/sheet1.xml")?;
    assert!(sheet.contains(r#"ht="409""#));
    Ok(())
}

#[test]
fn test_styles_row_heights_and_widths() -> anyhow::Result<()> {
    let workbook = convert(
        r##"{"sheets": [{"name": "Styled", "rows": [
            {"A": {"value": "Title", "fontHeight": 20, "fontWeightBold": true, "fillColor": "#DDEEFF", "width": 40}},
            {"A": {"value": "body", "alignment": "center", "color": "FF336699"}}
        ]}]}"##,
        WriteOptions::default(),
    )?;

    let sheet = read_part(&workbook, "xl/worksheets/sheet1.xml")?;
    assert!(sheet.contains(r#"ht="26""#));
    assert!(sheet.contains("<cols>"));

    let styles = read_part(&workbook, "xl/styles.xml")?;
    assert!(styles.contains("<b/>"));
    assert!(styles.contains("FFDDEEFF"));
    assert!(styles.contains(r#"horizontal="center""#));
    Ok(())
}

#[test]
fn test_invalid_color_fails_the_pass() {
    let err = JsonToExcelConverter::default()
        .convert(
            r#"{"sheets": [{"rows": [{"A": {"value": 1, "color": "crimson"}}]}]}"#.as_bytes(),
            Vec::new(),
            FileType::Xlsx,
        )
        .unwrap_err();
    assert!(matches!(err, Error::InvalidColor(ref c) if c == "crimson"));
}

#[test]
fn test_autofit_and_streaming() -> anyhow::Result<()> {
    let document = r#"{"sheets": [{"name": "Wide", "rows": [
        {"A": "a rather long piece of text", "B": 1},
        {"A": "short", "B": 2},
        {"A": "tiny", "B": 3}
    ]}]}"#;

    for options in [
        WriteOptions { streaming: false, auto_size_columns: -1 },
        WriteOptions { streaming: false, auto_size_columns: 2 },
        WriteOptions { streaming: true, auto_size_columns: 0 },
    ] {
        let workbook = convert(document, options)?;
        let mut excel: calamine::Xlsx<_> = calamine::open_workbook_from_rs(Cursor::new(workbook.clone()))?;
        let range = calamine::Reader::worksheet_range(&mut excel, "Wide")?;
        assert_eq!(range.height(), 3);
        assert_eq!(range.get_value((2, 1)), Some(&calamine::Data::Float(3.0)));

        if options.auto_size_columns != 0 {
            assert!(read_part(&workbook, "xl/worksheets/sheet1.xml")?.contains("<cols>"));
        }
    }
    Ok(())
}

#[test]
fn test_xlsb_output_is_rejected() {
    let mut output = Vec::new();
    let err = JsonToExcelConverter::default()
        .convert(r#"{"sheets": []}"#.as_bytes(), &mut output, FileType::Xlsb)
        .unwrap_err();

    assert!(matches!(err, Error::UnsupportedOutput(FileType::Xlsb)));
    assert!(output.is_empty());
}

#[test]
fn test_failed_pass_writes_nothing() {
    let mut output = Vec::new();
    let result = JsonToExcelConverter::default().convert(
        r#"{"sheets": [{"rows": [{"A": 1}]}, {"rows": [{"A": {"value": 1, "alignment": "middle"}}]}]}"#
            .as_bytes(),
        &mut output,
        FileType::Xlsx,
    );

    assert!(matches!(result, Err(Error::UnsupportedAlignment(_))));
    assert!(output.is_empty());
}
