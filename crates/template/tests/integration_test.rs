//! Integration tests for certificate rendering
//!
//! Everything renders with the bundled DejaVu Sans, so results do not depend
//! on the fonts installed on the machine.

use image::{Rgb as Pixel, RgbImage};
use lopdf::Document;
use pretty_assertions::assert_eq;
use std::path::{Path, PathBuf};
use template::{
    parse_fields, run_batch, Align, BatchJob, Dataset, Design, FontCache, OutputFormat, Project,
    Renderer, Row, TemplateError, TextField,
};

fn white_template(dir: &Path, width: u32, height: u32) -> PathBuf {
    let path = dir.join("template.png");
    RgbImage::from_pixel(width, height, Pixel([255, 255, 255]))
        .save(&path)
        .unwrap();
    path
}

fn row(pairs: &[(&str, &str)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn name_field() -> TextField {
    TextField::new("Name", 50.0, 180.0)
        .with_size(40)
        .with_color("#112233")
        .with_align(Align::Center)
        .with_box_width(700.0)
}

/// Bounding box (min_x, min_y, max_x, max_y) of pixels darker than mid grey
fn ink_bounds(image: &RgbImage) -> Option<(u32, u32, u32, u32)> {
    image
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0.iter().any(|&c| c < 128))
        .fold(None, |acc, (x, y, _)| {
            Some(match acc {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            })
        })
}

fn page_content(bytes: &[u8]) -> String {
    let doc = Document::load_mem(bytes).unwrap();
    let page_id = *doc.get_pages().get(&1).unwrap();
    String::from_utf8_lossy(&doc.get_page_content(page_id).unwrap()).into_owned()
}

#[test]
fn test_centered_name_png() {
    let dir = tempfile::tempdir().unwrap();
    let template = white_template(dir.path(), 800, 400);

    let image = Renderer::new()
        .render_to_image(&template, &[name_field()], &row(&[("Name", "Jane Doe")]))
        .unwrap();

    let (x0, y0, x1, y1) = ink_bounds(&image).unwrap();
    assert!(x0 >= 50 && x1 <= 750, "ink spans {x0}..{x1}");
    assert!(y0 >= 180, "ink starts at row {y0}");
    assert!(y1 < 180 + 60);

    // Centered up to the first glyph's side bearing
    let middle = (x0 + x1) as f64 / 2.0;
    assert!((middle - 400.0).abs() <= 6.0, "middle at {middle}");
}

#[test]
fn test_centered_name_pdf() {
    let dir = tempfile::tempdir().unwrap();
    let template = white_template(dir.path(), 800, 400);

    let bytes = Renderer::new()
        .render_to_pdf(&template, &[name_field()], &row(&[("Name", "Jane Doe")]))
        .unwrap();
    let content = page_content(&bytes);

    // 400 - (180 + 40 * 0.8)
    let td = content.lines().find(|l| l.ends_with(" Td")).unwrap();
    let parts: Vec<f64> = td
        .split_whitespace()
        .take(2)
        .map(|v| v.parse().unwrap())
        .collect();
    assert_eq!(parts[1], 188.0);
    assert!(parts[0] > 50.0 && parts[0] < 400.0);
    assert!(content.contains("/F1 40 Tf"));
    assert!(content.contains("/Im1 Do"));
}

#[test]
fn test_png_and_pdf_share_placement() {
    let dir = tempfile::tempdir().unwrap();
    let template = white_template(dir.path(), 800, 400);
    let data = row(&[("Name", "Hello")]);
    let mut renderer = Renderer::new();

    let image = renderer
        .render_to_image(&template, &[name_field()], &data)
        .unwrap();
    let bytes = renderer
        .render_to_pdf(&template, &[name_field()], &data)
        .unwrap();

    let (x0, _, _, _) = ink_bounds(&image).unwrap();
    let content = page_content(&bytes);
    let td = content.lines().find(|l| l.ends_with(" Td")).unwrap();
    let pdf_x: f64 = td.split_whitespace().next().unwrap().parse().unwrap();

    // The pen starts a little left of the first inked pixel
    assert!(x0 as f64 >= pdf_x.floor() && (x0 as f64 - pdf_x) < 6.0);
}

#[test]
fn test_png_rendering_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let template = white_template(dir.path(), 400, 200);
    let fields = vec![
        name_field().with_box_width(300.0),
        TextField::new("Date", 10.0, 120.0)
            .with_size(18)
            .with_color("#1f4e79"),
    ];
    let data = row(&[("Name", "Grace Hopper"), ("Date", "1906-12-09")]);

    let first = Renderer::new()
        .render_to_image(&template, &fields, &data)
        .unwrap();
    let second = Renderer::new()
        .render_to_image(&template, &fields, &data)
        .unwrap();
    assert!(first == second);
}

#[test]
fn test_pdf_rendering_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let template = white_template(dir.path(), 300, 100);
    let data = row(&[("Name", "Ada")]);

    let first = Renderer::new()
        .render_to_pdf(&template, &[name_field()], &data)
        .unwrap();
    let second = Renderer::new()
        .render_to_pdf(&template, &[name_field()], &data)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_empty_value_draws_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let template = white_template(dir.path(), 200, 100);
    let fields = vec![TextField::new("Name", 10.0, 10.0), TextField::new("Date", 10.0, 50.0)];
    let data = row(&[("Name", ""), ("Date", "")]);
    let mut renderer = Renderer::new();

    let image = renderer.render_to_image(&template, &fields, &data).unwrap();
    assert_eq!(ink_bounds(&image), None);

    let content = page_content(&renderer.render_to_pdf(&template, &fields, &data).unwrap());
    assert!(!content.contains("BT"));
}

#[test]
fn test_empty_value_matches_field_left_out() {
    let dir = tempfile::tempdir().unwrap();
    let template = white_template(dir.path(), 200, 100);
    let name = TextField::new("Name", 10.0, 10.0);
    let with_empty = vec![name.clone(), TextField::new("Date", 10.0, 50.0)];
    let name_only = vec![name];
    let data = row(&[("Name", "Ada"), ("Date", "")]);
    let mut renderer = Renderer::new();

    let image = renderer.render_to_image(&template, &with_empty, &data).unwrap();
    assert!(ink_bounds(&image).is_some());
    assert_eq!(image, renderer.render_to_image(&template, &name_only, &data).unwrap());

    let pdf = renderer.render_to_pdf(&template, &with_empty, &data).unwrap();
    assert_eq!(pdf, renderer.render_to_pdf(&template, &name_only, &data).unwrap());
    assert_eq!(page_content(&pdf).matches("BT").count(), 1);
}

#[test]
fn test_malformed_color_renders_black() {
    let dir = tempfile::tempdir().unwrap();
    let template = white_template(dir.path(), 200, 80);
    let fields = vec![TextField::new("Name", 10.0, 10.0).with_color("not-a-color")];

    let image = Renderer::new()
        .render_to_image(&template, &fields, &row(&[("Name", "Ada")]))
        .unwrap();
    assert!(image.pixels().any(|p| p.0 == [0, 0, 0]));
    assert!(image
        .pixels()
        .all(|p| p.0[0] == p.0[1] && p.0[1] == p.0[2]));
}

#[test]
fn test_missing_font_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let template = white_template(dir.path(), 200, 80);
    let fields = vec![TextField::new("Name", 10.0, 10.0).with_font_path("/nowhere/Missing.ttf")];

    let mut renderer = Renderer::new();
    let image = renderer
        .render_to_image(&template, &fields, &row(&[("Name", "Ada")]))
        .unwrap();
    assert!(ink_bounds(&image).is_some());
    assert_eq!(renderer.fonts().len(), 1);
}

/// A minimal OpenType file with CFF outlines and no glyphs
fn cff_font(dir: &Path) -> PathBuf {
    let mut head = vec![0u8; 54];
    head[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    head[18..20].copy_from_slice(&1000u16.to_be_bytes());
    let mut hhea = vec![0u8; 36];
    hhea[0..4].copy_from_slice(&0x0001_0000u32.to_be_bytes());
    hhea[34..36].copy_from_slice(&1u16.to_be_bytes());
    let mut maxp = vec![0u8; 6];
    maxp[0..4].copy_from_slice(&0x0000_5000u32.to_be_bytes());
    maxp[4..6].copy_from_slice(&1u16.to_be_bytes());
    let tables: [(&[u8; 4], Vec<u8>); 4] =
        [(b"CFF ", vec![1, 0, 4, 1]), (b"head", head), (b"hhea", hhea), (b"maxp", maxp)];

    let mut font = b"OTTO".to_vec();
    font.extend_from_slice(&(tables.len() as u16).to_be_bytes());
    font.extend_from_slice(&[0; 6]);
    let mut offset = 12 + 16 * tables.len();
    for (tag, data) in &tables {
        font.extend_from_slice(*tag);
        font.extend_from_slice(&[0; 4]);
        font.extend_from_slice(&(offset as u32).to_be_bytes());
        font.extend_from_slice(&(data.len() as u32).to_be_bytes());
        offset += data.len();
    }
    for (_, data) in &tables {
        font.extend_from_slice(data);
    }

    let path = dir.join("Fake.otf");
    std::fs::write(&path, font).unwrap();
    path
}

#[test]
fn test_pdf_replaces_cff_font_with_bundled() {
    let dir = tempfile::tempdir().unwrap();
    let template = white_template(dir.path(), 300, 100);
    let font = cff_font(dir.path());
    let fields = vec![TextField::new("Name", 10.0, 10.0).with_font_path(font.to_string_lossy())];

    let mut renderer = Renderer::new();
    let bytes = renderer
        .render_to_pdf(&template, &fields, &row(&[("Name", "Ada")]))
        .unwrap();
    // The raster side still loads it
    assert!(!FontCache::new().get(&font.to_string_lossy()).is_bundled());

    let doc = Document::load_mem(&bytes).unwrap();
    let base_fonts: Vec<&[u8]> = doc
        .objects
        .values()
        .filter_map(|o| o.as_dict().ok())
        .filter(|d| d.get(b"Subtype").and_then(|s| s.as_name()).ok() == Some(b"Type0".as_slice()))
        .map(|d| d.get(b"BaseFont").unwrap().as_name().unwrap())
        .collect();
    assert_eq!(base_fonts, vec![b"DejaVuSans".as_slice()]);
    assert!(page_content(&bytes).contains("/F1 32 Tf"));
}

#[test]
fn test_pdf_embeds_each_font_once() {
    let dir = tempfile::tempdir().unwrap();
    let template = white_template(dir.path(), 400, 200);
    let fields = vec![
        TextField::new("Name", 10.0, 10.0),
        TextField::new("Course", 10.0, 60.0),
        TextField::new("Date", 10.0, 110.0),
    ];
    let data = row(&[("Name", "Ada"), ("Course", "Rust"), ("Date", "2024")]);

    let bytes = Renderer::new()
        .render_to_pdf(&template, &fields, &data)
        .unwrap();
    let doc = Document::load_mem(&bytes).unwrap();
    let page_id = *doc.get_pages().get(&1).unwrap();
    let (resources, _) = doc.get_page_resources(page_id);
    let fonts = resources
        .unwrap()
        .get(b"Font")
        .unwrap()
        .as_dict()
        .unwrap();
    assert_eq!(fonts.len(), 1);
    assert_eq!(page_content(&bytes).matches("/F1 32 Tf").count(), 3);
}

#[test]
fn test_unreadable_template() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"not an image").unwrap();

    let result = Renderer::new().render_to_image(&path, &[], &Row::new());
    match result {
        Err(TemplateError::TemplateLoad { path: failed, .. }) => assert_eq!(failed, path),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_batch_continues_after_failed_row() {
    let dir = tempfile::tempdir().unwrap();
    let template = white_template(dir.path(), 300, 100);
    let fields = parse_fields(r#"[{"name": "Name", "x": 10, "y": 10, "size": 20}]"#).unwrap();

    let csv = "Name\nAda Lovelace\nGrace Hopper\nLinus\n";
    let dataset = Dataset::from_csv_reader(csv.as_bytes(), vec!["Name".to_string()]).unwrap();

    let output_dir = dir.path().join("out");
    std::fs::create_dir_all(output_dir.join("row-2.pdf")).unwrap();

    let job = BatchJob {
        template,
        fields,
        rows: dataset.rows,
        output_dir: output_dir.clone(),
        format: OutputFormat::Pdf,
        pattern: "row-{index}".to_string(),
        fallback_field: "Name".to_string(),
    };
    let report = run_batch(&mut Renderer::new(), &job).unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 2);
    assert_eq!(
        report.written,
        vec![output_dir.join("row-1.pdf"), output_dir.join("row-3.pdf")]
    );
    for path in &report.written {
        let bytes = std::fs::read(path).unwrap();
        assert!(Document::load_mem(&bytes).is_ok());
    }
}

#[test]
fn test_batch_names_from_fallback_field() {
    let dir = tempfile::tempdir().unwrap();
    let template = white_template(dir.path(), 100, 50);

    let job = BatchJob {
        template,
        fields: vec![TextField::new("Name", 0.0, 0.0).with_size(10)],
        rows: vec![row(&[("Name", "Jane Doe")]), row(&[("Name", "")])],
        output_dir: dir.path().join("out"),
        format: OutputFormat::Png,
        pattern: String::new(),
        fallback_field: "Name".to_string(),
    };
    let report = run_batch(&mut Renderer::new(), &job).unwrap();

    assert_eq!(
        report.written,
        vec![job.output_dir.join("Jane_Doe.png"), job.output_dir.join("row_2.png")]
    );
}

#[test]
fn test_design_edits_flow_into_rendering() {
    let dir = tempfile::tempdir().unwrap();
    let template = white_template(dir.path(), 300, 100);

    let mut design = Design::default();
    let name = design.next_field_name();
    design.add_field(TextField::new(&name, 10.0, 10.0)).unwrap();
    design.dataset.rows[0].insert(name.clone(), "Ada".into());
    design.rename_field(&name, "Recipient").unwrap();

    let image = Renderer::new()
        .render_to_image(&template, &design.fields, &design.dataset.rows[0])
        .unwrap();
    assert!(ink_bounds(&image).is_some());
}

#[test]
fn test_project_drives_batch() {
    let dir = tempfile::tempdir().unwrap();
    white_template(dir.path(), 200, 80);
    std::fs::write(dir.path().join("names.csv"), "Name\nAda\nGrace\n").unwrap();
    let project_path = dir.path().join("job.json");
    std::fs::write(
        &project_path,
        r#"{
            "template": "template.png",
            "fields": [{"name": "Name", "x": 5, "y": 5, "size": 16}],
            "data": "names.csv",
            "format": "png",
            "filename_pattern": "{index:3}",
            "output_dir": "certs"
        }"#,
    )
    .unwrap();

    let project = Project::load(&project_path).unwrap();
    let columns = template::field_names(&project.fields);
    let dataset = Dataset::read_csv(project.data.as_ref().unwrap(), columns).unwrap();

    let job = BatchJob {
        template: project.template.clone(),
        fields: project.fields.clone(),
        rows: dataset.rows,
        output_dir: project.output_dir.clone(),
        format: project.format,
        pattern: project.filename_pattern.clone(),
        fallback_field: project.filename_field(),
    };
    let report = run_batch(&mut Renderer::new(), &job).unwrap();

    let certs = dir.path().join("certs");
    assert_eq!(report.written, vec![certs.join("001.png"), certs.join("002.png")]);
}
