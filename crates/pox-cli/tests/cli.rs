use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use predicates::prelude::*;
use tempfile::TempDir;

/// Writes a text-layer PDF with one page per entry.
fn write_pdf(path: &Path, pages: &[&[&str]]) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![50.into(), 780.into()]),
        ];
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("Td", vec![0.into(), (-20).into()]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        }
        operations.push(Operation::new("ET", vec![]));
        let content = Content { operations }.encode().unwrap();

        let content_id = doc.add_object(Stream::new(dictionary! {}, content));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => font_id },
            },
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
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}

fn write_two_po_pdf(path: &Path) {
    write_pdf(
        path,
        &[
            &[
                "Purchase Order",
                "PO Number: PO-100",
                "Vendor: Acme",
                "1. Widget - Qty: 3 - Unit Price: Rs. 10.00",
            ],
            &[
                "Purchase Order",
                "PO Number: PO-200",
                "Vendor: Globex",
                "Bolt 50 2.50",
            ],
        ],
    );
}

/// A workspace with an empty config file, so the user's own config never leaks in.
fn workspace() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, "{}").unwrap();
    (dir, config)
}

fn pox(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pox").unwrap();
    cmd.arg("--config").arg(config).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_process_writes_csv_artifacts_and_bundle() {
    let (dir, config) = workspace();
    let input = dir.path().join("orders.pdf");
    write_two_po_pdf(&input);
    let out = dir.path().join("out");

    pox(&config)
        .args(["process", "--format", "csv", "--bundle", "--no-ocr", "-q"])
        .arg(&input)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("All_PO_Main_Fields.csv"));

    let fields = fs::read_to_string(out.join("All_PO_Main_Fields.csv")).unwrap();
    let mut lines = fields.lines();
    assert_eq!(lines.next(), Some("PO_Number,Vendor,Address,Date,Total_Amount"));
    assert!(lines.next().unwrap().starts_with("PO-100,Acme,"));
    assert!(lines.next().unwrap().starts_with("PO-200,Globex,"));

    let items = fs::read_to_string(out.join("All_PO_Line_Items.csv")).unwrap();
    assert!(items.contains("Widget,3,10.00,30.00,PO-100"));
    assert!(items.contains("Bolt,50,2.50,125.00,PO-200"));

    let structured = fs::read_to_string(out.join("All_PO_Structured_Data.json")).unwrap();
    assert!(structured.contains("PO-200"));

    let annotated = Document::load(out.join("Annotated_PO.pdf")).unwrap();
    assert_eq!(annotated.get_pages().len(), 2);

    let bundle = fs::File::open(out.join("PO_Extraction_Outputs.zip")).unwrap();
    let archive = zip::ZipArchive::new(bundle).unwrap();
    assert_eq!(archive.len(), 4);
}

#[test]
fn test_process_prints_tables() {
    let (dir, config) = workspace();
    let input = dir.path().join("orders.pdf");
    write_two_po_pdf(&input);

    pox(&config)
        .args(["process", "--no-ocr"])
        .arg(&input)
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("2 POs, 2 line items"))
        .stdout(predicate::str::contains("Globex"))
        .stdout(predicate::str::contains("All_PO_Main_Fields.xlsx"));
}

#[test]
fn test_process_missing_file() {
    let (dir, config) = workspace();

    pox(&config)
        .arg("process")
        .arg(dir.path().join("nope.pdf"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_process_rejects_non_pdf() {
    let (dir, config) = workspace();
    let input = dir.path().join("orders.txt");
    fs::write(&input, "Purchase Order").unwrap();

    pox(&config)
        .arg("process")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported file format: txt"));
}

#[test]
fn test_text_prints_blocks() {
    let (dir, config) = workspace();
    let input = dir.path().join("orders.pdf");
    write_two_po_pdf(&input);

    pox(&config)
        .args(["text", "--blocks", "--no-ocr"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("--- Block 1 ---"))
        .stdout(predicate::str::contains("--- Block 2 ---"))
        .stdout(predicate::str::contains("PO-200"))
        .stderr(predicate::str::contains("text from text_layer"));
}

#[test]
fn test_batch_writes_summary() {
    let (dir, config) = workspace();
    let inputs = dir.path().join("in");
    fs::create_dir_all(&inputs).unwrap();
    write_two_po_pdf(&inputs.join("a.pdf"));
    write_pdf(
        &inputs.join("b.pdf"),
        &[&["Purchase Order", "PO Number: PO-300"]],
    );
    fs::write(inputs.join("c.pdf"), b"not a pdf").unwrap();
    let out = dir.path().join("out");
    let pattern = format!("{}/*.pdf", inputs.display());

    pox(&config)
        .args(["batch", "--format", "csv", "--summary", "--continue-on-error", "--no-ocr"])
        .arg(&pattern)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Processed 3 files"));

    assert!(out.join("a").join("All_PO_Main_Fields.csv").exists());
    assert!(out.join("b").join("Annotated_PO.pdf").exists());

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    let rows: Vec<&str> = summary.lines().collect();
    assert_eq!(rows[0], "file,output,status,source,blocks,items,processing_time_ms,error");
    assert!(rows[1].starts_with("a.pdf,a,success,text_layer,2,2,"));
    assert!(rows[2].starts_with("b.pdf,b,success,text_layer,1,0,"));
    // An unreadable PDF still yields placeholder artifacts.
    assert!(rows[3].starts_with("c.pdf,c,success,unavailable,1,0,"));
}

#[test]
fn test_batch_keeps_files_with_the_same_name_apart() {
    let (dir, config) = workspace();
    let inputs = dir.path().join("in");
    for (region, number) in [("north", "PO-N1"), ("south", "PO-S2")] {
        let region_dir = inputs.join(region);
        fs::create_dir_all(&region_dir).unwrap();
        let po_line = format!("PO Number: {}", number);
        write_pdf(&region_dir.join("po.pdf"), &[&["Purchase Order", po_line.as_str()]]);
    }
    let out = dir.path().join("out");
    let pattern = format!("{}/*/po.pdf", inputs.display());

    pox(&config)
        .args(["batch", "--format", "csv", "--summary", "--no-ocr"])
        .arg(&pattern)
        .arg("--output-dir")
        .arg(&out)
        .assert()
        .success();

    let north = fs::read_to_string(out.join("po").join("All_PO_Main_Fields.csv")).unwrap();
    let south = fs::read_to_string(out.join("po-2").join("All_PO_Main_Fields.csv")).unwrap();
    assert!(north.contains("PO-N1"));
    assert!(south.contains("PO-S2"));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    let rows: Vec<&str> = summary.lines().collect();
    assert!(rows[1].starts_with("po.pdf,po,success,"));
    assert!(rows[2].starts_with("po.pdf,po-2,success,"));
}

#[test]
fn test_batch_no_matches() {
    let (dir, config) = workspace();
    let pattern = format!("{}/*.pdf", dir.path().display());

    pox(&config)
        .arg("batch")
        .arg(&pattern)
        .arg("--output-dir")
        .arg(dir.path().join("out"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files found"));
}

#[test]
fn test_config_init_set_get() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("nested").join("config.json");

    pox(&config)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(config.exists());

    pox(&config)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    pox(&config)
        .args(["config", "set", "segmentation.marker", "Order Form"])
        .assert()
        .success();

    pox(&config)
        .args(["config", "get", "segmentation.marker"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Order Form\""));

    pox(&config)
        .args(["config", "set", "output.table_format", "pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid value"));

    pox(&config)
        .args(["config", "get", "output.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}
