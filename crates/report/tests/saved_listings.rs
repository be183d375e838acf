use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::{Value, json};

use hmis_core::{Clock, FixedClock, Page};
use hmis_pharmacy::{DrugBatch, InventoryDrug, InventoryFilter};
use hmis_report::{ExpiryReport, OutputFormat, Render, StockReport, read_listing};

fn now() -> DateTime<Utc> {
    FixedClock::at_date(2024, 3, 1).unwrap().now()
}

fn save(name: &str, body: &Value) -> PathBuf {
    let path = std::env::temp_dir().join(format!("hmis-report-{}-{name}.json", std::process::id()));
    std::fs::write(&path, body.to_string()).unwrap();
    path
}

#[test]
fn expiring_page_response_renders_as_json() {
    let path = save(
        "expiring",
        &json!({
            "component": "Pharmacy/Inventory/Expiring",
            "url": "/pharmacy/inventory/expiring",
            "version": "abc",
            "props": {
                "batches": {
                    "data": [
                        { "id": 7, "drug": { "id": 3, "name": "Insulin Glargine" }, "batch_number": "IG-07",
                          "expiry_date": "2024-02-20", "quantity_remaining": 5, "selling_price_per_unit": "12.00" },
                        { "id": 8, "drug": { "id": 4, "name": "Ferrous Sulphate" }, "batch_number": "FS-22",
                          "expiry_date": "2024-03-25", "quantity_remaining": 100, "selling_price_per_unit": "0.25" }
                    ],
                    "links": { "first": null, "last": null, "prev": null, "next": null },
                    "meta": { "current_page": 1, "last_page": 1, "per_page": 15, "total": 2 }
                }
            }
        }),
    );

    let batches: Page<DrugBatch> = read_listing(&path, "batches").unwrap();
    std::fs::remove_file(&path).ok();

    let report = ExpiryReport::build(&batches, now());
    let rendered: Value = serde_json::from_str(&report.render(OutputFormat::Json).unwrap()).unwrap();

    assert_eq!(rendered["summary"]["total"], 2);
    assert_eq!(rendered["summary"]["expired"], 1);
    assert_eq!(rendered["summary"]["monitor"], 1);
    assert_eq!(rendered["summary"]["value_at_risk"], 85.0);
    assert_eq!(rendered["rows"][0]["relative"], "10 days ago");
    assert_eq!(rendered["rows"][0]["priority"], "urgent");
    assert_eq!(rendered["rows"][1]["relative"], "24 days");
    assert_eq!(rendered["rows"][1]["status"], "Expiring");
    assert_eq!(
        rendered["alert"],
        "2 batches are approaching expiry. 1 has already expired."
    );
}

#[test]
fn low_stock_text_lists_every_flagged_drug() {
    let path = save(
        "low-stock",
        &json!({
            "drugs": [
                { "id": 1, "name": "Artemether/Lumefantrine", "category": "Antimalarial",
                  "total_stock": 0, "minimum_stock_level": 50, "is_low_stock": true },
                { "id": 2, "name": "ORS Sachets", "category": "Rehydration",
                  "total_stock": 30, "minimum_stock_level": 40, "is_low_stock": true, "unit_price": 0.5 }
            ]
        }),
    );

    let drugs: Page<InventoryDrug> = read_listing(&path, "drugs").unwrap();
    std::fs::remove_file(&path).ok();

    let report = StockReport::build("Low stock", &drugs.data, &InventoryFilter::default(), now());
    let text = report.render(OutputFormat::Text).unwrap();

    assert_eq!(report.summary.out_of_stock, 1);
    assert_eq!(report.summary.low_stock, 2);
    assert_eq!(report.summary.critical, 0);
    assert!(text.starts_with("Low stock as of 2024-03-01\n"));
    assert!(text.contains("Out of Stock"));
    assert!(text.contains("ORS Sachets"));
}

#[test]
fn unreadable_file_names_the_path() {
    let path = std::env::temp_dir().join("hmis-report-does-not-exist.json");
    let err = read_listing::<InventoryDrug>(&path, "drugs").unwrap_err();
    assert!(err.to_string().contains("hmis-report-does-not-exist.json"));
}
