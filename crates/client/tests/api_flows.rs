//! Client flows against a canned local HTTP server.

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use hmis_billing::{ItemType, MappedItem, MappingStats};
use hmis_client::{
    AutoConfirm, ClientConfig, ClientError, HmisClient, ListQuery, Progress, UploadQueue,
    UploadStatus, Uploader,
};
use hmis_core::{DrugId, FixedClock, Clock, ImagingOrderId, MappingId, PrescriptionId};
use hmis_pharmacy::ExpirySummary;
use hmis_radiology::{ImagingOrder, OrderStatus, Priority, RadiologyReport, UploadCandidate, UploadRules};

#[derive(Debug)]
struct Recorded {
    request_line: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

async fn read_request(stream: &mut TcpStream) -> Recorded {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut chunk).await.unwrap();
        assert!(n > 0, "connection closed before headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let chunked = headers.iter().any(|(k, v)| {
        k.eq_ignore_ascii_case("transfer-encoding") && v.eq_ignore_ascii_case("chunked")
    });
    let length: usize = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or(0);

    let mut body = buf[head_end + 4..].to_vec();
    if chunked {
        while find(&body, b"0\r\n\r\n").is_none() {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed inside chunked body");
            body.extend_from_slice(&chunk[..n]);
        }
    } else {
        while body.len() < length {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed inside body");
            body.extend_from_slice(&chunk[..n]);
        }
    }

    Recorded {
        request_line,
        headers,
        body,
    }
}

/// Serve one canned `(status, json)` response per connection, in order.
async fn serve(responses: Vec<(u16, Value)>) -> (String, JoinHandle<Vec<Recorded>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut seen = Vec::new();
        for (status, body) in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            seen.push(read_request(&mut stream).await);

            let body = body.to_string();
            let reason = match status {
                200 => "OK",
                422 => "Unprocessable Content",
                _ => "Error",
            };
            let response = format!(
                "HTTP/1.1 {status} {reason}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();
        }
        seen
    });

    (base, handle)
}

fn client(base: &str) -> HmisClient {
    HmisClient::new(&ClientConfig::default().with_base_url(base)).unwrap()
}

fn inertia(component: &str, props: Value) -> Value {
    json!({ "component": component, "props": props, "url": "/", "version": null })
}

#[tokio::test]
async fn expiring_listing_is_fetched_and_summarized() {
    let page = inertia(
        "Pharmacy/Inventory/Expiring",
        json!({
            "batches": {
                "current_page": 1, "last_page": 3, "per_page": 2, "total": 6,
                "data": [
                    { "id": 1, "drug": { "id": 1, "name": "Amoxicillin" }, "batch_number": "A1",
                      "expiry_date": "2024-01-08", "quantity_remaining": 4, "selling_price_per_unit": "1.50" },
                    { "id": 2, "drug": { "id": 2, "name": "Ceftriaxone" }, "batch_number": "C9",
                      "expiry_date": "2024-01-12", "quantity_remaining": 10, "selling_price_per_unit": 3 }
                ]
            }
        }),
    );
    let (base, server) = serve(vec![(200, page)]).await;

    let batches = client(&base)
        .expiring_batches(&ListQuery::new().with_per_page(2))
        .await
        .unwrap();
    let recorded = server.await.unwrap();

    assert_eq!(
        recorded[0].request_line,
        "GET /pharmacy/inventory/expiring?per_page=2 HTTP/1.1"
    );
    assert_eq!(recorded[0].header("x-inertia"), Some("true"));
    assert_eq!(recorded[0].header("accept"), Some("application/json"));

    let now = FixedClock::at_date(2024, 1, 10).unwrap().now();
    let summary = ExpirySummary::from_page(&batches, now);
    assert!(batches.has_next_page());
    assert_eq!(summary.total, 6);
    assert_eq!(summary.expired, 1);
    assert_eq!(summary.expires_soon, 1);
    assert_eq!(summary.monitor, 4);
    assert_eq!(summary.value_at_risk, 36.0);
}

#[tokio::test]
async fn validation_errors_surface_and_leave_order_untouched() {
    let (base, server) = serve(vec![(
        422,
        json!({
            "message": "The result notes field must not exceed 5000 characters.",
            "errors": { "result_notes": ["The result notes field must not exceed 5000 characters."] }
        }),
    )])
    .await;

    let mut order = ImagingOrder::ordered(ImagingOrderId::new(31), Priority::Stat);
    let err = client(&base)
        .complete_order(&mut order, RadiologyReport::new("Long findings", "Impression"))
        .await
        .unwrap_err();
    let recorded = server.await.unwrap();

    assert_eq!(recorded[0].request_line, "PATCH /radiology/orders/31/complete HTTP/1.1");
    let sent: Value = serde_json::from_slice(&recorded[0].body).unwrap();
    assert_eq!(
        sent["result_notes"],
        "**FINDINGS:**\nLong findings\n\n**IMPRESSION:**\nImpression"
    );

    match err {
        ClientError::Validation(errors) => {
            assert_eq!(
                errors.first("result_notes"),
                Some("The result notes field must not exceed 5000 characters.")
            );
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(order.status(), OrderStatus::Ordered);
}

#[tokio::test]
async fn accepted_transition_is_applied_locally() {
    let (base, server) = serve(vec![(200, inertia("Radiology/Show", json!({})))]).await;

    let mut order = ImagingOrder::ordered(ImagingOrderId::new(8), Priority::Routine);
    client(&base).mark_in_progress(&mut order).await.unwrap();
    let recorded = server.await.unwrap();

    assert_eq!(recorded[0].request_line, "PATCH /radiology/orders/8/in-progress HTTP/1.1");
    assert_eq!(order.status(), OrderStatus::InProgress);
    assert!(order.can_upload_images());
}

#[tokio::test]
async fn declined_dispense_sends_nothing() {
    // No server: a request would fail with a network error.
    let client = client("http://127.0.0.1:9");
    let err = client
        .dispense(PrescriptionId::new(4), &AutoConfirm(false))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotConfirmed));
}

#[tokio::test]
async fn confirmed_dispense_posts_to_prescription() {
    let (base, server) = serve(vec![(200, inertia("Pharmacy/Dispensing/Dispense", json!({})))]).await;
    client(&base)
        .dispense(PrescriptionId::new(4), &AutoConfirm(true))
        .await
        .unwrap();
    let recorded = server.await.unwrap();
    assert_eq!(recorded[0].request_line, "POST /pharmacy/prescriptions/4/dispense HTTP/1.1");
}

#[tokio::test]
async fn upload_queue_reports_server_rejections_per_file() {
    let (base, server) = serve(vec![
        (200, json!({ "id": 1 })),
        (422, json!({ "message": "", "errors": { "file": ["The file failed to upload."] } })),
    ])
    .await;
    let client = client(&base);

    let mut queue = UploadQueue::new(UploadRules::default());
    let ok = queue.add(UploadCandidate::new("pa.jpg", "image/jpeg", 4), vec![1u8, 2, 3, 4]);
    let rejected = queue.add(UploadCandidate::new("lat.png", "image/png", 4), vec![5u8, 6, 7, 8]);

    let report = queue
        .upload_all(&client.attachment_uploader(ImagingOrderId::new(12)))
        .await;
    let recorded = server.await.unwrap();

    assert_eq!(report.uploaded, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(
        recorded[0].request_line,
        "POST /radiology/orders/12/attachments HTTP/1.1"
    );
    assert!(
        recorded[0]
            .header("content-type")
            .is_some_and(|v| v.starts_with("multipart/form-data"))
    );
    assert_eq!(queue.get(ok).unwrap().status, UploadStatus::Success);
    let failed = queue.get(rejected).unwrap();
    assert_eq!(failed.status, UploadStatus::Error);
    assert_eq!(failed.error.as_deref(), Some("The file failed to upload."));
}

#[tokio::test]
async fn upload_progress_follows_sent_bytes() {
    let (base, server) = serve(vec![(200, json!({ "id": 2 }))]).await;
    let client = client(&base);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let progress = {
        let seen = Arc::clone(&seen);
        Progress::with_listener(move |p| seen.lock().unwrap().push(p))
    };

    // Four chunks: three full ones and a 8 KiB tail.
    let contents = vec![7u8; 200 * 1024];
    let file = UploadCandidate::new("ct-head.png", "image/png", contents.len() as u64);
    client
        .attachment_uploader(ImagingOrderId::new(3))
        .upload(&file, &contents, &progress)
        .await
        .unwrap();
    let recorded = server.await.unwrap();

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.first(), Some(&0));
    assert_eq!(seen.last(), Some(&100));
    for step in [32, 64, 96] {
        assert!(seen.contains(&step), "missing {step}% in {seen:?}");
    }
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{seen:?}");
    assert!(find(&recorded[0].body, b"filename=\"ct-head.png\"").is_some());
    assert!(recorded[0].body.len() > contents.len());
}

#[tokio::test]
async fn mappings_are_filtered_by_item_type() {
    let page = inertia(
        "Admin/NhisMappings/Index",
        json!({
            "mappings": {
                "data": [
                    { "id": 11, "item_type": "drug", "item_id": 4, "item_code": "PARA500",
                      "nhis_tariff_id": 70, "item_type_label": "Drug",
                      "nhis_tariff": { "id": 70, "nhis_code": "PARACETTA1", "name": "Paracetamol Tablet, 500 mg",
                                       "category": "Medicines", "price": 0.3 },
                      "created_at": "2024-01-05T08:00:00.000000Z" },
                    { "id": 12, "item_type": "drug", "item_id": 5, "item_code": "AMOX250",
                      "nhis_tariff_id": 71, "item_type_label": "Drug", "nhis_tariff": null,
                      "created_at": null }
                ],
                "links": { "first": null, "last": null, "prev": null, "next": null },
                "meta": { "current_page": 1, "last_page": 2, "per_page": 2, "total": 3 }
            },
            "filters": { "search": null, "item_type": "drug" },
            "itemTypes": ["drug", "lab_service", "procedure", "consumable"]
        }),
    );
    let (base, server) = serve(vec![(200, page)]).await;

    let mappings = client(&base)
        .nhis_mappings(&ListQuery::new().with_item_type(Some(ItemType::Drug.as_str())))
        .await
        .unwrap();
    let recorded = server.await.unwrap();

    assert_eq!(
        recorded[0].request_line,
        "GET /admin/nhis-mappings?item_type=drug HTTP/1.1"
    );
    assert_eq!(mappings.data[0].item, MappedItem::Drug { item_id: DrugId::new(4) });
    assert!(mappings.data[1].nhis_tariff.is_none());

    let stats = MappingStats::from_page(&mappings);
    assert_eq!(stats.total, 3);
    assert_eq!(stats.drugs, 2);
}

#[tokio::test]
async fn declined_mapping_delete_sends_nothing() {
    let client = client("http://127.0.0.1:9");
    let err = client
        .delete_mapping(MappingId::new(11), &AutoConfirm(false))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::NotConfirmed));
}

#[tokio::test]
async fn confirmed_mapping_delete_is_sent() {
    let (base, server) = serve(vec![(200, inertia("Admin/NhisMappings/Index", json!({})))]).await;
    client(&base)
        .delete_mapping(MappingId::new(11), &AutoConfirm(true))
        .await
        .unwrap();
    let recorded = server.await.unwrap();
    assert_eq!(recorded[0].request_line, "DELETE /admin/nhis-mappings/11 HTTP/1.1");
}
