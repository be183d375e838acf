//! HTTP access to the HMIS page endpoints.
//!
//! Reads are Inertia visits: a GET with `X-Inertia: true` answered by a JSON
//! page object whose props carry the listing. Actions are plain form
//! requests; a 422 answer carries field errors.

use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde_json::{Value, json};
use tokio_stream::StreamExt;

use hmis_billing::NhisMapping;
use hmis_core::{Aggregate, AttachmentId, ImagingOrderId, MappingId, Page, PrescriptionId};
use hmis_pharmacy::{DrugBatch, InventoryDrug};
use hmis_radiology::{
    CompleteOrder, ImagingOrder, ImagingOrderCommand, RadiologyReport, UploadCandidate,
};

use crate::config::ClientConfig;
use crate::debounce::Debouncer;
use crate::error::{ClientError, ClientResult, FormErrors};
use crate::inertia::{InertiaPage, InventoryView, Worklist};
use crate::query::ListQuery;
use crate::submit::{Confirm, require_confirmation};
use crate::upload_queue::{Progress, Uploader};

pub const INVENTORY_PATH: &str = "/pharmacy/inventory";
pub const LOW_STOCK_PATH: &str = "/pharmacy/inventory/low-stock";
pub const EXPIRING_PATH: &str = "/pharmacy/inventory/expiring";
pub const WORKLIST_PATH: &str = "/radiology";
pub const NHIS_MAPPINGS_PATH: &str = "/admin/nhis-mappings";

pub const DELETE_IMAGE_PROMPT: &str = "Are you sure you want to delete this image?";
pub const DISPENSE_PROMPT: &str = "Are you sure you want to dispense this medication?";
pub const DELETE_MAPPING_PROMPT: &str =
    "Are you sure you want to delete this mapping? This action cannot be undone.";

/// Attachment bodies are streamed in pieces of this size; progress is
/// reported after each one.
pub const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Client for the pharmacy, radiology and billing pages of one HMIS server.
#[derive(Debug, Clone)]
pub struct HmisClient {
    http: reqwest::Client,
    base_url: Url,
    per_page: Option<u32>,
    search_debounce: Duration,
}

impl HmisClient {
    /// The base URL may carry a path prefix (`https://host/hmis`); every
    /// page path is resolved below it.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let base = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = Url::parse(&base)
            .map_err(|e| ClientError::Parse(format!("invalid base URL {}: {e}", config.base_url)))?;

        let mut headers = HeaderMap::new();
        headers.insert("X-Inertia", HeaderValue::from_static("true"));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            per_page: config.per_page,
            search_debounce: config.search_debounce,
        })
    }

    /// Debouncer for search-as-you-type fields, using the configured window.
    pub fn search_debouncer(&self) -> Debouncer {
        Debouncer::new(self.search_debounce)
    }

    /// Absolute URL for `path` with the query's parameters; the configured
    /// page size applies when the query does not set one.
    pub fn url(&self, path: &str, query: &ListQuery) -> ClientResult<Url> {
        let mut url = self.endpoint(path)?;

        let mut query = query.clone();
        if query.per_page().is_none() {
            if let Some(n) = self.per_page {
                let page = query.page();
                query = query.with_per_page(n).with_page(page);
            }
        }

        let pairs = query.pairs();
        if !pairs.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(pairs.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    /// Inertia visit: GET `path` and return the page object.
    pub async fn visit(&self, path: &str, query: &ListQuery) -> ClientResult<InertiaPage> {
        let url = self.url(path, query)?;
        tracing::debug!(%url, "inertia visit");

        let resp = check(self.http.get(url).send().await?).await?;
        let page: InertiaPage = resp.json().await?;
        tracing::debug!(component = %page.component, "received page");
        Ok(page)
    }

    pub async fn inventory(&self, query: &ListQuery) -> ClientResult<InventoryView> {
        InventoryView::from_page(&self.visit(INVENTORY_PATH, query).await?)
    }

    pub async fn low_stock(&self) -> ClientResult<Page<InventoryDrug>> {
        self.visit(LOW_STOCK_PATH, &ListQuery::new()).await?.prop("drugs")
    }

    pub async fn expiring_batches(&self, query: &ListQuery) -> ClientResult<Page<DrugBatch>> {
        self.visit(EXPIRING_PATH, query).await?.prop("batches")
    }

    pub async fn radiology_worklist(&self, query: &ListQuery) -> ClientResult<Worklist> {
        Worklist::from_page(&self.visit(WORKLIST_PATH, query).await?)
    }

    /// Billing code mappings, filtered by `search` and `item_type`.
    pub async fn nhis_mappings(&self, query: &ListQuery) -> ClientResult<Page<NhisMapping>> {
        self.visit(NHIS_MAPPINGS_PATH, query).await?.prop("mappings")
    }

    pub async fn delete_mapping(&self, mapping: MappingId, confirm: &dyn Confirm) -> ClientResult<()> {
        require_confirmation(confirm, DELETE_MAPPING_PROMPT).await?;
        self.send(Method::DELETE, &format!("{NHIS_MAPPINGS_PATH}/{mapping}"), None)
            .await?;
        tracing::info!(mapping_id = %mapping, "billing mapping deleted");
        Ok(())
    }

    /// Start processing an ordered study. The transition is checked locally
    /// first and applied to `order` once the server accepts it.
    pub async fn mark_in_progress(&self, order: &mut ImagingOrder) -> ClientResult<()> {
        let events = order.handle(&ImagingOrderCommand::MarkInProgress)?;
        let path = format!("/radiology/orders/{}/in-progress", order.id_typed());

        self.send(Method::PATCH, &path, Some(json!({}))).await?;
        for event in &events {
            order.apply(event);
        }
        tracing::info!(order_id = %order.id_typed(), "imaging order in progress");
        Ok(())
    }

    /// Submit the report and complete the study.
    pub async fn complete_order(
        &self,
        order: &mut ImagingOrder,
        report: RadiologyReport,
    ) -> ClientResult<()> {
        let events = order.handle(&ImagingOrderCommand::Complete(CompleteOrder { report }))?;
        let path = format!("/radiology/orders/{}/complete", order.id_typed());

        let result_notes = events.iter().find_map(|e| match e {
            hmis_radiology::ImagingOrderEvent::Completed(c) => Some(c.result_notes.clone()),
            _ => None,
        });
        self.send(Method::PATCH, &path, Some(json!({ "result_notes": result_notes })))
            .await?;

        for event in &events {
            order.apply(event);
        }
        tracing::info!(order_id = %order.id_typed(), "imaging order completed");
        Ok(())
    }

    pub async fn delete_attachment(
        &self,
        attachment: AttachmentId,
        confirm: &dyn Confirm,
    ) -> ClientResult<()> {
        require_confirmation(confirm, DELETE_IMAGE_PROMPT).await?;
        self.send(Method::DELETE, &format!("/radiology/attachments/{attachment}"), None)
            .await?;
        tracing::info!(attachment_id = %attachment, "attachment deleted");
        Ok(())
    }

    pub async fn dispense(
        &self,
        prescription: PrescriptionId,
        confirm: &dyn Confirm,
    ) -> ClientResult<()> {
        require_confirmation(confirm, DISPENSE_PROMPT).await?;
        self.send(
            Method::POST,
            &format!("/pharmacy/prescriptions/{prescription}/dispense"),
            Some(json!({})),
        )
        .await?;
        tracing::info!(prescription_id = %prescription, "prescription dispensed");
        Ok(())
    }

    /// Multipart upload of one imaging attachment. `progress` follows the
    /// bytes handed to the connection.
    pub async fn upload_attachment(
        &self,
        order: ImagingOrderId,
        file: &UploadCandidate,
        contents: &[u8],
        progress: &Progress,
    ) -> ClientResult<()> {
        let body = progress_body(contents, progress);
        let part = reqwest::multipart::Part::stream_with_length(body, contents.len() as u64)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)
            .map_err(|e| ClientError::Parse(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("description", file.description.clone());

        let url = self.endpoint(&format!("/radiology/orders/{order}/attachments"))?;
        check(self.http.post(url).multipart(form).send().await?).await?;
        Ok(())
    }

    /// [`Uploader`] that attaches files to `order`.
    pub fn attachment_uploader(&self, order: ImagingOrderId) -> AttachmentUploader<'_> {
        AttachmentUploader { client: self, order }
    }

    fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Parse(format!("invalid path {path}: {e}")))
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> ClientResult<Response> {
        let url = self.endpoint(path)?;
        tracing::debug!(%method, %url, "sending action");

        let mut req: RequestBuilder = self.http.request(method, url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        check(req.send().await?).await
    }
}

fn progress_body(contents: &[u8], progress: &Progress) -> reqwest::Body {
    let total = contents.len() as u64;
    let progress = progress.clone();
    let chunks: Vec<Vec<u8>> = contents.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();

    let mut sent = 0u64;
    let stream = tokio_stream::iter(chunks).map(move |chunk| {
        sent += chunk.len() as u64;
        progress.report(sent, total);
        Ok::<_, std::io::Error>(chunk)
    });
    reqwest::Body::wrap_stream(stream)
}

/// Map non-success statuses to errors; 422 carries field errors.
async fn check(resp: Response) -> ClientResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        let errors: FormErrors = serde_json::from_str(&body)
            .map_err(|e| ClientError::Parse(format!("validation response: {e}")))?;
        tracing::info!(fields = ?errors.fields().collect::<Vec<_>>(), "validation failed");
        return Err(ClientError::Validation(errors));
    }

    tracing::warn!(status = status.as_u16(), "request failed");
    Err(ClientError::Api(status.as_u16(), body))
}

/// Uploads queue files as attachments of one imaging order.
pub struct AttachmentUploader<'a> {
    client: &'a HmisClient,
    order: ImagingOrderId,
}

#[async_trait::async_trait]
impl Uploader for AttachmentUploader<'_> {
    async fn upload(
        &self,
        file: &UploadCandidate,
        contents: &[u8],
        progress: &Progress,
    ) -> Result<(), String> {
        let size = contents.len() as u64;
        progress.report(0, size);

        match self
            .client
            .upload_attachment(self.order, file, contents, progress)
            .await
        {
            Ok(()) => {
                progress.report(size, size);
                Ok(())
            }
            Err(ClientError::Network(_)) => Err("Network error".to_string()),
            Err(ClientError::Validation(errors)) => Err(upload_error_message(&errors)),
            Err(ClientError::Api(_, body)) => Err(serde_json::from_str::<FormErrors>(&body)
                .map(|e| upload_error_message(&e))
                .unwrap_or_else(|_| "Upload failed".to_string())),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// `message`, else the first `file` error, else a generic failure.
fn upload_error_message(errors: &FormErrors) -> String {
    if !errors.message.is_empty() {
        return errors.message.clone();
    }
    errors
        .first("file")
        .map(str::to_string)
        .unwrap_or_else(|| "Upload failed".to_string())
}
