//! Reqwest-backed [`HireApi`] implementation.
//!
//! Error mapping is deliberately coarse: anything that stops the
//! request reaching the backend is [`ApiError::Transport`], a non-2xx
//! status is [`ApiError::Backend`] carrying whatever message the body
//! offers, and an unreadable 2xx body is [`ApiError::Decode`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use hiredesk_core::{
    AccessorySelection, ApiError, AppConfig, Contact, Customer, CustomerId, EquipmentLine,
    EquipmentSearchResults, HireApi, InteractionSubmission, SearchMode, Site, SubmissionReceipt,
};

use crate::schema::{
    convert_rows, receipt_from_envelope, AutoAccessoriesRequestDto, AutoAccessoryDto, ContactDto,
    CustomerDto, EquipmentTypeDto, EquipmentUnitDto, SiteDto, SubmitInteractionDto,
    SubmitResponseDto,
};

pub struct HttpHireApi {
    client: Client,
    base_url: String,
    auth_token: Option<SecretString>,
    result_limit: usize,
}

impl HttpHireApi {
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.api.timeout_secs))
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.api.base_url.trim_end_matches('/').to_string(),
            auth_token: config.api.auth_token.clone(),
            result_limit: config.search.result_limit,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, String)]) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        debug!(path, "hire desk api get");
        let request = self.authorize(self.client.get(self.endpoint(path)).query(query));
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Self::read_json(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        debug!(path, "hire desk api post");
        let request = self.authorize(self.client.post(self.endpoint(path)).json(body));
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Self::read_json(response).await
    }

    async fn read_json<T>(response: Response) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Backend {
                status: status.as_u16(),
                message: Self::read_error_message(response).await,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }

    async fn read_error_message(response: Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        extract_error_message(&body)
            .unwrap_or_else(|| format!("request failed with status {status}"))
    }

    /// Cheap reachability probe for the doctor command; any 2xx from
    /// the health endpoint counts.
    pub async fn health(&self) -> Result<(), ApiError> {
        let request = self.authorize(self.client.get(self.endpoint("/api/health")));
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::Backend {
                status: status.as_u16(),
                message: Self::read_error_message(response).await,
            })
        }
    }
}

fn mode_param(mode: SearchMode) -> &'static str {
    match mode {
        SearchMode::Generic => "generic",
        SearchMode::Specific => "specific",
    }
}

/// Pulls a human-readable message out of an error body. Accepts the
/// backend's `{"error": "..."}` shape and the older `{"message": ...}`
/// one; anything else falls through to a status-based message.
fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    for key in ["error", "message"] {
        if let Some(message) = value.get(key).and_then(|field| field.as_str()) {
            if !message.trim().is_empty() {
                return Some(message.to_string());
            }
        }
    }
    None
}

#[async_trait]
impl HireApi for HttpHireApi {
    async fn search_customers(&self, query: &str) -> Result<Vec<Customer>, ApiError> {
        let rows: Vec<CustomerDto> = self
            .get_json(
                "/api/customers",
                &[
                    ("q", query.to_string()),
                    ("limit", self.result_limit.to_string()),
                ],
            )
            .await?;
        convert_rows(rows)
    }

    async fn customer_contacts(&self, customer_id: CustomerId) -> Result<Vec<Contact>, ApiError> {
        let rows: Vec<ContactDto> = self
            .get_json(&format!("/api/customers/{}/contacts", customer_id.0), &[])
            .await?;
        convert_rows(rows)
    }

    async fn customer_sites(&self, customer_id: CustomerId) -> Result<Vec<Site>, ApiError> {
        let rows: Vec<SiteDto> = self
            .get_json(&format!("/api/customers/{}/sites", customer_id.0), &[])
            .await?;
        convert_rows(rows)
    }

    async fn search_equipment(
        &self,
        mode: SearchMode,
        query: &str,
        hire_start: Option<NaiveDate>,
    ) -> Result<EquipmentSearchResults, ApiError> {
        let mut params = vec![
            ("mode", mode_param(mode).to_string()),
            ("q", query.to_string()),
            ("limit", self.result_limit.to_string()),
        ];
        if mode == SearchMode::Specific {
            if let Some(start) = hire_start {
                params.push(("hireStartDate", start.format("%Y-%m-%d").to_string()));
            }
        }

        match mode {
            SearchMode::Generic => {
                let rows: Vec<EquipmentTypeDto> = self.get_json("/api/equipment", &params).await?;
                Ok(EquipmentSearchResults::Types(convert_rows(rows)?))
            }
            SearchMode::Specific => {
                let rows: Vec<EquipmentUnitDto> = self.get_json("/api/equipment", &params).await?;
                Ok(EquipmentSearchResults::Units(convert_rows(rows)?))
            }
        }
    }

    async fn auto_accessories(
        &self,
        equipment: &[EquipmentLine],
    ) -> Result<Vec<AccessorySelection>, ApiError> {
        let rows: Vec<AutoAccessoryDto> = self
            .post_json(
                "/api/accessories/auto",
                &AutoAccessoriesRequestDto::new(equipment),
            )
            .await?;
        convert_rows(rows)
    }

    async fn submit_interaction(
        &self,
        submission: &InteractionSubmission,
    ) -> Result<SubmissionReceipt, ApiError> {
        let request = self.authorize(
            self.client
                .post(self.endpoint("/api/interactions"))
                .json(&SubmitInteractionDto::from(submission)),
        );
        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Backend {
                status: status.as_u16(),
                message: Self::read_error_message(response).await,
            });
        }

        let envelope = response
            .json::<SubmitResponseDto>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))?;
        receipt_from_envelope(status.as_u16(), envelope)
    }
}
