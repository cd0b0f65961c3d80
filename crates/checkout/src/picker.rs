//! Delivery-date picker state.
//!
//! Holds what the checkout extension renders: the available dates, the dates
//! the calendar must disable, the current selection and at most one error.
//! The chosen date is saved as the `deliveryDate` cart attribute, which the
//! backend later copies onto the order.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use dutchned_core::{DELIVERY_DATE_ATTRIBUTE, DeliveryDate};
use dutchned_core::calendar::{DisabledDates, disabled_delivery_dates};
use thiserror::Error;
use tracing::{info, warn};

use crate::error::QueryError;
use crate::query::{DeliveryDates, DeliveryDatesClient, QueryKey};

/// Errors shown by the picker. Each is cleared by its retry action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PickerError {
    /// Dates could not be fetched. Cleared by [`DatePicker::retry_loading`].
    #[error("Delivery dates could not be loaded")]
    LoadingFailed,
    /// Dates were fetched but not understood. Cleared by [`DatePicker::retry_loading`].
    #[error("Delivery dates were not in the expected format")]
    UnexpectedData,
    /// The selection could not be saved. Cleared by [`DatePicker::retry_save`].
    #[error("Delivery date could not be saved")]
    SaveFailed,
}

impl PickerError {
    /// Stable key for translations.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::LoadingFailed => "loading_failed",
            Self::UnexpectedData => "unexpected_data",
            Self::SaveFailed => "save_failed",
        }
    }

    const fn is_loading_error(self) -> bool {
        matches!(self, Self::LoadingFailed | Self::UnexpectedData)
    }
}

impl From<&QueryError> for PickerError {
    fn from(error: &QueryError) -> Self {
        match error {
            QueryError::Decode(_) => Self::UnexpectedData,
            QueryError::Http(_) | QueryError::Status { .. } | QueryError::Api { .. } => {
                Self::LoadingFailed
            }
        }
    }
}

/// Failure reported by an [`AttributeWriter`].
#[derive(Debug, Error)]
#[error("{0}")]
pub struct AttributeError(pub String);

/// Writes cart attributes through the host checkout.
#[async_trait]
pub trait AttributeWriter: Send + Sync {
    async fn set_attribute(&self, name: &str, value: &str) -> Result<(), AttributeError>;
}

/// Selection state of the delivery-date picker.
#[derive(Debug, Clone)]
pub struct DatePicker {
    dates: DeliveryDates,
    disabled: DisabledDates,
    selected: Option<NaiveDate>,
    error: Option<PickerError>,
    loading: bool,
}

impl Default for DatePicker {
    fn default() -> Self {
        Self::new()
    }
}

impl DatePicker {
    /// A picker waiting for its first load.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dates: Arc::from(Vec::<DeliveryDate>::new()),
            disabled: DisabledDates::default(),
            selected: None,
            error: None,
            loading: true,
        }
    }

    #[must_use]
    pub fn dates(&self) -> &[DeliveryDate] {
        &self.dates
    }

    #[must_use]
    pub const fn disabled(&self) -> &DisabledDates {
        &self.disabled
    }

    #[must_use]
    pub const fn selected(&self) -> Option<NaiveDate> {
        self.selected
    }

    #[must_use]
    pub const fn error(&self) -> Option<PickerError> {
        self.error
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether `date` is one of the available dates.
    #[must_use]
    pub fn is_selectable(&self, date: NaiveDate) -> bool {
        !self.disabled.contains(date) && self.dates.iter().any(|d| d.date == date)
    }

    /// Apply the outcome of a fetch.
    ///
    /// A selection that is no longer available is dropped together with its
    /// pending save error. A loading error never replaces a save error.
    pub fn apply(&mut self, result: Result<DeliveryDates, Arc<QueryError>>) {
        self.loading = false;
        match result {
            Ok(dates) => {
                self.disabled = disabled_delivery_dates(&dates);
                self.dates = dates;
                if self.error.is_some_and(PickerError::is_loading_error) {
                    self.error = None;
                }
                if let Some(selected) = self.selected
                    && !self.is_selectable(selected)
                {
                    info!(%selected, "Selected delivery date no longer available");
                    self.selected = None;
                    if self.error == Some(PickerError::SaveFailed) {
                        self.error = None;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to load delivery dates");
                if self.error != Some(PickerError::SaveFailed) {
                    self.error = Some(PickerError::from(e.as_ref()));
                }
            }
        }
    }

    /// Load dates, from cache when fresh.
    pub async fn load(&mut self, client: &DeliveryDatesClient, key: &QueryKey) {
        self.loading = true;
        let result = client.fetch(key).await;
        self.apply(result);
    }

    /// Load dates from the network after a loading error.
    pub async fn retry_loading(&mut self, client: &DeliveryDatesClient, key: &QueryKey) {
        self.loading = true;
        let result = client.refetch(key).await;
        self.apply(result);
    }

    /// Select `date` and save it as the delivery-date attribute.
    ///
    /// Returns `Ok(false)` without saving when the date is not available.
    ///
    /// # Errors
    ///
    /// Returns `PickerError::SaveFailed` if the attribute could not be written;
    /// the selection is kept so [`Self::retry_save`] can write it again.
    pub async fn select(
        &mut self,
        date: NaiveDate,
        writer: &dyn AttributeWriter,
    ) -> Result<bool, PickerError> {
        if !self.is_selectable(date) {
            return Ok(false);
        }
        self.selected = Some(date);
        self.save(writer).await?;
        Ok(true)
    }

    /// Write the current selection again after a save error.
    ///
    /// # Errors
    ///
    /// Returns `PickerError::SaveFailed` if the attribute could not be written.
    pub async fn retry_save(&mut self, writer: &dyn AttributeWriter) -> Result<(), PickerError> {
        self.save(writer).await
    }

    async fn save(&mut self, writer: &dyn AttributeWriter) -> Result<(), PickerError> {
        let Some(date) = self.selected else {
            return Ok(());
        };

        let value = date.format("%Y-%m-%d").to_string();
        match writer.set_attribute(DELIVERY_DATE_ATTRIBUTE, &value).await {
            Ok(()) => {
                if self.error == Some(PickerError::SaveFailed) {
                    self.error = None;
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, date = %value, "Failed to save delivery date");
                self.error = Some(PickerError::SaveFailed);
                Err(PickerError::SaveFailed)
            }
        }
    }
}
