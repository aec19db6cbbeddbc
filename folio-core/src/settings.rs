//! Physical page settings and the content-height budget derived from them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reference pixel width a host renders one page at.
///
/// All scaled geometry is derived from the ratio between this width and the
/// physical page width, so measured element heights and the page budget
/// live in the same unit.
pub const DEFAULT_RENDER_WIDTH: f64 = 800.0;

/// A4 page dimensions in millimetres.
pub const A4_WIDTH_MM: f64 = 210.0;
pub const A4_HEIGHT_MM: f64 = 297.0;

/// Default page margin: one inch, in millimetres.
const DEFAULT_PADDING_MM: f64 = 25.4;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SettingsError {
    #[error("content height budget is not positive: {0}")]
    DegenerateBudget(f64),
    #[error("page dimensions must be positive: {width}mm x {height}mm")]
    InvalidPageSize { width: f64, height: f64 },
    #[error("paddings must be non-negative")]
    NegativePadding,
}

/// Physical page geometry, persisted alongside document content.
///
/// All fields are millimetres. The settings block travels with every stored
/// document because the content-height budget must be recomputable on load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSettings {
    pub page_width: f64,
    pub page_height: f64,
    pub padding_top: f64,
    pub padding_bottom: f64,
    pub padding_left: f64,
    pub padding_right: f64,
}

impl Default for PageSettings {
    /// A4 portrait with one-inch margins.
    fn default() -> Self {
        Self {
            page_width: A4_WIDTH_MM,
            page_height: A4_HEIGHT_MM,
            padding_top: DEFAULT_PADDING_MM,
            padding_bottom: DEFAULT_PADDING_MM,
            padding_left: DEFAULT_PADDING_MM,
            padding_right: DEFAULT_PADDING_MM,
        }
    }
}

impl PageSettings {
    /// Pixels per millimetre when one page renders `render_width` px wide.
    pub fn width_ratio(&self, render_width: f64) -> f64 {
        render_width / self.page_width
    }

    /// Content height available per page, scaled into render pixels.
    ///
    /// Degenerate geometry (margins consuming the whole page, zero or
    /// negative dimensions) is rejected here — documents with a
    /// non-positive budget must never reach the paginator.
    pub fn content_budget(&self, render_width: f64) -> Result<f64, SettingsError> {
        self.validate()?;
        let ratio = self.width_ratio(render_width);
        let budget = (self.page_height - self.padding_top - self.padding_bottom) * ratio;
        if !budget.is_finite() || budget <= 0.0 {
            log::warn!(
                "degenerate content budget {budget} (page {}x{}mm, vertical padding {}mm)",
                self.page_width,
                self.page_height,
                self.padding_top + self.padding_bottom
            );
            return Err(SettingsError::DegenerateBudget(budget));
        }
        Ok(budget)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.page_width > 0.0 && self.page_height > 0.0)
            || !self.page_width.is_finite()
            || !self.page_height.is_finite()
        {
            return Err(SettingsError::InvalidPageSize {
                width: self.page_width,
                height: self.page_height,
            });
        }
        let paddings = [
            self.padding_top,
            self.padding_bottom,
            self.padding_left,
            self.padding_right,
        ];
        if paddings.iter().any(|p| *p < 0.0 || !p.is_finite()) {
            return Err(SettingsError::NegativePadding);
        }
        Ok(())
    }
}
