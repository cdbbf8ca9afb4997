// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Structured printer capability and state descriptions.
//
// These are the sections published to the cloud print service.  They are
// plain value types: two sections are "the same" when every nested field is
// equal, which is exactly what the reconciliation engine compares.

use serde::{Deserialize, Serialize};

/// Everything a printer can do, as derived from its capability document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterDescriptionSection {
    /// Document formats the printer accepts (MIME types).
    pub supported_content_type: Vec<SupportedContentType>,
    pub color: Option<ColorCapability>,
    pub duplex: Option<DuplexCapability>,
    pub page_orientation: Option<PageOrientationCapability>,
    pub copies: Option<CopiesCapability>,
    pub media_size: Option<MediaSizeCapability>,
    pub dpi: Option<DpiCapability>,
    /// Options the document exposes that have no dedicated section above.
    pub vendor_capability: Vec<VendorCapability>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportedContentType {
    pub content_type: String,
}

impl SupportedContentType {
    pub fn new(content_type: impl Into<String>) -> Self {
        Self {
            content_type: content_type.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColorType {
    StandardColor,
    StandardMonochrome,
    CustomColor,
    CustomMonochrome,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorOption {
    pub vendor_id: String,
    #[serde(rename = "type")]
    pub color_type: ColorType,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorCapability {
    pub option: Vec<ColorOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DuplexType {
    NoDuplex,
    LongEdge,
    ShortEdge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplexOption {
    #[serde(rename = "type")]
    pub duplex_type: DuplexType,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplexCapability {
    pub option: Vec<DuplexOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrientationType {
    Portrait,
    Landscape,
    Auto,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOrientationOption {
    #[serde(rename = "type")]
    pub orientation_type: OrientationType,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageOrientationCapability {
    pub option: Vec<PageOrientationOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopiesCapability {
    pub default: u32,
    pub max: u32,
}

/// One paper size.  Dimensions are in microns, as the cloud service expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSizeOption {
    pub vendor_id: String,
    pub custom_display_name: String,
    pub width_microns: u32,
    pub height_microns: u32,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSizeCapability {
    pub option: Vec<MediaSizeOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpiOption {
    pub vendor_id: String,
    pub horizontal_dpi: u32,
    pub vertical_dpi: u32,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DpiCapability {
    pub option: Vec<DpiOption>,
}

/// A document option with no dedicated section, kept as a pick-one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorCapability {
    pub id: String,
    pub display_name: String,
    pub option: Vec<VendorOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorOption {
    pub value: String,
    pub display_name: String,
    pub is_default: bool,
}

/// Coarse device state reported to the cloud.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CloudDeviceState {
    #[default]
    Idle,
    Processing,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VendorStateType {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorStateItem {
    pub state: VendorStateType,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorState {
    pub item: Vec<VendorStateItem>,
}

/// The printer's current runtime state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrinterStateSection {
    pub state: CloudDeviceState,
    pub vendor_state: Option<VendorState>,
}

impl PrinterStateSection {
    pub fn new(state: CloudDeviceState) -> Self {
        Self {
            state,
            vendor_state: None,
        }
    }
}
