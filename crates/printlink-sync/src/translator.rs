// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability document translation.
//
// Turns a PostScript Printer Description (PPD) into the structured
// description section published to the cloud, plus the manufacturer and
// model strings.  Only the commonly used main keywords are understood;
// anything else offered as a pick-one UI option is passed through as a
// vendor capability.

use std::collections::HashMap;

use tracing::debug;

use printlink_core::capability::{
    ColorCapability, ColorOption, ColorType, CopiesCapability, DpiCapability, DpiOption,
    DuplexCapability, DuplexOption, DuplexType, MediaSizeCapability, MediaSizeOption,
    OrientationType, PageOrientationCapability, PageOrientationOption,
    PrinterDescriptionSection, SupportedContentType, VendorCapability, VendorOption,
};
use printlink_core::error::{PrintlinkError, Result};

/// Microns per PostScript point (1/72 inch).
const MICRONS_PER_POINT: f64 = 25_400.0 / 72.0;

/// Copies limit when the document does not state one.
const DEFAULT_MAX_COPIES: u32 = 9999;

/// UI groups that have a dedicated description section, or duplicate one.
const HANDLED_GROUPS: &[&str] = &["PageSize", "PageRegion", "Duplex", "Resolution", "ColorModel"];

/// Output of a successful translation.  All three parts are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedCapabilities {
    pub description: PrinterDescriptionSection,
    pub manufacturer: String,
    pub model: String,
}

/// Converts a capability document into structured capabilities.
///
/// Fails with [`PrintlinkError::Translation`] unless it can produce a
/// description, a manufacturer and a model.
pub trait CapabilityTranslator: Send + Sync {
    fn translate(&self, document: &str) -> Result<TranslatedCapabilities>;
}

/// Translator for PPD documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct PpdTranslator;

impl CapabilityTranslator for PpdTranslator {
    fn translate(&self, document: &str) -> Result<TranslatedCapabilities> {
        let first = document.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
        if !first.starts_with("*PPD-Adobe") {
            return Err(PrintlinkError::Translation("missing *PPD-Adobe header".into()));
        }

        let ppd = ParsedPpd::parse(document);

        let manufacturer = ppd.first("Manufacturer").unwrap_or_default();
        let model = ppd
            .first("ModelName")
            .or_else(|| ppd.first("ShortNickName"))
            .or_else(|| ppd.first("NickName"))
            .unwrap_or_default();
        if manufacturer.is_empty() || model.is_empty() {
            return Err(PrintlinkError::Translation(
                "document names no manufacturer or model".into(),
            ));
        }

        let description = PrinterDescriptionSection {
            supported_content_type: vec![
                SupportedContentType::new("application/pdf"),
                SupportedContentType::new("application/postscript"),
            ],
            color: color_capability(&ppd),
            duplex: duplex_capability(&ppd),
            page_orientation: Some(PageOrientationCapability {
                option: vec![
                    PageOrientationOption {
                        orientation_type: OrientationType::Portrait,
                        is_default: true,
                    },
                    PageOrientationOption {
                        orientation_type: OrientationType::Landscape,
                        is_default: false,
                    },
                ],
            }),
            copies: Some(CopiesCapability {
                default: 1,
                max: ppd
                    .first("cupsMaxCopies")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_MAX_COPIES),
            }),
            media_size: media_size_capability(&ppd),
            dpi: dpi_capability(&ppd),
            vendor_capability: vendor_capabilities(&ppd),
        };

        debug!(%manufacturer, %model, "translated PPD");
        Ok(TranslatedCapabilities {
            description,
            manufacturer,
            model,
        })
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// One `*OpenUI` ... `*CloseUI` block.
#[derive(Debug, Default)]
struct UiGroup {
    name: String,
    display_name: String,
    /// `(option keyword, translation)` in document order.
    options: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct ParsedPpd {
    /// Main keyword -> values, for statements without an option keyword.
    values: HashMap<String, Vec<String>>,
    /// `*PaperDimension` option -> value.
    paper_dimensions: HashMap<String, String>,
    groups: Vec<UiGroup>,
}

impl ParsedPpd {
    fn parse(text: &str) -> Self {
        let mut ppd = ParsedPpd::default();
        let mut open: Option<UiGroup> = None;
        let mut in_string = false;

        for line in text.lines() {
            // Skip the continuation lines of a multi-line quoted value.
            if in_string {
                if line.contains('"') {
                    in_string = false;
                }
                continue;
            }
            let Some(rest) = line.strip_prefix('*') else {
                continue;
            };
            if rest.starts_with('%') || rest.starts_with("End") {
                continue;
            }
            let Some((key, raw_value)) = rest.split_once(':') else {
                continue;
            };

            let raw_value = raw_value.trim();
            if raw_value.starts_with('"') && raw_value.matches('"').count() == 1 {
                in_string = true;
            }
            let value = raw_value.trim_matches('"').trim().to_string();

            let (keyword, option, translation) = split_key(key);
            match (keyword, option) {
                ("OpenUI", Some(group)) => {
                    let name = group.trim_start_matches('*').to_string();
                    let display_name = translation.unwrap_or(&name).to_string();
                    open = Some(UiGroup {
                        name,
                        display_name,
                        options: Vec::new(),
                    });
                }
                ("CloseUI", _) => {
                    if let Some(group) = open.take() {
                        ppd.groups.push(group);
                    }
                }
                ("PaperDimension", Some(size)) => {
                    ppd.paper_dimensions.insert(size.to_string(), value);
                }
                (keyword, Some(option)) => {
                    if let Some(group) = open.as_mut().filter(|g| g.name == keyword) {
                        let translation = translation.unwrap_or(option).to_string();
                        group.options.push((option.to_string(), translation));
                    }
                }
                (keyword, None) => {
                    ppd.values.entry(keyword.to_string()).or_default().push(value);
                }
            }
        }

        ppd
    }

    fn first(&self, keyword: &str) -> Option<String> {
        self.values
            .get(keyword)
            .and_then(|v| v.first())
            .filter(|v| !v.is_empty())
            .cloned()
    }

    fn group(&self, name: &str) -> Option<&UiGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    fn default_for(&self, group: &str) -> Option<String> {
        self.first(&format!("Default{group}"))
    }
}

/// Split `Keyword Option/Translation` into its parts.
fn split_key(key: &str) -> (&str, Option<&str>, Option<&str>) {
    let key = key.trim();
    match key.split_once(char::is_whitespace) {
        None => (key, None, None),
        Some((keyword, spec)) => {
            let spec = spec.trim();
            match spec.split_once('/') {
                Some((option, translation)) => (keyword, Some(option), Some(translation)),
                None => (keyword, Some(spec), None),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

fn color_capability(ppd: &ParsedPpd) -> Option<ColorCapability> {
    let color_device = ppd.first("ColorDevice")?;
    let option = if color_device.eq_ignore_ascii_case("true") {
        vec![
            ColorOption {
                vendor_id: "color".into(),
                color_type: ColorType::StandardColor,
                is_default: true,
            },
            ColorOption {
                vendor_id: "gray".into(),
                color_type: ColorType::StandardMonochrome,
                is_default: false,
            },
        ]
    } else {
        vec![ColorOption {
            vendor_id: "gray".into(),
            color_type: ColorType::StandardMonochrome,
            is_default: true,
        }]
    };
    Some(ColorCapability { option })
}

fn duplex_capability(ppd: &ParsedPpd) -> Option<DuplexCapability> {
    let group = ppd.group("Duplex")?;
    let default = ppd.default_for("Duplex");

    let option: Vec<DuplexOption> = group
        .options
        .iter()
        .filter_map(|(keyword, _)| {
            let duplex_type = match keyword.as_str() {
                "None" => DuplexType::NoDuplex,
                "DuplexNoTumble" => DuplexType::LongEdge,
                "DuplexTumble" => DuplexType::ShortEdge,
                _ => return None,
            };
            Some(DuplexOption {
                duplex_type,
                is_default: default.as_deref() == Some(keyword.as_str()),
            })
        })
        .collect();

    (!option.is_empty()).then_some(DuplexCapability { option })
}

fn media_size_capability(ppd: &ParsedPpd) -> Option<MediaSizeCapability> {
    let group = ppd.group("PageSize")?;
    let default = ppd.default_for("PageSize");

    let option: Vec<MediaSizeOption> = group
        .options
        .iter()
        .filter_map(|(keyword, translation)| {
            let (width, height) = parse_dimension(ppd.paper_dimensions.get(keyword)?)?;
            Some(MediaSizeOption {
                vendor_id: keyword.clone(),
                custom_display_name: translation.clone(),
                width_microns: width,
                height_microns: height,
                is_default: default.as_deref() == Some(keyword.as_str()),
            })
        })
        .collect();

    (!option.is_empty()).then_some(MediaSizeCapability { option })
}

/// `"612 792"` (points) to `(width, height)` in microns.
fn parse_dimension(value: &str) -> Option<(u32, u32)> {
    let mut parts = value.split_whitespace().map(|p| p.parse::<f64>().ok());
    let width = parts.next()??;
    let height = parts.next()??;
    let to_microns = |pt: f64| (pt * MICRONS_PER_POINT).round() as u32;
    Some((to_microns(width), to_microns(height)))
}

fn dpi_capability(ppd: &ParsedPpd) -> Option<DpiCapability> {
    let group = ppd.group("Resolution")?;
    let default = ppd.default_for("Resolution");

    let option: Vec<DpiOption> = group
        .options
        .iter()
        .filter_map(|(keyword, _)| {
            let (horizontal, vertical) = parse_resolution(keyword)?;
            Some(DpiOption {
                vendor_id: keyword.clone(),
                horizontal_dpi: horizontal,
                vertical_dpi: vertical,
                is_default: default.as_deref() == Some(keyword.as_str()),
            })
        })
        .collect();

    (!option.is_empty()).then_some(DpiCapability { option })
}

/// `600dpi` or `600x1200dpi`.
fn parse_resolution(keyword: &str) -> Option<(u32, u32)> {
    let dims = keyword.strip_suffix("dpi")?;
    match dims.split_once('x') {
        Some((h, v)) => Some((h.parse().ok()?, v.parse().ok()?)),
        None => {
            let both = dims.parse().ok()?;
            Some((both, both))
        }
    }
}

fn vendor_capabilities(ppd: &ParsedPpd) -> Vec<VendorCapability> {
    ppd.groups
        .iter()
        .filter(|g| !HANDLED_GROUPS.contains(&g.name.as_str()) && !g.options.is_empty())
        .map(|g| {
            let default = ppd.default_for(&g.name);
            VendorCapability {
                id: g.name.clone(),
                display_name: g.display_name.clone(),
                option: g
                    .options
                    .iter()
                    .map(|(keyword, translation)| VendorOption {
                        value: keyword.clone(),
                        display_name: translation.clone(),
                        is_default: default.as_deref() == Some(keyword.as_str()),
                    })
                    .collect(),
            }
        })
        .collect()
}
