//! Segmentation overlay: region outlines over the uploaded image plus the
//! user's selection.
//!
//! The SVG is laid out in the image's natural pixel space (`viewBox`) and
//! stretched to the displayed size, so region hit-testing is unaffected by
//! CSS scaling. Click-point mode does not get that for free; see
//! [`OverlayState::click_point`].

use std::fmt::Write;

use tracing::{debug, warn};
use wardrobe_models::{Dimensions, Point, RegionId, SegmentationResult, SelectionSet};

use crate::config::ClickSpace;
use crate::error::{FlowError, FlowResult};

/// Overlay for one uploaded image.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayState {
    segmentation: SegmentationResult,
    selection: SelectionSet,
    natural: Dimensions,
}

impl OverlayState {
    pub fn new(segmentation: SegmentationResult, natural: Dimensions) -> Self {
        Self {
            segmentation,
            selection: SelectionSet::new(),
            natural,
        }
    }

    pub fn segmentation(&self) -> &SegmentationResult {
        &self.segmentation
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn dimensions(&self) -> Dimensions {
        self.natural
    }

    /// Flip a region's membership. Returns whether it is now selected.
    pub fn toggle(&mut self, region: RegionId) -> FlowResult<bool> {
        if self.segmentation.region(region).is_none() {
            return Err(FlowError::UnknownRegion(region));
        }
        let selected = self.selection.toggle(region);
        debug!(region = %region, selected, "Toggled region");
        Ok(selected)
    }

    pub fn deselect_all(&mut self) {
        self.selection.deselect_all();
    }

    /// Path strings of the selected regions, in region order.
    pub fn selected_paths(&self) -> Vec<&str> {
        self.selection
            .iter()
            .filter_map(|id| self.segmentation.region(id))
            .map(|r| r.path.as_str())
            .collect()
    }

    /// Compare the decoded mask size with the image's pixel count.
    ///
    /// The backend resizes masks it cannot match, so a mismatch is only
    /// logged. Returns `true` when the sizes agree.
    pub fn verify_mask(&self) -> bool {
        let expected = self.natural.area();
        match self.segmentation.mask.decoded_len() {
            Ok(actual) if actual as u64 == expected => true,
            Ok(actual) => {
                warn!(
                    expected,
                    actual,
                    width = self.natural.width,
                    height = self.natural.height,
                    "Segmentation mask size does not match image"
                );
                false
            }
            Err(e) => {
                warn!("Segmentation mask unreadable: {}", e);
                false
            }
        }
    }

    /// Convert a click on the displayed image into the configured space.
    pub fn click_point(
        &self,
        displayed_point: Point,
        displayed_size: Dimensions,
        space: ClickSpace,
    ) -> FlowResult<Point> {
        if !displayed_point.within(displayed_size) {
            return Err(FlowError::validation("Click is outside the image"));
        }

        match space {
            ClickSpace::Displayed => Ok(displayed_point),
            ClickSpace::Natural => displayed_point
                .rescale(displayed_size, self.natural)
                .ok_or_else(|| FlowError::validation("Displayed image size is empty")),
        }
    }

    /// Overlay markup: one clickable path per region.
    pub fn render_svg(&self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{}" width="100%" height="100%" preserveAspectRatio="none">"#,
            self.natural.view_box()
        );

        for region in &self.segmentation.regions {
            let class = if self.selection.contains(region.id) {
                "segment selected"
            } else {
                "segment"
            };
            // Writing to a String cannot fail
            let _ = write!(
                svg,
                r#"<path d="{}" fill-rule="evenodd" class="{}" data-region="{}"/>"#,
                escape_attr(&region.path),
                class,
                region.id
            );
        }

        svg.push_str("</svg>");
        svg
    }
}

fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
