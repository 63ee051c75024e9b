//! Element extraction: from raw positioned page content to a flat,
//! reading-ordered element sequence.
//!
//! A [`DocumentLoader`] (the document-parsing collaborator) hands over pages
//! of individually fallible items. [`extract_elements`] turns those pages
//! into a lazy, finite, non-restartable iterator of [`Element`]s:
//!
//! * pages in ascending page-number order;
//! * within a page, elements sorted by the top of their bounding box, with
//!   ties keeping encounter order;
//! * image boxes clamped to page bounds, degenerate images dropped;
//! * per-item failures logged and skipped without aborting the document.

use thiserror::Error;
use tracing::{debug, warn};

use crate::types::RetrievalError;

/// Rectangular extent of an element in page coordinates. `y` grows downward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl BoundingBox {
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Clamps the box to `[0, width] x [0, height]`.
    pub fn clamped(&self, page_width: f32, page_height: f32) -> Self {
        Self {
            x0: self.x0.clamp(0.0, page_width),
            y0: self.y0.clamp(0.0, page_height),
            x1: self.x1.clamp(0.0, page_width),
            y1: self.y1.clamp(0.0, page_height),
        }
    }

    /// True when the box has no positive area.
    pub fn is_degenerate(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

/// Content payload of a document element.
///
/// A tagged variant rather than dynamic inspection at consumption sites:
/// every consumer matches on the kind exactly once.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementContent {
    Text(String),
    Image(Vec<u8>),
}

impl ElementContent {
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }

    /// Text length in Unicode scalar values; zero for images.
    pub fn text_len(&self) -> usize {
        match self {
            Self::Text(text) => text.chars().count(),
            Self::Image(_) => 0,
        }
    }
}

/// Atomic unit of extracted document content.
///
/// Immutable once produced; ownership passes to the chunker and the element
/// is discarded after chunk assembly.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub content: ElementContent,
    pub bbox: BoundingBox,
    /// 1-based page number.
    pub page_number: u32,
}

/// Failure to decode a single item during extraction.
///
/// These are recoverable data-quality issues (a corrupt embedded image, an
/// unreadable block); the surrounding document keeps extracting.
#[derive(Clone, Debug, Error)]
#[error("{reason}")]
pub struct ElementError {
    pub reason: String,
}

impl ElementError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A positioned item as delivered by the loader, before ordering.
#[derive(Clone, Debug)]
pub struct RawItem {
    pub content: ElementContent,
    pub bbox: BoundingBox,
}

/// One page of raw loader output.
#[derive(Clone, Debug)]
pub struct RawPage {
    /// 1-based page number.
    pub number: u32,
    pub width: f32,
    pub height: f32,
    /// Items in encounter order. Individually fallible so one corrupt item
    /// cannot take down the page.
    pub items: Vec<Result<RawItem, ElementError>>,
}

/// Document-parsing collaborator. Implementations wrap a concrete format
/// backend (PDF, scanned pages, office formats) and expose raw positioned
/// content; everything layout-related happens on this side of the trait.
pub trait DocumentLoader {
    /// Identifier used in citations, typically the file name.
    fn source(&self) -> &str;

    /// Produces the document's pages. Called once per ingestion run.
    fn pages(&mut self) -> Result<Vec<RawPage>, RetrievalError>;
}

/// In-memory loader for tests and demos.
#[derive(Clone, Debug)]
pub struct StaticDocumentLoader {
    source: String,
    pages: Vec<RawPage>,
}

impl StaticDocumentLoader {
    pub fn new(source: impl Into<String>, pages: Vec<RawPage>) -> Self {
        Self {
            source: source.into(),
            pages,
        }
    }
}

impl DocumentLoader for StaticDocumentLoader {
    fn source(&self) -> &str {
        &self.source
    }

    fn pages(&mut self) -> Result<Vec<RawPage>, RetrievalError> {
        Ok(std::mem::take(&mut self.pages))
    }
}

/// Lazy iterator over the reading-ordered elements of a document.
///
/// Pages are ordered up front; each page's items are decoded and sorted on
/// first touch, so a consumer that stops early never pays for the tail of
/// the document.
pub struct ElementStream {
    pages: std::vec::IntoIter<RawPage>,
    current: std::vec::IntoIter<Element>,
}

/// Orders pages and returns the element stream for a document.
pub fn extract_elements(mut pages: Vec<RawPage>) -> ElementStream {
    pages.sort_by_key(|page| page.number);
    ElementStream {
        pages: pages.into_iter(),
        current: Vec::new().into_iter(),
    }
}

impl ElementStream {
    fn decode_page(page: RawPage) -> Vec<Element> {
        let mut elements: Vec<Element> = Vec::with_capacity(page.items.len());
        for item in page.items {
            let item = match item {
                Ok(item) => item,
                Err(err) => {
                    warn!(page = page.number, %err, "skipping unreadable element");
                    continue;
                }
            };
            let bbox = item.bbox.clamped(page.width, page.height);
            if item.content.is_image() && bbox.is_degenerate() {
                debug!(page = page.number, "dropping image with degenerate bounds");
                continue;
            }
            elements.push(Element {
                content: item.content,
                bbox,
                page_number: page.number,
            });
        }
        // Stable: encounter order survives for equal tops.
        elements.sort_by(|a, b| {
            a.bbox
                .y0
                .partial_cmp(&b.bbox.y0)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        elements
    }
}

impl Iterator for ElementStream {
    type Item = Element;

    fn next(&mut self) -> Option<Element> {
        loop {
            if let Some(element) = self.current.next() {
                return Some(element);
            }
            let page = self.pages.next()?;
            self.current = Self::decode_page(page).into_iter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_item(text: &str, y0: f32, y1: f32) -> Result<RawItem, ElementError> {
        Ok(RawItem {
            content: ElementContent::Text(text.to_string()),
            bbox: BoundingBox::new(0.0, y0, 100.0, y1),
        })
    }

    fn image_item(bbox: BoundingBox) -> Result<RawItem, ElementError> {
        Ok(RawItem {
            content: ElementContent::Image(vec![0xff, 0xd8]),
            bbox,
        })
    }

    fn page(number: u32, items: Vec<Result<RawItem, ElementError>>) -> RawPage {
        RawPage {
            number,
            width: 600.0,
            height: 800.0,
            items,
        }
    }

    #[test]
    fn elements_come_out_in_reading_order() {
        let pages = vec![
            page(2, vec![text_item("third", 10.0, 20.0)]),
            page(
                1,
                vec![
                    text_item("second", 300.0, 310.0),
                    text_item("first", 10.0, 20.0),
                ],
            ),
        ];
        let ordered: Vec<String> = extract_elements(pages)
            .map(|el| match el.content {
                ElementContent::Text(t) => t,
                ElementContent::Image(_) => "<image>".to_string(),
            })
            .collect();
        assert_eq!(ordered, vec!["first", "second", "third"]);
    }

    #[test]
    fn reading_order_is_non_decreasing_in_page_and_top() {
        let pages = vec![
            page(
                1,
                vec![
                    text_item("a", 50.0, 60.0),
                    text_item("b", 10.0, 20.0),
                    text_item("c", 50.0, 62.0),
                ],
            ),
            page(2, vec![text_item("d", 5.0, 9.0)]),
        ];
        let elements: Vec<Element> = extract_elements(pages).collect();
        for pair in elements.windows(2) {
            assert!(
                (pair[0].page_number, pair[0].bbox.y0) <= (pair[1].page_number, pair[1].bbox.y0)
            );
        }
    }

    #[test]
    fn ties_on_top_keep_encounter_order() {
        let pages = vec![page(
            1,
            vec![text_item("left", 10.0, 20.0), text_item("right", 10.0, 20.0)],
        )];
        let texts: Vec<String> = extract_elements(pages)
            .filter_map(|el| match el.content {
                ElementContent::Text(t) => Some(t),
                ElementContent::Image(_) => None,
            })
            .collect();
        assert_eq!(texts, vec!["left", "right"]);
    }

    #[test]
    fn degenerate_images_are_dropped_after_clamping() {
        // Entirely outside the page: clamps to a zero-width sliver.
        let off_page = image_item(BoundingBox::new(-50.0, -40.0, -10.0, -5.0));
        let inverted = image_item(BoundingBox::new(100.0, 200.0, 100.0, 250.0));
        let good = image_item(BoundingBox::new(10.0, 10.0, 200.0, 150.0));
        let pages = vec![page(1, vec![off_page, inverted, good])];
        let elements: Vec<Element> = extract_elements(pages).collect();
        assert_eq!(elements.len(), 1);
        assert!(elements[0].content.is_image());
    }

    #[test]
    fn unreadable_items_do_not_abort_the_page() {
        let pages = vec![page(
            1,
            vec![
                text_item("before", 10.0, 20.0),
                Err(ElementError::new("truncated JPEG stream")),
                text_item("after", 30.0, 40.0),
            ],
        )];
        let elements: Vec<Element> = extract_elements(pages).collect();
        assert_eq!(elements.len(), 2);
    }

    #[test]
    fn text_bbox_is_clamped_but_text_is_kept() {
        let pages = vec![page(
            1,
            vec![Ok(RawItem {
                content: ElementContent::Text("margin note".to_string()),
                bbox: BoundingBox::new(-20.0, 790.0, 650.0, 950.0),
            })],
        )];
        let elements: Vec<Element> = extract_elements(pages).collect();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].bbox.x0, 0.0);
        assert_eq!(elements[0].bbox.y1, 800.0);
    }
}
