//! Layout-aware grouping of extracted elements into embeddable chunks.
//!
//! The [`LayoutChunker`] walks the reading-ordered element stream and
//! accumulates a chunk until a boundary fires:
//!
//! 1. the incoming element sits on a different page;
//! 2. the vertical gap to the previous element exceeds the configured
//!    layout proximity threshold;
//! 3. the incoming element is text, the accumulating chunk is image-free,
//!    and appending would push the text budget past its limit.
//!
//! Finalized image-free chunks that still exceed the budget (a single
//! oversized element, or an image-bearing run that lost its image) are
//! routed through [`overflow::split_text`] and replaced 1:many in order.
//! Chunks holding an image are never subdivided.

pub mod overflow;

use tracing::trace;

use crate::config::PipelineConfig;
use crate::extract::{Element, ElementContent};

/// Placeholder token standing in for an image inside a chunk's document
/// string, so document strings stay comparably sized for text-only
/// embedding backends.
pub const IMAGE_PLACEHOLDER: &str = "[image]";

/// One ordered member of a chunk.
#[derive(Clone, Debug, PartialEq)]
pub enum ChunkPart {
    Text(String),
    Image(Vec<u8>),
}

/// An ordered run of document content destined for a single embedding call.
///
/// Metadata is captured at finalization time: `source` identifies the
/// document and `page_number` is the page of the chunk's first element.
#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
    parts: Vec<ChunkPart>,
    text_length: usize,
    has_image: bool,
    source: String,
    page_number: u32,
}

impl Chunk {
    fn new(source: &str, page_number: u32) -> Self {
        Self {
            parts: Vec::new(),
            text_length: 0,
            has_image: false,
            source: source.to_string(),
            page_number,
        }
    }

    /// Builds a text-only chunk, used when overflow splitting replaces an
    /// oversized chunk with its pieces.
    fn from_text(source: &str, page_number: u32, text: String) -> Self {
        let text_length = text.chars().count();
        Self {
            parts: vec![ChunkPart::Text(text)],
            text_length,
            has_image: false,
            source: source.to_string(),
            page_number,
        }
    }

    fn push(&mut self, content: ElementContent) {
        match content {
            ElementContent::Text(text) => {
                self.text_length += text.chars().count();
                self.parts.push(ChunkPart::Text(text));
            }
            ElementContent::Image(bytes) => {
                self.has_image = true;
                self.parts.push(ChunkPart::Image(bytes));
            }
        }
    }

    fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn parts(&self) -> &[ChunkPart] {
        &self.parts
    }

    /// Sum of the text members' lengths in Unicode scalar values. Images do
    /// not contribute.
    pub fn text_length(&self) -> usize {
        self.text_length
    }

    pub fn has_image(&self) -> bool {
        self.has_image
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Page of the first accumulated element, 1-based.
    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    /// Renders the chunk as a single document string, text members joined
    /// by newlines and images replaced with [`IMAGE_PLACEHOLDER`].
    pub fn document_text(&self) -> String {
        let rendered: Vec<&str> = self
            .parts
            .iter()
            .map(|part| match part {
                ChunkPart::Text(text) => text.as_str(),
                ChunkPart::Image(_) => IMAGE_PLACEHOLDER,
            })
            .collect();
        rendered.join("\n")
    }

    /// Raw bytes of the image members, in order.
    pub fn images(&self) -> Vec<&[u8]> {
        self.parts
            .iter()
            .filter_map(|part| match part {
                ChunkPart::Image(bytes) => Some(bytes.as_slice()),
                ChunkPart::Text(_) => None,
            })
            .collect()
    }

    /// Text members joined by newlines, without image placeholders. This is
    /// what the overflow splitter operates on.
    fn joined_text(&self) -> String {
        let texts: Vec<&str> = self
            .parts
            .iter()
            .filter_map(|part| match part {
                ChunkPart::Text(text) => Some(text.as_str()),
                ChunkPart::Image(_) => None,
            })
            .collect();
        texts.join("\n")
    }
}

/// Groups a reading-ordered element stream into finalized chunks.
#[derive(Clone, Debug)]
pub struct LayoutChunker {
    config: PipelineConfig,
}

impl LayoutChunker {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Consumes the element stream for one document and returns its chunks
    /// in reading order.
    pub fn chunk<I>(&self, source: &str, elements: I) -> Vec<Chunk>
    where
        I: IntoIterator<Item = Element>,
    {
        let mut out: Vec<Chunk> = Vec::new();
        let mut current: Option<Chunk> = None;
        let mut previous: Option<(u32, f32)> = None; // (page, bottom)

        for element in elements {
            let split = match (&current, previous) {
                (Some(chunk), Some((prev_page, prev_bottom))) => {
                    self.boundary_fires(chunk, &element, prev_page, prev_bottom)
                }
                _ => false,
            };
            if split {
                if let Some(done) = current.take() {
                    self.finalize_into(done, &mut out);
                }
            }
            previous = Some((element.page_number, element.bbox.y1));
            current
                .get_or_insert_with(|| Chunk::new(source, element.page_number))
                .push(element.content);
        }

        if let Some(chunk) = current.take() {
            self.finalize_into(chunk, &mut out);
        }
        out
    }

    fn boundary_fires(
        &self,
        chunk: &Chunk,
        incoming: &Element,
        prev_page: u32,
        prev_bottom: f32,
    ) -> bool {
        if incoming.page_number != prev_page {
            trace!(page = incoming.page_number, "chunk boundary: page change");
            return true;
        }
        if incoming.bbox.y0 - prev_bottom > self.config.layout_proximity_threshold {
            trace!(
                gap = incoming.bbox.y0 - prev_bottom,
                "chunk boundary: layout gap"
            );
            return true;
        }
        if !chunk.has_image()
            && !incoming.content.is_image()
            && chunk.text_length() + incoming.content.text_len()
                > self.config.max_chunk_text_length
        {
            trace!(
                text_length = chunk.text_length(),
                "chunk boundary: text overflow"
            );
            return true;
        }
        false
    }

    /// Emits a finalized chunk, splitting oversized image-free text first.
    fn finalize_into(&self, chunk: Chunk, out: &mut Vec<Chunk>) {
        if chunk.is_empty() {
            return;
        }
        if !chunk.has_image() && chunk.text_length() > self.config.max_chunk_text_length {
            let text = chunk.joined_text();
            for piece in overflow::split_text(
                &text,
                self.config.max_chunk_text_length,
                self.config.text_chunk_overlap,
            ) {
                out.push(Chunk::from_text(&chunk.source, chunk.page_number, piece));
            }
        } else {
            out.push(chunk);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::BoundingBox;

    fn config() -> PipelineConfig {
        PipelineConfig::new(50, 10, 30.0, 10, 3).unwrap()
    }

    fn text_el(text: &str, page: u32, y0: f32, y1: f32) -> Element {
        Element {
            content: ElementContent::Text(text.to_string()),
            bbox: BoundingBox::new(0.0, y0, 100.0, y1),
            page_number: page,
        }
    }

    fn image_el(page: u32, y0: f32, y1: f32) -> Element {
        Element {
            content: ElementContent::Image(vec![1, 2, 3]),
            bbox: BoundingBox::new(0.0, y0, 100.0, y1),
            page_number: page,
        }
    }

    #[test]
    fn close_lines_stay_in_one_chunk() {
        let chunker = LayoutChunker::new(config());
        let chunks = chunker.chunk(
            "doc.pdf",
            vec![
                text_el("line one", 1, 10.0, 20.0),
                text_el("line two", 1, 25.0, 35.0),
            ],
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].document_text(), "line one\nline two");
        assert_eq!(chunks[0].page_number(), 1);
    }

    #[test]
    fn layout_gap_splits_before_distant_image() {
        // Two text lines 5px apart, then an image 200px further down.
        let chunker = LayoutChunker::new(config());
        let chunks = chunker.chunk(
            "doc.pdf",
            vec![
                text_el("caption line a", 1, 10.0, 20.0),
                text_el("caption line b", 1, 25.0, 35.0),
                image_el(1, 235.0, 300.0),
            ],
        );
        assert_eq!(chunks.len(), 2);
        assert!(!chunks[0].has_image());
        assert!(chunks[1].has_image());
    }

    #[test]
    fn page_change_always_splits() {
        let chunker = LayoutChunker::new(config());
        let chunks = chunker.chunk(
            "doc.pdf",
            vec![
                text_el("page one text", 1, 700.0, 710.0),
                // Top of the next page is "above" the previous bottom, so
                // only the page trigger can split here.
                text_el("page two text", 2, 10.0, 20.0),
            ],
        );
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page_number(), 1);
        assert_eq!(chunks[1].page_number(), 2);
    }

    #[test]
    fn text_overflow_splits_before_append() {
        let chunker = LayoutChunker::new(config());
        let chunks = chunker.chunk(
            "doc.pdf",
            vec![
                text_el(&"x".repeat(30), 1, 10.0, 20.0),
                text_el(&"y".repeat(30), 1, 22.0, 32.0),
            ],
        );
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].text_length() <= 50);
        assert!(chunks[1].text_length() <= 50);
    }

    #[test]
    fn image_chunk_is_exempt_from_text_overflow() {
        let chunker = LayoutChunker::new(config());
        let chunks = chunker.chunk(
            "doc.pdf",
            vec![
                image_el(1, 10.0, 40.0),
                text_el(&"caption ".repeat(10), 1, 42.0, 52.0),
                text_el(&"more caption text".repeat(3), 1, 54.0, 64.0),
            ],
        );
        // All three elements stay together despite blowing the text budget.
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].has_image());
        assert!(chunks[0].text_length() > 50);
    }

    #[test]
    fn image_does_not_count_toward_text_length() {
        let chunker = LayoutChunker::new(config());
        let chunks = chunker.chunk(
            "doc.pdf",
            vec![text_el("short", 1, 10.0, 20.0), image_el(1, 22.0, 40.0)],
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text_length(), 5);
        assert!(chunks[0].has_image());
    }

    #[test]
    fn oversized_single_element_is_overflow_split() {
        let chunker = LayoutChunker::new(config());
        let chunks = chunker.chunk("doc.pdf", vec![text_el(&"z".repeat(130), 1, 10.0, 20.0)]);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text_length() <= 50);
            assert!(!chunk.has_image());
            assert_eq!(chunk.page_number(), 1);
            assert_eq!(chunk.source(), "doc.pdf");
        }
    }

    #[test]
    fn image_placeholder_appears_in_document_text() {
        let chunker = LayoutChunker::new(config());
        let chunks = chunker.chunk(
            "doc.pdf",
            vec![text_el("before", 1, 10.0, 20.0), image_el(1, 22.0, 40.0)],
        );
        assert_eq!(chunks[0].document_text(), format!("before\n{IMAGE_PLACEHOLDER}"));
        assert_eq!(chunks[0].images().len(), 1);
    }

    #[test]
    fn page_number_is_first_elements_page() {
        let chunker = LayoutChunker::new(config());
        let chunks = chunker.chunk(
            "doc.pdf",
            vec![
                image_el(3, 10.0, 40.0),
                text_el("caption under figure", 3, 42.0, 52.0),
            ],
        );
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].page_number(), 3);
    }

    #[test]
    fn empty_stream_produces_no_chunks() {
        let chunker = LayoutChunker::new(config());
        let chunks = chunker.chunk("doc.pdf", Vec::<Element>::new());
        assert!(chunks.is_empty());
    }
}
