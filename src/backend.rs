//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for the handful of document operations
//! the cleaner needs, isolating the concrete PDF library (lopdf) from the
//! classification logic.

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{Dictionary, Document as LopdfDocument, Object, Stream};

use crate::content::BoundingBox;
use crate::error::{Error, Result};

/// Object identifier: (object number, generation number).
pub type ObjectRef = (u32, u16);

/// Limit on `/Parent` hops when looking up inherited page attributes.
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Stream dictionary key marking content written by the cleaner.
const FILTERED_KEY: &[u8] = b"PdfstripFiltered";

/// Bytes of one content stream as the backend could read them.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamData {
    Decoded(Vec<u8>),
    /// The stream's filters could not be applied.
    Undecodable { encoded_len: usize, reason: String },
}

/// One content stream of a page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageStream {
    pub id: ObjectRef,
    pub data: StreamData,
    /// Written by an earlier cleaning pass
    pub filtered: bool,
}

impl PageStream {
    pub fn decoded(id: ObjectRef, data: Vec<u8>) -> Self {
        Self {
            id,
            data: StreamData::Decoded(data),
            filtered: false,
        }
    }

    /// A stream produced by an earlier pass of the operator filter.
    pub fn filtered(id: ObjectRef, data: Vec<u8>) -> Self {
        Self {
            filtered: true,
            ..Self::decoded(id, data)
        }
    }

    /// Size counted towards the page total: decoded length when available,
    /// encoded length otherwise.
    pub fn size(&self) -> usize {
        match &self.data {
            StreamData::Decoded(data) => data.len(),
            StreamData::Undecodable { encoded_len, .. } => *encoded_len,
        }
    }
}

/// One entry of a page's rewritten content list.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentOutput {
    /// Reuse an existing stream object unchanged.
    Original(ObjectRef),
    /// Store new, uncompressed content bytes. Backends mark the new stream
    /// so a later pass reports it as [`PageStream::filtered`].
    Rewritten(Vec<u8>),
}

/// Abstract interface for PDF document access.
///
/// Implementations provide page enumeration, page boxes, content stream
/// access and the few mutations the cleaner performs, without exposing any
/// concrete PDF library types.
pub trait PdfBackend {
    /// Return all pages as (page_number → page object).
    fn pages(&self) -> BTreeMap<u32, ObjectRef>;

    /// Page bounding box, inherited from the page tree when the page has none.
    fn media_box(&self, page: ObjectRef) -> Option<BoundingBox>;

    /// Content streams of a page in drawing order. A page without contents
    /// yields an empty list.
    fn content_streams(&self, page: ObjectRef) -> Result<Vec<PageStream>>;

    /// Replace the page's content reference.
    fn replace_contents(&mut self, page: ObjectRef, contents: &[ContentOutput]) -> Result<()>;

    /// Remove the page's annotations, returning how many there were.
    fn remove_annotations(&mut self, page: ObjectRef) -> Result<usize>;
}

// ---------------------------------------------------------------------------
// LopdfBackend — concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Ok(Self { doc })
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self { doc })
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Self {
        Self { doc }
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Drop unreferenced objects, optionally compress streams, and write the
    /// document to `path`.
    pub fn save<P: AsRef<Path>>(&mut self, path: P, compress: bool) -> Result<()> {
        self.doc.prune_objects();
        if compress {
            self.doc.compress();
        }
        self.doc.save(path)?;
        Ok(())
    }

    /// Serialize the document into memory.
    pub fn save_to_bytes(&mut self, compress: bool) -> Result<Vec<u8>> {
        self.doc.prune_objects();
        if compress {
            self.doc.compress();
        }
        let mut out = Vec::new();
        self.doc.save_to(&mut out)?;
        Ok(out)
    }

    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    fn stream(&self, page: ObjectRef, id: ObjectRef) -> Result<PageStream> {
        match self.doc.get_object(id) {
            Ok(Object::Stream(stream)) => Ok(PageStream {
                id,
                data: decode_stream(stream),
                filtered: stream.dict.has(FILTERED_KEY),
            }),
            Ok(other) => Err(invalid_contents(
                page,
                format!("object {} {} R is a {}", id.0, id.1, kind_of(other)),
            )),
            Err(e) => Err(invalid_contents(page, e.to_string())),
        }
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, ObjectRef> {
        self.doc.get_pages()
    }

    fn media_box(&self, page: ObjectRef) -> Option<BoundingBox> {
        let mut dict = self.doc.get_dictionary(page).ok()?;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = dict.get(b"MediaBox") {
                let values = self
                    .resolve(value)?
                    .as_array()
                    .ok()?
                    .iter()
                    .map(|item| {
                        let number = self.resolve(item)?.as_float().ok()?;
                        Some(f64::from(number))
                    })
                    .collect::<Option<Vec<f64>>>()?;
                return BoundingBox::from_slice(&values);
            }
            let parent = dict.get(b"Parent").ok()?.as_reference().ok()?;
            dict = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    fn content_streams(&self, page: ObjectRef) -> Result<Vec<PageStream>> {
        let page_dict = self
            .doc
            .get_dictionary(page)
            .map_err(|e| invalid_contents(page, e.to_string()))?;

        let Ok(contents) = page_dict.get(b"Contents") else {
            return Ok(Vec::new());
        };

        match contents {
            Object::Reference(id) => match self.doc.get_object(*id) {
                Ok(Object::Array(items)) => self.stream_list(page, items),
                _ => Ok(vec![self.stream(page, *id)?]),
            },
            Object::Array(items) => self.stream_list(page, items),
            other => Err(invalid_contents(
                page,
                format!("/Contents is a {}", kind_of(other)),
            )),
        }
    }

    fn replace_contents(&mut self, page: ObjectRef, contents: &[ContentOutput]) -> Result<()> {
        let mut refs: Vec<Object> = contents
            .iter()
            .map(|entry| match entry {
                ContentOutput::Original(id) => Object::Reference(*id),
                ContentOutput::Rewritten(bytes) => {
                    let mut dict = Dictionary::new();
                    dict.set(FILTERED_KEY, true);
                    Object::Reference(self.doc.add_object(Stream::new(dict, bytes.clone())))
                }
            })
            .collect();

        let page_dict = self
            .doc
            .get_object_mut(page)
            .and_then(Object::as_dict_mut)
            .map_err(|e| invalid_contents(page, e.to_string()))?;

        match refs.len() {
            0 => {
                page_dict.remove(b"Contents");
            }
            1 => page_dict.set("Contents", refs.remove(0)),
            _ => page_dict.set("Contents", Object::Array(refs)),
        }
        Ok(())
    }

    fn remove_annotations(&mut self, page: ObjectRef) -> Result<usize> {
        let removed = self
            .doc
            .get_object_mut(page)
            .and_then(Object::as_dict_mut)
            .map_err(|e| Error::MissingObject(format!("page {} {} R: {}", page.0, page.1, e)))?
            .remove(b"Annots");

        Ok(match removed {
            Some(Object::Array(items)) => items.len(),
            Some(Object::Reference(id)) => self
                .doc
                .get_object(id)
                .and_then(Object::as_array)
                .map_or(0, Vec::len),
            _ => 0,
        })
    }
}

impl LopdfBackend {
    fn stream_list(&self, page: ObjectRef, items: &[Object]) -> Result<Vec<PageStream>> {
        items
            .iter()
            .map(|item| match item {
                Object::Reference(id) => self.stream(page, *id),
                other => Err(invalid_contents(
                    page,
                    format!("content array holds a {}", kind_of(other)),
                )),
            })
            .collect()
    }
}

/// Decode a stream, applying its filters when it declares any.
fn decode_stream(stream: &Stream) -> StreamData {
    if !stream.dict.has(b"Filter") {
        return StreamData::Decoded(stream.content.clone());
    }
    match stream.decompressed_content() {
        Ok(data) => StreamData::Decoded(data),
        Err(e) => StreamData::Undecodable {
            encoded_len: stream.content.len(),
            reason: e.to_string(),
        },
    }
}

/// PDF type name of an object, for error messages.
fn kind_of(obj: &Object) -> &'static str {
    match obj {
        Object::Null => "Null",
        Object::Boolean(_) => "Boolean",
        Object::Integer(_) => "Integer",
        Object::Real(_) => "Real",
        Object::Name(_) => "Name",
        Object::String(..) => "String",
        Object::Array(_) => "Array",
        Object::Dictionary(_) => "Dictionary",
        Object::Stream(_) => "Stream",
        Object::Reference(_) => "Reference",
    }
}

fn invalid_contents(page: ObjectRef, reason: String) -> Error {
    Error::InvalidContents {
        object: page.0,
        reason,
    }
}
