pub mod descriptor;
pub mod document;
pub mod record;

pub use descriptor::{descriptor, FieldShape, FieldSpec, KindDescriptor};
pub use document::{Document, ROOT_KEY, WATERMARK_SECTION};
