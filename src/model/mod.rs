//! Data model shared by the detection pipeline and its reports.
//!
//! # Design Principles
//!
//! 1. **Type Safety**: collaborator boxes carry their coordinate space as a
//!    type parameter ([`BBox<Pixel>`] vs [`BBox<Normalized>`]) so YOLO-style
//!    normalized boxes cannot leak into results unscaled.
//!
//! 2. **Validated Results**: a [`SymbolResult`] always holds a [`Rect`] with
//!    positive size that was clamped into the image it came from.
//!
//! 3. **Immutable Records**: [`SymbolResult`] and [`Outcome`] expose accessors
//!    only. An [`Outcome`]'s status is derived from its symbols at
//!    construction and cannot drift afterwards.
//!
//! # Example
//!
//! ```
//! use codescan::model::{BBox, CodeKind, Outcome, Pixel, Status, SymbolResult};
//!
//! let rect = BBox::<Pixel>::from_xywh(10.0, 20.0, 100.0, 40.0)
//!     .clamp_to(640, 480)
//!     .unwrap();
//! let outcome = Outcome::from_symbols(
//!     "shelf.jpg".into(),
//!     CodeKind::Barcode,
//!     vec![SymbolResult::from_ground_truth(rect, 0.9)],
//! );
//! assert_eq!(outcome.status(), Status::Success);
//! ```

mod bbox;
mod ids;
mod outcome;
mod rect;
mod space;
mod symbol;

pub use bbox::BBox;
pub use ids::ImageId;
pub use outcome::{CodeKind, Outcome, Status};
pub use rect::Rect;
pub use space::{Normalized, Pixel};
pub use symbol::{Source, SymbolResult, Symbology, DECODED_CONFIDENCE};
