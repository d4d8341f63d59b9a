#![forbid(unsafe_code)]

pub mod assets;
pub mod compose;
pub mod error;
pub mod export;
pub mod fonts;
pub mod layout;
pub mod model;
pub mod segment;
pub mod sheet;
pub mod transform;

pub use assets::{AssetSource, FsAssetSource, MemoryAssetSource};
pub use compose::{CardRasterizer, RenderedCard};
pub use error::{CardError, CardResult};
pub use export::ExportJob;
pub use fonts::FontCatalog;
pub use layout::{find_size_profile, mm_to_px, CardSizeProfile, MmSize, CARD_SIZES};
pub use model::{ArtworkRef, OverlayAnchor, WordEntry, WordLibrary};
pub use transform::{
    Corner, GestureEvent, GestureSession, GestureState, GestureUpdate, OverlayTransform,
};
