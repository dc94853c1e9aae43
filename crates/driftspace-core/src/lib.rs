pub mod color;
pub mod entity;
pub mod error;
pub mod store;
pub mod tag;

pub use color::{derive_color, Color, ColorAssigner, PeerColor};
pub use entity::{
    DocumentRef, Entity, EntityKind, File, FilePatch, Folder, FolderPatch, Location, Workspace,
    WorkspacePatch,
};
pub use error::StoreError;
pub use store::{Removed, TreeStore};
pub use tag::MutationTag;
