//! Domain models for the dashboard.
//!
//! - [`identity`] - authenticated identities (the session side)
//! - [`entity`] - the [`Entity`] trait shared by every record collection
//! - [`user`] / [`product`] - the typed `users` and `products` collections
//! - [`session`] - the session token payload

pub mod entity;
pub mod identity;
pub mod product;
pub mod session;
pub mod user;

pub use entity::{Collection, Entity, ValidationError};
pub use identity::{Identity, StoredIdentity};
pub use product::{NewProduct, ProductExport, ProductField, ProductPatch, ProductRecord};
pub use session::SessionClaims;
pub use user::{NewUser, UserExport, UserField, UserPatch, UserRecord};
