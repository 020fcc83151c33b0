//! framed-avatar: GitHub avatars with themed frames, text and emoji
//!
//! This crate fetches a GitHub user's avatar, clips it to a circle, rounded
//! square or square, lays a (optionally tinted) theme frame over it, adds
//! text and emoji overlays and encodes the result as PNG, JPEG or SVG. It
//! also ships the HTTP service around that engine.
//!
//! # Example
//!
//! ```
//! use framed_avatar::{RenderQuery, Shape};
//!
//! let query = RenderQuery {
//!     size: Some("512".into()),
//!     shape: Some("rounded".into()),
//!     accent_color: Some("#FF5733".into()),
//!     ..RenderQuery::default()
//! };
//! let request = query.into_request("octocat").unwrap();
//!
//! assert_eq!(request.shape, Shape::Rounded);
//! assert_eq!(request.corner_radius, 51);
//! ```
//!
//! # Compositing
//!
//! [`compose`] is synchronous and takes already fetched bytes:
//!
//! ```no_run
//! use framed_avatar::{compose, ImageAsset, AssetOrigin, RenderRequest};
//!
//! # fn main() -> framed_avatar::FrameResult<()> {
//! let avatar = ImageAsset::from_bytes(std::fs::read("avatar.png")?, AssetOrigin::Remote)?;
//! let frame = ImageAsset::from_bytes(std::fs::read("frame.png")?, AssetOrigin::Frame)?;
//!
//! let output = compose(&RenderRequest::new("octocat", "base", 256), &avatar, Some(&frame))?;
//! std::fs::write("octocat-avatar.png", output.bytes)?;
//! # Ok(())
//! # }
//! ```

mod asset;
pub mod assets;
pub mod badge;
pub mod compositor;
pub mod config;
mod error;
pub mod github;
pub mod layer;
pub mod recommend;
mod request;
pub mod server;

pub use asset::{AssetOrigin, ImageAsset, SizePx};
pub use assets::{ThemeDescriptor, ThemeStore};
pub use badge::{BadgeSet, BadgeStats};
pub use compositor::{compose, RenderedImage};
pub use config::{Config, LogFormat};
pub use error::{FrameError, FrameResult};
pub use github::{GithubClient, ProfileSummary, RepoSummary};
pub use layer::{LayerEffect, LayerStack, MaskShape, RenderContext, TintParams, tint_pixels};
pub use recommend::{recommend, ProfileAnalysis, Recommendation};
pub use request::{
    AccentColor, CanvasMode, EmojiPosition, EmojiSpec, LenientQuery, OutputFormat, RenderQuery,
    RenderRequest, Shape, TextPosition, TextSpec,
};
pub use server::{router, AppState, ROUTES};
