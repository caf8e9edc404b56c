//! Test utilities for the Quarry asset pipeline.
//!
//! # Overview
//!
//! - [`MockRenderDevice`] / [`MockAudioDevice`] - device collaborators that
//!   recognise file signatures instead of decoding, and record every call
//! - [`QmshBuilder`] - synthesises mesh files, and [`vertex_data`] `.phy` files
//! - [`fixtures`] - minimal byte streams the mocks accept
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use quarry_assets::ResourceManager;
//! use quarry_test_utils::{MockAudioDevice, MockRenderDevice};
//!
//! let render = Arc::new(MockRenderDevice::new());
//! let audio = Arc::new(MockAudioDevice::new());
//! let manager = ResourceManager::new(render.clone(), audio.clone());
//!
//! assert_eq!(render.call_count(), 0);
//! # drop(manager);
//! ```
//!
//! # Interior Mutability
//!
//! Device traits take `&self`, so the mocks keep their call logs behind
//! `parking_lot::Mutex` and can be shared through `Arc` with the manager while
//! the test keeps a handle for assertions.

pub mod fixtures;
pub mod mock_audio;
pub mod mock_render;
pub mod qmsh;

pub use mock_audio::{AudioCall, MockAudioDevice};
pub use mock_render::{MockRenderDevice, RenderCall};
pub use qmsh::{QmshBuilder, vertex_data};
