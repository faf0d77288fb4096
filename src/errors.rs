//! Error Types
//!
//! This module defines the error types used throughout the app.
//!
//! # Overview
//!
//! The main error type [`MultiwinError`] covers all failure modes including:
//! - GPU initialization failures
//! - Window system and event loop errors
//! - Screenshot capture and encoding errors
//!
//! All public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, MultiwinError>`. Per-frame surface losses are not
//! errors; the frame loop reconfigures and retries those on its own.

use thiserror::Error;

/// The main error type for multiwin.
#[derive(Error, Debug)]
pub enum MultiwinError {
    // ========================================================================
    // GPU & Rendering Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to bind a surface to a window.
    #[error("Failed to create surface: {0}")]
    SurfaceCreateFailed(#[from] wgpu::CreateSurfaceError),

    /// The surface is permanently unusable (out of memory or similar).
    #[error("Surface error: {0}")]
    SurfaceLost(#[from] wgpu::SurfaceError),

    // ========================================================================
    // Window System Errors
    // ========================================================================
    /// Window system error.
    #[error("Window system error: {0}")]
    WindowError(#[from] raw_window_handle::HandleError),

    /// Window creation error.
    #[error("Failed to create window: {0}")]
    WindowCreateFailed(#[from] winit::error::OsError),

    /// Event loop error (winit).
    #[error("Event loop error: {0}")]
    EventLoopError(#[from] winit::error::EventLoopError),

    // ========================================================================
    // Capture Errors
    // ========================================================================
    /// Reading a rendered frame back from the GPU failed.
    #[error("Frame readback error: {0}")]
    ReadbackFailed(String),

    /// PNG encoding error.
    #[error("Image encode error: {0}")]
    ImageEncodeError(String),

    /// File I/O error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<image::ImageError> for MultiwinError {
    fn from(err: image::ImageError) -> Self {
        MultiwinError::ImageEncodeError(err.to_string())
    }
}

impl From<wgpu::BufferAsyncError> for MultiwinError {
    fn from(err: wgpu::BufferAsyncError) -> Self {
        MultiwinError::ReadbackFailed(err.to_string())
    }
}

/// Alias for `Result<T, MultiwinError>`.
pub type Result<T> = std::result::Result<T, MultiwinError>;
