// SPDX-License-Identifier: GPL-3.0-only

//! Message handler implementations
//!
//! Each submodule adds `handle_*` methods to `CaptureController`.

mod camera;
mod capture;
mod upload;
