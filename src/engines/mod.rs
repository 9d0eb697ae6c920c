// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod chromium_driver;
pub mod storage_state;
pub mod traits;
pub mod validators;
