// SPDX-License-Identifier: GPL-3.0-only

pub mod study;

pub use study::StudyScreen;
